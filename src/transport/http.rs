//! `reqwest` implementation of [`Transport`] and [`ListStore`].

use super::redact::redact;
use super::{ListStore, SaveResponse, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Remote error codes meaning "socket busy, try again".
pub const BUSY_CODES: [i64; 5] = [1013, 1014, 1017, 1018, 1019];

/// Error code answered in place of a request while the manager daemons are
/// not all running.
pub const NOT_READY_CODE: i64 = 3099;

const MANAGER_DAEMONS: [&str; 3] = ["ossec-execd", "wazuh-modulesd", "wazuh-db"];
const CLUSTER_DAEMON: &str = "wazuh-clusterd";

/// Connection settings for [`HttpTransport`].
///
/// Deserialisable so it can be read from the dashboard's configuration file;
/// every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// API base URL, e.g. `https://manager:55000`.
    pub base_url: String,
    /// Basic auth user.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Extra attempts after a busy answer.
    pub max_retries: u32,
    /// Pause between attempts.
    pub retry_delay_ms: u64,
    /// Check `/manager/status` before every request.
    pub check_daemons: bool,
    /// Also require the cluster daemon, when the manager reports the cluster
    /// as enabled.
    pub cluster_enabled: bool,
    /// Allow write requests. Saving a CDB list fails with
    /// [`TransportError::Forbidden`] while this is off.
    pub admin: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:55000".to_string(),
            username: None,
            password: None,
            timeout_secs: 20,
            max_retries: 3,
            retry_delay_ms: 500,
            check_daemons: true,
            cluster_enabled: false,
            admin: false,
        }
    }
}

/// HTTP access to the remote API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpConfig,
}

impl HttpTransport {
    /// Builds a client for `config`.
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// The settings this transport was built with.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_ref()),
            None => request,
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        self.send_json(self.authorize(self.client.get(self.url(path))))
            .await
    }

    /// True when the manager daemons are all running. The cluster daemon is
    /// only required when [`HttpConfig::cluster_enabled`] is set and the
    /// manager reports the cluster as enabled.
    pub async fn is_ready(&self) -> Result<bool, TransportError> {
        let check_cluster = self.config.cluster_enabled
            && match self.get_json("/cluster/status").await {
                Ok(body) => cluster_running(&body),
                Err(_) => false,
            };
        let status = self.get_json("/manager/status").await?;
        let ready = daemons_ready(&status, check_cluster);
        debug!(event = "http_daemons_checked", ready, check_cluster);
        Ok(ready)
    }

    async fn not_ready(&self, path: &str) -> Result<Option<Value>, TransportError> {
        if !self.config.check_daemons || self.is_ready().await? {
            return Ok(None);
        }
        warn!(event = "http_not_ready", path);
        Ok(Some(json!({
            "error": NOT_READY_CODE,
            "message": "Wazuh not ready yet.",
        })))
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}

fn busy_code(body: &Value) -> Option<i64> {
    body.get("error")
        .and_then(Value::as_i64)
        .filter(|code| BUSY_CODES.contains(code))
}

fn cluster_running(body: &Value) -> bool {
    body.pointer("/data/enabled").and_then(Value::as_str) == Some("yes")
}

/// Reads a `/manager/status` body: ready when it carries no error and every
/// watched daemon reports `running`.
pub fn daemons_ready(status: &Value, check_cluster: bool) -> bool {
    if status.get("error").and_then(Value::as_i64).unwrap_or(0) != 0 {
        return false;
    }
    let Some(data) = status.get("data") else {
        return false;
    };
    MANAGER_DAEMONS
        .iter()
        .copied()
        .chain(check_cluster.then_some(CLUSTER_DAEMON))
        .all(|daemon| data.get(daemon).and_then(Value::as_str) == Some("running"))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value, TransportError> {
        if let Some(body) = self.not_ready(path).await? {
            return Ok(body);
        }
        let url = self.url(path);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let request = self.authorize(self.client.get(&url).query(params));
            let mut body = self.send_json(request).await?;
            debug!(event = "http_get", path, attempt);

            if let Some(code) = busy_code(&body) {
                if attempt > self.config.max_retries {
                    return Err(TransportError::RetriesExhausted {
                        code,
                        attempts: attempt,
                    });
                }
                warn!(event = "http_busy_retry", path, code, attempt);
                tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                continue;
            }

            redact(&mut body);
            return Ok(body);
        }
    }
}

#[async_trait]
impl ListStore for HttpTransport {
    async fn save(
        &self,
        file_name: &str,
        path: &str,
        content: &str,
    ) -> Result<SaveResponse, TransportError> {
        if !self.config.admin {
            warn!(event = "http_write_forbidden", file = file_name);
            return Err(TransportError::Forbidden);
        }
        if let Some(body) = self.not_ready("/manager/files").await? {
            return serde_json::from_value(body).map_err(|e| TransportError::Decode(e.to_string()));
        }
        let target = format!("{}/{}", path.trim_end_matches('/'), file_name);
        let request = self.authorize(
            self.client
                .post(self.url("/manager/files"))
                .query(&[("path", target.as_str()), ("overwrite", "true")])
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(content.to_string()),
        );
        let body = self.send_json(request).await?;
        debug!(event = "http_save", path = %target);
        serde_json::from_value(body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: HttpConfig =
            serde_json::from_value(json!({ "base_url": "https://manager:55000/" })).unwrap();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_ms, 500);
        assert!(config.username.is_none());
        assert!(config.check_daemons);
        assert!(!config.cluster_enabled);
        assert!(!config.admin);
    }

    #[test]
    fn test_url_joining() {
        let transport = HttpTransport::new(HttpConfig {
            base_url: "https://manager:55000/".into(),
            ..HttpConfig::default()
        })
        .unwrap();
        assert_eq!(transport.url("/agents"), "https://manager:55000/agents");
        assert_eq!(transport.url("rules"), "https://manager:55000/rules");
    }

    #[test]
    fn test_busy_codes() {
        assert_eq!(busy_code(&json!({ "error": 1017 })), Some(1017));
        assert_eq!(busy_code(&json!({ "error": 1000 })), None);
        assert_eq!(busy_code(&json!({ "error": 0, "data": {} })), None);
    }

    #[test]
    fn test_daemons_ready() {
        let running = json!({ "error": 0, "data": {
            "ossec-execd": "running",
            "wazuh-modulesd": "running",
            "wazuh-db": "running",
            "wazuh-clusterd": "stopped",
        }});
        assert!(daemons_ready(&running, false));
        assert!(!daemons_ready(&running, true));

        let starting = json!({ "error": 0, "data": {
            "ossec-execd": "running",
            "wazuh-modulesd": "stopped",
            "wazuh-db": "running",
        }});
        assert!(!daemons_ready(&starting, false));
        assert!(!daemons_ready(&json!({ "error": 1, "message": "down" }), false));
        assert!(!daemons_ready(&json!({ "error": 0 }), false));
    }

    #[test]
    fn test_cluster_status() {
        assert!(cluster_running(&json!({ "data": { "enabled": "yes", "running": "yes" } })));
        assert!(!cluster_running(&json!({ "data": { "enabled": "no" } })));
        assert!(!cluster_running(&json!({ "error": 3013 })));
    }

    #[tokio::test]
    async fn test_save_forbidden_without_admin() {
        // Nothing listens on port 9; the gate must answer before connecting.
        let transport = HttpTransport::new(HttpConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..HttpConfig::default()
        })
        .unwrap();
        assert!(!transport.config().admin);
        let err = transport.save("blocked", "etc/lists", "a:1\n").await.unwrap_err();
        assert!(matches!(err, TransportError::Forbidden));
    }
}
