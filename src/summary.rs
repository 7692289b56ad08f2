//! Agent overview: status counters and search-bar suggestions.
//!
//! Both are built from the agents summary payload. The manager reports itself
//! as an agent (id `000`) and is always active, so it is subtracted from the
//! total and active counters.

use crate::error::FetchError;
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Default, Deserialize)]
struct StatusCounts {
    #[serde(rename = "Total", default)]
    total: u64,
    #[serde(rename = "Active", default)]
    active: u64,
    #[serde(rename = "Disconnected", default)]
    disconnected: u64,
    #[serde(rename = "Never connected", default)]
    never_connected: u64,
}

#[derive(Debug, Deserialize)]
struct Items<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

impl<T> Default for Items<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Os {
    platform: Option<String>,
    version: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsItem {
    os: Option<Os>,
}

#[derive(Debug, Deserialize)]
struct VersionItem {
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupItem {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodeItem {
    node_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Overview {
    agent_status: Option<StatusCounts>,
    last_registered_agent: Option<Value>,
    groups: Option<Items<GroupItem>>,
    agent_os: Option<Items<OsItem>>,
    agent_version: Option<Items<VersionItem>>,
    nodes: Option<Items<NodeItem>>,
}

impl Overview {
    fn parse(payload: &Value) -> Result<Self, FetchError> {
        Overview::deserialize(payload).map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

/// Agent counters shown above the agents table.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSummary {
    /// Registered agents, manager excluded.
    pub total: u64,
    /// Active agents, manager excluded.
    pub active: u64,
    /// Disconnected agents.
    pub disconnected: u64,
    /// Agents that never connected.
    pub never_connected: u64,
    /// Percentage of active agents, 0 when there are none.
    pub coverage: f64,
    /// True when only the manager is registered.
    pub no_agents: bool,
    /// Name of the last registered agent, `Unknown` when absent.
    pub last_registered: String,
}

impl AgentSummary {
    /// Reads the counters from a summary payload (the `data` of the response).
    ///
    /// ```rust
    /// use serde_json::json;
    /// use wz_table::summary::AgentSummary;
    ///
    /// let summary = AgentSummary::from_payload(&json!({
    ///     "agent_status": { "Total": 5, "Active": 3, "Disconnected": 2, "Never connected": 0 },
    ///     "last_registered_agent": { "name": "web-04" }
    /// })).unwrap();
    /// assert_eq!((summary.total, summary.active), (4, 2));
    /// assert_eq!(summary.coverage, 50.0);
    /// ```
    pub fn from_payload(payload: &Value) -> Result<Self, FetchError> {
        let overview = Overview::parse(payload)?;
        let status = overview
            .agent_status
            .ok_or_else(|| FetchError::Malformed("missing agent_status".into()))?;

        let total = status.total.saturating_sub(1);
        let active = status.active.saturating_sub(1);
        let coverage = if total == 0 {
            0.0
        } else {
            active as f64 / total as f64 * 100.0
        };
        let last_registered = match overview.last_registered_agent {
            Some(Value::String(name)) if !name.is_empty() => name,
            Some(Value::Object(agent)) => agent
                .get("name")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .unwrap_or("Unknown")
                .to_string(),
            _ => "Unknown".to_string(),
        };

        Ok(Self {
            total,
            active,
            disconnected: status.disconnected,
            never_connected: status.never_connected,
            coverage,
            no_agents: total < 1,
            last_registered,
        })
    }
}

/// Values offered by the agents search bar, per filterable field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSuggestions {
    /// Agent statuses.
    pub status: Vec<String>,
    /// Group names.
    pub group: Vec<String>,
    /// Agent versions.
    pub version: Vec<String>,
    /// OS platforms.
    pub os_platform: Vec<String>,
    /// OS versions.
    pub os_version: Vec<String>,
    /// OS names.
    pub os_name: Vec<String>,
    /// Cluster node names; `None` when the cluster is disabled.
    pub node_name: Option<Vec<String>>,
}

impl SearchSuggestions {
    /// Builds the suggestions from a summary payload. Values are distinct and
    /// sorted; versions sort numerically (`v3.9` before `v3.10`).
    pub fn from_payload(payload: &Value, cluster_enabled: bool) -> Result<Self, FetchError> {
        let overview = Overview::parse(payload)?;
        let os: Vec<Os> = overview
            .agent_os
            .unwrap_or_default()
            .items
            .into_iter()
            .filter_map(|item| item.os)
            .collect();

        Ok(Self {
            status: ["Active", "Disconnected", "Never connected"]
                .map(String::from)
                .to_vec(),
            group: sorted(
                overview
                    .groups
                    .unwrap_or_default()
                    .items
                    .into_iter()
                    .filter_map(|g| g.name),
                caseless_cmp,
            ),
            version: sorted(
                overview
                    .agent_version
                    .unwrap_or_default()
                    .items
                    .into_iter()
                    .filter_map(|v| v.version),
                natural_cmp,
            ),
            os_platform: sorted(os.iter().filter_map(|o| o.platform.clone()), caseless_cmp),
            os_version: sorted(os.iter().filter_map(|o| o.version.clone()), natural_cmp),
            os_name: sorted(os.iter().filter_map(|o| o.name.clone()), caseless_cmp),
            node_name: cluster_enabled.then(|| {
                sorted(
                    overview
                        .nodes
                        .unwrap_or_default()
                        .items
                        .into_iter()
                        .filter_map(|n| n.node_name),
                    caseless_cmp,
                )
            }),
        })
    }

    /// Suggestions for a filter name such as `os.platform`.
    pub fn for_field(&self, field: &str) -> &[String] {
        match field {
            "status" => &self.status,
            "group" => &self.group,
            "version" => &self.version,
            "os.platform" => &self.os_platform,
            "os.version" => &self.os_version,
            "os.name" => &self.os_name,
            "node_name" => self.node_name.as_deref().unwrap_or_default(),
            _ => &[],
        }
    }
}

fn sorted(
    values: impl Iterator<Item = String>,
    cmp: fn(&str, &str) -> Ordering,
) -> Vec<String> {
    let mut values: Vec<String> = values.filter(|v| !v.is_empty()).collect();
    values.sort_by(|a, b| cmp(a, b).then_with(|| a.cmp(b)));
    values.dedup();
    values
}

fn caseless_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Case-insensitive comparison treating runs of digits as numbers.
///
/// ```rust
/// use std::cmp::Ordering;
/// use wz_table::summary::natural_cmp;
///
/// assert_eq!(natural_cmp("Wazuh v3.9.0", "Wazuh v3.10.0"), Ordering::Less);
/// assert_eq!(natural_cmp("ubuntu", "Ubuntu"), Ordering::Equal);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = chunks(a);
    let mut b = chunks(b);
    loop {
        match (a.next(), b.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let order = match (is_number(x), is_number(y)) {
                    (true, true) => {
                        let x = x.trim_start_matches('0');
                        let y = y.trim_start_matches('0');
                        x.len().cmp(&y.len()).then_with(|| x.cmp(y))
                    }
                    _ => caseless_cmp(x, y),
                };
                if order != Ordering::Equal {
                    return order;
                }
            }
        }
    }
}

fn is_number(chunk: &str) -> bool {
    chunk.starts_with(|c: char| c.is_ascii_digit())
}

fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map_or(rest.len(), |(i, _)| i);
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "agent_status": { "Total": 11, "Active": 7, "Disconnected": 3, "Never connected": 1 },
            "last_registered_agent": { "id": "010", "name": "db-02" },
            "groups": { "items": [{ "name": "web" }, { "name": "Default" }, { "name": "db" }] },
            "agent_version": { "items": [
                { "version": "Wazuh v3.10.2" },
                { "version": "Wazuh v3.9.5" },
                { "version": "Wazuh v3.10.2" },
                { "version": null }
            ] },
            "agent_os": { "items": [
                { "os": { "platform": "ubuntu", "version": "18.04", "name": "Ubuntu" } },
                { "os": { "platform": "centos", "version": "7", "name": "CentOS Linux" } },
                { "os": null }
            ] },
            "nodes": { "items": [{ "node_name": "worker" }, { "node_name": "master" }] }
        })
    }

    #[test]
    fn test_summary_excludes_manager() {
        let summary = AgentSummary::from_payload(&payload()).unwrap();
        assert_eq!(summary.total, 10);
        assert_eq!(summary.active, 6);
        assert_eq!(summary.disconnected, 3);
        assert_eq!(summary.never_connected, 1);
        assert!((summary.coverage - 60.0).abs() < f64::EPSILON);
        assert!(!summary.no_agents);
        assert_eq!(summary.last_registered, "db-02");
    }

    #[test]
    fn test_only_manager_registered() {
        let summary = AgentSummary::from_payload(&json!({
            "agent_status": { "Total": 1, "Active": 1 }
        }))
        .unwrap();
        assert!(summary.no_agents);
        assert_eq!(summary.coverage, 0.0);
        assert_eq!(summary.last_registered, "Unknown");
    }

    #[test]
    fn test_missing_status_is_malformed() {
        assert!(matches!(
            AgentSummary::from_payload(&json!({ "groups": { "items": [] } })),
            Err(FetchError::Malformed(_))
        ));
        assert!(matches!(
            AgentSummary::from_payload(&json!({ "agent_status": { "Total": "many" } })),
            Err(FetchError::Malformed(_))
        ));
    }

    #[test]
    fn test_suggestions_sorted_and_distinct() {
        let suggestions = SearchSuggestions::from_payload(&payload(), false).unwrap();
        assert_eq!(suggestions.group, vec!["db", "Default", "web"]);
        assert_eq!(suggestions.version, vec!["Wazuh v3.9.5", "Wazuh v3.10.2"]);
        assert_eq!(suggestions.os_platform, vec!["centos", "ubuntu"]);
        assert_eq!(suggestions.os_version, vec!["7", "18.04"]);
        assert_eq!(suggestions.for_field("os.name"), &["CentOS Linux", "Ubuntu"]);
        assert_eq!(suggestions.node_name, None);
        assert!(suggestions.for_field("node_name").is_empty());
    }

    #[test]
    fn test_nodes_only_with_cluster() {
        let suggestions = SearchSuggestions::from_payload(&payload(), true).unwrap();
        assert_eq!(
            suggestions.node_name.as_deref(),
            Some(&["master".to_string(), "worker".to_string()][..])
        );
    }

    #[test]
    fn test_natural_order() {
        let mut versions = vec!["v10", "v9", "v1.2", "v1.10", "V1.3"];
        versions.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(versions, vec!["v1.2", "V1.3", "v1.10", "v9", "v10"]);
    }
}
