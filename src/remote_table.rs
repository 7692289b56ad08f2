//! A paged table backed by a remote collection.
//!
//! [`RemoteTable`] wires a [`DataFactory`] to a [`table::Model`]: the
//! factory fills the buffer, the table pages and searches it. Moving onto a
//! page that still shows placeholder rows fetches the next missing block;
//! changing filters or sort starts over from the first page.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wz_table::fetcher::DataFactory;
//! use wz_table::remote_table::RemoteTable;
//! use wz_table::transport::{HttpConfig, HttpTransport};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(HttpTransport::new(HttpConfig::default())?);
//! let mut agents = RemoteTable::json(
//!     DataFactory::agents(),
//!     transport,
//!     &[("ID", "id"), ("Name", "name"), ("OS", "os.name"), ("Status", "status")],
//! )
//! .with_per_page(15);
//! let _first_page = agents.refresh()?;
//! # Ok(())
//! # }
//! ```

use crate::error::{FetchError, PageError};
use crate::fetcher::{DataFactory, FetchOptions, FetchedMsg, DEFAULT_LIMIT};
use crate::table::{self, Column, Row};
use crate::transport::Transport;
use bubbletea_rs::{Cmd, Msg};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Turns a record into a table row.
pub type RowMapper<T> = Arc<dyn Fn(&T) -> Row + Send + Sync>;

/// Remote collection shown as a searchable, paged table.
pub struct RemoteTable<T> {
    factory: DataFactory<T>,
    table: table::Model,
    transport: Arc<dyn Transport>,
    to_row: RowMapper<T>,
    limit: usize,
    pending: Option<usize>,
    error: Option<String>,
}

impl RemoteTable<Value> {
    /// A table over JSON records. Each column is `(title, field)`; dotted
    /// fields such as `os.name` reach into nested objects.
    pub fn json(
        factory: DataFactory<Value>,
        transport: Arc<dyn Transport>,
        columns: &[(&str, &str)],
    ) -> Self {
        let fields: Vec<String> = columns
            .iter()
            .map(|(_, field)| format!("/{}", field.replace('.', "/")))
            .collect();
        Self::new(
            factory,
            transport,
            columns.iter().map(|(title, _)| Column::new(*title)).collect(),
            move |record: &Value| {
                fields
                    .iter()
                    .map(|pointer| match record.pointer(pointer) {
                        None | Some(Value::Null) => String::new(),
                        Some(Value::String(s)) => s.clone(),
                        Some(other) => other.to_string(),
                    })
                    .collect()
            },
        )
    }
}

impl<T> RemoteTable<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    /// Creates the table. Nothing is fetched until [`refresh`](Self::refresh).
    pub fn new(
        factory: DataFactory<T>,
        transport: Arc<dyn Transport>,
        columns: Vec<Column>,
        to_row: impl Fn(&T) -> Row + Send + Sync + 'static,
    ) -> Self {
        Self {
            factory,
            table: table::Model::new(columns),
            transport,
            to_row: Arc::new(to_row),
            limit: DEFAULT_LIMIT,
            pending: None,
            error: None,
        }
    }

    /// Rows per page (builder pattern).
    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.table.paginator.set_per_page(per_page);
        self
    }

    /// Records per request (builder pattern). Zero is clamped to 1.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn factory(&self) -> &DataFactory<T> {
        &self.factory
    }

    pub fn table(&self) -> &table::Model {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut table::Model {
        &mut self.table
    }

    /// True while a page request is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Message of the last failed fetch, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Starts a new query from the first page.
    pub fn refresh(&mut self) -> Result<Cmd, FetchError> {
        let cmd = self.factory.fetch_cmd(
            Arc::clone(&self.transport),
            FetchOptions::first_page(self.limit),
        )?;
        self.pending = Some(0);
        self.table.paginator.reset();
        self.sync_table();
        Ok(cmd)
    }

    /// Sets or removes a filter and re-queries.
    pub fn add_filter(&mut self, name: &str, value: Option<&str>) -> Result<Cmd, FetchError> {
        self.factory.add_filter(name, value);
        self.refresh()
    }

    /// Clears the user filters and re-queries.
    pub fn remove_filters(&mut self) -> Result<Cmd, FetchError> {
        self.factory.remove_filters();
        self.refresh()
    }

    /// Toggles sorting by `field` and re-queries.
    pub fn sort_by(&mut self, field: &str) -> Result<Cmd, FetchError> {
        self.factory.add_sorting(field);
        self.refresh()
    }

    /// Jumps to a page. Call [`ensure_loaded`](Self::ensure_loaded) afterwards
    /// to fetch its rows.
    pub fn next_page(&mut self, requested: usize) -> Result<(), PageError> {
        self.table.next_page(requested)
    }

    /// Fetches the next missing block when the current page shows placeholders
    /// and no request is in flight.
    pub fn ensure_loaded(&mut self) -> Result<Option<Cmd>, FetchError> {
        if self.pending.is_some() || self.table.paged_rows().iter().all(Option::is_some) {
            return Ok(None);
        }
        let Some(offset) = self.factory.next_offset() else {
            return Ok(None);
        };
        let cmd = self.factory.fetch_cmd(
            Arc::clone(&self.transport),
            FetchOptions::page(offset, self.limit),
        )?;
        self.pending = Some(offset);
        Ok(Some(cmd))
    }

    /// Handles fetch results and navigation keys. Returns the next fetch when
    /// the visible page still needs rows.
    pub fn update(&mut self, msg: Msg) -> Option<Cmd> {
        if msg.is::<FetchedMsg<T>>() {
            match self.factory.update(msg)? {
                Ok(_) => {
                    self.pending = None;
                    self.error = None;
                    self.sync_table();
                }
                Err(err) => {
                    warn!(event = "remote_table_fetch_failed", path = self.factory.path(), error = %err);
                    self.pending = None;
                    self.error = Some(err.to_string());
                    return None;
                }
            }
        } else {
            self.table.update(&msg);
        }

        match self.ensure_loaded() {
            Ok(cmd) => cmd,
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }

    fn sync_table(&mut self) {
        let to_row = &self.to_row;
        let slots = self
            .factory
            .items()
            .into_iter()
            .map(|item| item.map(|record| to_row(record)))
            .collect();
        self.table.set_slots(slots);
    }

    pub fn view(&self) -> String {
        match &self.error {
            Some(error) => format!("{}\n  {error}", self.table.view()),
            None => self.table.view(),
        }
    }
}
