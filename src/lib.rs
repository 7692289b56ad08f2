#![warn(missing_docs)]
#![doc(html_root_url = "https://docs.rs/wz-table/")]

//! # wz-table
//!
//! Components for the list views of a security-monitoring dashboard built on
//! [bubbletea-rs](https://github.com/joshka/bubbletea-rs): agents, rules,
//! decoders and CDB lists, fetched page by page from the manager API and shown
//! as searchable, paginated tables.
//!
//! ## Overview
//!
//! - [`fetcher`]: paged, filtered, sorted retrieval of a remote collection,
//!   with placeholder rows for records not fetched yet and a request
//!   generation that discards stale responses.
//! - [`paginator`]: page windows, page-link gaps and navigation over an
//!   in-memory collection.
//! - [`table`]: rows, search and rendering on top of the paginator.
//! - [`cdb`]: the editable `key:value` CDB list model and its editor session.
//! - [`remote_table`]: a fetcher and a table composed into one view.
//! - [`transport`]: the collaborators that reach the API (`reqwest` behind
//!   the `http` feature).
//! - [`csv`], [`summary`], [`storage`]: CSV export, agent counters and
//!   search suggestions, and filter persistence between view openings.
//!
//! Components follow the Elm Architecture used by bubbletea-rs: state lives in
//! a model, `update()` consumes messages and may return a command, `view()`
//! renders a string.
//!
//! ## Fetching inside a bubbletea program
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bubbletea_rs::{Cmd, Model, Msg};
//! use wz_table::prelude::*;
//!
//! struct Agents {
//!     table: RemoteTable<serde_json::Value>,
//! }
//!
//! impl Model for Agents {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let transport = Arc::new(
//!             HttpTransport::new(HttpConfig::default()).expect("valid HTTP settings"),
//!         );
//!         let mut table = RemoteTable::json(
//!             DataFactory::agents(),
//!             transport,
//!             &[("ID", "id"), ("Name", "name"), ("Status", "status")],
//!         );
//!         let cmd = table.refresh().ok();
//!         (Self { table }, cmd)
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         self.table.update(msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         self.table.view()
//!     }
//! }
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events with an
//! `event` field (`fetch_completed`, `fetch_stale_discarded`, `cdb_saved`,
//! `http_busy_retry`, ...). It never installs a subscriber.

pub mod cdb;
pub mod csv;
pub mod error;
pub mod fetcher;
pub mod key;
pub mod paginator;
pub mod remote_table;
pub mod storage;
pub mod summary;
pub mod table;
pub mod transport;

pub use cdb::{CdbEditor, CdbList, ListDetails};
pub use error::{ExportError, FetchError, ListError, PageError, StorageError, TransportError};
pub use fetcher::{DataFactory, FetchOptions, FetchOutcome, Filter, FilterSet, Sort};
pub use key::{
    matches, new_binding, with_disabled, with_help, with_keys, with_keys_str, Binding,
    Help as KeyHelp, KeyMap, KeyPress,
};
pub use paginator::Model as Paginator;
pub use remote_table::RemoteTable;
pub use storage::KeyedStore;
pub use summary::{AgentSummary, SearchSuggestions};
pub use table::Model as Table;
pub use transport::{ListStore, Transport};

/// Prelude module for convenient imports.
///
/// ```rust
/// use wz_table::prelude::*;
///
/// let mut list = CdbList::new();
/// list.add_entry("admin", Some("root")).unwrap();
/// let mut paginator = Paginator::new().with_per_page(10).with_total_items(list.len());
/// assert!(paginator.next_page(1).is_err());
/// ```
pub mod prelude {
    pub use crate::cdb::{CdbEditor, CdbList, ListDetails};
    pub use crate::csv::{buffer_to_csv, csv_file_name, export_remote};
    pub use crate::error::{
        ExportError, FetchError, ListError, PageError, StorageError, TransportError,
    };
    pub use crate::fetcher::{
        DataFactory, FetchOptions, FetchOutcome, FetchedMsg, Filter, FilterSet, Sort,
    };
    pub use crate::key::{
        matches, new_binding, with_disabled, with_help, with_keys, with_keys_str, Binding,
        Help as KeyHelp, KeyMap, KeyPress,
    };
    pub use crate::paginator::Model as Paginator;
    pub use crate::remote_table::RemoteTable;
    pub use crate::storage::KeyedStore;
    pub use crate::summary::{AgentSummary, SearchSuggestions};
    pub use crate::table::{Column, Model as Table, Row, SearchMode};
    #[cfg(feature = "http")]
    pub use crate::transport::{HttpConfig, HttpTransport};
    pub use crate::transport::{ListStore, Transport};
}
