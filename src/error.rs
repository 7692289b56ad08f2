//! Error types for every component in the crate.
//!
//! Each concern has its own enum so callers can match on exactly the failures
//! an operation can produce. Stale fetch responses are not errors: they are
//! discarded inside the fetcher and never reach a caller.

use thiserror::Error;

/// Failure of the transport layer itself (network, HTTP status, body decoding).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection or protocol failure.
    #[error("request failed: {0}")]
    Request(String),
    /// Non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// Body could not be decoded.
    #[error("response body is not valid JSON: {0}")]
    Decode(String),
    /// Write refused locally because admin mode is off.
    #[error("forbidden, enable admin mode")]
    Forbidden,
    /// Busy codes kept coming back until the retry budget ran out.
    #[error("remote kept answering with busy code {code} after {attempts} attempts")]
    RetriesExhausted { code: i64, attempts: u32 },
}

/// Failure of a remote list fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Well-formed response carrying a non-zero error code.
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },
    /// The response lacks the expected list payload.
    #[error("malformed response: {0}")]
    Malformed(String),
    /// A zero page size was requested.
    #[error("fetch limit must be greater than zero")]
    InvalidLimit,
}

/// Failure of a pagination operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// Requested page is not in `[0, page_count)`.
    #[error("page {requested} is out of range (page count {page_count})")]
    OutOfRange { requested: usize, page_count: usize },
    /// `per_page` was zero.
    #[error("items per page must be greater than zero")]
    ZeroPageSize,
}

/// Failure of a CDB list mutation or save.
#[derive(Debug, Error)]
pub enum ListError {
    /// Key was empty.
    #[error("cannot send empty fields")]
    EmptyKey,
    /// Key contains `:` or a line break, which the `key:value` format cannot hold.
    #[error("the key {0:?} cannot contain ':' or line breaks")]
    InvalidKey(String),
    /// Value of the named key contains a line break.
    #[error("the value of {0:?} cannot contain line breaks")]
    InvalidValue(String),
    /// Key is already present.
    #[error("the key {0:?} already exists")]
    DuplicateKey(String),
    /// Key is absent.
    #[error("the key {0:?} does not exist")]
    NotFound(String),
    /// File name was empty.
    #[error("please set a name for the CDB list")]
    MissingName,
    /// File name contains whitespace.
    #[error("the file name {0:?} cannot contain white spaces")]
    InvalidName(String),
    /// Write attempted while admin mode is off.
    #[error("forbidden, enable admin mode")]
    Forbidden,
    /// Operation needs an open list.
    #[error("no CDB list is being edited")]
    NotEditing,
    /// Persistence endpoint answered with a non-zero error.
    #[error("saving {file} failed with remote error {code}")]
    Remote { file: String, code: i64 },
    /// The transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Failure reading or writing process-wide persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Stored JSON could not be parsed.
    #[error("stored value for {key:?} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// Value could not be encoded.
    #[error("cannot serialize value for {key:?}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure exporting a collection to CSV.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Paging the remote collection failed.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
    /// Writing a record failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// Writer produced invalid UTF-8.
    #[error("csv output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
