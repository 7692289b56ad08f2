//! Editing session for one CDB list.

use super::CdbList;
use crate::error::ListError;
use crate::table::{self, Column, Row};
use crate::transport::ListStore;
use tracing::{debug, info, warn};

/// Directory new lists are created in.
pub const DEFAULT_LISTS_PATH: &str = "etc/lists";

/// Where a list is stored on the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDetails {
    /// File name, without directory.
    pub file: String,
    /// Directory relative to the installation root.
    pub path: String,
}

impl Default for ListDetails {
    fn default() -> Self {
        Self {
            file: String::new(),
            path: DEFAULT_LISTS_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    list: CdbList,
    details: ListDetails,
    new_file: bool,
}

/// State of the CDB list editor: the open list, the entry being edited, the
/// entry waiting for removal confirmation and the table showing the entries.
///
/// The table is rebuilt after every mutation so its pages and totals always
/// match the list.
///
/// ```rust
/// use wz_table::cdb::CdbEditor;
///
/// let mut editor = CdbEditor::new().with_admin_mode(true);
/// editor.add_new_file();
/// editor.set_file_name("blocked-ips").unwrap();
/// editor.add_entry("10.0.0.1", Some("scanner")).unwrap();
/// assert_eq!(editor.table().total_items(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CdbEditor {
    session: Option<Session>,
    editing: Option<(String, String)>,
    removing: Option<String>,
    admin_mode: bool,
    table: table::Model,
}

impl Default for CdbEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl CdbEditor {
    /// A closed editor with a ten-row key/value table. Admin mode is off, so
    /// lists can be browsed but not saved.
    pub fn new() -> Self {
        Self {
            session: None,
            editing: None,
            removing: None,
            admin_mode: false,
            table: table::Model::new(vec![Column::new("Key"), Column::new("Value")])
                .with_per_page(10),
        }
    }

    /// Allows saving (builder pattern).
    pub fn with_admin_mode(mut self, enabled: bool) -> Self {
        self.admin_mode = enabled;
        self
    }

    pub fn set_admin_mode(&mut self, enabled: bool) {
        self.admin_mode = enabled;
    }

    /// True when lists may be saved.
    pub fn admin_mode(&self) -> bool {
        self.admin_mode
    }

    /// Opens an existing list from its file content.
    pub fn open(&mut self, details: ListDetails, content: &str) {
        self.start(Session {
            list: CdbList::deserialize(content),
            details,
            new_file: false,
        });
    }

    /// Opens an empty, unnamed list in [`DEFAULT_LISTS_PATH`].
    pub fn add_new_file(&mut self) {
        self.start(Session {
            list: CdbList::new(),
            details: ListDetails::default(),
            new_file: true,
        });
    }

    fn start(&mut self, session: Session) {
        debug!(event = "cdb_opened", file = %session.details.file, entries = session.list.len());
        self.session = Some(session);
        self.editing = None;
        self.removing = None;
        self.table.search("");
        self.refresh();
    }

    /// True while a list is open.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// True when the open list has never been saved.
    pub fn is_new_file(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.new_file)
    }

    /// The open list.
    pub fn list(&self) -> Option<&CdbList> {
        self.session.as_ref().map(|s| &s.list)
    }

    /// File and path of the open list.
    pub fn details(&self) -> Option<&ListDetails> {
        self.session.as_ref().map(|s| &s.details)
    }

    /// Names the open list. Validation happens on save.
    pub fn set_file_name(&mut self, file: &str) -> Result<(), ListError> {
        self.session_mut()?.details.file = file.to_string();
        Ok(())
    }

    /// Table of the entries.
    pub fn table(&self) -> &table::Model {
        &self.table
    }

    /// Mutable table, for key handling and paging.
    pub fn table_mut(&mut self) -> &mut table::Model {
        &mut self.table
    }

    fn session_mut(&mut self) -> Result<&mut Session, ListError> {
        self.session.as_mut().ok_or(ListError::NotEditing)
    }

    /// Appends an entry. See [`CdbList::add_entry`].
    pub fn add_entry(&mut self, key: &str, value: Option<&str>) -> Result<(), ListError> {
        self.session_mut()?.list.add_entry(key, value)?;
        self.refresh();
        Ok(())
    }

    /// Starts editing `key`, pre-filling the new value.
    pub fn set_editing_key(&mut self, key: &str, value: &str) {
        self.editing = Some((key.to_string(), value.to_string()));
    }

    /// Stops editing without changing anything.
    pub fn cancel_editing_key(&mut self) {
        self.editing = None;
    }

    /// Key currently being edited.
    pub fn editing_key(&self) -> Option<&str> {
        self.editing.as_ref().map(|(k, _)| k.as_str())
    }

    /// Value typed so far for the key being edited.
    pub fn editing_value(&self) -> Option<&str> {
        self.editing.as_ref().map(|(_, v)| v.as_str())
    }

    /// Sets the value of `key` and ends the edit.
    pub fn edit_key(&mut self, key: &str, value: &str) -> Result<(), ListError> {
        self.session_mut()?.list.edit_key(key, value)?;
        self.cancel_editing_key();
        self.refresh();
        Ok(())
    }

    /// Asks for confirmation before removing `key`.
    pub fn show_confirm_remove_entry(&mut self, key: &str) {
        self.removing = Some(key.to_string());
    }

    /// Drops the pending removal.
    pub fn cancel_remove_entry(&mut self) {
        self.removing = None;
    }

    /// Key waiting for removal confirmation.
    pub fn removing_entry(&self) -> Option<&str> {
        self.removing.as_deref()
    }

    /// Removes the key waiting for confirmation, returning its value.
    /// `Ok(None)` when nothing was pending or the key was already gone.
    pub fn confirm_remove_entry(&mut self) -> Result<Option<String>, ListError> {
        let Some(key) = self.removing.take() else {
            return Ok(None);
        };
        let session = self.session_mut()?;
        let removed = session.list.remove_entry(&key);
        if self.editing_key() == Some(key.as_str()) {
            self.cancel_editing_key();
        }
        self.refresh();
        Ok(removed)
    }

    /// Shows only the entries matching `term`, from the first page.
    pub fn filter_content(&mut self, term: &str) {
        self.table.search(term);
    }

    /// Closes the list without saving.
    pub fn cancel_edition(&mut self) {
        self.session = None;
        self.removing = None;
        self.cancel_editing_key();
        self.table.search("");
        self.table.set_rows(Vec::new());
    }

    fn refresh(&mut self) {
        let rows = self
            .session
            .as_ref()
            .map(|s| {
                s.list
                    .iter()
                    .map(|(k, v)| Row::new(vec![k.to_string(), v.to_string()]))
                    .collect()
            })
            .unwrap_or_default();
        self.table.set_rows(rows);
    }

    /// Validates the file name and stores the list through `store`. The
    /// editor is closed on success.
    ///
    /// # Errors
    ///
    /// [`ListError::Forbidden`] when admin mode is off,
    /// [`ListError::MissingName`] or [`ListError::InvalidName`], all before any
    /// request is made, [`ListError::Remote`] when the store answers with a
    /// non-zero code, [`ListError::Transport`] when it cannot be reached.
    pub async fn save_list(&mut self, store: &dyn ListStore) -> Result<ListDetails, ListError> {
        let session = self.session.as_ref().ok_or(ListError::NotEditing)?;
        if !self.admin_mode {
            warn!(event = "cdb_save_forbidden", file = %session.details.file);
            return Err(ListError::Forbidden);
        }
        let details = session.details.clone();
        validate_file_name(&details.file)?;

        let content = session.list.serialize();
        let response = store.save(&details.file, &details.path, &content).await?;
        if response.error != 0 {
            warn!(
                event = "cdb_save_failed",
                file = %details.file,
                code = response.error,
                message = response.message.as_deref().unwrap_or_default()
            );
            return Err(ListError::Remote {
                file: details.file,
                code: response.error,
            });
        }

        info!(
            event = "cdb_saved",
            file = %details.file,
            path = %details.path,
            entries = session.list.len()
        );
        self.cancel_edition();
        Ok(details)
    }
}

/// Checks a CDB file name: it must be non-empty and contain no whitespace.
pub fn validate_file_name(file: &str) -> Result<(), ListError> {
    if file.is_empty() {
        return Err(ListError::MissingName);
    }
    if file.chars().any(char::is_whitespace) {
        return Err(ListError::InvalidName(file.to_string()));
    }
    Ok(())
}
