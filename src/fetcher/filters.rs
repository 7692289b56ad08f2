//! Filter and sort state sent with every fetch.

use crate::error::StorageError;
use crate::storage::KeyedStore;
use crate::transport::QueryParams;
use serde::{Deserialize, Serialize};

/// A `name=value` constraint applied by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Query parameter name, e.g. `status` or `os.platform`.
    pub name: String,
    /// Value to match.
    pub value: String,
}

impl Filter {
    /// Creates a filter.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Active filters, at most one per name.
///
/// Implicit filters are given at construction (e.g. scoping a view to one
/// agent) and come back whenever the filters are cleared. Removing an implicit
/// filter by name restores its implicit value instead of dropping it.
///
/// ```rust
/// use wz_table::fetcher::{Filter, FilterSet};
///
/// let mut filters = FilterSet::new(vec![Filter::new("agent_id", "004")]);
/// filters.add("status", Some("Active"));
/// filters.add("status", Some("Disconnected"));
/// assert_eq!(filters.get("status"), Some("Disconnected"));
///
/// filters.clear();
/// assert_eq!(filters.active(), &[Filter::new("agent_id", "004")]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    implicit: Vec<Filter>,
    filters: Vec<Filter>,
}

impl FilterSet {
    /// Creates a set holding the implicit filters.
    pub fn new(implicit: Vec<Filter>) -> Self {
        Self {
            filters: implicit.clone(),
            implicit,
        }
    }

    /// Sets `name` to `value`, replacing any previous filter with that name.
    /// `None` removes the filter.
    pub fn add(&mut self, name: &str, value: Option<&str>) {
        self.filters.retain(|f| f.name != name);
        match value {
            Some(value) => self.filters.push(Filter::new(name, value)),
            None => {
                if let Some(implicit) = self.implicit.iter().find(|f| f.name == name) {
                    self.filters.push(implicit.clone());
                }
            }
        }
    }

    /// Drops every user filter and restores the implicit ones.
    pub fn clear(&mut self) {
        self.filters = self.implicit.clone();
    }

    /// Filters in the order they were added.
    pub fn active(&self) -> &[Filter] {
        &self.filters
    }

    /// The filters given at construction.
    pub fn implicit(&self) -> &[Filter] {
        &self.implicit
    }

    /// Value of the filter called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Filters that are not part of the implicit set.
    pub fn user_filters(&self) -> Vec<Filter> {
        self.filters
            .iter()
            .filter(|f| !self.implicit.contains(f))
            .cloned()
            .collect()
    }

    /// Appends one `name=value` parameter per filter. Empty values are not sent.
    pub fn serialize_into(&self, params: &mut QueryParams) {
        for filter in &self.filters {
            if !filter.value.is_empty() {
                params.push((filter.name.clone(), filter.value.clone()));
            }
        }
    }

    /// Saves the user filters of `view` (called when the view closes).
    pub fn persist(&self, store: &KeyedStore, view: &str) -> Result<(), StorageError> {
        store.save_json(view, &self.user_filters())
    }

    /// Re-applies the user filters saved for `view` (called when the view
    /// opens). Returns false when nothing was saved.
    pub fn restore(&mut self, store: &KeyedStore, view: &str) -> Result<bool, StorageError> {
        let Some(saved) = store.load_json::<Vec<Filter>>(view)? else {
            return Ok(false);
        };
        self.clear();
        for filter in saved {
            self.add(&filter.name, Some(&filter.value));
        }
        Ok(true)
    }
}

/// Sort order requested from the remote API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    /// Field to sort by; `None` leaves ordering to the server.
    pub field: Option<String>,
    /// Descending when true.
    pub descending: bool,
}

impl Sort {
    /// Sorting by the current field flips the direction; a new field starts ascending.
    ///
    /// ```rust
    /// use wz_table::fetcher::Sort;
    ///
    /// let mut sort = Sort::default();
    /// sort.toggle("name");
    /// sort.toggle("name");
    /// assert!(sort.descending);
    /// sort.toggle("ip");
    /// assert_eq!(sort.field.as_deref(), Some("ip"));
    /// assert!(!sort.descending);
    /// ```
    pub fn toggle(&mut self, field: &str) {
        if self.field.as_deref() == Some(field) {
            self.descending = !self.descending;
        } else {
            self.field = Some(field.to_string());
            self.descending = false;
        }
    }

    /// The `sort` parameter value: the field, prefixed with `-` when descending.
    pub fn param(&self) -> Option<String> {
        self.field.as_ref().map(|field| {
            if self.descending {
                format!("-{field}")
            } else {
                field.clone()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_replaces_and_none_removes() {
        let mut filters = FilterSet::default();
        filters.add("status", Some("Active"));
        filters.add("group", Some("default"));
        filters.add("status", Some("Disconnected"));
        assert_eq!(filters.active().len(), 2);
        assert_eq!(filters.get("status"), Some("Disconnected"));

        filters.add("status", None);
        assert_eq!(filters.get("status"), None);
        assert_eq!(filters.active(), &[Filter::new("group", "default")]);
    }

    #[test]
    fn test_implicit_filters_survive_removal() {
        let mut filters = FilterSet::new(vec![Filter::new("agent_id", "007")]);
        filters.add("agent_id", Some("008"));
        assert_eq!(filters.get("agent_id"), Some("008"));
        filters.add("agent_id", None);
        assert_eq!(filters.get("agent_id"), Some("007"));

        filters.add("q", Some("name=web"));
        filters.clear();
        assert_eq!(filters.active(), filters.implicit());
    }

    #[test]
    fn test_serialize_skips_empty_values() {
        let mut filters = FilterSet::default();
        filters.add("search", Some(""));
        filters.add("status", Some("Active"));
        let mut params = QueryParams::new();
        filters.serialize_into(&mut params);
        assert_eq!(params, vec![("status".to_string(), "Active".to_string())]);
    }

    #[test]
    fn test_sort_toggle_sequence() {
        let mut sort = Sort::default();
        assert_eq!(sort.param(), None);
        sort.toggle("name");
        assert_eq!(sort.param().as_deref(), Some("name"));
        sort.toggle("name");
        assert_eq!(
            sort,
            Sort {
                field: Some("name".into()),
                descending: true
            }
        );
        assert_eq!(sort.param().as_deref(), Some("-name"));
        sort.toggle("other");
        assert_eq!(
            sort,
            Sort {
                field: Some("other".into()),
                descending: false
            }
        );
    }

    #[test]
    fn test_persist_and_restore_user_filters() {
        let store = KeyedStore::new();
        let mut filters = FilterSet::new(vec![Filter::new("agent_id", "001")]);
        filters.add("status", Some("Active"));
        filters.persist(&store, "agents").unwrap();

        let mut reopened = FilterSet::new(vec![Filter::new("agent_id", "001")]);
        assert!(reopened.restore(&store, "agents").unwrap());
        assert_eq!(reopened, filters);

        let mut other = FilterSet::default();
        assert!(!other.restore(&store, "rules").unwrap());
    }
}
