//! Editable CDB lists.
//!
//! A CDB list is a file of `key:value` lines used by the rules engine for
//! lookups. [`CdbList`] holds one in memory as an ordered map: keys are
//! unique, iteration follows insertion order, and every mutation either
//! applies completely or fails without touching the map.
//!
//! ```rust
//! use wz_table::cdb::CdbList;
//!
//! let mut list = CdbList::deserialize("root:admin\nguest:\n");
//! list.add_entry("ops", Some("team")).unwrap();
//! list.edit_key("guest", "visitor").unwrap();
//! assert_eq!(list.serialize(), "root:admin\nguest:visitor\nops:team\n");
//! ```
//!
//! Keys and values are stored verbatim. Only the first colon separates key
//! from value, so values may contain `:`. Keys may not, and neither keys nor
//! values may contain `\n` or `\r`: [`CdbList::serialize`] never escapes, so
//! every list the API accepts parses back to itself.

pub mod editor;

pub use editor::{CdbEditor, ListDetails, DEFAULT_LISTS_PATH};

use crate::error::ListError;
use indexmap::IndexMap;

/// Ordered key/value list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CdbList {
    entries: IndexMap<String, String>,
}

impl CdbList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `key` with `value` (empty when `None`).
    ///
    /// # Errors
    ///
    /// [`ListError::EmptyKey`] for an empty key, [`ListError::InvalidKey`] or
    /// [`ListError::InvalidValue`] for text the file format cannot hold,
    /// [`ListError::DuplicateKey`] when the key is already present.
    pub fn add_entry(&mut self, key: &str, value: Option<&str>) -> Result<(), ListError> {
        validate_entry(key, value.unwrap_or_default())?;
        if self.entries.contains_key(key) {
            return Err(ListError::DuplicateKey(key.to_string()));
        }
        self.entries
            .insert(key.to_string(), value.unwrap_or_default().to_string());
        Ok(())
    }

    /// Replaces the value of `key` without moving it.
    ///
    /// # Errors
    ///
    /// [`ListError::NotFound`] when the key is absent,
    /// [`ListError::InvalidValue`] when `value` contains a line break.
    pub fn edit_key(&mut self, key: &str, value: &str) -> Result<(), ListError> {
        if has_line_break(value) {
            return Err(ListError::InvalidValue(key.to_string()));
        }
        let slot = self
            .entries
            .get_mut(key)
            .ok_or_else(|| ListError::NotFound(key.to_string()))?;
        *slot = value.to_string();
        Ok(())
    }

    /// Removes `key`, keeping the order of the others. Absent keys are ignored.
    pub fn remove_entry(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    /// Value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// True when `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// A fresh copy of the entries as pairs, in order.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// `key:value` per entry, each line newline-terminated.
    pub fn serialize(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}:{v}\n"))
            .collect()
    }

    /// Parses `key:value` lines.
    ///
    /// Each line is split at its first colon. Lines without a colon or with an
    /// empty key are skipped. A repeated key takes the later value but keeps
    /// the position of its first occurrence.
    ///
    /// ```rust
    /// use wz_table::cdb::CdbList;
    ///
    /// let list = CdbList::deserialize("a:1\nb:2\na:3\nno colon\n");
    /// assert_eq!(list.to_pairs(), vec![("a".into(), "3".into()), ("b".into(), "2".into())]);
    /// ```
    pub fn deserialize(text: &str) -> Self {
        let mut entries = IndexMap::new();
        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            if key.is_empty() {
                continue;
            }
            entries.insert(key.to_string(), value.to_string());
        }
        Self { entries }
    }

    /// Builds a list from pairs, with the checks of [`add_entry`](Self::add_entry).
    ///
    /// ```rust
    /// use wz_table::cdb::CdbList;
    /// use wz_table::error::ListError;
    ///
    /// let list = CdbList::from_pairs([("root", "admin"), ("url", "http://a:80")]).unwrap();
    /// assert_eq!(list.len(), 2);
    /// assert!(matches!(CdbList::from_pairs([("", "x")]), Err(ListError::EmptyKey)));
    /// ```
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, ListError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut list = Self::new();
        for (key, value) in pairs {
            list.add_entry(key.as_ref(), Some(value.as_ref()))?;
        }
        Ok(list)
    }
}

impl TryFrom<Vec<(String, String)>> for CdbList {
    type Error = ListError;

    fn try_from(pairs: Vec<(String, String)>) -> Result<Self, Self::Error> {
        Self::from_pairs(pairs)
    }
}

fn has_line_break(text: &str) -> bool {
    text.contains(['\n', '\r'])
}

fn validate_entry(key: &str, value: &str) -> Result<(), ListError> {
    if key.is_empty() {
        return Err(ListError::EmptyKey);
    }
    if key.contains(':') || has_line_break(key) {
        return Err(ListError::InvalidKey(key.to_string()));
    }
    if has_line_break(value) {
        return Err(ListError::InvalidValue(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CdbList {
        CdbList::from_pairs([("root", "admin"), ("guest", ""), ("url", "http://a:8080")]).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let list = sample();
        assert_eq!(CdbList::deserialize(&list.serialize()), list);
        assert_eq!(CdbList::deserialize(""), CdbList::new());
        assert_eq!(CdbList::new().serialize(), "");
    }

    #[test]
    fn test_value_containing_colon() {
        let list = CdbList::deserialize("url:http://a:8080\n");
        assert_eq!(list.get("url"), Some("http://a:8080"));
    }

    #[test]
    fn test_duplicate_rejected_without_change() {
        let mut list = CdbList::new();
        list.add_entry("k", Some("v1")).unwrap();
        let err = list.add_entry("k", Some("v2")).unwrap_err();
        assert!(matches!(err, ListError::DuplicateKey(ref k) if k == "k"));
        assert_eq!(list.get("k"), Some("v1"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut list = sample();
        let before = list.clone();
        assert!(matches!(list.add_entry("", Some("x")), Err(ListError::EmptyKey)));
        assert_eq!(list, before);
    }

    #[test]
    fn test_add_defaults_to_empty_value_at_end() {
        let mut list = sample();
        list.add_entry("new", None).unwrap();
        assert_eq!(list.to_pairs().last(), Some(&("new".to_string(), String::new())));
    }

    #[test]
    fn test_edit_keeps_position() {
        let mut list = sample();
        list.edit_key("root", "nobody").unwrap();
        assert_eq!(list.to_pairs()[0], ("root".to_string(), "nobody".to_string()));
        assert!(matches!(
            list.edit_key("missing", "x"),
            Err(ListError::NotFound(_))
        ));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut list = sample();
        assert_eq!(list.remove_entry("guest").as_deref(), Some(""));
        assert_eq!(list.remove_entry("guest"), None);
        let keys: Vec<&str> = list.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["root", "url"]);
    }

    #[test]
    fn test_last_write_wins_keeps_first_position() {
        let list = CdbList::deserialize("a:1\nb:2\na:3");
        assert_eq!(list.serialize(), "a:3\nb:2\n");
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let list = CdbList::deserialize("\nno colon\n:orphan\nk:v\r\n");
        assert_eq!(list.len(), 1);
        assert_eq!(list.get("k"), Some("v"));
    }

    #[test]
    fn test_to_pairs_is_a_copy() {
        let mut list = sample();
        let pairs = list.to_pairs();
        list.remove_entry("root");
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn test_unrepresentable_entries_rejected() {
        let mut list = sample();
        let before = list.clone();
        assert!(matches!(
            list.add_entry("a", Some("1\nevil:2")),
            Err(ListError::InvalidValue(ref k)) if k == "a"
        ));
        assert!(matches!(
            list.add_entry("a", Some("v\r")),
            Err(ListError::InvalidValue(_))
        ));
        for key in ["a:b", "a\nb", "a\r"] {
            assert!(matches!(
                list.add_entry(key, Some("v")),
                Err(ListError::InvalidKey(ref k)) if k == key
            ));
        }
        assert!(matches!(
            list.edit_key("root", "x\nevil:2"),
            Err(ListError::InvalidValue(_))
        ));
        assert_eq!(list, before);
        assert_eq!(CdbList::deserialize(&list.serialize()), list);
    }

    #[test]
    fn test_from_pairs_validates() {
        assert!(matches!(
            CdbList::from_pairs([("ok", "1"), ("", "x")]),
            Err(ListError::EmptyKey)
        ));
        assert!(matches!(
            CdbList::from_pairs([("a", "1"), ("a", "2")]),
            Err(ListError::DuplicateKey(_))
        ));
        let pairs = vec![("k".to_string(), "v:w".to_string())];
        let list = CdbList::try_from(pairs).unwrap();
        assert_eq!(CdbList::deserialize(&list.serialize()), list);
    }
}
