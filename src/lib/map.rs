//! Ordered key/value mapping shared by both codecs and the reconciler.

use std::fmt;

/// An ordered set of environment variables.
///
/// Insertion order is kept so that encoding reproduces the order variables
/// were read in, but it plays no part in equality: two maps are equal when
/// they hold the same keys with the same values.
#[derive(Debug, Clone, Default)]
pub struct EnvMap {
  entries: Vec<(String, String)>,
}

impl EnvMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts `key` with `value`, returning the previous value if the key was
  /// already present. A replaced key keeps its original position.
  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
    let key = key.into();
    let value = value.into();

    match self.entries.iter_mut().find(|(k, _)| *k == key) {
      Some((_, existing)) => Some(std::mem::replace(existing, value)),
      None => {
        self.entries.push((key, value));
        None
      }
    }
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self
      .entries
      .iter()
      .find_map(|(k, v)| if k == key { Some(v.as_str()) } else { None })
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.get(key).is_some()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.iter().map(|(k, _)| k.as_str())
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

impl PartialEq for EnvMap {
  fn eq(&self, other: &Self) -> bool {
    self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
  }
}

impl Eq for EnvMap {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvMap {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut map = Self::new();
    map.extend(iter);
    map
  }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for EnvMap {
  fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
    for (key, value) in iter {
      self.insert(key, value);
    }
  }
}

impl IntoIterator for EnvMap {
  type Item = (String, String);
  type IntoIter = std::vec::IntoIter<(String, String)>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.into_iter()
  }
}

/// Renders the map in the local env-file format. See [`crate::parse::encode`].
impl fmt::Display for EnvMap {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&crate::parse::encode(self))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_insert_replaces_in_place() {
    let mut map = EnvMap::new();
    map.insert("A", "1");
    map.insert("B", "2");

    assert_eq!(map.insert("A", "3"), Some("1".to_string()));
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    assert_eq!(map.get("A"), Some("3"));
  }

  #[test]
  fn test_equality_ignores_order() {
    let left: EnvMap = [("A", "1"), ("B", "2")].into_iter().collect();
    let right: EnvMap = [("B", "2"), ("A", "1")].into_iter().collect();
    assert_eq!(left, right);

    let different: EnvMap = [("A", "1"), ("B", "x")].into_iter().collect();
    assert_ne!(left, different);

    let shorter: EnvMap = [("A", "1")].into_iter().collect();
    assert_ne!(left, shorter);
  }
}
