//! Decoder for the output of `convex env list`.
//!
//! The listing prints `KEY=value` pairs without any quoting. A value that
//! contains newlines simply continues on the following lines until the next
//! line that starts with an identifier followed by `=`.

use crate::map::EnvMap;

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

pub fn decode(output: &str) -> EnvMap {
  let mut map = EnvMap::new();
  let mut pending: Option<(&str, String)> = None;

  for line in output.split('\n') {
    if let Some((key, value)) = split_assignment(line) {
      if let Some((key, value)) = pending.take() {
        map.insert(key, value);
      }

      #[cfg(feature = "tracing")]
      trace!(%key, "Remote variable");

      pending = Some((key, value.to_string()));
    } else if let Some((_, value)) = pending.as_mut() {
      value.push('\n');
      value.push_str(line);
    }
  }

  if let Some((key, value)) = pending {
    map.insert(key, value);
  }

  #[cfg(feature = "tracing")]
  debug!("Decoded {} remote variables", map.len());

  map
}

/// Splits `line` into key and value if it starts with `[A-Za-z_][A-Za-z0-9_]*=`.
fn split_assignment(line: &str) -> Option<(&str, &str)> {
  let (key, value) = line.split_once('=')?;
  is_identifier(key).then_some((key, value))
}

pub(crate) fn is_identifier(s: &str) -> bool {
  let mut chars = s.chars();
  matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
