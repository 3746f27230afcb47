//! Local env-file codec.
//!
//! The format is line oriented `KEY=value` text. Values may be wrapped in
//! double or single quotes, and a double-quoted value may span several lines:
//!
//! ```text
//! # comment
//! API_URL="https://example.com"
//! CONFIG='{"debug":true}'
//! PRIVATE_KEY="-----BEGIN KEY-----
//! abc
//! -----END KEY-----"
//! ```
//!
//! Encoding and decoding are not exact inverses for values that contain both a
//! newline and a `"`: the multiline form carries quotes unescaped.

use crate::map::EnvMap;

#[cfg(feature = "tracing")]
use tracing::{debug, trace, warn};

const COMMENT_PREFIX: &str = "#";
const ASSIGNMENT_OPERATOR: char = '=';
const DOUBLE_QUOTE: char = '"';
const SINGLE_QUOTE: char = '\'';
const ESCAPED_QUOTE: &str = "\\\"";

/// Decodes env-file text, dropping a trailing multiline value that is never
/// closed.
pub fn decode(input: &str) -> EnvMap {
  let (map, unterminated) = scan(input);

  if let Some(_key) = unterminated {
    #[cfg(feature = "tracing")]
    warn!(key = %_key, "Unterminated multiline value dropped");
  }

  map
}

/// Decodes env-file text, failing if the input ends inside a multiline value.
pub fn decode_strict(input: &str) -> Result<EnvMap, ParseError> {
  match scan(input) {
    (map, None) => Ok(map),
    (_, Some(key)) => Err(ParseError::UnterminatedMultiline { key }),
  }
}

/// Encodes `map` as env-file text, one line per variable in insertion order.
///
/// No trailing newline is written.
pub fn encode(map: &EnvMap) -> String {
  map
    .iter()
    .map(|(key, value)| {
      if value.contains('\n') {
        format!("{key}{ASSIGNMENT_OPERATOR}{DOUBLE_QUOTE}{value}{DOUBLE_QUOTE}")
      } else if value.starts_with('{') || value.starts_with('[') {
        format!("{key}{ASSIGNMENT_OPERATOR}{SINGLE_QUOTE}{value}{SINGLE_QUOTE}")
      } else {
        let escaped = value.replace(DOUBLE_QUOTE, ESCAPED_QUOTE);
        format!("{key}{ASSIGNMENT_OPERATOR}{DOUBLE_QUOTE}{escaped}{DOUBLE_QUOTE}")
      }
    })
    .collect::<Vec<_>>()
    .join("\n")
}

enum ScanState {
  Idle,
  Multiline { key: String, value: String },
}

/// Runs the line scanner. Returns the decoded map and, if the input ended
/// inside a multiline value, the key that was left open.
fn scan(input: &str) -> (EnvMap, Option<String>) {
  #[cfg(feature = "tracing")]
  debug!("Decoding env text with {} lines", input.split('\n').count());

  let mut map = EnvMap::new();
  let mut state = ScanState::Idle;

  for line in input.split('\n') {
    state = match state {
      ScanState::Multiline { key, mut value } => {
        value.push('\n');
        value.push_str(line);

        if closes_multiline(line) {
          value.pop();

          #[cfg(feature = "tracing")]
          trace!(%key, "Closed multiline value");

          map.insert(key, value);
          ScanState::Idle
        } else {
          ScanState::Multiline { key, value }
        }
      }
      ScanState::Idle => scan_line(line, &mut map),
    };
  }

  #[cfg(feature = "tracing")]
  debug!("Decoded {} variables", map.len());

  match state {
    ScanState::Idle => (map, None),
    ScanState::Multiline { key, .. } => (map, Some(key)),
  }
}

fn scan_line(line: &str, map: &mut EnvMap) -> ScanState {
  if line.starts_with(COMMENT_PREFIX) || line.trim().is_empty() {
    return ScanState::Idle;
  }

  let Some((key, raw)) = line.split_once(ASSIGNMENT_OPERATOR) else {
    #[cfg(feature = "tracing")]
    trace!("Skipping line without assignment: {:?}", line);
    return ScanState::Idle;
  };

  if raw.starts_with(DOUBLE_QUOTE) && !raw.ends_with(DOUBLE_QUOTE) {
    #[cfg(feature = "tracing")]
    trace!(%key, "Opened multiline value");

    return ScanState::Multiline {
      key: key.to_string(),
      value: raw[DOUBLE_QUOTE.len_utf8()..].to_string(),
    };
  }

  let value = strip_quotes(raw).replace(ESCAPED_QUOTE, "\"");

  #[cfg(feature = "tracing")]
  trace!(%key, "Parsed variable");

  map.insert(key, value);
  ScanState::Idle
}

fn closes_multiline(line: &str) -> bool {
  line.ends_with(DOUBLE_QUOTE) && !line.ends_with(ESCAPED_QUOTE)
}

/// Strips one symmetric pair of surrounding quotes. Only the first and last
/// characters are looked at; a lone quote strips to the empty string.
fn strip_quotes(raw: &str) -> &str {
  for quote in [DOUBLE_QUOTE, SINGLE_QUOTE] {
    if raw.starts_with(quote) && raw.ends_with(quote) {
      return raw.get(1..raw.len() - 1).unwrap_or_default();
    }
  }
  raw
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
  #[error("Unterminated multiline value for {key}")]
  UnterminatedMultiline { key: String },
}
