//! Comparison of local and remote variable sets.
//!
//! Values are compared as exact strings: no trimming, no case folding and no
//! type coercion. None of these operations can fail.

use std::fmt;

use crate::map::EnvMap;
use crate::tier::Tier;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Classified difference between a local and a remote [`EnvMap`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffResult {
  /// Keys defined locally but not on the remote, in local order.
  pub missing_remote: Vec<String>,
  /// Keys defined on the remote but not locally, in remote order.
  pub missing_local: Vec<String>,
  /// Keys defined on both sides with different values, in local order.
  pub differing: Vec<String>,
  pub in_sync: usize,
}

impl DiffResult {
  pub fn passed(&self) -> bool {
    self.missing_remote.is_empty() && self.missing_local.is_empty() && self.differing.is_empty()
  }
}

impl fmt::Display for DiffResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.passed() {
      return writeln!(f, "  ✓ {} vars in sync", self.in_sync);
    }

    for (label, keys) in [
      ("Missing on remote", &self.missing_remote),
      ("Missing locally", &self.missing_local),
      ("Values differ", &self.differing),
    ] {
      if !keys.is_empty() {
        writeln!(f, "  ⚠️  {}: {}", label, keys.join(", "))?;
      }
    }
    Ok(())
  }
}

pub fn diff(local: &EnvMap, remote: &EnvMap) -> DiffResult {
  let mut result = DiffResult::default();

  for (key, local_value) in local.iter() {
    match remote.get(key) {
      None => result.missing_remote.push(key.to_string()),
      Some(remote_value) if remote_value != local_value => result.differing.push(key.to_string()),
      Some(_) => result.in_sync += 1,
    }
  }

  result.missing_local = remote
    .keys()
    .filter(|key| !local.contains_key(key))
    .map(str::to_string)
    .collect();

  #[cfg(feature = "tracing")]
  debug!(
    missing_remote = result.missing_remote.len(),
    missing_local = result.missing_local.len(),
    differing = result.differing.len(),
    in_sync = result.in_sync,
    "Computed diff"
  );

  result
}

/// Reference keys each target tier does not define.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OverrideReport {
  pub missing: Vec<(Tier, Vec<String>)>,
}

impl OverrideReport {
  /// Keys missing from `tier`, or `None` if the tier was not checked.
  pub fn missing_for(&self, tier: Tier) -> Option<&[String]> {
    self
      .missing
      .iter()
      .find_map(|(t, keys)| if *t == tier { Some(keys.as_slice()) } else { None })
  }

  pub fn is_complete(&self) -> bool {
    self.missing.iter().all(|(_, keys)| keys.is_empty())
  }
}

impl fmt::Display for OverrideReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (tier, keys) in &self.missing {
      if keys.is_empty() {
        writeln!(f, "✓ {} has all overrides", tier)?;
      } else {
        writeln!(f, "⚠️  {} missing overrides for: {}", tier, keys.join(", "))?;
      }
    }
    Ok(())
  }
}

/// Checks that every key of `reference` is defined in each target. Only key
/// presence matters.
pub fn override_check(reference: &EnvMap, targets: &[(Tier, &EnvMap)]) -> OverrideReport {
  let missing = targets
    .iter()
    .map(|(tier, target)| {
      let keys = reference
        .keys()
        .filter(|key| !target.contains_key(key))
        .map(str::to_string)
        .collect();
      (*tier, keys)
    })
    .collect();

  OverrideReport { missing }
}

/// One `set` call against the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetOp {
  pub key: String,
  pub value: String,
}

/// Every local variable, in local insertion order.
pub fn push_plan(local: &EnvMap) -> Vec<SetOp> {
  local
    .iter()
    .map(|(key, value)| SetOp {
      key: key.to_string(),
      value: value.to_string(),
    })
    .collect()
}

/// Only the local variables the remote lacks or holds a different value for,
/// in local insertion order.
pub fn push_plan_for_diff(local: &EnvMap, diff: &DiffResult) -> Vec<SetOp> {
  push_plan(local)
    .into_iter()
    .filter(|op| diff.missing_remote.contains(&op.key) || diff.differing.contains(&op.key))
    .collect()
}
