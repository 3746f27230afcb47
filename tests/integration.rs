use env_tiers::remote::{RemoteError, RemoteStore};
use env_tiers::sync::{EnvSync, SyncOptions};
use env_tiers::tier::{Tier, TierSelection};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

/// In-memory deployment store. `set` updates the listing so that a later
/// `list` sees the pushed value.
#[derive(Default)]
struct MemoryRemote {
  vars: RefCell<HashMap<Tier, Vec<(String, String)>>>,
  sets: RefCell<Vec<(Tier, String)>>,
}

impl MemoryRemote {
  fn with(tier: Tier, pairs: &[(&str, &str)]) -> Self {
    let remote = Self::default();
    remote.vars.borrow_mut().insert(
      tier,
      pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    );
    remote
  }
}

impl RemoteStore for MemoryRemote {
  fn list(&self, tier: Tier) -> Result<String, RemoteError> {
    let vars = self.vars.borrow();
    let lines: Vec<String> = vars
      .get(&tier)
      .map(|pairs| pairs.iter().map(|(k, v)| format!("{k}={v}")).collect())
      .unwrap_or_default();
    Ok(lines.join("\n"))
  }

  fn set(&self, tier: Tier, key: &str, value: &str) -> Result<(), RemoteError> {
    self.sets.borrow_mut().push((tier, key.to_string()));

    let mut vars = self.vars.borrow_mut();
    let pairs = vars.entry(tier).or_default();
    match pairs.iter_mut().find(|(k, _)| k == key) {
      Some((_, existing)) => *existing = value.to_string(),
      None => pairs.push((key.to_string(), value.to_string())),
    }
    Ok(())
  }
}

fn options(temp_dir: &TempDir) -> SyncOptions {
  SyncOptions {
    root: temp_dir.path().to_path_buf(),
    ..SyncOptions::default()
  }
}

#[test]
fn test_pull_then_verify() {
  let temp_dir = TempDir::new().unwrap();
  let remote = MemoryRemote::with(
    Tier::Development,
    &[
      ("SITE_URL", "http://localhost:3000"),
      ("CONFIG", "{\"debug\":true}"),
      ("JWT_PRIVATE_KEY", "-----BEGIN KEY-----\nabc+/=\n-----END KEY-----"),
    ],
  );

  let sync = EnvSync::new(remote, options(&temp_dir));

  let pulled = sync.pull(TierSelection::Development);
  assert!(pulled.succeeded());

  let written = fs::read_to_string(temp_dir.path().join(".env.convex.development")).unwrap();
  let expected = "# Convex Development Environment Variables
# Pulled from Convex dashboard - DO NOT COMMIT

SITE_URL=\"http://localhost:3000\"
CONFIG='{\"debug\":true}'
JWT_PRIVATE_KEY=\"-----BEGIN KEY-----
abc+/=
-----END KEY-----\"
";
  assert_eq!(written, expected);

  let verified = sync.verify(TierSelection::Development);
  assert!(verified.passed(), "{}", verified);
  assert_eq!(
    verified.tiers[0].outcome.as_ref().unwrap().in_sync,
    3
  );
}

#[test]
fn test_pull_dry_run_writes_nothing() {
  let temp_dir = TempDir::new().unwrap();
  let remote = MemoryRemote::with(Tier::Preview, &[("A", "1")]);
  let sync = EnvSync::new(
    remote,
    SyncOptions {
      dry_run: true,
      preview_name: "pr-12".to_string(),
      ..options(&temp_dir)
    },
  );

  let report = sync.pull(TierSelection::Preview);

  let content = report.tiers[0].outcome.as_ref().unwrap();
  assert!(content.starts_with("# Convex Preview (pr-12) Environment Variables\n"));
  assert!(content.ends_with("A=\"1\"\n"));
  assert!(!temp_dir.path().join(".env.convex.preview").exists());
  assert!(report.to_string().contains("# Would write to:"));
}

#[test]
fn test_verify_reports_every_difference() {
  let temp_dir = TempDir::new().unwrap();
  fs::write(
    temp_dir.path().join(".env.convex.production"),
    "# Production\nSHARED=\"same\"\nLOCAL_ONLY=\"x\"\nCHANGED=\"new\"\n",
  )
  .unwrap();

  let remote = MemoryRemote::with(
    Tier::Production,
    &[("SHARED", "same"), ("CHANGED", "old"), ("REMOTE_ONLY", "y")],
  );
  let sync = EnvSync::new(remote, options(&temp_dir));

  let report = sync.verify(TierSelection::Production);
  assert!(!report.passed());

  let diff = report.tiers[0].outcome.as_ref().unwrap();
  assert_eq!(diff.missing_remote, vec!["LOCAL_ONLY"]);
  assert_eq!(diff.missing_local, vec!["REMOTE_ONLY"]);
  assert_eq!(diff.differing, vec!["CHANGED"]);
  assert_eq!(diff.in_sync, 1);

  let rendered = report.to_string();
  assert!(rendered.starts_with("=== Verifying Production ===\n"));
  assert!(rendered.contains("  ⚠️  Values differ: CHANGED\n"));
  assert!(rendered.ends_with("⚠️  Some environments are out of sync\n"));
}

#[test]
fn test_verify_all_tiers() {
  let temp_dir = TempDir::new().unwrap();
  fs::write(temp_dir.path().join(".env.convex.development"), "A=\"1\"\n").unwrap();

  let remote = MemoryRemote::with(Tier::Development, &[("A", "1")]);
  let sync = EnvSync::new(remote, options(&temp_dir));

  let report = sync.verify(TierSelection::All);

  assert_eq!(report.tiers.len(), 3);
  assert!(report.tiers[0].passed());
  assert!(!report.tiers[1].passed());
  assert!(!report.tiers[2].passed());
  assert!(!report.passed());
}

#[test]
fn test_push_in_file_order() {
  let temp_dir = TempDir::new().unwrap();
  fs::write(
    temp_dir.path().join(".env.convex.development"),
    "B=\"2\"\nA=\"1\"\nPEM=\"-----BEGIN-----\nabc\n-----END-----\"\n",
  )
  .unwrap();

  let sync = EnvSync::new(MemoryRemote::default(), options(&temp_dir));
  let report = sync.push(Tier::Development, |_| true).unwrap();

  assert!(report.succeeded());
  assert!(report.overrides.is_none());

  let pushed: Vec<String> = report.results.iter().map(|(op, _)| op.key.clone()).collect();
  assert_eq!(pushed, vec!["B", "A", "PEM"]);

  assert!(sync.verify(TierSelection::Development).passed());
}

#[test]
fn test_push_only_changed() {
  let temp_dir = TempDir::new().unwrap();
  fs::write(
    temp_dir.path().join(".env.convex.production"),
    "SAME=\"1\"\nCHANGED=\"new\"\nADDED=\"3\"\n",
  )
  .unwrap();

  let remote = MemoryRemote::with(Tier::Production, &[("SAME", "1"), ("CHANGED", "old")]);
  let sync = EnvSync::new(
    remote,
    SyncOptions {
      only_changed: true,
      ..options(&temp_dir)
    },
  );

  let report = sync.push(Tier::Production, |_| true).unwrap();

  let pushed: Vec<&str> = report.results.iter().map(|(op, _)| op.key.as_str()).collect();
  assert_eq!(pushed, vec!["CHANGED", "ADDED"]);
  assert!(sync.verify(TierSelection::Production).passed());
}

#[test]
fn test_push_preview_dry_run_reports_missing_overrides() {
  let temp_dir = TempDir::new().unwrap();
  fs::write(temp_dir.path().join(".env.convex.preview"), "X=\"v\"\nY=\"w\"\n").unwrap();

  let remote = MemoryRemote::with(Tier::Development, &[("X", "dev")]);
  let sync = EnvSync::new(
    remote,
    SyncOptions {
      dry_run: true,
      ..options(&temp_dir)
    },
  );

  let report = sync
    .push(Tier::Preview, |_| panic!("dry run does not ask"))
    .unwrap();

  let overrides = report.overrides.as_ref().unwrap();
  assert_eq!(
    overrides.missing_for(Tier::Development),
    Some(&["Y".to_string()][..])
  );
  assert_eq!(
    overrides.missing_for(Tier::Production),
    Some(&["X".to_string(), "Y".to_string()][..])
  );
  assert!(report.results.iter().all(|(_, result)| result.is_none()));

  let rendered = report.to_string();
  assert!(rendered.contains("⚠️  Development missing overrides for: Y\n"));
  assert!(rendered.starts_with("=== Checking dev/prod have overrides ===\n"));
  assert!(rendered.contains(
    "Preview vars become defaults - dev/prod should override them!\nAdd missing vars to dev/prod before pushing to preview.\n"
  ));
  assert!(rendered.contains("[dry-run] convex env set \"X\" <value>\n"));
  assert!(rendered.contains("📋 Remember: Set these as Project Defaults in Convex Dashboard\n"));
}

#[test]
fn test_push_preview_confirmed() {
  let temp_dir = TempDir::new().unwrap();
  fs::write(temp_dir.path().join(".env.convex.preview"), "X=\"v\"\n").unwrap();

  let sync = EnvSync::new(MemoryRemote::default(), options(&temp_dir));
  let report = sync.push(Tier::Preview, |_| true).unwrap();

  assert!(report.confirmed);
  assert!(report.succeeded());
  assert!(sync.verify(TierSelection::Preview).passed());
}

#[test]
fn test_push_missing_local_file() {
  let temp_dir = TempDir::new().unwrap();
  let sync = EnvSync::new(MemoryRemote::default(), options(&temp_dir));

  let result = sync.push(Tier::Production, |_| true);

  assert!(matches!(
    result,
    Err(env_tiers::sync::EnvSyncError::LocalNotFound(_))
  ));
}
