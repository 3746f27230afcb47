//! Pull, push and verify flows between local env files and a [`RemoteStore`].
//!
//! # Flows
//!
//! - **pull**: lists each selected tier on the remote and rewrites the tier's
//!   local file with a generated header.
//! - **push**: sends every variable of one tier's local file to the remote.
//!   Before pushing preview variables (which become project defaults), checks
//!   that development and production define an override for each of them.
//! - **verify**: compares each selected tier's local file with the remote.
//!
//! A remote listing that fails is treated as an empty set of variables, so
//! verifying against an unreachable deployment reports every local variable as
//! missing on the remote instead of aborting.
//!
//! # Examples
//!
//! ```rust,no_run
//! use env_tiers::remote::ConvexCli;
//! use env_tiers::sync::{EnvSync, SyncOptions};
//! use env_tiers::tier::TierSelection;
//!
//! let options = SyncOptions::default();
//! let sync = EnvSync::new(ConvexCli::new(&options.root, &options.preview_name), options);
//!
//! let report = sync.verify(TierSelection::All);
//! print!("{}", report);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

use crate::map::EnvMap;
use crate::parse::{self, ParseError};
use crate::reconcile::{self, DiffResult, OverrideReport, SetOp};
use crate::remote::{RemoteError, RemoteStore};
use crate::remote_list;
use crate::tier::{DEFAULT_PREVIEW_NAME, Tier, TierSelection};

/// Configuration for a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
  /// Directory holding the per-tier env files.
  pub root: PathBuf,
  /// Name of the preview deployment to target.
  pub preview_name: String,
  /// Report what would happen without writing files or setting variables.
  pub dry_run: bool,
  /// Push preview variables without checking development and production.
  pub skip_override_check: bool,
  /// Push only variables that are missing or different on the remote.
  pub only_changed: bool,
}

impl Default for SyncOptions {
  fn default() -> Self {
    Self {
      root: PathBuf::from("."),
      preview_name: DEFAULT_PREVIEW_NAME.to_string(),
      dry_run: false,
      skip_override_check: false,
      only_changed: false,
    }
  }
}

/// Main synchronization service.
pub struct EnvSync<R> {
  remote: R,
  options: SyncOptions,
}

impl<R: RemoteStore> EnvSync<R> {
  pub fn new(remote: R, options: SyncOptions) -> Self {
    Self { remote, options }
  }

  /// Rewrites the local file of every selected tier from the remote.
  ///
  /// A failing tier does not stop the others; its error is kept in the report.
  pub fn pull(&self, selection: TierSelection) -> PullReport {
    #[cfg(feature = "tracing")]
    info!(?selection, dry_run = self.options.dry_run, "Starting pull");

    let tiers = selection
      .tiers()
      .into_iter()
      .map(|tier| TierPull {
        tier,
        name: self.name(tier),
        path: tier.local_path(&self.options.root),
        outcome: self.pull_tier(tier),
      })
      .collect();

    PullReport {
      tiers,
      dry_run: self.options.dry_run,
    }
  }

  fn pull_tier(&self, tier: Tier) -> Result<String, EnvSyncError> {
    let output = self.remote.list(tier)?;
    let vars = remote_list::decode(&output);

    let content = format!(
      "# Convex {} Environment Variables\n# Pulled from Convex dashboard - DO NOT COMMIT\n\n{}\n",
      self.name(tier),
      parse::encode(&vars)
    );

    if !self.options.dry_run {
      let path = tier.local_path(&self.options.root);

      #[cfg(feature = "tracing")]
      debug!(?path, vars = vars.len(), "Writing pulled variables");

      std::fs::write(&path, &content).map_err(EnvSyncError::Write)?;
    }

    Ok(content)
  }

  /// Pushes `tier`'s local file to the remote.
  ///
  /// For [`Tier::Preview`], `confirm` is asked whether to continue when
  /// development or production lack an override for a preview variable.
  /// It is not called in dry-run mode or when the check is skipped.
  pub fn push<F>(&self, tier: Tier, confirm: F) -> Result<PushReport, EnvSyncError>
  where
    F: FnOnce(&OverrideReport) -> bool,
  {
    #[cfg(feature = "tracing")]
    info!(%tier, dry_run = self.options.dry_run, "Starting push");

    let path = tier.local_path(&self.options.root);
    let local = parse::decode_strict(&read_local(&path)?).map_err(EnvSyncError::LocalParse)?;

    let mut overrides = None;
    let mut confirmed = false;

    if tier == Tier::Preview && !self.options.skip_override_check {
      let report = self.check_overrides(&local);

      if !report.is_complete() && !self.options.dry_run {
        if !confirm(&report) {
          return Err(EnvSyncError::Aborted);
        }
        confirmed = true;
      }
      overrides = Some(report);
    }

    let plan = if self.options.only_changed {
      let remote = self.list_or_empty(tier);
      reconcile::push_plan_for_diff(&local, &reconcile::diff(&local, &remote))
    } else {
      reconcile::push_plan(&local)
    };

    let mut results = Vec::with_capacity(plan.len());
    for op in plan {
      let result = if self.options.dry_run {
        None
      } else {
        #[cfg(feature = "tracing")]
        debug!(key = %op.key, "Setting variable");

        Some(self.remote.set(tier, &op.key, &op.value))
      };
      results.push((op, result));
    }

    Ok(PushReport {
      tier,
      name: self.name(tier),
      path,
      overrides,
      confirmed,
      results,
    })
  }

  /// Which preview variables development and production do not override.
  pub fn check_overrides(&self, preview: &EnvMap) -> OverrideReport {
    let dev = self.list_or_empty(Tier::Development);
    let prod = self.list_or_empty(Tier::Production);

    reconcile::override_check(
      preview,
      &[(Tier::Development, &dev), (Tier::Production, &prod)],
    )
  }

  /// Compares the local file of every selected tier with the remote.
  pub fn verify(&self, selection: TierSelection) -> VerifyReport {
    #[cfg(feature = "tracing")]
    info!(?selection, "Starting verify");

    let tiers = selection
      .tiers()
      .into_iter()
      .map(|tier| {
        let path = tier.local_path(&self.options.root);
        let outcome = read_local(&path).map(|content| {
          let local = parse::decode(&content);
          let remote = self.list_or_empty(tier);
          reconcile::diff(&local, &remote)
        });

        TierVerify {
          tier,
          name: self.name(tier),
          outcome,
        }
      })
      .collect();

    VerifyReport { tiers }
  }

  fn list_or_empty(&self, tier: Tier) -> EnvMap {
    match self.remote.list(tier) {
      Ok(output) => remote_list::decode(&output),
      Err(_err) => {
        #[cfg(feature = "tracing")]
        warn!(%tier, error = %_err, "Remote listing failed, treating as empty");
        EnvMap::new()
      }
    }
  }

  fn name(&self, tier: Tier) -> String {
    tier.display_name(&self.options.preview_name)
  }
}

fn read_local(path: &Path) -> Result<String, EnvSyncError> {
  if !path.exists() {
    return Err(EnvSyncError::LocalNotFound(path.to_path_buf()));
  }
  std::fs::read_to_string(path).map_err(EnvSyncError::LocalIo)
}

/// Outcome of [`EnvSync::pull`].
#[derive(Debug)]
pub struct PullReport {
  pub tiers: Vec<TierPull>,
  pub dry_run: bool,
}

#[derive(Debug)]
pub struct TierPull {
  pub tier: Tier,
  pub name: String,
  pub path: PathBuf,
  /// The rendered file content.
  pub outcome: Result<String, EnvSyncError>,
}

impl PullReport {
  pub fn succeeded(&self) -> bool {
    self.tiers.iter().all(|t| t.outcome.is_ok())
  }
}

impl fmt::Display for PullReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for pull in &self.tiers {
      writeln!(f, "=== Convex {} ===", pull.name)?;
      writeln!(f, "Output: {}", pull.path.display())?;
      writeln!(f)?;

      match &pull.outcome {
        Ok(content) if self.dry_run => {
          writeln!(f, "# Would write to: {}", pull.path.display())?;
          writeln!(f)?;
          writeln!(f, "{}", content)?;
        }
        Ok(_) => writeln!(f, "Created {}", pull.path.display())?,
        Err(err) => writeln!(f, "Failed to pull {}: {}", pull.name, err)?,
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

/// Outcome of [`EnvSync::push`].
#[derive(Debug)]
pub struct PushReport {
  pub tier: Tier,
  pub name: String,
  pub path: PathBuf,
  /// Override check result, when one was run.
  pub overrides: Option<OverrideReport>,
  /// Whether an incomplete override report was accepted through the
  /// confirmation hook.
  pub confirmed: bool,
  /// Each planned `set` and its result; `None` in dry-run mode.
  pub results: Vec<(SetOp, Option<Result<(), RemoteError>>)>,
}

impl PushReport {
  pub fn failed(&self) -> impl Iterator<Item = (&SetOp, &RemoteError)> {
    self
      .results
      .iter()
      .filter_map(|(op, result)| match result {
        Some(Err(err)) => Some((op, err)),
        _ => None,
      })
  }

  pub fn succeeded(&self) -> bool {
    self.failed().next().is_none()
  }
}

impl fmt::Display for PushReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(overrides) = &self.overrides
      && !self.confirmed
    {
      write!(f, "{}", OverrideWarning(overrides))?;
    }

    writeln!(f, "=== Push {} ===", self.path.display())?;
    writeln!(f)?;

    for (op, result) in &self.results {
      match result {
        None => {
          let shown = if op.value.contains('\n') {
            "<multiline value>"
          } else {
            "<value>"
          };
          writeln!(f, "[dry-run] convex env set \"{}\" {}", op.key, shown)?;
        }
        Some(Ok(())) => writeln!(f, "Set {}", op.key)?,
        Some(Err(err)) => writeln!(f, "  Warning: Failed to set {}: {}", op.key, err)?,
      }
    }

    if self.tier == Tier::Preview {
      writeln!(f)?;
      writeln!(f, "📋 Remember: Set these as Project Defaults in Convex Dashboard")?;
      writeln!(f, "   (CLI can only push to specific preview, not defaults)")?;
    }
    Ok(())
  }
}

/// The override check as shown before pushing preview variables.
pub struct OverrideWarning<'a>(pub &'a OverrideReport);

impl fmt::Display for OverrideWarning<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "=== Checking dev/prod have overrides ===")?;
    writeln!(f)?;
    write!(f, "{}", self.0)?;
    writeln!(f)?;

    if !self.0.is_complete() {
      writeln!(f, "Preview vars become defaults - dev/prod should override them!")?;
      writeln!(f, "Add missing vars to dev/prod before pushing to preview.")?;
      writeln!(f)?;
    }
    Ok(())
  }
}

/// Outcome of [`EnvSync::verify`].
#[derive(Debug)]
pub struct VerifyReport {
  pub tiers: Vec<TierVerify>,
}

#[derive(Debug)]
pub struct TierVerify {
  pub tier: Tier,
  pub name: String,
  pub outcome: Result<DiffResult, EnvSyncError>,
}

impl TierVerify {
  pub fn passed(&self) -> bool {
    matches!(&self.outcome, Ok(diff) if diff.passed())
  }
}

impl VerifyReport {
  pub fn passed(&self) -> bool {
    self.tiers.iter().all(TierVerify::passed)
  }
}

impl fmt::Display for VerifyReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for verify in &self.tiers {
      writeln!(f, "=== Verifying {} ===", verify.name)?;
      match &verify.outcome {
        Ok(diff) => write!(f, "{}", diff)?,
        Err(EnvSyncError::LocalNotFound(path)) => {
          writeln!(f, "  ⚠️  Local file {} not found", path.display())?
        }
        Err(err) => writeln!(f, "  ⚠️  Failed to verify: {}", err)?,
      }
      writeln!(f)?;
    }

    if self.passed() {
      writeln!(f, "✓ All environments in sync!")
    } else {
      writeln!(f, "⚠️  Some environments are out of sync")
    }
  }
}

/// Errors that can occur while syncing a tier.
#[derive(Debug, thiserror::Error)]
pub enum EnvSyncError {
  /// The tier's local env file does not exist
  #[error("Local file not found: {0}")]
  LocalNotFound(PathBuf),
  /// Error reading the local env file
  #[error("Local file IO error: {0}")]
  LocalIo(std::io::Error),
  /// Error parsing the local env file
  #[error("Local file parse error: {0}")]
  LocalParse(ParseError),
  /// Error writing a pulled env file
  #[error("Write error: {0}")]
  Write(std::io::Error),
  /// Error talking to the remote store
  #[error(transparent)]
  Remote(#[from] RemoteError),
  /// The override confirmation was declined
  #[error("Aborted")]
  Aborted,
}
