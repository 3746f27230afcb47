//! Access to a deployment's environment store.
//!
//! The flows in [`crate::sync`] only talk to [`RemoteStore`]. The production
//! implementation, [`ConvexCli`], shells out to `npx convex env ...`.

use std::path::PathBuf;
use std::process::{Command, ExitStatus, Output};

use crate::tier::{DEFAULT_PREVIEW_NAME, Tier};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

pub trait RemoteStore {
  /// Raw listing of every variable set on `tier`'s deployment, in the format
  /// read by [`crate::remote_list::decode`].
  fn list(&self, tier: Tier) -> Result<String, RemoteError>;

  fn set(&self, tier: Tier, key: &str, value: &str) -> Result<(), RemoteError>;
}

/// [`RemoteStore`] backed by the Convex CLI.
#[derive(Debug, Clone)]
pub struct ConvexCli {
  /// Launcher used to run the Convex CLI, `npx` by default.
  pub program: String,
  pub preview_name: String,
  /// Working directory for the CLI; the per-tier `--env-file` paths are
  /// relative to it.
  pub root: PathBuf,
}

impl Default for ConvexCli {
  fn default() -> Self {
    Self {
      program: "npx".to_string(),
      preview_name: DEFAULT_PREVIEW_NAME.to_string(),
      root: PathBuf::from("."),
    }
  }
}

impl ConvexCli {
  pub fn new(root: impl Into<PathBuf>, preview_name: impl Into<String>) -> Self {
    Self {
      root: root.into(),
      preview_name: preview_name.into(),
      ..Self::default()
    }
  }

  /// Deployment selection flags for `tier`.
  fn deployment_args(&self, tier: Tier) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(env_file) = tier.cli_env_file() {
      args.push("--env-file".to_string());
      args.push(env_file.to_string());
    }
    if tier == Tier::Preview && !self.preview_name.is_empty() {
      args.push("--preview-name".to_string());
      args.push(self.preview_name.clone());
    }
    args
  }

  pub(crate) fn list_args(&self, tier: Tier) -> Vec<String> {
    let mut args = vec!["convex".to_string(), "env".to_string(), "list".to_string()];
    args.extend(self.deployment_args(tier));
    args
  }

  /// Values starting with `-` or spanning lines go after `--` so the CLI does
  /// not read them as flags.
  pub(crate) fn set_args(&self, tier: Tier, key: &str, value: &str) -> Vec<String> {
    let mut args = vec!["convex".to_string(), "env".to_string()];
    args.extend(self.deployment_args(tier));
    args.push("set".to_string());
    if value.starts_with('-') || value.contains('\n') {
      args.push("--".to_string());
    }
    args.push(key.to_string());
    args.push(value.to_string());
    args
  }

  fn run(&self, args: &[String]) -> Result<Output, RemoteError> {
    #[cfg(feature = "tracing")]
    debug!(program = %self.program, "Running {}", args[..args.len().min(3)].join(" "));

    let output = Command::new(&self.program)
      .args(args)
      .current_dir(&self.root)
      .output()
      .map_err(RemoteError::Spawn)?;

    if !output.status.success() {
      return Err(RemoteError::Failed {
        status: output.status,
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    Ok(output)
  }
}

impl RemoteStore for ConvexCli {
  fn list(&self, tier: Tier) -> Result<String, RemoteError> {
    let output = self.run(&self.list_args(tier))?;
    let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();

    // The final newline terminates the listing; it is not part of the last value.
    if stdout.ends_with('\n') {
      stdout.pop();
    }

    #[cfg(feature = "tracing")]
    trace!(%tier, bytes = stdout.len(), "Listed remote variables");

    Ok(stdout)
  }

  fn set(&self, tier: Tier, key: &str, value: &str) -> Result<(), RemoteError> {
    self.run(&self.set_args(tier, key, value)).map(|_| ())
  }
}

/// Errors raised while talking to the remote store.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
  /// The CLI could not be started
  #[error("Failed to run Convex CLI: {0}")]
  Spawn(std::io::Error),
  /// The CLI exited unsuccessfully
  #[error("Convex CLI exited with {status}: {stderr}")]
  Failed { status: ExitStatus, stderr: String },
}
