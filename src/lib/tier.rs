//! The three deployment tiers and their fixed per-tier configuration.

use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_PREVIEW_NAME: &str = "preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Tier {
  #[value(alias = "dev")]
  Development,
  #[value(alias = "prod")]
  Production,
  Preview,
}

impl Tier {
  pub const ALL: [Tier; 3] = [Tier::Development, Tier::Production, Tier::Preview];

  /// Local env file holding this tier's variables.
  pub fn local_file(self) -> &'static str {
    match self {
      Tier::Development => ".env.convex.development",
      Tier::Production => ".env.convex.production",
      Tier::Preview => ".env.convex.preview",
    }
  }

  /// Env file passed to the Convex CLI to select the deployment, if any.
  pub fn cli_env_file(self) -> Option<&'static str> {
    match self {
      Tier::Development => None,
      Tier::Production => Some(".env.convex-cli.production"),
      Tier::Preview => Some(".env.convex-cli.preview"),
    }
  }

  pub fn local_path(self, root: &Path) -> PathBuf {
    root.join(self.local_file())
  }

  /// Human readable name, including the preview deployment name for
  /// [`Tier::Preview`].
  pub fn display_name(self, preview_name: &str) -> String {
    match self {
      Tier::Preview => format!("{self} ({preview_name})"),
      _ => self.to_string(),
    }
  }
}

impl fmt::Display for Tier {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Tier::Development => "Development",
      Tier::Production => "Production",
      Tier::Preview => "Preview",
    })
  }
}

/// Which tiers a pull or verify run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TierSelection {
  #[value(alias = "dev")]
  Development,
  #[value(alias = "prod")]
  Production,
  Preview,
  #[default]
  All,
}

impl TierSelection {
  pub fn tiers(self) -> Vec<Tier> {
    match self {
      TierSelection::Development => vec![Tier::Development],
      TierSelection::Production => vec![Tier::Production],
      TierSelection::Preview => vec![Tier::Preview],
      TierSelection::All => Tier::ALL.to_vec(),
    }
  }
}
