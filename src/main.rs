use clap::{Parser, Subcommand};
use env_tiers::reconcile::OverrideReport;
use env_tiers::remote::ConvexCli;
use env_tiers::sync::{EnvSync, EnvSyncError, OverrideWarning, SyncOptions};
use env_tiers::tier::{DEFAULT_PREVIEW_NAME, Tier, TierSelection};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
  name = "env-tiers",
  about = "Keep local env files in sync with Convex deployment environment variables",
  version,
  author
)]
struct Cli {
  /// Directory holding the .env.convex.* files
  #[arg(short, long, default_value = ".", global = true)]
  root: PathBuf,

  /// Verbose output (-v for verbose, -vv for very verbose)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Pull environment variables from Convex to local .env files
  Pull {
    /// Environment to pull
    #[arg(value_enum, default_value_t = TierSelection::All)]
    environment: TierSelection,

    /// Preview deployment name
    #[arg(long, default_value = DEFAULT_PREVIEW_NAME)]
    preview_name: String,

    /// Print what would be pulled without writing files
    #[arg(long)]
    dry_run: bool,
  },
  /// Push local .env files to Convex environment variables
  Push {
    /// Environment to push to
    #[arg(value_enum)]
    environment: Tier,

    /// Preview deployment name
    #[arg(long, default_value = DEFAULT_PREVIEW_NAME)]
    preview_name: String,

    /// Print what would be pushed without making changes
    #[arg(long)]
    dry_run: bool,

    /// Skip checking if dev/prod have overrides for preview vars
    #[arg(long)]
    skip_override_check: bool,

    /// Only push variables that are missing or different on the remote
    #[arg(long)]
    only_changed: bool,

    /// Continue without asking when overrides are missing
    #[arg(short, long)]
    yes: bool,
  },
  /// Verify local env files match Convex deployments
  Verify {
    /// Environment to verify
    #[arg(value_enum, default_value_t = TierSelection::All)]
    environment: TierSelection,

    /// Preview deployment name
    #[arg(long, default_value = DEFAULT_PREVIEW_NAME)]
    preview_name: String,
  },
}

fn setup_tracing(verbose: u8) {
  use tracing_subscriber::fmt;
  use tracing_subscriber::prelude::*;

  let log_level = match verbose {
    1 => "debug",
    2 => "trace",
    _ => "info",
  };

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(tracing_subscriber::EnvFilter::new(
      std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
    ))
    .init();
}

fn confirm(report: &OverrideReport) -> bool {
  print!("{}", OverrideWarning(report));
  print!("Continue anyway? (y/N) ");

  if std::io::stdout().flush().is_err() {
    return false;
  }

  let mut answer = String::new();
  match std::io::stdin().lock().read_line(&mut answer) {
    Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
    Err(_) => false,
  }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
  let cli = Cli::parse();

  setup_tracing(cli.verbose);

  let mut options = SyncOptions {
    root: cli.root,
    ..SyncOptions::default()
  };

  match cli.command {
    Command::Pull {
      environment,
      preview_name,
      dry_run,
    } => {
      options.preview_name = preview_name;
      options.dry_run = dry_run;
      let sync = EnvSync::new(ConvexCli::new(&options.root, &options.preview_name), options);

      let report = sync.pull(environment);
      print!("{}", report);
      println!("Done!");

      Ok(if report.succeeded() {
        ExitCode::SUCCESS
      } else {
        ExitCode::FAILURE
      })
    }
    Command::Push {
      environment,
      preview_name,
      dry_run,
      skip_override_check,
      only_changed,
      yes,
    } => {
      options.preview_name = preview_name;
      options.dry_run = dry_run;
      options.skip_override_check = skip_override_check;
      options.only_changed = only_changed;
      let sync = EnvSync::new(ConvexCli::new(&options.root, &options.preview_name), options);

      let accept = |report: &OverrideReport| {
        if yes {
          print!("{}", OverrideWarning(report));
          true
        } else {
          confirm(report)
        }
      };

      match sync.push(environment, accept) {
        Ok(report) => {
          print!("{}", report);
          println!();
          println!("Done!");
          Ok(if report.succeeded() {
            ExitCode::SUCCESS
          } else {
            ExitCode::FAILURE
          })
        }
        Err(EnvSyncError::Aborted) => {
          println!("Aborted.");
          Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
      }
    }
    Command::Verify {
      environment,
      preview_name,
    } => {
      options.preview_name = preview_name;
      let sync = EnvSync::new(ConvexCli::new(&options.root, &options.preview_name), options);

      let report = sync.verify(environment);
      print!("{}", report);

      Ok(if report.passed() {
        ExitCode::SUCCESS
      } else {
        ExitCode::FAILURE
      })
    }
  }
}
