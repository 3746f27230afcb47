//! Convex environment variable synchronization library.
//!
//! This library keeps per-tier local env files (development, production,
//! preview) in step with the environment variables of the matching Convex
//! deployments.
//!
//! # Features
//!
//! - **Env-file codec**: quoted, single-quoted JSON and multiline values
//! - **Remote listing codec**: reads the unquoted output of `convex env list`
//! - **Reconciliation**: classified diffs, override checks and push plans
//! - **Optional tracing**: Detailed logging when the `tracing` feature is enabled
//!
//! # Example
//!
//! ```rust
//! use env_tiers::{parse, reconcile, remote_list};
//!
//! let local = parse::decode("A=\"1\"\nB=\"2\"");
//! let remote = remote_list::decode("A=1\nC=3");
//!
//! let diff = reconcile::diff(&local, &remote);
//! assert_eq!(diff.missing_remote, vec!["B"]);
//! assert_eq!(diff.missing_local, vec!["C"]);
//! ```

pub mod map;
pub mod parse;
pub mod reconcile;
pub mod remote;
pub mod remote_list;
pub mod sync;
pub mod tier;

pub use map::EnvMap;
