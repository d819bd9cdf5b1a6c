//! # cf-cli
//!
//! The `cf3` command line for the Cloud Foundry v3 API.
//!
//! Provides commands for:
//! - Apps: listing, showing, creating, deleting, starting, stopping,
//!   restarting, scaling and pushing
//! - Packages, staging and droplets
//! - One-off tasks
//! - Isolation segments and their org and space assignments
//! - Sharing service instances across spaces
//! - Container-to-container network policies
//!
//! # Architecture
//!
//! Each command is a thin layer over [`cf_actor::Actor`]: it checks the API
//! version and the target, prints what it is about to do, calls the actor,
//! relays the actor's warnings and reports the outcome.
//!
//! ```text
//! ┌────────────┐   actor calls   ┌────────────┐   HTTPS   ┌──────────────────┐
//! │  commands  │────────────────►│  cf-actor  │──────────►│ Cloud Controller │
//! └────────────┘                 └────────────┘           └──────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod setup;
pub mod ui;
pub mod version;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::CliError;
pub use ui::Ui;
