//! # cf-actor
//!
//! The actor layer behind the `cf3` commands.
//!
//! Commands never talk HTTP directly. They call an [`Actor`] operation, which
//! drives one or more cloud controller (or network policy) requests and hands
//! back the result together with every warning the API emitted along the way.
//!
//! ```text
//! ┌──────────────┐     ┌─────────────────┐     ┌────────────────────┐
//! │  cf3 command │────▶│      Actor      │────▶│  ccv3::Client      │──▶ /v3/...
//! │  (cf-cli)    │     │ (result, warns) │     ├────────────────────┤
//! └──────────────┘     └─────────────────┘     │ networking::Client │──▶ /networking/v1/...
//!        │                                      └────────────────────┘
//!        ▼
//! ┌──────────────┐
//! │ SharedActor  │  target checks against local config
//! └──────────────┘
//! ```
//!
//! Every public actor operation returns an [`ActionOutcome`]: warnings are
//! returned even when the operation fails, so callers can always surface them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actor;
pub mod ccv3;
pub mod error;
pub mod networking;
pub mod resources;
pub mod shared;
pub mod warnings;

pub use actor::{Actor, ActorSettings};
pub use error::{ActionError, CcError};
pub use shared::{SharedActor, TargetConfig};
pub use warnings::Warnings;

/// Result of an actor operation paired with the warnings collected for it.
pub type ActionOutcome<T> = (Result<T, ActionError>, Warnings);
