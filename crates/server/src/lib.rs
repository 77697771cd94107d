//! Result registry service.
//!
//! Orchestrates the two data paths of the registry:
//!
//! - the authoritative, tamper-evident write path to the ledger (via
//!   `result-registry-sdk`), and
//! - the fast local mirror used for listing and as a fallback read path.
//!
//! [`service::ResultService`] is the only component aware of both. The
//! mirror is a derived, eventually-consistent projection: ledger success is
//! the success criterion for writes, mirror success is best-effort.

pub mod config;
pub mod http;
pub mod mirror;
pub mod service;

pub use config::Cli;
pub use mirror::{FailingMirror, InMemoryMirror, MirrorStore};
pub use service::{
    AddOutcome, ReadOutcome, ReadSource, ResultQuery, ResultService, UpdateOutcome, VerifyOutcome,
};
