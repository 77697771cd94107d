//! Client SDK for the on-chain academic result registry.
//!
//! This crate owns everything that talks to the distributed ledger:
//!
//! - [`CallBuilder`] maps a domain operation to a ledger invocation with the
//!   registry contract's fixed positional argument schema. Pure, no I/O.
//! - [`Signer`] is the opaque signing capability: key parsing, sender
//!   address derivation, and signing of constructed calls.
//! - [`LedgerClient`] executes invocations over JSON-RPC, with distinct
//!   verbs for signed state-changing calls and read-only simulations.
//! - [`mock`] provides a controllable in-process mock registry ledger for
//!   integration tests.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use result_registry_sdk::{CallBuilder, ClientConfig, LedgerClient, RegistryOp, Signer};
//! use result_registry_types::RecordKey;
//! use std::sync::Arc;
//!
//! # async fn example() -> result_registry_types::Result<()> {
//! let config = ClientConfig::builder()
//!     .with_rpc_url("http://localhost:9000")
//!     .with_package_id("0x2ab4")
//!     .with_registry_id("0x77f1")
//!     .with_institution_cap("0x90cd")
//!     .build()?;
//!
//! let signer = Arc::new(Signer::from_encoded_key("0x...")?);
//! let builder = CallBuilder::from_config(&config);
//! let client = LedgerClient::new(config, signer)?;
//!
//! let key = RecordKey::new("S100", "CS201", "Fall2024");
//! let invocation = builder.build(RegistryOp::AddResult { key: &key, grade: "A" })?;
//! let receipt = client.execute(&invocation).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod client;
mod config;
pub mod mock;
mod retry;
mod signer;

pub use builder::{
    AuthorityRef, CallArg, CallBuilder, ContractFunction, LedgerInvocation, RegistryOp,
    CLOCK_OBJECT_ID, CONTRACT_MODULE,
};
pub use client::{InspectionResult, LedgerClient, LedgerReceipt};
pub use config::{ClientConfig, ClientConfigBuilder, RetryPolicy};
pub use retry::with_retry;
pub use signer::{SignedCall, Signer};

// Re-export the shared taxonomy for downstream convenience
pub use result_registry_types::{ErrorKind, RegistryError, Result};
