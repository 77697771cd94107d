//! JSON-RPC ledger client.
//!
//! Executes built invocations against the distributed ledger. Two verbs,
//! never interchanged:
//!
//! - [`LedgerClient::execute`] — signed, state-changing submission. Mutates
//!   ledger state at most once; the client performs no automatic retry,
//!   since retrying without confirmation of the original's fate risks a
//!   duplicate effect.
//! - [`LedgerClient::inspect`] — read-only simulation. Never mutates state,
//!   never commits, and is retried with backoff on transient failures.
//!
//! Using `inspect` for an operation that requires authorization would
//! silently return a simulated, non-committed result; the client refuses
//! verb/function mismatches up front.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::Deserialize;
use serde_json::{json, Value};
use snafu::ensure;

use result_registry_types::{
    error::{LedgerRejectedSnafu, LedgerUnavailableSnafu, MalformedArgumentsSnafu},
    Result,
};

use crate::{
    builder::LedgerInvocation,
    config::ClientConfig,
    retry::with_retry,
    signer::Signer,
};

/// RPC method for signed, state-changing submissions.
pub(crate) const EXECUTE_METHOD: &str = "registry_executeCall";

/// RPC method for read-only simulations.
pub(crate) const INSPECT_METHOD: &str = "registry_inspectCall";

/// Result of a committed state-changing call.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerReceipt {
    /// Transaction digest. Absent when the node's receipt carries none;
    /// treated as unknown, not as an error.
    #[serde(default)]
    pub digest: Option<String>,
    /// Opaque execution effects.
    #[serde(default)]
    pub effects: Value,
    /// Opaque emitted events.
    #[serde(default)]
    pub events: Vec<Value>,
}

/// Result of a read-only simulated call. Carries no digest: nothing was
/// committed.
#[derive(Debug, Clone, Deserialize)]
pub struct InspectionResult {
    /// Opaque decoded return value.
    #[serde(default)]
    pub value: Value,
}

impl InspectionResult {
    /// The return value as a string, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    /// The return value as a boolean, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        self.value.as_bool()
    }
}

/// Client for the registry ledger. Owns the signing capability and the RPC
/// connection; constructed once at startup and shared.
#[derive(Debug)]
pub struct LedgerClient {
    http: reqwest::Client,
    config: ClientConfig,
    signer: Arc<Signer>,
    next_id: AtomicU64,
}

/// Internal split between transport failures and RPC-level refusals, mapped
/// to the taxonomy differently per verb.
enum RpcFailure {
    Transport(String),
    Rpc(RpcErrorBody),
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[allow(dead_code)]
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

impl LedgerClient {
    /// Creates a client from validated configuration and a signer.
    ///
    /// # Errors
    ///
    /// Returns `LedgerUnavailable` if the HTTP connector cannot be built.
    pub fn new(config: ClientConfig, signer: Arc<Signer>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| {
                LedgerUnavailableSnafu { message: format!("failed to build HTTP client: {e}") }
                    .build()
            })?;
        Ok(Self { http, config, signer, next_id: AtomicU64::new(1) })
    }

    /// Returns the sender address of the owned signing capability.
    #[must_use]
    pub fn sender(&self) -> &str {
        self.signer.address()
    }

    /// Submits a signed, state-changing call. At-most-once: no automatic
    /// retry is performed.
    ///
    /// # Errors
    ///
    /// - `MalformedArguments` if the invocation targets a read-only entry point
    /// - `SignerError` if the call cannot be signed
    /// - `LedgerUnavailable` on transport failure or timeout
    /// - `LedgerRejected` if the contract aborted the call
    pub async fn execute(&self, invocation: &LedgerInvocation) -> Result<LedgerReceipt> {
        ensure!(
            invocation.function.is_state_changing(),
            MalformedArgumentsSnafu {
                message: format!(
                    "{} is read-only; a simulated call is not a committed write",
                    invocation.function.entry_point()
                )
            }
        );

        let signed = self.signer.sign_invocation(invocation)?;
        tracing::debug!(call = %invocation.target, sender = %signed.sender, "submitting signed call");

        match self.rpc(EXECUTE_METHOD, json!([signed])).await {
            Ok(result) => serde_json::from_value(result).map_err(|e| {
                LedgerUnavailableSnafu { message: format!("malformed receipt: {e}") }.build()
            }),
            Err(RpcFailure::Transport(message)) => LedgerUnavailableSnafu { message }.fail(),
            Err(RpcFailure::Rpc(body)) => LedgerRejectedSnafu { message: body.message }.fail(),
        }
    }

    /// Runs a read-only simulation. Never mutates state; retried with
    /// backoff under the configured policy.
    ///
    /// # Errors
    ///
    /// - `MalformedArguments` if the invocation targets a state-changing entry point
    /// - `LedgerUnavailable` for every transport or node-side failure; only
    ///   transport failures consume retry attempts
    pub async fn inspect(&self, invocation: &LedgerInvocation) -> Result<InspectionResult> {
        ensure!(
            !invocation.function.is_state_changing(),
            MalformedArgumentsSnafu {
                message: format!(
                    "{} mutates state; it must be submitted as a signed call",
                    invocation.function.entry_point()
                )
            }
        );

        let params = json!([{
            "sender": self.signer.address(),
            "target": invocation.target,
            "args": invocation.args,
        }]);

        // Node-side aborts are deterministic (missing record, bad target) and
        // repeating them cannot succeed, so they pass through the retry gate
        // as rejections; only transport failures are retried. The caller-facing
        // surface stays unavailability-only: a simulation has nothing to reject.
        let result = with_retry(self.config.retry_policy(), || {
            let params = params.clone();
            async move {
                match self.rpc(INSPECT_METHOD, params).await {
                    Ok(result) => serde_json::from_value(result).map_err(|e| {
                        LedgerUnavailableSnafu { message: format!("malformed inspection: {e}") }
                            .build()
                    }),
                    Err(RpcFailure::Transport(message)) => {
                        LedgerUnavailableSnafu { message }.fail()
                    }
                    Err(RpcFailure::Rpc(body)) => {
                        LedgerRejectedSnafu { message: body.message }.fail()
                    }
                }
            }
        })
        .await;

        result.map_err(|err| match err {
            result_registry_types::RegistryError::LedgerRejected { message } => {
                LedgerUnavailableSnafu { message }.build()
            }
            other => other,
        })
    }

    async fn rpc(&self, method: &str, params: Value) -> std::result::Result<Value, RpcFailure> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(self.config.rpc_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(format!("rpc request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcFailure::Transport(format!("rpc endpoint returned HTTP {status}")));
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| RpcFailure::Transport(format!("malformed rpc response: {e}")))?;

        if let Some(error) = envelope.error {
            return Err(RpcFailure::Rpc(error));
        }
        envelope.result.ok_or_else(|| {
            RpcFailure::Transport("rpc response carried neither result nor error".to_owned())
        })
    }
}
