//! Mock registry ledger for SDK and service integration testing.
//!
//! A controllable in-process JSON-RPC server implementing the registry
//! contract's semantics, so SDK behavior can be tested without a real
//! ledger:
//!
//! - **Result storage**: seed and query results for read tests
//! - **Contract rules**: duplicate-add rejection, missing-record rejection,
//!   clock-argument enforcement on state-changing entry points, capability
//!   rejection on read-only simulations
//! - **Failure injection**: unavailable responses, contract-level rejects,
//!   per-request delays
//! - **Request counting**: verify retry and at-most-once submission behavior
//!
//! # Example
//!
//! ```rust,ignore
//! use result_registry_sdk::mock::MockRegistryLedger;
//!
//! #[tokio::test]
//! async fn test_read() {
//!     let ledger = MockRegistryLedger::start().await.unwrap();
//!     ledger.set_result("S100", "CS201", "Fall2024", "A");
//!
//!     let config = ClientConfig::builder()
//!         .with_rpc_url(ledger.endpoint())
//!         // ...
//!         .build()
//!         .unwrap();
//! }
//! ```

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use parking_lot::{Mutex, RwLock};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::{
    builder::{CallArg, ContractFunction, CLOCK_OBJECT_ID},
    client::{EXECUTE_METHOD, INSPECT_METHOD},
};

/// Key for result storage: (studentId, courseCode, semester).
type ResultKey = (String, String, String);

/// A result as the mock contract stores it.
#[derive(Debug, Clone)]
struct StoredResult {
    grade: String,
    verified: bool,
}

/// Shared state for the mock ledger.
#[derive(Debug, Default)]
struct MockState {
    /// Contract storage: key -> (grade, verified).
    results: RwLock<HashMap<ResultKey, StoredResult>>,

    /// Number of HTTP 503 responses to inject before serving again.
    unavailable_count: AtomicUsize,

    /// Contract-level abort to inject into the next signed call.
    reject_next: Mutex<Option<String>>,

    /// Delay injected into every request (milliseconds).
    delay_ms: AtomicU64,

    /// Total requests received, including injected failures.
    request_count: AtomicUsize,

    /// Signed submissions dispatched to the contract.
    execute_count: AtomicUsize,

    /// Read-only simulations dispatched to the contract.
    inspect_count: AtomicUsize,

    /// Monotonic digest sequence.
    digest_seq: AtomicU64,

    /// Digest of the most recent committed call.
    last_digest: Mutex<Option<String>>,
}

/// A running mock registry ledger bound to an ephemeral local port.
pub struct MockRegistryLedger {
    addr: SocketAddr,
    state: Arc<MockState>,
    serve_task: tokio::task::JoinHandle<()>,
}

impl MockRegistryLedger {
    /// Starts the mock ledger on an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(MockState::default());

        let app = Router::new().route("/", post(handle_rpc)).with_state(Arc::clone(&state));
        let serve_task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { addr, state, serve_task })
    }

    /// Returns the HTTP endpoint URL of the mock.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Seeds a result directly into contract storage.
    pub fn set_result(&self, student_id: &str, course_code: &str, semester: &str, grade: &str) {
        self.state.results.write().insert(
            (student_id.to_owned(), course_code.to_owned(), semester.to_owned()),
            StoredResult { grade: grade.to_owned(), verified: false },
        );
    }

    /// Returns the stored grade for a key, if any.
    #[must_use]
    pub fn grade(&self, student_id: &str, course_code: &str, semester: &str) -> Option<String> {
        self.state
            .results
            .read()
            .get(&(student_id.to_owned(), course_code.to_owned(), semester.to_owned()))
            .map(|r| r.grade.clone())
    }

    /// Returns the verified flag for a key, if the result exists.
    #[must_use]
    pub fn verified(&self, student_id: &str, course_code: &str, semester: &str) -> Option<bool> {
        self.state
            .results
            .read()
            .get(&(student_id.to_owned(), course_code.to_owned(), semester.to_owned()))
            .map(|r| r.verified)
    }

    /// Injects `n` HTTP 503 responses before the mock serves again.
    pub fn inject_unavailable(&self, n: usize) {
        self.state.unavailable_count.store(n, Ordering::SeqCst);
    }

    /// Injects a contract-level abort into the next signed call.
    pub fn inject_reject(&self, message: &str) {
        *self.state.reject_next.lock() = Some(message.to_owned());
    }

    /// Injects a delay into every request.
    pub fn set_delay(&self, delay: Duration) {
        self.state.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Total requests received, including injected failures.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// Signed submissions dispatched to the contract.
    #[must_use]
    pub fn execute_count(&self) -> usize {
        self.state.execute_count.load(Ordering::SeqCst)
    }

    /// Read-only simulations dispatched to the contract.
    #[must_use]
    pub fn inspect_count(&self) -> usize {
        self.state.inspect_count.load(Ordering::SeqCst)
    }

    /// Digest of the most recent committed call.
    #[must_use]
    pub fn last_digest(&self) -> Option<String> {
        self.state.last_digest.lock().clone()
    }
}

impl Drop for MockRegistryLedger {
    fn drop(&mut self) {
        self.serve_task.abort();
    }
}

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct SignedCallWire {
    sender: String,
    target: String,
    args: Vec<CallArg>,
    signature: String,
    #[allow(dead_code)]
    scheme: String,
}

#[derive(Debug, Deserialize)]
struct InspectWire {
    sender: String,
    target: String,
    args: Vec<CallArg>,
}

/// Contract-level abort, carried as a JSON-RPC error object.
struct Abort(String);

fn abort(message: impl Into<String>) -> Abort {
    Abort(message.into())
}

async fn handle_rpc(State(state): State<Arc<MockState>>, Json(request): Json<RpcRequest>) -> Response {
    state.request_count.fetch_add(1, Ordering::SeqCst);

    let delay = state.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    // Injected unavailability happens before the request reaches the contract.
    if state
        .unavailable_count
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        return (StatusCode::SERVICE_UNAVAILABLE, "injected unavailability").into_response();
    }

    let outcome = match request.method.as_str() {
        EXECUTE_METHOD => {
            state.execute_count.fetch_add(1, Ordering::SeqCst);
            state.handle_execute(&request.params)
        }
        INSPECT_METHOD => {
            state.inspect_count.fetch_add(1, Ordering::SeqCst);
            state.handle_inspect(&request.params)
        }
        other => Err(abort(format!("unknown method {other}"))),
    };

    let envelope = match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": request.id, "result": result }),
        Err(Abort(message)) => json!({
            "jsonrpc": "2.0",
            "id": request.id,
            "error": { "code": -32000, "message": message },
        }),
    };
    Json(envelope).into_response()
}

impl MockState {
    fn handle_execute(&self, params: &Value) -> Result<Value, Abort> {
        let call: SignedCallWire = first_param(params)?;

        if call.sender.is_empty() || call.signature.is_empty() {
            return Err(abort("unsigned submission"));
        }
        if let Some(message) = self.reject_next.lock().take() {
            return Err(abort(message));
        }

        let entry = entry_point(&call.target);
        let function = match entry {
            "add_result_entry" => ContractFunction::AddResult,
            "update_grade_entry" => ContractFunction::UpdateGrade,
            "verify_result_entry" => ContractFunction::VerifyResult,
            other => return Err(abort(format!("{other} cannot be submitted as a signed call"))),
        };

        // The contract rejects state-changing calls without a time reference.
        if !matches!(call.args.last(), Some(CallArg::Object { id }) if id == CLOCK_OBJECT_ID) {
            return Err(abort("missing clock object reference"));
        }

        let pures = pure_values(&call.args);
        let mut results = self.results.write();
        match function {
            ContractFunction::AddResult => {
                let [student, course, grade, semester] = pures.as_slice() else {
                    return Err(abort("add_result_entry expects 4 value arguments"));
                };
                let key = (student.clone(), course.clone(), semester.clone());
                if results.contains_key(&key) {
                    return Err(abort(format!(
                        "result already exists for {student}/{course}/{semester}"
                    )));
                }
                results.insert(key, StoredResult { grade: grade.clone(), verified: false });
            }
            ContractFunction::UpdateGrade => {
                let [student, course, semester, new_grade] = pures.as_slice() else {
                    return Err(abort("update_grade_entry expects 4 value arguments"));
                };
                let key = (student.clone(), course.clone(), semester.clone());
                match results.get_mut(&key) {
                    Some(stored) => stored.grade = new_grade.clone(),
                    None => {
                        return Err(abort(format!(
                            "no result for {student}/{course}/{semester}"
                        )))
                    }
                }
            }
            ContractFunction::VerifyResult => {
                let [student, course, semester] = pures.as_slice() else {
                    return Err(abort("verify_result_entry expects 3 value arguments"));
                };
                let key = (student.clone(), course.clone(), semester.clone());
                match results.get_mut(&key) {
                    Some(stored) => stored.verified = true,
                    None => {
                        return Err(abort(format!(
                            "no result for {student}/{course}/{semester}"
                        )))
                    }
                }
            }
            _ => unreachable!("read-only functions rejected above"),
        }
        drop(results);

        let digest = self.next_digest();
        Ok(json!({
            "digest": digest,
            "effects": { "status": "success" },
            "events": [],
        }))
    }

    fn handle_inspect(&self, params: &Value) -> Result<Value, Abort> {
        let call: InspectWire = first_param(params)?;

        if call.sender.is_empty() {
            return Err(abort("simulation requires a sender address"));
        }

        let entry = entry_point(&call.target);
        if !matches!(entry, "get_result" | "result_exists" | "is_result_verified") {
            return Err(abort(format!("{entry} mutates state and cannot be simulated")));
        }

        // Read-only simulations carry exactly one object: the registry.
        // Capability objects require a signer and are rejected.
        let object_count =
            call.args.iter().filter(|a| matches!(a, CallArg::Object { .. })).count();
        if object_count != 1 {
            return Err(abort("capability or clock object in read-only simulation"));
        }

        let pures = pure_values(&call.args);
        let [student, course, semester] = pures.as_slice() else {
            return Err(abort(format!("{entry} expects 3 value arguments")));
        };
        let key = (student.clone(), course.clone(), semester.clone());
        let results = self.results.read();

        match entry {
            "get_result" => match results.get(&key) {
                Some(stored) => Ok(json!({ "value": stored.grade })),
                None => Err(abort(format!("no result for {student}/{course}/{semester}"))),
            },
            "result_exists" => Ok(json!({ "value": results.contains_key(&key) })),
            "is_result_verified" => match results.get(&key) {
                Some(stored) => Ok(json!({ "value": stored.verified })),
                None => Err(abort(format!("no result for {student}/{course}/{semester}"))),
            },
            _ => unreachable!("entry points checked above"),
        }
    }

    fn next_digest(&self) -> String {
        let seq = self.digest_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let digest = format!("0x{}", hex::encode(Sha256::digest(seq.to_be_bytes())));
        *self.last_digest.lock() = Some(digest.clone());
        digest
    }
}

fn first_param<T: serde::de::DeserializeOwned>(params: &Value) -> Result<T, Abort> {
    let param = params.get(0).cloned().ok_or_else(|| abort("missing call parameter"))?;
    serde_json::from_value(param).map_err(|e| abort(format!("malformed call parameter: {e}")))
}

fn entry_point(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

fn pure_values(args: &[CallArg]) -> Vec<String> {
    args.iter()
        .filter_map(|a| match a {
            CallArg::Pure { value } => Some(value.clone()),
            CallArg::Object { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_point_takes_the_last_path_segment() {
        assert_eq!(entry_point("0xpkg::result_registry_v2::get_result"), "get_result");
        assert_eq!(entry_point("bare"), "bare");
    }

    #[test]
    fn pure_values_skip_objects() {
        let args = vec![
            CallArg::Object { id: "0xreg".into() },
            CallArg::Pure { value: "S100".into() },
            CallArg::Pure { value: "CS201".into() },
        ];
        assert_eq!(pure_values(&args), vec!["S100".to_owned(), "CS201".to_owned()]);
    }

    #[tokio::test]
    async fn seeded_results_are_visible() {
        let ledger = MockRegistryLedger::start().await.unwrap();
        ledger.set_result("S100", "CS201", "Fall2024", "A");
        assert_eq!(ledger.grade("S100", "CS201", "Fall2024").as_deref(), Some("A"));
        assert_eq!(ledger.verified("S100", "CS201", "Fall2024"), Some(false));
        assert!(ledger.grade("S999", "CS201", "Fall2024").is_none());
    }
}
