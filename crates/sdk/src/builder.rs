//! Construction of ledger invocations against the registry contract.
//!
//! The external registry exposes a fixed set of named entry points, each with
//! a fixed positional argument schema. This module is the single place that
//! schema is encoded: a contract-version change touches only this file, and
//! no call site ever assembles arguments by hand.
//!
//! State-changing entry points always end with a reference to the shared
//! clock object; read-only entry points never include it and never include
//! capability references. This asymmetry is a contract invariant: the
//! registry rejects state-changing calls without a time reference and rejects
//! read-only simulations that carry objects requiring a signer.

use serde::{Deserialize, Serialize};

use result_registry_types::{require_field, RecordKey, Result};

/// Well-known identifier of the shared clock object required as the final
/// argument of every state-changing call.
pub const CLOCK_OBJECT_ID: &str = "0x6";

/// Module name of the registry contract.
pub const CONTRACT_MODULE: &str = "result_registry_v2";

/// The registry contract's entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractFunction {
    /// Record a new result. State-changing.
    AddResult,
    /// Fetch the grade for a full key. Read-only.
    GetResult,
    /// Replace the grade for an existing result. State-changing.
    UpdateGrade,
    /// Mark a result as verified. State-changing.
    VerifyResult,
    /// Whether a result exists for a full key. Read-only.
    ResultExists,
    /// Whether a result has been verified. Read-only.
    IsVerified,
}

impl ContractFunction {
    /// Returns the external entry-point name.
    #[must_use]
    pub const fn entry_point(self) -> &'static str {
        match self {
            Self::AddResult => "add_result_entry",
            Self::GetResult => "get_result",
            Self::UpdateGrade => "update_grade_entry",
            Self::VerifyResult => "verify_result_entry",
            Self::ResultExists => "result_exists",
            Self::IsVerified => "is_result_verified",
        }
    }

    /// Returns true if invoking this entry point mutates ledger state.
    ///
    /// State-changing functions are submitted via the signed execution verb;
    /// read-only functions via the simulation verb. The two must never be
    /// interchanged.
    #[must_use]
    pub const fn is_state_changing(self) -> bool {
        matches!(self, Self::AddResult | Self::UpdateGrade | Self::VerifyResult)
    }
}

/// Opaque authorization object reference passed as a call argument.
///
/// Concrete deployments substitute whatever the contract requires — an
/// institution capability, an admin capability, a role token — without
/// changing the call-construction protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorityRef(String);

impl AuthorityRef {
    /// Wraps an on-ledger object identifier.
    pub fn new(object_id: impl Into<String>) -> Self {
        Self(object_id.into())
    }

    /// Returns the underlying object identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

/// A single positional argument of a ledger invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CallArg {
    /// Reference to an on-ledger object (registry, capability, clock).
    Object {
        /// Object identifier.
        id: String,
    },
    /// A plain string value.
    Pure {
        /// The value.
        value: String,
    },
}

impl CallArg {
    fn object(id: impl Into<String>) -> Self {
        Self::Object { id: id.into() }
    }

    fn pure(value: impl Into<String>) -> Self {
        Self::Pure { value: value.into() }
    }
}

/// A fully constructed ledger invocation: contract target plus ordered typed
/// arguments. Produced only by [`CallBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerInvocation {
    /// Fully qualified target, `{package}::{module}::{entry_point}`.
    pub target: String,
    /// The entry point being invoked.
    pub function: ContractFunction,
    /// Ordered arguments matching the entry point's positional schema.
    pub args: Vec<CallArg>,
}

impl LedgerInvocation {
    /// Returns true if the final argument is the shared clock reference.
    #[must_use]
    pub fn ends_with_clock(&self) -> bool {
        matches!(self.args.last(), Some(CallArg::Object { id }) if id == CLOCK_OBJECT_ID)
    }
}

/// A domain operation to be mapped onto a contract entry point.
#[derive(Debug, Clone, Copy)]
pub enum RegistryOp<'a> {
    /// Record a new result.
    AddResult {
        /// Full key of the new result.
        key: &'a RecordKey,
        /// Grade value.
        grade: &'a str,
    },
    /// Fetch the grade for a full key.
    GetResult {
        /// Full key.
        key: &'a RecordKey,
    },
    /// Replace the grade of an existing result.
    UpdateGrade {
        /// Full key.
        key: &'a RecordKey,
        /// Replacement grade value.
        new_grade: &'a str,
    },
    /// Mark a result as verified.
    VerifyResult {
        /// Full key.
        key: &'a RecordKey,
    },
    /// Whether a result exists.
    ResultExists {
        /// Full key.
        key: &'a RecordKey,
    },
    /// Whether a result has been verified.
    IsVerified {
        /// Full key.
        key: &'a RecordKey,
    },
}

impl RegistryOp<'_> {
    /// Returns the contract function this operation maps to.
    #[must_use]
    pub const fn function(&self) -> ContractFunction {
        match self {
            Self::AddResult { .. } => ContractFunction::AddResult,
            Self::GetResult { .. } => ContractFunction::GetResult,
            Self::UpdateGrade { .. } => ContractFunction::UpdateGrade,
            Self::VerifyResult { .. } => ContractFunction::VerifyResult,
            Self::ResultExists { .. } => ContractFunction::ResultExists,
            Self::IsVerified { .. } => ContractFunction::IsVerified,
        }
    }

    const fn key(&self) -> &RecordKey {
        match self {
            Self::AddResult { key, .. }
            | Self::GetResult { key }
            | Self::UpdateGrade { key, .. }
            | Self::VerifyResult { key }
            | Self::ResultExists { key }
            | Self::IsVerified { key } => key,
        }
    }
}

/// Pure mapper from domain operations to ledger invocations.
///
/// Holds the deployment-specific object identifiers (package, registry,
/// authorization capability) injected once at startup.
#[derive(Debug, Clone)]
pub struct CallBuilder {
    package_id: String,
    registry_id: String,
    institution_cap: AuthorityRef,
}

impl CallBuilder {
    /// Creates a builder for a deployed registry contract.
    pub fn new(
        package_id: impl Into<String>,
        registry_id: impl Into<String>,
        institution_cap: AuthorityRef,
    ) -> Self {
        Self {
            package_id: package_id.into(),
            registry_id: registry_id.into(),
            institution_cap,
        }
    }

    /// Creates a builder from a client configuration.
    pub fn from_config(config: &crate::ClientConfig) -> Self {
        Self::new(
            config.package_id(),
            config.registry_id(),
            AuthorityRef::new(config.institution_cap()),
        )
    }

    /// Maps a domain operation to a ledger invocation.
    ///
    /// Total for well-formed inputs; pure, performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedArguments`](result_registry_types::ErrorKind::MalformedArguments)
    /// if any required field is empty.
    pub fn build(&self, op: RegistryOp<'_>) -> Result<LedgerInvocation> {
        let key = op.key();
        require_field("studentId", &key.student_id)?;
        require_field("courseCode", &key.course_code)?;
        require_field("semester", &key.semester)?;

        let function = op.function();
        let args = match op {
            RegistryOp::AddResult { key, grade } => {
                require_field("grade", grade)?;
                vec![
                    CallArg::object(self.institution_cap.id()),
                    CallArg::object(&self.registry_id),
                    CallArg::pure(&key.student_id),
                    CallArg::pure(&key.course_code),
                    CallArg::pure(grade),
                    CallArg::pure(&key.semester),
                    CallArg::object(CLOCK_OBJECT_ID),
                ]
            }
            RegistryOp::UpdateGrade { key, new_grade } => {
                require_field("newGrade", new_grade)?;
                vec![
                    CallArg::object(self.institution_cap.id()),
                    CallArg::object(&self.registry_id),
                    CallArg::pure(&key.student_id),
                    CallArg::pure(&key.course_code),
                    CallArg::pure(&key.semester),
                    CallArg::pure(new_grade),
                    CallArg::object(CLOCK_OBJECT_ID),
                ]
            }
            RegistryOp::VerifyResult { key } => vec![
                CallArg::object(self.institution_cap.id()),
                CallArg::object(&self.registry_id),
                CallArg::pure(&key.student_id),
                CallArg::pure(&key.course_code),
                CallArg::pure(&key.semester),
                CallArg::object(CLOCK_OBJECT_ID),
            ],
            RegistryOp::GetResult { key }
            | RegistryOp::ResultExists { key }
            | RegistryOp::IsVerified { key } => vec![
                CallArg::object(&self.registry_id),
                CallArg::pure(&key.student_id),
                CallArg::pure(&key.course_code),
                CallArg::pure(&key.semester),
            ],
        };

        Ok(LedgerInvocation {
            target: format!(
                "{}::{}::{}",
                self.package_id,
                CONTRACT_MODULE,
                function.entry_point()
            ),
            function,
            args,
        })
    }
}
