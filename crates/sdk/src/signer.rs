//! The signing capability for state-changing ledger calls.
//!
//! Wraps an Ed25519 keypair: parses operator-supplied key material, derives
//! the stable sender address used by both RPC verbs, and signs the canonical
//! encoding of a constructed invocation.
//!
//! The signer is stateless across calls (no sequence-number coordination)
//! and safe to share between in-flight operations.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signer as _, SigningKey};
use serde::Serialize;
use sha2::{Digest, Sha256};
use snafu::OptionExt as _;

use result_registry_types::{error::SignerSnafu, Result};

use crate::builder::{CallArg, LedgerInvocation};

/// Signature scheme identifier transmitted with every signed call.
const SIGNATURE_SCHEME: &str = "ed25519";

/// Opaque signing capability owned by the ledger client.
pub struct Signer {
    key: SigningKey,
    address: String,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material in logs.
        f.debug_struct("Signer").field("address", &self.address).finish_non_exhaustive()
    }
}

impl Signer {
    /// Parses a private key from its encoded form.
    ///
    /// Accepted encodings, matching what operators actually paste into env
    /// vars: hex with a `0x` prefix, or base64. Either a 32-byte seed or a
    /// 64-byte seed+public concatenation (the seed half is used).
    ///
    /// # Errors
    ///
    /// Returns `SignerError` if the encoding or the key length is invalid.
    pub fn from_encoded_key(encoded: &str) -> Result<Self> {
        let encoded = encoded.trim();
        let bytes = if let Some(hex_key) = encoded.strip_prefix("0x") {
            hex::decode(hex_key).ok().context(SignerSnafu {
                message: "private key is not valid hex",
            })?
        } else {
            BASE64.decode(encoded).ok().context(SignerSnafu {
                message: "private key is not valid base64",
            })?
        };
        Self::from_key_bytes(&bytes)
    }

    /// Builds a signer from raw key bytes (32-byte seed, or 64 bytes with
    /// the seed first).
    ///
    /// # Errors
    ///
    /// Returns `SignerError` for any other length.
    pub fn from_key_bytes(bytes: &[u8]) -> Result<Self> {
        let seed: [u8; 32] = match bytes.len() {
            32 | 64 => bytes[..32].try_into().ok().context(SignerSnafu {
                message: "private key seed is not 32 bytes",
            })?,
            other => {
                return SignerSnafu {
                    message: format!("private key must be 32 or 64 bytes, got {other}"),
                }
                .fail()
            }
        };
        let key = SigningKey::from_bytes(&seed);
        let address = derive_address(&key);
        Ok(Self { key, address })
    }

    /// Returns the sender address derived from the public key.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Signs a constructed invocation, producing the submission payload for
    /// the state-changing RPC verb.
    ///
    /// # Errors
    ///
    /// Returns `SignerError` if the invocation cannot be canonically encoded.
    pub fn sign_invocation(&self, invocation: &LedgerInvocation) -> Result<SignedCall> {
        let canonical = canonical_bytes(invocation, &self.address)?;
        let signature = self.key.sign(&canonical);
        Ok(SignedCall {
            sender: self.address.clone(),
            target: invocation.target.clone(),
            args: invocation.args.clone(),
            signature: hex::encode(signature.to_bytes()),
            scheme: SIGNATURE_SCHEME,
        })
    }
}

/// A signed, submittable state-changing call.
#[derive(Debug, Clone, Serialize)]
pub struct SignedCall {
    /// Sender address derived from the signer's public key.
    pub sender: String,
    /// Fully qualified contract target.
    pub target: String,
    /// Ordered call arguments.
    pub args: Vec<CallArg>,
    /// Hex-encoded Ed25519 signature over the canonical call encoding.
    pub signature: String,
    /// Signature scheme identifier.
    pub scheme: &'static str,
}

/// Canonical byte encoding that gets signed: the JSON serialization of
/// (sender, target, args) in that order.
fn canonical_bytes(invocation: &LedgerInvocation, sender: &str) -> Result<Vec<u8>> {
    #[derive(Serialize)]
    struct Canonical<'a> {
        sender: &'a str,
        target: &'a str,
        args: &'a [CallArg],
    }
    serde_json::to_vec(&Canonical { sender, target: &invocation.target, args: &invocation.args })
        .ok()
        .context(SignerSnafu { message: "failed to encode call for signing" })
}

/// Derives the sender address: `0x` + SHA-256 over the public key bytes.
fn derive_address(key: &SigningKey) -> String {
    let digest = Sha256::digest(key.verifying_key().as_bytes());
    format!("0x{}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use result_registry_types::{ErrorKind, RecordKey};

    use super::*;
    use crate::builder::{AuthorityRef, CallBuilder, RegistryOp};

    const TEST_SEED: [u8; 32] = [7u8; 32];

    fn test_invocation() -> LedgerInvocation {
        let key = RecordKey::new("S100", "CS201", "Fall2024");
        CallBuilder::new("0xpkg", "0xreg", AuthorityRef::new("0xcap"))
            .build(RegistryOp::AddResult { key: &key, grade: "A" })
            .unwrap()
    }

    #[test]
    fn hex_and_base64_encodings_yield_the_same_signer() {
        let hex_encoded = format!("0x{}", hex::encode(TEST_SEED));
        let b64_encoded = BASE64.encode(TEST_SEED);

        let a = Signer::from_encoded_key(&hex_encoded).unwrap();
        let b = Signer::from_encoded_key(&b64_encoded).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn sixty_four_byte_keys_use_the_seed_half() {
        let mut expanded = [0u8; 64];
        expanded[..32].copy_from_slice(&TEST_SEED);
        let a = Signer::from_key_bytes(&expanded).unwrap();
        let b = Signer::from_key_bytes(&TEST_SEED).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn address_is_stable_and_hex_prefixed() {
        let signer = Signer::from_key_bytes(&TEST_SEED).unwrap();
        assert!(signer.address().starts_with("0x"));
        assert_eq!(signer.address().len(), 2 + 64);
        assert_eq!(signer.address(), Signer::from_key_bytes(&TEST_SEED).unwrap().address());
    }

    #[test]
    fn invalid_key_material_is_a_signer_error() {
        assert_eq!(
            Signer::from_encoded_key("0xzz").unwrap_err().kind(),
            ErrorKind::SignerError
        );
        assert_eq!(
            Signer::from_key_bytes(&[1u8; 16]).unwrap_err().kind(),
            ErrorKind::SignerError
        );
        assert_eq!(
            Signer::from_encoded_key("!!not-base64!!").unwrap_err().kind(),
            ErrorKind::SignerError
        );
    }

    #[test]
    fn signed_call_carries_sender_args_and_signature() {
        let signer = Signer::from_key_bytes(&TEST_SEED).unwrap();
        let invocation = test_invocation();
        let signed = signer.sign_invocation(&invocation).unwrap();

        assert_eq!(signed.sender, signer.address());
        assert_eq!(signed.target, invocation.target);
        assert_eq!(signed.args, invocation.args);
        assert_eq!(signed.scheme, "ed25519");
        // 64-byte signature, hex encoded
        assert_eq!(signed.signature.len(), 128);
    }

    #[test]
    fn signing_is_deterministic_per_invocation() {
        let signer = Signer::from_key_bytes(&TEST_SEED).unwrap();
        let invocation = test_invocation();
        let a = signer.sign_invocation(&invocation).unwrap();
        let b = signer.sign_invocation(&invocation).unwrap();
        assert_eq!(a.signature, b.signature);
    }

    #[test]
    fn debug_does_not_leak_key_material() {
        let signer = Signer::from_key_bytes(&TEST_SEED).unwrap();
        let rendered = format!("{signer:?}");
        assert!(rendered.contains(signer.address()));
        assert!(!rendered.contains(&hex::encode(TEST_SEED)));
    }
}
