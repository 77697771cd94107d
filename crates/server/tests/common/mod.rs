//! Shared harness: a [`ResultService`] wired to the mock ledger and an
//! in-memory mirror.

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use result_registry_sdk::{
    mock::MockRegistryLedger, CallBuilder, ClientConfig, LedgerClient, RetryPolicy, Signer,
};
use result_registry_server::{InMemoryMirror, MirrorStore, ResultService};

pub struct Harness {
    pub ledger: MockRegistryLedger,
    pub mirror: Arc<InMemoryMirror>,
    pub service: ResultService,
}

/// Builds a service over the given mirror, talking to a fresh mock ledger.
pub async fn service_with_mirror(mirror: Arc<dyn MirrorStore>) -> (MockRegistryLedger, ResultService) {
    let ledger = MockRegistryLedger::start().await.unwrap();
    let config = ClientConfig::builder()
        .with_rpc_url(ledger.endpoint())
        .with_package_id("0xpkg")
        .with_registry_id("0xreg")
        .with_institution_cap("0xcap")
        .with_retry_policy(RetryPolicy {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(20),
            multiplier: 2.0,
        })
        .build()
        .unwrap();

    let builder = CallBuilder::from_config(&config);
    let signer = Arc::new(Signer::from_key_bytes(&[9u8; 32]).unwrap());
    let client = Arc::new(LedgerClient::new(config, signer).unwrap());

    (ledger, ResultService::new(client, builder, mirror))
}

pub async fn harness() -> Harness {
    let mirror = Arc::new(InMemoryMirror::new());
    let (ledger, service) = service_with_mirror(Arc::clone(&mirror) as Arc<dyn MirrorStore>).await;
    Harness { ledger, mirror, service }
}
