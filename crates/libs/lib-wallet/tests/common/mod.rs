//! Shared fixtures for the session controller tests.

#![allow(dead_code)]

use lib_wallet::provider::memory::MemoryProvider;
use lib_wallet::{SessionController, WalletConfig};
use shared::dto::SessionSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

pub const ALICE: &str = "0xabc0000000000000000000000000000000000001";
pub const BOB: &str = "0xdef0000000000000000000000000000000000002";

/// 1 ETH
pub const ONE_ETH: u64 = 1_000_000_000_000_000_000;

const WAIT: Duration = Duration::from_secs(2);

pub fn test_config() -> WalletConfig {
    WalletConfig::default()
}

/// Installed provider on mainnet holding Alice and Bob, both funded on mainnet and Polygon.
pub fn funded_provider() -> Arc<MemoryProvider> {
    let provider = MemoryProvider::new().with_accounts([ALICE, BOB]).with_chain("0x1");
    provider.set_balance("0x1", ALICE, ONE_ETH);
    provider.set_balance("0x89", ALICE, 3 * ONE_ETH);
    provider.set_balance("0x1", BOB, 2 * ONE_ETH);
    Arc::new(provider)
}

pub async fn mount(provider: &Arc<MemoryProvider>) -> SessionController {
    SessionController::mount_with_config(provider.clone(), &test_config()).await
}

/// Wait until the published snapshot satisfies `pred`.
pub async fn wait_for(
    rx: &mut watch::Receiver<SessionSnapshot>,
    pred: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for snapshot")
        .expect("snapshot channel closed")
        .clone()
}

/// Poll `cond` until it holds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}
