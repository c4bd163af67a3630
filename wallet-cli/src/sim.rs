//! Demo wallet for `WALLET_PROVIDER=memory`.

use lib_wallet::provider::memory::MemoryProvider;

use crate::commands::SimCommand;

pub const DEMO_ACCOUNTS: [&str; 2] = [
    "0x1234567890abcdef1234567890abcdef12345678",
    "0xfeedfacecafebeefdeadbeef0123456789abcdef",
];

/// A wallet holding two accounts, funded on mainnet and Polygon.
pub fn demo_provider() -> MemoryProvider {
    let provider = MemoryProvider::new().with_accounts(DEMO_ACCOUNTS).with_chain("0x1");
    provider.set_balance("0x1", DEMO_ACCOUNTS[0], 1_234_500_000_000_000_000u64);
    provider.set_balance("0x89", DEMO_ACCOUNTS[0], 42_000_000_000_000_000_000u128);
    provider.set_balance("0x1", DEMO_ACCOUNTS[1], 50_000_000_000_000_000u64);
    provider
}

/// Apply a scripted change and describe it.
pub fn apply(provider: &MemoryProvider, command: SimCommand) -> String {
    match command {
        SimCommand::Accounts(accounts) => {
            let summary = if accounts.is_empty() {
                "no accounts".to_string()
            } else {
                accounts.join(", ")
            };
            provider.set_accounts(accounts);
            format!("wallet accounts set to {}", summary)
        }
        SimCommand::Revoke => {
            provider.revoke();
            "authorization revoked".to_string()
        }
        SimCommand::Chain(chain_id) => {
            let message = format!("wallet switched to {}", chain_id);
            provider.set_chain(chain_id);
            message
        }
        SimCommand::Balance {
            chain_id,
            address,
            wei,
        } => {
            let message = format!("balance of {} on {} set to {} wei", address, chain_id, wei);
            provider.set_balance(&chain_id, &address, wei);
            message
        }
        SimCommand::Install => {
            provider.set_installed(true);
            "provider installed".to_string()
        }
        SimCommand::Uninstall => {
            provider.set_installed(false);
            "provider removed".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_wallet::provider::methods;
    use lib_wallet::WalletProvider;
    use serde_json::json;

    #[tokio::test]
    async fn test_demo_provider_is_funded() {
        let provider = demo_provider();
        provider.request(methods::REQUEST_ACCOUNTS, vec![]).await.unwrap();

        let wei = provider
            .request(methods::GET_BALANCE, vec![json!(DEMO_ACCOUNTS[0]), json!("latest")])
            .await
            .unwrap();
        assert_eq!(wei, json!("0x1121d33597384000"));
    }

    #[test]
    fn test_apply_uninstall() {
        let provider = demo_provider();
        let message = apply(&provider, SimCommand::Uninstall);
        assert_eq!(message, "provider removed");
        assert!(!provider.is_available());
    }
}
