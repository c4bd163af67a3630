//! # Wallet CLI
//!
//! Text presentation adapter for the wallet session: reads commands from stdin
//! and prints a line for every session change.
//!
//! ```text
//! $ WALLET_PROVIDER=memory wallet-cli
//! 2026-01-01T10:00:00.000Z [Disconnected] type 'connect' to connect a wallet
//! connect
//! 2026-01-01T10:00:01.120Z [Connecting]
//! 2026-01-01T10:00:01.121Z [Connected] 0x1234...5678 on Ethereum Mainnet | balance loading...
//! 2026-01-01T10:00:01.122Z [Connected] 0x1234...5678 on Ethereum Mainnet | 1.2345 ETH
//! ```
//!
//! Pass `--json` for one JSON object per change.

mod commands;
mod logger;
mod render;
mod sim;

use anyhow::Context;
use commands::Command;
use lib_utils::time::{format_time, now_utc};
use lib_wallet::error::INSTALL_URL;
use lib_wallet::provider::http::HttpProvider;
use lib_wallet::provider::memory::MemoryProvider;
use lib_wallet::{init_config, ProviderKind, SessionController, WalletError, WalletProvider};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

struct Output {
    json: bool,
}

impl Output {
    fn snapshot(&self, snapshot: &shared::dto::SessionSnapshot) {
        println!("{}", render::render(snapshot, &format_time(now_utc()), self.json));
    }

    fn note(&self, message: &str) {
        if !self.json {
            println!("{}", message);
        }
    }

    fn error(&self, err: &WalletError) {
        eprintln!("error: {}", err);
        if matches!(err, WalletError::ProviderUnavailable) {
            eprintln!("hint: get a wallet at {}", INSTALL_URL);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let _log_guard = logger::init();

    let config = init_config()
        .map_err(anyhow::Error::msg)
        .context("Invalid wallet configuration")?;

    let output = Arc::new(Output {
        json: std::env::args().skip(1).any(|arg| arg == "--json"),
    });

    let (provider, simulator): (Arc<dyn WalletProvider>, Option<Arc<MemoryProvider>>) = match config.provider {
        ProviderKind::Http => (Arc::new(HttpProvider::from_config(config)), None),
        ProviderKind::Memory => {
            let demo = Arc::new(sim::demo_provider());
            (demo.clone(), Some(demo))
        }
    };

    let controller = SessionController::mount_with_config(provider, config).await;
    let mut updates = controller.subscribe();
    output.snapshot(&updates.borrow_and_update());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };

                let command = match commands::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(message) => {
                        eprintln!("{}", message);
                        continue;
                    }
                };

                match command {
                    Command::Connect => {
                        let handle = controller.handle();
                        let output = output.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle.connect().await {
                                output.error(&err);
                            }
                        });
                    }
                    Command::Disconnect => controller.disconnect(),
                    Command::Refresh(address) => {
                        let handle = controller.handle();
                        let output = output.clone();
                        tokio::spawn(async move {
                            let result = match address {
                                Some(address) => handle.refresh_balance(&address).await.map(Some),
                                None => handle.refresh_current_balance().await,
                            };
                            match result {
                                Ok(Some(wei)) => output.note(&format!("balance: {}", shared::utils::format_balance(&wei))),
                                Ok(None) => output.note("not connected"),
                                Err(err) => output.error(&err),
                            }
                        });
                    }
                    Command::Status => output.snapshot(&controller.snapshot()),
                    Command::Help => println!("{}", commands::HELP),
                    Command::Quit => break,
                    Command::Sim(command) => match &simulator {
                        Some(provider) => output.note(&sim::apply(provider, command)),
                        None => eprintln!("sim commands need WALLET_PROVIDER=memory"),
                    },
                }
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                output.snapshot(&updates.borrow_and_update());
            }
        }
    }

    controller.unmount();
    Ok(())
}
