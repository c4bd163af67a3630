//! # Session Property Tests
//!
//! Random operation sequences against the pure state machine and the async
//! controller, checking the structural invariants after every step.

mod common;

use common::*;
use lib_wallet::provider::memory::MemoryProvider;
use lib_wallet::session::{AccountObservation, Attempt, BalanceTicket, ConnectStart, Session};
use lib_wallet::WalletError;
use num_bigint::BigUint;
use proptest::prelude::*;
use shared::dto::{SessionSnapshot, SessionStatus};
use std::sync::Arc;

const ACCOUNTS: [&str; 3] = [
    ALICE,
    BOB,
    "0x1230000000000000000000000000000000000003",
];
const CHAINS: [&str; 3] = ["0x1", "0x89", "0xaa36a7"];

#[derive(Debug, Clone)]
enum Op {
    Connect { available: bool },
    Establish { account: usize, chain: usize },
    FailConnect,
    Disconnect,
    AccountsChanged(Vec<usize>),
    ChainChanged(usize),
    Adopt { account: usize, chain: usize },
    IssueBalance,
    LandBalance { ticket: usize, amount: u64, ok: bool },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(|available| Op::Connect { available }),
        (0..3usize, 0..3usize).prop_map(|(account, chain)| Op::Establish { account, chain }),
        Just(Op::FailConnect),
        Just(Op::Disconnect),
        prop::collection::vec(0..3usize, 0..3).prop_map(Op::AccountsChanged),
        (0..3usize).prop_map(Op::ChainChanged),
        (0..3usize, 0..3usize).prop_map(|(account, chain)| Op::Adopt { account, chain }),
        Just(Op::IssueBalance),
        (0..8usize, any::<u64>(), any::<bool>())
            .prop_map(|(ticket, amount, ok)| Op::LandBalance { ticket, amount, ok }),
    ]
}

#[derive(Default)]
struct Driver {
    session: Session,
    attempts: Vec<Attempt>,
    tickets: Vec<BalanceTicket>,
}

impl Driver {
    fn apply(&mut self, op: Op) -> Result<(), TestCaseError> {
        let before = self.session.snapshot();

        match op {
            Op::Connect { available } => match self.session.begin_connect(available) {
                Ok(ConnectStart::Started(attempt)) => self.attempts.push(attempt),
                Ok(ConnectStart::AlreadyConnected) => prop_assert_eq!(before.status, SessionStatus::Connected),
                Err(WalletError::AlreadyConnecting) => {
                    prop_assert_eq!(before.status, SessionStatus::Connecting);
                    prop_assert_eq!(self.session.snapshot(), before);
                }
                Err(err) => {
                    prop_assert_eq!(err, WalletError::ProviderUnavailable);
                    prop_assert_eq!(self.session.status(), SessionStatus::Error);
                }
            },
            Op::Establish { account, chain } => {
                if let Some(attempt) = self.attempts.last() {
                    if let Ok(ticket) =
                        self.session
                            .establish(attempt, ACCOUNTS[account].into(), CHAINS[chain].into())
                    {
                        self.tickets.push(ticket);
                    }
                }
            }
            Op::FailConnect => {
                if let Some(attempt) = self.attempts.last() {
                    self.session.fail_connect(attempt, "rejected");
                }
            }
            Op::Disconnect => {
                self.session.reset();
                prop_assert_eq!(self.session.snapshot(), SessionSnapshot::default());
            }
            Op::AccountsChanged(indices) => {
                let accounts: Vec<String> = indices.iter().map(|&i| ACCOUNTS[i].to_string()).collect();
                match self.session.observe_accounts(&accounts) {
                    AccountObservation::Reset => {
                        prop_assert_eq!(self.session.snapshot(), SessionSnapshot::default());
                    }
                    AccountObservation::Switched(ticket) => {
                        prop_assert_eq!(self.session.snapshot().balance_wei, None);
                        self.tickets.push(ticket);
                    }
                    AccountObservation::Detached { attempt, .. } => self.attempts.push(attempt),
                    AccountObservation::Unchanged | AccountObservation::Deferred => {}
                }
            }
            Op::ChainChanged(chain) => {
                if let Some(ticket) = self.session.observe_chain(CHAINS[chain].into()) {
                    prop_assert_eq!(self.session.chain_id(), Some(CHAINS[chain]));
                    self.tickets.push(ticket);
                }
            }
            Op::Adopt { account, chain } => {
                let attempt = self.session.attempt();
                if let Some(ticket) = self.session.adopt(&attempt, ACCOUNTS[account].into(), CHAINS[chain].into()) {
                    self.tickets.push(ticket);
                }
            }
            Op::IssueBalance => {
                if let Some(ticket) = self.session.issue_balance() {
                    self.tickets.push(ticket);
                }
            }
            Op::LandBalance { ticket, amount, ok } => {
                if let Some(ticket) = self.tickets.get(ticket).cloned() {
                    let applied = if ok {
                        self.session.apply_balance(&ticket, BigUint::from(amount))
                    } else {
                        self.session.fail_balance(&ticket, "timeout")
                    };
                    if applied {
                        // Balance results never change the connection
                        let after = self.session.snapshot();
                        prop_assert_eq!(after.status, before.status);
                        prop_assert_eq!(after.account, before.account);
                        prop_assert_eq!(after.chain_id, before.chain_id);
                    } else {
                        prop_assert_eq!(self.session.snapshot(), before);
                    }
                }
            }
        }

        self.session
            .check_invariants()
            .map_err(TestCaseError::fail)?;
        Ok(())
    }
}

proptest! {
    #[test]
    fn prop_session_invariants_hold(ops in prop::collection::vec(op(), 1..60)) {
        let mut driver = Driver::default();
        for op in ops {
            driver.apply(op)?;
        }
    }

    #[test]
    fn prop_empty_accounts_always_resets(ops in prop::collection::vec(op(), 0..30)) {
        let mut driver = Driver::default();
        for op in ops {
            driver.apply(op)?;
        }

        driver.session.observe_accounts(&[]);
        prop_assert_eq!(driver.session.snapshot(), SessionSnapshot::default());
    }
}

// region: --- Controller

#[derive(Debug, Clone)]
enum ControllerOp {
    Connect,
    Disconnect,
    SetAccounts(Vec<usize>),
    Revoke,
    SetChain(usize),
    Refresh,
}

fn controller_op() -> impl Strategy<Value = ControllerOp> {
    prop_oneof![
        Just(ControllerOp::Connect),
        Just(ControllerOp::Disconnect),
        prop::collection::vec(0..3usize, 0..3).prop_map(ControllerOp::SetAccounts),
        Just(ControllerOp::Revoke),
        (0..3usize).prop_map(ControllerOp::SetChain),
        Just(ControllerOp::Refresh),
    ]
}

fn check_snapshot(snapshot: &SessionSnapshot) -> Result<(), TestCaseError> {
    if snapshot.account.is_some() {
        prop_assert_eq!(snapshot.status, SessionStatus::Connected);
        prop_assert!(snapshot.chain_id.is_some());
    }
    if snapshot.balance_wei.is_some() {
        prop_assert!(snapshot.account.is_some());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_controller_snapshots_stay_consistent(ops in prop::collection::vec(controller_op(), 1..20)) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async move {
            let provider = Arc::new(MemoryProvider::new().with_accounts([ALICE]));
            for account in ACCOUNTS {
                for chain in CHAINS {
                    provider.set_balance(chain, account, ONE_ETH);
                }
            }

            let controller = mount(&provider).await;
            let mut rx = controller.subscribe();

            for op in ops {
                match op {
                    ControllerOp::Connect => {
                        let _ = controller.connect().await;
                    }
                    ControllerOp::Disconnect => controller.disconnect(),
                    ControllerOp::SetAccounts(indices) => {
                        provider.set_accounts(indices.into_iter().map(|i| ACCOUNTS[i]));
                    }
                    ControllerOp::Revoke => provider.revoke(),
                    ControllerOp::SetChain(chain) => provider.set_chain(CHAINS[chain]),
                    ControllerOp::Refresh => {
                        let _ = controller.refresh_current_balance().await;
                    }
                }

                tokio::task::yield_now().await;
                check_snapshot(&rx.borrow_and_update())?;
                check_snapshot(&controller.snapshot())?;
            }

            controller.unmount();
            prop_assert_eq!(provider.listener_count(), 0);
            Ok::<(), TestCaseError>(())
        })?;
    }
}

// endregion: --- Controller
