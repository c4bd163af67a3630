//! # Session State Machine
//!
//! Pure, synchronous transitions of a wallet session. No I/O happens here:
//! the controller performs provider calls and feeds their results back in.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──ok──▶ Connected
//!      ▲                        │                 │  ▲
//!      │                      fail          balance failure
//!      │                        ▼             (stays Connected)
//!      └──────disconnect────── Error ◀────────────┘
//! ```
//!
//! ## Tickets
//!
//! Asynchronous work is tagged when it starts and checked when it lands:
//!
//! - [`Attempt`] carries the session epoch. Every disconnect bumps the epoch, so a
//!   connect or reconciliation that finishes afterwards is discarded instead of
//!   reviving the session.
//! - [`BalanceTicket`] additionally carries the account, chain and a sequence
//!   number. A balance result is stored only if it is the latest one issued for
//!   the account and chain that are still current.

use num_bigint::BigUint;
use shared::dto::{SessionSnapshot, SessionStatus};

use crate::error::{Result, WalletError};

/// Ticket for a connect or reconciliation in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    epoch: u64,
}

/// Ticket for a balance fetch in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceTicket {
    epoch: u64,
    /// `None` when the address is not the session's account; the result is then only returned
    seq: Option<u64>,
    account: String,
    chain_id: Option<String>,
}

impl BalanceTicket {
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Whether a successful result will be stored in the session.
    pub fn tracks_session(&self) -> bool {
        self.seq.is_some()
    }
}

/// Outcome of [`Session::begin_connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectStart {
    Started(Attempt),
    /// Already connected; nothing to do
    AlreadyConnected,
}

/// Outcome of [`Session::observe_accounts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountObservation {
    /// Empty list: the session was reset
    Reset,
    /// Same active account; nothing to fetch
    Unchanged,
    /// Active account replaced; its balance must be fetched
    Switched(BalanceTicket),
    /// A connect is in flight; the account is adopted when it completes
    Deferred,
    /// Not connected: adopt `account` once the chain is known
    Detached { attempt: Attempt, account: String },
}

/// State of one wallet session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    status: SessionStatus,
    account: Option<String>,
    chain_id: Option<String>,
    balance_wei: Option<BigUint>,
    error_message: Option<String>,

    epoch: u64,
    balance_seq: u64,

    // Events observed while Connecting
    pending_account: Option<String>,
    pending_chain: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn chain_id(&self) -> Option<&str> {
        self.chain_id.as_deref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            account: self.account.clone(),
            chain_id: self.chain_id.clone(),
            balance_wei: self.balance_wei.clone(),
            error_message: self.error_message.clone(),
        }
    }

    // region: --- Connect

    /// Enter `Connecting`.
    ///
    /// Fails with [`WalletError::AlreadyConnecting`] without touching state when
    /// a connect is in flight, and moves to `Error` when no provider is present.
    pub fn begin_connect(&mut self, provider_available: bool) -> Result<ConnectStart> {
        match self.status {
            SessionStatus::Connecting => return Err(WalletError::AlreadyConnecting),
            SessionStatus::Connected => return Ok(ConnectStart::AlreadyConnected),
            SessionStatus::Disconnected | SessionStatus::Error => {}
        }

        if !provider_available {
            self.fail(WalletError::ProviderUnavailable.to_string());
            return Err(WalletError::ProviderUnavailable);
        }

        self.epoch += 1;
        self.status = SessionStatus::Connecting;
        self.error_message = None;
        self.pending_account = None;
        self.pending_chain = None;

        Ok(ConnectStart::Started(Attempt { epoch: self.epoch }))
    }

    /// Complete a connect with the provider's answers.
    ///
    /// Account or chain changes observed while connecting win over the replies.
    pub fn establish(&mut self, attempt: &Attempt, account: String, chain_id: String) -> Result<BalanceTicket> {
        if attempt.epoch != self.epoch || self.status != SessionStatus::Connecting {
            return Err(WalletError::Superseded);
        }

        self.status = SessionStatus::Connected;
        self.account = Some(self.pending_account.take().unwrap_or(account));
        self.chain_id = Some(self.pending_chain.take().unwrap_or(chain_id));
        self.balance_wei = None;
        self.error_message = None;

        self.issue_balance().ok_or(WalletError::Superseded)
    }

    /// Fail the connect identified by `attempt`. Returns `false` if it was superseded.
    pub fn fail_connect(&mut self, attempt: &Attempt, message: impl Into<String>) -> bool {
        if attempt.epoch != self.epoch || self.status != SessionStatus::Connecting {
            return false;
        }
        self.fail(message);
        true
    }

    /// Move to `Error`, dropping any connection.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.epoch += 1;
        self.status = SessionStatus::Error;
        self.account = None;
        self.chain_id = None;
        self.balance_wei = None;
        self.error_message = Some(message.into());
        self.pending_account = None;
        self.pending_chain = None;
    }

    // endregion: --- Connect

    // region: --- Reconciliation

    /// Ticket for a silent reconciliation against the current epoch.
    pub fn attempt(&self) -> Attempt {
        Attempt { epoch: self.epoch }
    }

    /// Adopt an already-authorized account without going through `Connecting`.
    ///
    /// Only applies while disconnected (or errored) and nothing has happened since
    /// `attempt` was taken.
    pub fn adopt(&mut self, attempt: &Attempt, account: String, chain_id: String) -> Option<BalanceTicket> {
        if attempt.epoch != self.epoch {
            return None;
        }
        if !matches!(self.status, SessionStatus::Disconnected | SessionStatus::Error) {
            return None;
        }

        self.status = SessionStatus::Connected;
        self.account = Some(account);
        self.chain_id = Some(chain_id);
        self.balance_wei = None;
        self.error_message = None;

        self.issue_balance()
    }

    // endregion: --- Reconciliation

    /// Local disconnect. Anything in flight is discarded when it lands.
    pub fn reset(&mut self) {
        *self = Self {
            epoch: self.epoch + 1,
            balance_seq: self.balance_seq,
            ..Self::default()
        };
    }

    // region: --- Provider events

    /// Apply an `accountsChanged` payload (already normalized).
    pub fn observe_accounts(&mut self, accounts: &[String]) -> AccountObservation {
        let Some(first) = accounts.first() else {
            self.reset();
            return AccountObservation::Reset;
        };

        match self.status {
            SessionStatus::Connected if self.account.as_deref() == Some(first.as_str()) => {
                AccountObservation::Unchanged
            }
            SessionStatus::Connected => {
                self.account = Some(first.clone());
                self.balance_wei = None;
                self.error_message = None;
                match self.issue_balance() {
                    Some(ticket) => AccountObservation::Switched(ticket),
                    None => AccountObservation::Unchanged,
                }
            }
            SessionStatus::Connecting => {
                self.pending_account = Some(first.clone());
                AccountObservation::Deferred
            }
            SessionStatus::Disconnected | SessionStatus::Error => AccountObservation::Detached {
                attempt: self.attempt(),
                account: first.clone(),
            },
        }
    }

    /// Apply a `chainChanged` payload (already normalized).
    ///
    /// Returns a balance ticket when connected; the previous balance is cleared
    /// because it belongs to the old chain.
    pub fn observe_chain(&mut self, chain_id: String) -> Option<BalanceTicket> {
        match self.status {
            SessionStatus::Connected => {
                self.chain_id = Some(chain_id);
                self.balance_wei = None;
                self.error_message = None;
                self.issue_balance()
            }
            SessionStatus::Connecting => {
                self.pending_chain = Some(chain_id);
                None
            }
            // No account, so no chain to keep
            SessionStatus::Disconnected | SessionStatus::Error => None,
        }
    }

    // endregion: --- Provider events

    // region: --- Balance

    /// Ticket for the current account's balance, or `None` when not connected.
    pub fn issue_balance(&mut self) -> Option<BalanceTicket> {
        if self.status != SessionStatus::Connected {
            return None;
        }
        let account = self.account.clone()?;

        self.balance_seq += 1;
        Some(BalanceTicket {
            epoch: self.epoch,
            seq: Some(self.balance_seq),
            account,
            chain_id: self.chain_id.clone(),
        })
    }

    /// Ticket for an explicit refresh of `address` (lowercase).
    ///
    /// Only the session's own account gets a tracking ticket; any other address
    /// is fetched for the caller without touching the session.
    pub fn balance_ticket(&mut self, address: &str) -> BalanceTicket {
        if self.account.as_deref() == Some(address) {
            if let Some(ticket) = self.issue_balance() {
                return ticket;
            }
        }

        BalanceTicket {
            epoch: self.epoch,
            seq: None,
            account: address.to_string(),
            chain_id: self.chain_id.clone(),
        }
    }

    fn is_current(&self, ticket: &BalanceTicket) -> bool {
        ticket.seq == Some(self.balance_seq)
            && ticket.epoch == self.epoch
            && self.status == SessionStatus::Connected
            && self.account.as_deref() == Some(ticket.account.as_str())
            && self.chain_id == ticket.chain_id
    }

    /// Store a fetched balance. Returns `false` when the ticket is stale.
    pub fn apply_balance(&mut self, ticket: &BalanceTicket, wei: BigUint) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.balance_wei = Some(wei);
        self.error_message = None;
        true
    }

    /// Record a failed fetch: clears the balance, keeps the connection.
    pub fn fail_balance(&mut self, ticket: &BalanceTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.balance_wei = None;
        self.error_message = Some(message.into());
        true
    }

    // endregion: --- Balance

    /// Check the structural invariants of the session.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let connected = self.status == SessionStatus::Connected;

        if self.account.is_some() != connected {
            return Err(format!(
                "account {:?} does not match status {:?}",
                self.account, self.status
            ));
        }
        if self.chain_id.is_some() != self.account.is_some() {
            return Err(format!(
                "chain {:?} present without account {:?}",
                self.chain_id, self.account
            ));
        }
        if self.balance_wei.is_some() && !connected {
            return Err(format!("balance kept while {:?}", self.status));
        }
        if self.status == SessionStatus::Error && self.error_message.is_none() {
            return Err("error status without message".to_string());
        }
        Ok(())
    }
}
