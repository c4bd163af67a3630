//! # Session Controller
//!
//! Async orchestration of a [`Session`]: provider calls, event reconciliation,
//! balance refreshes and snapshot publication.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐     accountsChanged / chainChanged
//! │  WalletProvider              │──────────────┐
//! └──────────────▲───────────────┘              │ async_channel
//!                │ request()                    │ (unbounded)
//! ┌──────────────┴───────────────┐   ┌──────────▼──────────┐
//! │  SessionHandle               │◀──│  event pump task     │
//! │  connect / disconnect /      │   └─────────────────────┘
//! │  refresh_balance             │
//! │  ┌────────────────────────┐  │   watch::Sender<SessionSnapshot>
//! │  │ RwLock<Session>        │──┼──────────────▶ presentation adapter
//! │  └────────────────────────┘  │
//! └──────────────────────────────┘
//! ```
//!
//! Every state change goes through one write lock and publishes the new
//! snapshot before the lock is released, so observers see changes in order.
//!
//! ## Lifecycle
//!
//! [`SessionController::mount`] registers the provider listeners, starts the
//! event pump and silently reconciles an already-authorized account. Dropping
//! the controller (or calling [`SessionController::unmount`]) releases the
//! listeners and stops background tasks on every exit path, including while a
//! connect is outstanding. Results that land afterwards are discarded.
//!
//! [`SessionHandle::disconnect`] is local only: providers have no programmatic
//! disconnect, so the provider may still consider this origin authorized.

use async_channel::Receiver;
use lib_utils::validation::normalize_address;
use num_bigint::BigUint;
use parking_lot::RwLock;
use shared::dto::SessionSnapshot;
use shared::networks::network_name;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::{wallet_config, WalletConfig};
use crate::error::{Result, WalletError};
use crate::provider::{ListenerId, ProviderEvent, ProviderEventKind, WalletProvider};
use crate::rpc;
use crate::session::{AccountObservation, Attempt, BalanceTicket, ConnectStart, Session};

struct Inner {
    provider: Arc<dyn WalletProvider>,
    session: RwLock<Session>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    closed: AtomicBool,
}

impl Inner {
    /// Mutate the session and publish the resulting snapshot if it changed.
    fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.session.write();
        let out = f(&mut session);
        let snapshot = session.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
        out
    }
}

/// Cloneable handle to a mounted session.
///
/// All operations fail with [`WalletError::SessionClosed`] once the owning
/// [`SessionController`] has been unmounted.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

impl SessionHandle {
    fn new(provider: Arc<dyn WalletProvider>) -> Self {
        let session = Session::new();
        let (snapshot_tx, _) = watch::channel(session.snapshot());
        Self {
            inner: Arc::new(Inner {
                provider,
                session: RwLock::new(session),
                snapshot_tx,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(WalletError::SessionClosed);
        }
        Ok(())
    }

    fn provider(&self) -> &dyn WalletProvider {
        self.inner.provider.as_ref()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    // region: --- Connect

    /// Prompt the provider for account access and connect.
    ///
    /// Returns the snapshot at the moment the connection was established; the
    /// balance is fetched in the background. Calling this while already
    /// connected returns the current snapshot without prompting. Dropping the
    /// returned future mid-flight moves the session to `Error`, so a later call
    /// can start over.
    ///
    /// # Errors
    ///
    /// - [`WalletError::AlreadyConnecting`] if a connect is in flight (state untouched)
    /// - [`WalletError::ProviderUnavailable`], [`WalletError::UserRejected`],
    ///   [`WalletError::Provider`], [`WalletError::InvalidResponse`]: session moves to `Error`
    /// - [`WalletError::Superseded`] if a disconnect happened meanwhile
    /// - [`WalletError::SessionClosed`] if the session was unmounted
    pub async fn connect(&self) -> Result<SessionSnapshot> {
        self.ensure_open()?;

        let available = self.provider().is_available();
        let start = self.inner.update(|session| session.begin_connect(available));

        let attempt = match start {
            Ok(ConnectStart::Started(attempt)) => attempt,
            Ok(ConnectStart::AlreadyConnected) => return Ok(self.snapshot()),
            Err(WalletError::AlreadyConnecting) => {
                debug!("Connect ignored: attempt already in flight");
                return Err(WalletError::AlreadyConnecting);
            }
            Err(err) => {
                warn!(error = %err, "Wallet connection failed");
                return Err(err);
            }
        };

        info!("Requesting wallet accounts");

        let mut guard = ConnectGuard::new(self, attempt);
        let result = self.establish(&attempt).await;
        guard.disarm();

        match result {
            Ok(ticket) => {
                let snapshot = self.snapshot();
                info!(
                    account = %ticket.account(),
                    chain_id = snapshot.chain_id.as_deref().unwrap_or_default(),
                    "Wallet connected"
                );
                self.spawn_balance(ticket);
                Ok(snapshot)
            }
            Err(err @ (WalletError::Superseded | WalletError::SessionClosed)) => {
                debug!(error = %err, "Discarding connect result");
                Err(err)
            }
            Err(_) if self.is_closed() => Err(WalletError::SessionClosed),
            Err(err) => {
                let message = connect_failure_message(&err);
                if !self.inner.update(|session| session.fail_connect(&attempt, message)) {
                    debug!(error = %err, "Connect failed after being superseded");
                    return Err(WalletError::Superseded);
                }
                match err {
                    WalletError::UserRejected | WalletError::ProviderUnavailable => {
                        warn!(error = %err, "Wallet connection failed")
                    }
                    _ => error!(error = %err, retryable = err.is_retryable(), "Wallet connection failed"),
                }
                Err(err)
            }
        }
    }

    async fn establish(&self, attempt: &Attempt) -> Result<BalanceTicket> {
        let accounts = rpc::request_accounts(self.provider())
            .await
            .map_err(lifecycle_error)?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| WalletError::InvalidResponse("eth_requestAccounts returned no accounts".to_string()))?;

        let chain_id = rpc::chain_id(self.provider()).await.map_err(lifecycle_error)?;

        self.ensure_open()?;
        self.inner
            .update(|session| session.establish(attempt, account, chain_id))
    }

    // endregion: --- Connect

    /// Forget the connection locally. Idempotent.
    ///
    /// The provider is not called; it may still consider this origin authorized.
    pub fn disconnect(&self) {
        let was_connected = self
            .inner
            .update(|session| {
                let account = session.account().map(str::to_string);
                session.reset();
                account
            });

        match was_connected {
            Some(account) => info!(%account, "Wallet disconnected"),
            None => debug!("Disconnect on idle session"),
        }
    }

    // region: --- Balance

    /// Fetch the balance of `address` at the latest block.
    ///
    /// When `address` is the connected account the result is stored in the
    /// session; a failure then clears the stored balance and sets the error
    /// message, but never changes the connection status.
    pub async fn refresh_balance(&self, address: &str) -> Result<BigUint> {
        self.ensure_open()?;
        let address = normalize_address(address).map_err(WalletError::BalanceFetchFailed)?;
        let ticket = self.inner.update(|session| session.balance_ticket(&address));
        self.run_balance(ticket).await
    }

    /// Refresh the connected account's balance. `Ok(None)` when not connected.
    pub async fn refresh_current_balance(&self) -> Result<Option<BigUint>> {
        self.ensure_open()?;
        match self.inner.update(Session::issue_balance) {
            Some(ticket) => self.run_balance(ticket).await.map(Some),
            None => Ok(None),
        }
    }

    async fn run_balance(&self, ticket: BalanceTicket) -> Result<BigUint> {
        let result = rpc::get_balance(self.provider(), ticket.account()).await;
        self.ensure_open()?;

        match result {
            Ok(wei) => {
                if self.inner.update(|session| session.apply_balance(&ticket, wei.clone())) {
                    debug!(account = %ticket.account(), %wei, "Balance updated");
                } else if ticket.tracks_session() {
                    debug!(account = %ticket.account(), "Discarding stale balance");
                }
                Ok(wei)
            }
            Err(err) => {
                let err = WalletError::BalanceFetchFailed(err.to_string());
                let message = err.to_string();
                if self.inner.update(|session| session.fail_balance(&ticket, message)) {
                    warn!(account = %ticket.account(), error = %err, "Balance refresh failed");
                }
                Err(err)
            }
        }
    }

    /// Fire-and-forget balance fetch.
    fn spawn_balance(&self, ticket: BalanceTicket) {
        let handle = self.clone();
        tokio::spawn(async move {
            let _ = handle.run_balance(ticket).await;
        });
    }

    // endregion: --- Balance

    // region: --- Reconciliation

    /// Silently adopt an already-authorized account.
    ///
    /// Probes `eth_accounts` unless `known` is given. Never prompts and never
    /// moves the session to `Error`. Returns whether the account was adopted.
    async fn reconcile(&self, attempt: Attempt, known: Option<String>) -> bool {
        if !self.provider().is_available() {
            debug!("No provider present; skipping reconciliation");
            return false;
        }

        let account = match known {
            Some(account) => account,
            None => match rpc::accounts(self.provider()).await {
                Ok(accounts) => match accounts.into_iter().next() {
                    Some(account) => account,
                    None => return false,
                },
                Err(err) => {
                    warn!(error = %err, "Account probe failed");
                    return false;
                }
            },
        };

        let chain_id = match rpc::chain_id(self.provider()).await {
            Ok(chain_id) => chain_id,
            Err(err) => {
                warn!(%account, error = %err, "Chain probe failed; not restoring session");
                return false;
            }
        };

        if self.is_closed() {
            return false;
        }

        match self
            .inner
            .update(|session| session.adopt(&attempt, account.clone(), chain_id.clone()))
        {
            Some(ticket) => {
                info!(%account, %chain_id, network = %network_name(&chain_id), "Restored authorized wallet session");
                self.spawn_balance(ticket);
                true
            }
            None => {
                debug!(%account, "Reconciliation superseded");
                false
            }
        }
    }

    // endregion: --- Reconciliation

    // region: --- Provider events

    fn apply_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(raw) => {
                let accounts = match rpc::normalize_accounts(raw) {
                    Ok(accounts) => accounts,
                    Err(err) => {
                        warn!(error = %err, "Ignoring malformed accountsChanged");
                        return;
                    }
                };

                match self.inner.update(|session| session.observe_accounts(&accounts)) {
                    AccountObservation::Reset => info!("Provider revoked accounts; session reset"),
                    AccountObservation::Unchanged => {}
                    AccountObservation::Switched(ticket) => {
                        info!(account = %ticket.account(), "Active account changed");
                        self.spawn_balance(ticket);
                    }
                    AccountObservation::Deferred => debug!("Account change recorded during connect"),
                    AccountObservation::Detached { attempt, account } => {
                        let handle = self.clone();
                        tokio::spawn(async move {
                            handle.reconcile(attempt, Some(account)).await;
                        });
                    }
                }
            }
            ProviderEvent::ChainChanged(raw) => {
                let chain_id = match rpc::normalize_chain_id(&raw) {
                    Ok(chain_id) => chain_id,
                    Err(err) => {
                        warn!(error = %err, "Ignoring malformed chainChanged");
                        return;
                    }
                };

                info!(%chain_id, network = %network_name(&chain_id), "Network changed");
                if let Some(ticket) = self.inner.update(|session| session.observe_chain(chain_id)) {
                    self.spawn_balance(ticket);
                }
            }
        }
    }

    // endregion: --- Provider events
}

/// Moves an abandoned connect out of `Connecting` when its future is dropped
/// before completing (timeout, `select!`, task abort).
struct ConnectGuard<'a> {
    handle: &'a SessionHandle,
    attempt: Option<Attempt>,
}

impl<'a> ConnectGuard<'a> {
    fn new(handle: &'a SessionHandle, attempt: Attempt) -> Self {
        Self {
            handle,
            attempt: Some(attempt),
        }
    }

    fn disarm(&mut self) {
        self.attempt = None;
    }
}

impl Drop for ConnectGuard<'_> {
    fn drop(&mut self) {
        let Some(attempt) = self.attempt.take() else {
            return;
        };
        if self.handle.is_closed() {
            return;
        }
        if self
            .handle
            .inner
            .update(|session| session.fail_connect(&attempt, CONNECT_CANCELLED))
        {
            warn!("Wallet connection attempt cancelled");
        }
    }
}

const CONNECT_CANCELLED: &str = "Connection attempt cancelled";

/// Map a raw provider rejection onto the connect taxonomy.
fn lifecycle_error(err: WalletError) -> WalletError {
    match err {
        WalletError::Provider(provider_err) => provider_err.into(),
        other => other,
    }
}

fn connect_failure_message(err: &WalletError) -> String {
    match err {
        WalletError::UserRejected | WalletError::ProviderUnavailable => err.to_string(),
        other => format!("An error occurred while connecting to the wallet: {}", other),
    }
}

async fn event_pump(handle: SessionHandle, events: Receiver<ProviderEvent>) {
    while let Ok(event) = events.recv().await {
        if handle.is_closed() {
            break;
        }
        handle.apply_event(event);
    }
}

async fn balance_timer(handle: SessionHandle, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if handle.is_closed() {
            break;
        }
        if let Err(err) = handle.refresh_current_balance().await {
            debug!(error = %err, "Periodic balance refresh failed");
        }
    }
}

/// Owner of a mounted wallet session.
///
/// Holds the provider subscriptions and background tasks; they are released
/// when the controller is unmounted or dropped.
pub struct SessionController {
    handle: SessionHandle,
    listeners: Vec<(ProviderEventKind, ListenerId)>,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionController {
    /// Mount a session using the global [`wallet_config()`].
    pub async fn mount(provider: Arc<dyn WalletProvider>) -> Self {
        Self::mount_with_config(provider, wallet_config()).await
    }

    /// Mount a session: subscribe to provider events, start background tasks,
    /// then silently reconcile an already-authorized account.
    ///
    /// Must be called within a tokio runtime.
    pub async fn mount_with_config(provider: Arc<dyn WalletProvider>, config: &WalletConfig) -> Self {
        let handle = SessionHandle::new(provider.clone());
        let (tx, rx) = async_channel::unbounded();

        let listeners = ProviderEventKind::ALL
            .into_iter()
            .map(|kind| {
                let tx = tx.clone();
                let id = provider.subscribe(
                    kind,
                    Arc::new(move |event| {
                        let _ = tx.try_send(event);
                    }),
                );
                (kind, id)
            })
            .collect();

        let mut tasks = vec![tokio::spawn(event_pump(handle.clone(), rx))];
        if let Some(period) = config.balance_refresh_interval {
            tasks.push(tokio::spawn(balance_timer(handle.clone(), period)));
        }

        // Owned before the first await so teardown runs if mounting is cancelled
        let controller = Self {
            handle,
            listeners,
            tasks,
        };

        info!(available = provider.is_available(), "Wallet session mounted");

        let attempt = controller.handle.inner.session.read().attempt();
        controller.handle.reconcile(attempt, None).await;

        controller
    }

    /// A cloneable handle for use from other tasks.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub async fn connect(&self) -> Result<SessionSnapshot> {
        self.handle.connect().await
    }

    pub fn disconnect(&self) {
        self.handle.disconnect()
    }

    pub async fn refresh_balance(&self, address: &str) -> Result<BigUint> {
        self.handle.refresh_balance(address).await
    }

    pub async fn refresh_current_balance(&self) -> Result<Option<BigUint>> {
        self.handle.refresh_current_balance().await
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.handle.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.handle.subscribe()
    }

    /// Tear the session down. Equivalent to dropping the controller.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.handle.inner.closed.store(true, Ordering::SeqCst);

        let released = self.listeners.len();
        for (kind, id) in self.listeners.drain(..) {
            if !self.handle.provider().unsubscribe(kind, id) {
                warn!(event = %kind, "Listener was already removed from the provider");
            }
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }

        if released > 0 {
            info!(listeners = released, "Wallet session unmounted");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}
