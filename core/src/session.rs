//! Wallet session tracking.
//!
//! `Session` follows `Disconnected -> Connecting -> Connected -> Disconnected`.
//! Only a `Connected` session yields an identity; while a connection attempt
//! is in progress every client operation sees "no session".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::address::Identity;
use crate::error::WalletError;

/// Common interface for the wallets a user can connect.
pub trait WalletAdapter: Send + Sync {
    /// Ask the wallet for approval and return its public identity.
    fn connect(&self) -> Result<Identity, WalletError>;

    fn disconnect(&self);

    /// Reconnect a previously approved wallet without prompting, if any.
    fn auto_connect(&self) -> Option<Identity>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected(Identity),
}

pub struct Session<W> {
    wallet: W,
    state: Mutex<SessionState>,
}

impl<W: WalletAdapter> Session<W> {
    pub fn new(wallet: W) -> Self {
        Self {
            wallet,
            state: Mutex::new(SessionState::Disconnected),
        }
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    pub fn identity(&self) -> Option<Identity> {
        match self.state() {
            SessionState::Connected(identity) => Some(identity),
            _ => None,
        }
    }

    /// Explicit connect. Fails with `AlreadyConnected` if a wallet is already
    /// attached, leaving that session untouched.
    pub fn connect(&self) -> Result<Identity, WalletError> {
        self.begin()?;
        let result = self.wallet.connect();
        self.finish(result.clone().ok());
        if let Err(err) = &result {
            warn!(error = %err, "wallet connection failed");
        }
        result
    }

    /// Wallet-reported reconnect of a remembered wallet.
    pub fn auto_connect(&self) -> Option<Identity> {
        if self.begin().is_err() {
            return self.identity();
        }
        let identity = self.wallet.auto_connect();
        self.finish(identity);
        identity
    }

    pub fn disconnect(&self) {
        let previous = std::mem::replace(&mut *lock(&self.state), SessionState::Disconnected);
        if let SessionState::Connected(identity) = previous {
            self.wallet.disconnect();
            info!(%identity, "wallet disconnected");
        }
    }

    fn begin(&self) -> Result<(), WalletError> {
        let mut state = lock(&self.state);
        match *state {
            SessionState::Disconnected => {
                *state = SessionState::Connecting;
                Ok(())
            }
            SessionState::Connecting => Err(WalletError::InProgress),
            SessionState::Connected(identity) => Err(WalletError::AlreadyConnected(identity)),
        }
    }

    fn finish(&self, identity: Option<Identity>) {
        let mut state = lock(&self.state);
        *state = match identity {
            Some(identity) => {
                info!(%identity, "wallet connected");
                SessionState::Connected(identity)
            }
            None => SessionState::Disconnected,
        };
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory wallet with a fixed identity.
///
/// `remembered` controls whether `auto_connect` succeeds; `fail_with` makes
/// the next connection attempts fail with the given message.
pub struct MemoryWallet {
    identity: Identity,
    remembered: AtomicBool,
    connected: AtomicBool,
    failure: Mutex<Option<String>>,
}

impl MemoryWallet {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            remembered: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    pub fn remembered(self) -> Self {
        self.remembered.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_with(&self, reason: Option<&str>) {
        *lock(&self.failure) = reason.map(str::to_string);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl WalletAdapter for MemoryWallet {
    fn connect(&self) -> Result<Identity, WalletError> {
        if let Some(reason) = lock(&self.failure).clone() {
            return Err(WalletError::Rejected(reason));
        }
        self.connected.store(true, Ordering::SeqCst);
        self.remembered.store(true, Ordering::SeqCst);
        Ok(self.identity)
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.remembered.store(false, Ordering::SeqCst);
    }

    fn auto_connect(&self) -> Option<Identity> {
        if !self.remembered.load(Ordering::SeqCst) || lock(&self.failure).is_some() {
            return None;
        }
        self.connected.store(true, Ordering::SeqCst);
        Some(self.identity)
    }
}
