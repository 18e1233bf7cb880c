//! The todo controller.
//!
//! # Design
//! `TodoResourceClient` owns the `ClientState`, the wallet `Session`, and the
//! host's `LedgerClient`. State sits behind a mutex that is never held across
//! a ledger call, so the client can be shared between UI callbacks.
//!
//! Mutating operations take the `transaction_pending` flag through a guard
//! that releases it on every exit path. Once released, the operation runs
//! `load_owner_state` itself as a continuation, success or not, so the local
//! view is always rebuilt from the ledger rather than patched in place.

use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::address::{Address, Identity};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::instruction::{Instruction, TodoProgram};
use crate::ledger::{AccountFilter, LedgerClient};
use crate::session::{lock, Session, WalletAdapter};
use crate::state::{ClientState, Notification};
use crate::types::{OwnerProfile, Signature, TodoItem};

/// Drives one owner's todo list against a ledger.
///
/// Every method takes `&self`; wrap the client in an `Arc` to share it.
/// Results are read back through `snapshot` and `take_notifications`.
pub struct TodoResourceClient<L, W> {
    program: TodoProgram,
    ledger: L,
    session: Session<W>,
    state: Mutex<ClientState>,
    auto_connect: bool,
}

impl<L: LedgerClient, W: WalletAdapter> TodoResourceClient<L, W> {
    pub fn new(config: &ClientConfig, ledger: L, wallet: W) -> Self {
        Self {
            program: TodoProgram::new(config.program_id),
            ledger,
            session: Session::new(wallet),
            state: Mutex::new(ClientState::default()),
            auto_connect: config.auto_connect,
        }
    }

    pub fn program(&self) -> &TodoProgram {
        &self.program
    }

    pub fn session(&self) -> &Session<W> {
        &self.session
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// A copy of the current state for rendering.
    pub fn snapshot(&self) -> ClientState {
        lock(&self.state).clone()
    }

    pub fn take_notifications(&self) -> Vec<Notification> {
        lock(&self.state).take_notifications()
    }

    pub fn set_input(&self, input: &str) {
        lock(&self.state).pending_input = input.to_string();
    }

    /// Reconnect a remembered wallet if configured to, then load its state.
    ///
    /// Returns `Ok(None)` when nothing reconnected. A failed load is returned
    /// as an error even though the session stays connected.
    pub fn start(&self) -> Result<Option<Identity>, ClientError> {
        if !self.auto_connect {
            return Ok(None);
        }
        let Some(identity) = self.session.auto_connect() else {
            return Ok(None);
        };
        self.on_identity_changed()?;
        Ok(Some(identity))
    }

    /// Connect the wallet and load the owner's state.
    ///
    /// A failed load is returned as an error even though the session stays
    /// connected, so a transport failure is not mistaken for a new owner.
    pub fn connect(&self) -> Result<Identity, ClientError> {
        let identity = self.session.connect()?;
        self.on_identity_changed()?;
        Ok(identity)
    }

    pub fn disconnect(&self) {
        self.session.disconnect();
        lock(&self.state).reset_owner();
    }

    fn on_identity_changed(&self) -> Result<(), ClientError> {
        lock(&self.state).reset_owner();
        self.load_owner_state()
    }

    fn owner(&self) -> Result<Identity, ClientError> {
        self.session.identity().ok_or(ClientError::NoSession)
    }

    /// Fetch the owner's profile and items and replace the local view.
    ///
    /// A missing profile is the normal state of a new owner: the view resets
    /// to uninitialized and the call succeeds. Any other failure resets the
    /// view the same way but is returned to the caller. Skipped while a
    /// transaction is pending. A result overtaken by a newer load or by a
    /// transaction is dropped.
    pub fn load_owner_state(&self) -> Result<(), ClientError> {
        let owner = self.owner()?;
        let generation = {
            let mut state = lock(&self.state);
            if state.transaction_pending {
                debug!(%owner, "transaction pending, skipping load");
                return Ok(());
            }
            state.begin_load()
        };

        let fetched = self.fetch_owner(&owner);

        let mut state = lock(&self.state);
        if !state.is_current_load(generation) {
            debug!(%owner, "superseded load, discarding result");
            return Ok(());
        }
        state.loading = false;
        if self.session.identity() != Some(owner) {
            debug!(%owner, "session changed during load, discarding result");
            return Ok(());
        }
        match fetched {
            Ok((profile, items)) => {
                debug!(%owner, last_todo = profile.last_todo, items = items.len(), "owner state loaded");
                state.initialized = true;
                state.last_item_index = profile.last_todo;
                state.items = items;
                Ok(())
            }
            Err(ClientError::NotFound) => {
                debug!(%owner, "no profile yet");
                state.reset_owner();
                Ok(())
            }
            Err(err) => {
                warn!(%owner, error = %err, "failed to load owner state");
                state.reset_owner();
                Err(err)
            }
        }
    }

    fn fetch_owner(&self, owner: &Identity) -> Result<(OwnerProfile, Vec<TodoItem>), ClientError> {
        let profile_address = self.program.deriver().profile_address(owner)?.address;
        let data = self.ledger.fetch_account(&profile_address)?;
        let profile = self.program.parse_profile(owner, data)?;
        let accounts = self
            .ledger
            .query_accounts(&AccountFilter::owned_by(self.program.program_id(), *owner))?;
        Ok((profile, self.program.parse_items(owner, accounts)))
    }

    /// Create the owner's profile account.
    pub fn initialize_owner(&self) -> Result<Signature, ClientError> {
        let result = self.mutate("Successfully initialized.", false, |program, owner, _| {
            program.build_initialize_user(owner)
        });
        if result.is_ok() {
            lock(&self.state).initialized = true;
        }
        self.refresh();
        result
    }

    /// Add the current input as a new item. See `add_item`.
    pub fn submit_input(&self) -> Result<Signature, ClientError> {
        let content = lock(&self.state).pending_input.clone();
        self.add_item(&content)
    }

    /// Add an item at the slot named by the profile's last index.
    ///
    /// Nothing is appended locally; the follow-up load picks up the new item
    /// and the advanced index from the ledger. The pending input is cleared
    /// whatever the outcome.
    pub fn add_item(&self, content: &str) -> Result<Signature, ClientError> {
        self.owner()?;
        if content.is_empty() {
            lock(&self.state).pending_input.clear();
            return Err(ClientError::EmptyContent);
        }
        let result = self.mutate("Successfully added todo", true, |program, owner, state| {
            program.build_add_todo(owner, state.last_item_index, content)
        });
        lock(&self.state).pending_input.clear();
        self.refresh();
        result
    }

    pub fn mark_item(&self, address: Address, index: u8) -> Result<Signature, ClientError> {
        let result = self.mutate("Successfully marked todo", true, |program, owner, _| {
            program.build_mark_todo(owner, address, index)
        });
        self.refresh();
        result
    }

    pub fn remove_item(&self, address: Address, index: u8) -> Result<Signature, ClientError> {
        let result = self.mutate("Successfully deleted todo", true, |program, owner, _| {
            program.build_delete_todo(owner, address, index)
        });
        self.refresh();
        result
    }

    /// Build and submit one instruction under the pending-transaction guard.
    fn mutate<F>(&self, success: &str, needs_profile: bool, build: F) -> Result<Signature, ClientError>
    where
        F: FnOnce(&TodoProgram, &Identity, &ClientState) -> Result<Instruction, ClientError>,
    {
        let owner = self.owner()?;
        let _pending = PendingGuard::acquire(&self.state)?;

        let instruction = {
            let state = lock(&self.state);
            if needs_profile && !state.initialized {
                return Err(ClientError::NotInitialized);
            }
            build(&self.program, &owner, &*state)?
        };

        debug!(%owner, instruction = instruction.kind.name(), "submitting instruction");
        match self.ledger.submit_instruction(&instruction) {
            Ok(signature) => {
                info!(%owner, instruction = instruction.kind.name(), %signature, "instruction confirmed");
                lock(&self.state).notify(Notification::success(success));
                Ok(signature)
            }
            Err(err) => {
                let err = ClientError::from(err);
                warn!(%owner, instruction = instruction.kind.name(), error = %err, "instruction failed");
                lock(&self.state).notify(Notification::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Re-query after a mutation attempt. Runs once the guard is released.
    fn refresh(&self) {
        if self.session.identity().is_none() {
            return;
        }
        if let Err(err) = self.load_owner_state() {
            debug!(error = %err, "refresh after transaction failed");
        }
    }
}

/// Holds `transaction_pending` for the duration of one mutating call.
struct PendingGuard<'a> {
    state: &'a Mutex<ClientState>,
}

impl<'a> PendingGuard<'a> {
    fn acquire(state: &'a Mutex<ClientState>) -> Result<Self, ClientError> {
        let mut guarded = lock(state);
        if guarded.transaction_pending {
            return Err(ClientError::TransactionPending);
        }
        guarded.transaction_pending = true;
        guarded.invalidate_loads();
        Ok(Self { state })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).transaction_pending = false;
    }
}
