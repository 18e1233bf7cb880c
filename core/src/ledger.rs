//! The ledger boundary.
//!
//! # Design
//! The client never owns a transport. Hosts supply a `LedgerClient` that
//! knows how to reach an RPC node; the core only decides what to ask for and
//! what the answers mean. Implementations must map "no account at this
//! address" to `LedgerError::NotFound` and program refusals to
//! `LedgerError::Rejected` with the program's message.

use crate::address::{Address, Identity};
use crate::error::LedgerError;
use crate::instruction::Instruction;
use crate::types::{AccountData, KeyedAccount, Signature};

/// Selects program-owned accounts in `queryAccounts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountFilter {
    pub program_id: Address,
    /// Only accounts whose authority is this identity.
    pub authority: Option<Identity>,
}

impl AccountFilter {
    pub fn owned_by(program_id: Address, authority: Identity) -> Self {
        Self {
            program_id,
            authority: Some(authority),
        }
    }
}

/// RPC connection plus program interface, supplied by the host.
pub trait LedgerClient: Send + Sync {
    fn fetch_account(&self, address: &Address) -> Result<AccountData, LedgerError>;

    fn query_accounts(&self, filter: &AccountFilter) -> Result<Vec<KeyedAccount>, LedgerError>;

    /// Sign with the session's wallet and submit. Returns once the ledger has
    /// accepted or refused the instruction.
    fn submit_instruction(&self, instruction: &Instruction) -> Result<Signature, LedgerError>;
}

impl<L: LedgerClient + ?Sized> LedgerClient for std::sync::Arc<L> {
    fn fetch_account(&self, address: &Address) -> Result<AccountData, LedgerError> {
        (**self).fetch_account(address)
    }

    fn query_accounts(&self, filter: &AccountFilter) -> Result<Vec<KeyedAccount>, LedgerError> {
        (**self).query_accounts(filter)
    }

    fn submit_instruction(&self, instruction: &Instruction) -> Result<Signature, LedgerError> {
        (**self).submit_instruction(instruction)
    }
}
