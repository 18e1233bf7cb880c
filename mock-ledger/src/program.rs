//! In-memory emulation of the todo program's instruction handlers.
//!
//! Each handler checks the same account constraints the deployed program
//! declares: seeds, authority match, and account existence.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pda::{find_program_address, Pubkey};

pub const USER_TAG: &[u8] = b"USER_STATE";
pub const TODO_TAG: &[u8] = b"TODO_STATE";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub authority: Pubkey,
    pub last_todo: u8,
    pub todo_count: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoAccount {
    pub authority: Pubkey,
    pub idx: u8,
    pub content: String,
    pub marked: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Account {
    UserProfile(UserProfile),
    TodoAccount(TodoAccount),
}

impl Account {
    pub fn authority(&self) -> Pubkey {
        match self {
            Account::UserProfile(p) => p.authority,
            Account::TodoAccount(t) => t.authority,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Kind {
    InitializeUser,
    AddTodo { content: String },
    MarkTodo { index: u8 },
    DeleteTodo { index: u8 },
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub program_id: Pubkey,
    pub kind: Kind,
    pub accounts: BTreeMap<String, Pubkey>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ProgramError {
    UnknownProgram(Pubkey),
    MissingAccount(&'static str),
    AccountAlreadyInUse,
    AccountNotInitialized,
    ConstraintSeeds,
    ConstraintHasOne,
    AlreadyMarked,
    Overflow,
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramError::UnknownProgram(id) => write!(f, "unknown program {id}"),
            ProgramError::MissingAccount(role) => write!(f, "missing account: {role}"),
            ProgramError::AccountAlreadyInUse => write!(f, "account already in use"),
            ProgramError::AccountNotInitialized => write!(f, "AccountNotInitialized"),
            ProgramError::ConstraintSeeds => write!(f, "ConstraintSeeds"),
            ProgramError::ConstraintHasOne => write!(f, "ConstraintHasOne"),
            ProgramError::AlreadyMarked => write!(f, "AlreadyMarked"),
            ProgramError::Overflow => write!(f, "arithmetic overflow"),
        }
    }
}

/// Accounts held by the emulated ledger.
#[derive(Debug)]
pub struct Ledger {
    pub program_id: Pubkey,
    pub accounts: BTreeMap<Pubkey, Account>,
}

impl Ledger {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            accounts: BTreeMap::new(),
        }
    }

    /// Run one instruction. Nothing is written unless every check passes.
    pub fn execute(&mut self, ix: &Instruction) -> Result<(), ProgramError> {
        if ix.program_id != self.program_id {
            return Err(ProgramError::UnknownProgram(ix.program_id));
        }
        if account(ix, "systemProgram")? != Pubkey::SYSTEM_PROGRAM {
            return Err(ProgramError::MissingAccount("systemProgram"));
        }
        let authority = account(ix, "authority")?;
        let profile_at = account(ix, "userProfile")?;
        self.check_seeds(profile_at, &[USER_TAG, &authority.0])?;

        match &ix.kind {
            Kind::InitializeUser => {
                if self.accounts.contains_key(&profile_at) {
                    return Err(ProgramError::AccountAlreadyInUse);
                }
                self.accounts.insert(
                    profile_at,
                    Account::UserProfile(UserProfile {
                        authority,
                        last_todo: 0,
                        todo_count: 0,
                    }),
                );
            }
            Kind::AddTodo { content } => {
                let mut profile = self.profile(profile_at, authority)?;
                let todo_at = account(ix, "todoAccount")?;
                self.check_seeds(todo_at, &[TODO_TAG, &authority.0, &[profile.last_todo]])?;
                if self.accounts.contains_key(&todo_at) {
                    return Err(ProgramError::AccountAlreadyInUse);
                }
                let todo = TodoAccount {
                    authority,
                    idx: profile.last_todo,
                    content: content.clone(),
                    marked: false,
                };
                profile.last_todo = profile.last_todo.checked_add(1).ok_or(ProgramError::Overflow)?;
                profile.todo_count = profile.todo_count.checked_add(1).ok_or(ProgramError::Overflow)?;
                self.accounts.insert(todo_at, Account::TodoAccount(todo));
                self.accounts.insert(profile_at, Account::UserProfile(profile));
            }
            Kind::MarkTodo { index } => {
                self.profile(profile_at, authority)?;
                let todo_at = account(ix, "todoAccount")?;
                let mut todo = self.todo(todo_at, authority, *index)?;
                if todo.marked {
                    return Err(ProgramError::AlreadyMarked);
                }
                todo.marked = true;
                self.accounts.insert(todo_at, Account::TodoAccount(todo));
            }
            Kind::DeleteTodo { index } => {
                let mut profile = self.profile(profile_at, authority)?;
                let todo_at = account(ix, "todoAccount")?;
                self.todo(todo_at, authority, *index)?;
                profile.todo_count = profile.todo_count.checked_sub(1).ok_or(ProgramError::Overflow)?;
                self.accounts.remove(&todo_at);
                self.accounts.insert(profile_at, Account::UserProfile(profile));
            }
        }
        Ok(())
    }

    fn check_seeds(&self, address: Pubkey, seeds: &[&[u8]]) -> Result<(), ProgramError> {
        match find_program_address(seeds, &self.program_id) {
            Some((expected, _)) if expected == address => Ok(()),
            _ => Err(ProgramError::ConstraintSeeds),
        }
    }

    fn profile(&self, at: Pubkey, authority: Pubkey) -> Result<UserProfile, ProgramError> {
        match self.accounts.get(&at) {
            Some(Account::UserProfile(p)) if p.authority == authority => Ok(p.clone()),
            Some(Account::UserProfile(_)) => Err(ProgramError::ConstraintHasOne),
            _ => Err(ProgramError::AccountNotInitialized),
        }
    }

    fn todo(&self, at: Pubkey, authority: Pubkey, index: u8) -> Result<TodoAccount, ProgramError> {
        self.check_seeds(at, &[TODO_TAG, &authority.0, &[index]])?;
        match self.accounts.get(&at) {
            Some(Account::TodoAccount(t)) if t.authority == authority => Ok(t.clone()),
            Some(Account::TodoAccount(_)) => Err(ProgramError::ConstraintHasOne),
            _ => Err(ProgramError::AccountNotInitialized),
        }
    }
}

fn account(ix: &Instruction, role: &'static str) -> Result<Pubkey, ProgramError> {
    ix.accounts.get(role).copied().ok_or(ProgramError::MissingAccount(role))
}
