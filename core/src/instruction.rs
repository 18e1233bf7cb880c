//! Stateless instruction builder and account parser for the todo program.
//!
//! # Design
//! `TodoProgram` holds only the program id (through its `AddressDeriver`) and
//! carries no mutable state between calls. Each remote operation is split into
//! a `build_*` method that produces an `Instruction` as plain data and a
//! `parse_*` method that interprets the account data the ledger hands back.
//! The host's `LedgerClient` does the actual round-trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::address::{Address, AddressDeriver, Identity};
use crate::error::{ClientError, LedgerError};
use crate::types::{AccountData, KeyedAccount, OwnerProfile, TodoItem};

/// Instruction kinds the program exposes, with their arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum InstructionKind {
    InitializeUser,
    AddTodo { content: String },
    MarkTodo { index: u8 },
    DeleteTodo { index: u8 },
}

impl InstructionKind {
    pub fn name(&self) -> &'static str {
        match self {
            InstructionKind::InitializeUser => "initializeUser",
            InstructionKind::AddTodo { .. } => "addTodo",
            InstructionKind::MarkTodo { .. } => "markTodo",
            InstructionKind::DeleteTodo { .. } => "deleteTodo",
        }
    }
}

/// The part an account plays in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountRole {
    UserProfile,
    TodoAccount,
    /// The signing wallet; also pays for created accounts.
    Authority,
    SystemProgram,
}

/// A single instruction described as plain data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub program_id: Address,
    pub kind: InstructionKind,
    pub accounts: BTreeMap<AccountRole, Address>,
}

impl Instruction {
    pub fn account(&self, role: AccountRole) -> Option<Address> {
        self.accounts.get(&role).copied()
    }

    /// JSON body for hosts that forward instructions over HTTP.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TodoProgram {
    deriver: AddressDeriver,
}

impl TodoProgram {
    pub fn new(program_id: Address) -> Self {
        Self {
            deriver: AddressDeriver::new(program_id),
        }
    }

    pub fn program_id(&self) -> Address {
        self.deriver.program_id()
    }

    pub fn deriver(&self) -> &AddressDeriver {
        &self.deriver
    }

    pub fn build_initialize_user(&self, authority: &Identity) -> Result<Instruction, ClientError> {
        let profile = self.deriver.profile_address(authority)?;
        Ok(self.instruction(InstructionKind::InitializeUser, authority, profile.address, None))
    }

    /// The new item lands at the slot named by the profile's `last_todo`.
    pub fn build_add_todo(
        &self,
        authority: &Identity,
        last_todo: u8,
        content: &str,
    ) -> Result<Instruction, ClientError> {
        if content.is_empty() {
            return Err(ClientError::EmptyContent);
        }
        let profile = self.deriver.profile_address(authority)?;
        let item = self.deriver.item_address(authority, u32::from(last_todo))?;
        Ok(self.instruction(
            InstructionKind::AddTodo {
                content: content.to_string(),
            },
            authority,
            profile.address,
            Some(item.address),
        ))
    }

    pub fn build_mark_todo(
        &self,
        authority: &Identity,
        item: Address,
        index: u8,
    ) -> Result<Instruction, ClientError> {
        let profile = self.deriver.profile_address(authority)?;
        Ok(self.instruction(InstructionKind::MarkTodo { index }, authority, profile.address, Some(item)))
    }

    pub fn build_delete_todo(
        &self,
        authority: &Identity,
        item: Address,
        index: u8,
    ) -> Result<Instruction, ClientError> {
        let profile = self.deriver.profile_address(authority)?;
        Ok(self.instruction(InstructionKind::DeleteTodo { index }, authority, profile.address, Some(item)))
    }

    /// Interpret the account at the owner's profile address.
    pub fn parse_profile(&self, owner: &Identity, data: AccountData) -> Result<OwnerProfile, ClientError> {
        match data {
            AccountData::UserProfile(profile) if profile.authority == *owner => Ok(profile),
            AccountData::UserProfile(_) => Err(ClientError::Ledger(LedgerError::Deserialization(
                "profile authority does not match the connected wallet".to_string(),
            ))),
            AccountData::TodoAccount(_) => Err(ClientError::Ledger(LedgerError::Deserialization(
                "expected a user profile account".to_string(),
            ))),
        }
    }

    /// Keep only todo accounts owned by `owner`, ordered by index.
    pub fn parse_items(&self, owner: &Identity, accounts: Vec<KeyedAccount>) -> Vec<TodoItem> {
        let mut items: Vec<TodoItem> = accounts
            .into_iter()
            .filter_map(|keyed| match keyed.account {
                AccountData::TodoAccount(todo) if todo.authority == *owner => Some(TodoItem {
                    address: keyed.address,
                    index: todo.idx,
                    content: todo.content,
                    marked: todo.marked,
                    owner: todo.authority,
                }),
                _ => None,
            })
            .collect();
        items.sort_by_key(|item| item.index);
        items
    }

    pub fn decode_account(&self, body: &str) -> Result<AccountData, LedgerError> {
        serde_json::from_str(body).map_err(|e| LedgerError::Deserialization(e.to_string()))
    }

    fn instruction(
        &self,
        kind: InstructionKind,
        authority: &Identity,
        profile: Address,
        item: Option<Address>,
    ) -> Instruction {
        let mut accounts = BTreeMap::new();
        accounts.insert(AccountRole::UserProfile, profile);
        if let Some(item) = item {
            accounts.insert(AccountRole::TodoAccount, item);
        }
        accounts.insert(AccountRole::Authority, authority.address());
        accounts.insert(AccountRole::SystemProgram, Address::SYSTEM_PROGRAM);
        Instruction {
            program_id: self.program_id(),
            kind,
            accounts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TodoAccount;

    fn program() -> TodoProgram {
        TodoProgram::default()
    }

    fn alice() -> Identity {
        Identity::new([1; 32])
    }

    fn bob() -> Identity {
        Identity::new([2; 32])
    }

    fn todo(owner: Identity, idx: u8, marked: bool) -> KeyedAccount {
        KeyedAccount {
            address: Address::new([100 + idx; 32]),
            account: AccountData::TodoAccount(TodoAccount {
                authority: owner,
                idx,
                content: format!("todo {idx}"),
                marked,
            }),
        }
    }

    #[test]
    fn build_initialize_user_names_profile_authority_and_system() {
        let ix = program().build_initialize_user(&alice()).unwrap();
        assert_eq!(ix.kind, InstructionKind::InitializeUser);
        assert_eq!(ix.program_id, program().program_id());
        assert_eq!(
            ix.account(AccountRole::UserProfile),
            Some(program().deriver().profile_address(&alice()).unwrap().address)
        );
        assert_eq!(ix.account(AccountRole::Authority), Some(alice().address()));
        assert_eq!(ix.account(AccountRole::SystemProgram), Some(Address::SYSTEM_PROGRAM));
        assert_eq!(ix.account(AccountRole::TodoAccount), None);
    }

    #[test]
    fn build_add_todo_targets_the_last_todo_slot() {
        let ix = program().build_add_todo(&alice(), 4, "buy milk").unwrap();
        let expected = program().deriver().item_address(&alice(), 4).unwrap();
        assert_eq!(ix.account(AccountRole::TodoAccount), Some(expected.address));
        assert_eq!(
            ix.kind,
            InstructionKind::AddTodo {
                content: "buy milk".to_string()
            }
        );
    }

    #[test]
    fn build_add_todo_rejects_empty_content() {
        let err = program().build_add_todo(&alice(), 0, "").unwrap_err();
        assert_eq!(err, ClientError::EmptyContent);
    }

    #[test]
    fn build_mark_and_delete_use_the_given_item() {
        let item = Address::new([77; 32]);
        let mark = program().build_mark_todo(&alice(), item, 3).unwrap();
        let delete = program().build_delete_todo(&alice(), item, 3).unwrap();
        assert_eq!(mark.kind, InstructionKind::MarkTodo { index: 3 });
        assert_eq!(delete.kind, InstructionKind::DeleteTodo { index: 3 });
        assert_eq!(mark.account(AccountRole::TodoAccount), Some(item));
        assert_eq!(delete.account(AccountRole::TodoAccount), Some(item));
    }

    #[test]
    fn instruction_json_shape() {
        let ix = program().build_mark_todo(&alice(), Address::new([77; 32]), 3).unwrap();
        let json: serde_json::Value = serde_json::from_str(&ix.to_json().unwrap()).unwrap();
        assert_eq!(json["kind"]["name"], "markTodo");
        assert_eq!(json["kind"]["index"], 3);
        assert_eq!(json["accounts"]["systemProgram"], "11111111111111111111111111111111");
        assert_eq!(json["programId"], crate::address::DEFAULT_PROGRAM_ID);
    }

    #[test]
    fn parse_profile_checks_authority() {
        let data = AccountData::UserProfile(OwnerProfile {
            authority: bob(),
            last_todo: 0,
            todo_count: 0,
        });
        assert_eq!(
            program().parse_profile(&alice(), data.clone()).unwrap_err(),
            ClientError::Ledger(LedgerError::Deserialization(
                "profile authority does not match the connected wallet".into()
            ))
        );
        assert_eq!(program().parse_profile(&bob(), data).unwrap().authority, bob());
    }

    #[test]
    fn parse_items_filters_foreign_accounts_and_sorts() {
        let accounts = vec![
            todo(alice(), 2, true),
            todo(bob(), 0, false),
            todo(alice(), 0, false),
            KeyedAccount {
                address: Address::new([9; 32]),
                account: AccountData::UserProfile(OwnerProfile {
                    authority: alice(),
                    last_todo: 3,
                    todo_count: 2,
                }),
            },
        ];
        let items = program().parse_items(&alice(), accounts);
        assert_eq!(items.iter().map(|i| i.index).collect::<Vec<_>>(), vec![0, 2]);
        assert!(items.iter().all(|i| i.owner == alice()));
    }

    #[test]
    fn decode_account_bad_json() {
        let err = program().decode_account("not json").unwrap_err();
        assert!(matches!(err, LedgerError::Deserialization(_)));
    }
}
