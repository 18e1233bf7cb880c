//! Account data owned by the todo program, and the client-side item view.
//!
//! # Design
//! The JSON shape mirrors the mock ledger's schema but is defined
//! independently; the integration tests catch drift between the two.

use serde::{Deserialize, Serialize};

use crate::address::{Address, Identity};

/// Per-owner profile. `last_todo` is the index the next item will take;
/// `todo_count` is the number of live items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    pub authority: Identity,
    pub last_todo: u8,
    pub todo_count: u8,
}

/// One todo as stored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoAccount {
    pub authority: Identity,
    pub idx: u8,
    pub content: String,
    pub marked: bool,
}

/// Decoded contents of a program-owned account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AccountData {
    UserProfile(OwnerProfile),
    TodoAccount(TodoAccount),
}

impl AccountData {
    pub fn authority(&self) -> Identity {
        match self {
            AccountData::UserProfile(p) => p.authority,
            AccountData::TodoAccount(t) => t.authority,
        }
    }
}

/// An account as returned by a program-wide query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyedAccount {
    pub address: Address,
    pub account: AccountData,
}

/// A todo item as the UI sees it: the ledger record plus where it lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub address: Address,
    pub index: u8,
    pub content: String,
    pub marked: bool,
    pub owner: Identity,
}

/// Transaction signature returned by the ledger for a submitted instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(pub String);

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_json_is_tagged_camel_case() {
        let data = AccountData::UserProfile(OwnerProfile {
            authority: Identity::new([0; 32]),
            last_todo: 3,
            todo_count: 2,
        });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "userProfile");
        assert_eq!(json["authority"], "11111111111111111111111111111111");
        assert_eq!(json["lastTodo"], 3);
        assert_eq!(json["todoCount"], 2);
    }

    #[test]
    fn todo_account_parses_from_ledger_json() {
        let raw = r#"{"type":"todoAccount","authority":"11111111111111111111111111111111","idx":0,"content":"buy milk","marked":false}"#;
        let data: AccountData = serde_json::from_str(raw).unwrap();
        match data {
            AccountData::TodoAccount(todo) => {
                assert_eq!(todo.content, "buy milk");
                assert_eq!(todo.idx, 0);
                assert!(!todo.marked);
            }
            other => panic!("unexpected account: {other:?}"),
        }
    }

    #[test]
    fn unknown_account_type_is_rejected() {
        let raw = r#"{"type":"vault","authority":"11111111111111111111111111111111"}"#;
        assert!(serde_json::from_str::<AccountData>(raw).is_err());
    }
}
