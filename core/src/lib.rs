//! Client core for an on-chain todo list.
//!
//! # Overview
//! Connects a wallet, derives the program's account addresses, submits the
//! four todo instructions through a host-supplied `LedgerClient`, and keeps a
//! `ClientState` that always reflects what the ledger last reported.
//!
//! # Design
//! - `AddressDeriver` is pure: same seed tag, owner, and index give the same
//!   address on every call.
//! - `TodoProgram` is stateless. It builds `Instruction` values as plain data
//!   and parses account data; the host executes the round-trip.
//! - `TodoResourceClient` is the only writer of `ClientState`. Mutations are
//!   serialized by the `transaction_pending` flag and always followed by an
//!   explicit reload.
//! - Types are defined independently from the mock-ledger crate; integration
//!   tests catch schema drift.

pub mod address;
pub mod client;
pub mod config;
pub mod error;
pub mod instruction;
pub mod ledger;
pub mod session;
pub mod state;
pub mod types;

pub use address::{Address, AddressDeriver, DerivedAddress, Identity, TODO_TAG, USER_TAG};
pub use client::TodoResourceClient;
pub use config::ClientConfig;
pub use error::{ClientError, ConfigError, DeriveError, LedgerError, WalletError};
pub use instruction::{AccountRole, Instruction, InstructionKind, TodoProgram};
pub use ledger::{AccountFilter, LedgerClient};
pub use session::{MemoryWallet, Session, SessionState, WalletAdapter};
pub use state::{ClientState, Notification, NotificationKind};
pub use types::{AccountData, KeyedAccount, OwnerProfile, Signature, TodoAccount, TodoItem};
