//! Error types for the todo ledger client.
//!
//! # Design
//! `NotFound` gets a dedicated variant at both the ledger and the controller
//! level because "the account does not exist yet" is the normal state of a
//! first-time owner, not a failure. Remote refusals keep the ledger's own
//! message so it can be shown to the user verbatim.

use thiserror::Error;

use crate::address::Identity;

/// A base58 address string that does not decode to 32 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("invalid base58: {0}")]
    InvalidBase58(String),

    #[error("expected 32 bytes, got {0}")]
    WrongLength(usize),
}

/// Malformed input to address derivation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeriveError {
    /// Item indexes are encoded as a single seed byte.
    #[error("item index {0} does not fit in one byte")]
    IndexOutOfRange(u32),

    #[error("seed of {0} bytes exceeds the 32 byte limit")]
    SeedTooLong(usize),

    #[error("{0} seeds leave no room for the bump")]
    TooManySeeds(usize),

    #[error("no bump produces an off-curve address")]
    NoViableBump,
}

/// Errors reported by a `LedgerClient` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// No account exists at the requested address.
    #[error("account not found")]
    NotFound,

    /// The program refused the instruction.
    #[error("{0}")]
    Rejected(String),

    /// The request never produced an answer from the ledger.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The ledger answered with data the client could not decode.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

/// Errors reported by a `WalletAdapter`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("connection rejected: {0}")]
    Rejected(String),

    #[error("a connection attempt is already in progress")]
    InProgress,

    #[error("already connected as {0}")]
    AlreadyConnected(Identity),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors surfaced by `TodoResourceClient` operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// No wallet is connected (or one is still connecting). Callers treat
    /// this as a no-op.
    #[error("no wallet session")]
    NoSession,

    /// The owner has no profile account yet.
    #[error("owner profile not initialized")]
    NotInitialized,

    /// Another mutating operation is still in flight.
    #[error("a transaction is already pending")]
    TransactionPending,

    /// `add_item` was called with no input.
    #[error("todo content is empty")]
    EmptyContent,

    /// The ledger refused the instruction.
    #[error("{0}")]
    RemoteRejected(String),

    /// The profile or item is absent.
    #[error("account not found")]
    NotFound,

    /// The wallet refused or could not start a session.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Derive(#[from] DeriveError),

    #[error(transparent)]
    Ledger(LedgerError),
}

impl From<LedgerError> for ClientError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound => ClientError::NotFound,
            LedgerError::Rejected(message) => ClientError::RemoteRejected(message),
            other => ClientError::Ledger(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_map_onto_client_taxonomy() {
        assert_eq!(ClientError::from(LedgerError::NotFound), ClientError::NotFound);
        assert_eq!(
            ClientError::from(LedgerError::Rejected("AlreadyMarked".into())),
            ClientError::RemoteRejected("AlreadyMarked".into())
        );
        assert!(matches!(
            ClientError::from(LedgerError::Transport("reset".into())),
            ClientError::Ledger(LedgerError::Transport(_))
        ));
    }

    #[test]
    fn wallet_errors_convert_into_client_errors() {
        let err: ClientError = WalletError::InProgress.into();
        assert_eq!(err, ClientError::Wallet(WalletError::InProgress));
        assert_eq!(err.to_string(), "a connection attempt is already in progress");
    }

    #[test]
    fn rejection_message_is_shown_verbatim() {
        let err = ClientError::RemoteRejected("custom program error: 0x1770".into());
        assert_eq!(err.to_string(), "custom program error: 0x1770");
    }
}
