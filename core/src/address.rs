//! Deterministic account addresses.
//!
//! # Design
//! Accounts owned by the todo program live at program-derived addresses: the
//! SHA-256 of the seeds, a one-byte bump, the program id, and a fixed marker,
//! with the bump walked down from 255 until the digest falls off the
//! Ed25519 curve. The same `(seed tag, owner, index)` always lands on the same
//! account, which is what lets the program find it again on later calls.
//!
//! Everything here is pure. No ledger access, no caching.

use std::fmt;
use std::str::FromStr;

use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{AddressParseError, DeriveError};

/// Seed tag for the per-owner profile account.
pub const USER_TAG: &[u8] = b"USER_STATE";

/// Seed tag for individual todo accounts.
pub const TODO_TAG: &[u8] = b"TODO_STATE";

/// Program id of the deployed todo program.
pub const DEFAULT_PROGRAM_ID: &str = "C9vSD5Fhc6Jm1BXeHZzYScpLqGrXneDVQ79GtP8sFW6p";

pub const MAX_SEED_LEN: usize = 32;
pub const MAX_SEEDS: usize = 16;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// A 32-byte ledger address, shown as base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// The system program, which every account-creating instruction names.
    pub const SYSTEM_PROGRAM: Address = Address([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether the bytes decompress to an Ed25519 point. Derived addresses
    /// never do, so no private key can exist for them.
    pub fn is_on_curve(&self) -> bool {
        CompressedEdwardsY(self.0).decompress().is_some()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressParseError::InvalidBase58(e.to_string()))?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| AddressParseError::WrongLength(raw.len()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The public key of a connected wallet. Fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Address);

impl Identity {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(Address::new(bytes))
    }

    pub fn address(&self) -> Address {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl From<Address> for Identity {
    fn from(address: Address) -> Self {
        Self(address)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Identity {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// An address together with the bump that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedAddress {
    pub address: Address,
    pub bump: u8,
}

/// Find the program-derived address for `seeds` under `program_id`.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Address,
) -> Result<DerivedAddress, DeriveError> {
    // One slot of the seed budget belongs to the bump.
    if seeds.len() >= MAX_SEEDS {
        return Err(DeriveError::TooManySeeds(seeds.len()));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(DeriveError::SeedTooLong(seed.len()));
    }

    for bump in (0..=u8::MAX).rev() {
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed);
        }
        hasher.update([bump]);
        hasher.update(program_id.as_bytes());
        hasher.update(PDA_MARKER);
        let digest = hasher.finalize();

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        let address = Address::new(bytes);
        if !address.is_on_curve() {
            return Ok(DerivedAddress { address, bump });
        }
    }
    Err(DeriveError::NoViableBump)
}

/// Derives the two kinds of accounts the todo program owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressDeriver {
    program_id: Address,
}

impl AddressDeriver {
    pub fn new(program_id: Address) -> Self {
        Self { program_id }
    }

    pub fn program_id(&self) -> Address {
        self.program_id
    }

    /// General form: `seed_tag`, the owner, and an optional one-byte index.
    ///
    /// Indexes above 255 are rejected; the program encodes the index as a
    /// single seed byte, so an owner can hold at most 256 item slots.
    pub fn derive(
        &self,
        seed_tag: &[u8],
        owner: &Identity,
        index: Option<u32>,
    ) -> Result<DerivedAddress, DeriveError> {
        let derived = match index {
            None => find_program_address(&[seed_tag, owner.as_bytes()], &self.program_id)?,
            Some(index) => {
                let byte = u8::try_from(index).map_err(|_| DeriveError::IndexOutOfRange(index))?;
                find_program_address(&[seed_tag, owner.as_bytes(), &[byte]], &self.program_id)?
            }
        };
        debug!(owner = %owner, ?index, address = %derived.address, bump = derived.bump, "derived address");
        Ok(derived)
    }

    pub fn profile_address(&self, owner: &Identity) -> Result<DerivedAddress, DeriveError> {
        self.derive(USER_TAG, owner, None)
    }

    pub fn item_address(&self, owner: &Identity, index: u32) -> Result<DerivedAddress, DeriveError> {
        self.derive(TODO_TAG, owner, Some(index))
    }
}

impl Default for AddressDeriver {
    fn default() -> Self {
        Self::new(default_program_id())
    }
}

pub fn default_program_id() -> Address {
    // Infallible for the compile-time constant; the tests pin it.
    DEFAULT_PROGRAM_ID.parse().unwrap_or(Address::SYSTEM_PROGRAM)
}
