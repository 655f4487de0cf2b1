//! Signing key resolution for issuer accounts.
//!
//! Settlement transactions are signed with the initiating party's key. The key material is stored
//! hex-encoded against the issuer account record; resolution fetches the account and decodes the
//! key. Both failure modes (no account, undecodable key) are non-terminal: callers log the
//! failure and skip the row, which stays eligible on the next tick.
use std::fmt::Debug;

use dvp_common::Secret;
use thiserror::Error;

use crate::{
    db_types::Address,
    traits::{AccountManagement, StoreError},
};

/// Length of a raw signing key, in bytes.
pub const SIGNING_KEY_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum KeyResolutionError {
    #[error("No issuer account is registered for {0}")]
    AccountNotFound(Address),
    #[error("The signing key for {0} could not be decoded")]
    KeyDecoding(Address),
    #[error("Account lookup failed: {0}")]
    Store(#[from] StoreError),
}

/// A decoded signing key. The raw bytes are wrapped in [`Secret`] so they never leak into logs.
#[derive(Clone, Default)]
pub struct SigningKey(Secret<Vec<u8>>);

impl Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(****)")
    }
}

impl SigningKey {
    pub fn from_hex(owner: &Address, hex_key: &str) -> Result<Self, KeyResolutionError> {
        let bytes = hex::decode(hex_key.trim()).map_err(|_| KeyResolutionError::KeyDecoding(owner.clone()))?;
        if bytes.len() != SIGNING_KEY_LEN {
            return Err(KeyResolutionError::KeyDecoding(owner.clone()));
        }
        Ok(Self(Secret::new(bytes)))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.reveal()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0.reveal())
    }
}

/// Resolves a usable signing key for a party address from the registered issuer accounts.
#[derive(Clone)]
pub struct KeyResolver<B> {
    db: B,
}

impl<B> KeyResolver<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn resolve(&self, address: &Address) -> Result<SigningKey, KeyResolutionError> {
        let account =
            self.db.fetch_account(address).await?.ok_or_else(|| KeyResolutionError::AccountNotFound(address.clone()))?;
        SigningKey::from_hex(&account.address, account.secret_key.reveal())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_a_well_formed_key() {
        let owner = Address::from("0xissuer");
        let key = SigningKey::from_hex(&owner, &"ab".repeat(SIGNING_KEY_LEN)).unwrap();
        assert_eq!(key.as_bytes().len(), SIGNING_KEY_LEN);
        assert_eq!(key.to_hex(), "ab".repeat(SIGNING_KEY_LEN));
    }

    #[test]
    fn rejects_non_hex_key_material() {
        let owner = Address::from("0xissuer");
        let err = SigningKey::from_hex(&owner, "not hex at all").unwrap_err();
        assert!(matches!(err, KeyResolutionError::KeyDecoding(_)));
    }

    #[test]
    fn rejects_a_truncated_key() {
        let owner = Address::from("0xissuer");
        let err = SigningKey::from_hex(&owner, "abcdef").unwrap_err();
        assert!(matches!(err, KeyResolutionError::KeyDecoding(_)));
    }

    #[test]
    fn key_material_is_redacted_in_debug_output() {
        let owner = Address::from("0xissuer");
        let key = SigningKey::from_hex(&owner, &"cd".repeat(SIGNING_KEY_LEN)).unwrap();
        assert_eq!(format!("{key:?}"), "SigningKey(****)");
    }
}
