use crate::{
    db_types::{Address, IssuerAccount},
    traits::StoreError,
};

/// Access to the registered issuer accounts. Signing keys for step and revert transactions are
/// resolved from these records.
#[allow(async_fn_in_trait)]
pub trait AccountManagement: Clone {
    /// Fetches the issuer account for the given address. Soft-deleted accounts are not returned.
    async fn fetch_account(&self, address: &Address) -> Result<Option<IssuerAccount>, StoreError>;

    /// Registers a new issuer account. Returns an error if an account already exists for the
    /// address.
    async fn register_account(&self, account: IssuerAccount) -> Result<(), StoreError>;

    /// Soft-deletes the account for the given address. The record is kept for the audit trail,
    /// but the account will no longer resolve.
    async fn deactivate_account(&self, address: &Address) -> Result<(), StoreError>;
}
