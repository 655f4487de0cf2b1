use log::debug;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{Address, IssuerAccount},
    traits::StoreError,
};

#[derive(FromRow)]
struct AccountRow {
    address: Address,
    secret_key: String,
    is_deleted: bool,
}

impl From<AccountRow> for IssuerAccount {
    fn from(row: AccountRow) -> Self {
        let mut account = IssuerAccount::new(row.address, row.secret_key);
        account.is_deleted = row.is_deleted;
        account
    }
}

/// Fetches the issuer account for the given address. Soft-deleted accounts are treated as absent.
pub async fn fetch_account(
    address: &Address,
    conn: &mut SqliteConnection,
) -> Result<Option<IssuerAccount>, StoreError> {
    let row: Option<AccountRow> =
        sqlx::query_as("SELECT address, secret_key, is_deleted FROM issuer_accounts WHERE address = $1 AND is_deleted = 0")
            .bind(address.as_str())
            .fetch_optional(conn)
            .await?;
    Ok(row.map(IssuerAccount::from))
}

pub async fn insert_account(account: IssuerAccount, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    let address = account.address.clone();
    let result = sqlx::query("INSERT INTO issuer_accounts (address, secret_key) VALUES ($1, $2)")
        .bind(account.address)
        .bind(account.secret_key.reveal())
        .execute(conn)
        .await;
    match result {
        Ok(_) => {
            debug!("🗃️ Issuer account registered for {address}");
            Ok(())
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StoreError::DuplicateAccount(address.to_string()))
        },
        Err(e) => Err(e.into()),
    }
}

/// Marks the account as deleted. The row is kept so that the settlement audit trail stays intact.
pub async fn deactivate_account(address: &Address, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    sqlx::query("UPDATE issuer_accounts SET is_deleted = 1 WHERE address = $1")
        .bind(address.as_str())
        .execute(conn)
        .await?;
    debug!("🗃️ Issuer account deactivated for {address}");
    Ok(())
}
