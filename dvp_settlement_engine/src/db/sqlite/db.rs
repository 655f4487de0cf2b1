use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{accounts, db_url, new_pool, settlements};
use crate::{
    db_types::{Address, IssuerAccount, NewSettlementProcess, SettlementProcess, TxRef},
    traits::{AccountManagement, SettlementStore, StoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from `DVP_DATABASE_URL`.
    pub async fn new() -> Result<Self, StoreError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str()).await
    }

    pub async fn new_with_url(url: &str) -> Result<Self, StoreError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Applies any outstanding schema migrations.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SettlementStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_settlement(&self, settlement: NewSettlementProcess) -> Result<SettlementProcess, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let row = settlements::insert_settlement(settlement, &mut conn).await?;
        debug!("🗃️ Settlement [{}] recorded with id {} ({})", row.process_type, row.id, row.party_address);
        Ok(row)
    }

    async fn fetch_settlement(&self, id: i64) -> Result<Option<SettlementProcess>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settlements::fetch_settlement(id, &mut conn).await?)
    }

    async fn fetch_executable(&self) -> Result<Vec<SettlementProcess>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settlements::fetch_executable(&mut conn).await?)
    }

    async fn fetch_awaiting_receipt(&self) -> Result<Vec<SettlementProcess>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settlements::fetch_awaiting_receipt(&mut conn).await?)
    }

    async fn fetch_awaiting_revert(&self) -> Result<Vec<SettlementProcess>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settlements::fetch_awaiting_revert(&mut conn).await?)
    }

    async fn mark_step_submitted(&self, id: i64, tx_ref: TxRef) -> Result<SettlementProcess, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let row = settlements::mark_step_submitted(id, tx_ref, &mut conn).await?;
        trace!("🗃️ Settlement {id} moved to step 1 with a pending transaction");
        Ok(row)
    }

    async fn mark_step_retry(&self, id: i64) -> Result<SettlementProcess, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let row = settlements::mark_step_retry(id, &mut conn).await?;
        trace!("🗃️ Settlement {id} scheduled for a step retry");
        Ok(row)
    }

    async fn mark_step_done(&self, id: i64) -> Result<SettlementProcess, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let row = settlements::mark_step_done(id, &mut conn).await?;
        trace!("🗃️ Settlement {id} step transaction confirmed");
        Ok(row)
    }

    async fn mark_settled(&self, id: i64) -> Result<SettlementProcess, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let row = settlements::mark_settled(id, &mut conn).await?;
        trace!("🗃️ Settlement {id} is complete");
        Ok(row)
    }

    async fn mark_step_failed(&self, id: i64, revert_tx_ref: TxRef) -> Result<SettlementProcess, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let row = settlements::mark_step_failed(id, revert_tx_ref, &mut conn).await?;
        trace!("🗃️ Settlement {id} step failed; compensation is pending");
        Ok(row)
    }

    async fn mark_revert_resubmitted(&self, id: i64, revert_tx_ref: TxRef) -> Result<SettlementProcess, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let row = settlements::mark_revert_resubmitted(id, revert_tx_ref, &mut conn).await?;
        trace!("🗃️ Settlement {id} compensation resubmitted");
        Ok(row)
    }

    async fn mark_reverted(&self, id: i64) -> Result<SettlementProcess, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let row = settlements::mark_reverted(id, &mut conn).await?;
        trace!("🗃️ Settlement {id} has been compensated");
        Ok(row)
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.pool.close().await;
        Ok(())
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_account(&self, address: &Address) -> Result<Option<IssuerAccount>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        accounts::fetch_account(address, &mut conn).await
    }

    async fn register_account(&self, account: IssuerAccount) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        accounts::insert_account(account, &mut conn).await
    }

    async fn deactivate_account(&self, address: &Address) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        accounts::deactivate_account(address, &mut conn).await
    }
}
