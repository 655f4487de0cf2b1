pub mod fake_ledger;

use dvp_common::TokenAmount;
use dvp_settlement_engine::{
    db_types::{Address, IssuerAccount, NewSettlementProcess, ProcessType},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AccountManagement,
    SqliteDatabase,
};

pub const ISSUER: &str = "0x89adf6a7dcf1c0b9f79a23c37cbafad43a27c8e1";
pub const BUYER: &str = "0x5f2c3e1a9b8d7c6e5f4a3b2c1d0e9f8a7b6c5d4e";
pub const AGENT: &str = "0x1111aa22bb33cc44dd55ee66ff7788990011aabb";
pub const TOKEN: &str = "0xt0k3n00aa11bb22cc33dd44ee55ff6677889900";
pub const DVP_CONTRACT: &str = "0xd0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0";

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url).await.expect("Error creating connection to database")
}

pub async fn seed_issuer(db: &SqliteDatabase) {
    let account = IssuerAccount::new(Address::from(ISSUER), "ab".repeat(32));
    db.register_account(account).await.expect("Error registering issuer account");
}

pub fn new_settlement(process_type: ProcessType) -> NewSettlementProcess {
    NewSettlementProcess::new(
        process_type,
        Address::from(ISSUER),
        Address::from(BUYER),
        Address::from(AGENT),
        Address::from(TOKEN),
        Address::from(DVP_CONTRACT),
        TokenAmount::from(1_000),
    )
}
