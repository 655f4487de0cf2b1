use dotenvy::dotenv;
use dvp_settlement_daemon::{config::DaemonConfig, worker::run};
use log::info;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let config = DaemonConfig::from_env_or_default();

    info!("🚀️ Starting the settlement coordinator against {}", config.database_url);
    match run(config).await {
        Ok(()) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
