use std::process::ExitCode;

use tracing::{error, info};

use sixchan::auth::ensure_admin;
use sixchan::web::WebServer;
use sixchan::{Config, Database};

const CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    // Load configuration
    let config = match Config::load_with_env(CONFIG_PATH) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {CONFIG_PATH}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = sixchan::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        sixchan::logging::init_console_only(&config.logging.level);
    }

    info!("sixchan - imageboard backend");

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to open database {}: {e}", config.database.path);
            return ExitCode::FAILURE;
        }
    };

    match ensure_admin(db.pool(), &config.admin).await {
        Ok(Some(admin)) => info!(username = %admin.username, "Administrator account ready"),
        Ok(None) => {}
        Err(e) => {
            error!("Failed to create administrator account: {e}");
            return ExitCode::FAILURE;
        }
    }

    let server = match WebServer::new(&config, db) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to set up web server: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("Server configured on {}", server.addr());

    if let Err(e) = server.run().await {
        error!("Web server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
