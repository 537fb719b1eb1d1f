//! `centrod` — the Centro server binary.
//!
//! Usage:
//!   centrod -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/centro/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod auth_middleware;
mod bootstrap;
mod config;
mod login;
mod org_guard;
mod routes;

use std::sync::Arc;

use centro_core::Module;
use clap::Parser;
use jsonwebtoken::{DecodingKey, Validation};
use tracing::info;

use auth_middleware::JwtState;
use config::ServerConfig;
use routes::AppState;

/// Centro server.
#[derive(Parser, Debug)]
#[command(name = "centrod", about = "Centro server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address (overrides default 0.0.0.0:8080).
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    // Verify configuration is valid.
    bootstrap::verify_config(&server_config)?;

    // Initialize storage (shared by all modules).
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let db: Arc<dyn centro_sql::SQLStore> = Arc::new(
        centro_sql::SqliteStore::open(&data_dir.join("centro.db"))
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    // Notify goes first: every other module emits events into its sink.
    let notify_module = notify::NotifyModule::new(
        Arc::clone(&db),
        notify::service::NotifyConfig {
            email_api_url: server_config.outbound.email_api_url.clone(),
        },
    )?;
    let events = notify_module.sink();
    info!("Notify module initialized");

    let org_module = org::OrgModule::new(Arc::clone(&db))?;
    info!("Org module initialized");

    let crm_module = crm::CrmModule::new(Arc::clone(&db), Arc::clone(&events))?;
    info!("CRM module initialized");

    let hrm_module = hrm::HrmModule::new(Arc::clone(&db))?;
    info!("HRM module initialized");

    let inventory_module = inventory::InventoryModule::with_config(
        Arc::clone(&db),
        Arc::clone(&events),
        inventory::worker::WorkerConfig {
            scan_interval: server_config.workers.stock_scan_secs,
        },
    )?;
    info!("Inventory module initialized");

    let gym_module = gym::GymModule::with_config(
        Arc::clone(&db),
        Arc::clone(&events),
        gym::worker::WorkerConfig {
            scan_interval: server_config.workers.expiry_scan_secs,
            lead_days: server_config.workers.expiry_lead_days,
        },
    )?;
    info!("Gym module initialized");

    let sales_module = sales::SalesModule::new(Arc::clone(&db), Arc::clone(&events))?;
    info!("Sales module initialized");

    // Shared handle for the tenant scoping middleware.
    let orgs = org_module.service();

    let module_routes = vec![
        (org_module.name(), org_module.routes()),
        (crm_module.name(), crm_module.routes()),
        (hrm_module.name(), hrm_module.routes()),
        (inventory_module.name(), inventory_module.routes()),
        (gym_module.name(), gym_module.routes()),
        (sales_module.name(), sales_module.routes()),
        (notify_module.name(), notify_module.routes()),
    ];

    // Build JWT state for middleware.
    let jwt_state = Arc::new(JwtState {
        decoding_key: DecodingKey::from_secret(server_config.jwt.secret.as_bytes()),
        validation: Validation::default(),
    });

    let server_config = Arc::new(server_config);

    let app_state = AppState {
        jwt_state,
        server_config,
    };

    let app = routes::build_router(app_state, module_routes, orgs);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("Centro server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
