use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

use gympulse::api::routes::create_routes;
use gympulse::config::{run_migrations, AppConfig, DatabaseConfig, DatabaseSeeder};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;
    let db_config = DatabaseConfig::from_env()?;

    let pool = db_config.create_pool().await?;
    run_migrations(&pool).await?;

    if config.seed_demo_data && !config.is_production() {
        DatabaseSeeder::new(pool.clone()).seed_all().await?;
    }

    let app = create_routes(pool, &config.jwt_secret);

    let listener = TcpListener::bind(config.server_address()).await?;
    info!("gympulse listening on http://{}", config.server_address());

    axum::serve(listener, app).await?;

    Ok(())
}
