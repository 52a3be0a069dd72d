use sqlx::postgres::PgPoolOptions;

use server::{config, health, rest, state::AppState, store::postgres, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    telemetry::init_telemetry();
    config::load_config();
    health::record_start_time();

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    postgres::run_migrations(&pool).await?;

    let state = AppState::postgres(pool);
    let app = rest::api_router(state);

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, title = %config::config().app_title, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
