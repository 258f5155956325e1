use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth_api::config::Config;
use auth_api::security::TokenSigner;
use auth_api::services::{SecondFactorManager, SessionManager};
use auth_api::{db, routes, AppState};

const TEMP_TOKEN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    db::run_migrations(&pool).await?;
    info!("database connected, migrations applied");

    let signer = TokenSigner::new(
        &config.access_token_secret,
        &config.refresh_token_secret,
        config.access_token_ttl_secs,
        config.refresh_token_ttl_secs,
    );
    let second_factor = SecondFactorManager::new(pool.clone(), config.totp_issuer.clone());
    let sessions = Arc::new(SessionManager::new(
        pool.clone(),
        signer,
        second_factor,
        Duration::from_secs(config.temp_token_ttl_secs),
    ));

    let state = AppState {
        db: pool,
        sessions: sessions.clone(),
    };

    // Expired second-factor challenges are lazily dropped on access; the
    // sweep bounds memory for challenges that are never touched again.
    let sweeper = sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TEMP_TOKEN_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            sweeper.purge_expired_temp_tokens();
        }
    });

    let bind_addr = (config.host.clone(), config.port);
    info!(host = %config.host, port = config.port, "starting auth-api server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
