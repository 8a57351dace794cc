//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod app;
mod cli;
mod config;

use std::sync::Arc;

use anyhow::{Context, bail};
use auth::application::{SeedOutcome, SignUpInput, SignUpUseCase};
use auth::domain::{AuthSessionRepository, TotpEnrollmentRepository};
use auth::PgAuthRepository;
use clap::Parser;
use inventory::PgInventoryRepository;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api=info,auth=info,inventory=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(pool, config).await,
        Commands::SeedSuperadmin { username, password } => {
            seed_superadmin(pool, config, username, password).await
        }
    }
}

async fn serve(pool: PgPool, config: AppConfig) -> anyhow::Result<()> {
    let auth_repo = PgAuthRepository::new(pool.clone());

    // Startup cleanup: errors here should not prevent server startup
    match auth_repo.cleanup_expired_sessions().await {
        Ok(sessions) => {
            tracing::info!(sessions_deleted = sessions, "Auth session cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Auth session cleanup failed, continuing anyway");
        }
    }
    match auth_repo.cleanup_expired_enrollments().await {
        Ok(enrollments) => {
            tracing::info!(
                enrollments_deleted = enrollments,
                "TOTP enrollment cleanup completed"
            );
        }
        Err(e) => {
            tracing::warn!(error = %e, "TOTP enrollment cleanup failed, continuing anyway");
        }
    }

    let app = app::build_router(
        auth_repo,
        PgInventoryRepository::new(pool),
        config.auth,
        config.frontend_origins,
    );

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn seed_superadmin(
    pool: PgPool,
    config: AppConfig,
    username: String,
    password: Option<String>,
) -> anyhow::Result<()> {
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        bail!("Provide the password with --password or SUPERADMIN_PASSWORD");
    };

    let use_case = SignUpUseCase::new(
        Arc::new(PgAuthRepository::new(pool)),
        Arc::new(config.auth),
    );

    let outcome = use_case
        .seed_super_admin(SignUpInput {
            user_name: username.clone(),
            password,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed superadmin: {e}"))?;

    match outcome {
        SeedOutcome::Created(user_id) => {
            println!("Created superadmin '{username}' ({user_id})");
        }
        SeedOutcome::AlreadyExists => {
            println!("User '{username}' already exists, nothing to do");
        }
    }

    Ok(())
}
