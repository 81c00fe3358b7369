mod config;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use api::{graphql::build_schema, seed, AppState};
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use clap::{Parser, Subcommand, ValueEnum};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "server", version, about = "ElevaLucro BPO back office")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run HTTP server
    Serve {
        #[arg(long, env = "BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
    /// Apply or roll back migrations
    Migrate {
        #[arg(long, value_enum, default_value_t = MigrateAction::Up)]
        action: MigrateAction,
    },
    /// Create the default organization and fill it with demo data
    Seed,
    /// Print GraphQL SDL
    PrintSchema,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MigrateAction {
    Up,
    Down,
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Cmd::PrintSchema = cli.cmd {
        let schema = build_schema(Arc::new(DatabaseConnection::Disconnected));
        println!("{}", schema.sdl());
        return Ok(());
    }

    let config = AppConfig::load()?;
    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to DATABASE_URL")?;

    match cli.cmd {
        Cmd::Migrate { action } => {
            match action {
                MigrateAction::Up => Migrator::up(&db, None).await?,
                MigrateAction::Down => Migrator::down(&db, None).await?,
                MigrateAction::Reset => Migrator::reset(&db).await?,
            }
            info!(?action, "migrations finished");
        }
        Cmd::Seed => {
            Migrator::up(&db, None).await?;
            let org =
                seed::ensure_default_org(&db, &config.default_org_slug, &config.default_org_name)
                    .await?;
            let seeded = seed::seed_demo(&db, &org)
                .await
                .context("seed data failed")?;
            for user in &seeded.users {
                info!(email = %user.email, "demo user ready");
            }
            info!(
                prospects = seeded.prospects.len(),
                registers = seeded.registers.len(),
                movements = seeded.movements.len(),
                password = seed::DEMO_PASSWORD,
                "demo data seeded"
            );
        }
        Cmd::Serve { bind } => {
            Migrator::up(&db, None).await?;
            seed::ensure_default_org(&db, &config.default_org_slug, &config.default_org_name)
                .await?;
            let state = AppState::new(Arc::new(db), Arc::new(config.auth.clone()));
            let app = app_router(state, &config.cors_allowed_origins);

            let listener = TcpListener::bind(bind)
                .await
                .with_context(|| format!("failed to bind {bind}"))?;
            info!(%bind, "listening");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("HTTP server error")?;
        }
        Cmd::PrintSchema => {}
    }
    Ok(())
}

fn app_router(state: AppState, origins: &[String]) -> Router {
    api::router(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(origins))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let layer = CorsLayer::new()
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ]);
    // Credentials cannot be combined with a wildcard origin.
    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer
            .allow_credentials(true)
            .allow_origin(AllowOrigin::list(allowed))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutting down");
}
