use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use server_core::common::auth::StaticTokenVerifier;
use server_core::domains::health::monitor::HealthThresholds;
use server_core::domains::intake::filter::IntakeFilter;
use server_core::kernel::deps::ServerDeps;
use server_core::kernel::jobs::{JobRunner, JobRunnerConfig, PostgresJobQueue};
use server_core::kernel::store::PostgresPipelineStore;
use server_core::server::{build_app, build_job_registry, AppState};
use server_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    let mut classifier = classifier::OpenAiClassifier::new(config.openai_api_key.clone());
    if let Some(model) = &config.openai_model {
        classifier = classifier.with_model(model.clone());
    }

    let queue = Arc::new(PostgresJobQueue::new(pool.clone()));
    let deps = Arc::new(ServerDeps::new(
        pool.clone(),
        Arc::new(PostgresPipelineStore::new(pool.clone())),
        queue.clone(),
        Arc::new(classifier),
        Arc::new(StaticTokenVerifier::new(config.moderator_token.clone())),
    ));

    let filter = Arc::new(IntakeFilter::new(
        deps.store.clone(),
        deps.queue.clone(),
        config.intake_window_hours,
        config.intake_min_content_len,
    ));

    let shutdown = CancellationToken::new();
    let runner = JobRunner::new(
        queue,
        build_job_registry(),
        deps.clone(),
        JobRunnerConfig::default(),
    );
    let runner_handle = tokio::spawn(runner.run(shutdown.clone()));

    let state = AppState {
        deps,
        filter,
        webhook_secret: config.webhook_secret.clone(),
        thresholds: HealthThresholds {
            max_queue_backlog: config.health_max_queue_backlog,
            success_rate_floor: config.health_success_rate_floor,
            staleness: chrono::Duration::hours(config.health_staleness_hours),
        },
    };
    let app = build_app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    shutdown.cancel();
    let _ = runner_handle.await;

    Ok(())
}
