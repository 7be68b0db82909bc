use todo_api::{
    application::todo_service::TodoServiceImpl,
    config::Config,
    domain::repository::TodoRepository,
    http::{routes::todos, routing},
    infrastructure::sqlite_repo::SqliteTodoRepository,
    reporting,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    // Flushes pending reports on drop.
    let _reporting = reporting::init(config.sentry_dsn.as_deref())?;

    let repo = SqliteTodoRepository::connect(&config.database_url, config.max_connections).await?;
    repo.init().await?;

    let service = TodoServiceImpl::new(repo.clone());
    let router = routing::app(todos::router(todos::AppState { service }));

    let addr = config.addr();
    tracing::info!(%addr, "listening");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    repo.close().await;
    tracing::info!("database closed");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
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
    tracing::info!("shutdown");
}
