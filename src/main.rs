mod config;
mod domain;
mod infrastructure;
mod presentation;
#[cfg(test)]
mod test_support;
mod usecase;

use sea_orm::{ConnectOptions, Database};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    infrastructure::{
        argon2_password_hasher::Argon2PasswordHasher,
        user_repository::{PostgresUserRepository, ensure_schema},
    },
    presentation::{handlers::identity_handler::create_identity_router, server::build_app},
    usecase::{
        admission::HashAdmission, sign_in_usecase::SignInUsecase, sign_up_usecase::SignUpUsecase,
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(config.db_max_connections)
        .min_connections(1)
        .sqlx_logging(false);

    let db = Database::connect(opt).await.map_err(|e| {
        tracing::error!("failed to connect to database: {e}");
        e
    })?;
    ensure_schema(&db).await?;

    let user_repository = PostgresUserRepository::new(db);
    let password_hasher = Argon2PasswordHasher::new(config.hash_params);
    let admission = HashAdmission::new(config.max_concurrent_hashes);
    tracing::info!(
        memory_kib = password_hasher.params().memory_kib,
        time_cost = password_hasher.params().time_cost,
        parallelism = password_hasher.params().parallelism,
        max_in_flight = admission.limit(),
        new_hash_peak_memory_mib =
            password_hasher.params().memory_bytes() * admission.limit() as u64 / (1024 * 1024),
        "password hashing configured"
    );

    let sign_up_usecase = SignUpUsecase::new(
        user_repository.clone(),
        password_hasher.clone(),
        admission.clone(),
    );
    let sign_in_usecase = SignInUsecase::new(user_repository, password_hasher, admission)?;

    let app = build_app(
        create_identity_router(sign_up_usecase, sign_in_usecase),
        &config,
    );

    let addr = config.addr();
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
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

    tracing::info!("shutdown signal received");
}
