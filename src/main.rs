use std::sync::Arc;

use submission_service::config::AppConfig;
use submission_service::error::AppError;
use submission_service::services::{init_metrics, Database, JwtService, SubmissionStore};
use submission_service::{build_router, observability, startup, AppState};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    observability::init_tracing(&config.service_name, &config.log_level);
    init_metrics();

    let database = Database::new(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    database.run_migrations().await?;

    let store: Arc<dyn SubmissionStore> = Arc::new(database);
    let jwt = JwtService::new(&config.jwt);
    let state = AppState::new(store, jwt, &config.invitation);

    let app = build_router(state, &config.allowed_origins);
    startup::serve(app, config.port).await
}
