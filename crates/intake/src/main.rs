use std::sync::Arc;

use intake_core::{config::Config, store::SqliteStore};

#[tokio::main]
async fn main() -> Result<(), intake_core::Error> {
    intake_core::logging::init("intake")?;

    let cfg = Arc::new(Config::load()?);

    let store = SqliteStore::open(&cfg.database_path)?;
    tracing::info!(
        path = %cfg.database_path.display(),
        applications = store.count()?,
        "record store ready"
    );
    if let Some(last) = store.recent(1)?.first() {
        tracing::info!(
            application_id = last.id,
            submitted_at = %last.submitted_at_text(),
            "latest application"
        );
    }

    intake_telegram::router::run_polling(cfg, Arc::new(store))
        .await
        .map_err(|e| intake_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
