mod auth;
mod config;
mod pipeline;
mod stager;
mod store;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use keepsake_common::retention::RetentionPolicy;

use config::BackupConfig;

const DATE_STAMP_FORMAT: &str = "%Y-%m-%d";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    info!("keepsake-agent starting");

    if let Err(e) = run().await {
        error!(error = %e, "Backup run failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = BackupConfig::from_env()?;
    let policy = RetentionPolicy::new(config.retain_count)?;
    let store = store::from_config(&config.store)?;
    info!(
        source = %config.source_path.display(),
        folder_id = %config.folder_id,
        retain = policy.max_count(),
        "Configuration loaded"
    );

    let date_stamp = chrono::Local::now().format(DATE_STAMP_FORMAT).to_string();
    let artifact = stager::stage(&config.source_path, &config.staging_dir, &date_stamp).await?;

    let report =
        pipeline::upload_and_rotate(store.as_ref(), &artifact, &config.folder_id, policy).await?;

    info!(
        staged = %report.staged_path.display(),
        remote_id = %report.remote_id,
        kept = report.kept,
        pruned = report.pruned.len(),
        failed_deletes = report.failures.len(),
        "Backup run complete"
    );
    Ok(())
}
