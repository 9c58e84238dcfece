//! Relay Server Binary
//!
//! Long-polls both bots and runs the verification relay until Ctrl-C or
//! SIGTERM. Configuration comes from `config/relay.yaml` (or `RELAY_CONFIG`)
//! layered under `RELAY__*` environment variables.

use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use relay_core::bootstrap::{BotEndpoints, RelaySystem};
use relay_core::config::{BotConnectionConfig, ConfigLoader};
use relay_core::constants::commands::APPLICANT_MENU;
use relay_core::database::{DatabaseConnection, PgActorRepository};
use relay_core::logging::init_structured_logging;
use relay_core::security::AesGcmCipher;
use relay_core::transport::TelegramClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new()
        .load()
        .context("failed to load relay configuration")?;

    init_structured_logging();
    info!(app_env = %config.app_env, "🚀 Starting relay server");

    let database = DatabaseConnection::new(&config.database)
        .await
        .context("failed to connect to the database")?;
    anyhow::ensure!(
        database
            .health_check()
            .await
            .context("database health check failed")?,
        "database health check returned an unexpected value"
    );
    let cipher = AesGcmCipher::from_hex(&config.encryption_key)
        .context("invalid encryption key")?;
    let repository = Arc::new(PgActorRepository::new(
        database.pool().clone(),
        Arc::new(cipher),
    ));

    let applicant = connect_bot("applicant", &config.applicant_bot, false).await?;
    applicant
        .set_menu_commands(APPLICANT_MENU)
        .await
        .context("failed to register applicant menu commands")?;
    let reviewer = connect_bot("reviewer", &config.reviewer_bot, true).await?;

    let system = RelaySystem::build(
        config,
        repository,
        BotEndpoints::new(applicant.clone(), applicant),
        BotEndpoints::new(reviewer.clone(), reviewer),
    )
    .context("failed to wire relay system")?;
    let seeded = system
        .seed_reviewers()
        .await
        .context("failed to seed reviewer actors")?;
    info!(seeded, "Reviewer actors ready");

    let cancel = CancellationToken::new();
    tokio::spawn(watch_for_shutdown(cancel.clone()));

    let summary = system.run(cancel).await;
    info!(
        applicant_processed = summary.applicant.updates_processed,
        reviewer_processed = summary.reviewer.updates_processed,
        "Relay server stopped"
    );

    database.close().await;
    Ok(())
}

async fn connect_bot(
    pool: &str,
    bot: &BotConnectionConfig,
    channel_posts: bool,
) -> anyhow::Result<Arc<TelegramClient>> {
    let mut client_config = bot.client_config();
    if channel_posts {
        client_config = client_config.with_channel_posts();
    }
    let client = TelegramClient::new(client_config)
        .with_context(|| format!("failed to build {pool} bot client"))?;
    client
        .delete_webhook()
        .await
        .with_context(|| format!("failed to delete {pool} bot webhook"))?;
    info!(pool, "✅ Bot connected");
    Ok(Arc::new(client))
}

async fn watch_for_shutdown(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("🛑 Ctrl-C received"),
                    _ = terminate.recv() => info!("🛑 SIGTERM received"),
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!(error = %e, "Failed to listen for Ctrl-C");
                }
            }
        }
    }
    #[cfg(not(unix))]
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
    }

    cancel.cancel();
}
