//! `rollcall run`: wire the clients, the handlers and the sync driver together.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rollcall_core::{
    AccessToken, ChatEvent, ChatSession, Config, DiscordRest, GoogleSheets, ReactionHandler,
    SettingsStore, SyncDriver, run_command, update_queue,
};
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinSet};

use crate::events::EventStream;

pub async fn run(config_path: &Path, events: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let token = AccessToken::from_file(&config.google.token_path).with_context(|| {
        format!("failed to read Sheets token from {}", config.google.token_path.display())
    })?;
    let sheets = Arc::new(GoogleSheets::new(token)?);
    let chat = Arc::new(DiscordRest::new(&config.discord.bot_token)?);
    let own_user_id = chat
        .current_user_id()
        .await
        .context("failed to look up the bot's own Discord user")?;
    tracing::info!(user_id = %own_user_id, "connected to Discord");

    let capacity = config.sync.queue_capacity;
    let settings = SettingsStore::new(config);
    let (updates, pending) = update_queue(capacity);
    let handler = ReactionHandler::new(Arc::clone(&chat), settings.clone(), updates, own_user_id);

    let driver = SyncDriver::new(sheets, settings.subscribe(), pending);
    let (stop, stopped) = oneshot::channel::<()>();
    let driver_task = tokio::spawn(driver.run(async move {
        let _ = stopped.await;
    }));

    let mut stream = EventStream::open(events).await?;
    let mut tasks = JoinSet::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        reap_finished(&mut tasks);
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("interrupted, shutting down");
                break;
            }
            next = stream.next() => match next.context("failed to read event stream")? {
                None => {
                    tracing::info!("event stream ended, shutting down");
                    break;
                }
                Some(ChatEvent::Command(invocation)) => {
                    let chat = Arc::clone(&chat);
                    let settings = settings.clone();
                    tasks.spawn(async move {
                        let reply = run_command(chat.as_ref(), &settings, &invocation).await;
                        if let Err(err) = chat.send_message(&invocation.channel_id, &reply).await {
                            tracing::warn!(command = %invocation.name, "failed to send reply: {err}");
                        }
                    });
                }
                Some(event) => {
                    let handler = handler.clone();
                    tasks.spawn(async move {
                        if let Err(err) = handler.handle(&event).await {
                            tracing::error!("reaction event abandoned: {err}");
                        }
                    });
                }
            },
        }
    }

    // Let in-flight handlers enqueue before the driver's final flush.
    while let Some(result) = tasks.join_next().await {
        log_task_result(result);
    }
    let _ = stop.send(());
    driver_task.await.context("sync driver panicked")?;

    settings
        .snapshot()
        .save(config_path)
        .with_context(|| format!("failed to save config to {}", config_path.display()))?;
    tracing::info!(path = %config_path.display(), "saved config");
    Ok(())
}

/// Collect handler tasks that have already finished without waiting on the
/// rest.
fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        log_task_result(result);
    }
}

fn log_task_result(result: Result<(), JoinError>) {
    if let Err(err) = result {
        tracing::error!("handler task failed: {err}");
    }
}
