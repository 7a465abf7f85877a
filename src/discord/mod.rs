// src/discord/mod.rs
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Result;
use futures_util::FutureExt;
use serenity::all::*;
use serenity::async_trait;

use crate::spamguard::{config as sg_config, SpamGuard};
use crate::AppContext;

pub struct Handler {
    pub app: Arc<AppContext>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!("Logged in as {}", ready.user.name);

        // Tabele (raz przy starcie procesu; best-effort)
        sg_config::maybe_ensure_tables(&self.app.db).await;

        // Rejestr komend slash + rozgrzanie cache konfiguracji
        for g in ready.guilds {
            if let Err(e) = SpamGuard::register_commands(&ctx, g.id).await {
                tracing::warn!(error=?e, gid=%g.id.get(), "register_commands failed");
            }
            self.app.spamguard().warmup_cache(g.id.get()).await;
        }
    }

    /// Brama interakcji: komendy konfiguracyjne.
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let fut = async {
            self.app
                .spamguard()
                .on_interaction(&ctx, &self.app, interaction)
                .await;
        };

        if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
            tracing::error!("interaction handler panicked");
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.guild_id.is_none() {
            return;
        }
        if msg.author.bot {
            return;
        }

        self.app.spamguard().on_message(&ctx, &self.app, &msg).await;
    }
}

pub async fn run_bot(app: Arc<AppContext>) -> Result<()> {
    let token = app.settings.discord.token.clone();
    let intents = crate::default_gateway_intents();

    let mut client = Client::builder(&token, intents)
        .event_handler(Handler { app })
        .await?;

    client.start().await?;
    Ok(())
}
