//! SpamGuard – detekcja nadużyć w czasie rzeczywistym.
//!
//! Dwie niezależne ścieżki dla każdej wiadomości:
//! - łańcuch heurystyk ([`checks`]) — bezstanowy, pierwsze naruszenie wygrywa,
//! - okno rajdowe ([`raid`]) — stan per gildia, grupowanie po sygnaturze treści.
//!
//! Werdykty egzekwuje [`actions::ActionExecutor`] przez bramę
//! [`crate::platform::Platform`] (delete / DM / log), zawsze best-effort.

pub mod actions;
pub mod checks;
pub mod commands;
pub mod config;
pub mod raid;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serenity::all::{Context, GuildId, Interaction, Message};
use tracing::warn;

use crate::platform::DiscordPlatform;
use crate::registry::env_channels;
use crate::AppContext;

use self::actions::{ActionExecutor, LogChannels};
use self::config::SpamConfigStore;
use self::raid::RaidTracker;

/* =========================================
   Typy werdyktu
   ========================================= */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpamRule {
    Link,
    CharacterSpam,
    EmoteSpam,
    StickerSpam,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpamVerdict {
    NoAction,
    Suppress { rule: SpamRule, evidence: String },
    RaidAlert(raid::RaidHit),
}

/// Wiadomość w postaci niezależnej od serenity — wszystko, czego potrzebują
/// checki i okno rajdowe.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub author_id: u64,
    pub author_is_bot: bool,
    pub content: String,
    pub sticker_count: u32,
}

impl InboundMessage {
    pub fn from_discord(msg: &Message, guild_id: GuildId) -> Self {
        Self {
            guild_id: guild_id.get(),
            channel_id: msg.channel_id.get(),
            message_id: msg.id.get(),
            author_id: msg.author.id.get(),
            author_is_bot: msg.author.bot,
            content: msg.content.clone(),
            sticker_count: msg.sticker_items.len() as u32,
        }
    }
}

/* =========================================
   Serwis
   ========================================= */

pub struct SpamGuard {
    ctx: Arc<AppContext>,
    store: SpamConfigStore,
    raids: RaidTracker,
    actions: ActionExecutor,
}

impl SpamGuard {
    pub fn new(ctx: Arc<AppContext>) -> Arc<Self> {
        let store = SpamConfigStore::new(ctx.db.clone());
        let dm_cooldown =
            Duration::from_secs(ctx.settings.spamguard.dm_cooldown_secs.unwrap_or(30));
        Arc::new(Self {
            ctx,
            store,
            raids: RaidTracker::new(),
            actions: ActionExecutor::new(dm_cooldown),
        })
    }

    pub fn store(&self) -> &SpamConfigStore {
        &self.store
    }

    /// Rozgrzanie cache konfiguracji (ready / dołączenie gildii).
    pub async fn warmup_cache(&self, guild_id: u64) {
        self.store.warmup(guild_id).await;
    }

    /// Wywoływane z EventHandler::message dla każdej wiadomości gildyjnej.
    pub async fn on_message(&self, ctx: &Context, app: &AppContext, msg: &Message) {
        let Some(gid) = msg.guild_id else {
            return;
        };
        if msg.author.bot {
            return;
        }

        config::maybe_ensure_tables(&self.ctx.db).await;

        let inbound = InboundMessage::from_discord(msg, gid);
        let cfg = self.store.get(gid.get()).await;

        let env = app.env();
        let logs = LogChannels {
            violations: env_channels::logs::spamguard_id(&env),
            raids: env_channels::logs::raid_id(&env),
        };
        let platform = DiscordPlatform::new(ctx.http.clone());

        // 1) łańcuch heurystyk (gating na enabled siedzi w evaluate)
        let verdict = checks::evaluate(&inbound, &cfg);
        if !matches!(verdict, SpamVerdict::NoAction) {
            self.actions.apply(&platform, logs, &verdict, &inbound).await;
        }

        // 2) niezależnie: okno rajdowe
        if let Some(hit) = self
            .raids
            .observe(gid.get(), inbound.author_id, &inbound.content, &cfg.raid)
            .await
        {
            let verdict = SpamVerdict::RaidAlert(hit);
            self.actions.apply(&platform, logs, &verdict, &inbound).await;
        }
    }

    /// Brama interakcji: komendy konfiguracyjne `/spamguard`.
    pub async fn on_interaction(&self, ctx: &Context, app: &AppContext, interaction: Interaction) {
        config::maybe_ensure_tables(&self.ctx.db).await;

        if let Some(cmd) = interaction.command() {
            if cmd.data.name == "spamguard" {
                if let Err(e) = commands::on_cmd_spamguard(self, ctx, app, &cmd).await {
                    warn!(error=?e, "spamguard cmd failed");
                }
            }
        }
    }

    pub async fn register_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
        commands::register(ctx, guild_id).await
    }
}
