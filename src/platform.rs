//! Wąska brama na API Discorda dla akcji moderacyjnych.
//!
//! SpamGuard nie woła serenity bezpośrednio przy egzekwowaniu werdyktów —
//! wszystko idzie przez [`Platform`], więc testy mogą podstawić atrapę
//! i sprawdzić niezależność efektów ubocznych (delete / DM / log).

use std::sync::Arc;

use anyhow::Result;
use serenity::all::{ChannelId, Colour, CreateEmbed, CreateEmbedFooter, CreateMessage, UserId};
use serenity::async_trait;
use serenity::http::Http;

const BRAND_FOOTER: &str = "Zbik Security System™ • SpamGuard";

/// Ustrukturyzowany wpis (DM albo log-channel) renderowany do embeda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub title: String,
    pub description: String,
    pub colour: u32,
}

#[async_trait]
pub trait Platform: Send + Sync {
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<()>;
    async fn dm_user(&self, user_id: u64, entry: &LogEntry) -> Result<()>;
    async fn send_log(&self, channel_id: u64, entry: &LogEntry) -> Result<()>;
}

/* =========================================
   Implementacja serenity (HTTP)
   ========================================= */

pub struct DiscordPlatform {
    http: Arc<Http>,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn build_embed(entry: &LogEntry) -> CreateEmbed {
    CreateEmbed::new()
        .title(entry.title.clone())
        .description(entry.description.clone())
        .footer(CreateEmbedFooter::new(BRAND_FOOTER))
        .colour(Colour::new(entry.colour))
}

#[async_trait]
impl Platform for DiscordPlatform {
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<()> {
        ChannelId::new(channel_id)
            .delete_message(&self.http, message_id)
            .await?;
        Ok(())
    }

    async fn dm_user(&self, user_id: u64, entry: &LogEntry) -> Result<()> {
        let ch = UserId::new(user_id).create_dm_channel(&self.http).await?;
        ch.id
            .send_message(&self.http, CreateMessage::new().embed(build_embed(entry)))
            .await?;
        Ok(())
    }

    async fn send_log(&self, channel_id: u64, entry: &LogEntry) -> Result<()> {
        ChannelId::new(channel_id)
            .send_message(&self.http, CreateMessage::new().embed(build_embed(entry)))
            .await?;
        Ok(())
    }
}
