// src/lib.rs

pub mod config;
pub mod db;
pub mod discord;
pub mod logging;
pub mod platform;
pub mod registry; // ← rejestr ról/kanałów PROD/DEV
pub mod spamguard;

// opcjonalny skrót: use crate::env_roles;
pub use crate::registry::env_roles;

use anyhow::Result;
use once_cell::sync::OnceCell;
use std::sync::Arc;

use config::Settings;
use db::Db;

use serenity::all::GatewayIntents;

/// Globalny kontekst aplikacji: konfiguracja, DB i serwis SpamGuard.
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub db: Db,
    spamguard: OnceCell<Arc<spamguard::SpamGuard>>,
}

impl AppContext {
    /// Bootstrap całej aplikacji:
    /// - logi
    /// - połączenie z DB
    /// - stworzenie i wstrzyknięcie SpamGuarda do OnceCell
    pub async fn bootstrap(settings: Settings) -> Result<Arc<Self>> {
        // 1) logi
        logging::init(&settings);

        // 2) DB
        let db = db::connect(&settings.database.url, settings.database.max_connections).await?;

        // 3) kontekst (na razie z pustym OnceCell)
        let ctx = Arc::new(Self {
            settings,
            db,
            spamguard: OnceCell::new(),
        });

        // 4) SpamGuard
        let sg = spamguard::SpamGuard::new(ctx.clone());
        let _ = ctx.spamguard.set(sg); // set() można wołać tylko raz

        Ok(ctx)
    }

    /// Kontekst do testów: bez logów i bez migracji, DB leniwie.
    pub fn new_testing(settings: Settings, db: Db) -> Arc<Self> {
        let ctx = Arc::new(Self {
            settings,
            db,
            spamguard: OnceCell::new(),
        });
        let sg = spamguard::SpamGuard::new(ctx.clone());
        let _ = ctx.spamguard.set(sg);
        ctx
    }

    /// Wygodny getter: daj mi SpamGuarda (Arc).
    pub fn spamguard(&self) -> Arc<spamguard::SpamGuard> {
        self.spamguard
            .get()
            .expect("SpamGuard not initialized")
            .clone()
    }

    /// Środowisko: "production" | "development".
    /// Czytamy z ENV `ZSS_ENV`; brak → "development".
    #[inline]
    pub fn env(&self) -> String {
        std::env::var("ZSS_ENV").unwrap_or_else(|_| "development".to_string())
    }
}

/// Intents klienta Discord:
/// - GUILDS, GUILD_MESSAGES, MESSAGE_CONTENT (konieczne do filtrowania treści),
/// - GUILD_MEMBERS (role – potrzebne do ACL komend).
pub fn default_gateway_intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS
}

/// Start klienta Discorda (Gateway + slash commands).
pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    discord::run_bot(ctx).await
}
