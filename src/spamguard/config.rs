//! Per-gildyjna konfiguracja SpamGuarda + magazyn snapshotów (cache + DB).
//!
//! Detekcja czyta WYŁĄCZNIE snapshot z pamięci; komendy administracyjne
//! publikują nowy snapshot przez [`SpamConfigStore::publish`] zamiast
//! mutować konfigurację w miejscu.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::Db;

/// Ile wpisów blacklisty linków trzymamy maksymalnie per gildia.
pub const MAX_BLACKLIST_ENTRIES: usize = 200;
/// Górny limit okna rajdowego (sekundy).
const MAX_RAID_PERIOD_SECS: u64 = 86_400;

static INIT_DONE: AtomicBool = AtomicBool::new(false);

/* =========================================
   Typy konfiguracji
   ========================================= */

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuildSpamConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cele dopasowania podłańcuchowego (case-insensitive; trzymane lowercase).
    #[serde(default)]
    pub blacklisted_links: Vec<String>,
    /// Maksymalny tolerowany udział najczęstszego znaku w wiadomości, 0..=1.
    /// 0 wyłącza check. Porównanie ostre: wiadomość dokładnie na progu przechodzi.
    #[serde(default)]
    pub character_spam_threshold: f32,
    /// 0 wyłącza check.
    #[serde(default)]
    pub max_emotes: u32,
    /// 0 wyłącza check.
    #[serde(default)]
    pub max_stickers: u32,
    #[serde(default)]
    pub raid: RaidConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RaidConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Ile wiadomości o tej samej sygnaturze w oknie wyzwala alert.
    #[serde(default = "default_raid_messages")]
    pub message_count: u32,
    /// Szerokość okna przesuwnego.
    #[serde(default = "default_raid_period")]
    pub time_period_secs: u64,
    /// Ilu różnych autorów musi się złożyć na sygnaturę.
    #[serde(default = "default_raid_users")]
    pub user_count: u32,
}

fn default_true() -> bool {
    true
}
fn default_raid_messages() -> u32 {
    5
}
fn default_raid_period() -> u64 {
    30
}
fn default_raid_users() -> u32 {
    3
}

impl Default for GuildSpamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blacklisted_links: Vec::new(),
            character_spam_threshold: 0.0,
            max_emotes: 0,
            max_stickers: 0,
            raid: RaidConfig::default(),
        }
    }
}

impl Default for RaidConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            message_count: default_raid_messages(),
            time_period_secs: default_raid_period(),
            user_count: default_raid_users(),
        }
    }
}

/// Błędy walidacji wartości wpisywanych komendami administracyjnymi.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("próg musi być w zakresie 0..=1 (podano {0})")]
    ThresholdOutOfRange(f64),
    #[error("wartość musi być nieujemna (podano {0})")]
    Negative(i64),
    #[error("wartość musi być co najmniej 1 (podano {0})")]
    BelowOne(i64),
    #[error("okno czasowe musi mieścić się w 1..={MAX_RAID_PERIOD_SECS} s (podano {0})")]
    PeriodOutOfRange(i64),
    #[error("pusty wpis blacklisty")]
    EmptyBlacklistEntry,
    #[error("blacklista pełna (limit {MAX_BLACKLIST_ENTRIES} wpisów)")]
    BlacklistFull,
}

/// Sprowadź konfigurację do legalnych zakresów. Wołane przy każdym
/// load/publish, więc snapshot w cache jest zawsze zdatny do użycia.
pub fn sanitize_cfg(mut cfg: GuildSpamConfig) -> GuildSpamConfig {
    cfg.character_spam_threshold = if cfg.character_spam_threshold.is_finite() {
        cfg.character_spam_threshold.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let mut links: Vec<String> = cfg
        .blacklisted_links
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    links.sort_unstable();
    links.dedup();
    links.truncate(MAX_BLACKLIST_ENTRIES);
    cfg.blacklisted_links = links;

    cfg.raid.message_count = cfg.raid.message_count.max(1);
    cfg.raid.user_count = cfg.raid.user_count.max(1);
    cfg.raid.time_period_secs = cfg.raid.time_period_secs.clamp(1, MAX_RAID_PERIOD_SECS);

    cfg
}

/* =========================================
   Magazyn snapshotów
   ========================================= */

pub struct SpamConfigStore {
    db: Db,
    cache: DashMap<u64, GuildSpamConfig>,
}

impl SpamConfigStore {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            cache: DashMap::new(),
        }
    }

    /// Snapshot dla gildii: cache -> DB -> Default.
    pub async fn get(&self, guild_id: u64) -> GuildSpamConfig {
        if let Some(c) = self.cache.get(&guild_id) {
            return c.clone();
        }

        match load_cfg_db(&self.db, guild_id).await {
            Ok(Some(cfg)) => {
                let cfg = sanitize_cfg(cfg);
                self.cache.insert(guild_id, cfg.clone());
                cfg
            }
            Ok(None) => {
                let cfg = GuildSpamConfig::default();
                self.cache.insert(guild_id, cfg.clone());
                cfg
            }
            Err(e) => {
                // bez cache'owania — następna wiadomość spróbuje ponownie
                warn!(error=?e, %guild_id, "spamguard config load failed, using defaults");
                GuildSpamConfig::default()
            }
        }
    }

    /// Opublikuj nowy snapshot (cache natychmiast, DB best-effort).
    pub async fn publish(&self, guild_id: u64, cfg: GuildSpamConfig) -> GuildSpamConfig {
        let cfg = sanitize_cfg(cfg);
        self.cache.insert(guild_id, cfg.clone());
        if let Err(e) = save_cfg_db(&self.db, guild_id, &cfg).await {
            warn!(error=?e, %guild_id, "spamguard config save failed (snapshot stays in memory)");
        }
        cfg
    }

    /// Rozgrzanie cache przy starcie / dołączeniu gildii.
    pub async fn warmup(&self, guild_id: u64) {
        maybe_ensure_tables(&self.db).await;
        if let Ok(Some(cfg)) = load_cfg_db(&self.db, guild_id).await {
            self.cache.insert(guild_id, sanitize_cfg(cfg));
        }
    }
}

/* =========================================
   DB (jedna tabela: guild_id -> JSONB)
   ========================================= */

pub async fn maybe_ensure_tables(db: &Db) {
    if !INIT_DONE.load(Ordering::Relaxed) {
        if let Err(e) = ensure_tables(db).await {
            warn!(error=?e, "spamguard ensure_tables failed");
        } else {
            INIT_DONE.store(true, Ordering::Relaxed);
        }
    }
}

async fn ensure_tables(db: &Db) -> Result<()> {
    sqlx::query(r#"CREATE SCHEMA IF NOT EXISTS zss"#)
        .execute(db)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS zss.spam_config (
            guild_id   BIGINT PRIMARY KEY,
            config     JSONB NOT NULL DEFAULT '{}',
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(db)
    .await?;

    Ok(())
}

async fn load_cfg_db(db: &Db, guild_id: u64) -> Result<Option<GuildSpamConfig>> {
    let row: Option<(serde_json::Value,)> =
        sqlx::query_as(r#"SELECT config FROM zss.spam_config WHERE guild_id = $1"#)
            .bind(guild_id as i64)
            .fetch_optional(db)
            .await?;

    match row {
        Some((val,)) => Ok(Some(serde_json::from_value(val)?)),
        None => Ok(None),
    }
}

async fn save_cfg_db(db: &Db, guild_id: u64, cfg: &GuildSpamConfig) -> Result<()> {
    let val = serde_json::to_value(cfg)?;
    sqlx::query(
        r#"
        INSERT INTO zss.spam_config (guild_id, config, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (guild_id) DO UPDATE
            SET config = EXCLUDED.config, updated_at = now()
        "#,
    )
    .bind(guild_id as i64)
    .bind(val)
    .execute(db)
    .await?;
    Ok(())
}
