//! Egzekwowanie werdyktów: delete + DM + wpis do kanału logów.
//!
//! Wszystko best-effort. Każdy efekt uboczny jest próbowany niezależnie:
//! nieudany delete nie blokuje DM-a ani loga, a żaden błąd nie wychodzi
//! do ścieżki przetwarzania wiadomości (logujemy i jedziemy dalej).

use std::time::Duration;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;

use crate::platform::{LogEntry, Platform};

use super::{InboundMessage, SpamRule, SpamVerdict};

const COLOUR_SUPPRESS: u32 = 0xe74c3c;
const COLOUR_RAID: u32 = 0xe67e22;

/// Maksimum treści cytowanej w logu (limit opisu embeda to 4096).
const MAX_QUOTED_CONTENT: usize = 3500;

/// Kanały logów przekazywane z rejestru; 0 = nieskonfigurowany (no-op).
#[derive(Debug, Clone, Copy)]
pub struct LogChannels {
    pub violations: u64,
    pub raids: u64,
}

pub struct ActionExecutor {
    /// Throttle DM-ów per autor — flood i tak kasujemy, nie ma sensu
    /// zasypywać sprawcy osobnym DM-em za każdą z 30 wiadomości.
    dm_limiter: DefaultKeyedRateLimiter<u64>,
}

impl ActionExecutor {
    pub fn new(dm_cooldown: Duration) -> Self {
        let period = if dm_cooldown.is_zero() {
            Duration::from_secs(30)
        } else {
            dm_cooldown
        };
        Self {
            dm_limiter: RateLimiter::keyed(Quota::with_period(period).expect("niezerowy okres")),
        }
    }

    /// Zastosuj werdykt. Nigdy nie zwraca błędu do wołającego.
    pub async fn apply(
        &self,
        platform: &dyn Platform,
        logs: LogChannels,
        verdict: &SpamVerdict,
        msg: &InboundMessage,
    ) {
        match verdict {
            SpamVerdict::NoAction => {}
            SpamVerdict::Suppress { rule, evidence } => {
                self.apply_suppression(platform, logs, *rule, evidence, msg)
                    .await;
            }
            SpamVerdict::RaidAlert(hit) => {
                // alert jest informacyjny: bez delete i bez DM-ów
                warn!(
                    guild_id = msg.guild_id,
                    signature = %hit.signature,
                    authors = hit.authors.len(),
                    count = hit.count,
                    "raid alert"
                );
                if logs.raids != 0 {
                    let entry = raid_entry(hit);
                    if let Err(e) = platform.send_log(logs.raids, &entry).await {
                        warn!(error=?e, guild_id = msg.guild_id, "raid log send failed");
                    }
                }
            }
        }
    }

    async fn apply_suppression(
        &self,
        platform: &dyn Platform,
        logs: LogChannels,
        rule: SpamRule,
        evidence: &str,
        msg: &InboundMessage,
    ) {
        // 1) delete (bez retry)
        if let Err(e) = platform.delete_message(msg.channel_id, msg.message_id).await {
            warn!(error=?e, guild_id = msg.guild_id, rule = ?rule, "suppress delete failed");
        }

        // 2) DM do autora (throttle; brak możliwości dostarczenia = tylko warn)
        if self.dm_limiter.check_key(&msg.author_id).is_ok() {
            let entry = dm_entry(rule, evidence);
            if let Err(e) = platform.dm_user(msg.author_id, &entry).await {
                warn!(error=?e, user_id = msg.author_id, "suppress dm failed");
            }
        }

        // 3) wpis do kanału logów
        if logs.violations != 0 {
            let entry = violation_entry(rule, evidence, msg);
            if let Err(e) = platform.send_log(logs.violations, &entry).await {
                warn!(error=?e, guild_id = msg.guild_id, "suppress log send failed");
            }
        }
    }
}

/* =========================================
   Budowa wpisów
   ========================================= */

pub fn rule_label(rule: SpamRule) -> &'static str {
    match rule {
        SpamRule::Link => "Zablokowany link",
        SpamRule::CharacterSpam => "Spam znakowy",
        SpamRule::EmoteSpam => "Spam emotkami",
        SpamRule::StickerSpam => "Spam naklejkami",
    }
}

fn dm_entry(rule: SpamRule, evidence: &str) -> LogEntry {
    LogEntry {
        title: "Twoja wiadomość została usunięta".to_string(),
        description: format!(
            "Powód: **{}**\n{}\n\nJeśli uważasz, że to pomyłka, napisz do moderacji.",
            rule_label(rule),
            evidence
        ),
        colour: COLOUR_SUPPRESS,
    }
}

fn violation_entry(rule: SpamRule, evidence: &str, msg: &InboundMessage) -> LogEntry {
    let body = if msg.content.is_empty() {
        "—".to_string()
    } else {
        clamp_chars(&msg.content, MAX_QUOTED_CONTENT)
    };

    LogEntry {
        title: "SpamGuard: naruszenie".to_string(),
        description: format!(
            "Autor: <@{}>\nKanał: <#{}>\nReguła: **{}**\n{}\n\nTreść:\n{}",
            msg.author_id,
            msg.channel_id,
            rule_label(rule),
            evidence,
            body
        ),
        colour: COLOUR_SUPPRESS,
    }
}

fn raid_entry(hit: &super::raid::RaidHit) -> LogEntry {
    let authors = hit
        .authors
        .iter()
        .map(|id| format!("<@{}>", id))
        .collect::<Vec<_>>()
        .join(", ");

    LogEntry {
        title: "SpamGuard: wykryto rajd".to_string(),
        description: format!(
            "Zgrupowana treść:\n{}\n\nWiadomości w oknie: **{}**\nAutorzy ({}): {}",
            clamp_chars(&hit.signature, 1024),
            hit.count,
            hit.authors.len(),
            clamp_chars(&authors, 1024)
        ),
        colour: COLOUR_RAID,
    }
}

/// Przycinanie po znakach z '…' gdy obcięte.
fn clamp_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, c) in s.chars().enumerate() {
        if i + 1 >= max_chars {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}
