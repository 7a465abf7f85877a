//! Łańcuch heurystyk uruchamiany dla każdej wiadomości.
//!
//! Kolejność w [`CHECKS`] jest kontraktem: pierwsze naruszenie wygrywa
//! i kończy przebieg — wiadomość nigdy nie jest raportowana z dwóch reguł
//! naraz. Checki są czystymi funkcjami nad snapshotem konfiguracji;
//! nie mogą zawieść i nie trzymają żadnego stanu.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::config::GuildSpamConfig;
use super::{InboundMessage, SpamRule, SpamVerdict};

/// Wiadomości o tej długości (w znakach) lub krótsze pomijają check powtórzeń.
const MIN_CHARS_FOR_REPEAT_CHECK: usize = 10;

// Customowe emotki: <:nazwa:id> oraz animowane <a:nazwa:id>
static RE_CUSTOM_EMOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<a?:\w+:\d+>").unwrap());

// Emoji unicode; sekwencje ZWJ liczą się po komponentach, co dla limitu wystarcza.
static RE_UNICODE_EMOJI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Emoji_Presentation}|\p{Extended_Pictographic}").unwrap());

type CheckFn = fn(&InboundMessage, &GuildSpamConfig) -> Option<String>;

/// Kolejność = priorytet.
const CHECKS: &[(SpamRule, CheckFn)] = &[
    (SpamRule::Link, check_blacklisted_link),
    (SpamRule::CharacterSpam, check_character_repeat),
    (SpamRule::EmoteSpam, check_emote_count),
    (SpamRule::StickerSpam, check_sticker_count),
];

/// Przebieg łańcucha: `NoAction` albo `Suppress` z regułą i dowodem.
pub fn evaluate(msg: &InboundMessage, cfg: &GuildSpamConfig) -> SpamVerdict {
    if !cfg.enabled || msg.author_is_bot {
        return SpamVerdict::NoAction;
    }

    for (rule, check) in CHECKS {
        if let Some(evidence) = check(msg, cfg) {
            return SpamVerdict::Suppress {
                rule: *rule,
                evidence,
            };
        }
    }

    SpamVerdict::NoAction
}

/* =========================================
   Poszczególne checki
   ========================================= */

fn check_blacklisted_link(msg: &InboundMessage, cfg: &GuildSpamConfig) -> Option<String> {
    if cfg.blacklisted_links.is_empty() {
        return None;
    }
    let lowered = msg.content.to_lowercase();
    cfg.blacklisted_links
        .iter()
        .find(|entry| !entry.is_empty() && lowered.contains(entry.as_str()))
        .map(|entry| format!("zablokowany link: `{}`", entry))
}

fn check_character_repeat(msg: &InboundMessage, cfg: &GuildSpamConfig) -> Option<String> {
    if cfg.character_spam_threshold <= 0.0 {
        return None;
    }
    let total = msg.content.chars().count();
    if total <= MIN_CHARS_FOR_REPEAT_CHECK {
        return None;
    }

    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in msg.content.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    let ratio = max as f32 / total as f32;

    // ostre `>`: dokładnie na progu NIE flagujemy
    (ratio > cfg.character_spam_threshold).then(|| {
        format!(
            "udział najczęstszego znaku {:.2} > {:.2}",
            ratio, cfg.character_spam_threshold
        )
    })
}

fn check_emote_count(msg: &InboundMessage, cfg: &GuildSpamConfig) -> Option<String> {
    if cfg.max_emotes == 0 {
        return None;
    }
    let count = count_emotes(&msg.content);
    (count > cfg.max_emotes as usize)
        .then(|| format!("emotki: {} > limit {}", count, cfg.max_emotes))
}

fn check_sticker_count(msg: &InboundMessage, cfg: &GuildSpamConfig) -> Option<String> {
    if cfg.max_stickers == 0 {
        return None;
    }
    (msg.sticker_count > cfg.max_stickers)
        .then(|| format!("naklejki: {} > limit {}", msg.sticker_count, cfg.max_stickers))
}

/// Customowe emotki + emoji unicode, zliczane wzorcami.
pub fn count_emotes(content: &str) -> usize {
    RE_CUSTOM_EMOTE.find_iter(content).count() + RE_UNICODE_EMOJI.find_iter(content).count()
}
