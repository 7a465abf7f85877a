//! Komendy konfiguracyjne `/spamguard` (tylko staff).
//!
//! Każda zmiana przechodzi przez [`SpamConfigStore::publish`] — detekcja
//! w locie czyta stary snapshot, kolejna wiadomość dostaje nowy.

use anyhow::Result;
use serenity::all::{
    CommandDataOption, CommandDataOptionValue, CommandInteraction, CommandOptionType, Context,
    CreateCommand, CreateCommandOption, CreateEmbed, CreateEmbedFooter,
    CreateInteractionResponse, CreateInteractionResponseMessage, GuildId, Permissions,
};
use url::Url;

use crate::registry::env_roles;
use crate::AppContext;

use super::config::{ConfigError, GuildSpamConfig, MAX_BLACKLIST_ENTRIES};
use super::SpamGuard;

const BRAND_FOOTER: &str = "Zbik Security System™ • SpamGuard";

/* =========================================
   Rejestracja
   ========================================= */

pub async fn register(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id
        .create_command(
            &ctx.http,
            CreateCommand::new("spamguard")
                .description("Konfiguracja SpamGuard")
                .default_member_permissions(Permissions::MANAGE_GUILD)
                .add_option(CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "status",
                    "Pokaż bieżącą konfigurację",
                ))
                .add_option(CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "enable",
                    "Włącz detekcję",
                ))
                .add_option(CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "disable",
                    "Wyłącz detekcję",
                ))
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "charspam",
                        "Próg spamu znakowego (0 = wyłączony)",
                    )
                    .add_sub_option(
                        CreateCommandOption::new(
                            CommandOptionType::Number,
                            "value",
                            "Udział najczęstszego znaku, 0..=1",
                        )
                        .required(true),
                    ),
                )
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "emotes",
                        "Limit emotek (0 = wyłączony)",
                    )
                    .add_sub_option(
                        CreateCommandOption::new(CommandOptionType::Integer, "max", "Maksimum")
                            .required(true),
                    ),
                )
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "stickers",
                        "Limit naklejek (0 = wyłączony)",
                    )
                    .add_sub_option(
                        CreateCommandOption::new(CommandOptionType::Integer, "max", "Maksimum")
                            .required(true),
                    ),
                )
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "link-add",
                        "Dodaj wpis do blacklisty linków",
                    )
                    .add_sub_option(
                        CreateCommandOption::new(
                            CommandOptionType::String,
                            "entry",
                            "Domena/fragment lub pełny URL",
                        )
                        .required(true),
                    ),
                )
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "link-remove",
                        "Usuń wpis z blacklisty linków",
                    )
                    .add_sub_option(
                        CreateCommandOption::new(CommandOptionType::String, "entry", "Wpis")
                            .required(true),
                    ),
                )
                .add_option(CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "link-list",
                    "Pokaż blacklistę linków",
                ))
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::SubCommand,
                        "raid",
                        "Parametry ochrony przed rajdami",
                    )
                    .add_sub_option(
                        CreateCommandOption::new(
                            CommandOptionType::Boolean,
                            "enabled",
                            "Włączona?",
                        )
                        .required(true),
                    )
                    .add_sub_option(CreateCommandOption::new(
                        CommandOptionType::Integer,
                        "messages",
                        "Próg wiadomości w oknie",
                    ))
                    .add_sub_option(CreateCommandOption::new(
                        CommandOptionType::Integer,
                        "seconds",
                        "Szerokość okna (sekundy)",
                    ))
                    .add_sub_option(CreateCommandOption::new(
                        CommandOptionType::Integer,
                        "users",
                        "Próg różnych autorów",
                    )),
                ),
        )
        .await?;

    Ok(())
}

/* =========================================
   Obsługa
   ========================================= */

pub async fn on_cmd_spamguard(
    guard: &SpamGuard,
    ctx: &Context,
    app: &AppContext,
    cmd: &CommandInteraction,
) -> Result<()> {
    // ACL: tylko staff
    let env = app.env();
    let staff = env_roles::staff_set(&env);
    let allowed = cmd
        .member
        .as_ref()
        .map(|m| m.roles.iter().any(|r| staff.contains(&r.get())))
        .unwrap_or(false);
    if !allowed {
        reply_ephemeral(ctx, cmd, "Brak uprawnień.").await;
        return Ok(());
    }

    let Some(gid) = cmd.guild_id else {
        reply_ephemeral(ctx, cmd, "Użyj na serwerze.").await;
        return Ok(());
    };

    let Some((sub, opts)) = first_sub(&cmd.data.options) else {
        reply_ephemeral(ctx, cmd, "Nieznana subkomenda.").await;
        return Ok(());
    };

    let store = guard.store();
    let cfg = store.get(gid.get()).await;

    match sub.as_str() {
        "status" => {
            let embed = status_embed(&cfg);
            let _ = cmd
                .create_response(
                    &ctx.http,
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new()
                            .embed(embed)
                            .ephemeral(true),
                    ),
                )
                .await;
        }
        "enable" | "disable" => {
            let enabled = sub == "enable";
            let mut cfg = cfg;
            cfg.enabled = enabled;
            store.publish(gid.get(), cfg).await;
            reply_ephemeral(
                ctx,
                cmd,
                if enabled {
                    "SpamGuard **włączony**."
                } else {
                    "SpamGuard **wyłączony**."
                },
            )
            .await;
        }
        "charspam" => {
            let value = opt_f64(&opts, "value").unwrap_or(-1.0);
            match validate_threshold(value) {
                Ok(v) => {
                    let mut cfg = cfg;
                    cfg.character_spam_threshold = v;
                    store.publish(gid.get(), cfg).await;
                    let txt = if v == 0.0 {
                        "Spam znakowy: **wyłączony**.".to_string()
                    } else {
                        format!("Próg spamu znakowego: **{:.2}**.", v)
                    };
                    reply_ephemeral(ctx, cmd, txt).await;
                }
                Err(e) => reply_ephemeral(ctx, cmd, format!("Błąd: {}", e)).await,
            }
        }
        "emotes" => {
            let raw = opt_i64(&opts, "max").unwrap_or(-1);
            match validate_cap(raw) {
                Ok(max) => {
                    let mut cfg = cfg;
                    cfg.max_emotes = max;
                    store.publish(gid.get(), cfg).await;
                    reply_ephemeral(ctx, cmd, cap_text("emotek", max)).await;
                }
                Err(e) => reply_ephemeral(ctx, cmd, format!("Błąd: {}", e)).await,
            }
        }
        "stickers" => {
            let raw = opt_i64(&opts, "max").unwrap_or(-1);
            match validate_cap(raw) {
                Ok(max) => {
                    let mut cfg = cfg;
                    cfg.max_stickers = max;
                    store.publish(gid.get(), cfg).await;
                    reply_ephemeral(ctx, cmd, cap_text("naklejek", max)).await;
                }
                Err(e) => reply_ephemeral(ctx, cmd, format!("Błąd: {}", e)).await,
            }
        }
        "link-add" => {
            let raw = opt_str(&opts, "entry").unwrap_or_default();
            match canonicalize_entry(&raw) {
                Ok(_) if cfg.blacklisted_links.len() >= MAX_BLACKLIST_ENTRIES => {
                    reply_ephemeral(ctx, cmd, format!("Błąd: {}", ConfigError::BlacklistFull))
                        .await;
                }
                Ok(entry) => {
                    let mut cfg = cfg;
                    if !cfg.blacklisted_links.contains(&entry) {
                        cfg.blacklisted_links.push(entry.clone());
                    }
                    store.publish(gid.get(), cfg).await;
                    reply_ephemeral(ctx, cmd, format!("Dodano do blacklisty: `{}`", entry)).await;
                }
                Err(e) => reply_ephemeral(ctx, cmd, format!("Błąd: {}", e)).await,
            }
        }
        "link-remove" => {
            let raw = opt_str(&opts, "entry").unwrap_or_default();
            // usuwamy po tej samej formie, w jakiej link-add zapisuje
            let needle = canonicalize_entry(&raw).unwrap_or_else(|_| raw.trim().to_lowercase());
            let mut cfg = cfg;
            let before = cfg.blacklisted_links.len();
            cfg.blacklisted_links.retain(|e| *e != needle);
            let removed = before != cfg.blacklisted_links.len();
            store.publish(gid.get(), cfg).await;
            reply_ephemeral(
                ctx,
                cmd,
                if removed {
                    format!("Usunięto z blacklisty: `{}`", needle)
                } else {
                    format!("Nie znaleziono wpisu: `{}`", needle)
                },
            )
            .await;
        }
        "link-list" => {
            let text = if cfg.blacklisted_links.is_empty() {
                "Blacklista jest pusta.".to_string()
            } else {
                cfg.blacklisted_links
                    .iter()
                    .map(|e| format!("• `{}`", e))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            reply_ephemeral(ctx, cmd, text).await;
        }
        "raid" => {
            let enabled = opt_bool(&opts, "enabled").unwrap_or(false);
            let messages = opt_i64(&opts, "messages");
            let seconds = opt_i64(&opts, "seconds");
            let users = opt_i64(&opts, "users");

            let mut cfg = cfg;
            cfg.raid.enabled = enabled;
            let applied = (|| -> Result<(), ConfigError> {
                if let Some(m) = messages {
                    cfg.raid.message_count = validate_at_least_one(m)?;
                }
                if let Some(s) = seconds {
                    cfg.raid.time_period_secs = validate_period(s)?;
                }
                if let Some(u) = users {
                    cfg.raid.user_count = validate_at_least_one(u)?;
                }
                Ok(())
            })();

            match applied {
                Ok(()) => {
                    let cfg = store.publish(gid.get(), cfg).await;
                    reply_ephemeral(
                        ctx,
                        cmd,
                        format!(
                            "Ochrona przed rajdami: **{}** ({} wiadomości / {} s / {} autorów).",
                            if cfg.raid.enabled { "włączona" } else { "wyłączona" },
                            cfg.raid.message_count,
                            cfg.raid.time_period_secs,
                            cfg.raid.user_count
                        ),
                    )
                    .await;
                }
                Err(e) => reply_ephemeral(ctx, cmd, format!("Błąd: {}", e)).await,
            }
        }
        _ => {
            reply_ephemeral(ctx, cmd, "Nieznana subkomenda.").await;
        }
    }

    Ok(())
}

/* =========================================
   Walidacja wejścia
   ========================================= */

fn validate_threshold(value: f64) -> Result<f32, ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange(value));
    }
    Ok(value as f32)
}

fn validate_cap(value: i64) -> Result<u32, ConfigError> {
    if value < 0 {
        return Err(ConfigError::Negative(value));
    }
    Ok(value.min(u32::MAX as i64) as u32)
}

fn validate_at_least_one(value: i64) -> Result<u32, ConfigError> {
    if value < 1 {
        return Err(ConfigError::BelowOne(value));
    }
    Ok(value.min(u32::MAX as i64) as u32)
}

fn validate_period(value: i64) -> Result<u64, ConfigError> {
    if !(1..=86_400).contains(&value) {
        return Err(ConfigError::PeriodOutOfRange(value));
    }
    Ok(value as u64)
}

/// Wpis blacklisty: pełny URL sprowadzamy do host+ścieżka, resztę zostawiamy
/// jako surowy fragment (lowercase).
pub fn canonicalize_entry(raw: &str) -> Result<String, ConfigError> {
    let t = raw.trim().to_lowercase();
    if t.is_empty() {
        return Err(ConfigError::EmptyBlacklistEntry);
    }
    if let Ok(u) = Url::parse(&t) {
        if let Some(host) = u.host_str() {
            let path = u.path().trim_end_matches('/');
            return Ok(format!("{}{}", host, path));
        }
    }
    Ok(t)
}

/* =========================================
   Pomocnicze
   ========================================= */

fn cap_text(what: &str, max: u32) -> String {
    if max == 0 {
        format!("Limit {}: **wyłączony**.", what)
    } else {
        format!("Limit {}: **{}**.", what, max)
    }
}

fn status_embed(cfg: &GuildSpamConfig) -> CreateEmbed {
    let links = if cfg.blacklisted_links.is_empty() {
        "–".to_string()
    } else {
        format!("{} wpisów", cfg.blacklisted_links.len())
    };
    let charspam = if cfg.character_spam_threshold == 0.0 {
        "wyłączony".to_string()
    } else {
        format!("{:.2}", cfg.character_spam_threshold)
    };

    CreateEmbed::new()
        .title("SpamGuard: konfiguracja")
        .description(format!(
            "Detekcja: **{}**\nBlacklista linków: {}\nPróg spamu znakowego: {}\nLimit emotek: {}\nLimit naklejek: {}\n\nRajdy: **{}** ({} wiadomości / {} s / {} autorów)",
            if cfg.enabled { "włączona" } else { "wyłączona" },
            links,
            charspam,
            if cfg.max_emotes == 0 { "wyłączony".to_string() } else { cfg.max_emotes.to_string() },
            if cfg.max_stickers == 0 { "wyłączony".to_string() } else { cfg.max_stickers.to_string() },
            if cfg.raid.enabled { "włączone" } else { "wyłączone" },
            cfg.raid.message_count,
            cfg.raid.time_period_secs,
            cfg.raid.user_count
        ))
        .footer(CreateEmbedFooter::new(BRAND_FOOTER))
}

async fn reply_ephemeral(ctx: &Context, cmd: &CommandInteraction, text: impl Into<String>) {
    let _ = cmd
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(text.into())
                    .ephemeral(true),
            ),
        )
        .await;
}

fn first_sub(options: &[CommandDataOption]) -> Option<(String, Vec<CommandDataOption>)> {
    options.first().and_then(|o| match &o.value {
        CommandDataOptionValue::SubCommand(subs) => Some((o.name.clone(), subs.clone())),
        _ => None,
    })
}

fn opt_str(opts: &[CommandDataOption], name: &str) -> Option<String> {
    opts.iter().find(|o| o.name == name).and_then(|o| match &o.value {
        CommandDataOptionValue::String(s) => Some(s.clone()),
        _ => None,
    })
}

fn opt_i64(opts: &[CommandDataOption], name: &str) -> Option<i64> {
    opts.iter().find(|o| o.name == name).and_then(|o| match &o.value {
        CommandDataOptionValue::Integer(v) => Some(*v),
        _ => None,
    })
}

fn opt_f64(opts: &[CommandDataOption], name: &str) -> Option<f64> {
    opts.iter().find(|o| o.name == name).and_then(|o| match &o.value {
        CommandDataOptionValue::Number(v) => Some(*v),
        CommandDataOptionValue::Integer(v) => Some(*v as f64),
        _ => None,
    })
}

fn opt_bool(opts: &[CommandDataOption], name: &str) -> Option<bool> {
    opts.iter().find(|o| o.name == name).and_then(|o| match &o.value {
        CommandDataOptionValue::Boolean(v) => Some(*v),
        _ => None,
    })
}
