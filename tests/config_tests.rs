use zbik_security::spamguard::commands::canonicalize_entry;
use zbik_security::spamguard::config::{sanitize_cfg, GuildSpamConfig, RaidConfig};

#[test]
fn sanitize_clamps_threshold() {
    let mut cfg = GuildSpamConfig::default();

    cfg.character_spam_threshold = 1.5;
    assert_eq!(sanitize_cfg(cfg.clone()).character_spam_threshold, 1.0);

    cfg.character_spam_threshold = -0.5;
    assert_eq!(sanitize_cfg(cfg.clone()).character_spam_threshold, 0.0);

    cfg.character_spam_threshold = f32::NAN;
    assert_eq!(sanitize_cfg(cfg).character_spam_threshold, 0.0);
}

#[test]
fn sanitize_normalizes_blacklist() {
    let cfg = GuildSpamConfig {
        blacklisted_links: vec![
            "  Bad.LY ".into(),
            "bad.ly".into(),
            "".into(),
            "discord.gg/raid".into(),
        ],
        ..Default::default()
    };
    let cfg = sanitize_cfg(cfg);
    assert_eq!(
        cfg.blacklisted_links,
        vec!["bad.ly".to_string(), "discord.gg/raid".to_string()]
    );
}

#[test]
fn sanitize_enforces_raid_minimums() {
    let cfg = GuildSpamConfig {
        raid: RaidConfig {
            enabled: true,
            message_count: 0,
            time_period_secs: 0,
            user_count: 0,
        },
        ..Default::default()
    };
    let cfg = sanitize_cfg(cfg);
    assert_eq!(cfg.raid.message_count, 1);
    assert_eq!(cfg.raid.user_count, 1);
    assert_eq!(cfg.raid.time_period_secs, 1);

    let cfg = GuildSpamConfig {
        raid: RaidConfig {
            enabled: true,
            message_count: 3,
            time_period_secs: 1_000_000,
            user_count: 2,
        },
        ..Default::default()
    };
    assert_eq!(sanitize_cfg(cfg).raid.time_period_secs, 86_400);
}

#[test]
fn config_json_roundtrip() {
    let cfg = GuildSpamConfig {
        enabled: true,
        blacklisted_links: vec!["bad.ly".into()],
        character_spam_threshold: 0.7,
        max_emotes: 5,
        max_stickers: 2,
        raid: RaidConfig {
            enabled: true,
            message_count: 5,
            time_period_secs: 30,
            user_count: 3,
        },
    };
    let val = serde_json::to_value(&cfg).unwrap();
    let back: GuildSpamConfig = serde_json::from_value(val).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn partial_json_fills_defaults() {
    // stare snapshoty w DB mogą nie mieć nowszych pól
    let back: GuildSpamConfig = serde_json::from_value(serde_json::json!({
        "blacklisted_links": ["bad.ly"]
    }))
    .unwrap();
    assert!(back.enabled);
    assert_eq!(back.blacklisted_links, vec!["bad.ly".to_string()]);
    assert_eq!(back.max_emotes, 0);
    assert!(!back.raid.enabled);
}

#[test]
fn canonicalize_strips_scheme_from_full_urls() {
    assert_eq!(
        canonicalize_entry("https://Bad.LY/x/").unwrap(),
        "bad.ly/x".to_string()
    );
    assert_eq!(
        canonicalize_entry("http://example.com").unwrap(),
        "example.com".to_string()
    );
}

#[test]
fn canonicalize_keeps_bare_fragments() {
    assert_eq!(canonicalize_entry("bad.ly").unwrap(), "bad.ly".to_string());
    assert_eq!(
        canonicalize_entry("discord.gg/raid").unwrap(),
        "discord.gg/raid".to_string()
    );
}

#[test]
fn canonicalize_rejects_empty_entries() {
    assert!(canonicalize_entry("   ").is_err());
    assert!(canonicalize_entry("").is_err());
}
