use std::time::{Duration, Instant};

use zbik_security::spamguard::config::RaidConfig;
use zbik_security::spamguard::raid::{normalize_signature, RaidTracker};

fn cfg(messages: u32, users: u32, secs: u64) -> RaidConfig {
    RaidConfig {
        enabled: true,
        message_count: messages,
        time_period_secs: secs,
        user_count: users,
    }
}

#[tokio::test]
async fn spec_scenario_three_messages_two_authors() {
    let tracker = RaidTracker::new();
    let cfg = cfg(3, 2, 60);
    let base = Instant::now();

    assert!(tracker.observe_at(1, 1, "JOIN NOW", &cfg, base).await.is_none());
    assert!(tracker
        .observe_at(1, 2, "join  now", &cfg, base + Duration::from_secs(5))
        .await
        .is_none());

    let hit = tracker
        .observe_at(1, 1, "join now", &cfg, base + Duration::from_secs(10))
        .await
        .expect("alert");
    assert_eq!(hit.count, 3);
    assert_eq!(hit.authors.len(), 2);

    // stan wyczyszczony — czwarta identyczna wiadomość nie strzela od razu
    assert!(tracker
        .observe_at(1, 3, "join now", &cfg, base + Duration::from_secs(11))
        .await
        .is_none());
}

#[tokio::test]
async fn entry_exactly_at_window_edge_is_expired() {
    let tracker = RaidTracker::new();
    let cfg = cfg(2, 2, 60);
    let base = Instant::now();

    assert!(tracker.observe_at(1, 1, "payload", &cfg, base).await.is_none());
    // dokładnie 60 s później: wpis sprzed okna już nie liczy się do grupy
    assert!(tracker
        .observe_at(1, 2, "payload", &cfg, base + Duration::from_secs(60))
        .await
        .is_none());
}

#[tokio::test]
async fn alert_resets_unrelated_signatures_too() {
    // świadoma decyzja (stop-the-world): alert dla sygnatury A zeruje
    // również rozpędzoną historię sygnatury B w tej samej gildii
    let tracker = RaidTracker::new();
    let cfg = cfg(3, 2, 60);
    let base = Instant::now();

    assert!(tracker.observe_at(1, 1, "AAA", &cfg, base).await.is_none());
    assert!(tracker.observe_at(1, 2, "AAA", &cfg, base).await.is_none());
    assert!(tracker.observe_at(1, 3, "BBB", &cfg, base).await.is_none());
    assert!(tracker.observe_at(1, 4, "BBB", &cfg, base).await.is_none());

    let hit = tracker
        .observe_at(1, 5, "AAA", &cfg, base + Duration::from_secs(1))
        .await
        .expect("alert dla AAA");
    assert_eq!(hit.signature, "aaa");

    // BBB zaczyna od zera
    assert!(tracker
        .observe_at(1, 6, "BBB", &cfg, base + Duration::from_secs(2))
        .await
        .is_none());
}

#[tokio::test]
async fn empty_content_groups_by_empty_signature() {
    let tracker = RaidTracker::new();
    let cfg = cfg(2, 2, 60);
    let base = Instant::now();

    assert!(tracker.observe_at(1, 1, "", &cfg, base).await.is_none());
    let hit = tracker
        .observe_at(1, 2, "   ", &cfg, base + Duration::from_secs(1))
        .await
        .expect("puste sygnatury też się grupują");
    assert_eq!(hit.signature, "");
    assert_eq!(hit.count, 2);
}

#[test]
fn signatures_fold_case_and_whitespace() {
    assert_eq!(
        normalize_signature("  Free\tNITRO   here "),
        normalize_signature("free nitro here")
    );
}
