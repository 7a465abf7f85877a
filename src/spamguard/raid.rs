//! Detekcja skoordynowanych floodów (rajdów).
//!
//! Per gildia trzymamy przesuwne okno czasowe ostatniej aktywności:
//! autor -> kolejka (sygnatura, czas). Sygnatura to znormalizowana treść
//! (NFKC, lowercase, zbite białe znaki), dzięki czemu "wielu ludzi wkleja
//! ten sam payload" odróżniamy od zwykłego ruchliwego czatu.
//!
//! Przycinanie jest zamortyzowane w każdą obserwację (bez zewnętrznego
//! schedulera): przy wstawieniu tniemy przeterminowane wpisy WSZYSTKICH
//! autorów gildii, bo stare wpisy innych autorów nie mogą liczyć się do
//! sumy grupy. Po odpaleniu alertu całe okno gildii jest czyszczone,
//! żeby ten sam burst nie strzelał wielokrotnie.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use unicode_normalization::UnicodeNormalization;

use super::config::RaidConfig;

/// Wynik detekcji: zgrupowana sygnatura, autorzy i liczność w oknie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaidHit {
    pub signature: String,
    pub authors: Vec<u64>,
    pub count: usize,
}

struct WindowEntry {
    signature: String,
    at: Instant,
}

#[derive(Default)]
struct GuildWindow {
    per_author: HashMap<u64, VecDeque<WindowEntry>>,
}

/// Jedna instancja serwisu; stan per gildia pod wspólnym mutexem.
/// Mutacja okna i grupowanie dzieją się w jednej sekcji krytycznej
/// bez punktów await, więc obserwacja jest niepodzielna.
pub struct RaidTracker {
    windows: Mutex<HashMap<u64, GuildWindow>>,
}

impl RaidTracker {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub async fn observe(
        &self,
        guild_id: u64,
        author_id: u64,
        content: &str,
        cfg: &RaidConfig,
    ) -> Option<RaidHit> {
        self.observe_at(guild_id, author_id, content, cfg, Instant::now())
            .await
    }

    /// Wariant z wstrzykniętym zegarem — testy podają syntetyczne chwile.
    pub async fn observe_at(
        &self,
        guild_id: u64,
        author_id: u64,
        content: &str,
        cfg: &RaidConfig,
        now: Instant,
    ) -> Option<RaidHit> {
        if !cfg.enabled {
            return None;
        }
        let period = Duration::from_secs(cfg.time_period_secs.max(1));

        let mut windows = self.windows.lock().await;
        let win = windows.entry(guild_id).or_default();

        win.per_author
            .entry(author_id)
            .or_default()
            .push_back(WindowEntry {
                signature: normalize_signature(content),
                at: now,
            });

        // przytnij wszystkich autorów; opróżnionych usuń
        win.per_author.retain(|_, queue| {
            while let Some(front) = queue.front() {
                if now.saturating_duration_since(front.at) >= period {
                    queue.pop_front();
                } else {
                    break;
                }
            }
            !queue.is_empty()
        });

        // grupowanie po sygnaturze: (liczność, zbiór autorów)
        let mut groups: HashMap<&str, (usize, HashSet<u64>)> = HashMap::new();
        for (author, queue) in &win.per_author {
            for entry in queue {
                let g = groups.entry(entry.signature.as_str()).or_default();
                g.0 += 1;
                g.1.insert(*author);
            }
        }

        let hit = groups.into_iter().find_map(|(sig, (count, authors))| {
            (count >= cfg.message_count as usize && authors.len() >= cfg.user_count as usize)
                .then(|| {
                    let mut authors: Vec<u64> = authors.into_iter().collect();
                    authors.sort_unstable();
                    RaidHit {
                        signature: sig.to_string(),
                        authors,
                        count,
                    }
                })
        });

        if hit.is_some() {
            // stop-the-world: alert zeruje całą historię gildii
            windows.remove(&guild_id);
        }

        hit
    }
}

impl Default for RaidTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// NFKC + lowercase + zbicie wewnętrznych białych znaków + trim.
pub fn normalize_signature(content: &str) -> String {
    let folded: String = content.nfkc().collect::<String>().to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/* =========================================
   Testy okna
   ========================================= */

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(messages: u32, users: u32, secs: u64) -> RaidConfig {
        RaidConfig {
            enabled: true,
            message_count: messages,
            time_period_secs: secs,
            user_count: users,
        }
    }

    #[tokio::test]
    async fn fires_once_then_resets() {
        let tracker = RaidTracker::new();
        let cfg = cfg(3, 2, 60);
        let base = Instant::now();

        assert!(tracker
            .observe_at(1, 100, "FREE NITRO  now", &cfg, base)
            .await
            .is_none());
        assert!(tracker
            .observe_at(1, 101, "free nitro now", &cfg, base + Duration::from_secs(1))
            .await
            .is_none());

        let hit = tracker
            .observe_at(1, 100, "Free Nitro now", &cfg, base + Duration::from_secs(2))
            .await
            .expect("trzecia wiadomość powinna odpalić alert");
        assert_eq!(hit.signature, "free nitro now");
        assert_eq!(hit.count, 3);
        assert_eq!(hit.authors, vec![100, 101]);

        // okno wyzerowane: kolejna identyczna wiadomość zaczyna od zera
        assert!(tracker
            .observe_at(1, 102, "free nitro now", &cfg, base + Duration::from_secs(3))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn stale_entries_do_not_count() {
        let tracker = RaidTracker::new();
        let cfg = cfg(2, 2, 60);
        let base = Instant::now();

        assert!(tracker
            .observe_at(1, 100, "join discord.gg/xyz", &cfg, base)
            .await
            .is_none());
        // 61 s później wpis autora 100 jest już poza oknem
        assert!(tracker
            .observe_at(
                1,
                101,
                "join discord.gg/xyz",
                &cfg,
                base + Duration::from_secs(61)
            )
            .await
            .is_none());
    }

    #[tokio::test]
    async fn requires_distinct_authors() {
        let tracker = RaidTracker::new();
        let cfg = cfg(3, 2, 60);
        let base = Instant::now();

        for i in 0..5u64 {
            let res = tracker
                .observe_at(1, 100, "same text", &cfg, base + Duration::from_secs(i))
                .await;
            assert!(res.is_none(), "jeden autor nie powinien odpalić alertu");
        }
    }

    #[tokio::test]
    async fn different_signatures_tracked_separately() {
        let tracker = RaidTracker::new();
        let cfg = cfg(2, 2, 60);
        let base = Instant::now();

        assert!(tracker.observe_at(1, 100, "aaa", &cfg, base).await.is_none());
        assert!(tracker.observe_at(1, 101, "bbb", &cfg, base).await.is_none());
        assert!(tracker.observe_at(1, 102, "ccc", &cfg, base).await.is_none());

        let hit = tracker
            .observe_at(1, 103, "aaa", &cfg, base + Duration::from_secs(1))
            .await
            .expect("druga kopia 'aaa' od innego autora powinna odpalić");
        assert_eq!(hit.signature, "aaa");
        assert_eq!(hit.count, 2);
    }

    #[tokio::test]
    async fn guilds_are_isolated() {
        let tracker = RaidTracker::new();
        let cfg = cfg(2, 2, 60);
        let base = Instant::now();

        assert!(tracker.observe_at(1, 100, "xxx", &cfg, base).await.is_none());
        // ta sama treść w innej gildii nie składa się z poprzednią
        assert!(tracker.observe_at(2, 101, "xxx", &cfg, base).await.is_none());
    }

    #[tokio::test]
    async fn disabled_config_is_inert() {
        let tracker = RaidTracker::new();
        let mut cfg = cfg(1, 1, 60);
        cfg.enabled = false;

        assert!(tracker
            .observe_at(1, 100, "anything", &cfg, Instant::now())
            .await
            .is_none());
    }

    #[test]
    fn signature_normalization() {
        assert_eq!(normalize_signature("  Ala   MA\tkota "), "ala ma kota");
        // NFKC: ligatura/fullwidth sprowadzone do ASCII
        assert_eq!(normalize_signature("ｆｒｅｅ ｎｉｔｒｏ"), "free nitro");
        assert_eq!(normalize_signature(""), "");
    }
}
