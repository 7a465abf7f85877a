//! Centralny rejestr identyfikatorów (role, kanały logów) z obsługą profili
//! PROD/DEV.
//!
//! `env_roles::*` fallbackuje w DEV na PROD (dla ról).
//! `env_channels::*` w DEV **nie** fallbackuje (zwraca 0, jeśli brak ID).

#![allow(non_upper_case_globals)]
#![allow(dead_code)]

/* =========================
   PROD: role
   ========================= */
pub mod roles {
    pub mod core {
        pub const WLASCICIEL: u64     = 912844031725910017;
        pub const ZARZAD: u64         = 912844153910861835;
        pub const TECHNIK_BOTOW: u64  = 1287345110294266011;
        pub const HEAD_ADMIN: u64     = 912844296387456124;
        pub const ADMIN: u64          = 912844397881724938;
        pub const MODERATOR: u64      = 912844502667759646;
        pub const TEST_MODERATOR: u64 = 1287345390679831164;
    }
}

/* =========================
   DEV: role (serwer testowy)
   ========================= */
pub mod dev_roles {
    pub mod core {
        pub const WLASCICIEL: u64     = 1301577802316333197;
        pub const ZARZAD: u64         = 0;
        pub const TECHNIK_BOTOW: u64  = 1301577924013064343;
        pub const HEAD_ADMIN: u64     = 0;
        pub const ADMIN: u64          = 1301578034818121864;
        pub const MODERATOR: u64      = 1301578135258398843;
        pub const TEST_MODERATOR: u64 = 1301578267082953671;
    }
}

/* =========================
   Kanały (PROD/DEV)
   ========================= */
pub mod channels {
    pub mod prod {
        /// Log naruszeń SpamGuard (usunięte wiadomości + powód).
        pub const LOGS_SPAMGUARD: u64 = 912845221145691125;
        /// Alerty rajdów (eskalacja dla moderacji).
        pub const LOGS_RAID: u64      = 912845344210141201;
    }
    pub mod dev {
        pub const LOGS_SPAMGUARD: u64 = 1301579001391407135;
        pub const LOGS_RAID: u64      = 1301579106287157317;
    }
}

fn is_prod(env: &str) -> bool {
    env.eq_ignore_ascii_case("production") || env.eq_ignore_ascii_case("prod")
}

/* =========================
   Widok ról zależny od środowiska
   ========================= */
pub mod env_roles {
    use std::collections::HashSet;

    use super::{dev_roles, is_prod, roles};

    /// Zbiór ról "staff" uprawnionych do komend konfiguracyjnych.
    /// DEV fallbackuje na PROD tam, gdzie testowy serwer nie ma odpowiednika.
    pub fn staff_set(env: &str) -> HashSet<u64> {
        let ids: [u64; 7] = if is_prod(env) {
            [
                roles::core::WLASCICIEL,
                roles::core::ZARZAD,
                roles::core::TECHNIK_BOTOW,
                roles::core::HEAD_ADMIN,
                roles::core::ADMIN,
                roles::core::MODERATOR,
                roles::core::TEST_MODERATOR,
            ]
        } else {
            [
                pick(dev_roles::core::WLASCICIEL, roles::core::WLASCICIEL),
                pick(dev_roles::core::ZARZAD, roles::core::ZARZAD),
                pick(dev_roles::core::TECHNIK_BOTOW, roles::core::TECHNIK_BOTOW),
                pick(dev_roles::core::HEAD_ADMIN, roles::core::HEAD_ADMIN),
                pick(dev_roles::core::ADMIN, roles::core::ADMIN),
                pick(dev_roles::core::MODERATOR, roles::core::MODERATOR),
                pick(dev_roles::core::TEST_MODERATOR, roles::core::TEST_MODERATOR),
            ]
        };
        ids.into_iter().filter(|id| *id != 0).collect()
    }

    fn pick(dev: u64, prod: u64) -> u64 {
        if dev != 0 {
            dev
        } else {
            prod
        }
    }
}

/* =========================
   Widok kanałów zależny od środowiska
   ========================= */
pub mod env_channels {
    pub mod logs {
        use crate::registry::{channels, is_prod};

        pub fn spamguard_id(env: &str) -> u64 {
            if is_prod(env) {
                channels::prod::LOGS_SPAMGUARD
            } else {
                channels::dev::LOGS_SPAMGUARD
            }
        }

        pub fn raid_id(env: &str) -> u64 {
            if is_prod(env) {
                channels::prod::LOGS_RAID
            } else {
                channels::dev::LOGS_RAID
            }
        }
    }
}
