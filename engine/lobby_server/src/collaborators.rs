// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Contracts for everything the lobby treats as out of scope: identity, variant/clock
//! validation, ratings, game creation, the active-game registry, server-restart status,
//! and localization. The coordinator only ever sees these traits, so a test can swap in
//! whatever doubles it needs without touching lobby logic.

use lobby_protocol::{AuthIdentity, ConnId, Invite, LeaderboardId};

/// Resolves who is on the other end of a connection. Produced by the transport layer's
/// authentication step; the lobby never re-derives identity itself.
pub trait IdentityProvider: Send + Sync {
    fn identity_of(&self, conn: ConnId) -> AuthIdentity;
}

/// Game rules knowledge the lobby needs but does not own.
pub trait VariantValidator: Send + Sync {
    fn is_variant_valid(&self, variant: &str) -> bool;
    fn is_clock_valid(&self, clock: &str) -> bool;
    fn leaderboard_for(&self, variant: &str) -> Option<LeaderboardId>;
    /// Leaderboard a rating is looked up on when `leaderboard_for` has no dedicated one for
    /// the variant (spec's "INFINITY leaderboard" fallback) — a pooled, cross-variant
    /// leaderboard rather than "no rating at all".
    fn default_leaderboard(&self) -> LeaderboardId;
}

/// Current displayable rating for a member on a leaderboard, if any.
pub trait RatingProvider: Send + Sync {
    fn rating(&self, user_id: u32, leaderboard: LeaderboardId) -> Option<u32>;
}

/// Consumes an accepted invite and both participants, handing them off into an actual game.
/// By the time this returns both connections must already be out of the lobby's subscriber
/// registry; the coordinator enforces that before calling in.
pub trait GameFactory: Send + Sync {
    fn create_game(&self, invite: Invite, owner: Option<ConnId>, accepter: ConnId, reply_to: Option<u32>);
}

/// Whether an identity is currently playing a game elsewhere in the system.
pub trait ActiveGameRegistry: Send + Sync {
    fn is_in_active_game(&self, identity: &AuthIdentity) -> bool;
    fn active_game_count(&self) -> u32;
}

/// Whether the server is about to restart, gating invite creation for everyone but admins.
/// `None` means the check itself failed; callers fail safe by denying creation rather than
/// assuming the server is not restarting.
pub trait RestartCoordinator: Send + Sync {
    fn is_server_restarting(&self) -> Option<bool>;
    fn minutes_until_restart(&self) -> Option<u32>;
}

/// Renders an i18n key for a `notify` message in the subscriber's locale.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, locale: &str) -> String;
}

/// Everything the coordinator needs from the outside world, bundled for convenient
/// construction. Each field is a trait object so the lobby can be wired to production
/// services or to test doubles identically.
pub struct Collaborators {
    pub identity: Box<dyn IdentityProvider>,
    pub variants: Box<dyn VariantValidator>,
    pub ratings: Box<dyn RatingProvider>,
    pub games: Box<dyn GameFactory>,
    pub active_games: Box<dyn ActiveGameRegistry>,
    pub restart: Box<dyn RestartCoordinator>,
    pub translator: Box<dyn Translator>,
}

#[cfg(test)]
pub mod test_doubles {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    pub struct FixedIdentity(pub HashMap<ConnId, AuthIdentity>);
    impl IdentityProvider for FixedIdentity {
        fn identity_of(&self, conn: ConnId) -> AuthIdentity {
            self.0
                .get(&conn)
                .cloned()
                .unwrap_or(AuthIdentity::Guest {
                    browser_id: format!("unknown-{}", conn.0),
                })
        }
    }

    pub struct PermissiveVariants;
    impl VariantValidator for PermissiveVariants {
        fn is_variant_valid(&self, variant: &str) -> bool {
            variant != "bogus"
        }
        fn is_clock_valid(&self, clock: &str) -> bool {
            clock == "-" || clock.contains('+')
        }
        fn leaderboard_for(&self, variant: &str) -> Option<LeaderboardId> {
            (variant != "Untimed960").then_some(LeaderboardId(1))
        }
        fn default_leaderboard(&self) -> LeaderboardId {
            LeaderboardId(0)
        }
    }

    #[derive(Default)]
    pub struct NoRatings;
    impl RatingProvider for NoRatings {
        fn rating(&self, _user_id: u32, _leaderboard: LeaderboardId) -> Option<u32> {
            None
        }
    }

    #[derive(Default)]
    pub struct RecordingGameFactory {
        pub calls: Mutex<Vec<(Invite, Option<ConnId>, ConnId, Option<u32>)>>,
    }
    impl GameFactory for RecordingGameFactory {
        fn create_game(
            &self,
            invite: Invite,
            owner: Option<ConnId>,
            accepter: ConnId,
            reply_to: Option<u32>,
        ) {
            self.calls
                .lock()
                .unwrap()
                .push((invite, owner, accepter, reply_to));
        }
    }

    #[derive(Default)]
    pub struct NoActiveGames(pub Mutex<HashSet<String>>);
    impl ActiveGameRegistry for NoActiveGames {
        fn is_in_active_game(&self, identity: &AuthIdentity) -> bool {
            self.0.lock().unwrap().contains(&identity.key().to_string())
        }
        fn active_game_count(&self) -> u32 {
            0
        }
    }

    pub struct FixedRestart(pub Option<bool>, pub Option<u32>);
    impl RestartCoordinator for FixedRestart {
        fn is_server_restarting(&self) -> Option<bool> {
            self.0
        }
        fn minutes_until_restart(&self) -> Option<u32> {
            self.1
        }
    }

    pub struct IdentityTranslator;
    impl Translator for IdentityTranslator {
        fn translate(&self, key: &str, _locale: &str) -> String {
            key.to_string()
        }
    }
}
