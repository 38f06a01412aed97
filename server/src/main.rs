// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use lobby_protocol::{AuthIdentity, ConnId, Invite, LeaderboardId};
use lobby_server::collaborators::{
    ActiveGameRegistry, Collaborators, GameFactory, IdentityProvider, RatingProvider,
    RestartCoordinator, Translator, VariantValidator,
};
use lobby_server::options::Options;
use log::info;
use structopt::StructOpt;

/// Placeholder identity provider: every connection is an unverified guest keyed by its
/// connection id. A real deployment replaces this with the actual session/auth lookup.
struct GuestOnlyIdentity;
impl IdentityProvider for GuestOnlyIdentity {
    fn identity_of(&self, conn: ConnId) -> AuthIdentity {
        AuthIdentity::Guest {
            browser_id: conn.to_string(),
        }
    }
}

struct StandardVariants;
impl VariantValidator for StandardVariants {
    fn is_variant_valid(&self, variant: &str) -> bool {
        matches!(variant, "Classical" | "Chess960" | "KingOfTheHill" | "Atomic" | "Horde")
    }
    fn is_clock_valid(&self, clock: &str) -> bool {
        if clock == "-" {
            return true;
        }
        clock
            .split_once('+')
            .map(|(base, inc)| base.parse::<u32>().is_ok() && inc.parse::<u32>().is_ok())
            .unwrap_or(false)
    }
    fn leaderboard_for(&self, variant: &str) -> Option<LeaderboardId> {
        self.is_variant_valid(variant).then_some(LeaderboardId(1))
    }
    fn default_leaderboard(&self) -> LeaderboardId {
        LeaderboardId(0)
    }
}

struct NoRatings;
impl RatingProvider for NoRatings {
    fn rating(&self, _user_id: u32, _leaderboard: LeaderboardId) -> Option<u32> {
        None
    }
}

/// Placeholder hand-off: a real deployment forwards `invite` to the game-creation
/// subsystem. This just logs, which is enough to observe the lobby's own behavior.
struct LoggingGameFactory;
impl GameFactory for LoggingGameFactory {
    fn create_game(&self, invite: Invite, owner: Option<ConnId>, accepter: ConnId, reply_to: Option<u32>) {
        info!(
            "hand-off: invite {} owner={owner:?} accepter={accepter} reply_to={reply_to:?}",
            invite.id
        );
    }
}

struct NoActiveGames;
impl ActiveGameRegistry for NoActiveGames {
    fn is_in_active_game(&self, _identity: &AuthIdentity) -> bool {
        false
    }
    fn active_game_count(&self) -> u32 {
        0
    }
}

struct NeverRestarting;
impl RestartCoordinator for NeverRestarting {
    fn is_server_restarting(&self) -> Option<bool> {
        Some(false)
    }
    fn minutes_until_restart(&self) -> Option<u32> {
        None
    }
}

struct PassthroughTranslator;
impl Translator for PassthroughTranslator {
    fn translate(&self, key: &str, _locale: &str) -> String {
        key.to_string()
    }
}

fn main() {
    let options = Options::from_args();

    let collaborators = Collaborators {
        identity: Box::new(GuestOnlyIdentity),
        variants: Box::new(StandardVariants),
        ratings: Box::new(NoRatings),
        games: Box::new(LoggingGameFactory),
        active_games: Box::new(NoActiveGames),
        restart: Box::new(NeverRestarting),
        translator: Box::new(PassthroughTranslator),
    };

    lobby_server::entry_point::entry_point(options, collaborators);
}
