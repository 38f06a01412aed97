// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Authorization and eligibility rules. Kept separate from the command router so each rule
//! can be unit tested against plain values without standing up a coordinator.

use crate::collaborators::Collaborators;
use lobby_protocol::{AuthIdentity, Color, Invite, Publicity, Rated};

#[derive(Debug, Eq, PartialEq)]
pub enum PolicyError {
    AlreadyInGame,
    AlreadyHaveInvite,
    Restarting { minutes: Option<u32> },
    InvalidParameters,
    VerificationNeeded,
    Forbidden,
    CannotAcceptOwn,
}

/// An `owner`-role member may create invites even while the server is restarting.
const RESTART_EXEMPT_ROLE: &str = "owner";

pub fn check_not_in_active_game(
    collaborators: &Collaborators,
    identity: &AuthIdentity,
) -> Result<(), PolicyError> {
    if collaborators.active_games.is_in_active_game(identity) {
        Err(PolicyError::AlreadyInGame)
    } else {
        Ok(())
    }
}

pub fn check_restart_gate(
    collaborators: &Collaborators,
    identity: &AuthIdentity,
) -> Result<(), PolicyError> {
    if identity.has_role(RESTART_EXEMPT_ROLE) {
        return Ok(());
    }
    // A failed check is treated the same as "restarting": the safe default denies
    // creation rather than assuming the server is fine.
    match collaborators.restart.is_server_restarting() {
        Some(false) => Ok(()),
        Some(true) | None => Err(PolicyError::Restarting {
            minutes: collaborators.restart.minutes_until_restart(),
        }),
    }
}

/// Validates the cross-field constraints for a prospective invite, given the
/// already-resolved owner identity.
pub fn validate_invite_parameters(
    collaborators: &Collaborators,
    owner: &AuthIdentity,
    variant: &str,
    clock: &str,
    color: Color,
    rated: Rated,
    publicity: Publicity,
) -> Result<(), PolicyError> {
    if !collaborators.variants.is_variant_valid(variant) || !collaborators.variants.is_clock_valid(clock) {
        return Err(PolicyError::InvalidParameters);
    }
    if rated == Rated::Rated {
        let has_leaderboard = collaborators.variants.leaderboard_for(variant).is_some();
        let timed = clock != "-";
        let color_or_privacy_ok = color == Color::Neutral || publicity == Publicity::Private;
        if !(has_leaderboard && timed && color_or_privacy_ok) {
            return Err(PolicyError::InvalidParameters);
        }
        if !owner.is_verified_member() {
            return Err(PolicyError::VerificationNeeded);
        }
    }
    Ok(())
}

pub fn check_owner_matches(invite: &Invite, identity: &AuthIdentity) -> Result<(), PolicyError> {
    if &invite.owner == identity {
        Ok(())
    } else {
        Err(PolicyError::Forbidden)
    }
}

pub fn check_not_self_accept(invite: &Invite, identity: &AuthIdentity) -> Result<(), PolicyError> {
    if &invite.owner == identity {
        Err(PolicyError::CannotAcceptOwn)
    } else {
        Ok(())
    }
}

pub fn check_accept_rating_eligibility(invite: &Invite, identity: &AuthIdentity) -> Result<(), PolicyError> {
    if invite.rated == Rated::Rated && !identity.is_verified_member() {
        Err(PolicyError::VerificationNeeded)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::test_doubles::*;
    use std::collections::HashMap;

    fn collaborators() -> Collaborators {
        Collaborators {
            identity: Box::new(FixedIdentity(HashMap::new())),
            variants: Box::new(PermissiveVariants),
            ratings: Box::new(NoRatings),
            games: Box::new(RecordingGameFactory::default()),
            active_games: Box::new(NoActiveGames::default()),
            restart: Box::new(FixedRestart(Some(false), None)),
            translator: Box::new(IdentityTranslator),
        }
    }

    fn unverified_member() -> AuthIdentity {
        AuthIdentity::Member {
            user_id: lobby_protocol::UserId(1),
            username: "a".into(),
            roles: Default::default(),
            verified: false,
        }
    }

    #[test]
    fn rated_requires_verification() {
        let c = collaborators();
        let err = validate_invite_parameters(
            &c,
            &unverified_member(),
            "Classical",
            "600+0",
            Color::Neutral,
            Rated::Rated,
            Publicity::Public,
        )
        .unwrap_err();
        assert_eq!(err, PolicyError::VerificationNeeded);
    }

    #[test]
    fn rated_untimed_is_rejected() {
        let c = collaborators();
        let err = validate_invite_parameters(
            &c,
            &unverified_member(),
            "Classical",
            "-",
            Color::Neutral,
            Rated::Rated,
            Publicity::Public,
        )
        .unwrap_err();
        assert_eq!(err, PolicyError::InvalidParameters);
    }

    #[test]
    fn rated_public_non_neutral_is_rejected() {
        let c = collaborators();
        let err = validate_invite_parameters(
            &c,
            &unverified_member(),
            "Classical",
            "600+0",
            Color::White,
            Rated::Rated,
            Publicity::Public,
        )
        .unwrap_err();
        assert_eq!(err, PolicyError::InvalidParameters);
    }

    #[test]
    fn restart_gate_exempts_owner_role() {
        let mut c = collaborators();
        c.restart = Box::new(FixedRestart(Some(true), Some(5)));
        let mut roles = std::collections::HashSet::new();
        roles.insert("owner".to_string());
        let admin = AuthIdentity::Member {
            user_id: lobby_protocol::UserId(1),
            username: "a".into(),
            roles,
            verified: true,
        };
        assert!(check_restart_gate(&c, &admin).is_ok());
        assert_eq!(
            check_restart_gate(&c, &unverified_member()).unwrap_err(),
            PolicyError::Restarting { minutes: Some(5) }
        );
    }

    #[test]
    fn restart_check_failure_denies_creation() {
        let mut c = collaborators();
        c.restart = Box::new(FixedRestart(None, None));
        assert!(matches!(
            check_restart_gate(&c, &unverified_member()),
            Err(PolicyError::Restarting { .. })
        ));
    }
}
