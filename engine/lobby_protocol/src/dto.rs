// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::id::{IdentityKey, InviteId, Tag, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Who is connected. Produced by the identity service, never by the lobby itself.
///
/// Equality (and the derived [`IdentityKey`]) treats a `Member` and a `Guest` as distinct
/// owners even if their underlying transport cookie happens to coincide; only two `Member`s
/// with the same `user_id`, or two `Guest`s with the same `browser_id`, are the same owner.
#[derive(Clone, Debug)]
pub enum AuthIdentity {
    Member {
        user_id: UserId,
        username: String,
        roles: HashSet<String>,
        verified: bool,
    },
    Guest {
        browser_id: String,
    },
}

impl AuthIdentity {
    pub fn key(&self) -> IdentityKey {
        match self {
            AuthIdentity::Member { user_id, .. } => IdentityKey::Member(*user_id),
            AuthIdentity::Guest { browser_id } => IdentityKey::Guest(browser_id.clone()),
        }
    }

    pub fn is_member(&self) -> bool {
        matches!(self, AuthIdentity::Member { .. })
    }

    pub fn is_verified_member(&self) -> bool {
        matches!(self, AuthIdentity::Member { verified: true, .. })
    }

    pub fn has_role(&self, role: &str) -> bool {
        matches!(self, AuthIdentity::Member { roles, .. } if roles.contains(role))
    }
}

impl PartialEq for AuthIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for AuthIdentity {}

/// Which color the owner will play, chosen at creation time.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Color {
    White,
    Black,
    Neutral,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rated {
    Casual,
    Rated,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Publicity {
    Public,
    Private,
}

/// Displayable identity of an invite's owner, resolved once at creation time so that a
/// later rating change (or username change) doesn't retroactively rewrite a standing offer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UsernameContainer {
    Player {
        username: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        rating: Option<u32>,
    },
    Guest {
        username: String,
    },
}

/// A standing offer to start a game.
#[derive(Clone, Debug)]
pub struct Invite {
    pub id: InviteId,
    pub owner: AuthIdentity,
    pub username_container: UsernameContainer,
    pub tag: Tag,
    pub variant: String,
    pub clock: String,
    pub color: Color,
    pub rated: Rated,
    pub publicity: Publicity,
}

impl Invite {
    /// Strips owner-identifying fields, producing the projection broadcast to peers.
    pub fn sanitize(&self) -> SafeInvite {
        SafeInvite {
            id: self.id,
            username_container: self.username_container.clone(),
            tag: self.tag,
            variant: self.variant.clone(),
            clock: self.clock.clone(),
            color: self.color,
            rated: self.rated,
            publicity: self.publicity,
        }
    }
}

/// [`Invite`] with `owner` removed: the only form ever sent to anyone but the owner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SafeInvite {
    pub id: InviteId,
    #[serde(rename = "user")]
    pub username_container: UsernameContainer,
    pub tag: Tag,
    pub variant: String,
    pub clock: String,
    pub color: Color,
    pub rated: Rated,
    pub publicity: Publicity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_and_guests_are_never_equal_even_with_overlapping_ids() {
        let member = AuthIdentity::Member {
            user_id: UserId(7),
            username: "abc".into(),
            roles: HashSet::new(),
            verified: true,
        };
        let guest = AuthIdentity::Guest {
            browser_id: "7".into(),
        };
        assert_ne!(member, guest);
    }

    #[test]
    fn same_user_id_is_equal_regardless_of_other_fields() {
        let a = AuthIdentity::Member {
            user_id: UserId(7),
            username: "abc".into(),
            roles: HashSet::new(),
            verified: true,
        };
        let b = AuthIdentity::Member {
            user_id: UserId(7),
            username: "different".into(),
            roles: HashSet::from(["owner".to_string()]),
            verified: false,
        };
        assert_eq!(a, b);
    }
}
