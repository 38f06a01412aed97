// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use arrayvec::ArrayString;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Alphabet invite ids and variant/leaderboard identifiers are drawn from.
pub const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Unique id of a live invite: 5 base36 characters, e.g. `"a3f9k"`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteId(ArrayString<5>);

impl InviteId {
    pub const LEN: usize = 5;

    /// Builds an id from an already-validated string. Returns `None` if `s` isn't
    /// exactly [`Self::LEN`] lowercase-base36 characters.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != Self::LEN || !s.bytes().all(|b| BASE36_ALPHABET.contains(&b)) {
            return None;
        }
        ArrayString::from(s).ok().map(Self)
    }

    /// Draws a fresh id from `rng`. Never fails; collision-checking is the caller's job.
    pub fn sample(rng: &mut impl rand::Rng) -> Self {
        let mut s = ArrayString::<5>::new();
        for _ in 0..Self::LEN {
            let c = BASE36_ALPHABET[rng.gen_range(0..BASE36_ALPHABET.len())];
            s.push(c as char);
        }
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for InviteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for InviteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for InviteId {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or("invalid invite id")
    }
}

/// Opaque, client-chosen correlation token carried on a create request and echoed back
/// on the created invite. Exactly 8 characters; never interpreted by the server.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(ArrayString<8>);

impl Tag {
    pub const LEN: usize = 8;

    pub fn parse(s: &str) -> Option<Self> {
        if s.chars().count() != Self::LEN {
            return None;
        }
        ArrayString::from(s).ok().map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Opaque member id, assigned by the identity service.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct UserId(pub u32);

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Id of a rating leaderboard a variant is scored on.
/// A variant with no ranked leaderboard (e.g. a chess960-style untimed variant) maps to `None`
/// rather than to this type.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct LeaderboardId(pub u16);

/// The stable key used to index invites, subscriptions, and grace timers by owner.
///
/// Two `AuthIdentity::Guest`s that happen to share a `browser_id` are the same owner; a
/// `Guest` and a `Member` never compare equal even if transport-layer metadata overlaps.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum IdentityKey {
    Member(UserId),
    Guest(String),
}

impl Display for IdentityKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Member(id) => write!(f, "member:{id}"),
            IdentityKey::Guest(browser_id) => write!(f, "guest:{browser_id}"),
        }
    }
}

/// A connection id, minted by the transport layer when a socket is accepted.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct ConnId(pub u64);

impl Display for ConnId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_id_parse_roundtrip() {
        let id = InviteId::parse("a3f9k").unwrap();
        assert_eq!(id.as_str(), "a3f9k");
        assert_eq!(id.to_string(), "a3f9k");
    }

    #[test]
    fn invite_id_rejects_wrong_length_or_alphabet() {
        assert!(InviteId::parse("a3f9").is_none());
        assert!(InviteId::parse("a3f9kk").is_none());
        assert!(InviteId::parse("A3F9K").is_none());
        assert!(InviteId::parse("a3f-k").is_none());
    }

    #[test]
    fn tag_parse_enforces_exact_length() {
        assert!(Tag::parse("AAAAAAAA").is_some());
        assert!(Tag::parse("AAAAAAA").is_none());
        assert!(Tag::parse("AAAAAAAAA").is_none());
    }

    #[test]
    fn guest_and_member_keys_never_collide() {
        let guest = IdentityKey::Guest("123".to_string());
        let member = IdentityKey::Member(UserId(123));
        assert_ne!(guest, member);
    }
}
