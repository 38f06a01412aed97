// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The shared invite catalogue. A `Vec` instead of a map keeps broadcast order deterministic;
//! id and owner lookups are linear, which is fine at the lobby cardinalities this is meant
//! for (typically at most hundreds of live invites).

use lobby_protocol::{AuthIdentity, Invite, InviteId, Publicity, SafeInvite};
use rand::Rng;

#[derive(Debug, Eq, PartialEq)]
pub enum StoreError {
    /// `invite.owner` already owns a live invite.
    AlreadyOwnsInvite,
    /// Exhausted the id-generation attempt budget without finding a free id.
    IdSpaceExhausted,
}

#[derive(Default)]
pub struct InviteStore {
    invites: Vec<Invite>,
}

impl InviteStore {
    /// Draws ids from `rng` until one isn't already live, bounding the number of attempts
    /// so a saturated id space fails fast instead of looping forever.
    pub fn generate_id(
        &self,
        rng: &mut impl Rng,
        max_attempts: u32,
    ) -> Result<InviteId, StoreError> {
        for _ in 0..max_attempts {
            let candidate = InviteId::sample(rng);
            if self.find_by_id(candidate).is_none() {
                return Ok(candidate);
            }
        }
        Err(StoreError::IdSpaceExhausted)
    }

    /// Appends `invite`. Rejects a second invite from the same owner; the id itself is
    /// assumed already unique (callers mint it via [`Self::generate_id`]).
    pub fn add(&mut self, invite: Invite) -> Result<(), StoreError> {
        if self.owned_by(&invite.owner) {
            return Err(StoreError::AlreadyOwnsInvite);
        }
        self.invites.push(invite);
        Ok(())
    }

    pub fn remove_by_id(&mut self, id: InviteId) -> Option<Invite> {
        let index = self.invites.iter().position(|i| i.id == id)?;
        Some(self.invites.remove(index))
    }

    /// Removes every invite owned by `identity`, reporting whether any of them was public
    /// (callers use this to decide whether a full rebroadcast is owed).
    pub fn remove_by_owner(&mut self, identity: &AuthIdentity) -> (Vec<Invite>, bool) {
        let mut removed = Vec::new();
        let mut public_deleted = false;
        self.invites.retain(|invite| {
            if &invite.owner == identity {
                public_deleted |= invite.publicity == Publicity::Public;
                removed.push(invite.clone());
                false
            } else {
                true
            }
        });
        (removed, public_deleted)
    }

    pub fn find_by_id(&self, id: InviteId) -> Option<&Invite> {
        self.invites.iter().find(|i| i.id == id)
    }

    pub fn owned_by(&self, identity: &AuthIdentity) -> bool {
        self.invites.iter().any(|i| &i.owner == identity)
    }

    pub fn public_snapshot(&self) -> Vec<SafeInvite> {
        self.invites
            .iter()
            .filter(|i| i.publicity == Publicity::Public)
            .map(Invite::sanitize)
            .collect()
    }

    pub fn private_owned_by(&self, identity: &AuthIdentity) -> Vec<SafeInvite> {
        self.invites
            .iter()
            .filter(|i| i.publicity == Publicity::Private && &i.owner == identity)
            .map(Invite::sanitize)
            .collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.invites.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobby_protocol::{Color, Rated, Tag, UsernameContainer};
    use std::collections::HashSet;

    fn guest(id: &str) -> AuthIdentity {
        AuthIdentity::Guest {
            browser_id: id.to_string(),
        }
    }

    fn invite(id: &str, owner: AuthIdentity, publicity: Publicity) -> Invite {
        Invite {
            id: InviteId::parse(id).unwrap(),
            owner,
            username_container: UsernameContainer::Guest {
                username: "guest".into(),
            },
            tag: Tag::parse("AAAAAAAA").unwrap(),
            variant: "Classical".into(),
            clock: "600+0".into(),
            color: Color::Neutral,
            rated: Rated::Casual,
            publicity,
        }
    }

    #[test]
    fn rejects_second_invite_from_same_owner() {
        let mut store = InviteStore::default();
        store
            .add(invite("aaaaa", guest("b1"), Publicity::Public))
            .unwrap();
        let err = store
            .add(invite("bbbbb", guest("b1"), Publicity::Public))
            .unwrap_err();
        assert_eq!(err, StoreError::AlreadyOwnsInvite);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn public_snapshot_excludes_private() {
        let mut store = InviteStore::default();
        store
            .add(invite("aaaaa", guest("b1"), Publicity::Public))
            .unwrap();
        store
            .add(invite("bbbbb", guest("b2"), Publicity::Private))
            .unwrap();
        assert_eq!(store.public_snapshot().len(), 1);
        assert_eq!(store.private_owned_by(&guest("b2")).len(), 1);
        assert_eq!(store.private_owned_by(&guest("b1")).len(), 0);
    }

    #[test]
    fn remove_by_owner_reports_public_deleted() {
        let mut store = InviteStore::default();
        store
            .add(invite("aaaaa", guest("b1"), Publicity::Private))
            .unwrap();
        let (removed, public_deleted) = store.remove_by_owner(&guest("b1"));
        assert_eq!(removed.len(), 1);
        assert!(!public_deleted);
    }

    #[test]
    fn generate_id_avoids_live_collisions() {
        let mut store = InviteStore::default();
        let mut rng = rand::thread_rng();
        let mut seen = HashSet::new();
        for i in 0..20 {
            let id = store.generate_id(&mut rng, 64).unwrap();
            assert!(seen.insert(id));
            store
                .add(invite(id.as_str(), guest(&i.to_string()), Publicity::Public))
                .unwrap();
        }
    }
}
