// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tracks which connections are watching the lobby. Indexed primarily by `ConnId` (one entry
//! per live websocket); a secondary scan by `IdentityKey`
//! answers "does this owner still have a connection subscribed", which is all the grace
//! timer and hand-off logic ever need.

use lobby_protocol::{AuthIdentity, ConnId, IdentityKey};
use std::collections::HashMap;

pub struct Subscription {
    pub identity: AuthIdentity,
    pub locale: String,
}

#[derive(Default)]
pub struct SubscriberRegistry {
    subscriptions: HashMap<ConnId, Subscription>,
}

impl SubscriberRegistry {
    /// Adds `conn` as a subscriber. Refuses a double-add: this is a programming-error
    /// signal, not a recoverable protocol error.
    pub fn add(&mut self, conn: ConnId, identity: AuthIdentity, locale: String) -> Result<(), &'static str> {
        if self.subscriptions.contains_key(&conn) {
            return Err("connection already subscribed");
        }
        self.subscriptions.insert(conn, Subscription { identity, locale });
        Ok(())
    }

    pub fn remove(&mut self, conn: ConnId) -> Option<Subscription> {
        self.subscriptions.remove(&conn)
    }

    pub fn get(&self, conn: ConnId) -> Option<&Subscription> {
        self.subscriptions.get(&conn)
    }

    pub fn all(&self) -> impl Iterator<Item = (ConnId, &Subscription)> {
        self.subscriptions.iter().map(|(&conn, sub)| (conn, sub))
    }

    pub fn any_for(&self, key: &IdentityKey) -> bool {
        self.subscriptions.values().any(|sub| &sub.identity.key() == key)
    }

    pub fn find_for(&self, key: &IdentityKey) -> Option<ConnId> {
        self.subscriptions
            .iter()
            .find(|(_, sub)| &sub.identity.key() == key)
            .map(|(&conn, _)| conn)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest(id: &str) -> AuthIdentity {
        AuthIdentity::Guest {
            browser_id: id.to_string(),
        }
    }

    #[test]
    fn double_add_is_rejected() {
        let mut registry = SubscriberRegistry::default();
        registry.add(ConnId(1), guest("b1"), "en".into()).unwrap();
        assert!(registry.add(ConnId(1), guest("b1"), "en".into()).is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn any_for_reflects_live_subscriptions() {
        let mut registry = SubscriberRegistry::default();
        let key = guest("b1").key();
        assert!(!registry.any_for(&key));
        registry.add(ConnId(1), guest("b1"), "en".into()).unwrap();
        assert!(registry.any_for(&key));
        registry.remove(ConnId(1));
        assert!(!registry.any_for(&key));
    }
}
