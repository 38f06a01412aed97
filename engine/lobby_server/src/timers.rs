// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Disconnect-grace timers. Rather than scheduling one actix timer per owner (which needs a
//! cancellation token to survive the cancel-on-reschedule race), this follows `client.rs`'s
//! `prune` idiom: arm a deadline in a map and sweep it on every coordinator tick. A sweep
//! granularity well under the grace window is indistinguishable from a dedicated timer for
//! this use case and has no races to reason about.

use lobby_protocol::IdentityKey;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Default)]
pub struct GraceTimerPool {
    deadlines: HashMap<IdentityKey, Instant>,
}

impl GraceTimerPool {
    /// Arms a timer for `key`, replacing any prior one. Not-by-choice unsubscription is the
    /// only caller of this.
    pub fn arm(&mut self, key: IdentityKey, now: Instant, grace_window: Duration) {
        self.deadlines.insert(key, now + grace_window);
    }

    /// Cancels a timer, e.g. on re-subscription. No-op if none was armed.
    pub fn cancel(&mut self, key: &IdentityKey) {
        self.deadlines.remove(key);
    }

    /// Drains every key whose deadline has passed as of `now`. The caller is responsible
    /// for checking whether the owner still has a live subscription before acting, since a
    /// reconnect can race a sweep.
    pub fn expired(&mut self, now: Instant) -> Vec<IdentityKey> {
        let fired: Vec<IdentityKey> = self
            .deadlines
            .iter()
            .filter(|(_, &deadline)| now >= deadline)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &fired {
            self.deadlines.remove(key);
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_prevents_later_expiry() {
        let mut pool = GraceTimerPool::default();
        let key = IdentityKey::Guest("b1".into());
        let now = Instant::now();
        pool.arm(key.clone(), now, Duration::from_millis(5));
        pool.cancel(&key);
        assert!(pool
            .expired(now + Duration::from_millis(50))
            .is_empty());
    }

    #[test]
    fn rearming_replaces_the_prior_deadline() {
        let mut pool = GraceTimerPool::default();
        let key = IdentityKey::Guest("b1".into());
        let now = Instant::now();
        pool.arm(key.clone(), now, Duration::from_secs(1));
        pool.arm(key.clone(), now, Duration::from_millis(5));
        assert_eq!(pool.expired(now + Duration::from_millis(50)), vec![key]);
    }
}
