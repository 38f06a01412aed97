// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Bundles the lobby's only shared mutable state, mirroring how `context.rs` bundles a
//! `GameArenaService`'s repos. The invite store, subscriber registry, and grace timer pool
//! must be mutated under a single serialization point; this struct is that point's owned
//! state.

use crate::store::InviteStore;
use crate::subscribers::SubscriberRegistry;
use crate::timers::GraceTimerPool;

#[derive(Default)]
pub struct LobbyState {
    pub store: InviteStore,
    pub subscribers: SubscriberRegistry,
    pub timers: GraceTimerPool,
}
