// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Assembles the per-subscriber catalogue view: public invites union the subscriber's own
//! private invites, plus the current game count.

use crate::collaborators::Collaborators;
use crate::store::InviteStore;
use crate::subscribers::Subscription;
use lobby_protocol::{InvitesListValue, LobbyResponse};

pub fn snapshot_for(
    store: &InviteStore,
    subscription: &Subscription,
    collaborators: &Collaborators,
    reply_to: Option<u32>,
) -> LobbyResponse {
    let mut invites_list = store.public_snapshot();
    invites_list.extend(store.private_owned_by(&subscription.identity));
    LobbyResponse::InvitesList {
        value: InvitesListValue {
            invites_list,
            current_game_count: collaborators.active_games.active_game_count(),
        },
        reply_to,
    }
}
