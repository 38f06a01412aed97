// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Dispatches the lobby's three commands plus subscribe/unsubscribe. Each handler takes the
//! already-resolved caller identity (the coordinator resolves it
//! from the subscriber registry, or from the identity provider for `subscribe` itself) and
//! returns every outbound message the command produced, addressed by `ConnId`. Handlers never
//! touch a transport handle directly, which is what makes them testable without actix.

use crate::broadcast::snapshot_for;
use crate::collaborators::Collaborators;
use crate::policy::{
    check_accept_rating_eligibility, check_not_in_active_game, check_not_self_accept,
    check_owner_matches, check_restart_gate, validate_invite_parameters, PolicyError,
};
use crate::state::LobbyState;
use lobby_protocol::{
    AcceptInviteParams, AuthIdentity, ConnId, CreateInviteParams, Invite, InviteId, LobbyResponse,
    NotifyArgs, Publicity, UsernameContainer,
};
use rand::Rng;
use std::time::{Duration, Instant};

type Outbox = Vec<(ConnId, LobbyResponse)>;

fn notify(
    collaborators: &Collaborators,
    locale: &str,
    key: &str,
    custom_number: Option<u32>,
    reply_to: Option<u32>,
) -> LobbyResponse {
    LobbyResponse::Notify {
        value: collaborators.translator.translate(key, locale),
        args: (custom_number.is_some() || reply_to.is_some())
            .then(|| NotifyArgs { custom_number, reply_to }),
    }
}

fn print_error(
    collaborators: &Collaborators,
    locale: &str,
    key: &str,
    reply_to: Option<u32>,
) -> LobbyResponse {
    LobbyResponse::PrintError {
        value: collaborators.translator.translate(key, locale),
        reply_to,
    }
}

/// A guest has no account-derived username; the identity provider hands the lobby only a
/// `browser_id`, so the catalogue shows a short, stable tag derived from it rather than a
/// raw cookie value.
fn guest_display_name(browser_id: &str) -> String {
    let tail: String = browser_id.chars().rev().take(4).collect::<String>().chars().rev().collect();
    format!("Guest-{}", tail.to_uppercase())
}

fn username_container_for(
    identity: &AuthIdentity,
    variant: &str,
    collaborators: &Collaborators,
) -> UsernameContainer {
    match identity {
        AuthIdentity::Member { username, user_id, .. } => {
            // A variant with no dedicated leaderboard still gets a displayed rating, looked
            // up on the pooled "INFINITY" leaderboard rather than omitted outright.
            let leaderboard = collaborators
                .variants
                .leaderboard_for(variant)
                .unwrap_or_else(|| collaborators.variants.default_leaderboard());
            UsernameContainer::Player {
                username: username.clone(),
                rating: collaborators.ratings.rating(user_id.0, leaderboard),
            }
        }
        AuthIdentity::Guest { browser_id } => UsernameContainer::Guest {
            username: guest_display_name(browser_id),
        },
    }
}

/// Sends every currently-subscribed connection its own view of the catalogue. Correct for
/// both "a public invite changed" and "only the game count changed", since a subscriber's
/// snapshot always carries the current game count regardless of why it was sent.
fn broadcast_all(
    state: &LobbyState,
    collaborators: &Collaborators,
    triggering_conn: Option<ConnId>,
    reply_to: Option<u32>,
) -> Outbox {
    state
        .subscribers
        .all()
        .map(|(conn, subscription)| {
            let rt = if Some(conn) == triggering_conn { reply_to } else { None };
            (conn, snapshot_for(&state.store, subscription, collaborators, rt))
        })
        .collect()
}

pub fn handle_subscribe(
    state: &mut LobbyState,
    collaborators: &Collaborators,
    conn: ConnId,
    identity: AuthIdentity,
    locale: String,
) -> Outbox {
    let key = identity.key();
    if state.subscribers.get(conn).is_some() {
        // Double-subscribe by the same connection: state is left unchanged and the caller
        // is expected to log this as a protocol violation.
        return Vec::new();
    }
    state
        .subscribers
        .add(conn, identity, locale)
        .expect("checked above");
    state.timers.cancel(&key);
    let subscription = state.subscribers.get(conn).expect("just inserted");
    vec![(conn, snapshot_for(&state.store, subscription, collaborators, None))]
}

pub fn handle_unsubscribe(
    state: &mut LobbyState,
    collaborators: &Collaborators,
    conn: ConnId,
    by_choice: bool,
    grace_window: Duration,
    now: Instant,
) -> Outbox {
    let Some(subscription) = state.subscribers.remove(conn) else {
        return Vec::new();
    };
    if by_choice {
        let (_, public_deleted) = state.store.remove_by_owner(&subscription.identity);
        if public_deleted {
            return broadcast_all(state, collaborators, None, None);
        }
    } else {
        state.timers.arm(subscription.identity.key(), now, grace_window);
    }
    Vec::new()
}

/// Sweeps fired grace timers, dropping each expired owner's invites iff they have no other
/// live connection subscribed. Called once per coordinator tick.
pub fn sweep_grace_timers(state: &mut LobbyState, collaborators: &Collaborators, now: Instant) -> Outbox {
    let fired = state.timers.expired(now);
    let mut any_public_deleted = false;
    for key in fired {
        if state.subscribers.any_for(&key) {
            continue;
        }
        // No connection is subscribed under this key (that's why the timer fired), so the
        // only way to drive `remove_by_owner`'s identity equality check is to rebuild an
        // `AuthIdentity` from the key itself.
        let identity = identity_key_placeholder(&key);
        let (_, public_deleted) = state.store.remove_by_owner(&identity);
        any_public_deleted |= public_deleted;
    }
    if any_public_deleted {
        broadcast_all(state, collaborators, None, None)
    } else {
        Vec::new()
    }
}


fn identity_key_placeholder(key: &lobby_protocol::IdentityKey) -> AuthIdentity {
    match key {
        lobby_protocol::IdentityKey::Member(user_id) => AuthIdentity::Member {
            user_id: *user_id,
            username: String::new(),
            roles: Default::default(),
            verified: false,
        },
        lobby_protocol::IdentityKey::Guest(browser_id) => AuthIdentity::Guest {
            browser_id: browser_id.clone(),
        },
    }
}

#[allow(clippy::too_many_arguments)]
pub fn handle_create_invite(
    state: &mut LobbyState,
    collaborators: &Collaborators,
    conn: ConnId,
    identity: &AuthIdentity,
    locale: &str,
    params: CreateInviteParams,
    reply_to: u32,
    rng: &mut impl Rng,
    id_generation_attempts: u32,
) -> Outbox {
    if check_not_in_active_game(collaborators, identity).is_err() {
        return vec![(conn, notify(collaborators, locale, "alreadyInGame", None, Some(reply_to)))];
    }
    if state.store.owned_by(identity) {
        return vec![(
            conn,
            print_error(collaborators, locale, "alreadyHaveInvite", Some(reply_to)),
        )];
    }
    if let Err(PolicyError::Restarting { minutes }) = check_restart_gate(collaborators, identity) {
        return vec![(conn, notify(collaborators, locale, "serverRestarting", minutes, Some(reply_to)))];
    }
    match validate_invite_parameters(
        collaborators,
        identity,
        &params.variant,
        &params.clock,
        params.color,
        params.rated,
        params.publicity,
    ) {
        Err(PolicyError::VerificationNeeded) => {
            return vec![(conn, notify(collaborators, locale, "verificationNeeded", None, Some(reply_to)))]
        }
        Err(_) => {
            return vec![(
                conn,
                print_error(collaborators, locale, "invalidInviteParameters", Some(reply_to)),
            )]
        }
        Ok(()) => {}
    }

    let username_container = username_container_for(identity, &params.variant, collaborators);
    let id = match state.store.generate_id(rng, id_generation_attempts) {
        Ok(id) => id,
        Err(_) => {
            return vec![(
                conn,
                print_error(collaborators, locale, "idSpaceExhausted", Some(reply_to)),
            )]
        }
    };
    let publicity = params.publicity;
    let invite = Invite {
        id,
        owner: identity.clone(),
        username_container,
        tag: params.tag,
        variant: params.variant,
        clock: params.clock,
        color: params.color,
        rated: params.rated,
        publicity,
    };
    state.store.add(invite).expect("owner uniqueness checked above");

    if publicity == Publicity::Public {
        broadcast_all(state, collaborators, Some(conn), Some(reply_to))
    } else {
        let subscription = state.subscribers.get(conn);
        match subscription {
            Some(subscription) => vec![(
                conn,
                snapshot_for(&state.store, subscription, collaborators, Some(reply_to)),
            )],
            None => Vec::new(),
        }
    }
}

pub fn handle_cancel_invite(
    state: &mut LobbyState,
    collaborators: &Collaborators,
    conn: ConnId,
    identity: &AuthIdentity,
    locale: &str,
    id: InviteId,
    reply_to: u32,
) -> Outbox {
    let Some(invite) = state.store.find_by_id(id) else {
        return vec![(conn, LobbyResponse::Ack { reply_to })];
    };
    if check_owner_matches(invite, identity).is_err() {
        return vec![(conn, print_error(collaborators, locale, "forbidden", Some(reply_to)))];
    }
    let publicity = invite.publicity;
    state.store.remove_by_id(id);

    if publicity == Publicity::Public {
        broadcast_all(state, collaborators, Some(conn), Some(reply_to))
    } else {
        match state.subscribers.get(conn) {
            Some(subscription) => vec![(
                conn,
                snapshot_for(&state.store, subscription, collaborators, Some(reply_to)),
            )],
            None => Vec::new(),
        }
    }
}

pub fn handle_accept_invite(
    state: &mut LobbyState,
    collaborators: &Collaborators,
    conn: ConnId,
    identity: &AuthIdentity,
    locale: &str,
    params: AcceptInviteParams,
    reply_to: u32,
) -> Outbox {
    if check_not_in_active_game(collaborators, identity).is_err() {
        return vec![(conn, notify(collaborators, locale, "alreadyInGame", None, Some(reply_to)))];
    }
    let Some(invite) = state.store.find_by_id(params.id).cloned() else {
        let key = if params.is_private { "invalidCode" } else { "gameAborted" };
        return vec![(conn, notify(collaborators, locale, key, None, Some(reply_to)))];
    };
    if check_not_self_accept(&invite, identity).is_err() {
        return vec![(
            conn,
            print_error(collaborators, locale, "cannotAcceptOwnInvite", Some(reply_to)),
        )];
    }
    if check_accept_rating_eligibility(&invite, identity).is_err() {
        return vec![(conn, notify(collaborators, locale, "verificationNeeded", None, Some(reply_to)))];
    }

    state.store.remove_by_id(invite.id);
    let (_, accepter_public_deleted) = state.store.remove_by_owner(identity);

    let owner_key = invite.owner.key();
    let owner_conn = state.subscribers.find_for(&owner_key);
    state.subscribers.remove(conn);
    if let Some(owner_conn) = owner_conn {
        state.subscribers.remove(owner_conn);
    }
    state.timers.cancel(&owner_key);
    state.timers.cancel(&identity.key());

    let public_involved = invite.publicity == Publicity::Public || accepter_public_deleted;
    collaborators.games.create_game(invite, owner_conn, conn, Some(reply_to));

    // Either branch re-broadcasts the full snapshot (which always carries the current game
    // count); `public_involved` only names the two reasons a rebroadcast is owed here, it
    // doesn't change what gets sent.
    let _ = public_involved;
    broadcast_all(state, collaborators, None, None)
}
