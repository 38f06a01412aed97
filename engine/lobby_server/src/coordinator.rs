// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The single actix actor that owns [`LobbyState`], the direct analog of `infrastructure.rs`'s
//! `Infrastructure<G>`. Every mutation of the invite store, subscriber registry, and grace
//! timer pool happens inside this actor's mailbox loop, which serializes all lobby state
//! changes for free: actix guarantees a `Context`'s handlers never interleave.

use crate::collaborators::Collaborators;
use crate::observer::{ObserverMessage, ObserverUpdate};
use crate::router::{
    handle_accept_invite, handle_cancel_invite, handle_create_invite, handle_subscribe,
    handle_unsubscribe, sweep_grace_timers,
};
use crate::state::LobbyState;
use actix::prelude::*;
use lobby_protocol::{ConnId, LobbyRequest, LobbyResponse, RawLobbyRequest};
use log::{info, warn};
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub type LobbyObserverMessage = ObserverMessage<RawLobbyRequest, LobbyResponse>;

pub struct Coordinator {
    state: LobbyState,
    collaborators: Collaborators,
    recipients: HashMap<ConnId, Recipient<ObserverUpdate<LobbyResponse>>>,
    grace_window: Duration,
    id_generation_attempts: u32,
}

impl Coordinator {
    pub fn new(collaborators: Collaborators, grace_window: Duration, id_generation_attempts: u32) -> Self {
        Self {
            state: LobbyState::default(),
            collaborators,
            recipients: HashMap::new(),
            grace_window,
            id_generation_attempts,
        }
    }

    fn dispatch(&mut self, outbox: Vec<(ConnId, LobbyResponse)>) {
        for (conn, message) in outbox {
            if let Some(recipient) = self.recipients.get(&conn) {
                let _ = recipient.do_send(ObserverUpdate::Send { message });
            }
        }
    }

    fn sweep(&mut self, _ctx: &mut Context<Self>) {
        let outbox = sweep_grace_timers(&mut self.state, &self.collaborators, Instant::now());
        self.dispatch(outbox);
    }

    fn locale_of(&self, conn: ConnId) -> String {
        self.state
            .subscribers
            .get(conn)
            .map(|s| s.locale.clone())
            .unwrap_or_else(|| "en".to_string())
    }
}

impl Actor for Coordinator {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("lobby coordinator started");
        ctx.run_interval(Duration::from_millis(250), Self::sweep);
    }
}

impl Handler<LobbyObserverMessage> for Coordinator {
    type Result = ();

    fn handle(&mut self, msg: LobbyObserverMessage, _ctx: &mut Context<Self>) {
        match msg {
            ObserverMessage::Register { conn, observer, locale } => {
                self.recipients.insert(conn, observer);
                let identity = self.collaborators.identity.identity_of(conn);
                let outbox = handle_subscribe(&mut self.state, &self.collaborators, conn, identity, locale);
                self.dispatch(outbox);
            }
            ObserverMessage::Unregister { conn, by_choice } => {
                self.recipients.remove(&conn);
                let outbox = handle_unsubscribe(
                    &mut self.state,
                    &self.collaborators,
                    conn,
                    by_choice,
                    self.grace_window,
                    Instant::now(),
                );
                self.dispatch(outbox);
            }
            ObserverMessage::Request { conn, request } => {
                let (request, reply_to) = match LobbyRequest::parse(request) {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        warn!("malformed lobby request from {conn}: {err}");
                        return;
                    }
                };
                let Some(identity) = self
                    .state
                    .subscribers
                    .get(conn)
                    .map(|s| s.identity.clone())
                else {
                    warn!("lobby command from unsubscribed connection {conn}");
                    return;
                };
                let locale = self.locale_of(conn);
                let outbox = match request {
                    LobbyRequest::CreateInvite(params) => {
                        let mut rng = rand::thread_rng();
                        handle_create_invite(
                            &mut self.state,
                            &self.collaborators,
                            conn,
                            &identity,
                            &locale,
                            params,
                            reply_to,
                            &mut rng,
                            self.id_generation_attempts,
                        )
                    }
                    LobbyRequest::CancelInvite(id) => handle_cancel_invite(
                        &mut self.state,
                        &self.collaborators,
                        conn,
                        &identity,
                        &locale,
                        id,
                        reply_to,
                    ),
                    LobbyRequest::AcceptInvite(params) => handle_accept_invite(
                        &mut self.state,
                        &self.collaborators,
                        conn,
                        &identity,
                        &locale,
                        params,
                        reply_to,
                    ),
                };
                self.dispatch(outbox);
            }
        }
    }
}
