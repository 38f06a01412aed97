// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The message pair that connects a transport-layer connection actor to the coordinator,
//! generalized from `server_util`'s `observer.rs`. `ObserverMessage` flows coordinator-ward
//! (register/unregister/request); `ObserverUpdate` flows back out to the connection's own
//! send queue, so the coordinator never blocks on a slow client.

use actix::prelude::*;
use lobby_protocol::ConnId;

/// `conn` is minted by the transport layer when the socket is accepted and threaded through
/// every message for that connection's lifetime; the coordinator never has to recover it by
/// comparing `Recipient`s.
#[derive(Message)]
#[rtype(result = "()")]
pub enum ObserverMessage<I, O>
where
    O: Message + Send,
    O::Result: Send,
{
    Register {
        conn: ConnId,
        observer: Recipient<ObserverUpdate<O>>,
        locale: String,
    },
    Unregister {
        conn: ConnId,
        /// `true` for a deliberate client-initiated disconnect (e.g. a clean websocket
        /// close frame); `false` for anything that looks like a network drop.
        by_choice: bool,
    },
    Request {
        conn: ConnId,
        request: I,
    },
}

#[derive(Message)]
#[rtype(result = "()")]
pub enum ObserverUpdate<O>
where
    O: Message + Send,
    O::Result: Send,
{
    Close,
    Send { message: O },
}
