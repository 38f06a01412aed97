// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Wires the lobby's one websocket route, trimmed from `entry_point.rs`'s combined
//! static-file/TLS/plasma/admin server down to what the invite catalogue actually needs: an
//! upgrade handler that bridges an axum websocket to the [`Coordinator`] actor.

use crate::collaborators::Collaborators;
use crate::coordinator::Coordinator;
use crate::observer::{ObserverMessage, ObserverUpdate};
use crate::options::Options;
use actix::prelude::*;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::Method;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use lobby_protocol::{ConnId, LobbyResponse, RawLobbyRequest};
use log::{info, warn};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
struct AppState {
    coordinator: Addr<Coordinator>,
    next_conn_id: Arc<AtomicU64>,
}

#[derive(Deserialize)]
struct WebSocketQuery {
    locale: Option<String>,
}

/// Bridges a [`Recipient<ObserverUpdate<LobbyResponse>>`] to an axum websocket's own send
/// queue. The coordinator only ever sees this actor, never the websocket itself, keeping its
/// mailbox loop free of any I/O.
struct ConnectionActor {
    outbound: mpsc::UnboundedSender<Message>,
}

impl Actor for ConnectionActor {
    type Context = Context<Self>;
}

impl Handler<ObserverUpdate<LobbyResponse>> for ConnectionActor {
    type Result = ();

    fn handle(&mut self, msg: ObserverUpdate<LobbyResponse>, ctx: &mut Self::Context) {
        match msg {
            ObserverUpdate::Send { message } => match serde_json::to_string(&message) {
                Ok(text) => {
                    let _ = self.outbound.send(Message::Text(text));
                }
                Err(err) => warn!("failed to serialize lobby response: {err}"),
            },
            ObserverUpdate::Close => {
                let _ = self.outbound.send(Message::Close(None));
                ctx.stop();
            }
        }
    }
}

/// Starts the lobby: an actix system hosting the [`Coordinator`], with an axum websocket
/// server bridged into it. Blocks until the process is killed, mirroring `entry_point`'s
/// `actix::System::new().block_on(...)` idiom.
pub fn entry_point(options: Options, collaborators: Collaborators) {
    crate::log::init_logger(&options);

    actix::System::new().block_on(async move {
        let grace_window = Duration::from_millis(options.grace_window_ms);
        let coordinator = Coordinator::new(collaborators, grace_window, options.id_generation_attempts).start();

        let state = AppState {
            coordinator,
            next_conn_id: Arc::new(AtomicU64::new(1)),
        };

        let app = Router::new()
            .route("/lobby/ws", get(ws_upgrade))
            .with_state(state)
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_headers(Any)
                    .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS]),
            );

        info!("lobby listening on {}", options.bind_address);
        axum::Server::bind(&options.bind_address)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .expect("lobby websocket server failed");
    });
}

async fn ws_upgrade(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<WebSocketQuery>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(socket, state, addr, query.locale.unwrap_or_else(|| "en".to_string())))
}

async fn handle_socket(socket: WebSocket, state: AppState, addr: SocketAddr, locale: String) {
    let conn = ConnId(state.next_conn_id.fetch_add(1, Ordering::Relaxed));
    info!("{conn} connected from {addr}");

    let (mut sink, mut stream) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
    let recipient = ConnectionActor { outbound: outbound_tx }.start().recipient();

    state.coordinator.do_send(ObserverMessage::Register { conn, observer: recipient, locale });

    let forwarder = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    let mut by_choice = false;
    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<RawLobbyRequest>(&text) {
                Ok(request) => state.coordinator.do_send(ObserverMessage::Request { conn, request }),
                Err(err) => warn!("{conn} sent a malformed lobby frame: {err}"),
            },
            Message::Close(_) => {
                by_choice = true;
                break;
            }
            _ => {}
        }
    }

    forwarder.abort();
    state.coordinator.do_send(ObserverMessage::Unregister { conn, by_choice });
    info!("{conn} disconnected (by_choice={by_choice})");
}
