// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use log::LevelFilter;
use std::net::SocketAddr;
use structopt::StructOpt;

/// Lobby server options, to be specified as arguments.
#[derive(Debug, StructOpt)]
pub struct Options {
    /// Address to bind the websocket listener to.
    #[structopt(long, default_value = "0.0.0.0:8080")]
    pub bind_address: SocketAddr,
    /// How long a disconnected owner's invites survive before grace-timer cleanup, in
    /// milliseconds.
    #[structopt(long, default_value = "5000")]
    pub grace_window_ms: u64,
    /// How many random ids the store will draw before giving up on a create.
    #[structopt(long, default_value = "64")]
    pub id_generation_attempts: u32,
    /// Log lobby diagnostics.
    #[cfg_attr(debug_assertions, structopt(long, default_value = "info"))]
    #[cfg_attr(not(debug_assertions), structopt(long, default_value = "warn"))]
    pub debug_lobby: LevelFilter,
    /// Log incoming HTTP/websocket upgrade requests.
    #[cfg_attr(debug_assertions, structopt(long, default_value = "warn"))]
    #[cfg_attr(not(debug_assertions), structopt(long, default_value = "error"))]
    pub debug_http: LevelFilter,
}
