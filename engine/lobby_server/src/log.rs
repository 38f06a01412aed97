// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::options::Options;

pub(crate) fn init_logger(options: &Options) {
    let mut logger = env_logger::builder();
    logger.format_timestamp(None);
    logger.filter_module("lobby_server::coordinator", options.debug_lobby);
    logger.filter_module("lobby_server::router", options.debug_lobby);
    logger.filter_module("lobby_server::entry_point", options.debug_http);
    logger.init();
}
