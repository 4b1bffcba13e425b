/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Closes a streaming session once the HTTP client has gone away.

use crate::observability::{events, fields};
use crate::session::Session;
use tokio_util::sync::CancellationToken;
use tracing::info;

const COMPONENT: &str = "disconnect_watcher";

/// Waits until either `disconnected` fires or the session terminates on its
/// own. Only the former triggers a close.
pub(crate) async fn watch_disconnect(session: Session, disconnected: CancellationToken) {
    let termination = session.termination_token();

    tokio::select! {
        _ = termination.cancelled() => {}
        _ = disconnected.cancelled() => {
            if session.is_closed() {
                return;
            }
            info!(
                event = events::CLIENT_DISCONNECTED,
                component = COMPONENT,
                request_id = session.request_id(),
                reason = fields::REASON_CLIENT_DISCONNECT,
                "client went away; closing session"
            );
            let _ = session.close(fields::REASON_CLIENT_DISCONNECT).await;
        }
    }
}
