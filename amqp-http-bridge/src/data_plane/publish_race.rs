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

//! Publish followed by a bounded wait for a return notification.

use crate::broker::{OutboundMessage, PublishSignal};
use crate::error::{BridgeError, BrokerError};
use crate::observability::events;
use crate::session::Session;
use std::time::Duration;
use tracing::{debug, info, warn};

const COMPONENT: &str = "publish_race";
const NACKED_TEXT: &str = "message nacked by broker";

/// Verdict of one publish race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The broker confirmed the message and early acceptance is enabled.
    Accepted,
    /// The broker returned the message as unroutable.
    Rejected(String),
    /// Nothing decisive arrived inside the window.
    TimedOutAsAccepted,
}

impl PublishOutcome {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, PublishOutcome::Rejected(_))
    }
}

/// Publishes `message` and races the broker's return notification against
/// `window`.
///
/// The window starts once the publish call itself has returned. A nack inside
/// the window fails the publish. A return that arrives after the window is
/// lost; the caller has already been told the message was accepted. A positive
/// confirmation ends the race early only when `accept_on_confirm` is set,
/// otherwise the full window is waited out.
pub async fn publish_and_confirm(
    session: &Session,
    message: OutboundMessage,
    window: Duration,
    accept_on_confirm: bool,
) -> Result<PublishOutcome, BridgeError> {
    let request_id = session.request_id();
    let exchange = message.exchange.clone();
    let routing_key = message.routing_key.clone();
    let signal = match session.channel().publish(message).await {
        Ok(signal) => signal,
        Err(err) => {
            warn!(
                event = events::PUBLISH_FAILED,
                component = COMPONENT,
                request_id,
                exchange = exchange.as_str(),
                routing_key = routing_key.as_str(),
                err = %err,
                "broker refused publish"
            );
            return Err(BridgeError::PublishFailed(err));
        }
    };

    debug!(
        event = events::PUBLISH_SENT,
        component = COMPONENT,
        request_id,
        exchange = exchange.as_str(),
        routing_key = routing_key.as_str(),
        window_ms = window.as_millis() as u64,
        "message handed to broker"
    );

    // The window opens once the broker has taken the message.
    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);

    let outcome = tokio::select! {
        signal = signal => match signal {
            PublishSignal::Returned { reply_code, reply_text } => {
                info!(
                    event = events::PUBLISH_REJECTED,
                    component = COMPONENT,
                    request_id,
                    exchange = exchange.as_str(),
                    routing_key = routing_key.as_str(),
                    reply_code,
                    reply_text = reply_text.as_str(),
                    "broker returned message"
                );
                PublishOutcome::Rejected(reply_text)
            }
            PublishSignal::Nacked => {
                warn!(
                    event = events::PUBLISH_NACKED,
                    component = COMPONENT,
                    request_id,
                    exchange = exchange.as_str(),
                    routing_key = routing_key.as_str(),
                    "broker nacked message"
                );
                return Err(BridgeError::PublishFailed(BrokerError::new(NACKED_TEXT)));
            }
            PublishSignal::Confirmed if accept_on_confirm => {
                debug!(
                    event = events::PUBLISH_CONFIRMED,
                    component = COMPONENT,
                    request_id,
                    "broker confirmed message"
                );
                PublishOutcome::Accepted
            }
            PublishSignal::Confirmed => {
                debug!(
                    event = events::PUBLISH_CONFIRM_IGNORED,
                    component = COMPONENT,
                    request_id,
                    "confirmation received; waiting out the window"
                );
                // The signal resolves at most once, so only the deadline is left.
                (&mut deadline).await;
                PublishOutcome::TimedOutAsAccepted
            }
        },
        _ = &mut deadline => {
            debug!(
                event = events::PUBLISH_WINDOW_ELAPSED,
                component = COMPONENT,
                request_id,
                "no return notification inside the window"
            );
            PublishOutcome::TimedOutAsAccepted
        }
    };

    Ok(outcome)
}
