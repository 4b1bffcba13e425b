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

//! Per-queue task that moves delivery bodies into the shared fan-in channel.

use crate::broker::DeliveryStream;
use crate::observability::{events, fields};
use crate::session::Session;
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc::Sender;
use tracing::{debug, info, warn};

const COMPONENT: &str = "queue_forwarder";

/// One subscribed queue and the consumer stream opened on it.
pub(crate) struct QueueForwarder {
    queue: String,
    deliveries: DeliveryStream,
    session: Session,
    output: Sender<Bytes>,
}

impl QueueForwarder {
    pub(crate) fn new(
        queue: String,
        deliveries: DeliveryStream,
        session: Session,
        output: Sender<Bytes>,
    ) -> Self {
        Self {
            queue,
            deliveries,
            session,
            output,
        }
    }

    /// Forwards deliveries in broker order until the session terminates, the
    /// output side goes away, or the broker ends the delivery stream.
    ///
    /// An ended or failed delivery stream closes the whole session, which in
    /// turn stops every sibling forwarder.
    pub(crate) async fn run(mut self) {
        let request_id = self.session.request_id().to_string();
        let termination = self.session.termination_token();

        debug!(
            event = events::FORWARDER_START,
            component = COMPONENT,
            request_id = request_id.as_str(),
            queue = self.queue.as_str(),
            "forwarder started"
        );

        loop {
            let next = tokio::select! {
                _ = termination.cancelled() => {
                    debug!(
                        event = events::FORWARDER_CANCELLED,
                        component = COMPONENT,
                        request_id = request_id.as_str(),
                        queue = self.queue.as_str(),
                        "session terminated; stopping forwarder"
                    );
                    break;
                }
                next = self.deliveries.next() => next,
            };

            match next {
                Some(Ok(body)) => {
                    debug!(
                        event = events::FORWARDER_DELIVERY,
                        component = COMPONENT,
                        request_id = request_id.as_str(),
                        queue = self.queue.as_str(),
                        bytes = body.len(),
                        "forwarding delivery"
                    );

                    let sent = tokio::select! {
                        _ = termination.cancelled() => break,
                        sent = self.output.send(body) => sent,
                    };
                    if sent.is_err() {
                        debug!(
                            event = events::FORWARDER_OUTPUT_CLOSED,
                            component = COMPONENT,
                            request_id = request_id.as_str(),
                            queue = self.queue.as_str(),
                            "fan-in receiver dropped; stopping forwarder"
                        );
                        break;
                    }
                }
                Some(Err(err)) => {
                    warn!(
                        event = events::FORWARDER_STREAM_ERROR,
                        component = COMPONENT,
                        request_id = request_id.as_str(),
                        queue = self.queue.as_str(),
                        err = %err,
                        "delivery stream failed"
                    );
                    let _ = self
                        .session
                        .close(fields::REASON_DELIVERY_STREAM_ERROR)
                        .await;
                    break;
                }
                None => {
                    info!(
                        event = events::FORWARDER_STREAM_CLOSED,
                        component = COMPONENT,
                        request_id = request_id.as_str(),
                        queue = self.queue.as_str(),
                        reason = fields::REASON_DELIVERY_STREAM_CLOSED,
                        "delivery stream ended; closing session"
                    );
                    let _ = self
                        .session
                        .close(fields::REASON_DELIVERY_STREAM_CLOSED)
                        .await;
                    break;
                }
            }
        }
    }
}
