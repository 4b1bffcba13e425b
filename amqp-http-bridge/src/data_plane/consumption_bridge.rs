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

//! Fan-in of several queue consumers into one ordered body stream.

use super::disconnect_watcher::watch_disconnect;
use super::queue_forwarder::QueueForwarder;
use crate::broker::DeliveryStream;
use crate::error::BridgeError;
use crate::observability::{events, fields};
use crate::session::Session;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

const COMPONENT: &str = "consumption_bridge";

/// Delivery bodies from every subscribed queue, interleaved in arrival order.
///
/// Ends once the session terminates. Dropping it before then is treated as
/// the client disconnecting and closes the session.
pub struct FanInStream {
    receiver: mpsc::Receiver<Bytes>,
    termination: CancellationToken,
    _disconnect: DropGuard,
}

impl Stream for FanInStream {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.termination.is_cancelled() {
            return Poll::Ready(None);
        }
        self.receiver.poll_recv(cx)
    }
}

/// Subscribes to every queue in `queues` on `session` and starts streaming.
///
/// Subscription is all-or-nothing: if any queue fails, the session is closed
/// and the failure is returned before a single body is produced.
pub async fn consume(
    session: Session,
    queues: &[String],
    fan_in_capacity: usize,
) -> Result<FanInStream, BridgeError> {
    let request_id = session.request_id().to_string();

    if queues.is_empty() {
        let _ = session.close(fields::REASON_SUBSCRIBE_FAILED).await;
        return Err(BridgeError::NoQueues);
    }

    let mut subscriptions: Vec<(String, DeliveryStream)> = Vec::with_capacity(queues.len());
    for queue in queues {
        match session.channel().consume(queue).await {
            Ok(deliveries) => {
                debug!(
                    event = events::SUBSCRIBE_OK,
                    component = COMPONENT,
                    request_id = request_id.as_str(),
                    queue = queue.as_str(),
                    "subscribed to queue"
                );
                subscriptions.push((queue.clone(), deliveries));
            }
            Err(reason) => {
                warn!(
                    event = events::SUBSCRIBE_FAILED,
                    component = COMPONENT,
                    request_id = request_id.as_str(),
                    queue = queue.as_str(),
                    err = %reason,
                    "unable to subscribe; abandoning request"
                );
                drop(subscriptions);
                let _ = session.close(fields::REASON_SUBSCRIBE_FAILED).await;
                return Err(BridgeError::SubscribeFailed {
                    queue: queue.clone(),
                    reason,
                });
            }
        }
    }

    let (sender, receiver) = mpsc::channel(fan_in_capacity.max(1));
    for (queue, deliveries) in subscriptions {
        let forwarder = QueueForwarder::new(queue, deliveries, session.clone(), sender.clone());
        tokio::spawn(forwarder.run());
    }
    drop(sender);

    let disconnected = CancellationToken::new();
    tokio::spawn(watch_disconnect(session.clone(), disconnected.clone()));

    info!(
        event = events::BRIDGE_STREAMING,
        component = COMPONENT,
        request_id = request_id.as_str(),
        queues = fields::format_queue_list(queues).as_str(),
        "streaming deliveries"
    );

    Ok(FanInStream {
        receiver,
        termination: session.termination_token(),
        _disconnect: disconnected.drop_guard(),
    })
}
