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

//! Scripted broker used by unit tests inside this crate.

use crate::broker::{
    BrokerChannel, BrokerConnection, BrokerConnector, DeliveryStream, ExchangeSpec,
    OutboundMessage, PublishSignal, PublishSignalFuture, QueueSpec,
};
use crate::error::BrokerError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub(crate) type Feed = mpsc::UnboundedSender<Result<Bytes, BrokerError>>;

#[derive(Default)]
struct ScriptedState {
    publish_signal: Mutex<Option<(Duration, PublishSignal)>>,
    publish_error: Mutex<Option<String>>,
    publish_delay: Mutex<Option<Duration>>,
    operation_error: Mutex<Option<String>>,
    feeds: Mutex<HashMap<String, mpsc::UnboundedReceiver<Result<Bytes, BrokerError>>>>,
    missing_queues: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    published: Mutex<Vec<OutboundMessage>>,
    connects: AtomicUsize,
    connection_closes: AtomicUsize,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedBroker {
    state: Arc<ScriptedState>,
}

impl ScriptedBroker {
    pub(crate) fn signal_after(&self, delay: Duration, signal: PublishSignal) {
        *self.state.publish_signal.lock().unwrap() = Some((delay, signal));
    }

    pub(crate) fn fail_publish(&self, reason: &str) {
        *self.state.publish_error.lock().unwrap() = Some(reason.to_string());
    }

    /// Delays the publish call itself before the broker takes the message.
    pub(crate) fn slow_publish(&self, delay: Duration) {
        *self.state.publish_delay.lock().unwrap() = Some(delay);
    }

    pub(crate) fn fail_operations(&self, reason: &str) {
        *self.state.operation_error.lock().unwrap() = Some(reason.to_string());
    }

    pub(crate) fn missing_queue(&self, queue: &str) {
        self.state
            .missing_queues
            .lock()
            .unwrap()
            .insert(queue.to_string());
    }

    /// Registers a delivery feed for `queue`; dropping the sender ends the stream.
    pub(crate) fn feed(&self, queue: &str) -> Feed {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.state
            .feeds
            .lock()
            .unwrap()
            .insert(queue.to_string(), receiver);
        sender
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.calls.lock().unwrap().clone()
    }

    pub(crate) fn published(&self) -> Vec<OutboundMessage> {
        self.state.published.lock().unwrap().clone()
    }

    pub(crate) fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub(crate) fn connection_closes(&self) -> usize {
        self.state.connection_closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerConnector for ScriptedBroker {
    async fn connect(&self) -> Result<Arc<dyn BrokerConnection>, BrokerError> {
        self.state.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedConnection {
            state: self.state.clone(),
            closed: CancellationToken::new(),
        }))
    }
}

struct ScriptedConnection {
    state: Arc<ScriptedState>,
    closed: CancellationToken,
}

#[async_trait]
impl BrokerConnection for ScriptedConnection {
    async fn open_channel(&self) -> Result<Arc<dyn BrokerChannel>, BrokerError> {
        Ok(Arc::new(ScriptedChannel {
            state: self.state.clone(),
            closed: self.closed.clone(),
        }))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.closed.cancel();
        self.state.connection_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct ScriptedChannel {
    state: Arc<ScriptedState>,
    closed: CancellationToken,
}

impl ScriptedChannel {
    fn record(&self, call: String) -> Result<(), BrokerError> {
        self.state.calls.lock().unwrap().push(call);
        match self.state.operation_error.lock().unwrap().as_ref() {
            Some(reason) => Err(BrokerError::new(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BrokerChannel for ScriptedChannel {
    async fn declare_exchange(&self, exchange: &ExchangeSpec) -> Result<(), BrokerError> {
        self.record(format!(
            "declare_exchange {} {}",
            exchange.name,
            exchange.kind.as_str()
        ))
    }

    async fn delete_exchange(&self, name: &str) -> Result<(), BrokerError> {
        self.record(format!("delete_exchange {name}"))
    }

    async fn declare_queue(&self, queue: &QueueSpec) -> Result<(), BrokerError> {
        self.record(format!("declare_queue {}", queue.name))
    }

    async fn delete_queue(&self, name: &str) -> Result<(), BrokerError> {
        self.record(format!("delete_queue {name}"))
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
        _nowait: bool,
    ) -> Result<(), BrokerError> {
        self.record(format!("bind {queue} {exchange} {routing_key}"))
    }

    async fn unbind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        self.record(format!("unbind {queue} {exchange} {routing_key}"))
    }

    async fn publish(&self, message: OutboundMessage) -> Result<PublishSignalFuture, BrokerError> {
        if let Some(reason) = self.state.publish_error.lock().unwrap().clone() {
            return Err(BrokerError::new(reason));
        }
        let delay = *self.state.publish_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state.published.lock().unwrap().push(message);

        let scripted = self.state.publish_signal.lock().unwrap().clone();
        Ok(Box::pin(async move {
            match scripted {
                Some((delay, signal)) => {
                    tokio::time::sleep(delay).await;
                    signal
                }
                None => futures::future::pending().await,
            }
        }))
    }

    async fn consume(&self, queue: &str) -> Result<DeliveryStream, BrokerError> {
        if self.state.missing_queues.lock().unwrap().contains(queue) {
            return Err(BrokerError::new(format!(
                "NOT_FOUND - no queue '{queue}' in vhost '/'"
            )));
        }

        let stream = match self.state.feeds.lock().unwrap().remove(queue) {
            Some(mut receiver) => {
                futures::stream::poll_fn(move |cx| receiver.poll_recv(cx)).boxed()
            }
            None => futures::stream::pending().boxed(),
        };
        Ok(stream.take_until(self.closed.clone().cancelled_owned()).boxed())
    }

    async fn close(&self) -> Result<(), BrokerError> {
        Ok(())
    }
}
