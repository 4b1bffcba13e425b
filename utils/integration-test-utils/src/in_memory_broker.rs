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

use amqp_http_bridge::{
    BrokerChannel, BrokerConnection, BrokerConnector, BrokerError, DeliveryStream, ExchangeKind,
    ExchangeSpec, OutboundMessage, PublishSignal, PublishSignalFuture, QueueSpec,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const DEFAULT_EXCHANGE: &str = "";
const REPLY_NO_ROUTE: u16 = 312;
const REPLY_NOT_FOUND: u16 = 404;
const DEFAULT_SIGNAL_DELAY: Duration = Duration::from_millis(5);

struct Exchange {
    kind: ExchangeKind,
    durable: bool,
    auto_delete: bool,
}

#[derive(Clone, PartialEq, Eq)]
struct Binding {
    queue: String,
    exchange: String,
    routing_key: String,
}

struct Consumer {
    tag: u64,
    connection_id: u64,
    sender: mpsc::UnboundedSender<Bytes>,
}

#[derive(Default)]
struct Queue {
    durable: bool,
    auto_delete: bool,
    exclusive: bool,
    backlog: VecDeque<Bytes>,
    consumers: Vec<Consumer>,
    next_consumer: usize,
}

impl Queue {
    /// Auto-ack delivery: a body handed to a consumer is gone from the broker.
    fn enqueue(&mut self, body: Bytes) {
        self.consumers.retain(|consumer| !consumer.sender.is_closed());
        if self.consumers.is_empty() {
            self.backlog.push_back(body);
            return;
        }

        let index = self.next_consumer % self.consumers.len();
        self.next_consumer = self.next_consumer.wrapping_add(1);
        if let Err(unsent) = self.consumers[index].sender.send(body) {
            self.backlog.push_back(unsent.0);
        }
    }
}

#[derive(Default)]
struct Failures {
    connect: Option<String>,
    channel: Option<String>,
    publish: Option<String>,
}

#[derive(Default)]
struct BrokerState {
    exchanges: HashMap<String, Exchange>,
    queues: HashMap<String, Queue>,
    bindings: Vec<Binding>,
    open_connections: usize,
    connections_opened: usize,
    failures: Failures,
}

impl BrokerState {
    fn route(&self, exchange: &str, routing_key: &str) -> Option<Vec<String>> {
        if exchange == DEFAULT_EXCHANGE {
            return Some(
                self.queues
                    .contains_key(routing_key)
                    .then(|| routing_key.to_string())
                    .into_iter()
                    .collect(),
            );
        }

        let kind = &self.exchanges.get(exchange)?.kind;
        let mut queues: Vec<String> = Vec::new();
        for binding in self.bindings.iter().filter(|b| b.exchange == exchange) {
            let matched = match kind {
                ExchangeKind::Direct => binding.routing_key == routing_key,
                ExchangeKind::Fanout => true,
                ExchangeKind::Topic => topic_matches(&binding.routing_key, routing_key),
                ExchangeKind::Headers | ExchangeKind::Custom(_) => false,
            };
            if matched && !queues.contains(&binding.queue) {
                queues.push(binding.queue.clone());
            }
        }
        Some(queues)
    }

    fn deliver(&mut self, queues: &[String], body: &Bytes) {
        for name in queues {
            if let Some(queue) = self.queues.get_mut(name) {
                queue.enqueue(body.clone());
            }
        }
    }
}

/// AMQP topic pattern match: `*` is one word, `#` is zero or more words.
fn topic_matches(pattern: &str, routing_key: &str) -> bool {
    fn matches(pattern: &[&str], words: &[&str]) -> bool {
        match pattern.split_first() {
            None => words.is_empty(),
            Some((&"#", rest)) => (0..=words.len()).any(|skip| matches(rest, &words[skip..])),
            Some((&"*", rest)) => !words.is_empty() && matches(rest, &words[1..]),
            Some((word, rest)) => words.first() == Some(word) && matches(rest, &words[1..]),
        }
    }

    let pattern: Vec<&str> = pattern.split('.').collect();
    let words: Vec<&str> = routing_key.split('.').collect();
    matches(&pattern, &words)
}

struct Inner {
    state: Mutex<BrokerState>,
    next_id: AtomicU64,
    signal_delay: Duration,
}

/// Single-vhost AMQP broker kept entirely in memory.
///
/// Implements the bridge's broker traits so an HTTP server can be driven end
/// to end without a real broker. Supports direct, fanout and topic routing,
/// mandatory returns, missing-exchange channel errors, and failure injection.
#[derive(Clone)]
pub struct InMemoryBroker {
    inner: Arc<Inner>,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::with_signal_delay(DEFAULT_SIGNAL_DELAY)
    }

    /// Delay before a publish's return or confirmation is reported.
    pub fn with_signal_delay(signal_delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(BrokerState::default()),
                next_id: AtomicU64::new(1),
                signal_delay,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        self.inner
            .state
            .lock()
            .expect("in-memory broker state poisoned")
    }

    pub fn fail_connect(&self, reason: Option<&str>) {
        self.state().failures.connect = reason.map(str::to_string);
    }

    pub fn fail_channel(&self, reason: Option<&str>) {
        self.state().failures.channel = reason.map(str::to_string);
    }

    pub fn fail_publish(&self, reason: Option<&str>) {
        self.state().failures.publish = reason.map(str::to_string);
    }

    /// Connections currently open.
    pub fn open_connections(&self) -> usize {
        self.state().open_connections
    }

    /// Connections ever opened.
    pub fn connections_opened(&self) -> usize {
        self.state().connections_opened
    }

    pub fn consumer_count(&self, queue: &str) -> usize {
        self.state()
            .queues
            .get(queue)
            .map(|queue| {
                queue
                    .consumers
                    .iter()
                    .filter(|consumer| !consumer.sender.is_closed())
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn total_consumers(&self) -> usize {
        self.state()
            .queues
            .values()
            .map(|queue| queue.consumers.len())
            .sum()
    }

    /// Messages waiting in `queue` for a consumer.
    pub fn queue_depth(&self, queue: &str) -> usize {
        self.state()
            .queues
            .get(queue)
            .map(|queue| queue.backlog.len())
            .unwrap_or(0)
    }

    pub fn has_exchange(&self, name: &str) -> bool {
        self.state().exchanges.contains_key(name)
    }

    pub fn has_queue(&self, name: &str) -> bool {
        self.state().queues.contains_key(name)
    }

    /// Routing keys bound from `exchange` to `queue`, in bind order.
    pub fn binding_keys(&self, queue: &str, exchange: &str) -> Vec<String> {
        self.state()
            .bindings
            .iter()
            .filter(|binding| binding.queue == queue && binding.exchange == exchange)
            .map(|binding| binding.routing_key.clone())
            .collect()
    }

    /// Routes a message as if a client had published it; returns how many
    /// queues received it.
    pub fn inject(&self, exchange: &str, routing_key: &str, body: &str) -> usize {
        let mut state = self.state();
        let queues = state.route(exchange, routing_key).unwrap_or_default();
        state.deliver(&queues, &Bytes::from(body.to_string()));
        queues.len()
    }

    /// Cancels every consumer on `queue` from the broker side.
    pub fn cancel_consumers(&self, queue: &str) {
        if let Some(target) = self.state().queues.get_mut(queue) {
            for consumer in target.consumers.drain(..) {
                debug!(queue, consumer_tag = consumer.tag, "in-memory consumer cancelled");
            }
        }
    }

    fn next_id(&self) -> u64 {
        self.inner.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[async_trait]
impl BrokerConnector for InMemoryBroker {
    async fn connect(&self) -> Result<Arc<dyn BrokerConnection>, BrokerError> {
        let mut state = self.state();
        if let Some(reason) = state.failures.connect.clone() {
            return Err(BrokerError::new(reason));
        }
        state.open_connections += 1;
        state.connections_opened += 1;
        drop(state);

        let id = self.next_id();
        debug!(connection_id = id, "in-memory connection opened");
        Ok(Arc::new(InMemoryConnection {
            id,
            broker: self.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct InMemoryConnection {
    id: u64,
    broker: InMemoryBroker,
    closed: AtomicBool,
}

#[async_trait]
impl BrokerConnection for InMemoryConnection {
    async fn open_channel(&self) -> Result<Arc<dyn BrokerChannel>, BrokerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BrokerError::new("connection closed"));
        }
        if let Some(reason) = self.broker.state().failures.channel.clone() {
            return Err(BrokerError::new(reason));
        }
        Ok(Arc::new(InMemoryChannel {
            connection_id: self.id,
            broker: self.broker.clone(),
            closed: AtomicBool::new(false),
        }))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(BrokerError::new("connection already closed"));
        }

        let mut state = self.broker.state();
        state.open_connections = state.open_connections.saturating_sub(1);
        for queue in state.queues.values_mut() {
            queue
                .consumers
                .retain(|consumer| consumer.connection_id != self.id);
        }
        debug!(connection_id = self.id, "in-memory connection closed");
        Ok(())
    }
}

struct InMemoryChannel {
    connection_id: u64,
    broker: InMemoryBroker,
    closed: AtomicBool,
}

impl InMemoryChannel {
    fn ensure_open(&self) -> Result<(), BrokerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BrokerError::new("channel closed"));
        }
        Ok(())
    }

    fn not_found(&self, text: String) -> BrokerError {
        // Like AMQP, a channel-level error kills the channel.
        self.closed.store(true, Ordering::Release);
        BrokerError::new(text)
    }
}

#[async_trait]
impl BrokerChannel for InMemoryChannel {
    async fn declare_exchange(&self, exchange: &ExchangeSpec) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let mut state = self.broker.state();
        if let Some(existing) = state.exchanges.get(&exchange.name) {
            if existing.kind != exchange.kind
                || existing.durable != exchange.durable
                || existing.auto_delete != exchange.auto_delete
            {
                return Err(self.not_found(format!(
                    "PRECONDITION_FAILED - inequivalent arg for exchange '{}' in vhost '/'",
                    exchange.name
                )));
            }
            return Ok(());
        }

        state.exchanges.insert(
            exchange.name.clone(),
            Exchange {
                kind: exchange.kind.clone(),
                durable: exchange.durable,
                auto_delete: exchange.auto_delete,
            },
        );
        Ok(())
    }

    async fn delete_exchange(&self, name: &str) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let mut state = self.broker.state();
        state.exchanges.remove(name);
        state.bindings.retain(|binding| binding.exchange != name);
        Ok(())
    }

    async fn declare_queue(&self, queue: &QueueSpec) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let mut state = self.broker.state();
        if let Some(existing) = state.queues.get(&queue.name) {
            if existing.durable != queue.durable
                || existing.auto_delete != queue.auto_delete
                || existing.exclusive != queue.exclusive
            {
                return Err(self.not_found(format!(
                    "PRECONDITION_FAILED - inequivalent arg for queue '{}' in vhost '/'",
                    queue.name
                )));
            }
            return Ok(());
        }

        state.queues.insert(
            queue.name.clone(),
            Queue {
                durable: queue.durable,
                auto_delete: queue.auto_delete,
                exclusive: queue.exclusive,
                ..Queue::default()
            },
        );
        Ok(())
    }

    async fn delete_queue(&self, name: &str) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let mut state = self.broker.state();
        state.queues.remove(name);
        state.bindings.retain(|binding| binding.queue != name);
        Ok(())
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
        _nowait: bool,
    ) -> Result<(), BrokerError> {
        self.ensure_open()?;
        let mut state = self.broker.state();
        if !state.queues.contains_key(queue) {
            return Err(self.not_found(format!("NOT_FOUND - no queue '{queue}' in vhost '/'")));
        }
        if !state.exchanges.contains_key(exchange) {
            return Err(self.not_found(format!(
                "NOT_FOUND - no exchange '{exchange}' in vhost '/'"
            )));
        }

        let binding = Binding {
            queue: queue.to_string(),
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
        };
        if !state.bindings.contains(&binding) {
            state.bindings.push(binding);
        }
        Ok(())
    }

    async fn unbind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        self.ensure_open()?;
        self.broker.state().bindings.retain(|binding| {
            !(binding.queue == queue
                && binding.exchange == exchange
                && binding.routing_key == routing_key)
        });
        Ok(())
    }

    async fn publish(&self, message: OutboundMessage) -> Result<PublishSignalFuture, BrokerError> {
        self.ensure_open()?;
        let mut state = self.broker.state();
        if let Some(reason) = state.failures.publish.clone() {
            return Err(BrokerError::new(reason));
        }

        let signal = match state.route(&message.exchange, &message.routing_key) {
            None => {
                self.closed.store(true, Ordering::Release);
                PublishSignal::Returned {
                    reply_code: REPLY_NOT_FOUND,
                    reply_text: format!(
                        "NOT_FOUND - no exchange '{}' in vhost '/'",
                        message.exchange
                    ),
                }
            }
            Some(queues) if queues.is_empty() && message.mandatory => PublishSignal::Returned {
                reply_code: REPLY_NO_ROUTE,
                reply_text: "NO_ROUTE".to_string(),
            },
            Some(queues) => {
                state.deliver(&queues, &message.body);
                PublishSignal::Confirmed
            }
        };
        drop(state);

        let delay = self.broker.inner.signal_delay;
        Ok(Box::pin(async move {
            tokio::time::sleep(delay).await;
            signal
        }))
    }

    async fn consume(&self, queue: &str) -> Result<DeliveryStream, BrokerError> {
        self.ensure_open()?;
        let tag = self.broker.next_id();
        let mut state = self.broker.state();
        let Some(target) = state.queues.get_mut(queue) else {
            return Err(self.not_found(format!("NOT_FOUND - no queue '{queue}' in vhost '/'")));
        };

        let (sender, mut receiver) = mpsc::unbounded_channel();
        while let Some(body) = target.backlog.pop_front() {
            // The receiver is alive, so the send cannot fail.
            let _ = sender.send(body);
        }
        target.consumers.push(Consumer {
            tag,
            connection_id: self.connection_id,
            sender,
        });
        debug!(queue, consumer_tag = tag, "in-memory consumer registered");

        Ok(futures::stream::poll_fn(move |cx| receiver.poll_recv(cx))
            .map(Ok)
            .boxed())
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
