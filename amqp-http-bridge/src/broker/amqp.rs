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

//! AMQP 0-9-1 adapter backed by `lapin`.

use super::{
    BrokerChannel, BrokerConnection, BrokerConnector, DeliveryStream, ExchangeKind, ExchangeSpec,
    OutboundMessage, PublishSignal, PublishSignalFuture, QueueSpec,
};
use crate::error::BrokerError;
use crate::observability::events;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions,
    ExchangeDeleteOptions, QueueBindOptions, QueueDeclareOptions, QueueDeleteOptions,
};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

const COMPONENT: &str = "amqp_adapter";
const CONSUMER_TAG_PREFIX: &str = "amqp-http-bridge-";
const CONTENT_TYPE: &str = "text/plain";
const REPLY_SUCCESS: u16 = 200;
const REPLY_TEXT: &str = "bye";

/// Dials an AMQP broker at a fixed URI.
#[derive(Clone, Debug)]
pub struct AmqpConnector {
    uri: String,
}

impl AmqpConnector {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[async_trait]
impl BrokerConnector for AmqpConnector {
    async fn connect(&self) -> Result<Arc<dyn BrokerConnection>, BrokerError> {
        let connection = Connection::connect(&self.uri, ConnectionProperties::default()).await?;
        Ok(Arc::new(AmqpConnection { connection }))
    }
}

struct AmqpConnection {
    connection: Connection,
}

#[async_trait]
impl BrokerConnection for AmqpConnection {
    async fn open_channel(&self) -> Result<Arc<dyn BrokerChannel>, BrokerError> {
        let channel = self.connection.create_channel().await?;
        // Confirm mode attaches basic.return frames to the publish they belong to.
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;
        Ok(Arc::new(AmqpChannel { channel }))
    }

    async fn close(&self) -> Result<(), BrokerError> {
        self.connection
            .close(REPLY_SUCCESS, REPLY_TEXT)
            .await
            .map_err(BrokerError::from)
    }
}

struct AmqpChannel {
    channel: Channel,
}

fn lapin_exchange_kind(kind: &ExchangeKind) -> lapin::ExchangeKind {
    match kind {
        ExchangeKind::Direct => lapin::ExchangeKind::Direct,
        ExchangeKind::Fanout => lapin::ExchangeKind::Fanout,
        ExchangeKind::Topic => lapin::ExchangeKind::Topic,
        ExchangeKind::Headers => lapin::ExchangeKind::Headers,
        ExchangeKind::Custom(kind) => lapin::ExchangeKind::Custom(kind.clone()),
    }
}

fn signal_from_confirmation(
    confirmation: Result<Confirmation, lapin::Error>,
) -> Option<PublishSignal> {
    match confirmation {
        Ok(Confirmation::Ack(Some(returned))) | Ok(Confirmation::Nack(Some(returned))) => {
            Some(PublishSignal::Returned {
                reply_code: returned.reply_code,
                reply_text: returned.reply_text.as_str().to_string(),
            })
        }
        Ok(Confirmation::Ack(None)) => Some(PublishSignal::Confirmed),
        Ok(Confirmation::Nack(None)) => Some(PublishSignal::Nacked),
        Ok(Confirmation::NotRequested) => None,
        // A publish to a missing exchange closes the channel instead of returning.
        Err(err) => Some(PublishSignal::Returned {
            reply_code: 0,
            reply_text: err.to_string(),
        }),
    }
}

#[async_trait]
impl BrokerChannel for AmqpChannel {
    async fn declare_exchange(&self, exchange: &ExchangeSpec) -> Result<(), BrokerError> {
        let options = ExchangeDeclareOptions {
            passive: false,
            durable: exchange.durable,
            auto_delete: exchange.auto_delete,
            internal: false,
            nowait: exchange.nowait,
        };
        self.channel
            .exchange_declare(
                &exchange.name,
                lapin_exchange_kind(&exchange.kind),
                options,
                FieldTable::default(),
            )
            .await
            .map_err(BrokerError::from)
    }

    async fn delete_exchange(&self, name: &str) -> Result<(), BrokerError> {
        self.channel
            .exchange_delete(name, ExchangeDeleteOptions::default())
            .await
            .map_err(BrokerError::from)
    }

    async fn declare_queue(&self, queue: &QueueSpec) -> Result<(), BrokerError> {
        let options = QueueDeclareOptions {
            passive: false,
            durable: queue.durable,
            exclusive: queue.exclusive,
            auto_delete: queue.auto_delete,
            nowait: queue.nowait,
        };
        self.channel
            .queue_declare(&queue.name, options, FieldTable::default())
            .await?;
        Ok(())
    }

    async fn delete_queue(&self, name: &str) -> Result<(), BrokerError> {
        self.channel
            .queue_delete(name, QueueDeleteOptions::default())
            .await?;
        Ok(())
    }

    async fn bind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
        nowait: bool,
    ) -> Result<(), BrokerError> {
        self.channel
            .queue_bind(
                queue,
                exchange,
                routing_key,
                QueueBindOptions { nowait },
                FieldTable::default(),
            )
            .await
            .map_err(BrokerError::from)
    }

    async fn unbind_queue(
        &self,
        queue: &str,
        exchange: &str,
        routing_key: &str,
    ) -> Result<(), BrokerError> {
        self.channel
            .queue_unbind(queue, exchange, routing_key, FieldTable::default())
            .await
            .map_err(BrokerError::from)
    }

    async fn publish(&self, message: OutboundMessage) -> Result<PublishSignalFuture, BrokerError> {
        let properties = BasicProperties::default()
            .with_headers(FieldTable::default())
            .with_content_type(CONTENT_TYPE.into())
            .with_delivery_mode(message.delivery_mode)
            .with_priority(message.priority);
        let options = BasicPublishOptions {
            mandatory: message.mandatory,
            immediate: false,
        };

        let confirm = self
            .channel
            .basic_publish(
                &message.exchange,
                &message.routing_key,
                options,
                &message.body,
                properties,
            )
            .await?;

        Ok(Box::pin(async move {
            match signal_from_confirmation(confirm.await) {
                Some(signal) => signal,
                None => futures::future::pending().await,
            }
        }))
    }

    async fn consume(&self, queue: &str) -> Result<DeliveryStream, BrokerError> {
        let consumer_tag = format!("{CONSUMER_TAG_PREFIX}{}", Uuid::new_v4().simple());
        let consumer = self
            .channel
            .basic_consume(
                queue,
                &consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        debug!(
            event = events::CONSUMER_OPEN_OK,
            component = COMPONENT,
            queue,
            consumer_tag = consumer_tag.as_str(),
            "broker consumer registered"
        );

        Ok(consumer
            .map(|delivery| {
                delivery
                    .map(|delivery| Bytes::from(delivery.data))
                    .map_err(BrokerError::from)
            })
            .boxed())
    }

    async fn close(&self) -> Result<(), BrokerError> {
        if let Err(err) = self.channel.close(REPLY_SUCCESS, REPLY_TEXT).await {
            // The broker may already have closed the channel after a failed call.
            warn!(
                event = events::CHANNEL_CLOSE_FAILED,
                component = COMPONENT,
                err = %err,
                "channel close failed"
            );
            return Err(err.into());
        }
        Ok(())
    }
}
