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

//! JSON bodies accepted by the HTTP surface.
//!
//! Missing fields fall back to zero values, so `{}` is a valid (if not very
//! useful) body for every entity.

use super::operations::ManagementOperation;
use crate::broker::{ExchangeKind, ExchangeSpec, OutboundMessage, QueueSpec};
use crate::error::BridgeError;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Parses a raw request body.
pub fn parse_entity<T: DeserializeOwned>(body: &[u8]) -> Result<T, BridgeError> {
    serde_json::from_slice(body).map_err(BridgeError::from)
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExchangeEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub durable: bool,
    pub autodelete: bool,
    pub nowait: bool,
}

impl ExchangeEntity {
    pub fn into_declare(self) -> ManagementOperation {
        ManagementOperation::DeclareExchange(ExchangeSpec {
            kind: ExchangeKind::from_type(&self.kind),
            name: self.name,
            durable: self.durable,
            auto_delete: self.autodelete,
            nowait: self.nowait,
        })
    }

    pub fn into_delete(self) -> ManagementOperation {
        ManagementOperation::DeleteExchange { name: self.name }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueueEntity {
    pub name: String,
    pub durable: bool,
    pub autodelete: bool,
    pub exclusive: bool,
    pub nowait: bool,
}

impl QueueEntity {
    pub fn into_declare(self) -> ManagementOperation {
        ManagementOperation::DeclareQueue(QueueSpec {
            name: self.name,
            durable: self.durable,
            auto_delete: self.autodelete,
            exclusive: self.exclusive,
            nowait: self.nowait,
        })
    }

    pub fn into_delete(self) -> ManagementOperation {
        ManagementOperation::DeleteQueue { name: self.name }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueueBindEntity {
    pub queue: String,
    pub exchange: String,
    pub keys: Vec<String>,
    pub nowait: bool,
}

impl QueueBindEntity {
    pub fn into_bind(self) -> ManagementOperation {
        ManagementOperation::BindQueue {
            queue: self.queue,
            exchange: self.exchange,
            keys: self.keys,
            nowait: self.nowait,
        }
    }

    /// `nowait` is not part of an unbind and is ignored.
    pub fn into_unbind(self) -> ManagementOperation {
        ManagementOperation::UnbindQueue {
            queue: self.queue,
            exchange: self.exchange,
            keys: self.keys,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MessageEntity {
    pub exchange: String,
    pub key: String,
    pub deliverymode: u8,
    pub priority: u8,
    pub body: String,
    /// Ask the broker to hand back messages no queue would take.
    pub mandatory: bool,
}

impl Default for MessageEntity {
    fn default() -> Self {
        Self {
            exchange: String::new(),
            key: String::new(),
            deliverymode: 0,
            priority: 0,
            body: String::new(),
            mandatory: true,
        }
    }
}

impl MessageEntity {
    pub fn into_outbound(self) -> OutboundMessage {
        OutboundMessage {
            exchange: self.exchange,
            routing_key: self.key,
            delivery_mode: self.deliverymode,
            priority: self.priority,
            mandatory: self.mandatory,
            body: Bytes::from(self.body),
        }
    }
}
