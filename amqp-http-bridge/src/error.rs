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

//! Error kinds surfaced by broker adapters and by request handling.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure text reported by a broker adapter.
///
/// Adapters keep the broker's own wording so that it can be relayed verbatim
/// to HTTP clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerError {
    message: String,
}

impl BrokerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for BrokerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for BrokerError {}

impl From<lapin::Error> for BrokerError {
    fn from(err: lapin::Error) -> Self {
        BrokerError::new(err.to_string())
    }
}

/// Request-level failure. Every variant is terminal for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The broker could not be dialled.
    ConnectionFailed(BrokerError),
    /// The connection was established but no channel could be opened on it.
    ChannelFailed(BrokerError),
    /// A consumer could not be registered on the named queue.
    SubscribeFailed { queue: String, reason: BrokerError },
    /// The broker refused the publish call synchronously.
    PublishFailed(BrokerError),
    /// The broker handed the published message back as undeliverable.
    Rejected(String),
    /// The request body could not be parsed into the expected shape.
    BodyMalformed(String),
    /// A declare/delete/bind/unbind call failed.
    OperationFailed {
        operation: &'static str,
        reason: BrokerError,
    },
    /// Closing the broker connection or channel failed.
    CloseFailed(BrokerError),
    /// A consumption request named no queue.
    NoQueues,
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::ConnectionFailed(err) => write!(f, "{err}"),
            BridgeError::ChannelFailed(err) => write!(f, "{err}"),
            BridgeError::SubscribeFailed { reason, .. } => write!(f, "{reason}"),
            BridgeError::PublishFailed(err) => write!(f, "{err}"),
            BridgeError::Rejected(reason) => {
                write!(f, "Incorrect exchange or queue name {reason}")
            }
            BridgeError::BodyMalformed(reason) => f.write_str(reason),
            BridgeError::OperationFailed { reason, .. } => write!(f, "{reason}"),
            BridgeError::CloseFailed(err) => write!(f, "{err}"),
            BridgeError::NoQueues => write!(f, "at least one queue name is required"),
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BridgeError::ConnectionFailed(err)
            | BridgeError::ChannelFailed(err)
            | BridgeError::PublishFailed(err)
            | BridgeError::CloseFailed(err) => Some(err),
            BridgeError::SubscribeFailed { reason, .. }
            | BridgeError::OperationFailed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::BodyMalformed(err.to_string())
    }
}

impl BridgeError {
    /// Stable kind label used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::ConnectionFailed(_) => "connection_failed",
            BridgeError::ChannelFailed(_) => "channel_failed",
            BridgeError::SubscribeFailed { .. } => "subscribe_failed",
            BridgeError::PublishFailed(_) => "publish_failed",
            BridgeError::Rejected(_) => "rejected",
            BridgeError::BodyMalformed(_) => "body_malformed",
            BridgeError::OperationFailed { .. } => "operation_failed",
            BridgeError::CloseFailed(_) => "close_failed",
            BridgeError::NoQueues => "no_queues",
        }
    }

    /// HTTP status code for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            BridgeError::Rejected(_) | BridgeError::NoQueues => 400,
            _ => 500,
        }
    }
}
