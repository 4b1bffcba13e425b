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

//! Single-call management operations and their execution on a fresh session.

use crate::broker::{BrokerChannel, BrokerConnector, ExchangeSpec, QueueSpec};
use crate::error::{BridgeError, BrokerError};
use crate::observability::{events, fields};
use crate::session::Session;
use tracing::{debug, warn};

const COMPONENT: &str = "management";

/// One declare/delete/bind/unbind request, already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagementOperation {
    DeclareExchange(ExchangeSpec),
    DeleteExchange {
        name: String,
    },
    DeclareQueue(QueueSpec),
    DeleteQueue {
        name: String,
    },
    /// One broker bind per key, in order.
    BindQueue {
        queue: String,
        exchange: String,
        keys: Vec<String>,
        nowait: bool,
    },
    UnbindQueue {
        queue: String,
        exchange: String,
        keys: Vec<String>,
    },
}

impl ManagementOperation {
    pub fn label(&self) -> &'static str {
        match self {
            ManagementOperation::DeclareExchange(_) => "declare_exchange",
            ManagementOperation::DeleteExchange { .. } => "delete_exchange",
            ManagementOperation::DeclareQueue(_) => "declare_queue",
            ManagementOperation::DeleteQueue { .. } => "delete_queue",
            ManagementOperation::BindQueue { .. } => "bind_queue",
            ManagementOperation::UnbindQueue { .. } => "unbind_queue",
        }
    }

    /// Plain-text body returned to the client on success.
    pub fn success_text(&self) -> &'static str {
        match self {
            ManagementOperation::DeclareExchange(_) => "declare exchange ok",
            ManagementOperation::DeleteExchange { .. } => "delete exchange ok",
            ManagementOperation::DeclareQueue(_) => "declare queue ok",
            ManagementOperation::DeleteQueue { .. } => "delete queue ok",
            ManagementOperation::BindQueue { .. } => "bind queue ok",
            ManagementOperation::UnbindQueue { .. } => "unbind queue ok",
        }
    }

    /// Runs the operation on `channel`, stopping at the first broker failure.
    pub async fn apply(&self, channel: &dyn BrokerChannel) -> Result<(), BridgeError> {
        let result: Result<(), BrokerError> = match self {
            ManagementOperation::DeclareExchange(spec) => channel.declare_exchange(spec).await,
            ManagementOperation::DeleteExchange { name } => channel.delete_exchange(name).await,
            ManagementOperation::DeclareQueue(spec) => channel.declare_queue(spec).await,
            ManagementOperation::DeleteQueue { name } => channel.delete_queue(name).await,
            ManagementOperation::BindQueue {
                queue,
                exchange,
                keys,
                nowait,
            } => {
                let mut result = Ok(());
                for key in keys {
                    result = channel.bind_queue(queue, exchange, key, *nowait).await;
                    if result.is_err() {
                        break;
                    }
                }
                result
            }
            ManagementOperation::UnbindQueue {
                queue,
                exchange,
                keys,
            } => {
                let mut result = Ok(());
                for key in keys {
                    result = channel.unbind_queue(queue, exchange, key).await;
                    if result.is_err() {
                        break;
                    }
                }
                result
            }
        };

        result.map_err(|reason| BridgeError::OperationFailed {
            operation: self.label(),
            reason,
        })
    }
}

/// Acquires a session, applies `operation`, and closes the session again.
///
/// Returns the success text for the response body. A failing close after a
/// successful operation is logged and does not change the verdict.
pub async fn execute(
    connector: &dyn BrokerConnector,
    request_id: &str,
    operation: ManagementOperation,
) -> Result<&'static str, BridgeError> {
    let session = Session::acquire(connector, request_id).await?;
    let result = operation.apply(session.channel()).await;
    let _ = session.close(fields::REASON_REQUEST_COMPLETE).await;

    match result {
        Ok(()) => {
            debug!(
                event = events::OPERATION_OK,
                component = COMPONENT,
                request_id,
                operation = operation.label(),
                "management operation applied"
            );
            Ok(operation.success_text())
        }
        Err(err) => {
            warn!(
                event = events::OPERATION_FAILED,
                component = COMPONENT,
                request_id,
                operation = operation.label(),
                err = %err,
                "management operation failed"
            );
            Err(err)
        }
    }
}
