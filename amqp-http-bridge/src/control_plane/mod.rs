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

//! Control-plane layer.
//!
//! Translates JSON request bodies into typed broker operations. Bodies are
//! parsed before any broker session exists, so a malformed body never costs a
//! connection.
//!
//! ```
//! use amqp_http_bridge::control_plane::{parse_entity, QueueEntity};
//!
//! let entity: QueueEntity = parse_entity(br#"{"name":"orders","durable":true}"#).unwrap();
//! let operation = entity.into_declare();
//!
//! assert_eq!(operation.label(), "declare_queue");
//! assert_eq!(operation.success_text(), "declare queue ok");
//! ```

mod entities;
mod operations;

pub use entities::{parse_entity, ExchangeEntity, MessageEntity, QueueBindEntity, QueueEntity};
pub use operations::{execute, ManagementOperation};
