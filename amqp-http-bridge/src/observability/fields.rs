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

//! Canonical structured field keys and value-format helpers.

pub const EVENT: &str = "event";
pub const COMPONENT: &str = "component";
pub const REQUEST_ID: &str = "request_id";
pub const QUEUE: &str = "queue";
pub const EXCHANGE: &str = "exchange";
pub const ROUTING_KEY: &str = "routing_key";
pub const REASON: &str = "reason";
pub const ERR: &str = "err";

pub const NONE: &str = "none";
pub const REASON_CLIENT_DISCONNECT: &str = "client_disconnect";
pub const REASON_DELIVERY_STREAM_CLOSED: &str = "delivery_stream_closed";
pub const REASON_DELIVERY_STREAM_ERROR: &str = "delivery_stream_error";
pub const REASON_SUBSCRIBE_FAILED: &str = "subscribe_failed";
pub const REASON_REQUEST_COMPLETE: &str = "request_complete";
pub const REASON_CHANNEL_FAILED: &str = "channel_failed";

/// Renders an optional header value for log output.
pub fn value_or_none(value: Option<&str>) -> &str {
    value.unwrap_or(NONE)
}

/// Joins queue names for a single log field.
pub fn format_queue_list(queues: &[String]) -> String {
    queues.join(",")
}
