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

//! Canonical structured event names used across `amqp-http-bridge`.

// Session lifecycle events.
pub const SESSION_OPEN_OK: &str = "session_open_ok";
pub const SESSION_CONNECT_FAILED: &str = "session_connect_failed";
pub const SESSION_CHANNEL_FAILED: &str = "session_channel_failed";
pub const SESSION_CLOSE_OK: &str = "session_close_ok";
pub const SESSION_CLOSE_FAILED: &str = "session_close_failed";
pub const SESSION_CLOSE_SKIPPED: &str = "session_close_skipped";
pub const CHANNEL_CLOSE_FAILED: &str = "channel_close_failed";

// Publish race events.
pub const PUBLISH_SENT: &str = "publish_sent";
pub const PUBLISH_FAILED: &str = "publish_failed";
pub const PUBLISH_REJECTED: &str = "publish_rejected";
pub const PUBLISH_CONFIRMED: &str = "publish_confirmed";
pub const PUBLISH_NACKED: &str = "publish_nacked";
pub const PUBLISH_CONFIRM_IGNORED: &str = "publish_confirm_ignored";
pub const PUBLISH_WINDOW_ELAPSED: &str = "publish_window_elapsed";

// Consumption bridge events.
pub const CONSUMER_OPEN_OK: &str = "consumer_open_ok";
pub const SUBSCRIBE_OK: &str = "subscribe_ok";
pub const SUBSCRIBE_FAILED: &str = "subscribe_failed";
pub const BRIDGE_STREAMING: &str = "bridge_streaming";
pub const FORWARDER_START: &str = "forwarder_start";
pub const FORWARDER_DELIVERY: &str = "forwarder_delivery";
pub const FORWARDER_STREAM_CLOSED: &str = "forwarder_stream_closed";
pub const FORWARDER_STREAM_ERROR: &str = "forwarder_stream_error";
pub const FORWARDER_OUTPUT_CLOSED: &str = "forwarder_output_closed";
pub const FORWARDER_CANCELLED: &str = "forwarder_cancelled";
pub const CLIENT_DISCONNECTED: &str = "client_disconnected";

// HTTP surface events.
pub const HTTP_SERVE_START: &str = "http_serve_start";
pub const REQUEST_RECEIVED: &str = "request_received";
pub const REQUEST_OK: &str = "request_ok";
pub const REQUEST_FAILED: &str = "request_failed";
pub const OPERATION_OK: &str = "operation_ok";
pub const OPERATION_FAILED: &str = "operation_failed";
