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

//! Per-request correlation id and pass-through identity headers.

use crate::observability::fields;
use axum::http::HeaderMap;
use tracing::{info_span, Span};
use uuid::Uuid;

const REAL_IP: &str = "x-real-ip";
const CONSUMER_ID: &str = "x-consumer-id";
const CONSUMER_USERNAME: &str = "x-consumer-username";
const APIKEY: &str = "apikey";

/// Who is calling, as far as the fronting gateway told us.
///
/// Only carried into logs. The API key value itself is never kept.
#[derive(Debug, Clone)]
pub(crate) struct RequestIdentity {
    request_id: String,
    real_ip: Option<String>,
    consumer_id: Option<String>,
    consumer_username: Option<String>,
    apikey_present: bool,
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

impl RequestIdentity {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            real_ip: header_text(headers, REAL_IP),
            consumer_id: header_text(headers, CONSUMER_ID),
            consumer_username: header_text(headers, CONSUMER_USERNAME),
            apikey_present: headers.contains_key(APIKEY),
        }
    }

    pub(crate) fn request_id(&self) -> &str {
        &self.request_id
    }

    pub(crate) fn span(&self, route: &'static str) -> Span {
        info_span!(
            "request",
            request_id = self.request_id.as_str(),
            route,
            real_ip = fields::value_or_none(self.real_ip.as_deref()),
            consumer_id = fields::value_or_none(self.consumer_id.as_deref()),
            consumer_username = fields::value_or_none(self.consumer_username.as_deref()),
            apikey_present = self.apikey_present,
        )
    }
}
