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

//! Route handlers. Each one parses, runs one bridge operation, and renders a
//! plain-text response.

use super::request_identity::RequestIdentity;
use super::BridgeState;
use crate::control_plane::{
    execute, parse_entity, ExchangeEntity, ManagementOperation, MessageEntity, QueueBindEntity,
    QueueEntity,
};
use crate::data_plane::consumption_bridge::{consume, FanInStream};
use crate::data_plane::publish_race::{publish_and_confirm, PublishOutcome};
use crate::error::BridgeError;
use crate::observability::{events, fields};
use crate::session::Session;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

const COMPONENT: &str = "http";
const PUBLISH_OK: &str = "Publish message OK\n";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const QUEUE_PARAM: &str = "name";
const QUEUE_METHODS: &str = "GET,POST,DELETE";

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, format!("{self}\n")).into_response()
    }
}

/// Every `name` value from the query string of `GET /queue`, in order.
fn queue_names(query: Vec<(String, String)>) -> Vec<String> {
    query
        .into_iter()
        .filter(|(key, _)| key == QUEUE_PARAM)
        .map(|(_, value)| value)
        .collect()
}

async fn traced<F>(identity: &RequestIdentity, route: &'static str, work: F) -> Response
where
    F: Future<Output = Result<Response, BridgeError>>,
{
    async move {
        info!(
            event = events::REQUEST_RECEIVED,
            component = COMPONENT,
            "request received"
        );
        match work.await {
            Ok(response) => {
                info!(
                    event = events::REQUEST_OK,
                    component = COMPONENT,
                    status = response.status().as_u16(),
                    "request handled"
                );
                response
            }
            Err(err) => {
                warn!(
                    event = events::REQUEST_FAILED,
                    component = COMPONENT,
                    kind = err.kind(),
                    status = err.status_code(),
                    err = %err,
                    "request failed"
                );
                err.into_response()
            }
        }
    }
    .instrument(identity.span(route))
    .await
}

async fn manage<T: DeserializeOwned>(
    state: Arc<BridgeState>,
    headers: HeaderMap,
    body: Bytes,
    route: &'static str,
    into_operation: fn(T) -> ManagementOperation,
) -> Response {
    let identity = RequestIdentity::from_headers(&headers);
    traced(&identity, route, async {
        let operation = into_operation(parse_entity::<T>(&body)?);
        let text = execute(state.connector.as_ref(), identity.request_id(), operation).await?;
        Ok::<_, BridgeError>(text.into_response())
    })
    .await
}

pub(crate) async fn declare_exchange(
    State(state): State<Arc<BridgeState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    manage(state, headers, body, "POST /exchange", ExchangeEntity::into_declare).await
}

pub(crate) async fn delete_exchange(
    State(state): State<Arc<BridgeState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    manage(state, headers, body, "DELETE /exchange", ExchangeEntity::into_delete).await
}

pub(crate) async fn declare_queue(
    State(state): State<Arc<BridgeState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    manage(state, headers, body, "POST /queue", QueueEntity::into_declare).await
}

pub(crate) async fn delete_queue(
    State(state): State<Arc<BridgeState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    manage(state, headers, body, "DELETE /queue", QueueEntity::into_delete).await
}

pub(crate) async fn bind_queue(
    State(state): State<Arc<BridgeState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    manage(state, headers, body, "POST /queue/bind", QueueBindEntity::into_bind).await
}

pub(crate) async fn unbind_queue(
    State(state): State<Arc<BridgeState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    manage(state, headers, body, "DELETE /queue/bind", QueueBindEntity::into_unbind).await
}

pub(crate) async fn publish(
    State(state): State<Arc<BridgeState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let identity = RequestIdentity::from_headers(&headers);
    traced(&identity, "POST /publish", async {
        let message = parse_entity::<MessageEntity>(&body)?.into_outbound();
        let session = Session::acquire(state.connector.as_ref(), identity.request_id()).await?;
        let outcome = publish_and_confirm(
            &session,
            message,
            state.settings.confirm_window,
            state.settings.accept_on_confirm,
        )
        .await;
        let _ = session.close(fields::REASON_REQUEST_COMPLETE).await;

        match outcome? {
            PublishOutcome::Rejected(reason) => Err(BridgeError::Rejected(reason)),
            PublishOutcome::Accepted | PublishOutcome::TimedOutAsAccepted => {
                Ok(PUBLISH_OK.into_response())
            }
        }
    })
    .await
}

pub(crate) async fn consume_queues(
    State(state): State<Arc<BridgeState>>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Response {
    // `get` also routes HEAD here. A HEAD must never open an auto-ack consumer.
    if method == Method::HEAD {
        return head_refused();
    }
    let identity = RequestIdentity::from_headers(&headers);
    let queues = queue_names(query);
    traced(&identity, "GET /queue", async {
        if queues.is_empty() {
            return Err(BridgeError::NoQueues);
        }
        let session = Session::acquire(state.connector.as_ref(), identity.request_id()).await?;
        let stream = consume(session, &queues, state.settings.fan_in_capacity).await?;
        Ok(streaming_response(stream))
    })
    .await
}

fn head_refused() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, QUEUE_METHODS)],
    )
        .into_response()
}

/// One line per delivery body.
fn frame(body: Bytes) -> Bytes {
    let mut framed = BytesMut::with_capacity(body.len() + 1);
    framed.extend_from_slice(&body);
    framed.put_u8(b'\n');
    framed.freeze()
}

fn streaming_response(stream: FanInStream) -> Response {
    let frames = stream.map(|body| Ok::<_, Infallible>(frame(body)));
    (
        [(header::CONTENT_TYPE, TEXT_PLAIN)],
        Body::from_stream(frames),
    )
        .into_response()
}
