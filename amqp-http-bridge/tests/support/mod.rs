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

use amqp_http_bridge::{router, serve, BridgeSettings};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use integration_test_utils::InMemoryBroker;
use reqwest::{Method, Response};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A bridge served on an ephemeral local port, backed by `InMemoryBroker`.
pub(crate) struct TestBridge {
    base_url: String,
    client: reqwest::Client,
    server: JoinHandle<()>,
}

impl Drop for TestBridge {
    fn drop(&mut self) {
        self.server.abort();
    }
}

pub(crate) async fn start_bridge(
    broker: &InMemoryBroker,
    settings: BridgeSettings,
) -> TestBridge {
    integration_test_utils::init_logging();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("ephemeral port should bind");
    let address = listener.local_addr().expect("listener has an address");
    let app = router(Arc::new(broker.clone()), settings);
    let server = tokio::spawn(async move {
        let _ = serve(listener, app).await;
    });

    TestBridge {
        base_url: format!("http://{address}"),
        client: reqwest::Client::new(),
        server,
    }
}

impl TestBridge {
    pub(crate) fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Sends `body` and returns the status code and response text.
    pub(crate) async fn send(&self, method: Method, path: &str, body: &str) -> (u16, String) {
        let response = self
            .client
            .request(method, self.url(path))
            .body(body.to_string())
            .send()
            .await
            .expect("request should reach the bridge");
        let status = response.status().as_u16();
        let text = response.text().await.expect("response body should be text");
        (status, text)
    }

    #[allow(dead_code)]
    pub(crate) async fn open_stream(&self, path_and_query: &str) -> Response {
        self.client
            .get(self.url(path_and_query))
            .send()
            .await
            .expect("streaming request should reach the bridge")
    }

    #[allow(dead_code)]
    pub(crate) async fn declare_queue(&self, name: &str) {
        let (status, text) = self
            .send(Method::POST, "/queue", &format!(r#"{{"name":"{name}"}}"#))
            .await;
        assert_eq!((status, text.as_str()), (200, "declare queue ok"));
    }

    #[allow(dead_code)]
    pub(crate) async fn declare_exchange(&self, name: &str, kind: &str) {
        let (status, text) = self
            .send(
                Method::POST,
                "/exchange",
                &format!(r#"{{"name":"{name}","type":"{kind}"}}"#),
            )
            .await;
        assert_eq!((status, text.as_str()), (200, "declare exchange ok"));
    }

    #[allow(dead_code)]
    pub(crate) async fn bind(&self, queue: &str, exchange: &str, key: &str) {
        let (status, text) = self
            .send(
                Method::POST,
                "/queue/bind",
                &format!(r#"{{"queue":"{queue}","exchange":"{exchange}","keys":["{key}"]}}"#),
            )
            .await;
        assert_eq!((status, text.as_str()), (200, "bind queue ok"));
    }
}

/// Polls `condition` until it holds or `timeout` passes.
#[allow(dead_code)]
pub(crate) async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}

/// Splits a chunked response body into newline-terminated frames.
#[allow(dead_code)]
pub(crate) struct LineReader {
    chunks: BoxStream<'static, reqwest::Result<Bytes>>,
    buffer: Vec<u8>,
}

#[allow(dead_code)]
impl LineReader {
    pub(crate) fn new(response: Response) -> Self {
        Self {
            chunks: response.bytes_stream().boxed(),
            buffer: Vec::new(),
        }
    }

    /// Next frame without its trailing newline, or `None` on end of stream
    /// or timeout.
    pub(crate) async fn next_line(&mut self, timeout: Duration) -> Option<String> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(end) = self.buffer.iter().position(|byte| *byte == b'\n') {
                let line: Vec<u8> = self.buffer.drain(..=end).collect();
                return Some(String::from_utf8_lossy(&line[..end]).into_owned());
            }
            match tokio::time::timeout_at(deadline, self.chunks.next()).await {
                Ok(Some(Ok(chunk))) => self.buffer.extend_from_slice(&chunk),
                _ => return None,
            }
        }
    }

    /// True once the server has finished the response.
    pub(crate) async fn ended_within(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, self.chunks.next()).await {
                Ok(None) | Ok(Some(Err(_))) => return true,
                Ok(Some(Ok(chunk))) => self.buffer.extend_from_slice(&chunk),
                Err(_) => return false,
            }
        }
    }
}
