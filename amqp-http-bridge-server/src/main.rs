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

mod config;

use crate::config::{Config, DEFAULT_AMQP_URI};
use amqp_http_bridge::{router, serve, AmqpConnector};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Expose an AMQP broker over HTTP")]
struct BridgeArgs {
    /// json5 configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,
    /// Listen address, overrides `http.address`.
    #[arg(short, long, value_name = "HOST:PORT")]
    address: Option<String>,
    /// Broker URI, overrides `broker.uri`.
    #[arg(long, value_name = "URI")]
    amqp: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let args = BridgeArgs::parse();
    let config = match args.config.as_deref() {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let settings = config.resolve(args.address, args.amqp)?;

    if settings.amqp_uri == DEFAULT_AMQP_URI {
        warn!("using default broker credentials");
    }
    info!(
        address = %settings.address,
        confirm_window_ms = settings.bridge.confirm_window.as_millis() as u64,
        fan_in_capacity = settings.bridge.fan_in_capacity,
        accept_on_confirm = settings.bridge.accept_on_confirm,
        "Started amqp-http-bridge"
    );

    let connector = Arc::new(AmqpConnector::new(settings.amqp_uri));
    let listener = tokio::net::TcpListener::bind(settings.address).await?;

    tokio::select! {
        served = serve(listener, router(connector, settings.bridge)) => served?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    Ok(())
}
