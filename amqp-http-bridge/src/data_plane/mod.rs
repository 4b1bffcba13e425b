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

//! Data-plane layer.
//!
//! Owns the two message paths through the bridge: the publish race that
//! turns an asynchronous broker return into a synchronous HTTP verdict, and
//! the consumption bridge that fans deliveries from several queues into one
//! streamed HTTP response.
//!
//! Both paths run on a [`Session`](crate::Session) owned by the request and
//! leave it closed when they finish.

pub(crate) mod consumption_bridge;
pub(crate) mod disconnect_watcher;
pub(crate) mod publish_race;
pub(crate) mod queue_forwarder;
