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

//! Runtime knobs shared by every request handled by one bridge instance.

use std::time::Duration;

pub const DEFAULT_CONFIRM_WINDOW: Duration = Duration::from_millis(100);
pub const DEFAULT_FAN_IN_CAPACITY: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// How long a publish waits for a return notification before it is
    /// reported as accepted.
    pub confirm_window: Duration,
    /// Slots in the fan-in channel between forwarders and the response writer.
    pub fan_in_capacity: usize,
    /// End the publish race early with `Accepted` when the broker positively
    /// confirms the message inside the window.
    pub accept_on_confirm: bool,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            confirm_window: DEFAULT_CONFIRM_WINDOW,
            fan_in_capacity: DEFAULT_FAN_IN_CAPACITY,
            accept_on_confirm: false,
        }
    }
}

impl BridgeSettings {
    pub fn with_confirm_window(mut self, confirm_window: Duration) -> Self {
        self.confirm_window = confirm_window;
        self
    }

    /// A zero capacity is bumped to one; tokio channels need at least one slot.
    pub fn with_fan_in_capacity(mut self, fan_in_capacity: usize) -> Self {
        self.fan_in_capacity = fan_in_capacity.max(1);
        self
    }

    pub fn with_accept_on_confirm(mut self, accept_on_confirm: bool) -> Self {
        self.accept_on_confirm = accept_on_confirm;
        self
    }
}
