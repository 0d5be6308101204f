// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for the notification endpoint.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    notifications: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let notifications = IntCounterVec::new(
            Opts::new(
                "move_car_notifications_total",
                "Notification requests by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(notifications.clone()))?;

        Ok(Self {
            registry,
            notifications,
        })
    }

    /// Count one notification request with the given outcome label.
    pub fn record(&self, outcome: &str) {
        self.notifications.with_label_values(&[outcome]).inc();
    }

    /// Render all metrics in the text exposition format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
