// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Move-Car Notifier
//!
//! A small web service for a parked car. Visitors get an informational page
//! with two ways to reach the owner:
//!
//! - A push notification relayed through WxPusher (`POST /sendNotification`)
//! - A direct phone call (`tel:` link on the page)
//!
//! Notification requests are checked for method, origin and a per-client
//! fixed-window rate limit (3 requests per 60 seconds by default) before a
//! single delivery attempt is made.

pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod limiter;
pub mod metrics;
pub mod page;
pub mod relay;
pub mod validator;

pub use config::Config;
pub use error::{NotificationResult, RelayError};
pub use gateway::{PushGateway, WxPusherClient};
pub use limiter::{RateLimitResult, RateLimiter};
pub use relay::NotificationRelay;
pub use validator::{RequestValidator, ValidationResult};
