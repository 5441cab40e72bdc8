//! Adaptive performance governor for a wearable companion app
//!
//! This crate provides the core functionality for:
//! - Frame, memory and thermal sampling into fixed-capacity rolling buffers
//! - Composite performance scoring and level classification
//! - Context- and power-aware optimization policy
//! - Tiered memory-pressure cleanup
//! - Health checks and observability

pub mod buffer;
pub mod config;
pub mod context;
pub mod error;
pub mod governor;
pub mod health;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod policy;
pub mod power;
pub mod pressure;
pub mod runtime;
pub mod scorer;
pub mod subscription;
pub mod subsystems;

pub use config::GovernorConfig;
pub use error::{GovernorError, Result};
pub use governor::{Governor, GovernorBuilder};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{GovernorMetrics, StructuredLogger};
pub use runtime::{GovernorHandle, GovernorRuntime};
pub use subscription::{GovernorNotification, Subscription};
