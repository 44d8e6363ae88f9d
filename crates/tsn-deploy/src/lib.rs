//! Deployment orchestration for TSN switch fleets.
//!
//! Takes the configuration artifact produced by the upstream design engine
//! and pushes it onto the physical devices in a safe, ordered, retryable
//! way:
//!
//! - [`check_device_features`]: the capability gate, failing fast before
//!   any configuration call when a device's firmware cannot honor the
//!   artifact.
//! - [`ReachabilityBootstrap`]: temporary address-resolution seeding for
//!   devices whose designed address is not live yet.
//! - [`DeploymentOrchestrator`]: the cancellable pipeline itself, one
//!   device at a time, per-device failure isolation, and a bounded
//!   synchronization-retry protocol for devices that apply configuration
//!   asynchronously.

mod deployer;
mod error;
mod feature_check;
mod reachability;

pub use deployer::{DeploymentOrchestrator, SYNC_RETRY_LIMIT};
pub use error::{DeployError, DeployResult};
pub use feature_check::check_device_features;
pub use reachability::ReachabilityBootstrap;
