//! Topology verification for TSN networks.
//!
//! A parallel job to deployment: discovers the live topology over the
//! southbound client (LLDP neighborships, ICMP reachability, model and
//! port-speed queries) and compares it against the designed topology,
//! producing a structured diff instead of failing fast, so operators see
//! the full extent of the drift in one pass.

mod comparer;
mod error;

pub use comparer::TopologyVerifier;
pub use error::{CompareError, CompareResult};
