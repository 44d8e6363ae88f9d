//! Southbound client contract.
//!
//! The protocol clients that actually speak SNMP/NETCONF/RESTful/ICMP/ARP/
//! LLDP to devices live outside this workspace. The orchestration pipelines
//! only depend on the [`Southbound`] trait defined here: every call is
//! fallible, synchronous from the pipeline's point of view (awaited to
//! completion), and carries no assumption about the wire protocol behind
//! it.

mod client;
mod error;

pub use client::{LldpNeighbor, Southbound};
pub use error::{SouthboundError, SouthboundResult};
