//! Temporary address-resolution bootstrap.
//!
//! Offline-designed devices and devices discovered by broadcast search are
//! not reachable at their designed address through normal resolution. For
//! the duration of one southbound operation the bootstrap seeds a static
//! entry mapping the target address to the device's MAC via the host
//! adapter it was last seen on, and removes the entry afterwards whether
//! the operation succeeded or not.

use crate::error::{DeployError, DeployResult};
use std::collections::HashMap;
use std::future::Future;
use std::net::Ipv4Addr;
use tracing::{debug, warn};
use tsn_southbound::Southbound;
use tsn_types::MacAddress;

/// Resolves how to reach a device that is only known by MAC.
#[derive(Debug, Clone, Default)]
pub struct ReachabilityBootstrap {
    /// Which host adapter address each discovered MAC was seen behind.
    mac_host_map: HashMap<MacAddress, Ipv4Addr>,
}

impl ReachabilityBootstrap {
    pub fn new(mac_host_map: HashMap<MacAddress, Ipv4Addr>) -> Self {
        ReachabilityBootstrap { mac_host_map }
    }

    /// The host adapter behind which `mac` was discovered.
    ///
    /// A missing entry aborts only the current device's step, never the
    /// whole job.
    pub fn host_for(&self, mac: MacAddress) -> DeployResult<Ipv4Addr> {
        self.mac_host_map
            .get(&mac)
            .copied()
            .ok_or(DeployError::MacHostNotFound { mac })
    }

    /// Runs `op` with a temporary address-resolution entry for
    /// `address -> mac` in place.
    ///
    /// The entry is removed after `op` completes, on the success and the
    /// error path alike; a failed removal is logged but does not override
    /// the operation's outcome.
    pub async fn with_mapping<T, F>(
        &self,
        southbound: &dyn Southbound,
        address: Ipv4Addr,
        mac: MacAddress,
        op: F,
    ) -> DeployResult<T>
    where
        F: Future<Output = DeployResult<T>>,
    {
        let host = self.host_for(mac)?;
        debug!(
            "seeding address-resolution entry {} -> {} via host {}",
            address, mac, host
        );
        southbound.arp_seed(address, mac, host).await?;

        let outcome = op.await;

        if let Err(e) = southbound.arp_delete(address).await {
            warn!(
                "failed to remove temporary address-resolution entry for {}: {}",
                address, e
            );
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsn_southbound::SouthboundError;
    use tsn_testutil::MockSouthbound;

    fn mac() -> MacAddress {
        "00:90:e8:aa:bb:cc".parse().unwrap()
    }

    #[test]
    fn unknown_mac_is_not_found() {
        let bootstrap = ReachabilityBootstrap::default();
        let err = bootstrap.host_for(mac()).unwrap_err();
        assert!(matches!(err, DeployError::MacHostNotFound { .. }));
    }

    #[tokio::test]
    async fn mapping_is_seeded_and_removed_around_the_operation() {
        let host = "192.168.0.10".parse().unwrap();
        let target = "10.0.0.5".parse().unwrap();
        let bootstrap = ReachabilityBootstrap::new(HashMap::from([(mac(), host)]));
        let southbound = MockSouthbound::new();

        let value = bootstrap
            .with_mapping(&southbound, target, mac(), async { Ok(17) })
            .await
            .unwrap();
        assert_eq!(value, 17);

        let calls = southbound.calls();
        assert_eq!(calls[0], "arp_seed 10.0.0.5");
        assert_eq!(calls[1], "arp_delete 10.0.0.5");
    }

    #[tokio::test]
    async fn mapping_is_removed_when_the_operation_fails() {
        let host = "192.168.0.10".parse().unwrap();
        let target = "10.0.0.5".parse().unwrap();
        let bootstrap = ReachabilityBootstrap::new(HashMap::from([(mac(), host)]));
        let southbound = MockSouthbound::new();

        let result: DeployResult<()> = bootstrap
            .with_mapping(&southbound, target, mac(), async {
                Err(SouthboundError::operation("probe", "boom").into())
            })
            .await;
        assert!(result.is_err());

        let calls = southbound.calls();
        assert!(calls.contains(&"arp_delete 10.0.0.5".to_string()));
    }
}
