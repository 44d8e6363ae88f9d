//! Topology comparison tests against the scripted mock southbound.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tsn_compare::TopologyVerifier;
use tsn_job::JobKind;
use tsn_model::{CompareControl, Project};
use tsn_southbound::LldpNeighbor;
use tsn_testutil::{fixtures, MockSouthbound};
use tsn_types::{DeviceId, InterfaceId, MacAddress};

const MAC_1: &str = "00:90:e8:00:00:01";
const MAC_2: &str = "00:90:e8:00:00:02";

fn mac(s: &str) -> MacAddress {
    s.parse().unwrap()
}

fn ip(last: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, last)
}

/// Two switches joined by one designed link (1,1)-(2,2).
fn linked_project() -> Project {
    fixtures::project(
        vec![
            fixtures::switch(1, [10, 0, 0, 1], MAC_1),
            fixtures::switch(2, [10, 0, 0, 2], MAC_2),
        ],
        vec![fixtures::link(1, (1, 1), (2, 2), 1000)],
    )
}

fn neighbor(local: i64, remote_mac: &str, remote: i64) -> LldpNeighbor {
    LldpNeighbor {
        local_interface: InterfaceId(local),
        remote_chassis_mac: mac(remote_mac),
        remote_interface: InterfaceId(remote),
    }
}

fn new_verifier(southbound: &Arc<MockSouthbound>) -> TopologyVerifier {
    tsn_testutil::init_tracing();
    TopologyVerifier::new(Arc::clone(southbound) as Arc<dyn tsn_southbound::Southbound>)
}

async fn wait_done(verifier: &TopologyVerifier) {
    while verifier.status().is_running() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn reversed_live_link_satisfies_the_designed_link() {
    // The live topology reports the cable only from device 2's side, with
    // the endpoints swapped relative to the design.
    let southbound = Arc::new(
        MockSouthbound::new()
            .with_ip_mac([(ip(1), mac(MAC_1)), (ip(2), mac(MAC_2))])
            .with_lldp(DeviceId(2), vec![neighbor(2, MAC_1, 1)]),
    );

    let verifier = new_verifier(&southbound);
    verifier
        .start(
            linked_project(),
            vec![DeviceId(1), DeviceId(2)],
            CompareControl {
                topology_consistent: true,
                ..CompareControl::default()
            },
        )
        .unwrap();
    wait_done(&verifier).await;

    let findings = verifier.findings();
    assert!(findings.is_clean(), "unexpected findings: {findings:?}");
    assert_eq!(verifier.status().kind, JobKind::Finished);
    assert_eq!(verifier.status().progress, 100);
}

#[tokio::test(start_paused = true)]
async fn missing_and_extra_links_are_classified_separately() {
    // The live topology has a cable on different ports than designed.
    let southbound = Arc::new(
        MockSouthbound::new()
            .with_ip_mac([(ip(1), mac(MAC_1)), (ip(2), mac(MAC_2))])
            .with_lldp(DeviceId(1), vec![neighbor(3, MAC_2, 4)]),
    );

    let verifier = new_verifier(&southbound);
    verifier
        .start(
            linked_project(),
            vec![DeviceId(1), DeviceId(2)],
            CompareControl {
                topology_consistent: true,
                ..CompareControl::default()
            },
        )
        .unwrap();
    wait_done(&verifier).await;

    let findings = verifier.findings();
    assert_eq!(findings.links_not_found.len(), 1);
    assert!(findings.links_not_found.contains("10.0.0.1(1)-10.0.0.2(2)"));
    assert_eq!(findings.links_extra.len(), 1);
    assert!(findings.links_extra.contains("10.0.0.1(3)-10.0.0.2(4)"));
    assert_eq!(verifier.status().kind, JobKind::Failed);
}

#[tokio::test(start_paused = true)]
async fn under_reported_speed_is_recorded_once_per_link() {
    // Both endpoints report 100 Mbps against a 1000 Mbps design.
    let southbound = Arc::new(
        MockSouthbound::new()
            .with_port_speeds(DeviceId(1), [(1, 100)])
            .with_port_speeds(DeviceId(2), [(2, 100)]),
    );

    let verifier = new_verifier(&southbound);
    verifier
        .start(
            linked_project(),
            vec![DeviceId(1), DeviceId(2)],
            CompareControl {
                link_speed: true,
                ..CompareControl::default()
            },
        )
        .unwrap();
    wait_done(&verifier).await;

    let findings = verifier.findings();
    assert_eq!(findings.speed_failed.len(), 1);
    assert!(findings.speed_failed.contains("10.0.0.1(1)-10.0.0.2(2)"));
}

#[tokio::test(start_paused = true)]
async fn unknown_live_speed_cannot_fail_the_check() {
    // Device 1 reports no speed for the linked port, device 2 reports
    // plenty.
    let southbound = Arc::new(
        MockSouthbound::new()
            .with_port_speeds(DeviceId(1), [(1, 0)])
            .with_port_speeds(DeviceId(2), [(2, 1000)]),
    );

    let verifier = new_verifier(&southbound);
    verifier
        .start(
            linked_project(),
            vec![DeviceId(1), DeviceId(2)],
            CompareControl {
                link_speed: true,
                ..CompareControl::default()
            },
        )
        .unwrap();
    wait_done(&verifier).await;

    assert!(verifier.findings().is_clean());
    assert_eq!(verifier.status().kind, JobKind::Finished);
}

#[tokio::test(start_paused = true)]
async fn model_name_mismatch_is_a_finding() {
    let southbound = Arc::new(MockSouthbound::new().with_model_name(DeviceId(2), "TSN-G5004"));

    let verifier = new_verifier(&southbound);
    verifier
        .start(
            linked_project(),
            vec![DeviceId(1), DeviceId(2)],
            CompareControl {
                model_name: true,
                ..CompareControl::default()
            },
        )
        .unwrap();
    wait_done(&verifier).await;

    let findings = verifier.findings();
    assert_eq!(findings.model_name_failed.len(), 1);
    assert!(findings.model_name_failed.contains("10.0.0.2"));
    assert_eq!(verifier.status().kind, JobKind::Failed);
}

#[tokio::test(start_paused = true)]
async fn hybrid_vlan_capability_must_be_consistent() {
    let southbound = Arc::new(MockSouthbound::new());
    let mut project = linked_project();
    project.devices[1]
        .feature_group
        .configuration
        .vlan
        .hybrid_mode = false;

    let verifier = new_verifier(&southbound);
    verifier
        .start(
            project,
            vec![DeviceId(1), DeviceId(2)],
            CompareControl {
                hybrid_vlan_consistent: true,
                ..CompareControl::default()
            },
        )
        .unwrap();
    wait_done(&verifier).await;

    let findings = verifier.findings();
    assert_eq!(findings.hybrid_vlan_failed.len(), 1);
    assert!(findings.hybrid_vlan_failed.contains("10.0.0.2"));
}

#[tokio::test(start_paused = true)]
async fn dead_devices_land_in_the_alive_findings() {
    let southbound = Arc::new(MockSouthbound::new().with_unreachable(ip(2)));

    let verifier = new_verifier(&southbound);
    verifier
        .start(
            linked_project(),
            vec![DeviceId(1), DeviceId(2)],
            CompareControl {
                alive: true,
                ..CompareControl::default()
            },
        )
        .unwrap();
    wait_done(&verifier).await;

    let findings = verifier.findings();
    assert_eq!(findings.alive_failed.len(), 1);
    assert!(findings.alive_failed.contains("10.0.0.2"));
}

#[tokio::test(start_paused = true)]
async fn unusable_static_forward_mac_is_a_config_finding() {
    let southbound = Arc::new(MockSouthbound::new());
    let mut project = linked_project();
    // A multicast MAC in the unicast forwarding table.
    project.device_config.unicast_static_forwards.insert(
        DeviceId(1),
        fixtures::static_forward_table(1, &["01:00:5e:00:00:01"]),
    );

    let verifier = new_verifier(&southbound);
    verifier
        .start(
            project,
            vec![DeviceId(1), DeviceId(2)],
            CompareControl {
                device_config: true,
                ..CompareControl::default()
            },
        )
        .unwrap();
    wait_done(&verifier).await;

    let findings = verifier.findings();
    assert_eq!(findings.device_config_failed.len(), 1);
    assert!(findings.device_config_failed.contains("10.0.0.1"));
}

#[tokio::test(start_paused = true)]
async fn end_stations_and_their_links_are_excluded() {
    let southbound = Arc::new(MockSouthbound::new());
    let project = fixtures::project(
        vec![
            fixtures::switch(1, [10, 0, 0, 1], MAC_1),
            fixtures::end_station(3, [10, 0, 0, 3], "00:90:e8:00:00:03"),
        ],
        // A link to an end station is outside the comparison.
        vec![fixtures::link(1, (1, 1), (3, 1), 1000)],
    );

    let verifier = new_verifier(&southbound);
    // Empty id list: compare every deployable device of the project.
    verifier
        .start(
            project,
            vec![],
            CompareControl {
                topology_consistent: true,
                ..CompareControl::default()
            },
        )
        .unwrap();
    wait_done(&verifier).await;

    assert!(verifier.findings().is_clean());
    // Only the switch was touched.
    assert_eq!(southbound.count("refresh_connect_status 1"), 1);
    assert_eq!(southbound.count("refresh_connect_status 3"), 0);
}

#[tokio::test(start_paused = true)]
async fn unknown_requested_device_fails_the_job() {
    let southbound = Arc::new(MockSouthbound::new());

    let verifier = new_verifier(&southbound);
    verifier
        .start(
            linked_project(),
            vec![DeviceId(1), DeviceId(99)],
            CompareControl::all_checks(),
        )
        .unwrap();
    wait_done(&verifier).await;

    let state = verifier.status();
    assert_eq!(state.kind, JobKind::Failed);
    assert!(state.message.contains("device 99 not found"));
}
