use std::time::Duration;

use regex::Regex;

use super::mock::MockReachability;
use super::{DeviceProbe, DeviceProber, Platform, ProbeError, ProbeSet, SessionSettings};
use crate::shell::mock::{MockConnector, MockDevice};
use crate::shell::{Credentials, DEFAULT_PROMPT_PATTERN};
use crate::topology::{DeviceAddress, DeviceType, NeighborLink, Protocol};

const ADDRESS: &str = "10.0.0.2";

const IOS_VERSION: &str = "\
Cisco IOS Software, C2960X Software (C2960X-UNIVERSALK9-M), Version 15.2(7)E4, RELEASE SOFTWARE (fc2)
cisco WS-C2960X-48TS-L (APM86XXX) processor (revision V0) with 524288K bytes of memory.
";

const LLDP_BRIEF: &str = "\
Capability codes:
    (R) Router, (B) Bridge, (T) Telephone, (C) DOCSIS Cable Device
    (W) WLAN Access Point, (P) Repeater, (S) Station, (O) Other

Device ID           Local Intf     Hold-time  Capability      Port ID
SW2.domain.local    Gi0/1          120        B               Gi0/2

Total entries displayed: 1
";

const CDP_DETAIL: &str = "\
-------------------------
Device ID: SW3.domain.local
Entry address(es):
  IP address: 10.0.0.3
Interface: GigabitEthernet1/0/1,  Port ID (outgoing port): GigabitEthernet0/24
";

fn settings() -> SessionSettings {
    SessionSettings {
        connect_timeout: Duration::from_secs(5),
        command_timeout: Duration::from_secs(5),
        prompt: Regex::new(DEFAULT_PROMPT_PATTERN).unwrap(),
    }
}

fn prober(
    reachable: &[&str],
    connector: MockConnector,
    credentials: Credentials,
) -> DeviceProber<MockReachability, MockConnector> {
    DeviceProber::new(
        MockReachability::reachable(reachable),
        connector,
        credentials,
        ProbeSet::new(&Platform::DEFAULT_ORDER).unwrap(),
        settings(),
    )
}

fn ios_device(extra: &[(&'static str, &'static str)]) -> MockConnector {
    let mut responses = vec![
        ("show version", IOS_VERSION),
        ("show running-config | include hostname", "hostname SW1"),
    ];
    responses.extend_from_slice(extra);
    MockConnector::new().with_device(ADDRESS, &responses)
}

async fn probe(
    prober: &DeviceProber<MockReachability, MockConnector>,
) -> Result<crate::topology::DeviceRecord, ProbeError> {
    prober.probe(&DeviceAddress::new(ADDRESS)).await
}

mod outcomes {
    use super::*;

    #[tokio::test]
    async fn unreachable_never_opens_a_session() {
        let prober = prober(&[], ios_device(&[]), Credentials::default());

        let result = probe(&prober).await;

        assert!(matches!(result, Err(ProbeError::Unreachable)));
        assert_eq!(prober.connector().opened(), 0);
    }

    #[tokio::test]
    async fn probed_device_carries_identity_and_neighbors() {
        let connector = ios_device(&[("show lldp neighbors", LLDP_BRIEF)]);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        let record = probe(&prober).await.unwrap();

        assert_eq!(record.short_name, "SW1");
        assert_eq!(record.address.as_str(), ADDRESS);
        assert_eq!(record.device_type, DeviceType::Ios);
        assert_eq!(record.vendor, "Cisco");
        assert_eq!(record.model, "WS-C2960X-48TS-L");
        assert_eq!(record.protocol, Protocol::Lldp);
        assert_eq!(record.neighbors, vec![NeighborLink::new("SW2", "Gi0/1", "Gi0/2")]);
    }

    #[tokio::test]
    async fn undetected_platform_is_reported() {
        let connector = MockConnector::new()
            .with_device(ADDRESS, &[("show version", "Hewlett Packard Enterprise Comware")]);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        assert!(matches!(probe(&prober).await, Err(ProbeError::Undetected)));
    }

    #[tokio::test]
    async fn rejected_login_is_authentication_failure() {
        let connector = MockConnector::new().with_behavior(ADDRESS, MockDevice::RejectsLogin);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        let err = probe(&prober).await.unwrap_err();

        assert!(matches!(err, ProbeError::Authentication(_)));
        assert_eq!(err.outcome(), "auth_failed");
    }

    #[tokio::test]
    async fn login_timeout_is_timeout() {
        let connector = MockConnector::new().with_behavior(ADDRESS, MockDevice::TimesOut);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        assert!(matches!(probe(&prober).await, Err(ProbeError::Timeout(_))));
    }

    #[tokio::test]
    async fn missing_hostname_defaults_to_unknown() {
        let connector = MockConnector::new().with_device(ADDRESS, &[("show version", IOS_VERSION)]);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        let record = probe(&prober).await.unwrap();

        assert_eq!(record.short_name, "Unknown");
    }

    #[tokio::test]
    async fn hostname_domain_is_stripped() {
        let connector = MockConnector::new().with_device(
            ADDRESS,
            &[
                ("show version", IOS_VERSION),
                ("show running-config | include hostname", "hostname SW1.corp.local"),
            ],
        );
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        assert_eq!(probe(&prober).await.unwrap().short_name, "SW1");
    }

    #[tokio::test]
    async fn enable_secret_enters_privileged_mode() {
        let connector = ios_device(&[]);
        let credentials = Credentials::with_password("admin", "pw").with_secret("en");
        let prober = prober(&[ADDRESS], connector, credentials);

        probe(&prober).await.unwrap();

        assert_eq!(prober.connector().privileged(), 1);
    }

    #[tokio::test]
    async fn rejected_enable_secret_fails_the_probe() {
        let connector = ios_device(&[]);
        let credentials = Credentials::with_password("admin", "pw").with_secret("");
        let prober = prober(&[ADDRESS], connector, credentials);

        assert!(matches!(probe(&prober).await, Err(ProbeError::Authentication(_))));
    }
}

mod session_lifecycle {
    use super::*;

    #[tokio::test]
    async fn closed_after_success() {
        let prober = prober(&[ADDRESS], ios_device(&[]), Credentials::default());

        probe(&prober).await.unwrap();

        assert_eq!(prober.connector().opened(), 1);
        assert_eq!(prober.connector().closed(), 1);
    }

    #[tokio::test]
    async fn closed_after_detection_failure() {
        let connector = MockConnector::new().with_device(ADDRESS, &[]);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        let _ = probe(&prober).await;

        assert_eq!(prober.connector().opened(), 1);
        assert_eq!(prober.connector().closed(), 1);
    }

    #[tokio::test]
    async fn closed_after_enable_failure() {
        let credentials = Credentials::with_password("admin", "pw").with_secret("");
        let prober = prober(&[ADDRESS], ios_device(&[]), credentials);

        let _ = probe(&prober).await;

        assert_eq!(prober.connector().closed(), 1);
    }
}

mod protocol_fallback {
    use super::*;

    #[tokio::test]
    async fn disabled_lldp_falls_back_to_cdp_detail() {
        let connector = ios_device(&[
            ("show lldp neighbors", "% LLDP is not enabled"),
            ("show cdp neighbors detail", CDP_DETAIL),
        ]);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        let record = probe(&prober).await.unwrap();

        assert_eq!(record.protocol, Protocol::Cdp);
        assert_eq!(
            record.neighbors,
            vec![NeighborLink::new(
                "SW3",
                "GigabitEthernet1/0/1",
                "GigabitEthernet0/24"
            )]
        );
    }

    #[tokio::test]
    async fn empty_brief_output_retries_detail() {
        let detail = "\
Local Intf: Gi0/1
Port id: Gi0/48
System Name: DIST-01.corp
";
        let connector = ios_device(&[
            ("show lldp neighbors", "Total entries displayed: 0"),
            ("show lldp neighbors detail", detail),
        ]);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        let record = probe(&prober).await.unwrap();

        assert_eq!(record.protocol, Protocol::Lldp);
        assert_eq!(record.neighbors, vec![NeighborLink::new("DIST-01", "Gi0/1", "Gi0/48")]);
    }

    #[tokio::test]
    async fn no_neighbors_is_not_a_failure() {
        let connector = ios_device(&[
            ("show lldp neighbors", "No LLDP neighbors found."),
            ("show lldp neighbors detail", ""),
        ]);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        let record = probe(&prober).await.unwrap();

        assert_eq!(record.protocol, Protocol::Lldp);
        assert!(record.neighbors.is_empty());
    }

    #[tokio::test]
    async fn lldp_without_neighbors_falls_through_to_cdp() {
        let connector = ios_device(&[
            ("show lldp neighbors", "Total entries displayed: 0"),
            ("show lldp neighbors detail", ""),
            ("show cdp neighbors detail", CDP_DETAIL),
        ]);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        let record = probe(&prober).await.unwrap();

        assert_eq!(record.protocol, Protocol::Cdp);
        assert_eq!(record.neighbors.len(), 1);
        assert_eq!(record.neighbors[0].neighbor, "SW3");
    }

    #[tokio::test]
    async fn first_running_protocol_kept_when_all_are_empty() {
        let connector = ios_device(&[
            ("show lldp neighbors", "No LLDP neighbors found."),
            ("show lldp neighbors detail", ""),
            ("show cdp neighbors detail", "Total cdp entries displayed : 0"),
        ]);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        let record = probe(&prober).await.unwrap();

        assert_eq!(record.protocol, Protocol::Lldp);
        assert!(record.neighbors.is_empty());
    }

    #[tokio::test]
    async fn no_usable_protocol_records_none() {
        let connector = ios_device(&[
            ("show lldp neighbors", "% Invalid input detected at '^' marker."),
            ("show cdp neighbors detail", "% CDP is not enabled"),
        ]);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        let record = probe(&prober).await.unwrap();

        assert_eq!(record.protocol, Protocol::None);
        assert!(record.neighbors.is_empty());
    }

    #[tokio::test]
    async fn fortinet_uses_status_for_hostname() {
        let status = "Version: FortiGate-60E v6.4.8,build1914\nHostname: FGT-EDGE-01\n";
        let connector = MockConnector::new().with_device(ADDRESS, &[("get system status", status)]);
        let prober = prober(&[ADDRESS], connector, Credentials::default());

        let record = probe(&prober).await.unwrap();

        assert_eq!(record.short_name, "FGT-EDGE-01");
        assert_eq!(record.device_type, DeviceType::Fortinet);
        assert_eq!(record.protocol, Protocol::None);
    }
}
