//! Tests for topology exports.

use tempfile::TempDir;

use super::*;
use crate::topology::{DeviceAddress, DeviceRecord, DeviceType, NeighborLink, Protocol};

fn record(name: &str, ip: &str, neighbors: &[(&str, &str, &str)]) -> DeviceRecord {
    DeviceRecord {
        short_name: name.to_string(),
        address: DeviceAddress::new(ip),
        device_type: DeviceType::Ios,
        vendor: "Cisco".to_string(),
        model: "WS-C2960X-48TS-L".to_string(),
        protocol: Protocol::Lldp,
        neighbors: neighbors
            .iter()
            .map(|(n, l, r)| NeighborLink::new(n, *l, *r))
            .collect(),
    }
}

/// CORE is wired to ACC1 and ACC2; ACC1 reports the link back.
fn star() -> TopologySnapshot {
    let mut snapshot = TopologySnapshot::new("20240101_120000");
    snapshot
        .insert_device(record(
            "CORE",
            "10.0.0.1",
            &[("ACC1", "Gi1/0/1", "Gi0/48"), ("ACC2", "Gi1/0/2", "Gi0/48")],
        ))
        .unwrap();
    snapshot
        .insert_device(record("ACC1", "10.0.0.2", &[("CORE", "Gi0/48", "Gi1/0/1")]))
        .unwrap();
    snapshot
}

mod flattening {
    use super::*;

    #[test]
    fn one_row_per_link() {
        let rows = rows(&star());

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            TopologyRow {
                device: "ACC1".to_string(),
                ip: "10.0.0.2".to_string(),
                neighbor: "CORE".to_string(),
                local_interface: "Gi0/48".to_string(),
                remote_interface: "Gi1/0/1".to_string(),
                protocol: "LLDP".to_string(),
            }
        );
    }

    #[test]
    fn device_without_neighbors_has_no_rows() {
        let mut snapshot = TopologySnapshot::new("t");
        snapshot.insert_device(record("LONE", "10.0.0.9", &[])).unwrap();

        assert!(rows(&snapshot).is_empty());
    }

    #[test]
    fn connections_group_neighbors() {
        let rows = rows(&star());
        let map = connections(&rows);

        assert_eq!(map["CORE"].iter().copied().collect::<Vec<_>>(), vec!["ACC1", "ACC2"]);
        assert_eq!(map["ACC1"].len(), 1);
    }
}

mod roles {
    use super::*;

    #[test]
    fn hub_is_distribution_leaves_are_access() {
        let roles = classify_roles(&rows(&star()));

        assert_eq!(roles["CORE"], Role::Distribution);
        assert_eq!(roles["ACC1"], Role::Access);
        // Never probed, known only as a neighbor.
        assert_eq!(roles["ACC2"], Role::Access);
    }

    #[test]
    fn parallel_links_count_once() {
        let mut snapshot = TopologySnapshot::new("t");
        snapshot
            .insert_device(record(
                "SW1",
                "10.0.0.1",
                &[("SW2", "Gi0/1", "Gi0/1"), ("SW2", "Gi0/2", "Gi0/2")],
            ))
            .unwrap();

        let roles = classify_roles(&rows(&snapshot));

        assert_eq!(roles["SW1"], Role::Access);
        assert_eq!(roles["SW2"], Role::Access);
    }

    #[test]
    fn display_names() {
        assert_eq!(Role::Distribution.to_string(), "distribution");
        assert_eq!(Role::Access.to_string(), "access");
    }
}

mod csv_table {
    use super::*;

    #[test]
    fn has_header_and_rows() {
        let bytes = to_csv(&rows(&star())).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Device,IP,Neighbor,Local Interface,Remote Interface,Protocol"
        );
        assert_eq!(lines[1], "ACC1,10.0.0.2,CORE,Gi0/48,Gi1/0/1,LLDP");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn empty_rows_give_header_only() {
        let text = String::from_utf8(to_csv(&[]).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}

mod graphviz {
    use super::*;

    #[test]
    fn reverse_links_are_drawn_once() {
        let dot = to_dot(&rows(&star())).unwrap();

        let edges: Vec<&str> = dot.lines().filter(|l| l.contains(" -- ")).collect();
        assert_eq!(edges.len(), 2);
        // First row for the pair wins: ACC1's view of the link.
        assert!(edges[0].contains(r#""ACC1" -- "CORE""#));
        assert!(edges[0].contains(r#"taillabel="Gi0/48""#));
        assert!(edges[0].contains(r#"headlabel="Gi1/0/1""#));
    }

    #[test]
    fn devices_are_clustered_by_role() {
        let dot = to_dot(&rows(&star())).unwrap();

        let distribution = dot.find("cluster_distribution").unwrap();
        let access = dot.find("cluster_access").unwrap();
        let core = dot.find(r#""CORE";"#).unwrap();
        let acc1 = dot.find(r#""ACC1";"#).unwrap();

        assert!(distribution < core && core < access);
        assert!(access < acc1);
        assert!(dot.starts_with("graph topology {"));
    }

    #[test]
    fn quotes_in_names_are_escaped() {
        let rows = vec![TopologyRow {
            device: "A\"B".to_string(),
            ip: "10.0.0.1".to_string(),
            neighbor: "C".to_string(),
            local_interface: "Gi0/1".to_string(),
            remote_interface: "Gi0/2".to_string(),
            protocol: "CDP".to_string(),
        }];

        let dot = to_dot(&rows).unwrap();

        assert!(dot.contains(r#""A\"B" -- "C""#));
    }
}

mod artifact_writer {
    use super::*;

    #[tokio::test]
    async fn writes_csv_and_dot_named_by_timestamp() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("out"));

        let artifacts = writer.write(&star()).await.unwrap();

        assert_eq!(artifacts.csv, dir.path().join("out/topology_20240101_120000.csv"));
        assert_eq!(artifacts.dot, dir.path().join("out/topology_20240101_120000.dot"));
        assert!(std::fs::read_to_string(&artifacts.csv).unwrap().contains("CORE"));
        assert!(std::fs::read_to_string(&artifacts.dot).unwrap().contains(" -- "));
    }

    #[tokio::test]
    async fn export_hook_writes_artifacts() {
        let dir = TempDir::new().unwrap();
        let writer = ArtifactWriter::new(dir.path());

        writer.export(&star()).await.unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}

#[cfg(unix)]
mod command_hook {
    use super::*;

    #[tokio::test]
    async fn successful_command_is_ok() {
        let hook = CommandHook::new("sh", vec!["-c".to_string(), "exit 0".to_string()]);
        assert!(hook.export(&star()).await.is_ok());
    }

    #[tokio::test]
    async fn non_zero_exit_is_status_error() {
        let hook = CommandHook::new("sh", vec!["-c".to_string(), "exit 3".to_string()]);

        let err = hook.export(&star()).await.unwrap_err();

        assert!(matches!(err, ExportError::Status { .. }));
        assert!(err.to_string().contains("sh -c exit 3"));
    }

    #[tokio::test]
    async fn receives_snapshot_timestamp() {
        let script = format!(r#"test "${SNAPSHOT_TIMESTAMP_ENV}" = 20240101_120000"#);
        let hook = CommandHook::new("sh", vec!["-c".to_string(), script]);

        assert!(hook.export(&star()).await.is_ok());
    }

    #[tokio::test]
    async fn passes_extra_environment() {
        let hook = CommandHook::new(
            "sh",
            vec!["-c".to_string(), r#"test "$ARGUS_SSH_PASSWORD" = hunter2"#.to_string()],
        )
        .with_env("ARGUS_SSH_PASSWORD", "hunter2");

        assert!(hook.export(&star()).await.is_ok());
    }

    #[test]
    fn debug_hides_environment_values() {
        let hook = CommandHook::new("argus-topo", vec![]).with_env("ARGUS_SSH_PASSWORD", "hunter2");

        let shown = format!("{hook:?}");

        assert!(shown.contains("ARGUS_SSH_PASSWORD"));
        assert!(!shown.contains("hunter2"));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let hook = CommandHook::new("/nonexistent/argus-export", vec![]);

        let err = hook.export(&star()).await.unwrap_err();

        assert!(matches!(err, ExportError::Spawn { .. }));
    }
}
