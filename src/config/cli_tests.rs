//! Tests for CLI argument parsing.

use std::path::PathBuf;

use super::cli::{Cli, Command};

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_args() {
        let cli = Cli::parse_from_iter([
            "argus-topo",
            "--device",
            "10.0.0.1",
            "--username",
            "admin",
        ]);

        assert!(cli.command.is_none());
        assert_eq!(cli.devices, vec!["10.0.0.1"]);
        assert_eq!(cli.username.as_deref(), Some("admin"));
        assert!(!cli.dry_run);
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_repeated_devices_in_order() {
        let cli = Cli::parse_from_iter([
            "argus-topo",
            "--device",
            "10.0.0.2",
            "--device",
            "core-sw1",
            "--device",
            "10.0.0.1",
        ]);

        assert_eq!(cli.devices, vec!["10.0.0.2", "core-sw1", "10.0.0.1"]);
    }

    #[test]
    fn parse_authentication_options() {
        let cli = Cli::parse_from_iter([
            "argus-topo",
            "--password",
            "hunter2",
            "--secret",
            "enable",
            "--key-file",
            "/home/ops/.ssh/id_ed25519",
        ]);

        assert_eq!(cli.password.as_deref(), Some("hunter2"));
        assert_eq!(cli.secret.as_deref(), Some("enable"));
        assert_eq!(
            cli.key_file,
            Some(PathBuf::from("/home/ops/.ssh/id_ed25519"))
        );
    }

    #[test]
    fn parse_monitor_options() {
        let cli = Cli::parse_from_iter([
            "argus-topo",
            "--interval",
            "300",
            "--snapshot-dir",
            "/var/lib/argus",
            "--output-dir",
            "/srv/topology",
            "--concurrency",
            "16",
            "--dry-run",
            "-v",
        ]);

        assert_eq!(cli.interval, Some(300));
        assert_eq!(cli.snapshot_dir, Some(PathBuf::from("/var/lib/argus")));
        assert_eq!(cli.output_dir, Some(PathBuf::from("/srv/topology")));
        assert_eq!(cli.concurrency, Some(16));
        assert!(cli.dry_run);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from_iter(["argus-topo", "-c", "argus.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("argus.toml")));
    }

    #[test]
    fn parse_rejects_non_numeric_interval() {
        let result = <Cli as clap::Parser>::try_parse_from(["argus-topo", "--interval", "soon"]);
        assert!(result.is_err());
    }
}

mod subcommands {
    use super::*;

    #[test]
    fn init_uses_default_output() {
        let cli = Cli::parse_from_iter(["argus-topo", "init"]);

        assert!(cli.is_init());
        assert_eq!(
            cli.command,
            Some(Command::Init {
                output: PathBuf::from("argus-topo.toml")
            })
        );
    }

    #[test]
    fn init_with_custom_output() {
        let cli = Cli::parse_from_iter(["argus-topo", "init", "-o", "/etc/argus.toml"]);

        assert_eq!(
            cli.command,
            Some(Command::Init {
                output: PathBuf::from("/etc/argus.toml")
            })
        );
    }

    #[test]
    fn discover_is_detected() {
        let cli = Cli::parse_from_iter(["argus-topo", "discover"]);

        assert!(cli.is_discover());
        assert!(!cli.is_init());
    }

    #[test]
    fn monitor_is_not_discover() {
        let cli = Cli::parse_from_iter(["argus-topo", "monitor"]);

        assert_eq!(cli.command, Some(Command::Monitor));
        assert!(!cli.is_discover());
    }

    #[test]
    fn global_options_follow_subcommand() {
        let cli = Cli::parse_from_iter([
            "argus-topo",
            "discover",
            "--config",
            "argus.toml",
            "--device",
            "10.0.0.1",
        ]);

        assert!(cli.is_discover());
        assert_eq!(cli.config, Some(PathBuf::from("argus.toml")));
        assert_eq!(cli.devices, vec!["10.0.0.1"]);
    }
}
