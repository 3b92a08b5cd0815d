//! Tests for the app module.

use super::*;
use argus_topo::config::{Cli, TomlConfig};
use argus_topo::probe::UnknownPlatform;

fn config(args: &[&str], toml: Option<&str>) -> ValidatedConfig {
    let mut full_args = vec![
        "argus-topo",
        "--device",
        "10.0.0.1",
        "--device",
        "10.0.0.2",
        "--device",
        "10.0.0.3",
        "--username",
        "admin",
        "--password",
        "secret",
        "--snapshot-dir",
        "/var/lib/argus",
        "--output-dir",
        "/srv/topology",
    ];
    full_args.extend(args);
    let cli = Cli::parse_from_iter(full_args);
    let toml = toml.map(|content| TomlConfig::parse(content).unwrap());
    ValidatedConfig::from_raw(&cli, toml.as_ref()).unwrap()
}

mod mode {
    use super::*;

    #[test]
    fn discover_flag_selects_single_pass() {
        assert_eq!(Mode::from_discover(true), Mode::Discover);
        assert_eq!(Mode::from_discover(false), Mode::Monitor);
        assert!(Mode::Discover.is_discover());
        assert!(!Mode::Monitor.is_discover());
    }
}

mod startup {
    use super::*;

    #[test]
    fn discover_names_devices_and_directories() {
        let message = startup_message(Mode::Discover, &config(&[], None));

        assert!(message.starts_with("Discovering 3 device(s) once"));
        assert!(message.contains("/var/lib/argus"));
        assert!(message.contains("/srv/topology"));
    }

    #[test]
    fn monitor_names_interval_and_default_export() {
        let message = startup_message(Mode::Monitor, &config(&["--interval", "300"], None));

        assert!(message.starts_with("Monitoring 3 device(s) every 300s"));
        assert!(message.ends_with("on change, 'argus-topo discover' runs"));
    }

    #[test]
    fn monitor_mentions_configured_export_command() {
        let config = config(&[], Some("[export]\ncommand = [\"/usr/local/bin/render\"]\n"));

        let message = startup_message(Mode::Monitor, &config);

        assert!(message.ends_with("on change, configured export command runs"));
    }

    #[test]
    fn dry_run_takes_precedence_over_export_command() {
        let config = config(
            &["--dry-run"],
            Some("[export]\ncommand = [\"/usr/local/bin/render\"]\n"),
        );

        let message = startup_message(Mode::Monitor, &config);

        assert!(message.contains("(dry run)"));
    }
}

mod hints {
    use super::*;

    #[test]
    fn missing_devices_points_to_init() {
        let error = ConfigError::missing(field::DEVICES, "Use --device");
        assert!(config_hint(&error).unwrap().contains("argus-topo init"));
    }

    #[test]
    fn missing_credentials_has_no_extra_hint() {
        let error = ConfigError::missing(field::AUTHENTICATION, "Use --password");
        assert_eq!(config_hint(&error), None);
    }

    #[test]
    fn unreadable_file_points_to_init() {
        let error = ConfigError::FileRead {
            path: "argus.toml".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(config_hint(&error).unwrap().contains("argus-topo init"));
    }

    #[test]
    fn unknown_platform_lists_every_platform() {
        let error = ConfigError::from(UnknownPlatform("junos".to_string()));

        let hint = config_hint(&error).unwrap();

        for platform in Platform::DEFAULT_ORDER {
            assert!(hint.contains(platform.name()), "{hint}");
        }
    }

    #[test]
    fn invalid_prompt_shows_an_example() {
        let error = ConfigError::InvalidRegex {
            pattern: "[".to_string(),
            source: regex::Regex::new("[").unwrap_err(),
        };
        assert!(config_hint(&error).unwrap().contains("prompt pattern"));
    }

    #[test]
    fn empty_export_command_explains_default() {
        assert!(
            config_hint(&ConfigError::EmptyCommand)
                .unwrap()
                .contains("argus-topo discover")
        );
    }

    #[test]
    fn other_errors_have_no_hint() {
        assert_eq!(config_hint(&ConfigError::InvalidConcurrency), None);
    }
}
