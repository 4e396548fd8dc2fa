// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `cli.rs`

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn hook_symlink_name_wins() {
        assert_eq!(
            resolve_hook_name(Some("/var/lib/juju/charm/hooks/install"), Some("start".into())),
            Some("install".to_string())
        );
        assert_eq!(
            resolve_hook_name(Some("/usr/bin/designate-charm"), Some("start".into())),
            Some("start".to_string())
        );
        assert_eq!(resolve_hook_name(Some("designate-charm"), Some(String::new())), None);
    }

    #[test]
    fn parses_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "designate-charm",
            "hook",
            "config-changed",
            "--keep-going",
            "--report",
            "json",
            "--timeout",
            "30",
        ])
        .unwrap();

        assert!(matches!(cli.command, Some(Commands::Hook { ref name }) if name == "config-changed"));
        assert_eq!(cli.policy(), FailurePolicy::Continue);
        assert_eq!(cli.report, Some(ReportFormat::Json));
        assert_eq!(cli.timeout_override(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn state_path_defaults_beneath_charm_dir() {
        let cli = Cli::try_parse_from(["designate-charm", "flags", "list"]).unwrap();
        assert_eq!(
            cli.state_path(Some(PathBuf::from("/var/lib/juju/charm"))),
            PathBuf::from("/var/lib/juju/charm/.designate-charm/state.json")
        );

        let cli = Cli::try_parse_from([
            "designate-charm",
            "--state-file",
            "/tmp/state.json",
            "flags",
            "set",
            "installed",
        ])
        .unwrap();
        assert_eq!(cli.state_path(None), PathBuf::from("/tmp/state.json"));
        assert!(matches!(
            cli.command,
            Some(Commands::Flags { subcommand: FlagsCommand::Set { ref name } }) if name == "installed"
        ));
    }

    #[test]
    fn no_arguments_means_hook_from_environment() {
        let cli = Cli::try_parse_from(["install"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.policy(), FailurePolicy::Abort);
    }
}
