use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["mvpfinder"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_sync_without_filters() {
    let cli = Cli::try_parse_from(["mvpfinder", "sync"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Sync { ref channels, limit: None }) if channels.is_empty()
    ));
}

#[test]
fn parses_sync_with_repeated_channels_and_limit() {
    let cli = Cli::try_parse_from([
        "mvpfinder",
        "sync",
        "--channel",
        "SaaS",
        "--channel",
        "startups",
        "--limit",
        "25",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Sync { ref channels, limit: Some(25) })
            if channels == &["SaaS".to_string(), "startups".to_string()]
    ));
}

#[test]
fn sync_rejects_zero_limit() {
    assert!(Cli::try_parse_from(["mvpfinder", "sync", "--limit", "0"]).is_err());
}

#[test]
fn parses_analyze_with_ids() {
    let cli = Cli::try_parse_from(["mvpfinder", "analyze", "--id", "4", "--id", "9"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Analyze { ref ids, limit: None }) if ids == &[4, 9]
    ));
}

#[test]
fn parses_llm_subcommands() {
    let status = Cli::try_parse_from(["mvpfinder", "llm", "status"]).expect("valid");
    assert!(matches!(
        status.command,
        Some(Commands::Llm {
            command: LlmCommands::Status
        })
    ));

    let pull = Cli::try_parse_from(["mvpfinder", "llm", "pull"]).expect("valid");
    assert!(matches!(
        pull.command,
        Some(Commands::Llm {
            command: LlmCommands::Pull
        })
    ));
}

#[test]
fn parses_test_connection() {
    let cli = Cli::try_parse_from(["mvpfinder", "test-connection"]).expect("valid");
    assert!(matches!(cli.command, Some(Commands::TestConnection)));
}

#[test]
fn parses_channel_add_inactive() {
    let cli = Cli::try_parse_from(["mvpfinder", "channel", "add", "SideProject", "--inactive"])
        .expect("valid");
    assert!(matches!(
        cli.command,
        Some(Commands::Channel {
            command: ChannelCommands::Add { ref name, inactive: true }
        }) if name == "SideProject"
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli = Cli::try_parse_from(["mvpfinder", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}
