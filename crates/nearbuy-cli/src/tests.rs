use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["nearbuy-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn parses_seed_command_with_file() {
    let cli = Cli::try_parse_from(["nearbuy-cli", "seed", "--file", "catalog.yaml"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Seed { ref file }) if file == &PathBuf::from("catalog.yaml")
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["nearbuy-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn nearby_applies_defaults() {
    let cli = Cli::try_parse_from(["nearbuy-cli", "nearby", "--lat", "28.61", "--lng", "77.20"])
        .expect("expected valid cli args");

    let Some(Commands::Nearby {
        lat,
        lng,
        radius,
        page,
        per_page,
    }) = cli.command
    else {
        panic!("expected nearby command");
    };
    assert!((lat - 28.61).abs() < f64::EPSILON);
    assert!((lng - 77.20).abs() < f64::EPSILON);
    assert!((radius - DEFAULT_MAX_DISTANCE_KM).abs() < f64::EPSILON);
    assert_eq!(page, DEFAULT_PAGE);
    assert_eq!(per_page, DEFAULT_PER_PAGE);
}

#[test]
fn nearby_accepts_negative_coordinates() {
    let cli = Cli::try_parse_from([
        "nearbuy-cli",
        "nearby",
        "--lat",
        "-33.86",
        "--lng",
        "-151.2",
        "--radius",
        "2.5",
        "--page",
        "2",
        "--per-page",
        "5",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Nearby {
            page: 2,
            per_page: 5,
            ..
        })
    ));
}

#[test]
fn nearby_requires_both_coordinates() {
    assert!(Cli::try_parse_from(["nearbuy-cli", "nearby", "--lat", "28.61"]).is_err());
}
