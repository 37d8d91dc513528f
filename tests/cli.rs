use clap::Parser;
use linecull::cli::{Cli, Commands, DedupArgs};
use linecull::core::DedupStrategy;

#[test]
fn dedup_flag_parsing()
{
    // Given
    let argv = vec![
        "lcull",
        "--quiet",
        "dedup",
        "log.csv",
        "--output",
        "out.csv",
        "--delimiter",
        "|",
        "--strategy",
        "hash",
        "--json",
    ];

    // When
    let cli = Cli::parse_from(argv);

    // Then
    assert!(cli.quiet);
    match cli.command
    {
        Commands::Dedup(DedupArgs { input, output, delimiter, strategy, json }) =>
        {
            assert!(input.ends_with("log.csv"));
            assert!(
                output
                    .expect("output captured")
                    .ends_with("out.csv")
            );
            assert_eq!(delimiter, Some('|'));
            assert_eq!(strategy, Some(DedupStrategy::Hash));
            assert!(json);
        }
        _ => panic!("expected Dedup command"),
    }
}

#[test]
fn append_accepts_many_lines_and_verbosity()
{
    let cli = Cli::parse_from(["lcull", "-vv", "append", "-f", "c.txt", "-t", "0.9", "one", "two"]);

    assert_eq!(cli.verbose, 2);
    match cli.command
    {
        Commands::Append(args) =>
        {
            assert_eq!(args.lines, vec!["one", "two"]);
            assert_eq!(args.threshold, Some(0.9));
            assert!(
                args.file
                    .expect("file captured")
                    .ends_with("c.txt")
            );
        }
        _ => panic!("expected Append command"),
    }
}

#[test]
fn dedup_rejects_multi_char_delimiter()
{
    assert!(Cli::try_parse_from(["lcull", "dedup", "in.csv", "--delimiter", ",,"]).is_err());
}
