//! A simple CLI tool for tallying an exported poll record offline.
//! This uses the server's own tally implementation, and reads the same
//! document layout the server stores.

use std::fs::File;
use std::io::BufReader;

use chrono::{DateTime, Utc};
use clap::{Arg, ArgAction, ArgMatches, Command};
use rocket::serde::json::serde_json;

use tally_backend::{
    engine::InconsistentBallot,
    model::{api::poll::PollResults, common::Poll},
};

const PROGRAM_NAME: &str = "tally-cli";

const ABOUT_TEXT: &str = "Check and tally an exported poll record.

EXIT CODES:
     0: Tally succeeded.
   255: Ran successfully, but the record is inconsistent.
 Other: Error.";

const POLL_PATH: &str = "POLL_PATH";

const POLL_PATH_HELP: &str = "The path to a JSON poll record,\n\
as stored in the `polls` collection";

const AT: &str = "at";

const AT_HELP: &str = "Evaluate the poll status at this RFC 3339 time instead of now";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(POLL_PATH)
                .help(POLL_PATH_HELP)
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new(AT)
                .long(AT)
                .help(AT_HELP)
                .action(ArgAction::Set)
                .value_parser(parse_time),
        )
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|err| format!("not an RFC 3339 time: {err}"))
}

/// Errors that this program may produce.
#[derive(Debug, PartialEq, Eq)]
enum Error {
    /// IO error described by the inner message.
    IO(String),
    /// Failed to decode the poll record.
    Format(String),
    /// The record holds a ballot for a candidate it does not have.
    Inconsistent(InconsistentBallot),
}

/// Load the poll record at `path` and tally it as of `at`.
fn summarise(path: &str, at: DateTime<Utc>) -> Result<PollResults, Error> {
    let file = File::open(path).map_err(|err| Error::IO(err.to_string()))?;
    let poll: Poll = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| Error::Format(err.to_string()))?;
    PollResults::new(&poll, at).map_err(Error::Inconsistent)
}

/// Run the tally, report the result, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let path: &String = args.get_one(POLL_PATH).unwrap(); // Required argument is guaranteed to be present.
    let at = args.get_one::<DateTime<Utc>>(AT).copied().unwrap_or_else(Utc::now);
    match summarise(path, at) {
        Ok(results) => {
            println!(
                "{} ({}, {} vote{})",
                results.title,
                results.status,
                results.total_votes,
                if results.total_votes != 1 { "s" } else { "" }
            );
            for standing in &results.standings {
                println!(
                    "{:>3}. {}: {} vote{} ({:.1}%)",
                    standing.rank,
                    standing.candidate.name,
                    standing.vote_count,
                    if standing.vote_count != 1 { "s" } else { "" },
                    standing.percentage
                );
            }
            0
        }
        Err(Error::IO(msg)) => {
            println!("IO error: {}", msg);
            1
        }
        Err(Error::Format(msg)) => {
            println!("Invalid poll record: {}", msg);
            1
        }
        Err(Error::Inconsistent(err)) => {
            println!("Inconsistent poll record: {}", err);
            255
        }
    }
}

fn main() {
    let args = cli().get_matches();
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use tally_backend::model::{common::PollStatus, mongodb::Id};

    use super::*;

    #[test]
    fn tally() {
        // This test actually enters backend code, so enable logging.
        log4rs_test_utils::test_logging::init_logging_once_for(["tally_backend"], None, None);

        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let results = summarise("example_polls/poll.json", at).unwrap();
        assert_eq!(results.status, PollStatus::Ongoing);
        assert_eq!(results.total_votes, 3);
        let standings: Vec<_> = results
            .standings
            .iter()
            .map(|s| (s.rank, s.candidate.name.as_str(), s.vote_count, s.percentage))
            .collect();
        assert_eq!(
            standings,
            vec![
                (1, "Chris Riches", 2, 66.7),
                (2, "Parry Hotter", 1, 33.3),
                (3, "Jane Doe", 0, 0.0),
            ]
        );

        let later = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(
            summarise("example_polls/poll.json", later).unwrap().status,
            PollStatus::Ended
        );
    }

    #[test]
    fn errors() {
        let at = Utc::now();
        assert!(matches!(
            summarise("example_polls/missing.json", at),
            Err(Error::IO(_))
        ));
        assert!(matches!(
            summarise("example_polls/poll_malformed.json", at),
            Err(Error::Format(_))
        ));
        match summarise("example_polls/poll_inconsistent.json", at) {
            Err(Error::Inconsistent(err)) => {
                assert_eq!(err.voter.as_str(), "carol");
                assert_eq!(err.candidate, "65a1f0c2e4b0a1b2c3d4e5ff".parse::<Id>().unwrap());
            }
            other => panic!("expected an inconsistent record, got {other:?}"),
        }
    }

    #[test]
    fn arguments() {
        let args = cli()
            .try_get_matches_from([PROGRAM_NAME, "poll.json", "--at", "2024-01-01T12:00:00+01:00"])
            .unwrap();
        assert_eq!(
            args.get_one::<DateTime<Utc>>(AT).copied(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap())
        );
        assert!(cli()
            .try_get_matches_from([PROGRAM_NAME, "poll.json", "--at", "noon"])
            .is_err());
        assert!(cli().try_get_matches_from([PROGRAM_NAME]).is_err());
    }
}
