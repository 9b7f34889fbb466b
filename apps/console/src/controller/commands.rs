//! Typed console commands parsed from input lines.
//!
//! Row positions are typed 1-based and stored 0-based.

use shared::domain::{ChildKind, ScenarioId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Scenarios,
    Select(ScenarioId),
    List,
    Add {
        kind: ChildKind,
        text: String,
    },
    Edit {
        kind: ChildKind,
        position: usize,
        text: String,
    },
    Move {
        kind: ChildKind,
        from: usize,
        to: usize,
    },
    Remove {
        kind: ChildKind,
        position: usize,
        confirmed: bool,
    },
    Confirm(bool),
    Diff,
    Save,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'; type 'help'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("'{0}' is not a valid row number")]
    InvalidPosition(String),
    #[error("'{0}' is not a list; use q (questions) or e (endings)")]
    InvalidKind(String),
}

pub const HELP: &str = "\
scenarios                      list scenarios
select <id>                    open a scenario (discards unsaved drafts)
list                           show questions and endings
add <q|e> <text>               append a draft row
edit <q|e> <row> <text>        replace a row's text
move <q|e> <from> <to>         move a row
rm <q|e> <row> [--yes]         remove a row (saved rows are deleted immediately)
diff                           show unsaved changes
save                           save both lists
quit";

pub fn parse_command(line: &str) -> Result<ConsoleCommand, CommandParseError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "" => Err(CommandParseError::Empty),
        "scenarios" | "ls" => Ok(ConsoleCommand::Scenarios),
        "select" | "open" => {
            let id = rest
                .parse::<i64>()
                .map_err(|_| CommandParseError::Usage("select <id>"))?;
            Ok(ConsoleCommand::Select(ScenarioId(id)))
        }
        "list" => Ok(ConsoleCommand::List),
        "add" => {
            let (kind, text) = split_kind(rest, "add <q|e> <text>")?;
            Ok(ConsoleCommand::Add {
                kind,
                text: text.to_string(),
            })
        }
        "edit" => {
            let usage = "edit <q|e> <row> <text>";
            let (kind, rest) = split_kind(rest, usage)?;
            let (row, text) = rest
                .split_once(char::is_whitespace)
                .ok_or(CommandParseError::Usage(usage))?;
            Ok(ConsoleCommand::Edit {
                kind,
                position: parse_position(row)?,
                text: text.trim().to_string(),
            })
        }
        "move" | "mv" => {
            let usage = "move <q|e> <from> <to>";
            let (kind, rest) = split_kind(rest, usage)?;
            let mut rows = rest.split_whitespace();
            let (Some(from), Some(to), None) = (rows.next(), rows.next(), rows.next()) else {
                return Err(CommandParseError::Usage(usage));
            };
            Ok(ConsoleCommand::Move {
                kind,
                from: parse_position(from)?,
                to: parse_position(to)?,
            })
        }
        "rm" | "remove" | "delete" => {
            let usage = "rm <q|e> <row> [--yes]";
            let (kind, rest) = split_kind(rest, usage)?;
            let mut args = rest.split_whitespace();
            let row = args.next().ok_or(CommandParseError::Usage(usage))?;
            let confirmed = match args.next() {
                None => false,
                Some("--yes" | "-y") => true,
                Some(_) => return Err(CommandParseError::Usage(usage)),
            };
            Ok(ConsoleCommand::Remove {
                kind,
                position: parse_position(row)?,
                confirmed,
            })
        }
        "y" | "yes" => Ok(ConsoleCommand::Confirm(true)),
        "n" | "no" => Ok(ConsoleCommand::Confirm(false)),
        "diff" => Ok(ConsoleCommand::Diff),
        "save" => Ok(ConsoleCommand::Save),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" | "q" => Ok(ConsoleCommand::Quit),
        other => Err(CommandParseError::Unknown(other.to_string())),
    }
}

fn split_kind<'a>(
    rest: &'a str,
    usage: &'static str,
) -> Result<(ChildKind, &'a str), CommandParseError> {
    let (token, tail) = match rest.split_once(char::is_whitespace) {
        Some((token, tail)) => (token, tail.trim()),
        None => (rest, ""),
    };
    if token.is_empty() {
        return Err(CommandParseError::Usage(usage));
    }
    let kind = match token.to_ascii_lowercase().as_str() {
        "q" | "question" | "questions" => ChildKind::Question,
        "e" | "end" | "ending" | "endings" => ChildKind::EndingGuidance,
        _ => return Err(CommandParseError::InvalidKind(token.to_string())),
    };
    Ok((kind, tail))
}

fn parse_position(raw: &str) -> Result<usize, CommandParseError> {
    match raw.parse::<usize>() {
        Ok(row) if row >= 1 => Ok(row - 1),
        _ => Err(CommandParseError::InvalidPosition(raw.to_string())),
    }
}
