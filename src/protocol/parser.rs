//! Query parser
//!
//! Turns a one-line request into a [`Command`]. Parsing is pure: it never
//! looks at node role or storage state.

use crate::error::{OrionError, Result};

use super::command::{Command, DEL_TOKEN, GET_TOKEN, SET_TOKEN};

/// Strip surrounding whitespace, including the trailing newline a client
/// may send. The cleaned form is what gets appended to the WAL.
pub fn clean_query(query: &str) -> &str {
    query.trim()
}

/// Parse a cleaned query line.
///
/// Tokens are separated by runs of whitespace; there is no quoting. The
/// first token selects the command by case-sensitive match, the rest must
/// match the command's fixed arity (SET: 2, GET: 1, DEL: 1).
pub fn parse_query(query: &str) -> Result<Command> {
    let tokens: Vec<&str> = query.split_whitespace().collect();

    let Some((&command_token, args)) = tokens.split_first() else {
        return Err(OrionError::Parse("no tokens found".to_string()));
    };

    match command_token {
        SET_TOKEN => match args {
            [key, value] => Ok(Command::Set {
                key: key.to_string(),
                value: value.to_string(),
            }),
            _ => Err(OrionError::Parse("invalid count of arguments".to_string())),
        },
        GET_TOKEN => match args {
            [key] => Ok(Command::Get {
                key: key.to_string(),
            }),
            _ => Err(OrionError::Parse("invalid count of arguments".to_string())),
        },
        DEL_TOKEN => match args {
            [key] => Ok(Command::Del {
                key: key.to_string(),
            }),
            _ => Err(OrionError::Parse("invalid count of arguments".to_string())),
        },
        unknown => Err(OrionError::Parse(format!(
            "invalid command token: {unknown}"
        ))),
    }
}
