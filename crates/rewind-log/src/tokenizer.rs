//! Event tokenizer: one log line in, one command name and argument list out.
//!
//! Line form: `NAME(arg0, arg1, ..., argN)`. Arguments are scanned left to
//! right with the value grammar from [`crate::codec`]; each must be followed
//! by `, ` or the closing `)`. A trailing separator before `)` is tolerated
//! (`NEW_DICT(7, )`), since recorders emit it for empty variadic tails.

use rewind_types::Value;

use crate::codec::scan_value;
use crate::error::FormatError;

/// Prefix marking a comment line.
const COMMENT_PREFIX: &str = "--";

/// One tokenized log line, before it is decoded into a typed event.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// Command name, e.g. `LIST_APPEND`.
    pub name: String,
    /// Arguments in log order.
    pub args: Vec<Value>,
}

/// Tokenize one log line.
///
/// Returns `Ok(None)` for blank and comment lines. `line_no` is 1-based and
/// used only for error reporting.
///
/// # Errors
///
/// Returns [`FormatError::Syntax`] with the byte offset of the first
/// character that does not fit the line grammar.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<RawEvent>, FormatError> {
    let line = line.trim_end_matches(['\n', '\r']);
    if line.trim().is_empty() || line.starts_with(COMMENT_PREFIX) {
        return Ok(None);
    }

    let syntax = |column: usize, reason: String| FormatError::Syntax {
        line_no,
        column,
        line: line.to_owned(),
        reason,
    };

    let name_len = line
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    let name = line.get(..name_len).unwrap_or_default();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(syntax(0, "expected a command name".to_owned()));
    }

    let mut pos = name_len;
    if !rest_at(line, pos).starts_with('(') {
        return Err(syntax(pos, "expected `(`".to_owned()));
    }
    pos = pos.saturating_add(1);

    let mut args = Vec::new();
    if rest_at(line, pos).starts_with(')') {
        pos = pos.saturating_add(1);
    } else {
        loop {
            let (value, used) =
                scan_value(rest_at(line, pos)).map_err(|reason| syntax(pos, reason))?;
            args.push(value);
            pos = pos.saturating_add(used);

            let rest = rest_at(line, pos);
            if rest.starts_with(')') {
                pos = pos.saturating_add(1);
                break;
            }
            if !rest.starts_with(',') {
                return Err(syntax(pos, "expected `, ` or `)`".to_owned()));
            }
            pos = pos.saturating_add(1);
            let spaces = rest_at(line, pos).bytes().take_while(|b| *b == b' ').count();
            pos = pos.saturating_add(spaces);
            if rest_at(line, pos).starts_with(')') {
                pos = pos.saturating_add(1);
                break;
            }
        }
    }

    if !rest_at(line, pos).trim().is_empty() {
        return Err(syntax(pos, "unexpected input after `)`".to_owned()));
    }

    Ok(Some(RawEvent {
        name: name.to_owned(),
        args,
    }))
}

/// The unconsumed tail of `line` starting at byte `pos`.
fn rest_at(line: &str, pos: usize) -> &str {
    line.get(pos..).unwrap_or_default()
}
