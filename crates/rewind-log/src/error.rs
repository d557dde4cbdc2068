//! Error types for log reading.
//!
//! Every variant is fatal to a replay: a log that cannot be tokenized cannot
//! be trusted to describe the recorded execution.

/// A line, argument, or value in the event log is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// A single value token does not match the value grammar.
    #[error("malformed value `{token}`: {reason}")]
    Value {
        /// The offending token text.
        token: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A line does not match `NAME(arg, arg, ...)`.
    #[error("syntax error at line {line_no}, byte {column}: {reason} in `{line}`")]
    Syntax {
        /// 1-based line number in the log.
        line_no: usize,
        /// 0-based byte offset within the line.
        column: usize,
        /// The full line text.
        line: String,
        /// What was expected at `column`.
        reason: String,
    },

    /// A known command received the wrong number or kind of arguments.
    #[error("bad arguments for {event}: {reason}")]
    Arguments {
        /// The command name.
        event: String,
        /// What was wrong with the arguments.
        reason: String,
    },
}
