//! Event log reading for the rewind replay-history builder.
//!
//! An instrumented program run writes one event per line:
//!
//! ```text
//! -- comment lines are skipped
//! PUSH_FRAME("main.py", "<module>", *1, *1, 0, 0, 0, 0)
//! NEW_LIST(10, 1)
//! LIST_APPEND(10, 2)
//! VISIT(5)
//! ```
//!
//! # Modules
//!
//! - [`codec`] -- Value literal parsing and object text serialization
//! - [`tokenizer`] -- Splits one line into a command name and argument list
//! - [`event`] -- The closed [`Event`] enum every known command decodes into
//! - [`error`] -- [`FormatError`], the fatal "this log is malformed" error

pub mod codec;
pub mod error;
pub mod event;
pub mod tokenizer;

pub use codec::{parse_value, render_value, serialize};
pub use error::FormatError;
pub use event::{Decoded, Event, Mutation, PushFrame, SliceBounds};
pub use tokenizer::{RawEvent, parse_line};
