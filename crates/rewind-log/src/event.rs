//! Typed events: the closed set of commands the replay understands.
//!
//! [`Event::decode`] turns a [`RawEvent`] into an [`Event`] once, checking
//! arity and argument kinds. Unrecognised command names are not an error at
//! this level; they decode to [`Decoded::Unknown`] so the caller can log and
//! skip them.

use std::vec::IntoIter;

use rewind_types::{SlotId, Value};

use crate::error::FormatError;
use crate::tokenizer::RawEvent;

/// Python-style slice bounds; `None` means "open".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SliceBounds {
    /// Inclusive start index.
    pub start: Option<i64>,
    /// Exclusive stop index.
    pub stop: Option<i64>,
    /// Step, defaulting to 1.
    pub step: Option<i64>,
}

/// Arguments of `PUSH_FRAME`.
///
/// Log layout: `file, name, globals, locals, n, name_1..name_n, m,
/// value_1..value_m, c, (cell_name, cell_slot)*c, f, (free_name,
/// free_slot)*f`. The cell and free sections may be omitted entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct PushFrame {
    /// Source file path of the code being entered.
    pub file: String,
    /// Function or module name.
    pub name: String,
    /// Slot of the global-variable mapping.
    pub globals: SlotId,
    /// Slot of the local-variable mapping.
    pub locals: SlotId,
    /// All local variable names in index order (for `STORE_FAST`).
    pub local_names: Vec<String>,
    /// Initial values of the first `local_values.len()` locals.
    pub local_values: Vec<Value>,
    /// Cell variables created by this frame.
    pub cell_vars: Vec<(String, SlotId)>,
    /// Free variables captured from enclosing frames.
    pub free_vars: Vec<(String, SlotId)>,
}

/// A heap mutation. Every variant writes exactly one slot, `slot`.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// `NEW_LIST(slot, items...)`
    NewList {
        /// Target slot.
        slot: SlotId,
        /// Initial members.
        items: Vec<Value>,
    },
    /// `NEW_TUPLE(slot, items...)`
    NewTuple {
        /// Target slot.
        slot: SlotId,
        /// Members.
        items: Vec<Value>,
    },
    /// `NEW_STRING(slot, text)`
    NewString {
        /// Target slot.
        slot: SlotId,
        /// Text contents.
        text: String,
    },
    /// `LIST_APPEND(slot, value)`
    ListAppend {
        /// Target slot.
        slot: SlotId,
        /// Appended member.
        value: Value,
    },
    /// `LIST_EXTEND(slot, source)`
    ListExtend {
        /// Target slot.
        slot: SlotId,
        /// Slot whose members are appended.
        source: SlotId,
    },
    /// `LIST_STORE_SUBSCRIPT(slot, index, value)`
    ListStoreSubscript {
        /// Target slot.
        slot: SlotId,
        /// Index, negative counts from the end.
        index: i64,
        /// New member.
        value: Value,
    },
    /// `LIST_STORE_SUBSCRIPT_SLICE(slot, start, stop, step, items...)`
    ListStoreSubscriptSlice {
        /// Target slot.
        slot: SlotId,
        /// Replaced range.
        bounds: SliceBounds,
        /// Replacement members.
        items: Vec<Value>,
    },
    /// `LIST_DELETE_SUBSCRIPT(slot, index)`
    ListDeleteSubscript {
        /// Target slot.
        slot: SlotId,
        /// Index, negative counts from the end.
        index: i64,
    },
    /// `LIST_DELETE_SUBSCRIPT_SLICE(slot, start, stop, step)`
    ListDeleteSubscriptSlice {
        /// Target slot.
        slot: SlotId,
        /// Deleted range.
        bounds: SliceBounds,
    },
    /// `LIST_INSERT(slot, index, value)`
    ListInsert {
        /// Target slot.
        slot: SlotId,
        /// Insertion index, clamped to the list.
        index: i64,
        /// Inserted member.
        value: Value,
    },
    /// `LIST_REMOVE(slot, value)`
    ListRemove {
        /// Target slot.
        slot: SlotId,
        /// First member equal to this is removed.
        value: Value,
    },
    /// `LIST_POP(slot[, index])`
    ListPop {
        /// Target slot.
        slot: SlotId,
        /// Popped index, last member when absent.
        index: Option<i64>,
    },
    /// `LIST_CLEAR(slot)`
    ListClear {
        /// Target slot.
        slot: SlotId,
    },
    /// `LIST_REVERSE(slot)`
    ListReverse {
        /// Target slot.
        slot: SlotId,
    },
    /// `LIST_SORT(slot, items...)`; the recorder already sorted `items`.
    ListSort {
        /// Target slot.
        slot: SlotId,
        /// Members in sorted order.
        items: Vec<Value>,
    },
    /// `STRING_INPLACE_ADD_RESULT(slot, text)`
    StringInplaceAddResult {
        /// Target slot.
        slot: SlotId,
        /// Concatenation result.
        text: String,
    },
    /// `NEW_DICT(slot, k1, v1, k2, v2, ...)`
    NewDict {
        /// Target slot.
        slot: SlotId,
        /// Initial entries.
        pairs: Vec<(Value, Value)>,
    },
    /// `DICT_STORE_SUBSCRIPT(slot, key, value)`
    DictStoreSubscript {
        /// Target slot.
        slot: SlotId,
        /// Entry key.
        key: Value,
        /// Entry value.
        value: Value,
    },
    /// `DICT_DELETE_SUBSCRIPT(slot, key)`
    DictDeleteSubscript {
        /// Target slot.
        slot: SlotId,
        /// Removed key.
        key: Value,
    },
    /// `DICT_CLEAR(slot)`
    DictClear {
        /// Target slot.
        slot: SlotId,
    },
    /// `DICT_POP(slot, key)`
    DictPop {
        /// Target slot.
        slot: SlotId,
        /// Removed key.
        key: Value,
    },
    /// `DICT_POP_ITEM(slot)`: removes the most recently inserted entry.
    DictPopItem {
        /// Target slot.
        slot: SlotId,
    },
    /// `DICT_SET_DEFAULT(slot, key, value)`
    DictSetDefault {
        /// Target slot.
        slot: SlotId,
        /// Entry key.
        key: Value,
        /// Value stored if `key` is absent.
        value: Value,
    },
    /// `NEW_SET(slot, items...)`
    NewSet {
        /// Target slot.
        slot: SlotId,
        /// Members.
        items: Vec<Value>,
    },
    /// `SET_UPDATE(slot, items...)`: the complete member list after the update.
    SetUpdate {
        /// Target slot.
        slot: SlotId,
        /// Members after the update.
        items: Vec<Value>,
    },
    /// `SET_ADD(slot, value)`
    SetAdd {
        /// Target slot.
        slot: SlotId,
        /// Added member.
        value: Value,
    },
    /// `SET_DISCARD(slot, value)`
    SetDiscard {
        /// Target slot.
        slot: SlotId,
        /// Discarded member.
        value: Value,
    },
    /// `SET_CLEAR(slot)`
    SetClear {
        /// Target slot.
        slot: SlotId,
    },
    /// `NEW_OBJECT(slot, type_ref)`
    NewObject {
        /// Target slot.
        slot: SlotId,
        /// The object's type.
        type_ref: Value,
    },
    /// `STORE_ATTR(slot, name, value)`
    StoreAttr {
        /// Target slot.
        slot: SlotId,
        /// Attribute name.
        name: Value,
        /// Attribute value.
        value: Value,
    },
}

impl Mutation {
    /// The slot this mutation writes.
    pub const fn slot(&self) -> SlotId {
        match self {
            Self::NewList { slot, .. }
            | Self::NewTuple { slot, .. }
            | Self::NewString { slot, .. }
            | Self::ListAppend { slot, .. }
            | Self::ListExtend { slot, .. }
            | Self::ListStoreSubscript { slot, .. }
            | Self::ListStoreSubscriptSlice { slot, .. }
            | Self::ListDeleteSubscript { slot, .. }
            | Self::ListDeleteSubscriptSlice { slot, .. }
            | Self::ListInsert { slot, .. }
            | Self::ListRemove { slot, .. }
            | Self::ListPop { slot, .. }
            | Self::ListClear { slot }
            | Self::ListReverse { slot }
            | Self::ListSort { slot, .. }
            | Self::StringInplaceAddResult { slot, .. }
            | Self::NewDict { slot, .. }
            | Self::DictStoreSubscript { slot, .. }
            | Self::DictDeleteSubscript { slot, .. }
            | Self::DictClear { slot }
            | Self::DictPop { slot, .. }
            | Self::DictPopItem { slot }
            | Self::DictSetDefault { slot, .. }
            | Self::NewSet { slot, .. }
            | Self::SetUpdate { slot, .. }
            | Self::SetAdd { slot, .. }
            | Self::SetDiscard { slot, .. }
            | Self::SetClear { slot }
            | Self::NewObject { slot, .. }
            | Self::StoreAttr { slot, .. } => *slot,
        }
    }

    /// The log command name of this mutation.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NewList { .. } => "NEW_LIST",
            Self::NewTuple { .. } => "NEW_TUPLE",
            Self::NewString { .. } => "NEW_STRING",
            Self::ListAppend { .. } => "LIST_APPEND",
            Self::ListExtend { .. } => "LIST_EXTEND",
            Self::ListStoreSubscript { .. } => "LIST_STORE_SUBSCRIPT",
            Self::ListStoreSubscriptSlice { .. } => "LIST_STORE_SUBSCRIPT_SLICE",
            Self::ListDeleteSubscript { .. } => "LIST_DELETE_SUBSCRIPT",
            Self::ListDeleteSubscriptSlice { .. } => "LIST_DELETE_SUBSCRIPT_SLICE",
            Self::ListInsert { .. } => "LIST_INSERT",
            Self::ListRemove { .. } => "LIST_REMOVE",
            Self::ListPop { .. } => "LIST_POP",
            Self::ListClear { .. } => "LIST_CLEAR",
            Self::ListReverse { .. } => "LIST_REVERSE",
            Self::ListSort { .. } => "LIST_SORT",
            Self::StringInplaceAddResult { .. } => "STRING_INPLACE_ADD_RESULT",
            Self::NewDict { .. } => "NEW_DICT",
            Self::DictStoreSubscript { .. } => "DICT_STORE_SUBSCRIPT",
            Self::DictDeleteSubscript { .. } => "DICT_DELETE_SUBSCRIPT",
            Self::DictClear { .. } => "DICT_CLEAR",
            Self::DictPop { .. } => "DICT_POP",
            Self::DictPopItem { .. } => "DICT_POP_ITEM",
            Self::DictSetDefault { .. } => "DICT_SET_DEFAULT",
            Self::NewSet { .. } => "NEW_SET",
            Self::SetUpdate { .. } => "SET_UPDATE",
            Self::SetAdd { .. } => "SET_ADD",
            Self::SetDiscard { .. } => "SET_DISCARD",
            Self::SetClear { .. } => "SET_CLEAR",
            Self::NewObject { .. } => "NEW_OBJECT",
            Self::StoreAttr { .. } => "STORE_ATTR",
        }
    }
}

/// A decoded log event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// `PUSH_FRAME(...)`: a function, module, or generator body is entered.
    PushFrame(PushFrame),
    /// `POP_FRAME(file, name)`: the top frame is left.
    PopFrame {
        /// Source file path.
        file: String,
        /// Name of the frame being closed; must match the top frame.
        name: String,
    },
    /// `VISIT(line)`: execution reached a source line.
    Visit {
        /// Source line number.
        line_no: u32,
    },
    /// `STORE_NAME(name, value)`: a name stored in the current frame's locals.
    StoreName {
        /// Variable name.
        name: String,
        /// Stored value.
        value: Value,
    },
    /// `STORE_GLOBAL(slot, name, value)`
    StoreGlobal {
        /// Slot of the global mapping.
        slot: SlotId,
        /// Variable name.
        name: String,
        /// Stored value.
        value: Value,
    },
    /// `STORE_FAST(index, value)`: a local stored by position.
    StoreFast {
        /// Position in the frame's local names.
        index: usize,
        /// Stored value.
        value: Value,
    },
    /// `STORE_DEREF(slot, value)`: a closure cell is written.
    StoreDeref {
        /// Slot of the cell.
        slot: SlotId,
        /// Stored value.
        value: Value,
    },
    /// `RETURN_VALUE(value, line)`
    ReturnValue {
        /// Returned value.
        value: Value,
        /// Source line of the return.
        line_no: u32,
    },
    /// `YIELD_VALUE(value, line)`
    YieldValue {
        /// Yielded value.
        value: Value,
        /// Source line of the yield.
        line_no: u32,
    },
    /// `EXCEPTION(line, message)`: an exception was raised at a line.
    Exception {
        /// Source line number.
        line_no: u32,
        /// Rendered exception message.
        message: String,
    },
    /// Any heap mutation.
    Mutation(Mutation),
}

/// Outcome of decoding a [`RawEvent`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A known command with well-formed arguments.
    Event(Event),
    /// A command name with no handler.
    Unknown(String),
}

/// Sequential argument reader for one event.
struct Args {
    event: String,
    values: IntoIter<Value>,
}

impl Args {
    fn new(raw: RawEvent) -> Self {
        Self {
            event: raw.name,
            values: raw.args.into_iter(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> FormatError {
        FormatError::Arguments {
            event: self.event.clone(),
            reason: reason.into(),
        }
    }

    fn value(&mut self, what: &str) -> Result<Value, FormatError> {
        self.values
            .next()
            .ok_or_else(|| self.error(format!("missing {what}")))
    }

    fn slot(&mut self, what: &str) -> Result<SlotId, FormatError> {
        let value = self.value(what)?;
        value
            .as_slot()
            .ok_or_else(|| self.error(format!("{what} must be a slot, got {value:?}")))
    }

    fn text(&mut self, what: &str) -> Result<String, FormatError> {
        match self.value(what)? {
            Value::Text(s) => Ok(s),
            other => Err(self.error(format!("{what} must be text, got {other:?}"))),
        }
    }

    fn integer(&mut self, what: &str) -> Result<i64, FormatError> {
        let value = self.value(what)?;
        value
            .as_integer()
            .ok_or_else(|| self.error(format!("{what} must be an integer, got {value:?}")))
    }

    fn count(&mut self, what: &str) -> Result<usize, FormatError> {
        let n = self.integer(what)?;
        usize::try_from(n).map_err(|e| self.error(format!("{what} must be non-negative: {e}")))
    }

    fn line(&mut self) -> Result<u32, FormatError> {
        let n = self.integer("line number")?;
        u32::try_from(n).map_err(|e| self.error(format!("line number out of range: {e}")))
    }

    fn optional_integer(&mut self, what: &str) -> Result<Option<i64>, FormatError> {
        match self.value(what)? {
            Value::Null => Ok(None),
            Value::Integer(n) => Ok(Some(n)),
            other => Err(self.error(format!("{what} must be an integer or None, got {other:?}"))),
        }
    }

    fn bounds(&mut self) -> Result<SliceBounds, FormatError> {
        Ok(SliceBounds {
            start: self.optional_integer("slice start")?,
            stop: self.optional_integer("slice stop")?,
            step: self.optional_integer("slice step")?,
        })
    }

    fn is_exhausted(&self) -> bool {
        self.values.as_slice().is_empty()
    }

    /// All remaining arguments.
    fn rest(&mut self) -> Vec<Value> {
        self.values.by_ref().collect()
    }

    fn pairs(&mut self) -> Result<Vec<(Value, Value)>, FormatError> {
        let rest = self.rest();
        if rest.len() % 2 != 0 {
            return Err(self.error("expected key/value pairs"));
        }
        let mut pairs = Vec::with_capacity(rest.len() / 2);
        let mut iter = rest.into_iter();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            pairs.push((key, value));
        }
        Ok(pairs)
    }

    fn named_slots(&mut self, what: &str) -> Result<Vec<(String, SlotId)>, FormatError> {
        if self.is_exhausted() {
            return Ok(Vec::new());
        }
        let n = self.count(what)?;
        (0..n)
            .map(|_| -> Result<_, FormatError> { Ok((self.text(what)?, self.slot(what)?)) })
            .collect()
    }

    fn finish<T>(self, decoded: T) -> Result<T, FormatError> {
        if self.is_exhausted() {
            Ok(decoded)
        } else {
            Err(self.error(format!("{} unexpected trailing argument(s)", self.values.len())))
        }
    }
}

impl Event {
    /// Decode a tokenized line into a typed event.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Arguments`] if a known command has the wrong
    /// number or kind of arguments.
    pub fn decode(raw: RawEvent) -> Result<Decoded, FormatError> {
        let mut a = Args::new(raw);
        let command = a.event.clone();
        let event = match command.as_str() {
            "PUSH_FRAME" => {
                let file = a.text("file")?;
                let name = a.text("name")?;
                let globals = a.slot("globals slot")?;
                let locals = a.slot("locals slot")?;
                let n_names = a.count("local name count")?;
                let local_names = (0..n_names)
                    .map(|_| a.text("local name"))
                    .collect::<Result<Vec<_>, _>>()?;
                let n_values = a.count("local value count")?;
                if n_values > n_names {
                    return Err(a.error(format!(
                        "{n_values} local values for {n_names} local names"
                    )));
                }
                let local_values = (0..n_values)
                    .map(|_| a.value("local value"))
                    .collect::<Result<Vec<_>, _>>()?;
                let cell_vars = a.named_slots("cell variable")?;
                let free_vars = a.named_slots("free variable")?;
                a.finish(Self::PushFrame(PushFrame {
                    file,
                    name,
                    globals,
                    locals,
                    local_names,
                    local_values,
                    cell_vars,
                    free_vars,
                }))
            }
            "POP_FRAME" => {
                let file = a.text("file")?;
                let name = a.text("name")?;
                a.finish(Self::PopFrame { file, name })
            }
            "VISIT" => {
                let line_no = a.line()?;
                a.finish(Self::Visit { line_no })
            }
            "STORE_NAME" => {
                let name = a.text("name")?;
                let value = a.value("value")?;
                a.finish(Self::StoreName { name, value })
            }
            "STORE_GLOBAL" => {
                let slot = a.slot("globals slot")?;
                let name = a.text("name")?;
                let value = a.value("value")?;
                a.finish(Self::StoreGlobal { slot, name, value })
            }
            "STORE_FAST" => {
                let index = a.count("local index")?;
                let value = a.value("value")?;
                a.finish(Self::StoreFast { index, value })
            }
            "STORE_DEREF" => {
                let slot = a.slot("cell slot")?;
                let value = a.value("value")?;
                a.finish(Self::StoreDeref { slot, value })
            }
            "RETURN_VALUE" => {
                let value = a.value("value")?;
                let line_no = a.line()?;
                a.finish(Self::ReturnValue { value, line_no })
            }
            "YIELD_VALUE" => {
                let value = a.value("value")?;
                let line_no = a.line()?;
                a.finish(Self::YieldValue { value, line_no })
            }
            "EXCEPTION" => {
                let line_no = a.line()?;
                let message = a.text("message")?;
                a.finish(Self::Exception { line_no, message })
            }
            _ => match decode_mutation(&mut a)? {
                Some(mutation) => a.finish(Self::Mutation(mutation)),
                None => return Ok(Decoded::Unknown(a.event)),
            },
        }?;
        Ok(Decoded::Event(event))
    }

    /// The log command name of this event.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PushFrame(_) => "PUSH_FRAME",
            Self::PopFrame { .. } => "POP_FRAME",
            Self::Visit { .. } => "VISIT",
            Self::StoreName { .. } => "STORE_NAME",
            Self::StoreGlobal { .. } => "STORE_GLOBAL",
            Self::StoreFast { .. } => "STORE_FAST",
            Self::StoreDeref { .. } => "STORE_DEREF",
            Self::ReturnValue { .. } => "RETURN_VALUE",
            Self::YieldValue { .. } => "YIELD_VALUE",
            Self::Exception { .. } => "EXCEPTION",
            Self::Mutation(m) => m.name(),
        }
    }
}

/// Decode the heap-mutation family; `Ok(None)` for an unknown name.
fn decode_mutation(a: &mut Args) -> Result<Option<Mutation>, FormatError> {
    let command = a.event.clone();
    let mutation = match command.as_str() {
        "NEW_LIST" => Mutation::NewList {
            slot: a.slot("slot")?,
            items: a.rest(),
        },
        "NEW_TUPLE" => Mutation::NewTuple {
            slot: a.slot("slot")?,
            items: a.rest(),
        },
        "NEW_STRING" => Mutation::NewString {
            slot: a.slot("slot")?,
            text: a.text("text")?,
        },
        "LIST_APPEND" => Mutation::ListAppend {
            slot: a.slot("slot")?,
            value: a.value("value")?,
        },
        "LIST_EXTEND" => Mutation::ListExtend {
            slot: a.slot("slot")?,
            source: a.slot("source slot")?,
        },
        "LIST_STORE_SUBSCRIPT" => Mutation::ListStoreSubscript {
            slot: a.slot("slot")?,
            index: a.integer("index")?,
            value: a.value("value")?,
        },
        "LIST_STORE_SUBSCRIPT_SLICE" => Mutation::ListStoreSubscriptSlice {
            slot: a.slot("slot")?,
            bounds: a.bounds()?,
            items: a.rest(),
        },
        "LIST_DELETE_SUBSCRIPT" => Mutation::ListDeleteSubscript {
            slot: a.slot("slot")?,
            index: a.integer("index")?,
        },
        "LIST_DELETE_SUBSCRIPT_SLICE" => Mutation::ListDeleteSubscriptSlice {
            slot: a.slot("slot")?,
            bounds: a.bounds()?,
        },
        "LIST_INSERT" => Mutation::ListInsert {
            slot: a.slot("slot")?,
            index: a.integer("index")?,
            value: a.value("value")?,
        },
        "LIST_REMOVE" => Mutation::ListRemove {
            slot: a.slot("slot")?,
            value: a.value("value")?,
        },
        "LIST_POP" => {
            let slot = a.slot("slot")?;
            let index = if a.is_exhausted() {
                None
            } else {
                a.optional_integer("index")?
            };
            Mutation::ListPop { slot, index }
        }
        "LIST_CLEAR" => Mutation::ListClear {
            slot: a.slot("slot")?,
        },
        "LIST_REVERSE" => Mutation::ListReverse {
            slot: a.slot("slot")?,
        },
        "LIST_SORT" => Mutation::ListSort {
            slot: a.slot("slot")?,
            items: a.rest(),
        },
        "STRING_INPLACE_ADD_RESULT" => Mutation::StringInplaceAddResult {
            slot: a.slot("slot")?,
            text: a.text("text")?,
        },
        "NEW_DICT" => Mutation::NewDict {
            slot: a.slot("slot")?,
            pairs: a.pairs()?,
        },
        "DICT_STORE_SUBSCRIPT" => Mutation::DictStoreSubscript {
            slot: a.slot("slot")?,
            key: a.value("key")?,
            value: a.value("value")?,
        },
        "DICT_DELETE_SUBSCRIPT" => Mutation::DictDeleteSubscript {
            slot: a.slot("slot")?,
            key: a.value("key")?,
        },
        "DICT_CLEAR" => Mutation::DictClear {
            slot: a.slot("slot")?,
        },
        "DICT_POP" => Mutation::DictPop {
            slot: a.slot("slot")?,
            key: a.value("key")?,
        },
        "DICT_POP_ITEM" => Mutation::DictPopItem {
            slot: a.slot("slot")?,
        },
        "DICT_SET_DEFAULT" => Mutation::DictSetDefault {
            slot: a.slot("slot")?,
            key: a.value("key")?,
            value: a.value("value")?,
        },
        "NEW_SET" => Mutation::NewSet {
            slot: a.slot("slot")?,
            items: a.rest(),
        },
        "SET_UPDATE" => Mutation::SetUpdate {
            slot: a.slot("slot")?,
            items: a.rest(),
        },
        "SET_ADD" => Mutation::SetAdd {
            slot: a.slot("slot")?,
            value: a.value("value")?,
        },
        "SET_DISCARD" => Mutation::SetDiscard {
            slot: a.slot("slot")?,
            value: a.value("value")?,
        },
        "SET_CLEAR" => Mutation::SetClear {
            slot: a.slot("slot")?,
        },
        "NEW_OBJECT" => Mutation::NewObject {
            slot: a.slot("slot")?,
            type_ref: a.value("type")?,
        },
        "STORE_ATTR" => Mutation::StoreAttr {
            slot: a.slot("slot")?,
            name: a.value("attribute name")?,
            value: a.value("value")?,
        },
        _ => return Ok(None),
    };
    Ok(Some(mutation))
}
