//! The call frame registry.
//!
//! Frames live in an arena indexed by [`FrameId`] and link to their caller
//! through `parent`. Popping a frame only moves the replay's `top` pointer;
//! the record stays so history remains queryable. Variable stores are
//! copy-on-write updates of the relevant mapping slot.
//!
//! A frame that yields is suspended, not finished. The next push of the
//! same code with the same locals slot resumes it under its original id.

use std::collections::{BTreeMap, HashMap};

use rewind_log::PushFrame;
use rewind_types::{
    CodeFileId, CodeFileRow, FrameId, FunCallRow, Object, SlotId, Value, value::upsert_pair,
};

use crate::error::ConsistencyError;
use crate::state::{ReplayState, bump};

/// One function, module, or generator activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame id.
    pub id: FrameId,
    /// Function or module name.
    pub name: String,
    /// Slot of the local-variable mapping.
    pub locals_slot: SlotId,
    /// Slot of the global-variable mapping.
    pub globals_slot: SlotId,
    /// Local variable names in index order.
    pub local_names: Vec<String>,
    /// The frame that first entered this one.
    pub parent: Option<FrameId>,
    /// The frame that most recently entered this one. Differs from
    /// `parent` once a generator is resumed from elsewhere.
    pub caller: Option<FrameId>,
    /// Source file of the frame's code.
    pub code_file: CodeFileId,
}

/// What a resuming push must match to re-enter a suspended frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResumeKey {
    code_file: CodeFileId,
    name: String,
    locals: SlotId,
}

impl ResumeKey {
    fn of(frame: &Frame) -> Self {
        Self {
            code_file: frame.code_file,
            name: frame.name.clone(),
            locals: frame.locals_slot,
        }
    }
}

/// Arena of every frame pushed so far, plus the code-file registry.
#[derive(Debug, Default)]
pub struct FrameArena {
    frames: Vec<Frame>,
    code_files: HashMap<String, CodeFileId>,
    suspended: HashMap<ResumeKey, FrameId>,
}

impl FrameArena {
    /// Look up a frame by id.
    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id.arena_index()?)
    }

    fn get_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.frames.get_mut(id.arena_index()?)
    }

    /// Number of frames ever pushed.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frame has been pushed.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    fn next_frame_id(&self) -> Result<FrameId, ConsistencyError> {
        let len = u64::try_from(self.frames.len())
            .map_err(|_e| ConsistencyError::IdOverflow { what: "frame" })?;
        bump(len, "frame").map(FrameId)
    }
}

impl ReplayState {
    /// Enter a new frame, or resume a suspended one.
    ///
    /// Writes the initial locals mapping as one version of the locals slot,
    /// records the code file the first time its path is seen, and makes the
    /// new frame the top of the stack. Resuming writes nothing: the locals
    /// slot already holds the generator's state.
    pub fn push_frame(&mut self, push: PushFrame) -> Result<FrameId, ConsistencyError> {
        let PushFrame {
            file,
            name,
            globals,
            locals,
            local_names,
            local_values,
            cell_vars,
            free_vars,
        } = push;

        let code_file = self.code_file_id(&file)?;
        let key = ResumeKey {
            code_file,
            name,
            locals,
        };
        if let Some(id) = self.frames.suspended.remove(&key) {
            self.resume_frame(id);
            return Ok(id);
        }
        let ResumeKey { name, .. } = key;

        let pairs = local_names
            .iter()
            .zip(local_values)
            .map(|(n, v)| (Value::Text(n.clone()), v))
            .collect();
        self.commit(locals, Object::Dict(pairs))?;

        let id = self.frames.next_frame_id()?;
        let parent = self.top;

        self.pending.fun_calls.push(FunCallRow {
            id,
            name: name.clone(),
            locals_slot: locals,
            globals_slot: globals,
            cell_vars: cell_vars.into_iter().collect::<BTreeMap<_, _>>(),
            free_vars: free_vars.into_iter().collect::<BTreeMap<_, _>>(),
            parent,
            code_file,
        });

        if !self.recording && name == self.settings.module_frame_name {
            tracing::debug!(frame = %id, "Module frame entered, recording snapshots");
            self.recording = true;
        }

        self.frames.frames.push(Frame {
            id,
            name,
            locals_slot: locals,
            globals_slot: globals,
            local_names,
            parent,
            caller: parent,
            code_file,
        });
        self.top = Some(id);
        Ok(id)
    }

    fn resume_frame(&mut self, id: FrameId) {
        let caller = self.top;
        if let Some(frame) = self.frames.get_mut(id).filter(|_| caller != Some(id)) {
            frame.caller = caller;
        }
        tracing::debug!(frame = %id, "Suspended frame resumed");
        self.top = Some(id);
    }

    /// Mark the top frame as suspended at a yield.
    pub(crate) fn suspend_top(&mut self) {
        let Some(frame) = self.top.and_then(|id| self.frames.get(id)) else {
            return;
        };
        let key = ResumeKey::of(frame);
        let id = frame.id;
        self.frames.suspended.insert(key, id);
    }

    /// Forget any suspension of the top frame; it has returned.
    pub(crate) fn finish_top(&mut self) {
        if let Some(frame) = self.top.and_then(|id| self.frames.get(id)) {
            let key = ResumeKey::of(frame);
            self.frames.suspended.remove(&key);
        }
    }

    /// Leave the top frame, which must be named `name`.
    ///
    /// On mismatch the stack is left untouched.
    pub fn pop_frame(&mut self, name: &str) -> Result<FrameId, ConsistencyError> {
        let frame = self.current_frame("pop")?;
        if frame.name != name {
            return Err(ConsistencyError::FrameMismatch {
                requested: name.to_owned(),
                top: frame.name.clone(),
            });
        }
        let id = frame.id;
        self.top = frame.caller;
        Ok(id)
    }

    /// Store a local by its position in the top frame's local names.
    pub fn store_local(&mut self, index: usize, value: Value) -> Result<(), ConsistencyError> {
        let frame = self.current_frame("store local")?;
        let name = frame
            .local_names
            .get(index)
            .cloned()
            .ok_or_else(|| ConsistencyError::LocalIndex {
                frame: frame.id,
                index,
                len: frame.local_names.len(),
            })?;
        let slot = frame.locals_slot;
        self.store_entry(slot, Value::Text(name), value)
    }

    /// Store a local of the top frame by name.
    pub fn store_name(&mut self, name: &str, value: Value) -> Result<(), ConsistencyError> {
        let slot = self.current_frame("store name")?.locals_slot;
        self.store_entry(slot, Value::from(name), value)
    }

    /// Store a global into the mapping at `slot`.
    pub fn store_global(
        &mut self,
        slot: SlotId,
        name: &str,
        value: Value,
    ) -> Result<(), ConsistencyError> {
        self.store_entry(slot, Value::from(name), value)
    }

    /// Write a closure cell, held as a one-element tuple.
    pub fn store_closure_cell(&mut self, slot: SlotId, value: Value) -> Result<(), ConsistencyError> {
        self.commit(slot, Object::Tuple(vec![value])).map(|_| ())
    }

    /// Copy the mapping at `slot`, set one key, and commit it.
    pub(crate) fn store_entry(
        &mut self,
        slot: SlotId,
        key: Value,
        value: Value,
    ) -> Result<(), ConsistencyError> {
        let mut pairs = match self.heap.read_current(slot) {
            None => Vec::new(),
            Some(Object::Dict(pairs)) => pairs.clone(),
            Some(other) => {
                return Err(ConsistencyError::WrongKind {
                    slot,
                    expected: "dict",
                    found: other.type_name(),
                });
            }
        };
        upsert_pair(&mut pairs, key, value);
        self.commit(slot, Object::Dict(pairs)).map(|_| ())
    }

    /// The top frame, or an error naming `operation`.
    pub(crate) fn current_frame(&self, operation: &'static str) -> Result<&Frame, ConsistencyError> {
        self.top
            .and_then(|id| self.frames.get(id))
            .ok_or(ConsistencyError::EmptyStack { operation })
    }

    fn code_file_id(&mut self, path: &str) -> Result<CodeFileId, ConsistencyError> {
        if let Some(id) = self.frames.code_files.get(path) {
            return Ok(*id);
        }
        let len = u64::try_from(self.frames.code_files.len())
            .map_err(|_e| ConsistencyError::IdOverflow { what: "code file" })?;
        let id = CodeFileId(bump(len, "code file")?);
        let source = if self.settings.read_sources {
            load_source(path)
        } else {
            String::new()
        };
        self.frames.code_files.insert(path.to_owned(), id);
        self.pending.code_files.push(CodeFileRow {
            id,
            path: path.to_owned(),
            source,
        });
        Ok(id)
    }
}

fn load_source(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            tracing::warn!(path, error = %e, "Source file unreadable, recording empty source");
            String::new()
        }
    }
}
