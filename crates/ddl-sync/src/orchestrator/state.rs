//! Per-run processing state.
//!
//! States are stored by position: `objects[s][i]` belongs to
//! `schemas[s].objects[i]` and `fills[s][i]` to `schemas[s].fill_targets[i]`.
//! Only the engine writes; everything else reads after the run.

use crate::core::{ObjectKind, ObjectState, Schema};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunState {
    objects: Vec<Vec<ObjectState>>,
    fills: Vec<Vec<ObjectState>>,
}

impl RunState {
    /// Every object and fill target starts unprocessed.
    pub fn new(schemas: &[Schema]) -> Self {
        Self {
            objects: schemas
                .iter()
                .map(|s| vec![ObjectState::Unprocessed; s.objects.len()])
                .collect(),
            fills: schemas
                .iter()
                .map(|s| vec![ObjectState::Unprocessed; s.fill_targets.len()])
                .collect(),
        }
    }

    pub fn object(&self, schema: usize, index: usize) -> ObjectState {
        self.objects[schema][index]
    }

    pub fn fill(&self, schema: usize, index: usize) -> ObjectState {
        self.fills[schema][index]
    }

    pub fn objects_of(&self, schema: usize) -> &[ObjectState] {
        &self.objects[schema]
    }

    pub fn fills_of(&self, schema: usize) -> &[ObjectState] {
        &self.fills[schema]
    }

    /// Record an object outcome. A state is final once set.
    pub(crate) fn set_object(&mut self, schema: usize, index: usize, state: ObjectState) {
        let slot = &mut self.objects[schema][index];
        if !slot.is_terminal() {
            *slot = state;
        }
    }

    /// Record a fill target outcome. A state is final once set.
    pub(crate) fn set_fill(&mut self, schema: usize, index: usize, state: ObjectState) {
        let slot = &mut self.fills[schema][index];
        if !slot.is_terminal() {
            *slot = state;
        }
    }

    /// Mark every object of the given kinds in one schema as ignored.
    pub(crate) fn ignore_kinds(&mut self, schema_index: usize, schema: &Schema, kinds: &[ObjectKind]) {
        for (i, object) in schema.objects.iter().enumerate() {
            if kinds.contains(&object.kind) {
                self.set_object(schema_index, i, ObjectState::Ignore);
            }
        }
    }

    /// Objects and fill targets that will be processed.
    pub fn pending(&self) -> usize {
        self.all()
            .filter(|s| **s == ObjectState::Unprocessed)
            .count()
    }

    /// Number of entries in a state across every schema.
    pub fn count(&self, state: ObjectState) -> usize {
        self.all().filter(|s| **s == state).count()
    }

    fn all(&self) -> impl Iterator<Item = &ObjectState> {
        self.objects.iter().chain(self.fills.iter()).flatten()
    }
}
