//! Pre-run and post-run statistics.

use crate::config::PathTemplates;
use crate::core::{FillMode, ObjectKind, ObjectState, Schema, TemplateKey};
use crate::orchestrator::RunState;
use tracing::info;

/// Width of the kind column in statistics lines.
const KIND_WIDTH: usize = 16;

/// Logs statistics and decides which kinds are ignored.
pub struct StatsReporter<'a> {
    templates: &'a PathTemplates,
}

impl<'a> StatsReporter<'a> {
    pub fn new(templates: &'a PathTemplates) -> Self {
        Self { templates }
    }

    /// Log what was found in every schema.
    ///
    /// Returns, per schema, the kinds without an output path. This is the
    /// only place the ignore decision is made.
    pub fn pre_run(&self, schemas: &[Schema]) -> Vec<Vec<ObjectKind>> {
        schemas
            .iter()
            .map(|schema| {
                let (lines, ignored) = self.pre_run_lines(schema);
                let title = if schema.is_empty() {
                    format!("find schema \"{}\" (empty)", schema.name)
                } else {
                    format!("find schema \"{}\"", schema.name)
                };
                if lines.is_empty() {
                    info!("{}", title);
                } else {
                    info!(detail = %lines.join("\n"), "{}", title);
                }
                ignored
            })
            .collect()
    }

    fn pre_run_lines(&self, schema: &Schema) -> (Vec<String>, Vec<ObjectKind>) {
        let mut lines = Vec::new();
        let mut ignored = Vec::new();
        for (kind, count) in schema.kind_counts() {
            let is_ignored = !self.templates.has_kind(kind);
            lines.push(format!(
                "{:<width$} {:06}{}",
                kind.as_str(),
                count,
                if is_ignored { " (ignored)" } else { "" },
                width = KIND_WIDTH
            ));
            if is_ignored {
                ignored.push(kind);
            }
        }
        for mode in [FillMode::Full, FillMode::Demo] {
            let count = schema.fill_count(mode);
            if self.fill_configured(mode) && count > 0 {
                lines.push(format!("{:<width$} {:06}", mode.label(), count, width = KIND_WIDTH));
            }
        }
        (lines, ignored)
    }

    /// Log final per-kind and per-fill-mode state counts.
    pub fn post_run(&self, schemas: &[Schema], state: &RunState) {
        for (index, schema) in schemas.iter().enumerate() {
            if schema.is_empty() {
                continue;
            }
            let lines = self.post_run_lines(schema, index, state);
            if lines.is_empty() {
                info!("stat for schema \"{}\"", schema.name);
            } else {
                info!(detail = %lines.join("\n"), "stat for schema \"{}\"", schema.name);
            }
        }
    }

    fn post_run_lines(&self, schema: &Schema, index: usize, state: &RunState) -> Vec<String> {
        let objects = state.objects_of(index);
        let mut lines = Vec::new();

        for (kind, _) in schema.kind_counts() {
            if !self.templates.has_kind(kind) {
                continue;
            }
            let states = schema
                .objects
                .iter()
                .zip(objects)
                .filter(|(object, _)| object.kind == kind)
                .map(|(_, s)| *s);
            lines.push(breakdown(kind.as_str(), states));
        }

        let fills = state.fills_of(index);
        for mode in [FillMode::Full, FillMode::Demo] {
            if !self.fill_configured(mode) || schema.fill_count(mode) == 0 {
                continue;
            }
            let states = schema
                .fill_targets
                .iter()
                .zip(fills)
                .filter(|(target, _)| target.mode == mode)
                .map(|(_, s)| *s);
            lines.push(breakdown(mode.label(), states));
        }

        lines
    }

    fn fill_configured(&self, mode: FillMode) -> bool {
        self.templates.get(TemplateKey::for_fill(mode)).is_some()
    }
}

fn breakdown(label: &str, states: impl Iterator<Item = ObjectState>) -> String {
    let (mut error, mut nochange, mut insert, mut update) = (0usize, 0usize, 0usize, 0usize);
    for s in states {
        match s {
            ObjectState::Error => error += 1,
            ObjectState::NoChange => nochange += 1,
            ObjectState::Insert => insert += 1,
            ObjectState::Update => update += 1,
            ObjectState::Unprocessed | ObjectState::Ignore => {}
        }
    }
    format!(
        "{:<width$}[error]={:06}; [no changes]={:06}; [create]={:06}; [update]={:06}; ",
        label,
        error,
        nochange,
        insert,
        update,
        width = KIND_WIDTH
    )
}
