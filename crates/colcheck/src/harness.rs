//! The check sequence: input → preset → compile → parse → verify.

use crate::compare::check_sequence;
use crate::config::HarnessConfig;
use crate::driver::{CompilationDriver, ToolRunner};
use crate::preset::{PresetDefinition, PresetExtractor};
use crate::state::ColumnAssignment;
use crate::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;

pub const SUCCESS_MESSAGE: &str = "Column counts and presets match expected demo values.";

/// Progress through a run. A failure aborts from whichever stage was last reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Start,
    InputChecked,
    PresetValidated,
    Compiled,
    ColumnsParsed,
    Verified,
    Done,
}

/// What a successful run observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub document: PathBuf,
    pub passes: u32,
    pub columns: Vec<u32>,
    pub preset: PresetDefinition,
    pub stages: Vec<Stage>,
}

#[derive(Debug, Clone)]
pub struct Harness {
    config: HarnessConfig,
    root: PathBuf,
}

impl Harness {
    pub fn new(config: HarnessConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            root: root.into(),
        }
    }

    pub fn run(&self, runner: &dyn ToolRunner) -> Result<RunReport> {
        let config = &self.config;
        let mut stages = Vec::new();
        reach(&mut stages, Stage::Start);

        let document = config.document_path(&self.root);
        if !document.exists() {
            return Err(Error::MissingInput { path: document });
        }
        reach(&mut stages, Stage::InputChecked);

        // Validate the preset before the expensive compile passes.
        let preset = PresetExtractor::new(&config.preset).extract(&self.root, runner)?;
        check_sequence(
            &format!("defaults={} environment list", config.preset.name),
            &config.preset.expected,
            preset.tokens(),
        )
        .map_err(Error::PresetMismatch)?;
        reach(&mut stages, Stage::PresetValidated);

        CompilationDriver::new(&config.engine, config.passes).converge(
            runner,
            &config.document,
            &self.root,
        )?;
        reach(&mut stages, Stage::Compiled);

        let columns = ColumnAssignment::from_file(
            &config.state_path(&self.root),
            &config.columns.marker,
            config.columns.scan,
        )?
        .counts();
        reach(&mut stages, Stage::ColumnsParsed);

        check_sequence("Column count", &config.columns.expected, &columns)
            .map_err(Error::ColumnCountMismatch)?;
        // Applying the preset must not change the converged counts.
        check_sequence(
            &format!("defaults={} column count", config.preset.name),
            &config.columns.expected,
            &columns,
        )
        .map_err(Error::ColumnCountMismatch)?;
        reach(&mut stages, Stage::Verified);
        reach(&mut stages, Stage::Done);

        Ok(RunReport {
            document: config.document.clone(),
            passes: config.passes,
            columns,
            preset,
            stages,
        })
    }
}

fn reach(stages: &mut Vec<Stage>, stage: Stage) {
    tracing::info!(?stage, "stage reached");
    stages.push(stage);
}
