//! Harness configuration.
//!
//! Every path is relative to the project root, which is supplied at startup rather than
//! stored in the config. A YAML config is layered over a base configuration (a variant's
//! defaults), so omitted keys keep the base values.

use crate::state::ScanStrategy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_PASSES: u32 = 3;
pub const DEFINECOLS_MARKER: &str = r"\WI@definecols{auto-";
pub const EXAM_PRESET: &str = "exam";
pub const EXAM_PRESET_ENVIRONMENTS: [&str; 9] = [
    "itemize",
    "enumerate",
    "description",
    "choices",
    "checkboxes",
    "oneparchoices",
    "oneparcheckboxes",
    "parts",
    "subparts",
];

/// The two demonstration documents shipped with the package family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    /// Presets live in the generated `columen.sty`.
    #[default]
    Columen,
    /// Presets are declared inline in the demo document.
    Columnspread,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Columen, Variant::Columnspread];

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Columen => "columen",
            Variant::Columnspread => "columnspread",
        }
    }

    pub fn config(self) -> HarnessConfig {
        let exam = EXAM_PRESET_ENVIRONMENTS
            .iter()
            .map(|s| s.to_string())
            .collect();
        match self {
            Variant::Columen => HarnessConfig {
                document: PathBuf::from("test.tex"),
                state_file: None,
                passes: DEFAULT_PASSES,
                engine: ToolConfig::pdflatex_batch(),
                columns: ColumnsConfig {
                    marker: DEFINECOLS_MARKER.to_string(),
                    scan: ScanStrategy::LinePrefix,
                    expected: vec![5, 3, 5, 3, 5, 3, 2],
                },
                preset: PresetConfig {
                    name: EXAM_PRESET.to_string(),
                    namespace: "columen".to_string(),
                    source: PathBuf::from("columen.sty"),
                    generate: Some(GenerateConfig {
                        recipe: PathBuf::from("columen.ins"),
                        tool: ToolConfig::pdflatex(),
                    }),
                    expected: exam,
                },
            },
            Variant::Columnspread => HarnessConfig {
                document: PathBuf::from("test.tex"),
                state_file: None,
                passes: DEFAULT_PASSES,
                engine: ToolConfig::pdflatex_batch(),
                columns: ColumnsConfig {
                    marker: DEFINECOLS_MARKER.to_string(),
                    scan: ScanStrategy::FullText,
                    expected: vec![5, 3, 5, 3, 5, 3, 5],
                },
                preset: PresetConfig {
                    name: EXAM_PRESET.to_string(),
                    namespace: "columnspread".to_string(),
                    source: PathBuf::from("test.tex"),
                    generate: None,
                    expected: exam,
                },
            },
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "columen" => Ok(Self::Columen),
            "columnspread" => Ok(Self::Columnspread),
            _ => Err(()),
        }
    }
}

/// An external program plus the arguments placed before its target file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolConfig {
    pub fn pdflatex() -> Self {
        Self {
            program: "pdflatex".to_string(),
            args: Vec::new(),
        }
    }

    /// `pdflatex -interaction=batchmode`, which never stops for terminal input on errors.
    pub fn pdflatex_batch() -> Self {
        Self {
            program: "pdflatex".to_string(),
            args: vec!["-interaction=batchmode".to_string()],
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self::pdflatex_batch()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    /// Text preceding `<index>}{<count>}` in each state record.
    pub marker: String,
    pub scan: ScanStrategy,
    pub expected: Vec<u32>,
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Variant::Columen.config().columns
    }
}

/// Builds a derived preset source from its recipe when the source is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub recipe: PathBuf,
    pub tool: ToolConfig,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            recipe: PathBuf::from("columen.ins"),
            tool: ToolConfig::pdflatex(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetConfig {
    pub name: String,
    pub namespace: String,
    /// File searched for `\@namedef{<namespace>@preset@<name>}{...}`.
    pub source: PathBuf,
    pub generate: Option<GenerateConfig>,
    pub expected: Vec<String>,
}

impl Default for PresetConfig {
    fn default() -> Self {
        Variant::Columen.config().preset
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HarnessConfig {
    pub document: PathBuf,
    /// Defaults to `<document stem>.aux`, which the engine writes into its working directory.
    pub state_file: Option<PathBuf>,
    pub passes: u32,
    pub engine: ToolConfig,
    pub columns: ColumnsConfig,
    pub preset: PresetConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Variant::Columen.config()
    }
}

impl HarnessConfig {
    /// Loads a YAML config over the `columen` defaults.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_over(Self::default(), path)
    }

    /// Loads a YAML config over `base`. Mappings merge key by key; any other value
    /// (sequences, scalars, `null`) replaces the base value outright.
    pub fn load_over(base: Self, path: &Path) -> Result<Self> {
        let config_error = |source: serde_yaml::Error| Error::Config {
            path: path.to_path_buf(),
            source,
        };
        let text = fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let mut merged = serde_yaml::to_value(&base).map_err(config_error)?;
        if !text.trim().is_empty() {
            let overlay: Value = serde_yaml::from_str(&text).map_err(config_error)?;
            if !overlay.is_null() {
                merge_yaml(&mut merged, overlay);
            }
        }
        let config: Self = serde_yaml::from_value(merged).map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.passes == 0 {
            return Err(Error::InvalidConfig("passes must be at least 1".to_string()));
        }
        if self.document.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("document must not be empty".to_string()));
        }
        if self.engine.program.trim().is_empty() {
            return Err(Error::InvalidConfig("engine.program must not be empty".to_string()));
        }
        if self.columns.marker.is_empty() {
            return Err(Error::InvalidConfig("columns.marker must not be empty".to_string()));
        }
        if self.preset.name.trim().is_empty() || self.preset.namespace.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "preset.name and preset.namespace must not be empty".to_string(),
            ));
        }
        if let Some(generate) = &self.preset.generate {
            if generate.tool.program.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "preset.generate.tool.program must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn document_path(&self, root: &Path) -> PathBuf {
        root.join(&self.document)
    }

    pub fn state_path(&self, root: &Path) -> PathBuf {
        match &self.state_file {
            Some(path) => root.join(path),
            None => {
                let stem = self.document.file_stem().unwrap_or_default();
                root.join(Path::new(stem).with_extension("aux"))
            }
        }
    }
}

fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_yaml(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
