//! Preset registrations (`\@namedef{<namespace>@preset@<name>}{<csv>}`).

use crate::config::PresetConfig;
use crate::driver::{Invocation, ToolRunner};
use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A named, ordered list of environment names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetDefinition {
    name: String,
    tokens: Vec<String>,
}

impl PresetDefinition {
    pub fn from_csv(name: impl Into<String>, csv: &str) -> Self {
        Self {
            name: name.into(),
            tokens: split_csv(csv),
        }
    }

    /// Finds the first registration of `name` under `namespace` in `source`.
    pub fn find(source: &str, namespace: &str, name: &str) -> Result<Option<Self>> {
        let pattern = format!(
            r"\\@namedef\{{{}@preset@{}\}}\{{([^}}]*)\}}",
            regex::escape(namespace),
            regex::escape(name)
        );
        let re = Regex::new(&pattern)?;
        Ok(re
            .captures(source)
            .map(|caps| Self::from_csv(name, &caps[1])))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }
}

/// Splits a preset payload: entries are trimmed, empties dropped, order and duplicates kept.
pub fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads a preset out of its configured source file, generating that file first when the
/// configuration says it is a derived artifact.
#[derive(Debug, Clone, Copy)]
pub struct PresetExtractor<'a> {
    config: &'a PresetConfig,
}

impl<'a> PresetExtractor<'a> {
    pub fn new(config: &'a PresetConfig) -> Self {
        Self { config }
    }

    /// Makes sure the preset source exists, running the generator at most once.
    pub fn ensure_source(&self, root: &Path, runner: &dyn ToolRunner) -> Result<PathBuf> {
        let source = root.join(&self.config.source);
        let Some(generate) = &self.config.generate else {
            return Ok(source);
        };
        if source.is_file() {
            return Ok(source);
        }

        let recipe = root.join(&generate.recipe);
        if !recipe.is_file() {
            return Err(Error::MissingArtifact {
                artifact: source,
                recipe,
            });
        }

        let invocation = Invocation::new(&generate.tool, &generate.recipe, root);
        tracing::debug!(
            command = %invocation,
            artifact = %source.display(),
            "generating preset source"
        );
        runner.run(&invocation)?;
        Ok(source)
    }

    pub fn extract(&self, root: &Path, runner: &dyn ToolRunner) -> Result<PresetDefinition> {
        let path = self.ensure_source(root, runner)?;
        let text = fs::read_to_string(&path).map_err(|source| Error::ReadFile {
            path: path.clone(),
            source,
        })?;
        PresetDefinition::find(&text, &self.config.namespace, &self.config.name)?.ok_or_else(
            || Error::PresetNotFound {
                name: self.config.name.clone(),
                path,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GenerateConfig, ToolConfig, Variant};
    use std::cell::Cell;

    const STY: &str = r"\NeedsTeXFormat{LaTeX2e}
\ProvidesPackage{columen}
\@namedef{columen@preset@lists}{itemize,enumerate}
\@namedef{columen@preset@exam}{itemize, enumerate, description,
  choices, checkboxes, oneparchoices, oneparcheckboxes, parts, subparts,}
\@namedef{columen@preset@exam2}{parts}
";

    /// Writes the generated file when asked to run, counting the calls.
    struct Docstrip<'a> {
        output: &'a Path,
        contents: &'a str,
        calls: Cell<usize>,
    }

    impl ToolRunner for Docstrip<'_> {
        fn run(&self, invocation: &Invocation) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            assert_eq!(invocation.to_string(), "pdflatex columen.ins");
            fs::write(self.output, self.contents).unwrap();
            Ok(())
        }
    }

    struct NeverRun;

    impl ToolRunner for NeverRun {
        fn run(&self, invocation: &Invocation) -> Result<()> {
            panic!("unexpected invocation: {invocation}");
        }
    }

    fn exam() -> Vec<String> {
        Variant::Columen.config().preset.expected
    }

    #[test]
    fn split_csv_trims_and_drops_empties_but_keeps_duplicates() {
        assert_eq!(
            split_csv(" parts ,, subparts,parts ,\n"),
            vec!["parts", "subparts", "parts"]
        );
        assert!(split_csv(" , ,").is_empty());
    }

    #[test]
    fn find_matches_the_exact_preset_name_across_lines() {
        let preset = PresetDefinition::find(STY, "columen", "exam")
            .unwrap()
            .unwrap();
        assert_eq!(preset.name(), "exam");
        assert_eq!(preset.tokens(), exam().as_slice());
    }

    #[test]
    fn find_is_namespace_scoped_and_idempotent() {
        assert_eq!(
            PresetDefinition::find(STY, "columnspread", "exam").unwrap(),
            None
        );
        let first = PresetDefinition::find(STY, "columen", "lists").unwrap();
        let second = PresetDefinition::find(STY, "columen", "lists").unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.unwrap().into_tokens(),
            vec!["itemize".to_string(), "enumerate".to_string()]
        );
    }

    #[test]
    fn names_are_matched_literally() {
        let source = r"\@namedef{columen@preset@a.b}{x}";
        assert!(PresetDefinition::find(source, "columen", "aXb").unwrap().is_none());
        assert!(PresetDefinition::find(source, "columen", "a.b").unwrap().is_some());
    }

    #[test]
    fn existing_source_is_read_without_generation() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("columen.sty"), STY).unwrap();
        let config = Variant::Columen.config().preset;
        let preset = PresetExtractor::new(&config)
            .extract(tmp.path(), &NeverRun)
            .unwrap();
        assert_eq!(preset.into_tokens(), exam());
    }

    #[test]
    fn missing_source_is_generated_once_from_its_recipe() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("columen.ins"), "\\generate{}").unwrap();
        let sty = tmp.path().join("columen.sty");
        let runner = Docstrip {
            output: &sty,
            contents: STY,
            calls: Cell::new(0),
        };
        let config = Variant::Columen.config().preset;
        let preset = PresetExtractor::new(&config)
            .extract(tmp.path(), &runner)
            .unwrap();
        assert_eq!(runner.calls.get(), 1);
        assert_eq!(preset.into_tokens(), exam());
    }

    #[test]
    fn missing_source_and_recipe_is_a_configuration_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Variant::Columen.config().preset;
        let err = PresetExtractor::new(&config)
            .extract(tmp.path(), &NeverRun)
            .unwrap_err();
        assert!(matches!(err, Error::MissingArtifact { .. }), "{err}");
        assert!(err.to_string().contains("columen.ins"));
    }

    #[test]
    fn unregistered_preset_is_a_configuration_error() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("test.tex"), "\\documentclass{article}\n").unwrap();
        let config = Variant::Columnspread.config().preset;
        let err = PresetExtractor::new(&config)
            .extract(tmp.path(), &NeverRun)
            .unwrap_err();
        assert!(matches!(err, Error::PresetNotFound { .. }), "{err}");
        assert!(err.to_string().starts_with("preset 'exam' not found in "));
    }

    #[test]
    fn custom_generator_receives_the_configured_recipe() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/pkg.ins"), "").unwrap();
        let mut config = Variant::Columen.config().preset;
        config.source = PathBuf::from("pkg.sty");
        config.generate = Some(GenerateConfig {
            recipe: PathBuf::from("src/pkg.ins"),
            tool: ToolConfig {
                program: "latex".to_string(),
                args: vec!["-interaction=nonstopmode".to_string()],
            },
        });

        struct Expect;
        impl ToolRunner for Expect {
            fn run(&self, invocation: &Invocation) -> Result<()> {
                assert_eq!(
                    invocation.to_string(),
                    "latex -interaction=nonstopmode src/pkg.ins"
                );
                Ok(())
            }
        }

        let path = PresetExtractor::new(&config)
            .ensure_source(tmp.path(), &Expect)
            .unwrap();
        assert_eq!(path, tmp.path().join("pkg.sty"));
    }
}
