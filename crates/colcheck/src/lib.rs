#![forbid(unsafe_code)]

//! Regression harness for aux-driven column allocation in LaTeX list packages.
//!
//! A run drives an external engine (`pdflatex` by default) over a demonstration document until
//! the column counts recorded in its `.aux` file converge, then checks:
//! - the per-list column counts, ordered by list index
//! - the token list registered for a named preset (`\@namedef{<ns>@preset@<name>}{...}`)
//!
//! The allocation algorithm itself lives in the macro package and is treated as a black box.

pub mod compare;
pub mod config;
pub mod driver;
pub mod error;
pub mod harness;
pub mod preset;
pub mod state;

pub use compare::{MismatchReport, check_sequence};
pub use config::{HarnessConfig, ToolConfig, Variant};
pub use driver::{CompilationDriver, Invocation, ProcessRunner, ToolRunner};
pub use error::{Error, Result};
pub use harness::{Harness, RunReport, SUCCESS_MESSAGE, Stage};
pub use preset::{PresetDefinition, PresetExtractor};
pub use state::{ColumnAssignment, ScanStrategy};
