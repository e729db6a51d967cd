//! Prompt tooling: the built-in template library and the heuristic
//! prompt analyzer.

pub mod optimizer;
pub mod templates;

pub use optimizer::{OptimizationIssue, OptimizationResult, Severity};
pub use templates::{render, PromptTemplate, TemplateLibrary};
