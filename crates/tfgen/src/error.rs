// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for tfgen operations.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Convenience Result type with tfgen Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during tfgen operations.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Target is not an existing directory
    #[error("Path {0:?} is not a directory or doesn't exist")]
    #[diagnostic(code(tfgen::not_a_directory))]
    NotADirectory(PathBuf),

    /// No configuration marker within the ascent ceiling
    #[error("No .tfgen.yaml found in {start:?} or its {depth} closest parent directories")]
    #[diagnostic(
        code(tfgen::not_found_in_tree),
        help("Create a .tfgen.yaml with 'tfgen init --root' at the top of your tree")
    )]
    NotFoundInTree { start: PathBuf, depth: usize },

    /// Layers were found but none of them is a root layer
    #[error("No root .tfgen.yaml found above {start:?} within {depth} directories")]
    #[diagnostic(
        code(tfgen::root_not_found),
        help("Mark the outermost .tfgen.yaml with 'root_file: true'")
    )]
    RootNotFound {
        start: PathBuf,
        depth: usize,
        layers: Vec<PathBuf>,
    },

    /// Both marker forms exist in one directory
    #[error("Ambiguous configuration in {0:?}: both .tfgen.yaml and .tfgen.d/ are present")]
    #[diagnostic(
        code(tfgen::ambiguous_config),
        help("Keep either the .tfgen.yaml file or the .tfgen.d directory, not both")
    )]
    AmbiguousConfig(PathBuf),

    /// Control directory without its control document
    #[error("Incomplete configuration: {0:?} does not contain a .tfgen.yaml")]
    #[diagnostic(code(tfgen::incomplete_config))]
    IncompleteConfig(PathBuf),

    /// Invalid YAML in a control document
    #[error("Invalid control document {path:?}: {error}")]
    #[diagnostic(code(tfgen::invalid_yaml), help("Check YAML syntax and field types"))]
    InvalidYaml {
        path: PathBuf,
        #[source]
        error: serde_yaml::Error,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(tfgen::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A layer chain that cannot be merged
    #[error("Invalid layer chain: {0}")]
    #[diagnostic(code(tfgen::invalid_chain))]
    InvalidChain(String),

    /// Name rewrite pattern is not a valid regular expression
    #[error("Invalid template_name_rewrite pattern {pattern:?}")]
    #[diagnostic(code(tfgen::invalid_rewrite))]
    InvalidRewrite {
        pattern: String,
        #[source]
        error: regex::Error,
    },

    /// Output name that would escape the target directory
    #[error("Invalid template output name {0:?}")]
    #[diagnostic(
        code(tfgen::invalid_template_name),
        help("Template names must be plain file names without path separators, and cannot be .tfgen.yaml or .tfgen.d")
    )]
    InvalidTemplateName(String),

    /// Two templates map onto the same output file
    #[error("Templates {templates:?} would all be written to {name:?}")]
    #[diagnostic(
        code(tfgen::duplicate_output),
        help("Adjust template_name_rewrite so every template gets a distinct name")
    )]
    DuplicateOutput { name: String, templates: Vec<String> },

    /// One or more templates failed to render; nothing was written
    #[error("Failed to generate templates in {target:?}: {}", join(.failures))]
    #[diagnostic(
        code(tfgen::render_failed),
        help("The target directory was left unchanged")
    )]
    RenderFailed {
        target: PathBuf,
        failures: Vec<TemplateFailure>,
    },

    /// Failed to write a generated file
    #[error("Failed to write file: {path:?}")]
    #[diagnostic(code(tfgen::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Pattern cleanup requested without a clean_pattern
    #[error("Unable to clean templated files: no 'clean_pattern' defined in root config {0:?}")]
    #[diagnostic(code(tfgen::no_clean_pattern))]
    NoCleanPattern(PathBuf),

    /// exec_all requested without target_directories
    #[error("No 'target_directories' defined in root config {0:?}")]
    #[diagnostic(code(tfgen::no_target_directories))]
    NoTargetDirectories(PathBuf),

    /// clean_pattern is not a valid glob
    #[error("Invalid clean_pattern {pattern:?}")]
    #[diagnostic(code(tfgen::invalid_clean_pattern))]
    InvalidCleanPattern {
        pattern: String,
        #[source]
        error: glob::PatternError,
    },

    /// One or more files could not be removed
    #[error("Failed to clean files: {}", join(.failures))]
    #[diagnostic(
        code(tfgen::clean_failed),
        help("Use 'tfgen clean --ignore-missing' to skip files that were never generated")
    )]
    CleanFailed {
        /// Files that were removed before and after the failures.
        removed: Vec<PathBuf>,
        failures: Vec<CleanFailure>,
    },

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(tfgen::io_error))]
    Io(#[from] std::io::Error),
}

/// A template that could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFailure {
    /// Template name as declared in the configuration.
    pub name: String,
    pub reason: String,
}

impl fmt::Display for TemplateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.reason)
    }
}

/// A file that could not be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for CleanFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.reason)
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
