// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! tfgen - Hierarchical Terraform Boilerplate Generator
//!
//! This crate resolves a hierarchy of `.tfgen.yaml` configuration layers
//! scattered across a directory tree into one effective configuration, and
//! renders the configured templates into a target directory.
//!
//! # Overview
//!
//! Starting at a target directory, tfgen walks upward collecting layers until
//! it reaches one marked `root_file: true`. The layers are merged with the
//! closest directory winning, a few computed variables are injected, and every
//! template is rendered in strict mode. Generation is all-or-nothing: if any
//! template fails, nothing is written.
//!
//! # Example
//!
//! ```yaml
//! # infra/.tfgen.yaml
//! root_file: true
//! vars:
//!   company: acme
//! template_files:
//!   backend.tf: |
//!     terraform {
//!       backend "s3" {
//!         key = "{{ tfgen_state_key }}/terraform.tfstate"
//!       }
//!     }
//!
//! # infra/prod/.tfgen.yaml
//! vars:
//!   env: prod
//! ```
//!
//! A layer may instead be declared as a `.tfgen.d/` directory containing a
//! `.tfgen.yaml` control file, in which case every other file in the
//! directory is a template keyed by its file name.

pub mod cleanup;
pub mod compose;
pub mod context;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod layer;
pub mod render;
pub mod spec;
pub mod workflow;

pub use cleanup::{clean_generated, clean_pattern, generated_paths, remove_files};
pub use compose::{merge, EffectiveConfig, GeneratedFile};
pub use context::build_context;
pub use diagnostics::{Diagnostics, Event, Severity};
pub use discovery::{build_chain, locate, DiscoveryOptions, Marker};
pub use error::{CleanFailure, Error, Result, TemplateFailure};
pub use layer::{ConfigLayer, LayerSource};
pub use render::{render, RenderReport};
pub use spec::{ControlDocument, Dependencies, Module, NameRewrite, Provider};
pub use workflow::{clean, clean_all, exec, exec_all, exec_recursive, resolve, Resolved};

/// Well-known filename for the control document.
pub const TFGEN_FILENAME: &str = ".tfgen.yaml";

/// Well-known directory name for the directory form of a layer.
pub const TFGEN_DIRNAME: &str = ".tfgen.d";

/// Default number of directories examined while ascending towards a root layer.
pub const MAX_DEPTH: usize = 20;

/// Variable holding the path from the root layer to the target directory.
pub const STATE_KEY_VAR: &str = "tfgen_state_key";

/// Alias of [`STATE_KEY_VAR`] kept for templates written against older releases.
pub const WORKING_DIR_VAR: &str = "tfgen_working_dir";

/// Context key under which the merged dependency bundle is exposed.
pub const DEPS_CONTEXT_KEY: &str = "deps";
