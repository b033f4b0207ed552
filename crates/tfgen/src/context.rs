// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Computed variables injected into the effective configuration.

use std::path::{Path, PathBuf};

use crate::{
    Diagnostics, EffectiveConfig, DEPS_CONTEXT_KEY, STATE_KEY_VAR, WORKING_DIR_VAR,
};

#[cfg(test)]
#[path = "./context_test.rs"]
mod context_test;

/// Inject the reserved variables into `config`.
///
/// `tfgen_state_key` and `tfgen_working_dir` hold the path from the root
/// layer's directory to the target directory. A user variable with either
/// name is overwritten, and a user variable named `deps` is dropped since
/// that key carries the dependency bundle in templates. Each collision is
/// reported as a warning.
pub fn build_context(mut config: EffectiveConfig, diag: &mut Diagnostics) -> EffectiveConfig {
    let state_key = relative_path(&config.root_dir, &config.target_dir);
    let state_key = state_key.to_string_lossy().into_owned();

    for key in [STATE_KEY_VAR, WORKING_DIR_VAR] {
        if let Some(previous) = config.variables.insert(key.to_string(), state_key.clone()) {
            diag.warn(
                "tfgen::reserved_key_collision",
                format!(
                    "variable '{key}' is reserved; declared value {previous:?} replaced by {state_key:?}"
                ),
            );
        }
    }

    if config.variables.remove(DEPS_CONTEXT_KEY).is_some() {
        diag.warn(
            "tfgen::reserved_key_collision",
            format!("variable '{DEPS_CONTEXT_KEY}' is reserved for the dependency bundle and was dropped"),
        );
    }

    diag.debug(
        "tfgen::context_built",
        format!("{STATE_KEY_VAR} = {state_key}"),
    );
    config
}

/// Relative path from `base` to `target`, `.` when they are the same.
fn relative_path(base: &Path, target: &Path) -> PathBuf {
    if let Ok(rel) = target.strip_prefix(base) {
        if rel.as_os_str().is_empty() {
            return PathBuf::from(".");
        }
        return rel.to_path_buf();
    }

    // Target outside of the root: climb to the common ancestor first.
    let base: Vec<_> = base.components().collect();
    let target: Vec<_> = target.components().collect();
    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &target[common..] {
        rel.push(component.as_os_str());
    }
    rel
}
