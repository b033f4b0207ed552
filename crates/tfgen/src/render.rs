// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Strict template rendering with an all-or-nothing commit.
//!
//! Rendering happens in three phases:
//!
//! 1. every template is rendered in memory, collecting every failure;
//! 2. if all succeeded, each output is staged in a temporary file inside
//!    the target directory;
//! 3. staged files are renamed into place; a file being replaced is moved
//!    aside first and put back if a later rename fails.
//!
//! Nothing touches the target directory unless every template rendered.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::{
    escape_formatter, AutoEscape, Environment, ErrorKind, Output, State, UndefinedBehavior, Value,
};
use minijinja::value::ValueKind;
use tempfile::{NamedTempFile, TempPath};

use crate::compose::GeneratedFile;
use crate::{Dependencies, Diagnostics, EffectiveConfig, TemplateFailure, DEPS_CONTEXT_KEY};

#[cfg(test)]
#[path = "./render_test.rs"]
mod render_test;

/// Files written by a successful render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub target_dir: PathBuf,
    /// Absolute paths of the generated files, sorted.
    pub written: Vec<PathBuf>,
}

/// Render every template of `config` into its target directory.
///
/// On any failure the target directory is left as it was and the error
/// lists every template that failed.
pub fn render(config: &EffectiveConfig, diag: &mut Diagnostics) -> crate::Result<RenderReport> {
    let templates = config.templates()?;
    let env = template_environment(&config.deps);
    let ctx = template_context(config);

    let mut rendered: Vec<(&GeneratedFile, String)> = Vec::with_capacity(templates.len());
    let mut failures = Vec::new();
    for (file, body) in &templates {
        match env.render_named_str(&file.template, body, &ctx) {
            Ok(output) => rendered.push((file, output)),
            Err(err) => {
                let reason = describe(&err);
                diag.warn(
                    "tfgen::template_failed",
                    format!("failed to render {}: {reason}", file.template),
                );
                failures.push(TemplateFailure {
                    name: file.template.clone(),
                    reason,
                });
            }
        }
    }

    if !failures.is_empty() {
        return Err(crate::Error::RenderFailed {
            target: config.target_dir.clone(),
            failures,
        });
    }

    for (file, _) in &rendered {
        let dest = config.target_dir.join(&file.output);
        if dest.exists() && !dest.is_file() {
            return Err(crate::Error::WriteFailed {
                path: dest,
                error: std::io::Error::other("destination exists and is not a regular file"),
            });
        }
    }

    let mut staged = Vec::with_capacity(rendered.len());
    for (file, output) in rendered {
        let dest = config.target_dir.join(&file.output);
        let tmp = stage(&config.target_dir, &output).map_err(|e| crate::Error::WriteFailed {
            path: dest.clone(),
            error: e,
        })?;
        staged.push((tmp, dest));
    }

    // Remaining temporary files are removed when dropped on early return.
    let mut committed: Vec<Committed> = Vec::with_capacity(staged.len());
    for (tmp, dest) in staged {
        let backup = match set_aside(&config.target_dir, &dest) {
            Ok(backup) => backup,
            Err(error) => {
                rollback(committed, diag);
                return Err(crate::Error::WriteFailed { path: dest, error });
            }
        };
        let entry = Committed { dest, backup };
        match tmp.persist(&entry.dest) {
            Ok(_) => {
                diag.info(
                    "tfgen::file_written",
                    format!("wrote {}", entry.dest.display()),
                );
                committed.push(entry);
            }
            Err(err) => {
                let path = entry.dest.clone();
                committed.push(entry);
                rollback(committed, diag);
                return Err(crate::Error::WriteFailed {
                    path,
                    error: err.error,
                });
            }
        }
    }

    let mut written: Vec<PathBuf> = committed.into_iter().map(|c| c.dest).collect();
    written.sort();
    Ok(RenderReport {
        target_dir: config.target_dir.clone(),
        written,
    })
}

/// A generated file moved into place, with the file it replaced.
///
/// Dropping the backup deletes the previous contents.
struct Committed {
    dest: PathBuf,
    backup: Option<TempPath>,
}

fn template_environment(deps: &Dependencies) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_: &str| AutoEscape::None);
    env.set_formatter(format_value);

    let deps = Arc::new(deps.clone());

    let providers = Arc::clone(&deps);
    env.add_function(
        "required_provider",
        move |name: String| -> Result<String, minijinja::Error> {
            providers
                .required_providers
                .get(&name)
                .map(|p| p.render(&name))
                .ok_or_else(|| undeclared("required provider", &name))
        },
    );

    let modules = Arc::clone(&deps);
    env.add_function(
        "use_module",
        move |name: String| -> Result<String, minijinja::Error> {
            modules
                .modules
                .get(&name)
                .map(|m| m.render())
                .ok_or_else(|| undeclared("module", &name))
        },
    );

    env.add_function("uses_remote_state", move |name: String| {
        deps.uses_remote_state(&name)
    });

    env
}

/// Booleans are written the way HCL spells them.
fn format_value(
    out: &mut Output<'_>,
    state: &State<'_, '_>,
    value: &Value,
) -> Result<(), minijinja::Error> {
    if value.kind() == ValueKind::Bool {
        let text = if value.is_true() { "true" } else { "false" };
        return escape_formatter(out, state, &Value::from(text));
    }
    escape_formatter(out, state, value)
}

fn undeclared(kind: &str, name: &str) -> minijinja::Error {
    minijinja::Error::new(
        ErrorKind::InvalidOperation,
        format!("{kind} '{name}' is not declared in deps"),
    )
}

/// Variables at top level plus the dependency bundle under `deps`.
fn template_context(config: &EffectiveConfig) -> BTreeMap<String, Value> {
    let mut ctx: BTreeMap<String, Value> = config
        .variables
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
        .collect();
    ctx.insert(
        DEPS_CONTEXT_KEY.to_string(),
        Value::from_serialize(&config.deps),
    );
    ctx
}

fn describe(err: &minijinja::Error) -> String {
    match err.kind() {
        ErrorKind::SyntaxError => format!("parse error: {err}"),
        ErrorKind::UndefinedError => format!("undefined variable: {err}"),
        _ => err.to_string(),
    }
}

fn stage(dir: &Path, content: &str) -> std::io::Result<NamedTempFile> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".tfgen-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;

    // Temporary files are created owner-only; generated files are not.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    Ok(tmp)
}

/// Move an existing `dest` to a temporary name in `dir` so it can be restored.
fn set_aside(dir: &Path, dest: &Path) -> std::io::Result<Option<TempPath>> {
    if !dest.exists() {
        return Ok(None);
    }
    let backup = tempfile::Builder::new()
        .prefix(".tfgen-")
        .suffix(".bak")
        .tempfile_in(dir)?
        .into_temp_path();
    std::fs::rename(dest, &backup)?;
    Ok(Some(backup))
}

/// Undo a partial commit, newest first: remove each written file and put
/// back the file it replaced.
fn rollback(committed: Vec<Committed>, diag: &mut Diagnostics) {
    for Committed { dest, backup } in committed.into_iter().rev() {
        match std::fs::remove_file(&dest) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                let kept = backup
                    .and_then(|b| b.keep().ok())
                    .map(|p| format!("; previous contents kept at {}", p.display()))
                    .unwrap_or_default();
                diag.warn(
                    "tfgen::rollback_failed",
                    format!("could not remove {}: {err}{kept}", dest.display()),
                );
                continue;
            }
        }
        let restored = match backup {
            Some(backup) => backup.persist(&dest).map(|()| "restored").map_err(|e| e.error),
            None => Ok("removed"),
        };
        match restored {
            Ok(action) => diag.info(
                "tfgen::rollback",
                format!("{action} {} after a failed commit", dest.display()),
            ),
            Err(err) => diag.warn(
                "tfgen::rollback_failed",
                format!("could not restore {}: {err}", dest.display()),
            ),
        }
    }
}
