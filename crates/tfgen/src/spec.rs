// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Control document parsing and data types for .tfgen.yaml files.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

#[cfg(test)]
#[path = "./spec_test.rs"]
mod spec_test;

/// Source and version pin of a Terraform provider.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Provider {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub version: String,
}

impl Provider {
    /// Render the provider as an entry of a `required_providers` block.
    pub fn render(&self, name: &str) -> String {
        format!(
            "{name} = {{\n  source  = \"{}\"\n  version = \"{}\"\n}}\n",
            self.source, self.version
        )
    }
}

/// Source and version pin of a Terraform module.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Module {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub version: String,
}

impl Module {
    /// Render the `source` / `version` lines of a module block.
    pub fn render(&self) -> String {
        format!(
            "source  = \"{}\"\nversion = \"{}\"\n",
            self.source, self.version
        )
    }
}

/// Dependency bundle (`deps:` field).
///
/// Every field is serialized so templates can reference empty values.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Dependencies {
    /// Terraform version pin; the closest non-empty value wins.
    #[serde(default)]
    pub terraform_version: String,

    #[serde(default)]
    pub required_providers: BTreeMap<String, Provider>,

    /// Closed set of providers, replaced wholesale by closer layers.
    #[serde(default)]
    pub default_providers: Vec<String>,

    /// Providers contributed by every level, appended in order.
    #[serde(default)]
    pub extra_providers: Vec<String>,

    #[serde(default)]
    pub modules: BTreeMap<String, Module>,

    #[serde(default)]
    pub default_remote_states: Vec<String>,

    #[serde(default)]
    pub extra_remote_states: Vec<String>,
}

impl Dependencies {
    /// True if the remote state is named in either the default or extra list.
    pub fn uses_remote_state(&self, name: &str) -> bool {
        self.default_remote_states
            .iter()
            .chain(self.extra_remote_states.iter())
            .any(|s| s == name)
    }
}

/// Regex based rewrite applied to template names before writing.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct NameRewrite {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

impl NameRewrite {
    /// Compile the pattern, reporting an invalid expression.
    pub fn compile(&self) -> crate::Result<CompiledRewrite<'_>> {
        let regex = Regex::new(&self.pattern).map_err(|e| crate::Error::InvalidRewrite {
            pattern: self.pattern.clone(),
            error: e,
        })?;
        Ok(CompiledRewrite {
            regex,
            replacement: &self.replacement,
        })
    }
}

/// A [`NameRewrite`] ready to apply.
#[derive(Debug)]
pub struct CompiledRewrite<'a> {
    regex: Regex,
    replacement: &'a str,
}

impl CompiledRewrite<'_> {
    pub fn apply(&self, name: &str) -> String {
        self.regex.replace_all(name, self.replacement).into_owned()
    }
}

/// Parsed contents of one .tfgen.yaml file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ControlDocument {
    /// Marks the outermost layer; ascent stops here.
    #[serde(default)]
    pub root_file: bool,

    /// User variables. Scalar YAML values are accepted and stringified.
    #[serde(
        default,
        deserialize_with = "deserialize_vars",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub vars: BTreeMap<String, String>,

    /// Inline templates: file name to template body.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub template_files: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name_rewrite: Option<NameRewrite>,

    /// Glob used by `clean_all`; only read from the root layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_pattern: Option<String>,

    /// Child directories driven by `exec_all` / `clean_all`; only read from the root layer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_directories: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<Dependencies>,
}

impl ControlDocument {
    /// Parse a control document from YAML.
    ///
    /// An empty (or comment-only) document yields the defaults.
    pub fn from_yaml(yaml: &str, path: &Path) -> crate::Result<Self> {
        let invalid = |error: serde_yaml::Error| crate::Error::InvalidYaml {
            path: path.to_path_buf(),
            error,
        };

        // Stage 1: Parse to a generic value so empty documents are accepted
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(invalid)?;
        if value.is_null() {
            return Ok(Self::default());
        }

        // Stage 2: Deserialize the typed document
        serde_yaml::from_value(value).map_err(invalid)
    }

    /// Load a control document from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| crate::Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;
        Self::from_yaml(&yaml, path)
    }
}

fn deserialize_vars<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                _ => {
                    return Err(D::Error::custom(format!(
                        "variable '{key}' must be a string, number or boolean"
                    )));
                }
            };
            Ok((key, text))
        })
        .collect()
}
