// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `tfgen show` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

/// Display the resolved configuration for a directory
#[derive(Debug, Args)]
pub struct CmdShow {
    /// Target directory
    #[clap(default_value = ".")]
    dir: PathBuf,

    /// Output format: table, yaml
    #[clap(long, default_value = "table")]
    format: String,
}

impl CmdShow {
    pub fn run(&mut self, options: &tfgen::DiscoveryOptions) -> Result<i32> {
        let mut diag = tfgen::Diagnostics::new();
        let resolved = tfgen::resolve(&self.dir, options, &mut diag)?;

        if self.format == "yaml" {
            self.show_yaml(&resolved)?;
        } else {
            self.show_layers_table(&resolved.chain);
            println!();
            self.show_config_table(&resolved.config)?;
        }

        Ok(0)
    }

    fn show_layers_table(&self, chain: &[tfgen::ConfigLayer]) {
        println!("{}", "Discovered Layers:".bold());
        println!();

        for (i, layer) in chain.iter().enumerate() {
            let root_marker = if layer.is_root() { " [root]" } else { "" };
            let dir_marker = match &layer.source {
                tfgen::LayerSource::Directory { templates, .. } => {
                    format!(" [{} template file(s)]", templates.len())
                }
                tfgen::LayerSource::File { .. } => String::new(),
            };
            println!(
                "  {}. {}{}{}",
                i + 1,
                layer.control_file().display().to_string().cyan(),
                root_marker.yellow(),
                dir_marker.blue()
            );
        }

        println!();
        println!("Total: {} layer(s)", chain.len());
    }

    fn show_config_table(&self, config: &tfgen::EffectiveConfig) -> Result<()> {
        println!("{}", "Variables:".bold());
        println!();
        if config.variables.is_empty() {
            println!("  {}", "(no variables)".dimmed());
        }
        for (name, value) in &config.variables {
            println!("  {} = {}", name.cyan(), value.green());
        }

        println!();
        println!("{}", "Generated Files:".bold());
        println!();
        let files = config.generated_files()?;
        if files.is_empty() {
            println!("  {}", "(no templates)".dimmed());
        }
        for file in &files {
            if file.template == file.output {
                println!("  {}", file.output.green());
            } else {
                println!("  {} <- {}", file.output.green(), file.template.dimmed());
            }
        }

        let deps = &config.deps;
        if !deps.terraform_version.is_empty()
            || !deps.required_providers.is_empty()
            || !deps.modules.is_empty()
        {
            println!();
            println!("{}", "Dependencies:".bold());
            println!();
            if !deps.terraform_version.is_empty() {
                println!("  terraform {}", deps.terraform_version.green());
            }
            for (name, provider) in &deps.required_providers {
                println!(
                    "  provider {} {} {}",
                    name.cyan(),
                    provider.source,
                    provider.version.green()
                );
            }
            for (name, module) in &deps.modules {
                println!(
                    "  module {} {} {}",
                    name.cyan(),
                    module.source,
                    module.version.green()
                );
            }
        }

        if let Some(pattern) = &config.clean_pattern {
            println!();
            println!("{} {}", "Clean Pattern:".bold(), pattern.yellow());
        }
        if !config.target_directories.is_empty() {
            println!();
            println!("{}", "Target Directories:".bold());
            println!();
            for dir in &config.target_directories {
                println!("  {}", dir.cyan());
            }
        }

        Ok(())
    }

    fn show_yaml(&self, resolved: &tfgen::Resolved) -> Result<()> {
        println!("# Discovered Layers:");
        for layer in &resolved.chain {
            println!("# - {}", layer.control_file().display());
        }
        println!();

        println!("# Effective Configuration:");
        let yaml = serde_yaml::to_string(&resolved.config).into_diagnostic()?;
        print!("{yaml}");

        Ok(())
    }
}
