// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `tfgen clean` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Remove the files generated in a directory
#[derive(Debug, Args)]
pub struct CmdClean {
    /// Target directory
    #[clap(default_value = ".")]
    dir: PathBuf,

    /// Skip generated files that do not exist instead of failing
    #[clap(long)]
    ignore_missing: bool,
}

impl CmdClean {
    pub fn run(&mut self, options: &tfgen::DiscoveryOptions) -> Result<i32> {
        let mut diag = tfgen::Diagnostics::new();

        let result = if self.ignore_missing {
            let resolved = tfgen::resolve(&self.dir, options, &mut diag)?;
            let paths: Vec<PathBuf> = tfgen::generated_paths(&resolved.config)?
                .into_iter()
                .filter(|p| p.exists())
                .collect();
            tfgen::remove_files(&paths, &mut diag)
        } else {
            tfgen::clean(&self.dir, options, &mut diag)
        };

        report(result)
    }
}

/// Print what was removed, including on a partial failure.
pub fn report(result: tfgen::Result<Vec<PathBuf>>) -> Result<i32> {
    match result {
        Ok(removed) => {
            print_removed(&removed);
            Ok(0)
        }
        Err(err) => {
            if let tfgen::Error::CleanFailed { removed, .. } = &err {
                print_removed(removed);
            }
            Err(err.into())
        }
    }
}

/// Print the list of removed files.
pub fn print_removed(removed: &[PathBuf]) {
    if removed.is_empty() {
        println!("  {}", "(nothing to remove)".dimmed());
        return;
    }
    for path in removed {
        println!("  {} {}", "-".red(), path.display());
    }
    println!();
    println!("Total: {} file(s) removed", removed.len());
}
