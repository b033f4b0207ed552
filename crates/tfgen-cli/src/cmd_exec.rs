// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `tfgen exec` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Generate the templated files in a directory
#[derive(Debug, Args)]
pub struct CmdExec {
    /// Target directory
    #[clap(default_value = ".")]
    dir: PathBuf,

    /// Run in every directory below DIR that contains .tf files
    #[clap(short, long)]
    recurse: bool,
}

impl CmdExec {
    pub fn run(&mut self, options: &tfgen::DiscoveryOptions) -> Result<i32> {
        let mut diag = tfgen::Diagnostics::new();

        let reports = if self.recurse {
            tfgen::exec_recursive(&self.dir, options, &mut diag)?
        } else {
            vec![tfgen::exec(&self.dir, options, &mut diag)?]
        };

        for report in &reports {
            print_report(report);
        }
        Ok(0)
    }
}

/// Print the files written for one target directory.
pub fn print_report(report: &tfgen::RenderReport) {
    println!(
        "{} {}",
        "Generated".green().bold(),
        report.target_dir.display().to_string().cyan()
    );
    for path in &report.written {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        println!("  + {name}");
    }
}
