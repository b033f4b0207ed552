// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `tfgen exec_all` command.

use std::path::PathBuf;

use clap::Args;
use miette::Result;

use crate::cmd_exec::print_report;

/// Generate the templated files in every target directory of the root layer
#[derive(Debug, Args)]
pub struct CmdExecAll {
    /// Directory the root's target_directories are relative to
    #[clap(default_value = ".")]
    dir: PathBuf,
}

impl CmdExecAll {
    pub fn run(&mut self, options: &tfgen::DiscoveryOptions) -> Result<i32> {
        let mut diag = tfgen::Diagnostics::new();
        let reports = tfgen::exec_all(&self.dir, options, &mut diag)?;

        for report in &reports {
            print_report(report);
        }
        println!();
        println!("Total: {} directory(ies)", reports.len());
        Ok(0)
    }
}
