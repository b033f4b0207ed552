// Copyright (c) Contributors to the SPK project.
// SPDX-License-Identifier: Apache-2.0

//! tfgen - Hierarchical Terraform Boilerplate Generator CLI

use clap::{Parser, Subcommand};
use miette::Result;

mod cmd_clean;
mod cmd_clean_all;
mod cmd_exec;
mod cmd_exec_all;
mod cmd_init;
mod cmd_show;

use cmd_clean::CmdClean;
use cmd_clean_all::CmdCleanAll;
use cmd_exec::CmdExec;
use cmd_exec_all::CmdExecAll;
use cmd_init::CmdInit;
use cmd_show::CmdShow;

#[derive(Parser)]
#[clap(
    name = "tfgen",
    about = "Hierarchical Terraform Boilerplate Generator",
    version,
    long_about = "Generate Terraform boilerplate from .tfgen.yaml files layered across a directory tree"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(flatten)]
    discovery: DiscoveryFlags,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long, global = true)]
    quiet: bool,
}

#[derive(Parser, Clone, Debug)]
pub struct DiscoveryFlags {
    /// Maximum number of directories examined while searching for configuration
    #[clap(
        long = "max-depth",
        global = true,
        env = "TFGEN_MAX_DEPTH",
        default_value_t = tfgen::MAX_DEPTH
    )]
    pub max_depth: usize,
}

impl DiscoveryFlags {
    pub fn options(&self) -> tfgen::DiscoveryOptions {
        tfgen::DiscoveryOptions {
            max_depth: self.max_depth,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Generate the templated files in a directory
    Exec(CmdExec),

    /// Generate the templated files in every configured target directory
    #[clap(name = "exec_all", alias = "exec-all")]
    ExecAll(CmdExecAll),

    /// Remove the files generated in a directory
    Clean(CmdClean),

    /// Remove every file matching the root clean pattern
    #[clap(name = "clean_all", alias = "clean-all")]
    CleanAll(CmdCleanAll),

    /// Display the resolved configuration for a directory
    Show(CmdShow),

    /// Create a new .tfgen.yaml file
    Init(CmdInit),
}

impl Opt {
    fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .init();

        let options = self.discovery.options();

        // Dispatch to command
        match self.cmd {
            Command::Exec(mut cmd) => cmd.run(&options),
            Command::ExecAll(mut cmd) => cmd.run(&options),
            Command::Clean(mut cmd) => cmd.run(&options),
            Command::CleanAll(mut cmd) => cmd.run(&options),
            Command::Show(mut cmd) => cmd.run(&options),
            Command::Init(mut cmd) => cmd.run(),
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
