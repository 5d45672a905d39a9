//! CLI command definitions using clap

use crate::catalog::RuntimeType;
use crate::cluster::Backend;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cf-support",
    version,
    about = "Collect Kubernetes support data for Codefresh runtimes",
    long_about = None,
)]
pub struct Cli {
    /// Kubernetes context to use
    #[arg(long, global = true, env = "CF_SUPPORT_CONTEXT")]
    pub context: Option<String>,

    /// Directory receiving the support package [default: from config, else .]
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Concurrent requests per resource kind [default: from config, else 5]
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Where describe output and logs come from [default: from config, else api]
    #[arg(long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Runtime to collect; prompted for when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Collect data for a Pipelines runtime
    Pipelines(PipelinesArgs),

    /// Collect data for a GitOps runtime
    #[command(alias = "gitops-runtime")]
    Gitops(NamespaceArgs),

    /// Collect data for an On-Prem installation
    #[command(alias = "on-prem")]
    Onprem(NamespaceArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Command {
    /// Runtime type collected by this command, if any
    pub fn runtime(&self) -> Option<RuntimeType> {
        match self {
            Command::Pipelines(_) => Some(RuntimeType::Pipelines),
            Command::Gitops(_) => Some(RuntimeType::GitOps),
            Command::Onprem(_) => Some(RuntimeType::OnPrem),
            Command::Completions(_) => None,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        match self {
            Command::Pipelines(args) => args.namespace.as_deref(),
            Command::Gitops(args) | Command::Onprem(args) => args.namespace.as_deref(),
            Command::Completions(_) => None,
        }
    }
}

#[derive(Args, Default)]
pub struct NamespaceArgs {
    /// Namespace of the installation; prompted for when omitted
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,
}

#[derive(Args, Default)]
pub struct PipelinesArgs {
    /// Namespace of the runtime; prompted for when omitted
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// Runtime environment whose spec is collected from the platform API
    #[arg(short = 'r', long)]
    pub runtime: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
