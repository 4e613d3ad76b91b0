use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Jsonl,
    Bar,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Bar => "bar",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tagflow", version, about = "Batch image annotation against remote vision models")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file. Defaults to ~/.tagflow/config.toml, then ./tagflow.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Directory or `.zip` archive holding the images to annotate.
    pub dir: PathBuf,

    /// Override `run.concurrency` from the config file.
    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write images with `<stem>.txt` captions into this directory, or into
    /// one archive when the path ends in `.zip`.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Descend into subdirectories.
    #[arg(long)]
    pub recursive: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ModelsArgs {
    /// Only probe this endpoint id.
    #[arg(long)]
    pub endpoint: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct InitArgs {
    /// Where to write the config. Defaults to ~/.tagflow/config.toml.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Annotate every unlabeled image in a directory.
    Run(RunArgs),
    /// List the models each configured endpoint offers.
    Models(ModelsArgs),
    /// Write a starter config file.
    Init(InitArgs),
}
