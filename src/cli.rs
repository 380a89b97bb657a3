use crate::diagnostic::LogSink;
use crate::error::{DumpError, Result};
use crate::{config, inspect, report};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "jstack-lens")]
#[command(about = "Parse a jstack thread dump and report blocked or deeply stuck threads.", long_about = None)]
pub struct Cli {
    /// Dump file to read ("-" reads stdin)
    #[arg(long, default_value = "-")]
    pub input: PathBuf,

    /// TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override analyzer.max_stack_depth
    #[arg(long)]
    pub max_stack_depth: Option<usize>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a human-readable summary
    Report {
        /// Number of stack groups to list (overrides report.top_stacks)
        #[arg(long)]
        top: Option<usize>,
    },
    /// Print the full dump as JSON
    Json {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print one thread as JSON
    Thread {
        /// tid as it appears in the dump, e.g. 0x00007f53d8193800
        tid: String,
    },
}

pub fn run() -> Result<()> {
    execute(Cli::parse())
}

pub fn execute(cli: Cli) -> Result<()> {
    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(depth) = cli.max_stack_depth {
        cfg.analyzer.max_stack_depth = depth;
    }

    let text = read_input(&cli.input)?;
    let dump = inspect(&text, &cfg.analyzer, &mut LogSink)?;

    match cli.cmd {
        Command::Report { top } => {
            let top_n = top.unwrap_or(cfg.report.top_stacks);
            print!("{}", report::render(&dump, top_n));
        }

        Command::Json { out } => {
            let json = dump.to_json()?;
            match out {
                Some(path) => {
                    fs::write(&path, json)?;
                    println!("Saved report to {}", path.display());
                }
                None => println!("{json}"),
            }
        }

        Command::Thread { tid } => {
            let mut thread = dump
                .threads
                .get(&tid)
                .cloned()
                .ok_or_else(|| DumpError::UnknownThread(tid.clone()))?;
            println!("{}", thread.to_json()?);
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut s = String::new();
        std::io::stdin().read_to_string(&mut s)?;
        Ok(s)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}
