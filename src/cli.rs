// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Command line definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use hashcsp::logging::LogLevel;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Declared directives (defaults to ./hashcsp.json when present)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level; overrides LOG_LEVEL
    #[arg(short, long, global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a policy from local HTML files
    Generate(GenerateArgs),
    /// Check a stored policy against local HTML files
    Validate(ValidateArgs),
    /// Generate a policy from a live site
    Fetch(FetchArgs),
    /// Write a starter hashcsp.json
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Directory containing HTML files to scan (e.g. ./public)
    #[arg(short, long)]
    pub path: PathBuf,

    /// Output file (defaults to csp.conf, or csp.json with --json-output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Comma separated directive:sources pairs, e.g. "script-src:'self' https://cdn.example.com,style-src:'self'"
    #[arg(short, long)]
    pub directives: Option<String>,

    /// JSON file with directives; replaces the config file
    #[arg(short = 'f', long)]
    pub directives_file: Option<PathBuf>,

    /// Write the directives as JSON instead of a header
    #[arg(long)]
    pub json_output: bool,

    /// Warn about unsafe sources like *, data: or 'unsafe-inline'
    #[arg(long)]
    pub lint: bool,

    /// Print instead of writing
    #[arg(long)]
    pub dry_run: bool,
}

impl GenerateArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            PathBuf::from(if self.json_output { "csp.json" } else { "csp.conf" })
        })
    }
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory containing HTML files to scan
    #[arg(short, long)]
    pub path: PathBuf,

    /// Stored policy to check (e.g. csp.conf)
    #[arg(short, long)]
    pub file: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Engine {
    /// Headless Chrome
    Chrome,
    /// Plain HTTP, no JavaScript
    Http,
}

impl Default for Engine {
    fn default() -> Self {
        if cfg!(feature = "chrome") {
            Engine::Chrome
        } else {
            Engine::Http
        }
    }
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Site to fetch; must start with http:// or https://
    #[arg(short, long)]
    pub url: String,

    /// Output file for the computed header
    #[arg(short, long, default_value = "csp.conf")]
    pub output: PathBuf,

    /// Seconds to wait for late resources before closing
    #[arg(short, long, default_value_t = 2)]
    pub wait: u64,

    /// Diff the site's own header against the computed one
    #[arg(long)]
    pub compare: bool,

    /// 0 = none, 1 = scroll, 2 = scroll, click and hover
    #[arg(short, long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub interaction_level: u8,

    /// Retries after a failed navigation
    #[arg(short, long, default_value_t = 2)]
    pub retries: u32,

    /// Capture scripts and styles inserted after load
    #[arg(long)]
    pub observe_dom: bool,

    /// Browser engine
    #[arg(short, long, value_enum, default_value_t = Engine::default())]
    pub engine: Engine,

    /// Navigation timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Show the browser window (chrome engine)
    #[arg(long)]
    pub headful: bool,

    /// Print instead of writing
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the config
    #[arg(short, long, default_value = "hashcsp.json")]
    pub output: PathBuf,

    /// Directive:sources pairs replacing the defaults
    #[arg(short, long)]
    pub directives: Option<String>,

    /// Print instead of writing
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_defaults() {
        let cli = Cli::parse_from(["hashcsp", "fetch", "--url", "https://example.com"]);
        match cli.command {
            Command::Fetch(args) => {
                assert_eq!(args.wait, 2);
                assert_eq!(args.retries, 2);
                assert_eq!(args.interaction_level, 0);
                assert_eq!(args.output, PathBuf::from("csp.conf"));
                assert_eq!(args.engine, Engine::default());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_interaction_level_range() {
        let res = Cli::try_parse_from(["hashcsp", "fetch", "-u", "https://example.com", "-i", "3"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_generate_output_default() {
        let cli = Cli::parse_from(["hashcsp", "generate", "-p", "public", "--json-output"]);
        match cli.command {
            Command::Generate(args) => assert_eq!(args.output_path(), PathBuf::from("csp.json")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_log_level() {
        let cli = Cli::parse_from(["hashcsp", "validate", "-p", "public", "-f", "csp.conf", "--log-level", "debug"]);
        assert_eq!(cli.log_level, Some(LogLevel::Debug));
    }
}
