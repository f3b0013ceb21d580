// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! hashcsp CLI

mod cli;

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{error, info};

use hashcsp::browser::{BrowserDriver, HttpDriver, SessionConfig};
use hashcsp::config::{parse_directive_pairs, CspConfig};
use hashcsp::fetcher::{FetchOptions, InteractionLevel, RemoteFetcher};
use hashcsp::logging::{self, LoggingConfig};
use hashcsp::policy::{DirectiveMap, PolicyState};
use hashcsp::report::{render_diff, render_lint, SummaryReport};
use hashcsp::scanner::LocalScanner;
use hashcsp::validate::{validate, validate_policy};

use cli::{Cli, Command, Engine, FetchArgs, GenerateArgs, InitArgs, ValidateArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = match LoggingConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(level) = cli.log_level {
        log_config = log_config.level(level);
    }
    if let Err(e) = logging::init(&log_config) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    info!(version = hashcsp::VERSION, operation = "cli_startup", "hashcsp started");

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Generate(args) => generate(cli.config.as_deref(), args),
        Command::Validate(args) => validate_cmd(cli.config.as_deref(), args),
        Command::Fetch(args) => fetch(cli.config.as_deref(), args).await,
        Command::Init(args) => init(args),
    }
}

/// State seeded from the config file, or from the baseline when none applies
fn seeded_state(config: Option<&CspConfig>) -> PolicyState {
    let mut state = PolicyState::new();
    if let Some(config) = config {
        config.apply_to(&mut state);
    }
    state.set_default_directives();
    state
}

fn load_config(path: Option<&Path>) -> Result<Option<CspConfig>> {
    CspConfig::load(path).context("failed to load config")
}

fn generate(config_path: Option<&Path>, args: GenerateArgs) -> Result<ExitCode> {
    let config = match &args.directives_file {
        Some(path) => Some(
            CspConfig::from_file(path)
                .with_context(|| format!("invalid directives file {}", path.display()))?,
        ),
        None => load_config(config_path)?,
    };
    let mut state = seeded_state(config.as_ref());

    if let Some(pairs) = &args.directives {
        let pairs = parse_directive_pairs(pairs).context(
            "invalid directives, use 'directive:value' (e.g. script-src:'self' https://example.com)",
        )?;
        for (name, sources) in pairs {
            state.update_directive(&name, &sources);
        }
    }

    let summary = LocalScanner::new(&mut state).scan_directory(&args.path)?;
    info!(
        path = %args.path.display(),
        files_found = summary.files_found,
        files_scanned = summary.files_scanned,
        files_skipped = summary.skipped.len(),
        "Scan finished"
    );

    let header = state.generate_serialized(true);
    println!("{}", SummaryReport::new(state.stats()));

    if args.lint {
        print!("{}", render_lint(&state.lint_directives()));
    }

    let output = args.output_path();
    if args.json_output {
        let json = CspConfig::new(state.merged_directives())
            .save(&output, args.dry_run)
            .with_context(|| format!("failed to write {}", output.display()))?;
        if args.dry_run {
            println!("Dry-run: CSP JSON output:\n{}", json);
        } else {
            println!("CSP JSON written to {}", output.display());
        }
    } else {
        write_output(&output, &header, args.dry_run)?;
    }

    Ok(ExitCode::SUCCESS)
}

fn validate_cmd(config_path: Option<&Path>, args: ValidateArgs) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let mut state = seeded_state(config.as_ref());

    if !args.file.is_file() {
        bail!("File {} does not exist or is not a file", args.file.display());
    }
    let stored = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    LocalScanner::new(&mut state).scan_directory(&args.path)?;

    let outcome = validate_policy(&stored, &mut state);
    if outcome.valid {
        println!("CSP validation passed!");
        return Ok(ExitCode::SUCCESS);
    }

    println!("CSP header mismatch!");
    print!("{}", render_diff(&outcome.diff));
    println!("To create the correct CSP header, run the `generate` command with the same path");
    Ok(ExitCode::FAILURE)
}

async fn fetch(config_path: Option<&Path>, args: FetchArgs) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let state = seeded_state(config.as_ref());

    let session = SessionConfig::new()
        .navigation_timeout(Duration::from_secs(args.timeout))
        .headless(!args.headful);
    let options = FetchOptions::new()
        .wait(Duration::from_secs(args.wait))
        .interaction_level(InteractionLevel::from_level(args.interaction_level)?)
        .retries(args.retries)
        .observe_dom(args.observe_dom);

    let fetcher = RemoteFetcher::new(driver(args.engine)?, session, state.into_shared());
    let outcome = fetcher.fetch(&args.url, &options).await?;

    if !outcome.success {
        match &outcome.failure {
            Some(failure) => eprintln!("Failed to fetch {}: {}", args.url, failure),
            None => eprintln!("Failed to fetch {}. No CSP header generated.", args.url),
        }
        return Ok(ExitCode::FAILURE);
    }

    let computed = {
        let mut state = fetcher.policy().lock();
        let computed = state.generate_serialized(true);
        println!("{}", SummaryReport::new(state.stats()));
        computed
    };

    println!("=== Website's CSP Header ===");
    println!(
        "{}",
        outcome
            .site_policy
            .as_deref()
            .unwrap_or("No CSP header found in the website's response.")
    );
    println!("\n=== Computed CSP Header ===");
    println!("{}", computed);

    if args.compare {
        match &outcome.site_policy {
            Some(site) => {
                println!("\n=== CSP Comparison ===");
                let diff = validate(site, &DirectiveMap::parse_policy(&computed));
                print!("{}", render_diff(&diff));
            }
            None => println!("Cannot compare: No CSP header found in the website's response."),
        }
    }

    write_output(&args.output, &computed, args.dry_run)?;
    Ok(ExitCode::SUCCESS)
}

fn init(args: InitArgs) -> Result<ExitCode> {
    let mut config = CspConfig::default();
    if let Some(pairs) = &args.directives {
        for (name, sources) in parse_directive_pairs(pairs)? {
            config.directives.set(&name, sources);
        }
    }

    let json = config
        .save(&args.output, args.dry_run)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    if args.dry_run {
        println!("Dry-run: config output:\n{}", json);
    } else {
        println!("Config written to {}", args.output.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn driver(engine: Engine) -> Result<Box<dyn BrowserDriver>> {
    match engine {
        Engine::Http => Ok(Box::new(HttpDriver::new())),
        #[cfg(feature = "chrome")]
        Engine::Chrome => Ok(Box::new(hashcsp::browser::ChromeDriver::new())),
        #[cfg(not(feature = "chrome"))]
        Engine::Chrome => bail!("this build has no chrome engine, use --engine http"),
    }
}

fn write_output(path: &Path, text: &str, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("Dry-run: CSP header output:\n{}", text);
        info!(file_path = %path.display(), "Dry-run: CSP header previewed");
        return Ok(());
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    println!("CSP header written to {}", path.display());
    Ok(())
}
