// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! spacey-astro CLI - resolve an Astro project's configuration
//!
//! Prints `{ "filePath": ..., "value": ... }` as JSON.

use clap::Parser;
use owo_colors::OwoColorize;
use spacey_config::{ConfigLoader, LoadOptions, ServiceOptions, VERSION};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "spacey-astro",
    about = "Resolve an Astro project's configuration",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Project root (defaults to the current directory)
    root: Option<PathBuf>,

    /// Fail when no configuration file is found
    #[arg(long)]
    must_exist: bool,

    /// Extra package to keep external when transforming TypeScript configs
    #[arg(long = "external", value_name = "PKG")]
    externals: Vec<String>,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("spacey_config=debug,spacey_esm=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_writer(std::io::stderr)
            .init();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let root = cli.root.unwrap_or_else(|| PathBuf::from("."));

    let mut service_options = ServiceOptions::default();
    for external in cli.externals {
        if !service_options.ssr_external.contains(&external) {
            service_options.ssr_external.push(external);
        }
    }

    let config = ConfigLoader::new()
        .with_service_options(service_options)
        .load(&root, LoadOptions { must_exist: cli.must_exist })
        .await?;

    let output = serde_json::json!({
        "filePath": config.file_path,
        "value": config.value,
    });
    let rendered = if cli.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", rendered);
    Ok(())
}
