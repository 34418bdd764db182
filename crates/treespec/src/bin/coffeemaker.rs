// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Demo subject binary exercised by the integration tests.
//!
//! Makes no sense on purpose: a small command that reads a recipe file from
//! the working directory, writes one artifact per recipe, and prints
//! progress. It gives the harness something deterministic to run, capture,
//! and compare.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use serde::Deserialize;

/// Make delicious coffee from the comfort of your terminal.
#[derive(Parser, Debug)]
#[command(name = "coffeemaker")]
struct Cli {
    /// Don't add milk
    #[arg(long)]
    no_milk: bool,

    /// Use one of the available sweeteners
    #[arg(long, value_name = "sugar|honey")]
    sweetener: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Coffeemakerfile {
    #[serde(default)]
    recipes: Vec<String>,
}

fn main() -> ExitCode {
    run(&Cli::parse())
}

fn run(cli: &Cli) -> ExitCode {
    if let Some(ref sweetener) = cli.sweetener {
        if !matches!(sweetener.as_str(), "sugar" | "honey") {
            eprintln!("[!] '{}' is not a valid sweetener.", sweetener);
            return ExitCode::FAILURE;
        }
    }

    let config_file = std::env::var("COFFEE_MAKER_FILE")
        .unwrap_or_else(|_| "Coffeemakerfile.toml".to_string());
    let content = match fs::read_to_string(&config_file) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("[!] Failed to read {}: {}", config_file, e);
            return ExitCode::FAILURE;
        }
    };
    let config: Coffeemakerfile = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[!] Failed to parse {}: {}", config_file, e);
            return ExitCode::FAILURE;
        }
    };
    if config.recipes.is_empty() {
        eprintln!("[!] No `recipes` found in {}.", config_file);
        return ExitCode::FAILURE;
    }

    for recipe in &config.recipes {
        println!("* Brewing {}", recipe);
        if let Err(e) = brew(recipe, cli) {
            eprintln!("[!] Failed to brew {}: {}", recipe, e);
            return ExitCode::FAILURE;
        }
    }
    println!("* Enjoy!");
    ExitCode::SUCCESS
}

fn brew(recipe: &str, cli: &Cli) -> std::io::Result<()> {
    let mut artifact = format!("recipe = \"{}\"\n", recipe);
    if !cli.no_milk {
        artifact.push_str("milk = true\n");
    }
    if let Some(ref sweetener) = cli.sweetener {
        artifact.push_str(&format!("sweetener = \"{}\"\n", sweetener));
    }
    fs::write(format!("{}.brewed-coffee", recipe), artifact)
}
