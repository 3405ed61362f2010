use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Run the full local CI pipeline: fmt, clippy, nextest
    Ci,
    /// Validate every plugin.toml under the given directory
    CheckManifests {
        #[arg(default_value = ".flowbench/plugins")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Ci => run_ci()?,
        Commands::CheckManifests { dir } => check_manifests(&dir)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        bail!("cargo nextest run failed");
    }
    Ok(())
}

fn run_ci() -> Result<()> {
    run_cargo(&["fmt", "--all", "--check"])?;
    run_cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--",
        "-D",
        "warnings",
    ])?;
    run_nextest(None, false)
}

fn run_cargo(args: &[&str]) -> Result<()> {
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("cargo {} failed", args.join(" "));
    }
    Ok(())
}

fn check_manifests(dir: &PathBuf) -> Result<()> {
    let mut checked = 0usize;
    let mut failures = 0usize;

    for entry in WalkDir::new(dir).min_depth(1).max_depth(2) {
        let entry = entry?;
        if entry.file_name() != "plugin.toml" {
            continue;
        }
        checked += 1;
        let path = entry.path();
        let data =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        match data.parse::<toml::Value>() {
            Ok(value) => {
                let id = value
                    .get("plugin")
                    .and_then(|section| section.get("id"))
                    .and_then(toml::Value::as_str);
                match id {
                    Some(id) if !id.trim().is_empty() => {
                        println!("ok   {} ({id})", path.display());
                    }
                    _ => {
                        println!("FAIL {} (missing plugin.id)", path.display());
                        failures += 1;
                    }
                }
            }
            Err(err) => {
                println!("FAIL {} ({err})", path.display());
                failures += 1;
            }
        }
    }

    if checked == 0 {
        println!("no plugin manifests under {}", dir.display());
    }
    if failures > 0 {
        bail!("{failures} invalid manifest(s)");
    }
    Ok(())
}
