//! Development tasks for redis-cluster-kube
//!
//! Usage: cargo xtask <command>

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use xshell::{cmd, Shell};

const BINARY: &str = "redis-cluster-kube";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tasks for redis-cluster-kube")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Build the binary
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run the test suite
    Test {
        /// Also run the tests that need a reachable Kubernetes cluster
        #[arg(long)]
        live: bool,
    },
    /// Render sample manifests into a directory
    Samples {
        #[arg(long, default_value = "target/samples")]
        out: String,
    },
    /// Format check, clippy and tests
    Ci,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(workspace_root()?);

    match cli.command {
        Task::Build { release } => build(&sh, release),
        Task::Test { live } => test(&sh, live),
        Task::Samples { out } => samples(&sh, &out),
        Task::Ci => ci(&sh),
    }
}

fn build(sh: &Shell, release: bool) -> Result<()> {
    let profile: &[&str] = if release { &["--release"] } else { &[] };
    cmd!(sh, "cargo build --bin {BINARY} {profile...}").run()?;
    println!("✓ {} built", BINARY);
    Ok(())
}

fn test(sh: &Shell, live: bool) -> Result<()> {
    cmd!(sh, "cargo test --all").run()?;
    if live {
        cmd!(sh, "cargo test --test live_cluster_test -- --ignored").run()?;
    }
    println!("✓ tests passed");
    Ok(())
}

/// Plain, announced and meshed variants of a three node cluster.
fn samples(sh: &Shell, out: &str) -> Result<()> {
    sh.create_dir(out)?;

    let variants: [(&str, &[&str]); 3] = [
        ("plain", &[]),
        (
            "announced",
            &[
                "--announce-ips",
                "10.0.0.1,10.0.0.2,10.0.0.3",
                "--announce-replica-ip",
            ],
        ),
        ("meshed", &["--kuma-mesh", "default"]),
    ];

    for (variant, extra) in variants {
        let path = Path::new(out).join(format!("{}.yaml", variant));
        cmd!(
            sh,
            "cargo run --quiet --bin {BINARY} -- render -c sample --volume-size 1Gi --password c2FtcGxl {extra...} -o {path}"
        )
        .run()
        .with_context(|| format!("Failed to render {} sample", variant))?;
    }
    Ok(())
}

fn ci(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo fmt --all -- --check").run()?;
    cmd!(sh, "cargo clippy --all-targets -- -D warnings").run()?;
    test(sh, false)?;
    println!("✓ CI checks passed");
    Ok(())
}

fn workspace_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask has no parent directory")
}
