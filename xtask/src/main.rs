use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for slopeworld")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, determinism
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run the streaming benchmark
    Bench,
    /// Stream the same trajectory twice through the CLI and compare hashes
    Determinism {
        #[arg(long, default_value = "200")]
        ticks: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_determinism(100)?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Bench => run_bench()?,
        Commands::Determinism { ticks } => run_determinism(ticks)?,
    }

    Ok(())
}

fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {label}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {label} failed");
    }
    Ok(())
}

fn run_fmt() -> Result<()> {
    cargo("fmt --check", &["fmt", "--all", "--", "--check"])
}

fn run_clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn run_tests() -> Result<()> {
    cargo("test", &["test", "--workspace"])
}

fn run_bench() -> Result<()> {
    cargo(
        "bench",
        &["bench", "-p", "slopeworld-stream", "--bench", "bench_streaming"],
    )
}

fn run_determinism(ticks: u64) -> Result<()> {
    let ticks = ticks.to_string();
    cargo(
        "run (verify)",
        &[
            "run",
            "--release",
            "-p",
            "slopeworld-cli",
            "--",
            "verify",
            "--ticks",
            &ticks,
        ],
    )
}
