//! Command-line surface for the `camera-daqd` composition root (spec §6).

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "camera-daqd", about = "Headless capture engine for a 2304x4096 16-bit scientific camera")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load configuration, wire up the cores, and run until interrupted.
    Run(RunArgs),
    /// Load and validate configuration without starting any core.
    CheckConfig(RunArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CameraKind {
    Real,
    Simulated,
}

#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Path to a TOML configuration file, overlaid on top of built-in
    /// defaults and underneath environment/CLI overrides.
    #[arg(long)]
    pub config: Option<String>,

    /// Force the camera interface variant, overriding the config file.
    #[arg(long, value_enum)]
    pub camera: Option<CameraKind>,

    /// Override the control core's bind endpoint, e.g. `tcp://0.0.0.0:9001`.
    #[arg(long)]
    pub control_endpoint: Option<String>,
}
