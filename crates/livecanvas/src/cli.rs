use std::path::PathBuf;

use clap::{Parser, Subcommand};
use drawconfig::DrainPolicySetting;

#[derive(Parser, Debug)]
#[command(
    name = "livecanvas",
    author,
    version,
    about = "Deferred canvas drawing driven by a render loop"
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Canvas configuration TOML; built-in defaults apply when omitted.
    #[arg(long, global = true, env = "LIVECANVAS_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print every executed surface call to stdout as a JSON line.
    #[arg(long, global = true)]
    pub emit_ops: bool,

    /// What a redraw does after a failed operation: `continue` or `abort`.
    #[arg(
        long,
        global = true,
        value_name = "POLICY",
        value_parser = parse_drain_policy
    )]
    pub drain_policy: Option<DrainPolicySetting>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plot numbers read from stdin, one per line, until end of input.
    Graph(GraphArgs),
    /// Animate bouncing particles for a fixed number of frames.
    Particles(ParticleArgs),
}

#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Override the canvas size (e.g. `1024x512`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,
}

#[derive(Parser, Debug)]
pub struct ParticleArgs {
    /// Exit after this many rendered frames.
    #[arg(long, default_value_t = 50)]
    pub frames: u64,

    /// Seed for the initial particle layout; random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of particles to spawn.
    #[arg(long)]
    pub count: Option<usize>,

    /// Minimum milliseconds between two rendered frames.
    #[arg(long, value_name = "MILLISECONDS")]
    pub min_interval: Option<u64>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_drain_policy(value: &str) -> Result<DrainPolicySetting, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("drain policy must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "continue" => Ok(DrainPolicySetting::Continue),
        "abort" | "abort-queue" => Ok(DrainPolicySetting::Abort),
        other => Err(format!(
            "unknown drain policy '{other}'; expected continue or abort"
        )),
    }
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("canvas dimensions must be greater than zero".into());
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_drain_policies() {
        assert_eq!(
            parse_drain_policy("continue").unwrap(),
            DrainPolicySetting::Continue
        );
        assert_eq!(
            parse_drain_policy(" Abort ").unwrap(),
            DrainPolicySetting::Abort
        );
        assert_eq!(
            parse_drain_policy("abort-queue").unwrap(),
            DrainPolicySetting::Abort
        );
        assert!(parse_drain_policy("").is_err());
        assert!(parse_drain_policy("retry").is_err());
    }

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1024x512").unwrap(), (1024, 512));
        assert_eq!(parse_size(" 640 X 480 ").unwrap(), (640, 480));
        assert!(parse_size("1024").is_err());
        assert!(parse_size("0x10").is_err());
        assert!(parse_size("wide x 10").is_err());
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "livecanvas",
            "particles",
            "--frames",
            "3",
            "--emit-ops",
            "--drain-policy",
            "abort",
        ])
        .unwrap();
        assert!(cli.run.emit_ops);
        assert_eq!(cli.run.drain_policy, Some(DrainPolicySetting::Abort));
        match cli.command {
            Command::Particles(args) => {
                assert_eq!(args.frames, 3);
                assert_eq!(args.seed, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
