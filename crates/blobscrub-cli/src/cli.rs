use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "blobscrub",
    about = "Verify the integrity of every image in an OCI image store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check every blob reachable from every repository
    Scrub(ScrubArgs),
    /// Load and validate a config file without scrubbing
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct ScrubArgs {
    /// Path to the registry config file
    pub config: PathBuf,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_scrub() {
        let cli = Cli::try_parse_from(["blobscrub", "scrub", "/etc/registry.toml"]).unwrap();
        let Command::Scrub(args) = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(args.config, PathBuf::from("/etc/registry.toml"));
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.verbose);
    }

    #[test]
    fn scrub_requires_config() {
        assert!(Cli::try_parse_from(["blobscrub", "scrub"]).is_err());
    }

    #[test]
    fn parse_verify() {
        let cli = Cli::try_parse_from(["blobscrub", "verify", "c.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Verify(_)));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["blobscrub", "--verbose", "scrub", "c.toml"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format_after_subcommand() {
        let cli = Cli::try_parse_from(["blobscrub", "scrub", "c.toml", "--format", "json"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn unknown_format_rejected() {
        assert!(Cli::try_parse_from(["blobscrub", "--format", "yaml", "scrub", "c.toml"]).is_err());
    }
}
