//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Pipewright asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: pipewright.toml)
    #[arg(short = 'C', long, global = true, default_value = "pipewright.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    // `-V` belongs to the auto-generated version flag
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the full production pipeline into dist
    #[command(visible_alias = "b")]
    Build {
        /// Process PHP templates alongside HTML
        #[arg(long)]
        php: bool,

        /// Serve dist with watch + live reload after building
        #[arg(short, long)]
        serve: bool,
    },

    /// Start the development server over src with Sass watching
    #[command(visible_alias = "d")]
    Dev {
        /// Proxy requests through the PHP built-in server
        #[arg(long)]
        php: bool,
    },
}

impl Cli {
    pub const fn is_build(&self) -> bool {
        matches!(self.command, Commands::Build { .. })
    }
    pub const fn is_dev(&self) -> bool {
        matches!(self.command, Commands::Dev { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from(["pipewright", "build", "--php", "--serve"]);
        match cli.command {
            Commands::Build { php, serve } => {
                assert!(php);
                assert!(serve);
            }
            _ => panic!("expected build"),
        }
        assert!(cli.is_build());
    }

    #[test]
    fn test_parse_dev_defaults() {
        let cli = Cli::parse_from(["pipewright", "dev"]);
        match cli.command {
            Commands::Dev { php } => assert!(!php),
            _ => panic!("expected dev"),
        }
        assert_eq!(cli.config, PathBuf::from("pipewright.toml"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_aliases() {
        assert!(Cli::parse_from(["pipewright", "b"]).is_build());
        assert!(Cli::parse_from(["pipewright", "d"]).is_dev());
    }

    #[test]
    fn test_verbose_short_flag() {
        assert!(Cli::parse_from(["pipewright", "-v", "dev"]).verbose);
    }

    #[test]
    fn test_command_definition_is_consistent() {
        use clap::CommandFactory;
        // Catches flag collisions that only assert at parse time
        Cli::command().debug_assert();
    }
}
