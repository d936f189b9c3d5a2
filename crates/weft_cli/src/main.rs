//! weft CLI: compiles traced designs into hardware descriptions.
//!
//! Provides `weft check` to run the pipeline and report diagnostics,
//! `weft build` to write the lowered design, and `weft dump-fsm` to print
//! the synthesized state graphs of sequential contexts.

#![warn(missing_docs)]

mod build;
mod check;
mod dump;
mod pipeline;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// weft, a compiler from traced imperative descriptions to hardware.
#[derive(Parser, Debug)]
#[command(name = "weft", version, about = "weft hardware compiler")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `weft.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output format for diagnostics.
    #[arg(long, global = true, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the pipeline and report diagnostics.
    Check {
        /// Input tree (JSON). Defaults to `project.input` from `weft.toml`.
        input: Option<String>,
    },
    /// Compile and write the lowered design.
    Build(BuildArgs),
    /// Print the state graphs of sequential contexts.
    DumpFsm {
        /// Input tree (JSON). Defaults to `project.input` from `weft.toml`.
        input: Option<String>,

        /// Only print the graph of this context.
        #[arg(long)]
        context: Option<String>,
    },
}

/// Arguments for the `weft build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Input tree (JSON). Defaults to `project.input` from `weft.toml`.
    pub input: Option<String>,

    /// Output directory. Defaults to `output.dir` from `weft.toml`.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Format of the written design. Defaults to `output.format`.
    #[arg(long, value_enum)]
    pub emit: Option<EmitChoice>,
}

/// Color output choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect based on terminal.
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable text output.
    Text,
    /// One JSON object per diagnostic.
    Json,
}

/// Format of the lowered design written by `weft build`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EmitChoice {
    /// Indented listing.
    Text,
    /// Serialized lowered model.
    Json,
}

/// Global arguments passed to all subcommands.
#[derive(Debug)]
pub struct GlobalArgs {
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable verbose output.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional config file path.
    pub config: Option<String>,
    /// Diagnostic output format.
    pub format: ReportFormat,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(log_level(cli.quiet, cli.verbose))
        .target(env_logger::Target::Stderr)
        .init();

    let color = match cli.color {
        ColorChoice::Auto => is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
        format: cli.format,
    };

    let result = match cli.command {
        Command::Check { ref input } => check::run(input.as_deref(), &global),
        Command::Build(ref args) => build::run(args, &global),
        Command::DumpFsm {
            ref input,
            ref context,
        } => dump::run(input.as_deref(), context.as_deref(), &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Log level for the pass crates: warnings by default.
fn log_level(quiet: bool, verbose: bool) -> log::LevelFilter {
    if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    }
}

fn is_terminal() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_check_default() {
        let cli = Cli::parse_from(["weft", "check"]);
        match cli.command {
            Command::Check { input } => assert!(input.is_none()),
            _ => panic!("expected Check command"),
        }
        assert_eq!(cli.format, ReportFormat::Text);
    }

    #[test]
    fn parse_check_with_input() {
        let cli = Cli::parse_from(["weft", "check", "trace/top.json"]);
        match cli.command {
            Command::Check { input } => assert_eq!(input.as_deref(), Some("trace/top.json")),
            _ => panic!("expected Check command"),
        }
    }

    #[test]
    fn parse_build_with_args() {
        let cli = Cli::parse_from(["weft", "build", "top.json", "-o", "gen", "--emit", "json"]);
        match cli.command {
            Command::Build(ref args) => {
                assert_eq!(args.input.as_deref(), Some("top.json"));
                assert_eq!(args.output.as_deref(), Some("gen"));
                assert_eq!(args.emit, Some(EmitChoice::Json));
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_build_default() {
        let cli = Cli::parse_from(["weft", "build"]);
        match cli.command {
            Command::Build(ref args) => {
                assert!(args.input.is_none());
                assert!(args.output.is_none());
                assert!(args.emit.is_none());
            }
            _ => panic!("expected Build command"),
        }
    }

    #[test]
    fn parse_dump_fsm_context() {
        let cli = Cli::parse_from(["weft", "dump-fsm", "--context", "tick"]);
        match cli.command {
            Command::DumpFsm { input, context } => {
                assert!(input.is_none());
                assert_eq!(context.as_deref(), Some("tick"));
            }
            _ => panic!("expected DumpFsm command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "weft", "--quiet", "--color", "never", "--format", "json", "check",
        ]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.format, ReportFormat::Json);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["weft", "check", "--verbose", "--config", "/p/weft.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("/p/weft.toml"));
    }

    #[test]
    fn log_levels() {
        assert_eq!(log_level(true, true), log::LevelFilter::Error);
        assert_eq!(log_level(false, true), log::LevelFilter::Debug);
        assert_eq!(log_level(false, false), log::LevelFilter::Warn);
    }
}
