use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "PLAPT CLI - Predict protein-ligand binding affinities from sequences, SMILES strings or structure files.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Predict binding affinities for protein/molecule pairs.
    Predict(PredictArgs),
    /// Resolve and reconcile inputs, printing the pairs a prediction would use.
    Resolve(ResolveArgs),
}

/// Protein and molecule inputs shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Protein sequences, or a single FASTA, PDB, SDF or TXT file.
    #[arg(short, long, required = true, num_args = 1.., value_name = "SEQ_OR_FILE")]
    pub proteins: Vec<String>,

    /// Molecule SMILES strings, or a single SDF, PDB, CIF or TXT file.
    #[arg(short, long, required = true, num_args = 1.., value_name = "SMILES_OR_FILE")]
    pub molecules: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a configuration file in TOML format.
    /// Defaults to `config.toml` in the user configuration directory when present.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S predictor.batch-size=8
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE")]
    pub set_values: Vec<String>,
}

/// Arguments for the `predict` subcommand.
#[derive(Args, Debug)]
pub struct PredictArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Number of pairs sent to the predictor per request.
    #[arg(short, long, value_name = "INT")]
    pub batch_size: Option<usize>,

    /// Output target: `stdout`, or a file path (`.json`, `.csv`, anything else is plain text).
    #[arg(short, long, default_value = "stdout", value_name = "PATH")]
    pub output: String,

    /// Override the predictor endpoint URL.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the `resolve` subcommand.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_accepts_multiple_values_per_flag() {
        let cli = Cli::parse_from([
            "plapt", "predict", "-p", "MKT", "-m", "CCO", "c1ccccc1", "-b", "8", "-o", "out.json",
        ]);
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict subcommand");
        };
        assert_eq!(args.inputs.proteins, ["MKT"]);
        assert_eq!(args.inputs.molecules, ["CCO", "c1ccccc1"]);
        assert_eq!(args.batch_size, Some(8));
        assert_eq!(args.output, "out.json");
        assert!(args.config.config.is_none());
    }

    #[test]
    fn predict_output_defaults_to_stdout() {
        let cli = Cli::parse_from(["plapt", "predict", "-p", "MKT", "-m", "CCO"]);
        let Commands::Predict(args) = cli.command else {
            panic!("expected predict subcommand");
        };
        assert_eq!(args.output, "stdout");
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn global_flags_and_set_values() {
        let cli = Cli::parse_from([
            "plapt",
            "resolve",
            "-vv",
            "--log-file",
            "run.log",
            "-p",
            "proteins.fasta",
            "-m",
            "CCO",
            "-S",
            "input.literal-length-threshold=80",
            "-S",
            "output.precision=2",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_file, Some(PathBuf::from("run.log")));
        let Commands::Resolve(args) = cli.command else {
            panic!("expected resolve subcommand");
        };
        assert_eq!(args.config.set_values.len(), 2);
    }

    #[test]
    fn missing_molecules_is_rejected() {
        assert!(Cli::try_parse_from(["plapt", "predict", "-p", "MKT"]).is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["plapt", "-q", "-v", "resolve", "-p", "A", "-m", "C"]).is_err());
    }
}
