use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dips",
    about = "Archive ingest and disseminated package assembly",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Archive root directory (overrides the config file)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

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

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyArg {
    Extended,
    Single,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest a JSON entity package
    Ingest(IngestArgs),
    /// Assemble and write the package rooted at an entity
    Package(PackageArgs),
    /// List archived entities
    List(ListArgs),
    /// Copy a file entity's external content
    Content(ContentArgs),
    /// Show an entity's metadata record
    Show(ShowArgs),
    /// Remove an entity's blob and metadata record
    Remove(RemoveArgs),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
pub struct IngestArgs {
    pub package: PathBuf,
}

#[derive(Args)]
pub struct PackageArgs {
    pub id: String,
    #[arg(long)]
    pub policy: Option<PolicyArg>,
    /// Write to FILE instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Compress with zstd (level from config, or 3)
    #[arg(long)]
    pub zstd: bool,
    /// Print the assembled ids by kind instead of the package document
    #[arg(long, conflicts_with_all = ["output", "zstd"])]
    pub ids: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only entities of this kind; repeatable
    #[arg(long)]
    pub kind: Vec<String>,
}

#[derive(Args)]
pub struct ContentArgs {
    pub id: String,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_package_with_global_flags() {
        let cli = Cli::try_parse_from([
            "dips", "--root", "/srv/a", "package", "D1", "--policy", "single", "--zstd", "-v",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/srv/a")));
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Text);
        match cli.command {
            Command::Package(args) => {
                assert_eq!(args.id, "D1");
                assert_eq!(args.policy, Some(PolicyArg::Single));
                assert!(args.zstd);
                assert!(args.output.is_none());
            }
            _ => panic!("expected package"),
        }
    }

    #[test]
    fn list_accepts_repeated_kinds() {
        let cli = Cli::try_parse_from([
            "dips", "list", "--kind", "File", "--kind", "Event", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::List(args) => assert_eq!(args.kind, vec!["File", "Event"]),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn ids_conflicts_with_output() {
        let cli = Cli::try_parse_from(["dips", "package", "D1", "--ids"]).unwrap();
        match cli.command {
            Command::Package(args) => assert!(args.ids),
            _ => panic!("expected package"),
        }
        assert!(Cli::try_parse_from(["dips", "package", "D1", "--ids", "-o", "x.xip"]).is_err());
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["dips", "package", "D1", "--policy", "all"]).is_err());
    }
}
