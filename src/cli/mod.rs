use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TargetRank: drug-target discovery from protein interaction networks
#[derive(Parser, Debug)]
#[command(name = "targetrank")]
#[command(about = "Rank candidate drug-target genes from a protein interaction network")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full discovery pipeline and persist the ranked report
    Discover(DiscoverArgs),

    /// Serve read-only lookups over a persisted report
    Serve(ServeArgs),
}

/// Discovery pipeline arguments
#[derive(Parser, Debug)]
pub struct DiscoverArgs {
    /// Interaction edge list (protein_a protein_b score), optionally gzipped
    #[arg(short, long, required = true)]
    pub links: PathBuf,

    /// Protein id to gene symbol dictionary (tab-delimited)
    #[arg(short, long, required = true)]
    pub protein_info: PathBuf,

    /// Disease catalog XML (optional source)
    #[arg(long, default_value = "datasets/en_product1.xml")]
    pub disease_catalog: PathBuf,

    /// Disease-gene association catalog XML (optional source)
    #[arg(long, default_value = "datasets/en_product6.xml")]
    pub disease_gene_catalog: PathBuf,

    /// Drug-target catalog XML (optional source)
    #[arg(long, default_value = "datasets/drugbank.xml")]
    pub drug_catalog: PathBuf,

    /// Output directory for the artifact and canonical report
    #[arg(short, long, default_value = "./output")]
    pub output: PathBuf,

    /// Additional destinations the report is mirrored to
    #[arg(long)]
    pub mirror: Vec<PathBuf>,

    /// Minimum interaction confidence score (source scale 0-1000)
    #[arg(long, default_value = "700")]
    pub min_score: f64,

    /// Precision the selected threshold must reach
    #[arg(long, default_value = "0.9")]
    pub precision_target: f64,

    /// Number of base-estimator training epochs
    #[arg(short, long, default_value = "300")]
    pub epochs: usize,

    /// Batch size
    #[arg(short, long, default_value = "256")]
    pub batch_size: usize,

    /// Learning rate
    #[arg(long, default_value = "0.001")]
    pub learning_rate: f64,

    /// Number of trees in the meta estimator
    #[arg(long, default_value = "500")]
    pub trees: usize,

    /// Random seed
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Quick test mode (fewer epochs and trees)
    #[arg(long)]
    pub quick: bool,
}

/// Lookup API arguments
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Persisted discovery report to serve
    #[arg(short, long, default_value = "./output/discovery_report.csv")]
    pub report: PathBuf,

    /// Disease catalog XML used for the disease-name index
    #[arg(long, default_value = "datasets/en_product1.xml")]
    pub disease_catalog: PathBuf,

    /// Disease-gene association catalog XML used for the disease-name index
    #[arg(long, default_value = "datasets/en_product6.xml")]
    pub disease_gene_catalog: PathBuf,

    /// Port to listen on
    #[arg(long, default_value = "5000")]
    pub port: u16,
}

/// Parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Setup logging based on verbosity
pub fn setup_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_args() {
        let cli = Cli::parse_from([
            "targetrank",
            "discover",
            "-l",
            "links.txt",
            "-p",
            "info.txt",
        ]);

        match cli.command {
            Commands::Discover(args) => {
                assert_eq!(args.links, PathBuf::from("links.txt"));
                assert_eq!(args.min_score, 700.0);
                assert_eq!(args.precision_target, 0.9);
                assert_eq!(args.epochs, 300);
            }
            _ => panic!("Expected Discover command"),
        }
    }

    #[test]
    fn test_serve_args() {
        let cli = Cli::parse_from(["targetrank", "serve", "--port", "8080"]);

        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.port, 8080);
                assert_eq!(args.report, PathBuf::from("./output/discovery_report.csv"));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_mirror_paths_accumulate() {
        let cli = Cli::parse_from([
            "targetrank",
            "discover",
            "-l",
            "links.txt",
            "-p",
            "info.txt",
            "--mirror",
            "a.csv",
            "--mirror",
            "b.csv",
        ]);

        match cli.command {
            Commands::Discover(args) => {
                assert_eq!(args.mirror.len(), 2);
            }
            _ => panic!("Expected Discover command"),
        }
    }
}
