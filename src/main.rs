use anyhow::{Context, Result};
use targetrank::api::server::ApiServer;
use targetrank::api::DiscoveryIndex;
use targetrank::cli::{parse_args, setup_logging, Commands, DiscoverArgs, ServeArgs};
use targetrank::config::{InputPaths, PipelineConfig, DEFAULT_FALLBACK_THRESHOLD};
use targetrank::data::assemble::assemble_dataset;
use targetrank::data::catalog;
use targetrank::data::features::aggregate_features;
use targetrank::data::graph::{load_protein_dictionary, GraphLoader};
use targetrank::data::labels::WeakLabels;
use targetrank::model::artifact::ArtifactManager;
use targetrank::model::forest::ForestConfig;
use targetrank::model::ModelConfig;
use targetrank::report;
use targetrank::training::{trainer::StackedTrainer, TrainingConfig};
use targetrank::utils;
use tracing::{error, info};

fn main() {
    let cli = parse_args();

    setup_logging(cli.verbose);

    info!("{}", targetrank::info());

    let result = match cli.command {
        Commands::Discover(args) => run_discover(args),
        Commands::Serve(args) => run_serve(args),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_discover(args: DiscoverArgs) -> Result<()> {
    let config = pipeline_config(&args);

    utils::validation::in_range(config.precision_target, 0.0, 1.0, "precision target")?;
    utils::ensure_dir(&config.output_dir)?;

    info!("Starting discovery run (seed {})", config.seed);
    let run_start = std::time::Instant::now();

    // Graph loading
    let dictionary = load_protein_dictionary(&config.inputs.protein_info)
        .context("Graph loading failed")?;
    let graph = GraphLoader::new(config.min_score)
        .load(&config.inputs.links, &dictionary)
        .context("Graph loading failed")?;

    // Label integration; each catalog degrades to empty on its own
    let diseases = catalog::read_disease_catalog(&config.inputs.disease_catalog)
        .unwrap_or_empty(Vec::new());
    if !diseases.is_empty() {
        info!("Disease catalog: {} disorders", diseases.len());
    }

    let disease_genes = catalog::read_disease_gene_catalog(&config.inputs.disease_gene_catalog);
    let drug_targets = catalog::read_drug_catalog(&config.inputs.drug_catalog);
    let labels = WeakLabels::integrate(&[
        disease_genes.map(|records| catalog::disease_gene_labels(&records)),
        drug_targets.map(|records| catalog::drug_target_labels(&records)),
    ]);

    // Feature aggregation and assembly
    let features = aggregate_features(&graph);
    let rows =
        assemble_dataset(&features, &labels).context("Dataset assembly failed")?;

    // Stacked classifier
    let training_config = training_config(&args);
    let model_config = ModelConfig::discovery_default();
    let device = burn::backend::ndarray::NdArrayDevice::default();

    let trainer = StackedTrainer::<targetrank::TrainingBackend>::new(
        training_config,
        model_config,
        config.precision_target,
        config.fallback_threshold,
        device,
    );
    let outcome = trainer.train(&rows).context("Classifier training failed")?;

    // Persist the versioned artifact, then the ranked report
    let manager = ArtifactManager::new(config.artifact_dir())?;
    manager.save(&outcome.artifact)?;

    let discovery_report =
        report::build_report(&rows, &outcome.scored, &outcome.artifact.metadata)
            .context("Report generation failed")?;
    report::write_report(&discovery_report, &config.report_destinations())?;
    report::log_summary(&discovery_report);

    info!(
        "Discovery run {} completed in {}",
        outcome.scored.run_id,
        utils::format_duration(run_start.elapsed().as_secs_f64())
    );

    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    info!("Loading lookup index from {:?}", args.report);

    let index = DiscoveryIndex::load(
        &args.report,
        &args.disease_catalog,
        &args.disease_gene_catalog,
    )?;
    let server = ApiServer::new(index, args.port);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(server.start())
}

fn pipeline_config(args: &DiscoverArgs) -> PipelineConfig {
    PipelineConfig {
        inputs: InputPaths {
            links: args.links.clone(),
            protein_info: args.protein_info.clone(),
            disease_catalog: args.disease_catalog.clone(),
            disease_gene_catalog: args.disease_gene_catalog.clone(),
            drug_catalog: args.drug_catalog.clone(),
        },
        min_score: args.min_score,
        precision_target: args.precision_target,
        fallback_threshold: DEFAULT_FALLBACK_THRESHOLD,
        seed: args.seed,
        output_dir: args.output.clone(),
        mirror_paths: args.mirror.clone(),
    }
}

fn training_config(args: &DiscoverArgs) -> TrainingConfig {
    let base = TrainingConfig::default();
    TrainingConfig {
        epochs: if args.quick { 20 } else { args.epochs },
        batch_size: args.batch_size,
        learning_rate: args.learning_rate,
        seed: args.seed,
        forest: ForestConfig {
            n_trees: if args.quick { 50 } else { args.trees },
            ..base.forest
        },
        ..base
    }
}
