use anyhow::Result;
use clap::Parser;

use graph_adjacency_store::compression::{compress_all, Aggregation, CompressorBlueprint};
use graph_adjacency_store::config::Config;
use graph_adjacency_store::data::load_edge_list;
use graph_adjacency_store::graph::SlicedAdjacencyList;
use graph_adjacency_store::report::{save_summary, Summary};
use graph_adjacency_store::storage::PAGE_SHIFT;

#[derive(Parser, Debug)]
#[clap(
    name = "graph-adjacency-store",
    about = "Compress an edge list into delta-varint adjacency lists"
)]
struct Cli {
    /// Path to a whitespace separated `source target [weight]` file
    #[clap(long)]
    input: String,

    /// Output directory for the summary
    #[clap(long, default_value = "adjacency_results")]
    output_dir: String,

    /// How duplicate relationships are merged (NONE, SUM, MIN, MAX, SINGLE, COUNT)
    #[clap(long, default_value = "NONE")]
    aggregation: Aggregation,

    /// Load the third column as a relationship weight
    #[clap(long)]
    weighted: bool,

    /// log2 of the arena page size
    #[clap(long, default_value_t = PAGE_SHIFT)]
    page_shift: u32,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let property_aggregations = if args.weighted {
        vec![args.aggregation]
    } else {
        Vec::new()
    };
    let config = Config::new(args.page_shift, args.threads, args.aggregation, property_aggregations);
    config.validate()?;

    let threads = config.effective_concurrency();
    log::info!("Using {} worker threads", threads);
    log::info!("Input: {}", args.input);
    log::info!("Output: {}", args.output_dir);

    // 1. Load relationships
    let edges = load_edge_list(&args.input, args.weighted)?;

    // 2. Compress
    let blueprint = CompressorBlueprint::new(edges.node_count(), &config)?;
    let relationships = compress_all(&blueprint, &edges.staged, threads)?;
    drop(edges);
    let lists = blueprint.build();

    log::info!("Stored {} relationships", relationships);

    // 3. Index record boundaries
    let sliced = SlicedAdjacencyList::build(&lists.adjacency, threads)?;

    // 4. Save results
    let summary = Summary::new(&config, &lists, &sliced);
    if summary.sliced_bytes != summary.written_bytes {
        log::warn!(
            "Slices cover {} bytes but {} bytes were written",
            summary.sliced_bytes,
            summary.written_bytes
        );
    }
    save_summary(&summary, &args.output_dir)?;

    log::info!(
        "Done: {:.2} bytes per relationship. Results saved to {}",
        summary.bytes_per_relationship,
        args.output_dir
    );

    Ok(())
}
