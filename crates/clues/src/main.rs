use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, ValueEnum};
use cluster_editing::{Config, Counters, Graph, MoveKind, Solver};
use common::io::{format_edits, read_dimacs, read_edge_list, write_edits, GraphFileType};
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum Mode {
    /// One local search run.
    Fast,
    /// Local search followed by branch and bound.
    Recursive,
}

#[derive(Debug, Parser)]
#[command(about = "Turns a graph into a disjoint union of cliques with few edge edits")]
struct Cli {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, value_enum, default_value = "dimacs")]
    input_type: GraphFileType,
    /// Edit list, one 1-indexed pair per line. Printed to stdout if omitted.
    #[arg(long)]
    output: Option<PathBuf>,
    /// JSON line with the run counters.
    #[arg(long)]
    stats: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "fast")]
    mode: Mode,
    #[arg(long)]
    log_level: Option<Level>,
    #[arg(long)]
    log_json: bool,
    #[command(flatten)]
    config: ConfigArgs,
}

/// Overrides of the default solver configuration.
#[derive(Debug, Args)]
struct ConfigArgs {
    #[arg(long)]
    time_limit_millis: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    max_recursion_depth: Option<usize>,
    /// Iteration limit of each local search run.
    #[arg(long)]
    iterations: Option<usize>,
    #[arg(long)]
    max_perturb: Option<usize>,
    #[arg(long)]
    no_perturbations: bool,
    /// Move kinds in schedule order, e.g. `node,edge,join`.
    #[arg(long, value_delimiter = ',')]
    generators: Option<Vec<MoveKind>>,
    /// Keep a map of edge weights between clusters.
    #[arg(long)]
    map_version: bool,
    #[arg(long)]
    no_kernel: bool,
    /// Also contract non-adjacent vertices with equal neighborhoods. May lose optimality.
    #[arg(long)]
    false_twins: bool,
}

impl ConfigArgs {
    fn apply(self, mut config: Config) -> Config {
        if let Some(millis) = self.time_limit_millis {
            config.max_run_time_millis = millis;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(depth) = self.max_recursion_depth {
            config.max_recursion_depth = depth;
        }
        if let Some(iterations) = self.iterations {
            config.neg_max_iterations_to_do = iterations;
        }
        if let Some(max_perturb) = self.max_perturb {
            config.neg_max_perturb = max_perturb;
        }
        if let Some(generators) = self.generators {
            config.swp_cnd_creators_to_use = generators;
        }
        config.neg_allow_perturbations &= !self.no_perturbations;
        config.use_neg_map_version |= self.map_version;
        config.use_kernelization &= !self.no_kernel;
        config.kernel_false_twins |= self.false_twins;
        config
    }
}

fn write_stats(
    stats: &Option<PathBuf>,
    input: &Path,
    mode: Mode,
    counters: Option<&Counters>,
    status: &str,
) -> Result<(), Box<dyn Error>> {
    let Some(stats) = stats else { return Ok(()) };
    let mut out = BufWriter::new(File::create(stats)?);
    let input = input.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();
    let mode = mode.to_possible_value().map(|value| value.get_name().to_string()).unwrap_or_default();
    write!(out, "{{\"input\": \"{input}\", \"mode\": \"{mode}\", \"status\": \"{status}\"")?;
    for (name, value) in counters.into_iter().flat_map(|counters| counters.iter()) {
        write!(out, ", \"{name}\": {value}")?;
    }
    writeln!(out, "}}")?;
    out.flush()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    write_stats(&cli.stats, &cli.input, cli.mode, None, "unfinished")?;

    if let Some(level) = cli.log_level {
        let builder = FmtSubscriber::builder()
            .with_max_level(level)
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(io::stderr);
        if cli.log_json {
            builder.json().finish().init();
        } else {
            builder.finish().init();
        }
    };

    let graph = match cli.input_type {
        GraphFileType::Dimacs => read_dimacs(&cli.input)?,
        GraphFileType::EdgeList => read_edge_list(&cli.input)?,
    };
    let graph = Graph::from_petgraph(&graph);
    info!(vertices = graph.node_count(), edges = graph.edge_count(), "read graph");

    let config = cli.config.apply(Config::default());
    let mut solver = Solver::new(&graph, config)?;
    let cost = match cli.mode {
        Mode::Fast => solver.run_fast(),
        Mode::Recursive => solver.run_recursive(),
    };
    info!(cost, "finished");

    let edits = solver.modifications().into_iter().map(|edit| (edit.u.index(), edit.v.index()));
    match &cli.output {
        Some(output) => write_edits(output, edits)?,
        None => format_edits(io::stdout().lock(), edits)?,
    }
    write_stats(&cli.stats, &cli.input, cli.mode, Some(solver.counters()), "finished")?;
    Ok(())
}
