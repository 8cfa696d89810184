use tracing::{info, instrument};

use crate::branching::BranchAndBound;
use crate::cluster_graph::partition_cost;
use crate::config::{Config, ConfigError};
use crate::context::{Counters, RunContext};
use crate::graph::Graph;
use crate::kernel::Kernel;
use crate::neg::Neg;
use crate::partition::{normalize, Partition};
use crate::stats::{modifications, Edit, EditStats};

/// Owns one run: the kernel, the time budget and the best solution so far.
///
/// The best result never gets worse. Every phase only replaces it with a
/// strictly cheaper partition.
#[derive(Debug)]
pub struct Solver<'g> {
    graph: &'g Graph,
    config: Config,
    kernel: Kernel,
    ctx: RunContext,
    /// Starting labels for the local search on the kernel.
    start: Option<Vec<usize>>,
    best_cost: i64,
    best: Vec<usize>,
}

impl<'g> Solver<'g> {
    /// Starts from singletons. The time budget starts now.
    pub fn new(graph: &'g Graph, config: Config) -> Result<Self, ConfigError> {
        let singletons: Vec<usize> = (0..graph.node_count()).collect();
        Self::with_initial(graph, config, &singletons)
    }

    /// Starts from `initial`, which is also the first best result.
    pub fn with_initial(graph: &'g Graph, config: Config, initial: &[usize]) -> Result<Self, ConfigError> {
        config.validate()?;
        assert_eq!(initial.len(), graph.node_count());
        let ctx = RunContext::from_config(&config);
        let kernel = if config.use_kernelization {
            Kernel::critical_cliques(graph, config.kernel_false_twins)
        } else {
            Kernel::identity(graph)
        };
        let start = kernel.restrict(initial);
        let best = normalize(initial.iter().copied());
        let best_cost = partition_cost(graph, &best);
        Ok(Self { graph, config, kernel, ctx, start, best_cost, best })
    }

    /// One local search on the kernel.
    #[instrument(skip_all)]
    pub fn run_fast(&mut self) -> i64 {
        let kernel_graph = self.kernel.graph();
        let start = match &self.start {
            Some(labels) => Partition::from_assignment(labels),
            None => Partition::singletons(kernel_graph.node_count()),
        };
        let outcome = Neg::new(kernel_graph, start, &self.config).run(&mut self.ctx);

        let expanded = self.kernel.expand(&outcome.best_partition);
        let cost = partition_cost(self.graph, &expanded);
        debug_assert_eq!(cost, outcome.best_cost + self.kernel.offset());
        self.offer(cost, expanded);
        info!(cost, best_result = self.best_cost, status = ?outcome.status, iterations = outcome.iterations);
        self.finish();
        self.best_cost
    }

    /// Local search for an upper bound, then branch and bound on the kernel.
    #[instrument(skip_all)]
    pub fn run_recursive(&mut self) -> i64 {
        self.run_fast();
        let upper_bound = self.best_cost - self.kernel.offset();
        let outcome = BranchAndBound::new(self.kernel.graph(), &self.config, upper_bound).run(&mut self.ctx);
        if let Some(labels) = outcome.best_partition {
            let expanded = self.kernel.expand(&labels);
            let cost = partition_cost(self.graph, &expanded);
            debug_assert_eq!(cost, outcome.best_cost + self.kernel.offset());
            self.offer(cost, expanded);
        }
        info!(best_result = self.best_cost, exact = outcome.exact, nodes = outcome.nodes);
        self.finish();
        self.best_cost
    }

    fn offer(&mut self, cost: i64, assignment: Vec<usize>) {
        if cost < self.best_cost {
            self.best_cost = cost;
            self.best = assignment;
        }
    }

    fn finish(&mut self) {
        let stats = self.stats();
        let elapsed = self.ctx.elapsed();
        let counters = self.ctx.counters_mut();
        counters.set("best_result", self.best_cost);
        counters.set("clusters", stats.clusters as i64);
        counters.set("insertions", stats.insertions as i64);
        counters.set("deletions", stats.deletions as i64);
        counters.set("modifications", stats.modifications as i64);
        counters.set("kernel_vertices", self.kernel.graph().node_count() as i64);
        counters.set("kernel_edges", self.kernel.graph().edge_count() as i64);
        counters.set("kernel_offset", self.kernel.offset());
        counters.set("time_millis", elapsed.as_millis() as i64);
    }

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Cost of the best partition found so far.
    pub fn best_result(&self) -> i64 {
        self.best_cost
    }

    /// Normalized labels of the best partition.
    pub fn best_partition(&self) -> &[usize] {
        &self.best
    }

    /// Edge insertions and deletions that realize the best partition.
    pub fn modifications(&self) -> Vec<Edit> {
        modifications(self.graph, &self.best)
    }

    pub fn stats(&self) -> EditStats {
        EditStats::from_partition(self.graph, &self.best)
    }

    pub fn counters(&self) -> &Counters {
        self.ctx.counters()
    }
}
