//! The local search driver.
//!
//! Every iteration runs one generator, chosen by a frequency schedule, and
//! applies its best candidate if it strictly improves the cost. Once every
//! scheduled generator has failed in a row the search is stuck in a local
//! optimum. It then perturbs the partition and continues, until the
//! perturbation budget is used up.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument, trace};

use crate::cluster_graph::ClusterGraph;
use crate::config::{Config, PerturbMode};
use crate::context::{Counters, RunContext};
use crate::generators::expansion::{internal_seed, ExpansionOrder};
use crate::generators::Generator;
use crate::graph::{Graph, VertexIndex};
use crate::moves::{Selector, Target};
use crate::partition::{ClusterIndex, Partition};
use crate::state::State;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NegStatus {
    Running,
    /// The last step left a local optimum by perturbation.
    Perturbed,
    /// No generator improves and no perturbation is left.
    Converged,
    /// Iteration or time budget exhausted.
    Stopped,
}

impl NegStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, NegStatus::Converged | NegStatus::Stopped)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NegOutcome {
    pub status: NegStatus,
    pub best_cost: i64,
    /// Normalized labels.
    pub best_partition: Vec<usize>,
    pub iterations: usize,
    pub improving_moves: usize,
    pub perturbations: usize,
}

#[derive(Debug)]
struct Slot {
    generator: Generator,
    interval: usize,
    /// Already run without improvement since the last change.
    tried: bool,
    calls: i64,
    improvements: i64,
    rejections: i64,
    candidates: i64,
}

#[derive(Debug)]
pub struct Neg<'g, 'c> {
    state: State<'g>,
    config: &'c Config,
    rng: StdRng,
    schedule: Vec<Slot>,
    order: ExpansionOrder,
    status: NegStatus,
    allow_perturbations: bool,
    iterations: usize,
    improving_moves: usize,
    perturbations: usize,
}

impl<'g, 'c> Neg<'g, 'c> {
    /// Starts from `partition`, seeded with `config.seed`.
    pub fn new(graph: &'g Graph, partition: Partition, config: &'c Config) -> Self {
        Self::with_seed(graph, partition, config, config.seed)
    }

    pub fn with_seed(graph: &'g Graph, partition: Partition, config: &'c Config, seed: u64) -> Self {
        let n = graph.node_count();
        let cluster_graph = ClusterGraph::new(graph, partition, config.use_neg_map_version);
        let mut schedule: Vec<Slot> = config
            .enabled_kinds()
            .into_iter()
            .map(|(kind, interval)| Slot {
                generator: Generator::new(kind, n),
                interval: interval.max(1),
                tried: false,
                calls: 0,
                improvements: 0,
                rejections: 0,
                candidates: 0,
            })
            .collect();
        // rare kinds first, otherwise in configured order
        schedule.sort_by(|a, b| b.interval.cmp(&a.interval));

        Self {
            state: State::new(cluster_graph),
            config,
            rng: StdRng::seed_from_u64(seed),
            schedule,
            order: ExpansionOrder::new(n),
            status: NegStatus::Running,
            allow_perturbations: config.neg_allow_perturbations,
            iterations: 0,
            improving_moves: 0,
            perturbations: 0,
        }
    }

    /// Never perturbs. The search stops in the first local optimum.
    pub fn descent_only(mut self) -> Self {
        self.allow_perturbations = false;
        self
    }

    pub fn status(&self) -> NegStatus {
        self.status
    }

    pub fn state(&self) -> &State<'g> {
        &self.state
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Runs a single iteration.
    pub fn step(&mut self, ctx: &RunContext) -> NegStatus {
        if self.status.is_terminal() {
            return self.status;
        }
        if self.iterations >= self.config.neg_max_iterations_to_do || ctx.time_exceeded() {
            self.status = NegStatus::Stopped;
            return self.status;
        }
        if self.schedule.is_empty() {
            self.status = NegStatus::Converged;
            return self.status;
        }

        let t = self.iterations;
        let due = self.schedule.iter().position(|s| !s.tried && t % s.interval == 0);
        let Some(i) = due.or_else(|| self.schedule.iter().position(|s| !s.tried)) else {
            return self.stagnate();
        };
        self.iterations += 1;

        let mut selector = Selector::new(self.config.tie_break);
        let slot = &mut self.schedule[i];
        slot.generator.generate(&self.state, self.config, &mut self.rng, &mut selector);
        slot.calls += 1;
        slot.candidates += selector.offered() as i64;

        match selector.take() {
            Some(candidate) if candidate.delta < 0 => {
                slot.improvements += 1;
                self.state.apply(&candidate);
                trace!(kind = %candidate.kind, delta = candidate.delta, cost = self.state.cost(), "improved");
                self.improving_moves += 1;
                self.schedule.iter_mut().for_each(|s| s.tried = false);
                self.status = NegStatus::Running;
                self.status
            }
            _ => {
                slot.tried = true;
                slot.rejections += 1;
                if self.schedule.iter().all(|s| s.tried) {
                    self.stagnate()
                } else {
                    self.status
                }
            }
        }
    }

    fn stagnate(&mut self) -> NegStatus {
        let budget_left = self.perturbations < self.config.neg_max_perturb;
        if self.allow_perturbations && budget_left && self.perturb() {
            self.perturbations += 1;
            self.schedule.iter_mut().for_each(|s| s.tried = false);
            self.status = NegStatus::Perturbed;
        } else {
            self.status = NegStatus::Converged;
        }
        self.status
    }

    fn perturb(&mut self) -> bool {
        if self.config.neg_perturb_from_best {
            self.state.restore_best();
        }
        let relocations = match self.config.perturb_mode {
            PerturbMode::SplitClusters => self.split_cluster().or_else(|| self.move_vertex()),
            PerturbMode::MoveVertices => self.move_vertex(),
        };
        let Some(relocations) = relocations else { return false };
        let delta = self.state.perturb(&relocations);
        debug!(moved = relocations.len(), delta, cost = self.state.cost(), "perturbed");
        true
    }

    /// Cuts a random cluster along a random prefix of an expansion order.
    fn split_cluster(&mut self) -> Option<Vec<(VertexIndex, Target)>> {
        let cg = self.state.cluster_graph();
        let splittable: Vec<ClusterIndex> = cg.partition().clusters().filter(|&c| cg.partition().size(c) >= 2).collect();
        if splittable.is_empty() {
            return None;
        }
        let c = splittable[self.rng.gen_range(0..splittable.len())];
        let seed = internal_seed(cg, c, &mut self.rng);
        let steps = self.order.compute(cg.graph(), cg.partition().members(c), seed, &mut self.rng);
        let k = self.rng.gen_range(1..steps.len());
        Some(steps[..k].iter().map(|s| (s.vertex, Target::Fresh(0))).collect())
    }

    /// Moves a random vertex next to one of its neighbors, or out of its cluster.
    fn move_vertex(&mut self) -> Option<Vec<(VertexIndex, Target)>> {
        let cg = self.state.cluster_graph();
        let graph = cg.graph();
        let movable: Vec<VertexIndex> = graph.vertices().filter(|&v| graph.degree(v) > 0).collect();
        if movable.is_empty() {
            return None;
        }
        let v = movable[self.rng.gen_range(0..movable.len())];
        let from = cg.cluster_of(v);
        let outside: Vec<ClusterIndex> =
            graph.neighbors(v).iter().map(|&u| cg.cluster_of(u)).filter(|&c| c != from).collect();
        if !outside.is_empty() {
            let target = outside[self.rng.gen_range(0..outside.len())];
            return Some(vec![(v, Target::Cluster(target))]);
        }
        (cg.partition().size(from) > 1).then(|| vec![(v, Target::Fresh(0))])
    }

    fn outcome(&self) -> NegOutcome {
        NegOutcome {
            status: self.status,
            best_cost: self.state.best_cost(),
            best_partition: self.state.best_partition(),
            iterations: self.iterations,
            improving_moves: self.improving_moves,
            perturbations: self.perturbations,
        }
    }

    fn record(&self, counters: &mut Counters, elapsed: Duration) {
        counters.add("neg_runs", 1);
        counters.add("neg_iterations", self.iterations as i64);
        counters.add("neg_improving_moves", self.improving_moves as i64);
        counters.add("neg_perturbations", self.perturbations as i64);
        counters.add("neg_time_millis", elapsed.as_millis() as i64);
        for slot in &self.schedule {
            let kind = slot.generator.kind();
            counters.add(&format!("neg_calls_{kind}"), slot.calls);
            counters.add(&format!("neg_improvements_{kind}"), slot.improvements);
            counters.add(&format!("neg_rejections_{kind}"), slot.rejections);
            counters.add(&format!("neg_candidates_{kind}"), slot.candidates);
        }
    }

    /// Steps until the search converges or a budget runs out.
    #[instrument(skip_all)]
    pub fn run(&mut self, ctx: &mut RunContext) -> NegOutcome {
        let start = Instant::now();
        while !self.step(ctx).is_terminal() {}
        self.record(ctx.counters_mut(), start.elapsed());

        let outcome = self.outcome();
        debug!(
            status = ?outcome.status,
            best_cost = outcome.best_cost,
            iterations = outcome.iterations,
            improving_moves = outcome.improving_moves,
            perturbations = outcome.perturbations
        );
        outcome
    }
}
