use std::time::Duration;

use thiserror::Error;

use crate::moves::MoveKind;

/// How the selector resolves candidates with equal delta.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TieBreak {
    /// Keep the first candidate offered.
    First,
    /// Uniform among all equal candidates, drawn from the run's random generator.
    Random,
}

/// How the local search leaves a local optimum.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PerturbMode {
    /// Split a random cluster along a prefix of a random expansion order.
    SplitClusters,
    /// Move a random vertex into the cluster of one of its neighbors.
    MoveVertices,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("frequency of {0} moves must be positive")]
    ZeroFrequency(MoveKind),
    #[error("expansion order factor must be positive")]
    ZeroExpansionFactor,
}

/// Parameters of one solver run. Immutable while the run is in progress.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub max_recursion_depth: usize,
    pub max_run_time_millis: u64,

    pub neg_max_iterations_to_do: usize,
    pub neg_max_perturb: usize,
    pub neg_allow_perturbations: bool,
    pub neg_perturb_from_best: bool,
    pub perturb_mode: PerturbMode,

    pub neg_move_frequency: usize,
    pub neg_use_edge_swaps: bool,
    pub neg_edge_swaps_frequency: usize,
    pub neg_use_chain2_swaps: bool,
    pub neg_chain2_swaps_frequency: usize,
    pub neg_use_triangle_swaps: bool,
    pub neg_triangle_swaps_frequency: usize,
    pub neg_use_join_clusters: bool,
    pub neg_join_clusters_frequency: usize,
    pub neg_use_node_interchange: bool,
    pub neg_node_interchanging_frequency: usize,
    pub use_component_attraction: bool,
    pub component_attraction_frequency: usize,
    pub use_component_repulsion: bool,
    pub component_repulsion_frequency: usize,

    /// Maintain the cluster-to-cluster crossing weights explicitly.
    pub use_neg_map_version: bool,
    /// Move kinds considered by the local search, in order of preference.
    pub swp_cnd_creators_to_use: Vec<MoveKind>,

    pub seed: u64,
    pub tie_break: TieBreak,
    pub prefer_smaller_clusters: bool,
    /// Random seed edges per expansion order are `factor * ceil(sqrt(|C|))`.
    pub expansion_order_factor: usize,

    pub use_kernelization: bool,
    /// Also contract vertices with equal open neighborhoods. Not exact.
    pub kernel_false_twins: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_recursion_depth: 0,
            max_run_time_millis: 300_000,
            neg_max_iterations_to_do: 1_000_000,
            neg_max_perturb: 20,
            neg_allow_perturbations: true,
            neg_perturb_from_best: true,
            perturb_mode: PerturbMode::SplitClusters,
            neg_move_frequency: 1,
            neg_use_edge_swaps: true,
            neg_edge_swaps_frequency: 3,
            neg_use_chain2_swaps: true,
            neg_chain2_swaps_frequency: 6,
            neg_use_triangle_swaps: true,
            neg_triangle_swaps_frequency: 5,
            neg_use_join_clusters: true,
            neg_join_clusters_frequency: 4,
            neg_use_node_interchange: true,
            neg_node_interchanging_frequency: 7,
            use_component_attraction: true,
            component_attraction_frequency: 10,
            use_component_repulsion: true,
            component_repulsion_frequency: 10,
            use_neg_map_version: false,
            swp_cnd_creators_to_use: MoveKind::ALL.to_vec(),
            seed: 1,
            tie_break: TieBreak::Random,
            prefer_smaller_clusters: true,
            expansion_order_factor: 4,
            use_kernelization: true,
            kernel_false_twins: false,
        }
    }
}

impl Config {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.max_run_time_millis)
    }

    /// Whether moves of `kind` are switched on. Does not look at `swp_cnd_creators_to_use`.
    pub fn uses(&self, kind: MoveKind) -> bool {
        match kind {
            MoveKind::Node => true,
            MoveKind::Edge => self.neg_use_edge_swaps,
            MoveKind::Triangle => self.neg_use_triangle_swaps,
            MoveKind::Join => self.neg_use_join_clusters,
            MoveKind::Interchange => self.neg_use_node_interchange,
            MoveKind::Chain2 => self.neg_use_chain2_swaps,
            MoveKind::Attraction => self.use_component_attraction,
            MoveKind::Repulsion => self.use_component_repulsion,
        }
    }

    /// Moves of `kind` are due every `frequency(kind)` iterations.
    pub fn frequency(&self, kind: MoveKind) -> usize {
        match kind {
            MoveKind::Node => self.neg_move_frequency,
            MoveKind::Edge => self.neg_edge_swaps_frequency,
            MoveKind::Triangle => self.neg_triangle_swaps_frequency,
            MoveKind::Join => self.neg_join_clusters_frequency,
            MoveKind::Interchange => self.neg_node_interchanging_frequency,
            MoveKind::Chain2 => self.neg_chain2_swaps_frequency,
            MoveKind::Attraction => self.component_attraction_frequency,
            MoveKind::Repulsion => self.component_repulsion_frequency,
        }
    }

    /// The move kinds the local search runs, without duplicates, with their frequencies.
    pub fn enabled_kinds(&self) -> Vec<(MoveKind, usize)> {
        let mut kinds: Vec<(MoveKind, usize)> = vec![];
        for &kind in &self.swp_cnd_creators_to_use {
            if self.uses(kind) && kinds.iter().all(|(k, _)| *k != kind) {
                kinds.push((kind, self.frequency(kind)));
            }
        }
        kinds
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(kind) = MoveKind::ALL.into_iter().find(|&kind| self.frequency(kind) == 0) {
            return Err(ConfigError::ZeroFrequency(kind));
        }
        if self.expansion_order_factor == 0 {
            return Err(ConfigError::ZeroExpansionFactor);
        }
        Ok(())
    }
}
