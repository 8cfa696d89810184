//! Candidate generators, one per [`MoveKind`].
//!
//! Generators only read the [`State`] and report candidates with their exact
//! cost change to a [`Selector`]. They own reusable scratch space sized for
//! one graph.

mod chain;
mod edge;
pub(crate) mod expansion;
mod interchange;
mod join;
mod node;
mod triangle;

use rand::Rng;

pub use chain::ChainMoves;
pub use edge::EdgeMoves;
pub use expansion::{Attraction, Repulsion};
pub use interchange::InterchangeMoves;
pub use join::JoinMoves;
pub use node::NodeMoves;
pub use triangle::TriangleMoves;

use crate::config::Config;
use crate::moves::{MoveKind, Selector};
use crate::partition::Partition;
use crate::state::State;

#[derive(Debug)]
pub enum Generator {
    Node(NodeMoves),
    Edge(EdgeMoves),
    Triangle(TriangleMoves),
    Join(JoinMoves),
    Interchange(InterchangeMoves),
    Chain2(ChainMoves),
    Attraction(Attraction),
    Repulsion(Repulsion),
}

impl Generator {
    /// A generator for graphs with `n` vertices.
    pub fn new(kind: MoveKind, n: usize) -> Self {
        let bound = n + Partition::SPARE_CLUSTERS;
        match kind {
            MoveKind::Node => Generator::Node(NodeMoves::new(bound)),
            MoveKind::Edge => Generator::Edge(EdgeMoves::new(bound)),
            MoveKind::Triangle => Generator::Triangle(TriangleMoves::new(bound)),
            MoveKind::Join => Generator::Join(JoinMoves),
            MoveKind::Interchange => Generator::Interchange(InterchangeMoves::new(bound)),
            MoveKind::Chain2 => Generator::Chain2(ChainMoves::new(bound)),
            MoveKind::Attraction => Generator::Attraction(Attraction::new(n)),
            MoveKind::Repulsion => Generator::Repulsion(Repulsion::new(n)),
        }
    }

    pub fn kind(&self) -> MoveKind {
        match self {
            Generator::Node(_) => MoveKind::Node,
            Generator::Edge(_) => MoveKind::Edge,
            Generator::Triangle(_) => MoveKind::Triangle,
            Generator::Join(_) => MoveKind::Join,
            Generator::Interchange(_) => MoveKind::Interchange,
            Generator::Chain2(_) => MoveKind::Chain2,
            Generator::Attraction(_) => MoveKind::Attraction,
            Generator::Repulsion(_) => MoveKind::Repulsion,
        }
    }

    pub fn generate<R: Rng>(&mut self, state: &State<'_>, config: &Config, rng: &mut R, selector: &mut Selector) {
        match self {
            Generator::Node(g) => g.generate(state, config, rng, selector),
            Generator::Edge(g) => g.generate(state, config, rng, selector),
            Generator::Triangle(g) => g.generate(state, config, rng, selector),
            Generator::Join(g) => g.generate(state, config, rng, selector),
            Generator::Interchange(g) => g.generate(state, config, rng, selector),
            Generator::Chain2(g) => g.generate(state, config, rng, selector),
            Generator::Attraction(g) => g.generate(state, config, rng, selector),
            Generator::Repulsion(g) => g.generate(state, config, rng, selector),
        }
    }
}
