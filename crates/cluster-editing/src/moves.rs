use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

use crate::config::TieBreak;
use crate::graph::VertexIndex;
use crate::partition::ClusterIndex;

/// The families of moves the local search draws candidates from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoveKind {
    Node,
    Edge,
    Triangle,
    Join,
    Interchange,
    Chain2,
    Attraction,
    Repulsion,
}

impl MoveKind {
    pub const ALL: [MoveKind; 8] = [
        MoveKind::Node,
        MoveKind::Edge,
        MoveKind::Triangle,
        MoveKind::Join,
        MoveKind::Interchange,
        MoveKind::Chain2,
        MoveKind::Attraction,
        MoveKind::Repulsion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MoveKind::Node => "node",
            MoveKind::Edge => "edge",
            MoveKind::Triangle => "triangle",
            MoveKind::Join => "join",
            MoveKind::Interchange => "interchange",
            MoveKind::Chain2 => "chain2",
            MoveKind::Attraction => "attraction",
            MoveKind::Repulsion => "repulsion",
        }
    }
}

impl Display for MoveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown move kind `{0}`")]
pub struct ParseMoveKindError(String);

impl FromStr for MoveKind {
    type Err = ParseMoveKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MoveKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseMoveKindError(s.to_string()))
    }
}

/// Where a relocated vertex goes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// An existing, non-empty cluster.
    Cluster(ClusterIndex),
    /// A cluster that is empty before the move. Vertices with the same label
    /// end up in the same cluster, different labels in different ones.
    Fresh(u8),
}

/// A proposed move with its exact cost change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub kind: MoveKind,
    pub relocations: Vec<(VertexIndex, Target)>,
    pub delta: i64,
}

/// Keeps the best candidate among those offered by a generator.
///
/// Relocation lists are only built for candidates that become the current
/// best, so generators can offer many candidates cheaply.
#[derive(Debug)]
pub struct Selector {
    tie_break: TieBreak,
    best: Option<Candidate>,
    ties: u32,
    offered: usize,
    recorded: Option<Vec<Candidate>>,
}

impl Selector {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break, best: None, ties: 0, offered: 0, recorded: None }
    }

    /// A selector that additionally keeps every offered candidate.
    pub fn recording(tie_break: TieBreak) -> Self {
        Self { recorded: Some(vec![]), ..Self::new(tie_break) }
    }

    pub fn offer<R, F>(&mut self, kind: MoveKind, delta: i64, rng: &mut R, build: F)
    where
        R: Rng,
        F: FnOnce() -> Vec<(VertexIndex, Target)>,
    {
        self.offered += 1;
        let accept = match &self.best {
            None => {
                self.ties = 1;
                true
            }
            Some(best) if delta < best.delta => {
                self.ties = 1;
                true
            }
            Some(best) if delta == best.delta => match self.tie_break {
                TieBreak::First => false,
                TieBreak::Random => {
                    self.ties += 1;
                    rng.gen_range(0..self.ties) == 0
                }
            },
            Some(_) => false,
        };

        if let Some(recorded) = &mut self.recorded {
            let candidate = Candidate { kind, relocations: build(), delta };
            if accept {
                self.best = Some(candidate.clone());
            }
            recorded.push(candidate);
        } else if accept {
            self.best = Some(Candidate { kind, relocations: build(), delta });
        }
    }

    /// Delta of the current best candidate.
    pub fn best_delta(&self) -> Option<i64> {
        self.best.as_ref().map(|c| c.delta)
    }

    /// Number of candidates offered so far.
    pub fn offered(&self) -> usize {
        self.offered
    }

    pub fn recorded(&self) -> &[Candidate] {
        self.recorded.as_deref().unwrap_or(&[])
    }

    pub fn take(&mut self) -> Option<Candidate> {
        self.ties = 0;
        self.best.take()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn single(v: usize) -> Vec<(VertexIndex, Target)> {
        vec![(VertexIndex::new(v), Target::Fresh(0))]
    }

    #[test]
    fn parse_move_kind() {
        assert_eq!("chain2".parse::<MoveKind>(), Ok(MoveKind::Chain2));
        assert_eq!(" Join ".parse::<MoveKind>(), Ok(MoveKind::Join));
        assert_eq!("swap".parse::<MoveKind>(), Err(ParseMoveKindError("swap".to_string())));
        for kind in MoveKind::ALL {
            assert_eq!(kind.to_string().parse::<MoveKind>(), Ok(kind));
        }
    }

    #[test]
    fn keeps_most_negative() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut selector = Selector::new(TieBreak::First);
        selector.offer(MoveKind::Node, 3, &mut rng, || single(0));
        selector.offer(MoveKind::Node, -2, &mut rng, || single(1));
        selector.offer(MoveKind::Edge, 5, &mut rng, || unreachable!());
        selector.offer(MoveKind::Edge, -2, &mut rng, || unreachable!());
        assert_eq!(selector.offered(), 4);
        assert_eq!(selector.best_delta(), Some(-2));
        let best = selector.take().unwrap();
        assert_eq!(best.relocations, single(1));
        assert_eq!(best.kind, MoveKind::Node);
        assert_eq!(selector.take(), None);
    }

    #[test]
    fn random_tie_break_is_reproducible() {
        let pick = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut selector = Selector::new(TieBreak::Random);
            for v in 0..20 {
                selector.offer(MoveKind::Node, -1, &mut rng, || single(v));
            }
            selector.take().unwrap().relocations[0].0
        };
        assert_eq!(pick(7), pick(7));
        let picks: std::collections::HashSet<_> = (0..20).map(pick).collect();
        assert!(picks.len() > 1);
    }

    #[test]
    fn recording() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut selector = Selector::recording(TieBreak::First);
        selector.offer(MoveKind::Join, 1, &mut rng, || single(0));
        selector.offer(MoveKind::Join, 2, &mut rng, || single(1));
        assert_eq!(selector.recorded().len(), 2);
        assert_eq!(selector.take().unwrap().delta, 1);
    }
}
