use petgraph::graph::UnGraph;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead};
use std::num::ParseIntError;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadEdgeListError {
    #[error("invalid line (got {0})")]
    InvalidLine(String),
    #[error("found self loop at node {0}")]
    SelfLoop(u32),
    #[error("found duplicate edge {0} {1}")]
    DuplicateEdge(u32, u32),
    #[error("parse int error")]
    ParseInt(#[from] ParseIntError),
    #[error("io error")]
    IoError(#[from] io::Error),
}

/// Reads lines `(u) (v)` with indices starting at 0. The node count is one
/// more than the largest index. Lines starting with `#` are comments.
pub fn read_edge_list<P>(path: P) -> Result<UnGraph<(), ()>, ReadEdgeListError>
where
    P: AsRef<Path>,
{
    let file = File::open(path)?;
    parse_edge_list(io::BufReader::new(file))
}

pub fn parse_edge_list<R: BufRead>(reader: R) -> Result<UnGraph<(), ()>, ReadEdgeListError> {
    let mut n = 0;
    let mut edges = vec![];
    let mut seen = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_ascii_whitespace();
        let (Some(a), Some(b), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Err(ReadEdgeListError::InvalidLine(line));
        };

        let u: u32 = a.parse()?;
        let v: u32 = b.parse()?;
        if u == v {
            return Err(ReadEdgeListError::SelfLoop(u));
        }
        if !seen.insert((u.min(v), u.max(v))) {
            return Err(ReadEdgeListError::DuplicateEdge(u, v));
        }
        edges.push((u, v));
        n = n.max(u + 1).max(v + 1);
    }

    let mut graph = UnGraph::with_capacity(n as usize, edges.len());
    graph.extend_with_edges(edges);
    Ok(graph)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_edges() {
        let graph = parse_edge_list("# path\n0 1\n1 2\n\n2 3\n".as_bytes()).unwrap();
        assert_eq!((graph.node_count(), graph.edge_count()), (4, 3));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert!(matches!(parse_edge_list("0\n".as_bytes()), Err(ReadEdgeListError::InvalidLine(_))));
        assert!(matches!(parse_edge_list("0 1 2\n".as_bytes()), Err(ReadEdgeListError::InvalidLine(_))));
        assert!(matches!(parse_edge_list("0 x\n".as_bytes()), Err(ReadEdgeListError::ParseInt(_))));
        assert!(matches!(parse_edge_list("4 4\n".as_bytes()), Err(ReadEdgeListError::SelfLoop(4))));
        assert!(matches!(parse_edge_list("0 1\n1 0\n".as_bytes()), Err(ReadEdgeListError::DuplicateEdge(1, 0))));
    }
}
