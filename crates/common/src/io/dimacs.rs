use petgraph::graph::UnGraph;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DimacsError {
    #[error("missing header")]
    MissingHeader,
    #[error("invalid header (expected 'p ce (n) (m)', got {0})")]
    InvalidHeader(String),
    #[error("invalid edge in line {line} (expected '(u) (v)', got {content})")]
    InvalidLine { line: usize, content: String },
    #[error("found zero index in line {0} (indices must be at least 1)")]
    ZeroIndex(usize),
    #[error("index {index} in line {line} is out of range (graph has {n} nodes)")]
    IndexOutOfRange { line: usize, index: usize, n: usize },
    #[error("found self loop at node {0}")]
    SelfLoop(usize),
    #[error("found duplicate edge {0} {1}")]
    DuplicateEdge(usize, usize),
    #[error("wrong m given in header (expected {expected}, got {actual})")]
    WrongM { expected: usize, actual: usize },
    #[error("io error")]
    IoError(#[from] io::Error),
}

/// Reads a graph in the cluster editing format.
///
/// Lines starting with `c` are comments. The first other line is the header
/// `p ce (n) (m)`, followed by `m` lines `(u) (v)` with indices starting at 1.
/// Empty lines are skipped.
pub fn read_dimacs<P>(path: P) -> Result<UnGraph<(), ()>, DimacsError>
where
    P: AsRef<Path>,
{
    let file = File::open(path)?;
    parse_dimacs(io::BufReader::new(file))
}

/// Like [`read_dimacs`], for any buffered reader.
pub fn parse_dimacs<R: BufRead>(reader: R) -> Result<UnGraph<(), ()>, DimacsError> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(i, line)| line.map(|line| (i + 1, line)))
        .filter(|line| !matches!(line, Ok((_, l)) if l.trim().is_empty() || l.starts_with('c')));

    let (_, header) = lines.next().ok_or(DimacsError::MissingHeader)??;
    let (n, m) = {
        let err = || DimacsError::InvalidHeader(header.clone());
        let mut iter = header.split_ascii_whitespace();
        if iter.next() != Some("p") || iter.next() != Some("ce") {
            return Err(err());
        }
        let n: usize = iter.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        let m: usize = iter.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        if iter.next().is_some() {
            return Err(err());
        }
        (n, m)
    };

    let mut graph = UnGraph::with_capacity(n, m);
    for _ in 0..n {
        graph.add_node(());
    }

    let mut seen = HashSet::with_capacity(m);
    for line in lines {
        let (line, content) = line?;
        let invalid = || DimacsError::InvalidLine { line, content: content.clone() };
        let mut iter = content.split_ascii_whitespace();
        let mut next_index = || -> Result<usize, DimacsError> {
            let index: usize = iter.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
            match index {
                0 => Err(DimacsError::ZeroIndex(line)),
                index if index > n => Err(DimacsError::IndexOutOfRange { line, index, n }),
                index => Ok(index),
            }
        };
        let u = next_index()?;
        let v = next_index()?;
        if iter.next().is_some() {
            return Err(invalid());
        }
        if u == v {
            return Err(DimacsError::SelfLoop(u));
        }
        if !seen.insert((u.min(v), u.max(v))) {
            return Err(DimacsError::DuplicateEdge(u, v));
        }
        graph.add_edge((u as u32 - 1).into(), (v as u32 - 1).into(), ());
    }

    if graph.edge_count() != m {
        return Err(DimacsError::WrongM { expected: m, actual: graph.edge_count() });
    }
    Ok(graph)
}

pub fn write_dimacs<P>(path: P, graph: &UnGraph<(), ()>) -> Result<(), DimacsError>
where
    P: AsRef<Path>,
{
    let file = File::create(path)?;
    let mut file = BufWriter::new(file);
    format_dimacs(&mut file, graph)?;
    file.flush()?;
    Ok(())
}

/// Writes the header and the edges with `u < v`, sorted.
pub fn format_dimacs<W: Write>(mut writer: W, graph: &UnGraph<(), ()>) -> io::Result<()> {
    let mut edges: Vec<(usize, usize)> = graph
        .edge_indices()
        .filter_map(|e| graph.edge_endpoints(e))
        .map(|(a, b)| (a.index().min(b.index()) + 1, a.index().max(b.index()) + 1))
        .collect();
    edges.sort_unstable();
    writeln!(writer, "p ce {} {}", graph.node_count(), edges.len())?;
    for (u, v) in edges {
        writeln!(writer, "{u} {v}")?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(text: &str) -> Result<UnGraph<(), ()>, DimacsError> {
        parse_dimacs(text.as_bytes())
    }

    #[test]
    fn reads_comments_and_edges() {
        let graph = parse("c two triangles\np ce 6 4\n1 2\nc inner comment\n2 3\n\n4 5\n5 6\n").unwrap();
        assert_eq!(graph.node_count(), 6);
        assert_eq!(graph.edge_count(), 4);
        assert!(graph.find_edge(0.into(), 1.into()).is_some());
        assert!(graph.find_edge(4.into(), 5.into()).is_some());
    }

    #[test]
    fn isolated_nodes() {
        let graph = parse("p ce 3 0\n").unwrap();
        assert_eq!((graph.node_count(), graph.edge_count()), (3, 0));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(parse(""), Err(DimacsError::MissingHeader)));
        assert!(matches!(parse("c only comments\n"), Err(DimacsError::MissingHeader)));
        assert!(matches!(parse("p tww 2 1\n1 2\n"), Err(DimacsError::InvalidHeader(_))));
        assert!(matches!(parse("p ce 2\n"), Err(DimacsError::InvalidHeader(_))));
        assert!(matches!(parse("p ce 2 x\n"), Err(DimacsError::InvalidHeader(_))));
        assert!(matches!(parse("p ce 2 1\n1\n"), Err(DimacsError::InvalidLine { line: 2, .. })));
        assert!(matches!(parse("p ce 2 1\n1 2 3\n"), Err(DimacsError::InvalidLine { .. })));
        assert!(matches!(parse("p ce 2 1\n0 1\n"), Err(DimacsError::ZeroIndex(2))));
        assert!(matches!(parse("p ce 2 1\n1 3\n"), Err(DimacsError::IndexOutOfRange { index: 3, n: 2, .. })));
        assert!(matches!(parse("p ce 2 1\n2 2\n"), Err(DimacsError::SelfLoop(2))));
        assert!(matches!(parse("p ce 2 2\n1 2\n2 1\n"), Err(DimacsError::DuplicateEdge(2, 1))));
        assert!(matches!(parse("p ce 3 2\n1 2\n"), Err(DimacsError::WrongM { expected: 2, actual: 1 })));
    }

    #[test]
    fn error_messages() {
        let err = parse("p ce 2 1\n1 3\n").unwrap_err();
        assert_eq!(err.to_string(), "index 3 in line 2 is out of range (graph has 2 nodes)");
    }

    #[test]
    fn writes_sorted_edges() {
        let graph = UnGraph::<(), ()>::from_edges([(2, 1), (0, 1), (3, 0)]);
        let mut out = vec![];
        format_dimacs(&mut out, &graph).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "p ce 4 3\n1 2\n1 4\n2 3\n");
        assert_eq!(parse(&text).unwrap().edge_count(), 3);
    }
}
