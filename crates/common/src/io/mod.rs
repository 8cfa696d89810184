mod dimacs;
mod edge_list;
mod edits;

use clap::ValueEnum;
pub use dimacs::{format_dimacs, parse_dimacs, read_dimacs, write_dimacs, DimacsError};
pub use edge_list::{parse_edge_list, read_edge_list, ReadEdgeListError};
pub use edits::{format_edits, write_edits};

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum GraphFileType {
    /// `p ce (n) (m)` header and 1-indexed edges.
    Dimacs,
    /// 0-indexed edges, one per line.
    EdgeList,
}
