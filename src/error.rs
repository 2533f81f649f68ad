//! Errors reported by the tree parser.

use thiserror::Error;

/// The reasons `PCTree::parse` rejects its input, each carrying the byte
/// position of the offending character.
#[derive( Error, Debug, Clone, PartialEq, Eq )]
pub enum ParseError {
    #[error( "invalid PC-tree: illegal character '{ch}' at position {pos}" )]
    IllegalChar { ch: char, pos: usize },

    #[error( "invalid PC-tree: second node at top level at position {pos}" )]
    SecondRoot { pos: usize },

    #[error( "invalid PC-tree: re-use of id {id} with keep_ids at position {pos}" )]
    DuplicateId { id: usize, pos: usize },

    #[error( "invalid PC-tree: doubled delimiter at position {pos}" )]
    DoubleDelimiter { pos: usize },

    #[error( "invalid PC-tree: unexpected end of input" )]
    UnexpectedEnd,

    /// An inner node with fewer than two children, or an inner root with
    /// fewer than three.
    #[error( "invalid PC-tree: node {id} has too few children" )]
    TooFewChildren { id: usize },
}
