//! Parsing trees from the bracket grammar and printing them back.
//!
//! ```text
//! leaf    := integer
//! cnode   := integer ':' '[' nodelist ']'
//! pnode   := integer ':' '(' nodelist ')'
//! wrapper := integer ':' '{' pnode_or_cnode '}'   (root leaf only)
//! nodelist := node (',' node)*
//! ```

use crate::rust::*;

use crate::error::ParseError;
use crate::node::{NodeId,PCNodeType};
use crate::tree::PCTree;

impl FromStr for PCTree {
    type Err = ParseError;

    /// Parses the bracket grammar, assigning fresh node indices.
    fn from_str( s: &str ) -> Result<PCTree, ParseError> {
        PCTree::parse( s, false )
    }
}

impl PCTree {
    /// Parses the bracket grammar. With `keep_ids` the integers in the
    /// string become the node indices; otherwise they are discarded.
    pub fn parse( s: &str, keep_ids: bool ) -> Result<PCTree, ParseError> {
        let bytes = s.as_bytes();
        if keep_ids {
            // ids must be unique before any node is created
            let mut seen = std::collections::HashSet::new();
            let mut i = 0;
            while i < bytes.len() {
                if bytes[ i ].is_ascii_digit() {
                    let start = i;
                    while i < bytes.len() && bytes[ i ].is_ascii_digit() {
                        i += 1;
                    }
                    let id: usize = s[ start..i ]
                        .parse()
                        .map_err( |_| ParseError::IllegalChar { ch: s[ start.. ].chars().next().unwrap(), pos: start })?;
                    if !seen.insert( id ) {
                        return Err( ParseError::DuplicateId { id, pos: i });
                    }
                } else {
                    i += 1;
                }
            }
        }

        let mut tree = PCTree::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[ i ];
            if c.is_ascii_whitespace() {
                i += 1;
                continue;
            }

            let parent = stack.last().copied();
            let mut new_node: Option<NodeId> = None;
            while i < bytes.len() && bytes[ i ].is_ascii_digit() {
                let start = i;
                while i < bytes.len() && bytes[ i ].is_ascii_digit() {
                    i += 1;
                }
                let id: usize = s[ start..i ]
                    .parse()
                    .map_err( |_| ParseError::IllegalChar { ch: '0', pos: start })?;
                if parent.is_none() && tree.node_count() > 0 {
                    return Err( ParseError::SecondRoot { pos: i });
                }
                let id = if keep_ids { Some( id )} else { None };
                new_node = Some( tree.new_node( PCNodeType::Leaf, parent, id ));

                let mut delim_seen = false;
                while i < bytes.len() {
                    let d = bytes[ i ];
                    if d.is_ascii_whitespace() {
                        i += 1;
                    } else if d == b':' || d == b',' {
                        if delim_seen {
                            return Err( ParseError::DoubleDelimiter { pos: i });
                        }
                        delim_seen = true;
                        if d == b',' {
                            // after a comma the number cannot head a node list
                            new_node = None;
                        }
                        i += 1;
                    } else {
                        break;
                    }
                }
            }
            if i >= bytes.len() {
                // numbers ran into the end of the string with brackets open
                return Err( ParseError::UnexpectedEnd );
            }

            match bytes[ i ] {
                b'{' => {
                    if !stack.is_empty() {
                        return Err( ParseError::IllegalChar { ch: '{', pos: i });
                    }
                    let node = match new_node {
                        Some( n ) => n,
                        None      => tree.new_node( PCNodeType::Leaf, None, None ),
                    };
                    if tree.leaf_count() != 1 || tree.node_count() != 1 {
                        return Err( ParseError::IllegalChar { ch: '{', pos: i });
                    }
                    stack.push( node );
                }
                b'[' | b'(' => {
                    let node_type = if bytes[ i ] == b'[' { PCNodeType::CNode } else { PCNodeType::PNode };
                    match new_node {
                        Some( n ) => {
                            tree.change_node_type( n, node_type );
                            stack.push( n );
                        }
                        None => {
                            if parent.is_none() && tree.node_count() > 0 {
                                return Err( ParseError::SecondRoot { pos: i });
                            }
                            stack.push( tree.new_node( node_type, parent, None ));
                        }
                    }
                }
                b']' | b')' => {
                    let expected = if bytes[ i ] == b']' { PCNodeType::CNode } else { PCNodeType::PNode };
                    match stack.pop() {
                        Some( n ) if tree.node_type( n ) == expected => {}
                        _ => return Err( ParseError::IllegalChar { ch: bytes[ i ] as char, pos: i }),
                    }
                }
                b'}' => {
                    match stack.pop() {
                        Some( n ) if tree.node_type( n ) == PCNodeType::Leaf => {}
                        _ => return Err( ParseError::IllegalChar { ch: '}', pos: i }),
                    }
                    if !stack.is_empty() {
                        return Err( ParseError::IllegalChar { ch: '}', pos: i });
                    }
                }
                other => return Err( ParseError::IllegalChar { ch: other as char, pos: i }),
            }

            i += 1;
            let mut delim_seen = false;
            while i < bytes.len() {
                let d = bytes[ i ];
                if d.is_ascii_whitespace() {
                    i += 1;
                } else if d == b',' {
                    if delim_seen {
                        return Err( ParseError::DoubleDelimiter { pos: i });
                    }
                    delim_seen = true;
                    i += 1;
                } else {
                    break;
                }
            }
        }
        if !stack.is_empty() {
            return Err( ParseError::UnexpectedEnd );
        }
        tree.validate_degrees()?;
        Ok( tree )
    }

    fn node_count( &self ) -> usize {
        self.leaf_count() + self.inner_node_count()
    }

    /// Degree-2 inner nodes never appear at operation boundaries, so the
    /// parser rejects them outright.
    fn validate_degrees( &self ) -> Result<(), ParseError> {
        let root = match self.root {
            Some( root ) => root,
            None         => return Ok(()),
        };
        for node in self.nodes_dfs() {
            let count = self.child_count( node );
            match self.node_type( node ) {
                PCNodeType::Leaf if node == root && count > 0 => {
                    // a root leaf wraps exactly one inner node
                    let child = self.node( node ).child1.unwrap();
                    if count != 1 || self.is_leaf( child ) {
                        return Err( ParseError::TooFewChildren { id: node.index() });
                    }
                }
                PCNodeType::Leaf => {}
                _ => {
                    let minimum = if node == root { 3 } else { 2 };
                    if count < minimum {
                        return Err( ParseError::TooFewChildren { id: node.index() });
                    }
                }
            }
        }
        Ok(())
    }
}

enum PrintItem {
    Node( NodeId ),
    Text( &'static str ),
}

impl Display for PCTree {
    /// Serializes the tree in the grammar accepted by [`PCTree::parse`];
    /// `parse(serialize(T))` reproduces `T`'s represented orders.
    fn fmt( &self, f: &mut Formatter ) -> fmt::Result {
        let root = match self.root {
            Some( root ) => root,
            None         => return write!( f, "empty" ),
        };
        let mut stack = Vec::new();
        if self.is_leaf( root ) && self.child_count( root ) > 0 {
            write!( f, "{}:{{", root.index() )?;
            stack.push( PrintItem::Text( "}" ));
            stack.push( PrintItem::Node( self.node( root ).child1.unwrap() ));
        } else {
            stack.push( PrintItem::Node( root ));
        }
        while let Some( item ) = stack.pop() {
            let node = match item {
                PrintItem::Text( text ) => {
                    write!( f, "{}", text )?;
                    continue;
                }
                PrintItem::Node( node ) => node,
            };
            match self.node_type( node ) {
                PCNodeType::Leaf => {
                    write!( f, "{}", node.index() )?;
                    continue;
                }
                PCNodeType::CNode => {
                    write!( f, "{}:[", node.index() )?;
                    stack.push( PrintItem::Text( "]" ));
                }
                PCNodeType::PNode => {
                    write!( f, "{}:(", node.index() )?;
                    stack.push( PrintItem::Text( ")" ));
                }
            }
            let children: Vec<NodeId> = self.children( node ).collect();
            for ( at, &child ) in children.iter().enumerate().rev() {
                stack.push( PrintItem::Node( child ));
                if at > 0 {
                    stack.push( PrintItem::Text( ", " ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::uid_utils;

    fn uid( tree: &mut PCTree ) -> String {
        tree.unique_id( uid_utils::leaf_to_id, uid_utils::compare_by_index )
    }

    #[test]
    fn parses_nested_tree() {
        let tree = PCTree::parse( "0:[1:(2,3,4), 5, 6:[7,8,9]]", true ).unwrap();
        assert_eq!( tree.leaf_count(), 7 );
        assert_eq!( tree.p_node_count(), 1 );
        assert_eq!( tree.c_node_count(), 2 );
        assert!( tree.check_valid() );
    }

    #[test]
    fn keep_ids_are_kept() {
        let tree = PCTree::parse( "3:(10, 20, 30)", true ).unwrap();
        assert_eq!( tree.root().unwrap().index(), 3 );
        let mut ids: Vec<usize> = tree.leaves().iter().map( |l| l.index() ).collect();
        ids.sort();
        assert_eq!( ids, vec![ 10, 20, 30 ]);
    }

    #[test]
    fn display_round_trips() {
        let mut tree = PCTree::parse( "0:[1:(2,3,4), 5, 6:[7,8,9]]", true ).unwrap();
        let printed = tree.to_string();
        let mut reparsed = PCTree::parse( &printed, true ).unwrap();
        assert_eq!( uid( &mut tree ), uid( &mut reparsed ));
    }

    #[test]
    fn root_leaf_wrapper_round_trips() {
        let mut tree = PCTree::parse( "7:{0:(1, 2, 3)}", true ).unwrap();
        assert_eq!( tree.leaf_count(), 4 );
        assert_eq!( tree.node_type( tree.root().unwrap() ), PCNodeType::Leaf );
        let printed = tree.to_string();
        let mut reparsed = PCTree::parse( &printed, true ).unwrap();
        assert_eq!( uid( &mut tree ), uid( &mut reparsed ));
    }

    #[test]
    fn rejects_bad_input() {
        assert!( matches!( PCTree::parse( "0:(1, 2", false ), Err( ParseError::UnexpectedEnd )));
        assert!( matches!( PCTree::parse( "0:(1, x)", false ), Err( ParseError::IllegalChar { .. })));
        assert!( matches!( PCTree::parse( "0:(1,,2)", false ), Err( ParseError::DoubleDelimiter { .. })));
        assert!( matches!( PCTree::parse( "0:(1,2,3) 4", false ), Err( ParseError::SecondRoot { .. })));
        assert!( matches!( PCTree::parse( "0:(1,1)", true ), Err( ParseError::DuplicateId { .. })));
        assert!( matches!( PCTree::parse( "5", false ), Err( ParseError::UnexpectedEnd )));
    }

    #[test]
    fn rejects_degree_two_inner_nodes() {
        assert!( matches!( PCTree::parse( "0:(1, 2)", false ), Err( ParseError::TooFewChildren { .. })));
        assert!( matches!( PCTree::parse( "0:(1:(2), 3, 4)", false ), Err( ParseError::TooFewChildren { .. })));
        assert!( PCTree::parse( "0:(1:(2, 3), 4, 5)", false ).is_ok() );
    }
}
