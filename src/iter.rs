//! Iterators over children, cyclic neighborhoods and whole trees.

use crate::node::NodeId;
use crate::tree::PCTree;

/// Forward iterator over the children of one node.
pub struct Children<'a> {
    tree : &'a PCTree,
    pred : Option<NodeId>,
    curr : Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeId;

    fn next( &mut self ) -> Option<NodeId> {
        let curr = self.curr?;
        let next = self.tree.next_sibling( self.pred, curr );
        self.pred = Some( curr );
        self.curr = next;
        Some( curr )
    }
}

/// Iterator once around a node's cyclic neighbor order: children plus the
/// parent, if any.
pub struct Neighbors<'a> {
    tree  : &'a PCTree,
    node  : NodeId,
    first : Option<NodeId>,
    pred  : Option<NodeId>,
    curr  : Option<NodeId>,
}

impl<'a> Iterator for Neighbors<'a> {
    type Item = NodeId;

    fn next( &mut self ) -> Option<NodeId> {
        let curr = self.curr?;
        let next = self.tree.next_neighbor( self.node, self.pred, curr );
        self.pred = Some( curr );
        self.curr = if Some( next ) == self.first { None } else { Some( next )};
        Some( curr )
    }
}

/// Depth-first iterator over all nodes reachable from a start node,
/// parents before children, children in sibling order.
pub struct Dfs<'a> {
    tree  : &'a PCTree,
    stack : Vec<NodeId>,
}

impl<'a> Iterator for Dfs<'a> {
    type Item = NodeId;

    fn next( &mut self ) -> Option<NodeId> {
        let node = self.stack.pop()?;
        let children: Vec<NodeId> = self.tree.children( node ).collect();
        for &child in children.iter().rev() {
            self.stack.push( child );
        }
        Some( node )
    }
}

impl PCTree {
    /// Iterates over `node`'s children in sibling order.
    pub fn children( &self, node: NodeId ) -> Children {
        Children { tree: self, pred: None, curr: self.node( node ).child1 }
    }

    /// Iterates once around `node`'s cyclic neighbor order, starting at
    /// `start` (or an arbitrary neighbor).
    pub fn neighbors( &self, node: NodeId, start: Option<NodeId> ) -> Neighbors {
        let first = start
            .or( self.node( node ).child1 )
            .or_else( || self.parent( node ));
        Neighbors { tree: self, node, first, pred: None, curr: first }
    }

    /// All nodes of the tree, parents before children.
    pub fn nodes_dfs( &self ) -> Dfs {
        Dfs { tree: self, stack: self.root.into_iter().collect() }
    }

    /// All inner nodes of the tree.
    pub fn inner_nodes<'a>( &'a self ) -> impl Iterator<Item = NodeId> + 'a {
        self.nodes_dfs().filter( move |&n| !self.is_leaf( n ))
    }
}
