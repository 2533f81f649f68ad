//! Bottom-up labeling of a restriction's full leaves.

use crate::rust::*;

use crate::node::{NodeId,NodeLabel,TempInfo};
use crate::tree::PCTree;

impl PCTree {
    /// The node's scratch block, cleared and restamped if it is from an
    /// earlier pass.
    pub(crate) fn scratch( &mut self, n: NodeId ) -> &mut TempInfo {
        let stamp = self.stamp;
        let node = &mut self.nodes[ n.0 ];
        if node.stamp != stamp {
            node.temp.clear();
            node.stamp = stamp;
        }
        &mut node.temp
    }

    /// The node's label in the current pass; `Empty` if it was not touched.
    #[inline] pub fn label( &self, n: NodeId ) -> NodeLabel {
        let node = self.node( n );
        if node.stamp == self.stamp { node.temp.label } else { NodeLabel::Empty }
    }

    pub(crate) fn add_partial_node( &mut self, partial: NodeId ) {
        debug_assert!( self.scratch( partial ).pred_partial.is_none() );
        debug_assert!( self.scratch( partial ).next_partial.is_none() );
        let last = self.last_partial;
        self.scratch( partial ).pred_partial = last;
        match last {
            None         => self.first_partial = Some( partial ),
            Some( last ) => self.scratch( last ).next_partial = Some( partial ),
        }
        self.last_partial = Some( partial );
        self.partial_count += 1;
    }

    pub(crate) fn remove_partial_node( &mut self, partial: NodeId ) {
        let ( pred, next ) = {
            let t = self.scratch( partial );
            let pair = ( t.pred_partial, t.next_partial );
            t.pred_partial = None;
            t.next_partial = None;
            pair
        };
        debug_assert_eq!( pred.is_none(), self.first_partial == Some( partial ));
        match pred {
            None         => self.first_partial = next,
            Some( pred ) => self.scratch( pred ).next_partial = next,
        }
        debug_assert_eq!( next.is_none(), self.last_partial == Some( partial ));
        match next {
            None         => self.last_partial = pred,
            Some( next ) => self.scratch( next ).pred_partial = pred,
        }
        self.partial_count -= 1;
    }

    /// Registers `full` as a freshly fullified neighbor of `n` and returns
    /// the new count.
    fn add_full_neighbor( &mut self, n: NodeId, full: NodeId ) -> usize {
        let t = self.scratch( n );
        t.full_neighbors.push( full );
        t.full_neighbors.len()
    }

    /// Propagates Full/Partial labels bottom-up from the given full
    /// leaves and collects the partial inner nodes into the intrusive
    /// partial-node list.
    ///
    /// With `full_node_order` given, inner nodes are recorded in the order
    /// they become entirely full; labeling all leaves but one then yields
    /// every inner node, bottom-up towards the excluded leaf. That variant
    /// returns early once the excluded leaf would be the next partial
    /// neighbor.
    pub(crate) fn assign_labels( &mut self, full_leaves: &[NodeId], mut full_node_order: Option<&mut Vec<NodeId>> ) {
        // a failed reduction leaves its drained-to-be list behind
        self.first_partial = None;
        self.last_partial = None;
        self.partial_count = 0;
        if let Some( order ) = full_node_order.as_deref_mut() {
            order.reserve( self.inner_node_count() );
        }
        let mut queue: VecDeque<NodeId> = VecDeque::with_capacity( full_leaves.len() );
        for &leaf in full_leaves {
            debug_assert!( self.is_leaf( leaf ));
            let t = self.scratch( leaf );
            if t.label == NodeLabel::Full {
                debug_assert!( false, "duplicate leaf in restriction" );
                continue;
            }
            t.label = NodeLabel::Full;
            queue.push_back( leaf );
        }

        while let Some( full_node ) = queue.pop_front() {
            if !self.is_leaf( full_node ) {
                let informed = self.scratch( full_node ).full_neighbors.len();
                debug_assert_eq!( informed, self.degree( full_node ) - 1 );
                debug_assert_eq!( self.label( full_node ), NodeLabel::Partial );
                self.remove_partial_node( full_node );
                self.scratch( full_node ).label = NodeLabel::Full;
            }

            // locate the one neighbor that is not full yet
            let mut partial_neigh = self.parent( full_node );
            if partial_neigh.map_or( true, |p| self.label( p ) == NodeLabel::Full ) {
                let mut pred = None;
                let mut curr = self.node( full_node ).child1;
                while let Some( c ) = curr {
                    if self.label( c ) != NodeLabel::Full {
                        break;
                    }
                    let next = self.node( c ).next_sibling( pred );
                    pred = Some( c );
                    curr = next;
                }
                partial_neigh = curr;
            }
            let partial_neigh = partial_neigh.expect( "full node without a non-full neighbor" );
            debug_assert_ne!( self.label( partial_neigh ), NodeLabel::Full );

            if self.is_leaf( partial_neigh ) {
                // every leaf but this one is full; only the full-node-order
                // labelings of queries run into this
                debug_assert!( full_node_order.is_some() );
                debug_assert!( queue.is_empty() );
                return;
            }

            let count = self.add_full_neighbor( partial_neigh, full_node );
            debug_assert!( count <= self.degree( partial_neigh ) - 1 );
            if count == 1 {
                debug_assert_eq!( self.label( partial_neigh ), NodeLabel::Empty );
                self.scratch( partial_neigh ).label = NodeLabel::Partial;
                self.add_partial_node( partial_neigh );
            } else {
                debug_assert_eq!( self.label( partial_neigh ), NodeLabel::Partial );
            }
            if count == self.degree( partial_neigh ) - 1 {
                queue.push_back( partial_neigh );
                if let Some( order ) = full_node_order.as_deref_mut() {
                    order.push( partial_neigh );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PCNodeType;

    #[test]
    fn labels_full_subtree() {
        let mut tree = PCTree::with_leaves( 5 );
        let leaf = tree.leaves()[0];
        let added = tree.replace_leaf( 2, leaf );

        tree.stamp += 1;
        tree.assign_labels( &added, None );
        // the inner P-node is entirely full, the root partial
        assert_eq!( tree.label( leaf ), NodeLabel::Full );
        assert_eq!( tree.label( tree.root().unwrap() ), NodeLabel::Partial );
        assert_eq!( tree.partial_count, 1 );
        assert_eq!( tree.first_partial, tree.root() );
    }

    #[test]
    fn labels_partial_inner_node() {
        let mut tree = PCTree::with_leaves( 5 );
        let leaf = tree.leaves()[0];
        let added = tree.replace_leaf( 3, leaf );

        tree.stamp += 1;
        tree.assign_labels( &added[..2], None );
        assert_eq!( tree.label( leaf ), NodeLabel::Partial );
        assert_eq!( tree.label( tree.root().unwrap() ), NodeLabel::Empty );
        assert_eq!( tree.partial_count, 1 );
    }

    #[test]
    fn full_node_order_ascends_towards_excluded_leaf() {
        let mut tree = PCTree::new();
        let root = tree.new_node( PCNodeType::PNode, None, None );
        let inner = tree.new_node( PCNodeType::PNode, Some( root ), None );
        tree.insert_leaves( 2, root );
        tree.insert_leaves( 2, inner );

        // the excluded leaf sits under `inner`, so the root fills up first
        let all_but_last: Vec<NodeId> = tree.leaves()[..3].to_vec();
        let mut order = Vec::new();
        tree.stamp += 1;
        tree.assign_labels( &all_but_last, Some( &mut order ));
        assert_eq!( order, vec![ root, inner ]);

        // excluding a root leaf instead makes the order bottom-up
        let restriction = vec![ tree.leaves()[2], tree.leaves()[3], tree.leaves()[1] ];
        let mut order = Vec::new();
        tree.stamp += 1;
        tree.assign_labels( &restriction, Some( &mut order ));
        assert_eq!( order, vec![ inner, root ]);
    }
}
