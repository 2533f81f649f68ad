//! Structural mutators over the circular sibling order.
//!
//! Children of a node form a doubly linked list whose two ends are the
//! node's outer children; the gap between the ends is where the parent
//! sits in the node's cyclic neighbor order. For a detached node the two
//! ends are treated as adjacent, closing the circle.

use crate::node::{NodeId,PCNodeType};
use crate::tree::PCTree;

impl PCTree {
    /// Attaches the detached `child` as a new outer child of `parent`, at
    /// the `child2` end.
    pub fn append_child( &mut self, parent: NodeId, child: NodeId ) {
        self.append_child_at( parent, child, false );
    }

    /// Attaches the detached `child` as a new outer child of `parent`.
    pub fn append_child_at( &mut self, parent: NodeId, child: NodeId, at_begin: bool ) {
        debug_assert_ne!( parent, child );
        debug_assert!( self.is_detached( child ));
        debug_assert!( self.node_type( parent ) != PCNodeType::Leaf || self.child_count( parent ) == 0 );
        self.set_parent( child, parent );
        self.node_mut( parent ).child_count += 1;
        if self.node( parent ).child1.is_none() {
            debug_assert!( self.node( parent ).child2.is_none() );
            let p = self.node_mut( parent );
            p.child1 = Some( child );
            p.child2 = Some( child );
        } else {
            let outer = if at_begin { self.node( parent ).child1 } else { self.node( parent ).child2 };
            let outer = outer.unwrap();
            self.node_mut( outer ).replace_sibling( None, Some( child ));
            self.node_mut( child ).replace_sibling( None, Some( outer ));
            if at_begin {
                self.node_mut( parent ).child1 = Some( child );
            } else {
                self.node_mut( parent ).child2 = Some( child );
            }
        }
    }

    /// Removes `node` from its parent's child list. Safe on detached
    /// nodes; never destroys.
    pub fn detach( &mut self, node: NodeId ) {
        let parent = self.parent( node );
        let ( sib1, sib2 ) = { let n = self.node( node ); ( n.sib1, n.sib2 )};
        if let Some( s1 ) = sib1 {
            self.node_mut( s1 ).replace_sibling( Some( node ), sib2 );
        } else if let Some( p ) = parent {
            self.node_mut( p ).replace_outer_child( Some( node ), sib2 );
        }
        if let Some( s2 ) = sib2 {
            self.node_mut( s2 ).replace_sibling( Some( node ), sib1 );
        } else if let Some( p ) = parent {
            self.node_mut( p ).replace_outer_child( Some( node ), sib1 );
        }
        if let Some( p ) = parent {
            debug_assert!( !self.node( p ).is_child_outer( node ));
            self.node_mut( p ).child_count -= 1;
        }
        let n = self.node_mut( node );
        n.parent_p = None;
        n.parent_c.set( None );
        n.sib1 = None;
        n.sib2 = None;
    }

    /// Inserts the detached `node` into an existing circular list: between
    /// two adjacent siblings, at the open end next to one outer sibling,
    /// between both outer children of a detached parent (wrapping around),
    /// or between an outer child and that child's parent.
    pub(crate) fn insert_between( &mut self, node: NodeId, sib1: Option<NodeId>, sib2: Option<NodeId> ) {
        let ( mut sib1, mut sib2 ) = ( sib1, sib2 );
        if sib1.is_none() && sib2.is_some() {
            std::mem::swap( &mut sib1, &mut sib2 );
        }
        let mut s1 = sib1.expect( "insert_between needs a sibling" );
        let mut parent = self.parent( s1 );
        if let Some( s2 ) = sib2 {
            if self.is_sibling_of( s1, s2 ) {
                debug_assert!( parent.is_some() );
                debug_assert!( self.parent( s2 ) == parent );
                if self.node( s1 ).is_sibling_adjacent( s2 ) {
                    // both nodes are adjacent children of the same parent
                    let parent = parent.unwrap();
                    self.set_parent( node, parent );
                    self.node_mut( parent ).child_count += 1;
                    self.node_mut( s1 ).replace_sibling( Some( s2 ), Some( node ));
                    self.node_mut( s2 ).replace_sibling( Some( s1 ), Some( node ));
                    self.node_mut( node ).replace_sibling( None, Some( s1 ));
                    self.node_mut( node ).replace_sibling( None, Some( s2 ));
                    return;
                } else {
                    // wrap around a detached parent, both outer children named
                    let parent = parent.unwrap();
                    debug_assert!( self.is_detached( parent ));
                    debug_assert!( self.node( parent ).is_child_outer( s1 ));
                    debug_assert!( self.node( parent ).is_child_outer( s2 ));
                }
            } else if parent.is_some() && Some( s2 ) == self.parent( parent.unwrap() ) {
                // s2 is the parent of `parent`, s1 an outer child of `parent`
            } else {
                // the ends were given the other way around: swap roles
                let former_s1 = s1;
                s1 = s2;
                parent = self.parent( s1 );
                debug_assert!( parent.is_some() );
                debug_assert_eq!( self.parent( parent.unwrap() ), Some( former_s1 ));
            }
        }
        let parent = parent.expect( "insert_between at an open end needs an attached sibling" );
        self.set_parent( node, parent );
        self.node_mut( parent ).child_count += 1;
        self.node_mut( s1 ).replace_sibling( None, Some( node ));
        self.node_mut( parent ).replace_outer_child( Some( s1 ), Some( node ));
        self.node_mut( node ).replace_sibling( None, Some( s1 ));
    }

    /// Splices the detached `replacement` into `node`'s place in its
    /// parent's list; `node` ends up detached, keeping its children.
    pub(crate) fn replace_with( &mut self, node: NodeId, replacement: NodeId ) {
        debug_assert_ne!( node, replacement );
        debug_assert!( self.is_detached( replacement ));
        let parent = self.parent( node );
        let ( pp, pc, sib1, sib2 ) = {
            let n = self.node( node );
            ( n.parent_p, n.parent_c.get(), n.sib1, n.sib2 )
        };
        {
            let r = self.node_mut( replacement );
            r.parent_p = pp;
            r.parent_c.set( pc );
            r.sib1 = sib1;
            r.sib2 = sib2;
        }
        if let Some( s1 ) = sib1 {
            self.node_mut( s1 ).replace_sibling( Some( node ), Some( replacement ));
        }
        if let Some( s2 ) = sib2 {
            self.node_mut( s2 ).replace_sibling( Some( node ), Some( replacement ));
        }
        if let Some( p ) = parent {
            while self.node( p ).is_child_outer( node ) {
                self.node_mut( p ).replace_outer_child( Some( node ), Some( replacement ));
            }
        }
        let n = self.node_mut( node );
        n.parent_p = None;
        n.parent_c.set( None );
        n.sib1 = None;
        n.sib2 = None;
    }

    /// Merges the C-node `node` into its C-node parent: the children take
    /// `node`'s place in the parent's circular order and the union-find
    /// absorbs `node`'s slot, so no child is touched.
    pub(crate) fn merge_into_parent( &mut self, node: NodeId ) {
        debug_assert_eq!( self.node_type( node ), PCNodeType::CNode );
        let parent = self.parent( node ).expect( "merge_into_parent needs a parent" );
        debug_assert_eq!( self.node_type( parent ), PCNodeType::CNode );

        let ni = self.node( node ).list_index;
        let pi = self.node( parent ).list_index;
        let winner = self.parents.link( ni, pi );
        if winner == ni {
            self.c_nodes.swap( ni, pi );
            self.node_mut( node ).list_index = pi;
            self.node_mut( parent ).list_index = ni;
        } else {
            debug_assert_eq!( winner, pi );
        }
        let gained = self.node( node ).child_count - 1;
        self.node_mut( parent ).child_count += gained;

        let ( sib1, sib2, child1, child2 ) = {
            let n = self.node( node );
            ( n.sib1, n.sib2, n.child1.unwrap(), n.child2.unwrap() )
        };
        if let Some( s1 ) = sib1 {
            self.node_mut( s1 ).replace_sibling( Some( node ), Some( child1 ));
            self.node_mut( child1 ).replace_sibling( None, Some( s1 ));
        } else {
            self.node_mut( parent ).replace_outer_child( Some( node ), Some( child1 ));
        }
        if let Some( s2 ) = sib2 {
            self.node_mut( s2 ).replace_sibling( Some( node ), Some( child2 ));
            self.node_mut( child2 ).replace_sibling( None, Some( s2 ));
        } else {
            self.node_mut( parent ).replace_outer_child( Some( node ), Some( child2 ));
        }

        let n = self.node_mut( node );
        n.child1 = None;
        n.child2 = None;
        n.sib1 = None;
        n.sib2 = None;
        n.parent_p = None;
        n.parent_c.set( None );
        n.child_count = 0;
    }

    /// Reverses the circular child order. Observable only for C-nodes.
    pub(crate) fn flip( &mut self, node: NodeId ) {
        let n = self.node_mut( node );
        std::mem::swap( &mut n.child1, &mut n.child2 );
    }

    // ------------------------------------------------------------------ //
    // stepping

    /// The sibling of `curr` on the other side of `pred`.
    #[inline] pub fn next_sibling( &self, pred: Option<NodeId>, curr: NodeId ) -> Option<NodeId> {
        self.node( curr ).next_sibling( pred )
    }

    /// Steps `(pred, curr)` one position along the sibling list.
    #[inline] pub fn proceed_to_next_sibling( &self, pred: &mut Option<NodeId>, curr: &mut NodeId ) -> bool {
        match self.next_sibling( *pred, *curr ) {
            Some( next ) => {
                *pred = Some( *curr );
                *curr = next;
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_sibling_of( &self, a: NodeId, b: NodeId ) -> bool {
        self.parent( a ) == self.parent( b )
    }

    #[inline] pub(crate) fn is_sibling_adjacent( &self, a: NodeId, b: NodeId ) -> bool {
        self.node( a ).is_sibling_adjacent( b )
    }

    #[inline] pub(crate) fn is_child_outer( &self, node: NodeId, child: Option<NodeId> ) -> bool {
        match child {
            Some( c ) => self.node( node ).is_child_outer( c ),
            None      => false,
        }
    }

    pub(crate) fn set_parent( &mut self, child: NodeId, parent: NodeId ) {
        debug_assert!( self.is_detached( child ));
        if self.node_type( parent ) == PCNodeType::CNode {
            let slot = self.node( parent ).list_index;
            self.node_mut( child ).parent_c.set( Some( slot ));
        } else {
            self.node_mut( child ).parent_p = Some( parent );
        }
    }

    /// The neighbor of `node` that follows `curr` when arriving from
    /// `pred`, in `node`'s cyclic neighbor order (children plus parent).
    pub fn next_neighbor( &self, node: NodeId, pred: Option<NodeId>, curr: NodeId ) -> NodeId {
        let parent = self.parent( node );
        let next = match pred {
            None => {
                if Some( curr ) == parent {
                    self.node( node ).child1
                } else {
                    debug_assert_eq!( self.parent( curr ), Some( node ));
                    let c = self.node( curr );
                    if c.sib1.is_some() { c.sib1 } else { c.sib2 }
                }
            }
            Some( pred ) => {
                if Some( curr ) != parent && Some( pred ) != parent && self.is_sibling_of( pred, curr ) {
                    debug_assert_eq!( self.parent( curr ), Some( node ));
                    if self.is_sibling_adjacent( pred, curr ) {
                        self.next_sibling( Some( pred ), curr )
                    } else {
                        // wrap around the open end of a detached node
                        debug_assert!( self.is_detached( node ));
                        debug_assert!( self.node( node ).is_child_outer( pred ));
                        debug_assert!( self.node( node ).is_child_outer( curr ));
                        self.next_sibling( None, curr )
                    }
                } else if Some( pred ) == parent {
                    debug_assert_eq!( self.parent( curr ), Some( node ));
                    self.next_sibling( None, curr )
                } else {
                    debug_assert_eq!( Some( curr ), parent );
                    debug_assert_eq!( self.parent( pred ), Some( node ));
                    self.node( node ).other_outer_child( pred )
                }
            }
        };
        match next {
            Some( n ) => {
                debug_assert_eq!( self.parent( n ), Some( node ));
                n
            }
            None => match parent {
                None => self.node( node ).other_outer_child( curr ).expect( "degenerate childless node" ),
                Some( p ) => p,
            }
        }
    }

    /// Steps `(pred, curr)` one position around `node`'s neighbors.
    pub fn proceed_to_next_neighbor( &self, node: NodeId, pred: &mut Option<NodeId>, curr: &mut NodeId ) {
        let next = self.next_neighbor( node, *pred, *curr );
        *pred = Some( *curr );
        *curr = next;
    }

    /// Whether `n1` and `n2` are adjacent in `node`'s cyclic neighbor
    /// order.
    pub(crate) fn are_neighbors_adjacent( &self, node: NodeId, n1: NodeId, n2: NodeId ) -> bool {
        debug_assert_ne!( n1, n2 );
        let parent = self.parent( node );
        if Some( n1 ) != parent && Some( n2 ) != parent {
            self.is_sibling_adjacent( n1, n2 )
                || ( self.is_detached( node )
                    && self.node( n1 ).is_outer_child()
                    && self.node( n2 ).is_outer_child() )
        } else if Some( n1 ) == parent {
            debug_assert_eq!( self.parent( n2 ), Some( node ));
            self.node( node ).is_child_outer( n2 )
        } else {
            debug_assert_eq!( self.parent( n1 ), Some( node ));
            self.node( node ).is_child_outer( n1 )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PCNodeType;

    #[test]
    fn append_and_detach() {
        let mut tree = PCTree::with_leaves( 4 );
        let root = tree.root().unwrap();
        let leaves = tree.leaves().to_vec();
        assert_eq!( tree.children( root ).collect::<Vec<_>>(), leaves );

        tree.detach( leaves[1] );
        assert_eq!( tree.child_count( root ), 3 );
        assert!( tree.is_detached( leaves[1] ));
        assert_eq!(
            tree.children( root ).collect::<Vec<_>>(),
            vec![ leaves[0], leaves[2], leaves[3] ]
        );

        tree.append_child_at( root, leaves[1], true );
        assert_eq!(
            tree.children( root ).collect::<Vec<_>>(),
            vec![ leaves[1], leaves[0], leaves[2], leaves[3] ]
        );
    }

    #[test]
    fn insert_between_adjacent_siblings() {
        let mut tree = PCTree::with_leaves( 3 );
        let root = tree.root().unwrap();
        let leaves = tree.leaves().to_vec();
        let extra = tree.new_node( PCNodeType::Leaf, None, None );
        tree.insert_between( extra, Some( leaves[0] ), Some( leaves[1] ));
        assert_eq!(
            tree.children( root ).collect::<Vec<_>>(),
            vec![ leaves[0], extra, leaves[1], leaves[2] ]
        );
        assert!( tree.check_valid() );
    }

    #[test]
    fn neighbor_walk_is_circular() {
        let tree = PCTree::with_leaves( 4 );
        let root = tree.root().unwrap();
        let leaves = tree.leaves().to_vec();
        // walk around a leaf: its single neighbor is the root
        assert_eq!( tree.next_neighbor( leaves[0], None, root ), root );
        // walk around the detached root: children wrap
        let mut pred = None;
        let mut curr = leaves[0];
        let mut seen = vec![ curr ];
        for _ in 0..3 {
            tree.proceed_to_next_neighbor( root, &mut pred, &mut curr );
            seen.push( curr );
        }
        assert_eq!( seen, leaves );
        tree.proceed_to_next_neighbor( root, &mut pred, &mut curr );
        assert_eq!( curr, leaves[0] );
    }

    #[test]
    fn merge_into_parent_splices_children() {
        let mut tree = PCTree::new();
        let root = tree.new_node( PCNodeType::CNode, None, None );
        let l0 = tree.new_node( PCNodeType::Leaf, Some( root ), None );
        let inner = tree.new_node( PCNodeType::CNode, Some( root ), None );
        let l1 = tree.new_node( PCNodeType::Leaf, Some( root ), None );
        let a = tree.new_node( PCNodeType::Leaf, Some( inner ), None );
        let b = tree.new_node( PCNodeType::Leaf, Some( inner ), None );

        tree.merge_into_parent( inner );
        assert_eq!( tree.children( root ).collect::<Vec<_>>(), vec![ l0, a, b, l1 ]);
        assert_eq!( tree.parent( a ), Some( root ));
        assert_eq!( tree.parent( b ), Some( root ));
        tree.destroy_node( inner );
        assert_eq!( tree.c_node_count(), 1 );
    }
}
