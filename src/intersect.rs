//! Intersection of two trees' represented order sets.

use crate::rust::*;

use crate::array::PCTreeNodeArray;
use crate::node::{NodeId,NodeLabel,PCNodeType};
use crate::tree::PCTree;

use log::trace;

impl PCTree {
    /// Restricts `self` to exactly the cyclic orders admissible in both
    /// `self` and `other`, reading `other`'s leaves through `mapping`.
    /// Returns `false` if the two trees admit no common order. `other` is
    /// only labeled, never restructured.
    ///
    /// The replay walks `other` bottom-up; every inner node contributes
    /// the restriction of its collected leaves (C-nodes additionally pin
    /// each adjacent pair of child subtrees). Whenever a restricted
    /// region of `self` hangs from a single root it is swapped out for a
    /// placeholder leaf, so later restrictions handle one leaf instead of
    /// the region; the subtrees are spliced back in afterwards.
    pub fn intersect( &mut self, other: &mut PCTree, mapping: &PCTreeNodeArray<Option<NodeId>> ) -> bool {
        debug_assert_eq!( self.leaf_count(), other.leaf_count() );
        if other.is_trivial() {
            return true;
        }
        let old_leaves = self.leaves.clone();
        let mut stash: Vec<( NodeId, NodeId )> = Vec::new();
        let possible = self.apply_restrictions_of( other, mapping, &mut stash );
        self.restore_subtrees( stash, old_leaves );
        possible
    }

    fn apply_restrictions_of(
        &mut self,
        other: &mut PCTree,
        mapping: &PCTreeNodeArray<Option<NodeId>>,
        stash: &mut Vec<( NodeId, NodeId )>,
    ) -> bool {
        let excluded = *other.leaves.last().unwrap();
        let label_leaves: Vec<NodeId> = other.leaves[ ..other.leaves.len() - 1 ].to_vec();
        let mut full_order = Vec::new();
        other.stamp = other.stamp.wrapping_add( 1 );
        other.assign_labels( &label_leaves, Some( &mut full_order ));

        // mapped leaves of `self` collected per node of `other`
        let mut subtree: Vec<Vec<NodeId>> = vec![ Vec::new(); other.node_bound() ];
        for &leaf in &label_leaves {
            let mapped = mapping[ leaf ].expect( "intersection with unmapped leaf" );
            subtree[ leaf.index() ].push( mapped );
        }

        for &node in &full_order {
            // the one neighbor with nothing collected points away from here
            let mut up = None;
            for neigh in other.neighbors( node, None ) {
                if subtree[ neigh.index() ].is_empty() {
                    up = Some( neigh );
                    break;
                }
            }
            let up = up.expect( "full node without an upward direction" );
            let children: Vec<NodeId> = other
                .neighbors( node, Some( up ))
                .filter( |&n| n != up )
                .collect();

            if other.node_type( node ) == PCNodeType::CNode {
                for pair in children.windows( 2 ) {
                    let mut restriction = subtree[ pair[0].index() ].clone();
                    restriction.extend_from_slice( &subtree[ pair[1].index() ]);
                    if !self.make_consecutive( &restriction ) {
                        trace!( "intersection failed pinning a C-node pair of {}", node );
                        return false;
                    }
                }
            }

            let mut union_all = Vec::new();
            for &child in &children {
                union_all.extend_from_slice( &subtree[ child.index() ]);
            }
            if !self.make_consecutive( &union_all ) {
                trace!( "intersection failed on the subtree of {}", node );
                return false;
            }

            subtree[ node.index() ] = match self.merge_region( &union_all, stash ) {
                Some( placeholder ) => vec![ placeholder ],
                None                => union_all,
            };
        }

        // around the topmost node the excluded direction still needs its
        // circular position pinned
        let top = *full_order.last().unwrap();
        if other.node_type( top ) == PCNodeType::CNode {
            let up = if other.parent( excluded ) == Some( top ) {
                excluded
            } else {
                other.parent( top ).expect( "topmost node with no route to the excluded leaf" )
            };
            let around: Vec<NodeId> = other
                .neighbors( top, Some( up ))
                .filter( |&n| n != up )
                .collect();
            for pair in around.windows( 2 ) {
                let mut restriction = subtree[ pair[0].index() ].clone();
                restriction.extend_from_slice( &subtree[ pair[1].index() ]);
                if !self.make_consecutive( &restriction ) {
                    trace!( "intersection failed pinning the top C-node {}", top );
                    return false;
                }
            }
        }
        true
    }

    /// After a successful restriction, splices the region covering
    /// exactly `region` out of the tree if it hangs from a single full
    /// root, standing a fresh placeholder leaf in for it.
    fn merge_region( &mut self, region: &[NodeId], stash: &mut Vec<( NodeId, NodeId )> ) -> Option<NodeId> {
        if region.len() < 2 || self.is_trivial_restriction( region.len() ) {
            return None;
        }
        // the labels of the restriction just applied are still current
        let mut top = region[0];
        while let Some( parent ) = self.parent( top ) {
            if self.label( parent ) != NodeLabel::Full {
                break;
            }
            top = parent;
        }
        if self.subtree_leaf_count( top ) != region.len() {
            // a multi-root block inside the central node; leave it in place
            return None;
        }
        let placeholder = self.new_node( PCNodeType::Leaf, None, None );
        self.replace_with( top, placeholder );
        for &leaf in region {
            self.remove_leaf_from_list( leaf );
        }
        stash.push(( placeholder, top ));
        Some( placeholder )
    }

    fn subtree_leaf_count( &self, top: NodeId ) -> usize {
        let mut count = 0;
        let mut stack = vec![ top ];
        while let Some( node ) = stack.pop() {
            if self.is_leaf( node ) {
                count += 1;
            } else {
                stack.extend( self.children( node ));
            }
        }
        count
    }

    /// Splices the stashed subtrees back in for their placeholders, most
    /// recent first, and reinstates the leaf list.
    fn restore_subtrees( &mut self, stash: Vec<( NodeId, NodeId )>, old_leaves: Vec<NodeId> ) {
        for &( placeholder, top ) in stash.iter().rev() {
            self.replace_with( placeholder, top );
        }
        // placeholders swallowed by later merges already left the leaf
        // list; resetting it wholesale retires the rest, so the detached
        // placeholder slots just stay dead
        self.leaves = old_leaves;
        for at in 0..self.leaves.len() {
            let leaf = self.leaves[ at ];
            self.node_mut( leaf ).list_index = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::uid_utils;

    fn apply( tree: &mut PCTree, restrictions: &[&[usize]] ) -> bool {
        for idx in restrictions {
            let leaves: Vec<NodeId> = idx.iter().map( |&i| tree.leaves()[ i ] ).collect();
            if !tree.make_consecutive( &leaves ) {
                return false;
            }
        }
        true
    }

    fn uid( tree: &mut PCTree ) -> String {
        tree.unique_id( uid_utils::leaf_to_id, uid_utils::compare_by_index )
    }

    fn test_intersection( leaf_count: usize, r1: &[&[usize]], r2: &[&[usize]] ) {
        let mut t1 = PCTree::with_leaves( leaf_count );
        let mut t2 = PCTree::with_leaves( leaf_count );
        let mut mapping = PCTreeNodeArray::new( None );
        for i in 0..leaf_count {
            mapping[ t2.leaves()[ i ] ] = Some( t1.leaves()[ i ]);
        }
        assert!( apply( &mut t1, r1 ));
        assert!( apply( &mut t2, r2 ));

        let mut check = PCTree::with_leaves( leaf_count );
        assert!( apply( &mut check, r1 ));
        let possible_check = apply( &mut check, r2 );

        let possible = t1.intersect( &mut t2, &mapping );
        assert_eq!( possible, possible_check );
        if possible_check {
            assert_eq!( uid( &mut t1 ), uid( &mut check ));
        }
    }

    #[test]
    fn trivial_other_changes_nothing() {
        test_intersection( 10, &[ &[ 0, 1, 2 ]], &[] );
    }

    #[test]
    fn trivial_self_takes_other() {
        test_intersection( 10, &[], &[ &[ 0, 1, 2 ]]);
    }

    #[test]
    fn p_nodes_only() {
        test_intersection( 10, &[ &[ 3, 4, 5 ]], &[ &[ 0, 1, 2 ], &[ 6, 7, 8 ]]);
    }

    #[test]
    fn simple_with_c_node() {
        test_intersection( 10, &[ &[ 2, 3, 4 ]], &[ &[ 0, 1, 2 ], &[ 5, 6, 7 ], &[ 7, 8, 9 ]]);
    }

    #[test]
    fn single_c_node() {
        test_intersection(
            5,
            &[ &[ 1, 2, 3 ]],
            &[ &[ 0, 1 ], &[ 1, 2 ], &[ 2, 3 ], &[ 3, 4 ], &[ 4, 0 ]],
        );
    }

    #[test]
    fn complicated_intersection() {
        test_intersection(
            20,
            &[ &[ 11, 12, 13, 14 ], &[ 0, 8 ], &[ 14, 9 ]],
            &[
                &[ 0, 1 ], &[ 1, 2 ], &[ 2, 3 ],
                &[ 6, 7, 8, 9, 10 ],
                &[ 11, 12 ], &[ 12, 13 ], &[ 13, 14 ],
                &[ 15, 16 ], &[ 16, 17 ], &[ 17, 18 ],
            ],
        );
    }

    #[test]
    fn impossible_intersection() {
        test_intersection( 10, &[ &[ 0, 1 ], &[ 1, 2 ], &[ 2, 3 ]], &[ &[ 0, 2 ]]);
    }
}
