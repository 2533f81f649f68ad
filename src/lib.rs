// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # pctree
//!
//! A PC-tree compactly represents all cyclic permutations of a set of
//! *leaves* that are admissible under a growing collection of
//! *consecutivity restrictions*. PC-trees (and their rooted cousins, the
//! PQ-trees) are the combinatorial core of planarity testing,
//! interval-graph recognition and consecutive-ones testing.
//!
//! ## Quick start
//!
//! 1. Restricting a tree
//!
//! ```rust
//! use pctree::PCTree;
//!
//! let mut tree = PCTree::with_leaves( 8 );           // every cyclic order of 8 leaves
//! let leaves = tree.leaves().to_vec();
//! assert!(  tree.make_consecutive( &[ leaves[0], leaves[1] ]));
//! assert!(  tree.make_consecutive( &[ leaves[1], leaves[2] ]));
//! // 1 sits between 0 and 2 now, so these two cannot become neighbors
//! assert!( !tree.make_consecutive( &[ leaves[0], leaves[2] ]));
//! ```
//!
//! 2. Parsing, printing and counting
//!
//! ```rust
//! use pctree::PCTree;
//!
//! // `(..)` is a P-node (children freely permutable), `[..]` a C-node
//! // (circular child order fixed up to reversal)
//! let tree = PCTree::parse( "0:[1:(2,3,4), 5, 6:[7,8,9]]", true ).unwrap();
//! assert_eq!( tree.possible_orders(), 24u32.into() );
//! let reparsed = PCTree::parse( &tree.to_string(), true ).unwrap();
//! assert_eq!( reparsed.leaf_count(), 7 );
//! ```
//!
//! 3. Canonical fingerprints
//!
//! ```rust
//! use pctree::{PCTree,uid_utils};
//!
//! let mut a = PCTree::parse( "0:[1:(2,3,4), 5, 6:[7,8,9]]", true ).unwrap();
//! let mut b = PCTree::parse( "0:[6:[7,8,9], 5, 1:(4,3,2)]", true ).unwrap();
//! let fingerprint = |t: &mut PCTree| t.unique_id( uid_utils::leaf_to_id, uid_utils::compare_by_index );
//! // same admissible orders, written differently
//! assert_eq!( fingerprint( &mut a ), fingerprint( &mut b ));
//! ```
//!
//! ## Concepts
//!
//! The chief operation is [`PCTree::make_consecutive`]: it labels the tree
//! bottom-up from the restriction's leaves, finds the *terminal path* of
//! inner nodes carrying the restriction, and either splits the nodes along
//! that path into a single new *central* C-node or reports `false` and
//! leaves the tree untouched.
//!
//! Children of C-nodes do not point at their parent directly; all of them
//! share one union-find slot, so merging chains of C-nodes costs amortized
//! near-constant time per child. Every node carries a timestamped scratch
//! block for the labeling pass, invalidated wholesale by bumping the
//! tree's timestamp.
//!
//! Companion queries: [`PCTree::possible_orders`] counts the represented
//! orders, [`PCTree::unique_id`] produces a canonical fingerprint,
//! [`PCTree::get_restrictions`] enumerates a generating set of the
//! represented restrictions, [`PCTree::is_valid_order`] tests one order,
//! and [`PCTree::intersect`] intersects two trees' order sets.

pub(crate) mod rust;

mod array;
mod error;
mod intersect;
mod iter;
mod label;
mod node;
mod observer;
mod parse;
mod query;
mod terminal;
mod topology;
mod tree;
mod ufind;
mod update;

pub use crate::array::PCTreeNodeArray;
pub use crate::error::ParseError;
pub use crate::iter::{Children,Dfs,Neighbors};
pub use crate::node::{NodeId,NodeLabel,PCNodeType};
pub use crate::observer::{LoggingObserver,Observer,Stage};
pub use crate::query::uid_utils;
pub use crate::tree::PCTree;

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use rand::seq::SliceRandom;
    use rand::{Rng,SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn init_logging() {
        let _ = env_logger::builder().is_test( true ).try_init();
    }

    fn mc( tree: &mut PCTree, idx: &[usize] ) -> bool {
        let leaves: Vec<NodeId> = idx.iter().map( |&i| tree.leaves()[ i ] ).collect();
        tree.make_consecutive( &leaves )
    }

    fn uid( tree: &mut PCTree ) -> String {
        tree.unique_id( uid_utils::leaf_to_id, uid_utils::compare_by_index )
    }

    #[test]
    fn scenario_chained_pairs() {
        init_logging();
        let mut tree = PCTree::with_leaves( 10 );
        assert!(  mc( &mut tree, &[ 0, 1 ]));
        assert!(  mc( &mut tree, &[ 2, 3 ]));
        assert!(  mc( &mut tree, &[ 1, 2 ]));
        assert!(  mc( &mut tree, &[ 3, 4, 5 ]));
        assert!( !mc( &mut tree, &[ 1, 3 ]));

        // the oriented block [0,1,2,3] (2) times the {4,5} pair (2) times
        // the four free leaves (4!)
        assert_eq!( tree.possible_orders(), BigUint::from( 96u32 ));
        assert!( tree.check_valid() );

        // the canonical fingerprint survives a round trip through the
        // string form
        let fingerprint = uid( &mut tree );
        let mut reparsed = PCTree::parse( &tree.to_string(), true ).unwrap();
        assert_eq!( uid( &mut reparsed ), fingerprint );

        // and a witness order is admissible, forwards and backwards
        let order = tree.current_leaf_order();
        assert!( tree.is_valid_order( &order ));
        let back: Vec<NodeId> = order.iter().rev().copied().collect();
        assert!( tree.is_valid_order( &back ));
    }

    #[test]
    fn scenario_parsed_tree_restriction() {
        init_logging();
        let mut tree = PCTree::parse( "0:[1:(2,3,4), 5, 6:[7,8,9]]", true ).unwrap();
        assert_eq!( tree.possible_orders(), BigUint::from( 24u32 ));

        // leaves 2 and 3 are the first two registered leaves
        assert_eq!( tree.leaves()[0].index(), 2 );
        assert_eq!( tree.leaves()[1].index(), 3 );
        assert!( mc( &mut tree, &[ 0, 1 ]));

        let mut expected = PCTree::parse( "0:[1:(4, 10:(2,3)), 5, 6:[7,8,9]]", true ).unwrap();
        assert_eq!( uid( &mut tree ), uid( &mut expected ));
    }

    #[test]
    fn scenario_fifty_leaves() {
        init_logging();
        let mut tree = PCTree::with_leaves( 50 );
        let sequence: &[&[usize]] = &[
            &[ 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19 ],
            &[ 25, 26, 27, 28, 29, 30, 31, 32, 33, 34 ],
            &[ 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49 ],
            &[ 17, 42 ],
            &[ 5, 6, 7, 8, 9 ],
            &[ 11, 12, 13, 14 ],
            &[ 5, 6, 7, 8, 9, 10, 11, 12, 13, 14 ],
            &[ 8, 9 ],
            &[ 9, 10 ],
            &[ 10, 11 ],
            &[ 47, 48, 49, 36, 37, 38 ],
            &[ 47, 48 ],
            &[ 37, 38 ],
            &[ 36, 37, 38 ],
            &[ 47, 48, 49 ],
            &[ 49, 36 ],
            &[ 47, 32 ],
            &[ 34, 33, 25 ],
            &[ 34, 33, 32, 25 ],
            &[ 27, 33 ],
            &[ 12, 11, 10, 9, 8, 7, 6, 5, 4 ],
        ];
        for restriction in sequence {
            assert!( mc( &mut tree, restriction ), "restriction {:?} failed", restriction );
        }
        assert!( tree.check_valid() );
        let order = tree.current_leaf_order();
        assert!( tree.is_valid_order( &order ));
    }

    #[test]
    fn scenario_intersection_with_parsed_tree() {
        init_logging();
        let mut t1 = PCTree::with_leaves( 10 );
        let mut t2 = PCTree::parse( "0:(14:[15:(6,5), 4, 3, 2, 1], 10, 9, 8, 7)", true ).unwrap();
        assert_eq!( t2.leaf_count(), 10 );
        let mut mapping = PCTreeNodeArray::new( None );
        for i in 0..10 {
            mapping[ t2.leaves()[ i ] ] = Some( t1.leaves()[ i ]);
        }
        assert!( t1.intersect( &mut t2, &mapping ));

        // t1 started trivial, so it now represents exactly t2's orders:
        // the fingerprints match under the positional leaf mapping
        let rank1: HashMap<NodeId, usize> =
            t1.leaves().iter().enumerate().map( |( at, &l )| ( l, at )).collect();
        let rank2: HashMap<NodeId, usize> =
            t2.leaves().iter().enumerate().map( |( at, &l )| ( l, at )).collect();
        let uid1 = t1.unique_id( uid_utils::leaf_to_position, |a, b| rank1[ &a ].cmp( &rank1[ &b ]));
        let uid2 = t2.unique_id( uid_utils::leaf_to_position, |a, b| rank2[ &a ].cmp( &rank2[ &b ]));
        assert_eq!( uid1, uid2 );
        assert_eq!( t1.possible_orders(), t2.possible_orders() );
        assert!( t1.check_valid() );
    }

    // vertex-addition planarity test over an st-numbered biconnected
    // graph: the tree's leaves are the edges from the processed prefix
    // into the rest
    fn is_planar( n: usize, edges: &[( usize, usize )] ) -> bool {
        let mut out: Vec<Vec<usize>> = vec![ Vec::new(); n + 1 ];
        let mut inn: Vec<Vec<usize>> = vec![ Vec::new(); n + 1 ];
        for &( u, v ) in edges {
            let ( lo, hi ) = if u < v { ( u, v )} else { ( v, u )};
            out[ lo ].push( hi );
            inn[ hi ].push( lo );
        }
        assert!( out[1].len() > 2, "test graphs start with three tree edges" );
        let mut tree = PCTree::with_leaves( out[1].len() );
        let mut edge_leaf: HashMap<( usize, usize ), NodeId> = HashMap::new();
        for ( at, &hi ) in out[1].iter().enumerate() {
            edge_leaf.insert(( 1, hi ), tree.leaves()[ at ]);
        }
        for v in 2..n {
            let incoming: Vec<NodeId> = inn[ v ].iter().map( |&lo| edge_leaf[ &( lo, v ) ]).collect();
            if !tree.make_consecutive( &incoming ) {
                return false;
            }
            let merged = tree.merge_leaves( &incoming, true ).unwrap();
            match out[ v ].as_slice() {
                []       => panic!( "not an st-numbering: {} has no higher neighbor", v ),
                [ only ] => {
                    edge_leaf.insert(( v, *only ), merged );
                }
                many => {
                    let added = tree.replace_leaf( many.len(), merged );
                    for ( at, &hi ) in many.iter().enumerate() {
                        edge_leaf.insert(( v, hi ), added[ at ]);
                    }
                }
            }
        }
        true
    }

    fn complete_graph( n: usize ) -> Vec<( usize, usize )> {
        let mut edges = Vec::new();
        for u in 1..=n {
            for v in u + 1..=n {
                edges.push(( u, v ));
            }
        }
        edges
    }

    #[test]
    fn scenario_planarity() {
        init_logging();
        // K5 minus one edge is planar, K5 itself is not
        let k5 = complete_graph( 5 );
        let k5_minus: Vec<( usize, usize )> =
            k5.iter().copied().filter( |&e| e != ( 2, 3 )).collect();
        assert!(  is_planar( 5, &k5_minus ));
        assert!( !is_planar( 5, &k5 ));

        // K3,3 over {1,3,5} x {2,4,6}
        let k33: Vec<( usize, usize )> = vec![
            ( 1, 2 ), ( 1, 4 ), ( 1, 6 ),
            ( 3, 2 ), ( 3, 4 ), ( 3, 6 ),
            ( 5, 2 ), ( 5, 4 ), ( 5, 6 ),
        ];
        assert!( !is_planar( 6, &k33 ));

        // the octahedron triangulates the sphere; one more edge breaks it
        let mut octahedron = Vec::new();
        for u in 1..=6usize {
            for v in u + 1..=6 {
                if v - u != 3 {
                    octahedron.push(( u, v ));
                }
            }
        }
        assert_eq!( octahedron.len(), 12 );
        assert!( is_planar( 6, &octahedron ));
        let mut augmented = octahedron.clone();
        augmented.push(( 1, 4 ));
        assert!( !is_planar( 6, &augmented ));
    }

    fn random_restriction( rng: &mut ChaCha8Rng, leaf_count: usize ) -> Vec<usize> {
        let size = rng.gen_range( 2..=leaf_count / 2 );
        let mut idx: Vec<usize> = ( 0..leaf_count ).collect();
        idx.shuffle( rng );
        idx.truncate( size );
        idx
    }

    #[test]
    fn random_restrictions_keep_the_tree_sound() {
        init_logging();
        for seed in 0..6u64 {
            let mut rng = ChaCha8Rng::seed_from_u64( seed );
            let mut tree = PCTree::with_leaves( 12 );
            let mut orders = tree.possible_orders();
            for _ in 0..10 {
                let restriction = random_restriction( &mut rng, 12 );
                if mc( &mut tree, &restriction ) {
                    let now = tree.possible_orders();
                    assert!( now <= orders, "restrictions may only cut orders down" );
                    orders = now;
                } else {
                    assert_eq!( tree.possible_orders(), orders );
                }
                assert!( tree.check_valid() );
            }
            let order = tree.current_leaf_order();
            assert!( tree.is_valid_order( &order ));
        }
    }

    #[test]
    fn random_trees_regenerate_from_their_restrictions() {
        init_logging();
        for seed in 0..6u64 {
            let mut rng = ChaCha8Rng::seed_from_u64( 100 + seed );
            let mut tree = PCTree::with_leaves( 11 );
            for _ in 0..8 {
                let restriction = random_restriction( &mut rng, 11 );
                mc( &mut tree, &restriction );
            }
            let fingerprint = uid( &mut tree );

            let start = if rng.gen_bool( 0.5 ) {
                Some( tree.leaves()[ rng.gen_range( 0..11 ) ])
            } else {
                None
            };
            let mut restrictions = tree.get_restrictions( start );
            restrictions.shuffle( &mut rng );

            let mut regen = PCTree::new();
            let root = regen.new_node( PCNodeType::PNode, None, None );
            let mut mapping = PCTreeNodeArray::new( None );
            for &leaf in tree.leaves() {
                mapping[ leaf ] =
                    Some( regen.new_node( PCNodeType::Leaf, Some( root ), Some( leaf.index() )));
            }
            for restriction in restrictions {
                let mapped: Vec<NodeId> =
                    restriction.iter().map( |&l| mapping[ l ].unwrap() ).collect();
                assert!( regen.make_consecutive( &mapped ));
            }
            assert_eq!( uid( &mut regen ), fingerprint );
        }
    }

    #[test]
    fn random_pairwise_reduction_pins_one_order() {
        init_logging();
        for seed in 0..4u64 {
            let mut rng = ChaCha8Rng::seed_from_u64( 200 + seed );
            let mut tree = PCTree::with_leaves( 10 );
            for _ in 0..6 {
                let restriction = random_restriction( &mut rng, 10 );
                mc( &mut tree, &restriction );
            }
            let order = tree.current_leaf_order();
            assert!( tree.is_valid_order( &order ));

            // pinning every adjacent pair of a witness order leaves
            // exactly that order and its reflection
            let mut mapping = PCTreeNodeArray::new( None );
            let mut copy = PCTree::copy( &tree, &mut mapping, false );
            for pair in order.windows( 2 ) {
                let mapped = [ mapping[ pair[0] ].unwrap(), mapping[ pair[1] ].unwrap() ];
                assert!( copy.make_consecutive( &mapped ));
            }
            assert_eq!( copy.possible_orders(), BigUint::from( 2u32 ));
        }
    }

    #[test]
    fn copies_preserve_structure_and_indices() {
        init_logging();
        let mut tree = PCTree::with_leaves( 9 );
        assert!( mc( &mut tree, &[ 0, 1, 2 ]));
        assert!( mc( &mut tree, &[ 1, 2 ]));
        let mut mapping = PCTreeNodeArray::new( None );
        let mut copy = PCTree::copy( &tree, &mut mapping, true );
        for node in tree.nodes_dfs() {
            assert_eq!( mapping[ node ], Some( node ));
        }
        assert_eq!( uid( &mut copy ), uid( &mut tree ));
        assert!( copy.check_valid() );
    }

    #[test]
    fn boundary_restriction_sizes() {
        init_logging();
        let mut tree = PCTree::with_leaves( 7 );
        assert!( mc( &mut tree, &[ 1, 2, 3 ]));
        let fingerprint = uid( &mut tree );
        let all: Vec<NodeId> = tree.leaves().to_vec();
        assert!( tree.make_consecutive( &[] ));
        assert!( tree.make_consecutive( &all[..1] ));
        assert!( tree.make_consecutive( &all[..6] ));
        assert!( tree.make_consecutive( &all ));
        assert_eq!( uid( &mut tree ), fingerprint );
        assert_eq!( tree.inner_node_count(), 2 );
    }
}
