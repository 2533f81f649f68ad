//! Queries: triviality, order counting, canonical form, represented
//! restrictions, order validation and structural audit.

use crate::rust::*;

use crate::array::PCTreeNodeArray;
use crate::node::{NodeId,PCNodeType};
use crate::tree::PCTree;

use num_bigint::BigUint;

/// Printers and comparators for [`PCTree::unique_id`].
pub mod uid_utils {
    use crate::rust::*;
    use crate::node::NodeId;
    use crate::tree::PCTree;

    /// Prints every node as its index, inner nodes with a trailing colon.
    pub fn node_to_id( out: &mut String, tree: &PCTree, node: NodeId, _pos: usize ) {
        let _ = write!( out, "{}", node.index() );
        if !tree.is_leaf( node ) {
            out.push( ':' );
        }
    }

    /// Prints every node as its canonical position.
    pub fn node_to_position( out: &mut String, tree: &PCTree, node: NodeId, pos: usize ) {
        let _ = write!( out, "{}", pos );
        if !tree.is_leaf( node ) {
            out.push( ':' );
        }
    }

    /// Prints leaves as their index, inner nodes anonymously.
    pub fn leaf_to_id( out: &mut String, tree: &PCTree, node: NodeId, _pos: usize ) {
        if tree.is_leaf( node ) {
            let _ = write!( out, "{}", node.index() );
        }
    }

    /// Prints leaves as their canonical position, inner nodes anonymously.
    pub fn leaf_to_position( out: &mut String, tree: &PCTree, node: NodeId, pos: usize ) {
        if tree.is_leaf( node ) {
            let _ = write!( out, "{}", pos );
        }
    }

    pub fn compare_by_index( a: NodeId, b: NodeId ) -> Ordering {
        a.index().cmp( &b.index() )
    }
}

enum UidItem {
    Node( NodeId ),
    Text( &'static str ),
}

impl PCTree {
    /// True iff the tree is one P-node with all leaves as children,
    /// representing every cyclic order. An empty tree counts as trivial.
    pub fn is_trivial( &self ) -> bool {
        match self.root {
            None => true,
            Some( root ) => {
                self.node_type( root ) == PCNodeType::PNode
                    && self.child_count( root ) == self.leaf_count()
            }
        }
    }

    /// Number of distinct admissible cyclic orders: every C-node
    /// contributes its reversal, every P-node the permutations of its
    /// children (circular shifts discounted at the root).
    pub fn possible_orders( &self ) -> BigUint {
        let mut orders = BigUint::from( 1u32 );
        for node in self.inner_nodes() {
            if self.node_type( node ) == PCNodeType::CNode {
                orders *= 2u32;
            } else {
                let mut children = self.child_count( node );
                if Some( node ) == self.root {
                    children -= 1;
                }
                orders *= factorial( children );
            }
        }
        orders
    }

    /// Counts of P-nodes and C-nodes together with their degree sums.
    pub fn node_stats( &self ) -> ( usize, usize, usize, usize ) {
        let ( mut p_nodes, mut c_nodes, mut sum_p_deg, mut sum_c_deg ) = ( 0, 0, 0, 0 );
        for node in self.inner_nodes() {
            if self.node_type( node ) == PCNodeType::PNode {
                p_nodes += 1;
                sum_p_deg += self.degree( node );
            } else {
                c_nodes += 1;
                sum_c_deg += self.degree( node );
            }
        }
        ( p_nodes, c_nodes, sum_p_deg, sum_c_deg )
    }

    /// The leaves in one admissible cyclic order.
    pub fn current_leaf_order( &self ) -> Vec<NodeId> {
        let mut order = Vec::with_capacity( self.leaf_count() );
        for node in self.nodes_dfs() {
            if self.is_leaf( node ) {
                order.push( node );
            }
        }
        order
    }

    /// Whether the given cyclic order of all leaves is admissible.
    pub fn is_valid_order( &self, order: &[NodeId] ) -> bool {
        debug_assert_eq!( order.len(), self.leaf_count() );
        let mut mapping = PCTreeNodeArray::new( None );
        let mut copy = PCTree::copy( self, &mut mapping, false );
        let mut previous: Option<NodeId> = None;
        for &node in order {
            if let Some( prev ) = previous {
                let pair = [ mapping[ prev ].unwrap(), mapping[ node ].unwrap() ];
                if !copy.make_consecutive( &pair ) {
                    return false;
                }
            }
            previous = Some( node );
        }
        true
    }

    /// Canonical fingerprint: two trees over the same leaf set represent
    /// the same set of cyclic orders iff their strings are equal under the
    /// same printer and comparator. The tree is read off rooted towards
    /// the comparator's greatest leaf, children canonically ordered;
    /// C-nodes print as `[..]`, P-nodes as `(..)` (degree-3 P-nodes as
    /// `[..]`, they fix their circular order just like a C-node).
    pub fn unique_id<P, C>( &mut self, mut print_node: P, mut compare_leaves: C ) -> String
    where
        P: FnMut( &mut String, &PCTree, NodeId, usize ),
        C: FnMut( NodeId, NodeId ) -> Ordering,
    {
        if self.root.is_none() {
            return "empty".to_string();
        }
        let mut sorted = self.leaves.clone();
        sorted.sort_by( |&a, &b| compare_leaves( a, b ));

        let mut order: Vec<usize> = vec![ usize::max_value(); self.node_bound() ];
        let mut position = 0;
        for &leaf in &sorted {
            order[ leaf.index() ] = position;
            position += 1;
        }
        let last_leaf = sorted.pop().unwrap();

        let mut full_order: Vec<NodeId> = Vec::new();
        self.stamp = self.stamp.wrapping_add( 1 );
        self.assign_labels( &sorted, Some( &mut full_order ));
        for &node in &full_order {
            order[ node.index() ] = position;
            position += 1;
        }
        let top = *full_order.last().expect( "tree without inner nodes" );

        let mut out = String::new();
        let mut stack = vec![ UidItem::Node( top ) ];
        while let Some( item ) = stack.pop() {
            let node = match item {
                UidItem::Text( text ) => {
                    out.push_str( text );
                    continue;
                }
                UidItem::Node( node ) => node,
            };
            let mut children: VecDeque<NodeId>;
            match self.node_type( node ) {
                PCNodeType::Leaf => {
                    print_node( &mut out, self, node, order[ node.index() ]);
                    continue;
                }
                PCNodeType::CNode => {
                    print_node( &mut out, self, node, order[ node.index() ]);
                    out.push( '[' );
                    stack.push( UidItem::Text( "]" ));
                    if node == top {
                        // all neighbors, rotated to the least, oriented so
                        // the second beats the last
                        children = self.neighbors( node, None ).collect();
                        let min_at = ( 0..children.len() )
                            .min_by_key( |&at| order[ children[ at ].index() ])
                            .unwrap();
                        children.rotate_left( min_at );
                        let second = children[ 1 ];
                        let back = children[ children.len() - 1 ];
                        if order[ second.index() ] > order[ back.index() ] {
                            let front = children.pop_front().unwrap();
                            children.push_back( front );
                            children = children.into_iter().rev().collect();
                        }
                        debug_assert!(
                            order[ children[ 1 ].index() ] < order[ children[ children.len() - 1 ].index() ]
                        );
                    } else {
                        // enter through the neighbor ordered above this
                        // node and walk towards the smaller side
                        let mut informed = None;
                        for neigh in self.neighbors( node, None ) {
                            if order[ neigh.index() ] > order[ node.index() ] {
                                debug_assert!( informed.is_none() );
                                informed = Some( neigh );
                            }
                        }
                        let informed = informed.expect( "inner node without ordered entry" );
                        let mut neigh1 = self.next_neighbor( node, None, informed );
                        let neigh2 = self.next_neighbor( node, Some( neigh1 ), informed );
                        if order[ neigh2.index() ] < order[ neigh1.index() ] {
                            neigh1 = neigh2;
                        }
                        children = VecDeque::new();
                        let mut pred = Some( informed );
                        let mut curr = neigh1;
                        while curr != informed {
                            children.push_back( curr );
                            self.proceed_to_next_neighbor( node, &mut pred, &mut curr );
                        }
                    }
                }
                PCNodeType::PNode => {
                    print_node( &mut out, self, node, order[ node.index() ]);
                    if self.degree( node ) <= 3 {
                        out.push( '[' );
                        stack.push( UidItem::Text( "]" ));
                    } else {
                        out.push( '(' );
                        stack.push( UidItem::Text( ")" ));
                    }
                    children = self.full_neighbors_ref( node ).iter().copied().collect();
                    if node == top {
                        children.push_back( last_leaf );
                    }
                    let mut sortable: Vec<NodeId> = children.into_iter().collect();
                    sortable.sort_by_key( |n| order[ n.index() ]);
                    children = sortable.into();
                }
            }
            if node == top {
                debug_assert_eq!( children.len(), self.degree( node ));
            } else {
                debug_assert_eq!( children.len(), self.full_neighbors_ref( node ).len() );
            }
            for at in ( 0..children.len() ).rev() {
                stack.push( UidItem::Node( children[ at ]));
                if at > 0 {
                    stack.push( UidItem::Text( ", " ));
                }
            }
        }
        out
    }

    pub(crate) fn full_neighbors_ref( &self, n: NodeId ) -> &[NodeId] {
        let node = self.node( n );
        debug_assert_eq!( node.stamp, self.stamp );
        &node.temp.full_neighbors
    }

    /// A minimal generating set of the represented restrictions: the
    /// leaf set under every P-node child subtree, and the union of every
    /// adjacent pair of child subtrees around each C-node. Trivial
    /// restrictions are omitted. With `start_leaf` the collection runs
    /// rooted towards that leaf.
    pub fn get_restrictions( &self, start_leaf: Option<NodeId> ) -> Vec<Vec<NodeId>> {
        let mut restrictions = Vec::new();
        let mut ready = vec![ 0usize; self.node_bound() ];
        let mut subtree: Vec<Vec<NodeId>> = vec![ Vec::new(); self.node_bound() ];
        let mut todo: VecDeque<NodeId> = VecDeque::new();

        for &leaf in &self.leaves {
            if Some( leaf ) == start_leaf {
                continue;
            }
            subtree[ leaf.index() ].push( leaf );
            let parent = self.parent( leaf ).expect( "leaf without parent" );
            ready[ parent.index() ] += 1;
            if ready[ parent.index() ] == self.degree( parent ) - 1 {
                todo.push_back( parent );
            }
        }

        while let Some( node ) = todo.pop_front() {
            debug_assert!( Some( node ) != start_leaf );
            let mut next = None;
            if let Some( p ) = self.parent( node ) {
                if subtree[ p.index() ].is_empty() {
                    next = Some( p );
                }
            }
            if next.is_none() {
                for neigh in self.neighbors( node, None ) {
                    if subtree[ neigh.index() ].is_empty() {
                        next = Some( neigh );
                        break;
                    }
                }
            }
            // `next` stays None only for the central node, where every
            // direction has been collected

            let neighbors: Vec<NodeId> = self.neighbors( node, next ).collect();
            let mut pred: Option<NodeId> = None;
            for &curr in &neighbors {
                if Some( curr ) == next {
                    continue;
                }
                debug_assert!( !subtree[ curr.index() ].is_empty() );
                if self.node_type( node ) == PCNodeType::CNode {
                    if let Some( pred ) = pred {
                        let size = subtree[ pred.index() ].len() + subtree[ curr.index() ].len();
                        if !self.is_trivial_restriction( size ) {
                            let mut restriction = Vec::with_capacity( size );
                            restriction.extend_from_slice( &subtree[ pred.index() ]);
                            restriction.extend_from_slice( &subtree[ curr.index() ]);
                            restrictions.push( restriction );
                        }
                    }
                }
                if let Some( pred ) = pred {
                    let moved = mem::take( &mut subtree[ pred.index() ]);
                    subtree[ node.index() ].extend( moved );
                }
                pred = Some( curr );
            }
            if pred != next {
                if let Some( pred ) = pred {
                    let moved = mem::take( &mut subtree[ pred.index() ]);
                    subtree[ node.index() ].extend( moved );
                }
            }

            if self.node_type( node ) == PCNodeType::PNode
                && !self.is_trivial_restriction( subtree[ node.index() ].len() )
            {
                restrictions.push( subtree[ node.index() ].clone() );
            }

            if let Some( next ) = next {
                ready[ next.index() ] += 1;
                if ready[ next.index() ] == self.degree( next ) - 1 && Some( next ) != start_leaf {
                    todo.push_back( next );
                }
            }
        }
        restrictions
    }

    /// Audits every structural invariant; `true` iff the tree is sound.
    pub fn check_valid( &self ) -> bool {
        if self.leaf_count() <= 2 {
            return false;
        }
        let root = match self.root {
            Some( root ) => root,
            None         => return false,
        };
        for ( at, &leaf ) in self.leaves.iter().enumerate() {
            if !self.is_leaf( leaf ) || self.node( leaf ).list_index != at {
                return false;
            }
        }

        let mut todo: VecDeque<NodeId> = self.leaves.iter().copied().collect();
        let last_leaf = *self.leaves.last().unwrap();
        let mut seen = vec![ false; self.node_bound() ];
        let mut leaves_done = false;
        let mut root_found = false;
        let ( mut leaves_found, mut p_found, mut c_found ) = ( 0usize, 0usize, 0usize );

        while let Some( node ) = todo.pop_front() {
            if seen[ node.index() ] {
                if node == last_leaf {
                    leaves_done = true;
                }
                continue;
            }
            seen[ node.index() ] = true;
            let parent = self.parent( node );
            if ( node == root ) != parent.is_none() {
                return false;
            }
            if node == root {
                let shaped = if self.is_leaf( root ) {
                    self.child_count( root ) == 1
                } else {
                    self.child_count( root ) >= 3
                };
                if !shaped {
                    return false;
                }
                root_found = true;
            } else {
                todo.push_back( parent.unwrap() );
            }

            if leaves_done == self.is_leaf( node ) && node != root {
                return false;
            }
            match self.node_type( node ) {
                PCNodeType::Leaf => leaves_found += 1,
                PCNodeType::PNode => {
                    if self.child_count( node ) < 2 {
                        return false;
                    }
                    p_found += 1;
                }
                PCNodeType::CNode => {
                    if self.child_count( node ) < 2 {
                        return false;
                    }
                    c_found += 1;
                }
            }

            // siblings know this node, or the parent holds it as outer child
            let ( sib1, sib2 ) = {
                let n = self.node( node );
                ( n.sib1, n.sib2 )
            };
            for &sib in [ sib1, sib2 ].iter() {
                match sib {
                    Some( s ) => {
                        if !self.is_sibling_adjacent( s, node ) || self.parent( s ) != parent {
                            return false;
                        }
                    }
                    None => {
                        if let Some( p ) = parent {
                            if !self.node( p ).is_child_outer( node ) {
                                return false;
                            }
                        }
                    }
                }
            }

            // children know this node, and the count is right
            let slot = self.node( node ).list_index;
            let mut pred = None;
            let mut curr = self.node( node ).child1;
            let mut children = 0;
            while let Some( c ) = curr {
                if self.parent( c ) != Some( node ) {
                    return false;
                }
                let child = self.node( c );
                if self.node_type( node ) == PCNodeType::CNode {
                    if child.parent_p.is_some() {
                        return false;
                    }
                    if self.parents.find( child.parent_c.get().unwrap() ) != slot {
                        return false;
                    }
                } else if child.parent_p != Some( node ) || child.parent_c.get().is_some() {
                    return false;
                }
                children += 1;
                let step = self.node( c ).next_sibling( pred );
                pred = Some( c );
                curr = step;
            }
            if children != self.child_count( node ) || pred != self.node( node ).child2 {
                return false;
            }

            if node == last_leaf {
                leaves_done = true;
            }
        }

        if !leaves_done || !root_found || leaves_found != self.leaf_count() {
            return false;
        }
        if p_found != self.p_node_count || c_found != self.c_node_count {
            return false;
        }

        // the C-node registry agrees with the union-find
        let mut c_live = 0;
        for ( slot, entry ) in self.c_nodes.iter().enumerate() {
            if let Some( n ) = *entry {
                if self.parents.find( slot ) != slot {
                    return false;
                }
                if !seen[ n.index() ] || self.node( n ).list_index != slot {
                    return false;
                }
                c_live += 1;
            }
        }
        c_live == self.c_node_count
    }
}

fn factorial( n: usize ) -> BigUint {
    let mut product = BigUint::from( 1u32 );
    for k in 2..=n {
        product *= k;
    }
    product
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid( tree: &mut PCTree ) -> String {
        tree.unique_id( uid_utils::leaf_to_id, uid_utils::compare_by_index )
    }

    fn mc( tree: &mut PCTree, idx: &[usize] ) -> bool {
        let leaves: Vec<NodeId> = idx.iter().map( |&i| tree.leaves()[ i ] ).collect();
        tree.make_consecutive( &leaves )
    }

    #[test]
    fn trivial_orders_are_factorial() {
        let tree = PCTree::with_leaves( 6 );
        assert!( tree.is_trivial() );
        assert_eq!( tree.possible_orders(), BigUint::from( 120u32 ));
    }

    #[test]
    fn parsed_tree_orders() {
        let tree = PCTree::parse( "0:[1:(2,3,4), 5, 6:[7,8,9]]", true ).unwrap();
        assert!( !tree.is_trivial() );
        assert_eq!( tree.possible_orders(), BigUint::from( 24u32 ));
        let ( p_nodes, c_nodes, sum_p_deg, sum_c_deg ) = tree.node_stats();
        assert_eq!(( p_nodes, c_nodes ), ( 1, 2 ));
        assert_eq!( sum_p_deg, 4 );
        assert_eq!( sum_c_deg, 3 + 4 );
    }

    #[test]
    fn unique_id_detects_equivalence() {
        let mut a = PCTree::parse( "0:[1:(2,3,4), 5, 6:[7,8,9]]", true ).unwrap();
        // same orders written with the C-root reversed and rotated
        let mut b = PCTree::parse( "0:[6:[7,8,9], 5, 1:(4,3,2)]", true ).unwrap();
        assert_eq!( uid( &mut a ), uid( &mut b ));
        // breaking the inner C order changes the fingerprint
        let mut c = PCTree::parse( "0:[1:(2,3,4), 5, 6:[7,9,8]]", true ).unwrap();
        assert_ne!( uid( &mut a ), uid( &mut c ));
    }

    #[test]
    fn current_leaf_order_is_valid() {
        let mut tree = PCTree::with_leaves( 9 );
        assert!( mc( &mut tree, &[ 0, 1, 2 ]));
        assert!( mc( &mut tree, &[ 3, 4, 5 ]));
        assert!( mc( &mut tree, &[ 0, 1 ]));
        assert!( mc( &mut tree, &[ 1, 2 ]));
        assert!( mc( &mut tree, &[ 0, 1, 2, 3 ]));
        let order = tree.current_leaf_order();
        assert_eq!( order.len(), 9 );
        assert!( tree.is_valid_order( &order ));
        let reversed: Vec<NodeId> = order.iter().rev().copied().collect();
        assert!( tree.is_valid_order( &reversed ));
    }

    #[test]
    fn order_validity_matches_restrictions() {
        let mut tree = PCTree::with_leaves( 9 );
        assert!( mc( &mut tree, &[ 0, 1, 2 ]));
        assert!( mc( &mut tree, &[ 3, 4, 5 ]));
        assert!( mc( &mut tree, &[ 0, 1 ]));
        assert!( mc( &mut tree, &[ 1, 2 ]));
        assert!( mc( &mut tree, &[ 0, 1, 2, 3 ]));
        let mut order = tree.leaves().to_vec();
        assert!( tree.is_valid_order( &order ));
        order.reverse();
        assert!( tree.is_valid_order( &order ));
        let mut swapped = tree.leaves().to_vec();
        swapped.swap( 2, 3 );
        assert!( !tree.is_valid_order( &swapped ));
    }

    #[test]
    fn restrictions_regenerate_the_tree() {
        let mut tree = PCTree::with_leaves( 10 );
        assert!( mc( &mut tree, &[ 0, 1 ]));
        assert!( mc( &mut tree, &[ 2, 3 ]));
        assert!( mc( &mut tree, &[ 1, 2 ]));
        assert!( mc( &mut tree, &[ 3, 4, 5 ]));
        let fingerprint = uid( &mut tree );

        let restrictions = tree.get_restrictions( None );
        let mut regen = PCTree::new();
        let regen_root = regen.new_node( PCNodeType::PNode, None, None );
        let mut mapping = PCTreeNodeArray::new( None );
        for &leaf in tree.leaves() {
            mapping[ leaf ] = Some( regen.new_node( PCNodeType::Leaf, Some( regen_root ), Some( leaf.index() )));
        }
        for restriction in restrictions {
            let mapped: Vec<NodeId> = restriction.iter().map( |&l| mapping[ l ].unwrap() ).collect();
            assert!( regen.make_consecutive( &mapped ));
        }
        assert_eq!( uid( &mut regen ), fingerprint );
    }

    #[test]
    fn check_valid_spots_leaf_list_corruption() {
        let mut tree = PCTree::with_leaves( 4 );
        assert!( tree.check_valid() );
        tree.leaves.swap( 0, 1 );
        assert!( !tree.check_valid() );
    }
}
