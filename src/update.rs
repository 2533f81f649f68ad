//! The update step: splitting the terminal path into a new central C-node.

use crate::rust::*;

use crate::node::{NodeId,NodeLabel,PCNodeType};
use crate::observer::Stage;
use crate::tree::PCTree;

use log::trace;

impl PCTree {
    /// Sharpens the tree so that `restriction`'s leaves are consecutive in
    /// every admissible order, or returns `false` without structural
    /// change if that contradicts an earlier restriction.
    ///
    /// # Examples
    ///
    /// ```
    /// use pctree::PCTree;
    ///
    /// let mut tree = PCTree::with_leaves( 5 );
    /// let l = tree.leaves().to_vec();
    /// assert!(  tree.make_consecutive( &[ l[0], l[1] ]));
    /// assert!(  tree.make_consecutive( &[ l[3], l[4] ]));
    /// assert!(  tree.make_consecutive( &[ l[1], l[2], l[3] ]));
    /// assert!( !tree.make_consecutive( &[ l[0], l[3] ]));
    /// ```
    pub fn make_consecutive( &mut self, restriction: &[NodeId] ) -> bool {
        self.notify( |obs, tree| obs.on_called( tree, restriction ));
        self.stamp = self.stamp.wrapping_add( 1 );
        self.first_partial = None;
        self.last_partial = None;
        self.partial_count = 0;
        self.apex_candidate = None;
        self.apex_fix = false;
        self.apex_tp_pred2 = None;
        self.terminal_path_length = 0;

        if self.is_trivial_restriction( restriction.len() ) {
            debug_assert!( restriction.iter().all( |&l| self.is_leaf( l )));
            self.notify( |obs, tree| obs.on_done( tree, Stage::Trivial, true ));
            return true;
        }

        self.assign_labels( restriction, None );
        if self.first_partial.is_none() {
            debug_assert!( self.last_partial.is_none() );
            debug_assert_eq!( self.partial_count, 0 );
            self.notify( |obs, tree| obs.on_done( tree, Stage::NoPartials, true ));
            return true;
        }
        {
            let ( first, last, count ) = ( self.first_partial, self.last_partial, self.partial_count );
            self.notify( |obs, tree| obs.on_labels_assigned( tree, first, last, count ));
        }

        if !self.find_terminal_path() {
            self.notify( |obs, tree| obs.on_done( tree, Stage::InvalidPath, false ));
            return false;
        }
        debug_assert!( self.apex_fix );
        let apex = self.apex_candidate.expect( "feasible path without apex" );
        {
            let ( second, length ) = ( self.apex_tp_pred2, self.terminal_path_length );
            self.notify( |obs, tree| obs.on_terminal_path_found( tree, apex, second, length ));
        }

        if self.terminal_path_length == 1 {
            debug_assert!( self.scratch( apex ).tp_pred.is_none() );
            self.update_singleton_terminal_path();
            self.notify( |obs, tree| obs.on_done( tree, Stage::Singleton, true ));
            return true;
        }
        debug_assert!( self.scratch( apex ).tp_pred.is_some() );

        let central = self.create_central_node();
        self.notify( |obs, tree| obs.on_central_created( tree, central ));

        let start = self.scratch( central ).tp_pred;
        let mut merged = self.update_terminal_path( central, start );
        if let Some( second ) = self.apex_tp_pred2 {
            merged += self.update_terminal_path( central, Some( second ));
        }
        debug_assert_eq!( merged, self.terminal_path_length - 1 );

        self.notify( |obs, tree| obs.on_done( tree, Stage::Done, true ));
        true
    }

    /// A terminal path of one node: for a P-node apex the full children
    /// are gathered under one child P-node; a C-node apex already has its
    /// full block contiguous.
    fn update_singleton_terminal_path( &mut self ) {
        let apex = self.apex_candidate.unwrap();
        debug_assert!( self.scratch( apex ).tp_pred.is_none() );
        debug_assert!( self.apex_tp_pred2.is_none() );
        let full_count = self.scratch( apex ).full_neighbors.len();
        let empty_count = self.degree( apex ) - full_count;
        if self.node_type( apex ) == PCNodeType::PNode && full_count > 1 && empty_count > 1 {
            let full_node = self.split_off_full_pnode( apex, true );
            let parent = self.parent( apex );
            if parent.map_or( false, |p| self.label( p ) == NodeLabel::Full ) {
                self.replace_with( apex, full_node );
                self.append_child( full_node, apex );
            } else {
                self.append_child( apex, full_node );
            }
        }
    }

    /// Detaches the full neighbors of the P-node `node` and returns a node
    /// holding them: the single full child itself, or a fresh P-node with
    /// all of them.
    fn split_off_full_pnode( &mut self, node: NodeId, skip_parent: bool ) -> NodeId {
        let parent = self.parent( node );
        let fulls = self.scratch( node ).full_neighbors.clone();
        if fulls.len() == 1 {
            let full_node = fulls[0];
            debug_assert_ne!( Some( full_node ), parent );
            debug_assert_eq!( self.parent( full_node ), Some( node ));
            self.detach( full_node );
            self.notify( |obs, tree| obs.on_full_node_split( tree, full_node ));
            return full_node;
        }
        let full_node = self.new_node( PCNodeType::PNode, None, None );
        self.scratch( full_node ).label = NodeLabel::Full;
        for &full_child in &fulls {
            if skip_parent && Some( full_child ) == parent {
                continue;
            }
            debug_assert_eq!( self.parent( full_child ), Some( node ));
            self.detach( full_child );
            self.append_child( full_node, full_child );
            self.scratch( full_node ).full_neighbors.push( full_child );
        }
        debug_assert!( self.degree( full_node ) >= 1 );
        self.notify( |obs, tree| obs.on_full_node_split( tree, full_node ));
        full_node
    }

    /// Splices `append` into the central node's neighbor ring after the
    /// neighbors collected so far; with `is_parent` the appended node
    /// instead becomes the central node's parent, taking the apex's place.
    fn append_neighbor( &mut self, central: NodeId, neighbors: &mut Vec<NodeId>, append: NodeId, is_parent: bool ) {
        if is_parent {
            let apex = self.apex_candidate.unwrap();
            debug_assert!( !self.is_detached( apex ));
            self.replace_with( apex, append );
            self.append_child( append, central );
        } else if neighbors.len() < 2 {
            self.append_child( central, append );
        } else if neighbors.len() == 2 {
            if !self.is_detached( central ) {
                self.append_child_at( central, append, true );
            } else {
                self.append_child( central, append );
            }
        } else {
            self.insert_between( append, Some( *neighbors.last().unwrap() ), Some( neighbors[0] ));
        }
        neighbors.push( append );
    }

    /// Builds the central C-node out of the apex: its neighbors end up in
    /// the cyclic order `[path-stub-1, full side, path-stub-2, empty
    /// side]`, with the block ends recorded on the central node.
    fn create_central_node( &mut self ) -> NodeId {
        let apex = self.apex_candidate.unwrap();
        let parent = self.parent( apex );
        let tp_stub1 = self.scratch( apex ).tp_pred.expect( "central node without path stub" );
        let tp_stub2 = self.apex_tp_pred2;
        debug_assert!( self.label( apex ) != NodeLabel::Empty || tp_stub2.is_some() );

        let central;
        if self.node_type( apex ) == PCNodeType::PNode {
            let is_parent_full = parent.map_or( false, |p| self.label( p ) == NodeLabel::Full );
            let full_count = self.scratch( apex ).full_neighbors.len();
            let partial_count = if tp_stub2.is_some() { 2 } else { 1 };
            let empty_count = self.degree( apex ) - full_count - partial_count;
            trace!(
                "central from {} apex {}: full={}, partial={}, empty={}",
                self.label( apex ), apex, full_count, partial_count, empty_count
            );

            self.detach( tp_stub1 );
            if let Some( stub2 ) = tp_stub2 {
                self.detach( stub2 );
            }

            let mut neighbors = mem::take( &mut self.central_neighbors );
            neighbors.clear();
            central = self.new_node( PCNodeType::CNode, None, None );
            let apex_label = self.label( apex );
            let apex_fulls = self.scratch( apex ).full_neighbors.clone();
            {
                let t = self.scratch( central );
                t.label = apex_label;
                t.full_neighbors = apex_fulls;
            }

            self.append_neighbor( central, &mut neighbors, tp_stub1, false );
            self.scratch( tp_stub1 ).replace_neighbor( apex, central );

            if full_count == 1 && is_parent_full {
                let parent = parent.unwrap();
                debug_assert_eq!( self.scratch( apex ).full_neighbors[0], parent );
                self.replace_with( apex, central );
                neighbors.push( parent );
            } else if full_count > 0 {
                let full_node = self.split_off_full_pnode( apex, is_parent_full );
                self.append_neighbor( central, &mut neighbors, full_node, is_parent_full );
                debug_assert!( full_count == 1 || self.degree( full_node ) == full_count + 1 );
            }

            let index_of_stub2 = neighbors.len();
            if let Some( stub2 ) = tp_stub2 {
                self.append_neighbor( central, &mut neighbors, stub2, false );
                self.scratch( stub2 ).replace_neighbor( apex, central );
            }

            if empty_count == 1 {
                if is_parent_full || parent.is_none() {
                    let empty_node = self.node( apex ).child1.unwrap();
                    self.detach( empty_node );
                    self.append_neighbor( central, &mut neighbors, empty_node, false );
                } else {
                    self.replace_with( apex, central );
                    neighbors.push( parent.unwrap() );
                }
            } else if empty_count > 1 {
                if is_parent_full {
                    self.append_neighbor( central, &mut neighbors, apex, false );
                } else {
                    self.append_child( apex, central );
                    neighbors.push( apex );
                }
                debug_assert_eq!( self.degree( apex ), empty_count + 1 );
            }
            if empty_count <= 1 {
                if Some( apex ) == self.root {
                    self.root = Some( central );
                }
                self.destroy_node( apex );
            }
            debug_assert_eq!( self.is_detached( central ), Some( central ) == self.root );
            debug_assert_eq!( self.degree( central ), neighbors.len() );
            debug_assert!( self.degree( central ) >= 3 );

            let fb1 = neighbors[1];
            let fb2 = if tp_stub2.is_some() { Some( neighbors[ index_of_stub2 - 1 ] )} else { None };
            {
                let t = self.scratch( central );
                t.tp_pred = Some( tp_stub1 );
                t.eb_end1 = Some( tp_stub1 );
                t.fb_end1 = Some( fb1 );
                if let Some( stub2 ) = tp_stub2 {
                    t.eb_end2 = Some( stub2 );
                    t.fb_end2 = fb2;
                }
            }
            self.central_neighbors = neighbors;
        } else {
            // a C-node apex is reused as the central node
            central = apex;
            if self.label( apex ) == NodeLabel::Partial {
                let t = self.scratch( apex );
                if t.eb_end2 == Some( tp_stub1 ) {
                    mem::swap( &mut t.eb_end1, &mut t.eb_end2 );
                    mem::swap( &mut t.fb_end1, &mut t.fb_end2 );
                }
                debug_assert_eq!( t.eb_end1, Some( tp_stub1 ));
            } else {
                debug_assert_eq!( self.label( apex ), NodeLabel::Empty );
                debug_assert!( tp_stub2.is_some() );
                debug_assert!( self.are_neighbors_adjacent( apex, tp_stub1, tp_stub2.unwrap() ));
                let t = self.scratch( apex );
                t.eb_end1 = Some( tp_stub1 );
                t.fb_end1 = tp_stub2;
                t.fb_end2 = Some( tp_stub1 );
                t.eb_end2 = tp_stub2;
            }
        }

        debug_assert_eq!( self.scratch( central ).tp_pred, Some( tp_stub1 ));
        debug_assert_eq!( self.scratch( central ).eb_end1, Some( tp_stub1 ));
        central
    }

    /// Merges one branch of the terminal path into the central node, one
    /// predecessor at a time, and returns how many nodes were merged.
    fn update_terminal_path( &mut self, central: NodeId, start: Option<NodeId> ) -> usize {
        let mut tp_neigh_opt = start;
        // the insertion point for full material on this branch's side
        let side1 = self.scratch( central ).tp_pred == start;
        let mut full_neigh = {
            let t = self.scratch( central );
            if side1 { t.fb_end1.unwrap() } else { t.fb_end2.unwrap() }
        };
        let mut count = 0;
        while let Some( tp_neigh ) = tp_neigh_opt {
            debug_assert!( self.are_neighbors_adjacent( central, tp_neigh, full_neigh ));
            debug_assert!( self.scratch( tp_neigh ).tp_succ.is_some() );
            let label = self.label( tp_neigh );
            debug_assert_ne!( label, NodeLabel::Full );
            {
                let c = count;
                self.notify( |obs, tree| obs.before_merge( tree, c, tp_neigh ));
            }
            let next_tp = self.scratch( tp_neigh ).tp_pred;
            debug_assert!( label != NodeLabel::Empty || next_tp.is_some() );
            let other_end_of_full_block: Option<NodeId>;

            if self.node_type( tp_neigh ) == PCNodeType::PNode {
                if label == NodeLabel::Partial {
                    let full_node = self.split_off_full_pnode( tp_neigh, false );
                    self.insert_between( full_node, Some( tp_neigh ), Some( full_neigh ));
                    full_neigh = full_node;
                    other_end_of_full_block = Some( full_node );
                } else {
                    other_end_of_full_block = None;
                }
                if let Some( pred ) = next_tp {
                    self.detach( pred );
                    self.insert_between( pred, Some( full_neigh ), Some( tp_neigh ));
                }
                match self.child_count( tp_neigh ) {
                    0 => {
                        self.detach( tp_neigh );
                        self.destroy_node( tp_neigh );
                    }
                    1 => {
                        let child = self.node( tp_neigh ).child1.unwrap();
                        self.detach( child );
                        self.replace_with( tp_neigh, child );
                        self.destroy_node( tp_neigh );
                    }
                    _ => {}
                }
            } else {
                debug_assert_eq!( self.node_type( tp_neigh ), PCNodeType::CNode );
                let other_neigh = self.next_neighbor( central, Some( full_neigh ), tp_neigh );
                if self.node( tp_neigh ).sib1 == Some( full_neigh ) {
                    let n = self.node_mut( tp_neigh );
                    mem::swap( &mut n.sib1, &mut n.sib2 );
                }
                debug_assert!(
                    self.node( tp_neigh ).sib1 == Some( other_neigh )
                        || self.node( tp_neigh ).sib1.is_none()
                );
                debug_assert!(
                    self.node( tp_neigh ).sib2 == Some( full_neigh )
                        || ( self.node( tp_neigh ).sib2.is_none()
                            && self.parent( central ) == Some( full_neigh ))
                );

                // orient the node: empty outer child at child1, full at child2
                let ( fb1, fb2 ) = {
                    let t = self.scratch( tp_neigh );
                    ( t.fb_end1, t.fb_end2 )
                };
                let child1 = self.node( tp_neigh ).child1;
                if child1 == fb1 || child1 == fb2 {
                    self.flip( tp_neigh );
                }
                let full_outer = self.node( tp_neigh ).child2.unwrap();
                if Some( full_outer ) == self.scratch( tp_neigh ).fb_end2 {
                    let t = self.scratch( tp_neigh );
                    mem::swap( &mut t.eb_end1, &mut t.eb_end2 );
                    mem::swap( &mut t.fb_end1, &mut t.fb_end2 );
                }
                debug_assert_eq!( self.scratch( tp_neigh ).fb_end1, Some( full_outer ));
                let tp_parent = self.parent( tp_neigh );
                debug_assert_eq!( self.scratch( tp_neigh ).eb_end1, tp_parent );
                debug_assert!( next_tp.is_none() || self.scratch( tp_neigh ).eb_end2 == next_tp );

                let ( merged_fb1, merged_fb2 ) = {
                    let t = self.scratch( tp_neigh );
                    ( t.fb_end1, t.fb_end2 )
                };
                self.merge_into_parent( tp_neigh );
                debug_assert!( self.are_neighbors_adjacent( central, full_neigh, full_outer ));

                if label == NodeLabel::Partial {
                    full_neigh = merged_fb2.unwrap();
                    other_end_of_full_block = merged_fb1;
                } else {
                    debug_assert_eq!( Some( full_outer ), next_tp );
                    other_end_of_full_block = None;
                }
                self.destroy_node( tp_neigh );
            }

            self.replace_tp_neigh( central, tp_neigh, next_tp, full_neigh, other_end_of_full_block );
            if let Some( next ) = next_tp {
                self.scratch( next ).replace_neighbor( tp_neigh, central );
            }
            tp_neigh_opt = next_tp;
            count += 1;
            self.notify( |obs, tree| obs.after_merge( tree, next_tp ));
        }
        count
    }

    /// Moves the block-end bookkeeping of the central node from the merged
    /// path node to its successor on the branch.
    fn replace_tp_neigh(
        &mut self,
        central: NodeId,
        old: NodeId,
        new_tp: Option<NodeId>,
        new_full: NodeId,
        other_end_of_full_block: Option<NodeId>,
    ) {
        let side1 = self.scratch( central ).tp_pred == Some( old );
        if side1 {
            let t = self.scratch( central );
            t.tp_pred = new_tp;
            t.eb_end1 = new_tp;
            t.fb_end1 = Some( new_full );
            if t.fb_end2 == Some( old ) {
                t.fb_end2 = other_end_of_full_block.or( new_tp );
            }
        } else {
            debug_assert_eq!( self.apex_tp_pred2, Some( old ));
            self.apex_tp_pred2 = new_tp;
            let t = self.scratch( central );
            t.eb_end2 = new_tp;
            t.fb_end2 = Some( new_full );
            if t.fb_end1 == Some( old ) {
                t.fb_end1 = Some( other_end_of_full_block.unwrap_or( new_full ));
            }
        }
        let t = self.scratch( central );
        debug_assert_ne!( t.eb_end1, Some( old ));
        debug_assert_ne!( t.eb_end2, Some( old ));
        debug_assert_ne!( t.fb_end1, Some( old ));
        debug_assert_ne!( t.fb_end2, Some( old ));
        let ( eb1, fb1, eb2, fb2 ) = ( t.eb_end1, t.fb_end1, t.eb_end2, t.fb_end2 );
        if let Some( eb1 ) = eb1 {
            debug_assert!( self.are_neighbors_adjacent( central, eb1, fb1.unwrap() ));
        }
        if let Some( eb2 ) = eb2 {
            debug_assert!( self.are_neighbors_adjacent( central, eb2, fb2.unwrap() ));
        }
    }
}
