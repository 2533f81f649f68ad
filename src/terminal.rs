//! Terminal-path discovery: the ascent from the partial nodes to the apex.

use crate::node::{NodeId,NodeLabel,PCNodeType};
use crate::tree::PCTree;

use log::trace;

impl PCTree {
    /// Walks the direction `pred -> curr` around `node` while the labels
    /// stay full. Returns the block size together with the last full
    /// neighbor and the empty neighbor ending the block.
    fn find_end_of_full_block( &self, node: NodeId, pred: NodeId, curr: NodeId ) -> ( usize, NodeId, NodeId ) {
        let start = pred;
        let mut pred = pred;
        let mut curr = curr;
        let mut full_end = pred;
        let mut count = 0;
        while self.label( curr ) == NodeLabel::Full {
            let next = self.next_neighbor( node, Some( pred ), curr );
            debug_assert_ne!( next, start );
            pred = curr;
            full_end = curr;
            curr = next;
            count += 1;
        }
        ( count, full_end, curr )
    }

    /// Verifies that a partial C-node has one contiguous full block and
    /// that its path predecessors sit on the empty block's boundary,
    /// computing the four block-end pointers on first contact.
    pub(crate) fn check_tp_partial_cnode( &mut self, node: NodeId ) -> bool {
        if self.scratch( node ).eb_end1.is_none() {
            let full_child = self.scratch( node ).full_neighbors[0];
            let sib1 = self.next_neighbor( node, None, full_child );
            let sib2 = self.next_neighbor( node, Some( sib1 ), full_child );
            let ( count1, fb1, eb1 ) = self.find_end_of_full_block( node, full_child, sib1 );
            let ( count2, fb2, eb2 ) = self.find_end_of_full_block( node, full_child, sib2 );
            let full_count = {
                let t = self.scratch( node );
                t.fb_end1 = Some( fb1 );
                t.eb_end1 = Some( eb1 );
                t.fb_end2 = Some( fb2 );
                t.eb_end2 = Some( eb2 );
                t.full_neighbors.len()
            };
            if 1 + count1 + count2 != full_count {
                trace!( "C-node {} has a non-contiguous full block", node );
                return false;
            }
        }
        let ( eb1, eb2, tp_pred ) = {
            let t = self.scratch( node );
            debug_assert!( t.eb_end1.is_some() && t.eb_end2.is_some() );
            debug_assert!( t.fb_end1.is_some() && t.fb_end2.is_some() );
            ( t.eb_end1, t.eb_end2, t.tp_pred )
        };
        if tp_pred.is_some() && tp_pred != eb1 && tp_pred != eb2 {
            trace!( "C-node {} has its path predecessor away from the empty block", node );
            return false;
        }
        if Some( node ) == self.apex_candidate && self.apex_tp_pred2.is_some() {
            let second = self.apex_tp_pred2;
            if second != eb1 && second != eb2 {
                trace!( "C-node {} has its second predecessor away from the empty block", node );
                return false;
            }
        }
        true
    }

    /// Declares `node` an apex candidate; `fix` marks a structurally
    /// forced apex. Conflicting candidates are reconciled by backtracking
    /// along the partial-predecessor chain, or the restriction fails.
    pub(crate) fn set_apex_candidate( &mut self, node: NodeId, fix: bool ) -> bool {
        match self.apex_candidate {
            None => {
                self.apex_candidate = Some( node );
                self.apex_fix = fix;
                true
            }
            Some( current ) if current == node => {
                if fix {
                    self.apex_fix = true;
                }
                true
            }
            Some( current ) => {
                // one of the candidates may merely be an overshoot of the
                // other along a chain of empty nodes
                if fix != self.apex_fix {
                    let ( fix_ac, non_fix_ac ) = if self.apex_fix { ( current, node )} else { ( node, current )};
                    if self.label( non_fix_ac ) == NodeLabel::Empty {
                        let ( nf_pred, nf_height ) = {
                            let t = self.scratch( non_fix_ac );
                            ( t.tp_partial_pred, t.tp_partial_height )
                        };
                        if self.label( fix_ac ) == NodeLabel::Partial {
                            if nf_pred == Some( fix_ac ) {
                                self.terminal_path_length -= nf_height;
                                self.apex_candidate = Some( fix_ac );
                                self.apex_fix = true;
                                return true;
                            }
                        } else {
                            debug_assert_eq!( self.label( fix_ac ), NodeLabel::Empty );
                            let ( f_pred, f_height ) = {
                                let t = self.scratch( fix_ac );
                                ( t.tp_partial_pred, t.tp_partial_height )
                            };
                            if nf_pred == f_pred {
                                self.terminal_path_length -= nf_height - f_height;
                                self.apex_candidate = Some( fix_ac );
                                self.apex_fix = true;
                                return true;
                            }
                        }
                    }
                }
                trace!( "conflicting apex candidates {} and {}", current, node );
                false
            }
        }
    }

    /// Ascends from the partial nodes to find the terminal path, checking
    /// feasibility on the way. On success the apex candidate is fixed and
    /// `terminal_path_length` holds the path's node count.
    pub(crate) fn find_terminal_path( &mut self ) -> bool {
        while let Some( node ) = self.first_partial {
            self.remove_partial_node( node );
            let parent = self.parent( node );
            let label = self.label( node );
            debug_assert_ne!( label, NodeLabel::Full );
            trace!( "terminal path visits {} {} (length so far {})", label, node, self.terminal_path_length );

            if self.node_type( node ) == PCNodeType::CNode && label == NodeLabel::Partial {
                if !self.check_tp_partial_cnode( node ) {
                    return false;
                }
            }

            debug_assert_eq!( parent.is_none(), Some( node ) == self.root );
            if Some( node ) == self.apex_candidate || self.scratch( node ).tp_succ.is_some() {
                // seen through another branch; only count it once
                if self.scratch( node ).tp_succ.is_none() {
                    self.terminal_path_length += 1;
                    self.scratch( node ).tp_succ = Some( node );
                }
            } else if self.first_partial.is_none() && self.apex_candidate.is_none() {
                // the queue ran dry with no apex found: this node is it
                self.apex_candidate = Some( node );
                self.terminal_path_length += 1;
            } else if parent.is_none() || self.label( parent.unwrap() ) == NodeLabel::Full {
                // cannot ascend past the root or into a full parent
                self.scratch( node ).tp_succ = Some( node );
                self.terminal_path_length += 1;
                if !self.set_apex_candidate( node, false ) {
                    return false;
                }
            } else {
                let parent = parent.unwrap();
                self.scratch( node ).tp_succ = Some( parent );
                self.terminal_path_length += 1;
                if self.node_type( node ) == PCNodeType::CNode {
                    if label == NodeLabel::Empty {
                        let tp_pred = self.scratch( node ).tp_pred;
                        if !self.is_child_outer( node, tp_pred ) {
                            // the predecessor is buried inside the order
                            self.scratch( node ).tp_succ = Some( node );
                            if !self.set_apex_candidate( node, false ) {
                                return false;
                            }
                            continue;
                        }
                        let t = self.scratch( node );
                        t.eb_end1 = tp_pred;
                        t.fb_end2 = tp_pred;
                        t.eb_end2 = Some( parent );
                        t.fb_end1 = Some( parent );
                    } else {
                        debug_assert_eq!( label, NodeLabel::Partial );
                        let ( fb1, fb2 ) = {
                            let t = self.scratch( node );
                            ( t.fb_end1, t.fb_end2 )
                        };
                        if !self.is_child_outer( node, fb1 ) && !self.is_child_outer( node, fb2 ) {
                            // the full block does not border the parent
                            self.scratch( node ).tp_succ = Some( node );
                            if !self.set_apex_candidate( node, false ) {
                                return false;
                            }
                            continue;
                        }
                    }
                }
                let parent_pred = self.scratch( parent ).tp_pred;
                if parent_pred.is_none() {
                    self.scratch( parent ).tp_pred = Some( node );
                    if self.label( parent ) != NodeLabel::Partial {
                        if label == NodeLabel::Partial {
                            let t = self.scratch( parent );
                            t.tp_partial_pred = Some( node );
                            t.tp_partial_height = 1;
                        } else {
                            let ( pred, height ) = {
                                let t = self.scratch( node );
                                ( t.tp_partial_pred, t.tp_partial_height )
                            };
                            let t = self.scratch( parent );
                            t.tp_partial_pred = pred;
                            t.tp_partial_height = height + 1;
                        }
                        debug_assert!( self.scratch( parent ).tp_partial_pred.is_some() );
                        self.add_partial_node( parent );
                    }
                } else if parent_pred != Some( node ) {
                    // the parent is reached from two branches: A-shaped apex
                    if !self.set_apex_candidate( parent, true ) {
                        return false;
                    }
                    if self.apex_tp_pred2.is_some() && self.apex_tp_pred2 != Some( node ) {
                        trace!( "three terminal-path predecessors at {}", parent );
                        return false;
                    }
                    self.apex_tp_pred2 = Some( node );
                    if self.node_type( parent ) == PCNodeType::CNode && self.label( parent ) == NodeLabel::Empty {
                        let pred1 = parent_pred.unwrap();
                        if !self.are_neighbors_adjacent( parent, pred1, node ) {
                            trace!( "empty C-node apex {} with non-adjacent predecessors", parent );
                            return false;
                        }
                        let t = self.scratch( parent );
                        t.eb_end1 = Some( pred1 );
                        t.fb_end2 = Some( pred1 );
                        t.eb_end2 = Some( node );
                        t.fb_end1 = Some( node );
                    }
                }
                // a partial C-node parent may have been checked before this
                // branch registered with it
                if self.node_type( parent ) == PCNodeType::CNode && self.label( parent ) == NodeLabel::Partial {
                    if !self.check_tp_partial_cnode( parent ) {
                        return false;
                    }
                }
            }
        }
        debug_assert!( self.last_partial.is_none() );
        debug_assert_eq!( self.partial_count, 0 );

        if !self.apex_fix {
            let candidate = self.apex_candidate.expect( "terminal path search without apex" );
            if self.label( candidate ) != NodeLabel::Partial {
                // the ascent overshot along empty nodes; land on the lowest
                // partial ancestor instead
                let ( pred, height ) = {
                    let t = self.scratch( candidate );
                    ( t.tp_partial_pred, t.tp_partial_height )
                };
                trace!( "backtracking apex from {} by {}", candidate, height );
                self.terminal_path_length -= height;
                self.apex_candidate = pred;
            }
            self.apex_fix = true;
        }
        let apex = self.apex_candidate.unwrap();
        if self.node_type( apex ) == PCNodeType::CNode && self.label( apex ) == NodeLabel::Empty {
            debug_assert!( self.scratch( apex ).tp_pred.is_some() );
            debug_assert!( self.apex_tp_pred2.is_some() );
        }
        self.scratch( apex ).tp_succ = None;
        true
    }
}
