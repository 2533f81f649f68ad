//! Node types, stable node indices and the per-node scratch block.

use crate::rust::*;

use smallvec::SmallVec;

/// The type of a PC-tree node.
///
/// Leaves are the externally named elements of the ground set. P-nodes admit
/// any cyclic order of their children, C-nodes fix the circular order of
/// theirs up to reversal.
#[derive( Copy, Clone, Debug, PartialEq, Eq )]
pub enum PCNodeType {
    PNode,
    CNode,
    Leaf,
}

impl Default for PCNodeType {
    #[inline] fn default() -> Self { PCNodeType::Leaf }
}

/// The label a node receives during one labeling pass.
///
/// `Empty` doubles as "not touched by the current pass".
#[derive( Copy, Clone, Debug, PartialEq, Eq )]
pub enum NodeLabel {
    Empty,
    Partial,
    Full,
}

impl Default for NodeLabel {
    #[inline] fn default() -> Self { NodeLabel::Empty }
}

impl Display for NodeLabel {
    fn fmt( &self, f: &mut Formatter ) -> fmt::Result {
        match self {
            NodeLabel::Empty   => write!( f, "empty" ),
            NodeLabel::Partial => write!( f, "partial" ),
            NodeLabel::Full    => write!( f, "full" ),
        }
    }
}

/// Stable index of a node inside its tree.
///
/// Indices are assigned monotonically and never reused; arrays keyed by
/// nodes ([`PCTreeNodeArray`]) index by this value.
///
/// [`PCTreeNodeArray`]: crate::PCTreeNodeArray
#[derive( Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash )]
pub struct NodeId( pub(crate) usize );

impl NodeId {
    /// The raw index.
    #[inline] pub fn index( self ) -> usize { self.0 }
}

impl Display for NodeId {
    fn fmt( &self, f: &mut Formatter ) -> fmt::Result { write!( f, "{}", self.0 )}
}

pub(crate) type FullNeighbors = SmallVec<[NodeId; 8]>;

/// Scratch state of one labeling/reduction pass, valid only while the
/// owning node's stamp equals the tree's.
#[derive( Default, Clone )]
pub(crate) struct TempInfo {
    pub(crate) label             : NodeLabel,
    pub(crate) pred_partial      : Option<NodeId>, // doubly-linked list of partial nodes
    pub(crate) next_partial      : Option<NodeId>,
    pub(crate) tp_pred           : Option<NodeId>, // first terminal-path predecessor
    pub(crate) tp_partial_pred   : Option<NodeId>, // lowest partial ancestor for backtracking
    pub(crate) tp_succ           : Option<NodeId>,
    pub(crate) tp_partial_height : usize,
    pub(crate) full_neighbors    : FullNeighbors,
    pub(crate) eb_end1           : Option<NodeId>, // ends of the empty block around this node
    pub(crate) eb_end2           : Option<NodeId>,
    pub(crate) fb_end1           : Option<NodeId>, // ends of the full block
    pub(crate) fb_end2           : Option<NodeId>,
}

impl TempInfo {
    pub(crate) fn clear( &mut self ) {
        self.label = NodeLabel::Empty;
        self.pred_partial = None;
        self.next_partial = None;
        self.tp_pred = None;
        self.tp_partial_pred = None;
        self.tp_succ = None;
        self.tp_partial_height = 0;
        self.full_neighbors.clear();
        self.eb_end1 = None;
        self.eb_end2 = None;
        self.fb_end1 = None;
        self.fb_end2 = None;
    }

    /// Redirects every scratch pointer naming `old` to `new`. Used when a
    /// path node's neighbor is replaced by the central node.
    pub(crate) fn replace_neighbor( &mut self, old: NodeId, new: NodeId ) {
        let old = Some( old );
        let new = Some( new );
        if self.tp_pred         == old { self.tp_pred         = new; }
        if self.tp_partial_pred == old { self.tp_partial_pred = new; }
        if self.tp_succ         == old { self.tp_succ         = new; }
        if self.eb_end1         == old { self.eb_end1         = new; }
        if self.eb_end2         == old { self.eb_end2         = new; }
        if self.fb_end1         == old { self.fb_end1         = new; }
        if self.fb_end2         == old { self.fb_end2         = new; }
    }
}

/// One slot of the node pool.
///
/// The parent link is either a direct pointer (`parent_p`, used under
/// P-nodes and a root leaf wrapper) or the union-find slot of the parent
/// C-node (`parent_c`, compressed on read). `sib1`/`sib2` are unordered;
/// an outer child has one `None` side and `child1`/`child2` point at the
/// two outer children.
#[derive( Default )]
pub(crate) struct PCNode {
    pub(crate) node_type   : PCNodeType,
    pub(crate) parent_p    : Option<NodeId>,
    pub(crate) parent_c    : Cell<Option<usize>>,
    pub(crate) sib1        : Option<NodeId>,
    pub(crate) sib2        : Option<NodeId>,
    pub(crate) child1      : Option<NodeId>,
    pub(crate) child2      : Option<NodeId>,
    pub(crate) child_count : usize,
    pub(crate) list_index  : usize, // position in the leaves list, or the C-node's union-find slot
    pub(crate) stamp       : u32,
    pub(crate) temp        : TempInfo,
}

impl PCNode {
    pub(crate) fn new( node_type: PCNodeType ) -> Self {
        PCNode { node_type, stamp: u32::max_value(), ..PCNode::default() }
    }

    #[inline] pub(crate) fn is_leaf( &self ) -> bool { self.node_type == PCNodeType::Leaf }

    #[inline] pub(crate) fn is_detached( &self ) -> bool {
        self.parent_p.is_none() && self.parent_c.get().is_none()
    }

    /// The sibling on the other side of `pred`. `pred` must be `None` for
    /// an outer child entered from its open end.
    #[inline] pub(crate) fn next_sibling( &self, pred: Option<NodeId> ) -> Option<NodeId> {
        if pred == self.sib1 {
            self.sib2
        } else {
            debug_assert_eq!( pred, self.sib2 );
            self.sib1
        }
    }

    #[inline] pub(crate) fn is_sibling_adjacent( &self, other: NodeId ) -> bool {
        self.sib1 == Some( other ) || self.sib2 == Some( other )
    }

    #[inline] pub(crate) fn is_outer_child( &self ) -> bool {
        self.sib1.is_none() || self.sib2.is_none()
    }

    #[inline] pub(crate) fn is_child_outer( &self, child: NodeId ) -> bool {
        self.child1 == Some( child ) || self.child2 == Some( child )
    }

    pub(crate) fn replace_sibling( &mut self, old: Option<NodeId>, new: Option<NodeId> ) {
        if old == self.sib1 {
            self.sib1 = new;
        } else {
            debug_assert_eq!( old, self.sib2 );
            self.sib2 = new;
        }
    }

    pub(crate) fn replace_outer_child( &mut self, old: Option<NodeId>, new: Option<NodeId> ) {
        if old == self.child1 {
            self.child1 = new;
        } else {
            debug_assert_eq!( old, self.child2 );
            self.child2 = new;
        }
    }

    pub(crate) fn other_outer_child( &self, child: NodeId ) -> Option<NodeId> {
        if Some( child ) == self.child1 {
            self.child2
        } else {
            debug_assert_eq!( Some( child ), self.child2 );
            self.child1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_info_replace_neighbor() {
        let mut t = TempInfo::default();
        t.tp_pred = Some( NodeId( 3 ));
        t.eb_end1 = Some( NodeId( 3 ));
        t.fb_end2 = Some( NodeId( 5 ));
        t.replace_neighbor( NodeId( 3 ), NodeId( 9 ));
        assert_eq!( t.tp_pred, Some( NodeId( 9 )));
        assert_eq!( t.eb_end1, Some( NodeId( 9 )));
        assert_eq!( t.fb_end2, Some( NodeId( 5 )));
    }

    #[test]
    fn next_sibling_walk() {
        let mut n = PCNode::new( PCNodeType::Leaf );
        n.sib1 = None;
        n.sib2 = Some( NodeId( 2 ));
        assert_eq!( n.next_sibling( None ), Some( NodeId( 2 )));
        assert_eq!( n.next_sibling( Some( NodeId( 2 ))), None );
    }
}
