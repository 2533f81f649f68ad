//! The `PCTree` itself: node pool, registries and node lifecycle.

use crate::rust::*;

use crate::array::PCTreeNodeArray;
use crate::node::{NodeId,PCNode,PCNodeType};
use crate::observer::Observer;
use crate::ufind::UnionFind;

/// A PC-tree over a set of leaves.
///
/// The tree stores exactly the set of cyclic leaf orders that are
/// admissible under all consecutivity restrictions applied so far. The
/// chief mutator is [`make_consecutive`], which either sharpens the tree to
/// honor a new restriction or reports `false` and leaves it untouched.
///
/// [`make_consecutive`]: PCTree::make_consecutive
///
/// # Examples
///
/// ```
/// use pctree::PCTree;
///
/// let mut tree = PCTree::with_leaves( 6 );
/// let leaves = tree.leaves().to_vec();
/// assert!(  tree.make_consecutive( &[ leaves[0], leaves[1] ]));
/// assert!(  tree.make_consecutive( &[ leaves[1], leaves[2] ]));
/// assert!( !tree.make_consecutive( &[ leaves[0], leaves[2] ]));
/// ```
pub struct PCTree {
    pub(crate) nodes        : Vec<PCNode>,
    pub(crate) leaves       : Vec<NodeId>,
    pub(crate) c_nodes      : Vec<Option<NodeId>>, // by union-find slot
    pub(crate) parents      : UnionFind,
    pub(crate) p_node_count : usize,
    pub(crate) c_node_count : usize,
    pub(crate) root         : Option<NodeId>,
    pub(crate) stamp        : u32,

    // reduction scratch, reset by every `make_consecutive`
    pub(crate) first_partial        : Option<NodeId>,
    pub(crate) last_partial         : Option<NodeId>,
    pub(crate) partial_count        : usize,
    pub(crate) apex_candidate       : Option<NodeId>,
    pub(crate) apex_fix             : bool,
    pub(crate) apex_tp_pred2        : Option<NodeId>,
    pub(crate) terminal_path_length : usize,
    pub(crate) central_neighbors    : Vec<NodeId>,

    pub(crate) observers : Vec<Rc<dyn Observer>>,
}

impl Default for PCTree {
    fn default() -> Self { PCTree::new() }
}

impl PCTree {
    /// Makes a tree with no nodes. Nodes are added with [`new_node`] and
    /// [`insert_leaves`].
    ///
    /// [`new_node`]: PCTree::new_node
    /// [`insert_leaves`]: PCTree::insert_leaves
    pub fn new() -> Self {
        PCTree {
            nodes                : Vec::new(),
            leaves               : Vec::new(),
            c_nodes              : Vec::new(),
            parents              : UnionFind::new(),
            p_node_count         : 0,
            c_node_count         : 0,
            root                 : None,
            stamp                : 0,
            first_partial        : None,
            last_partial         : None,
            partial_count        : 0,
            apex_candidate       : None,
            apex_fix             : false,
            apex_tp_pred2        : None,
            terminal_path_length : 0,
            central_neighbors    : Vec::new(),
            observers            : Vec::new(),
        }
    }

    /// Makes a trivial tree: one P-node root holding `leaf_count` leaves,
    /// representing all `(leaf_count - 1)!` cyclic orders.
    pub fn with_leaves( leaf_count: usize ) -> Self {
        assert!( leaf_count > 2, "a PC-tree needs at least 3 leaves" );
        let mut tree = PCTree::new();
        let root = tree.new_node( PCNodeType::PNode, None, None );
        tree.insert_leaves( leaf_count, root );
        tree
    }

    /// Deep copy of `other`. `mapping` receives, for every node of `other`,
    /// the corresponding node of the copy. With `keep_ids` the copy reuses
    /// `other`'s node indices.
    pub fn copy( other: &PCTree, mapping: &mut PCTreeNodeArray<Option<NodeId>>, keep_ids: bool ) -> PCTree {
        let mut tree = PCTree::new();
        for node in other.nodes_dfs() {
            let id = if keep_ids { Some( node.index() )} else { None };
            let parent = match other.parent( node ) {
                Some( p ) => *mapping.get( p ),
                None      => None,
            };
            let new = tree.new_node( other.node_type( node ), parent, id );
            mapping[ node ] = Some( new );
        }
        debug_assert_eq!( other.leaf_count(), tree.leaf_count() );
        debug_assert_eq!( other.p_node_count(), tree.p_node_count() );
        debug_assert_eq!( other.c_node_count(), tree.c_node_count() );
        tree
    }

    // ------------------------------------------------------------------ //
    // accessors

    #[inline] pub fn root( &self ) -> Option<NodeId> { self.root }

    /// All leaves, in registration order.
    #[inline] pub fn leaves( &self ) -> &[NodeId] { &self.leaves }

    #[inline] pub fn leaf_count( &self ) -> usize { self.leaves.len() }

    #[inline] pub fn p_node_count( &self ) -> usize { self.p_node_count }

    #[inline] pub fn c_node_count( &self ) -> usize { self.c_node_count }

    #[inline] pub fn inner_node_count( &self ) -> usize { self.p_node_count + self.c_node_count }

    /// Upper bound (exclusive) of all node indices ever assigned.
    #[inline] pub fn node_bound( &self ) -> usize { self.nodes.len() }

    #[inline] pub(crate) fn node( &self, n: NodeId ) -> &PCNode { &self.nodes[ n.0 ] }

    #[inline] pub(crate) fn node_mut( &mut self, n: NodeId ) -> &mut PCNode { &mut self.nodes[ n.0 ] }

    #[inline] pub fn node_type( &self, n: NodeId ) -> PCNodeType { self.node( n ).node_type }

    #[inline] pub fn is_leaf( &self, n: NodeId ) -> bool { self.node( n ).is_leaf() }

    #[inline] pub fn child_count( &self, n: NodeId ) -> usize { self.node( n ).child_count }

    /// Number of tree neighbors: children plus the parent, if any.
    #[inline] pub fn degree( &self, n: NodeId ) -> usize {
        self.node( n ).child_count + if self.node( n ).is_detached() { 0 } else { 1 }
    }

    #[inline] pub fn is_detached( &self, n: NodeId ) -> bool { self.node( n ).is_detached() }

    /// The parent of `n`, resolving a C-node parent through the union-find.
    pub fn parent( &self, n: NodeId ) -> Option<NodeId> {
        let node = self.node( n );
        if let Some( p ) = node.parent_p {
            debug_assert!( node.parent_c.get().is_none() );
            return Some( p );
        }
        let cid = node.parent_c.get()?;
        let root = self.parents.find( cid );
        node.parent_c.set( Some( root ));
        let parent = self.c_nodes[ root ].expect( "child points at a destroyed C-node" );
        debug_assert_ne!( parent, n );
        debug_assert_eq!( self.node( parent ).node_type, PCNodeType::CNode );
        debug_assert_eq!( self.node( parent ).list_index, root );
        Some( parent )
    }

    // ------------------------------------------------------------------ //
    // lifecycle

    fn register_node( &mut self, n: NodeId ) {
        match self.node( n ).node_type {
            PCNodeType::Leaf => {
                self.node_mut( n ).list_index = self.leaves.len();
                self.leaves.push( n );
            }
            PCNodeType::PNode => self.p_node_count += 1,
            PCNodeType::CNode => {
                let slot = self.parents.make_set();
                debug_assert_eq!( self.c_nodes.len(), slot );
                self.c_nodes.push( Some( n ));
                self.node_mut( n ).list_index = slot;
                self.c_node_count += 1;
            }
        }
    }

    fn unregister_node( &mut self, n: NodeId ) {
        match self.node( n ).node_type {
            PCNodeType::Leaf => self.remove_leaf_from_list( n ),
            PCNodeType::PNode => self.p_node_count -= 1,
            PCNodeType::CNode => {
                let slot = self.node( n ).list_index;
                debug_assert_eq!( self.c_nodes[ slot ], Some( n ));
                self.c_nodes[ slot ] = None;
                self.c_node_count -= 1;
            }
        }
    }

    pub(crate) fn remove_leaf_from_list( &mut self, leaf: NodeId ) {
        let at = self.node( leaf ).list_index;
        debug_assert_eq!( self.leaves[ at ], leaf );
        self.leaves.swap_remove( at );
        if at < self.leaves.len() {
            let moved = self.leaves[ at ];
            self.node_mut( moved ).list_index = at;
        }
    }

    pub(crate) fn insert_leaf_into_list( &mut self, leaf: NodeId ) {
        self.node_mut( leaf ).list_index = self.leaves.len();
        self.leaves.push( leaf );
    }

    /// Creates a node of the given type, attached under `parent` if one is
    /// given. The first node created without a parent becomes the root.
    /// With an explicit `id`, that index is assigned instead of the next
    /// free one.
    pub fn new_node( &mut self, node_type: PCNodeType, parent: Option<NodeId>, id: Option<usize> ) -> NodeId {
        let n = match id {
            None => {
                self.nodes.push( PCNode::new( node_type ));
                NodeId( self.nodes.len() - 1 )
            }
            Some( i ) => {
                while self.nodes.len() <= i {
                    self.nodes.push( PCNode::default() );
                }
                self.nodes[ i ] = PCNode::new( node_type );
                NodeId( i )
            }
        };
        self.register_node( n );
        if let Some( p ) = parent {
            self.append_child( p, n );
        } else if self.root.is_none() {
            self.root = Some( n );
        }
        n
    }

    /// Destroys a fully detached, childless node. The slot stays dead.
    pub(crate) fn destroy_node( &mut self, n: NodeId ) {
        debug_assert!( self.node( n ).is_detached() );
        debug_assert_eq!( self.node( n ).child_count, 0 );
        debug_assert!( self.node( n ).child1.is_none() );
        debug_assert!( self.node( n ).child2.is_none() );
        debug_assert_ne!( Some( n ), self.root );
        self.unregister_node( n );
    }

    /// Changes `node`'s type, re-registering it and re-pointing its
    /// children's parent handles. Returns the old type.
    pub fn change_node_type( &mut self, node: NodeId, new_type: PCNodeType ) -> PCNodeType {
        let old_type = self.node( node ).node_type;
        if old_type == new_type {
            return old_type;
        }
        self.unregister_node( node );
        self.node_mut( node ).node_type = new_type;
        self.register_node( node );

        if old_type == PCNodeType::CNode || new_type == PCNodeType::CNode {
            let slot = self.node( node ).list_index;
            let mut pred = None;
            let mut curr = self.node( node ).child1;
            while let Some( c ) = curr {
                {
                    let child = self.node_mut( c );
                    if new_type == PCNodeType::CNode {
                        child.parent_p = None;
                        child.parent_c.set( Some( slot ));
                    } else {
                        child.parent_p = Some( node );
                        child.parent_c.set( None );
                    }
                }
                let next = self.node( c ).next_sibling( pred );
                pred = Some( c );
                curr = next;
            }
            debug_assert_eq!( pred, self.node( node ).child2 );
        }
        old_type
    }

    /// Appends `count` fresh leaves under `parent` and returns them.
    pub fn insert_leaves( &mut self, count: usize, parent: NodeId ) -> Vec<NodeId> {
        let mut added = Vec::with_capacity( count );
        for _ in 0..count {
            added.push( self.new_node( PCNodeType::Leaf, Some( parent ), None ));
        }
        added
    }

    /// Replaces `leaf` by a P-node holding `leaf_count` fresh leaves,
    /// which are returned.
    pub fn replace_leaf( &mut self, leaf_count: usize, leaf: NodeId ) -> Vec<NodeId> {
        assert!( leaf_count > 1 );
        debug_assert!( self.is_leaf( leaf ));
        if self.leaf_count() <= 2 {
            let parent = self.parent( leaf ).expect( "replace_leaf needs an attached leaf" );
            self.change_node_type( parent, PCNodeType::PNode );
            let added = self.insert_leaves( leaf_count, parent );
            self.detach( leaf );
            self.destroy_node( leaf );
            added
        } else {
            self.change_node_type( leaf, PCNodeType::PNode );
            self.insert_leaves( leaf_count, leaf )
        }
    }

    /// Removes `leaf` from the tree, collapsing any inner node the removal
    /// leaves with a single child.
    pub fn destroy_leaf( &mut self, leaf: NodeId ) {
        debug_assert!( self.is_leaf( leaf ));
        debug_assert_ne!( Some( leaf ), self.root );

        let parent = self.parent( leaf ).expect( "destroy_leaf needs an attached leaf" );
        self.detach( leaf );
        self.destroy_node( leaf );

        // in a valid tree every inner node keeps at least one child here
        if self.child_count( parent ) != 1 {
            return;
        }
        let root = self.root.expect( "tree without a root" );
        let child = self.node( parent ).child1.unwrap();
        if self.node_type( root ) == PCNodeType::Leaf {
            if self.node_type( child ) != PCNodeType::Leaf || self.node( root ).child1 != Some( parent ) {
                self.detach( child );
                self.replace_with( parent, child );
                self.destroy_node( parent );
            }
        } else if parent != root {
            self.detach( child );
            self.replace_with( parent, child );
            self.destroy_node( parent );
        } else if self.node_type( child ) != PCNodeType::Leaf {
            // the root kept a single inner child; that child takes over
            {
                let r = self.node_mut( root );
                r.child_count = 0;
                r.child1 = None;
                r.child2 = None;
            }
            {
                let c = self.node_mut( child );
                c.parent_p = None;
                c.parent_c.set( None );
                c.sib1 = None;
                c.sib2 = None;
            }
            self.root = Some( child );
            self.destroy_node( root );
        }
    }

    /// Makes `leaves` consecutive (unless `assume_consecutive`) and merges
    /// them into their first leaf, destroying the others. Returns the
    /// surviving leaf, or `None` if the restriction is infeasible.
    pub fn merge_leaves( &mut self, leaves: &[NodeId], assume_consecutive: bool ) -> Option<NodeId> {
        assert!( !leaves.is_empty() );
        if !assume_consecutive && !self.make_consecutive( leaves ) {
            return None;
        }
        for &leaf in &leaves[1..] {
            self.destroy_leaf( leaf );
        }
        Some( leaves[0] )
    }

    /// Declares the detached node `new_root` the root and returns the old
    /// root.
    pub fn set_root( &mut self, new_root: NodeId ) -> Option<NodeId> {
        debug_assert!( self.is_detached( new_root ));
        let old = self.root;
        self.root = Some( new_root );
        old
    }

    /// Reroots the tree at `new_root`, preserving every node's cyclic
    /// neighbor order: on each step of the root path the child leaves its
    /// parent's ring (the gap it leaves becomes the parent's new parent
    /// direction) and the old parent enters the child's ring through the
    /// child's former parent gap. Returns the old root.
    pub fn change_root( &mut self, new_root: NodeId ) -> Option<NodeId> {
        let mut path = vec![ new_root ];
        let mut cur = new_root;
        while let Some( p ) = self.parent( cur ) {
            path.push( p );
            cur = p;
        }
        for i in ( 0..path.len() - 1 ).rev() {
            let child = path[ i ];
            let old_parent = path[ i + 1 ];
            self.detach( child );
            self.append_child( child, old_parent );
        }
        self.set_root( new_root )
    }

    // ------------------------------------------------------------------ //
    // observers

    /// Subscribes `observer` to the stages of `make_consecutive`.
    pub fn add_observer( &mut self, observer: Rc<dyn Observer> ) {
        self.observers.push( observer );
    }

    pub(crate) fn notify<F: Fn( &dyn Observer, &PCTree )>( &mut self, f: F ) {
        if self.observers.is_empty() {
            return;
        }
        let observers = mem::take( &mut self.observers );
        for obs in &observers {
            f( &**obs, self );
        }
        self.observers = observers;
    }

    /// True iff a restriction of `size` leaves constrains nothing.
    #[inline] pub fn is_trivial_restriction( &self, size: usize ) -> bool {
        size <= 1 || size + 1 >= self.leaf_count()
    }
}
