//! Observation hooks into the stages of `make_consecutive`.

use crate::node::NodeId;
use crate::tree::PCTree;

use log::{debug,trace};

/// The stage at which a `make_consecutive` call finished.
#[derive( Copy, Clone, Debug, PartialEq, Eq )]
pub enum Stage {
    /// The restriction was empty, a singleton or (almost) all leaves.
    Trivial,
    /// Labeling found no partial node; the leaves were consecutive already.
    NoPartials,
    /// No feasible terminal path exists; the tree is unchanged.
    InvalidPath,
    /// The terminal path was a single node.
    Singleton,
    /// A full split/merge pass ran.
    Done,
}

/// Callbacks around the stages of [`PCTree::make_consecutive`]. Observers
/// may read the tree but must not mutate it. All hooks default to no-ops.
pub trait Observer {
    fn on_called( &self, _tree: &PCTree, _restriction: &[NodeId] ) {}

    fn on_labels_assigned(
        &self,
        _tree: &PCTree,
        _first_partial: Option<NodeId>,
        _last_partial: Option<NodeId>,
        _partial_count: usize,
    ) {}

    fn on_terminal_path_found( &self, _tree: &PCTree, _apex: NodeId, _second_pred: Option<NodeId>, _length: usize ) {}

    fn on_central_created( &self, _tree: &PCTree, _central: NodeId ) {}

    fn before_merge( &self, _tree: &PCTree, _count: usize, _tp_neigh: NodeId ) {}

    fn after_merge( &self, _tree: &PCTree, _next: Option<NodeId> ) {}

    fn on_full_node_split( &self, _tree: &PCTree, _full_node: NodeId ) {}

    fn on_done( &self, _tree: &PCTree, _stage: Stage, _success: bool ) {}
}

/// Narrates every reduction through the `log` facade.
pub struct LoggingObserver;

impl Observer for LoggingObserver {
    fn on_called( &self, tree: &PCTree, restriction: &[NodeId] ) {
        debug!( "make_consecutive of {} leaves on {}", restriction.len(), tree );
    }

    fn on_labels_assigned( &self, _tree: &PCTree, first: Option<NodeId>, last: Option<NodeId>, count: usize ) {
        debug!( "{} partial nodes, first {:?}, last {:?}", count, first, last );
    }

    fn on_terminal_path_found( &self, tree: &PCTree, apex: NodeId, second: Option<NodeId>, length: usize ) {
        debug!(
            "terminal path of length {} with {} {} apex, second predecessor {:?}",
            length, tree.label( apex ), apex, second
        );
    }

    fn on_central_created( &self, tree: &PCTree, central: NodeId ) {
        debug!( "central C-node {} created: {}", central, tree );
    }

    fn before_merge( &self, _tree: &PCTree, count: usize, tp_neigh: NodeId ) {
        trace!( "merging path node #{} {}", count, tp_neigh );
    }

    fn after_merge( &self, _tree: &PCTree, next: Option<NodeId> ) {
        trace!( "merge done, next path node {:?}", next );
    }

    fn on_full_node_split( &self, _tree: &PCTree, full_node: NodeId ) {
        trace!( "full children split off into {}", full_node );
    }

    fn on_done( &self, tree: &PCTree, stage: Stage, success: bool ) {
        debug!( "restriction {:?}/{} finished: {}", stage, if success { "ok" } else { "infeasible" }, tree );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive( Default )]
    struct Recorder {
        stages : RefCell<Vec<( Stage, bool )>>,
        merges : RefCell<usize>,
    }

    impl Observer for Recorder {
        fn on_done( &self, _tree: &PCTree, stage: Stage, success: bool ) {
            self.stages.borrow_mut().push(( stage, success ));
        }

        fn before_merge( &self, _tree: &PCTree, _count: usize, _tp_neigh: NodeId ) {
            *self.merges.borrow_mut() += 1;
        }
    }

    #[test]
    fn observer_sees_every_stage() {
        let mut tree = PCTree::with_leaves( 10 );
        let recorder = Rc::new( Recorder::default() );
        tree.add_observer( recorder.clone() );
        let leaves = tree.leaves().to_vec();

        assert!(  tree.make_consecutive( &[ leaves[0] ]));
        assert!(  tree.make_consecutive( &[ leaves[0], leaves[1] ]));
        assert!(  tree.make_consecutive( &[ leaves[2], leaves[3] ]));
        assert!(  tree.make_consecutive( &[ leaves[1], leaves[2] ]));
        assert!( !tree.make_consecutive( &[ leaves[0], leaves[2] ]));

        let stages = recorder.stages.borrow();
        assert_eq!(
            &*stages,
            &[
                ( Stage::Trivial, true ),
                ( Stage::Singleton, true ),
                ( Stage::Singleton, true ),
                ( Stage::Done, true ),
                ( Stage::InvalidPath, false ),
            ]
        );
        assert!( *recorder.merges.borrow() > 0 );
    }
}
