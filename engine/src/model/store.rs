use super::{
    cache::Cache,
    node::{NodeId, NodeKey, QuadNode, Quadrants},
};
use crate::{
    constants::MAX_CACHE_SIZE,
    errors::{EngineError, EngineResult},
};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Canonical node store (hash-consing): maps structural node values to their
/// one canonical instance so equal sub-patterns share memory and node ids can
/// serve as O(1) equality and cache keys.
///
/// The two leaves are pre-seeded, held outside the lookup map, and therefore
/// survive any eviction. Everything else is subject to the bounded cache's
/// eviction policy: a node evicted from the lookup map keeps functioning for
/// anyone still holding it, but an equal structure built later will register
/// anew under a fresh id.
#[derive(Clone)]
pub struct NodeStore {
    nodes: Cache<NodeKey, Arc<QuadNode>>,
    alive: Arc<QuadNode>,
    dead: Arc<QuadNode>,
    next_id: Arc<AtomicU64>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CACHE_SIZE)
    }

    pub fn with_capacity(max_size: u64) -> Self {
        // ids 0 and 1 are reserved for the pre-seeded leaves
        let alive = Arc::new(QuadNode::new_leaf(NodeId(0), true));
        let dead = Arc::new(QuadNode::new_leaf(NodeId(1), false));
        Self { nodes: Cache::new(max_size), alive, dead, next_id: Arc::new(AtomicU64::new(2)) }
    }

    /// The pre-seeded canonical leaf for `alive`.
    pub fn leaf(&self, alive: bool) -> Arc<QuadNode> {
        if alive { self.alive.clone() } else { self.dead.clone() }
    }

    /// Composes four canonical children into the canonical node one level up.
    ///
    /// The structural value is looked up first; only a miss registers a new
    /// node and mints a fresh id, so equal compositions share one instance.
    pub fn compose(
        &self,
        nw: Arc<QuadNode>,
        ne: Arc<QuadNode>,
        sw: Arc<QuadNode>,
        se: Arc<QuadNode>,
    ) -> EngineResult<Arc<QuadNode>> {
        let level = nw.level();
        if ne.level() != level || sw.level() != level || se.level() != level {
            return Err(EngineError::QuadrantLevelMismatch(nw.level(), ne.level(), sw.level(), se.level()));
        }
        let key = NodeKey::Inner { level: level + 1, nw: nw.node_id(), ne: ne.node_id(), sw: sw.node_id(), se: se.node_id() };
        if let Some(existing) = self.nodes.get(&key) {
            return Ok(existing);
        }
        let node_id = NodeId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let node = Arc::new(QuadNode::new_inner(node_id, level + 1, Quadrants { nw, ne, sw, se }));
        self.nodes.insert(key, node.clone());
        Ok(node)
    }

    /// Canonicalizes a node built elsewhere. Idempotent: a node that is
    /// already the canonical instance for its structure is returned as is.
    pub fn canonicalize(&self, node: Arc<QuadNode>) -> Arc<QuadNode> {
        let key = node.structural_key();
        if let NodeKey::Leaf(alive) = key {
            return self.leaf(alive);
        }
        if let Some(existing) = self.nodes.get(&key) {
            return existing;
        }
        self.nodes.insert(key, node.clone());
        node
    }

    /// The canonical all-dead node of the given level.
    pub fn empty(&self, level: u8) -> EngineResult<Arc<QuadNode>> {
        if level == 0 {
            return Ok(self.leaf(false));
        }
        let child = self.empty(level - 1)?;
        self.compose(child.clone(), child.clone(), child.clone(), child)
    }

    /// Doubles the universe: the result is one level higher with `node`'s
    /// quadrants moved to its center and dead space around them, so the
    /// content stays in place while the border gains slack.
    pub fn expand(&self, node: &Arc<QuadNode>) -> EngineResult<Arc<QuadNode>> {
        let q = node.inner()?;
        let filler = self.empty(node.level() - 1)?;
        let nw = self.compose(filler.clone(), filler.clone(), filler.clone(), q.nw.clone())?;
        let ne = self.compose(filler.clone(), filler.clone(), q.ne.clone(), filler.clone())?;
        let sw = self.compose(filler.clone(), q.sw.clone(), filler.clone(), filler.clone())?;
        let se = self.compose(q.se.clone(), filler.clone(), filler.clone(), filler)?;
        self.compose(nw, ne, sw, se)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Evicts random canonical entries until at most `target` remain. The
    /// pre-seeded leaves are unaffected.
    pub fn trim_to(&self, target: usize) {
        self.nodes.trim_to(target);
    }
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_are_pre_seeded_and_shared() {
        let store = NodeStore::new();
        assert!(Arc::ptr_eq(&store.leaf(true), &store.leaf(true)));
        assert!(Arc::ptr_eq(&store.leaf(false), &store.leaf(false)));
        assert_ne!(store.leaf(true).node_id(), store.leaf(false).node_id());
    }

    #[test]
    fn equal_compositions_share_one_instance() {
        let store = NodeStore::new();
        let a = store.leaf(true);
        let d = store.leaf(false);
        let first = store.compose(a.clone(), d.clone(), d.clone(), a.clone()).unwrap();
        let second = store.compose(a, d.clone(), d.clone(), store.leaf(true)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.node_id(), second.node_id());
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let store = NodeStore::new();
        let node = store.compose(store.leaf(true), store.leaf(false), store.leaf(false), store.leaf(false)).unwrap();
        let again = store.canonicalize(node.clone());
        assert!(Arc::ptr_eq(&node, &again));
    }

    #[test]
    fn compose_rejects_mismatched_levels() {
        let store = NodeStore::new();
        let leaf = store.leaf(false);
        let level1 = store.empty(1).unwrap();
        let err = store.compose(level1, leaf.clone(), leaf.clone(), leaf).unwrap_err();
        assert!(matches!(err, EngineError::QuadrantLevelMismatch(1, 0, 0, 0)));
    }

    #[test]
    fn empty_nodes_have_zero_population_and_are_shared() {
        let store = NodeStore::new();
        let a = store.empty(5).unwrap();
        let b = store.empty(5).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.population(), 0);
        assert_eq!(a.size(), 32);
    }

    #[test]
    fn expand_preserves_population() {
        let store = NodeStore::new();
        let a = store.leaf(true);
        let d = store.leaf(false);
        let l1 = store.compose(a.clone(), a.clone(), d.clone(), a).unwrap();
        let empty1 = store.empty(1).unwrap();
        let l2 = store.compose(l1, empty1.clone(), empty1.clone(), empty1).unwrap();
        let expanded = store.expand(&l2).unwrap();
        assert_eq!(expanded.level(), l2.level() + 1);
        assert_eq!(expanded.population(), l2.population());
    }

    #[test]
    fn eviction_re_registers_under_fresh_id() {
        let store = NodeStore::with_capacity(64);
        let node = store.compose(store.leaf(true), store.leaf(true), store.leaf(true), store.leaf(true)).unwrap();
        store.trim_to(0);
        let rebuilt = store.compose(store.leaf(true), store.leaf(true), store.leaf(true), store.leaf(true)).unwrap();
        // same structure, new identity: the relaxation that bounds memory
        assert_ne!(node.node_id(), rebuilt.node_id());
        assert_eq!(node.population(), rebuilt.population());
        // leaves survived the trim
        assert!(Arc::ptr_eq(&store.leaf(true), &store.leaf(true)));
    }
}
