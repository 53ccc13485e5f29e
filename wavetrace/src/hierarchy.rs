// Copyright 2024-2025 Cornell University
// released under BSD 3-Clause License

use crate::bitvec::BitVector;
use crate::transitions::{TransitionCursor, TransitionVector};
use crate::Time;
use rustc_hash::FxHashMap;
use std::num::NonZeroU32;

/// Uniquely identifies a net. Nets are numbered in declaration order starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct NetRef(NonZeroU32);

impl NetRef {
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        NonZeroU32::new(index as u32 + 1).map(Self)
    }

    #[inline]
    pub fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Uniquely identifies a scope in the net tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct ScopeRef(NonZeroU32);

impl ScopeRef {
    #[inline]
    pub fn from_index(index: usize) -> Option<Self> {
        NonZeroU32::new(index as u32 + 1).map(Self)
    }

    #[inline]
    pub fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Handle into the transition vector arena. Aliased nets share one handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VectorRef(NonZeroU32);

impl VectorRef {
    #[inline]
    fn from_index(index: usize) -> Self {
        let value = (index + 1) as u32;
        VectorRef(NonZeroU32::new(value).unwrap())
    }

    #[inline]
    fn index(&self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// A node of the net tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeNode {
    /// Invisible parent of all top-level scopes and nets.
    Root,
    Scope(ScopeRef),
    Net(NetRef),
}

const SCOPE_SEPARATOR: char = '.';

#[derive(Debug, Clone)]
struct Net {
    short_name: String,
    full_name: String,
    vector: VectorRef,
    alias_of: Option<NetRef>,
    parent: Option<ScopeRef>,
}

#[derive(Debug, Clone)]
struct Scope {
    name: String,
    parent: Option<ScopeRef>,
    children: Vec<TreeNode>,
}

/// All nets of a trace together with their value history.
///
/// The model is filled through the [`TraceBuilder`] returned by [`TraceDataModel::start_building`]
/// and is read-only afterwards.
#[derive(Debug, Default, Clone)]
pub struct TraceDataModel {
    nets: Vec<Net>,
    scopes: Vec<Scope>,
    top: Vec<TreeNode>,
    vectors: Vec<TransitionVector>,
    full_name_to_net: FxHashMap<String, NetRef>,
    max_timestamp: Time,
    timescale_ns: Option<u64>,
}

// public implementation
impl TraceDataModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all nets and returns a builder for the new contents.
    pub fn start_building(&mut self) -> TraceDataModelBuilder<'_> {
        self.clear();
        TraceDataModelBuilder {
            model: self,
            scope_stack: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.nets.clear();
        self.scopes.clear();
        self.top.clear();
        self.vectors.clear();
        self.full_name_to_net.clear();
        self.max_timestamp = 0;
        self.timescale_ns = None;
    }

    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Returns an iterator over all nets in declaration order.
    pub fn nets(&self) -> impl ExactSizeIterator<Item = NetRef> + '_ {
        (0..self.nets.len()).map(|ii| NetRef::from_index(ii).unwrap())
    }

    /// Looks up a net by its full hierarchical name, e.g. `top.cpu.pc`.
    pub fn find_net(&self, full_name: &str) -> Option<NetRef> {
        self.full_name_to_net.get(full_name).copied()
    }

    pub fn net_width(&self, net: NetRef) -> u32 {
        self.transitions(net).width()
    }

    pub fn short_name(&self, net: NetRef) -> &str {
        &self.net(net).short_name
    }

    pub fn full_name(&self, net: NetRef) -> &str {
        &self.net(net).full_name
    }

    /// Returns the net whose value history this net shares, if it was declared as an alias.
    pub fn alias_of(&self, net: NetRef) -> Option<NetRef> {
        self.net(net).alias_of
    }

    pub fn transitions(&self, net: NetRef) -> &TransitionVector {
        &self.vectors[self.net(net).vector.index()]
    }

    /// Positions a cursor on the last transition of `net` at or before `timestamp`.
    pub fn find_transition(&self, net: NetRef, timestamp: Time) -> TransitionCursor<'_> {
        self.transitions(net).find_floor(timestamp)
    }

    /// Latest transition time over all nets. Computed when loading finishes.
    pub fn max_timestamp(&self) -> Time {
        self.max_timestamp
    }

    /// Number of nanoseconds per tick declared by the trace, if any.
    pub fn timescale_ns(&self) -> Option<u64> {
        self.timescale_ns
    }

    /// Number of distinct value histories. Smaller than `net_count` if nets are aliased.
    pub fn unique_vector_count(&self) -> usize {
        self.vectors.len()
    }
}

// net tree navigation
impl TraceDataModel {
    pub fn tree_root(&self) -> TreeNode {
        TreeNode::Root
    }

    fn children(&self, node: TreeNode) -> &[TreeNode] {
        match node {
            TreeNode::Root => &self.top,
            TreeNode::Scope(scope) => &self.scope(scope).children,
            TreeNode::Net(_) => &[],
        }
    }

    pub fn child_count(&self, node: TreeNode) -> usize {
        self.children(node).len()
    }

    pub fn child_at(&self, node: TreeNode, index: usize) -> Option<TreeNode> {
        self.children(node).get(index).copied()
    }

    /// Returns an iterator over the direct children of `node` in declaration order.
    pub fn child_nodes(&self, node: TreeNode) -> impl Iterator<Item = TreeNode> + '_ {
        self.children(node).iter().copied()
    }

    pub fn is_leaf(&self, node: TreeNode) -> bool {
        matches!(node, TreeNode::Net(_))
    }

    /// Local name of a scope or net. The root has an empty name.
    pub fn node_name(&self, node: TreeNode) -> &str {
        match node {
            TreeNode::Root => "",
            TreeNode::Scope(scope) => &self.scope(scope).name,
            TreeNode::Net(net) => &self.net(net).short_name,
        }
    }

    pub fn net_for_tree_node(&self, node: TreeNode) -> Option<NetRef> {
        match node {
            TreeNode::Net(net) => Some(net),
            _ => None,
        }
    }

    /// Full hierarchical name of a scope.
    pub fn scope_full_name(&self, scope: ScopeRef) -> String {
        let mut parents = Vec::new();
        let mut parent = self.scope(scope).parent;
        while let Some(id) = parent {
            parents.push(id);
            parent = self.scope(id).parent;
        }
        let mut out = String::new();
        for parent_id in parents.iter().rev() {
            out.push_str(&self.scope(*parent_id).name);
            out.push(SCOPE_SEPARATOR);
        }
        out.push_str(&self.scope(scope).name);
        out
    }

    /// Scope that the net was declared in.
    pub fn net_parent(&self, net: NetRef) -> Option<ScopeRef> {
        self.net(net).parent
    }
}

// private implementation
impl TraceDataModel {
    #[inline]
    fn net(&self, net: NetRef) -> &Net {
        &self.nets[net.index()]
    }

    #[inline]
    fn scope(&self, scope: ScopeRef) -> &Scope {
        &self.scopes[scope.index()]
    }
}

/// Write-only interface that trace loaders use to fill in a trace.
pub trait TraceBuilder {
    /// Opens a scope inside the current one.
    fn enter_module(&mut self, name: &str);
    /// Closes the current scope. Every call must match an earlier `enter_module`.
    fn exit_module(&mut self);
    /// Declares a net in the current scope. If `alias_of` refers to an existing net, the new
    /// net shares its value history and `width` is ignored.
    fn new_net(&mut self, short_name: &str, alias_of: Option<NetRef>, width: u32) -> NetRef;
    fn net_width(&self, net: NetRef) -> u32;
    /// Returns true if the current scope already contains a net called `short_name`.
    fn has_net(&self, _short_name: &str) -> bool {
        false
    }
    /// Timestamps must not decrease between calls for the same net.
    fn append_transition(&mut self, net: NetRef, timestamp: Time, value: &BitVector);
    /// Records the number of nanoseconds per tick of the source.
    fn set_timescale(&mut self, _ns_per_tick: u64) {}
    fn load_finished(&mut self);
}

struct ScopeStackEntry {
    scope: ScopeRef,
}

pub struct TraceDataModelBuilder<'a> {
    model: &'a mut TraceDataModel,
    scope_stack: Vec<ScopeStackEntry>,
}

impl TraceDataModelBuilder<'_> {
    fn current_scope(&self) -> Option<ScopeRef> {
        self.scope_stack.last().map(|e| e.scope)
    }

    fn add_to_tree(&mut self, node: TreeNode) {
        match self.current_scope() {
            None => self.model.top.push(node),
            Some(parent) => self.model.scopes[parent.index()].children.push(node),
        }
    }

    /// Checks to see if a scope of the same name already exists in the current scope.
    fn find_duplicate_scope(&self, name: &str) -> Option<ScopeRef> {
        let siblings = match self.current_scope() {
            None => &self.model.top,
            Some(parent) => &self.model.scopes[parent.index()].children,
        };
        siblings.iter().find_map(|node| match node {
            TreeNode::Scope(s) if self.model.scopes[s.index()].name == name => Some(*s),
            _ => None,
        })
    }

    fn full_name(&self, short_name: &str) -> String {
        let mut out = String::new();
        for entry in self.scope_stack.iter() {
            out.push_str(&self.model.scopes[entry.scope.index()].name);
            out.push(SCOPE_SEPARATOR);
        }
        out.push_str(short_name);
        out
    }
}

impl TraceBuilder for TraceDataModelBuilder<'_> {
    fn enter_module(&mut self, name: &str) {
        // re-opening an existing scope adds to it instead of creating a sibling with the same name
        let scope = match self.find_duplicate_scope(name) {
            Some(existing) => existing,
            None => {
                let scope = ScopeRef::from_index(self.model.scopes.len()).unwrap();
                let parent = self.current_scope();
                self.model.scopes.push(Scope {
                    name: name.to_string(),
                    parent,
                    children: Vec::new(),
                });
                self.add_to_tree(TreeNode::Scope(scope));
                scope
            }
        };
        self.scope_stack.push(ScopeStackEntry { scope });
    }

    fn exit_module(&mut self) {
        assert!(
            self.scope_stack.pop().is_some(),
            "exit_module called without a matching enter_module"
        );
    }

    fn new_net(&mut self, short_name: &str, alias_of: Option<NetRef>, width: u32) -> NetRef {
        let shared = alias_of.and_then(|id| self.model.nets.get(id.index()).map(|n| n.vector));
        let vector = match shared {
            Some(vector) => vector,
            None => {
                let vector = VectorRef::from_index(self.model.vectors.len());
                self.model.vectors.push(TransitionVector::new(width));
                vector
            }
        };
        let full_name = self.full_name(short_name);
        let net = NetRef::from_index(self.model.nets.len()).unwrap();
        let parent = self.current_scope();
        if let Some(previous) = self.model.full_name_to_net.insert(full_name.clone(), net) {
            log::warn!("net `{full_name}` hides net #{} in the name lookup", previous.index());
        }
        self.model.nets.push(Net {
            short_name: short_name.to_string(),
            full_name,
            vector,
            alias_of: shared.and(alias_of),
            parent,
        });
        self.add_to_tree(TreeNode::Net(net));
        net
    }

    fn has_net(&self, short_name: &str) -> bool {
        self.model
            .full_name_to_net
            .contains_key(&self.full_name(short_name))
    }

    fn net_width(&self, net: NetRef) -> u32 {
        self.model.net_width(net)
    }

    fn append_transition(&mut self, net: NetRef, timestamp: Time, value: &BitVector) {
        let vector = self.model.nets[net.index()].vector;
        self.model.vectors[vector.index()].append(timestamp, value);
    }

    fn set_timescale(&mut self, ns_per_tick: u64) {
        self.model.timescale_ns = Some(ns_per_tick);
    }

    fn load_finished(&mut self) {
        for vector in self.model.vectors.iter_mut() {
            vector.shrink_to_fit();
        }
        self.model.nets.shrink_to_fit();
        self.model.vectors.shrink_to_fit();
        self.model.max_timestamp = self
            .model
            .vectors
            .iter()
            .map(|v| v.max_timestamp())
            .max()
            .unwrap_or(0);
    }
}
