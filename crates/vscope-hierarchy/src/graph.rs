//! Whole-program class/interface graph.
//!
//! Nodes live in an arena addressed by [`TypeId`]; methods live in a parallel arena addressed by
//! [`MethodId`]. The graph is built in two passes (create nodes, then resolve references) and is
//! immutable afterwards. References to types that were never declared are not errors: the
//! referent is synthesized as an external node.

use std::collections::{BTreeSet, HashMap};

use vscope_classfile::ClassStub;
use vscope_config::AnalysisConfig;

use crate::context::{Context, Signature, TypeName};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("too many types allocated"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(u32);

impl MethodId {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("too many methods allocated"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
}

#[derive(Clone, Debug)]
pub struct TypeNode {
    pub name: TypeName,
    pub kind: TypeKind,
    /// `None` only for the universal root.
    pub parent: Option<TypeId>,
    /// Directly implemented (or, for interfaces, extended) interfaces, in declaration order.
    pub interfaces: Vec<TypeId>,
    /// Direct subclasses. Interfaces are never listed here.
    pub children: Vec<TypeId>,
    /// Types that list this interface directly.
    pub implementors: Vec<TypeId>,
    pub methods: Vec<MethodId>,
    pub external: bool,
    /// Created for an unresolved reference rather than from a declaration.
    pub synthesized: bool,
}

impl TypeNode {
    fn new(name: TypeName, kind: TypeKind, external: bool, synthesized: bool) -> Self {
        Self {
            name,
            kind,
            parent: None,
            interfaces: Vec::new(),
            children: Vec::new(),
            implementors: Vec::new(),
            methods: Vec::new(),
            external,
            synthesized,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }
}

#[derive(Clone, Debug)]
pub struct MethodDef {
    pub owner: TypeId,
    pub signature: Signature,
    pub is_abstract: bool,
    /// `false` for constructors, static and private methods.
    pub is_virtual: bool,
    /// Inherited from the owner.
    pub external: bool,
}

#[derive(Debug)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
    methods: Vec<MethodDef>,
    by_name: HashMap<TypeName, TypeId>,
    method_index: HashMap<(TypeId, Signature), MethodId>,
    root: TypeId,
    preorder: Vec<TypeId>,
    preorder_index: Vec<Option<usize>>,
    interface_closure: Vec<Vec<TypeId>>,
    implementors_closure: HashMap<TypeId, Vec<TypeId>>,
    has_external_descendant: Vec<bool>,
    below_unresolved: Vec<bool>,
    implements_external: Vec<bool>,
    external_interface_below: Vec<bool>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    Active,
    Done,
}

impl TypeGraph {
    pub fn build(ctx: &mut Context, classes: &[ClassStub], config: &AnalysisConfig) -> TypeGraph {
        let _span =
            tracing::info_span!(target: "vscope.graph", "build_type_graph", classes = classes.len())
                .entered();

        let root_name = ctx.intern_type(config.root_descriptor());
        let mut graph = TypeGraph {
            nodes: Vec::with_capacity(classes.len() + 1),
            methods: Vec::new(),
            by_name: HashMap::with_capacity(classes.len() + 1),
            method_index: HashMap::new(),
            root: TypeId(0),
            preorder: Vec::new(),
            preorder_index: Vec::new(),
            interface_closure: Vec::new(),
            implementors_closure: HashMap::new(),
            has_external_descendant: Vec::new(),
            below_unresolved: Vec::new(),
            implements_external: Vec::new(),
            external_interface_below: Vec::new(),
        };

        // Pass one: one node per declaration.
        let mut declared: Vec<(TypeId, &ClassStub)> = Vec::with_capacity(classes.len());
        for stub in classes {
            let name = ctx.intern_type(&stub.name);
            if graph.by_name.contains_key(&name) {
                tracing::warn!(
                    target: "vscope.graph",
                    class = %stub.name,
                    "duplicate class declaration; keeping the first"
                );
                continue;
            }
            let kind = if stub.is_interface() {
                TypeKind::Interface
            } else {
                TypeKind::Class
            };
            let id = graph.push_node(TypeNode::new(name, kind, stub.external, false));
            declared.push((id, stub));
        }

        graph.root = match graph.by_name.get(&root_name) {
            Some(root) => *root,
            None => {
                tracing::debug!(
                    target: "vscope.graph",
                    root = %ctx.type_str(root_name),
                    "universal root was not declared; synthesizing it as external"
                );
                graph.push_node(TypeNode::new(root_name, TypeKind::Class, true, true))
            }
        };
        let root = graph.root;

        // Pass two: resolve references and record methods.
        for (id, stub) in declared {
            let parent = if id == root {
                if let Some(super_class) = &stub.super_class {
                    tracing::warn!(
                        target: "vscope.graph",
                        root = %stub.name,
                        super_class = %super_class,
                        "universal root declares a superclass; ignoring it"
                    );
                }
                None
            } else if stub.is_interface() {
                Some(root)
            } else {
                match &stub.super_class {
                    Some(super_class) => {
                        let resolved = graph.resolve(ctx, super_class, TypeKind::Class);
                        if graph.nodes[resolved.index()].is_interface() {
                            tracing::warn!(
                                target: "vscope.graph",
                                class = %stub.name,
                                super_class = %super_class,
                                "superclass is an interface; re-parenting onto the root"
                            );
                            Some(root)
                        } else {
                            Some(resolved)
                        }
                    }
                    None => Some(root),
                }
            };
            graph.nodes[id.index()].parent = parent;

            let mut interfaces = Vec::with_capacity(stub.interfaces.len());
            for iface in &stub.interfaces {
                let resolved = graph.resolve(ctx, iface, TypeKind::Interface);
                if !graph.nodes[resolved.index()].is_interface() {
                    tracing::warn!(
                        target: "vscope.graph",
                        class = %stub.name,
                        interface = %iface,
                        "implemented type is a class; ignoring the edge"
                    );
                    continue;
                }
                if !interfaces.contains(&resolved) {
                    interfaces.push(resolved);
                }
            }
            graph.nodes[id.index()].interfaces = interfaces;

            for method in &stub.methods {
                let signature = Signature {
                    name: ctx.intern_name(&method.name),
                    proto: ctx.proto_from_descriptor(&method.parsed_descriptor),
                };
                if graph.method_index.contains_key(&(id, signature)) {
                    tracing::warn!(
                        target: "vscope.graph",
                        class = %stub.name,
                        method = %method.name,
                        descriptor = %method.descriptor,
                        "duplicate method declaration; keeping the first"
                    );
                    continue;
                }
                let method_id = MethodId::new(graph.methods.len());
                graph.methods.push(MethodDef {
                    owner: id,
                    signature,
                    is_abstract: method.is_abstract(),
                    is_virtual: method.is_virtual(),
                    external: stub.external,
                });
                graph.method_index.insert((id, signature), method_id);
                graph.nodes[id.index()].methods.push(method_id);
            }
        }

        graph.break_parent_cycles(ctx);
        graph.link_edges();
        graph.compute_preorder();
        graph.compute_interface_closures();
        graph.compute_derived_bits();

        tracing::debug!(
            target: "vscope.graph",
            types = graph.nodes.len(),
            synthesized = graph.nodes.iter().filter(|n| n.synthesized).count(),
            methods = graph.methods.len(),
            "type graph built"
        );
        graph
    }

    fn push_node(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId::new(self.nodes.len());
        self.by_name.insert(node.name, id);
        self.nodes.push(node);
        id
    }

    /// Resolve a type reference, synthesizing an external node when it is unknown.
    fn resolve(&mut self, ctx: &mut Context, descriptor: &str, kind: TypeKind) -> TypeId {
        let name = ctx.intern_type(descriptor);
        if let Some(id) = self.by_name.get(&name) {
            return *id;
        }
        tracing::debug!(
            target: "vscope.graph",
            reference = %descriptor,
            ?kind,
            "unresolved type reference; synthesizing an external node"
        );
        let mut node = TypeNode::new(name, kind, true, true);
        node.parent = Some(self.root);
        self.push_node(node)
    }

    /// Re-parent onto the root any node whose superclass chain loops back on itself.
    fn break_parent_cycles(&mut self, ctx: &Context) {
        let mut state = vec![Visit::Unvisited; self.nodes.len()];
        for start in 0..self.nodes.len() {
            let mut path: Vec<TypeId> = Vec::new();
            let mut current = Some(TypeId::new(start));
            while let Some(id) = current {
                match state[id.index()] {
                    Visit::Done => break,
                    Visit::Active => {
                        if let Some(&last) = path.last() {
                            tracing::warn!(
                                target: "vscope.graph",
                                class = %ctx.type_str(self.nodes[last.index()].name),
                                "superclass cycle; re-parenting onto the root"
                            );
                            self.nodes[last.index()].parent = Some(self.root);
                        }
                        break;
                    }
                    Visit::Unvisited => {
                        state[id.index()] = Visit::Active;
                        path.push(id);
                        current = self.nodes[id.index()].parent;
                    }
                }
            }
            for id in path {
                state[id.index()] = Visit::Done;
            }
        }
    }

    fn link_edges(&mut self) {
        for index in 0..self.nodes.len() {
            let id = TypeId::new(index);
            if let (Some(parent), TypeKind::Class) = (self.nodes[index].parent, self.nodes[index].kind) {
                self.nodes[parent.index()].children.push(id);
            }
            for iface in self.nodes[index].interfaces.clone() {
                self.nodes[iface.index()].implementors.push(id);
            }
        }
    }

    fn compute_preorder(&mut self) {
        let mut preorder_index = vec![None; self.nodes.len()];
        let mut preorder = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if preorder_index[id.index()].is_some() {
                continue;
            }
            preorder_index[id.index()] = Some(preorder.len());
            preorder.push(id);
            stack.extend(self.nodes[id.index()].children.iter().rev().copied());
        }
        self.preorder = preorder;
        self.preorder_index = preorder_index;
    }

    /// Transitive interface sets, memoized in post-order so diamonds are walked once.
    fn compute_interface_closures(&mut self) {
        let n = self.nodes.len();
        let mut state = vec![Visit::Unvisited; n];
        let mut closure: Vec<Option<Vec<TypeId>>> = vec![None; n];

        for start in 0..n {
            if state[start] != Visit::Unvisited {
                continue;
            }
            let mut stack = vec![(TypeId::new(start), false)];
            while let Some((id, expanded)) = stack.pop() {
                let node = &self.nodes[id.index()];
                let class_parent = match node.kind {
                    TypeKind::Class => node.parent,
                    TypeKind::Interface => None,
                };
                if expanded {
                    let mut set = BTreeSet::new();
                    for iface in &node.interfaces {
                        set.insert(*iface);
                        if let Some(inherited) = &closure[iface.index()] {
                            set.extend(inherited.iter().copied());
                        }
                    }
                    if let Some(parent) = class_parent {
                        if let Some(inherited) = &closure[parent.index()] {
                            set.extend(inherited.iter().copied());
                        }
                    }
                    closure[id.index()] = Some(set.into_iter().collect());
                    state[id.index()] = Visit::Done;
                    continue;
                }
                if state[id.index()] != Visit::Unvisited {
                    continue;
                }
                state[id.index()] = Visit::Active;
                stack.push((id, true));
                for dep in node.interfaces.iter().copied().chain(class_parent) {
                    if state[dep.index()] == Visit::Unvisited {
                        stack.push((dep, false));
                    }
                }
            }
        }

        self.interface_closure = closure.into_iter().map(Option::unwrap_or_default).collect();

        let mut implementors_closure: HashMap<TypeId, Vec<TypeId>> = HashMap::new();
        for &class in &self.preorder {
            for &iface in &self.interface_closure[class.index()] {
                implementors_closure.entry(iface).or_default().push(class);
            }
        }
        self.implementors_closure = implementors_closure;
    }

    fn compute_derived_bits(&mut self) {
        let n = self.nodes.len();
        let mut has_external_descendant = vec![false; n];
        let mut below_unresolved = vec![false; n];
        let mut external_interface_below = vec![false; n];
        let implements_external: Vec<bool> = (0..n)
            .map(|index| {
                self.interface_closure[index]
                    .iter()
                    .any(|iface| self.nodes[iface.index()].external)
            })
            .collect();

        for &id in &self.preorder {
            let unresolved_here =
                below_unresolved[id.index()] || (self.nodes[id.index()].synthesized && id != self.root);
            for &child in &self.nodes[id.index()].children {
                below_unresolved[child.index()] = unresolved_here;
            }
        }

        for &id in self.preorder.iter().rev() {
            let mut external_below = false;
            let mut contract_below = implements_external[id.index()];
            for &child in &self.nodes[id.index()].children {
                external_below |=
                    self.nodes[child.index()].external || has_external_descendant[child.index()];
                contract_below |= external_interface_below[child.index()];
            }
            has_external_descendant[id.index()] = external_below;
            external_interface_below[id.index()] = contract_below;
        }

        self.has_external_descendant = has_external_descendant;
        self.below_unresolved = below_unresolved;
        self.implements_external = implements_external;
        self.external_interface_below = external_interface_below;
    }

    pub fn root(&self) -> TypeId {
        self.root
    }

    /// Number of types, synthesized ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.index()]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (TypeId, &TypeNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (TypeId::new(index), node))
    }

    pub fn method(&self, id: MethodId) -> &MethodDef {
        &self.methods[id.index()]
    }

    pub fn methods(&self) -> impl Iterator<Item = (MethodId, &MethodDef)> + '_ {
        self.methods
            .iter()
            .enumerate()
            .map(|(index, method)| (MethodId::new(index), method))
    }

    pub fn methods_of(&self, id: TypeId) -> &[MethodId] {
        &self.nodes[id.index()].methods
    }

    pub fn lookup(&self, name: TypeName) -> Option<TypeId> {
        self.by_name.get(&name).copied()
    }

    pub fn lookup_descriptor(&self, ctx: &Context, descriptor: &str) -> Option<TypeId> {
        self.lookup(ctx.get_type(descriptor)?)
    }

    pub fn find_method(&self, owner: TypeId, signature: Signature) -> Option<MethodId> {
        self.method_index.get(&(owner, signature)).copied()
    }

    /// Look a method up by owner descriptor, name and method descriptor.
    pub fn resolve_method(
        &self,
        ctx: &Context,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<MethodId> {
        let owner = self.lookup_descriptor(ctx, owner)?;
        self.find_method(owner, ctx.lookup_signature(name, descriptor)?)
    }

    pub fn parent(&self, id: TypeId) -> Option<TypeId> {
        self.nodes[id.index()].parent
    }

    /// Strict ancestors, nearest first, ending with the root.
    pub fn ancestors(&self, id: TypeId) -> Ancestors<'_> {
        Ancestors {
            graph: self,
            next: self.parent(id),
        }
    }

    pub fn direct_subclasses(&self, id: TypeId) -> &[TypeId] {
        &self.nodes[id.index()].children
    }

    pub fn direct_implementors(&self, iface: TypeId) -> &[TypeId] {
        &self.nodes[iface.index()].implementors
    }

    /// Every interface `id` implements or extends, directly or transitively, sorted by id.
    pub fn interface_closure(&self, id: TypeId) -> &[TypeId] {
        &self.interface_closure[id.index()]
    }

    /// Every class whose interface closure contains `iface`, in hierarchy pre-order.
    pub fn implementors_of(&self, iface: TypeId) -> &[TypeId] {
        self.implementors_closure
            .get(&iface)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn implements(&self, id: TypeId, iface: TypeId) -> bool {
        self.interface_closure(id).binary_search(&iface).is_ok()
    }

    /// `true` when `class` lists `iface` itself, or lists an interface that extends it.
    pub fn introduces(&self, class: TypeId, iface: TypeId) -> bool {
        self.nodes[class.index()]
            .interfaces
            .iter()
            .any(|&direct| direct == iface || self.implements(direct, iface))
    }

    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        sub == sup || self.ancestors(sub).any(|a| a == sup) || self.implements(sub, sup)
    }

    /// Classes reachable from the root, parents before children, siblings in declaration order.
    pub fn preorder(&self) -> &[TypeId] {
        &self.preorder
    }

    pub fn preorder_index(&self, id: TypeId) -> Option<usize> {
        self.preorder_index[id.index()]
    }

    /// Some strict descendant class is external, so overrides below `id` may exist unseen.
    pub fn has_external_descendant(&self, id: TypeId) -> bool {
        self.has_external_descendant[id.index()]
    }

    /// Some strict ancestor (other than the root) was synthesized for an unresolved reference.
    pub fn below_unresolved(&self, id: TypeId) -> bool {
        self.below_unresolved[id.index()]
    }

    /// The interface closure of `id` contains an external interface.
    pub fn implements_external(&self, id: TypeId) -> bool {
        self.implements_external[id.index()]
    }

    /// `id` or one of its descendants implements an external interface.
    pub fn external_interface_below(&self, id: TypeId) -> bool {
        self.external_interface_below[id.index()]
    }
}

pub struct Ancestors<'g> {
    graph: &'g TypeGraph,
    next: Option<TypeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = TypeId;

    fn next(&mut self) -> Option<TypeId> {
        let current = self.next?;
        self.next = self.graph.parent(current);
        Some(current)
    }
}
