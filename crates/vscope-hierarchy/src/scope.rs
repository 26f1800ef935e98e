//! Partition of one signature bucket into override scopes.

use std::collections::{BTreeSet, HashMap};

use crate::context::Signature;
use crate::flags::VirtualFlags;
use crate::graph::{MethodId, TypeGraph, TypeId};

/// One definition inside a [`VirtualScope`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VirtualMethod {
    pub method: MethodId,
    pub flags: VirtualFlags,
}

/// Every definition occupying one dispatch slot, in hierarchy pre-order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VirtualScope {
    /// Topmost class introducing the slot.
    pub root: TypeId,
    pub signature: Signature,
    pub methods: Vec<VirtualMethod>,
    /// Interfaces this scope services.
    pub interfaces: BTreeSet<TypeId>,
}

impl VirtualScope {
    /// The scope root's definition.
    pub fn top_def(&self) -> Option<&VirtualMethod> {
        self.methods.first()
    }

    pub fn contains(&self, method: MethodId) -> bool {
        self.methods.iter().any(|m| m.method == method)
    }

    pub fn position(&self, method: MethodId) -> Option<usize> {
        self.methods.iter().position(|m| m.method == method)
    }
}

/// Position of a definition inside an [`AssembledBucket`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Slot {
    pub(crate) scope: usize,
    pub(crate) member: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct DraftMember {
    pub(crate) method: MethodId,
    pub(crate) owner: TypeId,
    /// Index of the nearest ancestor definition in the same scope.
    pub(crate) parent: Option<usize>,
    pub(crate) is_abstract: bool,
    pub(crate) implements: bool,
    pub(crate) miranda: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct ScopeDraft {
    pub(crate) root: TypeId,
    pub(crate) members: Vec<DraftMember>,
    pub(crate) interfaces: BTreeSet<TypeId>,
}

/// Scopes for one signature before interface merging and flag classification.
#[derive(Clone, Debug)]
pub(crate) struct AssembledBucket {
    pub(crate) signature: Signature,
    pub(crate) scopes: Vec<ScopeDraft>,
    /// Owning class of every definition in the bucket.
    pub(crate) by_owner: HashMap<TypeId, Slot>,
}

impl AssembledBucket {
    pub(crate) fn member(&self, slot: Slot) -> &DraftMember {
        &self.scopes[slot.scope].members[slot.member]
    }

    pub(crate) fn member_mut(&mut self, slot: Slot) -> &mut DraftMember {
        &mut self.scopes[slot.scope].members[slot.member]
    }

    /// Nearest definition visible from `class`: its own, else the closest ancestor's.
    pub(crate) fn nearest_definition(&self, graph: &TypeGraph, class: TypeId) -> Option<Slot> {
        std::iter::once(class)
            .chain(graph.ancestors(class))
            .find_map(|ty| self.by_owner.get(&ty).copied())
    }
}

/// Group the class-owned definitions of `signature` into disjoint scopes.
///
/// Definitions are visited in hierarchy pre-order so a definition's ancestors are always placed
/// before it. A definition joins the scope of its nearest ancestor definition, or roots a new
/// scope when no strict ancestor defines the signature.
pub(crate) fn assemble(graph: &TypeGraph, signature: Signature, methods: &[MethodId]) -> AssembledBucket {
    let mut ordered: Vec<MethodId> = methods.to_vec();
    ordered.sort_by_key(|&method| {
        let owner = graph.method(method).owner;
        (graph.preorder_index(owner).unwrap_or(usize::MAX), method)
    });

    let mut bucket = AssembledBucket {
        signature,
        scopes: Vec::new(),
        by_owner: HashMap::with_capacity(ordered.len()),
    };

    for method in ordered {
        let def = graph.method(method);
        let owner = def.owner;
        if bucket.by_owner.contains_key(&owner) {
            continue;
        }

        let inherited = graph
            .ancestors(owner)
            .find_map(|ancestor| bucket.by_owner.get(&ancestor).copied());
        let slot = match inherited {
            Some(parent) => {
                let scope = &mut bucket.scopes[parent.scope];
                scope.members.push(DraftMember {
                    method,
                    owner,
                    parent: Some(parent.member),
                    is_abstract: def.is_abstract,
                    implements: false,
                    miranda: false,
                });
                Slot {
                    scope: parent.scope,
                    member: scope.members.len() - 1,
                }
            }
            None => {
                bucket.scopes.push(ScopeDraft {
                    root: owner,
                    members: vec![DraftMember {
                        method,
                        owner,
                        parent: None,
                        is_abstract: def.is_abstract,
                        implements: false,
                        miranda: false,
                    }],
                    interfaces: BTreeSet::new(),
                });
                Slot {
                    scope: bucket.scopes.len() - 1,
                    member: 0,
                }
            }
        };
        bucket.by_owner.insert(owner, slot);
    }

    bucket
}
