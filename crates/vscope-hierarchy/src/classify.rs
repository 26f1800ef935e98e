use crate::flags::{VirtualFlag, VirtualFlags};
use crate::graph::{TypeGraph, TypeId};
use crate::scope::{AssembledBucket, ScopeDraft, VirtualMethod, VirtualScope};

/// Compute the final flag set of every definition and freeze the bucket into scopes.
pub(crate) fn classify(graph: &TypeGraph, bucket: AssembledBucket) -> Vec<VirtualScope> {
    bucket
        .scopes
        .iter()
        .map(|draft| classify_scope(graph, &bucket, draft))
        .collect()
}

fn classify_scope(graph: &TypeGraph, bucket: &AssembledBucket, draft: &ScopeDraft) -> VirtualScope {
    let len = draft.members.len();
    let mut overridden = vec![false; len];
    for member in &draft.members {
        if let Some(parent) = member.parent {
            overridden[parent] = true;
        }
    }

    // Members are in pre-order, so a parent is always classified before its overrides.
    let mut flags: Vec<VirtualFlags> = Vec::with_capacity(len);
    for (idx, member) in draft.members.iter().enumerate() {
        let owner = member.owner;
        let mut set = VirtualFlags::empty();

        set.insert(match member.parent {
            None => VirtualFlag::TopDef,
            Some(_) => VirtualFlag::Override,
        });
        set.set(
            VirtualFlag::Final,
            !overridden[idx] && !graph.has_external_descendant(owner),
        );
        set.set(VirtualFlag::Impl, member.implements);
        set.set(VirtualFlag::Miranda, member.miranda);

        let escaped = graph.node(owner).external
            || graph.has_external_descendant(owner)
            || graph.below_unresolved(owner)
            || member
                .parent
                .is_some_and(|parent| flags[parent].contains(VirtualFlag::Escaped))
            || dispatches_to_external_contract(graph, bucket, owner);
        set.set(VirtualFlag::Escaped, escaped);

        flags.push(set);
    }

    VirtualScope {
        root: draft.root,
        signature: bucket.signature,
        methods: draft
            .members
            .iter()
            .zip(flags)
            .map(|(member, flags)| VirtualMethod {
                method: member.method,
                flags,
            })
            .collect(),
        interfaces: draft.interfaces.clone(),
    }
}

/// Whether `owner`, or a descendant that still dispatches to `owner`'s definition, implements an
/// interface the analysis cannot see. Callers through that interface are outside the program.
fn dispatches_to_external_contract(graph: &TypeGraph, bucket: &AssembledBucket, owner: TypeId) -> bool {
    if !graph.external_interface_below(owner) {
        return false;
    }
    let mut stack = vec![owner];
    while let Some(class) = stack.pop() {
        if graph.implements_external(class) {
            return true;
        }
        stack.extend(
            graph
                .direct_subclasses(class)
                .iter()
                .copied()
                .filter(|&child| {
                    graph.external_interface_below(child) && !bucket.by_owner.contains_key(&child)
                }),
        );
    }
    false
}
