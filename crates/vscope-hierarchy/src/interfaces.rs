//! Attach interface obligations to the scopes that service them.

use std::collections::BTreeSet;

use crate::graph::{MethodId, TypeGraph, TypeId};
use crate::scope::AssembledBucket;

/// For every interface declaring the bucket's signature abstract, mark the definition each implementing
/// class dispatches to.
///
/// The nearest definition of an implementing class gets `implements` and the interface joins its
/// scope. When the class is where the interface enters the hierarchy, the definition is also
/// marked `miranda`. A class whose nearest definition is abstract, or that has none, is an
/// abstract gap and contributes nothing.
pub(crate) fn merge_interfaces(graph: &TypeGraph, bucket: &mut AssembledBucket, obligations: &[MethodId]) {
    let declaring: BTreeSet<TypeId> = obligations
        .iter()
        .map(|&method| graph.method(method))
        .filter(|def| def.is_abstract)
        .map(|def| def.owner)
        .collect();

    for iface in declaring {
        let mut gaps = 0usize;
        for &class in graph.implementors_of(iface) {
            let Some(slot) = bucket.nearest_definition(graph, class) else {
                gaps += 1;
                continue;
            };
            if bucket.member(slot).is_abstract {
                gaps += 1;
                continue;
            }
            let introduces = graph.introduces(class, iface);
            let member = bucket.member_mut(slot);
            member.implements = true;
            member.miranda |= introduces;
            bucket.scopes[slot.scope].interfaces.insert(iface);
        }
        if gaps > 0 {
            tracing::trace!(
                target: "vscope.signatures",
                interface = iface.index(),
                gaps,
                "implementing classes without a concrete definition"
            );
        }
    }
}
