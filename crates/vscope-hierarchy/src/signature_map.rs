//! Signature bucketing and the read-only query surface over the finished scopes.

use std::collections::{BTreeMap, HashMap};

use indexmap::IndexMap;
use rayon::prelude::*;
use vscope_config::AnalysisConfig;

use crate::classify::classify;
use crate::context::{Name, ProtoId, Signature};
use crate::flags::{VirtualFlag, VirtualFlags};
use crate::graph::{MethodId, TypeGraph, TypeId};
use crate::interfaces::merge_interfaces;
use crate::scope::{assemble, VirtualMethod, VirtualScope};

pub type VirtualScopes = Vec<VirtualScope>;
pub type ProtoMap = IndexMap<ProtoId, VirtualScopes>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MethodSlot {
    signature: Signature,
    scope: usize,
    member: usize,
}

/// Name → prototype → ordered scopes, for every virtual method of one snapshot.
#[derive(Debug, Default)]
pub struct SignatureMap {
    names: IndexMap<Name, ProtoMap>,
    method_slots: HashMap<MethodId, MethodSlot>,
    interface_scopes: HashMap<(TypeId, Signature), Vec<usize>>,
    obligations: IndexMap<Signature, Vec<MethodId>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignatureMapStats {
    pub names: usize,
    pub signatures: usize,
    pub scopes: usize,
    pub methods: usize,
    pub flag_counts: BTreeMap<VirtualFlag, usize>,
}

impl SignatureMap {
    pub fn build(graph: &TypeGraph, config: &AnalysisConfig) -> SignatureMap {
        let _span = tracing::info_span!(
            target: "vscope.signatures",
            "build_signature_map",
            parallel = config.parallel
        )
        .entered();

        let mut buckets: IndexMap<Signature, Vec<MethodId>> = IndexMap::new();
        let mut obligations: IndexMap<Signature, Vec<MethodId>> = IndexMap::new();
        let mut skipped = 0usize;
        for (id, method) in graph.methods() {
            if !method.is_virtual {
                skipped += 1;
                continue;
            }
            if !graph.node(method.owner).is_interface() {
                buckets.entry(method.signature).or_default().push(id);
            } else if method.is_abstract {
                obligations.entry(method.signature).or_default().push(id);
            } else {
                // Default bodies are not contracts a class has to service.
                skipped += 1;
            }
        }
        tracing::debug!(
            target: "vscope.signatures",
            buckets = buckets.len(),
            obligations = obligations.len(),
            skipped,
            "bucketed virtual methods"
        );

        let buckets: Vec<(Signature, Vec<MethodId>)> = buckets.into_iter().collect();
        let assemble_bucket = |(signature, methods): &(Signature, Vec<MethodId>)| {
            let mut bucket = assemble(graph, *signature, methods);
            let declared = obligations.get(signature).map(Vec::as_slice).unwrap_or(&[]);
            merge_interfaces(graph, &mut bucket, declared);
            tracing::trace!(
                target: "vscope.signatures",
                methods = methods.len(),
                scopes = bucket.scopes.len(),
                "assembled bucket"
            );
            classify(graph, bucket)
        };
        let assembled: Vec<VirtualScopes> = if config.parallel {
            buckets.par_iter().map(assemble_bucket).collect()
        } else {
            buckets.iter().map(assemble_bucket).collect()
        };

        let mut map = SignatureMap {
            names: IndexMap::new(),
            method_slots: HashMap::new(),
            interface_scopes: HashMap::new(),
            obligations,
        };
        for ((signature, _), scopes) in buckets.iter().zip(assembled) {
            map.insert_scopes(*signature, scopes);
        }

        let stats = map.stats();
        tracing::info!(
            target: "vscope.signatures",
            names = stats.names,
            signatures = stats.signatures,
            scopes = stats.scopes,
            methods = stats.methods,
            flags = ?stats.flag_counts,
            "signature map built"
        );
        map
    }

    fn insert_scopes(&mut self, signature: Signature, scopes: VirtualScopes) {
        for (scope_idx, scope) in scopes.iter().enumerate() {
            for (member, vmethod) in scope.methods.iter().enumerate() {
                self.method_slots.insert(
                    vmethod.method,
                    MethodSlot {
                        signature,
                        scope: scope_idx,
                        member,
                    },
                );
            }
            for &iface in &scope.interfaces {
                self.interface_scopes
                    .entry((iface, signature))
                    .or_default()
                    .push(scope_idx);
            }
        }
        self.names
            .entry(signature.name)
            .or_default()
            .insert(signature.proto, scopes);
    }

    /// Number of distinct method names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        self.names.keys().copied()
    }

    pub fn protos(&self, name: Name) -> Option<&ProtoMap> {
        self.names.get(&name)
    }

    pub fn scopes(&self, signature: Signature) -> &[VirtualScope] {
        self.scopes_by_name(signature.name, signature.proto)
    }

    pub fn scopes_by_name(&self, name: Name, proto: ProtoId) -> &[VirtualScope] {
        self.names
            .get(&name)
            .and_then(|protos| protos.get(&proto))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn slot(&self, method: MethodId) -> Option<(MethodSlot, &VirtualScope)> {
        let slot = *self.method_slots.get(&method)?;
        let scope = self.scopes(slot.signature).get(slot.scope)?;
        Some((slot, scope))
    }

    /// Flag set of a class-owned virtual method. `None` for interface methods and methods that
    /// never take part in dispatch.
    pub fn flags_of(&self, method: MethodId) -> Option<VirtualFlags> {
        let (slot, scope) = self.slot(method)?;
        scope.methods.get(slot.member).map(|m| m.flags)
    }

    pub fn scope_of(&self, method: MethodId) -> Option<&VirtualScope> {
        self.slot(method).map(|(_, scope)| scope)
    }

    /// The first scope (in hierarchy pre-order) servicing `iface` for `signature`.
    pub fn servicing_scope(&self, iface: TypeId, signature: Signature) -> Option<&VirtualScope> {
        self.servicing_scopes(iface, signature).next()
    }

    /// Every scope servicing `iface` for `signature`; unrelated branches can each supply one.
    pub fn servicing_scopes(
        &self,
        iface: TypeId,
        signature: Signature,
    ) -> impl Iterator<Item = &VirtualScope> + '_ {
        let scopes = self.scopes(signature);
        self.interface_scopes
            .get(&(iface, signature))
            .into_iter()
            .flatten()
            .filter_map(move |&idx| scopes.get(idx))
    }

    /// Abstract interface methods declaring `signature`.
    pub fn interface_methods(&self, signature: Signature) -> &[MethodId] {
        self.obligations
            .get(&signature)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter_scopes(&self) -> impl Iterator<Item = &VirtualScope> + '_ {
        self.names
            .values()
            .flat_map(|protos| protos.values())
            .flatten()
    }

    pub fn iter_methods(&self) -> impl Iterator<Item = &VirtualMethod> + '_ {
        self.iter_scopes().flat_map(|scope| scope.methods.iter())
    }

    pub fn stats(&self) -> SignatureMapStats {
        let mut stats = SignatureMapStats {
            names: self.names.len(),
            signatures: self.names.values().map(IndexMap::len).sum(),
            ..SignatureMapStats::default()
        };
        for scope in self.iter_scopes() {
            stats.scopes += 1;
            for vmethod in &scope.methods {
                stats.methods += 1;
                for flag in vmethod.flags.iter() {
                    *stats.flag_counts.entry(flag).or_default() += 1;
                }
            }
        }
        stats
    }
}
