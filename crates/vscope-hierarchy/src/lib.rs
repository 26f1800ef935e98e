//! Virtual dispatch scopes over a whole-program class hierarchy.
//!
//! The analysis runs once per snapshot of class declarations:
//!
//! 1. [`TypeGraph::build`] links declarations into an arena graph, synthesizing external nodes
//!    for references it cannot resolve.
//! 2. [`SignatureMap::build`] buckets virtual methods by name and prototype, partitions every
//!    bucket into override scopes, attaches the interfaces each scope services and computes the
//!    [`VirtualFlags`] of every definition.
//!
//! Nothing here fails: malformed or partial input degrades to conservative flags (`ESCAPED`,
//! not `FINAL`). Both structures are immutable once built and are rebuilt from scratch when the
//! class set changes.

#![forbid(unsafe_code)]

mod classify;
mod context;
mod flags;
mod graph;
mod interfaces;
mod scope;
mod signature_map;

pub use context::{Context, Name, ProtoId, Prototype, Signature, TypeName};
pub use flags::{VirtualFlag, VirtualFlags};
pub use graph::{Ancestors, MethodDef, MethodId, TypeGraph, TypeId, TypeKind, TypeNode};
pub use scope::{VirtualMethod, VirtualScope};
pub use signature_map::{ProtoMap, SignatureMap, SignatureMapStats, VirtualScopes};

use vscope_classfile::ClassStub;
use vscope_config::AnalysisConfig;

/// The type graph and signature map of one snapshot.
#[derive(Debug)]
pub struct Analysis {
    pub graph: TypeGraph,
    pub signatures: SignatureMap,
}

impl Analysis {
    pub fn build(ctx: &mut Context, classes: &[ClassStub], config: &AnalysisConfig) -> Analysis {
        let graph = TypeGraph::build(ctx, classes, config);
        let signatures = SignatureMap::build(&graph, config);
        Analysis { graph, signatures }
    }

    /// Look a method up by owner descriptor, name and method descriptor, then return its flags.
    pub fn flags(&self, ctx: &Context, owner: &str, name: &str, descriptor: &str) -> Option<VirtualFlags> {
        let method = self.graph.resolve_method(ctx, owner, name, descriptor)?;
        self.signatures.flags_of(method)
    }

    /// The first scope servicing `iface` (a type descriptor) for `name` and `descriptor`.
    pub fn servicing_scope(
        &self,
        ctx: &Context,
        iface: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<&VirtualScope> {
        let iface = self.graph.lookup_descriptor(ctx, iface)?;
        let signature = ctx.lookup_signature(name, descriptor)?;
        self.signatures.servicing_scope(iface, signature)
    }
}
