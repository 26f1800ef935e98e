use vscope_classfile::{ClassStub, MethodStub};
use vscope_config::AnalysisConfig;
use vscope_hierarchy::{
    Analysis, Context, MethodId, Signature, TypeId, VirtualFlags, VirtualScope,
};

pub const OBJECT: &str = "Ljava/lang/Object;";

/// Distinct method names declared by [`object`].
pub const OBJECT_METHOD_NAMES: usize = 8;

/// The universal root as a library class: external, with the usual virtual methods.
pub fn object() -> ClassStub {
    [
        ("equals", "(Ljava/lang/Object;)Z"),
        ("hashCode", "()I"),
        ("toString", "()Ljava/lang/String;"),
        ("wait", "()V"),
        ("wait", "(J)V"),
        ("wait", "(JI)V"),
        ("notify", "()V"),
        ("notifyAll", "()V"),
        ("clone", "()Ljava/lang/Object;"),
        ("finalize", "()V"),
    ]
    .into_iter()
    .fold(ClassStub::class(OBJECT).unwrap().external(), |stub, (name, desc)| {
        stub.method(vm(name, desc))
    })
}

pub fn class(name: &str) -> ClassStub {
    ClassStub::class(name).unwrap().extends(OBJECT)
}

pub fn interface(name: &str) -> ClassStub {
    ClassStub::interface(name).unwrap()
}

pub fn vm(name: &str, desc: &str) -> MethodStub {
    MethodStub::virtual_method(name, desc).unwrap()
}

pub fn am(name: &str, desc: &str) -> MethodStub {
    MethodStub::abstract_method(name, desc).unwrap()
}

pub struct Fixture {
    pub ctx: Context,
    pub analysis: Analysis,
}

impl Fixture {
    pub fn build(classes: Vec<ClassStub>) -> Fixture {
        Self::build_with(classes, &AnalysisConfig::default())
    }

    pub fn build_with(classes: Vec<ClassStub>, config: &AnalysisConfig) -> Fixture {
        let mut ctx = Context::new();
        let analysis = Analysis::build(&mut ctx, &classes, config);
        Fixture { ctx, analysis }
    }

    pub fn ty(&self, desc: &str) -> TypeId {
        self.analysis
            .graph
            .lookup_descriptor(&self.ctx, desc)
            .unwrap_or_else(|| panic!("unknown type {desc}"))
    }

    pub fn sig(&self, name: &str, desc: &str) -> Signature {
        self.ctx
            .lookup_signature(name, desc)
            .unwrap_or_else(|| panic!("unknown signature {name}{desc}"))
    }

    pub fn method(&self, owner: &str, name: &str, desc: &str) -> MethodId {
        self.analysis
            .graph
            .resolve_method(&self.ctx, owner, name, desc)
            .unwrap_or_else(|| panic!("unknown method {owner}.{name}{desc}"))
    }

    pub fn flags(&self, owner: &str, name: &str, desc: &str) -> VirtualFlags {
        self.analysis
            .signatures
            .flags_of(self.method(owner, name, desc))
            .unwrap_or_else(|| panic!("{owner}.{name}{desc} has no flags"))
    }

    pub fn scope(&self, owner: &str, name: &str, desc: &str) -> &VirtualScope {
        self.analysis
            .signatures
            .scope_of(self.method(owner, name, desc))
            .unwrap_or_else(|| panic!("{owner}.{name}{desc} has no scope"))
    }

    /// Owners of a scope's definitions, in scope order.
    pub fn owners(&self, scope: &VirtualScope) -> Vec<String> {
        scope
            .methods
            .iter()
            .map(|m| {
                let owner = self.analysis.graph.method(m.method).owner;
                self.ctx
                    .type_str(self.analysis.graph.node(owner).name)
                    .to_owned()
            })
            .collect()
    }

    /// Every expectation as `(owner, name, desc, flags)`; all other class methods must carry
    /// `default`.
    pub fn assert_flags(&self, expected: &[(&str, &str, &str, VirtualFlags)], default: VirtualFlags) {
        let mut seen = Vec::new();
        for &(owner, name, desc, flags) in expected {
            let method = self.method(owner, name, desc);
            seen.push(method);
            assert_eq!(
                self.flags(owner, name, desc),
                flags,
                "flags of {owner}.{name}{desc}"
            );
        }
        for vmethod in self.analysis.signatures.iter_methods() {
            if seen.contains(&vmethod.method) {
                continue;
            }
            let def = self.analysis.graph.method(vmethod.method);
            assert_eq!(
                vmethod.flags,
                default,
                "flags of {}.{}",
                self.ctx.type_str(self.analysis.graph.node(def.owner).name),
                self.ctx.display_signature(def.signature)
            );
        }
    }
}
