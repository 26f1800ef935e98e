use std::fmt;

use indexmap::IndexSet;
use lasso::{Rodeo, Spur};
use vscope_classfile::{parse_method_descriptor, MethodDescriptor};

/// Interned method name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Spur);

/// Interned type descriptor (`I`, `[J`, `Ljava/lang/Object;`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Spur);

/// Index of an interned [`Prototype`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProtoId(u32);

impl ProtoId {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("too many prototypes interned"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Return type and ordered parameter types of a method. Equality is structural.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Prototype {
    pub return_type: TypeName,
    pub params: Vec<TypeName>,
}

/// The dispatch key: two methods can only override each other when both parts match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    pub name: Name,
    pub proto: ProtoId,
}

/// Interning tables for one analysis run.
///
/// Every handle produced by a context is only meaningful for that context. Create one per
/// snapshot, pass it to the builders, and drop (or [`Context::reset`]) it when the run ends.
#[derive(Default)]
pub struct Context {
    strings: Rodeo,
    protos: IndexSet<Prototype>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("strings", &self.strings.len())
            .field("protos", &self.protos.len())
            .finish()
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every interned value. Handles obtained before the reset must not be used again.
    pub fn reset(&mut self) {
        self.strings = Rodeo::default();
        self.protos.clear();
    }

    pub fn intern_name(&mut self, name: &str) -> Name {
        Name(self.strings.get_or_intern(name))
    }

    pub fn intern_type(&mut self, descriptor: &str) -> TypeName {
        TypeName(self.strings.get_or_intern(descriptor))
    }

    pub fn get_name(&self, name: &str) -> Option<Name> {
        self.strings.get(name).map(Name)
    }

    pub fn get_type(&self, descriptor: &str) -> Option<TypeName> {
        self.strings.get(descriptor).map(TypeName)
    }

    pub fn name_str(&self, name: Name) -> &str {
        self.strings.resolve(&name.0)
    }

    pub fn type_str(&self, ty: TypeName) -> &str {
        self.strings.resolve(&ty.0)
    }

    pub fn intern_proto(&mut self, return_type: TypeName, params: Vec<TypeName>) -> ProtoId {
        let (index, _) = self.protos.insert_full(Prototype {
            return_type,
            params,
        });
        ProtoId::new(index)
    }

    pub fn proto_from_descriptor(&mut self, desc: &MethodDescriptor) -> ProtoId {
        let return_type = self.intern_type(&desc.return_type.descriptor());
        let params = desc
            .params
            .iter()
            .map(|param| self.intern_type(&param.descriptor()))
            .collect();
        self.intern_proto(return_type, params)
    }

    pub fn parse_proto(&mut self, descriptor: &str) -> vscope_classfile::Result<ProtoId> {
        let desc = parse_method_descriptor(descriptor)?;
        Ok(self.proto_from_descriptor(&desc))
    }

    /// Look up an already interned prototype without interning anything.
    pub fn lookup_proto(&self, descriptor: &str) -> Option<ProtoId> {
        let desc = parse_method_descriptor(descriptor).ok()?;
        let return_type = self.get_type(&desc.return_type.descriptor())?;
        let params = desc
            .params
            .iter()
            .map(|param| self.get_type(&param.descriptor()))
            .collect::<Option<Vec<_>>>()?;
        let index = self.protos.get_index_of(&Prototype {
            return_type,
            params,
        })?;
        Some(ProtoId::new(index))
    }

    pub fn signature(&mut self, name: &str, descriptor: &str) -> vscope_classfile::Result<Signature> {
        let proto = self.parse_proto(descriptor)?;
        Ok(Signature {
            name: self.intern_name(name),
            proto,
        })
    }

    pub fn lookup_signature(&self, name: &str, descriptor: &str) -> Option<Signature> {
        Some(Signature {
            name: self.get_name(name)?,
            proto: self.lookup_proto(descriptor)?,
        })
    }

    pub fn proto(&self, id: ProtoId) -> Option<&Prototype> {
        self.protos.get_index(id.index())
    }

    /// Render a prototype back to descriptor form, e.g. `(ILjava/lang/String;)V`.
    pub fn display_proto(&self, id: ProtoId) -> String {
        let Some(proto) = self.proto(id) else {
            return format!("<proto #{}>", id.0);
        };
        let mut out = String::from("(");
        for param in &proto.params {
            out.push_str(self.type_str(*param));
        }
        out.push(')');
        out.push_str(self.type_str(proto.return_type));
        out
    }

    pub fn display_signature(&self, sig: Signature) -> String {
        format!("{}{}", self.name_str(sig.name), self.display_proto(sig.proto))
    }
}
