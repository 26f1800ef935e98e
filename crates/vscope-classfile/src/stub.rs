use crate::descriptor::{parse_method_descriptor, MethodDescriptor};
use crate::error::{Error, Result};

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;

/// Returns `true` for a well-formed class type descriptor such as `Ljava/lang/Object;`.
pub fn is_class_descriptor(desc: &str) -> bool {
    desc.len() > 2 && desc.starts_with('L') && desc.ends_with(';') && !desc[1..desc.len() - 1].contains(';')
}

/// One class or interface declaration as supplied by a loader.
///
/// Type references (`name`, `super_class`, `interfaces`) are class type descriptors. The
/// analysis resolves them itself; references to classes that were never declared are legal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassStub {
    pub name: String,
    pub access_flags: u16,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub methods: Vec<MethodStub>,
    /// The body and subtree of this type are not visible to the analysis (library code).
    pub external: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodStub {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub parsed_descriptor: MethodDescriptor,
}

impl ClassStub {
    pub fn new(name: impl Into<String>, access_flags: u16) -> Result<Self> {
        let name = name.into();
        if !is_class_descriptor(&name) {
            return Err(Error::InvalidTypeName(name));
        }
        Ok(Self {
            name,
            access_flags,
            super_class: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            external: false,
        })
    }

    pub fn class(name: impl Into<String>) -> Result<Self> {
        Self::new(name, ACC_PUBLIC)
    }

    pub fn interface(name: impl Into<String>) -> Result<Self> {
        Self::new(name, ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
    }

    pub fn extends(mut self, super_class: impl Into<String>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn method(mut self, method: MethodStub) -> Self {
        self.methods.push(method);
        self
    }

    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }
}

impl MethodStub {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>, access_flags: u16) -> Result<Self> {
        let descriptor = descriptor.into();
        let parsed_descriptor = parse_method_descriptor(&descriptor)?;
        Ok(Self {
            access_flags,
            name: name.into(),
            descriptor,
            parsed_descriptor,
        })
    }

    pub fn virtual_method(name: impl Into<String>, descriptor: impl Into<String>) -> Result<Self> {
        Self::new(name, descriptor, ACC_PUBLIC)
    }

    pub fn abstract_method(name: impl Into<String>, descriptor: impl Into<String>) -> Result<Self> {
        Self::new(name, descriptor, ACC_PUBLIC | ACC_ABSTRACT)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & ACC_ABSTRACT != 0
    }

    /// Constructors, class initializers, static and private methods never take part in
    /// dynamic dispatch.
    pub fn is_virtual(&self) -> bool {
        self.access_flags & (ACC_STATIC | ACC_PRIVATE) == 0
            && self.name != "<init>"
            && self.name != "<clinit>"
    }
}
