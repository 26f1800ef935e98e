#![forbid(unsafe_code)]

mod descriptor;
mod error;
mod stub;

pub use crate::descriptor::{parse_field_descriptor, parse_method_descriptor};
pub use crate::descriptor::{BaseType, FieldType, MethodDescriptor, ReturnType};
pub use crate::error::{Error, Result};
pub use crate::stub::{
    is_class_descriptor, ClassStub, MethodStub, ACC_ABSTRACT, ACC_FINAL, ACC_INTERFACE,
    ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC,
};
