//! Public facade: configure once, then share across invocations.
use std::any::Any;

use crate::context::UnmarshalContext;
use crate::convert::{Converter, ConverterLookup, downcast_value};
use crate::data_holder::DataHolder;
use crate::error::Error;
use crate::mapper::{MapperChain, MapperPolicy};
use crate::marshal::MarshalContext;
use crate::tree::{TreeReader, TreeWriter};
use crate::typekey::TypeKey;

/// Setup-phase configuration for a [`Codec`].
///
/// Converter registration and mapper-policy composition happen here; the
/// built codec is frozen, read-mostly and safe to share across concurrent
/// invocations.
#[derive(Default)]
pub struct CodecBuilder {
    lookup: ConverterLookup,
    policies: Vec<Box<dyn MapperPolicy>>,
}

impl CodecBuilder {
    pub fn new() -> Self {
        CodecBuilder::default()
    }

    /// Register a converter at the given priority (higher wins).
    pub fn register_converter(mut self, converter: Box<dyn Converter>, priority: i32) -> Self {
        self.lookup.register(converter, priority);
        self
    }

    /// Append a mapper policy; earlier policies decide first.
    pub fn push_policy(mut self, policy: Box<dyn MapperPolicy>) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn build(self) -> Codec {
        Codec {
            lookup: self.lookup,
            mapper: MapperChain::new(self.policies),
        }
    }
}

/// A frozen codec configuration: converter registry plus mapper chain.
///
/// Holds no per-document state; every call to the marshal/unmarshal entry
/// points creates a fresh context scoped to that one invocation.
pub struct Codec {
    lookup: ConverterLookup,
    mapper: MapperChain,
}

impl Codec {
    pub fn builder() -> CodecBuilder {
        CodecBuilder::new()
    }

    pub fn lookup(&self) -> &ConverterLookup {
        &self.lookup
    }

    pub fn mapper(&self) -> &MapperChain {
        &self.mapper
    }

    /// Unmarshal the document under `reader` into an object graph.
    pub fn unmarshal(&self, reader: &mut dyn TreeReader) -> Result<Box<dyn Any>, Error> {
        self.unmarshal_with(reader, None, None)
    }

    /// Unmarshal with an initial data holder and/or a designated root object
    /// reference (see [`UnmarshalContext::current_object`]).
    pub fn unmarshal_with(
        &self,
        reader: &mut dyn TreeReader,
        data_holder: Option<DataHolder>,
        root: Option<Box<dyn Any>>,
    ) -> Result<Box<dyn Any>, Error> {
        let mut ctx = UnmarshalContext::new(reader, &self.lookup, &self.mapper, root);
        ctx.start(data_holder)
    }

    /// Unmarshal and downcast the result to `T`.
    pub fn unmarshal_as<T: Any>(&self, reader: &mut dyn TreeReader) -> Result<T, Error> {
        downcast_value(self.unmarshal(reader)?)
    }

    /// Marshal `value` as a whole document.
    pub fn marshal<T: Any>(&self, value: &T, writer: &mut dyn TreeWriter) -> Result<(), Error> {
        self.marshal_with(value, TypeKey::of::<T>(), writer, None)
    }

    /// Marshal a type-erased value with an initial data holder.
    pub fn marshal_with(
        &self,
        value: &dyn Any,
        ty: TypeKey,
        writer: &mut dyn TreeWriter,
        data_holder: Option<DataHolder>,
    ) -> Result<(), Error> {
        let mut ctx = MarshalContext::new(writer, &self.lookup, &self.mapper);
        ctx.start(value, ty, data_holder)
    }
}
