//! The marshalling driver: the unmarshaller's machinery in reverse.
use std::any::Any;

use crate::convert::{Converter, ConverterLookup};
use crate::data_holder::DataHolder;
use crate::error::{ConversionError, Error};
use crate::mapper::MapperChain;
use crate::tree::TreeWriter;
use crate::typekey::TypeKey;

/// Per-document marshalling state.
///
/// Shares the converter registry and mapper chain with the unmarshalling
/// side; there is no deferred queue here — a finished object graph has
/// nothing left to cross-validate.
pub struct MarshalContext<'a> {
    writer: &'a mut dyn TreeWriter,
    lookup: &'a ConverterLookup,
    mapper: &'a MapperChain,
    data: Option<DataHolder>,
}

impl<'a> MarshalContext<'a> {
    pub fn new(
        writer: &'a mut dyn TreeWriter,
        lookup: &'a ConverterLookup,
        mapper: &'a MapperChain,
    ) -> Self {
        MarshalContext {
            writer,
            lookup,
            mapper,
            data: None,
        }
    }

    /// The tree writer this document is emitted to.
    pub fn writer(&mut self) -> &mut dyn TreeWriter {
        self.writer
    }

    /// The shared mapper chain.
    pub fn mapper(&self) -> &MapperChain {
        self.mapper
    }

    /// Encode a nested value as `ty` with the converter resolved through the
    /// registry. The calling converter opens and closes the surrounding node.
    pub fn convert_another(&mut self, value: &dyn Any, ty: TypeKey) -> Result<(), Error> {
        self.convert_another_with(value, ty, None)
    }

    /// Like [`MarshalContext::convert_another`], with an optional explicit
    /// converter override that must be capable of the resolved type.
    pub fn convert_another_with(
        &mut self,
        value: &dyn Any,
        ty: TypeKey,
        converter: Option<&dyn Converter>,
    ) -> Result<(), Error> {
        let ty = self.mapper.default_implementation_of(ty);
        match converter {
            Some(converter) => {
                if !converter.can_convert(ty) {
                    let mut details =
                        ConversionError::new("explicitly selected converter cannot handle type");
                    details.add("item-type", ty.name());
                    details.add("converter-type", converter.name());
                    return Err(Error::ConverterMismatch(details));
                }
                self.convert(value, ty, converter)
            }
            None => {
                let registry = self.lookup;
                let converter = registry.lookup(ty)?;
                self.convert(value, ty, converter)
            }
        }
    }

    fn convert(
        &mut self,
        value: &dyn Any,
        ty: TypeKey,
        converter: &dyn Converter,
    ) -> Result<(), Error> {
        match converter.marshal(value, self) {
            Ok(()) => Ok(()),
            Err(error) => {
                let (mut details, mismatch) = match error {
                    Error::Conversion(details) => (details, false),
                    Error::ConverterMismatch(details) => (details, true),
                    other => (ConversionError::wrapping(other), false),
                };
                details.add("item-type", ty.name());
                details.add("converter-type", converter.name());
                if let Some(reporter) = converter.reporter() {
                    reporter.append_errors(&mut details);
                }
                Err(if mismatch {
                    Error::ConverterMismatch(details)
                } else {
                    Error::Conversion(details)
                })
            }
        }
    }

    /// Read auxiliary data shared between converters in this invocation.
    pub fn get(&self, key: &str) -> Option<&dyn Any> {
        self.data.as_ref().and_then(|holder| holder.get(key))
    }

    /// Store auxiliary data for later converters in this invocation.
    pub fn put<K: Into<String>>(&mut self, key: K, value: Box<dyn Any>) {
        self.data.get_or_insert_default().put(key, value);
    }

    /// Keys currently present in the data holder.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.iter().flat_map(|holder| holder.keys())
    }

    /// Entry point: marshal `value` as a whole document.
    ///
    /// Writes the root node under the type's registered serialized name,
    /// which is what root-type resolution maps back on the reading side.
    pub fn start(
        &mut self,
        value: &dyn Any,
        ty: TypeKey,
        data_holder: Option<DataHolder>,
    ) -> Result<(), Error> {
        self.data = data_holder;
        let mapper = self.mapper;
        let name = mapper.alias_for_type(ty).ok_or(Error::MissingAlias {
            type_name: ty.name(),
        })?;
        self.writer.start_node(name)?;
        self.convert_another(value, ty)?;
        self.writer.end_node()
    }
}
