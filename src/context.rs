//! The unmarshalling driver: recursive tree walking with a balanced path
//! stack, converter dispatch, error enrichment and deferred validation.
use std::any::Any;

use smallvec::SmallVec;

use crate::convert::{Converter, ConverterLookup, ParentRef};
use crate::data_holder::DataHolder;
use crate::error::{ConversionError, Error};
use crate::mapper::MapperChain;
use crate::prioritized::PrioritizedList;
use crate::tree::{self, TreeReader};
use crate::typekey::TypeKey;

/// Deferred validation work, run once after the whole graph is materialized.
pub type Callback = Box<dyn FnOnce() -> Result<(), Error>>;

/// Per-document unmarshalling state and the traversal driver.
///
/// One context serves exactly one [`UnmarshalContext::start`] invocation; the
/// converter registry and mapper chain it borrows are the long-lived, shared
/// configuration. The driver is single-threaded and recursive: a converter
/// invoked by [`UnmarshalContext::convert_another`] may reenter the driver
/// for nested values on the same call stack, and the three path stacks stay
/// balanced around every such call, also when the converter fails.
pub struct UnmarshalContext<'a> {
    reader: &'a mut dyn TreeReader,
    lookup: &'a ConverterLookup,
    mapper: &'a MapperChain,
    root: Option<Box<dyn Any>>,
    types: SmallVec<[TypeKey; 16]>,
    field_names: SmallVec<[String; 16]>,
    class_names: SmallVec<[String; 16]>,
    data: Option<DataHolder>,
    callbacks: PrioritizedList<Callback>,
    member: Option<(String, String)>,
}

impl<'a> UnmarshalContext<'a> {
    /// Create a context over `reader`.
    ///
    /// `root` designates the object identity reported by
    /// [`UnmarshalContext::current_object`] from the outermost frame; pass
    /// `None` unless unmarshalling into an existing object.
    pub fn new(
        reader: &'a mut dyn TreeReader,
        lookup: &'a ConverterLookup,
        mapper: &'a MapperChain,
        root: Option<Box<dyn Any>>,
    ) -> Self {
        UnmarshalContext {
            reader,
            lookup,
            mapper,
            root,
            types: SmallVec::new(),
            field_names: SmallVec::new(),
            class_names: SmallVec::new(),
            data: None,
            callbacks: PrioritizedList::new(),
            member: None,
        }
    }

    /// The tree cursor this document is read from.
    pub fn reader(&mut self) -> &mut dyn TreeReader {
        self.reader
    }

    /// The shared mapper chain.
    pub fn mapper(&self) -> &MapperChain {
        self.mapper
    }

    /// Record the declaring-class/field pair the next conversions belong to.
    ///
    /// Purely diagnostic: the pair is copied into the path stack so failures
    /// deep in the graph can name the member being populated. Converters that
    /// walk struct members call this before each nested `convert_another`.
    pub fn set_member<C: Into<String>, F: Into<String>>(&mut self, declaring: C, field: F) {
        self.member = Some((declaring.into(), field.into()));
    }

    /// Convert the nested value under the cursor as `ty`, with the converter
    /// resolved through the registry.
    pub fn convert_another(
        &mut self,
        parent: ParentRef<'_>,
        ty: TypeKey,
    ) -> Result<Box<dyn Any>, Error> {
        self.convert_another_with(parent, ty, None)
    }

    /// Like [`UnmarshalContext::convert_another`], with an optional explicit
    /// converter override.
    ///
    /// The declared type is first resolved through the mapper's
    /// default-implementation substitution. An explicit converter must report
    /// itself capable of the resolved type; otherwise the call fails with
    /// [`Error::ConverterMismatch`] — a caller contract violation, never
    /// retried.
    pub fn convert_another_with(
        &mut self,
        parent: ParentRef<'_>,
        ty: TypeKey,
        converter: Option<&dyn Converter>,
    ) -> Result<Box<dyn Any>, Error> {
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
                self.convert(parent, ty, converter)
            }
            None => {
                let registry = self.lookup;
                let converter = registry.lookup(ty)?;
                self.convert(parent, ty, converter)
            }
        }
    }

    /// The traversal primitive: push one frame, run the converter, enrich
    /// failures, pop the frame on every exit path.
    fn convert(
        &mut self,
        parent: ParentRef<'_>,
        ty: TypeKey,
        converter: &dyn Converter,
    ) -> Result<Box<dyn Any>, Error> {
        self.types.push(ty);
        if parent.is_map_entry() {
            // Synthetic path marker for values produced into a generic
            // key/value container, where no declaring member exists.
            self.class_names.push("map".to_owned());
            self.field_names.push("entry".to_owned());
        } else {
            let (class_name, field_name) = self.member.clone().unwrap_or_default();
            self.class_names.push(class_name);
            self.field_names.push(field_name);
        }
        let outcome = match converter.unmarshal(self) {
            Ok(value) => Ok(value),
            Err(error) => Err(self.enrich(error, ty, converter, parent)),
        };
        self.types.pop();
        self.class_names.pop();
        self.field_names.pop();
        outcome
    }

    /// Add structural context to a converter failure. Already-structured
    /// errors are enriched in place; anything else is wrapped first. Runs
    /// while the failing frame is still on the stack, so the required type is
    /// the type being unwound.
    fn enrich(
        &mut self,
        error: Error,
        ty: TypeKey,
        converter: &dyn Converter,
        parent: ParentRef<'_>,
    ) -> Error {
        let (mut details, mismatch) = match error {
            Error::Conversion(details) => (details, false),
            Error::ConverterMismatch(details) => (details, true),
            other => (ConversionError::wrapping(other), false),
        };
        details.add("class", ty.name());
        if let Ok(required) = self.required_type() {
            details.add("required-type", required.name());
        }
        details.add("converter-type", converter.name());
        if let Some(reporter) = converter.reporter() {
            reporter.append_errors(&mut details);
        }
        if let Some(reporter) = parent.reporter() {
            reporter.append_errors(&mut details);
        }
        self.reader.append_errors(&mut details);
        if mismatch {
            Error::ConverterMismatch(details)
        } else {
            Error::Conversion(details)
        }
    }

    /// Enqueue deferred validation work; never executed inline. Higher
    /// priorities run first once the whole graph is built.
    pub fn add_completion_callback(&mut self, work: Callback, priority: i32) {
        self.callbacks.add(work, priority);
    }

    /// The designated root object, visible only from the outermost frame.
    ///
    /// Inner frames get `None`: intermediate values do not exist until their
    /// converter returns, so no materialized current object can be offered at
    /// depth greater than one. This is a valid query result, not an error.
    pub fn current_object(&self) -> Option<&dyn Any> {
        if self.types.len() == 1 {
            self.root.as_deref()
        } else {
            None
        }
    }

    /// The type of the conversion frame being populated.
    pub fn required_type(&self) -> Result<TypeKey, Error> {
        self.types
            .last()
            .copied()
            .ok_or(Error::EmptyStack { what: "type stack" })
    }

    /// The field name of the conversion frame being populated.
    pub fn required_field_name(&self) -> Result<&str, Error> {
        self.field_names
            .last()
            .map(String::as_str)
            .ok_or(Error::EmptyStack {
                what: "field-name stack",
            })
    }

    /// The declaring class name of the conversion frame being populated.
    pub fn required_class_name(&self) -> Result<&str, Error> {
        self.class_names
            .last()
            .map(String::as_str)
            .ok_or(Error::EmptyStack {
                what: "class-name stack",
            })
    }

    /// Current recursion depth; equals the length of all three path stacks.
    pub fn depth(&self) -> usize {
        self.types.len()
    }

    /// Read auxiliary data shared between converters in this invocation.
    pub fn get(&self, key: &str) -> Option<&dyn Any> {
        self.data.as_ref().and_then(|holder| holder.get(key))
    }

    /// Store auxiliary data for later converters in this invocation. The
    /// holder is created lazily on first write.
    pub fn put<K: Into<String>>(&mut self, key: K, value: Box<dyn Any>) {
        self.data.get_or_insert_default().put(key, value);
    }

    /// Keys currently present in the data holder.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.iter().flat_map(|holder| holder.keys())
    }

    /// Entry point: unmarshal the whole document.
    ///
    /// Installs `data_holder`, resolves the root type through the mapper
    /// chain, converts the root, then runs every queued completion callback
    /// exactly once in priority order. Any error out of the root conversion
    /// propagates unchanged; a failing callback aborts the remaining queue.
    pub fn start(&mut self, data_holder: Option<DataHolder>) -> Result<Box<dyn Any>, Error> {
        self.data = data_holder;
        let ty = tree::read_node_type(self.reader, self.mapper)?;
        let result = self.convert_another(ParentRef::NONE, ty)?;
        for callback in std::mem::take(&mut self.callbacks) {
            callback()?;
        }
        Ok(result)
    }
}
