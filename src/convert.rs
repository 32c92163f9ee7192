//! Converter contract, parent references and the priority-ordered registry.
use std::any::Any;

use crate::context::UnmarshalContext;
use crate::error::{ConversionError, Error};
use crate::marshal::MarshalContext;
use crate::typekey::TypeKey;

/// Capability allowing converters and parent values to attach extra
/// diagnostics while a conversion failure is being enriched.
pub trait ErrorReporter {
    fn append_errors(&self, error: &mut ConversionError);
}

/// Codec between one object type and its tree-node representation.
///
/// `unmarshal` may reenter the driver through
/// [`UnmarshalContext::convert_another`] any number of times for nested
/// values; the driver keeps the path stack balanced around every such call.
pub trait Converter: Send + Sync {
    /// Whether this converter handles values of the given type.
    fn can_convert(&self, ty: TypeKey) -> bool;

    /// Decode the node under the context's cursor into a value.
    fn unmarshal(&self, ctx: &mut UnmarshalContext<'_>) -> Result<Box<dyn Any>, Error>;

    /// Encode `value` into the node currently open on the context's writer.
    fn marshal(&self, value: &dyn Any, ctx: &mut MarshalContext<'_>) -> Result<(), Error>;

    /// Converter identity used in error diagnostics.
    fn name(&self) -> &'static str;

    /// Optional error-reporting capability, consulted during enrichment.
    fn reporter(&self) -> Option<&dyn ErrorReporter> {
        None
    }
}

impl std::fmt::Debug for dyn Converter + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Converter({})", self.name())
    }
}

/// Reference to the value a nested conversion is being produced for.
///
/// Carries the two capabilities the driver may query: whether the parent is a
/// generic key/value container (which switches the diagnostic path entry to a
/// synthetic map/entry marker) and an optional error reporter. Capabilities
/// are attached explicitly by the calling converter; nothing is discovered
/// reflectively from the value.
#[derive(Clone, Copy, Default)]
pub struct ParentRef<'a> {
    value: Option<&'a dyn Any>,
    map_entry: bool,
    reporter: Option<&'a dyn ErrorReporter>,
}

impl ParentRef<'static> {
    /// No parent: the outermost (root) conversion.
    pub const NONE: ParentRef<'static> = ParentRef {
        value: None,
        map_entry: false,
        reporter: None,
    };
}

impl<'a> ParentRef<'a> {
    /// Parent is an ordinary value.
    pub fn value(value: &'a dyn Any) -> Self {
        ParentRef {
            value: Some(value),
            map_entry: false,
            reporter: None,
        }
    }

    /// Parent is a generic key/value container; the conversion produces one
    /// of its entries.
    pub fn map_entry(value: &'a dyn Any) -> Self {
        ParentRef {
            value: Some(value),
            map_entry: true,
            reporter: None,
        }
    }

    /// Attach an error-reporting capability to this parent.
    pub fn with_reporter(mut self, reporter: &'a dyn ErrorReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// The wrapped parent value, if any.
    pub fn get(&self) -> Option<&'a dyn Any> {
        self.value
    }

    pub(crate) fn is_map_entry(&self) -> bool {
        self.map_entry
    }

    pub(crate) fn reporter(&self) -> Option<&'a dyn ErrorReporter> {
        self.reporter
    }
}

/// Default registration priority.
pub const PRIORITY_NORMAL: i32 = 0;
/// Priority below user converters, for broad built-ins.
pub const PRIORITY_LOW: i32 = -10;
/// Priority for catch-all converters consulted last.
pub const PRIORITY_VERY_LOW: i32 = -20;

struct Registration {
    priority: i32,
    converter: Box<dyn Converter>,
}

/// Registry resolving a type to its best-matching converter.
///
/// Converters are scanned in descending priority; among equal priorities the
/// earlier registration wins. Registration happens during the setup phase
/// only, after which the registry is a pure read and safe to share.
#[derive(Default)]
pub struct ConverterLookup {
    registrations: Vec<Registration>,
}

impl ConverterLookup {
    pub fn new() -> Self {
        ConverterLookup::default()
    }

    /// Register `converter` at the given priority.
    pub fn register(&mut self, converter: Box<dyn Converter>, priority: i32) {
        let at = self
            .registrations
            .partition_point(|registration| registration.priority >= priority);
        self.registrations.insert(
            at,
            Registration {
                priority,
                converter,
            },
        );
    }

    /// The highest-priority converter capable of `ty`.
    pub fn lookup(&self, ty: TypeKey) -> Result<&dyn Converter, Error> {
        self.registrations
            .iter()
            .find(|registration| registration.converter.can_convert(ty))
            .map(|registration| registration.converter.as_ref())
            .ok_or(Error::NoConverterFound {
                type_name: ty.name(),
            })
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

/// Unbox a converter-produced value into its concrete type.
///
/// Fails with [`Error::TypeMismatch`] when the value is of another type;
/// converters use this on results of nested `convert_another` calls.
pub fn downcast_value<T: Any>(value: Box<dyn Any>) -> Result<T, Error> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| Error::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}
