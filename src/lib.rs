//! Structural codec between in-memory object graphs and a generic
//! hierarchical tree representation (element/attribute/text nodes), with
//! pluggable converters and composable naming/visibility policies.
//!
//! The engine walks a [`tree::TreeReader`] cursor recursively, dispatching
//! each node to the highest-priority capable [`Converter`]; the
//! [`mapper::MapperChain`] resolves serialized names, default implementation
//! types and member visibility. Failures are enriched with the full
//! structural context on the way out, and converters may defer
//! whole-graph validation through prioritized completion callbacks.
//! Marshalling uses the same machinery in reverse.

pub use crate::codec::{Codec, CodecBuilder};
pub use crate::context::{Callback, UnmarshalContext};
pub use crate::convert::{
    Converter, ConverterLookup, ErrorReporter, PRIORITY_LOW, PRIORITY_NORMAL, PRIORITY_VERY_LOW,
    ParentRef, downcast_value,
};
pub use crate::data_holder::DataHolder;
pub use crate::error::{ConversionError, Error};
pub use crate::marshal::MarshalContext;
pub use crate::typekey::TypeKey;

pub mod codec;
pub mod context;
pub mod convert;
pub mod converters;
pub mod data_holder;
pub mod error;
pub mod mapper;
pub mod marshal;
pub mod mem;
pub mod prioritized;
pub mod tree;
pub mod typekey;
