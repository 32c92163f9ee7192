//! Scoped key/value store shared by converters during one codec invocation.
use std::any::Any;

use ahash::AHashMap;

/// Auxiliary data passed between converters within a single marshal or
/// unmarshal operation.
///
/// The holder lives exactly as long as one `start` invocation; it is never
/// shared across invocations and never reset between uses within one.
#[derive(Default)]
pub struct DataHolder {
    map: AHashMap<String, Box<dyn Any>>,
}

impl DataHolder {
    pub fn new() -> Self {
        DataHolder::default()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn put<K: Into<String>>(&mut self, key: K, value: Box<dyn Any>) {
        self.map.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&dyn Any> {
        self.map.get(key).map(Box::as_ref)
    }

    /// Typed read access; `None` when the key is absent or of another type.
    pub fn get_as<T: Any>(&self, key: &str) -> Option<&T> {
        self.get(key).and_then(|value| value.downcast_ref::<T>())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
