//! Small built-in converter set: enough to exercise the engine; the open
//! catalog of domain converters is supplied by users.
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::context::UnmarshalContext;
use crate::convert::{Converter, ParentRef, downcast_value};
use crate::error::Error;
use crate::marshal::MarshalContext;
use crate::typekey::TypeKey;

/// Converter for any scalar type that round-trips through its text form.
///
/// Covers integers, floats, `bool`, `String` and anything else implementing
/// `FromStr` + `Display`.
pub struct ScalarConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ScalarConverter<T> {
    pub fn new() -> Self {
        ScalarConverter {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ScalarConverter<T> {
    fn default() -> Self {
        ScalarConverter::new()
    }
}

impl<T> Converter for ScalarConverter<T>
where
    T: Any + FromStr + Display,
    T::Err: Display,
{
    fn can_convert(&self, ty: TypeKey) -> bool {
        ty == TypeKey::of::<T>()
    }

    fn unmarshal(&self, ctx: &mut UnmarshalContext<'_>) -> Result<Box<dyn Any>, Error> {
        let text = ctx.reader().text().to_owned();
        match text.parse::<T>() {
            Ok(value) => Ok(Box::new(value)),
            Err(cause) => Err(Error::msg(format!(
                "cannot parse `{text}` as {}: {cause}",
                TypeKey::of::<T>().short_name()
            ))),
        }
    }

    fn marshal(&self, value: &dyn Any, ctx: &mut MarshalContext<'_>) -> Result<(), Error> {
        let value = value.downcast_ref::<T>().ok_or(Error::TypeMismatch {
            expected: std::any::type_name::<T>(),
        })?;
        ctx.writer().set_text(&value.to_string())
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Converter for `BTreeMap<String, String>`: each child node is one entry,
/// the node name being the key.
///
/// Entry values go through the driver, so the path stack shows the synthetic
/// map/entry marker while they convert.
pub struct StringMapConverter;

impl Converter for StringMapConverter {
    fn can_convert(&self, ty: TypeKey) -> bool {
        ty == TypeKey::of::<BTreeMap<String, String>>()
    }

    fn unmarshal(&self, ctx: &mut UnmarshalContext<'_>) -> Result<Box<dyn Any>, Error> {
        let mut map = BTreeMap::new();
        while ctx.reader().has_more_children() {
            ctx.reader().move_down()?;
            let key = ctx.reader().node_name().to_owned();
            let value =
                ctx.convert_another(ParentRef::map_entry(&map), TypeKey::of::<String>())?;
            ctx.reader().move_up()?;
            map.insert(key, downcast_value::<String>(value)?);
        }
        Ok(Box::new(map))
    }

    fn marshal(&self, value: &dyn Any, ctx: &mut MarshalContext<'_>) -> Result<(), Error> {
        let map = value
            .downcast_ref::<BTreeMap<String, String>>()
            .ok_or(Error::TypeMismatch {
                expected: std::any::type_name::<BTreeMap<String, String>>(),
            })?;
        for (key, entry) in map {
            ctx.writer().start_node(key)?;
            ctx.convert_another(entry, TypeKey::of::<String>())?;
            ctx.writer().end_node()?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
