#![allow(dead_code)]
//! Shared fixture: a small object graph with hand-written converters, the way
//! user code supplies them.
use std::any::Any;
use std::collections::BTreeMap;

use treebind::context::UnmarshalContext;
use treebind::convert::{Converter, ParentRef, downcast_value};
use treebind::converters::{ScalarConverter, StringMapConverter};
use treebind::error::Error;
use treebind::mapper::{AliasingPolicy, ElementIgnoringPolicy, Member};
use treebind::marshal::MarshalContext;
use treebind::typekey::TypeKey;
use treebind::{Codec, PRIORITY_NORMAL};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Address {
    pub city: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Person {
    pub name: String,
    pub address: Address,
    pub tags: BTreeMap<String, String>,
    pub secret: String,
}

fn person_field_type(field: &str) -> Option<TypeKey> {
    match field {
        "name" | "secret" => Some(TypeKey::of::<String>()),
        "address" => Some(TypeKey::of::<Address>()),
        "tags" => Some(TypeKey::of::<BTreeMap<String, String>>()),
        _ => None,
    }
}

fn visible(ctx_member: &Member<'_>, ctx: &UnmarshalContext<'_>) -> bool {
    ctx.mapper().should_write_member(ctx_member)
}

pub struct PersonConverter;

impl Converter for PersonConverter {
    fn can_convert(&self, ty: TypeKey) -> bool {
        ty == TypeKey::of::<Person>()
    }

    fn unmarshal(&self, ctx: &mut UnmarshalContext<'_>) -> Result<Box<dyn Any>, Error> {
        let mut person = Person::default();
        while ctx.reader().has_more_children() {
            ctx.reader().move_down()?;
            let field = ctx.reader().node_name().to_owned();
            let member = Member {
                declared_in: Some(TypeKey::of::<Person>()),
                field: &field,
                field_type: person_field_type(&field),
            };
            if !visible(&member, ctx) {
                ctx.reader().move_up()?;
                continue;
            }
            match field.as_str() {
                "name" => {
                    ctx.set_member("Person", "name");
                    let value =
                        ctx.convert_another(ParentRef::value(&person), TypeKey::of::<String>())?;
                    person.name = downcast_value(value)?;
                }
                "address" => {
                    ctx.set_member("Person", "address");
                    let value =
                        ctx.convert_another(ParentRef::value(&person), TypeKey::of::<Address>())?;
                    person.address = downcast_value(value)?;
                }
                "tags" => {
                    ctx.set_member("Person", "tags");
                    let value = ctx.convert_another(
                        ParentRef::value(&person),
                        TypeKey::of::<BTreeMap<String, String>>(),
                    )?;
                    person.tags = downcast_value(value)?;
                }
                "secret" => {
                    ctx.set_member("Person", "secret");
                    let value =
                        ctx.convert_another(ParentRef::value(&person), TypeKey::of::<String>())?;
                    person.secret = downcast_value(value)?;
                }
                unknown => {
                    if !ctx.mapper().is_ignored_element(unknown) {
                        return Err(Error::conversion(format!("unknown element `{unknown}`")));
                    }
                }
            }
            ctx.reader().move_up()?;
        }
        Ok(Box::new(person))
    }

    fn marshal(&self, value: &dyn Any, ctx: &mut MarshalContext<'_>) -> Result<(), Error> {
        let person = value.downcast_ref::<Person>().ok_or(Error::TypeMismatch {
            expected: std::any::type_name::<Person>(),
        })?;
        let fields: [(&str, &dyn Any, TypeKey); 4] = [
            ("name", &person.name, TypeKey::of::<String>()),
            ("address", &person.address, TypeKey::of::<Address>()),
            (
                "tags",
                &person.tags,
                TypeKey::of::<BTreeMap<String, String>>(),
            ),
            ("secret", &person.secret, TypeKey::of::<String>()),
        ];
        for (field, field_value, field_ty) in fields {
            let member = Member {
                declared_in: Some(TypeKey::of::<Person>()),
                field,
                field_type: Some(field_ty),
            };
            if !ctx.mapper().should_write_member(&member) {
                continue;
            }
            ctx.writer().start_node(field)?;
            ctx.convert_another(field_value, field_ty)?;
            ctx.writer().end_node()?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "PersonConverter"
    }
}

pub struct AddressConverter;

impl Converter for AddressConverter {
    fn can_convert(&self, ty: TypeKey) -> bool {
        ty == TypeKey::of::<Address>()
    }

    fn unmarshal(&self, ctx: &mut UnmarshalContext<'_>) -> Result<Box<dyn Any>, Error> {
        let mut address = Address::default();
        while ctx.reader().has_more_children() {
            ctx.reader().move_down()?;
            let field = ctx.reader().node_name().to_owned();
            match field.as_str() {
                "city" => {
                    ctx.set_member("Address", "city");
                    let value =
                        ctx.convert_another(ParentRef::value(&address), TypeKey::of::<String>())?;
                    address.city = downcast_value(value)?;
                }
                unknown => {
                    if !ctx.mapper().is_ignored_element(unknown) {
                        return Err(Error::conversion(format!("unknown element `{unknown}`")));
                    }
                }
            }
            ctx.reader().move_up()?;
        }
        Ok(Box::new(address))
    }

    fn marshal(&self, value: &dyn Any, ctx: &mut MarshalContext<'_>) -> Result<(), Error> {
        let address = value.downcast_ref::<Address>().ok_or(Error::TypeMismatch {
            expected: std::any::type_name::<Address>(),
        })?;
        ctx.writer().start_node("city")?;
        ctx.convert_another(&address.city, TypeKey::of::<String>())?;
        ctx.writer().end_node()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "AddressConverter"
    }
}

/// Codec wired with the fixture converters and aliases. When `omit_secret`
/// is set, `Person::secret` is vetoed by an exclusion rule.
pub fn person_codec(omit_secret: bool) -> Codec {
    let mut aliases = AliasingPolicy::new();
    aliases.alias::<Person>("Person");
    aliases.alias::<Address>("Address");

    let mut builder = Codec::builder()
        .register_converter(Box::new(PersonConverter), PRIORITY_NORMAL)
        .register_converter(Box::new(AddressConverter), PRIORITY_NORMAL)
        .register_converter(Box::new(ScalarConverter::<String>::new()), PRIORITY_NORMAL)
        .register_converter(Box::new(StringMapConverter), PRIORITY_NORMAL)
        .push_policy(Box::new(aliases));

    if omit_secret {
        let mut ignoring = ElementIgnoringPolicy::new();
        ignoring.omit_field::<Person>("secret");
        builder = builder.push_policy(Box::new(ignoring));
    }
    builder.build()
}
