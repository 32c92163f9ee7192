mod common;

use common::{Person, person_codec};
use treebind::context::UnmarshalContext;
use treebind::convert::downcast_value;
use treebind::error::Error;
use treebind::mem::{MemReader, Node};

fn person_doc() -> Node {
    Node::new("Person")
        .child(Node::new("name").text("Ann"))
        .child(Node::new("address").child(Node::new("city").text("Paris")))
}

#[test]
fn unmarshals_a_nested_struct() {
    let codec = person_codec(false);
    let doc = person_doc();
    let person: Person = codec.unmarshal_as(&mut MemReader::new(&doc)).unwrap();
    assert_eq!(person.name, "Ann");
    assert_eq!(person.address.city, "Paris");
    assert!(person.tags.is_empty());
    assert_eq!(person.secret, "");
}

#[test]
fn path_stack_is_empty_after_start() {
    let codec = person_codec(false);
    let doc = person_doc();
    let mut reader = MemReader::new(&doc);
    let mut ctx = UnmarshalContext::new(&mut reader, codec.lookup(), codec.mapper(), None);
    let result = ctx.start(None).unwrap();
    assert_eq!(ctx.depth(), 0);
    assert!(matches!(ctx.required_type(), Err(Error::EmptyStack { .. })));
    assert!(matches!(
        ctx.required_field_name(),
        Err(Error::EmptyStack { .. })
    ));
    assert!(matches!(
        ctx.required_class_name(),
        Err(Error::EmptyStack { .. })
    ));
    let person: Person = downcast_value(result).unwrap();
    assert_eq!(person.name, "Ann");
}

#[test]
fn root_type_can_come_from_the_class_attribute() {
    let codec = person_codec(false);
    let doc = Node::new("payload")
        .attr("class", "Person")
        .child(Node::new("name").text("Bea"));
    let person: Person = codec.unmarshal_as(&mut MemReader::new(&doc)).unwrap();
    assert_eq!(person.name, "Bea");
}

#[test]
fn unknown_root_alias_is_reported() {
    let codec = person_codec(false);
    let doc = Node::new("Martian");
    let err = codec.unmarshal(&mut MemReader::new(&doc)).unwrap_err();
    match err {
        Error::UnknownAlias { name } => assert_eq!(name, "Martian"),
        other => panic!("expected UnknownAlias, got {other}"),
    }
}

#[test]
fn unknown_element_fails_strictly_without_an_ignore_pattern() {
    let codec = person_codec(false);
    let doc = person_doc().child(Node::new("legacy_badge").text("x"));
    let err = codec.unmarshal(&mut MemReader::new(&doc)).unwrap_err();
    let details = err.details().expect("structured conversion error");
    assert!(details.message().contains("unknown element `legacy_badge`"));
}

#[test]
fn unknown_element_is_skipped_when_a_pattern_ignores_it() {
    use treebind::mapper::ElementIgnoringPolicy;
    use treebind::converters::{ScalarConverter, StringMapConverter};
    use treebind::mapper::AliasingPolicy;
    use treebind::{Codec, PRIORITY_NORMAL};

    let mut aliases = AliasingPolicy::new();
    aliases.alias::<Person>("Person");
    aliases.alias::<common::Address>("Address");
    let mut ignoring = ElementIgnoringPolicy::new();
    ignoring.ignore_elements_matching(regex());

    let codec = Codec::builder()
        .register_converter(Box::new(common::PersonConverter), PRIORITY_NORMAL)
        .register_converter(Box::new(common::AddressConverter), PRIORITY_NORMAL)
        .register_converter(Box::new(ScalarConverter::<String>::new()), PRIORITY_NORMAL)
        .register_converter(Box::new(StringMapConverter), PRIORITY_NORMAL)
        .push_policy(Box::new(aliases))
        .push_policy(Box::new(ignoring))
        .build();

    let doc = person_doc().child(Node::new("legacy_badge").text("x"));
    let person: Person = codec.unmarshal_as(&mut MemReader::new(&doc)).unwrap();
    assert_eq!(person.name, "Ann");
    assert_eq!(person.address.city, "Paris");
}

fn regex() -> regex::Regex {
    regex::Regex::new("^legacy_.*").unwrap()
}
