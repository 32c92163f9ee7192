//! Delegation semantics of the mapper chain.
use treebind::mapper::{
    AliasingPolicy, ElementIgnoringPolicy, MapperChain, MapperPolicy, Member,
};
use treebind::typekey::TypeKey;

/// Policy that never makes a definite decision.
struct Transparent;
impl MapperPolicy for Transparent {}

fn inner_policy() -> ElementIgnoringPolicy {
    let mut policy = ElementIgnoringPolicy::new();
    policy.omit_field::<String>("shadow");
    policy.ignore_elements_matching(regex::Regex::new("tmp_.*").unwrap());
    policy
}

fn sample_members() -> Vec<Member<'static>> {
    vec![
        Member {
            declared_in: Some(TypeKey::of::<String>()),
            field: "shadow",
            field_type: None,
        },
        Member {
            declared_in: Some(TypeKey::of::<String>()),
            field: "visible",
            field_type: None,
        },
        Member {
            declared_in: None,
            field: "tmp_scratch",
            field_type: None,
        },
        Member {
            declared_in: None,
            field: "scratch",
            field_type: None,
        },
    ]
}

#[test]
fn non_vetoing_outer_policies_are_transparent() {
    let chained = MapperChain::new(vec![
        Box::new(Transparent),
        Box::new(Transparent),
        Box::new(inner_policy()),
    ]);
    let direct = MapperChain::new(vec![Box::new(inner_policy())]);

    for member in sample_members() {
        assert_eq!(
            chained.should_write_member(&member),
            direct.should_write_member(&member),
            "diverged on {:?}",
            member.field
        );
    }
    for name in ["tmp_scratch", "scratch", "shadow"] {
        assert_eq!(chained.is_ignored_element(name), direct.is_ignored_element(name));
    }
}

#[test]
fn alias_resolution_falls_through_to_the_first_policy_that_knows() {
    let mut outer = AliasingPolicy::new();
    outer.alias::<u32>("number");
    let mut inner = AliasingPolicy::new();
    inner.alias::<u32>("int");
    inner.alias::<String>("text");

    let chain = MapperChain::new(vec![Box::new(outer), Box::new(inner)]);
    // Outer definition shadows the inner one for the shared type.
    assert_eq!(chain.alias_for_type(TypeKey::of::<u32>()), Some("number"));
    assert_eq!(chain.type_for_alias("int"), Some(TypeKey::of::<u32>()));
    // Names only the inner policy knows still resolve.
    assert_eq!(chain.type_for_alias("text"), Some(TypeKey::of::<String>()));
    assert!(chain.type_for_alias("unknown").is_none());
}
