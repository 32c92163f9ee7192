//! Naming and visibility policies, composed into an ordered chain.
//!
//! Each policy is polymorphic over the same capability set: alias↔type
//! mapping, default-implementation substitution, member visibility and
//! ignorable-element detection. A policy answers `Some(decision)` or
//! delegates with `None`; the chain queries policies front to back and the
//! first definite decision wins. Composition is a fixed list built once per
//! configuration, so no cycles can be expressed and the chain is safe for
//! concurrent read access after construction.

use ahash::{AHashMap, AHashSet};
use regex::Regex;

use crate::typekey::TypeKey;

/// A member under a visibility decision: the declaring type (`None` when the
/// owner is unresolved or synthetic), the field name, and the field's static
/// type when the caller knows it.
#[derive(Clone, Copy, Debug)]
pub struct Member<'a> {
    pub declared_in: Option<TypeKey>,
    pub field: &'a str,
    pub field_type: Option<TypeKey>,
}

/// One naming/visibility policy in the chain. Every operation defaults to
/// delegation.
pub trait MapperPolicy: Send + Sync {
    /// Substitute the concrete type to instantiate for `ty`.
    fn default_implementation_of(&self, ty: TypeKey) -> Option<TypeKey> {
        let _ = ty;
        None
    }

    /// Veto or force serialization of a member.
    fn should_write_member(&self, member: &Member<'_>) -> Option<bool> {
        let _ = member;
        None
    }

    /// Whether an unrecognized element name may be silently skipped.
    fn is_ignored_element(&self, name: &str) -> Option<bool> {
        let _ = name;
        None
    }

    /// Resolve a serialized name to a registered type.
    fn type_for_alias(&self, name: &str) -> Option<TypeKey> {
        let _ = name;
        None
    }

    /// Serialized name of a type.
    fn alias_for_type(&self, ty: TypeKey) -> Option<&str> {
        let _ = ty;
        None
    }
}

/// Fixed, ordered chain of policies with terminal defaults.
#[derive(Default)]
pub struct MapperChain {
    policies: Vec<Box<dyn MapperPolicy>>,
}

impl MapperChain {
    pub fn new(policies: Vec<Box<dyn MapperPolicy>>) -> Self {
        MapperChain { policies }
    }

    /// The concrete type to instantiate for `ty`; `ty` itself when no policy
    /// substitutes.
    pub fn default_implementation_of(&self, ty: TypeKey) -> TypeKey {
        self.policies
            .iter()
            .find_map(|policy| policy.default_implementation_of(ty))
            .unwrap_or(ty)
    }

    /// Member visibility; serialized unless a policy vetoes.
    pub fn should_write_member(&self, member: &Member<'_>) -> bool {
        self.policies
            .iter()
            .find_map(|policy| policy.should_write_member(member))
            .unwrap_or(true)
    }

    /// Whether an unknown element is ignorable instead of a strict failure.
    pub fn is_ignored_element(&self, name: &str) -> bool {
        self.policies
            .iter()
            .find_map(|policy| policy.is_ignored_element(name))
            .unwrap_or(false)
    }

    pub fn type_for_alias(&self, name: &str) -> Option<TypeKey> {
        self.policies
            .iter()
            .find_map(|policy| policy.type_for_alias(name))
    }

    pub fn alias_for_type(&self, ty: TypeKey) -> Option<&str> {
        self.policies
            .iter()
            .find_map(|policy| policy.alias_for_type(ty))
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// Bidirectional class-name↔alias mapping.
#[derive(Default)]
pub struct AliasingPolicy {
    to_type: AHashMap<String, TypeKey>,
    to_alias: AHashMap<TypeKey, String>,
}

impl AliasingPolicy {
    pub fn new() -> Self {
        AliasingPolicy::default()
    }

    /// Register `name` as the serialized alias of type `T`.
    pub fn alias<T: std::any::Any>(&mut self, name: &str) {
        self.alias_key(name, TypeKey::of::<T>());
    }

    /// Non-generic form of [`AliasingPolicy::alias`].
    pub fn alias_key(&mut self, name: &str, ty: TypeKey) {
        self.to_type.insert(name.to_owned(), ty);
        self.to_alias.insert(ty, name.to_owned());
    }
}

impl MapperPolicy for AliasingPolicy {
    fn type_for_alias(&self, name: &str) -> Option<TypeKey> {
        self.to_type.get(name).copied()
    }

    fn alias_for_type(&self, ty: TypeKey) -> Option<&str> {
        self.to_alias.get(&ty).map(String::as_str)
    }
}

#[derive(Hash, PartialEq, Eq)]
struct FieldKey {
    declared_in: TypeKey,
    field: String,
}

/// Visibility policy: omits specific members, skips ignorable unknown
/// elements by pattern, and vetoes members whose static field type is on a
/// caller-supplied block list.
///
/// The block list is deliberately opaque: the policy evaluates exactly the
/// type keys it was configured with and hardcodes none of its own.
#[derive(Default)]
pub struct ElementIgnoringPolicy {
    omitted: AHashSet<FieldKey>,
    patterns: Vec<Regex>,
    blocked_field_types: AHashSet<TypeKey>,
}

impl ElementIgnoringPolicy {
    pub fn new() -> Self {
        ElementIgnoringPolicy::default()
    }

    /// Omit the member `field` declared in type `T` entirely.
    pub fn omit_field<T: std::any::Any>(&mut self, field: &str) {
        self.omit_field_key(TypeKey::of::<T>(), field);
    }

    /// Non-generic form of [`ElementIgnoringPolicy::omit_field`].
    pub fn omit_field_key(&mut self, declared_in: TypeKey, field: &str) {
        self.omitted.insert(FieldKey {
            declared_in,
            field: field.to_owned(),
        });
    }

    /// Treat unknown elements matching `pattern` as ignorable.
    ///
    /// The pattern must cover the whole element name; a substring hit does
    /// not make an element ignorable.
    pub fn ignore_elements_matching(&mut self, pattern: Regex) {
        // Re-anchoring a valid pattern cannot fail.
        let anchored = Regex::new(&format!("^(?:{})$", pattern.as_str())).unwrap_or(pattern);
        self.patterns.push(anchored);
    }

    /// Veto every member whose static field type is `T`.
    pub fn block_field_type<T: std::any::Any>(&mut self) {
        self.block_field_type_key(TypeKey::of::<T>());
    }

    /// Non-generic form of [`ElementIgnoringPolicy::block_field_type`].
    pub fn block_field_type_key(&mut self, ty: TypeKey) {
        self.blocked_field_types.insert(ty);
    }

    fn matches_pattern(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(name))
    }
}

impl MapperPolicy for ElementIgnoringPolicy {
    fn should_write_member(&self, member: &Member<'_>) -> Option<bool> {
        match member.declared_in {
            Some(declared_in) => {
                let key = FieldKey {
                    declared_in,
                    field: member.field.to_owned(),
                };
                if self.omitted.contains(&key) {
                    return Some(false);
                }
            }
            // The pattern rule applies only when the member's owner is
            // unresolved, mirroring the unknown-element fallback branch.
            None => {
                if self.matches_pattern(member.field) {
                    return Some(false);
                }
            }
        }
        if let Some(field_type) = member.field_type
            && self.blocked_field_types.contains(&field_type)
        {
            return Some(false);
        }
        None
    }

    fn is_ignored_element(&self, name: &str) -> Option<bool> {
        if self.matches_pattern(name) {
            Some(true)
        } else {
            None
        }
    }
}

/// Abstract-to-concrete type substitution.
#[derive(Default)]
pub struct DefaultImplementationPolicy {
    substitutions: AHashMap<TypeKey, TypeKey>,
}

impl DefaultImplementationPolicy {
    pub fn new() -> Self {
        DefaultImplementationPolicy::default()
    }

    /// Instantiate `Concrete` wherever `Declared` is requested.
    pub fn substitute<Declared: std::any::Any, Concrete: std::any::Any>(&mut self) {
        self.substitute_key(TypeKey::of::<Declared>(), TypeKey::of::<Concrete>());
    }

    /// Non-generic form of [`DefaultImplementationPolicy::substitute`].
    pub fn substitute_key(&mut self, declared: TypeKey, concrete: TypeKey) {
        self.substitutions.insert(declared, concrete);
    }
}

impl MapperPolicy for DefaultImplementationPolicy {
    fn default_implementation_of(&self, ty: TypeKey) -> Option<TypeKey> {
        self.substitutions.get(&ty).copied()
    }
}
