//! The type lattice used by abstract evaluation.
//!
//! A [`Type`] describes a set of JSON values. `Any` is the top of the value
//! lattice and `Bottom` the empty set. Arrays come in two precisions: `Tuple`
//! for a known length with per-position types and `Array` for any length.
//! Objects are either closed shapes (`Object(Some(props))`), homogeneous maps,
//! or unconstrained (`Object(None)`).
//!
//! Unions are normalized by [`Type::union_all`]: nested unions are flattened,
//! duplicates and members subsumed by another member are dropped, and the
//! remaining members are kept in a canonical order so that structural
//! equality is set equality.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::ast::Expression;
use crate::runtime::{Runtime, RuntimeType, RuntimeTypes};

/// Why an abstract evaluation step is known to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidType,
    InvalidArity,
    InvalidValue,
    UnknownFunction,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::InvalidType => "invalid-type",
            ErrorKind::InvalidArity => "invalid-arity",
            ErrorKind::InvalidValue => "invalid-value",
            ErrorKind::UnknownFunction => "unknown-function",
        })
    }
}

/// Statically known truthiness of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truthiness {
    /// Every value of the type is truthy.
    Truthy,
    /// Every value of the type is falsy.
    Falsy,
    /// Both are possible.
    Unknown,
    /// The type has no values (`Bottom`, errors).
    Never,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Any,
    Null,
    Boolean,
    String,
    Number,
    /// Array of any length whose elements all have the given type.
    Array(Box<Type>),
    /// Array of exactly this many elements.
    Tuple(Vec<Type>),
    /// Object with keys of the first type and values of the second.
    Map(Box<Type>, Box<Type>),
    /// `None` is any object; `Some` is an object with exactly these members.
    Object(Option<BTreeMap<String, Type>>),
    /// Normalized union; build with [`Type::union_all`].
    Union(Vec<Type>),
    Bottom,
    Error(ErrorKind),
    /// A deferred expression (`&expr`) passed to a function.
    Expression(Box<Expression>),
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Type::Array(element) => element.hash(state),
            Type::Tuple(items) | Type::Union(items) => items.hash(state),
            Type::Map(key, value) => {
                key.hash(state);
                value.hash(state);
            }
            Type::Object(props) => props.hash(state),
            Type::Error(kind) => kind.hash(state),
            // Equal trees serialize to the same canonical text
            Type::Expression(expr) => expr.serialize().hash(state),
            Type::Any | Type::Null | Type::Boolean | Type::String | Type::Number | Type::Bottom => {}
        }
    }
}

impl Type {
    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    /// A closed object shape.
    pub fn object<I, K>(members: I) -> Type
    where
        I: IntoIterator<Item = (K, Type)>,
        K: Into<String>,
    {
        Type::Object(Some(members.into_iter().map(|(k, v)| (k.into(), v)).collect()))
    }

    pub fn union(a: Type, b: Type) -> Type {
        Type::union_all([a, b])
    }

    pub fn union_all<I: IntoIterator<Item = Type>>(types: I) -> Type {
        let mut flat = Vec::new();
        for ty in types {
            match ty {
                Type::Union(members) => flat.extend(members),
                Type::Bottom => {}
                other => flat.push(other),
            }
        }

        if flat.contains(&Type::Any) {
            flat.retain(|ty| ty == &Type::Any || !ty.is_value_type());
        }

        let mut unique: Vec<Type> = Vec::with_capacity(flat.len());
        for ty in flat {
            if !unique.contains(&ty) {
                unique.push(ty);
            }
        }

        let mut kept: Vec<Type> = unique
            .iter()
            .enumerate()
            .filter(|(i, ty)| {
                !unique.iter().enumerate().any(|(j, other)| {
                    j != *i && ty.is_subtype_of(other) && (j < *i || !other.is_subtype_of(ty))
                })
            })
            .map(|(_, ty)| ty.clone())
            .collect();

        match kept.len() {
            0 => Type::Bottom,
            1 => kept.remove(0),
            _ => {
                kept.sort_by_cached_key(|ty| ty.to_string());
                Type::Union(kept)
            }
        }
    }

    /// The exact type of a concrete value.
    pub fn of<R: Runtime>(value: &R::Value, runtime: &R) -> Type {
        match runtime.type_of(value) {
            RuntimeType::Null => Type::Null,
            RuntimeType::Boolean => Type::Boolean,
            RuntimeType::String => Type::String,
            RuntimeType::Number => Type::Number,
            RuntimeType::Array => {
                Type::Tuple(runtime.iter_array(value).map(|v| Type::of(v, runtime)).collect())
            }
            RuntimeType::Object => Type::object(
                runtime
                    .iter_object(value)
                    .map(|(k, v)| (k.to_string(), Type::of(v, runtime))),
            ),
            RuntimeType::Expression => Type::Any,
        }
    }

    /// Types that describe JSON values, as opposed to `Bottom`, errors and
    /// expression references.
    pub fn is_value_type(&self) -> bool {
        !matches!(self, Type::Bottom | Type::Error(_) | Type::Expression(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Error(_))
    }

    pub fn runtime_types(&self) -> RuntimeTypes {
        match self {
            Type::Any => RuntimeTypes::VALUES,
            Type::Null => RuntimeTypes::NULL,
            Type::Boolean => RuntimeTypes::BOOLEAN,
            Type::String => RuntimeTypes::STRING,
            Type::Number => RuntimeTypes::NUMBER,
            Type::Array(_) | Type::Tuple(_) => RuntimeTypes::ARRAY,
            Type::Map(_, _) | Type::Object(_) => RuntimeTypes::OBJECT,
            Type::Union(members) => members
                .iter()
                .fold(RuntimeTypes::empty(), |acc, ty| acc | ty.runtime_types()),
            Type::Expression(_) => RuntimeTypes::EXPRESSION,
            Type::Bottom | Type::Error(_) => RuntimeTypes::empty(),
        }
    }

    pub fn may_be(&self, ty: RuntimeType) -> bool {
        self.runtime_types().contains(RuntimeTypes::from(ty))
    }

    /// Short description by kinds, used in diagnostics: `boolean`, `null | object`.
    pub fn kind_name(&self) -> String {
        match self {
            Type::Any => "any".to_string(),
            Type::Bottom => "bottom".to_string(),
            Type::Error(kind) => format!("error<{}>", kind),
            _ => {
                let names: Vec<&str> = self.runtime_types().kinds().map(RuntimeType::name).collect();
                names.join(" | ")
            }
        }
    }

    /// Union members, with `Any` expanded into one member per value kind.
    pub fn members(&self) -> Vec<Type> {
        match self {
            Type::Union(members) => members.iter().flat_map(Type::members).collect(),
            Type::Any => vec![
                Type::Null,
                Type::Boolean,
                Type::String,
                Type::Number,
                Type::array(Type::Any),
                Type::Object(None),
            ],
            Type::Bottom => Vec::new(),
            other => vec![other.clone()],
        }
    }

    pub fn union_len(&self) -> usize {
        match self {
            Type::Union(members) => members.len(),
            Type::Bottom => 0,
            _ => 1,
        }
    }

    /// The members whose kind is in `allowed`, or `None` when there are none.
    pub fn narrow(&self, allowed: RuntimeTypes) -> Option<Type> {
        if self == &Type::Any && allowed.contains(RuntimeTypes::VALUES) {
            return Some(Type::Any);
        }
        let narrowed = Type::union_all(
            self.members()
                .into_iter()
                .filter(|ty| ty.runtime_types().intersects(allowed)),
        );
        if narrowed == Type::Bottom {
            None
        } else {
            Some(narrowed)
        }
    }

    /// Narrows to `allowed`, or `Error(InvalidType)` when no member fits.
    pub fn expect_any_of(&self, allowed: RuntimeTypes) -> Type {
        self.narrow(allowed)
            .unwrap_or(Type::Error(ErrorKind::InvalidType))
    }

    pub fn without_null(&self) -> Type {
        if !self.may_be(RuntimeType::Null) {
            return self.clone();
        }
        Type::union_all(self.members().into_iter().filter(|ty| ty != &Type::Null))
    }

    /// `self ⊑ other`: every value of `self` is a value of `other`.
    pub fn is_subtype_of(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Type::Bottom, _) => true,
            (Type::Union(members), _) => members.iter().all(|ty| ty.is_subtype_of(other)),
            (_, Type::Any) => self.is_value_type(),
            (_, Type::Union(members)) => members.iter().any(|ty| self.is_subtype_of(ty)),
            (Type::Array(a), Type::Array(b)) => a.is_subtype_of(b),
            (Type::Tuple(items), Type::Array(b)) => items.iter().all(|ty| ty.is_subtype_of(b)),
            (Type::Tuple(a), Type::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_subtype_of(y))
            }
            (Type::Map(k1, v1), Type::Map(k2, v2)) => k1.is_subtype_of(k2) && v1.is_subtype_of(v2),
            (Type::Map(_, _) | Type::Object(Some(_)), Type::Object(None)) => true,
            (Type::Object(Some(props)), Type::Map(k, v)) => {
                (props.is_empty() || Type::String.is_subtype_of(k))
                    && props.values().all(|ty| ty.is_subtype_of(v))
            }
            (Type::Object(Some(a)), Type::Object(Some(b))) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, ty)| b.get(key).is_some_and(|other| ty.is_subtype_of(other)))
            }
            _ => false,
        }
    }

    /// Element type of arrays in `self`, without the `null` of an out-of-range read.
    pub fn member_type(&self) -> Type {
        Type::union_all(self.members().into_iter().map(|ty| match ty {
            Type::Array(element) => *element,
            Type::Tuple(items) => Type::union_all(items),
            _ => Type::Bottom,
        }))
    }

    /// Type of reading an array element: the member type or `null`.
    pub fn element_type(&self) -> Type {
        Type::union(self.member_type(), Type::Null)
    }

    /// Type of `self[index]`. Exact for tuples.
    pub fn index_type(&self, index: i64) -> Type {
        Type::union_all(self.members().into_iter().map(|ty| match ty {
            Type::Tuple(items) => normalize_index(index, items.len())
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Type::Null),
            Type::Array(element) => Type::union(*element, Type::Null),
            Type::Error(_) => ty,
            _ => Type::Null,
        }))
    }

    /// Type of reading member `key`. Exact for closed shapes; maps may miss
    /// the key and add `null`.
    pub fn value_type(&self, key: &str) -> Type {
        Type::union_all(self.members().into_iter().map(|ty| match ty {
            Type::Object(Some(props)) => props.get(key).cloned().unwrap_or(Type::Null),
            Type::Object(None) => Type::Any,
            Type::Map(_, value) => Type::union(*value, Type::Null),
            Type::Error(_) => ty,
            _ => Type::Null,
        }))
    }

    /// The values of the objects in `self`, as an array type to fold over.
    pub fn object_values(&self) -> Type {
        Type::union_all(self.members().into_iter().map(|ty| match ty {
            Type::Object(Some(props)) => Type::Tuple(props.into_values().collect()),
            Type::Object(None) => Type::array(Type::Any),
            Type::Map(_, value) => Type::Array(value),
            _ => Type::Bottom,
        }))
    }

    pub fn truthiness(&self) -> Truthiness {
        let mut truthy = false;
        let mut falsy = false;
        for ty in self.members() {
            match ty {
                Type::Null => falsy = true,
                Type::Number | Type::Expression(_) => truthy = true,
                Type::Tuple(items) if items.is_empty() => falsy = true,
                Type::Tuple(_) => truthy = true,
                Type::Object(Some(props)) if props.is_empty() => falsy = true,
                Type::Object(Some(_)) => truthy = true,
                Type::Bottom | Type::Error(_) => {}
                _ => {
                    truthy = true;
                    falsy = true;
                }
            }
        }
        match (truthy, falsy) {
            (true, false) => Truthiness::Truthy,
            (false, true) => Truthiness::Falsy,
            (true, true) => Truthiness::Unknown,
            (false, false) => Truthiness::Never,
        }
    }

    /// Forgets tuple lengths so that growing accumulators converge.
    pub fn widen(&self) -> Type {
        match self {
            Type::Tuple(items) => Type::array(Type::union_all(items.iter().map(Type::widen))),
            Type::Array(element) => Type::array(element.widen()),
            Type::Map(key, value) => Type::map(key.widen(), value.widen()),
            Type::Object(Some(props)) => Type::Object(Some(
                props.iter().map(|(k, v)| (k.clone(), v.widen())).collect(),
            )),
            Type::Union(members) => Type::union_all(members.iter().map(Type::widen)),
            other => other.clone(),
        }
    }

    /// Whether `value` is one of the values described by `self`.
    pub fn is_instance<R: Runtime>(&self, value: &R::Value, runtime: &R) -> bool {
        let kind = runtime.type_of(value);
        match self {
            Type::Any => kind != RuntimeType::Expression,
            Type::Null => kind == RuntimeType::Null,
            Type::Boolean => kind == RuntimeType::Boolean,
            Type::String => kind == RuntimeType::String,
            Type::Number => kind == RuntimeType::Number,
            Type::Array(element) => {
                kind == RuntimeType::Array
                    && runtime.iter_array(value).all(|v| element.is_instance(v, runtime))
            }
            Type::Tuple(items) => {
                kind == RuntimeType::Array
                    && runtime.length(value) == items.len()
                    && runtime
                        .iter_array(value)
                        .zip(items)
                        .all(|(v, ty)| ty.is_instance(v, runtime))
            }
            Type::Map(key, element) => {
                kind == RuntimeType::Object
                    && runtime.iter_object(value).all(|(_, v)| element.is_instance(v, runtime))
                    && (runtime.length(value) == 0 || Type::String.is_subtype_of(key))
            }
            Type::Object(None) => kind == RuntimeType::Object,
            Type::Object(Some(props)) => {
                kind == RuntimeType::Object
                    && runtime.length(value) == props.len()
                    && runtime.iter_object(value).all(|(k, v)| {
                        props.get(k).is_some_and(|ty| ty.is_instance(v, runtime))
                    })
            }
            Type::Union(members) => members.iter().any(|ty| ty.is_instance(value, runtime)),
            Type::Bottom | Type::Error(_) | Type::Expression(_) => false,
        }
    }
}

/// Resolves a possibly negative index against `len`.
pub(crate) fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { index + len } else { index };
    if (0..len).contains(&resolved) {
        usize::try_from(resolved).ok()
    } else {
        None
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => f.write_str("any"),
            Type::Null => f.write_str("null"),
            Type::Boolean => f.write_str("boolean"),
            Type::String => f.write_str("string"),
            Type::Number => f.write_str("number"),
            Type::Array(element) => write!(f, "array<{}>", element),
            Type::Tuple(items) => {
                let items: Vec<String> = items.iter().map(Type::to_string).collect();
                write!(f, "tuple<{}>", items.join(", "))
            }
            Type::Map(key, value) => write!(f, "map<{}, {}>", key, value),
            Type::Object(None) => f.write_str("object"),
            Type::Object(Some(props)) => {
                let members: Vec<String> = props.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "object{{{}}}", members.join(", "))
            }
            Type::Union(members) => {
                let members: Vec<String> = members.iter().map(Type::to_string).collect();
                f.write_str(&members.join(" | "))
            }
            Type::Bottom => f.write_str("bottom"),
            Type::Error(kind) => write!(f, "error<{}>", kind),
            Type::Expression(expr) => write!(f, "expression<&{}>", expr),
        }
    }
}
