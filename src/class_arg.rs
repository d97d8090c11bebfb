use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// A single argument to class composition.
///
/// Mirrors the permissive argument surface of classnames-style utilities:
/// strings, booleans, absent values, nested lists, and flag maps are all
/// accepted, and anything else degrades to "contributes nothing" instead of
/// failing. See [`ClassArg::resolve`] for the contribution rules.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassArg {
    /// An absent value. Contributes nothing.
    Null,

    /// A bare boolean. Contributes nothing: `false` is falsy, and `true` is
    /// not a class name.
    Flag(bool),

    /// A class string. Contributes itself as one token when non-empty.
    Str(String),

    /// An ordered list of nested arguments, flattened in order.
    List(Vec<ClassArg>),

    /// A flag map: each key whose value is truthy contributes the key as a
    /// token, in insertion order. Values are read only for truthiness and
    /// never appear in the output.
    Map(IndexMap<String, Value>),

    /// Any value outside the supported surface (numbers and the like).
    /// Contributes nothing.
    Other,
}

impl ClassArg {
    /// Build a [`ClassArg::List`] from anything iterable.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ClassArg>,
    {
        ClassArg::List(items.into_iter().map(Into::into).collect())
    }
}

/// General-purpose truthiness of an arbitrary JSON value.
///
/// `null`, `false`, numeric zero, NaN, and the empty string are falsy;
/// everything else is truthy, including empty arrays and empty objects.
/// Flag-map values are gated through this check.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => match number.as_f64() {
            Some(n) => n != 0.0 && !n.is_nan(),
            // Arbitrary-precision numbers beyond f64 are never zero.
            None => true,
        },
        Value::String(s) => !s.is_empty(),
        // Containers are truthy even when empty.
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl From<&str> for ClassArg {
    fn from(token: &str) -> Self {
        ClassArg::Str(token.to_owned())
    }
}

impl From<String> for ClassArg {
    fn from(token: String) -> Self {
        ClassArg::Str(token)
    }
}

impl From<&String> for ClassArg {
    fn from(token: &String) -> Self {
        ClassArg::Str(token.clone())
    }
}

impl From<bool> for ClassArg {
    fn from(flag: bool) -> Self {
        ClassArg::Flag(flag)
    }
}

impl From<&ClassArg> for ClassArg {
    fn from(arg: &ClassArg) -> Self {
        arg.clone()
    }
}

/// `None` is the absent value; `Some` converts its payload.
impl<T> From<Option<T>> for ClassArg
where
    T: Into<ClassArg>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => inner.into(),
            None => ClassArg::Null,
        }
    }
}

impl<T> From<Vec<T>> for ClassArg
where
    T: Into<ClassArg>,
{
    fn from(items: Vec<T>) -> Self {
        ClassArg::list(items)
    }
}

impl<T, const N: usize> From<[T; N]> for ClassArg
where
    T: Into<ClassArg>,
{
    fn from(items: [T; N]) -> Self {
        ClassArg::list(items)
    }
}

impl<V> From<IndexMap<String, V>> for ClassArg
where
    V: Into<Value>,
{
    fn from(entries: IndexMap<String, V>) -> Self {
        ClassArg::Map(entries.into_iter().map(|(key, value)| (key, value.into())).collect())
    }
}

impl<V> From<IndexMap<&str, V>> for ClassArg
where
    V: Into<Value>,
{
    fn from(entries: IndexMap<&str, V>) -> Self {
        ClassArg::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_owned(), value.into()))
                .collect(),
        )
    }
}

/// Classify an arbitrary JSON value into the argument surface.
///
/// This is the permissive runtime boundary: values outside the declared
/// union (numbers) become [`ClassArg::Other`] rather than an error.
impl From<Value> for ClassArg {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ClassArg::Null,
            Value::Bool(flag) => ClassArg::Flag(flag),
            Value::Number(_) => ClassArg::Other,
            Value::String(token) => ClassArg::Str(token),
            Value::Array(items) => ClassArg::List(items.into_iter().map(ClassArg::from).collect()),
            Value::Object(entries) => ClassArg::Map(entries.into_iter().collect()),
        }
    }
}

/// Deserializes any JSON value and classifies it; never rejects a value for
/// being outside the declared argument surface.
impl<'de> Deserialize<'de> for ClassArg {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(ClassArg::from)
    }
}

/// Parses JSON text into a classified argument. Only malformed JSON fails.
impl FromStr for ClassArg {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_str::<Value>(s).map(ClassArg::from)
    }
}
