//! Argument resolution and class string composition.
//!
//! Every [`ClassArg`] resolves to an ordered sequence of tokens, and [`cx`]
//! joins the tokens of an argument list with single spaces. Resolution is
//! total: no input can make it fail, and values outside the supported
//! surface simply contribute nothing.

use crate::class_arg::{is_truthy, ClassArg};

impl ClassArg {
    /// Resolve this argument to its ordered sequence of output tokens.
    ///
    /// Absent values, bare booleans, and out-of-surface values resolve to
    /// nothing. A non-empty string resolves to itself. A list resolves each
    /// element recursively, concatenates the results in element order, and
    /// drops empty entries. A flag map resolves to the keys whose values are
    /// truthy, in insertion order.
    ///
    /// Recursion depth follows list nesting. Parsed documents are bounded
    /// by the JSON parser's recursion limit; trees built directly in code
    /// must stay similarly shallow.
    pub fn resolve(self) -> Vec<String> {
        match self {
            ClassArg::Null | ClassArg::Flag(_) | ClassArg::Other => Vec::new(),
            ClassArg::Str(token) => {
                if token.is_empty() {
                    Vec::new()
                } else {
                    vec![token]
                }
            }
            ClassArg::List(items) => items
                .into_iter()
                .flat_map(ClassArg::resolve)
                .filter(|token| !token.is_empty())
                .collect(),
            ClassArg::Map(entries) => entries
                .into_iter()
                .filter(|(_, value)| is_truthy(value))
                .map(|(key, _)| key)
                .collect(),
        }
    }

    /// Whether resolving this argument would produce no tokens at all.
    pub fn is_inert(&self) -> bool {
        match self {
            ClassArg::Null | ClassArg::Flag(_) | ClassArg::Other => true,
            ClassArg::Str(token) => token.is_empty(),
            ClassArg::List(items) => items.iter().all(ClassArg::is_inert),
            ClassArg::Map(entries) => !entries.values().any(is_truthy),
        }
    }
}

/// Build a single space-separated class string from a sequence of class
/// arguments.
///
/// Each argument resolves to its tokens, the token sequences concatenate in
/// argument order, and the result joins with single spaces. An empty
/// resolution yields the empty string. Duplicate tokens are kept as given.
/// The operation never fails and never panics, whatever the input.
///
/// ```
/// use class_composer::cx;
///
/// assert_eq!(cx(["flex", "items-center"]), "flex items-center");
/// assert_eq!(cx([Some("btn"), None]), "btn");
/// ```
pub fn cx<I>(args: I) -> String
where
    I: IntoIterator,
    I::Item: Into<ClassArg>,
{
    // The argument list is itself a list argument, so the top level gets the
    // same flatten-and-filter treatment as any nested list.
    ClassArg::list(args).resolve().join(" ")
}

/// Variadic form of [`cx`] that accepts a mix of argument types in one call.
///
/// Each argument converts through [`ClassArg::from`], so strings, booleans,
/// options, vectors, JSON values, and flag maps combine freely.
///
/// ```
/// use class_composer::cx;
/// use serde_json::json;
///
/// let active = true;
/// let composed = cx!("btn", json!({ "btn-active": active }), false);
/// assert_eq!(composed, "btn btn-active");
/// ```
#[macro_export]
macro_rules! cx {
    () => {
        ::std::string::String::new()
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::cx([$($crate::ClassArg::from($arg)),+])
    };
}

/// Build a heterogeneous [`ClassArg::List`] in one expression.
///
/// Rust array literals are homogeneous, so nested argument lists that mix
/// types go through this macro instead.
///
/// ```
/// use class_composer::{cx, cx_list};
/// use serde_json::json;
///
/// let nested = cx_list!["p-4", json!({ "rounded": true }), None::<&str>];
/// assert_eq!(cx!("card", nested), "card p-4 rounded");
/// ```
#[macro_export]
macro_rules! cx_list {
    ($($arg:expr),* $(,)?) => {
        $crate::ClassArg::List(::std::vec![$($crate::ClassArg::from($arg)),*])
    };
}
