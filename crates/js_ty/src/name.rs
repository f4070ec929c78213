//! Type names are free-form strings coming from doc comments, the index and
//! literals. Every name passes through [`canonical_type_name`] before it is
//! stored, so comparing two names is plain string equality.
//!
//! Encodings:
//! - `Array<T>` array with element type `T` (`T[]` is accepted as input)
//! - `Class<T>` the static side of `T`
//! - `Function<R1|R2>` a function value returning `R1` or `R2`
//! - `Function(P1,P2):R1|R2` a function signature with parameter types
//!
//! A member of a `|` list that itself holds a top-level `|` (a signature
//! returning a union) is wrapped in parentheses:
//! `Function<(Function():Number|String)|Boolean>`.

use smol_str::{format_smolstr, SmolStr};

use crate::{
    ARRAY_TYPE, BOOLEAN_TYPE, CLASS_TYPE, DEFAULT_PARAMETER_TYPE, FUNCTION_TYPE, NUMBER_TYPE,
    OBJECT_TYPE, REG_EXP_TYPE, STRING_TYPE,
};

/// Normalize a raw type name. Returns `None` for names that denote no type
/// at all (empty input, `void`).
pub fn canonical_type_name(raw: &str) -> Option<SmolStr> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    canonicalize(&compact)
}

fn canonicalize(name: &str) -> Option<SmolStr> {
    // nullable (`?T`, `!T`), rest (`...T`) and optional (`T=`) markers from doc comments
    let name = name
        .trim_start_matches(|c| c == '?' || c == '!' || c == '.')
        .trim_end_matches('=');
    if name.is_empty() {
        return None;
    }
    if let Some(inner) = unwrap_group(name) {
        return canonicalize(inner);
    }

    if let Some(elem) = name.strip_suffix("[]") {
        // the element may still hold `,` separated arguments
        return canonicalize(elem).and_then(|elem| canonicalize(&array_type(&elem)));
    }

    let Some(open) = name.find(|c| c == '<' || c == '(') else {
        return alias(name);
    };

    // anything we can't make sense of is kept verbatim
    let Some(close) = matching_close(name, open) else {
        return Some(name.into());
    };
    let Some(base) = alias(&name[..open]) else {
        return Some(name.into());
    };
    let inner = &name[open + 1..close];
    let rest = &name[close + 1..];

    if name.as_bytes()[open] == b'<' {
        if !rest.is_empty() {
            return Some(name.into());
        }
        let args = canonical_union(inner, &['|', ',']);
        if args.is_empty() {
            return Some(base);
        }
        return Some(format_smolstr!("{base}<{}>", join_members(&args)));
    }

    let params: Vec<SmolStr> = if inner.is_empty() {
        Vec::new()
    } else {
        split_top_level(inner, &[','])
            .into_iter()
            .map(|param| {
                let union = canonical_union(param, &['|']);
                if union.is_empty() {
                    SmolStr::new_static(DEFAULT_PARAMETER_TYPE)
                } else {
                    join_members(&union).into()
                }
            })
            .collect()
    };

    let returns = match rest.strip_prefix(':') {
        Some(returns) => canonical_union(returns, &['|', ',']),
        None if rest.is_empty() => Vec::new(),
        None => return Some(name.into()),
    };

    Some(signature(&base, &params, &returns))
}

fn alias(name: &str) -> Option<SmolStr> {
    let canonical = match name {
        "" | "void" => return None,
        "string" => STRING_TYPE,
        "number" | "int" | "integer" | "float" | "double" => NUMBER_TYPE,
        "boolean" | "bool" => BOOLEAN_TYPE,
        "object" | "any" | "mixed" | "*" => OBJECT_TYPE,
        "function" => FUNCTION_TYPE,
        "array" => ARRAY_TYPE,
        "regexp" => REG_EXP_TYPE,
        other => return Some(other.into()),
    };
    Some(SmolStr::new_static(canonical))
}

/// Canonicalize every member of a `|` (or `,`) separated list, dropping
/// empties and duplicates while keeping the first occurrence's position.
/// Grouped plain unions such as `(A|B)` are flattened into the list.
fn canonical_union(list: &str, seps: &[char]) -> Vec<SmolStr> {
    let mut out: Vec<SmolStr> = Vec::new();
    for name in split_top_level(list, seps).into_iter().filter_map(canonicalize) {
        let parts = split_top_level(&name, &['|']);
        // `Function(..):A|B` is one signature, not a union
        let members: Vec<SmolStr> = if parts.len() > 1 && !parts[0].contains("):") {
            parts.into_iter().filter_map(canonicalize).collect()
        } else {
            vec![name.clone()]
        };
        for member in members {
            if !out.contains(&member) {
                out.push(member);
            }
        }
    }
    out
}

/// Join canonical names into one `|` list, grouping the ones that carry a
/// `|` of their own.
fn join_members<S: AsRef<str>>(members: &[S]) -> String {
    let members: Vec<SmolStr> = members.iter().map(|m| group_member(m.as_ref())).collect();
    members.join("|")
}

fn group_member(name: &str) -> SmolStr {
    if has_top_level_union(name) {
        format_smolstr!("({name})")
    } else {
        name.into()
    }
}

fn has_top_level_union(name: &str) -> bool {
    split_top_level(name, &['|']).len() > 1
}

/// `(T)` to `T` when the parentheses enclose the whole name.
fn unwrap_group(name: &str) -> Option<&str> {
    (name.starts_with('(') && matching_close(name, 0) == Some(name.len() - 1))
        .then(|| &name[1..name.len() - 1])
}

/// A single name for a list of alternatives: `A|B`. Members that are
/// themselves unions (signatures returning several types) stay grouped.
pub fn union_type<S: AsRef<str>>(members: &[S]) -> SmolStr {
    join_members(members).into()
}

/// Split a `|` or `,` separated list such as `(String|Number)` into
/// canonical member names.
pub fn split_union(list: &str) -> Vec<SmolStr> {
    let compact: String = list.chars().filter(|c| !c.is_whitespace()).collect();
    let mut list = compact.as_str();
    while let Some(inner) = unwrap_group(list) {
        list = inner;
    }
    canonical_union(list, &['|', ','])
}

fn split_top_level<'a>(s: &'a str, seps: &[char]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, c) in s.char_indices() {
        match c {
            '<' | '(' => depth += 1,
            '>' | ')' => depth -= 1,
            c if depth == 0 && seps.contains(&c) => {
                parts.push(&s[start..idx]);
                start = idx + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn matching_close(s: &str, open: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let (open_b, close_b) = match bytes.get(open)? {
        b'<' => (b'<', b'>'),
        b'(' => (b'(', b')'),
        _ => return None,
    };
    let mut depth = 0usize;
    for (idx, &b) in bytes.iter().enumerate().skip(open) {
        if b == open_b {
            depth += 1;
        } else if b == close_b {
            depth -= 1;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

fn signature(base: &str, params: &[SmolStr], returns: &[SmolStr]) -> SmolStr {
    if returns.is_empty() {
        format_smolstr!("{base}({})", params.join(","))
    } else {
        format_smolstr!("{base}({}):{}", params.join(","), join_members(returns))
    }
}

fn generic_argument<'a>(name: &'a str, base: &str) -> Option<&'a str> {
    let arg = name.strip_prefix(base)?.strip_prefix('<')?.strip_suffix('>')?;
    (!arg.is_empty()).then_some(arg)
}

// ==========================================================================
// Predicates
// ==========================================================================

pub fn is_array_type(name: &str) -> bool {
    name == ARRAY_TYPE || is_generic_array(name)
}

pub fn is_generic_array(name: &str) -> bool {
    generic_argument(name, ARRAY_TYPE).is_some()
}

pub fn is_class_type(name: &str) -> bool {
    generic_argument(name, CLASS_TYPE).is_some()
}

/// True for plain `Function`, `Function<...>` and `Function(...)` encodings.
pub fn is_function_type(name: &str) -> bool {
    match name.strip_prefix(FUNCTION_TYPE) {
        Some(rest) => rest.is_empty() || rest.starts_with('<') || rest.starts_with('('),
        None => false,
    }
}

// ==========================================================================
// Constructors
// ==========================================================================

pub fn array_type(element: &str) -> SmolStr {
    format_smolstr!("{ARRAY_TYPE}<{}>", group_member(element))
}

pub fn class_type(base: &str) -> SmolStr {
    format_smolstr!("{CLASS_TYPE}<{}>", group_member(base))
}

/// `Function` when nothing is returned, otherwise `Function<R1|R2>`.
pub fn function_type<S: AsRef<str>>(returns: &[S]) -> SmolStr {
    if returns.is_empty() {
        return SmolStr::new_static(FUNCTION_TYPE);
    }
    format_smolstr!("{FUNCTION_TYPE}<{}>", join_members(returns))
}

pub fn function_signature_type<P: AsRef<str>, R: AsRef<str>>(params: &[P], returns: &[R]) -> SmolStr {
    let params: Vec<SmolStr> = params.iter().map(|p| p.as_ref().into()).collect();
    let returns: Vec<SmolStr> = returns.iter().map(|r| r.as_ref().into()).collect();
    signature(FUNCTION_TYPE, &params, &returns)
}

// ==========================================================================
// Accessors
// ==========================================================================

/// `Array<T>` to `T`. Bare `Array` carries no element type.
pub fn array_element_type(name: &str) -> Option<SmolStr> {
    generic_argument(name, ARRAY_TYPE).map(ungrouped)
}

/// `Class<T>` to `T`.
pub fn class_base_type(name: &str) -> Option<SmolStr> {
    generic_argument(name, CLASS_TYPE).map(ungrouped)
}

fn ungrouped(arg: &str) -> SmolStr {
    unwrap_group(arg).unwrap_or(arg).into()
}

/// Return types encoded in either function form. Anything else has none.
pub fn function_return_types(name: &str) -> Vec<SmolStr> {
    if let Some(returns) = generic_argument(name, FUNCTION_TYPE) {
        return canonical_union(returns, &['|']);
    }

    let Some(rest) = name.strip_prefix(FUNCTION_TYPE) else {
        return Vec::new();
    };
    if !rest.starts_with('(') {
        return Vec::new();
    }
    let Some(close) = matching_close(rest, 0) else {
        return Vec::new();
    };
    match rest[close + 1..].strip_prefix(':') {
        Some(returns) => canonical_union(returns, &['|']),
        None => Vec::new(),
    }
}

/// The name without generic arguments or signature: `Array<String>` to `Array`.
pub fn base_type_name(name: &str) -> &str {
    match name.find(|c| c == '<' || c == '(') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}
