//! Calls with tailored explanations.
//!
//! Free functions are recognized by canonical path, methods by name and
//! arity. A recognized call that lacks the operands a sentence needs falls
//! back to the generic rendering.

use assertive_code::{Node, PathRef};

use super::render::call_subject;

const ERRORS_IS: &[&str] = &["assertive", "errors", "is"];
const ERRORS_IS_TYPE: &[&str] = &["assertive", "errors", "is_type"];

pub(super) fn function(path: &PathRef, args: &[Node], polarity: bool) -> Option<String> {
    if path.is(ERRORS_IS) {
        let [err, target] = args else { return None };
        let (err, target) = (err.operand_text(), target.operand_text());
        return Some(if polarity {
            format!("{err}'s error tree contains {target}")
        } else {
            format!("{target} is not in the error tree of {err}")
        });
    }

    if path.is(ERRORS_IS_TYPE) {
        let ([err], [ty]) = (args, path.generics.as_slice()) else {
            return None;
        };
        return Some(can_be_defined_as(err.operand_text(), ty, polarity));
    }

    if is_partial_eq(path, "eq") || is_partial_eq(path, "ne") {
        let [a, b] = args else { return None };
        let equal = is_partial_eq(path, "eq") == polarity;
        return Some(equality(a.operand_text(), b.operand_text(), equal));
    }

    None
}

pub(super) fn method(
    receiver: &Node,
    method: &str,
    turbofish: &[String],
    args: &[Node],
    polarity: bool,
) -> Option<String> {
    let subject = receiver.operand_text();
    let returned = call_subject(receiver).is_some();

    let sentence = match (method, args) {
        ("contains", [item]) => negatable(subject, "contains", "does not contain", item, polarity),
        ("contains_key", [key]) => negatable(
            subject,
            "contains key",
            "does not contain key",
            key,
            polarity,
        ),
        ("starts_with", [prefix]) => {
            negatable(subject, "starts with", "does not start with", prefix, polarity)
        }
        ("ends_with", [suffix]) => {
            negatable(subject, "ends with", "does not end with", suffix, polarity)
        }
        ("is_empty", []) => format!("{subject} is {}empty", if polarity { "" } else { "not " }),
        ("eq", [other]) => equality(subject, other.operand_text(), polarity),
        ("ne", [other]) => equality(subject, other.operand_text(), !polarity),
        ("is", []) => {
            let [ty] = turbofish else { return None };
            can_be_defined_as(subject, ty, polarity)
        }
        ("is_none" | "is_some", []) => {
            let none = (method == "is_none") == polarity;
            match (returned, none) {
                (true, true) => format!("{subject} returned None"),
                (true, false) => format!("{subject} returned Some"),
                (false, true) => format!("{subject} is None"),
                (false, false) => format!("{subject} is Some"),
            }
        }
        ("is_ok" | "is_err", []) => {
            let ok = (method == "is_ok") == polarity;
            match (returned, ok) {
                (true, true) => format!("{subject} returned no error"),
                (true, false) => format!("{subject} returned an error"),
                (false, true) => format!("{subject} is Ok"),
                (false, false) => format!("{subject} is Err"),
            }
        }
        _ => return None,
    };
    Some(sentence)
}

fn is_partial_eq(path: &PathRef, method: &str) -> bool {
    ["std", "core"]
        .into_iter()
        .any(|root| path.is(&[root, "cmp", "PartialEq", method]))
        || path.is(&["PartialEq", method])
}

fn negatable(subject: &str, yes: &str, no: &str, operand: &Node, polarity: bool) -> String {
    let verb = if polarity { yes } else { no };
    format!("{subject} {verb} {}", operand.operand_text())
}

fn equality(a: &str, b: &str, equal: bool) -> String {
    if equal {
        format!("{a} is equal to {b}")
    } else {
        format!("{a} is not equal to {b}")
    }
}

fn can_be_defined_as(err: &str, ty: &str, polarity: bool) -> String {
    if polarity {
        format!("{err} can be defined as {ty}")
    } else {
        format!("{err} cannot be defined as {ty}")
    }
}
