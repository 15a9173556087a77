//! Polarity-aware rendering of boolean expressions as English.
//!
//! `polarity` is the value the expression is known to have evaluated to.
//! It starts as the assertion's result and flips under `!`, so every
//! sentence describes what actually happened.

use assertive_code::{BinaryOp, Binding, ExprKind, Literal, Node, PathRef, ReturnShape, UnaryOp};
use thiserror::Error;

use super::known;

/// Why an expression could not be explained.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unsupported {shape}: {text}")]
    UnsupportedExpression { shape: &'static str, text: String },

    #[error("unable to render {context} of `{text}`: {source}")]
    Operand {
        context: &'static str,
        text: String,
        source: Box<RenderError>,
    },
}

impl RenderError {
    fn unsupported(node: &Node) -> Self {
        RenderError::UnsupportedExpression {
            shape: node.shape(),
            text: node.text.clone(),
        }
    }

    /// The innermost unsupported expression.
    pub fn root_cause(&self) -> &RenderError {
        match self {
            RenderError::Operand { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Explain `node` given that it evaluated to `polarity`.
pub fn render(node: &Node, polarity: bool) -> Result<String, RenderError> {
    match &node.kind {
        ExprKind::Binary { op, lhs, rhs } => render_binary(node, op, lhs, rhs, polarity),

        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => match operand.kind {
            ExprKind::Call { .. }
            | ExprKind::MethodCall { .. }
            | ExprKind::Path(_)
            | ExprKind::Paren(_)
            | ExprKind::Unary { .. }
            | ExprKind::Lit(Literal::Bool(_))
            | ExprKind::Matches { .. } => render(operand, !polarity),
            _ => Err(RenderError::unsupported(node)),
        },
        ExprKind::Unary {
            op: UnaryOp::Deref,
            operand,
        } => render(operand, polarity),
        ExprKind::Unary {
            op: UnaryOp::Neg, ..
        } => Err(RenderError::unsupported(node)),

        ExprKind::Paren(inner) | ExprKind::Await(inner) => render(inner, polarity),

        ExprKind::Call { .. } | ExprKind::MethodCall { .. } => render_call(node, polarity),

        ExprKind::Path(path) => render_path(node, path, polarity),

        ExprKind::Field { .. } => Ok(format!("{} is {polarity}", node.text)),

        ExprKind::Lit(Literal::Bool(value)) => Ok(format!("literal {value}")),

        ExprKind::Matches { scrutinee, pattern } => Ok(if polarity {
            format!("{} matches {pattern}", scrutinee.text)
        } else {
            format!("{} does not match {pattern}", scrutinee.text)
        }),

        ExprKind::Lit(Literal::Other)
        | ExprKind::Reference(_)
        | ExprKind::Closure
        | ExprKind::Other(_) => Err(RenderError::unsupported(node)),
    }
}

fn operand(context: &'static str, parent: &Node, node: &Node, polarity: bool) -> Result<String, RenderError> {
    render(node, polarity).map_err(|source| RenderError::Operand {
        context,
        text: parent.text.clone(),
        source: Box::new(source),
    })
}

// ============================================================================
// Binary expressions
// ============================================================================

fn render_binary(
    node: &Node,
    op: &BinaryOp,
    lhs: &Node,
    rhs: &Node,
    polarity: bool,
) -> Result<String, RenderError> {
    let (x, y) = (&lhs.text, &rhs.text);

    match op {
        BinaryOp::And | BinaryOp::Or => {
            let left = operand("left operand", node, lhs, polarity)?;
            let right = operand("right operand", node, rhs, polarity)?;
            let conjunction = matches!(op, BinaryOp::And) == polarity;
            let sep = if conjunction { ", and " } else { ", or " };
            Ok(format!("{left}{sep}{right}"))
        }

        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = matches!(op, BinaryOp::Eq) == polarity;
            Ok(render_equality(lhs, rhs, equal))
        }

        BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Lt | BinaryOp::Le => {
            let relation = match (op, polarity) {
                (BinaryOp::Gt, true) | (BinaryOp::Le, false) => "greater than",
                (BinaryOp::Ge, false) | (BinaryOp::Lt, true) => "less than",
                (BinaryOp::Ge, true) | (BinaryOp::Lt, false) => "greater than or equal to",
                _ => "less than or equal to",
            };
            Ok(format!("{x} is {relation} {y}"))
        }

        BinaryOp::Other(_) => Err(RenderError::unsupported(node)),
    }
}

fn render_equality(lhs: &Node, rhs: &Node, equal: bool) -> String {
    let (x, y) = (&lhs.text, &rhs.text);
    let rhs_none = rhs.is_none_value();
    let rhs_bool = rhs.const_bool();

    if let Some(call) = call_subject(lhs) {
        if rhs_none {
            let returned = match (call.call_returns(), equal) {
                (Some(ReturnShape::OptionalError), true) => "returned no error",
                (Some(ReturnShape::OptionalError), false) => "returned an error",
                (_, true) => "returned None",
                (_, false) => "returned Some",
            };
            return format!("{x} {returned}");
        }
        if let Some(value) = rhs_bool {
            let returned = if equal { value } else { !value };
            return format!("{x} returned {returned}");
        }
    } else {
        if rhs_none {
            let is = if equal { "is" } else { "is not" };
            return format!("{x} {is} None");
        }
        if let Some(value) = rhs_bool {
            let is = if equal { "is" } else { "is not" };
            return format!("{x} {is} {value}");
        }
    }

    if equal {
        format!("{x} is equal to {y}")
    } else {
        format!("{x} is not equal to {y}")
    }
}

/// The call an expression evaluates, looking through parentheses and
/// `.await`.
pub(super) fn call_subject(node: &Node) -> Option<&Node> {
    match &node.kind {
        ExprKind::Call { .. } | ExprKind::MethodCall { .. } => Some(node),
        ExprKind::Paren(inner) | ExprKind::Await(inner) => call_subject(inner),
        _ => None,
    }
}

// ============================================================================
// Calls and paths
// ============================================================================

fn render_call(node: &Node, polarity: bool) -> Result<String, RenderError> {
    match &node.kind {
        ExprKind::Call { callee, args } => {
            let callee = callee.unparen();
            match &callee.kind {
                ExprKind::Closure => return Ok(format!("{} returned {polarity}", node.text)),
                ExprKind::Path(path) => {
                    if let Some(sentence) = known::function(path, args, polarity) {
                        return Ok(sentence);
                    }
                }
                ExprKind::Field { .. } => {}
                _ => return Err(RenderError::unsupported(callee)),
            }
        }
        ExprKind::MethodCall {
            receiver,
            method,
            turbofish,
            args,
            ..
        } => {
            if let Some(sentence) = known::method(receiver, method, turbofish, args, polarity) {
                return Ok(sentence);
            }
        }
        _ => return Err(RenderError::unsupported(node)),
    }
    Ok(format!("function {} returned {polarity}", node.text))
}

fn render_path(node: &Node, path: &PathRef, polarity: bool) -> Result<String, RenderError> {
    let kind = match path.binding {
        Binding::Local | Binding::Static => "var",
        Binding::Const { .. } => "const",
        Binding::Unresolved => {
            let name = path.segments.last().map(String::as_str).unwrap_or_default();
            if is_screaming_case(name) {
                "const"
            } else {
                "var"
            }
        }
        Binding::Function { .. } | Binding::NoneValue => {
            return Err(RenderError::unsupported(node));
        }
    };
    Ok(format!("{kind} {} is {polarity}", node.text))
}

fn is_screaming_case(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_uppercase())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use assertive_code::parse_package;

    const PROBE_LINE: u32 = 1000;

    /// Render `expr` as if it were the condition of an assertion.
    ///
    /// `items` is placed at the top of the file and `locals` become
    /// parameters of the function holding the probe call.
    fn explain(items: &str, locals: &str, expr: &str, polarity: bool) -> Result<String, RenderError> {
        let header = format!("{items}\nfn probe_host({locals}) {{");
        let padding = PROBE_LINE as usize - 1 - header.lines().count();
        let source = format!("{header}{}probe(&t, {expr});\n}}\n", "\n".repeat(padding + 1));
        let package = parse_package("tests/render", "render", vec![(PathBuf::from("/render.rs"), source)])
            .expect("probe source parses");
        let call = package.files[0]
            .call_at(PROBE_LINE)
            .expect("probe call is indexed");
        render(&call.call_args()[1], polarity)
    }

    fn ok(items: &str, locals: &str, expr: &str, polarity: bool) -> String {
        explain(items, locals, expr, polarity).expect("expression renders")
    }

    mod combinator_tests {
        use super::*;

        #[test]
        fn and_or_follow_polarity() {
            assert_eq!(ok("", "a: bool, b: bool", "a && b", true), "var a is true, and var b is true");
            assert_eq!(ok("", "a: bool, b: bool", "a && b", false), "var a is false, or var b is false");
            assert_eq!(ok("", "a: bool, b: bool", "a || b", true), "var a is true, or var b is true");
            assert_eq!(ok("", "a: bool, b: bool", "a || b", false), "var a is false, and var b is false");
        }

        #[test]
        fn negation_flips_polarity() {
            assert_eq!(ok("", "a: bool", "!a", true), "var a is false");
            assert_eq!(ok("", "a: bool", "!!a", true), "var a is true");
            assert_eq!(ok("", "a: bool, b: bool", "!(a && b)", true), "var a is false, or var b is false");
            assert_eq!(ok("", "v: Vec<u8>", "!v.is_empty()", true), "v is not empty");
        }

        #[test]
        fn negation_needs_a_supported_operand() {
            assert_eq!(
                ok("", "a: u8", "!a.eq(&1) || !(a == 1)", true),
                "a is not equal to 1, or a is not equal to 1"
            );
            let err = explain("", "a: bool", "!a.then_some(1).is_some() && ![a][0]", true)
                .expect_err("index expression");
            assert!(matches!(err, RenderError::Operand { context: "right operand", .. }));
            assert!(matches!(
                err.root_cause(),
                RenderError::UnsupportedExpression { shape: "unary expression", .. }
            ));
        }

        #[test]
        fn transparent_wrappers() {
            assert_eq!(ok("", "a: &bool", "*a", false), "var a is false");
            assert_eq!(ok("", "a: bool", "((a))", true), "var a is true");
            assert_eq!(ok("", "f: F", "f.ready().await", true), "function f.ready() returned true");
        }
    }

    mod comparison_tests {
        use super::*;

        #[test]
        fn equality() {
            assert_eq!(ok("", "x: u8, y: u8", "x == y", true), "x is equal to y");
            assert_eq!(ok("", "x: u8, y: u8", "x == y", false), "x is not equal to y");
            assert_eq!(ok("", "x: u8, y: u8", "x != y", true), "x is not equal to y");
            assert_eq!(ok("", "x: u8, y: u8", "x != y", false), "x is equal to y");
            assert_eq!(
                ok("", "user: User", r#"user.name == "Bob""#, false),
                r#"user.name is not equal to "Bob""#
            );
        }

        #[test]
        fn none_comparisons() {
            assert_eq!(ok("", "name: Option<&str>", "name == None", true), "name is None");
            assert_eq!(ok("", "name: Option<&str>", "name == None", false), "name is not None");
            assert_eq!(ok("", "name: Option<&str>", "name != Option::None", true), "name is not None");
        }

        #[test]
        fn call_compared_to_none() {
            let items = "fn validate() -> Option<FormError> { None }\nfn lookup() -> Option<u8> { None }";
            assert_eq!(ok(items, "", "validate() == None", true), "validate() returned no error");
            assert_eq!(ok(items, "", "validate() == None", false), "validate() returned an error");
            assert_eq!(ok(items, "", "validate() != None", true), "validate() returned an error");
            assert_eq!(ok(items, "", "lookup() == None", true), "lookup() returned None");
            assert_eq!(ok(items, "", "lookup() != None", true), "lookup() returned Some");
            assert_eq!(ok(items, "", "(lookup()) == None", false), "(lookup()) returned Some");
        }

        #[test]
        fn bool_constants() {
            let items = "const STRICT: bool = true;";
            assert_eq!(ok(items, "flag: bool", "flag == true", true), "flag is true");
            assert_eq!(ok(items, "flag: bool", "flag == true", false), "flag is not true");
            assert_eq!(ok(items, "flag: bool", "flag != STRICT", true), "flag is not true");
            assert_eq!(ok(items, "", "enabled() == false", true), "enabled() returned false");
            assert_eq!(ok(items, "", "enabled() == false", false), "enabled() returned true");
            assert_eq!(ok(items, "", "enabled() != STRICT", true), "enabled() returned false");
        }

        #[test]
        fn ordering() {
            let cases = [
                (">", true, "greater than"),
                (">", false, "less than or equal to"),
                (">=", true, "greater than or equal to"),
                (">=", false, "less than"),
                ("<", true, "less than"),
                ("<", false, "greater than or equal to"),
                ("<=", true, "less than or equal to"),
                ("<=", false, "greater than"),
            ];
            for (op, polarity, relation) in cases {
                assert_eq!(
                    ok("", "n: u8", &format!("n {op} 3"), polarity),
                    format!("n is {relation} 3"),
                    "{op} with {polarity}"
                );
            }
        }

        #[test]
        fn negated_comparisons_keep_operand_order() {
            for op in [">", ">=", "<", "<=", "==", "!="] {
                for polarity in [true, false] {
                    let plain = ok("", "n: u8", &format!("n {op} 3"), polarity);
                    let negated = ok("", "n: u8", &format!("!(n {op} 3)"), !polarity);
                    assert_eq!(negated, plain, "!(n {op} 3) with {}", !polarity);
                }
            }
        }

        #[test]
        fn other_operators_are_unsupported() {
            let err = explain("", "a: u8", "a & 1", true).expect_err("bit and");
            assert!(matches!(err, RenderError::UnsupportedExpression { shape: "binary expression", .. }));
        }
    }

    mod call_tests {
        use super::*;

        #[test]
        fn generic_calls() {
            assert_eq!(ok("", "", "ready()", true), "function ready() returned true");
            assert_eq!(ok("", "s: S", "s.ready(1)", false), "function s.ready(1) returned false");
            assert_eq!(ok("", "s: S", "(s.check)(1)", true), "function (s.check)(1) returned true");
            assert_eq!(ok("", "", "(|| true)()", false), "(|| true)() returned false");
        }

        #[test]
        fn unsupported_callee() {
            let err = explain("", "fs: Vec<F>", "fs[0]()", true).expect_err("indexed callee");
            assert!(matches!(
                err,
                RenderError::UnsupportedExpression { shape: "index expression", .. }
            ));
        }

        #[test]
        fn collection_methods() {
            assert_eq!(ok("", "v: Vec<u8>", "v.contains(&3)", true), "v contains 3");
            assert_eq!(ok("", "v: Vec<u8>", "v.contains(&3)", false), "v does not contain 3");
            assert_eq!(ok("", "m: Map", r#"m.contains_key("k")"#, true), r#"m contains key "k""#);
            assert_eq!(ok("", "s: &str", r#"s.starts_with("ab")"#, false), r#"s does not start with "ab""#);
            assert_eq!(ok("", "s: &str", r#"s.ends_with("yz")"#, true), r#"s ends with "yz""#);
            assert_eq!(ok("", "v: Vec<u8>", "v.is_empty()", true), "v is empty");
        }

        #[test]
        fn option_and_result_methods() {
            assert_eq!(ok("", "err: Option<E>", "err.is_none()", true), "err is None");
            assert_eq!(ok("", "err: Option<E>", "err.is_none()", false), "err is Some");
            assert_eq!(ok("", "v: Option<u8>", "v.is_some()", true), "v is Some");
            assert_eq!(ok("", "r: Result<u8, E>", "r.is_ok()", false), "r is Err");
            assert_eq!(ok("", "r: Result<u8, E>", "r.is_err()", true), "r is Err");
            assert_eq!(ok("", "", r#"parse("1").is_ok()"#, true), r#"parse("1") returned no error"#);
            assert_eq!(ok("", "", r#"parse("x").is_err()"#, true), r#"parse("x") returned an error"#);
            assert_eq!(ok("", "", "find(1).is_none()", false), "find(1) returned Some");
        }

        #[test]
        fn equality_functions() {
            assert_eq!(ok("", "a: u8, b: u8", "a.eq(&b)", true), "a is equal to b");
            assert_eq!(ok("", "a: u8, b: u8", "a.ne(&b)", true), "a is not equal to b");
            assert_eq!(ok("", "a: u8, b: u8", "PartialEq::eq(&a, &b)", false), "a is not equal to b");
            assert_eq!(
                ok("use std::cmp::PartialEq;", "a: u8, b: u8", "std::cmp::PartialEq::ne(&a, &b)", false),
                "a is equal to b"
            );
        }

        #[test]
        fn error_helpers() {
            let items = "use assertive::errors;";
            assert_eq!(
                ok(items, "errw: W, err: E", "errors::is(&errw, &err)", true),
                "errw's error tree contains err"
            );
            assert_eq!(
                ok(items, "errw: W, err: E", "errors::is(&errw, &err)", false),
                "err is not in the error tree of errw"
            );
            assert_eq!(
                ok(items, "err: E", "errors::is_type::<io::Error>(&err)", true),
                "err can be defined as io::Error"
            );
            assert_eq!(
                ok("", "err: E", "err.is::<ParseError>()", false),
                "err cannot be defined as ParseError"
            );
        }

        #[test]
        fn unknown_error_paths_render_generically() {
            assert_eq!(
                ok("", "errw: W, err: E", "other::is(&errw, &err)", true),
                "function other::is(&errw, &err) returned true"
            );
        }
    }

    mod leaf_tests {
        use super::*;

        #[test]
        fn identifiers() {
            let items = "const ENABLED: bool = true;\nstatic READY: bool = false;";
            assert_eq!(ok(items, "ok: bool", "ok", false), "var ok is false");
            assert_eq!(ok(items, "", "ENABLED", true), "const ENABLED is true");
            assert_eq!(ok(items, "", "READY", false), "var READY is false");
            assert_eq!(ok(items, "", "UNKNOWN_FLAG", true), "const UNKNOWN_FLAG is true");
            assert_eq!(ok(items, "", "elsewhere", true), "var elsewhere is true");
            assert_eq!(ok(items, "", "config::ENABLED", true), "const config::ENABLED is true");
        }

        #[test]
        fn literals_and_fields() {
            assert_eq!(ok("", "", "true", true), "literal true");
            assert_eq!(ok("", "", "false", false), "literal false");
            assert_eq!(ok("", "", "!false", true), "literal false");
            assert_eq!(ok("", "", "!true", false), "literal true");
            assert_eq!(ok("", "s: S", "s.enabled", false), "s.enabled is false");
            assert_eq!(ok("", "s: S", "s.0", true), "s.0 is true");
        }

        #[test]
        fn matches_macro() {
            assert_eq!(
                ok("", "v: Option<u8>", "matches!(v, Some(1..=3))", true),
                "v matches Some(1..=3)"
            );
            assert_eq!(
                ok("", "v: Option<u8>", "!matches!(v, Some(_) if v.is_some())", true),
                "v does not match Some(_) if v.is_some()"
            );
        }

        #[test]
        fn unsupported_shapes() {
            for expr in ["[true][0]", "x as bool", "{ true }", "if a { b } else { c }", "1"] {
                let err = explain("", "x: u8, a: bool, b: bool, c: bool", expr, true)
                    .expect_err("unsupported");
                assert!(
                    matches!(err, RenderError::UnsupportedExpression { .. }),
                    "{expr}: {err}"
                );
            }
        }
    }
}
