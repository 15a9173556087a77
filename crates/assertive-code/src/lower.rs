//! Lowering of `syn` syntax into owned [`Node`] trees.
//!
//! The visitor walks a file in source order, tracking local bindings in a
//! scope stack, and records the first call expression starting on each
//! line. Calls are lowered with the scope that is live at the call site, so
//! every identifier in the result already knows whether it names a local, a
//! constant, a static or a function.

use std::collections::{BTreeMap, HashSet};

use proc_macro2::Span;
use syn::parse::ParseStream;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};

use crate::items::{ImportMap, ItemIndex};
use crate::syntax::{BinaryOp, Binding, ExprKind, Literal, Node, PathRef, UnaryOp};
use crate::text::LineIndex;

/// Everything lowering needs to know about the surrounding package.
pub struct LowerContext<'a> {
    pub source: &'a LineIndex<'a>,
    pub file_items: &'a ItemIndex,
    pub package_items: &'a ItemIndex,
    pub imports: &'a ImportMap,
}

/// Collect the first call expression on every line of a file.
pub fn collect_calls(file: &syn::File, cx: &LowerContext<'_>) -> BTreeMap<u32, Node> {
    let mut visitor = CallVisitor {
        cx,
        scopes: vec![HashSet::new()],
        calls: BTreeMap::new(),
    };
    visitor.visit_file(file);
    visitor.calls
}

// ============================================================================
// Call visitor
// ============================================================================

struct CallVisitor<'a, 'cx> {
    cx: &'a LowerContext<'cx>,
    scopes: Vec<HashSet<String>>,
    calls: BTreeMap<u32, Node>,
}

impl CallVisitor<'_, '_> {
    fn push(&mut self) {
        self.scopes.push(HashSet::new());
    }

    fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn bind_pat(&mut self, pat: &syn::Pat) {
        let mut names = Vec::new();
        pattern_bindings(pat, &mut names);
        if let Some(scope) = self.scopes.last_mut() {
            scope.extend(names);
        }
    }

    fn bind_fn_inputs<'i>(&mut self, inputs: impl Iterator<Item = &'i syn::FnArg>) {
        for input in inputs {
            match input {
                syn::FnArg::Receiver(_) => {
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.insert("self".to_string());
                    }
                }
                syn::FnArg::Typed(typed) => self.bind_pat(&typed.pat),
            }
        }
    }

    fn record(&mut self, line: u32, expr: &syn::Expr) {
        if self.calls.contains_key(&line) {
            return;
        }
        let lowerer = Lowerer {
            cx: self.cx,
            scopes: &self.scopes,
        };
        self.calls.insert(line, lowerer.lower(expr));
    }
}

impl<'ast> Visit<'ast> for CallVisitor<'_, '_> {
    fn visit_expr(&mut self, expr: &'ast syn::Expr) {
        match expr {
            syn::Expr::Call(_) => {
                self.record(start_line(expr.span()), expr);
            }
            syn::Expr::MethodCall(call) => {
                self.record(start_line(expr.span()), expr);
                // Caller locations of method calls may point at the method
                // name of a chain split over several lines.
                self.record(start_line(call.method.span()), expr);
            }
            _ => {}
        }
        visit::visit_expr(self, expr);
    }

    fn visit_item_fn(&mut self, item: &'ast syn::ItemFn) {
        self.push();
        self.bind_fn_inputs(item.sig.inputs.iter());
        self.visit_block(&item.block);
        self.pop();
    }

    fn visit_impl_item_fn(&mut self, item: &'ast syn::ImplItemFn) {
        self.push();
        self.bind_fn_inputs(item.sig.inputs.iter());
        self.visit_block(&item.block);
        self.pop();
    }

    fn visit_trait_item_fn(&mut self, item: &'ast syn::TraitItemFn) {
        if let Some(block) = &item.default {
            self.push();
            self.bind_fn_inputs(item.sig.inputs.iter());
            self.visit_block(block);
            self.pop();
        }
    }

    fn visit_block(&mut self, block: &'ast syn::Block) {
        self.push();
        visit::visit_block(self, block);
        self.pop();
    }

    fn visit_local(&mut self, local: &'ast syn::Local) {
        // The initializer still sees the previous binding of a shadowed name.
        if let Some(init) = &local.init {
            self.visit_expr(&init.expr);
            if let Some((_, diverge)) = &init.diverge {
                self.visit_expr(diverge);
            }
        }
        self.bind_pat(&local.pat);
    }

    fn visit_expr_closure(&mut self, closure: &'ast syn::ExprClosure) {
        self.push();
        for input in &closure.inputs {
            self.bind_pat(input);
        }
        self.visit_expr(&closure.body);
        self.pop();
    }

    fn visit_arm(&mut self, arm: &'ast syn::Arm) {
        self.push();
        self.bind_pat(&arm.pat);
        if let Some((_, guard)) = &arm.guard {
            self.visit_expr(guard);
        }
        self.visit_expr(&arm.body);
        self.pop();
    }

    fn visit_expr_for_loop(&mut self, for_loop: &'ast syn::ExprForLoop) {
        self.visit_expr(&for_loop.expr);
        self.push();
        self.bind_pat(&for_loop.pat);
        self.visit_block(&for_loop.body);
        self.pop();
    }

    fn visit_expr_if(&mut self, expr_if: &'ast syn::ExprIf) {
        // `if let` bindings are visible in the then-branch only.
        self.push();
        self.visit_expr(&expr_if.cond);
        self.visit_block(&expr_if.then_branch);
        self.pop();
        if let Some((_, else_branch)) = &expr_if.else_branch {
            self.visit_expr(else_branch);
        }
    }

    fn visit_expr_while(&mut self, expr_while: &'ast syn::ExprWhile) {
        self.push();
        self.visit_expr(&expr_while.cond);
        self.visit_block(&expr_while.body);
        self.pop();
    }

    fn visit_expr_let(&mut self, expr_let: &'ast syn::ExprLet) {
        self.visit_expr(&expr_let.expr);
        self.bind_pat(&expr_let.pat);
    }
}

/// Names bound by a pattern.
///
/// Capitalized identifiers are unit variants or constants, not bindings.
fn pattern_bindings(pat: &syn::Pat, out: &mut Vec<String>) {
    match pat {
        syn::Pat::Ident(ident) => {
            let name = ident.ident.to_string();
            if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
                out.push(name);
            }
            if let Some((_, sub)) = &ident.subpat {
                pattern_bindings(sub, out);
            }
        }
        syn::Pat::Or(or) => {
            for case in &or.cases {
                pattern_bindings(case, out);
            }
        }
        syn::Pat::Paren(paren) => pattern_bindings(&paren.pat, out),
        syn::Pat::Reference(reference) => pattern_bindings(&reference.pat, out),
        syn::Pat::Slice(slice) => {
            for elem in &slice.elems {
                pattern_bindings(elem, out);
            }
        }
        syn::Pat::Struct(st) => {
            for field in &st.fields {
                pattern_bindings(&field.pat, out);
            }
        }
        syn::Pat::Tuple(tuple) => {
            for elem in &tuple.elems {
                pattern_bindings(elem, out);
            }
        }
        syn::Pat::TupleStruct(ts) => {
            for elem in &ts.elems {
                pattern_bindings(elem, out);
            }
        }
        syn::Pat::Type(ty) => pattern_bindings(&ty.pat, out),
        _ => {}
    }
}

fn start_line(span: Span) -> u32 {
    span.start().line as u32
}

// ============================================================================
// Expression lowering
// ============================================================================

struct Lowerer<'a, 'cx> {
    cx: &'a LowerContext<'cx>,
    scopes: &'a [HashSet<String>],
}

impl Lowerer<'_, '_> {
    fn text(&self, span: Span) -> String {
        self.cx.source.slice(span.start(), span.end()).to_string()
    }

    fn node(&self, kind: ExprKind, span: Span) -> Node {
        Node {
            kind,
            text: self.text(span),
            line: start_line(span),
        }
    }

    fn boxed(&self, expr: &syn::Expr) -> Box<Node> {
        Box::new(self.lower(expr))
    }

    fn lower(&self, expr: &syn::Expr) -> Node {
        let span = expr.span();
        let kind = match expr {
            syn::Expr::Binary(binary) => ExprKind::Binary {
                op: binary_op(&binary.op),
                lhs: self.boxed(&binary.left),
                rhs: self.boxed(&binary.right),
            },
            syn::Expr::Unary(unary) => ExprKind::Unary {
                op: match unary.op {
                    syn::UnOp::Not(_) => UnaryOp::Not,
                    syn::UnOp::Neg(_) => UnaryOp::Neg,
                    _ => UnaryOp::Deref,
                },
                operand: self.boxed(&unary.expr),
            },
            syn::Expr::Paren(paren) => ExprKind::Paren(self.boxed(&paren.expr)),
            syn::Expr::Group(group) => return self.lower(&group.expr),
            syn::Expr::Reference(reference) => ExprKind::Reference(self.boxed(&reference.expr)),
            syn::Expr::Await(await_expr) => ExprKind::Await(self.boxed(&await_expr.base)),
            syn::Expr::Call(call) => ExprKind::Call {
                callee: self.boxed(&call.func),
                args: call.args.iter().map(|arg| self.lower(arg)).collect(),
            },
            syn::Expr::MethodCall(call) => {
                let method = call.method.to_string();
                ExprKind::MethodCall {
                    receiver: self.boxed(&call.receiver),
                    turbofish: call
                        .turbofish
                        .as_ref()
                        .map(|t| t.args.iter().map(|arg| self.text(arg.span())).collect())
                        .unwrap_or_default(),
                    args: call.args.iter().map(|arg| self.lower(arg)).collect(),
                    returns: self
                        .cx
                        .file_items
                        .method(&method)
                        .or_else(|| self.cx.package_items.method(&method)),
                    method,
                }
            }
            syn::Expr::Path(path) if path.qself.is_none() => ExprKind::Path(self.path(&path.path)),
            syn::Expr::Field(field) => ExprKind::Field {
                base: self.boxed(&field.base),
                member: match &field.member {
                    syn::Member::Named(ident) => ident.to_string(),
                    syn::Member::Unnamed(index) => index.index.to_string(),
                },
            },
            syn::Expr::Lit(lit) => ExprKind::Lit(match &lit.lit {
                syn::Lit::Bool(value) => Literal::Bool(value.value),
                _ => Literal::Other,
            }),
            syn::Expr::Closure(_) => ExprKind::Closure,
            syn::Expr::Macro(mac) => self.lower_macro(&mac.mac),
            other => ExprKind::Other(other_shape(other)),
        };
        self.node(kind, span)
    }

    fn lower_macro(&self, mac: &syn::Macro) -> ExprKind {
        if !mac.path.segments.last().is_some_and(|seg| seg.ident == "matches") {
            return ExprKind::Other("macro invocation");
        }
        let parsed = mac.parse_body_with(|input: ParseStream| {
            let scrutinee: syn::Expr = input.parse()?;
            input.parse::<syn::Token![,]>()?;
            let pattern = syn::Pat::parse_multi_with_leading_vert(input)?;
            let mut end = pattern.span();
            if input.peek(syn::Token![if]) {
                input.parse::<syn::Token![if]>()?;
                let guard: syn::Expr = input.parse()?;
                end = guard.span();
            }
            let _ = input.parse::<Option<syn::Token![,]>>()?;
            Ok((scrutinee, pattern.span(), end))
        });
        match parsed {
            Ok((scrutinee, start, end)) => ExprKind::Matches {
                scrutinee: self.boxed(&scrutinee),
                pattern: self.cx.source.slice(start.start(), end.end()).to_string(),
            },
            Err(_) => ExprKind::Other("macro invocation"),
        }
    }

    fn path(&self, path: &syn::Path) -> PathRef {
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let generics = match path.segments.last().map(|s| &s.arguments) {
            Some(syn::PathArguments::AngleBracketed(args)) => {
                args.args.iter().map(|arg| self.text(arg.span())).collect()
            }
            _ => Vec::new(),
        };
        let canonical = if path.leading_colon.is_some() {
            segments.clone()
        } else {
            self.cx.imports.resolve(&segments)
        };
        let binding = self.resolve(&segments, &canonical);
        PathRef {
            segments,
            generics,
            canonical,
            binding,
        }
    }

    fn resolve(&self, segments: &[String], canonical: &[String]) -> Binding {
        if let [name] = segments {
            if self.scopes.iter().rev().any(|scope| scope.contains(name)) {
                return Binding::Local;
            }
        }
        let is_none = match canonical {
            [only] => only == "None",
            [.., ty, variant] => ty == "Option" && variant == "None",
            _ => false,
        };
        if is_none {
            return Binding::NoneValue;
        }
        let Some(name) = segments.last() else {
            return Binding::Unresolved;
        };
        self.lookup_item(name).unwrap_or(Binding::Unresolved)
    }

    fn lookup_item(&self, name: &str) -> Option<Binding> {
        [self.cx.file_items, self.cx.package_items]
            .into_iter()
            .find_map(|items| {
                if let Some(item) = items.constant(name) {
                    return Some(Binding::Const { value: item.value });
                }
                if items.is_static(name) {
                    return Some(Binding::Static);
                }
                items
                    .function(name)
                    .map(|returns| Binding::Function { returns })
            })
    }
}

fn binary_op(op: &syn::BinOp) -> BinaryOp {
    match op {
        syn::BinOp::And(_) => BinaryOp::And,
        syn::BinOp::Or(_) => BinaryOp::Or,
        syn::BinOp::Eq(_) => BinaryOp::Eq,
        syn::BinOp::Ne(_) => BinaryOp::Ne,
        syn::BinOp::Lt(_) => BinaryOp::Lt,
        syn::BinOp::Le(_) => BinaryOp::Le,
        syn::BinOp::Gt(_) => BinaryOp::Gt,
        syn::BinOp::Ge(_) => BinaryOp::Ge,
        other => BinaryOp::Other(quote::quote!(#other).to_string()),
    }
}

fn other_shape(expr: &syn::Expr) -> &'static str {
    match expr {
        syn::Expr::Array(_) => "array expression",
        syn::Expr::Assign(_) => "assignment",
        syn::Expr::Async(_) => "async block",
        syn::Expr::Block(_) => "block expression",
        syn::Expr::Break(_) => "break expression",
        syn::Expr::Cast(_) => "cast expression",
        syn::Expr::Const(_) => "const block",
        syn::Expr::Continue(_) => "continue expression",
        syn::Expr::ForLoop(_) => "for loop",
        syn::Expr::If(_) => "if expression",
        syn::Expr::Index(_) => "index expression",
        syn::Expr::Infer(_) => "inferred expression",
        syn::Expr::Let(_) => "let guard",
        syn::Expr::Loop(_) => "loop expression",
        syn::Expr::Match(_) => "match expression",
        syn::Expr::Path(_) => "qualified path",
        syn::Expr::Range(_) => "range expression",
        syn::Expr::Repeat(_) => "repeat expression",
        syn::Expr::Return(_) => "return expression",
        syn::Expr::Struct(_) => "struct literal",
        syn::Expr::Try(_) => "try expression",
        syn::Expr::TryBlock(_) => "try block",
        syn::Expr::Tuple(_) => "tuple expression",
        syn::Expr::Unsafe(_) => "unsafe block",
        syn::Expr::While(_) => "while loop",
        syn::Expr::Yield(_) => "yield expression",
        _ => "expression",
    }
}
