//! Owned, thread-safe syntax for cached packages.
//!
//! `syn` trees hold `proc_macro2` spans that are bound to the thread that
//! parsed them, so they cannot live in a process-wide cache. Each file is
//! instead lowered (see [`crate::lower`]) into the closed [`ExprKind`] sum
//! type below, keeping for every expression its exact source text and, for
//! identifiers and callees, what they were resolved to at load time.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::items::ItemIndex;

// ============================================================================
// Expressions
// ============================================================================

/// One lowered expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: ExprKind,
    /// Exact source slice, formatting preserved.
    pub text: String,
    /// 1-indexed line the expression starts on.
    pub line: u32,
}

/// The expression shapes the message renderer understands.
///
/// Anything outside the catalog is kept as [`ExprKind::Other`] with a
/// human-readable shape name so it can still be reported.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Paren(Box<Node>),
    /// `&x` / `&mut x`.
    Reference(Box<Node>),
    /// `x.await`.
    Await(Box<Node>),
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    MethodCall {
        receiver: Box<Node>,
        method: String,
        /// Source text of each turbofish argument.
        turbofish: Vec<String>,
        args: Vec<Node>,
        /// Return shape of the package method with this name, if any.
        returns: Option<ReturnShape>,
    },
    Path(PathRef),
    Field {
        base: Box<Node>,
        member: String,
    },
    Lit(Literal),
    Closure,
    /// `matches!(scrutinee, pattern)`.
    Matches {
        scrutinee: Box<Node>,
        /// Pattern text, including any `if` guard.
        pattern: String,
    },
    Other(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Any other operator, by its token.
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Deref,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Bool(bool),
    Other,
}

/// A path expression and what it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRef {
    /// Segments as written.
    pub segments: Vec<String>,
    /// Source text of the last segment's generic arguments (`f::<T>`).
    pub generics: Vec<String>,
    /// Segments with `use` aliases and `crate` expanded.
    pub canonical: Vec<String>,
    pub binding: Binding,
}

impl PathRef {
    /// True when the canonical path ends with the given segments.
    pub fn ends_with(&self, tail: &[&str]) -> bool {
        self.canonical.len() >= tail.len()
            && self.canonical[self.canonical.len() - tail.len()..]
                .iter()
                .zip(tail)
                .all(|(a, b)| a == b)
    }

    /// True when the canonical path is exactly the given segments.
    pub fn is(&self, path: &[&str]) -> bool {
        self.canonical.len() == path.len() && self.ends_with(path)
    }
}

/// What an identifier refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Function parameter, `let`, pattern or closure binding.
    Local,
    Static,
    /// `value` is known only for `bool` constants with a literal initializer.
    Const { value: Option<bool> },
    Function { returns: ReturnShape },
    /// `None`, `Option::None` and friends.
    NoneValue,
    Unresolved,
}

/// Coarse classification of a function's return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// `Option<E>` where `E` is an error type.
    OptionalError,
    /// Any other `Option<T>`.
    Optional,
    Other,
}

impl Node {
    /// Strip parentheses and invisible groups.
    pub fn unparen(&self) -> &Node {
        match &self.kind {
            ExprKind::Paren(inner) => inner.unparen(),
            _ => self,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, ExprKind::Call { .. } | ExprKind::MethodCall { .. })
    }

    /// Arguments of a call node, empty for anything else.
    pub fn call_args(&self) -> &[Node] {
        match &self.kind {
            ExprKind::Call { args, .. } | ExprKind::MethodCall { args, .. } => args,
            _ => &[],
        }
    }

    /// Return shape of the function a call node invokes, when known.
    pub fn call_returns(&self) -> Option<ReturnShape> {
        match &self.kind {
            ExprKind::Call { callee, .. } => match &callee.unparen().kind {
                ExprKind::Path(PathRef {
                    binding: Binding::Function { returns },
                    ..
                }) => Some(*returns),
                _ => None,
            },
            ExprKind::MethodCall { returns, .. } => *returns,
            _ => None,
        }
    }

    /// The `bool` value of a literal or resolved constant.
    pub fn const_bool(&self) -> Option<bool> {
        match &self.unparen().kind {
            ExprKind::Lit(Literal::Bool(value)) => Some(*value),
            ExprKind::Path(PathRef {
                binding: Binding::Const { value },
                ..
            }) => *value,
            _ => None,
        }
    }

    pub fn is_none_value(&self) -> bool {
        matches!(
            &self.unparen().kind,
            ExprKind::Path(PathRef {
                binding: Binding::NoneValue,
                ..
            })
        )
    }

    /// Source text with leading `&` / `&mut` removed.
    pub fn operand_text(&self) -> &str {
        match &self.kind {
            ExprKind::Reference(inner) => inner.operand_text(),
            _ => &self.text,
        }
    }

    /// Name used in error messages for this node's shape.
    pub fn shape(&self) -> &'static str {
        match &self.kind {
            ExprKind::Binary { .. } => "binary expression",
            ExprKind::Unary { .. } => "unary expression",
            ExprKind::Paren(_) => "parenthesized expression",
            ExprKind::Reference(_) => "reference",
            ExprKind::Await(_) => "await expression",
            ExprKind::Call { .. } => "call expression",
            ExprKind::MethodCall { .. } => "method call",
            ExprKind::Path(_) => "path",
            ExprKind::Field { .. } => "field access",
            ExprKind::Lit(_) => "literal",
            ExprKind::Closure => "closure",
            ExprKind::Matches { .. } => "matches! invocation",
            ExprKind::Other(shape) => shape,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

// ============================================================================
// Files and packages
// ============================================================================

/// One parsed source file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// First call expression starting on each line, in traversal order.
    pub calls: BTreeMap<u32, Node>,
}

impl SourceFile {
    pub fn call_at(&self, line: u32) -> Option<&Node> {
        self.calls.get(&line)
    }
}

/// One compilation target of a Cargo package (`src/`, a test, a bench).
#[derive(Debug, Clone)]
pub struct Package {
    /// Key under which the package was first registered.
    pub import_path: String,
    /// Name `crate::` refers to inside the package.
    pub name: String,
    pub files: Vec<SourceFile>,
    pub items: ItemIndex,
}

impl Package {
    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Every target of one Cargo package, keyed by import path.
///
/// A package may appear under more than one key; both keys share the same
/// `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SyntaxForest {
    /// Directory holding the package's `Cargo.toml`.
    pub root: PathBuf,
    pub packages: BTreeMap<String, Arc<Package>>,
}

impl SyntaxForest {
    pub fn package(&self, import_path: &str) -> Option<&Arc<Package>> {
        self.packages.get(import_path)
    }

    /// Find the package and file for an absolute path.
    pub fn file(&self, path: &Path) -> Option<(&Package, &SourceFile)> {
        self.packages
            .values()
            .find_map(|pkg| pkg.file(path).map(|file| (pkg.as_ref(), file)))
    }
}
