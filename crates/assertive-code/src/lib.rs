//! Source introspection for assertive.
//!
//! This crate loads the syntax of a whole Cargo package, caches it for the
//! lifetime of the process, and maps a caller location back to the call
//! expression written there:
//! - Cargo-layout package loading (`src/`, `tests/`, `benches/`)
//! - Lowering of `syn` trees into owned, thread-safe expression nodes
//! - Static binding information (locals, consts, statics, functions, imports)
//! - A directory-keyed package cache
//! - Caller location capture and call-site lookup

pub mod cache;
pub mod caller;
pub mod error;
pub mod items;
pub mod loader;
pub mod lower;
pub mod syntax;
pub mod text;

pub use cache::PackageCache;
pub use caller::{
    caller_call_expr, resolve_source_path, CallerCallExpr, CallerLocator, SourceLocation,
    TrackedCaller,
};
pub use error::{CodeError, Diagnostic};
pub use loader::{parse_package, CargoLoader, SourceLoader};
pub use syntax::{
    BinaryOp, Binding, ExprKind, Literal, Node, Package, PathRef, ReturnShape, SourceFile,
    SyntaxForest, UnaryOp,
};
