//! Explaining a boolean from the source expression that produced it.
//!
//! [`from_bool`] finds the call written at the caller's location, picks the
//! argument holding the condition, and renders it with the observed result:
//!
//! | Call shape | Condition |
//! |---|---|
//! | `check(t, cond, ..)` | second argument |
//! | `check(outcome)` | sole argument |
//! | `t.check(cond, ..)` | first argument |
//!
//! When rendering fails, the error carries the whole call's source text as
//! a fallback message.

mod known;
mod render;

use assertive_code::{
    caller_call_expr, CallerLocator, CodeError, ExprKind, Node, PackageCache, TrackedCaller,
};
use thiserror::Error;

pub use render::{render, RenderError};

/// Why no explanation could be produced.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("no caller information available")]
    NoCallerInfo,

    #[error("unable to get package syntax: {0}")]
    Package(#[source] CodeError),

    #[error("unable to get call expr from caller: {0}")]
    CallSite(#[source] CodeError),

    #[error("unexpected call expr arguments number {count}")]
    ArgumentCount { count: usize },

    #[error("unable to get arg repr: {source}")]
    Render {
        fallback: String,
        source: RenderError,
    },
}

impl MessageError {
    /// Best-effort message: the call's source text when it was found.
    pub fn fallback(&self) -> &str {
        match self {
            MessageError::Render { fallback, .. } => fallback,
            _ => "",
        }
    }
}

/// Explain `result` using the source of the call `depth` frames above.
///
/// Depth 0 is the call to `from_bool` itself, or to the outermost
/// `#[track_caller]` function that reached it.
#[track_caller]
pub fn from_bool(depth: usize, result: bool) -> Result<String, MessageError> {
    from_bool_with(&TrackedCaller::here(), PackageCache::global(), depth, result)
}

/// [`from_bool`] with an explicit locator and cache.
pub fn from_bool_with<L: CallerLocator + ?Sized>(
    locator: &L,
    cache: &PackageCache,
    depth: usize,
    result: bool,
) -> Result<String, MessageError> {
    let location = locator.locate(depth).ok_or(MessageError::NoCallerInfo)?;
    let forest = cache.get(location.dir()).map_err(MessageError::Package)?;
    let found = caller_call_expr(&forest, &location.file, location.line)
        .map_err(MessageError::CallSite)?;

    let condition = condition(found.call)?;
    render(condition, result).map_err(|source| MessageError::Render {
        fallback: found.call.text.clone(),
        source,
    })
}

fn condition(call: &Node) -> Result<&Node, MessageError> {
    match (&call.kind, call.call_args()) {
        (ExprKind::MethodCall { .. }, [first, ..]) => Ok(first),
        (ExprKind::Call { .. }, [only]) => Ok(only),
        (ExprKind::Call { .. }, [_, second, ..]) => Ok(second),
        (_, args) => Err(MessageError::ArgumentCount { count: args.len() }),
    }
}
