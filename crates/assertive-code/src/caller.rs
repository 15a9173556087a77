//! Mapping a caller location back to the call expression written there.

use std::env;
use std::panic::Location;
use std::path::{Path, PathBuf};

use crate::error::CodeError;
use crate::syntax::{Node, Package, SourceFile, SyntaxForest};

/// A file and 1-indexed line in the caller's source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        SourceLocation {
            file: file.into(),
            line,
        }
    }

    /// Directory of the file, the key used for package lookup.
    pub fn dir(&self) -> &Path {
        self.file.parent().unwrap_or(Path::new("."))
    }
}

/// Reports the source location of a caller, `depth` frames up.
pub trait CallerLocator {
    fn locate(&self, depth: usize) -> Option<SourceLocation>;
}

/// A fixed location answers depth 0 only.
impl CallerLocator for SourceLocation {
    fn locate(&self, depth: usize) -> Option<SourceLocation> {
        (depth == 0).then(|| self.clone())
    }
}

/// Caller location captured through `#[track_caller]`.
///
/// Functions annotated with `#[track_caller]` are transparent, so the
/// captured location is already the frame that matters; any other depth is
/// unavailable.
#[derive(Debug, Clone, Copy)]
pub struct TrackedCaller {
    location: &'static Location<'static>,
}

impl TrackedCaller {
    #[track_caller]
    pub fn here() -> Self {
        TrackedCaller {
            location: Location::caller(),
        }
    }
}

impl CallerLocator for TrackedCaller {
    fn locate(&self, depth: usize) -> Option<SourceLocation> {
        if depth != 0 {
            return None;
        }
        Some(SourceLocation {
            file: resolve_source_path(Path::new(self.location.file())),
            line: self.location.line(),
        })
    }
}

/// Make a compiler-reported path absolute.
///
/// Paths are relative to the workspace root while tests run from the
/// package root, so the current directory and each of its ancestors are
/// tried in turn.
pub fn resolve_source_path(file: &Path) -> PathBuf {
    if file.is_absolute() {
        return file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
    }
    let Ok(cwd) = env::current_dir() else {
        return file.to_path_buf();
    };
    cwd.ancestors()
        .map(|base| base.join(file))
        .find(|candidate| candidate.is_file())
        .and_then(|found| found.canonicalize().ok())
        .unwrap_or_else(|| cwd.join(file))
}

// ============================================================================
// Call-site resolution
// ============================================================================

/// The call expression at a caller location, with what contains it.
#[derive(Debug, Clone, Copy)]
pub struct CallerCallExpr<'a> {
    pub call: &'a Node,
    pub file: &'a SourceFile,
    pub package: &'a Package,
}

/// Find the first call expression starting on `line` of `file`.
pub fn caller_call_expr<'a>(
    forest: &'a SyntaxForest,
    file: &Path,
    line: u32,
) -> Result<CallerCallExpr<'a>, CodeError> {
    let canonical = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
    let not_found = |what| CodeError::NotFound {
        what,
        file: file.to_path_buf(),
        line,
    };
    let (package, source) = forest
        .file(&canonical)
        .ok_or_else(|| not_found("ast file and package"))?;
    let call = source
        .call_at(line)
        .ok_or_else(|| not_found("call expression"))?;
    Ok(CallerCallExpr {
        call,
        file: source,
        package,
    })
}
