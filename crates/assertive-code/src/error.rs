//! Error types for package loading and call-site lookup.
//!
//! Every failure carries enough text to be printed as-is in a test log:
//! the assertion layer never retries, it only reports.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// Diagnostics
// ============================================================================

/// A syntax error found while parsing one file of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: PathBuf,
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column, counted in chars.
    pub column: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.file.display(),
            self.line,
            self.column,
            self.message
        )
    }
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// CodeError
// ============================================================================

/// Errors from loading package syntax or resolving a caller location.
#[derive(Debug, Error)]
pub enum CodeError {
    /// The package could not be loaded at all.
    #[error("failed to load packages from {}: {message}", dir.display())]
    Load { dir: PathBuf, message: String },

    /// The package was read but one or more files did not parse.
    #[error("loaded packages contained errors: {}", join_diagnostics(diagnostics))]
    PackageDiagnostics {
        dir: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },

    /// No file, or no call expression, matches the requested location.
    #[error("unable to find {what} for {}:{line}", file.display())]
    NotFound {
        what: &'static str,
        file: PathBuf,
        line: u32,
    },
}

impl CodeError {
    pub(crate) fn load(dir: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        CodeError::Load {
            dir: dir.into(),
            message: message.to_string(),
        }
    }

    /// Diagnostics attached to this error, empty for non-parse failures.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CodeError::PackageDiagnostics { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}
