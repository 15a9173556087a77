//! Assertive: test assertions that explain themselves.
//!
//! Assertions take a plain boolean. When one fails, the expression written
//! at the call site is read back from the package sources and turned into
//! an English sentence:
//!
//! ```no_run
//! use assertive::{assert, require, Harness};
//!
//! # fn get_user(_: &str) -> Result<User, String> { unimplemented!() }
//! # struct User { name: String, age: u8 }
//! let t = Harness::new();
//! let user = get_user("bob@example.com");
//! require(&t, user.is_ok());
//! let user = user.unwrap();
//! assert(&t, user.name == "Bob" && user.age == 42);
//! // Error: user.name is not equal to "Bob", or user.age is not equal to 42
//! ```

use std::path::Path;

// Source introspection - re-exported from assertive-code
pub use assertive_code as code;

// Assertions
mod assert;
pub use assert::{assert, assert_check, assert_with, require, require_check, require_with, Assertions};

// Test capability and doubles
pub mod context;
pub mod double;
mod testing;
pub use context::{context, Context};
pub use testing::{Harness, TestingT};

// Checks, error helpers, logging
pub mod check;
pub mod config;
pub mod errors;
pub mod logging;

pub mod message;

/// Load and cache the package containing `dir` ahead of the first
/// assertion.
///
/// # Panics
///
/// Panics when the package cannot be loaded.
pub fn init_package_cache(dir: impl AsRef<Path>) {
    code::PackageCache::global().init(dir.as_ref());
}
