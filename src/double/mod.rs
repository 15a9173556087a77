//! Test doubles for [`crate::TestingT`].
//!
//! - [`Fake`]: does nothing, with configurable context, deadline and
//!   cleanup registration
//! - [`Spy`]: wraps another `TestingT`, records every call, and checks the
//!   recording with `expect_*` methods
//!
//! Together they make assertion helpers testable:
//!
//! ```
//! use assertive::double::{Fake, Spy};
//! use assertive::{assert, Harness};
//!
//! let spy = Spy::new(Fake::new());
//! let ready = false;
//! assert(&spy, ready);
//!
//! let t = Harness::new();
//! spy.expect_test_to_fail(&t);
//! ```

mod expect;
mod fake;
mod record;
mod spy;

pub use fake::Fake;
pub use record::{Method, RecordValue, SpyRecord};
pub use spy::Spy;
