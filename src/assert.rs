//! Assertions explained from their own source.
//!
//! Every function here is `#[track_caller]`: the call written in the test
//! is located, its condition is rendered in English, and the sentence is
//! logged on failure (or on success when enabled in [`crate::config`]).
//!
//! ```text
//! assert(&t, user.name == "Bob" && user.age == 42);
//! // Error: user.name is not equal to "Bob", or user.age is not equal to 42
//! ```

use std::fmt::Display;

use crate::check::Outcome;
use crate::config;
use crate::message;
use crate::testing::TestingT;

/// Check `result`, marking the test failed when it is false.
///
/// Returns `result`.
#[track_caller]
pub fn assert<T: TestingT + ?Sized>(t: &T, result: bool) -> bool {
    t.helper();
    log_result(t, result, "");
    if !result {
        t.fail();
    }
    result
}

/// [`assert`] with a message appended to the explanation.
#[track_caller]
pub fn assert_with<T: TestingT + ?Sized>(t: &T, result: bool, message: impl Display) -> bool {
    t.helper();
    log_result(t, result, message);
    if !result {
        t.fail();
    }
    result
}

/// Check `result`, stopping the test when it is false.
#[track_caller]
pub fn require<T: TestingT + ?Sized>(t: &T, result: bool) {
    t.helper();
    log_result(t, result, "");
    if !result {
        t.fail_now();
    }
}

#[track_caller]
pub fn require_with<T: TestingT + ?Sized>(t: &T, result: bool, message: impl Display) {
    t.helper();
    log_result(t, result, message);
    if !result {
        t.fail_now();
    }
}

/// Assert the outcome of a check such as [`crate::check::compare`].
///
/// The check call is explained like any condition and the check's own
/// message is appended.
#[track_caller]
pub fn assert_check<T: TestingT + ?Sized>(outcome: Outcome<'_, T>) -> bool {
    assert_with(outcome.t, outcome.result, outcome.message)
}

#[track_caller]
pub fn require_check<T: TestingT + ?Sized>(outcome: Outcome<'_, T>) {
    require_with(outcome.t, outcome.result, outcome.message)
}

#[track_caller]
fn log_result<T: TestingT + ?Sized>(t: &T, result: bool, extra: impl Display) {
    if result && !config::success_messages_enabled() {
        return;
    }

    let mut msg = match message::from_bool(0, result) {
        Ok(msg) => msg,
        Err(err) => {
            t.log(&format!(
                "assertive internal failure: unable to get assertion message: {err}"
            ));
            err.fallback().to_string()
        }
    };

    let extra = extra.to_string();
    if !extra.is_empty() {
        msg = format!("{msg} [{extra}]");
    }

    if msg.is_empty() {
        return;
    }
    if result {
        t.log(&format!("Success: {msg}"));
    } else {
        t.log(&format!("Error: {msg}"));
    }
}

/// Assertions as methods on the test itself.
///
/// ```no_run
/// use assertive::{Assertions, Harness};
///
/// let t = Harness::new();
/// let retries = 3;
/// t.assert(retries < 5);
/// t.require_with(retries > 0, "at least one attempt");
/// ```
pub trait Assertions: TestingT {
    #[track_caller]
    fn assert(&self, result: bool) -> bool {
        assert(self, result)
    }

    #[track_caller]
    fn assert_with(&self, result: bool, message: impl Display) -> bool {
        assert_with(self, result, message)
    }

    #[track_caller]
    fn require(&self, result: bool) {
        require(self, result)
    }

    #[track_caller]
    fn require_with(&self, result: bool, message: impl Display) {
        require_with(self, result, message)
    }
}

impl<T: TestingT + ?Sized> Assertions for T {}
