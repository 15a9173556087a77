//! Reusable checks for [`crate::assert_check`] and [`crate::require_check`].
//!
//! A check computes a result and a message describing it, and hands both
//! back together with the test they belong to:
//!
//! ```no_run
//! use assertive::{assert_check, check, Harness};
//!
//! let t = Harness::new();
//! let got = vec![1, 2, 3];
//! assert_check(check::compare(&t, &got, &vec![1, 2, 3]));
//! ```

use std::any::{type_name, Any};
use std::fmt::{Debug, Display};
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use similar::TextDiff;

use crate::context::Context;

/// The result of a check, tied to the test it ran for.
pub struct Outcome<'t, T: ?Sized> {
    pub t: &'t T,
    pub result: bool,
    pub message: String,
}

impl<'t, T: ?Sized> Outcome<'t, T> {
    pub fn new(t: &'t T, result: bool, message: impl Into<String>) -> Self {
        Outcome {
            t,
            result,
            message: message.into(),
        }
    }
}

impl<T: ?Sized> Debug for Outcome<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outcome")
            .field("result", &self.result)
            .field("message", &self.message)
            .finish()
    }
}

/// Compare two values, describing the differences as a diff of their
/// pretty-printed `Debug` forms.
pub fn compare<'t, T, V>(t: &'t T, got: &V, want: &V) -> Outcome<'t, T>
where
    T: ?Sized,
    V: PartialEq + Debug + ?Sized,
{
    if got == want {
        return Outcome::new(t, true, "no differences");
    }

    let (got, want) = (format!("{got:#?}\n"), format!("{want:#?}\n"));
    let diff = TextDiff::from_lines(&got, &want)
        .unified_diff()
        .header("got", "want")
        .to_string();
    Outcome::new(t, false, format!("comparison differs: \n{diff}"))
}

/// Retry `check` until it succeeds or `ctx` is done, pausing `between`
/// attempts.
///
/// An attempt in progress always runs to completion. On expiry the message
/// carries the last two errors.
pub async fn eventually<'t, T, F, Fut, E>(
    ctx: &Context,
    t: &'t T,
    mut check: F,
    between: Duration,
) -> Outcome<'t, T>
where
    T: ?Sized,
    F: FnMut(Context) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let started = Instant::now();
    let mut errors: [Option<String>; 2] = [None, None];
    let mut retries: usize = 0;

    let expired = |retries: usize, errors: &[Option<String>; 2]| {
        let last: Vec<&str> = errors.iter().flatten().map(String::as_str).collect();
        format!(
            "check did not pass in {:?} with {retries} retries and now context is expired, last two errors: {}",
            started.elapsed(),
            last.join("\n")
        )
    };

    loop {
        if ctx.is_done() {
            return Outcome::new(t, false, expired(retries, &errors));
        }

        match check(ctx.clone()).await {
            Ok(()) => {
                return Outcome::new(
                    t,
                    true,
                    format!(
                        "check passed in {:?} with {retries} retries",
                        started.elapsed()
                    ),
                );
            }
            Err(err) => errors[retries % 2] = Some(err.to_string()),
        }
        retries += 1;

        tokio::select! {
            _ = ctx.done() => return Outcome::new(t, false, expired(retries, &errors)),
            _ = tokio::time::sleep(between) => {}
        }
    }
}

/// Invert a check.
pub fn not<T: ?Sized>(outcome: Outcome<'_, T>) -> Outcome<'_, T> {
    let message = if outcome.message.is_empty() {
        String::new()
    } else {
        format!("{}; and the result was inverted", outcome.message)
    };
    Outcome::new(outcome.t, !outcome.result, message)
}

/// Pass when `f` panics.
pub fn panics<'t, T, F>(t: &'t T, f: F) -> Outcome<'t, T>
where
    T: ?Sized,
    F: FnOnce(),
{
    panics_with(t, f, |_| Ok::<(), String>(()))
}

/// Pass when `f` panics and `assert_reason` accepts the panic payload.
pub fn panics_with<'t, T, F, A, E>(t: &'t T, f: F, assert_reason: A) -> Outcome<'t, T>
where
    T: ?Sized,
    F: FnOnce(),
    A: FnOnce(&(dyn Any + Send)) -> Result<(), E>,
    E: Display,
{
    let Err(reason) = catch_unwind(AssertUnwindSafe(f)) else {
        return Outcome::new(t, false, "expected function to panic");
    };

    match assert_reason(reason.as_ref()) {
        Ok(()) => Outcome::new(t, true, "function panicked like expected"),
        Err(err) => Outcome::new(
            t,
            false,
            format!("function panicked like expected, but reason assertion failed: {err}"),
        ),
    }
}

/// The message of a panic raised with a string, if any.
pub fn panic_message(reason: &(dyn Any + Send)) -> Option<&str> {
    reason
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| reason.downcast_ref::<String>().map(String::as_str))
}

/// Pass when `v` equals its type's default value.
pub fn zero_value<'t, T, V>(t: &'t T, v: &V) -> Outcome<'t, T>
where
    T: ?Sized,
    V: Default + PartialEq + Debug,
{
    let zero = V::default();
    let ty = type_name::<V>();
    if *v != zero {
        return Outcome::new(
            t,
            false,
            format!("expected {zero:?} ({ty}'s zero value), got {v:?}"),
        );
    }
    Outcome::new(t, true, format!("{v:?} is the zero value of type {ty}"))
}
