//! The testing capability used by every assertion, and its real
//! implementation for `#[test]` functions.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::context::Context;

/// What assertions need from a running test.
pub trait TestingT {
    /// Mark the caller as a helper. Locations are captured with
    /// `#[track_caller]`, so implementations may ignore this.
    fn helper(&self);
    /// Register a function to run when the test finishes.
    fn cleanup(&self, f: Box<dyn FnOnce() + Send>);
    /// Mark the test as failed and keep going.
    fn fail(&self);
    /// Mark the test as failed and stop it.
    fn fail_now(&self);
    fn log(&self, message: &str);
    fn context(&self) -> Context;
    fn deadline(&self) -> Option<Instant>;
}

macro_rules! forward_testing_t {
    ($($ptr:ty),*) => {$(
        impl<T: TestingT + ?Sized> TestingT for $ptr {
            fn helper(&self) {
                (**self).helper()
            }
            fn cleanup(&self, f: Box<dyn FnOnce() + Send>) {
                (**self).cleanup(f)
            }
            fn fail(&self) {
                (**self).fail()
            }
            fn fail_now(&self) {
                (**self).fail_now()
            }
            fn log(&self, message: &str) {
                (**self).log(message)
            }
            fn context(&self) -> Context {
                (**self).context()
            }
            fn deadline(&self) -> Option<Instant> {
                (**self).deadline()
            }
        }
    )*};
}

forward_testing_t!(&T, Box<T>, Arc<T>);

// ============================================================================
// Harness
// ============================================================================

type Cleanup = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct HarnessState {
    failed: bool,
    cleanups: Vec<Cleanup>,
}

/// [`TestingT`] for plain `#[test]` functions.
///
/// Logs go to stdout, where the test runner captures them. When the
/// harness is dropped it runs cleanups in reverse registration order,
/// cancels its context, and panics if a failure was recorded.
///
/// ```no_run
/// use assertive::{assert, Harness};
///
/// let t = Harness::new();
/// let items = vec![1, 2, 3];
/// assert(&t, items.len() == 3);
/// ```
pub struct Harness {
    name: String,
    context: Context,
    deadline: Option<Instant>,
    state: Mutex<HarnessState>,
}

impl Harness {
    /// A harness named after the current test thread.
    pub fn new() -> Self {
        let name = thread::current()
            .name()
            .unwrap_or("<unnamed>")
            .to_string();
        Harness {
            name,
            context: Context::background(),
            deadline: None,
            state: Mutex::new(HarnessState::default()),
        }
    }

    /// A harness whose test is expected to finish within `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let mut harness = Harness::new();
        harness.context = harness.context.with_deadline(deadline);
        harness.deadline = Some(deadline);
        harness
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn failed(&self) -> bool {
        self.state().failed
    }

    fn state(&self) -> std::sync::MutexGuard<'_, HarnessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("name", &self.name)
            .field("deadline", &self.deadline)
            .field("failed", &self.failed())
            .finish()
    }
}

impl TestingT for Harness {
    fn helper(&self) {}

    fn cleanup(&self, f: Box<dyn FnOnce() + Send>) {
        self.state().cleanups.push(f);
    }

    fn fail(&self) {
        self.state().failed = true;
    }

    fn fail_now(&self) {
        self.fail();
        panic!("test {} failed", self.name);
    }

    fn log(&self, message: &str) {
        println!("{message}");
    }

    fn context(&self) -> Context {
        self.context.clone()
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let cleanups = std::mem::take(&mut self.state().cleanups);
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
        self.context.cancel();

        if self.failed() && !thread::panicking() {
            panic!("test {} failed", self.name);
        }
    }
}
