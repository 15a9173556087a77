use std::sync::Arc;
use std::time::Instant;

use crate::context::Context;
use crate::testing::TestingT;

type RegisterCleanup = Arc<dyn Fn(Box<dyn FnOnce() + Send>) + Send + Sync>;

/// A [`TestingT`] that does nothing.
///
/// Failing and logging are no-ops. The context, the deadline and what
/// happens to registered cleanups are configurable; by default cleanups are
/// dropped without running.
#[derive(Clone)]
pub struct Fake {
    context: Context,
    deadline: Option<Instant>,
    register_cleanup: RegisterCleanup,
}

impl Fake {
    pub fn new() -> Self {
        Fake {
            context: Context::background(),
            deadline: None,
            register_cleanup: Arc::new(|_| {}),
        }
    }

    /// Context returned by [`TestingT::context`].
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Deadline returned by [`TestingT::deadline`].
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Called with every function passed to [`TestingT::cleanup`].
    pub fn with_register_cleanup(
        mut self,
        register: impl Fn(Box<dyn FnOnce() + Send>) + Send + Sync + 'static,
    ) -> Self {
        self.register_cleanup = Arc::new(register);
        self
    }
}

impl Default for Fake {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Fake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fake")
            .field("context", &self.context)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl TestingT for Fake {
    fn helper(&self) {}

    fn cleanup(&self, f: Box<dyn FnOnce() + Send>) {
        (self.register_cleanup)(f);
    }

    fn fail(&self) {}

    fn fail_now(&self) {}

    fn log(&self, _message: &str) {}

    fn context(&self) -> Context {
        self.context.clone()
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn defaults() {
        let fake = Fake::new();
        assert_eq!(fake.deadline(), None);
        assert!(!fake.context().is_done());
        fake.fail();
        fake.fail_now();
        fake.log("ignored");
        fake.cleanup(Box::new(|| panic!("default cleanups never run")));
    }

    #[test]
    fn options_are_applied() {
        let deadline = Instant::now() + Duration::from_secs(3);
        let ctx = Context::background();
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);
        let fake = Fake::new()
            .with_context(ctx.clone())
            .with_deadline(deadline)
            .with_register_cleanup(|f| f());

        fake.cleanup(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(fake.deadline(), Some(deadline));

        ctx.cancel();
        assert!(fake.context().is_done());
    }
}
