//! Cancellation and deadlines for test code.
//!
//! A [`Context`] pairs a [`CancellationToken`] with an optional deadline.
//! Derived contexts get a child token, so cancelling a parent cancels every
//! context derived from it, never the other way around.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::testing::TestingT;

/// Cancellation token plus optional deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done unless cancelled.
    pub fn background() -> Self {
        Context::default()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Derive a context that is also done at `deadline`.
    ///
    /// The earlier of the two deadlines wins.
    pub fn with_deadline(&self, deadline: Instant) -> Context {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Context {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Context {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that can be cancelled on its own.
    pub fn with_cancel(&self) -> Context {
        Context {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once cancelled or past the deadline.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                let deadline = tokio::time::Instant::from_std(deadline);
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

/// The test's context, ending slightly before the test's own deadline.
///
/// When the test has a deadline, 1% of the remaining time (at most one
/// second) is reserved so that code waiting on the context gives up early
/// enough to report a failure instead of being killed. The derived context
/// is cancelled when the test cleans up.
pub fn context<T: TestingT + ?Sized>(t: &T) -> Context {
    let ctx = t.context();

    let Some(deadline) = t.deadline() else {
        return ctx;
    };

    let remaining = deadline.saturating_duration_since(Instant::now());
    let reserve = remaining.mul_f64(0.01).min(Duration::from_secs(1));
    let ctx = ctx.with_deadline(deadline.checked_sub(reserve).unwrap_or(deadline));

    let token = ctx.token().clone();
    t.cleanup(Box::new(move || token.cancel()));
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::double::{Fake, Method, Spy};

    #[test]
    fn children_follow_parent_cancellation() {
        let parent = Context::background();
        let child = parent.with_cancel();
        child.cancel();
        assert!(child.is_done());
        assert!(!parent.is_done());

        let other = parent.with_timeout(Duration::from_secs(60));
        parent.cancel();
        assert!(other.is_done());
    }

    #[test]
    fn earliest_deadline_wins() {
        let now = Instant::now();
        let ctx = Context::background().with_deadline(now + Duration::from_secs(5));
        let later = ctx.with_deadline(now + Duration::from_secs(50));
        assert_eq!(later.deadline(), Some(now + Duration::from_secs(5)));
        let earlier = ctx.with_deadline(now + Duration::from_secs(1));
        assert_eq!(earlier.deadline(), Some(now + Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn done_resolves_at_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        tokio::time::timeout(Duration::from_secs(5), ctx.done())
            .await
            .expect("deadline reached");
        assert!(ctx.is_done());
    }

    #[test]
    fn no_deadline_returns_the_test_context() {
        let spy = Spy::new(Fake::new());
        let ctx = context(&spy);
        assert_eq!(ctx.deadline(), None);
        let methods: Vec<Method> = spy.records().iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![Method::Context, Method::Deadline]);
    }

    #[test]
    fn deadline_is_shrunk_and_cancelled_on_cleanup() {
        let deadline = Instant::now() + Duration::from_secs(10);
        let cleanups = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let registered = std::sync::Arc::clone(&cleanups);
        let fake = Fake::new()
            .with_deadline(deadline)
            .with_register_cleanup(move |f| registered.lock().expect("lock").push(f));
        let spy = Spy::new(fake);

        let ctx = context(&spy);
        let got = ctx.deadline().expect("deadline set");
        assert!(got < deadline);
        assert!(deadline - got <= Duration::from_millis(100));

        let methods: Vec<Method> = spy.records().iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![Method::Context, Method::Deadline, Method::Cleanup]);

        assert!(!ctx.is_done());
        for cleanup in cleanups.lock().expect("lock").drain(..) {
            cleanup();
        }
        assert!(ctx.is_done());
    }

    #[test]
    fn reserve_is_capped_at_one_second() {
        let deadline = Instant::now() + Duration::from_secs(1000);
        let ctx = context(&Fake::new().with_deadline(deadline));
        let reserved = deadline - ctx.deadline().expect("deadline set");
        assert!(reserved <= Duration::from_secs(1));
        assert!(reserved > Duration::from_millis(900));
    }
}
