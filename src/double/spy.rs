use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::context::Context;
use crate::testing::TestingT;

use super::record::{Method, RecordValue, SpyRecord};

#[derive(Debug, Default)]
pub(super) struct SpyState {
    pub(super) failed: bool,
    pub(super) logs: Vec<String>,
    pub(super) records: Vec<SpyRecord>,
}

/// A [`TestingT`] that records every call before forwarding it.
///
/// Wrap a [`super::Fake`] to test assertion helpers without failing the
/// real test, then check what happened with the `expect_*` methods.
#[derive(Debug)]
pub struct Spy<T> {
    inner: T,
    pub(super) state: Mutex<SpyState>,
}

impl<T: TestingT> Spy<T> {
    pub fn new(inner: T) -> Self {
        Spy {
            inner,
            state: Mutex::new(SpyState::default()),
        }
    }
}

impl<T> Spy<T> {
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Every call recorded so far, in order.
    pub fn records(&self) -> Vec<SpyRecord> {
        self.state().records.clone()
    }

    /// Every logged message, in order.
    pub fn logs(&self) -> Vec<String> {
        self.state().logs.clone()
    }

    /// True once `fail` or `fail_now` was called.
    pub fn failed(&self) -> bool {
        self.state().failed
    }

    pub(super) fn state(&self) -> MutexGuard<'_, SpyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, record: SpyRecord) {
        self.state().records.push(record);
    }
}

impl<T: TestingT> TestingT for Spy<T> {
    fn helper(&self) {
        self.record(SpyRecord::new(Method::Helper));
        self.inner.helper();
    }

    fn cleanup(&self, f: Box<dyn FnOnce() + Send>) {
        self.record(SpyRecord::new(Method::Cleanup).with_inputs([RecordValue::Callback]));
        self.inner.cleanup(f);
    }

    fn fail(&self) {
        {
            let mut state = self.state();
            state.records.push(SpyRecord::new(Method::Fail));
            state.failed = true;
        }
        self.inner.fail();
    }

    fn fail_now(&self) {
        {
            let mut state = self.state();
            state.records.push(SpyRecord::new(Method::FailNow));
            state.failed = true;
        }
        self.inner.fail_now();
    }

    fn log(&self, message: &str) {
        {
            let mut state = self.state();
            state.records.push(SpyRecord::log(message));
            state.logs.push(message.to_string());
        }
        self.inner.log(message);
    }

    fn context(&self) -> Context {
        let ctx = self.inner.context();
        self.record(SpyRecord::new(Method::Context).with_outputs([RecordValue::Context]));
        ctx
    }

    fn deadline(&self) -> Option<Instant> {
        let deadline = self.inner.deadline();
        self.record(
            SpyRecord::new(Method::Deadline).with_outputs([RecordValue::Deadline(deadline)]),
        );
        deadline
    }
}
