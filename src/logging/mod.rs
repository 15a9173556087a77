//! Routing logs of the code under test into the test's own log.
//!
//! - [`TestLayer`]: a `tracing` layer formatting each event on one line
//! - [`Writer`]: an `io::Write` sink, usable as a `fmt` layer writer
//! - [`subscriber`]: a ready-made subscriber filtered by `ASSERTIVE_LOG`
//!
//! ```no_run
//! use std::sync::Arc;
//! use assertive::{logging, Harness};
//!
//! let t = Arc::new(Harness::new());
//! let _guard = tracing::subscriber::set_default(logging::subscriber(Arc::clone(&t)));
//! tracing::info!(user = "bob", "signed in");
//! // level=INFO user=bob signed in
//! ```

mod layer;
mod writer;

use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::LOG_FILTER_ENV;
use crate::testing::TestingT;

pub use layer::TestLayer;
pub use writer::Writer;

/// A subscriber sending every enabled event to `t`.
///
/// The filter comes from `ASSERTIVE_LOG` and defaults to `trace`.
pub fn subscriber<T>(t: T) -> impl Subscriber + Send + Sync
where
    T: TestingT + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("trace"));
    Registry::default().with(filter).with(TestLayer::new(t))
}
