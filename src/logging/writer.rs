use std::io;

use tracing_subscriber::fmt::MakeWriter;

use crate::testing::TestingT;

/// An `io::Write` sink logging each write to the test.
///
/// One trailing newline is dropped, since the test log is line based.
/// As a [`MakeWriter`] it plugs into `tracing_subscriber::fmt`:
///
/// ```no_run
/// use std::sync::Arc;
/// use assertive::{logging::Writer, Harness};
///
/// let t = Arc::new(Harness::new());
/// let subscriber = tracing_subscriber::fmt()
///     .with_writer(Writer::new(Arc::clone(&t)))
///     .finish();
/// ```
#[derive(Debug, Clone)]
pub struct Writer<T> {
    t: T,
}

impl<T: TestingT> Writer<T> {
    pub fn new(t: T) -> Self {
        Writer { t }
    }
}

impl<T: TestingT> io::Write for Writer<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.t.helper();
        let text = String::from_utf8_lossy(buf);
        self.t.log(text.strip_suffix('\n').unwrap_or(&text));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a, T: TestingT + 'a> MakeWriter<'a> for Writer<T> {
    type Writer = Writer<&'a T>;

    fn make_writer(&'a self) -> Self::Writer {
        Writer { t: &self.t }
    }
}
