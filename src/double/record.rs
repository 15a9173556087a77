use std::fmt;
use std::time::Instant;

/// A [`crate::TestingT`] method, as recorded by a [`super::Spy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Helper,
    Cleanup,
    Fail,
    FailNow,
    Log,
    Context,
    Deadline,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Helper => "Helper",
            Method::Cleanup => "Cleanup",
            Method::Fail => "Fail",
            Method::FailNow => "FailNow",
            Method::Log => "Log",
            Method::Context => "Context",
            Method::Deadline => "Deadline",
        };
        f.write_str(name)
    }
}

/// One recorded input or output.
#[derive(Debug, Clone)]
pub enum RecordValue {
    /// Matches any value. Only meaningful in expected records.
    Any,
    Text(String),
    Deadline(Option<Instant>),
    /// A cleanup function; functions are only known to be present.
    Callback,
    /// A context; contexts are only known to be present.
    Context,
}

impl RecordValue {
    pub fn text(value: impl Into<String>) -> Self {
        RecordValue::Text(value.into())
    }

    /// Equality where [`RecordValue::Any`] matches everything.
    pub fn matches(&self, other: &RecordValue) -> bool {
        match (self, other) {
            (RecordValue::Any, _) | (_, RecordValue::Any) => true,
            (RecordValue::Text(a), RecordValue::Text(b)) => a == b,
            (RecordValue::Deadline(a), RecordValue::Deadline(b)) => a == b,
            (RecordValue::Callback, RecordValue::Callback)
            | (RecordValue::Context, RecordValue::Context) => true,
            _ => false,
        }
    }
}

/// A single call observed by a spy.
#[derive(Debug, Clone)]
pub struct SpyRecord {
    pub method: Method,
    pub inputs: Vec<RecordValue>,
    pub outputs: Vec<RecordValue>,
}

impl SpyRecord {
    /// A record with no inputs or outputs.
    pub fn new(method: Method) -> Self {
        SpyRecord {
            method,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = RecordValue>) -> Self {
        self.inputs = inputs.into_iter().collect();
        self
    }

    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = RecordValue>) -> Self {
        self.outputs = outputs.into_iter().collect();
        self
    }

    /// Expected record of a log call with this exact message.
    pub fn log(message: impl Into<String>) -> Self {
        SpyRecord::new(Method::Log).with_inputs([RecordValue::text(message)])
    }

    /// Same method and pairwise-matching inputs and outputs.
    pub fn matches(&self, other: &SpyRecord) -> bool {
        fn all_match(a: &[RecordValue], b: &[RecordValue]) -> bool {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.matches(y))
        }
        self.method == other.method
            && all_match(&self.inputs, &other.inputs)
            && all_match(&self.outputs, &other.outputs)
    }
}

impl fmt::Display for SpyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{input:?}")?;
        }
        f.write_str(")")?;
        if !self.outputs.is_empty() {
            f.write_str(" -> ")?;
            for (i, output) in self.outputs.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{output:?}")?;
            }
        }
        Ok(())
    }
}
