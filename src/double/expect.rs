//! Expectations on what a [`Spy`] observed.
//!
//! Each expectation logs what went wrong on the given `t` and calls
//! `t.fail()`; none of them stop the test.

use similar::TextDiff;

use crate::testing::TestingT;

use super::record::SpyRecord;
use super::spy::Spy;

impl<S> Spy<S> {
    /// Check the recorded calls against `expected`.
    ///
    /// Strict mode requires the same records in the same order. Otherwise
    /// every expected record must match a distinct recorded one, in any
    /// order, and extra records are allowed.
    pub fn expect_records<T: TestingT + ?Sized>(
        &self,
        t: &T,
        strict: bool,
        expected: &[SpyRecord],
    ) {
        t.helper();
        let records = self.records();

        if strict {
            let same = records.len() == expected.len()
                && records.iter().zip(expected).all(|(a, e)| e.matches(a));
            if !same {
                t.log(&format!(
                    "Expected provided records to match\n{}",
                    records_diff(&records, expected)
                ));
                t.fail();
            }
            return;
        }

        let mut used = vec![false; records.len()];
        let mut missing = Vec::new();
        for exp in expected {
            let found = records
                .iter()
                .enumerate()
                .find(|(i, actual)| !used[*i] && exp.matches(actual))
                .map(|(i, _)| i);
            match found {
                Some(i) => used[i] = true,
                None => missing.push(exp),
            }
        }

        if !missing.is_empty() {
            let listed: Vec<String> = missing.iter().map(|r| format!("\t{r}")).collect();
            t.log(&format!("Missing expected records:\n{}", listed.join("\n")));
            t.fail();
        }
    }

    pub fn expect_no_logs<T: TestingT + ?Sized>(&self, t: &T) {
        t.helper();
        let logs = self.logs();
        if !logs.is_empty() {
            t.log(&format!("Expected no logs, got:\n\t{}", logs.join("\n")));
            t.fail();
        }
    }

    /// Every string must appear somewhere in the joined logs.
    pub fn expect_logs_to_contain<T: TestingT + ?Sized>(&self, t: &T, expected: &[&str]) {
        t.helper();
        let log = self.logs().join("\n");
        for needle in expected {
            if !log.contains(needle) {
                t.log(&format!(
                    "Expected log to contain message:\nexpected: {needle}\nlog: {log}"
                ));
                t.fail();
            }
        }
    }

    pub fn expect_test_to_fail<T: TestingT + ?Sized>(&self, t: &T) {
        t.helper();
        if !self.failed() {
            t.log("Expected test to fail but test succeeded");
            t.fail();
        }
    }

    pub fn expect_test_to_pass<T: TestingT + ?Sized>(&self, t: &T) {
        t.helper();
        if self.failed() {
            t.log("Expected test to succeed but test failed");
            t.fail();
        }
    }
}

fn records_diff(actual: &[SpyRecord], expected: &[SpyRecord]) -> String {
    let render = |records: &[SpyRecord]| {
        records
            .iter()
            .map(|r| format!("{r}\n"))
            .collect::<String>()
    };
    let (actual, expected) = (render(actual), render(expected));
    TextDiff::from_lines(&actual, &expected)
        .unified_diff()
        .header("recorded", "expected")
        .to_string()
}
