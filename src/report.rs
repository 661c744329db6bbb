//! Sorting and printing pipeline results.

use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::fraction::Fraction;
use crate::scheduler::Scheduler;
use crate::single::SingleResult;

/// Indentation of every line after the header.
const INDENT: &str = "     ";

/// A shared text log that a pipeline run writes into.
///
/// Clones write to the same buffer, from any thread.
#[derive(Clone, Default)]
pub struct Transcript {
    buffer: Arc<Mutex<String>>,
}

impl fmt::Debug for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcript")
            .field("len", &self.buffer.lock().len())
            .finish()
    }
}

impl Transcript {
    /// Start a transcript for the pipeline called `name`.
    pub fn new(name: &str) -> Self {
        let transcript = Self::default();
        transcript.buffer.lock().push_str(&format!(">> Calling {name}()\n"));
        transcript
    }

    /// Append an indented line.
    pub fn line(&self, text: impl fmt::Display) {
        let line = format!("{INDENT}{text}\n");
        self.buffer.lock().push_str(&line);
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.buffer.lock().clone()
    }

    /// Write the transcript to stdout.
    pub fn emit(&self) {
        print!("{}", self.buffer.lock());
    }
}

/// Sort `items`, append them to `transcript` as mixed numbers and print it.
///
/// Two sorts race on the parallel scheduler; whichever finishes first is
/// used and the other one is dropped.
pub fn sort_and_report(items: Vec<Fraction>, transcript: Transcript) -> SingleResult<()> {
    let parallel = Scheduler::parallel();

    let quick = {
        let mut items = items.clone();
        SingleResult::from_fn(move || {
            items.sort_unstable();
            items
        })
        .run_on(parallel.clone())
    };
    let heap = SingleResult::from_fn(move || BinaryHeap::from(items).into_sorted_vec())
        .run_on(parallel);

    quick.first(heap).map(move |sorted| {
        tracing::debug!(count = sorted.len(), "reporting sorted results");
        transcript.line("Printing sorted results:");
        for fraction in &sorted {
            transcript.line(fraction.to_mixed_string());
        }
        transcript.emit();
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn transcript_lines_are_indented() {
        let transcript = Transcript::new("demo");
        transcript.line("exception = boom");
        let clone = transcript.clone();
        clone.line(format_args!("{} x {}", 1, 2));
        assert_eq!(
            transcript.contents(),
            ">> Calling demo()\n     exception = boom\n     1 x 2\n"
        );
    }

    #[test]
    fn reports_in_ascending_order() {
        let items = [(9, 2), (1, 3), (5, 1), (3, 4)]
            .into_iter()
            .map(|(n, d)| Fraction::new(n, d).unwrap())
            .collect();
        let transcript = Transcript::new("sorting");
        sort_and_report(items, transcript.clone()).wait().unwrap();

        let contents = transcript.contents();
        let lines: Vec<_> = contents.lines().skip(2).map(str::trim).collect();
        assert_eq!(lines, ["1/3", "3/4", "4 1/2", "5"]);
    }

    #[test]
    fn empty_reports_still_resolve() {
        let transcript = Transcript::new("nothing");
        sort_and_report(Vec::new(), transcript.clone()).wait().unwrap();
        assert!(transcript.contents().ends_with("Printing sorted results:\n"));
    }
}
