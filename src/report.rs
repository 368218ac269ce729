use std::io::{self, Write};

use crate::pipeline::{ResultEvent, RunSummary};

/// Consumer of the pipeline's per-record results.
///
/// Called from the reporter stage only, once per record in record order and once more
/// with the summary when the run completes.
pub trait Reporter: Send {
    fn record(&mut self, event: &ResultEvent) -> io::Result<()>;

    fn finish(&mut self, summary: &RunSummary) -> io::Result<()> {
        let _ = summary;
        Ok(())
    }
}

/// Prints predictions and running accuracy as plain text.
pub struct ConsoleReporter<W: Write + Send> {
    out: W,
    every: usize,
}

impl ConsoleReporter<io::Stdout> {
    /// A `ConsoleReporter` writing to stdout.
    ///
    /// # Arguments
    /// * `every` - Print every this many records, `0` is treated as `1`.
    pub fn stdout(every: usize) -> Self {
        Self::new(io::stdout(), every)
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    pub fn new(out: W, every: usize) -> Self {
        Self {
            out,
            every: every.max(1),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn record(&mut self, event: &ResultEvent) -> io::Result<()> {
        if (event.record + 1) % self.every != 0 {
            return Ok(());
        }

        let seen = event.correct + event.incorrect;
        let rate = event.correct as f64 / seen as f64 * 100.;

        writeln!(
            self.out,
            "Record {:5}  Prediction: {}   Actual: {}",
            event.record + 1,
            event.predicted,
            event.actual
        )?;
        writeln!(
            self.out,
            "Result: Correct={:5}  Incorrect={:5}  Success-Rate= {rate:5.2}%",
            event.correct, event.incorrect
        )
    }

    fn finish(&mut self, summary: &RunSummary) -> io::Result<()> {
        writeln!(
            self.out,
            "DONE! {} records, accuracy {:.2}%, total execution time: {:.1} sec",
            summary.records,
            summary.accuracy() * 100.,
            summary.elapsed.as_secs_f64()
        )?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn event(record: usize, correct: usize, incorrect: usize) -> ResultEvent {
        ResultEvent {
            record,
            predicted: 7,
            actual: 2,
            correct,
            incorrect,
        }
    }

    #[test]
    fn test_prints_prediction_and_running_rate() {
        let mut reporter = ConsoleReporter::new(Vec::new(), 1);
        reporter.record(&event(3, 3, 1)).unwrap();

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(text.contains("Prediction: 7   Actual: 2"));
        assert!(text.contains("Correct=    3  Incorrect=    1  Success-Rate= 75.00%"));
    }

    #[test]
    fn test_skips_records_between_progress_lines() {
        let mut reporter = ConsoleReporter::new(Vec::new(), 2);
        reporter.record(&event(0, 1, 0)).unwrap();
        reporter.record(&event(1, 2, 0)).unwrap();

        let summary = RunSummary {
            records: 2,
            correct: 2,
            incorrect: 0,
            elapsed: Duration::from_millis(1500),
        };
        reporter.finish(&summary).unwrap();

        let text = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(text.matches("Prediction").count(), 1);
        assert!(text.contains("Record     2"));
        assert!(text.contains("accuracy 100.00%"));
        assert!(text.contains("1.5 sec"));
    }
}
