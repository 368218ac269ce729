use std::time::Duration;

/// The outcome of one record, handed to the `Reporter` in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultEvent {
    pub record: usize,
    pub predicted: usize,
    pub actual: usize,
    pub correct: usize,
    pub incorrect: usize,
}

/// Cumulative figures of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Fraction of records classified correctly, `0` for an empty run.
    pub fn accuracy(&self) -> f64 {
        if self.records == 0 {
            return 0.;
        }

        self.correct as f64 / self.records as f64
    }
}

/// Running tally kept by the reporter stage, nobody else touches it.
#[derive(Debug, Default)]
pub(crate) struct RunningStats {
    correct: usize,
    incorrect: usize,
    next: usize,
}

impl RunningStats {
    /// Tallies the next record and returns its event.
    pub fn tally(&mut self, predicted: usize, actual: usize) -> ResultEvent {
        if predicted == actual {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }

        let record = self.next;
        self.next += 1;

        ResultEvent {
            record,
            predicted,
            actual,
            correct: self.correct,
            incorrect: self.incorrect,
        }
    }

    pub fn summary(&self, elapsed: Duration) -> RunSummary {
        RunSummary {
            records: self.next,
            correct: self.correct,
            incorrect: self.incorrect,
            elapsed,
        }
    }
}
