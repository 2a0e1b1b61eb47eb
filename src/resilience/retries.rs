//! Dispatch budget for a single inbound request.
//!
//! The budget is the number of available backends when the request arrives.
//! It is not re-evaluated if backends change health mid-request.

/// Counts forwarding attempts against a fixed ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max_tries: usize,
    attempts: usize,
}

impl RetryBudget {
    /// Create a budget allowing `max_tries` attempts.
    pub fn new(max_tries: usize) -> Self {
        Self { max_tries, attempts: 0 }
    }

    /// True while another attempt may be made.
    pub fn has_remaining(&self) -> bool {
        self.attempts < self.max_tries
    }

    /// Consume one attempt.
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn max_tries(&self) -> usize {
        self.max_tries
    }
}
