use std::collections::VecDeque;

use crate::email::RawEmail;

pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded FIFO of received emails. Pushing past capacity evicts the oldest.
#[derive(Debug, Clone)]
pub struct Mailbox {
    emails: VecDeque<RawEmail>,
    capacity: usize,
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Mailbox {
    /// A capacity of 0 is raised to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            emails: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Stores `email` and returns the evicted oldest entry, if any.
    pub fn push(&mut self, email: RawEmail) -> Option<RawEmail> {
        let evicted = if self.emails.len() >= self.capacity {
            self.emails.pop_front()
        } else {
            None
        };
        self.emails.push_back(email);
        evicted
    }

    /// Emails carrying a code, oldest first.
    pub fn with_codes(&self) -> Vec<RawEmail> {
        self.emails
            .iter()
            .filter(|email| email.has_verification_code)
            .cloned()
            .collect()
    }

    /// Drops everything and returns how many emails were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.emails.len();
        self.emails.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawEmail> {
        self.emails.iter()
    }
}
