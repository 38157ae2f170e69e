//! Byte budget for recursive container traversal.
//!
//! # Invariants
//! - Every payload a decoder extracts is reserved from the budget before it
//!   is recursed into, so the total bytes handed to leaf scanning across a
//!   whole recursion tree never exceeds the budget given at the root.
//! - The budget is owned by one scan's call stack and passed `&mut` down
//!   it, never shared between scans or workers.
//! - Exhaustion is a terminal state, not an error: the affected entry is
//!   skipped and siblings continue.

/// Default traversal budget: 1 GiB of extracted bytes per top-level input.
pub const DEFAULT_BYTE_BUDGET: u64 = 1 << 30;

/// Smallest payload worth recursing into.
pub const MIN_DATA_LEN: usize = 8;

#[derive(Clone, Debug)]
pub struct ByteBudget {
    remaining: u64,
}

impl ByteBudget {
    pub fn new(limit: u64) -> Self {
        Self { remaining: limit }
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Reserve `n` bytes for an extracted payload. Returns false (and takes
    /// nothing) when the payload would overrun the budget.
    #[inline]
    pub fn reserve(&mut self, n: u64) -> bool {
        if n > self.remaining {
            return false;
        }
        self.remaining -= n;
        true
    }
}

impl Default for ByteBudget {
    fn default() -> Self {
        Self::new(DEFAULT_BYTE_BUDGET)
    }
}
