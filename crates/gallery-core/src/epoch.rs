// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Request epochs for discarding superseded results

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// Monotonic counter shared by everything that issues requests for one view
#[derive(Debug, Clone, Default)]
pub struct RequestEpoch {
    current: Arc<AtomicU64>,
}

/// Stamp carried by an in-flight request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EpochTicket(u64);

impl RequestEpoch {
    /// Create a counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding every earlier ticket
    pub fn advance(&self) -> EpochTicket {
        EpochTicket(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether `ticket` belongs to the most recent request
    pub fn is_current(&self, ticket: EpochTicket) -> bool {
        self.current.load(Ordering::Acquire) == ticket.0
    }
}

impl EpochTicket {
    /// Raw epoch value
    pub const fn value(self) -> u64 {
        self.0
    }
}
