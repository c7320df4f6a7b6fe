//! Bounded version chains
//!
//! A [`VersionChain`] holds the trailing window of snapshots for one
//! (patient, document kind) pair, stored oldest-first / newest-last.
//!
//! Mutations come in two flavours:
//!
//! - [`VersionChain::push`] and [`VersionChain::rollback`] mutate in place.
//! - [`VersionChain::plan_push`] and [`VersionChain::plan_rollback`] leave
//!   `self` untouched and return a [`PlannedChange`]: the would-be chain plus
//!   the [`ChainMutation`] that storage must commit before the new chain may
//!   be installed.

use crate::domain::{DocumentPayload, Result, SequenceNo, VaultError};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of entries retained per chain
///
/// Between 1 and [`HistoryLimit::MAX`]; fixed for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryLimit(usize);

impl HistoryLimit {
    /// Largest accepted limit
    pub const MAX: usize = 1000;

    /// Creates a history limit
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Configuration` when `limit` is zero or above
    /// [`HistoryLimit::MAX`]
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 || limit > Self::MAX {
            return Err(VaultError::Configuration(format!(
                "history_limit must be between 1 and {}, got {limit}",
                Self::MAX
            )));
        }
        Ok(Self(limit))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for HistoryLimit {
    fn default() -> Self {
        Self(10)
    }
}

/// One immutable snapshot in a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub sequence_no: SequenceNo,
    pub payload: DocumentPayload,
    pub created_at: DateTime<Utc>,
}

impl VersionEntry {
    /// Creates an entry stamped with the current time
    ///
    /// Timestamps are truncated to microseconds, the resolution of a
    /// PostgreSQL `TIMESTAMPTZ`, so a rehydrated entry compares equal to the
    /// one that was written.
    pub fn new(sequence_no: SequenceNo, payload: DocumentPayload) -> Self {
        Self {
            sequence_no,
            payload,
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}

/// Durable change produced by planning a push or rollback
///
/// `expected_last` is the chain's sequence high-water mark the plan was made
/// against. Storage must refuse the commit if its own high-water mark differs.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainMutation {
    /// A new entry, plus the oldest entries evicted to make room
    Append {
        expected_last: SequenceNo,
        entry: VersionEntry,
        evicted: Vec<SequenceNo>,
    },
    /// The newest entries discarded by a rollback
    Truncate {
        expected_last: SequenceNo,
        discarded: Vec<SequenceNo>,
    },
}

impl ChainMutation {
    pub fn expected_last(&self) -> SequenceNo {
        match self {
            ChainMutation::Append { expected_last, .. }
            | ChainMutation::Truncate { expected_last, .. } => *expected_last,
        }
    }

    /// High-water mark after the mutation is applied
    ///
    /// Rollbacks never lower it, so discarded sequence numbers are not reused.
    pub fn resulting_last(&self) -> SequenceNo {
        match self {
            ChainMutation::Append { entry, .. } => entry.sequence_no,
            ChainMutation::Truncate { expected_last, .. } => *expected_last,
        }
    }

    /// Sequence numbers whose rows must be deleted
    pub fn removed(&self) -> &[SequenceNo] {
        match self {
            ChainMutation::Append { evicted, .. } => evicted,
            ChainMutation::Truncate { discarded, .. } => discarded,
        }
    }
}

/// Outcome of planning a mutation against a chain
#[derive(Debug, Clone)]
pub struct PlannedChange {
    /// The chain as it will look once the mutation commits
    pub chain: VersionChain,
    /// What storage must record
    pub mutation: ChainMutation,
    /// Head of `chain`
    pub head: VersionEntry,
}

/// Length-bounded, newest-last sequence of snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct VersionChain {
    history_limit: HistoryLimit,
    entries: VecDeque<VersionEntry>,
    last_sequence: SequenceNo,
}

impl VersionChain {
    /// Creates an empty chain
    pub fn new(history_limit: HistoryLimit) -> Self {
        Self {
            history_limit,
            entries: VecDeque::new(),
            last_sequence: SequenceNo::ZERO,
        }
    }

    /// Rebuilds a chain from durable state
    ///
    /// `entries` must be ordered by sequence number. If storage holds more
    /// than `history_limit` entries only the newest are kept. The high-water
    /// mark is the larger of `last_sequence` and the newest entry's number.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Serialization` when sequence numbers are not
    /// strictly increasing
    pub fn restore(
        history_limit: HistoryLimit,
        entries: Vec<VersionEntry>,
        last_sequence: SequenceNo,
    ) -> Result<Self> {
        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].sequence_no >= pair[1].sequence_no)
        {
            return Err(VaultError::Serialization(format!(
                "Stored sequence numbers out of order: {} then {}",
                pair[0].sequence_no, pair[1].sequence_no
            )));
        }

        let mut entries: VecDeque<VersionEntry> = entries.into();
        let overflow = entries.len().saturating_sub(history_limit.get());
        if overflow > 0 {
            tracing::warn!(
                stored = entries.len(),
                history_limit = history_limit.get(),
                "Stored chain exceeds history limit; dropping oldest entries"
            );
            entries.drain(..overflow);
        }

        let newest = entries
            .back()
            .map(|entry| entry.sequence_no)
            .unwrap_or(SequenceNo::ZERO);

        Ok(Self {
            history_limit,
            entries,
            last_sequence: last_sequence.max(newest),
        })
    }

    pub fn history_limit(&self) -> HistoryLimit {
        self.history_limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest sequence number ever issued by this chain
    pub fn last_sequence(&self) -> SequenceNo {
        self.last_sequence
    }

    /// Retained entries, oldest first
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &VersionEntry> {
        self.entries.iter()
    }

    /// Returns the chain head
    ///
    /// # Errors
    ///
    /// Returns `VaultError::EmptyChain` if nothing has been pushed
    pub fn current(&self) -> Result<&VersionEntry> {
        self.entries.back().ok_or(VaultError::EmptyChain)
    }

    /// Appends a payload, evicting the oldest entry if the limit is exceeded
    pub fn push(&mut self, payload: DocumentPayload) -> VersionEntry {
        let planned = self.plan_push(payload);
        *self = planned.chain;
        planned.head
    }

    /// Discards the `steps` newest entries and returns the new head
    ///
    /// # Errors
    ///
    /// - `VaultError::InvalidSteps` if `steps` is zero
    /// - `VaultError::EmptyChain` if the chain is empty
    /// - `VaultError::InsufficientHistory` if `steps >= len`
    ///
    /// The chain is untouched on error.
    pub fn rollback(&mut self, steps: usize) -> Result<VersionEntry> {
        let planned = self.plan_rollback(steps)?;
        *self = planned.chain;
        Ok(planned.head)
    }

    /// Plans a push without modifying `self`
    pub fn plan_push(&self, payload: DocumentPayload) -> PlannedChange {
        let entry = VersionEntry::new(self.last_sequence.next(), payload);

        let mut chain = self.clone();
        chain.entries.push_back(entry.clone());
        chain.last_sequence = entry.sequence_no;

        let mut evicted = Vec::new();
        while chain.entries.len() > chain.history_limit.get() {
            if let Some(oldest) = chain.entries.pop_front() {
                evicted.push(oldest.sequence_no);
            }
        }

        PlannedChange {
            chain,
            mutation: ChainMutation::Append {
                expected_last: self.last_sequence,
                entry: entry.clone(),
                evicted,
            },
            head: entry,
        }
    }

    /// Plans a rollback without modifying `self`
    ///
    /// # Errors
    ///
    /// Same as [`VersionChain::rollback`]
    pub fn plan_rollback(&self, steps: usize) -> Result<PlannedChange> {
        if steps < 1 {
            return Err(VaultError::InvalidSteps(steps));
        }
        if self.entries.is_empty() {
            return Err(VaultError::EmptyChain);
        }
        if steps >= self.entries.len() {
            return Err(VaultError::InsufficientHistory {
                steps,
                retained: self.entries.len(),
            });
        }

        let mut chain = self.clone();
        let keep = chain.entries.len() - steps;
        let discarded = chain
            .entries
            .drain(keep..)
            .map(|entry| entry.sequence_no)
            .collect();

        let head = chain.current()?.clone();

        Ok(PlannedChange {
            chain,
            mutation: ChainMutation::Truncate {
                expected_last: self.last_sequence,
                discarded,
            },
            head,
        })
    }
}
