//! Time-ordered activity queue with seeded tie-breaking

use common::TimeStamp;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Queued activity. Ordered by time, then a random key drawn at insertion,
/// then insertion count (only reached on a key collision).
struct Entry<A> {
    time: TimeStamp,
    tiebreak: u64,
    inserted: u64,
    activity: A,
}

impl<A> Entry<A> {
    fn key(&self) -> (TimeStamp, u64, u64) {
        (self.time, self.tiebreak, self.inserted)
    }
}

impl<A> PartialEq for Entry<A> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<A> Eq for Entry<A> {}

impl<A> PartialOrd for Entry<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Entry<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Min-priority queue of activities keyed by [`TimeStamp`]
pub struct EventQueue<A> {
    heap: BinaryHeap<Reverse<Entry<A>>>,
    rng: ChaCha8Rng,
    inserted: u64,
}

impl<A> EventQueue<A> {
    /// Create an empty queue whose tie-break stream is fixed by `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            heap: BinaryHeap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            inserted: 0,
        }
    }

    /// Insert an activity at `time`
    pub fn push(&mut self, time: TimeStamp, activity: A) {
        self.inserted += 1;
        self.heap.push(Reverse(Entry {
            time,
            tiebreak: self.rng.gen(),
            inserted: self.inserted,
            activity,
        }));
    }

    /// Time of the earliest activity
    pub fn peek_time(&self) -> Option<TimeStamp> {
        self.heap.peek().map(|Reverse(entry)| entry.time)
    }

    /// Remove the earliest activity
    pub fn pop(&mut self) -> Option<(TimeStamp, A)> {
        self.heap
            .pop()
            .map(|Reverse(entry)| (entry.time, entry.activity))
    }

    /// Number of queued activities
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
