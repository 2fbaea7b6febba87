//! Bounded in-memory view of the service's log stream.

use std::collections::VecDeque;

use chrono::Utc;
use watchdash_proto::logs::LogEntry;

/// Entries kept before the oldest are evicted.
pub const LOG_CAPACITY: usize = 1000;

/// FIFO ring of log entries.  Appends past capacity evict from the front,
/// so `len()` never exceeds the cap.
///
/// Entries that arrive without a server id are assigned one from a local
/// monotonic counter that is kept above every id seen so far — wall-clock
/// time is never involved, so ids stay unique and ordered across clock
/// adjustments.
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_synth: u64,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(LOG_CAPACITY)),
            capacity,
            next_synth: 0,
        }
    }

    /// Keep the synthetic-id counter above `floor` (the current watermark),
    /// so a synthesised id can never collide with a consumed server id.
    pub fn seed_sequence(&mut self, floor: u64) {
        if floor > self.next_synth {
            self.next_synth = floor;
        }
    }

    /// Append one entry, filling in a synthetic id and a receive timestamp
    /// where the server left them out.  Returns the effective id.
    pub fn push(&mut self, mut entry: LogEntry) -> u64 {
        if entry.id == 0 {
            self.next_synth += 1;
            entry.id = self.next_synth;
        } else if entry.id > self.next_synth {
            self.next_synth = entry.id;
        }
        if entry.timestamp.is_none() {
            entry.timestamp = Some(Utc::now());
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        let id = entry.id;
        self.entries.push_back(entry);
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_synth = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, message: &str) -> LogEntry {
        serde_json::from_str(&format!(
            r#"{{"id": {id}, "message": "{message}"}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let mut buffer = LogBuffer::new(5);
        for i in 1..=12 {
            buffer.push(entry(i, "x"));
            assert!(buffer.len() <= 5);
        }
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut buffer = LogBuffer::new(3);
        for i in 1..=5 {
            buffer.push(entry(i, "x"));
        }
        let ids: Vec<u64> = buffer.snapshot().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }

    #[test]
    fn test_synthesised_ids_stay_above_server_ids() {
        let mut buffer = LogBuffer::new(10);
        buffer.push(entry(7, "server-assigned"));
        let a = buffer.push(entry(0, "no id"));
        let b = buffer.push(entry(0, "no id either"));
        assert_eq!(a, 8);
        assert_eq!(b, 9);
    }

    #[test]
    fn test_seed_sequence_respects_watermark() {
        let mut buffer = LogBuffer::new(10);
        buffer.seed_sequence(40);
        assert_eq!(buffer.push(entry(0, "x")), 41);
    }

    #[test]
    fn test_fills_missing_timestamp() {
        let mut buffer = LogBuffer::new(10);
        buffer.push(entry(1, "x"));
        assert!(buffer.snapshot()[0].timestamp.is_some());
    }

    #[test]
    fn test_clear_resets_sequence() {
        let mut buffer = LogBuffer::new(10);
        buffer.push(entry(9, "x"));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.push(entry(0, "fresh")), 1);
    }
}
