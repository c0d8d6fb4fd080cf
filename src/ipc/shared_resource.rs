use parking_lot::RwLock;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

// ============================================================================
// DIAGNOSTIC LOG - Printable transaction failures for the presentation layer
// ============================================================================

#[derive(Debug, Clone)]
pub struct DiagnosticEntry {
    pub at: Instant,
    pub channel: u8,
    pub op: &'static str,
    pub message: String,
}

impl fmt::Display for DiagnosticEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.channel, self.op, self.message)
    }
}

/// Bounded, shared log of failed transactions. Cloning shares the buffer.
#[derive(Clone)]
pub struct DiagnosticLog {
    entries: Arc<RwLock<VecDeque<DiagnosticEntry>>>,
    max_size: usize,
}

impl DiagnosticLog {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_size))),
            max_size,
        }
    }

    pub fn record(&self, channel: u8, op: &'static str, message: impl Into<String>) {
        let mut log = self.entries.write();
        log.push_back(DiagnosticEntry {
            at: Instant::now(),
            channel,
            op,
            message: message.into(),
        });
        if log.len() > self.max_size {
            log.pop_front();
        }
    }

    /// Entries for one channel, oldest first.
    pub fn for_channel(&self, channel: u8) -> Vec<DiagnosticEntry> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.channel == channel)
            .cloned()
            .collect()
    }

    /// Remove and return everything logged so far.
    pub fn drain(&self) -> Vec<DiagnosticEntry> {
        self.entries.write().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for DiagnosticLog {
    fn default() -> Self {
        Self::new(2000)
    }
}
