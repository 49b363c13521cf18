use std::time::{Duration, Instant};

/// Suppresses an identical payload seen again within the cooldown.
///
/// A camera loop decodes the same badge many times per second; only the
/// first sighting should reach the interpreter. Repeats inside the window
/// do not extend it.
#[derive(Debug, Clone)]
pub(crate) struct ScanGuard {
    cooldown: Duration,
    last: Option<(String, Instant)>,
}

impl ScanGuard {
    pub(crate) fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
        }
    }

    /// True when the payload should be processed
    pub(crate) fn admit(&mut self, payload: &str, now: Instant) -> bool {
        if let Some((last, seen_at)) = &self.last
            && last == payload
            && now.saturating_duration_since(*seen_at) < self.cooldown
        {
            return false;
        }
        self.last = Some((payload.to_string(), now));
        true
    }

    pub(crate) fn reset(&mut self) {
        self.last = None;
    }
}
