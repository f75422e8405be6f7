//! Server-side cooldown for appearance writes.
//!
//! The dashboard UI also debounces resubmission, but that only lives in
//! browser-tab memory and disappears on reload. The gateway enforces the
//! same 5-minute window per guild so the guarantee holds for direct API
//! calls too.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;

/// Minimum gap between accepted appearance writes for one guild
pub const WRITE_COOLDOWN: Duration = Duration::from_millis(300_000);

/// Time source, injectable for tests
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Tracks the last accepted write per guild id.
///
/// Entries are dropped lazily: an expired entry is removed the next time
/// that guild is checked.
pub struct WriteCooldown {
    last_write: DashMap<String, u64>,
    window_ms: u64,
    clock: Arc<dyn Clock>,
}

impl WriteCooldown {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), WRITE_COOLDOWN)
    }

    pub fn with_clock(clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            last_write: DashMap::new(),
            window_ms: window.as_millis() as u64,
            clock,
        }
    }

    /// Seconds until the guild may write again, or `None` if it may now.
    pub fn remaining_secs(&self, guild_id: &str) -> Option<u64> {
        let now = self.clock.now_millis();

        if let Some(entry) = self.last_write.get(guild_id) {
            let elapsed = now.saturating_sub(*entry);
            if elapsed < self.window_ms {
                let remaining_ms = self.window_ms - elapsed;
                return Some(remaining_ms.div_ceil(1000));
            }
        }

        // Expired entry, clean it up
        self.last_write.remove(guild_id);
        None
    }

    /// Record an accepted write for the guild
    pub fn record(&self, guild_id: &str) {
        self.last_write.insert(guild_id.to_string(), self.clock.now_millis());
    }
}

impl Default for WriteCooldown {
    fn default() -> Self {
        Self::new()
    }
}

pub type SharedWriteCooldown = Arc<WriteCooldown>;

pub fn create_write_cooldown() -> SharedWriteCooldown {
    Arc::new(WriteCooldown::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FakeClock {
        now: AtomicU64,
    }

    impl FakeClock {
        fn new() -> Arc<Self> {
            Arc::new(Self { now: AtomicU64::new(1_000_000) })
        }

        fn advance_ms(&self, ms: u64) {
            self.now.fetch_add(ms, Ordering::SeqCst);
        }
    }

    impl Clock for FakeClock {
        fn now_millis(&self) -> u64 {
            self.now.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_first_write_allowed() {
        let clock = FakeClock::new();
        let cooldown = WriteCooldown::with_clock(clock, WRITE_COOLDOWN);
        assert_eq!(cooldown.remaining_secs("123"), None);
    }

    #[test]
    fn test_write_within_window_blocked() {
        let clock = FakeClock::new();
        let cooldown = WriteCooldown::with_clock(clock.clone(), WRITE_COOLDOWN);

        cooldown.record("123");
        assert_eq!(cooldown.remaining_secs("123"), Some(300));

        clock.advance_ms(100_000);
        assert_eq!(cooldown.remaining_secs("123"), Some(200));

        // Partial seconds round up
        clock.advance_ms(199_500);
        assert_eq!(cooldown.remaining_secs("123"), Some(1));
    }

    #[test]
    fn test_write_after_window_allowed() {
        let clock = FakeClock::new();
        let cooldown = WriteCooldown::with_clock(clock.clone(), WRITE_COOLDOWN);

        cooldown.record("123");
        clock.advance_ms(300_000);
        assert_eq!(cooldown.remaining_secs("123"), None);
    }

    #[test]
    fn test_guilds_are_independent() {
        let clock = FakeClock::new();
        let cooldown = WriteCooldown::with_clock(clock, WRITE_COOLDOWN);

        cooldown.record("123");
        assert!(cooldown.remaining_secs("123").is_some());
        assert_eq!(cooldown.remaining_secs("456"), None);
    }

    #[test]
    fn test_failed_write_does_not_consume_window() {
        let clock = FakeClock::new();
        let cooldown = WriteCooldown::with_clock(clock, WRITE_COOLDOWN);

        // Checking without recording (backend rejected the write) leaves
        // the guild free to retry immediately.
        assert_eq!(cooldown.remaining_secs("123"), None);
        assert_eq!(cooldown.remaining_secs("123"), None);
    }
}
