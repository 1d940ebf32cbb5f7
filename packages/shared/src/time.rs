//! Time utilities with a clock abstraction for testability.
//!
//! All timestamps are Unix epoch milliseconds in UTC.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in milliseconds
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

/// Manually driven clock for tests.
///
/// Returns the same instant until it is moved with [`FixedClock::advance`] or [`FixedClock::set`].
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(fixed_time_millis),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Current Unix timestamp in milliseconds (UTC)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a Unix timestamp (milliseconds) to RFC 3339 in UTC.
///
/// Out-of-range timestamps fall back to the epoch rather than panicking.
pub fn timestamp_to_rfc3339(timestamp_millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render a duration as `days: d, hours: h, minutes: m, seconds: s`.
pub fn format_duration(millis: i64) -> String {
    let total_seconds = millis.max(0) / 1000;
    let seconds = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let minutes = total_minutes % 60;
    let total_hours = total_minutes / 60;
    let hours = total_hours % 24;
    let days = total_hours / 24;
    format!(
        "days: {}, hours: {}, minutes: {}, seconds: {}",
        days, hours, minutes, seconds
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_non_zero_timestamp() {
        // テスト項目: SystemClock が 0 以外のタイムスタンプを返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let timestamp = clock.now_millis();

        // then (期待する結果):
        assert!(timestamp > 0);
    }

    #[test]
    fn test_fixed_clock_advances_only_when_told() {
        // テスト項目: FixedClock は advance/set を呼んだときだけ時刻が進む
        // given (前提条件):
        let clock = FixedClock::new(1_000);

        // when (操作):
        let before = clock.now_millis();
        clock.advance(250);
        let after = clock.now_millis();
        clock.set(42);

        // then (期待する結果):
        assert_eq!(before, 1_000);
        assert_eq!(after, 1_250);
        assert_eq!(clock.now_millis(), 42);
    }

    #[test]
    fn test_timestamp_to_rfc3339_format() {
        // テスト項目: タイムスタンプが UTC の RFC 3339 形式に変換される
        // given (前提条件):
        // 2023-01-01 00:00:00.123 UTC
        let timestamp = 1_672_531_200_123;

        // when (操作):
        let result = timestamp_to_rfc3339(timestamp);

        // then (期待する結果):
        assert_eq!(result, "2023-01-01T00:00:00.123Z");
    }

    #[test]
    fn test_format_duration_breaks_down_units() {
        // テスト項目: 経過時間が日・時・分・秒に分解される
        // given (前提条件):
        let millis = ((24 + 2) * 3600 + 3 * 60 + 4) * 1000 + 999;

        // when (操作):
        let result = format_duration(millis);

        // then (期待する結果):
        assert_eq!(result, "days: 1, hours: 2, minutes: 3, seconds: 4");
    }

    #[test]
    fn test_format_duration_clamps_negative() {
        // テスト項目: 負の経過時間は 0 として扱われる
        assert_eq!(
            format_duration(-5),
            "days: 0, hours: 0, minutes: 0, seconds: 0"
        );
    }
}
