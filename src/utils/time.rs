//! Timestamp helpers for packet capture times.

use crate::error::{constants, PacketError, Result};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current Unix time in milliseconds
pub fn now_millis() -> Result<u64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| PacketError::ClockError(constants::ERR_SYSTEM_TIME.to_string()))?;
    Ok(duration_to_millis(elapsed))
}

/// Saturating conversion, so a far-future clock cannot wrap
pub fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_now_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(now_millis().unwrap() > 1_577_836_800_000);
    }

    #[test]
    fn test_duration_to_millis_saturates() {
        assert_eq!(duration_to_millis(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_to_millis(Duration::MAX), u64::MAX);
    }
}
