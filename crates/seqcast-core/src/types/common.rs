//! Time and playback-rate helpers shared by the player and its front ends.

use serde::{Deserialize, Serialize};

/// Format a position in seconds as `M:SS`.
///
/// Minutes are not wrapped into hours. Negative or non-finite input renders
/// as `0:00`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }

    let total_secs = seconds.floor() as u64;
    let minutes = total_secs / 60;
    let secs = total_secs % 60;
    format!("{minutes}:{secs:02}")
}

/// Progress through a track as a 0–1000 fraction.
///
/// Returns `None` until the duration is known and positive.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn progress_permille(position: f64, duration: Option<f64>) -> Option<u16> {
    let duration = duration.filter(|d| d.is_finite() && *d > 0.0)?;
    let position = if position.is_finite() { position } else { 0.0 };
    let permille = (position / duration * 1000.0).floor().clamp(0.0, 1000.0);
    Some(permille as u16)
}

/// Playback speed multiplier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct PlaybackRate(f64);

impl PlaybackRate {
    pub const NORMAL: Self = Self(1.0);

    /// Accepts any finite positive multiplier; anything else means normal speed.
    pub fn new(rate: f64) -> Self {
        if rate.is_finite() && rate > 0.0 {
            Self(rate)
        } else {
            Self::NORMAL
        }
    }

    /// Parse user input such as `"1.5"`. Non-numeric input means normal speed.
    pub fn parse(input: &str) -> Self {
        input.trim().parse().map_or(Self::NORMAL, Self::new)
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<f64> for PlaybackRate {
    fn from(rate: f64) -> Self {
        Self::new(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(59.9), "0:59");
        assert_eq!(format_clock(61.0), "1:01");
        assert_eq!(format_clock(3725.0), "62:05");
        assert_eq!(format_clock(-3.0), "0:00");
        assert_eq!(format_clock(f64::NAN), "0:00");
        assert_eq!(format_clock(f64::INFINITY), "0:00");
    }

    #[test]
    fn test_progress_permille() {
        assert_eq!(progress_permille(30.0, Some(120.0)), Some(250));
        assert_eq!(progress_permille(120.0, Some(120.0)), Some(1000));
        assert_eq!(progress_permille(5.0, None), None);
        assert_eq!(progress_permille(5.0, Some(0.0)), None);
        assert_eq!(progress_permille(5.0, Some(f64::NAN)), None);
    }

    #[test]
    fn test_playback_rate_defaults() {
        assert!((PlaybackRate::parse("1.5").value() - 1.5).abs() < f64::EPSILON);
        assert_eq!(PlaybackRate::parse("fast"), PlaybackRate::NORMAL);
        assert_eq!(PlaybackRate::new(0.0), PlaybackRate::NORMAL);
        assert_eq!(PlaybackRate::new(f64::NAN), PlaybackRate::NORMAL);
        assert_eq!(PlaybackRate::new(-2.0), PlaybackRate::NORMAL);
    }

    proptest! {
        #[test]
        fn format_clock_seconds_always_two_digits(secs in 0.0f64..1.0e7) {
            let text = format_clock(secs);
            let (_, s) = text.split_once(':').unwrap_or(("", ""));
            prop_assert_eq!(s.len(), 2);
        }

        #[test]
        fn permille_stays_in_range(pos in -1.0e6f64..1.0e6, dur in 0.001f64..1.0e6) {
            let p = progress_permille(pos, Some(dur));
            prop_assert!(p.is_some_and(|p| p <= 1000));
        }
    }
}
