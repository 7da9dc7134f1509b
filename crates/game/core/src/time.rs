//! In-game clock helpers.

/// Frame rate of the device's NTSC video output.
pub const GAME_FPS: f64 = 60.0988;

/// Rounds to two decimal places, nudging by `f64::EPSILON` first so values
/// such as `1.005` land on the expected side.
pub fn round2(value: f64) -> f64 {
    ((value + f64::EPSILON) * 100.0).round() / 100.0
}

/// Whole seconds of play represented by a frame counter.
pub fn frames_to_seconds(frames: u32) -> u64 {
    (f64::from(frames) / GAME_FPS).floor() as u64
}

/// Elapsed minutes used for scheduling, rounded to two decimals.
pub fn frames_to_minutes(frames: u32) -> f64 {
    round2(frames_to_seconds(frames) as f64 / 60.0)
}

/// `HH:MM:SS` rendering of a second count.
pub fn format_clock(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_removes_float_drift() {
        assert_eq!(round2(0.1 + 0.2), 0.3);
        assert_eq!(round2(1.005), 1.01);
        assert_eq!(round2(3.5), 3.5);
    }

    #[test]
    fn frames_convert_to_minutes() {
        // 90 seconds of frames, minus one so flooring keeps 89 seconds.
        let frames = (90.0 * GAME_FPS) as u32 - 1;
        assert_eq!(frames_to_seconds(frames), 89);
        assert_eq!(frames_to_minutes(frames), 1.48);
        assert_eq!(frames_to_minutes(0), 0.0);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(3_725), "01:02:05");
    }
}
