/// Millisecond-precision cue timestamps. SRT and VTT differ only in the
/// separator before the millisecond field.

fn units(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1_000,
        total_ms % 1_000,
    )
}

pub fn srt_timecode(seconds: f64) -> String {
    let (h, m, s, ms) = units(seconds);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

pub fn vtt_timecode(seconds: f64) -> String {
    let (h, m, s, ms) = units(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_and_fractional_seconds() {
        assert_eq!(srt_timecode(0.0), "00:00:00,000");
        assert_eq!(srt_timecode(1.2), "00:00:01,200");
        assert_eq!(srt_timecode(3661.5), "01:01:01,500");
        assert_eq!(vtt_timecode(1.2), "00:00:01.200");
    }

    #[test]
    fn rounds_to_the_nearest_millisecond() {
        assert_eq!(srt_timecode(0.0005), "00:00:00,001");
        assert_eq!(srt_timecode(0.0004), "00:00:00,000");
    }

    #[test]
    fn negative_times_clamp_to_zero() {
        assert_eq!(srt_timecode(-3.0), "00:00:00,000");
    }
}
