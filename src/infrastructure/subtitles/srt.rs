use std::fmt::Write;

use crate::domain::Segment;

use super::timecode::srt_timecode;

/// Stand-in upper bound for a cue with no real end time.
const OPEN_END_SECONDS: f64 = 359_999.999;

/// Render segments as SubRip: one-based consecutive cue numbers, comma
/// millisecond separator, blank line between cues. Empty input renders
/// the fallback text as a single open-ended cue, or nothing at all.
pub fn render_srt(segments: &[Segment], fallback: Option<&str>) -> String {
    let mut out = String::new();

    if segments.is_empty() {
        if let Some(text) = fallback {
            let _ = write!(
                out,
                "1\n{} --> {}\n{}\n\n",
                srt_timecode(0.0),
                srt_timecode(OPEN_END_SECONDS),
                text
            );
        }
        return out;
    }

    for (i, segment) in segments.iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            srt_timecode(segment.start),
            srt_timecode(segment.end),
            segment.text
        );
    }
    out
}
