use std::fmt::Write;

use crate::domain::Segment;

use super::timecode::vtt_timecode;

const OPEN_END_SECONDS: f64 = 359_999.999;

/// Render segments as WebVTT: signature line, blank line, unnumbered
/// cues with period millisecond separator.
pub fn render_vtt(segments: &[Segment], fallback: Option<&str>) -> String {
    if segments.is_empty() && fallback.is_none() {
        return "WEBVTT\n".to_string();
    }

    let mut out = String::from("WEBVTT\n\n");

    if segments.is_empty() {
        if let Some(text) = fallback {
            let _ = write!(
                out,
                "{} --> {}\n{}\n\n",
                vtt_timecode(0.0),
                vtt_timecode(OPEN_END_SECONDS),
                text
            );
        }
        return out;
    }

    for segment in segments {
        let _ = write!(
            out,
            "{} --> {}\n{}\n\n",
            vtt_timecode(segment.start),
            vtt_timecode(segment.end),
            segment.text
        );
    }
    out
}
