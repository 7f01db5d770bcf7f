use serde::{Deserialize, Serialize};

/// A contiguous span of transcribed speech. Times are seconds with
/// millisecond precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

/// Clean up raw tool output into the canonical segment sequence:
/// empty-after-trim texts are dropped, inverted spans are swapped, and
/// the result is stably sorted by start time (tool emission order breaks
/// ties).
pub fn normalize_segments(raw: Vec<Segment>) -> Vec<Segment> {
    let mut segments: Vec<Segment> = raw
        .into_iter()
        .filter_map(|s| {
            let text = s.text.trim().to_string();
            if text.is_empty() {
                return None;
            }
            let (start, end) = if s.end < s.start {
                (s.end, s.start)
            } else {
                (s.start, s.end)
            };
            Some(Segment { start, end, text })
        })
        .collect();

    segments.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));
    segments
}

/// The full transcript: segment texts joined with single spaces, with
/// internal whitespace collapsed.
pub fn transcript_from_segments(segments: &[Segment]) -> String {
    segments
        .iter()
        .flat_map(|s| s.text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_texts_are_discarded() {
        let raw = vec![
            Segment::new(0.0, 1.0, "hello"),
            Segment::new(1.0, 2.0, "   "),
            Segment::new(2.0, 3.0, "world"),
        ];
        let segments = normalize_segments(raw);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "hello");
        assert_eq!(segments[1].text, "world");
    }

    #[test]
    fn inverted_spans_are_swapped() {
        let segments = normalize_segments(vec![Segment::new(2.5, 1.5, "x")]);
        assert_eq!(segments[0].start, 1.5);
        assert_eq!(segments[0].end, 2.5);
    }

    #[test]
    fn out_of_order_segments_sort_by_start_keeping_emission_order_on_ties() {
        let raw = vec![
            Segment::new(3.0, 4.0, "c"),
            Segment::new(1.0, 2.0, "a"),
            Segment::new(1.0, 2.5, "b"),
        ];
        let segments = normalize_segments(raw);
        let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn transcript_collapses_whitespace() {
        let segments = vec![
            Segment::new(0.0, 1.0, "  hello \n there "),
            Segment::new(1.0, 2.0, "world"),
        ];
        assert_eq!(transcript_from_segments(&segments), "hello there world");
    }

    #[test]
    fn transcript_of_no_segments_is_empty() {
        assert_eq!(transcript_from_segments(&[]), "");
    }
}
