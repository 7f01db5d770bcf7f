use skald::application::ports::SubtitleWriter;
use skald::domain::{JobId, Segment};
use skald::infrastructure::subtitles::{render_srt, render_vtt, FsSubtitleWriter};
use tempfile::TempDir;

fn segments() -> Vec<Segment> {
    vec![
        Segment::new(0.0, 1.2, "hello"),
        Segment::new(1.2, 2.4, "world"),
        Segment::new(61.5, 3661.007, "much later"),
    ]
}

/// Parse an SRT document back into segments; used to check the
/// round-trip law up to millisecond rounding.
fn parse_srt(content: &str) -> Vec<Segment> {
    content
        .split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .map(|block| {
            let mut lines = block.lines();
            lines.next().expect("cue index");
            let times = lines.next().expect("time range");
            let (start, end) = parse_time_range(times, ',');
            let text = lines.collect::<Vec<_>>().join("\n");
            Segment::new(start, end, text)
        })
        .collect()
}

fn parse_vtt(content: &str) -> Vec<Segment> {
    let body = content.strip_prefix("WEBVTT").unwrap_or(content).trim_start();
    body.split("\n\n")
        .filter(|block| !block.trim().is_empty())
        .map(|block| {
            let mut lines = block.lines();
            let times = lines.next().expect("time range");
            let (start, end) = parse_time_range(times, '.');
            let text = lines.collect::<Vec<_>>().join("\n");
            Segment::new(start, end, text)
        })
        .collect()
}

fn parse_time_range(line: &str, ms_sep: char) -> (f64, f64) {
    let mut parts = line.split(" --> ");
    (
        parse_timecode(parts.next().expect("start"), ms_sep),
        parse_timecode(parts.next().expect("end"), ms_sep),
    )
}

fn parse_timecode(tc: &str, ms_sep: char) -> f64 {
    let (hms, ms) = tc.rsplit_once(ms_sep).expect("millisecond separator");
    let fields: Vec<u64> = hms.split(':').map(|f| f.parse().unwrap()).collect();
    let seconds = fields[0] * 3600 + fields[1] * 60 + fields[2];
    seconds as f64 + ms.parse::<u64>().unwrap() as f64 / 1000.0
}

fn assert_round_trips(original: &[Segment], parsed: &[Segment]) {
    assert_eq!(original.len(), parsed.len());
    for (a, b) in original.iter().zip(parsed) {
        assert!((a.start - b.start).abs() < 0.001, "{} vs {}", a.start, b.start);
        assert!((a.end - b.end).abs() < 0.001, "{} vs {}", a.end, b.end);
        assert_eq!(a.text, b.text);
    }
}

#[test]
fn srt_renders_numbered_cues_with_comma_separator() {
    let rendered = render_srt(&segments()[..2], None);
    assert_eq!(
        rendered,
        "1\n00:00:00,000 --> 00:00:01,200\nhello\n\n\
         2\n00:00:01,200 --> 00:00:02,400\nworld\n\n"
    );
}

#[test]
fn vtt_starts_with_signature_and_uses_period_separator() {
    let rendered = render_vtt(&segments()[..2], None);
    assert_eq!(
        rendered,
        "WEBVTT\n\n\
         00:00:00.000 --> 00:00:01.200\nhello\n\n\
         00:00:01.200 --> 00:00:02.400\nworld\n\n"
    );
}

#[test]
fn srt_round_trips_up_to_millisecond_rounding() {
    let original = segments();
    let parsed = parse_srt(&render_srt(&original, None));
    assert_round_trips(&original, &parsed);
}

#[test]
fn vtt_round_trips_up_to_millisecond_rounding() {
    let original = segments();
    let parsed = parse_vtt(&render_vtt(&original, None));
    assert_round_trips(&original, &parsed);
}

#[test]
fn empty_segments_with_fallback_render_one_open_ended_cue() {
    let srt = render_srt(&[], Some("no speech detected"));
    assert!(srt.starts_with("1\n00:00:00,000 --> "));
    assert!(srt.contains("no speech detected"));

    let vtt = render_vtt(&[], Some("no speech detected"));
    assert!(vtt.starts_with("WEBVTT\n\n00:00:00.000 --> "));
    assert!(vtt.contains("no speech detected"));
}

#[test]
fn empty_segments_without_fallback_render_signature_only() {
    assert_eq!(render_srt(&[], None), "");
    assert_eq!(render_vtt(&[], None), "WEBVTT\n");
}

#[tokio::test]
async fn writer_produces_job_named_files() {
    let dir = TempDir::new().unwrap();
    let writer = FsSubtitleWriter::new(dir.path());
    let id = JobId::new();

    let srt = writer.write_srt(id, &segments()).await.unwrap();
    let vtt = writer.write_vtt(id, &segments()).await.unwrap();

    assert_eq!(srt, dir.path().join(format!("{}.srt", id)));
    assert_eq!(vtt, dir.path().join(format!("{}.vtt", id)));
    assert!(srt.is_file());
    assert!(vtt.is_file());
}

#[tokio::test]
async fn rewriting_identical_segments_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let writer = FsSubtitleWriter::new(dir.path());
    let id = JobId::new();

    let path = writer.write_srt(id, &segments()).await.unwrap();
    let first = tokio::fs::read(&path).await.unwrap();
    writer.write_srt(id, &segments()).await.unwrap();
    let second = tokio::fs::read(&path).await.unwrap();

    assert_eq!(first, second);
}
