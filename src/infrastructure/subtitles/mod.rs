mod fs_writer;
mod srt;
mod timecode;
mod vtt;

pub use fs_writer::FsSubtitleWriter;
pub use srt::render_srt;
pub use timecode::{srt_timecode, vtt_timecode};
pub use vtt::render_vtt;
