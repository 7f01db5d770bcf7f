mod pipeline;
mod transcription_service;
mod transcription_worker;

pub use pipeline::{PipelineError, PipelineOutput, PipelineRunner};
pub use transcription_service::{
    JobMessage, SchedulerPolicy, SubmitError, SubmitOutcome, TranscriptionService,
};
pub use transcription_worker::TranscriptionWorker;
