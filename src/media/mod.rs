//! External media tooling behind injectable interfaces.

mod probe;
mod process;
mod tolerance;
mod transcode;

pub use probe::{FfprobeProbe, MediaProbe};
pub use process::{ProcessOutput, run_bounded};
pub use tolerance::{
    check_duration, check_frame_count, check_max_duration, tolerance_seconds, validate_duration,
    validate_frame_count,
};
pub use transcode::{
    FfmpegTranscoder, MediaTranscoder, absolute_paths, bind_args, center_voice_args, concat_args,
    concat_list_contents, mix_args, mix_filter,
};
