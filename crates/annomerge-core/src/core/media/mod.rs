//! Media Inputs
//!
//! Read-only handles for uploaded files and the video metadata probe.

mod file;
mod probe;

pub use file::{FileSource, InputFile};
pub use probe::{parse_probe_output, FfprobeVideoProbe, VideoInfo, VideoProbe};
