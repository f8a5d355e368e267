pub mod backend;
pub mod decoder;
pub mod encoder;
pub mod file;
pub mod meter;
pub mod playback;
pub mod tone;

pub use backend::{AudioFrame, CaptureConfig, CaptureDevice, CaptureDeviceFactory, CaptureSource};
pub use decoder::{decode_recording, DecodedBuffer};
pub use encoder::{EncodedChunk, EncoderSink};
pub use file::{AudioFile, FileCapture};
pub use meter::{mean_abs_amplitude, Analyser};
pub use playback::{ClockHandle, ClockOutput, PlaybackEnd, PlaybackHandle, PlaybackOutput};
pub use tone::ToneCapture;
