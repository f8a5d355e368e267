pub mod audio;
pub mod button;
pub mod config;
pub mod error;
pub mod session;

pub use audio::{
    AudioFrame, CaptureConfig, CaptureDevice, CaptureDeviceFactory, CaptureSource, ClockOutput,
    DecodedBuffer, PlaybackEnd, PlaybackHandle, PlaybackOutput,
};
pub use button::{ButtonAction, RecordButton};
pub use config::Config;
pub use error::{RecorderError, RecorderResult};
pub use session::{Callbacks, DecodeStatus, Recorder, RecorderState, SessionConfig, SessionStats};
