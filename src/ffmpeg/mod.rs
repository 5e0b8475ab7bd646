pub mod error;
pub mod options;
pub mod registry;
pub mod transcoder;
pub mod wrapper;

pub use error::ConvertError;
pub use options::ConvertOptions;
pub use wrapper::{ConvertSession, FFmpegConverter};
