use std::fs;
use std::path::PathBuf;

use ffmpeg_the_third as ffmpeg;
use tempfile::TempDir;

use super::error::ConvertError;
use super::options::ConvertOptions;
use super::registry::{self, CodecInfo, EncoderInfo, MuxerInfo, OptionInfo};
use super::transcoder;

/// Process-wide entry point: initializes the FFmpeg libraries once and hands
/// out conversions and registry snapshots.
#[derive(Clone, Debug)]
pub struct FFmpegConverter;

impl FFmpegConverter {
    pub fn new() -> anyhow::Result<Self> {
        tracing::debug!("initializing ffmpeg");
        ffmpeg::init()?;
        tracing::debug!("ffmpeg initialized");
        Ok(FFmpegConverter {})
    }

    /// One-shot conversion through a private session; returns the produced
    /// container bytes.
    #[tracing::instrument(skip(self, data, opts))]
    pub fn convert(&self, data: &[u8], opts: &ConvertOptions) -> Result<Vec<u8>, ConvertError> {
        let mut session = ConvertSession::new()?;
        session.convert(data, opts)?;
        Ok(session.take_result().unwrap_or_default())
    }

    pub fn list_encoders(&self) -> Vec<EncoderInfo> {
        registry::list_encoders()
    }

    pub fn list_muxers(&self) -> Vec<MuxerInfo> {
        registry::list_muxers()
    }

    pub fn list_codecs(&self) -> Vec<CodecInfo> {
        registry::list_codecs()
    }

    pub fn list_codec_options(&self, codec_id: i32) -> Vec<OptionInfo> {
        registry::list_codec_options(codec_id)
    }
}

/// Working state of one conversion call: a private staging directory holding
/// the fixed `input`/`output` file pair, and the result buffer of the most
/// recent conversion. Sessions share nothing, so any number of calls may run
/// concurrently with one session each; the staging directory is removed when
/// the session drops.
#[derive(Debug)]
pub struct ConvertSession {
    staging: TempDir,
    result: Option<Vec<u8>>,
}

impl ConvertSession {
    pub fn new() -> Result<Self, ConvertError> {
        let staging = TempDir::new()?;
        tracing::debug!(dir = ?staging.path(), "new convert session");
        Ok(ConvertSession {
            staging,
            result: None,
        })
    }

    fn input_path(&self) -> PathBuf {
        self.staging.path().join("input")
    }

    fn output_path(&self) -> PathBuf {
        self.staging.path().join("output")
    }

    /// Stages the input bytes, runs the transcode pipeline and returns a
    /// view of the produced container bytes. The buffer stays owned by the
    /// session until `take_result` or `free_result`.
    #[tracing::instrument(skip(self, data, opts))]
    pub fn convert(&mut self, data: &[u8], opts: &ConvertOptions) -> Result<&[u8], ConvertError> {
        self.result = None;
        set_log_level(opts.verbose);

        let input = self.input_path();
        let output = self.output_path();
        fs::write(&input, data)?;

        transcoder::transcode(&input, &output, opts)?;

        let bytes = fs::read(&output)?;
        tracing::debug!(len = bytes.len(), "conversion produced output");
        Ok(self.result.insert(bytes))
    }

    /// The most recent result, if one is held.
    pub fn result(&self) -> Option<&[u8]> {
        self.result.as_deref()
    }

    /// Takes ownership of the most recent result.
    pub fn take_result(&mut self) -> Option<Vec<u8>> {
        self.result.take()
    }

    /// Releases the most recent result buffer. No-op when there is none.
    pub fn free_result(&mut self) {
        self.result = None;
    }
}

fn set_log_level(verbose: bool) {
    use ffmpeg::util::log;
    if verbose {
        log::set_level(log::Level::Info);
    } else {
        log::set_level(log::Level::Error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_result_on_an_empty_session_is_a_noop() {
        let mut session = ConvertSession::new().unwrap();
        session.free_result();
        assert!(session.result().is_none());
        assert!(session.take_result().is_none());
    }

    #[test]
    fn staging_files_live_inside_the_session_directory() {
        let session = ConvertSession::new().unwrap();
        assert!(session.input_path().starts_with(session.staging.path()));
        assert!(session.output_path().starts_with(session.staging.path()));
    }
}
