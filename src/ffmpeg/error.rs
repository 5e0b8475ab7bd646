use ffmpeg_the_third as ffmpeg;

use thiserror::Error;

/// Everything that can abort a conversion. Any variant is fatal for the
/// whole call; partial output is never kept.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot open input container: {0}")]
    Open(#[source] ffmpeg::Error),
    #[error("no streams found in input")]
    Probe,
    #[error("no decoder for codec {0:?} (stream {1})")]
    DecoderNotFound(ffmpeg::codec::Id, usize),
    #[error("cannot open decoder for stream {stream}: {source}")]
    DecoderOpen {
        stream: usize,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("cannot allocate codec context for stream {stream}: {source}")]
    ContextAlloc {
        stream: usize,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("unknown encoder '{0}'")]
    EncoderNotFound(String),
    #[error("cannot open encoder '{name}': {source}")]
    EncoderOpen {
        name: String,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("unknown container format '{0}'")]
    UnsupportedFormat(String),
    #[error("stream {0} has an unknown media type")]
    UnknownStreamType(usize),
    #[error("decode failed on stream {stream}: {source}")]
    Decode {
        stream: usize,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("encode failed on stream {stream}: {source}")]
    Encode {
        stream: usize,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("filter graph for stream {stream}: {source}")]
    FilterGraph {
        stream: usize,
        #[source]
        source: ffmpeg::Error,
    },
    #[error("cannot write to output container: {0}")]
    Mux(#[source] ffmpeg::Error),
    #[error("staging i/o: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// True when the failure is caused by the request (bad input bytes or
    /// bad option values) rather than by the service itself.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ConvertError::Open(_)
                | ConvertError::Probe
                | ConvertError::DecoderNotFound(..)
                | ConvertError::EncoderNotFound(_)
                | ConvertError::UnsupportedFormat(_)
                | ConvertError::UnknownStreamType(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_are_flagged_invalid() {
        assert!(ConvertError::UnsupportedFormat("nope".into()).is_invalid_input());
        assert!(ConvertError::EncoderNotFound("nope".into()).is_invalid_input());
        assert!(ConvertError::Probe.is_invalid_input());
        assert!(!ConvertError::Mux(ffmpeg_the_third::Error::InvalidData).is_invalid_input());
    }

    #[test]
    fn messages_name_the_offending_stream() {
        let err = ConvertError::UnknownStreamType(3);
        assert_eq!(err.to_string(), "stream 3 has an unknown media type");
    }
}
