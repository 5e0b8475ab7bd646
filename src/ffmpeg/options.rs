use serde::{Deserialize, Serialize};

/// Per-call conversion settings. Fixed shape, no dynamic fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Raise the FFmpeg log level for this call.
    pub verbose: bool,
    /// Muxer name as registered in FFmpeg ("matroska", "wav", "mp4", ...).
    pub output_format: String,
    /// Encoder name used for every video stream.
    pub video_encoder: String,
    /// Encoder name used for every audio stream.
    pub audio_encoder: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            verbose: false,
            output_format: "matroska".to_string(),
            video_encoder: "libx264".to_string(),
            audio_encoder: "aac".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_matroska() {
        let opts = ConvertOptions::default();
        assert_eq!(opts.output_format, "matroska");
        assert!(!opts.verbose);
    }

    #[test]
    fn deserializes_with_missing_fields() {
        let opts: ConvertOptions = serde_json::from_str(r#"{"output_format":"wav"}"#).unwrap();
        assert_eq!(opts.output_format, "wav");
        assert_eq!(opts.video_encoder, "libx264");
    }
}
