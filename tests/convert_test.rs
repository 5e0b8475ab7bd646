use ffmpeg_the_third as ffmpeg;

use video_convert_rs::ffmpeg::{ConvertError, ConvertOptions, ConvertSession, FFmpegConverter};

/// Minimal mono 16-bit PCM WAV with a 440 Hz tone.
fn pcm_wav(rate: u32, seconds: f32) -> Vec<u8> {
    let sample_count = (rate as f32 * seconds) as usize;
    let mut samples = Vec::with_capacity(sample_count * 2);
    for n in 0..sample_count {
        let t = n as f32 / rate as f32;
        let value = (f32::sin(2.0 * std::f32::consts::PI * 440.0 * t) * 12000.0) as i16;
        samples.extend_from_slice(&value.to_le_bytes());
    }

    let data_len = samples.len() as u32;
    let mut wav = Vec::with_capacity(44 + samples.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&rate.to_le_bytes());
    wav.extend_from_slice(&(rate * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(&samples);
    wav
}

fn audio_opts(format: &str, encoder: &str) -> ConvertOptions {
    ConvertOptions {
        verbose: false,
        output_format: format.to_string(),
        video_encoder: "mpeg4".to_string(),
        audio_encoder: encoder.to_string(),
    }
}

/// Writes produced bytes to disk and demuxes them back.
fn demux(bytes: &[u8]) -> (tempfile::TempDir, ffmpeg::format::context::Input) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out");
    std::fs::write(&path, bytes).unwrap();
    let ictx = ffmpeg::format::input(&path).unwrap();
    (dir, ictx)
}

#[test]
fn wav_to_wav_pcm_keeps_the_stream_shape() {
    let _ = FFmpegConverter::new().unwrap();

    let mut session = ConvertSession::new().unwrap();
    let out = session
        .convert(&pcm_wav(8000, 0.25), &audio_opts("wav", "pcm_s16le"))
        .unwrap()
        .to_vec();
    assert!(!out.is_empty());

    let (_dir, ictx) = demux(&out);
    assert_eq!(ictx.streams().count(), 1);

    let stream = ictx.streams().next().unwrap();
    assert_eq!(stream.parameters().medium(), ffmpeg::media::Type::Audio);
    assert_eq!(stream.parameters().id(), ffmpeg::codec::Id::PCM_S16LE);

    let context =
        ffmpeg::codec::context::Context::from_parameters(stream.parameters()).unwrap();
    let decoder = context.decoder().audio().unwrap();
    assert_eq!(decoder.rate(), 8000);
    assert_eq!(
        decoder.format(),
        ffmpeg::format::Sample::I16(ffmpeg::format::sample::Type::Packed)
    );
}

#[test]
fn transcoded_timestamps_are_non_decreasing() {
    let _ = FFmpegConverter::new().unwrap();

    let mut session = ConvertSession::new().unwrap();
    let out = session
        .convert(&pcm_wav(8000, 0.5), &audio_opts("matroska", "flac"))
        .unwrap()
        .to_vec();

    let (_dir, mut ictx) = demux(&out);
    assert_eq!(ictx.streams().count(), 1);
    assert_eq!(
        ictx.streams().next().unwrap().parameters().id(),
        ffmpeg::codec::Id::FLAC
    );

    let mut last = i64::MIN;
    let mut seen = 0;
    for (stream, packet) in ictx.packets().filter_map(Result::ok) {
        assert_eq!(stream.index(), 0);
        if let Some(pts) = packet.pts() {
            assert!(pts >= last, "pts went backwards: {} after {}", pts, last);
            last = pts;
            seen += 1;
        }
    }
    assert!(seen > 0);
}

#[test]
fn unknown_muxer_fails_before_any_output_exists() {
    let _ = FFmpegConverter::new().unwrap();

    let mut session = ConvertSession::new().unwrap();
    let err = session
        .convert(
            &pcm_wav(8000, 0.1),
            &audio_opts("definitely-not-a-container", "pcm_s16le"),
        )
        .unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedFormat(_)));
    assert!(session.result().is_none());

    session.free_result();
    assert!(session.result().is_none());
}

#[test]
fn unknown_encoder_is_reported_by_name() {
    let _ = FFmpegConverter::new().unwrap();

    let mut session = ConvertSession::new().unwrap();
    let err = session
        .convert(
            &pcm_wav(8000, 0.1),
            &audio_opts("wav", "no-such-encoder"),
        )
        .unwrap_err();
    match err {
        ConvertError::EncoderNotFound(name) => assert_eq!(name, "no-such-encoder"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreadable_input_fails_the_same_way_twice() {
    let _ = FFmpegConverter::new().unwrap();

    // No 0xff bytes, so nothing here resembles a frame sync pattern.
    let junk: Vec<u8> = (0..512u32).map(|i| (i * 37 % 251) as u8).collect();
    let opts = audio_opts("wav", "pcm_s16le");

    let mut session = ConvertSession::new().unwrap();
    let first = session.convert(&junk, &opts).unwrap_err();
    assert!(matches!(first, ConvertError::Open(_)), "got {first:?}");
    assert!(session.result().is_none());

    let mut session = ConvertSession::new().unwrap();
    let second = session.convert(&junk, &opts).unwrap_err();
    assert!(matches!(second, ConvertError::Open(_)), "got {second:?}");
    assert!(session.result().is_none());
}

#[test]
fn converter_returns_owned_bytes() {
    let converter = FFmpegConverter::new().unwrap();
    let out = converter
        .convert(&pcm_wav(16000, 0.1), &audio_opts("wav", "pcm_s16le"))
        .unwrap();
    assert!(!out.is_empty());
}
