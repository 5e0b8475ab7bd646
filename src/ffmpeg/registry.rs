//! Read-only snapshots of the FFmpeg registries: encoders, muxers, codec
//! descriptors and per-encoder private options. The registries are static
//! tables inside libavcodec/libavformat, so every query copies the data out
//! once and hands back owned values; nothing here touches codec state.

use std::ffi::{CStr, CString};
use std::os::raw::c_void;
use std::ptr;

use ffmpeg_the_third::ffi;
use serde::{Deserialize, Serialize};

/// One registered encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderInfo {
    pub name: String,
    pub long_name: String,
    pub codec_id: i32,
    pub media_kind: String,
    pub capabilities: i32,
}

/// One registered muxer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuxerInfo {
    pub name: String,
    pub long_name: String,
    pub mime_type: String,
    pub extensions: String,
    pub audio_codec_id: i32,
    pub video_codec_id: i32,
    pub flags: i32,
}

/// One codec descriptor (the codec-id level view, independent of which
/// encoder/decoder implementations are compiled in).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodecInfo {
    pub codec_id: i32,
    pub media_kind: String,
    pub name: String,
    pub long_name: String,
    pub props: i32,
    pub intra_only: bool,
    pub lossy: bool,
    pub lossless: bool,
}

/// Default value of an encoder option, tagged by the option's declared type
/// rather than inferred from which union member happens to be non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OptionDefault {
    Int(i64),
    Float(f64),
    Str(String),
    Rational { num: i32, den: i32 },
}

/// One private option of an encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionInfo {
    pub name: String,
    pub help: Option<String>,
    pub unit: Option<String>,
    pub value_type: i32,
    pub default: Option<OptionDefault>,
    pub min: f64,
    pub max: f64,
    pub flags: i32,
}

fn opt_string(ptr: *const std::os::raw::c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { Some(CStr::from_ptr(ptr).to_string_lossy().into_owned()) }
}

fn string_or_empty(ptr: *const std::os::raw::c_char) -> String {
    opt_string(ptr).unwrap_or_default()
}

fn media_kind(kind: ffi::AVMediaType) -> &'static str {
    match kind {
        ffi::AVMediaType::AVMEDIA_TYPE_VIDEO => "video",
        ffi::AVMediaType::AVMEDIA_TYPE_AUDIO => "audio",
        ffi::AVMediaType::AVMEDIA_TYPE_DATA => "data",
        ffi::AVMediaType::AVMEDIA_TYPE_SUBTITLE => "subtitle",
        ffi::AVMediaType::AVMEDIA_TYPE_ATTACHMENT => "attachment",
        _ => "unknown",
    }
}

/// Every codec implementation that can encode.
pub fn list_encoders() -> Vec<EncoderInfo> {
    let mut encoders = Vec::new();
    let mut opaque: *mut c_void = ptr::null_mut();
    unsafe {
        loop {
            let codec = ffi::av_codec_iterate(&mut opaque);
            if codec.is_null() {
                break;
            }
            if ffi::av_codec_is_encoder(codec) == 0 {
                continue;
            }
            encoders.push(EncoderInfo {
                name: string_or_empty((*codec).name),
                long_name: string_or_empty((*codec).long_name),
                codec_id: (*codec).id as i32,
                media_kind: media_kind((*codec).type_).to_string(),
                capabilities: (*codec).capabilities,
            });
        }
    }
    encoders
}

fn muxer_info(format: *const ffi::AVOutputFormat) -> MuxerInfo {
    unsafe {
        MuxerInfo {
            name: string_or_empty((*format).name),
            long_name: string_or_empty((*format).long_name),
            mime_type: string_or_empty((*format).mime_type),
            extensions: string_or_empty((*format).extensions),
            audio_codec_id: (*format).audio_codec as i32,
            video_codec_id: (*format).video_codec as i32,
            flags: (*format).flags,
        }
    }
}

/// Every registered output container format.
pub fn list_muxers() -> Vec<MuxerInfo> {
    let mut muxers = Vec::new();
    let mut opaque: *mut c_void = ptr::null_mut();
    unsafe {
        loop {
            let format = ffi::av_muxer_iterate(&mut opaque);
            if format.is_null() {
                break;
            }
            muxers.push(muxer_info(format));
        }
    }
    muxers
}

/// The muxer FFmpeg would select for a format name, if any.
pub fn find_muxer(name: &str) -> Option<MuxerInfo> {
    let name = CString::new(name).ok()?;
    let format = unsafe { ffi::av_guess_format(name.as_ptr(), ptr::null(), ptr::null()) };
    if format.is_null() {
        None
    } else {
        Some(muxer_info(format))
    }
}

/// Every codec descriptor known to the library.
pub fn list_codecs() -> Vec<CodecInfo> {
    let mut codecs = Vec::new();
    let mut prev: *const ffi::AVCodecDescriptor = ptr::null();
    unsafe {
        loop {
            let desc = ffi::avcodec_descriptor_next(prev);
            if desc.is_null() {
                break;
            }
            prev = desc;
            let props = (*desc).props;
            codecs.push(CodecInfo {
                codec_id: (*desc).id as i32,
                media_kind: media_kind((*desc).type_).to_string(),
                name: string_or_empty((*desc).name),
                long_name: string_or_empty((*desc).long_name),
                props,
                intra_only: props & ffi::AV_CODEC_PROP_INTRA_ONLY as i32 != 0,
                lossy: props & ffi::AV_CODEC_PROP_LOSSY as i32 != 0,
                lossless: props & ffi::AV_CODEC_PROP_LOSSLESS as i32 != 0,
            });
        }
    }
    codecs
}

unsafe fn option_default(opt: *const ffi::AVOption) -> Option<OptionDefault> {
    use ffi::AVOptionType::*;
    match (*opt).type_ {
        AV_OPT_TYPE_FLAGS | AV_OPT_TYPE_INT | AV_OPT_TYPE_INT64 | AV_OPT_TYPE_UINT64
        | AV_OPT_TYPE_BOOL | AV_OPT_TYPE_DURATION | AV_OPT_TYPE_PIXEL_FMT
        | AV_OPT_TYPE_SAMPLE_FMT => Some(OptionDefault::Int((*opt).default_val.i64)),
        AV_OPT_TYPE_DOUBLE | AV_OPT_TYPE_FLOAT => Some(OptionDefault::Float((*opt).default_val.dbl)),
        AV_OPT_TYPE_RATIONAL | AV_OPT_TYPE_VIDEO_RATE => {
            let q = (*opt).default_val.q;
            Some(OptionDefault::Rational {
                num: q.num,
                den: q.den,
            })
        }
        AV_OPT_TYPE_STRING | AV_OPT_TYPE_COLOR | AV_OPT_TYPE_IMAGE_SIZE | AV_OPT_TYPE_DICT => {
            opt_string((*opt).default_val.str).map(OptionDefault::Str)
        }
        _ => None,
    }
}

/// The private options of the first registered encoder for `codec_id`.
/// Empty when no encoder exists for the id or the encoder declares no
/// option table. Constant entries (named values of another option) are
/// skipped, as in the upstream option walk.
pub fn list_codec_options(codec_id: i32) -> Vec<OptionInfo> {
    let mut options = Vec::new();
    let mut opaque: *mut c_void = ptr::null_mut();
    unsafe {
        let mut encoder: *const ffi::AVCodec = ptr::null();
        loop {
            let codec = ffi::av_codec_iterate(&mut opaque);
            if codec.is_null() {
                break;
            }
            if ffi::av_codec_is_encoder(codec) != 0 && (*codec).id as i32 == codec_id {
                encoder = codec;
                break;
            }
        }
        if encoder.is_null() || (*encoder).priv_class.is_null() {
            return options;
        }

        let class = (*encoder).priv_class;
        let mut opt: *const ffi::AVOption = ptr::null();
        loop {
            opt = ffi::av_opt_next(&class as *const _ as *const c_void, opt);
            if opt.is_null() {
                break;
            }
            if (*opt).type_ == ffi::AVOptionType::AV_OPT_TYPE_CONST {
                continue;
            }
            options.push(OptionInfo {
                name: string_or_empty((*opt).name),
                help: opt_string((*opt).help),
                unit: opt_string((*opt).unit),
                value_type: (*opt).type_ as i32,
                default: option_default(opt),
                min: (*opt).min,
                max: (*opt).max,
                flags: (*opt).flags,
            });
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoders_include_pcm() {
        let encoders = list_encoders();
        assert!(!encoders.is_empty());
        let pcm = encoders
            .iter()
            .find(|e| e.name == "pcm_s16le")
            .expect("pcm_s16le encoder missing");
        assert_eq!(pcm.media_kind, "audio");
    }

    #[test]
    fn muxers_include_wav() {
        let muxers = list_muxers();
        assert!(muxers.iter().any(|m| m.name == "wav"));
    }

    #[test]
    fn muxer_lookup_by_name() {
        let wav = find_muxer("wav").expect("wav muxer missing");
        assert_eq!(wav.name, "wav");
        assert!(find_muxer("definitely-not-a-muxer").is_none());
        assert!(find_muxer("name\0with-nul").is_none());
    }

    #[test]
    fn descriptors_include_h264() {
        let codecs = list_codecs();
        let h264 = codecs
            .iter()
            .find(|c| c.name == "h264")
            .expect("h264 descriptor missing");
        assert_eq!(h264.media_kind, "video");
        assert!(h264.lossy);
    }

    #[test]
    fn encoder_options_skip_constants() {
        let flac = list_encoders()
            .into_iter()
            .find(|e| e.name == "flac")
            .expect("flac encoder missing");
        let options = list_codec_options(flac.codec_id);
        assert!(!options.is_empty());
        let const_type = ffi::AVOptionType::AV_OPT_TYPE_CONST as i32;
        assert!(options.iter().all(|o| o.value_type != const_type));
        assert!(options.iter().all(|o| !o.name.is_empty()));
    }

    #[test]
    fn options_without_encoder_are_empty() {
        assert!(list_codec_options(-1).is_empty());
    }

    #[test]
    fn option_defaults_serialize_tagged() {
        let json = serde_json::to_string(&OptionDefault::Int(0)).unwrap();
        assert_eq!(json, r#"{"kind":"int","value":0}"#);
        let json = serde_json::to_string(&OptionDefault::Rational { num: 0, den: 1 }).unwrap();
        assert!(json.contains(r#""kind":"rational""#));
    }
}
