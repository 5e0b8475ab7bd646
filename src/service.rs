use crate::{
    ffmpeg::{
        registry, wrapper::FFmpegConverter, ConvertError, ConvertOptions, ConvertSession,
    },
    otel::make_span,
    proto_video_convert::{
        self, video_converter_server::VideoConverter, CodecList, CodecOptionsRequest,
        ConvertInput, ConvertReply, EncoderList, ListRequest, MuxerList, OptionList,
    },
};
use thiserror::Error;
use tonic::{Request, Response, Status};
use tracing::instrument;

#[derive(Debug)]
pub struct Service {
    converter: FFmpegConverter,
}

impl Service {
    pub fn new(converter: FFmpegConverter) -> Self {
        tracing::info!("new service");
        Self { converter }
    }

    #[instrument(skip(request))]
    async fn convert(&self, request: &ConvertInput) -> Result<ConvertReply, SrvError> {
        tracing::info!(len = request.data.len(), "got a request");

        let opts = convert_options(request.options.as_ref())?;
        let data = request.data.clone();

        let span = tracing::info_span!("spawn_blocking_convert");
        let converted = tokio::task::spawn_blocking(move || {
            let _enter = span.enter();
            let mut session = ConvertSession::new()?;
            session.convert(&data, &opts)?;
            Ok::<Vec<u8>, ConvertError>(session.take_result().unwrap_or_default())
        })
        .await
        .map_err(|e| SrvError::Other(anyhow::anyhow!("convert task: {e}")))??;

        Ok(ConvertReply { data: converted })
    }
}

fn convert_options(
    options: Option<&proto_video_convert::ConvertOptions>,
) -> Result<ConvertOptions, SrvError> {
    let options =
        options.ok_or_else(|| SrvError::InvalidArgument("options missing".to_string()))?;
    if options.output_format.is_empty() {
        return Err(SrvError::InvalidArgument(
            "output format missing".to_string(),
        ));
    }
    Ok(ConvertOptions {
        verbose: options.verbose,
        output_format: options.output_format.clone(),
        video_encoder: options.video_encoder.clone(),
        audio_encoder: options.audio_encoder.clone(),
    })
}

#[tonic::async_trait]
impl VideoConverter for Service {
    async fn convert(
        &self,
        request: Request<ConvertInput>,
    ) -> Result<Response<ConvertReply>, Status> {
        tracing::trace!(metadata = ?request.metadata(), "received request");

        let span = make_span(request.metadata().as_ref());
        let _enter = span.enter();

        let req = request.get_ref();
        tracing::info!(
            len = req.data.len(),
            format = req.options.as_ref().map(|o| o.output_format.as_str()),
            "input"
        );
        match self.convert(req).await {
            Ok(r) => Ok(Response::new(r)),
            Err(e) => {
                tracing::error!(error = ?e, "convert error");
                Err(e.into())
            }
        }
    }

    async fn list_encoders(
        &self,
        request: Request<ListRequest>,
    ) -> Result<Response<EncoderList>, Status> {
        let span = make_span(request.metadata().as_ref());
        let _enter = span.enter();

        let encoders = self
            .converter
            .list_encoders()
            .into_iter()
            .map(encoder_info)
            .collect();
        Ok(Response::new(EncoderList { encoders }))
    }

    async fn list_muxers(
        &self,
        request: Request<ListRequest>,
    ) -> Result<Response<MuxerList>, Status> {
        let span = make_span(request.metadata().as_ref());
        let _enter = span.enter();

        let muxers = self
            .converter
            .list_muxers()
            .into_iter()
            .map(muxer_info)
            .collect();
        Ok(Response::new(MuxerList { muxers }))
    }

    async fn list_codecs(
        &self,
        request: Request<ListRequest>,
    ) -> Result<Response<CodecList>, Status> {
        let span = make_span(request.metadata().as_ref());
        let _enter = span.enter();

        let codecs = self
            .converter
            .list_codecs()
            .into_iter()
            .map(codec_info)
            .collect();
        Ok(Response::new(CodecList { codecs }))
    }

    async fn list_codec_options(
        &self,
        request: Request<CodecOptionsRequest>,
    ) -> Result<Response<OptionList>, Status> {
        let span = make_span(request.metadata().as_ref());
        let _enter = span.enter();

        let codec_id = request.get_ref().codec_id;
        tracing::debug!(codec_id, "listing codec options");
        let options = self
            .converter
            .list_codec_options(codec_id)
            .into_iter()
            .map(option_info)
            .collect();
        Ok(Response::new(OptionList { options }))
    }
}

fn encoder_info(e: registry::EncoderInfo) -> proto_video_convert::EncoderInfo {
    proto_video_convert::EncoderInfo {
        name: e.name,
        long_name: e.long_name,
        codec_id: e.codec_id,
        media_kind: e.media_kind,
        capabilities: e.capabilities,
    }
}

fn muxer_info(m: registry::MuxerInfo) -> proto_video_convert::MuxerInfo {
    proto_video_convert::MuxerInfo {
        name: m.name,
        long_name: m.long_name,
        mime_type: m.mime_type,
        extensions: m.extensions,
        audio_codec_id: m.audio_codec_id,
        video_codec_id: m.video_codec_id,
        flags: m.flags,
    }
}

fn codec_info(c: registry::CodecInfo) -> proto_video_convert::CodecInfo {
    proto_video_convert::CodecInfo {
        codec_id: c.codec_id,
        media_kind: c.media_kind,
        name: c.name,
        long_name: c.long_name,
        props: c.props,
        intra_only: c.intra_only,
        lossy: c.lossy,
        lossless: c.lossless,
    }
}

fn option_info(o: registry::OptionInfo) -> proto_video_convert::OptionInfo {
    use proto_video_convert::option_info::Default as ProtoDefault;

    let default = o.default.map(|d| match d {
        registry::OptionDefault::Int(v) => ProtoDefault::IntValue(v),
        registry::OptionDefault::Float(v) => ProtoDefault::FloatValue(v),
        registry::OptionDefault::Str(v) => ProtoDefault::StrValue(v),
        registry::OptionDefault::Rational { num, den } => {
            ProtoDefault::RationalValue(proto_video_convert::Rational { num, den })
        }
    });

    proto_video_convert::OptionInfo {
        name: o.name,
        help: o.help.unwrap_or_default(),
        unit: o.unit.unwrap_or_default(),
        value_type: o.value_type,
        min: o.min,
        max: o.max,
        flags: o.flags,
        default,
    }
}

#[derive(Debug, Error)]
pub enum SrvError {
    #[error("{0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<SrvError> for Status {
    fn from(err: SrvError) -> Self {
        match err {
            SrvError::InvalidArgument(msg) => Status::invalid_argument(msg),
            SrvError::Convert(e) if e.is_invalid_input() => {
                Status::invalid_argument(e.to_string())
            }
            SrvError::Convert(e) => Status::internal(format!("convert: {}", e)),
            SrvError::Other(e) => Status::internal(format!("error: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_options_are_rejected() {
        assert!(matches!(
            convert_options(None),
            Err(SrvError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_output_format_is_rejected() {
        let options = proto_video_convert::ConvertOptions {
            verbose: false,
            output_format: String::new(),
            video_encoder: "libx264".to_string(),
            audio_encoder: "aac".to_string(),
        };
        assert!(matches!(
            convert_options(Some(&options)),
            Err(SrvError::InvalidArgument(_))
        ));
    }

    #[test]
    fn options_map_field_for_field() {
        let options = proto_video_convert::ConvertOptions {
            verbose: true,
            output_format: "wav".to_string(),
            video_encoder: "mpeg4".to_string(),
            audio_encoder: "pcm_s16le".to_string(),
        };
        let opts = convert_options(Some(&options)).unwrap();
        assert!(opts.verbose);
        assert_eq!(opts.output_format, "wav");
        assert_eq!(opts.audio_encoder, "pcm_s16le");
    }

    #[test]
    fn invalid_input_errors_map_to_invalid_argument() {
        let status = Status::from(SrvError::Convert(ConvertError::UnsupportedFormat(
            "nope".to_string(),
        )));
        assert_eq!(status.code(), tonic::Code::InvalidArgument);

        let status = Status::from(SrvError::Convert(ConvertError::Mux(
            ffmpeg_the_third::Error::InvalidData,
        )));
        assert_eq!(status.code(), tonic::Code::Internal);
    }

    #[test]
    fn tagged_defaults_survive_the_proto_mapping() {
        use proto_video_convert::option_info::Default as ProtoDefault;
        let info = option_info(registry::OptionInfo {
            name: "b".to_string(),
            help: None,
            unit: None,
            value_type: 0,
            default: Some(registry::OptionDefault::Int(0)),
            min: 0.0,
            max: 10.0,
            flags: 0,
        });
        assert_eq!(info.default, Some(ProtoDefault::IntValue(0)));
    }
}
