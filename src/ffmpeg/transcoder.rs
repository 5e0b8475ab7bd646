use ffmpeg_the_third::{self as ffmpeg};

use std::path::Path;

use ffmpeg::codec::Parameters;
use ffmpeg::{codec, decoder, encoder, filter, format, frame, media, Packet, Rational};
use libc::EAGAIN;

use super::error::ConvertError;
use super::options::ConvertOptions;
use super::registry;

/// A decoder opened for one input stream, or the marker that the stream is
/// copied into the output without decoding.
enum InputStream {
    Video(decoder::Video),
    Audio(decoder::Audio),
    Remux,
}

/// Decoder/encoder pairing for one stream, before the filter graphs exist.
enum StreamCoder {
    Video {
        decoder: decoder::Video,
        encoder: encoder::Video,
    },
    Audio {
        decoder: decoder::Audio,
        encoder: encoder::Audio,
    },
    Remux,
}

/// Per-stream processing state. The vector of pipelines is index-aligned
/// with the input's stream order.
enum StreamPipeline {
    Video(VideoLane),
    Audio(AudioLane),
    Remux(RemuxLane),
}

struct VideoLane {
    index: usize,
    decoder: decoder::Video,
    encoder: encoder::Video,
    graph: filter::Graph,
    in_time_base: Rational,
    out_time_base: Rational,
}

struct AudioLane {
    index: usize,
    decoder: decoder::Audio,
    encoder: encoder::Audio,
    graph: filter::Graph,
    in_time_base: Rational,
    out_time_base: Rational,
}

struct RemuxLane {
    index: usize,
    in_time_base: Rational,
    out_time_base: Rational,
}

/// Receive-side results that mean "no more output right now" rather than a
/// real failure.
fn stage_done(err: &ffmpeg::Error) -> bool {
    matches!(
        err,
        ffmpeg::Error::Eof | ffmpeg::Error::Other { errno: EAGAIN }
    )
}

fn filter_in<'a>(graph: &'a mut filter::Graph) -> Result<filter::Context<'a>, ffmpeg::Error> {
    graph.get("in").ok_or(ffmpeg::Error::FilterNotFound)
}

fn filter_out<'a>(graph: &'a mut filter::Graph) -> Result<filter::Context<'a>, ffmpeg::Error> {
    graph.get("out").ok_or(ffmpeg::Error::FilterNotFound)
}

fn choose_pixel_format<I>(supported: Option<I>, decoded: format::Pixel) -> format::Pixel
where
    I: Iterator<Item = format::Pixel>,
{
    match supported {
        Some(formats) => {
            let formats: Vec<format::Pixel> = formats.collect();
            if formats.contains(&decoded) {
                decoded
            } else {
                formats.first().copied().unwrap_or(decoded)
            }
        }
        None => decoded,
    }
}

fn choose_sample_format<I>(supported: Option<I>, decoded: format::Sample) -> format::Sample
where
    I: Iterator<Item = format::Sample>,
{
    supported
        .and_then(|mut formats| formats.next())
        .unwrap_or(decoded)
}

/// Default layout mask for a channel count, in the hex form the abuffer
/// source expects.
fn default_channel_mask(channels: u64) -> u64 {
    match channels {
        1 => 0x4,
        2 => 0x3,
        n => (1u64 << n.min(63)) - 1,
    }
}

fn open_input(path: &Path) -> Result<format::context::Input, ConvertError> {
    let ictx = format::input(&path).map_err(ConvertError::Open)?;
    if ictx.streams().count() == 0 {
        return Err(ConvertError::Probe);
    }
    Ok(ictx)
}

fn open_decoders(ictx: &format::context::Input) -> Result<Vec<InputStream>, ConvertError> {
    let mut streams = Vec::new();
    for (index, stream) in ictx.streams().enumerate() {
        let codec_id = stream.parameters().id();
        if decoder::find(codec_id).is_none() {
            return Err(ConvertError::DecoderNotFound(codec_id, index));
        }
        let opened = match stream.parameters().medium() {
            media::Type::Video => {
                let context = codec::context::Context::from_parameters(stream.parameters())
                    .map_err(|e| ConvertError::ContextAlloc {
                        stream: index,
                        source: e,
                    })?;
                let decoder = context.decoder().video().map_err(|e| {
                    ConvertError::DecoderOpen {
                        stream: index,
                        source: e,
                    }
                })?;
                InputStream::Video(decoder)
            }
            media::Type::Audio => {
                let context = codec::context::Context::from_parameters(stream.parameters())
                    .map_err(|e| ConvertError::ContextAlloc {
                        stream: index,
                        source: e,
                    })?;
                let decoder = context.decoder().audio().map_err(|e| {
                    ConvertError::DecoderOpen {
                        stream: index,
                        source: e,
                    }
                })?;
                InputStream::Audio(decoder)
            }
            _ => InputStream::Remux,
        };
        streams.push(opened);
    }
    Ok(streams)
}

fn open_video_encoder(
    octx: &mut format::context::Output,
    decoder: &decoder::Video,
    name: &str,
    global_header: bool,
    index: usize,
) -> Result<encoder::Video, ConvertError> {
    let codec = encoder::find_by_name(name)
        .ok_or_else(|| ConvertError::EncoderNotFound(name.to_string()))?;
    let video = codec
        .video()
        .ok_or_else(|| ConvertError::EncoderNotFound(name.to_string()))?;

    let mut output = octx
        .add_stream(codec)
        .map_err(|e| ConvertError::ContextAlloc {
            stream: index,
            source: e,
        })?;

    let context = codec::context::Context::new_with_codec(codec);
    let mut encoder = context
        .encoder()
        .video()
        .map_err(|e| ConvertError::ContextAlloc {
            stream: index,
            source: e,
        })?;

    let frame_rate = match decoder.frame_rate() {
        Some(rate) if rate.numerator() > 0 => rate,
        _ => Rational::new(25, 1),
    };

    encoder.set_width(decoder.width());
    encoder.set_height(decoder.height());
    encoder.set_aspect_ratio(decoder.aspect_ratio());
    encoder.set_format(choose_pixel_format(video.formats(), decoder.format()));
    encoder.set_frame_rate(Some(frame_rate));
    encoder.set_time_base(frame_rate.invert());
    if global_header {
        encoder.set_flags(codec::flag::Flags::GLOBAL_HEADER);
    }

    let opened = encoder
        .open_as(codec)
        .map_err(|e| ConvertError::EncoderOpen {
            name: name.to_string(),
            source: e,
        })?;

    output.set_time_base(frame_rate.invert());
    output.set_parameters(Parameters::from(&opened));
    Ok(opened)
}

fn open_audio_encoder(
    octx: &mut format::context::Output,
    decoder: &decoder::Audio,
    name: &str,
    global_header: bool,
    index: usize,
) -> Result<encoder::Audio, ConvertError> {
    let codec = encoder::find_by_name(name)
        .ok_or_else(|| ConvertError::EncoderNotFound(name.to_string()))?;
    let audio = codec
        .audio()
        .ok_or_else(|| ConvertError::EncoderNotFound(name.to_string()))?;

    let mut output = octx
        .add_stream(codec)
        .map_err(|e| ConvertError::ContextAlloc {
            stream: index,
            source: e,
        })?;

    let context = codec::context::Context::new_with_codec(codec);
    let mut encoder = context
        .encoder()
        .audio()
        .map_err(|e| ConvertError::ContextAlloc {
            stream: index,
            source: e,
        })?;

    let channel_layout = audio
        .ch_layouts()
        .map(|layouts| layouts.best(decoder.ch_layout().channels()))
        .unwrap_or_else(|| decoder.ch_layout());

    encoder.set_rate(decoder.rate() as i32);
    encoder.set_ch_layout(channel_layout);
    encoder.set_format(choose_sample_format(audio.formats(), decoder.format()));
    encoder.set_time_base(Rational::new(1, decoder.rate() as i32));
    if global_header {
        encoder.set_flags(codec::flag::Flags::GLOBAL_HEADER);
    }

    let opened = encoder
        .open_as(codec)
        .map_err(|e| ConvertError::EncoderOpen {
            name: name.to_string(),
            source: e,
        })?;

    output.set_time_base(Rational::new(1, decoder.rate() as i32));
    output.set_parameters(Parameters::from(&opened));
    Ok(opened)
}

/// Creates the output container, one output stream per input stream, and
/// writes the container header. Audio/video streams get an opened encoder;
/// everything else has its parameters copied verbatim.
fn open_output(
    path: &Path,
    opts: &ConvertOptions,
    ictx: &format::context::Input,
    decoders: Vec<InputStream>,
) -> Result<(format::context::Output, Vec<StreamCoder>), ConvertError> {
    if registry::find_muxer(&opts.output_format).is_none() {
        return Err(ConvertError::UnsupportedFormat(opts.output_format.clone()));
    }
    let mut octx =
        format::output_as(&path, &opts.output_format).map_err(ConvertError::Mux)?;
    let global_header = octx
        .format()
        .flags()
        .contains(format::flag::Flags::GLOBAL_HEADER);

    let mut coders = Vec::with_capacity(decoders.len());
    for (index, (stream, opened)) in ictx.streams().zip(decoders).enumerate() {
        let coder = match opened {
            InputStream::Video(decoder) => {
                let encoder = open_video_encoder(
                    &mut octx,
                    &decoder,
                    &opts.video_encoder,
                    global_header,
                    index,
                )?;
                StreamCoder::Video { decoder, encoder }
            }
            InputStream::Audio(decoder) => {
                let encoder = open_audio_encoder(
                    &mut octx,
                    &decoder,
                    &opts.audio_encoder,
                    global_header,
                    index,
                )?;
                StreamCoder::Audio { decoder, encoder }
            }
            InputStream::Remux => {
                if stream.parameters().medium() == media::Type::Unknown {
                    return Err(ConvertError::UnknownStreamType(index));
                }
                let mut output = octx
                    .add_stream(encoder::find(codec::Id::None))
                    .map_err(|e| ConvertError::ContextAlloc {
                        stream: index,
                        source: e,
                    })?;
                output.set_parameters(stream.parameters());
                // Codec tags are container-specific; one copied from the
                // source container may be invalid in the target muxer.
                unsafe {
                    (*output.parameters().as_mut_ptr()).codec_tag = 0;
                }
                StreamCoder::Remux
            }
        };
        coders.push(coder);
    }

    octx.set_metadata(ictx.metadata().to_owned());
    octx.write_header().map_err(ConvertError::Mux)?;
    Ok((octx, coders))
}

fn video_filter_graph(
    decoder: &decoder::Video,
    time_base: Rational,
    encoder: &encoder::Video,
) -> Result<filter::Graph, ffmpeg::Error> {
    let mut graph = filter::Graph::new();

    let aspect = decoder.aspect_ratio();
    let aspect = if aspect.denominator() == 0 {
        Rational::new(0, 1)
    } else {
        aspect
    };
    let pix_fmt = decoder
        .format()
        .descriptor()
        .ok_or(ffmpeg::Error::InvalidData)?
        .name();

    let args = format!(
        "video_size={}x{}:pix_fmt={}:time_base={}:pixel_aspect={}",
        decoder.width(),
        decoder.height(),
        pix_fmt,
        time_base,
        aspect
    );

    graph.add(
        &filter::find("buffer").ok_or(ffmpeg::Error::FilterNotFound)?,
        "in",
        &args,
    )?;
    graph.add(
        &filter::find("buffersink").ok_or(ffmpeg::Error::FilterNotFound)?,
        "out",
        "",
    )?;

    filter_out(&mut graph)?.set_pixel_format(encoder.format());

    graph.output("in", 0)?.input("out", 0)?.parse("null")?;
    graph.validate()?;

    Ok(graph)
}

fn audio_filter_graph(
    decoder: &decoder::Audio,
    time_base: Rational,
    encoder: &encoder::Audio,
) -> Result<filter::Graph, ffmpeg::Error> {
    let mut graph = filter::Graph::new();

    let args = format!(
        "time_base={}:sample_rate={}:sample_fmt={}:channel_layout=0x{:x}",
        time_base,
        decoder.rate(),
        decoder.format().name(),
        default_channel_mask(decoder.ch_layout().channels() as u64)
    );

    graph.add(
        &filter::find("abuffer").ok_or(ffmpeg::Error::FilterNotFound)?,
        "in",
        &args,
    )?;
    graph.add(
        &filter::find("abuffersink").ok_or(ffmpeg::Error::FilterNotFound)?,
        "out",
        "",
    )?;

    {
        let mut out = filter_out(&mut graph)?;
        out.set_sample_format(encoder.format());
        out.set_ch_layout(encoder.ch_layout());
        out.set_sample_rate(encoder.rate());
    }

    graph.output("in", 0)?.input("out", 0)?.parse("anull")?;
    graph.validate()?;

    if let Some(codec) = encoder.codec() {
        if !codec
            .capabilities()
            .contains(codec::capabilities::Capabilities::VARIABLE_FRAME_SIZE)
        {
            filter_out(&mut graph)?
                .sink()
                .set_frame_size(encoder.frame_size());
        }
    }

    Ok(graph)
}

/// Builds one pass-through filter graph per transcoded stream, bridging the
/// decoder's frame format to the encoder's.
fn init_filters(
    ictx: &format::context::Input,
    octx: &format::context::Output,
    coders: Vec<StreamCoder>,
) -> Result<Vec<StreamPipeline>, ConvertError> {
    let mut pipelines = Vec::with_capacity(coders.len());
    for (index, ((ist, ost), coder)) in ictx
        .streams()
        .zip(octx.streams())
        .zip(coders)
        .enumerate()
    {
        let in_time_base = ist.time_base();
        let out_time_base = ost.time_base();
        let pipeline = match coder {
            StreamCoder::Video { decoder, encoder } => {
                let graph = video_filter_graph(&decoder, in_time_base, &encoder).map_err(|e| {
                    ConvertError::FilterGraph {
                        stream: index,
                        source: e,
                    }
                })?;
                StreamPipeline::Video(VideoLane {
                    index,
                    decoder,
                    encoder,
                    graph,
                    in_time_base,
                    out_time_base,
                })
            }
            StreamCoder::Audio { decoder, encoder } => {
                let graph = audio_filter_graph(&decoder, in_time_base, &encoder).map_err(|e| {
                    ConvertError::FilterGraph {
                        stream: index,
                        source: e,
                    }
                })?;
                StreamPipeline::Audio(AudioLane {
                    index,
                    decoder,
                    encoder,
                    graph,
                    in_time_base,
                    out_time_base,
                })
            }
            StreamCoder::Remux => StreamPipeline::Remux(RemuxLane {
                index,
                in_time_base,
                out_time_base,
            }),
        };
        pipelines.push(pipeline);
    }
    Ok(pipelines)
}

impl VideoLane {
    fn process(
        &mut self,
        packet: &Packet,
        octx: &mut format::context::Output,
    ) -> Result<(), ConvertError> {
        self.decoder
            .send_packet(packet)
            .map_err(|e| ConvertError::Decode {
                stream: self.index,
                source: e,
            })?;
        self.drain_decoded(octx)
    }

    fn drain_decoded(&mut self, octx: &mut format::context::Output) -> Result<(), ConvertError> {
        let mut decoded = frame::Video::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let timestamp = decoded.timestamp();
                    decoded.set_pts(timestamp);
                    filter_in(&mut self.graph)
                        .and_then(|mut ctx| ctx.source().add(&decoded))
                        .map_err(|e| ConvertError::FilterGraph {
                            stream: self.index,
                            source: e,
                        })?;
                    self.drain_filtered(octx)?;
                }
                Err(e) if stage_done(&e) => break,
                Err(e) => {
                    return Err(ConvertError::Decode {
                        stream: self.index,
                        source: e,
                    })
                }
            }
        }
        Ok(())
    }

    fn drain_filtered(&mut self, octx: &mut format::context::Output) -> Result<(), ConvertError> {
        let mut filtered = frame::Video::empty();
        loop {
            let pulled = filter_out(&mut self.graph)
                .map_err(|e| ConvertError::FilterGraph {
                    stream: self.index,
                    source: e,
                })?
                .sink()
                .frame(&mut filtered);
            match pulled {
                Ok(()) => {
                    self.encoder
                        .send_frame(&filtered)
                        .map_err(|e| ConvertError::Encode {
                            stream: self.index,
                            source: e,
                        })?;
                    self.drain_encoded(octx)?;
                }
                Err(e) if stage_done(&e) => break,
                Err(e) => {
                    return Err(ConvertError::FilterGraph {
                        stream: self.index,
                        source: e,
                    })
                }
            }
        }
        Ok(())
    }

    fn drain_encoded(&mut self, octx: &mut format::context::Output) -> Result<(), ConvertError> {
        let mut encoded = Packet::empty();
        loop {
            match self.encoder.receive_packet(&mut encoded) {
                Ok(()) => {
                    encoded.set_stream(self.index);
                    encoded.rescale_ts(self.in_time_base, self.out_time_base);
                    encoded.write_interleaved(octx).map_err(ConvertError::Mux)?;
                }
                Err(e) if stage_done(&e) => break,
                Err(e) => {
                    return Err(ConvertError::Encode {
                        stream: self.index,
                        source: e,
                    })
                }
            }
        }
        Ok(())
    }

    fn flush(&mut self, octx: &mut format::context::Output) -> Result<(), ConvertError> {
        self.decoder.send_eof().map_err(|e| ConvertError::Decode {
            stream: self.index,
            source: e,
        })?;
        self.drain_decoded(octx)?;

        filter_in(&mut self.graph)
            .and_then(|mut ctx| ctx.source().flush())
            .map_err(|e| ConvertError::FilterGraph {
                stream: self.index,
                source: e,
            })?;
        self.drain_filtered(octx)?;

        let buffers = self.encoder.codec().map_or(false, |c| {
            c.capabilities()
                .contains(codec::capabilities::Capabilities::DELAY)
        });
        if buffers {
            self.encoder.send_eof().map_err(|e| ConvertError::Encode {
                stream: self.index,
                source: e,
            })?;
            self.drain_encoded(octx)?;
        }
        Ok(())
    }
}

impl AudioLane {
    fn process(
        &mut self,
        packet: &Packet,
        octx: &mut format::context::Output,
    ) -> Result<(), ConvertError> {
        self.decoder
            .send_packet(packet)
            .map_err(|e| ConvertError::Decode {
                stream: self.index,
                source: e,
            })?;
        self.drain_decoded(octx)
    }

    fn drain_decoded(&mut self, octx: &mut format::context::Output) -> Result<(), ConvertError> {
        let mut decoded = frame::Audio::empty();
        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => {
                    let timestamp = decoded.timestamp();
                    decoded.set_pts(timestamp);
                    filter_in(&mut self.graph)
                        .and_then(|mut ctx| ctx.source().add(&decoded))
                        .map_err(|e| ConvertError::FilterGraph {
                            stream: self.index,
                            source: e,
                        })?;
                    self.drain_filtered(octx)?;
                }
                Err(e) if stage_done(&e) => break,
                Err(e) => {
                    return Err(ConvertError::Decode {
                        stream: self.index,
                        source: e,
                    })
                }
            }
        }
        Ok(())
    }

    fn drain_filtered(&mut self, octx: &mut format::context::Output) -> Result<(), ConvertError> {
        let mut filtered = frame::Audio::empty();
        loop {
            let pulled = filter_out(&mut self.graph)
                .map_err(|e| ConvertError::FilterGraph {
                    stream: self.index,
                    source: e,
                })?
                .sink()
                .frame(&mut filtered);
            match pulled {
                Ok(()) => {
                    self.encoder
                        .send_frame(&filtered)
                        .map_err(|e| ConvertError::Encode {
                            stream: self.index,
                            source: e,
                        })?;
                    self.drain_encoded(octx)?;
                }
                Err(e) if stage_done(&e) => break,
                Err(e) => {
                    return Err(ConvertError::FilterGraph {
                        stream: self.index,
                        source: e,
                    })
                }
            }
        }
        Ok(())
    }

    fn drain_encoded(&mut self, octx: &mut format::context::Output) -> Result<(), ConvertError> {
        let mut encoded = Packet::empty();
        loop {
            match self.encoder.receive_packet(&mut encoded) {
                Ok(()) => {
                    encoded.set_stream(self.index);
                    encoded.rescale_ts(self.in_time_base, self.out_time_base);
                    encoded.write_interleaved(octx).map_err(ConvertError::Mux)?;
                }
                Err(e) if stage_done(&e) => break,
                Err(e) => {
                    return Err(ConvertError::Encode {
                        stream: self.index,
                        source: e,
                    })
                }
            }
        }
        Ok(())
    }

    fn flush(&mut self, octx: &mut format::context::Output) -> Result<(), ConvertError> {
        self.decoder.send_eof().map_err(|e| ConvertError::Decode {
            stream: self.index,
            source: e,
        })?;
        self.drain_decoded(octx)?;

        filter_in(&mut self.graph)
            .and_then(|mut ctx| ctx.source().flush())
            .map_err(|e| ConvertError::FilterGraph {
                stream: self.index,
                source: e,
            })?;
        self.drain_filtered(octx)?;

        let buffers = self.encoder.codec().map_or(false, |c| {
            c.capabilities()
                .contains(codec::capabilities::Capabilities::DELAY)
        });
        if buffers {
            self.encoder.send_eof().map_err(|e| ConvertError::Encode {
                stream: self.index,
                source: e,
            })?;
            self.drain_encoded(octx)?;
        }
        Ok(())
    }
}

impl RemuxLane {
    fn process(
        &mut self,
        packet: &mut Packet,
        octx: &mut format::context::Output,
    ) -> Result<(), ConvertError> {
        packet.rescale_ts(self.in_time_base, self.out_time_base);
        packet.set_position(-1);
        packet.set_stream(self.index);
        packet.write_interleaved(octx).map_err(ConvertError::Mux)
    }
}

impl StreamPipeline {
    fn process_packet(
        &mut self,
        packet: &mut Packet,
        octx: &mut format::context::Output,
    ) -> Result<(), ConvertError> {
        match self {
            StreamPipeline::Video(lane) => lane.process(packet, octx),
            StreamPipeline::Audio(lane) => lane.process(packet, octx),
            StreamPipeline::Remux(lane) => lane.process(packet, octx),
        }
    }

    fn flush(&mut self, octx: &mut format::context::Output) -> Result<(), ConvertError> {
        match self {
            StreamPipeline::Video(lane) => lane.flush(octx),
            StreamPipeline::Audio(lane) => lane.flush(octx),
            StreamPipeline::Remux(_) => Ok(()),
        }
    }
}

/// Runs the whole pipeline: open input and decoders, open the output with
/// one encoder per audio/video stream, bridge them with pass-through filter
/// graphs, pump packets until EOF, flush, write the trailer. All contexts
/// are owned values and drop on every exit path.
#[tracing::instrument(skip(opts))]
pub fn transcode(input: &Path, output: &Path, opts: &ConvertOptions) -> Result<(), ConvertError> {
    let mut ictx = open_input(input)?;
    let decoders = open_decoders(&ictx)?;
    let (mut octx, coders) = open_output(output, opts, &ictx, decoders)?;
    let mut pipelines = init_filters(&ictx, &octx, coders)?;

    for (stream, mut packet) in ictx.packets().filter_map(Result::ok) {
        let index = stream.index();
        if let Some(pipeline) = pipelines.get_mut(index) {
            pipeline.process_packet(&mut packet, &mut octx)?;
        }
    }

    for pipeline in &mut pipelines {
        pipeline.flush(&mut octx)?;
    }

    octx.write_trailer().map_err(ConvertError::Mux)?;

    tracing::trace!("transcode completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg::format::{sample, Pixel, Sample};

    #[test]
    fn decoder_pixel_format_kept_when_supported() {
        let supported = vec![Pixel::YUV422P, Pixel::YUV420P];
        let chosen = choose_pixel_format(Some(supported.into_iter()), Pixel::YUV420P);
        assert_eq!(chosen, Pixel::YUV420P);
    }

    #[test]
    fn first_supported_pixel_format_used_otherwise() {
        let supported = vec![Pixel::YUV422P, Pixel::YUV444P];
        let chosen = choose_pixel_format(Some(supported.into_iter()), Pixel::RGB24);
        assert_eq!(chosen, Pixel::YUV422P);
    }

    #[test]
    fn unconstrained_encoder_takes_decoder_pixel_format() {
        let chosen = choose_pixel_format(None::<std::vec::IntoIter<Pixel>>, Pixel::RGB24);
        assert_eq!(chosen, Pixel::RGB24);
    }

    #[test]
    fn sample_format_is_always_the_encoders_first() {
        let supported = vec![
            Sample::F32(sample::Type::Planar),
            Sample::I16(sample::Type::Packed),
        ];
        let chosen = choose_sample_format(
            Some(supported.into_iter()),
            Sample::I16(sample::Type::Packed),
        );
        assert_eq!(chosen, Sample::F32(sample::Type::Planar));
    }

    #[test]
    fn sample_format_falls_back_to_decoder() {
        let chosen = choose_sample_format(
            None::<std::vec::IntoIter<Sample>>,
            Sample::I16(sample::Type::Packed),
        );
        assert_eq!(chosen, Sample::I16(sample::Type::Packed));
    }

    #[test]
    fn channel_masks_cover_mono_and_stereo() {
        assert_eq!(default_channel_mask(1), 0x4);
        assert_eq!(default_channel_mask(2), 0x3);
        assert_eq!(default_channel_mask(6), 0x3f);
    }

    #[test]
    fn receive_results_classify() {
        assert!(stage_done(&ffmpeg::Error::Eof));
        assert!(stage_done(&ffmpeg::Error::Other { errno: EAGAIN }));
        assert!(!stage_done(&ffmpeg::Error::InvalidData));
    }
}
