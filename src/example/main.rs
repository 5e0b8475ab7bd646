use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::io::AsyncWriteExt;
use tonic::transport::Channel;
use tonic_health::pb::{health_check_response, health_client::HealthClient, HealthCheckRequest};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use video_convert_rs::{
    proto_video_convert::{
        video_converter_client::VideoConverterClient, CodecOptionsRequest, ConvertInput,
        ConvertOptions, ListRequest,
    },
    SERVICE_NAME,
};

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Listing {
    Encoders,
    Muxers,
    Codecs,
}

#[derive(Parser, Debug, Clone)]
#[command(version = env!("CARGO_APP_VERSION"), name = SERVICE_NAME,
    about = "Client for video-convert-rs", long_about = None)]
struct Args {
    /// GRPC port
    #[arg(short, long, env, default_value = "50051")]
    port: u16,
    /// Input media file
    #[arg(short = 'i', long, env)]
    input: Option<String>,
    /// Output file
    #[arg(short, long, env, default_value = "output.mkv")]
    output: String,
    /// Output container format
    #[arg(short, long, env, default_value = "matroska")]
    format: String,
    /// Video encoder name
    #[arg(long, env, default_value = "libx264")]
    video_encoder: String,
    /// Audio encoder name
    #[arg(long, env, default_value = "aac")]
    audio_encoder: String,
    /// Verbose FFmpeg logging on the server
    #[arg(long, env, default_value = "false")]
    verbose: bool,
    /// Dump a registry instead of converting
    #[arg(long, env)]
    list: Option<Listing>,
    /// Dump the options of the encoder for a codec id instead of converting
    #[arg(long, env)]
    codec_options: Option<i32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::Layer::default().compact())
        .init();
    let args = Args::parse();
    if let Err(e) = main_int(args).await {
        tracing::error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn main_int(args: Args) -> anyhow::Result<()> {
    tracing::info!(name = SERVICE_NAME, "Starting GRPC client");
    tracing::info!(version = env!("CARGO_APP_VERSION"));
    tracing::info!(grpc_port = args.port);

    check_health(args.port).await?;

    let mut client =
        VideoConverterClient::connect(format!("http://[::]:{}", args.port)).await?;

    if let Some(listing) = args.list {
        return list(&mut client, listing).await;
    }
    if let Some(codec_id) = args.codec_options {
        return list_codec_options(&mut client, codec_id).await;
    }

    let input = args
        .input
        .clone()
        .context("no input file; pass -i or --list")?;
    convert(&mut client, &args, &input).await
}

async fn list(client: &mut VideoConverterClient<Channel>, listing: Listing) -> anyhow::Result<()> {
    match listing {
        Listing::Encoders => {
            let reply = client.list_encoders(ListRequest {}).await?;
            for e in &reply.get_ref().encoders {
                println!("{}\t{}\t{}\t{}", e.name, e.media_kind, e.codec_id, e.long_name);
            }
        }
        Listing::Muxers => {
            let reply = client.list_muxers(ListRequest {}).await?;
            for m in &reply.get_ref().muxers {
                println!("{}\t{}\t{}", m.name, m.extensions, m.long_name);
            }
        }
        Listing::Codecs => {
            let reply = client.list_codecs(ListRequest {}).await?;
            for c in &reply.get_ref().codecs {
                println!("{}\t{}\t{}\t{}", c.name, c.media_kind, c.codec_id, c.long_name);
            }
        }
    }
    Ok(())
}

async fn list_codec_options(
    client: &mut VideoConverterClient<Channel>,
    codec_id: i32,
) -> anyhow::Result<()> {
    let reply = client
        .list_codec_options(CodecOptionsRequest { codec_id })
        .await?;
    for o in &reply.get_ref().options {
        println!(
            "{}\t{:?}\t[{}, {}]\t{}",
            o.name, o.default, o.min, o.max, o.help
        );
    }
    Ok(())
}

async fn convert(
    client: &mut VideoConverterClient<Channel>,
    args: &Args,
    input: &str,
) -> anyhow::Result<()> {
    tracing::info!(file = input, format = args.format, "converting");
    let data = std::fs::read(input).with_context(|| format!("read file: {}", input))?;

    let request = tonic::Request::new(ConvertInput {
        data,
        options: Some(ConvertOptions {
            verbose: args.verbose,
            output_format: args.format.clone(),
            video_encoder: args.video_encoder.clone(),
            audio_encoder: args.audio_encoder.clone(),
        }),
    });
    let reply = client.convert(request).await?;

    tracing::info!(output = args.output, "saving...");
    let mut file = tokio::fs::File::create(&args.output)
        .await
        .with_context(|| "failed to create file")?;
    file.write_all(&reply.get_ref().data)
        .await
        .with_context(|| format!("failed to write file: {:?}", args.output))?;

    Ok(())
}

async fn check_health(port: u16) -> anyhow::Result<()> {
    let channel = Channel::from_shared(format!("http://[::]:{}", port))?
        .connect()
        .await?;
    let mut client = HealthClient::new(channel.clone());
    let health_request = tonic::Request::new(HealthCheckRequest {
        service: "".to_string(),
    });

    let result = client.check(health_request).await?;
    let response = result.get_ref();
    tracing::info!(status = response.status, "got a response.");
    if response.status != health_check_response::ServingStatus::Serving as i32 {
        return Err(anyhow::anyhow!("Service is not healthy"));
    }
    Ok(())
}
