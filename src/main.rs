use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use video_convert_rs::{
    ffmpeg::FFmpegConverter,
    otel,
    proto_video_convert::{self, video_converter_server::VideoConverterServer},
    service::Service,
    SERVICE_NAME,
};

#[derive(Parser, Debug)]
#[command(version = env!("CARGO_APP_VERSION"), name = SERVICE_NAME,
    about = "Service for media conversion and FFmpeg registry introspection",
    long_about = None)]
struct Args {
    /// GRPC server port
    #[arg(long, env, default_value = "50051")]
    port: u16,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let _guard = otel::TracerGuard;

    use opentelemetry::trace::TracerProvider as _;

    let (provider, tr_info) = otel::init_tracer()?;
    let tracer = provider.tracer(SERVICE_NAME);
    let telemetry = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::Layer::default().compact())
        .with(telemetry)
        .init();
    tracing::info!(info = tr_info, "tracer");
    let args = Args::parse();
    if let Err(e) = main_int(args).await {
        tracing::error!("{}", e);
        return Err(e);
    }
    Ok(())
}

async fn main_int(args: Args) -> anyhow::Result<()> {
    tracing::info!(name = SERVICE_NAME, "Starting GRPC service");
    tracing::info!(version = env!("CARGO_APP_VERSION"));
    tracing::info!(port = args.port);

    let cancel_token = CancellationToken::new();

    let ct = cancel_token.clone();

    tokio::spawn(async move {
        let mut int_stream = signal(SignalKind::interrupt()).unwrap();
        let mut term_stream = signal(SignalKind::terminate()).unwrap();
        tokio::select! {
            _ = int_stream.recv() => tracing::info!("Exit event int"),
            _ = term_stream.recv() => tracing::info!("Exit event term"),
        }
        tracing::debug!("sending exit event");
        ct.cancel();
    });

    let address: std::net::SocketAddr = format!("[::]:{}", args.port).parse()?;
    tracing::info!(address = format!("{:?}", address), "address");

    let converter = FFmpegConverter::new()?;
    let service = Service::new(converter);
    let grpc_service = VideoConverterServer::new(service);
    let reflection_service = tonic_reflection::server::Builder::configure()
        .register_encoded_file_descriptor_set(proto_video_convert::FILE_DESCRIPTOR_SET)
        .build_v1alpha()?;
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<VideoConverterServer<Service>>()
        .await;

    let ct = cancel_token.clone();
    let grpc_server = Server::builder()
        .add_service(reflection_service)
        .add_service(health_service)
        .add_service(grpc_service)
        .serve_with_shutdown(address, async move {
            ct.cancelled().await;
        });

    grpc_server.await?;

    tracing::info!("Service stopped");
    Ok(())
}
