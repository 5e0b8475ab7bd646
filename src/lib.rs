pub mod proto_video_convert {
    tonic::include_proto!("video_convert.v1");
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("video_convert_descriptor");
}

pub mod ffmpeg;
pub mod otel;
pub mod service;

pub const SERVICE_NAME: &str = "video-convert-rs";
