use std::io;

use codec_h264::errors::H264CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RtpH264Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("h264 codec error: {0}")]
    H264Codec(#[from] H264CodecError),
    #[error("invalid h264 payload structure type: {0}")]
    InvalidH264PacketType(u8),
    #[error("fragment unit without a preceding start fragment: {0}")]
    FragmentMissingStart(String),
    #[error("fragment unit sequence gap: {0}")]
    FragmentSequenceGap(String),
}

pub type RtpH264Result<T> = Result<T, RtpH264Error>;
