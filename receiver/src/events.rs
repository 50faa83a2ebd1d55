use std::{fmt, net::SocketAddr};

use serde::Deserialize;
use tokio_util::bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    H264,
    Vp8,
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoCodec::H264 => write!(f, "h264"),
            VideoCodec::Vp8 => write!(f, "vp8"),
        }
    }
}

/// One reconstructed video frame as delivered to the embedder.
///
/// For h264 the payload is an Annex-B byte stream; for vp8 it is the raw
/// frame with payload descriptors stripped. The bytes are owned by the
/// router for the duration of the callback only.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub stream_index: usize,
    pub remote_addr: SocketAddr,
    pub rtp_timestamp: u32,
    pub codec: VideoCodec,
    pub is_key_frame: bool,
    pub payload: Bytes,
}

/// The single event surface of a router. One observer per router; frames
/// carry their stream index so embedders can filter as needed.
pub trait ReceiverObserver: Send {
    fn on_frame(&mut self, frame: &VideoFrame);
    fn on_bye(&mut self, _ssrc: u32, _reason: Option<String>) {}
    fn on_closed(&mut self, _reason: &str) {}
}
