use tokio_util::bytes::Bytes;

pub mod h264;
pub mod vp8;

pub const DEFAULT_MAX_RECONSTRUCTED_FRAME_SIZE: usize = 1_048_576;

/// One reconstructed encoded video frame, ready for a decoder.
#[derive(Debug, Clone)]
pub struct DepacketizedFrame {
    pub payload: Bytes,
    pub is_key_frame: bool,
}
