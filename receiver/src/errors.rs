use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RtpReceiverError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("rtp format error: {0}")]
    RtpFormat(#[from] rtp_formats::errors::RtpError),
}

pub type RtpReceiverResult<T> = Result<T, RtpReceiverError>;
