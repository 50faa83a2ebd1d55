use std::{io, string};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RtpError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported rtp version: {0}")]
    UnsupportedVersion(u8),
    #[error("datagram too short for rtp header: {0}")]
    HeaderTooShort(usize),
    #[error("rtp payload is empty")]
    EmptyPayload,
    #[error("bad padding size: {0}")]
    BadPaddingSize(usize),
    #[error("unknown rtcp payload type: {0}")]
    UnknownRtcpPayloadType(u8),
    #[error("wrong payload type: {0}")]
    WrongPayloadType(String),
    #[error("bye reason too large, exceeds u8 length: {0}")]
    ByeReasonTooLarge(String),
    #[error("too many csrc for a rtp header, exceeds 15")]
    TooManyCSRC,
    #[error("too many report blocks in a report packet, exceeds 31")]
    TooManyReportBlocks,
    #[error("invalid utf8 data: {0}")]
    InvalidUtf8(#[from] string::FromUtf8Error),
}

pub type RtpResult<T> = Result<T, RtpError>;
