use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RtpVp8Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("vp8 payload too short for its descriptor: {0} bytes")]
    PayloadTooShort(usize),
}

pub type RtpVp8Result<T> = Result<T, RtpVp8Error>;
