use config::ConfigError;
use rtp_receiver::errors::RtpReceiverError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("receiver error: {0}")]
    ReceiverError(#[from] RtpReceiverError),
}

pub(crate) type AppResult<T> = Result<T, AppError>;
