use std::env;

use config::{Config, Environment, File};
use rtp_receiver::config::RtpReceiverConfig;
use serde::Deserialize;

use crate::{cli::AppCli, errors::AppResult, util::parse_log_level};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct Logger {
    pub(crate) level: String,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) logger: Logger,
    pub(crate) receiver: RtpReceiverConfig,
}

impl AppConfig {
    pub(crate) fn new(config_path: Option<String>) -> AppResult<Self> {
        let config_path_composed =
            config_path.or_else(|| env::var("RTP_RECEIVER_CONFIG").ok());

        let mut builder = Config::builder();
        if let Some(path) = &config_path_composed {
            builder = builder.add_source(File::with_name(path));
        }
        let result = builder
            .add_source(Environment::with_prefix("rtp_receiver").separator("__"))
            .build()?;
        let config = result.try_deserialize()?;
        Ok(config)
    }

    pub(crate) fn apply(&mut self, cli_args: &AppCli) {
        if let Some(log_level) = &cli_args.log_level {
            self.logger.level = log_level.clone();
        }
        if let Some(port) = cli_args.port {
            self.receiver.bind_port = port;
        }
    }

    pub(crate) fn validate(&self) -> AppResult<tracing::Level> {
        parse_log_level(&self.logger.level)
    }
}
