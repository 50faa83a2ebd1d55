use clap::Parser;
use rtp_receiver::{
    events::{ReceiverObserver, VideoFrame},
    udp::UdpVideoReceiver,
};
use time::macros::format_description;
use tokio::signal;
use tracing::Dispatch;
use tracing_subscriber::fmt::time::LocalTime;

use crate::{cli::AppCli, config::AppConfig};

mod cli;
mod config;
mod errors;
mod util;

#[derive(Default)]
struct FrameLogger;

impl ReceiverObserver for FrameLogger {
    fn on_frame(&mut self, frame: &VideoFrame) {
        tracing::info!(
            "frame from {}: stream {}, codec {}, rtp timestamp {}, {} bytes{}",
            frame.remote_addr,
            frame.stream_index,
            frame.codec,
            frame.rtp_timestamp,
            frame.payload.len(),
            if frame.is_key_frame { ", key frame" } else { "" }
        );
    }

    fn on_bye(&mut self, ssrc: u32, reason: Option<String>) {
        tracing::info!("ssrc {:#010x} said goodbye, reason: {:?}", ssrc, reason);
    }

    fn on_closed(&mut self, reason: &str) {
        tracing::info!("receiver closed: {}", reason);
    }
}

#[tokio::main]
async fn main() {
    let cli_args = AppCli::parse();
    let mut app_config = match AppConfig::new(
        cli_args
            .config
            .as_ref()
            .and_then(|path| path.to_str().map(|path| path.to_owned())),
    ) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load config: {}", err);
            std::process::exit(1);
        }
    };
    app_config.apply(&cli_args);
    let log_level = match app_config.validate() {
        Ok(level) => level,
        Err(err) => {
            eprintln!("invalid config: {}", err);
            std::process::exit(1);
        }
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_timer(LocalTime::new(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        )))
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .with_target(true)
        .finish();
    tracing::dispatcher::set_global_default(Dispatch::new(subscriber)).unwrap();

    tracing::info!("rtp video receiver is starting");

    let mut receiver = match UdpVideoReceiver::bind(app_config.receiver).await {
        Ok(receiver) => receiver,
        Err(err) => {
            tracing::error!("failed to bind udp receiver: {}", err);
            std::process::exit(1);
        }
    };
    receiver.set_observer(Box::new(FrameLogger));

    tokio::select! {
        result = receiver.run() => {
            if let Err(err) = result {
                tracing::error!("receiver exited with error: {}", err);
            }
        }
        _ = signal::ctrl_c() => {
            tracing::info!("interrupt signal received");
        }
    }
    receiver.close("shutting down");
}
