use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr},
};

use rtp_formats::codec::DEFAULT_MAX_RECONSTRUCTED_FRAME_SIZE;
use serde::Deserialize;

use crate::events::VideoCodec;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RtpReceiverConfig {
    /// local ip the udp layer binds
    pub bind_address: IpAddr,
    /// local udp port, 0 lets the os choose
    pub bind_port: u16,
    /// upper bound on a single reassembled frame
    pub max_reconstructed_frame_size: usize,
    /// when true a stream's remote endpoint may change freely, otherwise
    /// only the private-to-public nat traversal rebind is accepted
    pub accept_rtp_from_any: bool,
    /// payload type to codec mapping, negotiated out of band
    pub payload_types: HashMap<u8, VideoCodec>,
}

impl Default for RtpReceiverConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            bind_port: 0,
            max_reconstructed_frame_size: DEFAULT_MAX_RECONSTRUCTED_FRAME_SIZE,
            accept_rtp_from_any: false,
            payload_types: HashMap::from([(96, VideoCodec::H264), (97, VideoCodec::H264)]),
        }
    }
}
