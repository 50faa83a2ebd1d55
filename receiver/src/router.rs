use std::{
    collections::{HashMap, HashSet, hash_map::Entry},
    io::Cursor,
    net::SocketAddr,
};

use rtp_formats::{
    demux::{self, MultiplexedKind},
    packet::RtpTrivialPacket,
    rtcp::{RtcpPacket, compound_packet::RtcpCompoundPacket},
};
use tokio_util::bytes::Bytes;
use utils::traits::reader::TryReadFrom;

use crate::{
    config::RtpReceiverConfig,
    events::{ReceiverObserver, VideoFrame},
    statistics::ReceiverStatistics,
    stream::VideoStream,
};

/// Routes classified datagrams to per-SSRC video streams and surfaces
/// reassembled frames through the registered observer.
///
/// All state lives on the thread that calls [`VideoStreamRouter::on_datagram`];
/// the socket layer must serialize its callbacks.
pub struct VideoStreamRouter {
    config: RtpReceiverConfig,
    streams: HashMap<u32, VideoStream>,
    next_stream_index: usize,
    observer: Option<Box<dyn ReceiverObserver>>,
    statistics: ReceiverStatistics,
    unknown_payload_warned: HashSet<u32>,
    closed: bool,
}

impl VideoStreamRouter {
    pub fn new(config: RtpReceiverConfig) -> Self {
        Self {
            config,
            streams: HashMap::new(),
            next_stream_index: 0,
            observer: None,
            statistics: ReceiverStatistics::new(),
            unknown_payload_warned: HashSet::new(),
            closed: false,
        }
    }

    /// Register the frame-ready callback surface. Exactly one observer per
    /// router, a second call replaces the first.
    pub fn set_observer(&mut self, observer: Box<dyn ReceiverObserver>) {
        self.observer = Some(observer);
    }

    pub fn statistics(&self) -> &ReceiverStatistics {
        &self.statistics
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Synchronous entry point, one call per received udp datagram. The
    /// bytes stay owned by the caller, the router copies what it keeps.
    pub fn on_datagram(&mut self, local_port: u16, remote_addr: SocketAddr, bytes: &[u8]) {
        if self.closed {
            return;
        }
        match demux::classify(bytes) {
            Err(reject) => {
                self.statistics.malformed_dropped += 1;
                tracing::debug!(
                    "dropping datagram on port {} from {}: {:?}",
                    local_port,
                    remote_addr,
                    reject
                );
            }
            Ok(MultiplexedKind::Rtp) => self.on_rtp_datagram(remote_addr, bytes),
            Ok(MultiplexedKind::Rtcp) => self.on_rtcp_datagram(remote_addr, bytes),
        }
    }

    /// Idempotent shutdown: streams are torn down, the observer notified
    /// once and dropped, later datagrams ignored.
    pub fn close(&mut self, reason: &str) {
        if self.closed {
            return;
        }
        self.closed = true;
        tracing::info!("rtp stream router closing: {}", reason);
        self.streams.clear();
        self.unknown_payload_warned.clear();
        if let Some(mut observer) = self.observer.take() {
            observer.on_closed(reason);
        }
    }

    fn on_rtp_datagram(&mut self, remote_addr: SocketAddr, bytes: &[u8]) {
        let packet = match RtpTrivialPacket::from_datagram(Bytes::copy_from_slice(bytes)) {
            Ok(packet) => packet,
            Err(err) => {
                self.statistics.malformed_dropped += 1;
                tracing::warn!("dropping unparsable rtp datagram from {}: {}", remote_addr, err);
                return;
            }
        };
        self.statistics.rtp_packets_received += 1;
        self.statistics.rtp_bytes_received += bytes.len() as u64;

        let ssrc = packet.header.ssrc;
        let payload_type = packet.header.payload_type;
        let Some(&codec) = self.config.payload_types.get(&payload_type) else {
            self.statistics.unknown_payload_dropped += 1;
            if self.unknown_payload_warned.insert(ssrc) {
                tracing::warn!(
                    "dropping rtp packet with unmapped payload type {} on ssrc {:#010x}",
                    payload_type,
                    ssrc
                );
            }
            return;
        };

        let stream = match self.streams.entry(ssrc) {
            Entry::Occupied(entry) => {
                let stream = entry.into_mut();
                if stream.remote_addr() != remote_addr {
                    if !stream.accepts_endpoint(remote_addr, self.config.accept_rtp_from_any) {
                        self.statistics.endpoint_mismatch_dropped += 1;
                        tracing::warn!(
                            "dropping rtp packet for ssrc {:#010x} from unexpected endpoint {}, expect {}",
                            ssrc,
                            remote_addr,
                            stream.remote_addr()
                        );
                        return;
                    }
                    stream.rebind_endpoint(remote_addr);
                }
                if stream.codec() != codec {
                    self.statistics.unknown_payload_dropped += 1;
                    tracing::warn!(
                        "dropping rtp packet for ssrc {:#010x}: payload type {} maps to {} but the stream carries {}",
                        ssrc,
                        payload_type,
                        codec,
                        stream.codec()
                    );
                    return;
                }
                stream
            }
            Entry::Vacant(entry) => {
                let index = self.next_stream_index;
                self.next_stream_index += 1;
                tracing::info!(
                    "new {} stream {} for ssrc {:#010x} from {}",
                    codec,
                    index,
                    ssrc,
                    remote_addr
                );
                entry.insert(VideoStream::new(
                    index,
                    codec,
                    remote_addr,
                    self.config.max_reconstructed_frame_size,
                ))
            }
        };

        for (rtp_timestamp, frame) in stream.on_rtp_packet(packet, &mut self.statistics) {
            let video_frame = VideoFrame {
                stream_index: stream.index(),
                remote_addr: stream.remote_addr(),
                rtp_timestamp,
                codec,
                is_key_frame: frame.is_key_frame,
                payload: frame.payload,
            };
            self.statistics.frames_emitted += 1;
            if let Some(observer) = self.observer.as_mut() {
                observer.on_frame(&video_frame);
            }
        }
    }

    fn on_rtcp_datagram(&mut self, remote_addr: SocketAddr, bytes: &[u8]) {
        let mut cursor = Cursor::new(bytes);
        let compound = match RtcpCompoundPacket::try_read_from(&mut cursor) {
            Err(err) => {
                self.statistics.malformed_dropped += 1;
                tracing::warn!("dropping unparsable rtcp datagram from {}: {}", remote_addr, err);
                return;
            }
            Ok(None) => {
                self.statistics.malformed_dropped += 1;
                tracing::warn!("dropping truncated rtcp datagram from {}", remote_addr);
                return;
            }
            Ok(Some(compound)) => compound,
        };
        self.statistics.rtcp_compound_packets_received += 1;
        self.statistics.rtcp_packets_received += compound.packets().len() as u64;

        for packet in compound.packets() {
            match packet {
                RtcpPacket::Bye(bye) => {
                    let reason = bye.reason_string();
                    for ssrc in &bye.ssrc_list {
                        let Some(mut stream) = self.streams.remove(ssrc) else {
                            continue;
                        };
                        stream.reset_assembly();
                        self.statistics.byes_received += 1;
                        tracing::info!(
                            "stream {} for ssrc {:#010x} left by rtcp bye, reason: {:?}",
                            stream.index(),
                            ssrc,
                            reason
                        );
                        if let Some(observer) = self.observer.as_mut() {
                            observer.on_bye(*ssrc, reason.clone());
                        }
                    }
                }
                RtcpPacket::SenderReport(report) => {
                    tracing::trace!("sender report from ssrc {:#010x}", report.sender_ssrc);
                }
                RtcpPacket::ReceiverReport(report) => {
                    tracing::trace!("receiver report from ssrc {:#010x}", report.sender_ssrc);
                }
                RtcpPacket::Other(other) => {
                    tracing::trace!(
                        "ignoring rtcp {:?} packet from {}",
                        other.header.payload_type,
                        remote_addr
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use rtp_formats::{
        header::RtpHeader,
        rtcp::{
            bye::RtcpByePacket, receiver_report::RtcpReceiverReport, report_block::ReportBlock,
        },
    };
    use utils::traits::writer::WriteTo;

    use super::*;
    use crate::events::VideoCodec;

    #[derive(Default, Clone)]
    struct Collector {
        frames: Arc<Mutex<Vec<VideoFrame>>>,
        byes: Arc<Mutex<Vec<(u32, Option<String>)>>>,
        closed: Arc<Mutex<Vec<String>>>,
    }

    impl ReceiverObserver for Collector {
        fn on_frame(&mut self, frame: &VideoFrame) {
            self.frames.lock().unwrap().push(frame.clone());
        }
        fn on_bye(&mut self, ssrc: u32, reason: Option<String>) {
            self.byes.lock().unwrap().push((ssrc, reason));
        }
        fn on_closed(&mut self, reason: &str) {
            self.closed.lock().unwrap().push(reason.to_owned());
        }
    }

    fn router_with_collector(config: RtpReceiverConfig) -> (VideoStreamRouter, Collector) {
        let mut router = VideoStreamRouter::new(config);
        let collector = Collector::default();
        router.set_observer(Box::new(collector.clone()));
        (router, collector)
    }

    fn remote() -> SocketAddr {
        "198.51.100.20:5004".parse().unwrap()
    }

    fn rtp_datagram(
        ssrc: u32,
        sequence_number: u16,
        timestamp: u32,
        marker: bool,
        payload: Vec<u8>,
    ) -> Vec<u8> {
        let packet = RtpTrivialPacket::new(
            RtpHeader {
                marker,
                payload_type: 96,
                sequence_number,
                timestamp,
                ssrc,
                ..Default::default()
            },
            Bytes::from(payload),
        );
        let mut bytes = Vec::new();
        packet.write_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_full_frames_emit_in_arrival_order() {
        let (mut router, collector) = router_with_collector(Default::default());
        for (sequence_number, timestamp) in [(1_u16, 1000_u32), (2, 4000), (3, 7000)] {
            router.on_datagram(
                5004,
                remote(),
                &rtp_datagram(0xAB, sequence_number, timestamp, true, vec![0x65, 1, 2]),
            );
        }

        let frames = collector.frames.lock().unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(
            frames
                .iter()
                .map(|frame| frame.rtp_timestamp)
                .collect::<Vec<_>>(),
            vec![1000, 4000, 7000]
        );
        assert_eq!(frames[0].stream_index, 0);
        assert_eq!(frames[0].codec, VideoCodec::H264);
        assert_eq!(router.statistics().frames_emitted(), 3);
        assert_eq!(router.statistics().sequence_jumps(), 0);
    }

    #[test]
    fn test_reordered_fragments_within_a_frame() {
        let (mut router, collector) = router_with_collector(Default::default());
        // prime with a complete frame so the router knows where the next
        // frame starts
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xAB, 99, 500, true, vec![0x65, 0xEE]),
        );

        // fragments arrive 102, 100, 101; the marker sits on the highest
        // sequence number, not the last arrival
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xAB, 102, 1000, true, vec![0x7C, 0x45, 0xCC]),
        );
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xAB, 100, 1000, false, vec![0x7C, 0x85, 0xAA]),
        );
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xAB, 101, 1000, false, vec![0x7C, 0x05, 0xBB]),
        );

        let frames = collector.frames.lock().unwrap();
        assert_eq!(frames.len(), 2);
        // identical to in-order delivery of 100/101/102
        assert_eq!(
            frames[1].payload.as_ref(),
            &[0, 0, 0, 1, 0x65, 0xAA, 0xBB, 0xCC]
        );
    }

    #[test]
    fn test_timestamp_change_discards_unfinished_frame() {
        let (mut router, collector) = router_with_collector(Default::default());
        // fragment start of timestamp 1000, marker never arrives
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xAB, 10, 1000, false, vec![0x7C, 0x85, 0xAA]),
        );
        // next timestamp begins, the unfinished buffer goes away silently
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xAB, 11, 4000, true, vec![0x65, 0x11]),
        );

        let frames = collector.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].rtp_timestamp, 4000);
        assert_eq!(router.statistics().frames_discarded(), 1);
    }

    #[test]
    fn test_rtcp_bye_tears_down_the_stream() {
        let (mut router, collector) = router_with_collector(Default::default());
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xAB, 1, 1000, true, vec![0x65, 1]),
        );
        assert_eq!(router.stream_count(), 1);

        let compound = RtcpCompoundPacket::new(vec![
            RtcpPacket::ReceiverReport(
                RtcpReceiverReport::builder()
                    .ssrc(0xCAFE)
                    .report_block(ReportBlock::builder().ssrc(0xAB).build())
                    .build()
                    .unwrap(),
            ),
            RtcpPacket::Bye(
                RtcpByePacket::builder()
                    .ssrc(0xAB)
                    .reason("shutting down")
                    .unwrap()
                    .build(),
            ),
        ]);
        let mut bytes = Vec::new();
        compound.write_to(&mut bytes).unwrap();
        router.on_datagram(5004, remote(), &bytes);

        assert_eq!(router.stream_count(), 0);
        assert_eq!(router.statistics().byes_received(), 1);
        {
            let byes = collector.byes.lock().unwrap();
            assert_eq!(byes.len(), 1);
            assert_eq!(byes[0].0, 0xAB);
            assert_eq!(byes[0].1.as_deref(), Some("shutting down"));
        }

        // rtp on the same ssrc starts a fresh stream with a new index
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xAB, 2, 2000, true, vec![0x65, 2]),
        );
        let frames = collector.frames.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].stream_index, 1);
    }

    #[test]
    fn test_nat_rebind_from_private_to_public() {
        let (mut router, collector) = router_with_collector(Default::default());
        let private: SocketAddr = "10.0.0.5:5004".parse().unwrap();
        let public: SocketAddr = "203.0.113.7:5004".parse().unwrap();

        router.on_datagram(
            5004,
            private,
            &rtp_datagram(0xAB, 1, 1000, true, vec![0x65, 1]),
        );
        // the public endpoint takes over once
        router.on_datagram(
            5004,
            public,
            &rtp_datagram(0xAB, 2, 2000, true, vec![0x65, 2]),
        );
        // the original private endpoint is now a mismatch
        router.on_datagram(
            5004,
            private,
            &rtp_datagram(0xAB, 3, 3000, true, vec![0x65, 3]),
        );

        let frames = collector.frames.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].remote_addr, private);
        assert_eq!(frames[1].remote_addr, public);
        assert_eq!(router.statistics().endpoint_mismatch_dropped(), 1);
    }

    #[test]
    fn test_any_endpoint_accepted_when_configured() {
        let config = RtpReceiverConfig {
            accept_rtp_from_any: true,
            ..Default::default()
        };
        let (mut router, collector) = router_with_collector(config);
        let first: SocketAddr = "198.51.100.1:5004".parse().unwrap();
        let second: SocketAddr = "198.51.100.2:5004".parse().unwrap();

        router.on_datagram(5004, first, &rtp_datagram(0xAB, 1, 1000, true, vec![0x65, 1]));
        router.on_datagram(5004, second, &rtp_datagram(0xAB, 2, 2000, true, vec![0x65, 2]));

        assert_eq!(collector.frames.lock().unwrap().len(), 2);
        assert_eq!(router.statistics().endpoint_mismatch_dropped(), 0);
    }

    #[test]
    fn test_unknown_payload_type_dropped_with_one_warning() {
        let (mut router, collector) = router_with_collector(Default::default());
        let mut datagram = rtp_datagram(0xAB, 1, 1000, true, vec![0x65, 1]);
        datagram[1] = 111; // unmapped payload type, marker cleared
        router.on_datagram(5004, remote(), &datagram);
        router.on_datagram(5004, remote(), &datagram);

        assert!(collector.frames.lock().unwrap().is_empty());
        assert_eq!(router.statistics().unknown_payload_dropped(), 2);
        assert_eq!(router.stream_count(), 0);
    }

    #[test]
    fn test_malformed_datagrams_are_counted() {
        let (mut router, _collector) = router_with_collector(Default::default());
        router.on_datagram(5004, remote(), &[0x80, 96, 0, 1]); // too short
        let mut wrong_version = vec![0; 16];
        wrong_version[0] = 0x40;
        router.on_datagram(5004, remote(), &wrong_version);

        assert_eq!(router.statistics().malformed_dropped(), 2);
    }

    #[test]
    fn test_sequence_jump_is_tolerated() {
        let (mut router, collector) = router_with_collector(Default::default());
        router.on_datagram(5004, remote(), &rtp_datagram(0xAB, 1, 1000, true, vec![0x65, 1]));
        // a gap of several packets before the next frame: its marker packet
        // is held back until the following timestamp proves the loss, then
        // the frame is emitted late rather than dropped
        router.on_datagram(5004, remote(), &rtp_datagram(0xAB, 9, 2000, true, vec![0x65, 2]));
        router.on_datagram(5004, remote(), &rtp_datagram(0xAB, 10, 3000, true, vec![0x65, 3]));

        let frames = collector.frames.lock().unwrap();
        assert_eq!(
            frames
                .iter()
                .map(|frame| frame.rtp_timestamp)
                .collect::<Vec<_>>(),
            vec![1000, 2000, 3000]
        );
        assert_eq!(router.statistics().sequence_jumps(), 1);
        assert_eq!(router.statistics().frames_discarded(), 0);
    }

    #[test]
    fn test_vp8_stream_single_packet_key_frame() {
        let config = RtpReceiverConfig {
            payload_types: HashMap::from([(96, VideoCodec::Vp8)]),
            ..Default::default()
        };
        let (mut router, collector) = router_with_collector(config);
        // key frame tag: P bit of the first payload byte is zero
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xCD, 1, 1000, true, vec![0x10, 0x9C, 0x01, 0x2A]),
        );

        let frames = collector.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].codec, VideoCodec::Vp8);
        assert!(frames[0].is_key_frame);
        assert_eq!(frames[0].payload.as_ref(), &[0x9C, 0x01, 0x2A]);
    }

    #[test]
    fn test_oversize_reassembly_recovers_on_next_frame() {
        let config = RtpReceiverConfig {
            max_reconstructed_frame_size: 16,
            ..Default::default()
        };
        let (mut router, collector) = router_with_collector(config);
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xAB, 1, 1000, false, vec![0x65; 32]),
        );
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xAB, 2, 1000, true, vec![0x7C, 0x45, 0xBB]),
        );
        // the poisoned frame emitted nothing, the next one is fine
        router.on_datagram(
            5004,
            remote(),
            &rtp_datagram(0xAB, 3, 2000, true, vec![0x65, 0x11]),
        );

        let frames = collector.frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].rtp_timestamp, 2000);
        assert!(router.statistics().frames_discarded() >= 1);
    }

    #[test]
    fn test_close_is_idempotent_and_final() {
        let (mut router, collector) = router_with_collector(Default::default());
        router.on_datagram(5004, remote(), &rtp_datagram(0xAB, 1, 1000, true, vec![0x65, 1]));
        router.close("shutting down");
        router.close("shutting down again");

        assert_eq!(collector.closed.lock().unwrap().len(), 1);
        assert_eq!(router.stream_count(), 0);
        assert!(router.is_closed());

        // datagrams after close are dropped silently
        router.on_datagram(5004, remote(), &rtp_datagram(0xAB, 2, 2000, true, vec![0x65, 2]));
        assert_eq!(collector.frames.lock().unwrap().len(), 1);
    }
}
