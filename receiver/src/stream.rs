use std::net::SocketAddr;

use rtp_formats::{
    codec::DepacketizedFrame,
    codec::h264::depacketizer::RtpH264Depacketizer,
    codec::vp8::depacketizer::RtpVp8Depacketizer,
    packet::RtpTrivialPacket,
    sequence_number::SequenceNumber,
};

use crate::{events::VideoCodec, statistics::ReceiverStatistics};

pub(crate) enum FrameDepacketizer {
    H264(RtpH264Depacketizer),
    Vp8(RtpVp8Depacketizer),
}

impl FrameDepacketizer {
    fn new(codec: VideoCodec, max_frame_size: usize) -> Self {
        match codec {
            VideoCodec::H264 => Self::H264(RtpH264Depacketizer::new(max_frame_size)),
            VideoCodec::Vp8 => Self::Vp8(RtpVp8Depacketizer::new(max_frame_size)),
        }
    }

    fn depacketize(&mut self, packets: &[RtpTrivialPacket]) -> Option<DepacketizedFrame> {
        match self {
            Self::H264(depacketizer) => depacketizer.depacketize(packets).unwrap_or_else(|err| {
                tracing::warn!("h264 depacketize failed: {}", err);
                None
            }),
            Self::Vp8(depacketizer) => depacketizer.depacketize(packets).unwrap_or_else(|err| {
                tracing::warn!("vp8 depacketize failed: {}", err);
                None
            }),
        }
    }
}

/// Per-SSRC reassembly state.
///
/// Packets of the in-progress timestamp are buffered until the marker-bit
/// packet and every packet before it have arrived, then sorted with the
/// wraparound-aware comparator and handed to the codec depacketizer. A new
/// timestamp showing up before that discards the unfinished frame.
pub struct VideoStream {
    index: usize,
    codec: VideoCodec,
    remote_addr: SocketAddr,
    max_frame_size: usize,
    depacketizer: FrameDepacketizer,

    last_sequence_number: Option<SequenceNumber>,
    pending_timestamp: Option<u32>,
    pending_packets: Vec<RtpTrivialPacket>,
    pending_bytes: usize,
    pending_marker: Option<SequenceNumber>,
    /// first sequence number of the frame being assembled, known once the
    /// previous frame closed cleanly
    expected_frame_start: Option<SequenceNumber>,
    /// set after an oversize reset, the rest of the poisoned frame is
    /// dropped up to and including its marker packet
    discard_until_marker: bool,
}

impl VideoStream {
    pub(crate) fn new(
        index: usize,
        codec: VideoCodec,
        remote_addr: SocketAddr,
        max_frame_size: usize,
    ) -> Self {
        Self {
            index,
            codec,
            remote_addr,
            max_frame_size,
            depacketizer: FrameDepacketizer::new(codec, max_frame_size),
            last_sequence_number: None,
            pending_timestamp: None,
            pending_packets: Vec::new(),
            pending_bytes: 0,
            pending_marker: None,
            expected_frame_start: None,
            discard_until_marker: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub(crate) fn rebind_endpoint(&mut self, remote_addr: SocketAddr) {
        tracing::info!(
            "stream {} rebinds remote endpoint {} -> {}",
            self.index,
            self.remote_addr,
            remote_addr
        );
        self.remote_addr = remote_addr;
    }

    /// Whether a packet from `observed` may be attributed to this stream.
    /// Either endpoint changes are allowed globally, or the expected
    /// endpoint is private and the observed one is public (nat traversal).
    pub(crate) fn accepts_endpoint(&self, observed: SocketAddr, accept_any: bool) -> bool {
        observed == self.remote_addr
            || accept_any
            || (is_private_address(&self.remote_addr) && !is_private_address(&observed))
    }

    pub(crate) fn on_rtp_packet(
        &mut self,
        packet: RtpTrivialPacket,
        statistics: &mut ReceiverStatistics,
    ) -> Vec<(u32, DepacketizedFrame)> {
        let sequence_number = SequenceNumber(packet.header.sequence_number);
        if let Some(last) = self.last_sequence_number {
            if !sequence_number.is_successor_of(last) {
                statistics.sequence_jumps += 1;
                tracing::warn!(
                    "sequence jump on stream {}: expect {} got {}",
                    self.index,
                    last.next().value(),
                    sequence_number.value()
                );
            }
        }
        self.last_sequence_number = Some(sequence_number);

        let mut frames = Vec::new();
        let timestamp = packet.header.timestamp;
        match self.pending_timestamp {
            Some(pending) if pending != timestamp => {
                // a buffered frame whose marker already arrived is complete
                // except for predecessors that are evidently lost, emit it
                // late instead of discarding
                if let Some(frame) = self.flush_pending_frame(statistics) {
                    frames.push(frame);
                } else if !self.pending_packets.is_empty() {
                    // an oversize reset already counted the poisoned frame
                    statistics.frames_discarded += 1;
                    tracing::warn!(
                        "stream {} discards unfinished frame at timestamp {}: timestamp moved to {}",
                        self.index,
                        pending,
                        timestamp
                    );
                    self.expected_frame_start = None;
                }
                self.reset_assembly();
                self.discard_until_marker = false;
                self.pending_timestamp = Some(timestamp);
            }
            None => self.pending_timestamp = Some(timestamp),
            _ => {}
        }

        if self.discard_until_marker {
            if packet.header.marker {
                self.discard_until_marker = false;
                self.pending_timestamp = None;
            }
            return frames;
        }

        if self
            .pending_packets
            .iter()
            .any(|pending| pending.header.sequence_number == packet.header.sequence_number)
        {
            tracing::debug!(
                "stream {} drops duplicate packet, sequence number {}",
                self.index,
                packet.header.sequence_number
            );
            return frames;
        }

        self.pending_bytes += packet.payload.len();
        if self.pending_bytes > self.max_frame_size {
            statistics.frames_discarded += 1;
            tracing::warn!(
                "stream {} reassembly exceeds max frame size {}, dropping frame at timestamp {}",
                self.index,
                self.max_frame_size,
                timestamp
            );
            self.reset_assembly();
            self.expected_frame_start = None;
            if packet.header.marker {
                self.pending_timestamp = None;
            } else {
                self.discard_until_marker = true;
            }
            return frames;
        }

        if packet.header.marker {
            self.pending_marker = Some(sequence_number);
        }
        self.pending_packets.push(packet);
        if let Some(frame) = self.try_close_frame(statistics) {
            frames.push(frame);
        }
        frames
    }

    /// Close and depacketize once the marker packet and everything before
    /// it within the frame is buffered. The frame start is the packet after
    /// the previous frame's marker when that is known, otherwise the
    /// earliest sequence number seen.
    fn try_close_frame(
        &mut self,
        statistics: &mut ReceiverStatistics,
    ) -> Option<(u32, DepacketizedFrame)> {
        let marker = self.pending_marker?;
        let start = match self.expected_frame_start {
            Some(start) => start,
            None => self.buffered_minimum()?,
        };
        if !self.frame_is_complete(marker, start) {
            return None;
        }
        self.close_frame(marker, statistics)
    }

    /// Relaxed close used when the timestamp moves on: contiguity is only
    /// required from the earliest buffered packet, packets before that are
    /// treated as lost.
    fn flush_pending_frame(
        &mut self,
        statistics: &mut ReceiverStatistics,
    ) -> Option<(u32, DepacketizedFrame)> {
        let marker = self.pending_marker?;
        let start = self.buffered_minimum()?;
        if !self.frame_is_complete(marker, start) {
            return None;
        }
        self.close_frame(marker, statistics)
    }

    fn buffered_minimum(&self) -> Option<SequenceNumber> {
        self.pending_packets
            .iter()
            .map(|packet| SequenceNumber(packet.header.sequence_number))
            .min()
    }

    fn frame_is_complete(&self, marker: SequenceNumber, start: SequenceNumber) -> bool {
        let span = (marker.distance_from(start) as usize) + 1;
        span == self.pending_packets.len()
    }

    fn close_frame(
        &mut self,
        marker: SequenceNumber,
        statistics: &mut ReceiverStatistics,
    ) -> Option<(u32, DepacketizedFrame)> {
        self.pending_packets.sort_by(|left, right| {
            SequenceNumber(left.header.sequence_number)
                .cmp(&SequenceNumber(right.header.sequence_number))
        });

        let timestamp = self.pending_timestamp?;
        let frame = self.depacketizer.depacketize(&self.pending_packets);
        self.reset_assembly();
        self.pending_timestamp = None;
        self.expected_frame_start = Some(marker.next());

        match frame {
            None => {
                statistics.frames_discarded += 1;
                None
            }
            Some(frame) => Some((timestamp, frame)),
        }
    }

    pub(crate) fn reset_assembly(&mut self) {
        self.pending_packets.clear();
        self.pending_bytes = 0;
        self.pending_marker = None;
    }
}

fn is_private_address(addr: &SocketAddr) -> bool {
    match addr.ip() {
        std::net::IpAddr::V4(ip) => ip.is_private() || ip.is_loopback() || ip.is_link_local(),
        std::net::IpAddr::V6(ip) => ip.is_loopback() || (ip.segments()[0] & 0xFE00) == 0xFC00,
    }
}
