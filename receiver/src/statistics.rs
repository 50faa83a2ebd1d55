use std::fmt;

/// Counters the router maintains while recovering from malformed or
/// unexpected traffic. All drops are local, nothing propagates.
#[derive(Default)]
pub struct ReceiverStatistics {
    pub(crate) rtp_packets_received: u64,
    pub(crate) rtp_bytes_received: u64,
    pub(crate) rtcp_compound_packets_received: u64,
    pub(crate) rtcp_packets_received: u64,
    pub(crate) malformed_dropped: u64,
    pub(crate) unknown_payload_dropped: u64,
    pub(crate) endpoint_mismatch_dropped: u64,
    pub(crate) sequence_jumps: u64,
    pub(crate) frames_emitted: u64,
    pub(crate) frames_discarded: u64,
    pub(crate) byes_received: u64,
}

impl ReceiverStatistics {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn rtp_packets_received(&self) -> u64 {
        self.rtp_packets_received
    }

    pub fn rtcp_compound_packets_received(&self) -> u64 {
        self.rtcp_compound_packets_received
    }

    pub fn malformed_dropped(&self) -> u64 {
        self.malformed_dropped
    }

    pub fn unknown_payload_dropped(&self) -> u64 {
        self.unknown_payload_dropped
    }

    pub fn endpoint_mismatch_dropped(&self) -> u64 {
        self.endpoint_mismatch_dropped
    }

    pub fn sequence_jumps(&self) -> u64 {
        self.sequence_jumps
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    pub fn frames_discarded(&self) -> u64 {
        self.frames_discarded
    }

    pub fn byes_received(&self) -> u64 {
        self.byes_received
    }
}

impl fmt::Debug for ReceiverStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rtp packets received: {}", self.rtp_packets_received)?;
        writeln!(f, "rtp bytes received: {}", self.rtp_bytes_received)?;
        writeln!(
            f,
            "rtcp compound packets received: {}",
            self.rtcp_compound_packets_received
        )?;
        writeln!(f, "rtcp packets received: {}", self.rtcp_packets_received)?;
        writeln!(f, "malformed datagrams dropped: {}", self.malformed_dropped)?;
        writeln!(
            f,
            "unknown payload type dropped: {}",
            self.unknown_payload_dropped
        )?;
        writeln!(
            f,
            "endpoint mismatches dropped: {}",
            self.endpoint_mismatch_dropped
        )?;
        writeln!(f, "sequence jumps: {}", self.sequence_jumps)?;
        writeln!(f, "frames emitted: {}", self.frames_emitted)?;
        writeln!(f, "frames discarded: {}", self.frames_discarded)?;
        writeln!(f, "byes received: {}", self.byes_received)?;
        Ok(())
    }
}

impl Drop for ReceiverStatistics {
    fn drop(&mut self) {
        tracing::info!("rtp receiver statistics: \n{:?}", self);
    }
}
