use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use utils::traits::{fixed_packet::FixedPacket, reader::ReadFrom, writer::WriteTo};

use crate::errors::RtpError;

use super::simple_ntp::SimpleShortNtp;

// @see: RFC 3550 6.4.1, report block
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 SSRC_1 (SSRC of first source)                 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | fraction lost |       cumulative number of packets lost       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           extended highest sequence number received           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      interarrival jitter                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         last SR (LSR)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   delay since last SR (DLSR)                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Default, Clone)]
pub struct ReportBlock {
    pub ssrc: u32,
    pub fraction_lost: f64,
    pub cumulative_packet_lost: i32,
    pub highest_sequence_number_received: u16,
    pub sequence_number_cycles: u16,
    pub interarrival_jitter: u32,
    /// LSR, at byte offset 16 of the block
    pub last_sender_report_timestamp: SimpleShortNtp,
    /// DLSR in units of 1/65536 seconds, at byte offset 20 of the block;
    /// zero when no SR has been received from this source yet
    pub delay_since_last_sender_report: u32,
}

impl FixedPacket for ReportBlock {
    fn bytes_count() -> usize {
        24
    }
}

impl<R: io::Read> ReadFrom<R> for ReportBlock {
    type Error = RtpError;
    fn read_from(mut reader: R) -> Result<Self, Self::Error> {
        let ssrc = reader.read_u32::<BigEndian>()?;
        let fraction_lost = reader.read_u8()?;
        let cumulative_packet_lost = reader.read_i24::<BigEndian>()?;
        let sequence_number_cycles = reader.read_u16::<BigEndian>()?;
        let highest_sequence_number_received = reader.read_u16::<BigEndian>()?;
        let interarrival_jitter = reader.read_u32::<BigEndian>()?;
        let last_sender_report_timestamp = reader.read_u32::<BigEndian>()?;
        let delay_since_last_sender_report = reader.read_u32::<BigEndian>()?;
        Ok(Self {
            ssrc,
            fraction_lost: fraction_lost as f64 / 256.0,
            cumulative_packet_lost,
            highest_sequence_number_received,
            sequence_number_cycles,
            interarrival_jitter,
            last_sender_report_timestamp: last_sender_report_timestamp.into(),
            delay_since_last_sender_report,
        })
    }
}

impl<W: io::Write> WriteTo<W> for ReportBlock {
    type Error = RtpError;
    fn write_to(&self, mut writer: W) -> Result<(), Self::Error> {
        writer.write_u32::<BigEndian>(self.ssrc)?;
        writer.write_u8((self.fraction_lost * 256.0) as u8)?;
        writer.write_i24::<BigEndian>(self.cumulative_packet_lost)?;
        writer.write_u16::<BigEndian>(self.sequence_number_cycles)?;
        writer.write_u16::<BigEndian>(self.highest_sequence_number_received)?;
        writer.write_u32::<BigEndian>(self.interarrival_jitter)?;
        writer.write_u32::<BigEndian>(self.last_sender_report_timestamp.into())?;
        writer.write_u32::<BigEndian>(self.delay_since_last_sender_report)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ReportBlockBuilder(ReportBlock);

impl ReportBlock {
    pub fn builder() -> ReportBlockBuilder {
        Default::default()
    }
}

impl ReportBlockBuilder {
    pub fn ssrc(mut self, ssrc: u32) -> Self {
        self.0.ssrc = ssrc;
        self
    }

    pub fn fraction_lost(mut self, fraction_lost: f64) -> Self {
        self.0.fraction_lost = fraction_lost;
        self
    }

    pub fn cumulative_packet_lost(mut self, cumulative_packet_lost: i32) -> Self {
        self.0.cumulative_packet_lost = cumulative_packet_lost;
        self
    }

    pub fn highest_sequence_number_received(mut self, sequence_number: u16) -> Self {
        self.0.highest_sequence_number_received = sequence_number;
        self
    }

    pub fn highest_sequence_number_cycles(mut self, cycles: u16) -> Self {
        self.0.sequence_number_cycles = cycles;
        self
    }

    pub fn interarrival_jitter(mut self, jitter: u32) -> Self {
        self.0.interarrival_jitter = jitter;
        self
    }

    pub fn last_sr<T: Into<SimpleShortNtp>>(mut self, lsr: T) -> Self {
        self.0.last_sender_report_timestamp = lsr.into();
        self
    }

    pub fn delay_since_last_sr(mut self, dlsr: u32) -> Self {
        self.0.delay_since_last_sender_report = dlsr;
        self
    }

    pub fn build(self) -> ReportBlock {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lsr_and_dlsr_occupy_distinct_words() {
        let block = ReportBlock::builder()
            .ssrc(0x01020304)
            .last_sr(0xAABBCCDD_u32)
            .delay_since_last_sr(0x00010000)
            .build();

        let mut bytes = Vec::new();
        block.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), ReportBlock::bytes_count());
        assert_eq!(&bytes[16..20], &[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(&bytes[20..24], &[0x00, 0x01, 0x00, 0x00]);

        let parsed = ReportBlock::read_from(&bytes[..]).unwrap();
        assert_eq!(
            u32::from(parsed.last_sender_report_timestamp),
            0xAABBCCDD_u32
        );
        assert_eq!(parsed.delay_since_last_sender_report, 0x00010000);
    }

    #[test]
    fn test_report_block_round_trip() {
        let block = ReportBlock::builder()
            .ssrc(42)
            .fraction_lost(0.5)
            .cumulative_packet_lost(-3)
            .highest_sequence_number_received(0xFFFF)
            .highest_sequence_number_cycles(2)
            .interarrival_jitter(100)
            .build();

        let mut bytes = Vec::new();
        block.write_to(&mut bytes).unwrap();
        let parsed = ReportBlock::read_from(&bytes[..]).unwrap();
        assert_eq!(parsed.ssrc, 42);
        assert_eq!(parsed.fraction_lost, 0.5);
        assert_eq!(parsed.cumulative_packet_lost, -3);
        assert_eq!(parsed.highest_sequence_number_received, 0xFFFF);
        assert_eq!(parsed.sequence_number_cycles, 2);
        assert_eq!(parsed.interarrival_jitter, 100);
    }
}
