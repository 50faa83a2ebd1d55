use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use tokio_util::bytes::Bytes;
use utils::traits::{
    dynamic_sized_packet::DynamicSizedPacket,
    fixed_packet::FixedPacket,
    reader::{ReadFrom, ReadRemainingFrom},
    writer::WriteTo,
};

use crate::{
    errors::{RtpError, RtpResult},
    util::padding::{rtp_get_padding_size, rtp_make_padding_bytes, rtp_need_padding},
};

use super::{
    RtcpPacketTrait, common_header::RtcpCommonHeader, payload_types::RtcpPayloadType,
    report_block::ReportBlock, simple_ntp::SimpleNtp,
};

// @see: RFC 3550 6.4.1 SR: Sender Report RTCP Packet, sender info section
#[derive(Debug, Default, Clone)]
pub struct SenderInfo {
    pub ntp_timestamp: SimpleNtp,
    pub rtp_timestamp: u32,
    pub sender_packet_count: u32,
    pub sender_octet_count: u32,
}

impl FixedPacket for SenderInfo {
    fn bytes_count() -> usize {
        20
    }
}

impl<R: io::Read> ReadFrom<R> for SenderInfo {
    type Error = RtpError;
    fn read_from(mut reader: R) -> Result<Self, Self::Error> {
        Ok(Self {
            ntp_timestamp: reader.read_u64::<BigEndian>()?.into(),
            rtp_timestamp: reader.read_u32::<BigEndian>()?,
            sender_packet_count: reader.read_u32::<BigEndian>()?,
            sender_octet_count: reader.read_u32::<BigEndian>()?,
        })
    }
}

impl<W: io::Write> WriteTo<W> for SenderInfo {
    type Error = RtpError;
    fn write_to(&self, mut writer: W) -> Result<(), Self::Error> {
        writer.write_u64::<BigEndian>(self.ntp_timestamp.into())?;
        writer.write_u32::<BigEndian>(self.rtp_timestamp)?;
        writer.write_u32::<BigEndian>(self.sender_packet_count)?;
        writer.write_u32::<BigEndian>(self.sender_octet_count)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct RtcpSenderReport {
    pub header: RtcpCommonHeader,
    pub sender_ssrc: u32,
    pub sender_info: SenderInfo,
    pub report_blocks: Vec<ReportBlock>,
    pub profile_specific_extension: Option<Bytes>,
}

impl DynamicSizedPacket for RtcpSenderReport {
    fn get_packet_bytes_count(&self) -> usize {
        let raw_size = self.get_packet_bytes_count_without_padding();
        raw_size + rtp_get_padding_size(raw_size)
    }
}

impl RtcpPacketTrait for RtcpSenderReport {
    fn get_packet_bytes_count_without_padding(&self) -> usize {
        RtcpCommonHeader::bytes_count()
            + 4 // sender ssrc
            + SenderInfo::bytes_count()
            + self.report_blocks.len() * ReportBlock::bytes_count()
            + self
                .profile_specific_extension
                .as_ref()
                .map_or(0, |extension| extension.len())
    }
    fn get_header(&self) -> RtcpCommonHeader {
        let raw_size = self.get_packet_bytes_count_without_padding();
        RtcpCommonHeader {
            version: 2,
            padding: rtp_need_padding(raw_size),
            count: self.report_blocks.len() as u8,
            payload_type: RtcpPayloadType::SenderReport,
            length: (self.get_packet_bytes_count() / 4 - 1) as u16,
        }
    }
}

impl<R: io::Read> ReadRemainingFrom<RtcpCommonHeader, R> for RtcpSenderReport {
    type Error = RtpError;
    fn read_remaining_from(header: RtcpCommonHeader, mut reader: R) -> Result<Self, Self::Error> {
        if header.payload_type != RtcpPayloadType::SenderReport {
            return Err(RtpError::WrongPayloadType(format!(
                "expect sender report payload type got {:?} instead",
                header.payload_type
            )));
        }

        let sender_ssrc = reader.read_u32::<BigEndian>()?;
        let sender_info = SenderInfo::read_from(reader.by_ref())?;
        let mut report_blocks = Vec::with_capacity(header.count as usize);
        for _ in 0..header.count {
            report_blocks.push(ReportBlock::read_from(reader.by_ref())?);
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let profile_specific_extension = if buffer.is_empty() {
            None
        } else {
            Some(Bytes::from(buffer))
        };

        Ok(Self {
            header,
            sender_ssrc,
            sender_info,
            report_blocks,
            profile_specific_extension,
        })
    }
}

impl<W: io::Write> WriteTo<W> for RtcpSenderReport {
    type Error = RtpError;
    fn write_to(&self, mut writer: W) -> Result<(), Self::Error> {
        let raw_size = self.get_packet_bytes_count_without_padding();
        self.get_header().write_to(writer.by_ref())?;
        writer.write_u32::<BigEndian>(self.sender_ssrc)?;
        self.sender_info.write_to(writer.by_ref())?;
        self.report_blocks
            .iter()
            .try_for_each(|block| block.write_to(writer.by_ref()))?;

        if let Some(buffer) = &self.profile_specific_extension {
            writer.write_all(buffer)?;
        }
        if let Some(padding) = rtp_make_padding_bytes(raw_size) {
            writer.write_all(&padding)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RtcpSenderReportBuilder(RtcpSenderReport);

impl RtcpSenderReport {
    pub fn builder() -> RtcpSenderReportBuilder {
        Default::default()
    }
}

impl RtcpSenderReportBuilder {
    pub fn ssrc(mut self, ssrc: u32) -> Self {
        self.0.sender_ssrc = ssrc;
        self
    }

    pub fn sender_info(mut self, sender_info: SenderInfo) -> Self {
        self.0.sender_info = sender_info;
        self
    }

    pub fn report_block(mut self, block: ReportBlock) -> Self {
        self.0.report_blocks.push(block);
        self
    }

    pub fn build(mut self) -> RtpResult<RtcpSenderReport> {
        if self.0.report_blocks.len() > 31 {
            return Err(RtpError::TooManyReportBlocks);
        }
        self.0.header = self.0.get_header();
        Ok(self.0)
    }
}
