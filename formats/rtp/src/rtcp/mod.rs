use std::io::{self, Cursor, Read};

use bye::RtcpByePacket;
use common_header::RtcpCommonHeader;
use payload_types::RtcpPayloadType;
use receiver_report::RtcpReceiverReport;
use sender_report::RtcpSenderReport;
use tokio_util::bytes::{Buf, Bytes};
use utils::traits::{
    dynamic_sized_packet::DynamicSizedPacket,
    fixed_packet::FixedPacket,
    reader::{ReadRemainingFrom, TryReadRemainingFrom},
    writer::WriteTo,
};

use crate::{errors::RtpError, util::padding::rtp_get_padding_size};

pub mod bye;
pub mod common_header;
pub mod compound_packet;
pub mod payload_types;
pub mod receiver_report;
pub mod report_block;
pub mod sender_report;
pub mod simple_ntp;

pub trait RtcpPacketTrait: DynamicSizedPacket {
    fn get_packet_bytes_count_without_padding(&self) -> usize;
    fn get_header(&self) -> RtcpCommonHeader;
}

/// An rtcp packet type the receiver does not model: SDES, APP and the
/// feedback messages. The body is kept raw, padding stripped.
#[derive(Debug, Clone)]
pub struct RtcpTrivialPacket {
    pub header: RtcpCommonHeader,
    pub payload: Bytes,
}

impl DynamicSizedPacket for RtcpTrivialPacket {
    fn get_packet_bytes_count(&self) -> usize {
        let raw_size = self.get_packet_bytes_count_without_padding();
        raw_size + rtp_get_padding_size(raw_size)
    }
}

impl RtcpPacketTrait for RtcpTrivialPacket {
    fn get_packet_bytes_count_without_padding(&self) -> usize {
        RtcpCommonHeader::bytes_count() + self.payload.len()
    }
    fn get_header(&self) -> RtcpCommonHeader {
        self.header.clone()
    }
}

#[derive(Debug, Clone)]
pub enum RtcpPacket {
    SenderReport(RtcpSenderReport),
    ReceiverReport(RtcpReceiverReport),
    Bye(RtcpByePacket),
    Other(RtcpTrivialPacket),
}

impl RtcpPacket {
    pub fn payload_type(&self) -> RtcpPayloadType {
        match self {
            RtcpPacket::SenderReport(_) => RtcpPayloadType::SenderReport,
            RtcpPacket::ReceiverReport(_) => RtcpPayloadType::ReceiverReport,
            RtcpPacket::Bye(_) => RtcpPayloadType::Bye,
            RtcpPacket::Other(packet) => packet.header.payload_type,
        }
    }

    pub fn sender_ssrc(&self) -> Option<u32> {
        match self {
            RtcpPacket::SenderReport(packet) => Some(packet.sender_ssrc),
            RtcpPacket::ReceiverReport(packet) => Some(packet.sender_ssrc),
            RtcpPacket::Bye(_) | RtcpPacket::Other(_) => None,
        }
    }
}

impl DynamicSizedPacket for RtcpPacket {
    fn get_packet_bytes_count(&self) -> usize {
        match self {
            RtcpPacket::SenderReport(packet) => packet.get_packet_bytes_count(),
            RtcpPacket::ReceiverReport(packet) => packet.get_packet_bytes_count(),
            RtcpPacket::Bye(packet) => packet.get_packet_bytes_count(),
            RtcpPacket::Other(packet) => packet.get_packet_bytes_count(),
        }
    }
}

impl<R: AsRef<[u8]>> TryReadRemainingFrom<RtcpCommonHeader, R> for RtcpPacket {
    type Error = RtpError;
    fn try_read_remaining_from(
        header: RtcpCommonHeader,
        reader: &mut Cursor<R>,
    ) -> Result<Option<Self>, Self::Error> {
        let bytes_remaining = (header.length as usize) * 4;
        if reader.remaining() < bytes_remaining {
            return Ok(None);
        }

        let mut remaining_bytes = vec![0_u8; bytes_remaining];
        reader.read_exact(&mut remaining_bytes)?;

        if header.padding && !remaining_bytes.is_empty() {
            let padding_size = *remaining_bytes.last().unwrap() as usize;
            if padding_size == 0 || padding_size > remaining_bytes.len() {
                return Err(RtpError::BadPaddingSize(padding_size));
            }
            remaining_bytes.truncate(remaining_bytes.len() - padding_size);
        }

        let cursor = Cursor::new(&remaining_bytes);
        match header.payload_type {
            RtcpPayloadType::SenderReport => Ok(Some(Self::SenderReport(
                RtcpSenderReport::read_remaining_from(header, cursor)?,
            ))),
            RtcpPayloadType::ReceiverReport => Ok(Some(Self::ReceiverReport(
                RtcpReceiverReport::read_remaining_from(header, cursor)?,
            ))),
            RtcpPayloadType::Bye => Ok(Some(Self::Bye(RtcpByePacket::read_remaining_from(
                header, cursor,
            )?))),
            RtcpPayloadType::SourceDescription
            | RtcpPayloadType::App
            | RtcpPayloadType::TransportLayerFeedback
            | RtcpPayloadType::PayloadSpecificFeedback => Ok(Some(Self::Other(RtcpTrivialPacket {
                header,
                payload: Bytes::from(remaining_bytes),
            }))),
        }
    }
}

impl<W: io::Write> WriteTo<W> for RtcpPacket {
    type Error = RtpError;
    fn write_to(&self, mut writer: W) -> Result<(), Self::Error> {
        match self {
            RtcpPacket::SenderReport(packet) => packet.write_to(writer),
            RtcpPacket::ReceiverReport(packet) => packet.write_to(writer),
            RtcpPacket::Bye(packet) => packet.write_to(writer),
            RtcpPacket::Other(packet) => {
                packet.header.write_to(writer.by_ref())?;
                writer.write_all(&packet.payload)?;
                Ok(())
            }
        }
    }
}
