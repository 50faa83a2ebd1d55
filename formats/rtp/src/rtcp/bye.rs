use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use tokio_util::bytes::Bytes;
use utils::traits::{
    dynamic_sized_packet::DynamicSizedPacket, fixed_packet::FixedPacket,
    reader::ReadRemainingFrom, writer::WriteTo,
};

use crate::{
    errors::{RtpError, RtpResult},
    util::padding::{rtp_get_padding_size, rtp_make_padding_bytes, rtp_need_padding},
};

use super::{RtcpPacketTrait, common_header::RtcpCommonHeader, payload_types::RtcpPayloadType};

// @see: RFC 3550 6.6 BYE: Goodbye RTCP Packet
/// ```text
///        0                   1                   2                   3
///        0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///       +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///       |V=2|P|    SC   |   PT=BYE=203  |            length             |
///       +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///       |                             SSRC/CSRC                         |
///       +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///       :                               ...                             :
///       +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
/// (opt) |     length    |             reason for leaving              ...
///       +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Default)]
pub struct RtcpByePacket {
    pub header: RtcpCommonHeader,
    pub ssrc_list: Vec<u32>,
    pub leave_reason: Option<Bytes>,
}

impl RtcpByePacket {
    pub fn reason_string(&self) -> Option<String> {
        self.leave_reason
            .as_ref()
            .map(|reason| String::from_utf8_lossy(reason).into_owned())
    }
}

impl DynamicSizedPacket for RtcpByePacket {
    fn get_packet_bytes_count(&self) -> usize {
        let raw_size = self.get_packet_bytes_count_without_padding();
        raw_size + rtp_get_padding_size(raw_size)
    }
}

impl RtcpPacketTrait for RtcpByePacket {
    fn get_packet_bytes_count_without_padding(&self) -> usize {
        RtcpCommonHeader::bytes_count()
            + self.ssrc_list.len() * 4
            + self
                .leave_reason
                .as_ref()
                .map_or(0, |reason| reason.len() + 1)
    }
    fn get_header(&self) -> RtcpCommonHeader {
        let raw_size = self.get_packet_bytes_count_without_padding();
        RtcpCommonHeader {
            version: 2,
            padding: rtp_need_padding(raw_size),
            count: self.ssrc_list.len() as u8,
            payload_type: RtcpPayloadType::Bye,
            length: (self.get_packet_bytes_count() / 4 - 1) as u16,
        }
    }
}

impl<R: io::Read> ReadRemainingFrom<RtcpCommonHeader, R> for RtcpByePacket {
    type Error = RtpError;
    fn read_remaining_from(header: RtcpCommonHeader, mut reader: R) -> Result<Self, Self::Error> {
        if header.payload_type != RtcpPayloadType::Bye {
            return Err(RtpError::WrongPayloadType(format!(
                "expect bye payload type got {:?} instead",
                header.payload_type
            )));
        }
        let mut ssrc_list = Vec::with_capacity(header.count as usize);
        for _ in 0..header.count {
            ssrc_list.push(reader.read_u32::<BigEndian>()?);
        }

        let leave_reason = match reader.read_u8() {
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => None,
            Err(err) => return Err(err.into()),
            Ok(reason_length) => {
                let mut reason = vec![0; reason_length as usize];
                reader.read_exact(&mut reason)?;
                Some(Bytes::from(reason))
            }
        };

        Ok(Self {
            header,
            ssrc_list,
            leave_reason,
        })
    }
}

impl<W: io::Write> WriteTo<W> for RtcpByePacket {
    type Error = RtpError;
    fn write_to(&self, mut writer: W) -> Result<(), Self::Error> {
        self.get_header().write_to(writer.by_ref())?;
        self.ssrc_list
            .iter()
            .try_for_each(|ssrc| writer.write_u32::<BigEndian>(*ssrc))?;

        if let Some(reason) = &self.leave_reason {
            writer.write_u8(reason.len() as u8)?;
            writer.write_all(reason)?;
        }

        if let Some(padding) = rtp_make_padding_bytes(self.get_packet_bytes_count_without_padding())
        {
            writer.write_all(&padding)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RtcpByePacketBuilder(RtcpByePacket);

impl RtcpByePacket {
    pub fn builder() -> RtcpByePacketBuilder {
        Default::default()
    }
}

impl RtcpByePacketBuilder {
    pub fn ssrc(mut self, ssrc: u32) -> Self {
        self.0.ssrc_list.push(ssrc);
        self
    }

    pub fn reason(mut self, reason: &str) -> RtpResult<Self> {
        if reason.len() > u8::MAX as usize {
            return Err(RtpError::ByeReasonTooLarge(reason.to_owned()));
        }
        self.0.leave_reason = Some(Bytes::copy_from_slice(reason.as_bytes()));
        Ok(self)
    }

    pub fn build(mut self) -> RtcpByePacket {
        self.0.header = self.0.get_header();
        self.0
    }
}
