use std::io::{self};

use tokio_util::bytes::Buf;
use utils::traits::{
    dynamic_sized_packet::DynamicSizedPacket,
    reader::{TryReadFrom, TryReadRemainingFrom},
    writer::WriteTo,
};

use crate::errors::RtpError;

use super::{RtcpPacket, common_header::RtcpCommonHeader};

/// A sequence of rtcp packets sharing one udp datagram.
///
/// Parsing walks common headers and is deliberately lenient: packet types
/// the receiver does not model are preserved raw instead of rejected.
#[derive(Debug, Clone, Default)]
pub struct RtcpCompoundPacket(Vec<RtcpPacket>);

impl RtcpCompoundPacket {
    pub fn new(packets: Vec<RtcpPacket>) -> Self {
        Self(packets)
    }

    pub fn packets(&self) -> &[RtcpPacket] {
        &self.0
    }

    pub fn append(&mut self, packet: RtcpPacket) {
        self.0.push(packet);
    }
}

impl DynamicSizedPacket for RtcpCompoundPacket {
    fn get_packet_bytes_count(&self) -> usize {
        self.0
            .iter()
            .fold(0, |sum, packet| sum + packet.get_packet_bytes_count())
    }
}

impl<R: AsRef<[u8]>> TryReadFrom<R> for RtcpCompoundPacket {
    type Error = RtpError;
    fn try_read_from(reader: &mut std::io::Cursor<R>) -> Result<Option<Self>, Self::Error> {
        let mut packets = vec![];
        while reader.has_remaining() {
            let header = match RtcpCommonHeader::try_read_from(reader)? {
                None => break,
                Some(header) => header,
            };
            match RtcpPacket::try_read_remaining_from(header, reader)? {
                None => return Ok(None),
                Some(packet) => packets.push(packet),
            }
        }
        Ok(Some(Self(packets)))
    }
}

impl<W: io::Write> WriteTo<W> for RtcpCompoundPacket {
    type Error = RtpError;
    fn write_to(&self, mut writer: W) -> Result<(), Self::Error> {
        self.0
            .iter()
            .try_for_each(|packet| packet.write_to(writer.by_ref()))
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::rtcp::{
        bye::RtcpByePacket, payload_types::RtcpPayloadType, receiver_report::RtcpReceiverReport,
        report_block::ReportBlock,
    };

    #[test]
    fn test_compound_rr_and_bye_round_trip() {
        let compound = RtcpCompoundPacket::new(vec![
            RtcpPacket::ReceiverReport(
                RtcpReceiverReport::builder()
                    .ssrc(0xCAFE)
                    .report_block(ReportBlock::builder().ssrc(0xFEED).build())
                    .build()
                    .unwrap(),
            ),
            RtcpPacket::Bye(RtcpByePacket::builder().ssrc(0xFEED).build()),
        ]);

        let mut bytes = Vec::new();
        compound.write_to(&mut bytes).unwrap();

        let parsed = RtcpCompoundPacket::try_read_from(&mut Cursor::new(&bytes[..]))
            .unwrap()
            .unwrap();
        assert_eq!(parsed.packets().len(), 2);
        assert_eq!(
            parsed.packets()[0].payload_type(),
            RtcpPayloadType::ReceiverReport
        );
        match &parsed.packets()[1] {
            RtcpPacket::Bye(bye) => assert_eq!(bye.ssrc_list, vec![0xFEED]),
            other => panic!("expect bye packet, got {:?}", other),
        }
    }

    #[test]
    fn test_unmodeled_packet_kept_raw() {
        // an sdes packet with one chunk: ssrc + cname item + null terminator
        let mut bytes: Vec<u8> = vec![
            0x81, 202, 0, 3, // header, length 3 words
            0, 0, 0, 42, // ssrc
            1, 2, b'h', b'i', // cname, length 2
            0, 0, 0, 0, // item list terminator + padding to word
        ];
        let rr = RtcpReceiverReport::builder().ssrc(7).build().unwrap();
        let mut datagram = Vec::new();
        rr.write_to(&mut datagram).unwrap();
        datagram.append(&mut bytes);

        let parsed = RtcpCompoundPacket::try_read_from(&mut Cursor::new(&datagram[..]))
            .unwrap()
            .unwrap();
        assert_eq!(parsed.packets().len(), 2);
        match &parsed.packets()[1] {
            RtcpPacket::Other(packet) => {
                assert_eq!(
                    packet.header.payload_type,
                    RtcpPayloadType::SourceDescription
                );
                assert_eq!(packet.payload.len(), 12);
            }
            other => panic!("expect raw sdes packet, got {:?}", other),
        }
    }
}
