use std::io::{self, Cursor};

use tokio_util::bytes::Bytes;
use utils::traits::{
    dynamic_sized_packet::DynamicSizedPacket,
    reader::TryReadFrom,
    writer::WriteTo,
};

use crate::{
    errors::{RtpError, RtpResult},
    header::RtpHeader,
};

#[derive(Debug, Clone)]
pub struct RtpTrivialPacket {
    pub header: RtpHeader,
    pub payload: Bytes,
}

impl RtpTrivialPacket {
    pub fn new(header: RtpHeader, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Parse a whole UDP datagram as one rtp packet.
    ///
    /// The payload is sliced out of the datagram buffer without copying,
    /// with trailing padding removed when the padding flag is set.
    pub fn from_datagram(bytes: Bytes) -> RtpResult<Self> {
        let mut cursor = Cursor::new(bytes.as_ref());
        let header = match RtpHeader::try_read_from(&mut cursor)? {
            Some(header) => header,
            None => return Err(RtpError::HeaderTooShort(bytes.len())),
        };

        let payload_offset = cursor.position() as usize;
        let mut payload = bytes.slice(payload_offset..);
        if header.padding {
            let padding_size = match payload.last() {
                None => return Err(RtpError::EmptyPayload),
                Some(last_byte) => *last_byte as usize,
            };
            if padding_size == 0 || padding_size > payload.len() {
                return Err(RtpError::BadPaddingSize(padding_size));
            }
            payload = payload.slice(..payload.len() - padding_size);
        }

        Ok(Self { header, payload })
    }
}

impl DynamicSizedPacket for RtpTrivialPacket {
    fn get_packet_bytes_count(&self) -> usize {
        self.header.get_packet_bytes_count() + self.payload.len()
    }
}

impl<W: io::Write> WriteTo<W> for RtpTrivialPacket {
    type Error = RtpError;
    fn write_to(&self, mut writer: W) -> Result<(), Self::Error> {
        self.header.write_to(writer.by_ref())?;
        writer.write_all(&self.payload)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use tokio_util::bytes::BytesMut;

    use super::*;
    use crate::header::RtpHeaderExtension;

    fn serialize(packet: &RtpTrivialPacket) -> Bytes {
        let mut bytes = Vec::new();
        packet.write_to(&mut bytes).unwrap();
        Bytes::from(bytes)
    }

    #[test]
    fn test_datagram_round_trip() {
        let packet = RtpTrivialPacket::new(
            RtpHeader {
                marker: true,
                payload_type: 96,
                sequence_number: 4242,
                timestamp: 90000,
                ssrc: 0xDEADBEEF,
                ..Default::default()
            },
            Bytes::from_static(&[0x65, 1, 2, 3]),
        );

        let parsed = RtpTrivialPacket::from_datagram(serialize(&packet)).unwrap();
        assert!(parsed.header.marker);
        assert_eq!(parsed.header.payload_type, 96);
        assert_eq!(parsed.header.sequence_number, 4242);
        assert_eq!(parsed.header.timestamp, 90000);
        assert_eq!(parsed.header.ssrc, 0xDEADBEEF);
        assert_eq!(parsed.payload.as_ref(), &[0x65, 1, 2, 3]);
    }

    #[test]
    fn test_payload_region_with_csrc_and_extension() {
        // any legal csrc count plus an extension block must leave the
        // payload slice byte-identical to the datagram's payload region
        for csrc_count in 0..=15_usize {
            let packet = RtpTrivialPacket::new(
                RtpHeader {
                    extension: true,
                    csrc_count: csrc_count as u8,
                    payload_type: 97,
                    sequence_number: 7,
                    timestamp: 1234,
                    ssrc: 42,
                    csrc_list: (0..csrc_count as u32).collect(),
                    header_extension: Some(RtpHeaderExtension {
                        profile_defined: 0xBEDE,
                        length: 2,
                        bytes: BytesMut::from(&[0xAB; 8][..]),
                    }),
                    ..Default::default()
                },
                Bytes::from_static(&[0x41, 0x9A, 0x27, 0xFE]),
            );

            let datagram = serialize(&packet);
            let parsed = RtpTrivialPacket::from_datagram(datagram.clone()).unwrap();
            let header_size = 12 + csrc_count * 4 + 4 + 8;
            assert_eq!(parsed.payload.as_ref(), &datagram[header_size..]);
            assert_eq!(parsed.header.csrc_list.len(), csrc_count);
        }
    }

    #[test]
    fn test_trailing_padding_is_stripped() {
        let mut datagram = Vec::new();
        let packet = RtpTrivialPacket::new(
            RtpHeader {
                padding: true,
                payload_type: 96,
                ..Default::default()
            },
            Bytes::from_static(&[1, 2, 3, 4, 5]),
        );
        packet.write_to(&mut datagram).unwrap();
        // three bytes of padding, the last one carries the padding length
        datagram.extend_from_slice(&[0, 0, 3]);

        let parsed = RtpTrivialPacket::from_datagram(Bytes::from(datagram)).unwrap();
        assert_eq!(parsed.payload.as_ref(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_bad_padding_size_is_rejected() {
        let mut datagram = Vec::new();
        RtpTrivialPacket::new(
            RtpHeader {
                padding: true,
                ..Default::default()
            },
            Bytes::from_static(&[1, 2]),
        )
        .write_to(&mut datagram)
        .unwrap();
        datagram.push(200);

        assert!(matches!(
            RtpTrivialPacket::from_datagram(Bytes::from(datagram)),
            Err(RtpError::BadPaddingSize(200))
        ));
    }

    #[test]
    fn test_short_datagram_is_rejected() {
        assert!(matches!(
            RtpTrivialPacket::from_datagram(Bytes::from_static(&[0x80, 96, 0, 1])),
            Err(RtpError::HeaderTooShort(4))
        ));
    }

    #[test]
    fn test_wrong_version_is_rejected() {
        let mut datagram = vec![0; 16];
        datagram[0] = 0x40; // version 1
        assert!(matches!(
            RtpTrivialPacket::from_datagram(Bytes::from(datagram)),
            Err(RtpError::UnsupportedVersion(1))
        ));
    }
}
