use tokio_util::bytes::BytesMut;
use utils::traits::{dynamic_sized_packet::DynamicSizedPacket, reader::ReadFrom};

use crate::{
    codec::DepacketizedFrame,
    codec::vp8::{
        descriptor::Vp8PayloadDescriptor,
        errors::{RtpVp8Error, RtpVp8Result},
    },
    packet::RtpTrivialPacket,
};

/// Rebuilds one vp8 frame from the rtp packets of a single timestamp,
/// handed over in sequence-number order. Descriptors are stripped and the
/// remaining payload bytes concatenated in packet order.
#[derive(Debug)]
pub struct RtpVp8Depacketizer {
    max_frame_size: usize,
}

impl RtpVp8Depacketizer {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    pub fn depacketize(
        &mut self,
        packets: &[RtpTrivialPacket],
    ) -> RtpVp8Result<Option<DepacketizedFrame>> {
        let mut frame = BytesMut::new();
        let mut is_key_frame = false;

        for (index, packet) in packets.iter().enumerate() {
            let descriptor = Vp8PayloadDescriptor::read_from(packet.payload.as_ref())?;
            let descriptor_size = descriptor.get_packet_bytes_count();
            if packet.payload.len() <= descriptor_size {
                return Err(RtpVp8Error::PayloadTooShort(packet.payload.len()));
            }
            let payload = &packet.payload[descriptor_size..];

            if index == 0 {
                // a frame must open with the start of its first partition
                if !descriptor.starts_frame() {
                    tracing::warn!(
                        "dropping vp8 frame that does not begin with a start-of-partition packet, descriptor: {:?}",
                        descriptor
                    );
                    return Ok(None);
                }
                // the inverse key frame flag, the P bit of the frame header
                is_key_frame = (payload[0] & 0b1) == 0;
            }

            if frame.len() + payload.len() > self.max_frame_size {
                tracing::warn!(
                    "dropping oversize vp8 frame: {} bytes exceeds limit {}",
                    frame.len() + payload.len(),
                    self.max_frame_size
                );
                return Ok(None);
            }
            frame.extend_from_slice(payload);
        }

        if frame.is_empty() {
            return Ok(None);
        }
        Ok(Some(DepacketizedFrame {
            payload: frame.freeze(),
            is_key_frame,
        }))
    }
}

#[cfg(test)]
mod test {
    use tokio_util::bytes::Bytes;

    use super::*;
    use crate::header::RtpHeader;

    fn vp8_packet(sequence_number: u16, marker: bool, payload: Vec<u8>) -> RtpTrivialPacket {
        RtpTrivialPacket::new(
            RtpHeader {
                marker,
                payload_type: 96,
                sequence_number,
                timestamp: 3000,
                ssrc: 2,
                ..Default::default()
            },
            Bytes::from(payload),
        )
    }

    #[test]
    fn test_single_packet_key_frame() {
        // a key frame tag carries P == 0 in its first byte
        let mut depacketizer = RtpVp8Depacketizer::new(1_048_576);
        let frame = depacketizer
            .depacketize(&[vp8_packet(10, true, vec![0x10, 0x9C, 0x01, 0x2A, 0x40])])
            .unwrap()
            .unwrap();
        assert_eq!(frame.payload.as_ref(), &[0x9C, 0x01, 0x2A, 0x40]);
        assert!(frame.is_key_frame);
    }

    #[test]
    fn test_multi_packet_frame_concatenates_in_order() {
        let packets = vec![
            vp8_packet(10, false, vec![0x10, 0x9D, 0x01]),
            vp8_packet(11, false, vec![0x00, 0x2A, 0x3B]),
            vp8_packet(12, true, vec![0x00, 0x4C]),
        ];
        let mut depacketizer = RtpVp8Depacketizer::new(1_048_576);
        let frame = depacketizer.depacketize(&packets).unwrap().unwrap();
        assert_eq!(frame.payload.as_ref(), &[0x9D, 0x01, 0x2A, 0x3B, 0x4C]);
    }

    #[test]
    fn test_extended_descriptor_is_skipped() {
        // X + I with a 15-bit picture id: four descriptor bytes
        let payload = vec![0x90, 0x80, 0x81, 0x23, 0x9D, 0x01];
        let mut depacketizer = RtpVp8Depacketizer::new(1_048_576);
        let frame = depacketizer
            .depacketize(&[vp8_packet(10, true, payload)])
            .unwrap()
            .unwrap();
        assert_eq!(frame.payload.as_ref(), &[0x9D, 0x01]);
    }

    #[test]
    fn test_descriptor_without_payload_is_an_error() {
        let mut depacketizer = RtpVp8Depacketizer::new(1_048_576);
        let result = depacketizer.depacketize(&[vp8_packet(10, true, vec![0x10])]);
        assert!(matches!(result, Err(RtpVp8Error::PayloadTooShort(1))));
    }

    #[test]
    fn test_frame_must_open_with_start_bit() {
        let mut depacketizer = RtpVp8Depacketizer::new(1_048_576);
        let frame = depacketizer
            .depacketize(&[vp8_packet(10, true, vec![0x00, 0x9D, 0x01])])
            .unwrap();
        assert!(frame.is_none());
    }

    #[test]
    fn test_non_key_frame_flag() {
        // P bit set means an interframe
        let mut depacketizer = RtpVp8Depacketizer::new(1_048_576);
        let frame = depacketizer
            .depacketize(&[vp8_packet(10, true, vec![0x10, 0x9F, 0x01])])
            .unwrap()
            .unwrap();
        assert!(!frame.is_key_frame);
    }

    #[test]
    fn test_oversize_frame_is_dropped() {
        let mut payload = vec![0x10];
        payload.extend_from_slice(&[0x9C; 64]);
        let mut depacketizer = RtpVp8Depacketizer::new(32);
        assert!(
            depacketizer
                .depacketize(&[vp8_packet(10, true, payload)])
                .unwrap()
                .is_none()
        );
    }
}
