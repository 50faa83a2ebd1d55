use std::io::Cursor;

use byteorder::ReadBytesExt;
use codec_h264::{
    annex_b::{annex_b_bytes_count, write_annex_b},
    nalu::NalUnit,
    nalu_header::NaluHeader,
};
use tokio_util::bytes::{Bytes, BytesMut};
use utils::traits::{
    buffer::GenericFragmentComposer,
    reader::{ReadFrom, ReadRemainingFrom},
};

use crate::{
    codec::DepacketizedFrame,
    codec::h264::{
        PayloadStructureType,
        aggregation::StapAPacket,
        errors::{RtpH264Error, RtpH264Result},
        fragmented::FuAPacket,
    },
    packet::RtpTrivialPacket,
    sequence_number::SequenceNumber,
};

use super::single_nalu::SingleNalUnit;

struct FuAssembly {
    header: NaluHeader,
    body: BytesMut,
    next_sequence_number: SequenceNumber,
}

/// Recombines a run of FU-A fragments into the original nal unit.
///
/// Fragments must arrive in sequence-number order; a gap inside the run
/// discards the whole in-progress nal unit rather than emit a torn one.
#[derive(Default)]
struct FuAComposer {
    assembly: Option<FuAssembly>,
}

impl GenericFragmentComposer for FuAComposer {
    type In = (SequenceNumber, FuAPacket);
    type Out = NalUnit;
    type Error = RtpH264Error;

    fn enqueue(&mut self, (sequence_number, packet): Self::In) -> Result<Option<Self::Out>, Self::Error> {
        let fu_header = packet.fu_header;
        if fu_header.start_bit {
            if let Some(previous) = self.assembly.take() {
                tracing::warn!(
                    "got a FU start packet while a fragment is in progress, dropping previous buffer, length: {}",
                    previous.body.len()
                );
            }
            let header: NaluHeader = packet.reconstructed_nalu_header_byte().try_into()?;
            self.assembly = Some(FuAssembly {
                header,
                body: BytesMut::from(packet.payload.as_ref()),
                next_sequence_number: sequence_number.next(),
            });
        } else {
            let Some(assembly) = self.assembly.as_mut() else {
                return Err(RtpH264Error::FragmentMissingStart(format!(
                    "sequence_number: {}, fu_header: {:?}",
                    sequence_number.value(),
                    fu_header
                )));
            };
            if assembly.next_sequence_number != sequence_number {
                let expected = assembly.next_sequence_number;
                self.assembly = None;
                return Err(RtpH264Error::FragmentSequenceGap(format!(
                    "expect sequence number {} got {}",
                    expected.value(),
                    sequence_number.value()
                )));
            }
            assembly.body.extend_from_slice(&packet.payload);
            assembly.next_sequence_number = sequence_number.next();
        }

        if fu_header.end_bit {
            // complete, the assembly must be present here
            let assembly = self.assembly.take().ok_or_else(|| {
                RtpH264Error::FragmentMissingStart(format!(
                    "end bit without fragments, sequence_number: {}",
                    sequence_number.value()
                ))
            })?;
            return Ok(Some(NalUnit {
                header: assembly.header,
                body: assembly.body.freeze(),
            }));
        }
        Ok(None)
    }
}

/// Rebuilds one Annex-B framed access unit from the rtp packets of a
/// single timestamp, handed over in sequence-number order.
#[derive(Debug)]
pub struct RtpH264Depacketizer {
    max_frame_size: usize,
    interleaved_dropped: u64,
    fragment_dropped: u64,
}

impl RtpH264Depacketizer {
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size,
            interleaved_dropped: 0,
            fragment_dropped: 0,
        }
    }

    pub fn interleaved_dropped(&self) -> u64 {
        self.interleaved_dropped
    }

    pub fn fragment_dropped(&self) -> u64 {
        self.fragment_dropped
    }

    pub fn depacketize(
        &mut self,
        packets: &[RtpTrivialPacket],
    ) -> RtpH264Result<Option<DepacketizedFrame>> {
        let mut nal_units: Vec<NalUnit> = Vec::new();
        let mut composer = FuAComposer::default();

        for packet in packets {
            if packet.payload.is_empty() {
                continue;
            }
            let structure = match PayloadStructureType::try_from(packet.payload[0]) {
                Ok(structure) => structure,
                Err(err) => {
                    tracing::warn!("dropping unparsable h264 payload: {}", err);
                    continue;
                }
            };
            let mut reader = Cursor::new(packet.payload.as_ref());
            match structure {
                PayloadStructureType::SingleNalUnit(_) => {
                    nal_units.push(SingleNalUnit::read_from(&mut reader)?.0);
                }
                PayloadStructureType::StapA => {
                    let header = reader.read_u8()?;
                    let stap = StapAPacket::read_remaining_from(header, &mut reader)?;
                    nal_units.extend(stap.nal_units);
                }
                PayloadStructureType::FuA => {
                    let indicator = reader.read_u8()?;
                    let fua = FuAPacket::read_remaining_from(indicator, &mut reader)?;
                    let sequence_number = SequenceNumber(packet.header.sequence_number);
                    match composer.enqueue((sequence_number, fua)) {
                        Ok(Some(nalu)) => nal_units.push(nalu),
                        Ok(None) => {}
                        Err(err) => {
                            self.fragment_dropped += 1;
                            tracing::warn!("dropping h264 fragment run: {}", err);
                        }
                    }
                }
                PayloadStructureType::StapB
                | PayloadStructureType::Mtap16
                | PayloadStructureType::Mtap24
                | PayloadStructureType::FuB => {
                    self.interleaved_dropped += 1;
                    tracing::warn!(
                        "dropping unsupported interleaved h264 payload structure: {:?}",
                        structure
                    );
                }
            }
        }

        if let Some(assembly) = composer.assembly.take() {
            self.fragment_dropped += 1;
            tracing::warn!(
                "frame ended with an incomplete h264 fragment, dropping {} buffered bytes",
                assembly.body.len()
            );
        }

        if nal_units.is_empty() {
            return Ok(None);
        }

        let is_key_frame = classify_key_frame(&nal_units);

        let frame_size = annex_b_bytes_count(&nal_units);
        if frame_size > self.max_frame_size {
            tracing::warn!(
                "dropping oversize h264 frame: {} bytes exceeds limit {}",
                frame_size,
                self.max_frame_size
            );
            return Ok(None);
        }

        let mut frame = Vec::with_capacity(frame_size);
        write_annex_b(&mut frame, &nal_units)?;
        Ok(Some(DepacketizedFrame {
            payload: Bytes::from(frame),
            is_key_frame,
        }))
    }
}

/// SPS or PPS marks the frame as key and sticks; a slice seen before any
/// parameter set marks it non-key; frames with no decisive nal unit
/// default to non-key.
fn classify_key_frame(nal_units: &[NalUnit]) -> bool {
    let mut is_key: Option<bool> = None;
    for nalu in nal_units {
        let nalu_type = nalu.header.nal_unit_type;
        if nalu_type.is_parameter_set() {
            is_key = Some(true);
        } else if nalu_type.is_slice() && is_key != Some(true) {
            is_key = Some(false);
        }
    }
    is_key.unwrap_or(false)
}
