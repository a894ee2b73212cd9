#![allow(dead_code)]

use noodles::core::Position;
use noodles::sam::alignment::record::cigar::{op::Kind as CigarKind, Op as SamCigarOp};
use noodles::sam::alignment::record::{Flags, MappingQuality};
use noodles::sam::alignment::record_buf::{Cigar as SamCigar, Sequence};
use noodles::sam::alignment::RecordBuf;

// ── record builders ──────────────────────────────────────────────────────────

pub fn unmapped(name: &str) -> RecordBuf {
    let mut record = RecordBuf::default();
    *record.name_mut() = Some(name.as_bytes().to_vec().into());
    *record.flags_mut() = Flags::UNMAPPED;
    *record.sequence_mut() = Sequence::from(b"ACGTACGTAC".to_vec());
    record
}

/// Mapped on reference 0 at `start` with a single `M` operation of `len` bases.
pub fn mapped(name: &str, start: usize, len: usize) -> RecordBuf {
    mapped_with_cigar(name, start, &[(CigarKind::Match, len)])
}

pub fn mapped_with_cigar(name: &str, start: usize, ops: &[(CigarKind, usize)]) -> RecordBuf {
    let mut record = RecordBuf::default();
    *record.name_mut() = Some(name.as_bytes().to_vec().into());
    *record.flags_mut() = Flags::empty();
    *record.reference_sequence_id_mut() = Some(0);
    *record.alignment_start_mut() = Position::new(start);
    *record.mapping_quality_mut() = MappingQuality::new(60);

    let cigar: Vec<SamCigarOp> = ops.iter().map(|&(kind, len)| SamCigarOp::new(kind, len)).collect();
    let read_len: usize = ops
        .iter()
        .filter(|(kind, _)| {
            matches!(
                kind,
                CigarKind::Match
                    | CigarKind::Insertion
                    | CigarKind::SoftClip
                    | CigarKind::SequenceMatch
                    | CigarKind::SequenceMismatch
            )
        })
        .map(|(_, len)| len)
        .sum();
    *record.cigar_mut() = SamCigar::from(cigar);
    *record.sequence_mut() = Sequence::from(vec![b'A'; read_len]);
    record
}

pub fn as_first_mate(mut record: RecordBuf) -> RecordBuf {
    record
        .flags_mut()
        .insert(Flags::SEGMENTED | Flags::FIRST_SEGMENT);
    record
}

pub fn as_second_mate(mut record: RecordBuf) -> RecordBuf {
    record
        .flags_mut()
        .insert(Flags::SEGMENTED | Flags::LAST_SEGMENT);
    record
}

pub fn on_reference(mut record: RecordBuf, reference_sequence_id: usize) -> RecordBuf {
    *record.reference_sequence_id_mut() = Some(reference_sequence_id);
    record
}

/// Mark a record so tests can tell which input a kept copy came from.
pub fn with_mapq(mut record: RecordBuf, mapq: u8) -> RecordBuf {
    *record.mapping_quality_mut() = MappingQuality::new(mapq);
    record
}

pub fn name_of(record: &RecordBuf) -> String {
    bam_mergeref::alignment::name_lossy(record)
}

pub fn is_secondary(record: &RecordBuf) -> bool {
    record.flags().is_secondary()
}
