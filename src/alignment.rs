use crate::types::Origin;
use noodles::sam::alignment::record::data::field::Tag;
use noodles::sam::alignment::record::Flags;
use noodles::sam::alignment::record_buf::data::field::Value;
use noodles::sam::alignment::RecordBuf;

/// Origin tag: which input(s) contributed the record (1, 2 or 12).
pub const ORIGIN_TAG: Tag = Tag::new(b'R', b'N');

/// Read name as raw bytes; unnamed records compare as the empty name.
pub fn name(record: &RecordBuf) -> &[u8] {
    match record.name() {
        Some(name) => name.as_ref(),
        None => &[],
    }
}

pub fn name_lossy(record: &RecordBuf) -> String {
    String::from_utf8_lossy(name(record)).into_owned()
}

pub fn is_mapped(record: &RecordBuf) -> bool {
    !record.flags().is_unmapped()
}

pub fn is_paired(record: &RecordBuf) -> bool {
    record.flags().is_segmented()
}

pub fn is_first_mate(record: &RecordBuf) -> bool {
    record.flags().is_first_segment()
}

/// Same alignment start and identical CIGAR.
///
/// The reference sequence ID is not compared: the two inputs index different
/// dictionaries.
pub fn same_placement(a: &RecordBuf, b: &RecordBuf) -> bool {
    a.alignment_start() == b.alignment_start() && a.cigar() == b.cigar()
}

pub fn set_origin(record: &mut RecordBuf, origin: Origin) {
    record
        .data_mut()
        .insert(ORIGIN_TAG, Value::from(origin.value()));
}

/// Mark the record as a secondary alignment.
pub fn clear_primary(record: &mut RecordBuf) {
    record.flags_mut().insert(Flags::SECONDARY);
}

/// Origin tag value, if present.
pub fn origin(record: &RecordBuf) -> Option<i32> {
    match record.data().get(&ORIGIN_TAG)? {
        Value::Int8(n) => Some(i32::from(*n)),
        Value::UInt8(n) => Some(i32::from(*n)),
        Value::Int16(n) => Some(i32::from(*n)),
        Value::UInt16(n) => Some(i32::from(*n)),
        Value::Int32(n) => Some(*n),
        Value::UInt32(n) => i32::try_from(*n).ok(),
        _ => None,
    }
}
