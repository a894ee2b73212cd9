//! Lockstep walk over two name-sorted record streams.
//!
//! Each call to [`StreamSynchronizer::next_group`] yields every record of the next read
//! name across both inputs, classified by shape. At most one lookahead record per input
//! is held between calls.

use crate::alignment::{self, is_mapped, is_paired};
use crate::error::MergeError;
use crate::name_order;
use crate::types::Source;
use anyhow::Result;
use noodles::sam::alignment::RecordBuf;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// A sequential store of alignment records.
pub trait RecordSource {
    /// Next record in stored order, `None` at end of stream.
    fn read_record(&mut self) -> Result<Option<RecordBuf>>;
}

impl RecordSource for VecDeque<RecordBuf> {
    fn read_record(&mut self) -> Result<Option<RecordBuf>> {
        Ok(self.pop_front())
    }
}

/// Two records of one template from the same input, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct MatePair {
    pub read: RecordBuf,
    pub mate: RecordBuf,
}

impl MatePair {
    /// `true` if either mate is mapped.
    pub fn is_mapped(&self) -> bool {
        is_mapped(&self.read) || is_mapped(&self.mate)
    }

    pub fn into_records(self) -> [RecordBuf; 2] {
        [self.read, self.mate]
    }
}

/// Records one input contributed to a degraded group.
#[derive(Debug, Clone, PartialEq)]
pub enum Side {
    Single(RecordBuf),
    Pair(MatePair),
}

impl Side {
    pub fn into_records(self) -> Vec<RecordBuf> {
        match self {
            Side::Single(record) => vec![record],
            Side::Pair(pair) => Vec::from(pair.into_records()),
        }
    }
}

/// Why a group present in both inputs could not be treated as two complete templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedReason {
    /// Neither input had the mate directly behind the paired record.
    BothMatesMissing,
    /// Input 1 had no mate behind its paired record; input 2 did.
    FirstMateMissing,
    /// Input 2 had no mate behind its paired record; input 1 did.
    SecondMateMissing,
    /// Only one input flags the read as paired.
    MixedPairing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Degraded {
    pub reason: DegradedReason,
    pub first: Side,
    pub second: Side,
}

/// All records sharing one read name.
#[derive(Debug, Clone, PartialEq)]
pub enum Group {
    /// Unpaired read present in one input only.
    SingletonUnpaired { source: Source, record: RecordBuf },
    /// Mate pair present in one input only.
    SingletonPaired { source: Source, pair: MatePair },
    /// Unpaired read present in both inputs.
    PairedSourceUnpaired { first: RecordBuf, second: RecordBuf },
    /// Mate pair present in both inputs.
    PairedSourceComplete { first: MatePair, second: MatePair },
    /// Read present in both inputs with broken mate structure on at least one side.
    PairedSourceDegraded(Degraded),
}

enum Next {
    Exhausted,
    Both,
    One(Source),
}

struct Cursor<S> {
    source: S,
    slot: Option<RecordBuf>,
    records_read: u64,
}

impl<S: RecordSource> Cursor<S> {
    fn new(source: S) -> Self {
        Self {
            source,
            slot: None,
            records_read: 0,
        }
    }

    fn fill(&mut self) -> Result<()> {
        if self.slot.is_none() {
            self.slot = self.read_next()?;
        }
        Ok(())
    }

    /// Read past the lookahead slot, which must be empty.
    fn read_next(&mut self) -> Result<Option<RecordBuf>> {
        let record = self.source.read_record()?;
        if record.is_some() {
            self.records_read += 1;
        }
        Ok(record)
    }

    fn push_back(&mut self, record: RecordBuf) {
        debug_assert!(self.slot.is_none());
        self.slot = Some(record);
    }
}

/// Drives the two inputs and enforces the global name order.
pub struct StreamSynchronizer<S> {
    first: Cursor<S>,
    second: Cursor<S>,
    previous: Option<Vec<u8>>,
}

impl<S: RecordSource> StreamSynchronizer<S> {
    pub fn new(first: S, second: S) -> Self {
        Self {
            first: Cursor::new(first),
            second: Cursor::new(second),
            previous: None,
        }
    }

    /// Records pulled from input 1 and input 2 so far.
    pub fn records_read(&self) -> (u64, u64) {
        (self.first.records_read, self.second.records_read)
    }

    /// Next group of records, or `None` once both inputs are exhausted.
    pub fn next_group(&mut self) -> Result<Option<Group>> {
        self.first.fill()?;
        self.second.fill()?;

        let next = match (&self.first.slot, &self.second.slot) {
            (None, None) => Next::Exhausted,
            (Some(a), Some(b)) if alignment::name(a) == alignment::name(b) => Next::Both,
            (Some(a), Some(b)) => {
                match name_order::compare(alignment::name(a), alignment::name(b)) {
                    Ordering::Less => Next::One(Source::First),
                    _ => Next::One(Source::Second),
                }
            }
            (Some(_), None) => Next::One(Source::First),
            (None, Some(_)) => Next::One(Source::Second),
        };

        match next {
            Next::Exhausted => Ok(None),
            Next::Both => self.paired_source().map(Some),
            Next::One(source) => self.singleton(source).map(Some),
        }
    }

    fn cursor_mut(&mut self, source: Source) -> &mut Cursor<S> {
        match source {
            Source::First => &mut self.first,
            Source::Second => &mut self.second,
        }
    }

    fn singleton(&mut self, source: Source) -> Result<Group> {
        let record = self.take_slot(source)?;
        self.accept(&record)?;

        if is_paired(&record) {
            let mate = self.read_mate(source, &record)?;
            Ok(Group::SingletonPaired {
                source,
                pair: MatePair { read: record, mate },
            })
        } else {
            Ok(Group::SingletonUnpaired { source, record })
        }
    }

    fn paired_source(&mut self) -> Result<Group> {
        let first = self.take_slot(Source::First)?;
        let second = self.take_slot(Source::Second)?;
        self.accept(&first)?;

        match (is_paired(&first), is_paired(&second)) {
            (false, false) => Ok(Group::PairedSourceUnpaired { first, second }),
            (true, true) => self.paired_templates(first, second),
            (true, false) => {
                let mate = self.read_mate(Source::First, &first)?;
                Ok(Group::PairedSourceDegraded(Degraded {
                    reason: DegradedReason::MixedPairing,
                    first: Side::Pair(MatePair { read: first, mate }),
                    second: Side::Single(second),
                }))
            }
            (false, true) => {
                let mate = self.read_mate(Source::Second, &second)?;
                Ok(Group::PairedSourceDegraded(Degraded {
                    reason: DegradedReason::MixedPairing,
                    first: Side::Single(first),
                    second: Side::Pair(MatePair { read: second, mate }),
                }))
            }
        }
    }

    /// Both inputs flag the read as paired: pull one mate from each.
    ///
    /// End of stream here is fatal. A next record with another name is not: it goes back
    /// into its lookahead slot and the group degrades.
    fn paired_templates(&mut self, first: RecordBuf, second: RecordBuf) -> Result<Group> {
        let mate1 = self.first.read_next()?;
        let mate2 = self.second.read_next()?;

        let (mate1, mate2) = match (mate1, mate2) {
            (Some(a), Some(b)) => (a, b),
            (None, _) => return Err(missing_mate(&first, Source::First)),
            (_, None) => return Err(missing_mate(&second, Source::Second)),
        };

        let first_complete = alignment::name(&mate1) == alignment::name(&first);
        let second_complete = alignment::name(&mate2) == alignment::name(&second);

        if !first_complete {
            tracing::warn!(read = %alignment::name_lossy(&first), input = 1, "missing mate");
        }
        if !second_complete {
            tracing::warn!(read = %alignment::name_lossy(&second), input = 2, "missing mate");
        }

        let group = match (first_complete, second_complete) {
            (true, true) => Group::PairedSourceComplete {
                first: MatePair { read: first, mate: mate1 },
                second: MatePair { read: second, mate: mate2 },
            },
            (false, true) => {
                self.first.push_back(mate1);
                Group::PairedSourceDegraded(Degraded {
                    reason: DegradedReason::FirstMateMissing,
                    first: Side::Single(first),
                    second: Side::Pair(MatePair { read: second, mate: mate2 }),
                })
            }
            (true, false) => {
                self.second.push_back(mate2);
                Group::PairedSourceDegraded(Degraded {
                    reason: DegradedReason::SecondMateMissing,
                    first: Side::Pair(MatePair { read: first, mate: mate1 }),
                    second: Side::Single(second),
                })
            }
            (false, false) => {
                self.first.push_back(mate1);
                self.second.push_back(mate2);
                Group::PairedSourceDegraded(Degraded {
                    reason: DegradedReason::BothMatesMissing,
                    first: Side::Single(first),
                    second: Side::Single(second),
                })
            }
        };

        Ok(group)
    }

    fn take_slot(&mut self, source: Source) -> Result<RecordBuf> {
        self.cursor_mut(source).slot.take().ok_or_else(|| {
            anyhow::anyhow!("input file {} has no pending record", source.number())
        })
    }

    /// The record directly behind `record` in the same input, which must share its name.
    fn read_mate(&mut self, source: Source, record: &RecordBuf) -> Result<RecordBuf> {
        match self.cursor_mut(source).read_next()? {
            Some(mate) if alignment::name(&mate) == alignment::name(record) => Ok(mate),
            _ => Err(missing_mate(record, source)),
        }
    }

    fn accept(&mut self, record: &RecordBuf) -> Result<()> {
        let name = alignment::name(record);
        if let Some(previous) = &self.previous {
            if !name_order::is_after(previous, name) {
                return Err(MergeError::OutOfOrder {
                    previous: String::from_utf8_lossy(previous).into_owned(),
                    current: String::from_utf8_lossy(name).into_owned(),
                }
                .into());
            }
        }
        let previous = self.previous.get_or_insert_with(Vec::new);
        previous.clear();
        previous.extend_from_slice(name);
        Ok(())
    }
}

fn missing_mate(record: &RecordBuf, source: Source) -> anyhow::Error {
    MergeError::MissingMate {
        name: alignment::name_lossy(record),
        source: source.number(),
    }
    .into()
}
