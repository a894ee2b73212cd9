//! Decision table for one record group.
//!
//! Every group shape maps to exactly one destination. Ties between identical mapped
//! placements are broken by the injected random source; production seeds it from the
//! wall clock, so which input wins a tie is not reproducible across runs unless a seed
//! is given.

use crate::alignment::{self, is_first_mate, is_mapped, same_placement, set_origin};
use crate::synchronizer::{Group, MatePair};
use crate::types::{Origin, Source};
use noodles::sam::alignment::RecordBuf;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Primary,
    Trash,
}

/// Which row of the decision table produced a [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionKind {
    /// Only one input has a mapped placement.
    Kept,
    /// Both inputs agree; one side was picked at random.
    Tie,
    /// Both inputs are mapped but disagree.
    Conflict,
    /// Nothing is mapped.
    Unmapped,
    /// Mate structure is broken on at least one side.
    Degraded,
}

/// Records to emit for one group, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub kind: DecisionKind,
    pub destination: Destination,
    pub records: Vec<RecordBuf>,
}

impl Decision {
    fn primary(kind: DecisionKind, records: Vec<RecordBuf>) -> Self {
        Self { kind, destination: Destination::Primary, records }
    }

    fn trash(kind: DecisionKind, records: Vec<RecordBuf>) -> Self {
        Self { kind, destination: Destination::Trash, records }
    }
}

pub struct ReconciliationEngine<R> {
    rng: R,
}

impl<R: Rng> ReconciliationEngine<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn reconcile(&mut self, group: Group) -> Decision {
        match group {
            Group::SingletonUnpaired { source, mut record } => {
                set_origin(&mut record, source.into());
                if is_mapped(&record) {
                    Decision::primary(DecisionKind::Kept, vec![record])
                } else {
                    Decision::trash(DecisionKind::Unmapped, vec![record])
                }
            }
            Group::SingletonPaired { source, pair } => {
                let mapped = pair.is_mapped();
                let records = tagged(pair.into_records(), source.into());
                if mapped {
                    Decision::primary(DecisionKind::Kept, records)
                } else {
                    Decision::trash(DecisionKind::Unmapped, records)
                }
            }
            Group::PairedSourceUnpaired { first, second } => self.reconcile_reads(first, second),
            Group::PairedSourceComplete { first, second } => self.reconcile_pairs(first, second),
            Group::PairedSourceDegraded(degraded) => {
                let mut records = tagged(degraded.first.into_records(), Origin::First);
                records.extend(tagged(degraded.second.into_records(), Origin::Second));
                Decision::trash(DecisionKind::Degraded, records)
            }
        }
    }

    fn reconcile_reads(&mut self, mut first: RecordBuf, mut second: RecordBuf) -> Decision {
        match (is_mapped(&first), is_mapped(&second)) {
            // Same physical read: one copy is enough.
            (false, false) => Decision::trash(DecisionKind::Unmapped, vec![first]),
            (true, false) => {
                set_origin(&mut first, Origin::First);
                Decision::primary(DecisionKind::Kept, vec![first])
            }
            (false, true) => {
                set_origin(&mut second, Origin::Second);
                Decision::primary(DecisionKind::Kept, vec![second])
            }
            (true, true) if same_placement(&first, &second) => {
                let mut kept = match self.pick() {
                    Source::First => first,
                    Source::Second => second,
                };
                set_origin(&mut kept, Origin::Both);
                Decision::primary(DecisionKind::Tie, vec![kept])
            }
            (true, true) => {
                set_origin(&mut first, Origin::First);
                set_origin(&mut second, Origin::Second);
                alignment::clear_primary(&mut first);
                alignment::clear_primary(&mut second);
                Decision::trash(DecisionKind::Conflict, vec![first, second])
            }
        }
    }

    fn reconcile_pairs(&mut self, first: MatePair, second: MatePair) -> Decision {
        match (first.is_mapped(), second.is_mapped()) {
            (false, false) => {
                Decision::trash(DecisionKind::Unmapped, Vec::from(first.into_records()))
            }
            (true, false) => {
                Decision::primary(DecisionKind::Kept, tagged(first.into_records(), Origin::First))
            }
            (false, true) => {
                Decision::primary(DecisionKind::Kept, tagged(second.into_records(), Origin::Second))
            }
            (true, true) if pairs_agree(&first, &second) => {
                let kept = match self.pick() {
                    Source::First => first,
                    Source::Second => second,
                };
                Decision::primary(DecisionKind::Tie, tagged(kept.into_records(), Origin::Both))
            }
            (true, true) => {
                let [mut read1, mut mate1] = first.into_records();
                let [mut read2, mut mate2] = second.into_records();
                set_origin(&mut read1, Origin::First);
                set_origin(&mut mate1, Origin::First);
                set_origin(&mut read2, Origin::Second);
                set_origin(&mut mate2, Origin::Second);
                let mut records = vec![read1, read2, mate1, mate2];
                for record in &mut records {
                    alignment::clear_primary(record);
                }
                Decision::trash(DecisionKind::Conflict, records)
            }
        }
    }

    /// Uniform coin flip between the two inputs.
    fn pick(&mut self) -> Source {
        if self.rng.gen_bool(0.5) {
            Source::First
        } else {
            Source::Second
        }
    }
}

/// Both templates have the same placement per mate role.
///
/// Roles are matched on the first-segment flag, not on stream position.
pub fn pairs_agree(first: &MatePair, second: &MatePair) -> bool {
    let (same_role, other_role) = if is_first_mate(&first.read) == is_first_mate(&second.read) {
        (&second.read, &second.mate)
    } else {
        (&second.mate, &second.read)
    };
    same_placement(&first.read, same_role) && same_placement(&first.mate, other_role)
}

fn tagged<I>(records: I, origin: Origin) -> Vec<RecordBuf>
where
    I: IntoIterator<Item = RecordBuf>,
{
    records
        .into_iter()
        .map(|mut record| {
            set_origin(&mut record, origin);
            record
        })
        .collect()
}
