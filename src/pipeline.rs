use crate::bam_input;
use crate::bam_output::{covering_header, BamSink, OutputRouter, RecordSink};
use crate::cli::Args;
use crate::error::MergeError;
use crate::header::HeaderMerger;
use crate::reconcile::{Decision, DecisionKind, ReconciliationEngine};
use crate::synchronizer::{RecordSource, StreamSynchronizer};
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub read_groups: u64,
    pub input1_records: u64,
    pub input2_records: u64,
    pub primary_records: u64,
    pub trash_records: u64,
    pub dropped_records: u64,
    pub kept: u64,
    pub ties: u64,
    pub conflicts: u64,
    pub unmapped: u64,
    pub degraded: u64,
}

impl Stats {
    fn count(&mut self, kind: DecisionKind) {
        let counter = match kind {
            DecisionKind::Kept => &mut self.kept,
            DecisionKind::Tie => &mut self.ties,
            DecisionKind::Conflict => &mut self.conflicts,
            DecisionKind::Unmapped => &mut self.unmapped,
            DecisionKind::Degraded => &mut self.degraded,
        };
        *counter += 1;
    }
}

/// Reject argument combinations that cannot work before any store is opened.
pub fn validate(args: &Args) -> Result<()> {
    if args.ref1_name.is_empty() || args.ref2_name.is_empty() {
        return Err(MergeError::Configuration(
            "please provide names for the two references (-a, -b)".into(),
        )
        .into());
    }
    if args.out_bam == args.in_bam1 || args.out_bam == args.in_bam2 {
        return Err(MergeError::Configuration(format!(
            "output file {} is also an input file",
            args.out_bam.display()
        ))
        .into());
    }
    if let Some(trash) = args.trash_path() {
        if trash == args.out_bam || trash == args.in_bam1 || trash == args.in_bam2 {
            return Err(MergeError::Configuration(format!(
                "trash file {} collides with another file argument",
                trash.display()
            ))
            .into());
        }
    }
    Ok(())
}

/// Seed for the tie-break generator when none is given.
pub fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// Merge the two inputs named by `args` into the output (and trash) BAM.
pub fn run(args: &Args, command_line: &str) -> Result<Stats> {
    validate(args)?;

    let seed = args.seed.unwrap_or_else(wall_clock_seed);
    tracing::debug!(seed, "tie-break generator seeded");
    let mut rng = StdRng::seed_from_u64(seed);

    let first = bam_input::open_bam(&args.in_bam1)?;
    let second = bam_input::open_bam(&args.in_bam2)?;

    let merger = HeaderMerger {
        ref1_name: args.ref1_name.clone(),
        ref2_name: args.ref2_name.clone(),
        command_line: command_line.to_string(),
    };
    let header_text = merger.merge_text(&first.header_text, &second.header_text, &mut rng)?;
    let dictionary = &first.header;
    let encoding = covering_header(&first.header, &second.header);

    let primary = BamSink::create(&args.out_bam, &header_text, dictionary, &encoding)?;
    let trash = args
        .trash_path()
        .map(|path| BamSink::create(&path, &header_text, dictionary, &encoding))
        .transpose()?;
    if let Some(trash) = &trash {
        tracing::info!(path = %trash.path().display(), "collecting rejected alignments");
    }

    let mut router = OutputRouter::new(primary, trash);
    let mut synchronizer = StreamSynchronizer::new(first, second);
    let mut engine = ReconciliationEngine::new(rng);

    let stats = merge_streams(&mut synchronizer, &mut engine, &mut router)?;
    router.finish()?;

    Ok(stats)
}

/// Main loop: pull groups until both inputs are exhausted and route every decision.
///
/// A group's records are written only once the following group has been read and has
/// passed the order and mate checks, so a fatal input error never leaves the group that
/// precedes it in the outputs.
pub fn merge_streams<S, R, K>(
    synchronizer: &mut StreamSynchronizer<S>,
    engine: &mut ReconciliationEngine<R>,
    router: &mut OutputRouter<K>,
) -> Result<Stats>
where
    S: RecordSource,
    R: Rng,
    K: RecordSink,
{
    let mut stats = Stats::default();
    let mut pending: Option<Decision> = None;

    while let Some(group) = synchronizer.next_group()? {
        if let Some(decision) = pending.take() {
            route(router, &decision)?;
        }

        stats.read_groups += 1;
        let decision = engine.reconcile(group);
        stats.count(decision.kind);

        if decision.kind == DecisionKind::Conflict {
            tracing::trace!(
                records = decision.records.len(),
                "inputs disagree on placement; group sent to trash"
            );
        }

        pending = Some(decision);
    }

    if let Some(decision) = pending.take() {
        route(router, &decision)?;
    }

    let (input1, input2) = synchronizer.records_read();
    let counts = router.counts();
    stats.input1_records = input1;
    stats.input2_records = input2;
    stats.primary_records = counts.primary;
    stats.trash_records = counts.trash;
    stats.dropped_records = counts.dropped;

    Ok(stats)
}

fn route<K: RecordSink>(router: &mut OutputRouter<K>, decision: &Decision) -> Result<()> {
    for record in &decision.records {
        router.emit(record, decision.destination)?;
    }
    Ok(())
}
