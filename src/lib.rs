//! bam-mergeref: reconcile two name-sorted BAM files of the same reads aligned against
//! different references.
//!
//! # Library usage
//!
//! ```no_run
//! use bam_mergeref::{OutputRouter, ReconciliationEngine, StreamSynchronizer, merge_streams};
//! use noodles::sam::alignment::RecordBuf;
//! use rand::SeedableRng;
//! use std::collections::VecDeque;
//!
//! let first: VecDeque<RecordBuf> = VecDeque::new();
//! let second: VecDeque<RecordBuf> = VecDeque::new();
//!
//! let mut synchronizer = StreamSynchronizer::new(first, second);
//! let mut engine = ReconciliationEngine::new(rand::rngs::StdRng::seed_from_u64(1));
//! let mut router = OutputRouter::new(Vec::<RecordBuf>::new(), Some(Vec::new()));
//!
//! let stats = merge_streams(&mut synchronizer, &mut engine, &mut router)?;
//! let (primary, trash) = router.finish()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

// Internal modules, not part of the public API.
pub(crate) mod types;

// Public modules.
pub mod alignment;
pub mod bam_input;
pub mod bam_output;
pub mod cli;
pub mod error;
pub mod header;
pub mod name_order;
pub mod pipeline;
pub mod provenance;
pub mod reconcile;
pub mod synchronizer;

// Flat re-exports for the most commonly used public types.
pub use bam_output::{BamSink, EmitCounts, OutputRouter, RecordSink};
pub use error::MergeError;
pub use header::{HeaderLineGroups, HeaderMerger, MergedHeader};
pub use pipeline::{merge_streams, Stats};
pub use reconcile::{Decision, DecisionKind, Destination, ReconciliationEngine};
pub use synchronizer::{Degraded, DegradedReason, Group, MatePair, RecordSource, Side, StreamSynchronizer};
pub use types::{Origin, Source};
