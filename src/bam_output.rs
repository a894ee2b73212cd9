//! Output sinks and the router that feeds them.
//!
//! Both BAM outputs carry the merged header text but input 1's binary reference
//! dictionary, so records keep the reference IDs they were read with. Consumers map
//! coordinates through the synthetic `AN` names rather than assuming input-1
//! coordinates for merged dictionary entries.
//!
//! Records are encoded against a separate header whose dictionary spans the reference
//! IDs of both inputs, so a read placed on a contig only reference 2 has is written
//! through unchanged.

use crate::error::MergeError;
use crate::reconcile::Destination;
use anyhow::{Context, Result};
use noodles::sam::alignment::io::Write as _;
use noodles::sam::alignment::RecordBuf;
use noodles::{bam, bgzf, sam};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub(crate) const BAM_MAGIC: &[u8; 4] = b"BAM\x01";

/// A sequential destination for alignment records.
pub trait RecordSink {
    fn write_record(&mut self, record: &RecordBuf) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

impl RecordSink for Vec<RecordBuf> {
    fn write_record(&mut self, record: &RecordBuf) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// BGZF-compressed BAM output.
pub struct BamSink {
    path: PathBuf,
    writer: bam::io::Writer<bgzf::io::Writer<File>>,
    encoding: sam::Header,
}

impl BamSink {
    /// Create `path` and write a BAM header block made of `header_text` and the
    /// reference dictionary of `dictionary`. Records are encoded against `encoding`.
    pub fn create(
        path: &Path,
        header_text: &str,
        dictionary: &sam::Header,
        encoding: &sam::Header,
    ) -> Result<Self> {
        let file = File::create(path)
            .map_err(|e| MergeError::StoreOpen(format!("{}: {e}", path.display())))?;
        let mut inner = bgzf::io::Writer::new(file);
        write_raw_header(&mut inner, header_text, dictionary)
            .with_context(|| format!("failed to write header to {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: bam::io::Writer::from(inner),
            encoding: encoding.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for BamSink {
    fn write_record(&mut self, record: &RecordBuf) -> Result<()> {
        self.writer
            .write_alignment_record(&self.encoding, record)
            .with_context(|| format!("failed to write record to {}", self.path.display()))
    }

    fn finish(&mut self) -> Result<()> {
        self.writer
            .get_mut()
            .try_finish()
            .with_context(|| format!("failed to finish {}", self.path.display()))
    }
}

/// Input 1's header with input 2's reference sequences past input 1's count appended.
///
/// Only the ID range matters to the encoder; an appended name already present gets its
/// index as a suffix.
pub fn covering_header(first: &sam::Header, second: &sam::Header) -> sam::Header {
    let mut header = first.clone();
    let offset = first.reference_sequences().len();
    let reference_sequences = header.reference_sequences_mut();

    for (i, (name, map)) in second.reference_sequences().iter().enumerate().skip(offset) {
        let mut key = name.clone();
        while reference_sequences.contains_key(&key) {
            key = format!("{key}-{i}").into();
        }
        reference_sequences.insert(key, map.clone());
    }

    header
}

/// BAM header block: magic, SAM text, then the binary reference dictionary.
fn write_raw_header<W: Write>(writer: &mut W, text: &str, dictionary: &sam::Header) -> io::Result<()> {
    writer.write_all(BAM_MAGIC)?;

    let l_text = i32::try_from(text.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    writer.write_all(&l_text.to_le_bytes())?;
    writer.write_all(text.as_bytes())?;

    let reference_sequences = dictionary.reference_sequences();
    let n_ref = i32::try_from(reference_sequences.len())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    writer.write_all(&n_ref.to_le_bytes())?;

    for (name, map) in reference_sequences {
        let l_name = u32::try_from(name.len() + 1)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        writer.write_all(&l_name.to_le_bytes())?;
        writer.write_all(name)?;
        writer.write_all(&[0u8])?;

        let l_ref = i32::try_from(map.length().get())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        writer.write_all(&l_ref.to_le_bytes())?;
    }

    Ok(())
}

/// Records written to each destination, and trash records dropped for lack of a sink.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmitCounts {
    pub primary: u64,
    pub trash: u64,
    pub dropped: u64,
}

/// Appends records to the primary sink or the optional trash sink, in call order.
pub struct OutputRouter<S> {
    primary: S,
    trash: Option<S>,
    counts: EmitCounts,
}

impl<S: RecordSink> OutputRouter<S> {
    pub fn new(primary: S, trash: Option<S>) -> Self {
        Self {
            primary,
            trash,
            counts: EmitCounts::default(),
        }
    }

    pub fn has_trash(&self) -> bool {
        self.trash.is_some()
    }

    pub fn counts(&self) -> EmitCounts {
        self.counts
    }

    /// Append one record. Trash records are dropped when no trash sink is configured.
    pub fn emit(&mut self, record: &RecordBuf, destination: Destination) -> Result<()> {
        match destination {
            Destination::Primary => {
                self.primary.write_record(record)?;
                self.counts.primary += 1;
            }
            Destination::Trash => match self.trash.as_mut() {
                Some(trash) => {
                    trash.write_record(record)?;
                    self.counts.trash += 1;
                }
                None => self.counts.dropped += 1,
            },
        }
        Ok(())
    }

    /// Flush and close both sinks, returning them.
    pub fn finish(mut self) -> Result<(S, Option<S>)> {
        self.primary.finish()?;
        if let Some(trash) = self.trash.as_mut() {
            trash.finish()?;
        }
        Ok((self.primary, self.trash))
    }
}
