use crate::bam_output::BAM_MAGIC;
use crate::error::MergeError;
use crate::header::HeaderLineGroups;
use crate::synchronizer::RecordSource;
use anyhow::{Context, Result};
use noodles::sam::alignment::RecordBuf;
use noodles::{bam, bgzf, sam};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// An opened input BAM: its header, the header text as stored, and a record cursor.
pub struct BamInput {
    pub path: PathBuf,
    pub header: sam::Header,
    pub header_text: String,
    reader: bam::io::Reader<bgzf::io::Reader<File>>,
}

pub fn open_bam(path: &Path) -> Result<BamInput> {
    let header_text = read_header_text(path)?;

    let file = File::open(path).map_err(|e| store_open(path, e))?;
    let mut reader = bam::io::Reader::new(file);
    let header = match reader.read_header() {
        Ok(header) => header,
        Err(e) => {
            // Report line-level problems the way the merge would, before the decoder's.
            HeaderLineGroups::parse(&header_text)?;
            return Err(MergeError::StoreOpen(format!(
                "{}: invalid BAM header: {e}",
                path.display()
            ))
            .into());
        }
    };

    Ok(BamInput {
        path: path.to_path_buf(),
        header,
        header_text,
        reader,
    })
}

/// SAM header text exactly as stored in the BAM header block, NUL padding removed.
pub fn read_header_text(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| store_open(path, e))?;
    let mut reader = bgzf::io::Reader::new(file);

    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|e| store_open(path, e))?;
    if &magic != BAM_MAGIC {
        return Err(MergeError::StoreOpen(format!("{}: not a BAM file", path.display())).into());
    }

    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| store_open(path, e))?;
    let l_text = usize::try_from(i32::from_le_bytes(buf)).map_err(|_| {
        MergeError::StoreOpen(format!("{}: invalid header text length", path.display()))
    })?;

    let mut text = vec![0u8; l_text];
    reader
        .read_exact(&mut text)
        .map_err(|e| store_open(path, e))?;
    let end = text.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    text.truncate(end);

    String::from_utf8(text).map_err(|_| {
        MergeError::Format(format!("header text of {} is not valid UTF-8", path.display()))
            .into()
    })
}

fn store_open(path: &Path, e: std::io::Error) -> anyhow::Error {
    MergeError::StoreOpen(format!("{}: {e}", path.display())).into()
}

impl RecordSource for BamInput {
    fn read_record(&mut self) -> Result<Option<RecordBuf>> {
        let mut record = RecordBuf::default();
        let n = self
            .reader
            .read_record_buf(&self.header, &mut record)
            .with_context(|| format!("failed to read record from {}", self.path.display()))?;
        Ok((n > 0).then_some(record))
    }
}
