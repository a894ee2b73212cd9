//! Line-level merge of two SAM headers.
//!
//! Headers are handled as text so that every tag the inputs carry survives the merge
//! untouched, apart from the `AN` alternate names added to `@SQ` lines and the `@PG`
//! identifiers renamed by [`crate::provenance`].

use crate::error::MergeError;
use crate::name_order;
use crate::provenance;
use anyhow::Result;
use rand::Rng;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

/// Value grammar shared by the `SN`, `AN`, `ID` and `PP` tags.
pub(crate) const TAG_VALUE: &str = r"[0-9A-Za-z][0-9A-Za-z*+.@_|-]*";

static SN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\tSN:({TAG_VALUE})")).expect("valid SN pattern"));

static AN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\tAN:{TAG_VALUE}(?:,{TAG_VALUE})*")).expect("valid AN pattern")
});

/// Header lines of one input, split by record type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderLineGroups {
    pub hd: Option<String>,
    pub sq: Vec<String>,
    pub rg: Vec<String>,
    pub pg: Vec<String>,
    pub co: Vec<String>,
}

impl HeaderLineGroups {
    /// Split SAM header text into its five line categories.
    pub fn parse(text: &str) -> Result<Self> {
        let mut groups = Self::default();

        for line in text.lines() {
            match line.get(..3) {
                Some("@HD") => {
                    if groups.hd.is_some() {
                        return Err(MergeError::Format("duplicate header line (@HD)".into()).into());
                    }
                    groups.hd = Some(line.to_string());
                }
                Some("@SQ") => groups.sq.push(line.to_string()),
                Some("@RG") => groups.rg.push(line.to_string()),
                Some("@PG") => groups.pg.push(line.to_string()),
                Some("@CO") => groups.co.push(line.to_string()),
                _ => {
                    return Err(MergeError::Format(format!("unknown header tag: {line:?}")).into());
                }
            }
        }

        Ok(groups)
    }
}

/// Labels and invocation details that shape the merged header.
#[derive(Debug, Clone)]
pub struct HeaderMerger {
    /// Name of the reference input 1 was aligned against.
    pub ref1_name: String,
    /// Name of the reference input 2 was aligned against.
    pub ref2_name: String,
    /// Full invocation, recorded in the `CL` field of the new `@PG` line.
    pub command_line: String,
}

/// The merged header, one field per output section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedHeader {
    pub hd: Option<String>,
    pub sq: Vec<String>,
    pub rg: Vec<String>,
    /// New program line first, then input 1's chain, then input 2's chain.
    pub pg: Vec<String>,
    pub co: Vec<String>,
}

impl MergedHeader {
    /// Render as SAM header text, one newline-terminated line per record.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let lines = self
            .hd
            .iter()
            .chain(&self.sq)
            .chain(&self.rg)
            .chain(&self.pg)
            .chain(&self.co);
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

impl HeaderMerger {
    /// Merge two SAM header texts into the output header text.
    pub fn merge_text<R: Rng>(&self, first: &str, second: &str, rng: &mut R) -> Result<String> {
        let first = HeaderLineGroups::parse(first)?;
        let second = HeaderLineGroups::parse(second)?;
        Ok(self.merge(&first, &second, rng)?.to_text())
    }

    pub fn merge<R: Rng>(
        &self,
        first: &HeaderLineGroups,
        second: &HeaderLineGroups,
        rng: &mut R,
    ) -> Result<MergedHeader> {
        if first.hd != second.hd {
            return Err(MergeError::HeaderMismatch {
                first: first.hd.clone().unwrap_or_default(),
                second: second.hd.clone().unwrap_or_default(),
            }
            .into());
        }

        let sq = self.merge_reference_sequences(&first.sq, &second.sq)?;
        let rg = merge_read_groups(&first.rg, &second.rg);
        let pg = provenance::merge_programs(&first.pg, &second.pg, &self.command_line, rng)?;

        let mut co = first.co.clone();
        co.extend(second.co.iter().cloned());

        Ok(MergedHeader {
            hd: first.hd.clone(),
            sq,
            rg,
            pg,
            co,
        })
    }

    /// Merge-join the `@SQ` lines on their `SN` value.
    ///
    /// Both lists must already be in version-aware name order, as produced by the
    /// aligners for a sorted reference.
    pub fn merge_reference_sequences(&self, first: &[String], second: &[String]) -> Result<Vec<String>> {
        let mut merged = Vec::with_capacity(first.len().max(second.len()));
        let (mut i, mut j) = (0usize, 0usize);

        while i < first.len() && j < second.len() {
            let (line1, line2) = (&first[i], &second[j]);
            let (name1, name2) = match (sequence_name(line1), sequence_name(line2)) {
                (Some(a), Some(b)) => (a, b),
                (None, None) => return Err(missing_sequence_name("both input files")),
                (None, Some(_)) => return Err(missing_sequence_name("input file 1")),
                (Some(_), None) => return Err(missing_sequence_name("input file 2")),
            };

            match name_order::compare(name1.as_bytes(), name2.as_bytes()) {
                Ordering::Equal => {
                    let names = format!(
                        "{},{}",
                        self.synthetic_name(name1, 1),
                        self.synthetic_name(name1, 2)
                    );
                    merged.push(with_alternate_names(line1, &names));
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    merged.push(with_alternate_names(line1, &self.synthetic_name(name1, 1)));
                    i += 1;
                }
                Ordering::Greater => {
                    merged.push(with_alternate_names(line2, &self.synthetic_name(name2, 2)));
                    j += 1;
                }
            }
        }

        for line in &first[i..] {
            let name = sequence_name(line).ok_or_else(|| missing_sequence_name("input file 1"))?;
            merged.push(with_alternate_names(line, &self.synthetic_name(name, 1)));
        }
        for line in &second[j..] {
            let name = sequence_name(line).ok_or_else(|| missing_sequence_name("input file 2"))?;
            merged.push(with_alternate_names(line, &self.synthetic_name(name, 2)));
        }

        Ok(merged)
    }

    /// `<SN>-<reference label>-<input number>`
    pub fn synthetic_name(&self, sequence_name: &str, input: u8) -> String {
        let label = if input == 1 { &self.ref1_name } else { &self.ref2_name };
        format!("{sequence_name}-{label}-{input}")
    }
}

/// Union of both `@RG` lists: sorted, exact duplicates removed.
pub fn merge_read_groups(first: &[String], second: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = first.iter().chain(second).cloned().collect();
    merged.sort();
    merged.dedup();
    merged
}

fn sequence_name(line: &str) -> Option<&str> {
    SN_PATTERN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Append `names` to the line's `AN` tag, or add an `AN` tag at the end of the line.
fn with_alternate_names(line: &str, names: &str) -> String {
    match AN_PATTERN.find(line) {
        Some(m) => format!("{},{}{}", &line[..m.end()], names, &line[m.end()..]),
        None => format!("{line}\tAN:{names}"),
    }
}

fn missing_sequence_name(location: &str) -> anyhow::Error {
    MergeError::Format(format!(
        "a header line (@SQ) is missing its SN tag in {location}"
    ))
    .into()
}
