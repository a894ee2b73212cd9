//! `@PG` chain merge.
//!
//! Program IDs must stay unique once both chains share one header. Input 1's colliding
//! IDs get a random suffix and every `PP` that pointed at an old ID is repointed, then a
//! new `@PG` line for this tool heads the merged chain.

use crate::error::MergeError;
use crate::header::TAG_VALUE;
use crate::types::{HashMap, HashMapExt, HashSet, HashSetExt};
use anyhow::Result;
use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

/// Reserved `ID` of the program line this tool adds.
pub const PROGRAM_ID: &str = "bam-mergeref";
/// `PN` of the program line this tool adds.
pub const PROGRAM_NAME: &str = "bam-mergeref";

const SUFFIX_LEN: usize = 8;
const SUFFIX_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\tID:({TAG_VALUE})")).expect("valid ID pattern"));

static PP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"\tPP:({TAG_VALUE})")).expect("valid PP pattern"));

/// Build the merged `@PG` section: the new program line, input 1's (rewritten) chain,
/// then input 2's chain unchanged.
pub fn merge_programs<R: Rng>(
    first: &[String],
    second: &[String],
    command_line: &str,
    rng: &mut R,
) -> Result<Vec<String>> {
    let mut taken = HashSet::new();
    for line in first.iter().chain(second) {
        taken.insert(program_id(line)?.to_string());
    }
    let reserved_taken = taken.contains(PROGRAM_ID);

    let chain = rewrite_first_chain(first, second, &mut taken, rng)?;

    let previous = match chain.first() {
        Some(line) => Some(program_id(line)?.to_string()),
        None => None,
    };

    let id = if reserved_taken {
        unique_id(PROGRAM_ID, &taken, rng)
    } else {
        PROGRAM_ID.to_string()
    };

    let mut merged = Vec::with_capacity(1 + chain.len() + second.len());
    merged.push(program_line(&id, previous.as_deref(), command_line));
    merged.extend(chain);
    merged.extend(second.iter().cloned());
    Ok(merged)
}

/// Rename every input-1 ID that also occurs in input 2.
///
/// The chain is folded from its last line to its first; the fold collects the rewritten
/// lines and the rename map, which is then applied to the `PP` fields. `taken` holds
/// every ID in use and receives the new ones.
pub fn rewrite_first_chain<R: Rng>(
    first: &[String],
    second: &[String],
    taken: &mut HashSet<String>,
    rng: &mut R,
) -> Result<Vec<String>> {
    let second_ids = second
        .iter()
        .map(|line| program_id(line).map(str::to_string))
        .collect::<Result<HashSet<_>>>()?;

    let (mut lines, renames) = first.iter().rev().try_fold(
        (Vec::with_capacity(first.len()), HashMap::new()),
        |(mut lines, mut renames), line| -> Result<_> {
            let id = program_id(line)?;
            if second_ids.contains(id) {
                let new_id = unique_id(id, taken, rng);
                taken.insert(new_id.clone());
                lines.push(replace_capture(line, &ID_PATTERN, &new_id));
                renames.insert(id.to_string(), new_id);
            } else {
                lines.push(line.clone());
            }
            Ok((lines, renames))
        },
    )?;
    lines.reverse();

    Ok(lines
        .into_iter()
        .map(|line| repoint_previous(line, &renames))
        .collect())
}

/// `ID` value of a `@PG` line.
pub fn program_id(line: &str) -> Result<&str> {
    ID_PATTERN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| {
            MergeError::Format(format!("a header line (@PG) is missing its ID tag: {line:?}"))
                .into()
        })
}

/// `PP` value of a `@PG` line, if any.
pub fn previous_program_id(line: &str) -> Option<&str> {
    PP_PATTERN
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Random `[0-9A-Z]{8}` string.
pub fn random_suffix<R: Rng>(rng: &mut R) -> String {
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect()
}

fn unique_id<R: Rng>(base: &str, taken: &HashSet<String>, rng: &mut R) -> String {
    loop {
        let candidate = format!("{base}-{}", random_suffix(rng));
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
}

fn program_line(id: &str, previous: Option<&str>, command_line: &str) -> String {
    let mut line = format!("@PG\tID:{id}\tPN:{PROGRAM_NAME}");
    if let Some(pp) = previous {
        line.push_str("\tPP:");
        line.push_str(pp);
    }
    line.push_str("\tCL:");
    line.push_str(command_line);
    line
}

fn repoint_previous(line: String, renames: &HashMap<String, String>) -> String {
    match previous_program_id(&line).and_then(|pp| renames.get(pp)) {
        Some(new_pp) => replace_capture(&line, &PP_PATTERN, new_pp),
        None => line,
    }
}

/// Replace capture group 1 of the first match of `pattern` in `line` with `value`.
fn replace_capture(line: &str, pattern: &Regex, value: &str) -> String {
    match pattern.captures(line).and_then(|caps| caps.get(1)) {
        Some(m) => format!("{}{}{}", &line[..m.start()], value, &line[m.end()..]),
        None => line.to_string(),
    }
}
