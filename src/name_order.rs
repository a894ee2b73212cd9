//! Version-aware ordering of read and reference names.
//!
//! Runs of ASCII digits compare by numeric value, so `read2` sorts before `read10`.
//! This is the order produced by `samtools sort -n` and is used both for the read stream
//! and for the `@SQ` merge-join.

use std::cmp::Ordering;

/// Compare two names in version-aware order.
///
/// Names that are numerically equal but textually different (`r01` vs `r1`) are broken
/// by plain byte order, so the result is `Equal` only for identical input.
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    compare_natural(a, b).then_with(|| a.cmp(b))
}

/// `true` when `current` sorts strictly after `previous`.
pub fn is_after(previous: &[u8], current: &[u8]) -> bool {
    compare(current, previous) == Ordering::Greater
}

fn compare_natural(a: &[u8], b: &[u8]) -> Ordering {
    let (mut i, mut j) = (0usize, 0usize);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let (run_a, next_i) = digit_run(a, i);
            let (run_b, next_j) = digit_run(b, j);
            let ord = compare_digit_runs(run_a, run_b);
            if ord != Ordering::Equal {
                return ord;
            }
            i = next_i;
            j = next_j;
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn digit_run(s: &[u8], start: usize) -> (&[u8], usize) {
    let end = s[start..]
        .iter()
        .position(|c| !c.is_ascii_digit())
        .map_or(s.len(), |n| start + n);
    (&s[start..end], end)
}

fn compare_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let a = strip_leading_zeros(a);
    let b = strip_leading_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn strip_leading_zeros(run: &[u8]) -> &[u8] {
    let zeros = run.iter().take_while(|&&c| c == b'0').count();
    &run[zeros..]
}
