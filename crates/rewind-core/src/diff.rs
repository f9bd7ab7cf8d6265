//! Line-level diff used for rewind previews
//!
//! The diff is a Myers shortest edit script over normalized lines, grouped
//! into regions. A region that both deletes and inserts lines is a change.
//! The output only feeds previews; it never influences backup or restore.

use crate::error::{RewindError, RewindResult};

/// Edit distance above which the middle section is reported as one change
const MAX_EDIT_DISTANCE: usize = 1_000;

/// Kind of a diff region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Insert,
    Delete,
    Change,
}

/// A contiguous changed region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pub kind: DeltaKind,
    /// Index of the first affected source line
    pub source_start: usize,
    pub source_lines: usize,
    /// Index of the first affected target line
    pub target_start: usize,
    pub target_lines: usize,
}

impl Delta {
    fn from_counts(source_start: usize, deleted: usize, target_start: usize, inserted: usize) -> Self {
        let kind = match (deleted, inserted) {
            (0, _) => DeltaKind::Insert,
            (_, 0) => DeltaKind::Delete,
            _ => DeltaKind::Change,
        };
        Self {
            kind,
            source_start,
            source_lines: deleted,
            target_start,
            target_lines: inserted,
        }
    }

    /// Lines this region contributes to the changed-line estimate
    pub fn changed_lines(&self) -> usize {
        match self.kind {
            DeltaKind::Insert => self.target_lines,
            DeltaKind::Delete => self.source_lines,
            DeltaKind::Change => self.source_lines.max(self.target_lines),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Insert,
    Delete,
}

/// Line diff between two texts
#[derive(Debug, Clone, Default)]
pub struct LineDiff {
    pub deltas: Vec<Delta>,
}

impl LineDiff {
    /// Diff two texts after line-ending normalization
    pub fn compute(before: &str, after: &str) -> RewindResult<Self> {
        let source = normalize_lines(before);
        let target = normalize_lines(after);
        Self::compute_lines(&source, &target)
    }

    /// Diff two line sequences
    pub fn compute_lines<S: AsRef<str>>(source: &[S], target: &[S]) -> RewindResult<Self> {
        let prefix = source
            .iter()
            .zip(target.iter())
            .take_while(|(a, b)| a.as_ref() == b.as_ref())
            .count();
        let suffix = source[prefix..]
            .iter()
            .rev()
            .zip(target[prefix..].iter().rev())
            .take_while(|(a, b)| a.as_ref() == b.as_ref())
            .count();

        let a: Vec<&str> = source[prefix..source.len() - suffix]
            .iter()
            .map(AsRef::as_ref)
            .collect();
        let b: Vec<&str> = target[prefix..target.len() - suffix]
            .iter()
            .map(AsRef::as_ref)
            .collect();

        if a.is_empty() && b.is_empty() {
            return Ok(Self::default());
        }

        let ops = match edit_script(&a, &b)? {
            Some(ops) => ops,
            None => {
                tracing::debug!(
                    "Edit distance exceeds {}, reporting {}x{} lines as one change",
                    MAX_EDIT_DISTANCE,
                    a.len(),
                    b.len()
                );
                return Ok(Self {
                    deltas: vec![Delta::from_counts(prefix, a.len(), prefix, b.len())],
                });
            }
        };

        Ok(Self {
            deltas: group_ops(&ops, prefix),
        })
    }

    /// Whether any region changed
    pub fn has_changes(&self) -> bool {
        !self.deltas.is_empty()
    }

    /// Sum of per-region changed lines
    pub fn changed_lines(&self) -> usize {
        self.deltas.iter().map(Delta::changed_lines).sum()
    }
}

/// Normalize `\r\n` and `\r` to `\n` and split into lines.
///
/// Empty text has no lines. A trailing newline yields a trailing empty line.
pub fn normalize_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(str::to_string)
        .collect()
}

/// Estimated number of changed lines between two texts.
///
/// Identical input is 0 without diffing. Failures are logged and count as 0.
pub fn estimate_changed_lines(before: &str, after: &str) -> usize {
    if before == after {
        return 0;
    }
    match LineDiff::compute(before, after) {
        Ok(diff) => diff.changed_lines(),
        Err(e) => {
            tracing::error!("Failed to estimate changed lines: {}", e);
            0
        }
    }
}

/// Myers shortest edit script. `None` when the edit distance exceeds
/// [`MAX_EDIT_DISTANCE`].
fn edit_script(a: &[&str], b: &[&str]) -> RewindResult<Option<Vec<Op>>> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let limit = (a.len() + b.len()).min(MAX_EDIT_DISTANCE) as isize;
    let offset = limit + 1;
    let mut v = vec![0isize; (2 * limit + 3) as usize];
    // trace[d] holds diagonals -d-1..=d+1 as they were before round d.
    let mut trace: Vec<Vec<isize>> = Vec::new();

    let mut found = false;
    'outer: for d in 0..=limit {
        trace.push(v[(offset - d - 1) as usize..=(offset + d + 1) as usize].to_vec());
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                found = true;
                break 'outer;
            }
            k += 2;
        }
    }

    if !found {
        return Ok(None);
    }

    let mut ops = Vec::new();
    let (mut x, mut y) = (n, m);
    for d in (0..trace.len() as isize).rev() {
        let v = &trace[d as usize];
        let k = x - y;
        let at = |k: isize| -> RewindResult<isize> {
            usize::try_from(k + d + 1)
                .ok()
                .and_then(|i| v.get(i))
                .copied()
                .ok_or_else(|| RewindError::other(format!("Diagonal {} out of range", k)))
        };
        let prev_k = if k == -d || (k != d && at(k - 1)? < at(k + 1)?) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = at(prev_k)?;
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push(Op::Equal);
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                ops.push(Op::Insert);
            } else {
                ops.push(Op::Delete);
            }
        }
        x = prev_x;
        y = prev_y;
    }

    ops.reverse();
    Ok(Some(ops))
}

/// Collapse an edit script into changed regions
fn group_ops(ops: &[Op], base: usize) -> Vec<Delta> {
    let mut deltas = Vec::new();
    let (mut source_idx, mut target_idx) = (base, base);
    let mut run: Option<(usize, usize, usize, usize)> = None;

    for op in ops {
        match op {
            Op::Equal => {
                if let Some((ss, deleted, ts, inserted)) = run.take() {
                    deltas.push(Delta::from_counts(ss, deleted, ts, inserted));
                }
                source_idx += 1;
                target_idx += 1;
            }
            Op::Delete => {
                let entry = run.get_or_insert((source_idx, 0, target_idx, 0));
                entry.1 += 1;
                source_idx += 1;
            }
            Op::Insert => {
                let entry = run.get_or_insert((source_idx, 0, target_idx, 0));
                entry.3 += 1;
                target_idx += 1;
            }
        }
    }
    if let Some((ss, deleted, ts, inserted)) = run {
        deltas.push(Delta::from_counts(ss, deleted, ts, inserted));
    }
    deltas
}
