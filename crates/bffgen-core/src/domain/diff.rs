//! Line-based unified diff between the on-disk file and what a regeneration
//! would write.
//!
//! The diff is computed with a longest-common-subsequence table after
//! stripping the shared prefix and suffix, which keeps the table small for
//! the usual case of a few changed lines inside a generated region. When the
//! differing middle is still too large for the table, it is reported as one
//! block of removals followed by one block of additions.

use std::fmt;

pub const DEFAULT_CONTEXT: usize = 3;

/// Largest LCS table (in cells) built for one diff.
pub const MAX_LCS_CELLS: usize = 4_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    Context,
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub tag: LineTag,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_len, self.new_start, self.new_len
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
}

impl DiffSummary {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} -{}", self.added, self.removed)
    }
}

/// Diff of one file. `old == None` means the file does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub is_new: bool,
    pub hunks: Vec<Hunk>,
    pub summary: DiffSummary,
}

impl FileDiff {
    pub fn compute(path: impl Into<String>, old: Option<&str>, new: &str, context: usize) -> Self {
        let old_lines: Vec<&str> = old.map(|o| o.lines().collect()).unwrap_or_default();
        let new_lines: Vec<&str> = new.lines().collect();
        let ops = diff_ops(&old_lines, &new_lines);

        let summary = ops.iter().fold(DiffSummary::default(), |mut acc, op| {
            match op.tag {
                LineTag::Added => acc.added += 1,
                LineTag::Removed => acc.removed += 1,
                LineTag::Context => {}
            }
            acc
        });

        Self {
            path: path.into(),
            is_new: old.is_none(),
            hunks: group_hunks(&ops, context),
            summary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

impl fmt::Display for FileDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_new {
            writeln!(f, "--- /dev/null")?;
        } else {
            writeln!(f, "--- a/{}", self.path)?;
        }
        writeln!(f, "+++ b/{}", self.path)?;
        for hunk in &self.hunks {
            writeln!(f, "{}", hunk.header())?;
            for line in &hunk.lines {
                let sign = match line.tag {
                    LineTag::Context => ' ',
                    LineTag::Added => '+',
                    LineTag::Removed => '-',
                };
                writeln!(f, "{sign}{}", line.text)?;
            }
        }
        Ok(())
    }
}

struct Op<'a> {
    tag: LineTag,
    text: &'a str,
}

fn diff_ops<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<Op<'a>> {
    let prefix = old
        .iter()
        .zip(new.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let a = &old[prefix..old.len() - suffix];
    let b = &new[prefix..new.len() - suffix];

    let mut ops: Vec<Op<'a>> = old[..prefix]
        .iter()
        .map(|&t| Op { tag: LineTag::Context, text: t })
        .collect();
    middle_ops(a, b, &mut ops);
    ops.extend(
        old[old.len() - suffix..]
            .iter()
            .map(|&t| Op { tag: LineTag::Context, text: t }),
    );
    ops
}

fn middle_ops<'a>(a: &[&'a str], b: &[&'a str], ops: &mut Vec<Op<'a>>) {
    let width = b.len() + 1;
    let cells = (a.len() + 1).saturating_mul(width);
    if cells > MAX_LCS_CELLS {
        ops.extend(a.iter().map(|&t| Op { tag: LineTag::Removed, text: t }));
        ops.extend(b.iter().map(|&t| Op { tag: LineTag::Added, text: t }));
        return;
    }

    // lcs[i][j] = length of the LCS of a[i..] and b[j..]
    let mut lcs = vec![0usize; cells];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            ops.push(Op { tag: LineTag::Context, text: a[i] });
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            ops.push(Op { tag: LineTag::Removed, text: a[i] });
            i += 1;
        } else {
            ops.push(Op { tag: LineTag::Added, text: b[j] });
            j += 1;
        }
    }
    ops.extend(a[i..].iter().map(|&t| Op { tag: LineTag::Removed, text: t }));
    ops.extend(b[j..].iter().map(|&t| Op { tag: LineTag::Added, text: t }));
}

fn group_hunks(ops: &[Op<'_>], context: usize) -> Vec<Hunk> {
    // 0-based (old, new) line index before each op
    let mut positions = Vec::with_capacity(ops.len());
    let (mut old_pos, mut new_pos) = (0, 0);
    for op in ops {
        positions.push((old_pos, new_pos));
        match op.tag {
            LineTag::Context => {
                old_pos += 1;
                new_pos += 1;
            }
            LineTag::Removed => old_pos += 1,
            LineTag::Added => new_pos += 1,
        }
    }

    let changes: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| op.tag != LineTag::Context)
        .map(|(idx, _)| idx)
        .collect();

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for &idx in &changes {
        let start = idx.saturating_sub(context);
        let end = (idx + context + 1).min(ops.len());
        match ranges.last_mut() {
            Some((_, last_end)) if start <= *last_end => *last_end = end,
            _ => ranges.push((start, end)),
        }
    }

    ranges
        .into_iter()
        .map(|(start, end)| {
            let slice = &ops[start..end];
            let old_len = slice.iter().filter(|o| o.tag != LineTag::Added).count();
            let new_len = slice.iter().filter(|o| o.tag != LineTag::Removed).count();
            let (old_at, new_at) = positions[start];
            Hunk {
                old_start: if old_len == 0 { old_at } else { old_at + 1 },
                old_len,
                new_start: if new_len == 0 { new_at } else { new_at + 1 },
                new_len,
                lines: slice
                    .iter()
                    .map(|o| DiffLine {
                        tag: o.tag,
                        text: o.text.to_string(),
                    })
                    .collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_has_no_hunks() {
        let d = FileDiff::compute("main.go", Some("a\nb\n"), "a\nb\n", DEFAULT_CONTEXT);
        assert!(d.is_empty());
        assert!(d.summary.is_empty());
    }

    #[test]
    fn new_file_is_all_additions() {
        let d = FileDiff::compute("main.go", None, "a\nb\n", DEFAULT_CONTEXT);
        assert!(d.is_new);
        assert_eq!(d.summary, DiffSummary { added: 2, removed: 0 });
        let text = d.to_string();
        assert!(text.starts_with("--- /dev/null\n+++ b/main.go\n@@ -0,0 +1,2 @@\n"));
        assert!(text.contains("+a\n+b\n"));
    }

    #[test]
    fn single_line_change_with_context() {
        let old = "1\n2\n3\n4\n5\n6\n7\n8\n9\n";
        let new = "1\n2\n3\n4\nfive\n6\n7\n8\n9\n";
        let d = FileDiff::compute("f", Some(old), new, 3);
        assert_eq!(d.hunks.len(), 1);
        let h = &d.hunks[0];
        assert_eq!(h.header(), "@@ -2,7 +2,7 @@");
        assert_eq!(d.summary.to_string(), "+1 -1");
        let rendered = d.to_string();
        assert!(rendered.contains("-5\n+five\n"));
    }

    #[test]
    fn distant_changes_make_separate_hunks() {
        let old: String = (1..=20).map(|n| format!("{n}\n")).collect();
        let new: String = (1..=20)
            .map(|n| match n {
                2 => "two\n".to_string(),
                19 => "nineteen\n".to_string(),
                n => format!("{n}\n"),
            })
            .collect();
        let d = FileDiff::compute("f", Some(&old), &new, 3);
        assert_eq!(d.hunks.len(), 2);
    }

    #[test]
    fn nearby_changes_merge_into_one_hunk() {
        let old = "a\nb\nc\nd\ne\n";
        let new = "A\nb\nc\nd\nE\n";
        let d = FileDiff::compute("f", Some(old), new, 3);
        assert_eq!(d.hunks.len(), 1);
        assert_eq!(d.summary, DiffSummary { added: 2, removed: 2 });
    }

    #[test]
    fn inserted_lines_between_context() {
        let old = "begin\nend\n";
        let new = "begin\nx\ny\nend\n";
        let d = FileDiff::compute("f", Some(old), new, 1);
        assert_eq!(d.hunks[0].header(), "@@ -1,2 +1,4 @@");
        assert_eq!(d.summary, DiffSummary { added: 2, removed: 0 });
    }

    #[test]
    fn oversized_rewrite_becomes_one_replacement_hunk() {
        let lines = 3_000;
        assert!((lines + 1) * (lines + 1) > MAX_LCS_CELLS);
        let old: String = std::iter::once("package main\n".to_string())
            .chain((0..lines).map(|n| format!("old {n}\n")))
            .collect();
        let new: String = std::iter::once("package main\n".to_string())
            .chain((0..lines).map(|n| format!("new {n}\n")))
            .collect();

        let d = FileDiff::compute("f", Some(&old), &new, DEFAULT_CONTEXT);
        assert_eq!(d.summary, DiffSummary { added: lines, removed: lines });
        assert_eq!(d.hunks.len(), 1);
        assert_eq!(d.hunks[0].header(), "@@ -1,3001 +1,3001 @@");
        let first_change = &d.hunks[0].lines[1];
        assert_eq!(first_change.tag, LineTag::Removed);
        assert_eq!(first_change.text, "old 0");
    }
}
