//! Generator-owned regions inside user-editable files.
//!
//! A managed file contains exactly one region delimited by two sentinel
//! lines:
//!
//! ```text
//! // bffgen:begin
//! ...generated code...
//! // bffgen:end
//! ```
//!
//! A line is a sentinel when, after trimming surrounding whitespace, it is
//! exactly the sentinel text. Everything strictly between the two lines
//! belongs to the generator. Everything else, the sentinel lines included,
//! belongs to the user and is copied through byte-for-byte.
//!
//! Scanning is strict. Anything other than one begin line followed by one
//! end line is a [`DomainError::MarkerCorruption`]; the splicer never
//! guesses where a region might have been.

use std::fmt;

use crate::domain::error::DomainError;

pub const BEGIN_TAG: &str = "bffgen:begin";
pub const END_TAG: &str = "bffgen:end";

/// Line-comment syntax used to write the sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentStyle {
    /// `//` (Go, JavaScript, TypeScript)
    Slash,
    /// `#` (YAML, shell, Dockerfile)
    Hash,
}

impl CommentStyle {
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Slash => "//",
            Self::Hash => "#",
        }
    }
}

/// The two sentinel lines for one comment style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    begin: String,
    end: String,
}

impl Markers {
    pub fn new(style: CommentStyle) -> Self {
        Self {
            begin: format!("{} {BEGIN_TAG}", style.prefix()),
            end: format!("{} {END_TAG}", style.prefix()),
        }
    }

    pub fn begin(&self) -> &str {
        &self.begin
    }

    pub fn end(&self) -> &str {
        &self.end
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self::new(CommentStyle::Slash)
    }
}

/// User-owned text placed around the region when a file is first created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scaffold {
    pub header: String,
    pub footer: String,
}

impl Scaffold {
    pub fn new(header: impl Into<String>, footer: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            footer: footer.into(),
        }
    }
}

/// Sentinel lines found in a file (1-based line numbers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerScan {
    pub begin_lines: Vec<usize>,
    pub end_lines: Vec<usize>,
}

impl MarkerScan {
    pub fn has_markers(&self) -> bool {
        !self.begin_lines.is_empty() || !self.end_lines.is_empty()
    }
}

impl fmt::Display for MarkerScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "begin at {:?}, end at {:?}",
            self.begin_lines, self.end_lines
        )
    }
}

/// Byte range of the generator-owned body inside a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// First byte after the begin line's newline.
    pub body_start: usize,
    /// First byte of the end line.
    pub body_end: usize,
}

/// Locates and replaces the generator-owned region of a file.
#[derive(Debug, Clone, Default)]
pub struct MarkerSplicer {
    markers: Markers,
}

impl MarkerSplicer {
    pub fn new(style: CommentStyle) -> Self {
        Self {
            markers: Markers::new(style),
        }
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Report every sentinel line without judging the layout.
    pub fn inspect(&self, content: &str) -> MarkerScan {
        let mut scan = MarkerScan::default();
        for (idx, (_, line)) in lines_with_offsets(content).enumerate() {
            let trimmed = line.trim();
            if trimmed == self.markers.begin {
                scan.begin_lines.push(idx + 1);
            } else if trimmed == self.markers.end {
                scan.end_lines.push(idx + 1);
            }
        }
        scan
    }

    /// Find the region, failing on any layout other than one begin line
    /// followed by one end line.
    pub fn locate(&self, content: &str) -> Result<Region, DomainError> {
        let mut begin: Vec<(usize, usize)> = Vec::new(); // (line, offset after line)
        let mut end: Vec<(usize, usize)> = Vec::new(); // (line, offset of line)

        for (idx, (offset, line)) in lines_with_offsets(content).enumerate() {
            let trimmed = line.trim();
            if trimmed == self.markers.begin {
                begin.push((idx + 1, offset + line.len()));
            } else if trimmed == self.markers.end {
                end.push((idx + 1, offset));
            }
        }

        let corruption = |reason: String| DomainError::MarkerCorruption { path: None, reason };

        match (begin.as_slice(), end.as_slice()) {
            ([], []) => Err(corruption(format!(
                "no '{}' / '{}' lines found; the file is not managed by bffgen",
                self.markers.begin, self.markers.end
            ))),
            ([], [(line, _), ..]) => Err(corruption(format!(
                "'{}' on line {line} has no matching '{}'",
                self.markers.end, self.markers.begin
            ))),
            ([(line, _)], []) => Err(corruption(format!(
                "'{}' on line {line} has no matching '{}'",
                self.markers.begin, self.markers.end
            ))),
            ([(b_line, body_start)], [(e_line, body_end)]) => {
                if e_line < b_line {
                    Err(corruption(format!(
                        "'{}' on line {e_line} comes before '{}' on line {b_line}",
                        self.markers.end, self.markers.begin
                    )))
                } else {
                    Ok(Region {
                        body_start: *body_start,
                        body_end: *body_end,
                    })
                }
            }
            _ if begin.len() > 1 => Err(corruption(format!(
                "'{}' appears {} times (lines {})",
                self.markers.begin,
                begin.len(),
                join_lines(&begin)
            ))),
            _ => Err(corruption(format!(
                "'{}' appears {} times (lines {})",
                self.markers.end,
                end.len(),
                join_lines(&end)
            ))),
        }
    }

    /// Produce the new file content.
    ///
    /// With no existing file the result is `header + begin + generated +
    /// end + footer`. With an existing file only the region body changes;
    /// a file without a valid region is an error and is never overwritten.
    pub fn splice(
        &self,
        existing: Option<&str>,
        generated: &str,
        scaffold: &Scaffold,
    ) -> Result<String, DomainError> {
        let body = normalize_body(generated);

        let Some(existing) = existing else {
            let mut out = String::with_capacity(
                scaffold.header.len() + body.len() + scaffold.footer.len() + 64,
            );
            push_block(&mut out, &scaffold.header);
            out.push_str(&self.markers.begin);
            out.push('\n');
            out.push_str(&body);
            out.push_str(&self.markers.end);
            out.push('\n');
            out.push_str(&scaffold.footer);
            return Ok(out);
        };

        let region = self.locate(existing)?;
        let mut out = String::with_capacity(existing.len() + body.len());
        out.push_str(&existing[..region.body_start]);
        out.push_str(&body);
        out.push_str(&existing[region.body_end..]);
        Ok(out)
    }
}

/// `(byte offset, line including its '\n')` for each line.
fn lines_with_offsets(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content.split_inclusive('\n').scan(0usize, |offset, line| {
        let start = *offset;
        *offset += line.len();
        Some((start, line))
    })
}

fn normalize_body(generated: &str) -> std::borrow::Cow<'_, str> {
    if generated.is_empty() || generated.ends_with('\n') {
        generated.into()
    } else {
        format!("{generated}\n").into()
    }
}

fn push_block(out: &mut String, block: &str) {
    out.push_str(block);
    if !block.is_empty() && !block.ends_with('\n') {
        out.push('\n');
    }
}

fn join_lines(found: &[(usize, usize)]) -> String {
    found
        .iter()
        .map(|(line, _)| line.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
