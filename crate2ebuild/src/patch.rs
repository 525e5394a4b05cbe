//! In-place update of the generated parts of an existing ebuild
//!
//! Three regions are recognized by line markers:
//!
//! - the `CRATES="…"` assignment, which must occur exactly once
//! - the `LICENSE+="…"` assignment directly below the
//!   `# Dependent crate licenses` comment, required exactly once when
//!   crate licenses are updated and ignored otherwise
//! - the optional `declare -A GIT_CRATES=( … )` array
//!
//! The ebuild is scanned line by line, every region is located and
//! validated first, and only then is the output assembled. Lines outside
//! the regions are copied byte for byte, including their line endings.

use std::fmt;

use crate2ebuild_meta::Crate;
use tracing::debug;

use crate::{
    template::{crates_assignment, git_crates_block, CRATE_LICENSE_COMMENT},
    Error, Result,
};

const CRATES_OPENER: &str = "CRATES=\"";
const LICENSE_OPENER: &str = "LICENSE+=\"";
const GIT_CRATES_START: &str = "declare -A GIT_CRATES=(";
const GIT_CRATES_END: &str = ")";

/// A patchable part of an ebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Crates,
    CrateLicenses,
    GitCrates,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionKind::Crates => f.write_str("CRATES block"),
            RegionKind::CrateLicenses => f.write_str("crate license (LICENSE+=) block"),
            RegionKind::GitCrates => f.write_str("GIT_CRATES block"),
        }
    }
}

/// Lines `start..end` of the ebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    start: usize,
    end: usize,
}

/// Replacement of a region; `start == end` inserts before `start`.
#[derive(Debug)]
struct Edit {
    region: Region,
    text: String,
}

/// Line text without its terminator.
fn content(line: &str) -> &str {
    line.strip_suffix('\n').unwrap_or(line)
}

/// The assignment starting at `start`, if that line opens one.
///
/// `NAME="…"` on a single line is a complete region; otherwise the region
/// runs to the first following line that ends with the closing quote.
fn assignment_at(
    lines: &[&str],
    start: usize,
    opener: &str,
    kind: RegionKind,
) -> Result<Option<Region>> {
    let Some(rest) = content(lines[start]).strip_prefix(opener) else {
        return Ok(None);
    };
    if rest.ends_with('"') {
        return Ok(Some(Region {
            start,
            end: start + 1,
        }));
    }

    (start + 1..lines.len())
        .find(|&i| content(lines[i]).ends_with('"'))
        .map(|close| {
            Some(Region {
                start,
                end: close + 1,
            })
        })
        .ok_or(Error::UnterminatedRegion {
            kind,
            line: start + 1,
        })
}

fn find_crates(lines: &[&str]) -> Result<Vec<Region>> {
    let mut regions = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        match assignment_at(lines, i, CRATES_OPENER, RegionKind::Crates)? {
            Some(region) => {
                i = region.end;
                regions.push(region);
            }
            None => i += 1,
        }
    }
    Ok(regions)
}

fn find_crate_licenses(lines: &[&str]) -> Result<Vec<Region>> {
    let mut regions = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if content(lines[i]) != CRATE_LICENSE_COMMENT {
            i += 1;
            continue;
        }

        let region = if i + 1 < lines.len() {
            assignment_at(lines, i + 1, LICENSE_OPENER, RegionKind::CrateLicenses)?
        } else {
            None
        };
        let Some(region) = region else {
            return Err(Error::MalformedRegion(format!(
                "'{}' on line {} is not followed by {}",
                CRATE_LICENSE_COMMENT,
                i + 1,
                LICENSE_OPENER
            )));
        };
        i = region.end;
        regions.push(region);
    }
    Ok(regions)
}

fn find_git_crates(lines: &[&str]) -> Result<Vec<Region>> {
    let mut regions = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if content(lines[i]) != GIT_CRATES_START {
            i += 1;
            continue;
        }

        let close = (i + 1..lines.len())
            .find(|&j| content(lines[j]) == GIT_CRATES_END)
            .ok_or(Error::UnterminatedRegion {
                kind: RegionKind::GitCrates,
                line: i + 1,
            })?;
        regions.push(Region {
            start: i,
            end: close + 1,
        });
        i = close + 1;
    }
    Ok(regions)
}

fn at_most_one(regions: Vec<Region>, kind: RegionKind) -> Result<Option<Region>> {
    match regions.as_slice() {
        [] => Ok(None),
        [region] => Ok(Some(*region)),
        _ => Err(Error::DuplicateRegion {
            kind,
            lines: regions.iter().map(|r| r.start + 1).collect(),
        }),
    }
}

fn exactly_one(regions: Vec<Region>, kind: RegionKind) -> Result<Region> {
    at_most_one(regions, kind)?.ok_or(Error::MissingRegion(kind))
}

/// The `inherit` line naming the cargo eclass.
fn find_inherit_cargo(lines: &[&str]) -> Option<usize> {
    lines.iter().position(|line| {
        let mut words = content(line).split_whitespace();
        words.next() == Some("inherit") && words.any(|w| w == "cargo")
    })
}

/// Replacement text for `region`, keeping the terminator of its last line.
fn replacement(lines: &[&str], region: Region, text: String) -> String {
    if lines[region.end - 1].ends_with('\n') {
        text + "\n"
    } else {
        text
    }
}

/// Update the generated regions of an existing ebuild.
///
/// The `CRATES` list is rewritten from the registry crates in `crates`.
/// With `crate_licenses` set to the rendered `LICENSE+=` value the
/// license addendum is rewritten too; with `None` it is left alone and
/// not even looked for. The `GIT_CRATES` array is rewritten, inserted
/// before `inherit cargo`, or removed together with the blank line
/// following it, depending on whether `crates` has git crates.
///
/// The input is never modified. On any structural problem an error is
/// returned and no text is produced.
pub fn patch_ebuild(
    existing: &str,
    crates: &[Crate],
    crate_licenses: Option<&str>,
) -> Result<String> {
    let lines: Vec<&str> = existing.split_inclusive('\n').collect();
    let mut edits = Vec::new();

    let region = exactly_one(find_crates(&lines)?, RegionKind::Crates)?;
    debug!("CRATES block at lines {}..{}", region.start + 1, region.end);
    edits.push(Edit {
        region,
        text: replacement(&lines, region, crates_assignment(crates)),
    });

    if let Some(value) = crate_licenses {
        let region = exactly_one(find_crate_licenses(&lines)?, RegionKind::CrateLicenses)?;
        debug!("LICENSE+= block at lines {}..{}", region.start + 1, region.end);
        edits.push(Edit {
            region,
            text: replacement(&lines, region, format!("{}{}\"", LICENSE_OPENER, value)),
        });
    }

    let git_region = at_most_one(find_git_crates(&lines)?, RegionKind::GitCrates)?;
    match (git_region, git_crates_block(crates)) {
        (Some(region), Some(block)) => edits.push(Edit {
            region,
            text: replacement(&lines, region, block),
        }),
        (Some(mut region), None) => {
            if region.end < lines.len() && content(lines[region.end]).is_empty() {
                region.end += 1;
            }
            debug!("Removing GIT_CRATES block at lines {}..{}", region.start + 1, region.end);
            edits.push(Edit {
                region,
                text: String::new(),
            });
        }
        (None, Some(block)) => {
            let anchor = find_inherit_cargo(&lines).ok_or(Error::MissingAnchor)?;
            debug!("Inserting GIT_CRATES block before line {}", anchor + 1);
            edits.push(Edit {
                region: Region {
                    start: anchor,
                    end: anchor,
                },
                text: format!("{}\n\n", block),
            });
        }
        (None, None) => {}
    }

    edits.sort_by_key(|e| (e.region.start, e.region.end));
    for pair in edits.windows(2) {
        if pair[1].region.start < pair[0].region.end {
            return Err(Error::MalformedRegion(format!(
                "regions at lines {} and {} overlap",
                pair[0].region.start + 1,
                pair[1].region.start + 1
            )));
        }
    }

    let mut out = String::with_capacity(existing.len());
    let mut edits = edits.into_iter().peekable();
    let mut i = 0;
    while i < lines.len() || edits.peek().is_some() {
        match edits.next_if(|e| e.region.start == i) {
            Some(edit) => {
                out.push_str(&edit.text);
                i = edit.region.end;
            }
            None if i < lines.len() => {
                out.push_str(lines[i]);
                i += 1;
            }
            // edits are sorted and validated against the line count
            None => break,
        }
    }

    Ok(out)
}
