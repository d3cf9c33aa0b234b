//! Block scanner: finds marker-delimited spans in arbitrary text.
//!
//! The scanner knows nothing about the host language. It looks for the
//! literal start markers and the end marker, and hands out the text between
//! them together with the line the block starts on.

use crate::config::Markers;
use crate::model::Origin;
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Endpoint,
    Object,
    Definition,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BlockKind::Endpoint => "endpoint",
            BlockKind::Object => "object",
            BlockKind::Definition => "definition",
        })
    }
}

/// Text between a start marker and its end marker, markers excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock<'a> {
    pub kind: BlockKind,
    pub path: &'a Path,
    /// 1-based line of the start marker.
    pub line: usize,
    pub body: &'a str,
}

impl<'a> RawBlock<'a> {
    pub fn origin(&self) -> Origin {
        Origin::new(self.path, self.line)
    }

    /// Body lines with their absolute line numbers. The first item is the
    /// remainder of the start marker's own line.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        let start = self.line;
        self.body.split('\n').enumerate().map(move |(i, l)| {
            (start + i, l.strip_suffix('\r').unwrap_or(l))
        })
    }
}

/// A start marker with no end marker before the next start marker or the
/// end of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unterminated {
    pub kind: BlockKind,
    pub origin: Origin,
}

/// Lazy iterator over the blocks of one text.
///
/// Holds no state beyond its cursor, so scanning the same text again yields
/// the same sequence.
#[derive(Debug, Clone)]
pub struct BlockScanner<'a> {
    path: &'a Path,
    text: &'a str,
    markers: &'a Markers,
    pos: usize,
    line: usize,
}

/// Scan `text` (read from `path`) for documentation blocks.
pub fn scan<'a>(path: &'a Path, text: &'a str, markers: &'a Markers) -> BlockScanner<'a> {
    BlockScanner {
        path,
        text,
        markers,
        pos: 0,
        line: 1,
    }
}

impl<'a> BlockScanner<'a> {
    /// Earliest start marker at or after byte offset `from`.
    fn next_start(&self, from: usize) -> Option<(usize, BlockKind, usize)> {
        let haystack = &self.text[from..];
        [
            (self.markers.endpoint.as_str(), BlockKind::Endpoint),
            (self.markers.object.as_str(), BlockKind::Object),
            (self.markers.definition.as_str(), BlockKind::Definition),
        ]
        .into_iter()
        .filter(|(marker, _)| !marker.is_empty())
        .filter_map(|(marker, kind)| haystack.find(marker).map(|i| (from + i, kind, marker.len())))
        .min_by_key(|(at, _, _)| *at)
    }

    /// Move the cursor to `to`, keeping the line count in step.
    fn advance(&mut self, to: usize) {
        self.line += self.text[self.pos..to].matches('\n').count();
        self.pos = to;
    }
}

impl<'a> Iterator for BlockScanner<'a> {
    type Item = Result<RawBlock<'a>, Unterminated>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }

        let Some((start, kind, marker_len)) = self.next_start(self.pos) else {
            self.pos = self.text.len();
            return None;
        };
        self.advance(start);
        let line = self.line;
        let body_start = start + marker_len;

        let end = self.text[body_start..]
            .find(self.markers.end.as_str())
            .map(|i| body_start + i);
        let following = self.next_start(body_start).map(|(at, _, _)| at);

        match (end, following) {
            (Some(end), following) if following.map_or(true, |next| end < next) => {
                let body = &self.text[body_start..end];
                self.advance(end + self.markers.end.len());
                Some(Ok(RawBlock {
                    kind,
                    path: self.path,
                    line,
                    body,
                }))
            }
            (_, following) => {
                // Resume at the next start marker so one broken block does
                // not swallow the blocks after it.
                self.advance(following.unwrap_or(self.text.len()));
                Some(Err(Unterminated {
                    kind,
                    origin: Origin::new(self.path, line),
                }))
            }
        }
    }
}
