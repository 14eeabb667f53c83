// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Tag matcher
//
// Answers, for a growing buffer, whether an artifact delimiter is fully
// present, still forming at the tail, or absent. The tail check is a
// KMP prefix automaton over the delimiter literal, so it keeps working
// if the literal ever changes.

/// Literal that starts an artifact open tag. Attributes and `>` follow.
pub const OPEN_TAG: &str = "<sphere_artifact";

/// Literal that closes an artifact.
pub const CLOSE_TAG: &str = "</sphere_artifact>";

/// Outcome of scanning a buffer for a delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    /// Delimiter fully present.
    ///
    /// `start` is the byte index where the literal begins. For the open
    /// tag, `end` is the index of the terminating `>`; for the close tag
    /// it is the index one past the literal.
    Complete { start: usize, end: usize },
    /// Open-tag literal present but its terminating `>` has not arrived.
    Pending { start: usize },
    /// The buffer ends with a proper prefix of the delimiter starting at
    /// `start`. More text may complete it.
    Partial { start: usize },
    /// No occurrence and nothing at the tail that could become one.
    Absent,
}

impl TagMatch {
    /// True when the buffer must be withheld rather than flushed.
    pub fn is_unresolved(&self) -> bool {
        matches!(self, TagMatch::Pending { .. } | TagMatch::Partial { .. })
    }
}

/// A delimiter literal with its precomputed failure table.
#[derive(Debug, Clone)]
pub struct Delimiter {
    literal: &'static str,
    /// `failure[i]` is the length of the longest proper border of
    /// `literal[..=i]`.
    failure: Vec<usize>,
}

impl Delimiter {
    pub fn new(literal: &'static str) -> Self {
        let pattern = literal.as_bytes();
        let mut failure = vec![0; pattern.len()];
        let mut k = 0;
        for i in 1..pattern.len() {
            while k > 0 && pattern[i] != pattern[k] {
                k = failure[k - 1];
            }
            if pattern[i] == pattern[k] {
                k += 1;
            }
            failure[i] = k;
        }
        Self { literal, failure }
    }

    pub fn literal(&self) -> &'static str {
        self.literal
    }

    pub fn len(&self) -> usize {
        self.literal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literal.is_empty()
    }

    /// Length of the longest suffix of `buf` that is a non-empty proper
    /// prefix of the literal. Zero when there is none.
    pub fn pending_prefix_len(&self, buf: &str) -> usize {
        let pattern = self.literal.as_bytes();
        if pattern.len() < 2 {
            return 0;
        }

        // Only the last len-1 bytes can hold a proper prefix.
        let bytes = buf.as_bytes();
        let from = bytes.len().saturating_sub(pattern.len() - 1);

        let mut state = 0;
        for &b in &bytes[from..] {
            while state > 0 && b != pattern[state] {
                state = self.failure[state - 1];
            }
            if b == pattern[state] {
                state += 1;
            }
            // A full match here would be a complete literal inside the
            // window, which cannot happen for a window shorter than it.
            if state == pattern.len() {
                state = self.failure[state - 1];
            }
        }
        state
    }
}

fn open_delimiter() -> &'static Delimiter {
    static OPEN: std::sync::LazyLock<Delimiter> =
        std::sync::LazyLock::new(|| Delimiter::new(OPEN_TAG));
    &OPEN
}

fn close_delimiter() -> &'static Delimiter {
    static CLOSE: std::sync::LazyLock<Delimiter> =
        std::sync::LazyLock::new(|| Delimiter::new(CLOSE_TAG));
    &CLOSE
}

/// Scan for the open tag: `<sphere_artifact`, attribute text, `>`.
pub fn match_open_tag(buf: &str) -> TagMatch {
    if let Some(start) = buf.find(OPEN_TAG) {
        let after_literal = start + OPEN_TAG.len();
        return match buf[after_literal..].find('>') {
            Some(offset) => TagMatch::Complete {
                start,
                end: after_literal + offset,
            },
            None => TagMatch::Pending { start },
        };
    }
    tail_match(buf, open_delimiter())
}

/// Scan for the close tag `</sphere_artifact>`.
pub fn match_close_tag(buf: &str) -> TagMatch {
    if let Some(start) = buf.find(CLOSE_TAG) {
        return TagMatch::Complete {
            start,
            end: start + CLOSE_TAG.len(),
        };
    }
    tail_match(buf, close_delimiter())
}

fn tail_match(buf: &str, delimiter: &Delimiter) -> TagMatch {
    match delimiter.pending_prefix_len(buf) {
        0 => TagMatch::Absent,
        n => TagMatch::Partial {
            start: buf.len() - n,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_proper_prefix_of_open_tag_is_partial() {
        for n in 1..OPEN_TAG.len() {
            let buf = format!("some text {}", &OPEN_TAG[..n]);
            assert_eq!(
                match_open_tag(&buf),
                TagMatch::Partial { start: 10 },
                "prefix of length {n}"
            );
        }
    }

    #[test]
    fn every_proper_prefix_of_close_tag_is_partial() {
        for n in 1..CLOSE_TAG.len() {
            let buf = format!("body{}", &CLOSE_TAG[..n]);
            assert_eq!(
                match_close_tag(&buf),
                TagMatch::Partial { start: 4 },
                "prefix of length {n}"
            );
        }
    }

    #[test]
    fn open_literal_without_gt_is_pending() {
        assert_eq!(
            match_open_tag("hi <sphere_artifact title=\"x\""),
            TagMatch::Pending { start: 3 }
        );
    }

    #[test]
    fn complete_open_tag_reports_gt_index() {
        let buf = "ab<sphere_artifact title=\"x\">rest";
        match match_open_tag(buf) {
            TagMatch::Complete { start, end } => {
                assert_eq!(start, 2);
                assert_eq!(&buf[end..end + 1], ">");
                assert_eq!(&buf[end + 1..], "rest");
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn complete_close_tag_reports_end_past_literal() {
        let buf = "code</sphere_artifact> after";
        assert_eq!(
            match_close_tag(buf),
            TagMatch::Complete { start: 4, end: 22 }
        );
        assert_eq!(&buf[22..], " after");
    }

    #[test]
    fn unrelated_text_is_absent() {
        assert_eq!(match_open_tag("plain text"), TagMatch::Absent);
        assert_eq!(match_close_tag("a < b"), TagMatch::Absent);
        assert_eq!(match_open_tag(""), TagMatch::Absent);
    }

    #[test]
    fn lone_lt_is_partial_for_both_tags() {
        assert_eq!(match_open_tag("x <"), TagMatch::Partial { start: 2 });
        assert_eq!(match_close_tag("x <"), TagMatch::Partial { start: 2 });
    }

    #[test]
    fn angle_then_other_letter_is_absent() {
        assert_eq!(match_open_tag("<div"), TagMatch::Absent);
        assert_eq!(match_close_tag("</div"), TagMatch::Absent);
    }

    #[test]
    fn longest_prefix_found_after_false_start() {
        // "<<s": the first '<' is a dead end, the tail "<s" is live.
        assert_eq!(match_open_tag("<<s"), TagMatch::Partial { start: 1 });
        assert_eq!(match_close_tag("</</s"), TagMatch::Partial { start: 2 });
    }

    #[test]
    fn multibyte_text_before_prefix_is_handled() {
        let buf = "señal ✓ </sph";
        assert_eq!(
            match_close_tag(buf),
            TagMatch::Partial {
                start: buf.len() - 5
            }
        );
        assert_eq!(match_open_tag("✓✓✓"), TagMatch::Absent);
    }

    #[test]
    fn failure_table_handles_self_overlapping_literal() {
        let d = Delimiter::new("abab!");
        assert_eq!(d.pending_prefix_len("xxabab"), 4);
        assert_eq!(d.pending_prefix_len("ababa"), 3);
        assert_eq!(d.pending_prefix_len("abab!"), 0);
        assert_eq!(d.pending_prefix_len("b"), 0);
    }
}
