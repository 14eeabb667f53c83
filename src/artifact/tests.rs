// Copyright 2026 The Sphere Project
// SPDX-License-Identifier: Apache-2.0

// Tests for the artifact mode controller
//
// Tests cover:
//  1. Plain text passes straight through
//  2. Open / body / close / trailing text across separate deltas
//  3. Open tag grown one character at a time never leaks a token
//  4. Close tag split across deltas, and false alarms
//  5. End-of-stream policy (trailing text, unterminated artifact)
//  6. Chunk-boundary invariance over every split of a document
//  7. No delimiter leakage, single live buffer
//  8. Residue after a close tag is not rescanned

use super::*;
use crate::event::OutputEvent;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run a full response through a fresh parser, including end of stream.
fn run(deltas: &[&str]) -> Vec<OutputEvent> {
    let mut parser = ArtifactParser::new();
    let mut events = Vec::new();
    for delta in deltas {
        events.extend(parser.push(delta));
    }
    events.extend(parser.finish());
    events
}

/// Merge adjacent text events of the same kind so sequences produced by
/// different splits can be compared.
fn coalesce(events: Vec<OutputEvent>) -> Vec<OutputEvent> {
    let mut out: Vec<OutputEvent> = Vec::new();
    for event in events {
        if let Some(last) = out.last_mut() {
            match (last, &event) {
                (OutputEvent::Token { content }, OutputEvent::Token { content: more })
                | (
                    OutputEvent::ArtifactChunk { content },
                    OutputEvent::ArtifactChunk { content: more },
                ) => {
                    content.push_str(more);
                    continue;
                }
                _ => {}
            }
        }
        out.push(event);
    }
    out
}

/// Split `text` into deltas at the given char-boundary byte offsets.
fn split_at<'a>(text: &'a str, cuts: &[usize]) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for &cut in cuts {
        pieces.push(&text[last..cut]);
        last = cut;
    }
    pieces.push(&text[last..]);
    pieces
}

fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices().map(|(i, _)| i).filter(|&i| i > 0).collect()
}

fn open(title: &str, kind: &str, language: &str) -> OutputEvent {
    OutputEvent::ArtifactOpen {
        title: title.into(),
        kind: kind.into(),
        language: language.into(),
    }
}

const DOCUMENT: &str = "Intro text.\n<sphere_artifact title=\"a.py\" type=\"code\" language=\"python\">print('<hi>')\nif a < b: pass\n</sphere_artifact>\nThanks — ¡listo!";

fn document_events() -> Vec<OutputEvent> {
    vec![
        OutputEvent::token("Intro text.\n"),
        open("a.py", "code", "python"),
        OutputEvent::chunk("print('<hi>')\nif a < b: pass\n"),
        OutputEvent::ArtifactClose,
        OutputEvent::token("\nThanks — ¡listo!"),
    ]
}

// ---------------------------------------------------------------------------
// Basic flow
// ---------------------------------------------------------------------------

#[test]
fn plain_text_is_emitted_as_token() {
    assert_eq!(run(&["Hello "]), vec![OutputEvent::token("Hello ")]);
}

#[test]
fn artifact_across_separate_deltas() {
    let events = run(&[
        "<sphere_artifact title=\"x\" type=\"code\">",
        "print(1)",
        "</sphere_artifact>",
        " done",
    ]);
    assert_eq!(
        events,
        vec![
            open("x", "code", ""),
            OutputEvent::chunk("print(1)"),
            OutputEvent::ArtifactClose,
            OutputEvent::token(" done"),
        ]
    );
}

#[test]
fn whole_document_in_one_delta() {
    assert_eq!(run(&[DOCUMENT]), document_events());
}

#[test]
fn text_before_tag_is_flushed_raw() {
    let events = run(&["\n  <sphere_artifact>", "body", "</sphere_artifact>"]);
    assert_eq!(
        events,
        vec![
            OutputEvent::token("\n  "),
            open("untitled", "code", ""),
            OutputEvent::chunk("body"),
            OutputEvent::ArtifactClose,
        ]
    );
}

#[test]
fn residue_after_open_tag_is_artifact_body() {
    let events = run(&["<sphere_artifact type=\"csv\">a,b\n1,2", "</sphere_artifact>"]);
    assert_eq!(
        events,
        vec![
            open("untitled", "csv", ""),
            OutputEvent::chunk("a,b\n1,2"),
            OutputEvent::ArtifactClose,
        ]
    );
}

#[test]
fn empty_deltas_produce_nothing() {
    let mut parser = ArtifactParser::new();
    assert!(parser.push("").is_empty());
    assert_eq!(parser.mode(), Mode::Outside);
    assert!(parser.finish().is_none());
}

// ---------------------------------------------------------------------------
// Split delimiters
// ---------------------------------------------------------------------------

#[test]
fn open_tag_grown_one_char_at_a_time_emits_no_token() {
    let tag = "<sphere_artifact title=\"t\" type=\"markdown\">";
    let mut parser = ArtifactParser::new();

    let chars: Vec<String> = tag.chars().map(String::from).collect();
    let (last, prefix) = chars.split_last().unwrap();
    for c in prefix {
        let events = parser.push(c);
        assert!(events.is_empty(), "premature events for {c:?}: {events:?}");
    }
    assert_eq!(parser.pending(), &tag[..tag.len() - 1]);

    assert_eq!(parser.push(last), vec![open("t", "markdown", "")]);
    assert!(parser.is_inside());
    assert_eq!(parser.pending(), "");
}

#[test]
fn close_tag_split_across_deltas() {
    let mut parser = ArtifactParser::new();
    parser.push("<sphere_artifact>");

    assert!(parser.push("x = 1\n</sph").is_empty());
    assert_eq!(parser.pending(), "x = 1\n</sph");

    assert_eq!(
        parser.push("ere_artifact>ok"),
        vec![
            OutputEvent::chunk("x = 1\n"),
            OutputEvent::ArtifactClose,
            OutputEvent::token("ok"),
        ]
    );
    assert_eq!(parser.mode(), Mode::Outside);
}

#[test]
fn false_alarm_inside_is_flushed_on_next_delta() {
    let mut parser = ArtifactParser::new();
    parser.push("<sphere_artifact>");

    assert!(parser.push("if a <").is_empty());
    assert_eq!(parser.push(" b {"), vec![OutputEvent::chunk("if a < b {")]);
}

#[test]
fn false_alarm_outside_is_flushed_on_next_delta() {
    let mut parser = ArtifactParser::new();
    assert!(parser.push("use <sph").is_empty());
    assert_eq!(
        parser.push("inx> please"),
        vec![OutputEvent::token("use <sphinx> please")]
    );
}

#[test]
fn open_literal_waits_for_its_gt() {
    let mut parser = ArtifactParser::new();
    assert!(parser.push("See <sphere_artifact title=\"plan").is_empty());
    assert!(parser.push("\" type=\"markdown\"").is_empty());
    assert_eq!(
        parser.push(">"),
        vec![OutputEvent::token("See "), open("plan", "markdown", "")]
    );
}

// ---------------------------------------------------------------------------
// End of stream
// ---------------------------------------------------------------------------

#[test]
fn unterminated_artifact_is_dropped_without_close() {
    let events = run(&["<sphere_artifact title=\"x\">", "partial body</sphere_art"]);
    assert_eq!(events, vec![open("x", "code", "")]);
}

#[test]
fn unterminated_artifact_keeps_already_flushed_chunks() {
    let events = run(&["<sphere_artifact>", "line 1\n", "line 2 <"]);
    assert_eq!(
        events,
        vec![open("untitled", "code", ""), OutputEvent::chunk("line 1\n")]
    );
    assert!(!events.contains(&OutputEvent::ArtifactClose));
}

#[test]
fn withheld_prefix_is_flushed_at_end_of_stream() {
    assert_eq!(
        run(&["a < b and <sphere_"]),
        vec![OutputEvent::token("a < b and <sphere_")]
    );
}

#[test]
fn open_tag_missing_gt_is_flushed_as_text_at_end_of_stream() {
    assert_eq!(
        run(&["x <sphere_artifact title=\"never"]),
        vec![OutputEvent::token("x <sphere_artifact title=\"never")]
    );
}

// ---------------------------------------------------------------------------
// Residue after a close tag
// ---------------------------------------------------------------------------

#[test]
fn open_tag_in_close_residue_is_emitted_as_text() {
    let events = run(&[
        "<sphere_artifact title=\"a\">",
        "one</sphere_artifact><sphere_artifact title=\"b\">",
        "two",
    ]);
    assert_eq!(
        events,
        vec![
            open("a", "code", ""),
            OutputEvent::chunk("one"),
            OutputEvent::ArtifactClose,
            OutputEvent::token("<sphere_artifact title=\"b\">"),
            OutputEvent::token("two"),
        ]
    );
}

#[test]
fn open_tag_in_a_later_delta_opens_a_second_artifact() {
    let events = run(&[
        "<sphere_artifact title=\"a\">one</sphere_artifact>",
        "\n<sphere_artifact title=\"b\">two</sphere_artifact>",
    ]);
    assert_eq!(
        events,
        vec![
            open("a", "code", ""),
            OutputEvent::chunk("one"),
            OutputEvent::ArtifactClose,
            OutputEvent::token("\n"),
            open("b", "code", ""),
            OutputEvent::chunk("two"),
            OutputEvent::ArtifactClose,
        ]
    );
}

// ---------------------------------------------------------------------------
// Properties over every split
// ---------------------------------------------------------------------------

#[test]
fn every_single_character_split_yields_same_structure() {
    let deltas: Vec<String> = DOCUMENT.chars().map(String::from).collect();
    let refs: Vec<&str> = deltas.iter().map(String::as_str).collect();
    assert_eq!(coalesce(run(&refs)), document_events());
}

#[test]
fn every_two_piece_split_yields_same_structure() {
    for cut in char_boundaries(DOCUMENT) {
        let deltas = split_at(DOCUMENT, &[cut]);
        assert_eq!(
            coalesce(run(&deltas)),
            document_events(),
            "split at byte {cut}: {deltas:?}"
        );
    }
}

#[test]
fn every_three_piece_split_yields_same_structure() {
    let cuts = char_boundaries(DOCUMENT);
    for (i, &a) in cuts.iter().enumerate() {
        for &b in &cuts[i + 1..] {
            let deltas = split_at(DOCUMENT, &[a, b]);
            assert_eq!(coalesce(run(&deltas)), document_events(), "{deltas:?}");
        }
    }
}

#[test]
fn no_emitted_content_contains_a_delimiter() {
    let deltas: Vec<String> = DOCUMENT.chars().map(String::from).collect();
    for chunk_len in 1..=8 {
        let pieces: Vec<String> = deltas.chunks(chunk_len).map(|c| c.concat()).collect();
        let refs: Vec<&str> = pieces.iter().map(String::as_str).collect();
        for event in run(&refs) {
            if let Some(text) = event.content_text() {
                assert!(!text.contains(OPEN_TAG), "leaked open tag in {text:?}");
                assert!(!text.contains(CLOSE_TAG), "leaked close tag in {text:?}");
            }
        }
    }
}

#[test]
fn at_most_one_buffer_is_live() {
    let mut parser = ArtifactParser::new();
    for c in DOCUMENT.chars() {
        parser.push(&c.to_string());
        let (outside, inside) = (&parser.outside_buffer, &parser.inside_buffer);
        assert!(
            outside.is_empty() || inside.is_empty(),
            "both buffers live: {outside:?} / {inside:?}"
        );
        match parser.mode() {
            Mode::Outside => assert!(inside.is_empty()),
            Mode::Inside => assert!(outside.is_empty()),
        }
    }
}
