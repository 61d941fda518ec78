//! Property tests for segmentation, driven by arbitrary documents.

#![cfg(feature = "testing")]

use arbitrary::{Arbitrary, Unstructured};
use sqload::testing::{
    FuzzDocument, FuzzLine, FuzzStatement, assert_document_roundtrip, check_segment_invariants,
};
use sqload::{ParseError, segment};

/// Deterministic pseudo-random bytes (xorshift) to feed `Unstructured`.
fn bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state.to_le_bytes()[0]
        })
        .collect()
}

#[test]
fn test_arbitrary_documents_roundtrip() {
    for seed in 0..512 {
        let data = bytes(seed, 1024);
        let mut unstructured = Unstructured::new(&data);
        let document = FuzzDocument::arbitrary(&mut unstructured).unwrap();
        assert_document_roundtrip(&document);
    }
}

#[test]
fn test_duplicate_names_keep_last_body() {
    let statement = |lines: Vec<FuzzLine>| FuzzStatement {
        name: b"A".to_vec(),
        indent: 4,
        lines,
    };
    let document = FuzzDocument {
        prelude: vec![FuzzLine::Comment(0, b"header".to_vec())],
        statements: vec![
            statement(vec![FuzzLine::Sql(b"one".to_vec())]),
            statement(vec![
                FuzzLine::Blank(3),
                FuzzLine::Comment(2, b"doc".to_vec()),
                FuzzLine::Sql(b"two".to_vec()),
                FuzzLine::Blank(1),
            ]),
        ],
    };
    let (text, expected) = document.render();
    assert_eq!(expected.len(), 1);
    assert_eq!(segment(&text).unwrap(), expected);
    assert_document_roundtrip(&document);
}

#[test]
fn test_arbitrary_text_invariants() {
    for seed in 0..512 {
        let data = bytes(seed, 256);
        let mut unstructured = Unstructured::new(&data);
        let text = String::arbitrary(&mut unstructured).unwrap();
        check_segment_invariants(&text);
        check_segment_invariants(&format!("-- query: {text}"));
        check_segment_invariants(&format!("-- query: A\n{text}\n-- query: B\n{text}"));
    }
}

#[test]
fn test_invalid_names_fail_whole_call() {
    for name in ["", "A B", "A-B", "Ünïcode", "A;"] {
        let text = format!("-- query: Good\nSELECT 1;\n-- query: {name}\nSELECT 2;");
        assert_eq!(
            segment(&text),
            Err(ParseError::InvalidStatementName(name.to_owned()))
        );
        check_segment_invariants(&text);
    }
}
