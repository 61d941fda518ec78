//! Document round-trip fuzzer.
//!
//! Generates well-formed query files and verifies that segmenting them yields
//! exactly the statements of the reference model.

use honggfuzz::fuzz;
use sqload::testing::{FuzzDocument, assert_document_roundtrip};

fn main() {
    loop {
        fuzz!(|document: FuzzDocument| {
            assert_document_roundtrip(&document);
        });
    }
}
