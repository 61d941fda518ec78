//! Segmentation fuzzer for arbitrary text.
//!
//! Feeds arbitrary strings through `segment` and checks the properties that
//! hold for any input: valid names only, no comment lines left in bodies, and
//! idempotent comment stripping.

use honggfuzz::fuzz;
use sqload::testing::check_segment_invariants;

fn main() {
    loop {
        fuzz!(|text: String| {
            check_segment_invariants(&text);
        });
    }
}
