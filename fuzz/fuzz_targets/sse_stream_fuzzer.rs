//! Fuzz target for server-sent event parsing
//!
//! # Strategy
//!
//! - Random bytes split at random points, including inside multi-byte
//!   characters and between `\r` and `\n`
//!
//! # Invariants
//!
//! - Splitting a stream differently yields the same events
//! - NEVER panic on malformed input

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parlor_backend::sse::SseParser;

#[derive(Debug, Arbitrary)]
struct Input {
    stream: Vec<u8>,
    splits: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let whole = SseParser::new().feed(&input.stream);

    let mut parser = SseParser::new();
    let mut chunked = Vec::new();
    let mut rest = input.stream.as_slice();
    for split in input.splits {
        let at = usize::from(split).min(rest.len());
        let (head, tail) = rest.split_at(at);
        chunked.extend(parser.feed(head));
        rest = tail;
    }
    chunked.extend(parser.feed(rest));

    assert_eq!(whole, chunked);
});
