#![no_main]

//! Fuzz target for `Content-Length` framing and capability filtering.
//!
//! Attack surface: malformed header blocks, absurd or conflicting lengths,
//! truncated payloads, and arbitrary JSON in the `initialize` response.
//!
//! # Goal
//! Verify that:
//! - Neither the header parser nor the frame reader panics
//! - No declared length above the frame cap is accepted
//! - Filtering is idempotent on whatever JSON the payload holds

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tokio::io::BufReader;

use lspfilter_core::capability::{capabilities_mut, filter_capabilities};
use lspfilter_core::framing::{FrameReader, MAX_FRAME_BYTES, parse_header_block};
use lspfilter_core::FilterPolicy;

#[derive(Arbitrary, Debug)]
struct FuzzFramingInput {
    /// Raw server stdout.
    stream: Vec<u8>,
    /// Read buffer size for the frame reader (clamped to 1..=256).
    capacity: u8,
    /// Provider names for the filter policy.
    providers: Vec<String>,
    /// Which policy mode to build.
    mode: FuzzMode,
}

#[derive(Arbitrary, Debug)]
enum FuzzMode {
    Enable,
    Disable,
    Unfiltered,
}

fuzz_target!(|input: FuzzFramingInput| {
    fuzz_framing(input);
});

fn fuzz_framing(input: FuzzFramingInput) {
    if let Ok(length) = parse_header_block(&input.stream) {
        assert!(length <= MAX_FRAME_BYTES);
    }

    let policy = match input.mode {
        FuzzMode::Enable => FilterPolicy::enable_only(&input.providers),
        FuzzMode::Disable => FilterPolicy::disable_only(&input.providers),
        FuzzMode::Unfiltered => FilterPolicy::unfiltered(),
    };

    let capacity = usize::from(input.capacity).max(1);
    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(_) => return,
    };

    runtime.block_on(async {
        let mut reader = FrameReader::new(BufReader::with_capacity(capacity, &input.stream[..]));
        while let Ok(Some(frame)) = reader.next_frame().await {
            let Ok(mut message) = serde_json::from_slice::<serde_json::Value>(frame.payload())
            else {
                continue;
            };
            let Some(caps) = capabilities_mut(&mut message) else {
                continue;
            };

            let first = filter_capabilities(caps, &policy);
            let once = caps.clone();
            let second = filter_capabilities(caps, &policy);
            assert_eq!(once, *caps);
            assert_eq!(first, second);
        }
    });
}
