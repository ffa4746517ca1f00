//! Framing and capability-filter micro-benchmark.
//!
//! Measures header parsing, frame reading through a small buffer, and the
//! in-place capability rewrite on a realistic `initialize` response.
//!
//! # Usage
//! ```bash
//! cargo bench --bench frame_parse
//! ```

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use tokio::io::BufReader;

use lspfilter_core::FilterPolicy;
use lspfilter_core::capability::{capabilities_mut, filter_capabilities};
use lspfilter_core::emit::encode_frame;
use lspfilter_core::framing::{FrameReader, parse_header_block};

/// An `initialize` response shaped like clangd's (~1.5KB).
fn initialize_response() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 0,
        "result": {
            "capabilities": {
                "textDocumentSync": { "openClose": true, "change": 2, "save": true },
                "completionProvider": {
                    "resolveProvider": false,
                    "triggerCharacters": [".", "<", ">", ":", "\"", "/", "*"]
                },
                "hoverProvider": true,
                "signatureHelpProvider": { "triggerCharacters": ["(", ",", ")", "{", "<"] },
                "definitionProvider": true,
                "declarationProvider": true,
                "implementationProvider": true,
                "typeDefinitionProvider": true,
                "referencesProvider": true,
                "documentHighlightProvider": true,
                "documentSymbolProvider": true,
                "workspaceSymbolProvider": true,
                "codeActionProvider": { "codeActionKinds": ["quickfix", "refactor", "info"] },
                "documentFormattingProvider": true,
                "documentRangeFormattingProvider": true,
                "documentOnTypeFormattingProvider": {
                    "firstTriggerCharacter": "\n",
                    "moreTriggerCharacter": []
                },
                "renameProvider": { "prepareProvider": true },
                "documentLinkProvider": { "resolveProvider": false },
                "foldingRangeProvider": true,
                "selectionRangeProvider": true,
                "callHierarchyProvider": true,
                "semanticTokensProvider": {
                    "full": { "delta": true },
                    "range": false,
                    "legend": { "tokenTypes": ["variable", "function"], "tokenModifiers": [] }
                },
                "inlayHintProvider": true,
                "executeCommandProvider": { "commands": ["clangd.applyFix", "clangd.applyTweak"] }
            },
            "serverInfo": { "name": "clangd", "version": "17.0.6" }
        }
    })
}

fn bench_header_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("framing/header");

    let minimal = b"Content-Length: 1234\r\n".to_vec();
    let with_type =
        b"Content-Type: application/vscode-jsonrpc; charset=utf-8\r\nContent-Length: 1234\r\n"
            .to_vec();

    group.bench_with_input(BenchmarkId::new("parse", "minimal"), &minimal, |b, data| {
        b.iter(|| parse_header_block(data))
    });
    group.bench_with_input(BenchmarkId::new("parse", "with_type"), &with_type, |b, data| {
        b.iter(|| parse_header_block(data))
    });

    group.finish();
}

fn bench_frame_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("framing/reader");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("failed to build runtime");

    let payload = initialize_response().to_string().into_bytes();
    let mut stream = Vec::new();
    for _ in 0..10 {
        stream.extend_from_slice(&encode_frame(&payload));
    }

    for &capacity in &[64usize, 8 * 1024] {
        group.bench_with_input(BenchmarkId::new("ten_frames", capacity), &stream, |b, data| {
            b.iter(|| {
                runtime.block_on(async {
                    let buffered = BufReader::with_capacity(capacity, &data[..]);
                    let mut reader = FrameReader::new(buffered);
                    let mut count = 0;
                    while let Ok(Some(_)) = reader.next_frame().await {
                        count += 1;
                    }
                    count
                })
            })
        });
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("capability/filter");
    let message = initialize_response();

    let policies = [
        ("enable_only", FilterPolicy::enable_only(["completion", "codeAction"])),
        ("disable_only", FilterPolicy::disable_only(["completion", "codeAction"])),
        ("unfiltered", FilterPolicy::unfiltered()),
    ];

    for (label, policy) in &policies {
        group.bench_with_input(BenchmarkId::new("rewrite", label), policy, |b, policy| {
            b.iter(|| {
                let mut message = message.clone();
                if let Some(caps) = capabilities_mut(&mut message) {
                    filter_capabilities(caps, policy);
                }
                serde_json::to_vec(&message).expect("serializable")
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_header_block, bench_frame_reader, bench_filter);
criterion_main!(benches);
