use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

use leadsift::classify::classify;
use leadsift::model::message::ParsedEmailMessage;

fn bench_classify_message(c: &mut Criterion) {
    let msg = ParsedEmailMessage::new("101", "Jane Doe <jane.doe@clientco.com>")
        .with_subject("Website Inquiry - Need Quote")
        .with_text(
            "We are interested in a quote for solar installation.\n\
             Company: Sahara Solar Ltd\n\
             Call me at +213 555 123 456.",
        );

    c.bench_function("classify_message", |b| b.iter(|| classify(&msg)));
}

fn bench_scan_mbox(c: &mut Criterion) {
    let fixture_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("leads.mbox");

    c.bench_function("scan_leads_mbox", |b| {
        b.iter(|| leadsift::inbox::local::scan_path(&fixture_path, None).unwrap())
    });
}

criterion_group!(benches, bench_classify_message, bench_scan_mbox);
criterion_main!(benches);
