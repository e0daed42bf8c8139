use criterion::{black_box, criterion_group, criterion_main, Criterion};
use syslog_ingest::rfc3164::Rfc3164Parser;
use syslog_ingest::{FixedYear, Parser};

fn parse_timestamp(c: &mut Criterion) {
    let input = r#"2023-04-07T12:52:00.654321Z"#;
    let mut group = c.benchmark_group("rfc3339");

    group.bench_function("own", |b| {
        b.iter(|| {
            let _ = syslog_ingest::timestamp::parse_rfc3339(black_box(input.as_bytes()));
        })
    });

    group.bench_function("chrono", |b| {
        b.iter(|| {
            let _ = chrono::DateTime::parse_from_rfc3339(black_box(input));
        })
    });

    group.finish();
}

// The Stamp grammar is only reachable through a message, so compare a
// minimal message with each timestamp style.
fn parse_stamp(c: &mut Criterion) {
    let parser = Rfc3164Parser::new().rfc3339().with_year(FixedYear(2023));
    let mut group = c.benchmark_group("rfc3164 timestamp");

    group.bench_function("stamp", |b| {
        b.iter(|| {
            let _ = parser.parse(black_box(b"<13>Apr  7 12:52:00 host x"));
        })
    });

    group.bench_function("rfc3339", |b| {
        b.iter(|| {
            let _ = parser.parse(black_box(b"<13>2023-04-07T12:52:00.654321Z host x"));
        })
    });

    group.finish();
}

criterion_group!(benches, parse_timestamp, parse_stamp);
criterion_main!(benches);
