use criterion::{black_box, criterion_group, criterion_main, Criterion};
use weibo_group_sender::commands::parse_selection;
use weibo_group_sender::cookies::{parse_cookie_string, to_cookie_string};
use weibo_group_sender::weibo::SendRequest;

const BROWSER_COOKIE: &str = "SCF=AqP3x9kLmN0; SUB=_2A25KxYzDeRhGeFN; \
    SUBP=0033WrSXqPxfM725Ws9jqgMF55529P9D9W5; ALF=1767225600; \
    _s_tentry=weibo.com; Apache=8451263097341.123.1731480000000; \
    SINAGLOBAL=8451263097341.123.1731480000000; \
    ULV=1731480000001:1:1:1:8451263097341.123.1731480000000:";

fn cookie_benchmark(c: &mut Criterion) {
    c.bench_function("parse_browser_cookie_string", |b| {
        b.iter(|| {
            let cookies = parse_cookie_string(black_box(BROWSER_COOKIE));
            black_box(cookies.len());
        });
    });

    let cookies = parse_cookie_string(BROWSER_COOKIE);
    c.bench_function("serialize_cookie_header", |b| {
        b.iter(|| {
            let header = to_cookie_string(black_box(&cookies));
            black_box(header.len());
        });
    });
}

fn selection_benchmark(c: &mut Criterion) {
    let input = (1..=200)
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",");

    c.bench_function("parse_long_selection", |b| {
        b.iter(|| {
            let selection = parse_selection(black_box(&input), 200).expect("selection");
            black_box(selection.indices.len());
        });
    });
}

fn send_form_benchmark(c: &mut Criterion) {
    let request = SendRequest::plain(4512345678901234, "大家好，周末活动见！".repeat(8), "209678993");

    c.bench_function("send_form_fields", |b| {
        b.iter(|| {
            let fields = black_box(&request).form_fields();
            black_box(fields.len());
        });
    });
}

criterion_group!(
    benches,
    cookie_benchmark,
    selection_benchmark,
    send_form_benchmark
);
criterion_main!(benches);
