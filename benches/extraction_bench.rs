// benches/extraction_bench.rs
//! Benchmarks for notebook extraction and text normalization.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use unearthed_sync::{extract, normalize, render_csv, CatalogItem, ExternalId};

/// A notebook page with `count` annotations in the three parallel lists.
fn notebook_page(count: usize) -> String {
    let mut html = String::from("<html><body><div id=\"kp-notebook-annotations\">");
    for i in 0..count {
        html.push_str(&format!(
            r#"<div class="a-row">
                 <span id="annotationHighlightHeader">Yellow highlight | Location:&nbsp;{}</span>
                 <span id="highlight">“Quote number {}” – with some … typography</span>
                 <span id="note">{}</span>
               </div>"#,
            i * 10,
            i,
            if i % 3 == 0 { "a note" } else { "" }
        ));
    }
    html.push_str(
        r#"</div><input class="kp-notebook-annotations-next-page-start" value="tok">
           <input class="kp-notebook-content-limit-state" value="{}"></body></html>"#,
    );
    html
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    for count in [10, 100, 500] {
        let page = notebook_page(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &page, |b, page| {
            b.iter(|| extract(black_box(page)))
        });
    }
    group.finish();
}

fn bench_normalize(c: &mut Criterion) {
    let plain = "The quick brown fox jumps over the lazy dog. ".repeat(20);
    let typographic = "“Fear”\u{00A0}is the mind\u{2013}killer\u{2026}\u{200B} ".repeat(20);

    c.bench_function("normalize_plain", |b| b.iter(|| normalize(black_box(&plain))));
    c.bench_function("normalize_typographic", |b| {
        b.iter(|| normalize(black_box(&typographic)))
    });
}

fn bench_csv(c: &mut Criterion) {
    let page = extract(&notebook_page(200));
    let items: Vec<CatalogItem> = (0..20)
        .map(|n| {
            let mut item = CatalogItem::from_listing(
                ExternalId::parse(&format!("B{:09}", n)).unwrap(),
                Some("Dune: Part One"),
                Some("Herbert, Frank"),
                None,
            );
            item.annotations = page.annotations.clone();
            item
        })
        .collect();

    c.bench_function("render_csv_4000_rows", |b| b.iter(|| render_csv(black_box(&items))));
}

criterion_group!(benches, bench_extract, bench_normalize, bench_csv);
criterion_main!(benches);
