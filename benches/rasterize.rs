//! Rasterization Benchmarks
//!
//! Run with: `cargo bench --bench rasterize`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use std::time::Duration;

use book_viewer::decode::{ImageFormat, RenderOptions};
use book_viewer::mupdf::SafeDocument;
use book_viewer::raster::render_placeholder;
use book_viewer::resolver::slug::{filename_from_slug, slug_from_filename};

/// Minimal valid PDF (one empty US Letter page)
fn create_minimal_pdf() -> Vec<u8> {
    let pdf_content = b"%PDF-1.4
1 0 obj
<< /Type /Catalog /Pages 2 0 R >>
endobj
2 0 obj
<< /Type /Pages /Kids [3 0 R] /Count 1 >>
endobj
3 0 obj
<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << >> >>
endobj
4 0 obj
<< /Length 0 >>
stream
endstream
endobj
xref
0 5
0000000000 65535 f
0000000009 00000 n
0000000058 00000 n
0000000115 00000 n
0000000226 00000 n
trailer
<< /Size 5 /Root 1 0 R >>
startxref
276
%%EOF";
    pdf_content.to_vec()
}

fn bench_slug_derivation(c: &mut Criterion) {
    c.bench_function("slug_roundtrip", |b| {
        b.iter(|| {
            let filename = filename_from_slug(black_box("summer-in-lisbon-2019"));
            slug_from_filename(&filename)
        })
    });
}

fn bench_page_render(c: &mut Criterion) {
    let doc = SafeDocument::from_bytes(Arc::new(create_minimal_pdf()))
        .expect("minimal PDF should open");

    let mut group = c.benchmark_group("page_render");
    group.measurement_time(Duration::from_secs(10));

    for scale in [1.0f32, 2.0] {
        let options = RenderOptions {
            scale,
            format: ImageFormat::Png,
        };
        group.bench_with_input(BenchmarkId::new("mupdf", scale), &options, |b, options| {
            b.iter(|| doc.render(0, black_box(options)))
        });
        group.bench_with_input(BenchmarkId::new("placeholder", scale), &options, |b, options| {
            b.iter(|| render_placeholder(3, black_box(options)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_slug_derivation, bench_page_render);
criterion_main!(benches);
