//! Benchmarks for the synchronous stages at varying document sizes.
//!
//! Run with: `cargo bench --bench pipeline_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use studysplit::classify::heuristic_sizes;
use studysplit::{assemble_document, FontProfile, JunkFilter, PageWords, SectionAssembler, SectionConfig, Word};

/// Generate `pages` pages of a textbook-like layout: a 20pt chapter title on
/// every fifth page, 14pt section titles, 11pt body, a running head and a
/// page number.
fn generate_pages(pages: usize) -> Vec<PageWords> {
    let body = ["Lorem", "ipsum", "dolor", "sit", "amet,", "consectetur", "adipiscing", "elit."];

    (0..pages)
        .map(|index| {
            let mut words = vec![Word::new("Running head", 9.0, 30.0)];
            let mut top = 90.0;

            if index % 5 == 0 {
                words.push(Word::new(format!("Chapter {}", index / 5 + 1), 20.0, top));
                top += 40.0;
            }
            for row in 0..30 {
                if row % 10 == 0 {
                    words.push(Word::new(format!("{index}.{row} Section"), 14.0, top));
                    top += 22.0;
                }
                for word in body {
                    words.push(Word::new(word, 11.0, top));
                }
                top += 18.0;
            }
            words.push(Word::new((index + 1).to_string(), 9.0, 970.0));

            PageWords {
                index,
                width: 600.0,
                height: 1000.0,
                words,
            }
        })
        .collect()
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages");

    for &pages in &[10_usize, 100, 500] {
        let doc = generate_pages(pages);
        let words: usize = doc.iter().map(|p| p.words.len()).sum();
        group.throughput(Throughput::Elements(words as u64));

        group.bench_with_input(BenchmarkId::new("assemble_lines", pages), &doc, |b, doc| {
            b.iter(|| black_box(assemble_document(black_box(doc), 5.0)));
        });

        let lines = assemble_document(&doc, 5.0);
        group.bench_with_input(BenchmarkId::new("profile", pages), &lines, |b, lines| {
            b.iter(|| black_box(FontProfile::from_lines(black_box(lines), 5, 100)));
        });

        let profile = FontProfile::from_lines(&lines, 5, 100);
        let headers = heuristic_sizes(&profile, profile.body_size());
        let junk = JunkFilter::default();
        let config = SectionConfig::default();
        group.bench_with_input(BenchmarkId::new("sections", pages), &lines, |b, lines| {
            let assembler = SectionAssembler::new(&headers, &junk, &config);
            b.iter(|| black_box(assembler.assemble(black_box(lines))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_stages);
criterion_main!(benches);
