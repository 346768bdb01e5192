//! Document Parsing Benchmarks
//!
//! Performance benchmarks for EPUB and plain text parsing, plus chapter
//! rendering.
//!
//! Run with: `cargo bench --bench document_parsing`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::path::Path;
use std::time::Duration;

use folio_server::formats::{DocumentParser, ParserOptions};

/// Minimal valid EPUB for benchmarking (ZIP with required structure)
fn create_epub(chapters: usize) -> Vec<u8> {
    use std::io::{Cursor, Write};
    use zip::{write::SimpleFileOptions, ZipWriter};

    let mut manifest = String::new();
    let mut spine = String::new();
    for i in 1..=chapters {
        manifest.push_str(&format!(
            r#"<item id="c{i}" href="Text/c{i}.xhtml" media-type="application/xhtml+xml"/>"#
        ));
        spine.push_str(&format!(r#"<itemref idref="c{i}"/>"#));
    }
    let opf = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="3.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">benchmark-epub-001</dc:identifier>
    <dc:title>Benchmark EPUB</dc:title>
    <dc:creator>Bench Author</dc:creator>
  </metadata>
  <manifest>
    {manifest}
    <item id="cover" href="Images/cover.jpg" media-type="image/jpeg" properties="cover-image"/>
  </manifest>
  <spine>{spine}</spine>
</package>"#
    );

    let mut buffer = Vec::new();
    {
        let cursor = Cursor::new(&mut buffer);
        let mut zip = ZipWriter::new(cursor);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

        // mimetype (must be first, uncompressed)
        zip.start_file("mimetype", options).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        zip.start_file("META-INF/container.xml", options).unwrap();
        zip.write_all(br#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#).unwrap();

        zip.start_file("OEBPS/content.opf", options).unwrap();
        zip.write_all(opf.as_bytes()).unwrap();

        for i in 1..=chapters {
            zip.start_file(format!("OEBPS/Text/c{i}.xhtml"), options).unwrap();
            zip.write_all(format!(r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>Chapter {i}</title><link rel="stylesheet" href="../Styles/book.css"/></head>
<body>
<h1>Chapter {i}</h1>
<img src="../Images/cover.jpg" alt=""/>
<p>This is a benchmark chapter for testing EPUB parsing performance.</p>
<a href="c{i}.xhtml#top">top</a>
</body>
</html>"#).as_bytes()).unwrap();
        }

        zip.start_file("OEBPS/Images/cover.jpg", options).unwrap();
        zip.write_all(&[0xff, 0xd8, 0xff, 0xe0]).unwrap();

        zip.finish().unwrap();
    }
    buffer
}

/// Plain text with `chapters` headings, roughly 2KB per chapter
fn create_text(chapters: usize) -> String {
    let mut text = String::new();
    for i in 1..=chapters {
        text.push_str(&format!("Chapter {i}\n"));
        for _ in 0..20 {
            text.push_str("这是一段用于测试的正文内容。Some filler text for the paragraph.\n");
        }
    }
    text
}

fn write_raw(dir: &Path, name: &str, data: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Benchmark EPUB parsing (expansion + descriptor parsing)
fn bench_epub_parsing(c: &mut Criterion) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let options = ParserOptions::default();
    let parser = DocumentParser::for_name("epub", &options).unwrap();

    let mut group = c.benchmark_group("epub_parsing");
    group.measurement_time(Duration::from_secs(10));

    for chapters in [1usize, 50] {
        let data = create_epub(chapters);
        let raw = write_raw(temp_dir.path(), &format!("raw-{chapters}.epub"), &data);
        let dir = temp_dir.path().join(format!("book-{chapters}"));

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("chapters", chapters), &raw, |b, raw| {
            b.iter(|| {
                let document = parser.parse(black_box(raw), &dir).expect("Failed to parse EPUB");
                black_box(document)
            })
        });
    }

    group.finish();
}

/// Benchmark plain text parsing: heading segmentation and size fallback
fn bench_txt_parsing(c: &mut Criterion) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let options = ParserOptions::default();
    let parser = DocumentParser::for_name("txt", &options).unwrap();

    let headed = create_text(200);
    let flat = headed.replace("Chapter ", "Part ");
    let (gbk, _, _) = encoding_rs::GBK.encode(&headed);

    let inputs = [
        ("headings_utf8", write_raw(temp_dir.path(), "headed.txt", headed.as_bytes())),
        ("fixed_size_utf8", write_raw(temp_dir.path(), "flat.txt", flat.as_bytes())),
        ("headings_gbk", write_raw(temp_dir.path(), "gbk.txt", &gbk)),
    ];

    let mut group = c.benchmark_group("txt_parsing");
    group.throughput(Throughput::Bytes(headed.len() as u64));

    for (name, raw) in &inputs {
        group.bench_with_input(BenchmarkId::from_parameter(name), raw, |b, raw| {
            b.iter(|| {
                let document = parser
                    .parse(black_box(raw), temp_dir.path())
                    .expect("Failed to parse text");
                black_box(document)
            })
        });
    }

    group.finish();
}

/// Benchmark chapter rendering (resource rewriting, paragraph markup)
fn bench_chapter_rendering(c: &mut Criterion) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let options = ParserOptions::default();
    let fingerprint = "0123456789abcdef0123456789abcdef";

    let epub = DocumentParser::for_name("epub", &options).unwrap();
    let epub_raw = write_raw(temp_dir.path(), "raw.epub", &create_epub(5));
    let epub_doc = epub
        .parse(&epub_raw, &temp_dir.path().join(fingerprint))
        .unwrap();

    let txt = DocumentParser::for_name("txt", &options).unwrap();
    let txt_raw = write_raw(temp_dir.path(), "raw.txt", create_text(5).as_bytes());
    let txt_doc = txt.parse(&txt_raw, temp_dir.path()).unwrap();

    let mut group = c.benchmark_group("chapter_rendering");

    group.bench_function("epub_chapter", |b| {
        b.iter(|| black_box(epub.read_chapter(&epub_doc, black_box(2), fingerprint).unwrap()))
    });

    group.bench_function("txt_chapter", |b| {
        b.iter(|| black_box(txt.read_chapter(&txt_doc, black_box(2), fingerprint).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_epub_parsing,
    bench_txt_parsing,
    bench_chapter_rendering
);
criterion_main!(benches);
