//! Benchmarks for expression parsing and fixture generation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fixgen_core::expression::{ExpressionParser, Lexer, LexerRegistry};
use fixgen_core::{generate, load_str};

const EXPRESSIONS: &[(&str, &str)] = &[
    ("literal", "plain text without any pattern"),
    ("function", "<numberBetween(1, 100)>"),
    ("mixed", "user<current()>@<{domain}> is $username"),
    ("optional", "80%? <randomElement(a, b, c)> : @user1"),
    ("dynamic_array", "5x @user*"),
];

fn generate_fixture_file(users: usize, posts: usize) -> String {
    format!(
        r#"{{
            "options": {{ "seed": 1 }},
            "parameters": {{ "domain": "example.org" }},
            "classes": {{
                "User": {{ "constructor": [{{ "name": "username" }}], "properties": ["email", "age"] }},
                "Post": {{ "properties": ["author", "readers", "title"] }}
            }},
            "fixtures": {{
                "User": {{
                    "user{{1..{users}}}": {{
                        "__construct": ["user<current()>"],
                        "email": "$username@<{{domain}}>",
                        "age": "<numberBetween(18, 99)>"
                    }}
                }},
                "Post": {{
                    "post{{1..{posts}}}": {{
                        "author": "@user*",
                        "readers": "3x @user*",
                        "title": "Post <current()> by @self->author"
                    }}
                }}
            }}
        }}"#
    )
}

/// Many flat fixtures, so the cost is dominated by snapshot writes
fn generate_flat_file(items: usize) -> String {
    format!(
        r#"{{
            "options": {{ "seed": 1 }},
            "fixtures": {{
                "Item": {{
                    "item{{1..{items}}}": {{
                        "name": "item<current()>",
                        "sku": "SKU-<current()>",
                        "price": 10,
                        "active": true,
                        "label": "plain label"
                    }}
                }}
            }}
        }}"#
    )
}

fn bench_lexer(c: &mut Criterion) {
    let lexer = LexerRegistry::with_default_lexers();
    let mut group = c.benchmark_group("lexer");

    for (name, raw) in EXPRESSIONS {
        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_function(*name, |b| b.iter(|| black_box(lexer.lex(black_box(raw)))));
    }

    group.finish();
}

fn bench_parser(c: &mut Criterion) {
    let parser = ExpressionParser::default();
    let mut group = c.benchmark_group("parser");

    for (name, raw) in EXPRESSIONS {
        group.bench_function(*name, |b| b.iter(|| black_box(parser.parse_value(black_box(raw)))));
    }

    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");

    for size in [10, 100, 500] {
        let json = generate_fixture_file(size, size);
        let file = match load_str(&json) {
            Ok(file) => file,
            Err(err) => panic!("benchmark file does not load: {}", err),
        };

        group.throughput(Throughput::Elements((size * 2) as u64));
        group.bench_with_input(BenchmarkId::new("fixtures", size * 2), &file, |b, file| {
            b.iter(|| black_box(generate(file.clone())))
        });
    }

    group.finish();
}

fn bench_large_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation_large");
    group.sample_size(10);

    for size in [2_000, 5_000] {
        let file = match load_str(&generate_flat_file(size)) {
            Ok(file) => file,
            Err(err) => panic!("benchmark file does not load: {}", err),
        };

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("fixtures", size), &file, |b, file| {
            b.iter(|| black_box(generate(file.clone())))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lexer,
    bench_parser,
    bench_generation,
    bench_large_generation
);
criterion_main!(benches);
