//! Benchmarks for scan throughput
//!
//! Generates projects of increasing size and measures a full scan and
//! normalization alone.

use std::fs;
use std::path::{Path, PathBuf};

use apiscope::{normalize, CallSource, Confidence, RawCall, ScanConfig, Scanner};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

/// Write a project with `files` client modules and one route handler per ten of them.
fn create_project(files: usize) -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    let root = dir.path();
    fs::create_dir_all(root.join("src/services")).expect("src dir");

    for i in 0..files {
        let source = format!(
            "import axios from 'axios';\n\
             import {{ helpers }} from './helpers_{i}';\n\n\
             export async function load{i}(id: string) {{\n\
             \x20 const res = await fetch(`/api/items/${{id}}`);\n\
             \x20 return res.json();\n\
             }}\n\n\
             export const save{i} = async (body: unknown) => {{\n\
             \x20 return axios.post('/api/items/{n}', body);\n\
             }};\n\n\
             export class Client{i} {{\n\
             \x20 remove(id: string) {{\n\
             \x20   return axios.delete(`/api/items/${{id}}`, {{ headers: {{}} }});\n\
             \x20 }}\n\
             }}\n",
            i = i,
            n = i % 10
        );
        fs::write(root.join(format!("src/services/client_{}.ts", i)), source)
            .expect("client file");
    }

    for n in 0..(files / 10).max(1) {
        let dir = root.join(format!("api/items/{}", n));
        fs::create_dir_all(&dir).expect("route dir");
        fs::write(
            dir.join("route.ts"),
            "export async function GET() {\n  return Response.json([]);\n}\n\nexport const POST = async () => new Response(null);\n",
        )
        .expect("route file");
    }

    dir
}

fn synthetic_calls(count: usize) -> Vec<RawCall> {
    (0..count)
        .map(|i| {
            RawCall::new(
                if i % 3 == 0 { "POST" } else { "GET" },
                format!("/api/items/{}", i % 50),
                &PathBuf::from(format!("/repo/src/file_{}.ts", i % 20)),
                i + 1,
                1,
                CallSource::Fetch,
                if i % 2 == 0 {
                    Confidence::High
                } else {
                    Confidence::Medium
                },
            )
        })
        .collect()
}

/// Benchmark a full scan including route discovery
fn bench_full_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_scan");
    group.sample_size(10);

    for size in [10, 50, 200].iter() {
        let project = create_project(*size);
        let root: &Path = project.path();

        group.bench_with_input(BenchmarkId::new("files", size), size, |b, _| {
            b.iter(|| {
                let mut config = ScanConfig::new(root);
                config.api_routes_dir = Some(PathBuf::from("api"));
                black_box(Scanner::new(config).scan().expect("scan"))
            });
        });
    }

    group.finish();
}

/// Benchmark grouping raw calls into endpoints
fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for size in [1_000, 10_000, 50_000].iter() {
        let calls = synthetic_calls(*size);

        group.bench_with_input(BenchmarkId::new("calls", size), &calls, |b, calls| {
            b.iter(|| black_box(normalize(calls)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_scan, bench_normalize);
criterion_main!(benches);
