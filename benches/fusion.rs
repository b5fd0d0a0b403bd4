//! Benchmarks for fusion throughput

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use satfuse::{FusionConfig, FusionEngine, FusionMethod, FusionRequest, SourceReading, SourceStatus};
use serde_json::json;

fn generate_requests(count: usize) -> Vec<FusionRequest> {
    (0..count)
        .map(|i| {
            let jitter = (i as f64 % 10.0) * 0.01;
            FusionRequest::new()
                .with_source(
                    SourceReading::new("sentinel2", SourceStatus::Success)
                        .with_index("ndvi", 0.60 + jitter)
                        .with_index("evi", 0.48 + jitter),
                )
                .with_source(
                    SourceReading::new("landsat8", SourceStatus::Success)
                        .with_index("ndvi", 0.58 + jitter)
                        .with_temperature(27.0 + jitter * 10.0),
                )
                .with_source(SourceReading::new("modis", SourceStatus::Fallback).with_temperature(29.5))
                .with_source(SourceReading::new("sentinel1", SourceStatus::Success).with_soil_moisture(40.0 + jitter))
                .with_source(SourceReading::new("risat", SourceStatus::Simulated).with_soil_moisture(43.0))
        })
        .collect()
}

fn bench_fuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuse");

    let requests = generate_requests(1000);
    group.throughput(Throughput::Elements(requests.len() as u64));

    for method in [
        FusionMethod::WeightedAverage,
        FusionMethod::MaxConfidence,
        FusionMethod::Consensus,
    ] {
        let engine = match FusionEngine::new(FusionConfig::default().with_method(method)) {
            Ok(engine) => engine,
            Err(e) => panic!("default config rejected: {}", e),
        };
        group.bench_function(format!("{}_1000_requests", method.as_str()), |b| {
            b.iter(|| {
                for request in &requests {
                    black_box(engine.fuse(request));
                }
            })
        });
    }

    group.finish();
}

fn bench_fuse_json(c: &mut Criterion) {
    let mut group = c.benchmark_group("fuse_json");

    let payload = json!({
        "location": {"lat": 28.6139, "lon": 77.2090},
        "satellites": {
            "sentinel2": {"status": "success", "indices": {"ndvi": 0.65, "evi": 0.52}},
            "landsat8": {"status": "success", "temperature": 28.5, "indices": {"ndvi": 0.63}},
            "modis": {"status": "fallback", "temperature": {"day": 31.0, "night": 18.0}},
            "sentinel1": {"status": "success", "soil_moisture_estimate": 45.0},
            "irs": {"status": "error"}
        }
    })
    .to_string();
    let engine = FusionEngine::default();

    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("parse_and_fuse", |b| {
        b.iter(|| black_box(engine.fuse_json(black_box(&payload))))
    });

    group.finish();
}

criterion_group!(benches, bench_fuse, bench_fuse_json);
criterion_main!(benches);
