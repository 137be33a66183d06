use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use csv2psql::config::ConversionConfig;
use csv2psql::convert::{Converter, PathSource};
use csv2psql::sniff::SniffLimit;
use tempfile::TempDir;

fn generate_parcels(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("parcels.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "Parcel ID,Block,Assessed Value,Owner Name,Sold On").expect("header");
    for i in 0..rows {
        let owner = match i % 3 {
            0 => "Ada Lovelace",
            1 => "Grace Hopper",
            _ => "Alan Turing",
        };
        let day = (i % 28) + 1;
        writeln!(
            file,
            "{i},{block},{value}.25,{owner},202401{day:02}",
            block = i % 97,
            value = 50_000 + i,
        )
        .expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_convert(c: &mut Criterion) {
    let (temp_dir, csv_path) = generate_parcels(50_000);
    let source = PathSource::new(csv_path);

    let mut group = c.benchmark_group("convert");

    group.bench_function("sniff_all_rows", |b| {
        let mut config = ConversionConfig::new("parcels");
        config.sniff_limit = SniffLimit::Unbounded;
        let converter = Converter::new(config);
        b.iter(|| converter.sniff(&source).expect("sniff"));
    });

    group.bench_function("merge_script", |b| {
        b.iter_batched(
            || {
                let mut config = ConversionConfig::new("parcels");
                config.merge = true;
                config.primary_key = vec!["parcel_id".to_string()];
                Converter::new(config)
            },
            |converter| {
                converter
                    .run(&source, &mut io::sink())
                    .expect("convert parcels");
            },
            BatchSize::SmallInput,
        );
    });

    drop(temp_dir);
    group.finish();
}

criterion_group!(benches, bench_convert);
criterion_main!(benches);
