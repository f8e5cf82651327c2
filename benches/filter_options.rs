use criterion::{Criterion, criterion_group, criterion_main};
use lens_compare::{
    filter::{FilterCriteria, apply_filters},
    options::derive_filter_options,
    parser::{ParsePolicy, parse},
};

fn generate_catalogue(rows: usize) -> String {
    let mut text = String::from("name,maker,mount,focal,aperture\n");
    for i in 0..rows {
        let (maker, mount) = match i % 3 {
            0 => ("Canon", "RF"),
            1 => ("Nikon", "Z"),
            _ => ("Sony", "E"),
        };
        let focal = [8, 14, 24, 35, 50, 85, 105, 200][i % 8];
        text.push_str(&format!("Lens {i},{maker},{mount},{focal}mm,F{}\n", 1.4 + (i % 4) as f64));
    }
    text
}

fn bench_pipeline(c: &mut Criterion) {
    let text = generate_catalogue(5_000);
    c.bench_function("parse_5k_rows", |b| {
        b.iter(|| parse(&text, ParsePolicy::Strict))
    });

    let records = parse(&text, ParsePolicy::Lenient).set.records;
    let fields = vec!["mount".to_string(), "focal".to_string()];
    c.bench_function("derive_filter_options_5k_rows", |b| {
        b.iter(|| derive_filter_options(&records, &fields, Some("focal")))
    });

    let criteria = FilterCriteria::new().with("mount", "Z").with("focal", "50mm");
    c.bench_function("apply_filters_5k_rows", |b| {
        b.iter(|| apply_filters(&records, &criteria))
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
