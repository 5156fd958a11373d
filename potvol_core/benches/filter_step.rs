use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use potvol_core::{FilterCfg, FilterEngine, OutputRange};

// Knob trace: slow sweeps with a few settled plateaus and ADC-like jitter.
fn synth_trace(n: usize, jitter: f64, seed: u32) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut next_unit = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        f64::from(x) / (f64::from(u32::MAX) + 1.0)
    };
    (0..n)
        .map(|i| {
            let t = i as f64 / 2000.0;
            let base = (0.5 + 0.45 * t.sin()).clamp(0.0, 1.0);
            let plateau = (base * 10.0).round() / 10.0;
            let level = if (i / 1000) % 2 == 0 { base } else { plateau };
            level + (next_unit() * 2.0 - 1.0) * jitter
        })
        .collect()
}

pub fn bench_filter_step(c: &mut Criterion) {
    let mut g = c.benchmark_group("filter_step");
    //   BENCH_SAMPLE_SIZE=10 BENCH_MEAS_MS=50 cargo bench -p potvol_core --bench filter_step
    if let Ok(ss) = std::env::var("BENCH_SAMPLE_SIZE")
        && let Ok(n) = ss.parse::<usize>()
    {
        g.sample_size(n.max(10));
    } else {
        g.sample_size(50);
    }
    if let Ok(ms) = std::env::var("BENCH_MEAS_MS")
        && let Ok(ms_u64) = ms.parse::<u64>()
    {
        g.measurement_time(std::time::Duration::from_millis(ms_u64));
    }

    let trace = synth_trace(50_000, 0.004, 0x00C0_FFEE);

    for &band in &[0.005f64, 0.01, 0.02] {
        g.bench_function(format!("noise_band_{band}"), |b| {
            b.iter_batched(
                || {
                    let cfg = FilterCfg {
                        noise_band: band,
                        ..FilterCfg::default()
                    };
                    FilterEngine::new(cfg, OutputRange::default(), 0.5, 0.5)
                },
                |mut engine| {
                    let mut commits = 0u32;
                    for &v in &trace {
                        if engine.step(black_box(v)).commit.is_some() {
                            commits += 1;
                        }
                    }
                    black_box(commits);
                },
                BatchSize::SmallInput,
            );
        });
    }
    g.finish();
}

criterion_group!(filter, bench_filter_step);
criterion_main!(filter);
