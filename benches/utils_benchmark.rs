use std::f64::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vocal_pitch::{
    detector::{mcleod::McLeodDetector, pyin::PYinDetector, yin::YINDetector},
    detector::{ContinuityPrior, PitchDetector},
    utils::peak::{detect_peaks, detect_valleys},
    Config, GateMode, PitchSession, SessionSettings,
};

pub fn utils_benchmark(c: &mut Criterion) {
    let v = (0..1024)
        .map(|v| ((v as f64) / PI / 30.).sin())
        .collect::<Vec<f64>>();
    let vv = v.as_slice();

    c.bench_function("detect_peaks", |b| {
        b.iter(|| detect_peaks(black_box(vv)).collect::<Vec<_>>())
    });

    c.bench_function("detect_valleys", |b| {
        b.iter(|| detect_valleys(black_box(vv), 2..1023).collect::<Vec<_>>())
    });
}

pub fn pitch_detect_benchmark(c: &mut Criterion) {
    const SAMPLE_RATE: usize = 44100;
    const SIZE: usize = 2048;
    const PADDING: usize = SIZE / 2;

    // Signal coming from some source (microphone, generated, etc...)
    let dt = 1.0 / SAMPLE_RATE as f64;
    let freq = 300.0;
    let signal: Vec<f64> = (0..SIZE)
        .map(|x| (2.0 * std::f64::consts::PI * x as f64 * dt * freq).sin())
        .collect();
    let prior = ContinuityPrior {
        previous_frequency: Some(freq),
        bias: 0.5,
        tolerance: 0.15,
    };

    let mut pyin_detector = PYinDetector::new(SIZE).unwrap();
    let mut yin_detector = YINDetector::new(SIZE).unwrap();
    let mut mcleod_detector = McLeodDetector::new(SIZE, PADDING).unwrap();

    c.bench_function("PYin get_pitch", |b| {
        b.iter(|| {
            pyin_detector
                .get_pitch(black_box(&signal), SAMPLE_RATE, &prior)
                .unwrap()
        });
    });

    c.bench_function("YIN get_pitch", |b| {
        b.iter(|| {
            yin_detector
                .get_pitch(black_box(&signal), SAMPLE_RATE, &prior)
                .unwrap()
        });
    });

    c.bench_function("McLeod get_pitch", |b| {
        b.iter(|| {
            mcleod_detector
                .get_pitch(black_box(&signal), SAMPLE_RATE, &prior)
                .unwrap()
        });
    });
}

pub fn session_benchmark(c: &mut Criterion) {
    const SAMPLE_RATE: usize = 44100;
    const SIZE: usize = 2048;

    let block: Vec<f32> = (0..SIZE)
        .map(|x| (2.0 * std::f32::consts::PI * x as f32 * 220.0 / SAMPLE_RATE as f32).sin())
        .collect();
    let settings = SessionSettings::new(SIZE, SAMPLE_RATE);
    let config = Config::default().with_gate_mode(GateMode::Instant);
    let mut session = PitchSession::start(settings, config).unwrap();

    c.bench_function("PitchSession push_samples", |b| {
        b.iter(|| {
            session.push_samples(black_box(&block)).unwrap();
            session.poll_estimate()
        });
    });
}

criterion_group!(
    benches,
    pitch_detect_benchmark,
    utils_benchmark,
    session_benchmark
);
criterion_main!(benches);
