use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use face_analysis_client::{
    capture::{Camera, CaptureConfig, MockCamera},
    codec,
};

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_photo");
    for (width, height) in [(320, 240), (640, 480), (1280, 720)] {
        let mut camera = MockCamera::new();
        camera
            .open(&CaptureConfig::with_dimensions(width, height))
            .unwrap();
        let photo = camera.capture().unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{height}")),
            &photo,
            |b, photo| b.iter(|| codec::encode_photo(black_box(photo), codec::MAX_QUALITY)),
        );
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut camera = MockCamera::new();
    camera.open(&CaptureConfig::default()).unwrap();
    let encoded = codec::encode_photo(&camera.capture().unwrap(), 90).unwrap();

    c.bench_function("decode_image_640x480", |b| {
        b.iter(|| codec::decode_image(black_box(&encoded)))
    });
}

criterion_group!(codec_benches, bench_encode, bench_decode);
criterion_main!(codec_benches);
