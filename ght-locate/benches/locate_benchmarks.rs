use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ght_core::{BinSize, ImageSize, Keypoint, Match};
use ght_locate::{fit_homography_ransac, select_peak, Localizer, LocalizerConfig, RansacParams, VoteAccumulator};

const TEMPLATE: ImageSize = ImageSize { width: 240, height: 180 };
const SCENE: ImageSize = ImageSize { width: 1280, height: 720 };

/// Template keypoints with a rotated, scaled copy in the scene plus a share of
/// random-looking outliers
fn create_correspondences(n: usize, outlier_every: usize) -> (Vec<Keypoint>, Vec<Keypoint>, Vec<Match>) {
    let (s, c) = 0.4f32.sin_cos();
    let scale = 1.3;
    let mut template = Vec::with_capacity(n);
    let mut scene = Vec::with_capacity(n);

    for i in 0..n {
        let x = ((i * 37) % TEMPLATE.width) as f32 + 0.5;
        let y = ((i * 53) % TEMPLATE.height) as f32 + 0.25;
        let angle = ((i * 29) % 360) as f32;
        template.push(Keypoint::new(x, y, 12.0, angle));

        if outlier_every > 0 && i % outlier_every == 0 {
            let ox = ((i * 131) % SCENE.width) as f32;
            let oy = ((i * 71) % SCENE.height) as f32;
            scene.push(Keypoint::new(ox, oy, 9.0, ((i * 11) % 360) as f32));
        } else {
            scene.push(Keypoint::new(
                scale * (c * x - s * y) + 500.0,
                scale * (s * x + c * y) + 200.0,
                12.0 * scale,
                (angle + 0.4f32.to_degrees()) % 360.0,
            ));
        }
    }

    let matches = (0..n).map(|i| Match::new(i, i, 0.0)).collect();
    (template, scene, matches)
}

fn bench_voting(c: &mut Criterion) {
    let mut group = c.benchmark_group("center_voting");

    for &n in &[100usize, 1_000, 10_000] {
        let (template, scene, matches) = create_correspondences(n, 4);
        for bin in [BinSize::Pixels(5), BinSize::Pixels(10), BinSize::Divisions(64)] {
            let accumulator = VoteAccumulator::new(bin);
            group.bench_with_input(
                BenchmarkId::new(format!("{n}_matches"), format!("{bin:?}")),
                &(template.clone(), scene.clone(), matches.clone()),
                |b, (template, scene, matches)| {
                    b.iter(|| {
                        let (grid, _) = accumulator
                            .accumulate(black_box(matches), template, scene, TEMPLATE, SCENE)
                            .unwrap();
                        black_box(select_peak(&grid).unwrap())
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_ransac(c: &mut Criterion) {
    let mut group = c.benchmark_group("ransac_homography");

    for &(n, outlier_every) in &[(50usize, 0usize), (200, 4), (200, 2), (1_000, 3)] {
        let (template, scene, _) = create_correspondences(n, outlier_every);
        let src: Vec<[f64; 2]> = template.iter().map(|k| [k.x as f64, k.y as f64]).collect();
        let dst: Vec<[f64; 2]> = scene.iter().map(|k| [k.x as f64, k.y as f64]).collect();
        let params = RansacParams::default();

        group.bench_with_input(
            BenchmarkId::new(format!("{n}_pairs"), format!("outlier_every_{outlier_every}")),
            &(src, dst),
            |b, (src, dst)| b.iter(|| black_box(fit_homography_ransac(black_box(src), dst, &params).unwrap())),
        );
    }

    group.finish();
}

fn bench_localizer_presets(c: &mut Criterion) {
    let mut group = c.benchmark_group("localizer_presets");
    let (template, scene, matches) = create_correspondences(500, 3);

    let presets = [
        ("default", LocalizerConfig::default()),
        ("strict", LocalizerConfig::strict_preset()),
        ("permissive", LocalizerConfig::permissive_preset()),
    ];
    for (name, config) in presets {
        let localizer = Localizer::new(config).unwrap();
        group.bench_function(name, |b| {
            b.iter(|| {
                let center = localizer.locate_center(&matches, &template, &scene, TEMPLATE, SCENE);
                let outline = localizer.outline(&matches, &template, &scene, TEMPLATE);
                black_box((center, outline))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_voting, bench_ransac, bench_localizer_presets);
criterion_main!(benches);
