use std::f32::consts::TAU;

use bevy::color::{LinearRgba, Mix};
use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use rayon::prelude::*;

use super::{GalaxyError, GalaxyParams};

/// Points generated per rayon task. Each chunk gets its own rng.
const CHUNK_SIZE: usize = 4096;

/// Positions and linear RGB colors, one entry per point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GalaxyCloud {
    positions: Vec<[f32; 3]>,
    colors: Vec<[f32; 3]>,
}

impl GalaxyCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn colors(&self) -> &[[f32; 3]] {
        &self.colors
    }

    /// `x0 y0 z0 x1 y1 z1 ...`, length `3 * len()`.
    pub fn flat_positions(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// `r0 g0 b0 r1 g1 b1 ...`, length `3 * len()`.
    pub fn flat_colors(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }
}

/// One sampled star before it is written to the buffers.
#[derive(Clone, Copy, Debug)]
struct StarSample {
    position: Vec3,
    radius: f32,
}

/// Generates a galaxy from the thread rng.
pub fn generate(params: &GalaxyParams) -> Result<GalaxyCloud, GalaxyError> {
    generate_with_rng(params, &mut rand::rng())
}

/// Generates a galaxy, drawing per-chunk seeds from `rng` so a seeded rng
/// reproduces the same cloud regardless of thread count.
pub fn generate_with_rng<R: Rng>(
    params: &GalaxyParams,
    rng: &mut R,
) -> Result<GalaxyCloud, GalaxyError> {
    params.check_shape()?;

    let count = params.count as usize;
    let inside = LinearRgba::from(params.inside_color);
    let outside = LinearRgba::from(params.outside_color);
    let seeds: Vec<u64> = (0..count.div_ceil(CHUNK_SIZE))
        .map(|_| rng.random())
        .collect();

    let mut positions = vec![[0.0; 3]; count];
    let mut colors = vec![[0.0; 3]; count];

    positions
        .par_chunks_mut(CHUNK_SIZE)
        .zip(colors.par_chunks_mut(CHUNK_SIZE))
        .zip(seeds.par_iter())
        .enumerate()
        .for_each(|(chunk, ((positions, colors), seed))| {
            let mut rng = StdRng::seed_from_u64(*seed);
            let first = chunk * CHUNK_SIZE;

            for (offset, (position, color)) in
                positions.iter_mut().zip(colors.iter_mut()).enumerate()
            {
                let star = sample_star(params, first + offset, &mut rng);
                let mixed = inside.mix(&outside, star.radius / params.radius);

                *position = star.position.to_array();
                *color = [mixed.red, mixed.green, mixed.blue];
            }
        });

    Ok(GalaxyCloud { positions, colors })
}

/// Arm assignment is by index, so consecutive points cycle through the arms.
///
/// Panics if `branches` is zero; `GalaxyParams::check_shape` rejects that first.
pub fn branch_angle(index: usize, branches: u32) -> f32 {
    let branches = branches as usize;
    (index % branches) as f32 / branches as f32 * TAU
}

fn sample_star<R: Rng>(params: &GalaxyParams, index: usize, rng: &mut R) -> StarSample {
    let radius = rng.random::<f32>() * params.radius;
    let angle = branch_angle(index, params.branches) + radius * params.spin;

    // x, y and z each draw their own magnitude and sign
    let jitter = vec3(
        sample_jitter(params, radius, rng),
        sample_jitter(params, radius, rng),
        sample_jitter(params, radius, rng),
    );

    StarSample {
        position: vec3(angle.cos() * radius, 0.0, angle.sin() * radius) + jitter,
        radius,
    }
}

fn sample_jitter<R: Rng>(params: &GalaxyParams, radius: f32, rng: &mut R) -> f32 {
    let magnitude = rng.random::<f32>().powf(params.randomness_power);
    let sign = if rng.random::<f32>() < 0.5 { 1.0 } else { -1.0 };
    magnitude * sign * params.randomness * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn seeded() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    fn flat(params: GalaxyParams) -> GalaxyParams {
        GalaxyParams {
            randomness: 0.0,
            ..params
        }
    }

    #[test]
    fn buffers_have_three_floats_per_point() {
        for count in [1, 100, 4096, 4097, 10_000] {
            let params = GalaxyParams {
                count,
                ..default()
            };
            let cloud = generate_with_rng(&params, &mut seeded()).expect("generate");
            assert_eq!(cloud.len(), count as usize);
            assert_eq!(cloud.flat_positions().len(), 3 * count as usize);
            assert_eq!(cloud.flat_colors().len(), 3 * count as usize);
        }
    }

    #[test]
    fn unseeded_generation_keeps_shape() {
        let params = GalaxyParams {
            count: 1000,
            ..default()
        };
        let a = generate(&params).expect("generate");
        let b = generate(&params).expect("generate");
        assert_eq!(a.len(), b.len());
        assert_ne!(a, b);
    }

    #[test]
    fn same_seed_reproduces_cloud() {
        let params = GalaxyParams {
            count: 20_000,
            ..default()
        };
        let a = generate_with_rng(&params, &mut seeded()).expect("generate");
        let b = generate_with_rng(&params, &mut seeded()).expect("generate");
        assert_eq!(a, b);
    }

    #[test]
    fn zero_count_is_rejected() {
        let params = GalaxyParams {
            count: 0,
            ..default()
        };
        assert!(matches!(
            generate(&params),
            Err(GalaxyError::InvalidParameter { name: "count", .. })
        ));
    }

    #[test]
    fn arm_assignment_repeats_every_branches_points() {
        for branches in 1..=15 {
            for i in 0..64 {
                assert_eq!(
                    branch_angle(i, branches),
                    branch_angle(i + branches as usize, branches)
                );
            }
        }
        assert_eq!(branch_angle(0, 4), 0.0);
        assert!((branch_angle(1, 4) - TAU / 4.0).abs() < EPSILON);
        assert!((branch_angle(3, 4) - 3.0 * TAU / 4.0).abs() < EPSILON);
    }

    #[test]
    #[should_panic]
    fn branch_angle_needs_at_least_one_branch() {
        branch_angle(3, 0);
    }

    #[test]
    fn zero_randomness_lies_on_the_spiral() {
        let params = flat(GalaxyParams {
            count: 2000,
            branches: 3,
            spin: 1.5,
            ..default()
        });
        let cloud = generate_with_rng(&params, &mut seeded()).expect("generate");

        for (i, [x, y, z]) in cloud.positions().iter().copied().enumerate() {
            assert_eq!(y, 0.0);
            let r = (x * x + z * z).sqrt();
            let angle = branch_angle(i, params.branches) + r * params.spin;
            assert!((x - angle.cos() * r).abs() < EPSILON, "point {i} off the arm");
            assert!((z - angle.sin() * r).abs() < EPSILON, "point {i} off the arm");
            assert!(r <= params.radius + EPSILON);
        }
    }

    #[test]
    fn single_branch_puts_every_point_on_angle_zero() {
        let params = flat(GalaxyParams {
            count: 500,
            branches: 1,
            spin: 0.0,
            ..default()
        });
        let cloud = generate_with_rng(&params, &mut seeded()).expect("generate");

        for [x, y, z] in cloud.positions().iter().copied() {
            assert!(x >= 0.0);
            assert_eq!(y, 0.0);
            assert!(z.abs() < EPSILON);
        }
    }

    #[test]
    fn two_arms_without_spin_or_jitter() {
        // black to white makes every color channel equal to r / radius
        let params = GalaxyParams {
            count: 4,
            branches: 2,
            radius: 10.0,
            spin: 0.0,
            randomness: 0.0,
            inside_color: Srgba::rgb(0.0, 0.0, 0.0),
            outside_color: Srgba::rgb(1.0, 1.0, 1.0),
            ..default()
        };
        let cloud = generate_with_rng(&params, &mut seeded()).expect("generate");

        for (i, ([x, y, z], color)) in cloud.positions().iter().zip(cloud.colors()).enumerate() {
            let r = color[0] * params.radius;
            assert!(r > 0.0 && r <= params.radius);
            assert_eq!(*y, 0.0);
            assert!(z.abs() < EPSILON);
            if i % 2 == 0 {
                assert!((x - r).abs() < EPSILON, "point {i}: x = {x}, r = {r}");
            } else {
                assert!((x + r).abs() < EPSILON, "point {i}: x = {x}, r = {r}");
            }
        }
    }

    #[test]
    fn colors_follow_radius() {
        let params = flat(GalaxyParams {
            count: 5000,
            ..default()
        });
        let inside = LinearRgba::from(params.inside_color);
        let outside = LinearRgba::from(params.outside_color);
        let cloud = generate_with_rng(&params, &mut seeded()).expect("generate");

        for ([x, _, z], color) in cloud.positions().iter().zip(cloud.colors()) {
            let t = (x * x + z * z).sqrt() / params.radius;
            let expected = inside.mix(&outside, t);
            for (channel, want) in color.iter().zip([expected.red, expected.green, expected.blue]) {
                assert!((0.0..=1.0).contains(channel));
                assert!((channel - want).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn red_center_blue_edge() {
        // one arm, no spin: every point sits at x = r on the positive x axis
        let params = flat(GalaxyParams {
            count: 10_000,
            branches: 1,
            spin: 0.0,
            inside_color: Srgba::rgb(1.0, 0.0, 0.0),
            outside_color: Srgba::rgb(0.0, 0.0, 1.0),
            ..default()
        });
        let cloud = generate_with_rng(&params, &mut seeded()).expect("generate");

        for ([x, _, _], [red, green, blue]) in cloud.positions().iter().zip(cloud.colors()) {
            let t = x / params.radius;
            assert!((red - (1.0 - t)).abs() < EPSILON, "red {red} at t = {t}");
            assert_eq!(*green, 0.0);
            assert!((blue - t).abs() < EPSILON, "blue {blue} at t = {t}");
        }

        let by_radius = |i: usize| {
            let [x, _, z] = cloud.positions()[i];
            (x * x + z * z).sqrt()
        };
        let (innermost, outermost) = (0..cloud.len()).fold((0, 0), |(lo, hi), i| {
            (
                if by_radius(i) < by_radius(lo) { i } else { lo },
                if by_radius(i) > by_radius(hi) { i } else { hi },
            )
        });
        assert!(cloud.colors()[innermost][0] > 0.99);
        assert!(cloud.colors()[outermost][2] > 0.99);
    }

    #[test]
    fn jitter_is_bounded_by_randomness_times_radius() {
        for randomness_power in [1.0, 3.0, 10.0] {
            let mut rng = seeded();
            let params = GalaxyParams {
                randomness: 0.7,
                randomness_power,
                ..default()
            };
            for radius in [0.0, 0.5, 4.0] {
                for _ in 0..1000 {
                    let jitter = sample_jitter(&params, radius, &mut rng);
                    assert!(jitter.abs() <= params.randomness * radius);
                }
            }
        }
    }

    #[test]
    fn higher_power_concentrates_jitter_near_zero() {
        let mean_abs = |randomness_power: f32| {
            let mut rng = seeded();
            let params = GalaxyParams {
                randomness: 1.0,
                randomness_power,
                ..default()
            };
            (0..10_000)
                .map(|_| sample_jitter(&params, 1.0, &mut rng).abs())
                .sum::<f32>()
                / 10_000.0
        };
        // E[u^p] = 1 / (p + 1)
        assert!((mean_abs(1.0) - 0.5).abs() < 0.02);
        assert!((mean_abs(3.0) - 0.25).abs() < 0.02);
        assert!(mean_abs(10.0) < mean_abs(3.0));
    }

    #[test]
    fn jitter_signs_are_balanced_per_axis() {
        let params = GalaxyParams {
            count: 20_000,
            randomness: 1.0,
            randomness_power: 1.0,
            ..default()
        };
        let cloud = generate_with_rng(&params, &mut seeded()).expect("generate");
        let above = cloud.positions().iter().filter(|p| p[1] > 0.0).count();
        let ratio = above as f32 / cloud.len() as f32;
        assert!((ratio - 0.5).abs() < 0.02, "y jitter sign ratio {ratio}");
    }
}
