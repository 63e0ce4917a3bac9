//! Point distributions for the spiral galaxy and the background star field.
//!
//! Both generators are pure functions of their parameters and the supplied
//! random source: feeding the same parameters and an identically seeded
//! generator yields bit-identical buffers.

use std::f32::consts::TAU;
use std::time::Instant;

use glam::Vec3;
use log::debug;
use rand::Rng;

use crate::buffers::PointCloudBuffers;
use crate::color::Color;
use crate::error::FieldError;
use crate::params::{GalaxyParameters, StarFieldParameters};

/// Synthesizes `params.count` points spread along `params.branches` spiral arms.
///
/// Per particle the random source is consumed in a fixed order: radius, then
/// magnitude and sign for each of x, y and z.
pub fn generate_galaxy<R>(
    params: &GalaxyParameters,
    rng: &mut R,
) -> Result<PointCloudBuffers, FieldError>
where
    R: Rng + ?Sized,
{
    params.validate()?;
    let started = Instant::now();
    let mut buffers = PointCloudBuffers::with_capacity(params.count);

    for index in 0..params.count {
        let radius = rng.gen::<f32>() * params.radius;
        let spin_angle = radius * params.spin;
        let angle = branch_angle(index, params.branches) + spin_angle;

        // Each axis draws its own scatter, giving axis-independent spread.
        let offset = Vec3::new(
            scatter(rng, params, radius),
            scatter(rng, params, radius),
            scatter(rng, params, radius),
        );

        let position = Vec3::new(
            angle.cos() * radius + offset.x,
            offset.y,
            angle.sin() * radius + offset.z,
        );
        let color = mix_color(
            params.inside_color,
            params.outside_color,
            radius / params.radius,
        );
        buffers.push(position, color.to_array());
    }

    debug!(
        "generated galaxy: {} points, {} branches in {:?}",
        buffers.len(),
        params.branches,
        started.elapsed()
    );
    Ok(buffers)
}

/// Synthesizes a cubic, centre-weighted scatter of uniformly coloured stars.
pub fn generate_stars<R>(
    params: &StarFieldParameters,
    rng: &mut R,
) -> Result<PointCloudBuffers, FieldError>
where
    R: Rng + ?Sized,
{
    params.validate()?;
    let started = Instant::now();
    let mut buffers = PointCloudBuffers::with_capacity(params.count);
    let color = params.color.to_array();

    for _ in 0..params.count {
        let radius = rng.gen::<f32>() * params.radius;
        let position = Vec3::new(
            (rng.gen::<f32>() - 0.5) * radius,
            (rng.gen::<f32>() - 0.5) * radius,
            (rng.gen::<f32>() - 0.5) * radius,
        );
        buffers.push(position, color);
    }

    debug!(
        "generated star field: {} points in {:?}",
        buffers.len(),
        started.elapsed()
    );
    Ok(buffers)
}

/// Angle of the arm that particle `index` is assigned to.
pub fn branch_angle(index: usize, branches: u32) -> f32 {
    let branches = branches.max(1) as usize;
    (index % branches) as f32 / branches as f32 * TAU
}

/// Radial colour gradient; `t` is the particle radius over the galaxy radius.
pub fn mix_color(inside: Color, outside: Color, t: f32) -> Color {
    inside.lerp(outside, t)
}

fn scatter<R>(rng: &mut R, params: &GalaxyParameters, radius: f32) -> f32
where
    R: Rng + ?Sized,
{
    let magnitude = rng.gen::<f32>().powf(params.randomness_power);
    let sign = if rng.gen::<f32>() < 0.5 { 1.0 } else { -1.0 };
    magnitude * sign * params.randomness * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use std::f32::consts::{FRAC_PI_2, PI};
    use std::time::Duration;

    /// Random source that always returns the same word.
    struct FixedRng(u32);

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.0
        }

        fn next_u64(&mut self) -> u64 {
            u64::from(self.0) << 32 | u64::from(self.0)
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for chunk in dest.chunks_mut(4) {
                let bytes = self.0.to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    /// Random source that replays a fixed list of words, wrapping around.
    struct SequenceRng {
        words: Vec<u32>,
        next: usize,
    }

    impl SequenceRng {
        /// Each value becomes the word that `gen::<f32>()` maps back to it.
        fn of(values: &[f32]) -> Self {
            let words = values
                .iter()
                .map(|value| ((value * (1u32 << 24) as f32) as u32) << 8)
                .collect();
            Self { words, next: 0 }
        }
    }

    impl RngCore for SequenceRng {
        fn next_u32(&mut self) -> u32 {
            let word = self.words[self.next % self.words.len()];
            self.next += 1;
            word
        }

        fn next_u64(&mut self) -> u64 {
            u64::from(self.next_u32()) << 32 | u64::from(self.next_u32())
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for chunk in dest.chunks_mut(4) {
                let bytes = self.next_u32().to_le_bytes();
                chunk.copy_from_slice(&bytes[..chunk.len()]);
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn flat_galaxy(count: usize, branches: u32, spin: f32) -> GalaxyParameters {
        GalaxyParameters {
            count,
            branches,
            spin,
            radius: 1.0,
            randomness: 0.0,
            randomness_power: 3.0,
            ..GalaxyParameters::default()
        }
    }

    fn approx(a: f32, b: f32, epsilon: f32) -> bool {
        (a - b).abs() <= epsilon
    }

    #[test]
    fn buffers_match_requested_count() {
        let mut rng = StdRng::seed_from_u64(7);
        for count in [1, 3, 100, 2_500] {
            let params = GalaxyParameters {
                count,
                ..GalaxyParameters::default()
            };
            let buffers = generate_galaxy(&params, &mut rng).unwrap();
            assert_eq!(buffers.positions().len(), 3 * count);
            assert_eq!(buffers.colors().len(), 3 * count);
        }
    }

    #[test]
    fn zero_count_yields_empty_buffers() {
        let mut rng = StdRng::seed_from_u64(1);
        let params = GalaxyParameters {
            count: 0,
            ..GalaxyParameters::default()
        };
        let buffers = generate_galaxy(&params, &mut rng).unwrap();
        assert!(buffers.is_empty());
        assert!(buffers.colors().is_empty());

        let stars = StarFieldParameters {
            count: 0,
            ..StarFieldParameters::default()
        };
        assert!(generate_stars(&stars, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let params = GalaxyParameters {
            branches: 0,
            ..flat_galaxy(10, 3, 0.0)
        };
        assert!(matches!(
            generate_galaxy(&params, &mut rng),
            Err(FieldError::InvalidParameter { .. })
        ));
        let stars = StarFieldParameters {
            radius: -1.0,
            ..StarFieldParameters::default()
        };
        assert!(generate_stars(&stars, &mut rng).is_err());
    }

    #[test]
    fn four_arms_without_spin_land_on_quarter_turns() {
        let params = flat_galaxy(4, 4, 0.0);
        let buffers = generate_galaxy(&params, &mut FixedRng(u32::MAX)).unwrap();
        let expected = [0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2];
        for (index, angle) in expected.iter().enumerate() {
            let point = buffers.position(index).unwrap();
            assert!(approx(point.length(), 1.0, 1e-5), "point {index}: {point}");
            assert_eq!(point.y, 0.0);
            assert!(approx(point.x, angle.cos(), 1e-5), "point {index}: {point}");
            assert!(approx(point.z, angle.sin(), 1e-5), "point {index}: {point}");
        }
    }

    #[test]
    fn unperturbed_particles_lie_on_rotated_arms() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = flat_galaxy(500, 5, 1.5);
        let buffers = generate_galaxy(&params, &mut rng).unwrap();
        for index in 0..buffers.len() {
            let point = buffers.position(index).unwrap();
            assert_eq!(point.y, 0.0);
            let radius = point.x.hypot(point.z);
            let angle = branch_angle(index, params.branches) + radius * params.spin;
            assert!(approx(point.x, angle.cos() * radius, 1e-4));
            assert!(approx(point.z, angle.sin() * radius, 1e-4));
        }
    }

    #[test]
    fn scattered_particle_follows_draw_order() {
        let params = GalaxyParameters {
            count: 1,
            radius: 2.0,
            spin: 0.5,
            branches: 3,
            randomness: 0.8,
            randomness_power: 3.0,
            ..GalaxyParameters::default()
        };
        // radius, then (magnitude, sign) for x, y and z.
        let mut rng = SequenceRng::of(&[0.5, 0.5, 0.25, 0.5, 0.75, 0.5, 0.75]);
        let buffers = generate_galaxy(&params, &mut rng).unwrap();

        let point = buffers.position(0).unwrap();
        assert!(approx(point.x, 0.5f32.cos() + 0.1, 1e-5), "{point}");
        assert!(approx(point.y, -0.1, 1e-5), "{point}");
        assert!(approx(point.z, 0.5f32.sin() - 0.1, 1e-5), "{point}");

        let [r, g, b] = buffers.color(0).unwrap();
        let inside = params.inside_color;
        let outside = params.outside_color;
        assert!(approx(r, (inside.r + outside.r) / 2.0, 1e-6));
        assert!(approx(g, (inside.g + outside.g) / 2.0, 1e-6));
        assert!(approx(b, (inside.b + outside.b) / 2.0, 1e-6));
    }

    #[test]
    fn half_draws_scatter_towards_negative_axes() {
        let params = GalaxyParameters {
            count: 3,
            radius: 4.0,
            spin: 1.0,
            branches: 3,
            randomness: 0.6,
            randomness_power: 2.5,
            ..GalaxyParameters::default()
        };
        // A draw of exactly 0.5 is not below 0.5, so every sign is negative.
        let buffers = generate_galaxy(&params, &mut FixedRng(0x8000_0000)).unwrap();
        let radius = 2.0;
        let offset = -(0.5f32.powf(params.randomness_power)) * params.randomness * radius;
        for index in 0..buffers.len() {
            let point = buffers.position(index).unwrap();
            let angle = branch_angle(index, params.branches) + radius * params.spin;
            assert!(approx(point.x, angle.cos() * radius + offset, 1e-5), "{point}");
            assert!(approx(point.y, offset, 1e-6), "{point}");
            assert!(approx(point.z, angle.sin() * radius + offset, 1e-5), "{point}");
        }
    }

    #[test]
    fn oversized_count_is_an_error_not_a_panic() {
        let params = GalaxyParameters {
            count: usize::MAX,
            ..GalaxyParameters::default()
        };
        assert!(matches!(
            generate_galaxy(&params, &mut FixedRng(0)),
            Err(FieldError::InvalidParameter { .. })
        ));
        let stars = StarFieldParameters {
            count: usize::MAX,
            ..StarFieldParameters::default()
        };
        assert!(generate_stars(&stars, &mut FixedRng(0)).is_err());
    }

    #[test]
    fn branch_angle_cycles_by_index() {
        assert_eq!(branch_angle(0, 3), 0.0);
        assert!(approx(branch_angle(1, 3), TAU / 3.0, 1e-6));
        assert_eq!(branch_angle(3, 3), 0.0);
        assert!(approx(branch_angle(7, 4), 3.0 * FRAC_PI_2, 1e-6));
    }

    #[test]
    fn centre_particles_take_inside_color() {
        let params = flat_galaxy(3, 3, 1.0);
        let buffers = generate_galaxy(&params, &mut FixedRng(0)).unwrap();
        for index in 0..buffers.len() {
            assert_eq!(buffers.color(index), Some(params.inside_color.to_array()));
        }
    }

    #[test]
    fn edge_color_matches_outside_color() {
        let params = GalaxyParameters::default();
        let edge = mix_color(params.inside_color, params.outside_color, 1.0);
        assert!(approx(edge.r, params.outside_color.r, 1e-6));
        assert!(approx(edge.g, params.outside_color.g, 1e-6));
        assert!(approx(edge.b, params.outside_color.b, 1e-6));

        let buffers = generate_galaxy(
            &GalaxyParameters {
                count: 1,
                ..params
            },
            &mut FixedRng(u32::MAX),
        )
        .unwrap();
        let [r, g, b] = buffers.color(0).unwrap();
        assert!(approx(r, params.outside_color.r, 1e-5));
        assert!(approx(g, params.outside_color.g, 1e-5));
        assert!(approx(b, params.outside_color.b, 1e-5));
    }

    #[test]
    fn identical_seeds_give_identical_buffers() {
        let params = GalaxyParameters {
            count: 10_000,
            ..GalaxyParameters::default()
        };
        let first = generate_galaxy(&params, &mut StdRng::seed_from_u64(99)).unwrap();
        let second = generate_galaxy(&params, &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(first, second);

        let stars = StarFieldParameters::default();
        let first = generate_stars(&stars, &mut StdRng::seed_from_u64(5)).unwrap();
        let second = generate_stars(&stars, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn scatter_stays_within_randomness_envelope() {
        let params = GalaxyParameters {
            count: 5_000,
            randomness: 0.5,
            ..GalaxyParameters::default()
        };
        let buffers = generate_galaxy(&params, &mut StdRng::seed_from_u64(3)).unwrap();
        let limit = params.randomness * params.radius;
        for index in 0..buffers.len() {
            let point = buffers.position(index).unwrap();
            assert!(point.y.abs() <= limit);
            assert!(point.x.hypot(point.z) <= params.radius + limit * 2f32.sqrt());
        }
    }

    #[test]
    fn generator_leaves_parameters_untouched() {
        let params = GalaxyParameters {
            count: 64,
            ..GalaxyParameters::default()
        };
        let snapshot = params;
        generate_galaxy(&params, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(params, snapshot);
    }

    #[test]
    fn stars_fill_a_centred_cube_with_uniform_color() {
        let params = StarFieldParameters {
            count: 2_000,
            radius: 10.0,
            color: Color::from_rgb_u32(0xffeecc),
            ..StarFieldParameters::default()
        };
        let buffers = generate_stars(&params, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(buffers.positions().len(), 3 * params.count);
        assert_eq!(buffers.colors().len(), 3 * params.count);
        let (min, max) = buffers.bounds().unwrap();
        assert!(min.min_element() >= -params.radius / 2.0);
        assert!(max.max_element() <= params.radius / 2.0);
        for index in 0..buffers.len() {
            assert_eq!(buffers.color(index), Some(params.color.to_array()));
        }
    }

    #[test]
    fn star_axes_scale_with_their_own_radius() {
        let params = StarFieldParameters {
            count: 1,
            radius: 10.0,
            ..StarFieldParameters::default()
        };
        // radius 0.5 * 10, then x, y and z draws.
        let mut rng = SequenceRng::of(&[0.5, 0.75, 0.25, 0.5]);
        let buffers = generate_stars(&params, &mut rng).unwrap();
        let point = buffers.position(0).unwrap();
        assert!(approx(point.x, 1.25, 1e-6), "{point}");
        assert!(approx(point.y, -1.25, 1e-6), "{point}");
        assert_eq!(point.z, 0.0);
    }

    #[test]
    fn million_points_stay_within_memory_budget() {
        let params = GalaxyParameters {
            count: 1_000_000,
            ..GalaxyParameters::default()
        };
        let started = Instant::now();
        let buffers = generate_galaxy(&params, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(buffers.len(), params.count);
        assert!(buffers.byte_len() <= 2 * 3 * params.count * std::mem::size_of::<f32>());
        assert!(started.elapsed() < Duration::from_secs(60));
    }
}
