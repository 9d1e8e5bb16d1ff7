//! Closed-form vertex data of the animated lessons.
//!
//! Everything here is plain CPU math producing `f32` vertex streams; uploading and drawing is
//! left to the lessons.

use glam::Vec2;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

use crate::prng::Xorshift64;

/// Corners of a quad, in drawing order around its centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub a: Vec2,
    pub b: Vec2,
    pub c: Vec2,
    pub d: Vec2,
}

impl Quad {
    /// Append triangles `(a, b, c)` and `(a, c, d)`, each vertex as `[r, g, b, x, y]`.
    pub fn push_colored_triangles(&self, color: [f32; 3], out: &mut Vec<f32>) {
        for corner in [self.a, self.b, self.c, self.a, self.c, self.d] {
            out.extend_from_slice(&color);
            out.extend_from_slice(&corner.to_array());
        }
    }
}

/// Floats per `[r, g, b, x, y]` vertex.
pub const COLORED_VERTEX_LEN: usize = 5;

/// A square of side `size * sqrt(2) / 2` rotated by `angle`, whose corners lie `size / 2` away
/// from `center`.
pub fn square_corners(angle: f32, center: Vec2, size: f32) -> Quad {
    let half = size / 2.;
    let corner = |a: f32| center + Vec2::new(a.cos(), a.sin()) * half;

    Quad {
        a: corner(angle + 3. * FRAC_PI_4),
        b: corner(angle + FRAC_PI_4),
        c: corner(angle - FRAC_PI_4),
        d: corner(angle - 3. * FRAC_PI_4),
    }
}

/// A clock hand: a band from the origin to `length` along `angle`, `size` thick.
pub fn hand_quad(angle: f32, length: f32, size: f32) -> Quad {
    let start = square_corners(angle, Vec2::ZERO, size);
    let tip = Vec2::new(angle.cos(), angle.sin()) * length;
    let end = square_corners(angle, tip, size);

    Quad {
        a: start.a,
        b: end.b,
        c: end.c,
        d: start.d,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hand {
    pub angle: f32,
    pub length: f32,
    pub size: f32,
    pub color: [f32; 3],
}

/// The hour, minute and second hands, plus the short tail of the second hand.
///
/// Angles are counter-clockwise from `+X`, so 12 o’clock is `π/2`.
pub fn clock_hands(hours: u32, minutes: u32, seconds: u32) -> [Hand; 4] {
    let since_hour = (minutes * 60 + seconds) as f32;
    let since_noon = ((hours % 12) * 3600) as f32 + since_hour;
    let second_angle = FRAC_PI_2 - seconds as f32 / 60. * TAU;
    let second_color = [0.8, 0.2, 0.2];

    [
        Hand {
            angle: FRAC_PI_2 - since_noon / (12. * 3600.) * TAU,
            length: 0.5,
            size: 0.14,
            color: [0., 0., 0.],
        },
        Hand {
            angle: FRAC_PI_2 - since_hour / 3600. * TAU,
            length: 0.9,
            size: 0.07,
            color: [0.3, 0.3, 0.3],
        },
        Hand {
            angle: second_angle,
            length: 0.99,
            size: 0.02,
            color: second_color,
        },
        Hand {
            angle: second_angle + PI,
            length: 0.2,
            size: 0.02,
            color: second_color,
        },
    ]
}

/// Interleaved `[r, g, b, x, y]` triangles for the given hands.
pub fn clock_vertices(hands: &[Hand]) -> Vec<f32> {
    let mut out = Vec::with_capacity(hands.len() * 6 * COLORED_VERTEX_LEN);

    for hand in hands {
        hand_quad(hand.angle, hand.length, hand.size).push_colored_triangles(hand.color, &mut out);
    }

    out
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpinningSquare {
    pub center: Vec2,
    pub size: f32,
    pub color: [f32; 3],
    /// Radians per second; small squares spin faster.
    pub speed: f32,
}

/// `count` random squares, biggest first so that small ones are drawn on top.
pub fn random_squares(rng: &mut Xorshift64, count: usize) -> Vec<SpinningSquare> {
    let mut squares: Vec<SpinningSquare> = (0..count)
        .map(|_| {
            let center = Vec2::new(rng.next_f32() * 2. - 1., rng.next_f32() * 2. - 1.);
            let size = (rng.next_f32() * 0.8).max(0.1);
            let color = [rng.next_f32(), rng.next_f32(), rng.next_f32()];
            let speed = 0.1 / (size * size) * rng.next_sign();

            SpinningSquare {
                center,
                size,
                color,
                speed,
            }
        })
        .collect();

    squares.sort_by(|a, b| b.size.total_cmp(&a.size));
    squares
}

/// Interleaved `[r, g, b, x, y]` triangles of every square, rotated for `seconds`.
pub fn spinning_squares_vertices(squares: &[SpinningSquare], seconds: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(squares.len() * 6 * COLORED_VERTEX_LEN);

    for square in squares {
        square_corners(seconds * square.speed, square.center, square.size)
            .push_colored_triangles(square.color, &mut out);
    }

    out
}

/// Position in `[-1, 1]` of a point going back and forth at `|speed|` half-widths per second.
pub fn bounce(speed: f32, seconds: f32) -> f32 {
    let mut coord = (speed.abs() * seconds) % 2.;

    if coord > 1. {
        coord = 2. - coord;
    }

    coord * 2. - 1.
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BouncingDot {
    pub speed: [f32; 2],
    pub color: [f32; 4],
    pub size: f32,
}

impl BouncingDot {
    pub fn coords(&self, seconds: f32) -> [f32; 2] {
        [bounce(self.speed[0], seconds), bounce(self.speed[1], seconds)]
    }
}

/// `count` dots; fast dots are small, with sizes capped at 30 pixels.
pub fn random_bouncing_dots(rng: &mut Xorshift64, count: usize) -> Vec<BouncingDot> {
    (0..count)
        .map(|_| {
            let speed = [
                rng.next_range(0.1, 2.) * rng.next_sign(),
                rng.next_range(0.1, 2.) * rng.next_sign(),
            ];
            let color = rng.next_color();
            let size = (10. / Vec2::from(speed).length()).min(30.);

            BouncingDot { speed, color, size }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitingDot {
    pub speed: f32,
    pub radius: f32,
    pub color: [f32; 4],
    pub size: f32,
}

pub fn random_orbiting_dots(rng: &mut Xorshift64, count: usize) -> Vec<OrbitingDot> {
    (0..count)
        .map(|_| {
            let speed = rng.next_range(1., 4.) * rng.next_sign();
            let radius = rng.next_range(0.2, 1.);
            let color = rng.next_color();
            let size = (10. / (speed.abs() * radius)).min(30.);

            OrbitingDot {
                speed,
                radius,
                color,
                size,
            }
        })
        .collect()
}

/// Two triangles of a 4×4 plane spinning around the X axis, centred at `z = -2`.
///
/// Three floats per vertex; triangles are `(bl, tl, tr)` and `(bl, tr, br)`.
pub fn tilting_plane(time_ms: f64) -> [f32; 18] {
    let progress = (time_ms / 1000.) as f32;
    let l = 2.;
    let top_y = l * progress.sin();
    let btm_y = -top_y;
    let top_z = -2. - l * progress.cos();
    let btm_z = -2. + l * progress.cos();

    let bl = [-l, btm_y, btm_z];
    let tl = [-l, top_y, top_z];
    let tr = [l, top_y, top_z];
    let br = [l, btm_y, btm_z];

    let mut out = [0.; 18];

    for (i, vertex) in [bl, tl, tr, bl, tr, br].iter().enumerate() {
        out[i * 3..i * 3 + 3].copy_from_slice(vertex);
    }

    out
}

/// Texture coordinates of [`tilting_plane`], repeating the texture `v` times along each axis.
pub fn tex_coord_square(v: f32) -> [f32; 12] {
    [0., 0., 0., v, v, v, 0., 0., v, v, v, 0.]
}

/// Texture coordinates of the filter playground quad: the texture is repeated `repeat_x` by
/// `repeat_y` times and shrunk by `inset` towards the origin.
pub fn inset_tex_coords(inset: f32, repeat_x: f32, repeat_y: f32) -> [f32; 12] {
    let d = inset;
    let u = (1. - d) * repeat_x;
    let v = (1. - d) * repeat_y;

    [d, d, d, v, u, v, d, d, u, v, u, d]
}

/// Weight of the second texture in the blending lesson; a full cycle takes 2π seconds.
pub fn blend_factor(now_ms: f64) -> f32 {
    ((now_ms / 1000.).sin() * 0.5 + 0.5) as f32
}

/// Floats per `[x, y, z, u, v]` vertex.
pub const TEXTURED_VERTEX_LEN: usize = 5;

/// Billboards scrolling toward the camera.
///
/// The field keeps [`CactusField::CAPACITY`] billboards alive: the ones passing behind the
/// camera are removed, and new ones are spawned far away on the next frame.
#[derive(Clone, Debug)]
pub struct CactusField {
    rng: Xorshift64,
    /// `(x, z)` at distance zero, sorted by `z`, farthest first.
    billboards: Vec<[f32; 2]>,
    distance: f32,
    prev_time: f64,
}

impl CactusField {
    pub const CAPACITY: usize = 200;
    pub const VERTEX_COUNT: usize = Self::CAPACITY * 6;

    const HALF_WIDTH: f32 = 0.66;
    const SPAWN_DEPTH: f32 = 300.;
    const CULL_Z: f32 = 3.;

    pub fn new(rng: Xorshift64) -> Self {
        CactusField {
            rng,
            billboards: Vec::with_capacity(Self::CAPACITY),
            distance: 0.,
            prev_time: 0.,
        }
    }

    /// Distance travelled so far.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn len(&self) -> usize {
        self.billboards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.billboards.is_empty()
    }

    /// Advance to `time_ms` and return the `[x, y, z, u, v]` vertices of every billboard.
    ///
    /// `speed` is the slider value; the field moves `speed / 500` units per millisecond.
    pub fn advance(&mut self, time_ms: f64, speed: f32) -> Vec<f32> {
        let delta = (time_ms - self.prev_time) as f32 * speed / 500.;
        self.distance += delta;
        self.prev_time = time_ms;

        self.refill();

        let distance = self.distance;
        let mut out = Vec::with_capacity(Self::VERTEX_COUNT * TEXTURED_VERTEX_LEN);

        for &[x, z] in &self.billboards {
            let z = z + distance;
            let (left, right) = (x - Self::HALF_WIDTH, x + Self::HALF_WIDTH);

            out.extend_from_slice(&[
                left, -1., z, 0., 0., //
                left, 1., z, 0., 1., //
                right, 1., z, 1., 1., //
                left, -1., z, 0., 0., //
                right, 1., z, 1., 1., //
                right, -1., z, 1., 0., //
            ]);
        }

        self.billboards
            .retain(|&[_, z]| z + distance <= Self::CULL_Z);

        out
    }

    fn refill(&mut self) {
        if self.billboards.len() >= Self::CAPACITY {
            return;
        }

        let first_fill = self.billboards.is_empty();

        while self.billboards.len() < Self::CAPACITY {
            let x = self.rng.next_f32() * 30. - 15.;
            let z = if first_fill {
                -self.rng.next_f32() * Self::SPAWN_DEPTH
            } else {
                -(self.distance + Self::SPAWN_DEPTH)
            };

            self.billboards.push([x, z]);
        }

        self.billboards.sort_by(|a, b| a[1].total_cmp(&b[1]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1e-5;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < EPS
    }

    fn rng() -> Xorshift64 {
        Xorshift64::new(0xC0FFEE)
    }

    proptest! {
        #[test]
        fn square_corners_lie_half_size_away(
            angle in -10f32..10.,
            x in -1f32..1.,
            y in -1f32..1.,
            size in 0.01f32..2.,
        ) {
            let center = Vec2::new(x, y);
            let q = square_corners(angle, center, size);

            for corner in [q.a, q.b, q.c, q.d] {
                prop_assert!((corner.distance(center) - size / 2.).abs() < 1e-4);
            }
        }

        #[test]
        fn bounce_stays_in_range(speed in -5f32..5., t in 0f32..1000.) {
            let c = bounce(speed, t);
            prop_assert!((-1. ..=1.).contains(&c));
        }

        #[test]
        fn bounce_is_periodic(speed in 0.1f32..2., t in 0f32..10.) {
            let period = 2. / speed;
            prop_assert!((bounce(speed, t) - bounce(speed, t + period)).abs() < 1e-3);
        }

        #[test]
        fn inset_coords_start_at_inset(d in 0f32..1., rx in 0f32..10., ry in 0f32..10.) {
            let coords = inset_tex_coords(d, rx, ry);
            prop_assert_eq!(coords[0], d);
            prop_assert_eq!(coords[1], d);
            prop_assert!((coords[4] - (1. - d) * rx).abs() < EPS);
            prop_assert!((coords[5] - (1. - d) * ry).abs() < EPS);
        }

        #[test]
        fn blend_factor_is_a_weight(now in 0f64..1e9) {
            prop_assert!((0. ..=1.).contains(&blend_factor(now)));
        }
    }

    #[test]
    fn unrotated_square_corners() {
        let q = square_corners(0., Vec2::ZERO, 2.);
        let h = FRAC_PI_4.cos();

        assert!(close(q.a.x, -h) && close(q.a.y, h));
        assert!(close(q.b.x, h) && close(q.b.y, h));
        assert!(close(q.c.x, h) && close(q.c.y, -h));
        assert!(close(q.d.x, -h) && close(q.d.y, -h));
    }

    #[test]
    fn hand_joins_origin_and_tip() {
        let hand = hand_quad(FRAC_PI_2, 0.5, 0.1);
        let start = (hand.a + hand.d) / 2.;
        let end = (hand.b + hand.c) / 2.;
        let overhang = 0.05 * FRAC_PI_4.cos();

        // the band overhangs both ends by the same amount
        assert!(close(start.x, 0.) && close(start.y, -overhang));
        assert!(close(end.x, 0.) && close(end.y, 0.5 + overhang));
    }

    #[test]
    fn colored_triangles_are_interleaved() {
        let q = square_corners(0., Vec2::ZERO, 1.);
        let mut out = Vec::new();
        q.push_colored_triangles([0.1, 0.2, 0.3], &mut out);

        assert_eq!(out.len(), 6 * COLORED_VERTEX_LEN);
        assert_eq!(&out[0..5], &[0.1, 0.2, 0.3, q.a.x, q.a.y]);
        assert_eq!(&out[15..20], &[0.1, 0.2, 0.3, q.a.x, q.a.y]);
        assert_eq!(&out[25..30], &[0.1, 0.2, 0.3, q.d.x, q.d.y]);
    }

    #[test]
    fn noon_hands_point_up() {
        let hands = clock_hands(12, 0, 0);

        for hand in &hands[..3] {
            assert!(close(hand.angle, FRAC_PI_2));
        }
        assert!(close(hands[3].angle, FRAC_PI_2 + PI));
    }

    #[test]
    fn three_oclock_hour_hand_points_right() {
        let hands = clock_hands(15, 0, 0);
        assert!(close(hands[0].angle, 0.));
        assert!(close(hands[1].angle, FRAC_PI_2));
    }

    #[test]
    fn half_past_six_hands() {
        let [hour, minute, second, tail] = clock_hands(6, 30, 15);
        let since_noon = 6. * 3600. + 30. * 60. + 15.;

        assert!(close(hour.angle, FRAC_PI_2 - since_noon / 43200. * TAU));
        assert!(close(minute.angle, FRAC_PI_2 - 1815. / 3600. * TAU));
        assert!(close(second.angle, FRAC_PI_2 - 0.25 * TAU));
        assert!(close(tail.angle, second.angle + PI));
        assert_eq!((hour.length, minute.length, second.length, tail.length), (0.5, 0.9, 0.99, 0.2));
        assert_eq!(second.color, tail.color);
    }

    #[test]
    fn clock_draws_four_hands() {
        let vertices = clock_vertices(&clock_hands(1, 2, 3));
        assert_eq!(vertices.len(), 4 * 6 * COLORED_VERTEX_LEN);
    }

    #[test]
    fn squares_are_sorted_and_bounded() {
        let squares = random_squares(&mut rng(), 50);
        assert_eq!(squares.len(), 50);

        for pair in squares.windows(2) {
            assert!(pair[0].size >= pair[1].size);
        }

        for s in &squares {
            assert!((0.1..=0.8).contains(&s.size));
            assert!(close(s.speed.abs(), 0.1 / (s.size * s.size)));
            assert!((-1.0..1.0).contains(&s.center.x));
            assert!((-1.0..1.0).contains(&s.center.y));
        }

        assert_eq!(
            spinning_squares_vertices(&squares, 1.5).len(),
            50 * 6 * COLORED_VERTEX_LEN
        );
    }

    #[test]
    fn bouncing_dot_parameters() {
        for dot in random_bouncing_dots(&mut rng(), 50) {
            for s in dot.speed {
                assert!((0.1..2.).contains(&s.abs()));
            }
            assert!(dot.size <= 30.);
            assert!(close(dot.size, (10. / Vec2::from(dot.speed).length()).min(30.)));
            assert_eq!(dot.color[3], 1.);
        }
    }

    #[test]
    fn bouncing_dot_starts_at_the_bottom_left() {
        let dot = BouncingDot {
            speed: [1., -1.],
            color: [1.; 4],
            size: 10.,
        };

        assert_eq!(dot.coords(0.), [-1., -1.]);
        assert_eq!(dot.coords(1.), [1., 1.]);
    }

    #[test]
    fn orbiting_dot_parameters() {
        for dot in random_orbiting_dots(&mut rng(), 50) {
            assert!((1.0..4.0).contains(&dot.speed.abs()));
            assert!((0.2..1.0).contains(&dot.radius));
            assert!(dot.size <= 30.);
        }
    }

    #[test]
    fn tilting_plane_at_rest_faces_up() {
        let plane = tilting_plane(0.);

        // bottom left
        assert_eq!(&plane[0..3], &[-2., 0., 0.]);
        // top left
        assert_eq!(&plane[3..6], &[-2., 0., -4.]);
        // top right
        assert_eq!(&plane[6..9], &[2., 0., -4.]);
        // bottom right
        assert_eq!(&plane[15..18], &[2., 0., 0.]);
    }

    #[test]
    fn tex_coord_square_repeats() {
        assert_eq!(
            tex_coord_square(8.),
            [0., 0., 0., 8., 8., 8., 0., 0., 8., 8., 8., 0.]
        );
    }

    #[test]
    fn blend_factor_starts_halfway() {
        assert!(close(blend_factor(0.), 0.5));
    }

    #[test]
    fn cactus_field_fills_sorted() {
        let mut field = CactusField::new(rng());
        let vertices = field.advance(0., 5.);

        assert_eq!(vertices.len(), CactusField::VERTEX_COUNT * TEXTURED_VERTEX_LEN);

        let depths: Vec<f32> = vertices
            .chunks(6 * TEXTURED_VERTEX_LEN)
            .map(|billboard| billboard[2])
            .collect();

        for pair in depths.windows(2) {
            assert!(pair[0] <= pair[1]);
        }

        assert!(depths.iter().all(|z| (-300.0..=0.).contains(z)));
    }

    #[test]
    fn cactus_billboard_shape() {
        let mut field = CactusField::new(rng());
        let vertices = field.advance(0., 5.);
        let x = vertices[0] + 0.66;
        let z = vertices[2];

        assert!(close(vertices[5], x - 0.66));
        assert_eq!(&vertices[6..10], &[1., z, 0., 1.]);
        assert!(close(vertices[10], x + 0.66));
        assert_eq!(&vertices[11..15], &[1., z, 1., 1.]);
        assert_eq!(&vertices[26..30], &[-1., z, 1., 0.]);
    }

    #[test]
    fn passed_cactuses_are_culled_and_respawned_far_away() {
        let mut field = CactusField::new(rng());
        field.advance(0., 5.);

        // 100 units closer: everything spawned within 97 units of the camera is behind it
        let vertices = field.advance(10_000., 5.);
        assert!(close(field.distance(), 100.));
        assert_eq!(vertices.len(), CactusField::VERTEX_COUNT * TEXTURED_VERTEX_LEN);
        assert!(field.len() < CactusField::CAPACITY);

        let culled = CactusField::CAPACITY - field.len();
        let vertices = field.advance(10_000., 5.);
        assert_eq!(field.len(), CactusField::CAPACITY);

        // respawned billboards sit 300 units away and sort first
        for billboard in vertices.chunks(6 * TEXTURED_VERTEX_LEN).take(culled) {
            assert!(close(billboard[2], -300.));
        }
    }

    #[test]
    fn zero_speed_keeps_the_field_still() {
        let mut field = CactusField::new(rng());
        let first = field.advance(0., 0.);
        let second = field.advance(1000., 0.);

        assert_eq!(first, second);
    }
}
