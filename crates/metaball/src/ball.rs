//! Field sources and their confinement motion.
//!
//! Balls drift at constant velocity inside an invisible circular wall
//! centered on the canvas. Hitting the wall reflects the velocity about the
//! wall normal and pulls the ball back so it touches the wall from inside.
//! Balls never collide with each other; overlap is what makes blobs fuse.

use glam::DVec2;
use lava_lamp_core::Xorshift64;

/// Index of a ball within its layer.
pub type BallId = usize;

/// Divisor of `min(width, height)` giving the confinement radius.
const CONFINEMENT_DIVISOR: f64 = 1.6;
/// Divisor of `min(width, height)` giving the spawn disk radius.
const SPAWN_DIVISOR: f64 = 1.8;
/// Divisor of `min(width, height)` giving the base ball radius.
const BASE_SIZE_DIVISOR: f64 = 22.0;
/// Radius jitter, as a fraction of the base radius.
const SIZE_JITTER: (f64, f64) = (0.2, 0.5);
/// Speed component range before the layer multiplier.
const SPEED_MIN: f64 = 0.15;
const SPEED_SPREAD: f64 = 0.3;

/// The circular region every ball of a layer stays inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Confinement {
    pub center: DVec2,
    pub max_radius: f64,
}

impl Confinement {
    /// Disk centered on a `width` x `height` canvas with radius `min/1.6`.
    pub fn for_canvas(width: f64, height: f64) -> Self {
        Self {
            center: DVec2::new(width / 2.0, height / 2.0),
            max_radius: width.min(height) / CONFINEMENT_DIVISOR,
        }
    }

    /// How far `ball` pokes out of the disk; `<= 0` means it is inside.
    pub fn overshoot(&self, ball: &Ball) -> f64 {
        ball.pos.distance(self.center) + ball.radius - self.max_radius
    }
}

/// A mobile field source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
}

impl Ball {
    pub fn new(pos: DVec2, vel: DVec2, radius: f64) -> Self {
        Self { pos, vel, radius }
    }

    /// Spawns a ball for a `width` x `height` canvas.
    ///
    /// Each velocity component is `±(0.15 + U[0, 0.3)) * speed`, the
    /// position is uniform in angle and radius inside a disk of radius
    /// `min/1.8`, and the radius is the base size `min/22` plus 20-50%
    /// jitter. The ball is confined before it is returned.
    pub fn spawn(rng: &mut Xorshift64, width: f64, height: f64, speed: f64) -> Self {
        let mut component =
            || rng.next_sign() * (SPEED_MIN + rng.next_f64() * SPEED_SPREAD) * speed;
        let vel = DVec2::new(component(), component());

        let disk = Confinement::for_canvas(width, height);
        let spawn_radius = width.min(height) / SPAWN_DIVISOR;
        let angle = rng.next_angle();
        let distance = rng.next_f64() * spawn_radius;
        let pos = disk.center + DVec2::from_angle(angle) * distance;

        let base = width.min(height) / BASE_SIZE_DIVISOR;
        let radius = base + rng.next_range(SIZE_JITTER.0, SIZE_JITTER.1) * base;

        let mut ball = Self::new(pos, vel, radius);
        ball.confine(&disk);
        ball
    }

    /// `x² + y²` of the center, the ball's term in the expanded distance.
    pub fn magnitude(&self) -> f64 {
        self.pos.length_squared()
    }

    /// Advances one frame and bounces off the confinement wall.
    pub fn step(&mut self, disk: &Confinement) {
        self.pos += self.vel;
        self.confine(disk);
    }

    /// Restores `distance(pos, center) + radius <= max_radius`.
    ///
    /// Outward-moving velocity is reflected about the wall normal and the
    /// position is scaled toward the center onto the wall. A ball larger
    /// than the disk ends up at the center.
    pub fn confine(&mut self, disk: &Confinement) {
        let offset = self.pos - disk.center;
        let distance = offset.length();
        if distance + self.radius <= disk.max_radius {
            return;
        }
        if distance <= f64::EPSILON {
            self.pos = disk.center;
            return;
        }
        let normal = offset / distance;
        let outward = self.vel.dot(normal);
        if outward > 0.0 {
            self.vel -= 2.0 * outward * normal;
        }
        let scale = ((disk.max_radius - self.radius) / distance).max(0.0);
        self.pos = disk.center + offset * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn disk() -> Confinement {
        Confinement::for_canvas(800.0, 600.0)
    }

    #[test]
    fn confinement_uses_shorter_side() {
        let d = disk();
        assert_eq!(d.center, DVec2::new(400.0, 300.0));
        assert!((d.max_radius - 375.0).abs() < EPS);
    }

    #[test]
    fn step_inside_disk_only_translates() {
        let mut ball = Ball::new(DVec2::new(400.0, 300.0), DVec2::new(1.0, -0.5), 20.0);
        ball.step(&disk());
        assert_eq!(ball.pos, DVec2::new(401.0, 299.5));
        assert_eq!(ball.vel, DVec2::new(1.0, -0.5));
    }

    #[test]
    fn hitting_the_wall_reflects_and_clamps() {
        // Moving straight right, about to cross the wall at x = 400 + 375.
        let mut ball = Ball::new(DVec2::new(750.0, 300.0), DVec2::new(10.0, 0.0), 20.0);
        ball.step(&disk());
        assert!(disk().overshoot(&ball) <= EPS);
        assert!((ball.pos.x - 755.0).abs() < EPS);
        assert_eq!(ball.vel, DVec2::new(-10.0, 0.0));
    }

    #[test]
    fn reflection_preserves_speed_and_keeps_tangential_part() {
        let mut ball = Ball::new(DVec2::new(750.0, 300.0), DVec2::new(10.0, 3.0), 20.0);
        let speed = ball.vel.length();
        ball.step(&disk());
        assert!((ball.vel.length() - speed).abs() < EPS);
        assert!(ball.vel.x < 0.0);
    }

    #[test]
    fn inward_velocity_is_not_reflected() {
        // Outside after a shrink, but already heading home.
        let mut ball = Ball::new(DVec2::new(790.0, 300.0), DVec2::new(-1.0, 0.0), 20.0);
        ball.confine(&disk());
        assert_eq!(ball.vel, DVec2::new(-1.0, 0.0));
        assert!(disk().overshoot(&ball) <= EPS);
    }

    #[test]
    fn oversized_ball_parks_at_center() {
        let tiny = Confinement::for_canvas(16.0, 16.0);
        let mut ball = Ball::new(DVec2::new(12.0, 8.0), DVec2::new(1.0, 0.0), 50.0);
        ball.confine(&tiny);
        assert_eq!(ball.pos, tiny.center);
    }

    #[test]
    fn spawn_is_deterministic_and_confined() {
        let mut a = Xorshift64::new(3);
        let mut b = Xorshift64::new(3);
        let ba = Ball::spawn(&mut a, 800.0, 600.0, 1.5);
        let bb = Ball::spawn(&mut b, 800.0, 600.0, 1.5);
        assert_eq!(ba, bb);
        assert!(disk().overshoot(&ba) <= EPS);
    }

    #[test]
    fn spawn_radius_and_speed_ranges() {
        let mut rng = Xorshift64::new(17);
        let base = 600.0 / 22.0;
        for _ in 0..500 {
            let ball = Ball::spawn(&mut rng, 800.0, 600.0, 2.0);
            assert!(ball.radius >= base * 1.2 - EPS && ball.radius < base * 1.5 + EPS);
            for c in [ball.vel.x, ball.vel.y] {
                assert!(c.abs() >= 0.3 - EPS && c.abs() < 0.9 + EPS, "component {c}");
            }
        }
    }

    #[test]
    fn magnitude_is_squared_length() {
        let ball = Ball::new(DVec2::new(3.0, 4.0), DVec2::ZERO, 1.0);
        assert_eq!(ball.magnitude(), 25.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn step_always_restores_confinement(
                x in -2000.0_f64..2000.0,
                y in -2000.0_f64..2000.0,
                vx in -50.0_f64..50.0,
                vy in -50.0_f64..50.0,
                radius in 1.0_f64..100.0,
                w in 64.0_f64..2000.0,
                h in 64.0_f64..2000.0,
            ) {
                let disk = Confinement::for_canvas(w, h);
                prop_assume!(radius < disk.max_radius);
                let mut ball = Ball::new(DVec2::new(x, y), DVec2::new(vx, vy), radius);
                ball.step(&disk);
                prop_assert!(
                    disk.overshoot(&ball) <= 1e-9,
                    "overshoot {} for {:?}", disk.overshoot(&ball), ball
                );
            }

            #[test]
            fn confine_never_speeds_up(
                angle in 0.0_f64..std::f64::consts::TAU,
                vx in -20.0_f64..20.0,
                vy in -20.0_f64..20.0,
            ) {
                let disk = Confinement::for_canvas(400.0, 400.0);
                let pos = disk.center + DVec2::from_angle(angle) * 300.0;
                let mut ball = Ball::new(pos, DVec2::new(vx, vy), 20.0);
                let before = ball.vel.length();
                ball.confine(&disk);
                prop_assert!((ball.vel.length() - before).abs() < 1e-9);
            }
        }
    }
}
