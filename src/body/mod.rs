use crate::{
    config,
    render::Surface,
    types::{Bounds, Rgb, Vec2},
};

/// A single falling circle. Bodies never interact with each other.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub gravity: f32,
    pub bounce: f32,
    pub color: Rgb,
    dragging: bool,
}

impl Body {
    pub fn new(pos: Vec2, radius: f32, color: Rgb) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            gravity: config::GRAVITY,
            bounce: config::BOUNCE,
            color,
            dragging: false,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_physics(mut self, gravity: f32, bounce: f32) -> Self {
        self.gravity = gravity;
        self.bounce = bounce;
        self
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Velocity is cleared whenever the body is taken under pointer control.
    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
        if dragging {
            self.vel = Vec2::ZERO;
        }
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.radius
    }

    /// `GROUND_EPSILON` only absorbs float rounding in the `floor - radius` rest snap,
    /// so a snapped body still reads as grounded.
    pub fn touches_ground(&self, bounds: Bounds) -> bool {
        self.bottom() >= bounds.height - config::GROUND_EPSILON
    }

    pub fn is_expired(&self) -> bool {
        self.radius < config::MIN_RADIUS
    }

    pub fn draw(&self, surface: &mut dyn Surface) {
        surface.fill_circle(self.pos, self.radius, self.color);
    }

    pub fn hit_test(&self, point: Vec2) -> bool {
        (point - self.pos).length() < self.radius
    }

    pub fn apply_drag(&mut self, point: Vec2) {
        if !self.dragging {
            return;
        }
        self.pos = point;
        self.vel = Vec2::ZERO;
    }

    /// One frame of physics. Does nothing while dragged.
    pub fn step(&mut self, bounds: Bounds) {
        if self.dragging {
            return;
        }

        let floor = bounds.height;
        if self.touches_ground(bounds)
            && self.vel.x.abs() < config::REST_SPEED
            && self.vel.y.abs() < config::REST_SPEED
        {
            self.pos.y = floor - self.radius;
            self.vel = Vec2::ZERO;
            return;
        }

        self.vel.y += self.gravity;
        self.pos += self.vel;

        if self.bottom() > floor {
            self.pos.y = floor - self.radius;
            self.vel.y = -self.vel.y * self.bounce;
        }

        if self.pos.x - self.radius < 0.0 || self.pos.x + self.radius > bounds.width {
            self.vel.x = -self.vel.x * config::WALL_DAMP;
            self.pos.x = clamp_axis(self.pos.x, self.radius, bounds.width);
        }
    }
}

/// Keeps `[v - r, v + r]` inside `[0, extent]`; centers when the circle is wider than the extent.
fn clamp_axis(v: f32, r: f32, extent: f32) -> f32 {
    if 2.0 * r >= extent {
        extent / 2.0
    } else {
        v.clamp(r, extent - r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn bounds() -> Bounds {
        Bounds::new(800.0, 600.0)
    }

    fn body_at(x: f32, y: f32, radius: f32) -> Body {
        Body::new(Vec2::new(x, y), radius, Rgb::WHITE)
    }

    mod hit_test {
        use super::*;

        #[test]
        fn center_is_inside() {
            assert!(body_at(100.0, 100.0, 10.0).hit_test(Vec2::new(100.0, 100.0)));
        }

        #[test]
        fn boundary_is_outside() {
            let body = body_at(100.0, 100.0, 10.0);
            assert!(!body.hit_test(Vec2::new(110.0, 100.0)));
            assert!(body.hit_test(Vec2::new(109.9, 100.0)));
        }

        #[test]
        fn far_point_is_outside() {
            assert!(!body_at(100.0, 100.0, 10.0).hit_test(Vec2::new(200.0, 200.0)));
        }
    }

    mod apply_drag {
        use super::*;

        #[test]
        fn ignored_when_not_dragging() {
            let mut body = body_at(10.0, 10.0, 10.0).with_velocity(Vec2::new(1.0, 2.0));
            body.apply_drag(Vec2::new(50.0, 50.0));
            assert_eq!(body.pos, Vec2::new(10.0, 10.0));
            assert_eq!(body.vel, Vec2::new(1.0, 2.0));
        }

        #[test]
        fn moves_and_stops_dragged_body() {
            let mut body = body_at(10.0, 10.0, 10.0).with_velocity(Vec2::new(1.0, 2.0));
            body.set_dragging(true);
            body.apply_drag(Vec2::new(50.0, 60.0));
            assert_eq!(body.pos, Vec2::new(50.0, 60.0));
            assert_eq!(body.vel, Vec2::ZERO);
        }
    }

    mod set_dragging {
        use super::*;

        #[test]
        fn zeroes_velocity_when_grabbed() {
            let mut body = body_at(10.0, 10.0, 10.0).with_velocity(Vec2::new(3.0, -4.0));
            body.set_dragging(true);
            assert!(body.is_dragging());
            assert_eq!(body.vel, Vec2::ZERO);
        }

        #[test]
        fn release_keeps_state() {
            let mut body = body_at(10.0, 10.0, 10.0);
            body.set_dragging(true);
            body.set_dragging(false);
            assert!(!body.is_dragging());
            assert_eq!(body.pos, Vec2::new(10.0, 10.0));
        }
    }

    mod step {
        use super::*;

        #[test]
        fn falls_under_gravity() {
            let mut body = body_at(400.0, 100.0, 10.0);
            body.step(bounds());
            assert!((body.vel.y - config::GRAVITY).abs() < EPS);
            assert!((body.pos.y - (100.0 + config::GRAVITY)).abs() < EPS);
        }

        #[test]
        fn radius_is_unchanged() {
            let mut body = body_at(795.0, 595.0, 12.5).with_velocity(Vec2::new(7.0, 9.0));
            for _ in 0..200 {
                body.step(bounds());
                assert_eq!(body.radius, 12.5);
            }
        }

        #[test]
        fn ground_bounce_loses_energy() {
            let mut body = body_at(400.0, 585.0, 10.0).with_velocity(Vec2::new(0.0, 5.0));
            let vy_before = 5.0 + config::GRAVITY;
            body.step(bounds());
            assert!(body.vel.y < 0.0);
            assert!((body.vel.y.abs() - vy_before * config::BOUNCE).abs() < EPS);
            assert!((body.bottom() - 600.0).abs() < EPS);
        }

        #[test]
        fn right_wall_bounce_damps_and_clamps() {
            let mut body = body_at(795.0, 100.0, 10.0).with_velocity(Vec2::new(3.0, 0.0));
            body.step(bounds());
            assert!((body.vel.x - (-3.0 * config::WALL_DAMP)).abs() < EPS);
            assert!(body.pos.x >= 10.0 && body.pos.x <= 790.0);
        }

        #[test]
        fn left_wall_bounce_damps_and_clamps() {
            let mut body = body_at(12.0, 100.0, 10.0).with_velocity(Vec2::new(-5.0, 0.0));
            body.step(bounds());
            assert!((body.vel.x - 5.0 * config::WALL_DAMP).abs() < EPS);
            assert!((body.pos.x - 10.0).abs() < EPS);
        }

        #[test]
        fn corner_hits_both_walls_in_one_step() {
            let mut body = body_at(795.0, 585.0, 10.0).with_velocity(Vec2::new(3.0, 5.0));
            body.step(bounds());
            assert!(body.vel.x < 0.0);
            assert!(body.vel.y < 0.0);
            assert!((body.pos.x - 790.0).abs() < EPS);
            assert!((body.bottom() - 600.0).abs() < EPS);
        }

        #[test]
        fn resting_body_is_unchanged() {
            let mut body = body_at(400.0, 590.0, 10.0);
            let before = body.clone();
            body.step(bounds());
            assert_eq!(body, before);
        }

        #[test]
        fn rest_snap_is_idempotent() {
            let mut body = body_at(400.0, 591.0, 10.0).with_velocity(Vec2::new(0.2, -0.3));
            body.step(bounds());
            assert_eq!(body.vel, Vec2::ZERO);
            assert!((body.bottom() - 600.0).abs() < EPS);
            let snapped = body.clone();
            for _ in 0..10 {
                body.step(bounds());
                assert_eq!(body, snapped);
            }
        }

        #[test]
        fn slow_but_sliding_body_keeps_integrating() {
            let mut body = body_at(400.0, 590.0, 10.0).with_velocity(Vec2::new(1.0, 0.0));
            body.step(bounds());
            assert!((body.pos.x - 401.0).abs() < EPS);
        }

        #[test]
        fn dragged_body_is_frozen() {
            let mut body = body_at(400.0, 100.0, 10.0);
            body.set_dragging(true);
            let before = body.clone();
            body.step(bounds());
            assert_eq!(body, before);
        }

        #[test]
        fn uses_per_body_gravity() {
            let mut body = body_at(400.0, 100.0, 10.0).with_physics(1.5, 0.5);
            body.step(bounds());
            assert!((body.vel.y - 1.5).abs() < EPS);
        }

        #[test]
        fn oversized_body_is_centered_horizontally() {
            let mut body = body_at(10.0, 100.0, 50.0).with_velocity(Vec2::new(-1.0, 0.0));
            body.step(Bounds::new(60.0, 600.0));
            assert_eq!(body.pos.x, 30.0);
        }
    }

    mod touches_ground {
        use super::*;

        #[test]
        fn above_floor_is_airborne() {
            assert!(!body_at(400.0, 580.0, 10.0).touches_ground(bounds()));
        }

        #[test]
        fn tolerance_covers_rounding_only() {
            let b = bounds();
            assert!(body_at(400.0, b.height - 10.0 - 1e-4, 10.0).touches_ground(b));
            assert!(!body_at(400.0, b.height - 10.0 - 0.01, 10.0).touches_ground(b));
        }

        #[test]
        fn on_or_below_floor_touches() {
            assert!(body_at(400.0, 590.0, 10.0).touches_ground(bounds()));
            assert!(body_at(400.0, 595.0, 10.0).touches_ground(bounds()));
        }
    }

    mod is_expired {
        use super::*;

        #[test]
        fn below_minimum_radius() {
            assert!(body_at(0.0, 0.0, 4.99).is_expired());
            assert!(!body_at(0.0, 0.0, config::MIN_RADIUS).is_expired());
        }
    }
}
