use rand::Rng;

use crate::{
    body::Body,
    config,
    types::{Bounds, Rgb, Vec2},
};

/// Decides whether a grounded body splits into a pair of smaller children.
#[derive(Clone, Copy, Debug)]
pub struct SpawnPolicy {
    pub cap: usize,
}

impl SpawnPolicy {
    pub fn new(cap: usize) -> Self {
        Self { cap }
    }

    pub fn allows(&self, population: usize, infinite: bool) -> bool {
        infinite || population < self.cap
    }

    /// Returns the two children of `parent` when it is on the ground and the cap allows it.
    /// Knows nothing about the minimum radius; expired children are culled by the caller.
    pub fn try_spawn<R: Rng>(
        &self,
        parent: &Body,
        bounds: Bounds,
        population: usize,
        infinite: bool,
        rng: &mut R,
    ) -> Option<[Body; 2]> {
        if !parent.touches_ground(bounds) || !self.allows(population, infinite) {
            return None;
        }
        let radius = parent.radius * config::CHILD_SCALE;
        let vy = parent.vel.y * parent.bounce;
        let child = |side: f32, rng: &mut R| {
            Body::new(
                Vec2::new(parent.pos.x + side * config::CHILD_OFFSET_X, parent.pos.y),
                radius,
                random_color(rng),
            )
            .with_velocity(Vec2::new(side * config::CHILD_SPEED_X, vy))
            .with_physics(parent.gravity, parent.bounce)
        };
        Some([child(-1.0, &mut *rng), child(1.0, &mut *rng)])
    }
}

pub fn random_color<R: Rng>(rng: &mut R) -> Rgb {
    Rgb::from_hsl(rng.gen_range(0.0..360.0), 0.7, 0.6)
}
