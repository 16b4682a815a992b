use std::time::{Duration, Instant};

use rand::{SeedableRng, rngs::StdRng};
use slotmap::{SlotMap, new_key_type};

use crate::{
    audio::ImpactCue,
    body::Body,
    config::{self, PhysicsSettings, Settings},
    render::Surface,
    spawn::{SpawnPolicy, random_color},
    types::{Bounds, Vec2},
};

new_key_type! {
    pub struct BodyKey;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub ground_contacts: usize,
    pub spawned: usize,
    pub culled: usize,
    pub cue_fired: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PopulationStats {
    pub live: usize,
    pub dragged: usize,
    pub spawned_total: u64,
    pub culled_total: u64,
    pub frames: u64,
}

/// Sole owner of the live bodies.
///
/// Not thread-safe: the frame tick and pointer handling must run on the same thread,
/// never interleaved within a call.
pub struct Population {
    bodies: SlotMap<BodyKey, Body>,
    pending: Vec<Body>,
    policy: SpawnPolicy,
    physics: PhysicsSettings,
    rng: StdRng,
    last_impact_cue: Option<Instant>,
    cap_reached: bool,
    spawned_total: u64,
    culled_total: u64,
    frames: u64,
}

impl Population {
    pub fn new(settings: &Settings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    pub fn with_rng(settings: &Settings, rng: StdRng) -> Self {
        let cap = settings.population.spawn_cap;
        Self {
            // the cap may be huge; the map grows on demand past the default
            bodies: SlotMap::with_capacity_and_key(cap.min(config::SPAWN_CAP)),
            pending: Vec::new(),
            policy: SpawnPolicy::new(cap),
            physics: settings.physics,
            rng,
            last_impact_cue: None,
            cap_reached: false,
            spawned_total: 0,
            culled_total: 0,
            frames: 0,
        }
    }

    /// Drops every body and seeds a single one at the top center of `bounds`.
    pub fn reset(&mut self, bounds: Bounds) -> BodyKey {
        self.clear();
        let seed = Body::new(
            Vec2::new(bounds.width / 2.0, config::SEED_Y),
            config::SEED_RADIUS,
            random_color(&mut self.rng),
        )
        .with_physics(self.physics.gravity, self.physics.bounce);
        self.insert(seed)
    }

    pub fn clear(&mut self) {
        self.bodies.clear();
        self.pending.clear();
        self.last_impact_cue = None;
        self.cap_reached = false;
        self.spawned_total = 0;
        self.culled_total = 0;
        self.frames = 0;
    }

    pub fn insert(&mut self, body: Body) -> BodyKey {
        self.bodies.insert(body)
    }

    #[cfg(test)]
    pub fn get(&self, key: BodyKey) -> Option<&Body> {
        self.bodies.get(key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (BodyKey, &Body)> {
        self.bodies.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyKey, &mut Body)> {
        self.bodies.iter_mut()
    }

    pub fn any_dragging(&self) -> bool {
        self.bodies.values().any(Body::is_dragging)
    }

    pub fn stats(&self) -> PopulationStats {
        PopulationStats {
            live: self.bodies.len(),
            dragged: self.bodies.values().filter(|b| b.is_dragging()).count(),
            spawned_total: self.spawned_total,
            culled_total: self.culled_total,
            frames: self.frames,
        }
    }

    /// Advances one frame: step and draw, spawn on ground contact, append, cull, impact cue.
    /// Bodies spawned here are first drawn on the next tick.
    pub fn tick(
        &mut self,
        surface: &mut dyn Surface,
        cue: &mut dyn ImpactCue,
        now: Instant,
        infinite: bool,
    ) -> TickReport {
        let bounds = surface.bounds();
        let mut report = TickReport::default();

        for body in self.bodies.values_mut() {
            body.step(bounds);
            body.draw(surface);
        }

        self.pending.clear();
        for body in self.bodies.values() {
            if !body.touches_ground(bounds) {
                continue;
            }
            report.ground_contacts += 1;
            let population = self.bodies.len() + self.pending.len();
            if let Some(children) =
                self.policy
                    .try_spawn(body, bounds, population, infinite, &mut self.rng)
            {
                self.pending.extend(children);
            }
        }
        self.track_cap(report.ground_contacts, infinite);

        report.spawned = self.pending.len();
        for child in self.pending.drain(..) {
            self.bodies.insert(child);
        }

        let before = self.bodies.len();
        self.bodies.retain(|_, body| !body.is_expired());
        report.culled = before - self.bodies.len();

        if report.ground_contacts > 0 && self.impact_cue_ready(now) {
            cue.play();
            self.last_impact_cue = Some(now);
            report.cue_fired = true;
        }

        self.spawned_total += report.spawned as u64;
        self.culled_total += report.culled as u64;
        self.frames += 1;
        if report.spawned > 0 || report.culled > 0 {
            tracing::trace!(
                frame = self.frames,
                spawned = report.spawned,
                culled = report.culled,
                live = self.bodies.len(),
                "population changed"
            );
        }
        report
    }

    fn impact_cue_ready(&self, now: Instant) -> bool {
        let cooldown = Duration::from_millis(config::IMPACT_CUE_COOLDOWN_MS);
        self.last_impact_cue
            .is_none_or(|last| now.saturating_duration_since(last) >= cooldown)
    }

    fn track_cap(&mut self, ground_contacts: usize, infinite: bool) {
        let blocked = ground_contacts > 0 && !self.policy.allows(self.bodies.len(), infinite);
        if blocked && !self.cap_reached {
            tracing::debug!(cap = self.policy.cap, "spawn cap reached");
        }
        self.cap_reached = blocked;
    }
}
