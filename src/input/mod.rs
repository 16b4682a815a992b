use crate::{core::Population, types::Vec2};

/// Logical pointer events. Mouse and touch both map onto these.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Start(Vec2),
    Move(Vec2),
    End,
}

/// Turns pointer events into drag-state changes on the population.
#[derive(Clone, Copy, Debug, Default)]
pub struct Selection {
    select_all: bool,
}

impl Selection {
    pub fn select_all(&self) -> bool {
        self.select_all
    }

    /// Turning select-all on grabs every body alive right now. Turning it off
    /// leaves drag state alone until the next pointer end.
    pub fn toggle_select_all(&mut self, population: &mut Population) -> bool {
        self.select_all = !self.select_all;
        if self.select_all {
            for (_, body) in population.iter_mut() {
                body.set_dragging(true);
            }
        }
        tracing::info!(
            select_all = self.select_all,
            grabbed = population.stats().dragged,
            "select-all toggled"
        );
        self.select_all
    }

    pub fn handle(&mut self, event: PointerEvent, population: &mut Population) {
        match event {
            PointerEvent::Start(point) => self.start(point, population),
            PointerEvent::Move(point) => self.drag_to(point, population),
            PointerEvent::End => self.end(population),
        }
    }

    fn start(&self, point: Vec2, population: &mut Population) {
        if self.select_all {
            return;
        }
        for (_, body) in population.iter_mut() {
            let hit = body.hit_test(point);
            body.set_dragging(hit);
        }
    }

    fn drag_to(&self, point: Vec2, population: &mut Population) {
        if !self.select_all && !population.any_dragging() {
            return;
        }
        for (_, body) in population.iter_mut() {
            body.apply_drag(point);
        }
    }

    fn end(&self, population: &mut Population) {
        if self.select_all {
            return;
        }
        for (_, body) in population.iter_mut() {
            body.set_dragging(false);
        }
    }
}
