//! Simulation clock: conditionally advances the game by speed and pause
//! state.
//!
//! The host calls [`SimulationClock::conditionally_advance`] every refresh
//! with the elapsed wall time; the clock fires the tick callback at the
//! configured interval while unpaused and the update callback on every
//! call. Time is injected rather than read here so the core stays free of
//! host-clock dependencies.

use std::time::Duration;

pub type TickFn<'a> = Box<dyn FnMut() + 'a>;
pub type UpdateFn<'a> = Box<dyn FnMut() + 'a>;

/// Milliseconds between ticks, in increasing speed order.
pub const SPEED_INTERVALS_MS: [u64; 5] = [3000, 2000, 1000, 100, 1];

pub const MIN_SPEED: u8 = 0;
pub const MAX_SPEED: u8 = (SPEED_INTERVALS_MS.len() - 1) as u8;

pub struct SimulationClock<'a> {
    tick_function: TickFn<'a>,
    update_function: UpdateFn<'a>,
    current_speed: u8,
    paused: bool,
    since_last_tick: Duration,
}

impl<'a> SimulationClock<'a> {
    pub fn new(tick_function: TickFn<'a>, update_function: UpdateFn<'a>) -> Self {
        Self {
            tick_function,
            update_function,
            current_speed: MIN_SPEED,
            paused: true,
            since_last_tick: Duration::ZERO,
        }
    }

    pub fn simulation_speed(&self) -> u8 {
        self.current_speed
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn toggle_paused(&mut self) {
        self.paused = !self.paused;
    }

    pub fn set_simulation_speed(&mut self, speed: u8) {
        self.current_speed = speed.clamp(MIN_SPEED, MAX_SPEED);
    }

    pub fn increase_simulation_speed(&mut self) {
        self.set_simulation_speed(self.current_speed.saturating_add(1));
    }

    pub fn decrease_simulation_speed(&mut self) {
        self.set_simulation_speed(self.current_speed.saturating_sub(1));
    }

    pub fn can_increase_simulation_speed(&self) -> bool {
        self.current_speed < MAX_SPEED
    }

    pub fn can_decrease_simulation_speed(&self) -> bool {
        self.current_speed > MIN_SPEED
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(SPEED_INTERVALS_MS[self.current_speed as usize])
    }

    /// Advance by the elapsed wall time: fire at most one tick when due
    /// and unpaused, then always refresh.
    pub fn conditionally_advance(&mut self, elapsed: Duration) {
        if !self.paused {
            self.since_last_tick += elapsed;
            if self.since_last_tick >= self.tick_interval() {
                self.since_last_tick = Duration::ZERO;
                (self.tick_function)();
            }
        }
        (self.update_function)();
    }

    /// Fire one tick immediately, ignoring speed and pause.
    pub fn force_advance(&mut self) {
        (self.tick_function)();
        (self.update_function)();
    }

    pub fn reset(&mut self) {
        self.paused = true;
        self.current_speed = MIN_SPEED;
        self.since_last_tick = Duration::ZERO;
    }
}
