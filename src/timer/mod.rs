//! Logical countdown timers for round phases and player turns.
//!
//! The scheduler never touches a clock: the driver feeds it elapsed time
//! through [`TimerScheduler::advance`], which is what makes a timeout and a
//! voluntary action indistinguishable to the engine. Timers are keyed by
//! name; starting a timer under an existing name cancels and replaces the
//! old one, which is exactly what happens when a new player becomes next
//! to act.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::game::entities::PlayerId;
use crate::game::states::Phase;

/// A single named countdown.
#[derive(Clone, Debug, PartialEq)]
pub struct Timer {
    pub name: String,
    pub duration: Duration,
    pub remaining: Duration,
    pub phase: Option<Phase>,
    pub player: Option<PlayerId>,
    /// How long before expiry the warning fires, if any.
    pub warning_lead: Option<Duration>,
    warning_fired: bool,
    paused: bool,
}

impl Timer {
    #[must_use]
    pub fn new(name: &str, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            duration,
            remaining: duration,
            phase: None,
            player: None,
            warning_lead: None,
            warning_fired: false,
            paused: false,
        }
    }

    #[must_use]
    pub fn for_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    #[must_use]
    pub fn for_player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    #[must_use]
    pub fn with_warning(mut self, lead: Duration) -> Self {
        self.warning_lead = Some(lead);
        self
    }
}

/// What a scheduler tick produced, in deterministic (name) order.
#[derive(Clone, Debug, PartialEq)]
pub enum TimerFire {
    /// Fired once per timer, `warning_lead` before expiry.
    Warning {
        name: String,
        remaining: Duration,
        phase: Option<Phase>,
        player: Option<PlayerId>,
    },
    /// Fired exactly once; the timer removes itself.
    Expired {
        name: String,
        phase: Option<Phase>,
        player: Option<PlayerId>,
    },
}

/// Holds every outstanding timer for one table.
#[derive(Debug, Default)]
pub struct TimerScheduler {
    timers: BTreeMap<String, Timer>,
}

impl TimerScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer. An existing timer with the same name is cancelled and
    /// replaced; its pending warning/expiry will never fire.
    pub fn start(&mut self, timer: Timer) {
        self.timers.insert(timer.name.clone(), timer);
    }

    /// Cancel a timer. Returns whether one was actually armed.
    pub fn stop(&mut self, name: &str) -> bool {
        self.timers.remove(name).is_some()
    }

    /// Freeze a timer, capturing its remaining time.
    pub fn pause(&mut self, name: &str) -> bool {
        match self.timers.get_mut(name) {
            Some(timer) => {
                timer.paused = true;
                true
            }
            None => false,
        }
    }

    /// Re-arm a paused timer with its captured remaining time.
    pub fn resume(&mut self, name: &str) -> bool {
        match self.timers.get_mut(name) {
            Some(timer) => {
                timer.paused = false;
                true
            }
            None => false,
        }
    }

    pub fn pause_all(&mut self) {
        for timer in self.timers.values_mut() {
            timer.paused = true;
        }
    }

    pub fn resume_all(&mut self) {
        for timer in self.timers.values_mut() {
            timer.paused = false;
        }
    }

    /// Teardown guarantee: a closed table leaves no timer behind.
    pub fn stop_all(&mut self) {
        self.timers.clear();
    }

    #[must_use]
    pub fn remaining(&self, name: &str) -> Option<Duration> {
        self.timers.get(name).map(|t| t.remaining)
    }

    #[must_use]
    pub fn is_running(&self, name: &str) -> bool {
        self.timers.get(name).is_some_and(|t| !t.paused)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Let `delta` logical time pass for every running timer. Expired
    /// timers fire exactly once and remove themselves; warnings fire at
    /// most once per timer once remaining time drops to the lead.
    pub fn advance(&mut self, delta: Duration) -> Vec<TimerFire> {
        let mut fires = Vec::new();
        let mut expired = Vec::new();

        for (name, timer) in self.timers.iter_mut() {
            if timer.paused {
                continue;
            }
            timer.remaining = timer.remaining.saturating_sub(delta);

            if timer.remaining.is_zero() {
                fires.push(TimerFire::Expired {
                    name: name.clone(),
                    phase: timer.phase,
                    player: timer.player.clone(),
                });
                expired.push(name.clone());
                continue;
            }

            if let Some(lead) = timer.warning_lead
                && !timer.warning_fired
                && timer.remaining <= lead
            {
                timer.warning_fired = true;
                fires.push(TimerFire::Warning {
                    name: name.clone(),
                    remaining: timer.remaining,
                    phase: timer.phase,
                    player: timer.player.clone(),
                });
            }
        }

        for name in expired {
            self.timers.remove(&name);
        }
        fires
    }
}
