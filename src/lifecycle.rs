//! Connection debounce and the global detection cooldown.

use log::{debug, trace};

use crate::config::TimingConfig;
use crate::timers::{Scheduler, TimerToken};
use crate::tracker::NUM_CONTROLLERS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    Connection { controller: usize, connected: bool },
    CooldownElapsed,
    PolyTapTimeout,
}

#[derive(Debug)]
pub struct Lifecycle {
    scheduler: Scheduler<Deferred>,
    /// Latest connection state requested by the host, per controller.
    intents: [bool; NUM_CONTROLLERS],
    pending: [Option<TimerToken>; NUM_CONTROLLERS],
    cooldown: Option<TimerToken>,
    paused: bool,
    timing: TimingConfig,
}

impl Lifecycle {
    pub fn new(timing: TimingConfig) -> Self {
        Self {
            scheduler: Scheduler::new(),
            intents: [false; NUM_CONTROLLERS],
            pending: [None; NUM_CONTROLLERS],
            cooldown: None,
            paused: false,
            timing,
        }
    }

    /// Record a raw connect/disconnect from the input API. `applied` is the
    /// channel's current debounced state. A request contradicting a pending
    /// one cancels it; a request matching `applied` schedules nothing.
    pub fn request_connection(
        &mut self,
        controller: usize,
        connected: bool,
        applied: bool,
        now_ms: f64,
    ) {
        self.intents[controller] = connected;
        if let Some(token) = self.pending[controller].take() {
            if self.scheduler.cancel(token) {
                trace!("controller {controller}: pending debounce cancelled");
            }
        }
        if connected != applied {
            let due = now_ms + self.timing.connect_debounce_ms;
            self.pending[controller] =
                Some(self.scheduler.schedule(due, Deferred::Connection { controller, connected }));
        }
    }

    /// Suppress detection for `detect_delay_ms` from `now_ms`, superseding
    /// any cooldown already running.
    pub fn delay_detect_until(&mut self, now_ms: f64) {
        if let Some(token) = self.cooldown.take() {
            self.scheduler.cancel(token);
        }
        self.paused = true;
        let until = now_ms + self.timing.detect_delay_ms;
        self.cooldown = Some(self.scheduler.schedule(until, Deferred::CooldownElapsed));
        debug!("detection paused until {until:.1} ms");
    }

    pub fn is_detection_paused(&self) -> bool {
        self.paused
    }

    pub fn schedule(&mut self, due_ms: f64, action: Deferred) -> TimerToken {
        self.scheduler.schedule(due_ms, action)
    }

    pub fn cancel(&mut self, token: TimerToken) -> bool {
        self.scheduler.cancel(token)
    }

    /// Drain due timers. Cooldown expiry is handled here; connection changes
    /// whose intent no longer matches are dropped. The rest go to the caller.
    pub fn take_due(&mut self, now_ms: f64) -> Vec<Deferred> {
        let mut out = Vec::new();
        for (token, action) in self.scheduler.take_due(now_ms) {
            match action {
                Deferred::CooldownElapsed => {
                    if self.cooldown == Some(token) {
                        self.cooldown = None;
                        self.paused = false;
                        debug!("detection resumed at {now_ms:.1} ms");
                    }
                }
                Deferred::Connection {
                    controller,
                    connected,
                } => {
                    if self.pending[controller] == Some(token) {
                        self.pending[controller] = None;
                    }
                    if self.intents[controller] == connected {
                        out.push(action);
                    } else {
                        trace!("controller {controller}: stale debounce dropped");
                    }
                }
                Deferred::PolyTapTimeout => out.push(action),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle() -> Lifecycle {
        Lifecycle::new(TimingConfig {
            connect_debounce_ms: 20.0,
            detect_delay_ms: 100.0,
        })
    }

    #[test]
    fn test_connection_applies_after_debounce() {
        let mut lc = lifecycle();
        lc.request_connection(0, true, false, 0.0);
        assert!(lc.take_due(19.0).is_empty());
        assert_eq!(
            lc.take_due(20.0),
            vec![Deferred::Connection {
                controller: 0,
                connected: true
            }]
        );
    }

    #[test]
    fn test_bounce_cancels_pending_change() {
        let mut lc = lifecycle();
        // connected and applied; a quick disconnect/reconnect must not apply
        lc.request_connection(1, false, true, 100.0);
        lc.request_connection(1, true, true, 105.0);
        assert!(lc.take_due(200.0).is_empty());
    }

    #[test]
    fn test_cooldown_pauses_and_resumes() {
        let mut lc = lifecycle();
        assert!(!lc.is_detection_paused());
        lc.delay_detect_until(50.0);
        assert!(lc.is_detection_paused());
        lc.take_due(149.0);
        assert!(lc.is_detection_paused());
        assert!(lc.take_due(150.0).is_empty());
        assert!(!lc.is_detection_paused());
    }

    #[test]
    fn test_new_cooldown_supersedes_old() {
        let mut lc = lifecycle();
        lc.delay_detect_until(0.0);
        lc.delay_detect_until(80.0);
        lc.take_due(120.0);
        assert!(lc.is_detection_paused());
        lc.take_due(180.0);
        assert!(!lc.is_detection_paused());
    }

    #[test]
    fn test_polytap_timer_passes_through() {
        let mut lc = lifecycle();
        let token = lc.schedule(30.0, Deferred::PolyTapTimeout);
        assert_eq!(lc.take_due(30.0), vec![Deferred::PolyTapTimeout]);
        assert!(!lc.cancel(token));
    }
}
