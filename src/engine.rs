//! One input session: owns every channel, the pair aggregate, the detector
//! bank and the event bus, and runs them in order once per host frame.

use log::{info, trace, warn};

use crate::config::{Profile, validate_profile};
use crate::error::{EngineError, ListenerError, UnknownGesture};
use crate::events::{EventBus, GestureEvent};
use crate::gestures::{DetectorBank, Frame, GestureKind, GestureState};
use crate::lifecycle::{Deferred, Lifecycle};
use crate::pair::PairState;
use crate::provider::{PoseProvider, to_plane_mm};
use crate::tracker::{Channel, IDLE, NUM_CHANNELS, NUM_CONTROLLERS, PAIR};

#[derive(Debug)]
pub struct GestureEngine<P: PoseProvider> {
    channels: [Channel; NUM_CHANNELS],
    pair: PairState,
    bank: DetectorBank,
    lifecycle: Lifecycle,
    bus: EventBus,
    /// Connection count seen by the previous tick.
    last_connected: usize,
    /// Controllers whose disconnect was applied during the current tick.
    released: Vec<usize>,
    provider: P,
    profile: Profile,
}

impl<P: PoseProvider> GestureEngine<P> {
    pub fn new(provider: P, profile: Profile) -> Result<Self, EngineError> {
        validate_profile(&profile)?;
        let screen = provider.screen_size_mm();
        if !screen.is_finite() || screen.x <= 0.0 || screen.y <= 0.0 {
            return Err(EngineError::InvalidProvider {
                width: screen.x,
                height: screen.y,
            });
        }
        let past = profile.sampler.past_length;
        Ok(Self {
            channels: std::array::from_fn(|_| Channel::new(past)),
            pair: PairState::new(past),
            bank: DetectorBank::new(),
            lifecycle: Lifecycle::new(profile.timing.clone()),
            bus: EventBus::new(),
            last_connected: 0,
            released: Vec::new(),
            provider,
            profile,
        })
    }

    pub fn on<F>(&mut self, kind: GestureKind, listener: F)
    where
        F: FnMut(&GestureEvent) -> Result<(), ListenerError> + 'static,
    {
        self.bus.on(kind, listener);
    }

    pub fn on_named<F>(&mut self, name: &str, listener: F) -> Result<(), UnknownGesture>
    where
        F: FnMut(&GestureEvent) -> Result<(), ListenerError> + 'static,
    {
        self.bus.on_named(name, listener)
    }

    /// Raw connect from the input API; applied after the debounce delay.
    pub fn controller_connected(
        &mut self,
        controller: usize,
        now_ms: f64,
    ) -> Result<(), EngineError> {
        self.request(controller, true, now_ms)
    }

    /// Raw disconnect from the input API; applied after the debounce delay.
    pub fn controller_disconnected(
        &mut self,
        controller: usize,
        now_ms: f64,
    ) -> Result<(), EngineError> {
        self.request(controller, false, now_ms)
    }

    fn request(
        &mut self,
        controller: usize,
        connected: bool,
        now_ms: f64,
    ) -> Result<(), EngineError> {
        if controller >= NUM_CONTROLLERS {
            warn!("ignoring connection change for unknown controller {controller}");
            return Err(EngineError::UnknownController(controller));
        }
        let applied = self.channels[controller].connected;
        self.lifecycle
            .request_connection(controller, connected, applied, now_ms);
        Ok(())
    }

    /// Run one tick at host time `now_ms`. Returns the events published this
    /// tick. A failing listener aborts publishing; the tick's state changes
    /// are kept.
    pub fn update(&mut self, now_ms: f64) -> Result<Vec<GestureEvent>, EngineError> {
        self.bank.advance();
        self.released.clear();

        let mut events = Vec::new();
        for action in self.lifecycle.take_due(now_ms) {
            match action {
                Deferred::Connection {
                    controller,
                    connected,
                } => self.apply_connection(controller, connected, now_ms),
                Deferred::PolyTapTimeout => {
                    let session_ms = self.session_ms(now_ms);
                    events.extend(
                        self.bank
                            .polytap_timeout(now_ms, session_ms, &mut self.lifecycle),
                    );
                }
                Deferred::CooldownElapsed => {}
            }
        }

        self.sample(now_ms);

        let connected = self.num_connected();
        self.bank.clear_latches(connected);

        if !self.lifecycle.is_detection_paused() {
            let frame = Frame {
                now_ms,
                session_ms: self.session_ms(now_ms),
                connected,
                prev_connected: self.last_connected,
                released: &self.released,
                channels: &self.channels,
                pair: &self.pair,
                sampler: &self.profile.sampler,
            };
            events.extend(
                self.bank
                    .poll(&frame, &self.profile.thresholds, &mut self.lifecycle),
            );
        }
        self.last_connected = connected;

        for event in &events {
            self.bus.emit(event)?;
        }
        Ok(events)
    }

    fn apply_connection(&mut self, controller: usize, connected: bool, now_ms: f64) {
        if self.channels[controller].connected == connected {
            return;
        }
        let before = self.num_connected();
        if connected {
            self.channels[controller].start(now_ms);
            info!("controller {controller} connected at {now_ms:.1} ms");
        } else {
            self.channels[controller].stop(now_ms);
            self.released.push(controller);
            info!("controller {controller} disconnected at {now_ms:.1} ms");
        }
        match (before, self.num_connected()) {
            (0, 1) => self.channels[IDLE].start(now_ms),
            (1, 0) => self.channels[IDLE].stop(now_ms),
            (1, 2) => {
                self.channels[PAIR].start(now_ms);
                self.pair.reset();
            }
            (2, 1) => {
                self.channels[PAIR].stop(now_ms);
                // the remaining hand starts over from where it is now
                let rest = (0..NUM_CONTROLLERS).find(|&c| self.channels[c].connected);
                if let Some(rest) = rest {
                    self.channels[rest].start(now_ms);
                }
            }
            _ => {}
        }
    }

    /// Pull poses for connected controllers, then the pair aggregate and its
    /// midpoint channel while both are connected.
    fn sample(&mut self, now_ms: f64) {
        let screen = self.provider.screen_size_mm();
        let sampler = &self.profile.sampler;
        for (c, channel) in self.channels.iter_mut().take(NUM_CONTROLLERS).enumerate() {
            if !channel.connected {
                continue;
            }
            match self.provider.controller_pose(c) {
                Some(pose) => channel.sample(
                    to_plane_mm(pose.projected, screen),
                    pose.world,
                    now_ms,
                    sampler,
                ),
                None => trace!("controller {c}: no pose at {now_ms:.1} ms"),
            }
        }

        if self.num_connected() < NUM_CONTROLLERS {
            return;
        }
        let (first, second) = self.connection_order();
        let (Some(a), Some(b)) = (
            self.channels[first].latest_smoothed(),
            self.channels[second].latest_smoothed(),
        ) else {
            return;
        };
        self.pair.update(a, b, now_ms, sampler);
        let raw = (self.channels[first].raw_position + self.channels[second].raw_position) * 0.5;
        self.channels[PAIR].sample((a + b) * 0.5, raw, now_ms, sampler);
    }

    /// Controllers ordered by connection time; ties keep index order.
    fn connection_order(&self) -> (usize, usize) {
        match (
            self.channels[0].clock.started_at(),
            self.channels[1].clock.started_at(),
        ) {
            (Some(a), Some(b)) if b < a => (1, 0),
            _ => (0, 1),
        }
    }

    fn session_ms(&self, now_ms: f64) -> f64 {
        self.channels[IDLE].elapsed_ms(now_ms)
    }

    /// Debounced number of connected controllers.
    pub fn num_connected(&self) -> usize {
        self.channels[..NUM_CONTROLLERS]
            .iter()
            .filter(|c| c.connected)
            .count()
    }

    pub fn channel(&self, index: usize) -> Option<&Channel> {
        self.channels.get(index)
    }

    pub fn pair(&self) -> &PairState {
        &self.pair
    }

    pub fn gesture(&self, kind: GestureKind) -> &GestureState {
        self.bank.state(kind)
    }

    pub fn gestures(&self) -> impl Iterator<Item = &GestureState> {
        self.bank.states()
    }

    /// Exclusive gesture currently holding the token.
    pub fn active_gesture(&self) -> Option<GestureKind> {
        self.bank.active()
    }

    pub fn is_detection_paused(&self) -> bool {
        self.lifecycle.is_detection_paused()
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }
}
