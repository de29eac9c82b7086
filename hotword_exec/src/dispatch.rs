//! Hotword dispatch
//!
//! Maps each detected hotword to an action on the virtual gamepad, and flashes ROB's LED so the
//! player can see the command was heard.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use embedded_hal::blocking::delay::DelayMs;
use log::{debug, info, warn};
use thiserror::Error;

use eqpt_if::eqpt::{
    servo::{ServoChannel, ServoDriver, ServoError},
    vpad::{PadAction, VirtualPad, VirtualPadError},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A hotword and the action it triggers.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    /// Name of the hotword's template
    pub model: String,

    pub action: PadAction,
}

/// Drives ROB's LED on one channel of the servo board.
pub struct LedFlasher {
    servos: Box<dyn ServoDriver>,
    delay: Box<dyn DelayMs<u16>>,
    channel: ServoChannel,
    on_pulse: u16,
    step_ms: u16,
}

pub struct Dispatcher {
    bindings: Vec<Binding>,
    vpad: Box<dyn VirtualPad>,
    led: LedFlasher,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Virtual pad error: {0}")]
    VirtualPad(#[from] VirtualPadError),

    #[error("LED error: {0}")]
    Led(#[from] ServoError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LedFlasher {
    pub fn new(
        servos: Box<dyn ServoDriver>,
        delay: Box<dyn DelayMs<u16>>,
        channel: ServoChannel,
        on_pulse: u16,
        step_ms: u16,
    ) -> Self {
        Self { servos, delay, channel, on_pulse, step_ms }
    }

    /// Set the PWM frequency of the board the LED is on.
    pub fn set_pwm_freq(&mut self, freq_hz: f64) -> Result<(), ServoError> {
        self.servos.set_pwm_freq(freq_hz)
    }

    /// Switch the LED on.
    pub fn on(&mut self) -> Result<(), ServoError> {
        self.servos.set_pulse(self.channel, self.on_pulse)
    }

    /// Switch the LED off.
    pub fn off(&mut self) -> Result<(), ServoError> {
        self.servos.set_pulse(self.channel, 0)
    }

    /// Blink the LED twice, leaving it on.
    ///
    /// The sequence is off, on, off, on with one step between each, blocking for three steps.
    pub fn flash(&mut self) -> Result<(), ServoError> {
        self.off()?;
        self.delay.delay_ms(self.step_ms);
        self.on()?;
        self.delay.delay_ms(self.step_ms);
        self.off()?;
        self.delay.delay_ms(self.step_ms);
        self.on()
    }
}

impl Dispatcher {
    /// Build the dispatch table. Binding `i` is triggered by detection index `i`.
    pub fn new(bindings: Vec<Binding>, vpad: Box<dyn VirtualPad>, led: LedFlasher) -> Self {
        for (i, b) in bindings.iter().enumerate() {
            debug!("Hotword {} ({}) -> {:?}", i, b.model, b.action);
        }

        Self { bindings, vpad, led }
    }

    /// Put the outputs in their idle state: stick centred, PWM running and the LED on.
    pub fn startup(&mut self, pwm_freq_hz: f64) -> Result<(), DispatchError> {
        self.vpad.centre_stick()?;
        self.led.set_pwm_freq(pwm_freq_hz)?;
        self.led.on()?;

        Ok(())
    }

    /// Perform the action bound to a detected hotword, then flash the LED.
    ///
    /// Returns the action performed, or `None` if the index has no binding. Failures are logged.
    pub fn dispatch(&mut self, index: usize) -> Option<PadAction> {
        let binding = match self.bindings.get(index) {
            Some(b) => b,
            None => {
                warn!("No action bound to hotword {}", index);
                return None
            }
        };

        info!("{} -> {:?}", binding.model, binding.action);

        if let Err(e) = binding.action.apply(self.vpad.as_mut()) {
            warn!("Could not apply {:?}: {}", binding.action, e);
        }

        if let Err(e) = self.led.flash() {
            warn!("Could not flash the LED: {}", e);
        }

        Some(binding.action)
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) fn test_dispatcher(journal: &eqpt_if::sim::Journal) -> Dispatcher {
    use eqpt_if::{eqpt::vpad::VButton, sim::*};

    let bindings = vec![
        Binding { model: "rob_press_a".into(), action: PadAction::Press(VButton::A) },
        Binding { model: "rob_press_b".into(), action: PadAction::Press(VButton::B) },
        Binding { model: "rob_release_a".into(), action: PadAction::Release(VButton::A) },
        Binding { model: "rob_release_b".into(), action: PadAction::Release(VButton::B) },
    ];

    let led = LedFlasher::new(
        Box::new(SimServoDriver::new(journal)),
        Box::new(SimDelay::new(journal)),
        ServoChannel::new(4).unwrap(),
        4000,
        100,
    );

    Dispatcher::new(bindings, Box::new(SimVirtualPad::new(journal)), led)
}

#[cfg(test)]
mod test {
    use super::*;
    use eqpt_if::{eqpt::vpad::VButton, sim::*};

    fn flash_events() -> Vec<SimEvent> {
        vec![
            SimEvent::Pulse { channel: 4, pulse: 0 },
            SimEvent::DelayMs(100),
            SimEvent::Pulse { channel: 4, pulse: 4000 },
            SimEvent::DelayMs(100),
            SimEvent::Pulse { channel: 4, pulse: 0 },
            SimEvent::DelayMs(100),
            SimEvent::Pulse { channel: 4, pulse: 4000 },
        ]
    }

    #[test]
    fn test_startup() {
        let journal = Journal::new();
        let mut d = test_dispatcher(&journal);

        d.startup(60.0).unwrap();

        assert_eq!(journal.events(), vec![
            SimEvent::Stick { x: 128, y: 128 },
            SimEvent::PwmFreq(60.0),
            SimEvent::Pulse { channel: 4, pulse: 4000 },
        ]);
    }

    #[test]
    fn test_each_hotword_one_action_then_flash() {
        let expected = [
            (VButton::A, true),
            (VButton::B, true),
            (VButton::A, false),
            (VButton::B, false),
        ];

        for (i, (button, pressed)) in expected.iter().enumerate() {
            let journal = Journal::new();
            let mut d = test_dispatcher(&journal);
            d.startup(60.0).unwrap();
            journal.clear();

            assert!(d.dispatch(i).is_some());

            let mut events = vec![SimEvent::Button { button: *button, pressed: *pressed }];
            events.extend(flash_events());
            assert_eq!(journal.events(), events);

            // LED reads on, off, on, off, on over 300 ms
            assert_eq!(journal.pulses(4), vec![0, 4000, 0, 4000]);
            let delay: u16 = journal.events()
                .iter()
                .filter_map(|e| match e {
                    SimEvent::DelayMs(ms) => Some(*ms),
                    _ => None
                })
                .sum();
            assert_eq!(delay, 300);
        }
    }

    #[test]
    fn test_unknown_index_ignored() {
        let journal = Journal::new();
        let mut d = test_dispatcher(&journal);

        assert_eq!(d.dispatch(4), None);
        assert!(journal.events().is_empty());
    }

    #[test]
    fn test_led_failure_logged() {
        let journal = Journal::new();
        let mut servos = SimServoDriver::new(&journal);
        servos.fail_next(1);

        let led = LedFlasher::new(
            Box::new(servos),
            Box::new(SimDelay::new(&journal)),
            ServoChannel::new(4).unwrap(),
            4000,
            100,
        );
        let mut d = Dispatcher::new(
            vec![Binding { model: "rob_press_a".into(), action: PadAction::Press(VButton::A) }],
            Box::new(SimVirtualPad::new(&journal)),
            led,
        );

        // The button is still pressed even though the flash fails part way
        assert_eq!(d.dispatch(0), Some(PadAction::Press(VButton::A)));
        assert_eq!(journal.events()[0], SimEvent::Button { button: VButton::A, pressed: true });
    }
}
