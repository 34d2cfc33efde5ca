//! Interrupt handlers
//!
//! A handler is anything implementing [`InterruptHandler`], closures included. [`ToggleIsr`] is
//! the handler both blink applications use: flip a pin, then acknowledge.

use crate::hw_traits::pie::PieRegs;
use crate::pie::{PieAck, Vector};
use embedded_hal::digital::StatefulOutputPin;

/// Routine run when its vector is delivered. Runs with interrupts globally masked and must
/// return quickly; events arriving before it acknowledges are lost.
pub trait InterruptHandler {
    /// Handle one delivery
    fn on_interrupt(&mut self);
}

impl<F: FnMut()> InterruptHandler for F {
    #[inline]
    fn on_interrupt(&mut self) {
        self()
    }
}

/// Peripheral that raises an interrupt through a sticky flag
pub trait InterruptSource {
    /// Vector the peripheral is wired to
    fn vector(&self) -> Vector;

    /// Clear the peripheral's interrupt flag so it can signal again
    fn clear_interrupt(&mut self);
}

/// Handler that toggles an output pin on every delivery, then acknowledges the PIE group (when
/// the source sits behind the PIE) and clears the source flag, in that order.
pub struct ToggleIsr<'r, R, P, S> {
    pin: P,
    source: S,
    ack: PieAck<'r, R>,
}

impl<'r, R: PieRegs, P: StatefulOutputPin, S: InterruptSource> ToggleIsr<'r, R, P, S> {
    /// Toggle `pin` for every interrupt from `source`
    pub fn new(pin: P, source: S, ack: PieAck<'r, R>) -> Self {
        ToggleIsr { pin, source, ack }
    }

    /// The toggled pin
    pub fn pin(&mut self) -> &mut P {
        &mut self.pin
    }

    /// The interrupt source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The interrupt source, mutably
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Release the pin and source
    pub fn free(self) -> (P, S) {
        (self.pin, self.source)
    }
}

impl<'r, R: PieRegs, P: StatefulOutputPin, S: InterruptSource> InterruptHandler
    for ToggleIsr<'r, R, P, S>
{
    fn on_interrupt(&mut self) {
        if let Err(e) = self.pin.toggle() {
            log::error!("pin toggle failed: {:?}", e);
        }
        if let Some(group) = self.source.vector().group() {
            self.ack.acknowledge(group);
        }
        self.source.clear_interrupt();
    }
}
