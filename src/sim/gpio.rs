use super::RegisterFile;
use crate::hw_traits::gpio::{GpioRegs, Port, MAX_PIN};
use crate::util::BitsExt;
use core::cell::Cell;

pub(super) struct GpioBlock {
    // GPAMUX1, GPAMUX2, GPBMUX1, GPBMUX2
    mux: [Cell<u32>; 4],
    dir: [Cell<u32>; 2],
    latch: [Cell<u32>; 2],
    input: [Cell<u32>; 2],
    toggles: [Cell<u32>; MAX_PIN as usize + 1],
}

impl GpioBlock {
    pub(super) fn new() -> Self {
        GpioBlock {
            mux: Default::default(),
            dir: Default::default(),
            latch: Default::default(),
            input: Default::default(),
            toggles: core::array::from_fn(|_| Cell::new(0)),
        }
    }

    pub(super) fn toggles(&self, pin: u8) -> u32 {
        self.toggles
            .get(pin as usize)
            .map_or(0, |count| count.get())
    }

    pub(super) fn drive_input(&self, pin: u8, high: bool) {
        if pin > MAX_PIN {
            return;
        }
        let (port, bit) = Port::of(pin);
        let input = &self.input[port as usize];
        input.set(if high {
            input.get().set(bit)
        } else {
            input.get().clear(bit)
        });
    }

    fn pin_level(&self, port: Port) -> u32 {
        let dir = self.dir[port as usize].get();
        (self.latch[port as usize].get() & dir) | (self.input[port as usize].get() & !dir)
    }

    // Every output whose level changes counts as one toggle
    fn write_latch(&self, port: Port, latch: u32) {
        let latch = latch & port.valid_mask();
        let before = self.pin_level(port);
        self.latch[port as usize].set(latch);
        let changed = (before ^ self.pin_level(port)) & self.dir[port as usize].get();
        for bit in 0..32u8 {
            if changed.check(bit) {
                let count = &self.toggles[(port as usize) * 32 + bit as usize];
                count.set(count.get().wrapping_add(1));
            }
        }
    }

    fn mux_slot(port: Port, bit: u8) -> (usize, u8) {
        ((port as usize) * 2 + (bit as usize) / 16, (bit % 16) * 2)
    }
}

impl GpioRegs for RegisterFile {
    fn gpxmux_wr(&self, port: Port, bit: u8, func: u8) {
        if !self.allowed("GPxMUX") {
            return;
        }
        let (reg, shift) = GpioBlock::mux_slot(port, bit);
        let mux = &self.gpio.mux[reg];
        let cleared = mux.get().clear_mask(0b11 << shift);
        mux.set(cleared.set_mask(((func & 0b11) as u32) << shift));
    }

    fn gpxmux_rd(&self, port: Port, bit: u8) -> u8 {
        let (reg, shift) = GpioBlock::mux_slot(port, bit);
        ((self.gpio.mux[reg].get() >> shift) & 0b11) as u8
    }

    fn gpxdir_rd(&self, port: Port) -> u32 {
        self.gpio.dir[port as usize].get()
    }

    fn gpxdir_set(&self, port: Port, bits: u32) {
        if self.allowed("GPxDIR") {
            let dir = &self.gpio.dir[port as usize];
            dir.set(dir.get().set_mask(bits & port.valid_mask()));
        }
    }

    fn gpxdir_clear(&self, port: Port, bits: u32) {
        if self.allowed("GPxDIR") {
            let dir = &self.gpio.dir[port as usize];
            dir.set(dir.get().clear_mask(bits));
        }
    }

    fn gpxdat_rd(&self, port: Port) -> u32 {
        self.gpio.pin_level(port)
    }

    fn gpxdat_wr(&self, port: Port, bits: u32) {
        self.gpio.write_latch(port, bits);
    }

    fn gpxset_wr(&self, port: Port, bits: u32) {
        let latch = self.gpio.latch[port as usize].get();
        self.gpio.write_latch(port, latch.set_mask(bits));
    }

    fn gpxclear_wr(&self, port: Port, bits: u32) {
        let latch = self.gpio.latch[port as usize].get();
        self.gpio.write_latch(port, latch.clear_mask(bits));
    }

    fn gpxtoggle_wr(&self, port: Port, bits: u32) {
        let latch = self.gpio.latch[port as usize].get();
        self.gpio.write_latch(port, latch ^ bits);
    }
}
