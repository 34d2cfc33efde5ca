//! GPIO mux, direction and data registers

/// GPIO port. Port A holds GPIO0-31, port B holds GPIO32-58.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Port {
    /// GPIO0-31
    A = 0,
    /// GPIO32-58
    B = 1,
}

/// Highest GPIO number on the device
pub const MAX_PIN: u8 = 58;

impl Port {
    /// Port and bit position of a GPIO number
    #[inline(always)]
    pub const fn of(pin: u8) -> (Port, u8) {
        if pin < 32 {
            (Port::A, pin)
        } else {
            (Port::B, pin - 32)
        }
    }

    /// Bits of the port that are backed by a pin
    #[inline(always)]
    pub const fn valid_mask(self) -> u32 {
        match self {
            Port::A => u32::MAX,
            Port::B => (1 << (MAX_PIN as u32 - 31)) - 1,
        }
    }
}

/// GPIO control and data registers
pub trait GpioRegs {
    /// Two-bit function select of `bit` in GPxMUX1/GPxMUX2. 0 selects GPIO. Protected.
    fn gpxmux_wr(&self, port: Port, bit: u8, func: u8);
    /// Function select of `bit`
    fn gpxmux_rd(&self, port: Port, bit: u8) -> u8;

    /// GPxDIR, 1 = output
    fn gpxdir_rd(&self, port: Port) -> u32;
    /// Set bits in GPxDIR. Protected.
    fn gpxdir_set(&self, port: Port, bits: u32);
    /// Clear bits in GPxDIR. Protected.
    fn gpxdir_clear(&self, port: Port, bits: u32);

    /// GPxDAT: pin levels for inputs, output latch for outputs
    fn gpxdat_rd(&self, port: Port) -> u32;
    /// Overwrite the output latch
    fn gpxdat_wr(&self, port: Port, bits: u32);
    /// GPxSET: drive the given bits high, other bits unaffected
    fn gpxset_wr(&self, port: Port, bits: u32);
    /// GPxCLEAR: drive the given bits low, other bits unaffected
    fn gpxclear_wr(&self, port: Port, bits: u32);
    /// GPxTOGGLE: invert the given bits, other bits unaffected
    fn gpxtoggle_wr(&self, port: Port, bits: u32);
}
