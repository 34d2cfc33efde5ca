//! Peripheral interrupt expansion (PIE) and core interrupt dispatch
//!
//! An interrupt reaches its handler only when every stage of the path lets it through:
//!
//! 1. the peripheral has set its own interrupt flag,
//! 2. the channel is enabled in PIEIER and the group's PIEACK bit is clear, at which point the
//!    PIE latches PIEACK and raises the group's core line in IFR,
//! 3. the core line is enabled in IER and INTM is clear.
//!
//! The handler must then release the group by writing its PIEACK bit ([`PieAck::acknowledge`])
//! and clear the peripheral flag. Forgetting the first stalls every source in the group;
//! forgetting the second stalls only that source. Neither stall recovers without
//! re-initialisation. INT13 and INT14 bypass the PIE and have no PIEACK stage.
//!
//! Events arriving while a flag or latch is still set are lost, not queued.

use crate::error::{ArmError, BindError, DispatchError};
use crate::hw_traits::pie::{IntFlags, PieRegs, PIE_GROUPS};
use crate::isr::InterruptHandler;
use crate::util::lowest_bit;
use core::fmt;

const PIE_CHANNELS: u8 = 8;
const PIE_VECTORS: u8 = PIE_GROUPS * PIE_CHANNELS;
const VECTORS: usize = PIE_VECTORS as usize + 2;

/// PIE group, one per core line INT1-INT12
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PieGroup {
    Group1 = 0,
    Group2 = 1,
    Group3 = 2,
    Group4 = 3,
    Group5 = 4,
    Group6 = 5,
    Group7 = 6,
    Group8 = 7,
    Group9 = 8,
    Group10 = 9,
    Group11 = 10,
    Group12 = 11,
}

impl PieGroup {
    const ALL: [PieGroup; PIE_GROUPS as usize] = [
        PieGroup::Group1,
        PieGroup::Group2,
        PieGroup::Group3,
        PieGroup::Group4,
        PieGroup::Group5,
        PieGroup::Group6,
        PieGroup::Group7,
        PieGroup::Group8,
        PieGroup::Group9,
        PieGroup::Group10,
        PieGroup::Group11,
        PieGroup::Group12,
    ];

    /// Group of a zero-based index
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < PIE_GROUPS {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    /// Core line fed by the group
    pub const fn core_line(self) -> IntFlags {
        IntFlags::from_bits_truncate(1 << self as u16)
    }

    /// Bit of the group in PIEACK
    pub const fn ack_mask(self) -> u16 {
        1 << self as u16
    }
}

/// Channel within a PIE group (INTx1-INTx8)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PieChannel {
    Int1 = 0,
    Int2 = 1,
    Int3 = 2,
    Int4 = 3,
    Int5 = 4,
    Int6 = 5,
    Int7 = 6,
    Int8 = 7,
}

impl PieChannel {
    const ALL: [PieChannel; PIE_CHANNELS as usize] = [
        PieChannel::Int1,
        PieChannel::Int2,
        PieChannel::Int3,
        PieChannel::Int4,
        PieChannel::Int5,
        PieChannel::Int6,
        PieChannel::Int7,
        PieChannel::Int8,
    ];

    /// Channel of a zero-based index
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < PIE_CHANNELS {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    /// Bit of the channel in PIEIER and PIEIFR
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// Interrupt vector slot: one PIE channel, or one of the directly wired core lines INT13/INT14
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Vector(u8);

impl Vector {
    /// Vector of a PIE channel
    pub const fn pie(group: PieGroup, channel: PieChannel) -> Self {
        Vector(group as u8 * PIE_CHANNELS + channel as u8)
    }

    /// Core line INT13
    pub const INT13: Vector = Vector(PIE_VECTORS);
    /// Core line INT14
    pub const INT14: Vector = Vector(PIE_VECTORS + 1);

    /// CPU timer 0 (INT1.7)
    pub const TINT0: Vector = Vector::pie(PieGroup::Group1, PieChannel::Int7);
    /// CPU timer 1 (INT13)
    pub const TINT1: Vector = Vector::INT13;
    /// CPU timer 2 (INT14)
    pub const TINT2: Vector = Vector::INT14;

    /// ePWM1 (INT3.1)
    pub const EPWM1_INT: Vector = Vector::pie(PieGroup::Group3, PieChannel::Int1);
    /// ePWM2 (INT3.2)
    pub const EPWM2_INT: Vector = Vector::pie(PieGroup::Group3, PieChannel::Int2);
    /// ePWM3 (INT3.3)
    pub const EPWM3_INT: Vector = Vector::pie(PieGroup::Group3, PieChannel::Int3);
    /// ePWM4 (INT3.4)
    pub const EPWM4_INT: Vector = Vector::pie(PieGroup::Group3, PieChannel::Int4);
    /// ePWM5 (INT3.5)
    pub const EPWM5_INT: Vector = Vector::pie(PieGroup::Group3, PieChannel::Int5);
    /// ePWM6 (INT3.6)
    pub const EPWM6_INT: Vector = Vector::pie(PieGroup::Group3, PieChannel::Int6);
    /// ePWM7 (INT3.7)
    pub const EPWM7_INT: Vector = Vector::pie(PieGroup::Group3, PieChannel::Int7);
    /// ePWM8 (INT3.8)
    pub const EPWM8_INT: Vector = Vector::pie(PieGroup::Group3, PieChannel::Int8);

    /// PIE group of the vector, `None` for INT13/INT14
    pub const fn group(self) -> Option<PieGroup> {
        if self.0 < PIE_VECTORS {
            PieGroup::from_index(self.0 / PIE_CHANNELS)
        } else {
            None
        }
    }

    /// PIE channel of the vector, `None` for INT13/INT14
    pub const fn channel(self) -> Option<PieChannel> {
        if self.0 < PIE_VECTORS {
            PieChannel::from_index(self.0 % PIE_CHANNELS)
        } else {
            None
        }
    }

    /// Core line the vector is delivered on
    pub const fn core_line(self) -> IntFlags {
        match self.group() {
            Some(group) => group.core_line(),
            None if self.0 == PIE_VECTORS => IntFlags::INT13,
            None => IntFlags::INT14,
        }
    }

    fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.group(), self.channel()) {
            (Some(g), Some(c)) => write!(f, "INT{}.{}", g as u8 + 1, c as u8 + 1),
            _ => write!(f, "INT{}", self.0 - PIE_VECTORS + 13),
        }
    }
}

/// Mapping from vector slots to handlers. A slot holds at most one handler.
pub struct PieVectTable<'h> {
    slots: [Option<&'h mut dyn InterruptHandler>; VECTORS],
}

impl<'h> Default for PieVectTable<'h> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'h> PieVectTable<'h> {
    /// Table with every slot empty
    pub fn new() -> Self {
        PieVectTable {
            slots: core::array::from_fn(|_| None),
        }
    }

    /// Whether a handler is bound to `vector`
    pub fn is_bound(&self, vector: Vector) -> bool {
        self.slots[vector.slot()].is_some()
    }

    fn insert(&mut self, vector: Vector, handler: &'h mut dyn InterruptHandler) -> bool {
        let slot = &mut self.slots[vector.slot()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(handler);
        true
    }

    fn remove(&mut self, vector: Vector) -> Option<&'h mut dyn InterruptHandler> {
        self.slots[vector.slot()].take()
    }

    fn get_mut(&mut self, vector: Vector) -> Option<&mut (dyn InterruptHandler + 'h)> {
        match &mut self.slots[vector.slot()] {
            Some(handler) => Some(&mut **handler),
            None => None,
        }
    }
}

/// The interrupt controller: PIE, core interrupt registers and vector table
pub struct Pie<'r, 'h, R> {
    regs: &'r R,
    table: PieVectTable<'h>,
}

impl<'r, 'h, R: PieRegs> Pie<'r, 'h, R> {
    /// Bring the PIE and core interrupt registers to a known state: interrupts globally masked,
    /// every enable and flag cleared, every group released, PIE enabled, vector table empty.
    pub fn new(regs: &'r R) -> Self {
        regs.intm_set();
        regs.enpie_wr(false);
        for group in 0..PIE_GROUPS {
            regs.pieier_clear(group, 0xFF);
            regs.pieifr_clear(group, 0xFF);
        }
        regs.ier_wr(IntFlags::empty());
        regs.ifr_clear(IntFlags::all());
        regs.pieack_clr(0xFFFF);
        regs.enpie_wr(true);
        Pie {
            regs,
            table: PieVectTable::new(),
        }
    }

    /// Register file the controller works on
    pub fn regs(&self) -> &'r R {
        self.regs
    }

    /// Acknowledge handle for handlers
    pub fn acker(&self) -> PieAck<'r, R> {
        PieAck::new(self.regs)
    }

    /// Bind `handler` to `vector`. Binding must happen before the vector is armed.
    pub fn bind<H: InterruptHandler + 'h>(
        &mut self,
        vector: Vector,
        handler: &'h mut H,
    ) -> Result<(), BindError> {
        if self.table.insert(vector, handler) {
            log::debug!("bound handler to {}", vector);
            Ok(())
        } else {
            Err(BindError::AlreadyBound(vector))
        }
    }

    /// Remove the handler of a disarmed vector, returning whether one was bound
    pub fn unbind(&mut self, vector: Vector) -> Result<bool, BindError> {
        if self.is_armed(vector) {
            return Err(BindError::Armed(vector));
        }
        Ok(self.table.remove(vector).is_some())
    }

    /// Whether a handler is bound to `vector`
    pub fn is_bound(&self, vector: Vector) -> bool {
        self.table.is_bound(vector)
    }

    /// Enable delivery of `vector`: its PIEIER bit (for PIE vectors) and its core line in IER.
    /// Interrupts still need to be globally enabled with [`Pie::enable_interrupts`].
    pub fn arm(&mut self, vector: Vector) -> Result<(), ArmError> {
        if !self.table.is_bound(vector) {
            return Err(ArmError::Unbound(vector));
        }
        if let (Some(group), Some(channel)) = (vector.group(), vector.channel()) {
            self.regs.pieier_set(group as u8, channel.mask());
        }
        self.regs.ier_set(vector.core_line());
        Ok(())
    }

    /// Stop delivering `vector`. PIE vectors lose their PIEIER bit only, leaving the rest of the
    /// group armed; INT13/INT14 lose their IER bit. Flags already latched are left alone.
    pub fn disarm(&mut self, vector: Vector) {
        match (vector.group(), vector.channel()) {
            (Some(group), Some(channel)) => self.regs.pieier_clear(group as u8, channel.mask()),
            _ => self.regs.ier_clear(vector.core_line()),
        }
    }

    /// Clear the IER bit of a whole PIE group
    pub fn disable_line(&mut self, group: PieGroup) {
        self.regs.ier_clear(group.core_line());
    }

    /// Whether `vector` is enabled at its innermost stage (PIEIER, or IER for INT13/INT14)
    pub fn is_armed(&self, vector: Vector) -> bool {
        match (vector.group(), vector.channel()) {
            (Some(group), Some(channel)) => {
                self.regs.pieier_rd(group as u8) & channel.mask() != 0
            }
            _ => self.regs.ier_rd().contains(vector.core_line()),
        }
    }

    /// Clear INTM (`EINT`)
    pub fn enable_interrupts(&mut self) {
        self.regs.intm_clear();
    }

    /// Set INTM (`DINT`)
    pub fn disable_interrupts(&mut self) {
        self.regs.intm_set();
    }

    /// Take one interrupt, the way the CPU does: pick the highest-priority core line that is
    /// flagged and enabled, clear its IFR bit, fetch the vector (clearing the PIEIFR bit of the
    /// highest-priority pending channel for PIE lines), then run the handler with INTM set.
    ///
    /// Returns `WouldBlock` if INTM is set or no enabled line is flagged.
    pub fn service(&mut self) -> nb::Result<Vector, DispatchError> {
        if self.regs.intm_rd() {
            return Err(nb::Error::WouldBlock);
        }
        let lines = IntFlags::all() - IntFlags::DLOGINT - IntFlags::RTOSINT;
        let pending = self.regs.ifr_rd() & self.regs.ier_rd() & lines;
        let line = lowest_bit(pending.bits()).ok_or(nb::Error::WouldBlock)?;
        self.regs
            .ifr_clear(IntFlags::from_bits_truncate(1 << line));

        let vector = match PieGroup::from_index(line) {
            Some(group) => self.fetch_pie(group)?,
            None if line == 12 => Vector::INT13,
            None => Vector::INT14,
        };

        let handler = match self.table.get_mut(vector) {
            Some(handler) => handler,
            None => {
                log::error!("interrupt on unbound vector {}", vector);
                return Err(nb::Error::Other(DispatchError::Unbound(vector)));
            }
        };
        self.regs.intm_set();
        handler.on_interrupt();
        self.regs.intm_clear();
        log::trace!("delivered {}", vector);
        Ok(vector)
    }

    // The PIE hands over the highest-priority channel that is both flagged and enabled
    fn fetch_pie(&self, group: PieGroup) -> Result<Vector, DispatchError> {
        let index = group as u8;
        let pending = self.regs.pieifr_rd(index) & self.regs.pieier_rd(index);
        match lowest_bit(pending as u16).and_then(PieChannel::from_index) {
            Some(channel) => {
                self.regs.pieifr_clear(index, channel.mask());
                Ok(Vector::pie(group, channel))
            }
            None => {
                log::warn!("spurious interrupt on PIE group {}", index + 1);
                Err(DispatchError::Spurious(group))
            }
        }
    }

    /// Service interrupts until none is deliverable, returning the number of handlers run.
    /// Failed deliveries are logged and skipped.
    pub fn service_all(&mut self) -> usize {
        let mut delivered = 0;
        loop {
            match self.service() {
                Ok(_) => delivered += 1,
                Err(nb::Error::WouldBlock) => return delivered,
                Err(nb::Error::Other(_)) => {}
            }
        }
    }
}

/// Handle used by interrupt handlers to release a PIE group
pub struct PieAck<'r, R> {
    regs: &'r R,
}

impl<'r, R> Clone for PieAck<'r, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'r, R> Copy for PieAck<'r, R> {}

impl<'r, R: PieRegs> PieAck<'r, R> {
    /// Create an acknowledge handle
    pub fn new(regs: &'r R) -> Self {
        PieAck { regs }
    }

    /// Write 1 to the group's PIEACK bit so the next interrupt of any of its channels can reach
    /// the core
    #[inline]
    pub fn acknowledge(&self, group: PieGroup) {
        self.regs.pieack_clr(group.ack_mask());
    }

    /// Whether the group is latched, waiting for acknowledgment
    pub fn is_latched(&self, group: PieGroup) -> bool {
        self.regs.pieack_rd() & group.ack_mask() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw_traits::cputimer::{CpuTimerRegs, Tcr};
    use crate::hw_traits::epwm::EpwmRegs;
    use crate::hw_traits::sysctrl::{protected, Pclkcr3, SysCtrlRegs};
    use crate::sim::RegisterFile;
    use core::cell::Cell;

    // Raise ePWM `n` (zero-based) by forcing its event-trigger output
    fn force_epwm(regs: &RegisterFile, n: u8) {
        regs.inten_set(n);
        regs.etfrc_int(n);
    }

    #[test]
    fn vector_layout() {
        assert_eq!(Vector::TINT0.group(), Some(PieGroup::Group1));
        assert_eq!(Vector::TINT0.channel(), Some(PieChannel::Int7));
        assert_eq!(Vector::EPWM2_INT.core_line(), IntFlags::INT3);
        assert_eq!(Vector::TINT1.group(), None);
        assert_eq!(Vector::TINT1.core_line(), IntFlags::INT13);
        assert_eq!(Vector::TINT2.core_line(), IntFlags::INT14);
        assert_eq!(format!("{}", Vector::TINT0), "INT1.7");
        assert_eq!(format!("{}", Vector::EPWM8_INT), "INT3.8");
        assert_eq!(format!("{}", Vector::INT13), "INT13");
    }

    #[test]
    fn init_state() {
        let regs = RegisterFile::new();
        let pie = Pie::new(&regs);
        assert!(regs.intm_rd());
        assert!(regs.enpie_rd());
        assert_eq!(regs.ier_rd(), IntFlags::empty());
        assert_eq!(regs.pieack_rd(), 0);
        assert!(!pie.is_bound(Vector::TINT0));
    }

    #[test]
    fn bind_rules() {
        let regs = RegisterFile::new();
        let mut a = || {};
        let mut b = || {};
        let mut c = || {};
        let mut pie = Pie::new(&regs);

        assert_eq!(
            pie.arm(Vector::EPWM1_INT),
            Err(ArmError::Unbound(Vector::EPWM1_INT))
        );
        pie.bind(Vector::EPWM1_INT, &mut a).unwrap();
        assert_eq!(
            pie.bind(Vector::EPWM1_INT, &mut b),
            Err(BindError::AlreadyBound(Vector::EPWM1_INT))
        );
        pie.arm(Vector::EPWM1_INT).unwrap();
        assert!(pie.is_armed(Vector::EPWM1_INT));
        assert_eq!(
            pie.unbind(Vector::EPWM1_INT),
            Err(BindError::Armed(Vector::EPWM1_INT))
        );
        pie.disarm(Vector::EPWM1_INT);
        assert_eq!(pie.unbind(Vector::EPWM1_INT), Ok(true));
        assert_eq!(pie.unbind(Vector::EPWM1_INT), Ok(false));
        pie.bind(Vector::EPWM1_INT, &mut c).unwrap();
    }

    #[test]
    fn nothing_delivered_while_intm_set() {
        let regs = RegisterFile::new();
        let hits = Cell::new(0);
        let mut handler = || hits.set(hits.get() + 1);
        let mut pie = Pie::new(&regs);
        pie.bind(Vector::EPWM1_INT, &mut handler).unwrap();
        pie.arm(Vector::EPWM1_INT).unwrap();

        force_epwm(&regs, 0);
        assert!(regs.ifr_rd().contains(IntFlags::INT3));
        assert!(matches!(pie.service(), Err(nb::Error::WouldBlock)));

        pie.enable_interrupts();
        assert!(matches!(pie.service(), Ok(Vector::EPWM1_INT)));
        assert_eq!(hits.get(), 1);
        assert!(!regs.intm_rd());
        assert!(matches!(pie.service(), Err(nb::Error::WouldBlock)));
    }

    #[test]
    fn lowest_channel_wins_within_group() {
        let regs = RegisterFile::new();
        let order = Cell::new(0u32);
        let ack = PieAck::new(&regs);
        let mut first = || {
            order.set(order.get() * 10 + 1);
            ack.acknowledge(PieGroup::Group3);
        };
        let mut second = || {
            order.set(order.get() * 10 + 2);
            ack.acknowledge(PieGroup::Group3);
        };
        let mut pie = Pie::new(&regs);
        pie.bind(Vector::EPWM2_INT, &mut second).unwrap();
        pie.bind(Vector::EPWM1_INT, &mut first).unwrap();
        pie.arm(Vector::EPWM2_INT).unwrap();
        pie.arm(Vector::EPWM1_INT).unwrap();
        pie.enable_interrupts();

        force_epwm(&regs, 1);
        force_epwm(&regs, 0);
        assert_eq!(pie.service_all(), 2);
        assert_eq!(order.get(), 12);
    }

    #[test]
    fn unbound_delivery_leaves_group_latched() {
        let regs = RegisterFile::new();
        let mut pie = Pie::new(&regs);
        // Arm through the registers, bypassing the table check
        regs.pieier_set(2, PieChannel::Int1.mask());
        regs.ier_set(IntFlags::INT3);
        pie.enable_interrupts();

        force_epwm(&regs, 0);
        assert!(matches!(
            pie.service(),
            Err(nb::Error::Other(DispatchError::Unbound(Vector::EPWM1_INT)))
        ));
        assert!(pie.acker().is_latched(PieGroup::Group3));
        assert!(!regs.intm_rd());
    }

    #[test]
    fn spurious_when_channel_vanishes() {
        let regs = RegisterFile::new();
        let mut handler = || {};
        let mut pie = Pie::new(&regs);
        pie.bind(Vector::EPWM1_INT, &mut handler).unwrap();
        pie.arm(Vector::EPWM1_INT).unwrap();
        pie.enable_interrupts();

        force_epwm(&regs, 0);
        regs.pieifr_clear(2, PieChannel::Int1.mask());
        assert!(matches!(
            pie.service(),
            Err(nb::Error::Other(DispatchError::Spurious(PieGroup::Group3)))
        ));
        assert_eq!(pie.service_all(), 0);
    }

    #[test]
    fn direct_line_needs_no_ack() {
        let regs = RegisterFile::new();
        let hits = Cell::new(0);
        let mut handler = || {
            hits.set(hits.get() + 1);
            regs.tif_clr(1);
        };
        let mut pie = Pie::new(&regs);
        pie.bind(Vector::TINT1, &mut handler).unwrap();
        pie.arm(Vector::TINT1).unwrap();
        pie.enable_interrupts();

        protected(&regs, || regs.pclkcr3_set(Pclkcr3::CPUTIMER1ENCLK));
        regs.prd_wr(1, 99);
        regs.tcr_set(1, Tcr::TIE | Tcr::TRB);
        regs.tcr_clear(1, Tcr::TSS);

        assert_eq!(pie.run(1000), 10);
        assert_eq!(hits.get(), 10);
        assert_eq!(regs.pieack_rd(), 0);
    }

    #[test]
    fn disable_line_blocks_whole_group() {
        let regs = RegisterFile::new();
        let mut handler = || {};
        let mut pie = Pie::new(&regs);
        pie.bind(Vector::EPWM1_INT, &mut handler).unwrap();
        pie.arm(Vector::EPWM1_INT).unwrap();
        pie.disable_line(PieGroup::Group3);
        pie.enable_interrupts();

        force_epwm(&regs, 0);
        assert!(matches!(pie.service(), Err(nb::Error::WouldBlock)));
        assert!(pie.is_armed(Vector::EPWM1_INT));
        assert!(regs.ifr_rd().contains(IntFlags::INT3));
    }
}
