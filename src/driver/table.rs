use bitmaps::Bitmap;

use crate::driver::{
    datagram::Datagram,
    registers::*,
};

/// In-memory copy of every chip register, with per-register dirty tracking.
///
/// Slots are laid out in [`Address::ALL`] order and keep their address tag
/// for their whole lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisterTable {
    slots: [Datagram; REGISTER_COUNT],
    dirty: Bitmap<REGISTER_COUNT>,
}

impl core::fmt::Debug for RegisterTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterTable")
            .field("slots", &self.slots)
            .finish_non_exhaustive()
    }
}

impl Default for RegisterTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterTable {
    /// Creates a table with every register zeroed and clean.
    pub fn new() -> Self {
        let mut slots = [Datagram::new(Address::GCONF, 0); REGISTER_COUNT];
        for (slot, address) in slots.iter_mut().zip(Address::ALL) {
            *slot = Datagram::new(address, 0);
        }

        Self {
            slots,
            dirty: Bitmap::new(),
        }
    }

    /// All registers in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Datagram> {
        self.slots.iter()
    }

    /// Shadow datagram for `address`. Reaches every register.
    #[inline]
    pub fn datagram(&self, address: Address) -> &Datagram {
        &self.slots[address.index()]
    }

    /// Decoded shadow value of register `R`.
    #[inline]
    pub fn get<R: Register>(&self) -> R {
        R::from(self.datagram(R::ADDRESS).value)
    }

    /// Stores a register value and marks it dirty.
    pub fn set<R: Register>(&mut self, reg: R) {
        let index = R::ADDRESS.index();
        self.slots[index].value = reg.into();
        self.dirty.set(index, true);
    }

    /// Applies `f` to the decoded value of `R`, stores the result and marks it dirty.
    pub fn update<R: Register>(&mut self, f: impl FnOnce(&mut R)) {
        let mut reg = self.get::<R>();
        f(&mut reg);
        self.set(reg);
    }

    /// Stores a value read from the chip without marking dirty.
    pub fn store(&mut self, address: Address, value: u32) {
        self.slots[address.index()].value = value;
    }

    /// Looks up a register by linear scan in table order.
    ///
    /// The scan stops at `LOST_STEPS`: extended registers declared after it
    /// are never found here. Use [`datagram`](Self::datagram) or the typed
    /// accessors to reach them.
    pub fn find(&self, address: Address) -> Option<&Datagram> {
        self.scan(address).map(|index| &self.slots[index])
    }

    /// Mutable counterpart of [`find`](Self::find). Marks the register dirty
    /// when found.
    ///
    /// `f` receives the raw value only; the slot's address tag never changes.
    pub fn with_found_mut<R>(
        &mut self,
        address: Address,
        f: impl FnOnce(&mut u32) -> R,
    ) -> Option<R> {
        let index = self.scan(address)?;
        let result = f(&mut self.slots[index].value);
        self.dirty.set(index, true);
        Some(result)
    }

    fn scan(&self, address: Address) -> Option<usize> {
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.address() == address {
                return Some(index);
            }
            if slot.address() == Address::LOST_STEPS {
                break;
            }
        }
        None
    }

    pub fn is_dirty(&self, address: Address) -> bool {
        self.dirty.get(address.index())
    }

    pub fn any_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn mark_dirty(&mut self, address: Address) {
        self.dirty.set(address.index(), true);
    }

    pub fn mark_clean(&mut self, address: Address) {
        self.dirty.set(address.index(), false);
    }

    pub fn clear_all_dirty(&mut self) {
        self.dirty = Bitmap::new();
    }

    /// Dirty registers in table order.
    pub fn dirty_registers(&self) -> heapless::Vec<Address, REGISTER_COUNT> {
        let mut out = heapless::Vec::new();
        let mut idx = self.dirty.first_index();
        while let Some(index) = idx {
            // capacity equals the number of slots
            let _ = out.push(self.slots[index].address());
            idx = self.dirty.next_index(index);
        }
        out
    }
}

macro_rules! typed_accessors {
    ($($reg:ident),* $(,)?) => {
        paste::paste! {
            impl RegisterTable {
                $(
                    #[doc = "Shadow value of `" $reg "`."]
                    #[inline]
                    pub fn [<$reg:lower>](&self) -> $reg {
                        self.get::<$reg>()
                    }

                    #[doc = "Stores `" $reg "` and marks it dirty."]
                    #[inline]
                    pub fn [<set_ $reg:lower>](&mut self, reg: $reg) {
                        self.set(reg)
                    }
                )*
            }
        }
    };
}

typed_accessors!(
    GCONF, GSTAT, IOIN, IHOLD_IRUN, TPOWERDOWN, TSTEP, TPWMTHRS, TCOOLTHRS, THIGH, VDCMIN, MSCNT,
    MSCURACT, CHOPCONF, COOLCONF, DCCTRL, DRV_STATUS, PWMCONF, PWM_SCALE, LOST_STEPS, XDIRECT,
    MSLUT0, MSLUT1, MSLUT2, MSLUT3, MSLUT4, MSLUT5, MSLUT6, MSLUT7, MSLUTSEL, MSLUTSTART,
    ENCM_CTRL,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_table_tags_every_slot() {
        let table = RegisterTable::new();
        for (slot, address) in table.iter().zip(Address::ALL) {
            assert_eq!(slot.address(), address);
            assert_eq!(slot.value, 0);
        }
        assert!(!table.any_dirty());
    }

    #[test]
    fn find_reaches_core_registers() {
        let table = RegisterTable::new();
        for address in Address::ALL.iter().take(Address::LOST_STEPS.index() + 1) {
            let found = table.find(*address).map(|d| d.address());
            assert_eq!(found, Some(*address));
        }
    }

    #[test]
    fn find_stops_at_lost_steps() {
        let table = RegisterTable::new();
        assert!(table.find(Address::XDIRECT).is_none());
        assert!(table.find(Address::MSLUT0).is_none());
        assert!(table.find(Address::MSLUTSTART).is_none());
        assert!(table.find(Address::ENCM_CTRL).is_none());

        // still reachable through direct indexing
        assert_eq!(table.datagram(Address::XDIRECT).address(), Address::XDIRECT);
    }

    #[test]
    fn with_found_mut_marks_dirty() {
        let mut table = RegisterTable::new();
        let res = table.with_found_mut(Address::TCOOLTHRS, |value| *value = 500);
        assert_eq!(res, Some(()));
        assert!(table.is_dirty(Address::TCOOLTHRS));
        assert_eq!(table.tcoolthrs().get(), 500);

        assert!(table.with_found_mut(Address::ENCM_CTRL, |value| *value = 1).is_none());
        assert!(!table.is_dirty(Address::ENCM_CTRL));
    }

    #[test]
    fn with_found_mut_keeps_address_tags() {
        let mut table = RegisterTable::new();
        table.with_found_mut(Address::CHOPCONF, |value| *value = u32::MAX);

        for (slot, address) in table.iter().zip(Address::ALL) {
            assert_eq!(slot.address(), address);
        }
        assert_eq!(table.find(Address::COOLCONF).map(|d| d.address()), Some(Address::COOLCONF));
        assert_eq!(table.datagram(Address::CHOPCONF).value, u32::MAX);
    }

    #[test]
    fn set_marks_dirty_store_does_not() {
        let mut table = RegisterTable::new();

        table.store(Address::DRV_STATUS, 0x8000_0000);
        assert!(!table.any_dirty());
        assert!(table.drv_status().stst());

        let mut chopconf = CHOPCONF::default();
        chopconf.set_toff(4);
        table.set_chopconf(chopconf);
        assert!(table.is_dirty(Address::CHOPCONF));
        assert_eq!(table.chopconf().toff(), 4);
    }

    #[test]
    fn update_modifies_in_place() {
        let mut table = RegisterTable::new();
        table.update::<IHOLD_IRUN>(|r| r.set_irun(12));
        table.update::<IHOLD_IRUN>(|r| r.set_ihold(6));
        let reg = table.ihold_irun();
        assert_eq!((reg.irun(), reg.ihold()), (12, 6));
    }

    #[test]
    fn dirty_registers_in_table_order() {
        let mut table = RegisterTable::new();
        table.mark_dirty(Address::PWMCONF);
        table.mark_dirty(Address::GCONF);
        table.mark_dirty(Address::MSLUT3);

        let dirty = table.dirty_registers();
        assert_eq!(
            dirty.as_slice(),
            &[Address::GCONF, Address::PWMCONF, Address::MSLUT3]
        );

        table.mark_clean(Address::GCONF);
        assert!(!table.is_dirty(Address::GCONF));

        table.clear_all_dirty();
        assert!(!table.any_dirty());
    }
}
