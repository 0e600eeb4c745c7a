use crate::driver::registers::{Address, Register};

/// One register as it travels over the bus: address tag plus raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Datagram {
    address: Address,
    /// Raw 32-bit register contents.
    pub value: u32,
}

impl Datagram {
    #[inline]
    pub const fn new(address: Address, value: u32) -> Self {
        Self { address, value }
    }

    /// Builds a datagram from a typed register value.
    #[inline]
    pub fn from_register<R: Register>(reg: R) -> Self {
        Self::new(R::ADDRESS, reg.into())
    }

    /// Address tag. Fixed for the lifetime of the datagram.
    #[inline]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Decodes the raw value as register `R`.
    ///
    /// Returns `None` if `R` lives at a different address.
    pub fn decode<R: Register>(&self) -> Option<R> {
        (self.address == R::ADDRESS).then(|| R::from(self.value))
    }

    /// Bytes shifted out on SPI: address (bit 7 set for writes) then value, MSB first.
    pub fn to_spi_frame(&self, write: bool) -> [u8; 5] {
        let mut frame = [0u8; 5];
        frame[0] = self.address.raw() | if write { 0x80 } else { 0 };
        frame[1..].copy_from_slice(&self.value.to_be_bytes());
        frame
    }
}
