//! Test support utilities - only compiled in test builds.

use crate::driver::{
    config::DriverConfig,
    datagram::Datagram,
    interface::{RegisterInterface, WithInterface},
    registers::{Address, SpiStatus},
    tmc5160::Tmc5160,
};

/// Error returned by [`MockInterface`] when a failure is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBusError(pub Address);

/// Chip stand-in: stores written values and echoes them back on reads.
pub struct MockInterface {
    /// Chip-side register file indexed by raw address.
    pub registers: [u32; 128],
    /// Value returned for DRV_STATUS reads.
    pub drv_status: u32,
    /// Flip bit 0 of every CHOPCONF read.
    pub corrupt_chopconf: bool,
    /// Fail any transfer touching this register.
    pub fail_on: Option<Address>,
    /// Status byte reported with every transfer.
    pub status: u8,
    pub writes: heapless::Vec<(u8, Address, u32), 64>,
    pub reads: heapless::Vec<(u8, Address), 64>,
}

impl MockInterface {
    pub fn new() -> Self {
        Self {
            registers: [0; 128],
            drv_status: 0x8000_0000, // standstill
            corrupt_chopconf: false,
            fail_on: None,
            status: 0,
            writes: heapless::Vec::new(),
            reads: heapless::Vec::new(),
        }
    }

    /// Addresses of all writes, in order.
    pub fn written_addresses(&self) -> heapless::Vec<Address, 64> {
        self.writes.iter().map(|(_, address, _)| *address).collect()
    }

    /// Addresses of all reads, in order.
    pub fn read_addresses(&self) -> heapless::Vec<Address, 64> {
        self.reads.iter().map(|(_, address)| *address).collect()
    }

    /// Last value written to `address`.
    pub fn last_write(&self, address: Address) -> Option<u32> {
        self.writes
            .iter()
            .rev()
            .find(|(_, a, _)| *a == address)
            .map(|(_, _, value)| *value)
    }

    fn check(&self, address: Address) -> Result<SpiStatus, MockBusError> {
        match self.fail_on {
            Some(fail) if fail == address => Err(MockBusError(address)),
            _ => Ok(SpiStatus::from(self.status)),
        }
    }
}

impl Default for MockInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterInterface for MockInterface {
    type Error = MockBusError;

    fn read_register(
        &mut self,
        chip: u8,
        datagram: &mut Datagram,
    ) -> Result<SpiStatus, Self::Error> {
        let address = datagram.address();
        let status = self.check(address)?;
        let _ = self.reads.push((chip, address));

        datagram.value = match address {
            Address::DRV_STATUS => self.drv_status,
            Address::CHOPCONF if self.corrupt_chopconf => {
                self.registers[address.raw() as usize] ^ 1
            }
            _ => self.registers[address.raw() as usize],
        };
        Ok(status)
    }

    fn write_register(&mut self, chip: u8, datagram: &Datagram) -> Result<SpiStatus, Self::Error> {
        let address = datagram.address();
        let status = self.check(address)?;
        let _ = self.writes.push((chip, address, datagram.value));

        self.registers[address.raw() as usize] = datagram.value;
        Ok(status)
    }
}

pub type TestDriver = Tmc5160<WithInterface<MockInterface>>;

/// Helper to create a default driver on a fresh mock bus
pub fn test_driver() -> TestDriver {
    Tmc5160::new().with_interface(MockInterface::new())
}

/// Helper to create a driver for `config` on a fresh mock bus
pub fn test_driver_with(config: DriverConfig) -> TestDriver {
    Tmc5160::from_config(config).with_interface(MockInterface::new())
}
