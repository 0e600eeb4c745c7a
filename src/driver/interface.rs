use core::cell::RefCell;

use critical_section::Mutex;

use crate::driver::{datagram::Datagram, registers::SpiStatus};

/// Transport that moves single register datagrams to and from a chip.
///
/// Implementations own the bus details (SPI mode, chip select, daisy chain).
/// `chip` is the [`DriverConfig::chip`](crate::driver::DriverConfig::chip)
/// of the calling driver. Calls block until the transfer completes; timeouts
/// and retries are the implementation's business.
pub trait RegisterInterface {
    type Error;

    /// Reads the register named by `datagram.address()` into `datagram.value`.
    fn read_register(
        &mut self,
        chip: u8,
        datagram: &mut Datagram,
    ) -> Result<SpiStatus, Self::Error>;

    /// Writes `datagram.value` to the register named by `datagram.address()`.
    fn write_register(&mut self, chip: u8, datagram: &Datagram) -> Result<SpiStatus, Self::Error>;
}

impl<T: RegisterInterface + ?Sized> RegisterInterface for &mut T {
    type Error = T::Error;

    fn read_register(
        &mut self,
        chip: u8,
        datagram: &mut Datagram,
    ) -> Result<SpiStatus, Self::Error> {
        (**self).read_register(chip, datagram)
    }

    fn write_register(&mut self, chip: u8, datagram: &Datagram) -> Result<SpiStatus, Self::Error> {
        (**self).write_register(chip, datagram)
    }
}

/// Marker for a driver without a transport: only shadow-side operations are available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterface;

/// Driver state holding an installed transport.
#[derive(Debug)]
pub struct WithInterface<IO: RegisterInterface> {
    pub(crate) io: IO,
}

/// A transport shared by several drivers.
///
/// Every datagram is transferred inside a critical section, so drivers on
/// different execution contexts can use the same bus.
pub struct SharedInterface<'a, T> {
    bus: &'a Mutex<RefCell<T>>,
}

impl<'a, T> SharedInterface<'a, T> {
    pub fn new(bus: &'a Mutex<RefCell<T>>) -> Self {
        Self { bus }
    }
}

impl<T> Clone for SharedInterface<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SharedInterface<'_, T> {}

impl<T> core::fmt::Debug for SharedInterface<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedInterface").finish_non_exhaustive()
    }
}

impl<T: RegisterInterface> RegisterInterface for SharedInterface<'_, T> {
    type Error = T::Error;

    fn read_register(
        &mut self,
        chip: u8,
        datagram: &mut Datagram,
    ) -> Result<SpiStatus, Self::Error> {
        critical_section::with(|cs| self.bus.borrow_ref_mut(cs).read_register(chip, datagram))
    }

    fn write_register(&mut self, chip: u8, datagram: &Datagram) -> Result<SpiStatus, Self::Error> {
        critical_section::with(|cs| self.bus.borrow_ref_mut(cs).write_register(chip, datagram))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{registers::Address, test_support::MockInterface};

    #[test]
    fn shared_interface_forwards_to_bus() {
        let bus = Mutex::new(RefCell::new(MockInterface::new()));
        let mut a = SharedInterface::new(&bus);
        let mut b = a;

        a.write_register(0, &Datagram::new(Address::GCONF, 0x4)).unwrap();
        b.write_register(1, &Datagram::new(Address::TPOWERDOWN, 0x80)).unwrap();

        let mut readback = Datagram::new(Address::GCONF, 0);
        b.read_register(1, &mut readback).unwrap();
        assert_eq!(readback.value, 0x4);

        critical_section::with(|cs| {
            let mock = bus.borrow_ref(cs);
            assert_eq!(
                mock.writes.as_slice(),
                &[(0, Address::GCONF, 0x4), (1, Address::TPOWERDOWN, 0x80)]
            );
            assert_eq!(mock.reads.as_slice(), &[(1, Address::GCONF)]);
        });
    }

    #[test]
    fn mut_ref_is_an_interface() {
        fn write_chopconf<IO: RegisterInterface>(mut io: IO) {
            let _ = io.write_register(3, &Datagram::new(Address::CHOPCONF, 7));
        }

        let mut mock = MockInterface::new();
        write_chopconf(&mut mock);
        assert_eq!(mock.writes.as_slice(), &[(3, Address::CHOPCONF, 7)]);
    }
}
