//! Basic example: driving a TMC5160 through its shadow registers
//!
//! This example demonstrates:
//! - Using the builder pattern to create a driver configuration
//! - Implementing RegisterInterface for a bus
//! - Hardware initialisation and read-back verification
//! - Physical-unit setters (current, microsteps, hybrid threshold)
//! - Shadow-only edits synchronised later with sync()
//! - Two chips sharing one bus

use core::cell::RefCell;

use critical_section::Mutex;
use tmc5160_shadow::{
    driver::registers::{CHOPCONF, TCOOLTHRS},
    prelude::*,
};

// ============ Simulated Chip ============
// Stores every written register and echoes it back on reads. DRV_STATUS
// reports standstill so the presence check passes.

struct FakeBus {
    registers: [[u32; 128]; 2],
    writes: usize,
}

impl FakeBus {
    const fn new() -> Self {
        Self {
            registers: [[0; 128]; 2],
            writes: 0,
        }
    }
}

impl RegisterInterface for FakeBus {
    type Error = ();

    fn read_register(&mut self, chip: u8, datagram: &mut Datagram) -> Result<SpiStatus, ()> {
        let chip = self.registers.get(chip as usize).ok_or(())?;
        datagram.value = match datagram.address() {
            Address::DRV_STATUS => 0x8000_0000,
            address => chip[address.raw() as usize],
        };
        Ok(SpiStatus::default())
    }

    fn write_register(&mut self, chip: u8, datagram: &Datagram) -> Result<SpiStatus, ()> {
        let chip = self.registers.get_mut(chip as usize).ok_or(())?;
        chip[datagram.address().raw() as usize] = datagram.value;
        self.writes += 1;
        Ok(SpiStatus::default())
    }
}

pub fn main() {
    // ========== Single Chip ==========
    let config = DriverConfig::builder()
        .r_sense(75) // mΩ
        .current(1200, 40) // 1.2 A RMS, hold at 40%
        .microsteps(32)
        .build();

    let mut driver = Tmc5160::from_config(config).with_interface(FakeBus::new());
    driver.hardware_init().unwrap();

    // The current reads back within one IRUN step
    let current = driver.current();
    assert!((1100..=1300).contains(&current), "current {current} mA");
    assert_eq!(driver.registers().chopconf().mres(), 3); // 32 microsteps

    // Every setter writes its register immediately
    driver.set_microsteps(16).unwrap();
    driver.set_hybrid_threshold(50, 80.0).unwrap();
    driver.set_constant_off_time_chopper(4, 36, 8, 2, false).unwrap();

    let chip = &driver.interface().registers[0];
    let chopconf = CHOPCONF::from(chip[Address::CHOPCONF.raw() as usize]);
    assert_eq!(chopconf.mres(), 4);
    assert!(chopconf.chm());
    assert_eq!(chip[Address::TPWMTHRS.raw() as usize], 187);

    // ========== Shadow-only Edits ==========
    // Nothing is written until sync()
    let writes = driver.interface().writes;
    driver.set_tpwmthrs(100, 80.0);
    driver.registers_mut().update::<TCOOLTHRS>(|r| r.set(400));
    assert_eq!(driver.interface().writes, writes);
    assert_eq!(
        driver.dirty_registers().as_slice(),
        &[Address::TPWMTHRS, Address::TCOOLTHRS]
    );

    assert_eq!(driver.sync().unwrap(), 2);
    assert!(driver.dirty_registers().is_empty());
    assert_eq!(driver.tpwmthrs(80.0), 100);
    assert_eq!(driver.interface().registers[0][Address::TPWMTHRS.raw() as usize], 93);

    // ========== Shared Bus ==========
    // Each driver names its chip; transfers happen inside a critical section
    let bus = Mutex::new(RefCell::new(FakeBus::new()));

    let mut x = Tmc5160::from_config(DriverConfig::builder().chip(0).build())
        .with_interface(SharedInterface::new(&bus));
    let mut y = Tmc5160::from_config(DriverConfig::builder().chip(1).microsteps(64).build())
        .with_interface(SharedInterface::new(&bus));

    x.hardware_init().unwrap();
    y.hardware_init().unwrap();

    critical_section::with(|cs| {
        let bus = bus.borrow_ref(cs);
        let mres = |chip: usize| {
            CHOPCONF::from(bus.registers[chip][Address::CHOPCONF.raw() as usize]).mres()
        };
        assert_eq!(mres(0), 4);
        assert_eq!(mres(1), 2);
    });
}
