//! A `no_std`, no-alloc shadow register model for the TMC5160 stepper driver.
//!
//! The driver keeps a copy of every chip register, converts physical units
//! (mA, microsteps, mm/s) into packed register fields and pushes them over a
//! caller-supplied register transport.
//!
//! # Features
//!
//! - **Zero heap allocation** - The shadow table is a fixed array
//! - **Typed registers** - Every register is a bitfield value type
//! - **Dirty tracking** - Shadow-only edits are written on `sync()`
//! - **Pluggable transport** - Implement [`RegisterInterface`](driver::RegisterInterface)
//!   for your bus
//! - **Shared bus** - Several chips on one bus through [`SharedInterface`](driver::SharedInterface)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐         ┌──────────────────┐         ┌──────────┐
//! │   Application    │         │  Tmc5160 shadow  │         │  TMC5160 │
//! │                  │         │                  │         │          │
//! │  set_current()   │────────▶│  RegisterTable   │────────▶│  write   │
//! │  set_tpwmthrs()  │  fields │  (dirty bits)    │  sync / │          │
//! │                  │         │                  │  push   │          │
//! │  read_status()   │◀────────│  store (clean)   │◀────────│  read    │
//! └──────────────────┘         └──────────────────┘         └──────────┘
//! ```
//!
//! - **Setters with a bus** update the shadow and write the register at once
//! - **Shadow-only edits** mark registers dirty until [`sync`](driver::Tmc5160::sync)
//! - **Reads** store the chip value in the shadow without marking it dirty
//!
//! # Example
//!
//! ```rust,no_run
//! use tmc5160_shadow::prelude::*;
//!
//! struct Spi;
//!
//! impl RegisterInterface for Spi {
//!     type Error = ();
//!
//!     fn read_register(&mut self, _chip: u8, datagram: &mut Datagram) -> Result<SpiStatus, ()> {
//!         // Shift out datagram.to_spi_frame(false), then read the reply here...
//!         datagram.value = 0x8000_0000;
//!         Ok(SpiStatus::default())
//!     }
//!
//!     fn write_register(&mut self, _chip: u8, datagram: &Datagram) -> Result<SpiStatus, ()> {
//!         let _frame = datagram.to_spi_frame(true);
//!         Ok(SpiStatus::default())
//!     }
//! }
//!
//! let config = DriverConfig::builder()
//!     .r_sense(75)
//!     .current(1200, 50)
//!     .microsteps(32)
//!     .build();
//!
//! let mut driver = Tmc5160::from_config(config).with_interface(Spi);
//! driver.hardware_init().unwrap();
//! driver.set_hybrid_threshold(80, 100.0).unwrap();
//! ```

#![deny(unsafe_code)]
#![no_std]

#[macro_use]
mod fmt;

pub mod driver;

pub mod prelude {
    pub use crate::driver::prelude::*;
}
