pub mod config;
pub mod datagram;
pub mod error;
pub mod helpers;
pub mod interface;
pub mod registers;
pub mod table;
pub mod tmc5160;

#[cfg(test)]
mod test_support;

pub use config::{DriverConfig, DriverConfigBuilder};
pub use datagram::Datagram;
pub use error::{DriverError, UnknownAddress};
pub use interface::{NoInterface, RegisterInterface, SharedInterface, WithInterface};
pub use registers::{Access, Address, REGISTER_COUNT, Register, SpiStatus};
pub use table::RegisterTable;
pub use tmc5160::{DriverResult, INIT_SEQUENCE, Tmc5160};

pub mod prelude {
    pub use super::{
        Access, Address, Datagram, DriverConfig, DriverConfigBuilder, DriverError, DriverResult,
        NoInterface, Register, RegisterInterface, RegisterTable, SharedInterface, SpiStatus,
        Tmc5160, UnknownAddress, WithInterface,
    };
}
