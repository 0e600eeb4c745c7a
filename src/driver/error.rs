/// Errors reported by driver operations that touch the bus.
///
/// `E` is the error type of the installed [`RegisterInterface`](crate::driver::RegisterInterface).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError<E> {
    /// DRV_STATUS read back as all zeros or all ones: no chip on the bus.
    NotResponding { drv_status: u32 },
    /// CHOPCONF read back differs from the value just written.
    VerifyFailed { expected: u32, actual: u32 },
    /// The transport reported a failure.
    Bus(E),
}

impl<E> From<E> for DriverError<E> {
    fn from(err: E) -> Self {
        DriverError::Bus(err)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for DriverError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DriverError::NotResponding { drv_status } => {
                write!(f, "driver not responding (DRV_STATUS {drv_status:#010x})")
            }
            DriverError::VerifyFailed { expected, actual } => write!(
                f,
                "CHOPCONF verification failed: wrote {expected:#010x}, read {actual:#010x}"
            ),
            DriverError::Bus(err) => write!(f, "bus error: {err:?}"),
        }
    }
}

/// A raw byte that is not a TMC5160 register address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownAddress(pub u8);

impl core::fmt::Display for UnknownAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown register address {:#04x}", self.0)
    }
}
