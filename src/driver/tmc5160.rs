use crate::driver::{
    config::DriverConfig,
    datagram::Datagram,
    error::DriverError,
    helpers,
    interface::{NoInterface, RegisterInterface, WithInterface},
    registers::*,
    table::RegisterTable,
};

/// Registers written by [`Tmc5160::hardware_init`], in bus order.
pub const INIT_SEQUENCE: [Address; 7] = [
    Address::GCONF,
    Address::CHOPCONF,
    Address::COOLCONF,
    Address::PWMCONF,
    Address::IHOLD_IRUN,
    Address::TPOWERDOWN,
    Address::TPWMTHRS,
];

/// Shadow-register model of one TMC5160.
///
/// `IF` is either [`NoInterface`] (shadow-only operations) or
/// [`WithInterface`] once a transport has been installed with
/// [`with_interface`](Tmc5160::with_interface).
pub struct Tmc5160<IF> {
    registers: RegisterTable,
    config: DriverConfig,
    last_status: SpiStatus,
    interface: IF,
}

/// Result of a bus operation on a driver using transport `IO`.
pub type DriverResult<T, IO> = Result<T, DriverError<<IO as RegisterInterface>::Error>>;

impl Tmc5160<NoInterface> {
    /// Creates a driver holding the default configuration and register contents.
    pub fn new() -> Self {
        Self::from_config(DriverConfig::DEFAULT)
    }

    /// Creates a driver for `config`.
    ///
    /// The microstep count snaps the same way as in
    /// [`set_microsteps`](Tmc5160::set_microsteps).
    pub fn from_config(mut config: DriverConfig) -> Self {
        config.microsteps = helpers::microsteps_from_mres(helpers::to_mres(config.microsteps));
        Self {
            registers: config.default_registers(),
            config,
            last_status: SpiStatus::default(),
            interface: NoInterface,
        }
    }

    /// Installs the transport used for every bus operation.
    pub fn with_interface<IO: RegisterInterface>(self, io: IO) -> Tmc5160<WithInterface<IO>> {
        Tmc5160 {
            registers: self.registers,
            config: self.config,
            last_status: self.last_status,
            interface: WithInterface { io },
        }
    }
}

impl Default for Tmc5160<NoInterface> {
    fn default() -> Self {
        Self::new()
    }
}

impl<IF> Tmc5160<IF> {
    /// Resets the configuration scalars and the shadow table to defaults.
    ///
    /// The chip id is kept. Nothing is sent to the chip and no register is
    /// left dirty.
    pub fn load_defaults(&mut self) {
        let chip = self.config.chip;
        self.config = DriverConfig { chip, ..DriverConfig::DEFAULT };
        self.registers = self.config.default_registers();
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn registers(&self) -> &RegisterTable {
        &self.registers
    }

    /// Direct access to the shadow table. Changes reach the chip on the next
    /// [`sync`](Tmc5160::sync).
    pub fn registers_mut(&mut self) -> &mut RegisterTable {
        &mut self.registers
    }

    /// Decoded shadow value of register `R`.
    pub fn get<R: Register>(&self) -> R {
        self.registers.get()
    }

    /// Stores `reg` in the shadow table and marks it dirty.
    pub fn set<R: Register>(&mut self, reg: R) {
        self.registers.set(reg)
    }

    pub fn microsteps(&self) -> u16 {
        self.config.microsteps
    }

    /// RMS run current in mA encoded by the shadow `IRUN` and `vsense`.
    pub fn current(&self) -> u16 {
        helpers::rms_current(
            self.config.r_sense,
            self.registers.ihold_irun().irun(),
            self.registers.chopconf().vsense(),
        )
    }

    /// Returns true if `microsteps` is a power of two in `1..=256`.
    pub fn microsteps_is_valid(microsteps: u16) -> bool {
        helpers::microsteps_is_valid(microsteps)
    }

    /// Velocity in mm/s encoded by the shadow TPWMTHRS. `0` when disabled.
    pub fn tpwmthrs(&self, steps_per_mm: f32) -> u32 {
        helpers::velocity_from_tpwmthrs(
            self.config.f_clk,
            self.config.microsteps,
            self.registers.tpwmthrs().get(),
            steps_per_mm,
        )
    }

    /// Stores the TPWMTHRS value for `velocity` (mm/s) in the shadow table.
    ///
    /// The register is marked dirty but not written.
    pub fn set_tpwmthrs(&mut self, velocity: u32, steps_per_mm: f32) {
        let value = helpers::tpwmthrs_from_velocity(
            self.config.f_clk,
            self.config.microsteps,
            velocity,
            steps_per_mm,
        );
        self.registers.update::<TPWMTHRS>(|r| r.set(value));
    }

    /// Shadow datagram for `address`, found by scanning the core registers.
    ///
    /// Registers declared after `LOST_STEPS` are not found; use
    /// [`get`](Tmc5160::get) or [`RegisterTable::datagram`] for those.
    pub fn register(&self, address: Address) -> Option<&Datagram> {
        self.registers.find(address)
    }

    /// Applies `f` to the shadow value of `address` and marks it dirty.
    ///
    /// Same lookup rules as [`register`](Tmc5160::register).
    pub fn with_register_mut<R>(
        &mut self,
        address: Address,
        f: impl FnOnce(&mut u32) -> R,
    ) -> Option<R> {
        self.registers.with_found_mut(address, f)
    }

    pub fn is_dirty(&self, address: Address) -> bool {
        self.registers.is_dirty(address)
    }

    pub fn dirty_registers(&self) -> heapless::Vec<Address, REGISTER_COUNT> {
        self.registers.dirty_registers()
    }

    /// SPI status byte returned by the latest transfer.
    pub fn last_status(&self) -> SpiStatus {
        self.last_status
    }

    fn apply_current(&mut self, ma: u16, hold_pct: u8) {
        self.config.current = ma;
        self.config.hold_current_pct = hold_pct;

        let scale = helpers::current_scale(self.config.r_sense, ma);
        let ihold = helpers::hold_scale(scale.irun, hold_pct);
        debug!(
            "current {} mA: irun {} ihold {} vsense {}",
            ma, scale.irun, ihold, scale.vsense
        );

        self.registers.update::<CHOPCONF>(|r| r.set_vsense(scale.vsense));
        self.registers.update::<IHOLD_IRUN>(|r| {
            r.set_irun(scale.irun);
            r.set_ihold(ihold);
        });
    }

    fn apply_microsteps(&mut self, microsteps: u16) {
        let mres = helpers::to_mres(microsteps);
        self.config.microsteps = helpers::microsteps_from_mres(mres);
        self.registers.update::<CHOPCONF>(|r| r.set_mres(mres));
        debug!("microsteps {} (mres {})", self.config.microsteps, mres);
    }
}

impl<IO: RegisterInterface> Tmc5160<WithInterface<IO>> {
    /// Removes the transport, returning a shadow-only driver and the transport.
    pub fn release(self) -> (Tmc5160<NoInterface>, IO) {
        (
            Tmc5160 {
                registers: self.registers,
                config: self.config,
                last_status: self.last_status,
                interface: NoInterface,
            },
            self.interface.io,
        )
    }

    pub fn interface(&self) -> &IO {
        &self.interface.io
    }

    pub fn interface_mut(&mut self) -> &mut IO {
        &mut self.interface.io
    }

    /// Brings the chip to the shadow configuration and verifies it responds.
    ///
    /// DRV_STATUS reading back as all zeros or all ones means nothing answered
    /// and no register is written. After the configuration has been pushed,
    /// CHOPCONF is read back and compared against the shadow value.
    pub fn hardware_init(&mut self) -> DriverResult<(), IO> {
        trace!("hardware init, chip {}", self.config.chip);

        let drv_status = self.pull(Address::DRV_STATUS)?;
        if drv_status == 0 || drv_status == u32::MAX {
            warn!("chip {} not responding: {:#x}", self.config.chip, drv_status);
            return Err(DriverError::NotResponding { drv_status });
        }

        // reading GSTAT clears the latched reset and error flags
        self.pull(Address::GSTAT)?;

        self.apply_microsteps(self.config.microsteps);
        for address in INIT_SEQUENCE {
            self.registers.mark_dirty(address);
        }
        for address in INIT_SEQUENCE {
            self.push(address)?;
        }

        self.set_current(self.config.current, self.config.hold_current_pct)?;

        let expected: u32 = self.registers.chopconf().into();
        let actual = self.pull(Address::CHOPCONF)?;
        if actual != expected {
            warn!(
                "chip {} CHOPCONF mismatch: wrote {:#x}, read {:#x}",
                self.config.chip, expected, actual
            );
            // keep the intended value in the shadow
            self.registers.store(Address::CHOPCONF, expected);
            return Err(DriverError::VerifyFailed { expected, actual });
        }

        debug!("chip {} initialised", self.config.chip);
        Ok(())
    }

    /// Sets the RMS run current (mA) and hold current (percent of run).
    ///
    /// Writes CHOPCONF, for the sense range, then IHOLD_IRUN.
    pub fn set_current(&mut self, ma: u16, hold_pct: u8) -> DriverResult<(), IO> {
        self.apply_current(ma, hold_pct);
        self.push(Address::CHOPCONF)?;
        self.push(Address::IHOLD_IRUN)?;
        Ok(())
    }

    /// Sets the microstep resolution and writes CHOPCONF.
    ///
    /// A count that is not a power of two snaps to its largest power-of-two
    /// divisor; `0` selects full steps.
    pub fn set_microsteps(&mut self, microsteps: u16) -> DriverResult<(), IO> {
        self.apply_microsteps(microsteps);
        self.push(Address::CHOPCONF)
    }

    /// Sets the velocity (mm/s) below which stealthChop is active and writes
    /// TPWMTHRS. `0` disables the threshold.
    pub fn set_hybrid_threshold(
        &mut self,
        velocity_mm_s: u32,
        steps_per_mm: f32,
    ) -> DriverResult<(), IO> {
        let value = helpers::hybrid_threshold(
            self.config.f_clk,
            self.config.microsteps,
            velocity_mm_s,
            steps_per_mm,
        );
        self.registers.update::<TPWMTHRS>(|r| r.set(value));
        self.push(Address::TPWMTHRS)
    }

    /// Switches the chopper to constant off-time mode and writes CHOPCONF.
    ///
    /// * `off_time`: TOFF, clamped to `2..=15`.
    /// * `blank_time`: comparator blank time in clock cycles.
    /// * `fast_decay_time`: clamped to `0..=15`.
    /// * `sine_wave_offset`: clamped to `-3..=12`.
    /// * `use_current_comparator`: terminate the fast decay phase on the
    ///   current comparator instead of the timer.
    pub fn set_constant_off_time_chopper(
        &mut self,
        off_time: u8,
        blank_time: u8,
        fast_decay_time: u8,
        sine_wave_offset: i8,
        use_current_comparator: bool,
    ) -> DriverResult<(), IO> {
        let fast_decay = fast_decay_time.min(15);

        self.registers.update::<CHOPCONF>(|r| {
            r.set_chm(true);
            r.set_tbl(helpers::blank_time_bucket(blank_time));
            r.set_fd3(fast_decay & 0x08 != 0);
            r.set_hstrt(fast_decay & 0x07);
            r.set_toff(off_time.clamp(2, 15));
            r.set_hend((sine_wave_offset.clamp(-3, 12) + 3) as u8);
            r.set_rndtf(!use_current_comparator);
        });
        self.push(Address::CHOPCONF)
    }

    /// Sends `datagram` to the chip as is. The shadow table is not touched.
    pub fn write_register(&mut self, datagram: &Datagram) -> DriverResult<SpiStatus, IO> {
        let status = self.interface.io.write_register(self.config.chip, datagram)?;
        self.last_status = status;
        Ok(status)
    }

    /// Reads the register named by `datagram` from the chip into it. The
    /// shadow table is not touched.
    pub fn read_register(&mut self, datagram: &mut Datagram) -> DriverResult<SpiStatus, IO> {
        let status = self.interface.io.read_register(self.config.chip, datagram)?;
        self.last_status = status;
        Ok(status)
    }

    /// Writes every dirty register in table order and returns how many were sent.
    ///
    /// Read-only registers are not written; their flag is cleared.
    pub fn sync(&mut self) -> DriverResult<usize, IO> {
        let mut written = 0;
        for address in self.registers.dirty_registers() {
            if address.access() == Access::ReadOnly {
                self.registers.mark_clean(address);
                continue;
            }
            self.push(address)?;
            written += 1;
        }

        trace!("chip {} synced {} registers", self.config.chip, written);
        Ok(written)
    }

    /// Reads DRV_STATUS from the chip into the shadow table.
    pub fn read_status(&mut self) -> DriverResult<DRV_STATUS, IO> {
        self.pull(Address::DRV_STATUS).map(DRV_STATUS::from)
    }

    /// Writes the shadow value of `address` and marks it clean.
    fn push(&mut self, address: Address) -> DriverResult<(), IO> {
        let datagram = *self.registers.datagram(address);
        self.write_register(&datagram)?;
        self.registers.mark_clean(address);
        Ok(())
    }

    /// Reads `address` from the chip into the shadow table and marks it clean.
    fn pull(&mut self, address: Address) -> DriverResult<u32, IO> {
        let mut datagram = Datagram::new(address, 0);
        self.read_register(&mut datagram)?;
        self.registers.store(address, datagram.value);
        self.registers.mark_clean(address);
        Ok(datagram.value)
    }
}
