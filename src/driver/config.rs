use crate::driver::{
    helpers::{microsteps_is_valid, to_mres},
    registers::*,
    table::RegisterTable,
};

// Driver defaults
// --------------------------------------------------------

pub const DEFAULT_F_CLK: u32 = 12_000_000;
pub const DEFAULT_R_SENSE: u16 = 75;
pub const DEFAULT_CURRENT: u16 = 500;
pub const DEFAULT_HOLD_CURRENT_PCT: u8 = 50;
pub const DEFAULT_MICROSTEPS: u16 = 16;
pub const DEFAULT_COOLSTEP_ENABLE: bool = false;

// Register defaults
// --------------------------------------------------------

pub const DEFAULT_COOLSTEP_SEMIN: u8 = 5;
pub const DEFAULT_COOLSTEP_SEMAX: u8 = 2;

pub const DEFAULT_INTERPOLATE: bool = true;
pub const DEFAULT_CONSTANT_OFF_TIME: u8 = 5;
pub const DEFAULT_BLANK_TIME: u8 = 1;
pub const DEFAULT_RANDOM_TOFF: bool = true;
pub const DEFAULT_HSTRT: u8 = 3;
pub const DEFAULT_HEND: u8 = 2;

pub const DEFAULT_IRUN: u8 = 31;
pub const DEFAULT_IHOLD: u8 = 16;
pub const DEFAULT_IHOLDDELAY: u8 = 6;
pub const DEFAULT_TPOWERDOWN: u8 = 128;

pub const DEFAULT_EN_PWM_MODE: bool = true;
pub const DEFAULT_PWM_AUTOSCALE: bool = true;
pub const DEFAULT_PWM_OFS: u8 = 30;
pub const DEFAULT_PWM_GRAD: u8 = 4;
pub const DEFAULT_PWM_FREQ: u8 = 1;
pub const DEFAULT_TPWMTHRS: u32 = 0;

/// Per-chip scalars that are not stored in any register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriverConfig {
    /// Identifies the chip to the transport (chip select, daisy-chain slot).
    pub chip: u8,
    /// Chip clock frequency in Hz.
    pub f_clk: u32,
    /// Sense resistor in mΩ.
    pub r_sense: u16,
    /// Run current in mA RMS.
    pub current: u16,
    /// Hold current as a percentage of the run current, 0..=100.
    pub hold_current_pct: u8,
    /// Microsteps per full step, a power of two in 1..=256.
    pub microsteps: u16,
    pub cool_step_enabled: bool,
}

impl DriverConfig {
    pub const DEFAULT: DriverConfig = DriverConfig {
        chip: 0,
        f_clk: DEFAULT_F_CLK,
        r_sense: DEFAULT_R_SENSE,
        current: DEFAULT_CURRENT,
        hold_current_pct: DEFAULT_HOLD_CURRENT_PCT,
        microsteps: DEFAULT_MICROSTEPS,
        cool_step_enabled: DEFAULT_COOLSTEP_ENABLE,
    };

    pub fn builder() -> DriverConfigBuilder {
        DriverConfigBuilder::new()
    }

    /// Shadow table holding the default register contents for this config.
    ///
    /// No register is marked dirty.
    pub fn default_registers(&self) -> RegisterTable {
        let mut table = RegisterTable::new();

        let mut gconf = GCONF::default();
        gconf.set_en_pwm_mode(DEFAULT_EN_PWM_MODE);
        table.set_gconf(gconf);

        let mut chopconf = CHOPCONF::default();
        chopconf.set_intpol(DEFAULT_INTERPOLATE);
        chopconf.set_toff(DEFAULT_CONSTANT_OFF_TIME);
        chopconf.set_chm(false);
        chopconf.set_tbl(DEFAULT_BLANK_TIME);
        chopconf.set_rndtf(DEFAULT_RANDOM_TOFF);
        chopconf.set_hstrt(DEFAULT_HSTRT);
        chopconf.set_hend(DEFAULT_HEND);
        chopconf.set_mres(to_mres(self.microsteps));
        table.set_chopconf(chopconf);

        if self.cool_step_enabled {
            let mut coolconf = COOLCONF::default();
            coolconf.set_semin(DEFAULT_COOLSTEP_SEMIN);
            coolconf.set_semax(DEFAULT_COOLSTEP_SEMAX);
            table.set_coolconf(coolconf);
        }

        let mut ihold_irun = IHOLD_IRUN::default();
        ihold_irun.set_irun(DEFAULT_IRUN);
        ihold_irun.set_ihold(DEFAULT_IHOLD);
        ihold_irun.set_iholddelay(DEFAULT_IHOLDDELAY);
        table.set_ihold_irun(ihold_irun);

        let mut tpowerdown = TPOWERDOWN::default();
        tpowerdown.set(DEFAULT_TPOWERDOWN);
        table.set_tpowerdown(tpowerdown);

        if DEFAULT_EN_PWM_MODE {
            let mut pwmconf = PWMCONF::default();
            pwmconf.set_pwm_autoscale(DEFAULT_PWM_AUTOSCALE);
            pwmconf.set_pwm_ofs(DEFAULT_PWM_OFS);
            pwmconf.set_pwm_grad(DEFAULT_PWM_GRAD);
            pwmconf.set_pwm_freq(DEFAULT_PWM_FREQ);
            table.set_pwmconf(pwmconf);
        }

        let mut tpwmthrs = TPWMTHRS::default();
        tpwmthrs.set(DEFAULT_TPWMTHRS);
        table.set_tpwmthrs(tpwmthrs);

        table.clear_all_dirty();
        table
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Builds a [`DriverConfig`] starting from the defaults.
#[derive(Debug, Clone, Copy)]
pub struct DriverConfigBuilder {
    config: DriverConfig,
}

impl Default for DriverConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: DriverConfig::DEFAULT,
        }
    }

    pub fn chip(mut self, chip: u8) -> Self {
        self.config.chip = chip;
        self
    }

    /// Clock frequency in Hz.
    pub fn f_clk(mut self, hz: u32) -> Self {
        self.config.f_clk = hz;
        self
    }

    /// Sense resistor in mΩ.
    pub fn r_sense(mut self, mohm: u16) -> Self {
        self.config.r_sense = mohm;
        self
    }

    /// Run current (mA RMS) and hold percentage.
    pub fn current(mut self, ma: u16, hold_pct: u8) -> Self {
        self.config.current = ma;
        self.config.hold_current_pct = hold_pct;
        self
    }

    pub fn microsteps(mut self, microsteps: u16) -> Self {
        self.config.microsteps = microsteps;
        self
    }

    pub fn cool_step(mut self, enabled: bool) -> Self {
        self.config.cool_step_enabled = enabled;
        self
    }

    /// Build the final config.
    ///
    /// # Panics
    /// Panics if the microstep count is not a power of two in 1..=256 or the
    /// hold percentage exceeds 100.
    pub fn build(self) -> DriverConfig {
        assert!(
            microsteps_is_valid(self.config.microsteps),
            "Microstep count {} is not a power of two in 1..=256",
            self.config.microsteps
        );
        assert!(
            self.config.hold_current_pct <= 100,
            "Hold current {}% exceeds 100%",
            self.config.hold_current_pct
        );

        self.config
    }
}
