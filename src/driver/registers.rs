//! TMC5160 register map and bitfield value types.
//!
//! Each register is a `u32` newtype whose accessors pack and unpack the
//! hardware fields. Field positions follow section 6 of the TMC5160 datasheet.
//!
//! Registers are declared in shadow-table order: the core block ends at
//! [`Address::LOST_STEPS`], the extended registers (`XDIRECT`, the microstep
//! lookup table and `ENCM_CTRL`) follow it.

#![allow(non_camel_case_types)]

use bitfield::bitfield;

use crate::driver::error::UnknownAddress;

/// How the chip exposes a register on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    /// Status register; writing it has no effect.
    ReadOnly,
    /// Configuration register that reads back as zero or garbage.
    WriteOnly,
    /// Configuration register with valid read-back.
    ReadWrite,
    /// Flags are cleared by reading (or by writing ones).
    ReadClear,
}

/// Implemented for every register value type.
pub trait Register: Copy + From<u32> + Into<u32> {
    const ADDRESS: Address;
}

macro_rules! register_map {
    ($( $name:ident = $addr:literal, $access:ident; )*) => {
        /// Number of registers held in the shadow table.
        pub const REGISTER_COUNT: usize = [$(stringify!($name)),*].len();

        /// Register addresses, declared in shadow-table order.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u8)]
        pub enum Address {
            $( $name = $addr, )*
        }

        impl Address {
            /// Every register in shadow-table order.
            pub const ALL: [Address; REGISTER_COUNT] = [$(Address::$name),*];

            /// Bus access class of this register.
            pub const fn access(self) -> Access {
                match self {
                    $( Address::$name => Access::$access, )*
                }
            }
        }

        impl TryFrom<u8> for Address {
            type Error = UnknownAddress;

            fn try_from(raw: u8) -> Result<Self, Self::Error> {
                match raw {
                    $( $addr => Ok(Address::$name), )*
                    _ => Err(UnknownAddress(raw)),
                }
            }
        }

        $(
            impl Register for $name {
                const ADDRESS: Address = Address::$name;
            }

            impl From<u32> for $name {
                fn from(raw: u32) -> Self {
                    $name(raw)
                }
            }

            impl From<$name> for u32 {
                fn from(reg: $name) -> u32 {
                    reg.0
                }
            }
        )*
    };
}

register_map! {
    GCONF = 0x00, ReadWrite;
    GSTAT = 0x01, ReadClear;
    IOIN = 0x04, ReadOnly;
    IHOLD_IRUN = 0x10, WriteOnly;
    TPOWERDOWN = 0x11, WriteOnly;
    TSTEP = 0x12, ReadOnly;
    TPWMTHRS = 0x13, WriteOnly;
    TCOOLTHRS = 0x14, WriteOnly;
    THIGH = 0x15, WriteOnly;
    VDCMIN = 0x33, WriteOnly;
    MSCNT = 0x6A, ReadOnly;
    MSCURACT = 0x6B, ReadOnly;
    CHOPCONF = 0x6C, ReadWrite;
    COOLCONF = 0x6D, WriteOnly;
    DCCTRL = 0x6E, WriteOnly;
    DRV_STATUS = 0x6F, ReadOnly;
    PWMCONF = 0x70, WriteOnly;
    PWM_SCALE = 0x71, ReadOnly;
    LOST_STEPS = 0x73, ReadOnly;
    XDIRECT = 0x2D, ReadWrite;
    MSLUT0 = 0x60, WriteOnly;
    MSLUT1 = 0x61, WriteOnly;
    MSLUT2 = 0x62, WriteOnly;
    MSLUT3 = 0x63, WriteOnly;
    MSLUT4 = 0x64, WriteOnly;
    MSLUT5 = 0x65, WriteOnly;
    MSLUT6 = 0x66, WriteOnly;
    MSLUT7 = 0x67, WriteOnly;
    MSLUTSEL = 0x68, WriteOnly;
    MSLUTSTART = 0x69, WriteOnly;
    ENCM_CTRL = 0x72, WriteOnly;
}

impl Address {
    /// Position of this register in the shadow table.
    pub const fn index(self) -> usize {
        let mut i = 0;
        while i < REGISTER_COUNT {
            if Address::ALL[i] as u8 == self as u8 {
                return i;
            }
            i += 1;
        }
        // every variant is listed in ALL
        REGISTER_COUNT
    }

    /// Raw 7-bit bus address.
    #[inline]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

// Register Declarations
// --------------------------------------------------------

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct GCONF(u32);
    impl Debug;
    u32;
    pub recalibrate, set_recalibrate: 0;
    pub faststandstill, set_faststandstill: 1;
    pub en_pwm_mode, set_en_pwm_mode: 2;
    pub multistep_filt, set_multistep_filt: 3;
    pub shaft, set_shaft: 4;
    pub diag0_error, set_diag0_error: 5;
    pub diag0_otpw, set_diag0_otpw: 6;
    pub diag0_stall, set_diag0_stall: 7;
    pub diag1_stall, set_diag1_stall: 8;
    pub diag1_index, set_diag1_index: 9;
    pub diag1_onstate, set_diag1_onstate: 10;
    pub diag1_steps_skipped, set_diag1_steps_skipped: 11;
    pub diag0_int_pushpull, set_diag0_int_pushpull: 12;
    pub diag1_poscomp_pushpull, set_diag1_poscomp_pushpull: 13;
    pub small_hysteresis, set_small_hysteresis: 14;
    pub stop_enable, set_stop_enable: 15;
    pub direct_mode, set_direct_mode: 16;
    pub test_mode, set_test_mode: 17;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct GSTAT(u32);
    impl Debug;
    u8;
    pub reset, _: 0;
    pub drv_err, _: 1;
    pub uv_cp, _: 2;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct IOIN(u32);
    impl Debug;
    u8;
    pub refl_step, _: 0;
    pub refr_dir, _: 1;
    pub encb_dcen_cfg4, _: 2;
    pub enca_dcin_cfg5, _: 3;
    pub drv_enn, _: 4;
    pub enc_n_dco_cfg6, _: 5;
    pub sd_mode, _: 6;
    pub swcomp_in, _: 7;
    pub version, _: 31, 24;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct IHOLD_IRUN(u32);
    impl Debug;
    u8;
    pub ihold, set_ihold: 4, 0;
    pub irun, set_irun: 12, 8;
    pub iholddelay, set_iholddelay: 19, 16;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct TPOWERDOWN(u32);
    impl Debug;
    u8;
    pub get, set: 7, 0;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct TSTEP(u32);
    impl Debug;
    u32;
    pub get, _: 19, 0;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct TPWMTHRS(u32);
    impl Debug;
    u32;
    pub get, set: 19, 0;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct TCOOLTHRS(u32);
    impl Debug;
    u32;
    pub get, set: 19, 0;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct THIGH(u32);
    impl Debug;
    u32;
    pub get, set: 19, 0;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct VDCMIN(u32);
    impl Debug;
    u32;
    pub get, set: 22, 0;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct MSCNT(u32);
    impl Debug;
    u16;
    pub get, _: 9, 0;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct MSCURACT(u32);
    impl Debug;
    i16;
    pub cur_a, _: 8, 0;
    pub cur_b, _: 24, 16;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct CHOPCONF(u32);
    impl Debug;
    u8;
    pub toff, set_toff: 3, 0;
    pub hstrt, set_hstrt: 6, 4;
    pub hend, set_hend: 10, 7;
    pub fd3, set_fd3: 11;
    pub disfdcc, set_disfdcc: 12;
    pub rndtf, set_rndtf: 13;
    pub chm, set_chm: 14;
    pub tbl, set_tbl: 16, 15;
    pub vsense, set_vsense: 17;
    pub vhighfs, set_vhighfs: 18;
    pub vhighchm, set_vhighchm: 19;
    pub tpfd, set_tpfd: 23, 20;
    pub mres, set_mres: 27, 24;
    pub intpol, set_intpol: 28;
    pub dedge, set_dedge: 29;
    pub diss2g, set_diss2g: 30;
    pub diss2vs, set_diss2vs: 31;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct COOLCONF(u32);
    impl Debug;
    u8;
    pub semin, set_semin: 3, 0;
    pub seup, set_seup: 6, 5;
    pub semax, set_semax: 11, 8;
    pub sedn, set_sedn: 14, 13;
    pub seimin, set_seimin: 15;
    i8;
    pub sgt, set_sgt: 22, 16;
    pub sfilt, set_sfilt: 24;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct DCCTRL(u32);
    impl Debug;
    u16;
    pub dc_time, set_dc_time: 9, 0;
    u8;
    pub dc_sg, set_dc_sg: 23, 16;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct DRV_STATUS(u32);
    impl Debug;
    u16;
    pub sg_result, _: 9, 0;
    pub s2vsa, _: 12;
    pub s2vsb, _: 13;
    pub stealth, _: 14;
    pub fsactive, _: 15;
    u8;
    pub cs_actual, _: 20, 16;
    pub stallguard, _: 24;
    pub ot, _: 25;
    pub otpw, _: 26;
    pub s2ga, _: 27;
    pub s2gb, _: 28;
    pub ola, _: 29;
    pub olb, _: 30;
    pub stst, _: 31;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct PWMCONF(u32);
    impl Debug;
    u8;
    pub pwm_ofs, set_pwm_ofs: 7, 0;
    pub pwm_grad, set_pwm_grad: 15, 8;
    pub pwm_freq, set_pwm_freq: 17, 16;
    pub pwm_autoscale, set_pwm_autoscale: 18;
    pub pwm_autograd, set_pwm_autograd: 19;
    pub freewheel, set_freewheel: 21, 20;
    pub pwm_reg, set_pwm_reg: 27, 24;
    pub pwm_lim, set_pwm_lim: 31, 28;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct PWM_SCALE(u32);
    impl Debug;
    u8;
    pub pwm_scale_sum, _: 7, 0;
    i16;
    pub pwm_scale_auto, _: 24, 16;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct LOST_STEPS(u32);
    impl Debug;
    u32;
    pub get, _: 19, 0;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct XDIRECT(u32);
    impl Debug;
    i16;
    pub coil_a, set_coil_a: 8, 0;
    pub coil_b, set_coil_b: 24, 16;
}

macro_rules! lookup_table_words {
    ($($n:literal),*) => {
        paste::paste! {
            $(
                #[doc = "Microstep lookup table word " $n "."]
                #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
                #[cfg_attr(feature = "defmt", derive(defmt::Format))]
                pub struct [<MSLUT $n>](pub u32);
            )*
        }
    };
}

lookup_table_words!(0, 1, 2, 3, 4, 5, 6, 7);

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct MSLUTSEL(u32);
    impl Debug;
    u8;
    pub w0, set_w0: 1, 0;
    pub w1, set_w1: 3, 2;
    pub w2, set_w2: 5, 4;
    pub w3, set_w3: 7, 6;
    pub x1, set_x1: 15, 8;
    pub x2, set_x2: 23, 16;
    pub x3, set_x3: 31, 24;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct MSLUTSTART(u32);
    impl Debug;
    u8;
    pub start_sin, set_start_sin: 7, 0;
    pub start_sin90, set_start_sin90: 23, 16;
}

bitfield! {
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct ENCM_CTRL(u32);
    impl Debug;
    u8;
    pub inv, set_inv: 0;
    pub maxspeed, set_maxspeed: 1;
}

bitfield! {
    /// Status byte the chip shifts out with every SPI datagram.
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct SpiStatus(u8);
    impl Debug;
    u8;
    pub reset_flag, _: 0;
    pub driver_error, _: 1;
    pub sg2, _: 2;
    pub standstill, _: 3;
    pub velocity_reached, _: 4;
    pub position_reached, _: 5;
    pub status_stop_l, _: 6;
    pub status_stop_r, _: 7;
}

impl From<u8> for SpiStatus {
    fn from(raw: u8) -> Self {
        SpiStatus(raw)
    }
}
