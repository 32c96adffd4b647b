//! SFR (special-function register) addresses for the CH55x family.
//!
//! Addresses are the architectural direct addresses (0x80..=0xFF). Use
//! [`Sfr`](crate::memory::Sfr) to index the 128-byte bank with them.

/// Port 0 register
pub const SFR_P0: u8 = 0x80;
/// Stack pointer: points to the top of the stack in internal RAM
pub const SFR_SP: u8 = 0x81;
/// Data pointer low byte
pub const SFR_DPL: u8 = 0x82;
/// Data pointer high byte
pub const SFR_DPH: u8 = 0x83;
/// Flash-ROM address low byte
pub const SFR_ROM_ADDR_L: u8 = 0x84;
/// Flash-ROM address high byte
pub const SFR_ROM_ADDR_H: u8 = 0x85;
/// Flash-ROM control
pub const SFR_ROM_CTRL: u8 = 0x86;
/// Power control register
pub const SFR_PCON: u8 = 0x87;
/// Timer/counter 0 and 1 control
pub const SFR_TCON: u8 = 0x88;
/// Timer/counter 0 and 1 mode
pub const SFR_TMOD: u8 = 0x89;
/// Timer 0 low byte
pub const SFR_TL0: u8 = 0x8A;
/// Timer 1 low byte
pub const SFR_TL1: u8 = 0x8B;
/// Timer 0 high byte
pub const SFR_TH0: u8 = 0x8C;
/// Timer 1 high byte
pub const SFR_TH1: u8 = 0x8D;
/// Flash-ROM data low byte
pub const SFR_ROM_DATA_L: u8 = 0x8E;
/// Flash-ROM data high byte
pub const SFR_ROM_DATA_H: u8 = 0x8F;
/// Port 1 register
pub const SFR_P1: u8 = 0x90;
/// USB type-C configuration
pub const SFR_USB_C_CTRL: u8 = 0x91;
/// Port 1 output mode
pub const SFR_P1_MOD_OC: u8 = 0x92;
/// Port 1 direction / pull-up
pub const SFR_P1_DIR_PU: u8 = 0x93;
/// Port 3 output mode
pub const SFR_P3_MOD_OC: u8 = 0x96;
/// Port 3 direction / pull-up
pub const SFR_P3_DIR_PU: u8 = 0x97;
/// UART0 control
pub const SFR_SCON: u8 = 0x98;
/// UART0 data buffer
pub const SFR_SBUF: u8 = 0x99;
/// ADC configuration
pub const SFR_ADC_CFG: u8 = 0x9A;
/// PWM2 data
pub const SFR_PWM_DATA2: u8 = 0x9B;
/// PWM1 data
pub const SFR_PWM_DATA1: u8 = 0x9C;
/// PWM control
pub const SFR_PWM_CTRL: u8 = 0x9D;
/// PWM clock divisor
pub const SFR_PWM_CK_SE: u8 = 0x9E;
/// ADC result
pub const SFR_ADC_DATA: u8 = 0x9F;
/// Port 2 register
pub const SFR_P2: u8 = 0xA0;
/// Safe-mode unlock register
pub const SFR_SAFE_MOD: u8 = 0xA1;
/// xBUS auxiliary settings
pub const SFR_XBUS_AUX: u8 = 0xA2;
/// Interrupt enable
pub const SFR_IE: u8 = 0xA8;
/// Wake-up control
pub const SFR_WAKE_CTRL: u8 = 0xA9;
/// Port 3 register
pub const SFR_P3: u8 = 0xB0;
/// Global configuration
pub const SFR_GLOBAL_CFG: u8 = 0xB1;
/// Interrupt priority
pub const SFR_IP: u8 = 0xB8;
/// Clock configuration
pub const SFR_CLOCK_CFG: u8 = 0xB9;
/// UART1 control
pub const SFR_SCON1: u8 = 0xC0;
/// UART1 data buffer
pub const SFR_SBUF1: u8 = 0xC1;
/// UART1 baud rate
pub const SFR_SBAUD1: u8 = 0xC2;
/// Touch-key control
pub const SFR_TKEY_CTRL: u8 = 0xC3;
/// Touch-key data low byte
pub const SFR_TKEY_DATL: u8 = 0xC4;
/// Touch-key data high byte
pub const SFR_TKEY_DATH: u8 = 0xC5;
/// Pin function selection
pub const SFR_PIN_FUNC: u8 = 0xC6;
/// GPIO interrupt enable
pub const SFR_GPIO_IE: u8 = 0xC7;
/// Timer 2 control
pub const SFR_T2CON: u8 = 0xC8;
/// Timer 2 mode
pub const SFR_T2MOD: u8 = 0xC9;
/// Timer 2 reload/capture low byte
pub const SFR_RCAP2L: u8 = 0xCA;
/// Timer 2 reload/capture high byte
pub const SFR_RCAP2H: u8 = 0xCB;
/// Timer 2 low byte
pub const SFR_TL2: u8 = 0xCC;
/// Timer 2 high byte
pub const SFR_TH2: u8 = 0xCD;
/// Program status word
pub const SFR_PSW: u8 = 0xD0;
/// USB device control
pub const SFR_UDEV_CTRL: u8 = 0xD1;
/// USB interrupt flags
pub const SFR_USB_INT_FG: u8 = 0xD8;
/// USB interrupt status
pub const SFR_USB_INT_ST: u8 = 0xD9;
/// Accumulator
pub const SFR_ACC: u8 = 0xE0;
/// USB interrupt enable
pub const SFR_USB_INT_EN: u8 = 0xE1;
/// USB control
pub const SFR_USB_CTRL: u8 = 0xE2;
/// USB device address
pub const SFR_USB_DEV_AD: u8 = 0xE3;
/// Extended interrupt enable (CH55x)
pub const SFR_IE_EX: u8 = 0xE8;
/// Extended interrupt priority (CH55x)
pub const SFR_IP_EX: u8 = 0xE9;
/// B register: secondary operand of MUL/DIV
pub const SFR_B: u8 = 0xF0;
/// SPI0 status
pub const SFR_SPI0_STAT: u8 = 0xF8;
/// SPI0 data
pub const SFR_SPI0_DATA: u8 = 0xF9;
/// SPI0 control
pub const SFR_SPI0_CTRL: u8 = 0xFA;
/// SPI0 clock divisor
pub const SFR_SPI0_CK_SE: u8 = 0xFB;
/// SPI0 setup
pub const SFR_SPI0_SETUP: u8 = 0xFC;
/// Reset-keep register (survives soft reset)
pub const SFR_RESET_KEEP: u8 = 0xFE;
/// Watchdog count
pub const SFR_WDOG_COUNT: u8 = 0xFF;

/// Carry flag
pub const PSW_C: u8 = 7;
/// Auxiliary carry flag: carry out of bit 3
pub const PSW_AC: u8 = 6;
/// User-defined flag 0
pub const PSW_F0: u8 = 5;
/// Register bank select 1
pub const PSW_RS1: u8 = 4;
/// Register bank select 0
pub const PSW_RS0: u8 = 3;
/// Overflow flag
pub const PSW_OV: u8 = 2;
/// User-defined flag 1 (unused by the core)
pub const PSW_F1: u8 = 1;
/// Parity flag: set when the accumulator holds an odd number of ones
pub const PSW_P: u8 = 0;

/// PSW bits that an interrupt handler is expected to hand back unchanged.
pub const PSW_PRESERVED_MASK: u8 =
    1 << PSW_C | 1 << PSW_AC | 1 << PSW_OV | 1 << PSW_RS0 | 1 << PSW_RS1;

/// IE: global enable
pub const IE_EA: u8 = 7;
/// IE: timer 2 enable
pub const IE_ET2: u8 = 5;
/// IE: UART0 enable
pub const IE_ES: u8 = 4;
/// IE: timer 1 enable
pub const IE_ET1: u8 = 3;
/// IE: external interrupt 1 enable
pub const IE_EX1: u8 = 2;
/// IE: timer 0 enable
pub const IE_ET0: u8 = 1;
/// IE: external interrupt 0 enable
pub const IE_EX0: u8 = 0;

/// TCON: timer 1 overflow
pub const TCON_TF1: u8 = 7;
/// TCON: timer 1 run
pub const TCON_TR1: u8 = 6;
/// TCON: timer 0 overflow
pub const TCON_TF0: u8 = 5;
/// TCON: timer 0 run
pub const TCON_TR0: u8 = 4;
/// TCON: external interrupt 1 request
pub const TCON_IE1: u8 = 3;
/// TCON: external interrupt 1 edge-triggered
pub const TCON_IT1: u8 = 2;
/// TCON: external interrupt 0 request
pub const TCON_IE0: u8 = 1;
/// TCON: external interrupt 0 edge-triggered
pub const TCON_IT0: u8 = 0;

/// SCON: transmit done
pub const SCON_TI: u8 = 1;
/// SCON: receive done
pub const SCON_RI: u8 = 0;
/// SCON: receive enable
pub const SCON_REN: u8 = 4;

/// T2CON: timer 2 overflow
pub const T2CON_TF2: u8 = 7;
/// T2CON: timer 2 external flag
pub const T2CON_EXF2: u8 = 6;

/// Returns the short name of a known SFR, used by the disassembler.
pub fn sfr_name(addr: u8) -> Option<&'static str> {
    Some(match addr {
        SFR_P0 => "P0",
        SFR_SP => "SP",
        SFR_DPL => "DPL",
        SFR_DPH => "DPH",
        SFR_ROM_ADDR_L => "ROM_ADDR_L",
        SFR_ROM_ADDR_H => "ROM_ADDR_H",
        SFR_ROM_CTRL => "ROM_CTRL",
        SFR_PCON => "PCON",
        SFR_TCON => "TCON",
        SFR_TMOD => "TMOD",
        SFR_TL0 => "TL0",
        SFR_TL1 => "TL1",
        SFR_TH0 => "TH0",
        SFR_TH1 => "TH1",
        SFR_ROM_DATA_L => "ROM_DATA_L",
        SFR_ROM_DATA_H => "ROM_DATA_H",
        SFR_P1 => "P1",
        SFR_USB_C_CTRL => "USB_C_CTRL",
        SFR_P1_MOD_OC => "P1_MOD_OC",
        SFR_P1_DIR_PU => "P1_DIR_PU",
        SFR_P3_MOD_OC => "P3_MOD_OC",
        SFR_P3_DIR_PU => "P3_DIR_PU",
        SFR_SCON => "SCON",
        SFR_SBUF => "SBUF",
        SFR_ADC_CFG => "ADC_CFG",
        SFR_PWM_DATA2 => "PWM_DATA2",
        SFR_PWM_DATA1 => "PWM_DATA1",
        SFR_PWM_CTRL => "PWM_CTRL",
        SFR_PWM_CK_SE => "PWM_CK_SE",
        SFR_ADC_DATA => "ADC_DATA",
        SFR_P2 => "P2",
        SFR_SAFE_MOD => "SAFE_MOD",
        SFR_XBUS_AUX => "XBUS_AUX",
        SFR_IE => "IE",
        SFR_WAKE_CTRL => "WAKE_CTRL",
        SFR_P3 => "P3",
        SFR_GLOBAL_CFG => "GLOBAL_CFG",
        SFR_IP => "IP",
        SFR_CLOCK_CFG => "CLOCK_CFG",
        SFR_SCON1 => "SCON1",
        SFR_SBUF1 => "SBUF1",
        SFR_SBAUD1 => "SBAUD1",
        SFR_TKEY_CTRL => "TKEY_CTRL",
        SFR_TKEY_DATL => "TKEY_DATL",
        SFR_TKEY_DATH => "TKEY_DATH",
        SFR_PIN_FUNC => "PIN_FUNC",
        SFR_GPIO_IE => "GPIO_IE",
        SFR_T2CON => "T2CON",
        SFR_T2MOD => "T2MOD",
        SFR_RCAP2L => "RCAP2L",
        SFR_RCAP2H => "RCAP2H",
        SFR_TL2 => "TL2",
        SFR_TH2 => "TH2",
        SFR_PSW => "PSW",
        SFR_UDEV_CTRL => "UDEV_CTRL",
        SFR_USB_INT_FG => "USB_INT_FG",
        SFR_USB_INT_ST => "USB_INT_ST",
        SFR_ACC => "ACC",
        SFR_USB_INT_EN => "USB_INT_EN",
        SFR_USB_CTRL => "USB_CTRL",
        SFR_USB_DEV_AD => "USB_DEV_AD",
        SFR_IE_EX => "IE_EX",
        SFR_IP_EX => "IP_EX",
        SFR_B => "B",
        SFR_SPI0_STAT => "SPI0_STAT",
        SFR_SPI0_DATA => "SPI0_DATA",
        SFR_SPI0_CTRL => "SPI0_CTRL",
        SFR_SPI0_CK_SE => "SPI0_CK_SE",
        SFR_SPI0_SETUP => "SPI0_SETUP",
        SFR_RESET_KEEP => "RESET_KEEP",
        SFR_WDOG_COUNT => "WDOG_COUNT",
        _ => return None,
    })
}
