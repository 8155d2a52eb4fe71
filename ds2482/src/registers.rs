use crate::{
    Ds2482Error, Ds2482Result,
    traits::{Addressing, Interact},
};
use bitfield_struct::bitfield;
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use onewire_bus::OneWireStatus;

pub(crate) const READ_PTR_CMD: u8 = 0xe1; // Set Read Pointer
pub(crate) const DEVICE_STATUS_PTR: u8 = 0xf0; // Status register pointer code
pub(crate) const READ_DATA_PTR: u8 = 0xe1; // Read Data register pointer code
pub(crate) const DEVICE_RST_CMD: u8 = 0xf0; // Device Reset
pub(crate) const WRITE_CONFIG_CMD: u8 = 0xd2; // Write Configuration
#[cfg(feature = "ds2482-800")]
pub(crate) const CHANNEL_SELECT_CMD: u8 = 0xc3; // Channel Select (DS2482-800 only)

/// Base 7-bit I2C address with both address straps low.
pub(crate) const BASE_ADDR: u8 = 0x18;

/// A DS2482 I2C to 1-Wire bridge device.
///
/// Takes ownership of an I2C bus (implementing the [`I2c`](embedded_hal::i2c::I2c) trait)
/// and a timer object implementing the [`DelayNs`](embedded_hal::delay::DelayNs) trait.
/// Built through [Ds2482Builder], which performs the device reset and writes the initial
/// configuration.
pub struct Ds2482<I, D> {
    pub(crate) i2c: I,
    pub(crate) addr: u8,
    pub(crate) delay: D,
    pub(crate) retries: u8,
    pub(crate) overdrive: bool,
}

/// Builder for creating a [Ds2482] instance with custom configuration.
pub struct Ds2482Builder {
    addr: u8,
    retries: u8,
    config: DeviceConfiguration,
}

impl Default for Ds2482Builder {
    fn default() -> Self {
        Ds2482Builder {
            addr: BASE_ADDR,
            retries: 100,
            // Active pullup is recommended for any bus with more than one device.
            config: DeviceConfiguration::new().with_active_pullup(true),
        }
    }
}

impl Ds2482Builder {
    /// Sets the 7-bit I2C address matching the AD0/AD1 strap pins (0x18 through 0x1b).
    pub fn with_address(mut self, addr: u8) -> Self {
        self.addr = addr;
        self
    }

    /// Sets the retry count.
    ///
    /// The retry count bounds how long the host polls a busy flag before an operation on
    /// the 1-Wire or I2C bus is abandoned with
    /// [RetriesExceeded](crate::Ds2482Error::RetriesExceeded).
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the initial device configuration.
    pub fn with_config(mut self, config: DeviceConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Builds a [Ds2482], resetting the device and writing the configuration.
    pub fn build<I: I2c<SevenBitAddress>, D: DelayNs>(
        self,
        i2c: I,
        delay: D,
    ) -> Ds2482Result<Ds2482<I, D>, I::Error> {
        let mut dev = Ds2482 {
            i2c,
            addr: self.addr,
            delay,
            retries: self.retries,
            overdrive: false,
        };
        dev.device_reset()?;
        let mut config = self.config;
        config.write(&mut dev)?;
        dev.overdrive = config.onewire_speed();
        Ok(dev)
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds2482<I, D> {
    /// Get the status of the device.
    pub fn get_status(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        let mut stat = DeviceStatus::default();
        stat.read(self)?;
        Ok(stat)
    }

    /// Reset the device.
    ///
    /// Performs a global reset of the device state machine logic and terminates any ongoing
    /// 1-Wire communication. The configuration register reverts to its power-on default and
    /// must be rewritten afterwards.
    pub fn device_reset(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        self.i2c.write(self.addr, &[DEVICE_RST_CMD])?;
        let mut tries = 0;
        let status = loop {
            let mut buf = [0u8; 1];
            self.i2c.read(self.addr, &mut buf)?;
            let status = DeviceStatus::from(buf[0]);
            if status.device_reset() || tries > self.retries {
                break status;
            }
            tries += 1;
            self.delay.delay_ms(1);
        };
        if !status.device_reset() {
            Err(Ds2482Error::RetriesExceeded)
        } else {
            Ok(status)
        }
    }

    /// Selects the active 1-Wire channel of a DS2482-800.
    ///
    /// The chip echoes a per-channel confirmation code; a mismatch is reported as
    /// [ChannelMismatch](crate::Ds2482Error::ChannelMismatch).
    #[cfg(feature = "ds2482-800")]
    pub fn select_channel(&mut self, channel: Channel) -> Ds2482Result<(), I::Error> {
        self.onewire_wait()?;
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.addr, &[CHANNEL_SELECT_CMD, channel.code()], &mut buf)?;
        if buf[0] != channel.confirmation() {
            return Err(Ds2482Error::ChannelMismatch);
        }
        Ok(())
    }

    /// Polls the status register until the 1-Wire line goes idle.
    pub(crate) fn onewire_wait(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        self.i2c
            .write(self.addr, &[READ_PTR_CMD, DEVICE_STATUS_PTR])?;
        let mut tries = 0;
        let status = loop {
            let mut buf = [0u8; 1];
            self.i2c.read(self.addr, &mut buf)?;
            let status = DeviceStatus::from(buf[0]);
            if !status.onewire_busy() || tries > self.retries {
                break status;
            }
            tries += 1;
            self.delay.delay_ms(1);
        };
        if status.onewire_busy() {
            Err(Ds2482Error::RetriesExceeded)
        } else {
            Ok(status)
        }
    }
}

/// Status register of the DS2482.
///
/// The read-only Status register is how the DS2482 reports bit-type data from the 1-Wire
/// side, 1-Wire busy status, and its own reset status to the host. All 1-Wire function
/// commands and the Device Reset command position the read pointer at the Status register
/// so the host can poll it with minimal protocol overhead.
#[bitfield(u8)]
pub struct DeviceStatus {
    /// 1WB: the 1-Wire line is busy executing a function command. Every 1-Wire command must
    /// wait for this bit to clear before the next one is issued.
    pub(crate) onewire_busy: bool,
    /// PPD: a presence pulse was detected during the last 1-Wire Reset command.
    pub(crate) presence_pulse_detect: bool,
    /// SD: a short circuit was detected during the last 1-Wire Reset command. The DS2482
    /// cannot distinguish a short from a DS1994/DS2404 signaling a 1-Wire interrupt.
    pub(crate) short_detect: bool,
    /// LL: the sampled logic level of the 1-Wire line, updated on every status read.
    pub logic_level: bool,
    /// RST: the device has performed an internal reset cycle (power-on or Device Reset
    /// command) and is waiting for a Write Configuration command.
    pub device_reset: bool,
    /// SBR: the bit sampled by the last 1-Wire Single Bit command, or the first bit of a
    /// 1-Wire Triplet command.
    pub(crate) single_bit_result: bool,
    /// TSB: the second (complement) bit sampled by the last 1-Wire Triplet command.
    pub(crate) triplet_second_bit: bool,
    /// DIR: the search direction chosen by the last 1-Wire Triplet command.
    pub(crate) branch_dir_taken: bool,
}

impl OneWireStatus for DeviceStatus {
    fn presence(&self) -> bool {
        self.presence_pulse_detect()
    }

    fn shortcircuit(&self) -> bool {
        self.short_detect()
    }

    fn logic_level(&self) -> Option<bool> {
        Some(self.logic_level())
    }

    fn direction(&self) -> Option<bool> {
        Some(self.branch_dir_taken())
    }
}

impl Addressing for DeviceStatus {
    // The status register is read-only; there is no function command that writes it.
    const WRITE_ADDR: u8 = 0x0;
    const READ_PTR: u8 = DEVICE_STATUS_PTR;
}

impl Interact for DeviceStatus {
    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        let mut buf = [0u8; 1];
        dev.i2c
            .write_read(dev.addr, &[READ_PTR_CMD, Self::READ_PTR], &mut buf)?;
        *self = DeviceStatus::from(buf[0]);
        Ok(())
    }

    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        _dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        Ok(())
    }
}

/// Configuration register of the DS2482.
///
/// Selects active pullup (APU), strong pullup (SPU), and 1-Wire speed (1WS). After a device
/// reset the register reads 0x00 and must be rewritten. On the wire the register is written
/// as its lower nibble with the one's complement of that nibble in the upper four bits; the
/// chip rejects writes where the two halves disagree.
#[bitfield(u8)]
pub struct DeviceConfiguration {
    /// APU: drive the line high through a low-impedance transistor instead of the passive
    /// pullup resistor. Recommended whenever more than one device sits on the bus.
    pub active_pullup: bool,
    _reserved: bool,
    /// SPU: apply the strong pullup after the next 1-Wire Write Byte or Single Bit command,
    /// for devices that draw conversion power from the line. Self-clearing.
    pub strong_pullup: bool,
    /// 1WS: drive the 1-Wire line at overdrive speed.
    pub onewire_speed: bool,
    #[bits(4)]
    _complement: u8,
}

impl DeviceConfiguration {
    /// The wire format of a configuration write: lower nibble plus its one's complement.
    pub(crate) fn wire_byte(self) -> u8 {
        let v = u8::from(self) & 0x0f;
        !v << 4 | v
    }
}

impl Addressing for DeviceConfiguration {
    const WRITE_ADDR: u8 = WRITE_CONFIG_CMD;
    const READ_PTR: u8 = 0xc3;
}

impl Interact for DeviceConfiguration {
    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        let mut buf = [0u8; 1];
        dev.i2c
            .write_read(dev.addr, &[READ_PTR_CMD, Self::READ_PTR], &mut buf)?;
        *self = DeviceConfiguration::from(buf[0]);
        Ok(())
    }

    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        dev.onewire_wait()?;
        let mut buf = [0u8; 1];
        dev.i2c
            .write_read(dev.addr, &[Self::WRITE_ADDR, self.wire_byte()], &mut buf)?;
        *self = DeviceConfiguration::from(buf[0]);
        Ok(())
    }
}

/// One of the eight 1-Wire channels of a DS2482-800.
#[cfg(feature = "ds2482-800")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Channel {
    /// Channel IO0.
    Io0 = 0,
    /// Channel IO1.
    Io1,
    /// Channel IO2.
    Io2,
    /// Channel IO3.
    Io3,
    /// Channel IO4.
    Io4,
    /// Channel IO5.
    Io5,
    /// Channel IO6.
    Io6,
    /// Channel IO7.
    Io7,
}

#[cfg(feature = "ds2482-800")]
impl Channel {
    /// The channel-selection code written with the Channel Select command.
    pub(crate) fn code(self) -> u8 {
        [0xf0, 0xe1, 0xd2, 0xc3, 0xb4, 0xa5, 0x96, 0x87][self as usize]
    }

    /// The confirmation code the chip echoes back for this channel.
    pub(crate) fn confirmation(self) -> u8 {
        [0xb8, 0xb1, 0xaa, 0xa3, 0x9c, 0x95, 0x8e, 0x87][self as usize]
    }
}
