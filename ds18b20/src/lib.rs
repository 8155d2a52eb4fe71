#![no_std]
use core::iter::zip;
use embedded_hal::delay::DelayNs;
use fixed::types::I12F4;
use onewire_bus::{
    OneWire, OneWireCrc, OneWireError, OneWireResult, OneWireSearch, SearchKind,
};

const DS18B20_READ_SCRATCH: u8 = 0xbe;
const DS18B20_WRITE_SCRATCH: u8 = 0x4e;
const DS18B20_COPY_SCRATCH: u8 = 0x48;
const DS18B20_START_CONV: u8 = 0x44;
const DS18B20_READ_POWERMODE: u8 = 0xb4;

const SCRATCHPAD_LEN: usize = 9;

pub type Temperature = I12F4;

/// A group of DS18B20 sensors sharing one bus, up to `N` of them.
///
/// Enumerate once, then trigger conversions for the whole group and read the
/// results back per device.
#[derive(Debug)]
pub struct Ds18b20Group<const N: usize> {
    devices: usize,
    roms: [u64; N],
    temps: [Temperature; N],
    resolution: ReadoutResolution,
    low: i8,
    high: i8,
}

impl<const N: usize> Default for Ds18b20Group<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Ds18b20Group<N> {
    #[inline]
    pub const fn family() -> u8 {
        0x28
    }

    fn new() -> Self {
        Self {
            devices: 0,
            roms: [0; N],
            temps: [Temperature::ZERO; N],
            resolution: ReadoutResolution::default(),
            low: -55,
            high: 125,
        }
    }

    pub fn with_resolution(mut self, resolution: ReadoutResolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Alarm threshold: a conversion at or below this temperature flags the device.
    pub fn with_alarm_low(mut self, temp: i8) -> Self {
        self.low = temp;
        self
    }

    /// Alarm threshold: a conversion at or above this temperature flags the device.
    pub fn with_alarm_high(mut self, temp: i8) -> Self {
        self.high = temp;
        self
    }

    /// Number of devices found by the last [enumerate](Ds18b20Group::enumerate).
    pub fn count(&self) -> usize {
        self.devices
    }

    /// ROM codes found by the last [enumerate](Ds18b20Group::enumerate).
    pub fn roms(&self) -> &[u64] {
        &self.roms[..self.devices]
    }

    /// Discovers the group's sensors and writes the alarm/resolution configuration to all
    /// of them. Returns the number of devices found.
    pub fn enumerate<O: OneWire>(&mut self, bus: &mut O) -> OneWireResult<usize, O::BusError> {
        self.devices = 0;
        let mut search = OneWireSearch::with_family(bus, SearchKind::Normal, Self::family());
        while let Some(rom) = search.next()? {
            self.roms[self.devices] = rom;
            self.devices += 1;
            if self.devices == N {
                break;
            }
        }
        if self.devices == 0 {
            return Ok(0);
        }
        // One broadcast write configures every device at once.
        bus.address(None)?;
        bus.write_byte(DS18B20_WRITE_SCRATCH)?;
        bus.write_byte(self.high as _)?;
        bus.write_byte(self.low as _)?;
        bus.write_byte(self.resolution as _)?;
        Ok(self.devices)
    }

    /// Collects the ROM codes of devices whose last conversion tripped an alarm threshold,
    /// using the conditional search. Returns how many were written into `out`.
    pub fn alarmed<O: OneWire>(
        &self,
        bus: &mut O,
        out: &mut [u64],
    ) -> OneWireResult<usize, O::BusError> {
        let mut found = 0;
        let mut search = OneWireSearch::with_family(bus, SearchKind::Alarmed, Self::family());
        while let Some(rom) = search.next()? {
            if found == out.len() {
                break;
            }
            out[found] = rom;
            found += 1;
        }
        Ok(found)
    }

    /// Persists the current scratchpad configuration of every device to EEPROM.
    pub fn save_configuration<O: OneWire>(&self, bus: &mut O) -> OneWireResult<(), O::BusError> {
        bus.address(None)?;
        bus.write_byte(DS18B20_COPY_SCRATCH)
    }

    /// Whether any device on the bus runs on parasite power.
    ///
    /// Parasite-powered devices pull the line low in answer to the power-mode query;
    /// externally powered ones let it idle high.
    pub fn any_parasite_powered<O: OneWire>(
        &self,
        bus: &mut O,
    ) -> OneWireResult<bool, O::BusError> {
        bus.address(None)?;
        bus.write_byte(DS18B20_READ_POWERMODE)?;
        Ok(!bus.read_bit()?)
    }

    /// Starts a temperature conversion on every device and waits it out.
    pub fn trigger_conversion<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
    ) -> OneWireResult<(), O::BusError> {
        bus.address(None)?;
        bus.write_byte(DS18B20_START_CONV)?;
        delay.delay_us(self.resolution.delay_us());
        Ok(())
    }

    /// Reads the scratchpad of every enumerated device and yields `(rom, temperature)`
    /// pairs.
    pub fn read_temperatures<'a, O: OneWire>(
        &'a mut self,
        bus: &mut O,
    ) -> OneWireResult<impl Iterator<Item = (u64, Temperature)> + use<'a, O, N>, O::BusError>
    {
        for i in 0..self.devices {
            let rom = self.roms[i];
            self.temps[i] = read_temperature(bus, rom)?;
        }
        Ok(zip(
            self.roms[..self.devices].iter().copied(),
            self.temps[..self.devices].iter().copied(),
        ))
    }
}

/// Reads one device's scratchpad and decodes the temperature.
///
/// An all-ones scratchpad means nothing drove the line: the device dropped off the bus
/// ([NoDevicePresent](OneWireError::NoDevicePresent)). A failed checksum on otherwise live
/// data is reported as [CrcMismatch](OneWireError::CrcMismatch); the two conditions are
/// never conflated.
pub fn read_temperature<O: OneWire>(
    bus: &mut O,
    rom: u64,
) -> OneWireResult<Temperature, O::BusError> {
    bus.address(Some(rom))?;
    bus.write_byte(DS18B20_READ_SCRATCH)?;
    let mut buf = [0u8; SCRATCHPAD_LEN];
    for b in buf.iter_mut() {
        *b = bus.read_byte()?;
    }
    if buf.iter().all(|&b| b == 0xff) {
        return Err(OneWireError::NoDevicePresent);
    }
    if !OneWireCrc::validate(&buf) {
        return Err(OneWireError::CrcMismatch);
    }
    Ok(I12F4::from_le_bytes([buf[0], buf[1]]))
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadoutResolution {
    Resolution9bit = 0x1f,
    Resolution10bit = 0x3f,
    Resolution11bit = 0x5f,
    Resolution12bit = 0x7f,
}

impl Default for ReadoutResolution {
    fn default() -> Self {
        Self::Resolution12bit
    }
}

impl ReadoutResolution {
    /// Worst-case conversion time at this resolution.
    pub(crate) fn delay_us(&self) -> u32 {
        use ReadoutResolution::*;
        match self {
            Resolution9bit => 93750,
            Resolution10bit => 187500,
            Resolution11bit => 375000,
            Resolution12bit => 750000,
        }
    }
}

impl TryFrom<u8> for ReadoutResolution {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use ReadoutResolution::*;
        match value {
            0x1f => Ok(Resolution9bit),
            0x3f => Ok(Resolution10bit),
            0x5f => Ok(Resolution11bit),
            0x7f => Ok(Resolution12bit),
            _ => Err("Invalid readout resolution"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onewire_bus::OneWireStatus;

    extern crate std;
    use std::collections::VecDeque;
    use std::vec;

    struct ScriptStatus;

    impl OneWireStatus for ScriptStatus {
        fn presence(&self) -> bool {
            true
        }
    }

    /// A bus that answers byte reads from a canned script; everything else is accepted.
    struct ScriptBus {
        reads: VecDeque<u8>,
    }

    impl OneWire for ScriptBus {
        type Status = ScriptStatus;
        type BusError = core::convert::Infallible;

        fn reset(&mut self) -> OneWireResult<ScriptStatus, Self::BusError> {
            Ok(ScriptStatus)
        }

        fn write_byte(&mut self, _byte: u8) -> OneWireResult<(), Self::BusError> {
            Ok(())
        }

        fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
            Ok(self.reads.pop_front().unwrap_or(0xff))
        }

        fn write_bit(&mut self, _bit: bool) -> OneWireResult<(), Self::BusError> {
            Ok(())
        }

        fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
            Ok(true)
        }

        fn get_overdrive_mode(&mut self) -> bool {
            false
        }
    }

    fn scratchpad(temp_lsb: u8, temp_msb: u8) -> [u8; SCRATCHPAD_LEN] {
        let mut pad = [temp_lsb, temp_msb, 0x4b, 0x46, 0x7f, 0xff, 0x02, 0x10, 0x00];
        pad[8] = OneWireCrc::compute(&pad[..8]);
        pad
    }

    #[test]
    fn decodes_positive_and_negative_temperatures() {
        // +25.0625 C and -10.125 C, straight from the datasheet conversion table.
        let mut bus = ScriptBus {
            reads: scratchpad(0x91, 0x01).into_iter().collect(),
        };
        let t = read_temperature(&mut bus, 0x28).unwrap();
        assert_eq!(t, Temperature::from_num(25.0625));

        let mut bus = ScriptBus {
            reads: scratchpad(0x5e, 0xff).into_iter().collect(),
        };
        let t = read_temperature(&mut bus, 0x28).unwrap();
        assert_eq!(t, Temperature::from_num(-10.125));
    }

    #[test]
    fn absent_device_and_corrupt_readout_stay_distinct() {
        // Nothing drives the line: all ones.
        let mut bus = ScriptBus {
            reads: vec![0xff; SCRATCHPAD_LEN].into(),
        };
        assert!(matches!(
            read_temperature(&mut bus, 0x28),
            Err(OneWireError::NoDevicePresent)
        ));

        // Live data with a flipped bit: a checksum fault, not an absence.
        let mut pad = scratchpad(0x91, 0x01);
        pad[1] ^= 0x08;
        let mut bus = ScriptBus {
            reads: pad.into_iter().collect(),
        };
        assert!(matches!(
            read_temperature(&mut bus, 0x28),
            Err(OneWireError::CrcMismatch)
        ));
    }

    #[test]
    fn resolution_round_trips_and_orders_delays() {
        for res in [
            ReadoutResolution::Resolution9bit,
            ReadoutResolution::Resolution10bit,
            ReadoutResolution::Resolution11bit,
            ReadoutResolution::Resolution12bit,
        ] {
            assert_eq!(ReadoutResolution::try_from(res as u8), Ok(res));
        }
        assert!(ReadoutResolution::try_from(0x00).is_err());
        assert!(
            ReadoutResolution::Resolution9bit.delay_us()
                < ReadoutResolution::Resolution12bit.delay_us()
        );
    }
}
