#![allow(async_fn_in_trait)]
use crate::{OneWireError, OneWireResult, OneWireStatus, consts};

/// Trait for asynchronous 1-Wire communication.
///
/// The async twin of [OneWire](crate::OneWire); see that trait for the contract of each
/// operation. The [async search engine](crate::OneWireSearchAsync) is written against this
/// trait only.
pub trait OneWireAsync {
    /// The status type returned by the reset operation.
    type Status: OneWireStatus;
    /// The error type of the underlying transport, wrapped as [OneWireError::Bus].
    type BusError;

    /// Resets the 1-Wire bus and samples the presence pulse.
    async fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError>;

    /// Writes a byte to the 1-Wire bus.
    async fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError>;

    /// Reads a byte from the 1-Wire bus.
    async fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError>;

    /// Writes a single bit to the 1-Wire bus.
    async fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Reads a single bit from the 1-Wire bus.
    async fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Executes one search step: two read time slots followed by one write time slot.
    ///
    /// See [OneWire::read_triplet](crate::OneWire::read_triplet). The default implementation
    /// returns [OneWireError::Unimplemented] and the search engine falls back to bit-level
    /// reads and writes.
    async fn read_triplet(
        &mut self,
        direction: bool,
    ) -> OneWireResult<(bool, bool, bool), Self::BusError> {
        let _ = direction;
        Err(OneWireError::Unimplemented)
    }

    /// Check whether the bus is currently driven at overdrive speed.
    fn get_overdrive_mode(&mut self) -> bool;

    /// Switch the bus speed between standard and overdrive.
    async fn set_overdrive_mode(&mut self, _enable: bool) -> OneWireResult<(), Self::BusError> {
        Err(OneWireError::Unimplemented)
    }

    /// Addresses devices on the 1-Wire bus.
    ///
    /// See [OneWire::address](crate::OneWire::address).
    ///
    /// # Arguments
    /// * `rom` - The ROM code of the device to address, or [None] to address all devices.
    async fn address(&mut self, rom: Option<u64>) -> OneWireResult<(), Self::BusError> {
        let od = self.get_overdrive_mode();
        let cmd = if rom.is_some() {
            if od {
                consts::ONEWIRE_MATCH_ROM_CMD_OD
            } else {
                consts::ONEWIRE_MATCH_ROM_CMD
            }
        } else if od {
            consts::ONEWIRE_SKIP_ROM_CMD_OD
        } else {
            consts::ONEWIRE_SKIP_ROM_CMD
        };
        let status = self.reset().await?;
        if !status.presence() {
            return Err(OneWireError::NoDevicePresent);
        }
        self.write_byte(cmd).await?;
        if let Some(rom) = rom {
            for &b in rom.to_le_bytes().iter() {
                self.write_byte(b).await?;
            }
        }
        Ok(())
    }
}
