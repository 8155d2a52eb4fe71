use crate::{OneWireError, OneWireResult, consts};

/// Status of the 1-Wire bus as sampled by a reset pulse.
///
/// Transports report richer status than the bare presence bit (short-circuit detection, the
/// direction taken by a hardware triplet); the provided methods default to "not available".
pub trait OneWireStatus {
    /// Whether a presence pulse was detected after the last bus reset.
    fn presence(&self) -> bool;

    /// Whether a short circuit was detected on the bus.
    fn shortcircuit(&self) -> bool {
        false
    }

    /// The sampled logic level of the 1-Wire line, if the transport reports it.
    fn logic_level(&self) -> Option<bool> {
        None
    }

    /// The search direction taken by the last hardware triplet, if the transport reports it.
    fn direction(&self) -> Option<bool> {
        None
    }
}

/// Trait for 1-Wire communication.
///
/// This trait defines the basic operations required for 1-Wire communication, such as
/// resetting the bus, writing and reading bytes, and writing and reading bits. The
/// [search engine](crate::OneWireSearch) is written against this trait only, so implementing
/// it is all a new transport needs to participate in bus enumeration.
pub trait OneWire {
    /// The status type returned by the reset operation.
    type Status: OneWireStatus;
    /// The error type of the underlying transport, wrapped as [OneWireError::Bus].
    type BusError;

    /// Resets the 1-Wire bus and samples the presence pulse.
    ///
    /// # Errors
    /// This method returns an error if the reset operation fails at the transport level.
    /// Absence of a presence pulse is reported through the returned status, not as an error.
    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError>;

    /// Writes a byte to the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError>;

    /// Reads a byte from the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError>;

    /// Writes a single bit to the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Reads a single bit from the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Executes one search step: two read time slots followed by one write time slot.
    ///
    /// The write time slot steers the still-participating devices. If the two read slots
    /// disagree, the devices all share the bit value that was read and it is written back;
    /// if both read 0, the `direction` argument decides which subtree keeps participating.
    ///
    /// The default implementation returns [OneWireError::Unimplemented]; the search engine
    /// then falls back to [read_bit](OneWire::read_bit) and [write_bit](OneWire::write_bit).
    /// Bridge chips with a hardware triplet command (e.g. the DS2482 `1WT`) override this.
    ///
    /// # Returns
    /// `(id_bit, cmp_id_bit, taken)` where `taken` is the direction actually written.
    fn read_triplet(
        &mut self,
        direction: bool,
    ) -> OneWireResult<(bool, bool, bool), Self::BusError> {
        let _ = direction;
        Err(OneWireError::Unimplemented)
    }

    /// Check whether the bus is currently driven at overdrive speed.
    fn get_overdrive_mode(&mut self) -> bool;

    /// Switch the bus speed between standard and overdrive.
    fn set_overdrive_mode(&mut self, _enable: bool) -> OneWireResult<(), Self::BusError> {
        Err(OneWireError::Unimplemented)
    }

    /// Addresses devices on the 1-Wire bus.
    ///
    /// Issues a bus reset followed by Match ROM for a specific device, or Skip ROM to address
    /// every device at once. The overdrive variants of both commands are selected when the
    /// bus is in overdrive mode. A read operation issued after a Skip ROM on a bus with more
    /// than one device returns wired-AND garbage, so only broadcast writes after passing
    /// [None].
    ///
    /// # Arguments
    /// * `rom` - The ROM code of the device to address, or [None] to address all devices.
    fn address(&mut self, rom: Option<u64>) -> OneWireResult<(), Self::BusError> {
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
        let status = self.reset()?;
        if !status.presence() {
            return Err(OneWireError::NoDevicePresent);
        }
        self.write_byte(cmd)?;
        if let Some(rom) = rom {
            for &b in rom.to_le_bytes().iter() {
                self.write_byte(b)?;
            }
        }
        Ok(())
    }
}
