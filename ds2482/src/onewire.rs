use crate::{
    DeviceConfiguration, Ds2482, Ds2482Error, Interact,
    registers::{READ_DATA_PTR, READ_PTR_CMD},
};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use onewire_bus::{OneWire, OneWireError, OneWireResult, consts::ONEWIRE_SKIP_ROM_CMD_OD};

pub(crate) const ONEWIRE_RESET_CMD: u8 = 0xb4;
pub(crate) const ONEWIRE_SINGLE_BIT: u8 = 0x87;
pub(crate) const ONEWIRE_WRITE_BYTE: u8 = 0xa5;
pub(crate) const ONEWIRE_READ_BYTE: u8 = 0x96;
#[cfg(feature = "triplet-read")]
pub(crate) const ONEWIRE_TRIPLET: u8 = 0x78;

impl<I2C: I2c<SevenBitAddress>, D: DelayNs> OneWire for Ds2482<I2C, D> {
    type Status = crate::DeviceStatus;

    type BusError = Ds2482Error<I2C::Error>;

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        self.onewire_wait()?;
        self.i2c
            .write(self.addr, &[ONEWIRE_RESET_CMD])
            .map_err(Ds2482Error::from)?;
        Ok(self.onewire_wait()?)
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        self.onewire_wait()?;
        self.i2c
            .write(self.addr, &[ONEWIRE_WRITE_BYTE, byte])
            .map_err(Ds2482Error::from)?;
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        self.onewire_wait()?;
        self.i2c
            .write(self.addr, &[ONEWIRE_READ_BYTE])
            .map_err(Ds2482Error::from)?;
        self.onewire_wait()?;
        let mut val = [0u8; 1];
        self.i2c
            .write_read(self.addr, &[READ_PTR_CMD, READ_DATA_PTR], &mut val)
            .map_err(Ds2482Error::from)?;
        Ok(val[0])
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        self.onewire_wait()?;
        self.i2c
            .write(
                self.addr,
                &[ONEWIRE_SINGLE_BIT, if bit { 0x80 } else { 0x0 }],
            )
            .map_err(Ds2482Error::from)?;
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        // A read time slot is a write-one slot with the line sampled at tMSR.
        self.write_bit(true)?;
        Ok(self.onewire_wait()?.single_bit_result())
    }

    #[cfg(feature = "triplet-read")]
    fn read_triplet(
        &mut self,
        direction: bool,
    ) -> OneWireResult<(bool, bool, bool), Self::BusError> {
        self.onewire_wait()?;
        self.i2c
            .write(
                self.addr,
                &[ONEWIRE_TRIPLET, if direction { 0x80 } else { 0x0 }],
            )
            .map_err(Ds2482Error::from)?;
        let status = self.onewire_wait()?;
        Ok((
            status.single_bit_result(),
            status.triplet_second_bit(),
            status.branch_dir_taken(),
        ))
    }

    fn get_overdrive_mode(&mut self) -> bool {
        self.overdrive
    }

    fn set_overdrive_mode(&mut self, enable: bool) -> OneWireResult<(), Self::BusError> {
        if enable == self.overdrive {
            return Ok(());
        }
        let mut config = DeviceConfiguration::new();
        config.read(self).map_err(OneWireError::Bus)?;
        if enable {
            // Devices switch to overdrive on an Overdrive-Skip ROM received at standard
            // speed; only then may the bridge itself change its timing.
            self.reset()?;
            self.write_byte(ONEWIRE_SKIP_ROM_CMD_OD)?;
        }
        config.set_onewire_speed(enable);
        config.write(self).map_err(OneWireError::Bus)?;
        self.overdrive = enable;
        self.reset()?;
        Ok(())
    }
}
