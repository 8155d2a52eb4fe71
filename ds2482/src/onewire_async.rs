use crate::{
    DeviceConfiguration, Ds2482Error, InteractAsync,
    onewire::{ONEWIRE_READ_BYTE, ONEWIRE_RESET_CMD, ONEWIRE_SINGLE_BIT, ONEWIRE_WRITE_BYTE},
    registers::{READ_DATA_PTR, READ_PTR_CMD},
    registers_async::Ds2482Async,
};
use embedded_hal_async::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use onewire_bus::{OneWireAsync, OneWireError, OneWireResult, consts::ONEWIRE_SKIP_ROM_CMD_OD};

impl<I2C: I2c<SevenBitAddress>, D: DelayNs> OneWireAsync for Ds2482Async<I2C, D> {
    type Status = crate::DeviceStatus;

    type BusError = Ds2482Error<I2C::Error>;

    async fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        self.onewire_wait().await?;
        self.i2c
            .write(self.addr, &[ONEWIRE_RESET_CMD])
            .await
            .map_err(Ds2482Error::from)?;
        Ok(self.onewire_wait().await?)
    }

    async fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        self.onewire_wait().await?;
        self.i2c
            .write(self.addr, &[ONEWIRE_WRITE_BYTE, byte])
            .await
            .map_err(Ds2482Error::from)?;
        Ok(())
    }

    async fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        self.onewire_wait().await?;
        self.i2c
            .write(self.addr, &[ONEWIRE_READ_BYTE])
            .await
            .map_err(Ds2482Error::from)?;
        self.onewire_wait().await?;
        let mut val = [0u8; 1];
        self.i2c
            .write_read(self.addr, &[READ_PTR_CMD, READ_DATA_PTR], &mut val)
            .await
            .map_err(Ds2482Error::from)?;
        Ok(val[0])
    }

    async fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        self.onewire_wait().await?;
        self.i2c
            .write(
                self.addr,
                &[ONEWIRE_SINGLE_BIT, if bit { 0x80 } else { 0x0 }],
            )
            .await
            .map_err(Ds2482Error::from)?;
        Ok(())
    }

    async fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        self.write_bit(true).await?;
        Ok(self.onewire_wait().await?.single_bit_result())
    }

    #[cfg(feature = "triplet-read")]
    async fn read_triplet(
        &mut self,
        direction: bool,
    ) -> OneWireResult<(bool, bool, bool), Self::BusError> {
        self.onewire_wait().await?;
        self.i2c
            .write(
                self.addr,
                &[crate::onewire::ONEWIRE_TRIPLET, if direction { 0x80 } else { 0x0 }],
            )
            .await
            .map_err(Ds2482Error::from)?;
        let status = self.onewire_wait().await?;
        Ok((
            status.single_bit_result(),
            status.triplet_second_bit(),
            status.branch_dir_taken(),
        ))
    }

    fn get_overdrive_mode(&mut self) -> bool {
        self.overdrive
    }

    async fn set_overdrive_mode(&mut self, enable: bool) -> OneWireResult<(), Self::BusError> {
        if enable == self.overdrive {
            return Ok(());
        }
        let mut config = DeviceConfiguration::new();
        config.async_read(self).await.map_err(OneWireError::Bus)?;
        if enable {
            self.reset().await?;
            self.write_byte(ONEWIRE_SKIP_ROM_CMD_OD).await?;
        }
        config.set_onewire_speed(enable);
        config.async_write(self).await.map_err(OneWireError::Bus)?;
        self.overdrive = enable;
        self.reset().await?;
        Ok(())
    }
}
