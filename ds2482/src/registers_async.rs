use crate::{
    DeviceConfiguration, DeviceStatus, Ds2482Error, Ds2482Result,
    registers::{BASE_ADDR, DEVICE_RST_CMD, DEVICE_STATUS_PTR, READ_PTR_CMD},
    traits::Addressing,
    traits_async::InteractAsync,
};
use embedded_hal_async::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// A DS2482 I2C to 1-Wire bridge device, asynchronous flavor.
///
/// Takes ownership of an I2C bus (implementing the
/// [`I2c`](embedded_hal_async::i2c::I2c) trait) and a timer object implementing the
/// [`DelayNs`](embedded_hal_async::delay::DelayNs) trait. Call
/// [device_reset](Ds2482Async::device_reset) and write a [DeviceConfiguration] before the
/// first 1-Wire operation.
pub struct Ds2482Async<I, D> {
    pub(crate) i2c: I,
    pub(crate) addr: u8,
    pub(crate) delay: D,
    pub(crate) retries: u8,
    pub(crate) overdrive: bool,
}

impl<I, D> Ds2482Async<I, D> {
    /// Creates a new instance of [Ds2482Async] with the given I2C interface.
    pub fn new(i2c: I, delay: D) -> Self {
        Self {
            i2c,
            addr: BASE_ADDR,
            delay,
            retries: 100,
            overdrive: false,
        }
    }

    /// Sets the 7-bit I2C address matching the AD0/AD1 strap pins (0x18 through 0x1b).
    pub fn with_address(mut self, addr: u8) -> Self {
        self.addr = addr;
        self
    }

    /// Sets the retry count bounding every busy-wait poll loop.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds2482Async<I, D> {
    /// Get the status of the device.
    pub async fn get_status(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        let mut stat = DeviceStatus::default();
        stat.async_read(self).await?;
        Ok(stat)
    }

    /// Reset the device; see [Ds2482::device_reset](crate::Ds2482::device_reset).
    pub async fn device_reset(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        self.i2c.write(self.addr, &[DEVICE_RST_CMD]).await?;
        let mut tries = 0;
        let status = loop {
            let mut buf = [0u8; 1];
            self.i2c.read(self.addr, &mut buf).await?;
            let status = DeviceStatus::from(buf[0]);
            if status.device_reset() || tries > self.retries {
                break status;
            }
            tries += 1;
            self.delay.delay_ms(1).await;
        };
        if !status.device_reset() {
            Err(Ds2482Error::RetriesExceeded)
        } else {
            Ok(status)
        }
    }

    /// Polls the status register until the 1-Wire line goes idle.
    pub(crate) async fn onewire_wait(&mut self) -> Ds2482Result<DeviceStatus, I::Error> {
        self.i2c
            .write(self.addr, &[READ_PTR_CMD, DEVICE_STATUS_PTR])
            .await?;
        let mut tries = 0;
        let status = loop {
            let mut buf = [0u8; 1];
            self.i2c.read(self.addr, &mut buf).await?;
            let status = DeviceStatus::from(buf[0]);
            if !status.onewire_busy() || tries > self.retries {
                break status;
            }
            tries += 1;
            self.delay.delay_ms(1).await;
        };
        if status.onewire_busy() {
            Err(Ds2482Error::RetriesExceeded)
        } else {
            Ok(status)
        }
    }
}

impl InteractAsync for DeviceStatus {
    async fn async_read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        let mut buf = [0u8; 1];
        dev.i2c
            .write_read(dev.addr, &[READ_PTR_CMD, Self::READ_PTR], &mut buf)
            .await?;
        *self = DeviceStatus::from(buf[0]);
        Ok(())
    }

    async fn async_write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        _dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        Ok(())
    }
}

impl InteractAsync for DeviceConfiguration {
    async fn async_read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        let mut buf = [0u8; 1];
        dev.i2c
            .write_read(dev.addr, &[READ_PTR_CMD, Self::READ_PTR], &mut buf)
            .await?;
        *self = DeviceConfiguration::from(buf[0]);
        Ok(())
    }

    async fn async_write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>> {
        dev.onewire_wait().await?;
        let mut buf = [0u8; 1];
        dev.i2c
            .write_read(dev.addr, &[Self::WRITE_ADDR, self.wire_byte()], &mut buf)
            .await?;
        *self = DeviceConfiguration::from(buf[0]);
        Ok(())
    }
}
