#![allow(async_fn_in_trait)]
use crate::{Ds2482Error, registers_async::Ds2482Async, traits::Addressing};
use embedded_hal_async::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// Trait for moving register values between the host and the DS2482 asynchronously.
pub trait InteractAsync: Addressing {
    /// Read the register value from the DS2482 asynchronously.
    async fn async_read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>>;
    /// Write the register value to the DS2482 asynchronously.
    async fn async_write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482Async<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>>;
}
