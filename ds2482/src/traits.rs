use crate::{Ds2482, Ds2482Error};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};

/// Wire addressing of a DS2482 register.
pub trait Addressing {
    /// Function command that writes this register.
    const WRITE_ADDR: u8;
    /// Read-pointer code that selects this register for reading.
    const READ_PTR: u8;
}

/// Trait for moving register values between the host and the DS2482.
pub trait Interact: Addressing {
    /// Read the register value from the DS2482.
    fn read<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>>;
    /// Write the register value to the DS2482.
    fn write<I: I2c<SevenBitAddress>, D: DelayNs>(
        &mut self,
        dev: &mut Ds2482<I, D>,
    ) -> Result<(), Ds2482Error<I::Error>>;
}
