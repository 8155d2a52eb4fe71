#[derive(Debug)]
/// DS2482 hardware errors.
pub enum Ds2482Error<E> {
    /// I2C bus errors.
    I2c(E),
    /// Busy-wait retries exceeded.
    ///
    /// The 1WB (or RST) status bit never cleared within the configured retry budget. This
    /// is a fatal abort of the current operation, not a resumable wait.
    RetriesExceeded,
    /// The channel-selection readback did not match the requested channel.
    ChannelMismatch,
}

impl<E> From<E> for Ds2482Error<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}
