/// 1-Wire communication error type.
///
/// "Device absent" ([NoDevicePresent](OneWireError::NoDevicePresent)) and "device present but
/// the read was corrupted" ([CrcMismatch](OneWireError::CrcMismatch)) are distinct variants;
/// callers can always tell the two apart.
#[derive(Debug)]
pub enum OneWireError<E> {
    /// Encapsulates the error type of the underlying transport.
    Bus(E),
    /// No device responded with a presence pulse after a bus reset.
    NoDevicePresent,
    /// A short circuit was detected on the bus.
    ShortCircuit,
    /// The bus is in overdrive mode and the requested operation only runs at standard speed.
    InvalidSpeed,
    /// The operation is not implemented by the transport, such as reading a triplet on a
    /// transport without a hardware search primitive.
    Unimplemented,
    /// The CRC-8 computed over the received bytes is invalid.
    CrcMismatch,
}

impl<E> From<E> for OneWireError<E> {
    fn from(other: E) -> Self {
        Self::Bus(other)
    }
}
