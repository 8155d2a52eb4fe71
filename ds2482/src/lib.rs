#![no_std]
#![deny(missing_docs)]

/*! # DS2482
 *
 * A driver for the Analog Devices/Maxim DS2482-100 (and -800) I2C to 1-Wire bridge.
 *
 * The bridge executes 1-Wire timing in hardware; the host drives it through a handful of
 * I2C-addressable registers and function commands. This crate exposes the chip through the
 * [OneWire]/[OneWireAsync] traits of `onewire-bus`, including the hardware-assisted search
 * triplet (`1WT`, behind the `triplet-read` feature), so the generic ROM search engine runs
 * unmodified on top of it. The eight-channel DS2482-800's channel multiplexer is available
 * behind the `ds2482-800` feature.
 */

pub use onewire_bus::{OneWire, OneWireAsync, OneWireError, OneWireResult, OneWireStatus};
mod error;
mod onewire;
mod onewire_async;
mod registers;
mod registers_async;
mod traits;
mod traits_async;

pub use error::Ds2482Error;
#[cfg(feature = "ds2482-800")]
pub use registers::Channel;
pub use registers::{DeviceConfiguration, DeviceStatus, Ds2482, Ds2482Builder};
pub use registers_async::Ds2482Async;
pub use traits::{Addressing, Interact};
pub use traits_async::InteractAsync;

/// Results of DS2482-specific function calls.
pub type Ds2482Result<T, E> = Result<T, Ds2482Error<E>>;
