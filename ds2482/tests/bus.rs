//! Driver tests against recorded I2C transactions.

use ds2482::{Ds2482Builder, Ds2482Error, OneWire, OneWireError, OneWireStatus};
use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

const ADDR: u8 = 0x18;

/// Transactions of a default builder bring-up: device reset, then a configuration write
/// enabling the active pullup (0x01 with its complement nibble, 0xe1 on the wire).
fn bringup() -> Vec<I2cTransaction> {
    vec![
        I2cTransaction::write(ADDR, vec![0xf0]),
        I2cTransaction::read(ADDR, vec![0x10]),
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        I2cTransaction::read(ADDR, vec![0x00]),
        I2cTransaction::write_read(ADDR, vec![0xd2, 0xe1], vec![0x01]),
    ]
}

#[test]
fn builder_resets_and_configures_the_bridge() {
    let mut i2c = I2cMock::new(&bringup());
    Ds2482Builder::default()
        .build(i2c.clone(), NoopDelay::new())
        .expect("bring-up failed");
    i2c.done();
}

#[test]
fn bus_reset_reports_the_presence_pulse() {
    let mut expectations = bringup();
    expectations.extend([
        // reset(): wait until idle, 1WRS, wait again and collect the status.
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        I2cTransaction::read(ADDR, vec![0x00]),
        I2cTransaction::write(ADDR, vec![0xb4]),
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        I2cTransaction::read(ADDR, vec![0x02]),
    ]);
    let mut i2c = I2cMock::new(&expectations);
    let mut dev = Ds2482Builder::default()
        .build(i2c.clone(), NoopDelay::new())
        .unwrap();
    let status = dev.reset().unwrap();
    assert!(status.presence());
    assert!(!status.shortcircuit());
    i2c.done();
}

#[test]
fn byte_writes_and_reads_use_the_data_register() {
    let mut expectations = bringup();
    expectations.extend([
        // write_byte(0xcc)
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        I2cTransaction::read(ADDR, vec![0x00]),
        I2cTransaction::write(ADDR, vec![0xa5, 0xcc]),
        // read_byte()
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        I2cTransaction::read(ADDR, vec![0x00]),
        I2cTransaction::write(ADDR, vec![0x96]),
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        I2cTransaction::read(ADDR, vec![0x00]),
        I2cTransaction::write_read(ADDR, vec![0xe1, 0xe1], vec![0x42]),
    ]);
    let mut i2c = I2cMock::new(&expectations);
    let mut dev = Ds2482Builder::default()
        .build(i2c.clone(), NoopDelay::new())
        .unwrap();
    dev.write_byte(0xcc).unwrap();
    assert_eq!(dev.read_byte().unwrap(), 0x42);
    i2c.done();
}

#[cfg(feature = "triplet-read")]
#[test]
fn triplet_reports_both_sampled_bits_and_the_taken_direction() {
    let mut expectations = bringup();
    expectations.extend([
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        I2cTransaction::read(ADDR, vec![0x00]),
        I2cTransaction::write(ADDR, vec![0x78, 0x80]),
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        // SBR and DIR set, TSB clear.
        I2cTransaction::read(ADDR, vec![0xa0]),
    ]);
    let mut i2c = I2cMock::new(&expectations);
    let mut dev = Ds2482Builder::default()
        .build(i2c.clone(), NoopDelay::new())
        .unwrap();
    assert_eq!(dev.read_triplet(true).unwrap(), (true, false, true));
    i2c.done();
}

#[test]
fn a_stuck_busy_flag_aborts_with_retries_exceeded() {
    let mut expectations = bringup();
    expectations.extend([
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        // 1WB never clears: initial read plus one retry per allowance, then abort.
        I2cTransaction::read(ADDR, vec![0x01]),
        I2cTransaction::read(ADDR, vec![0x01]),
        I2cTransaction::read(ADDR, vec![0x01]),
    ]);
    let mut i2c = I2cMock::new(&expectations);
    let mut dev = Ds2482Builder::default()
        .with_retries(1)
        .build(i2c.clone(), NoopDelay::new())
        .unwrap();
    assert!(matches!(
        dev.reset(),
        Err(OneWireError::Bus(Ds2482Error::RetriesExceeded))
    ));
    i2c.done();
}

#[cfg(feature = "ds2482-800")]
#[test]
fn channel_selection_verifies_the_confirmation_code() {
    use ds2482::Channel;
    let mut expectations = bringup();
    expectations.extend([
        I2cTransaction::write(ADDR, vec![0xe1, 0xf0]),
        I2cTransaction::read(ADDR, vec![0x00]),
        I2cTransaction::write_read(ADDR, vec![0xc3, 0xd2], vec![0xaa]),
    ]);
    let mut i2c = I2cMock::new(&expectations);
    let mut dev = Ds2482Builder::default()
        .build(i2c.clone(), NoopDelay::new())
        .unwrap();
    dev.select_channel(Channel::Io2).unwrap();
    i2c.done();
}
