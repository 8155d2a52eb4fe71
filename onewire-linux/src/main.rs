use std::time::{Duration, Instant};

use clap::Parser;
use ds18b20::Ds18b20Group;
use ds2482::Ds2482Builder;
use linux_embedded_hal::{Delay, I2cdev};
use onewire_bus::OneWireError;
use ukernel::{Kernel, Monotonic, TaskStatus};

/// Enumerate DS18B20 sensors behind a DS2482 bridge and poll them periodically.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to I2C bus (e.g., /dev/i2c-1)
    #[arg(short, long)]
    path: String,
    /// Temperature poll interval in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    interval: u32,
}

/// Everything the scheduled tasks touch.
struct App {
    bus: ds2482::Ds2482<I2cdev, Delay>,
    sensors: Ds18b20Group<16>,
    delay: Delay,
}

/// Millisecond clock for the kernel, wrapping the process uptime.
struct WallClock {
    start: Instant,
}

impl Monotonic for WallClock {
    fn now_ms(&mut self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

fn banner(app: &mut App) {
    log::info!("polling {} sensors", app.sensors.count());
    for rom in app.sensors.roms() {
        log::info!("  rom {rom:016x}");
    }
}

fn poll_sensors(app: &mut App) {
    if let Err(e) = app
        .sensors
        .trigger_conversion(&mut app.bus, &mut app.delay)
    {
        log::error!("conversion failed: {e:?}");
        return;
    }
    match app.sensors.read_temperatures(&mut app.bus) {
        Ok(temps) => {
            for (rom, temp) in temps {
                log::info!("rom {rom:016x}: {temp} C");
            }
        }
        Err(e) => log::warn!("readout failed: {e:?}"),
    }
}

fn scan_alarms(app: &mut App) {
    let mut out = [0u64; 16];
    match app.sensors.alarmed(&mut app.bus, &mut out) {
        Ok(0) => {}
        Ok(n) => {
            for rom in &out[..n] {
                log::warn!("rom {rom:016x}: temperature alarm");
            }
        }
        Err(e) => log::warn!("alarm scan failed: {e:?}"),
    }
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();
    // Open the I2C bus
    let i2c = I2cdev::new(&args.path).expect("Failed to open I2C device");
    // Bring up the DS2482 bridge
    let mut bus = Ds2482Builder::default()
        .build(i2c, Delay)
        .expect("Failed to create DS2482 instance");
    // Enumerate and configure the temperature sensors
    let mut sensors = Ds18b20Group::<16>::default()
        .with_resolution(ds18b20::ReadoutResolution::Resolution12bit)
        .with_alarm_low(-40)
        .with_alarm_high(50);
    match sensors.enumerate(&mut bus) {
        Ok(n) => log::info!("Found {n} devices"),
        Err(OneWireError::NoDevicePresent) => log::warn!("No devices on the bus"),
        Err(e) => panic!("Failed to enumerate devices: {e:?}"),
    }
    // Register the periodic work and hand control to the kernel
    let mut app = App {
        bus,
        sensors,
        delay: Delay,
    };
    let clock = WallClock {
        start: Instant::now(),
    };
    let mut kernel: Kernel<App, WallClock, 8> = Kernel::new(clock);
    kernel
        .add_task(banner, 1, TaskStatus::OneTimeImmediate)
        .expect("task table full");
    kernel
        .add_task(poll_sensors, args.interval, TaskStatus::ScheduledImmediate)
        .expect("task table full");
    kernel
        .add_task(scan_alarms, args.interval.saturating_mul(5), TaskStatus::Scheduled)
        .expect("task table full");
    loop {
        kernel.poll(&mut app);
        std::thread::sleep(Duration::from_millis(1));
    }
}
