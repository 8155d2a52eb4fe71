//! Command constants for 1-Wire communication.

/// Command to match a specific ROM address in 1-Wire communication (non-overdrive mode).
pub const ONEWIRE_MATCH_ROM_CMD: u8 = 0x55;

/// Command to skip ROM address in 1-Wire communication (non-overdrive mode).
pub const ONEWIRE_SKIP_ROM_CMD: u8 = 0xcc;

/// The Overdrive-Match ROM command followed by a 64-bit ROM sequence transmitted at overdrive
/// speed allows the bus master to address a specific device on a multidrop bus and to
/// simultaneously set it in overdrive mode. Only the device that exactly matches the 64-bit
/// ROM sequence responds to the subsequent function command. All overdrive-capable devices
/// return to standard speed at the next reset pulse of minimum 480us duration.
pub const ONEWIRE_MATCH_ROM_CMD_OD: u8 = 0x69;

/// On a single-drop bus this command can save time by allowing the bus master to access the
/// function commands without providing the 64-bit ROM code. Unlike the normal Skip ROM
/// command, the Overdrive-Skip ROM command sets the device in overdrive mode. All
/// communication following this command has to occur at overdrive speed until a reset pulse
/// of minimum 480us duration resets all devices on the bus to standard speed.
pub const ONEWIRE_SKIP_ROM_CMD_OD: u8 = 0x3c;

/// Command to search for devices on the 1-Wire bus.
pub const ONEWIRE_SEARCH_CMD: u8 = 0xf0;

/// Command to search for devices in alarm state on the 1-Wire bus.
pub const ONEWIRE_CONDITIONAL_SEARCH_CMD: u8 = 0xec;
