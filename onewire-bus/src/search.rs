use crate::{
    OneWire, OneWireStatus,
    consts::{ONEWIRE_CONDITIONAL_SEARCH_CMD, ONEWIRE_SEARCH_CMD},
    crc::OneWireCrc,
    error::OneWireError,
};

#[repr(u8)]
/// Type of search performed by [OneWireSearch] or [OneWireSearchAsync](crate::OneWireSearchAsync).
pub enum SearchKind {
    /// Normal search, enumerating every device on the bus.
    Normal = ONEWIRE_SEARCH_CMD,
    /// Conditional search, enumerating only devices in alarm state.
    Alarmed = ONEWIRE_CONDITIONAL_SEARCH_CMD,
}

/// ROM search engine for a 1-Wire bus.
///
/// Implements the
/// [1-Wire search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html):
/// a bit-by-bit walk of the 64-bit ROM space where each pass resolves one device and leaves
/// behind the branch point (`last_discrepancy`) from which the following pass continues.
///
/// A full enumeration is [first](OneWireSearch::first) followed by
/// [next](OneWireSearch::next) until it returns `Ok(None)`. Any bus fault resets the
/// internal state, so a later [first](OneWireSearch::first) always starts a clean pass.
///
/// ROM codes are returned as `u64` in little-endian byte order:
///
/// | Bits  | Description |
/// |-------|-------------|
/// | 0-7   | Family code (e.g., 0x28 for DS18B20) |
/// | 8-55  | 48-bit serial number |
/// | 56-63 | CRC-8 over the first seven bytes |
pub struct OneWireSearch<'a, T> {
    onewire: &'a mut T,
    cmd: u8,
    last_device: bool,
    last_discrepancy: u8,
    last_family_discrepancy: u8,
    family: u8,
    rom: [u8; 8],
}

impl<'a, T> OneWireSearch<'a, T> {
    /// Creates a new [OneWireSearch] instance.
    ///
    /// # Arguments
    /// * `onewire` - A mutable reference to the bus transport.
    /// * `kind` - The kind of search to run ([SearchKind::Normal] or [SearchKind::Alarmed]).
    pub fn new(onewire: &'a mut T, kind: SearchKind) -> Self {
        Self {
            onewire,
            cmd: kind as _,
            last_device: false,
            last_discrepancy: 0,
            last_family_discrepancy: 0,
            family: 0,
            rom: [0; 8],
        }
    }

    /// Creates a new [OneWireSearch] restricted to a single family code.
    ///
    /// The ROM buffer is seeded with the family code so the first pass descends directly into
    /// that family's subtree; enumeration ends as soon as a device of another family turns up.
    ///
    /// # Arguments
    /// * `onewire` - A mutable reference to the bus transport.
    /// * `kind` - The kind of search to run.
    /// * `family` - The family code of the devices to search for.
    pub fn with_family(onewire: &'a mut T, kind: SearchKind, family: u8) -> Self {
        Self {
            onewire,
            cmd: kind as _,
            last_device: false,
            last_discrepancy: 64,
            last_family_discrepancy: 0,
            family,
            rom: [family, 0, 0, 0, 0, 0, 0, 0],
        }
    }

    /// Resets the search state.
    ///
    /// Clears the discrepancy tracking and the working ROM buffer (restoring the family
    /// prefix when one was set), so the following [next](OneWireSearch::next) starts a fresh
    /// enumeration. Never fails.
    pub fn reset_state(&mut self) {
        self.last_device = false;
        self.last_discrepancy = if self.family != 0 { 64 } else { 0 };
        self.last_family_discrepancy = 0;
        self.rom = [self.family, 0, 0, 0, 0, 0, 0, 0];
    }

    /// Skips the remainder of the family subtree the search is currently inside.
    ///
    /// Rewinds the branch point to the last discrepancy within the family-code byte; the next
    /// pass then leaves the current family. If no branch point exists inside the family byte
    /// there is nothing left beyond the current family and the search is exhausted.
    pub fn skip_current_family(&mut self) {
        self.last_discrepancy = self.last_family_discrepancy;
        self.last_family_discrepancy = 0;
        if self.last_discrepancy == 0 {
            self.last_device = true;
        }
    }
}

impl<T: OneWire> OneWireSearch<'_, T> {
    /// Finds the first device on the bus.
    ///
    /// Equivalent to [reset_state](OneWireSearch::reset_state) followed by one search pass.
    /// Idempotent: calling it twice in a row yields the same device.
    pub fn first(&mut self) -> Result<Option<u64>, OneWireError<T::BusError>> {
        self.reset_state();
        self.next()
    }

    /// Finds the next device on the bus, continuing from the previous pass.
    ///
    /// Returns `Ok(None)` once the enumeration is exhausted; at that point the state has been
    /// reset and another call starts over from the first device.
    ///
    /// # Errors
    /// * [OneWireError::NoDevicePresent] - no presence pulse after the reset; the bus is
    ///   empty or miswired. Fatal for this pass, retry with [first](OneWireSearch::first).
    /// * [OneWireError::ShortCircuit] - the transport detected a short on the line.
    /// * [OneWireError::CrcMismatch] - the assembled ROM failed CRC validation.
    ///
    /// Every error resets the search state before it is returned.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<u64>, OneWireError<T::BusError>> {
        if self.last_device {
            self.reset_state();
            return Ok(None);
        }
        let res = self.search_pass();
        if !matches!(res, Ok(Some(_))) {
            self.reset_state();
        }
        res
    }

    /// Verifies that the device with the given ROM code is present on the bus.
    ///
    /// Runs a single targeted pass that replays every bit of `rom`; only a device with
    /// exactly that ROM code can keep answering through all 64 positions. The search state
    /// is reset afterwards regardless of the outcome.
    pub fn verify(&mut self, rom: u64) -> Result<bool, OneWireError<T::BusError>> {
        self.reset_state();
        self.rom = rom.to_le_bytes();
        self.last_discrepancy = 64;
        let res = match self.search_pass() {
            Ok(found) => Ok(found == Some(rom)),
            Err(OneWireError::NoDevicePresent) => Ok(false),
            Err(e) => Err(e),
        };
        self.reset_state();
        res
    }

    /// One pass of the search algorithm, resolving a single ROM code.
    ///
    /// Leaves the discrepancy state advanced on success; the caller is responsible for
    /// resetting the state on any other outcome.
    fn search_pass(&mut self) -> Result<Option<u64>, OneWireError<T::BusError>> {
        if self.onewire.get_overdrive_mode() {
            return Err(OneWireError::InvalidSpeed);
        }
        let status = self.onewire.reset()?;
        if status.shortcircuit() {
            return Err(OneWireError::ShortCircuit);
        }
        if !status.presence() {
            return Err(OneWireError::NoDevicePresent);
        }
        self.onewire.write_byte(self.cmd)?;

        // Bit positions are numbered from 1 so that "before/at/after last_discrepancy"
        // comparisons stay in unsigned arithmetic; a branch point inside the family byte is
        // therefore last_zero < 9.
        let mut id_bit_num: u8 = 1;
        let mut last_zero: u8 = 0;
        let mut idx: usize = 0;
        let mut rom_mask: u8 = 1;
        let found = loop {
            // Direction to descend if this position turns out to be a real branch: replay the
            // previous path below the old branch point, take the 1-branch at it, default to 0
            // past it.
            let dir = if id_bit_num < self.last_discrepancy {
                self.rom[idx] & rom_mask > 0
            } else {
                id_bit_num == self.last_discrepancy
            };
            // Read id_bit and its complement, steering in the same transaction where the
            // transport has a hardware triplet; otherwise fall back to two bit reads and
            // steer with an explicit bit write below.
            let (id_bit, cmp_id_bit, taken, steered) = match self.onewire.read_triplet(dir) {
                Ok((id_bit, cmp_id_bit, taken)) => (id_bit, cmp_id_bit, taken, true),
                Err(OneWireError::Unimplemented) => {
                    let id_bit = self.onewire.read_bit()?;
                    let cmp_id_bit = self.onewire.read_bit()?;
                    (id_bit, cmp_id_bit, dir, false)
                }
                Err(e) => return Err(e),
            };
            if id_bit && cmp_id_bit {
                // No device answered this depth: the participants vanished mid-pass.
                break false;
            }
            let set = if id_bit != cmp_id_bit {
                // All remaining participants agree on this bit.
                id_bit
            } else {
                // Real branch: multiple devices disagree here. Descending the 0-branch makes
                // this position the candidate branch point for the following pass.
                if !taken {
                    last_zero = id_bit_num;
                    if last_zero < 9 {
                        self.last_family_discrepancy = last_zero;
                    }
                }
                taken
            };
            if set {
                self.rom[idx] |= rom_mask;
            } else {
                self.rom[idx] &= !rom_mask;
            }
            if !steered {
                self.onewire.write_bit(set)?;
            }

            id_bit_num += 1;
            rom_mask <<= 1;
            if rom_mask == 0 {
                idx += 1;
                rom_mask = 1;
            }
            if id_bit_num > 64 {
                self.last_discrepancy = last_zero;
                self.last_device = self.last_discrepancy == 0;
                break true;
            }
        };

        if !found || self.rom[0] == 0 {
            // Dead end mid-pass, or the bus dropped out and left an all-zero family byte.
            return Ok(None);
        }
        if !OneWireCrc::validate(&self.rom) {
            return Err(OneWireError::CrcMismatch);
        }
        if self.family != 0 && self.rom[0] != self.family {
            // Walked past the requested family subtree.
            return Ok(None);
        }
        Ok(Some(u64::from_le_bytes(self.rom)))
    }
}
