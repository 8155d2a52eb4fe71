use crate::{
    OneWireAsync, OneWireStatus, SearchKind, crc::OneWireCrc, error::OneWireError,
};

/// ROM search engine for an asynchronous 1-Wire bus.
///
/// The async twin of [OneWireSearch](crate::OneWireSearch), with identical state and
/// semantics over [OneWireAsync]; see the sync engine for the algorithm description.
pub struct OneWireSearchAsync<'a, T> {
    onewire: &'a mut T,
    cmd: u8,
    last_device: bool,
    last_discrepancy: u8,
    last_family_discrepancy: u8,
    family: u8,
    rom: [u8; 8],
}

impl<T> core::fmt::Debug for OneWireSearchAsync<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OneWireSearchAsync")
            .field("cmd", &self.cmd)
            .field("last_device", &self.last_device)
            .field("last_discrepancy", &self.last_discrepancy)
            .field("last_family_discrepancy", &self.last_family_discrepancy)
            .field("family", &self.family)
            .field("rom", &self.rom)
            .finish()
    }
}

impl<'a, T> OneWireSearchAsync<'a, T> {
    /// Creates a new [OneWireSearchAsync] instance.
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

    /// Creates a new [OneWireSearchAsync] restricted to a single family code.
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

    /// Resets the search state; see
    /// [OneWireSearch::reset_state](crate::OneWireSearch::reset_state).
    pub fn reset_state(&mut self) {
        self.last_device = false;
        self.last_discrepancy = if self.family != 0 { 64 } else { 0 };
        self.last_family_discrepancy = 0;
        self.rom = [self.family, 0, 0, 0, 0, 0, 0, 0];
    }

    /// Skips the remainder of the current family subtree; see
    /// [OneWireSearch::skip_current_family](crate::OneWireSearch::skip_current_family).
    pub fn skip_current_family(&mut self) {
        self.last_discrepancy = self.last_family_discrepancy;
        self.last_family_discrepancy = 0;
        if self.last_discrepancy == 0 {
            self.last_device = true;
        }
    }
}

impl<T: OneWireAsync> OneWireSearchAsync<'_, T> {
    /// Finds the first device on the bus; see [OneWireSearch::first](crate::OneWireSearch::first).
    pub async fn first(&mut self) -> Result<Option<u64>, OneWireError<T::BusError>> {
        self.reset_state();
        self.next().await
    }

    /// Finds the next device on the bus; see [OneWireSearch::next](crate::OneWireSearch::next).
    #[allow(clippy::should_implement_trait)]
    pub async fn next(&mut self) -> Result<Option<u64>, OneWireError<T::BusError>> {
        if self.last_device {
            self.reset_state();
            return Ok(None);
        }
        let res = self.search_pass().await;
        if !matches!(res, Ok(Some(_))) {
            self.reset_state();
        }
        res
    }

    /// Verifies that the device with the given ROM code is present on the bus; see
    /// [OneWireSearch::verify](crate::OneWireSearch::verify).
    pub async fn verify(&mut self, rom: u64) -> Result<bool, OneWireError<T::BusError>> {
        self.reset_state();
        self.rom = rom.to_le_bytes();
        self.last_discrepancy = 64;
        let res = match self.search_pass().await {
            Ok(found) => Ok(found == Some(rom)),
            Err(OneWireError::NoDevicePresent) => Ok(false),
            Err(e) => Err(e),
        };
        self.reset_state();
        res
    }

    async fn search_pass(&mut self) -> Result<Option<u64>, OneWireError<T::BusError>> {
        if self.onewire.get_overdrive_mode() {
            return Err(OneWireError::InvalidSpeed);
        }
        let status = self.onewire.reset().await?;
        if status.shortcircuit() {
            return Err(OneWireError::ShortCircuit);
        }
        if !status.presence() {
            return Err(OneWireError::NoDevicePresent);
        }
        self.onewire.write_byte(self.cmd).await?;

        let mut id_bit_num: u8 = 1;
        let mut last_zero: u8 = 0;
        let mut idx: usize = 0;
        let mut rom_mask: u8 = 1;
        let found = loop {
            let dir = if id_bit_num < self.last_discrepancy {
                self.rom[idx] & rom_mask > 0
            } else {
                id_bit_num == self.last_discrepancy
            };
            let (id_bit, cmp_id_bit, taken, steered) = match self.onewire.read_triplet(dir).await
            {
                Ok((id_bit, cmp_id_bit, taken)) => (id_bit, cmp_id_bit, taken, true),
                Err(OneWireError::Unimplemented) => {
                    let id_bit = self.onewire.read_bit().await?;
                    let cmp_id_bit = self.onewire.read_bit().await?;
                    (id_bit, cmp_id_bit, dir, false)
                }
                Err(e) => return Err(e),
            };
            if id_bit && cmp_id_bit {
                break false;
            }
            let set = if id_bit != cmp_id_bit {
                id_bit
            } else {
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
                self.onewire.write_bit(set).await?;
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
            return Ok(None);
        }
        if !OneWireCrc::validate(&self.rom) {
            return Err(OneWireError::CrcMismatch);
        }
        if self.family != 0 && self.rom[0] != self.family {
            return Ok(None);
        }
        Ok(Some(u64::from_le_bytes(self.rom)))
    }
}
