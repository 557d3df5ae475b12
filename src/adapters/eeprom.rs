//! EEPROM-style config storage adapter.
//!
//! Implements [`StoragePort`] as a small byte-addressed region with
//! buffered writes: mutations land in a RAM shadow and reach flash only on
//! [`flush`](StoragePort::flush), mirroring the classic EEPROM
//! begin/put/commit discipline the record format was designed for.
//!
//! - **`target_os = "espidf"`** — the shadow persists as a single NVS blob
//!   (`gardenlink/region`); commits are atomic per `nvs_commit`.
//! - **all other targets** — RAM only, for host-side tests.
//!
//! A region that was never written reads back as erased flash
//! ([`RESET_FILL`](crate::store::RESET_FILL) in every byte), which is
//! exactly the "no validity marker" state the config layer expects.

use log::info;

use crate::app::ports::{StorageError, StoragePort};
use crate::store::RESET_FILL;

/// Region size. Must hold the largest node record with headroom for
/// layout growth.
pub const REGION_SIZE: usize = 512;

#[cfg(target_os = "espidf")]
const NVS_NAMESPACE: &str = "gardenlink";
#[cfg(target_os = "espidf")]
const NVS_KEY: &str = "region";

pub struct EepromAdapter {
    shadow: [u8; REGION_SIZE],
    #[cfg(target_os = "espidf")]
    nvs: esp_idf_svc::nvs::EspNvs<esp_idf_svc::nvs::NvsDefault>,
}

impl EepromAdapter {
    /// Open the backing store and load the shadow. A fresh or erased
    /// partition yields an all-[`RESET_FILL`] region.
    #[cfg(target_os = "espidf")]
    pub fn new(
        partition: esp_idf_svc::nvs::EspDefaultNvsPartition,
    ) -> Result<Self, StorageError> {
        let nvs = esp_idf_svc::nvs::EspNvs::new(partition, NVS_NAMESPACE, true)
            .map_err(|_| StorageError::IoError)?;

        let mut shadow = [RESET_FILL; REGION_SIZE];
        match nvs.get_blob(NVS_KEY, &mut shadow) {
            Ok(Some(_)) => info!("eeprom: region loaded from NVS"),
            Ok(None) => info!("eeprom: no stored region, starting erased"),
            Err(_) => return Err(StorageError::IoError),
        }
        Ok(Self { shadow, nvs })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, StorageError> {
        info!("eeprom: simulation backend");
        Ok(Self {
            shadow: [RESET_FILL; REGION_SIZE],
        })
    }

    fn bounds_check(&self, offset: usize, len: usize) -> Result<(), StorageError> {
        let end = offset.checked_add(len).ok_or(StorageError::OutOfBounds)?;
        if end > self.shadow.len() {
            return Err(StorageError::OutOfBounds);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_commit(&mut self) -> Result<(), StorageError> {
        self.nvs
            .set_blob(NVS_KEY, &self.shadow)
            .map_err(|_| StorageError::FlushFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_commit(&mut self) -> Result<(), StorageError> {
        Ok(())
    }
}

impl StoragePort for EepromAdapter {
    fn capacity(&self) -> usize {
        self.shadow.len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        self.bounds_check(offset, buf.len())?;
        buf.copy_from_slice(&self.shadow[offset..offset + buf.len()]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        self.bounds_check(offset, data.len())?;
        self.shadow[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StorageError> {
        self.platform_commit()
    }
}
