//! Firmware bring-up with bounded retries.

use falcon_common::hal::driver::{FalconDriver, LinkError};
use falcon_common::hal::types::FirmwareImage;
use tracing::{info, warn};

/// How firmware became resident.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareOutcome {
    /// Device already ran firmware; nothing uploaded.
    AlreadyResident,
    /// Uploaded; `attempts` includes the successful one.
    Loaded { attempts: u32 },
}

/// Make firmware resident on an open device.
///
/// Tries at most `attempts` uploads, logging each failure. After an upload
/// reports success the resident flag is checked again; a device that still
/// runs no firmware is a failure too.
///
/// # Errors
/// `LinkError::FirmwareLoadFailed` when no attempt succeeds or the firmware
/// is not resident afterwards.
pub fn ensure_resident(
    driver: &mut dyn FalconDriver,
    image: &FirmwareImage,
    attempts: u32,
    skip_checksum: bool,
) -> Result<FirmwareOutcome, LinkError> {
    if driver.is_firmware_loaded() {
        info!("Firmware already resident");
        return Ok(FirmwareOutcome::AlreadyResident);
    }

    info!(
        firmware = image.name(),
        bytes = image.len(),
        "Loading firmware (up to {} attempts)",
        attempts
    );

    let mut loaded_after = None;
    for attempt in 1..=attempts {
        match driver.load_firmware(image, skip_checksum) {
            Ok(()) => {
                loaded_after = Some(attempt);
                break;
            }
            Err(e) => warn!("Firmware load attempt {}/{} failed: {}", attempt, attempts, e),
        }
    }

    let Some(used) = loaded_after else {
        return Err(LinkError::FirmwareLoadFailed { attempts });
    };

    if !driver.is_firmware_loaded() {
        warn!("Firmware upload acknowledged but device reports no firmware");
        return Err(LinkError::FirmwareLoadFailed { attempts: used });
    }

    info!("Firmware loaded after {} attempt(s)", used);
    Ok(FirmwareOutcome::Loaded { attempts: used })
}
