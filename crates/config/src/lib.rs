use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The scratch region length is fixed by the demo; a profile that asks for
/// anything else is rejected.
pub const SCRATCH_LEN: u64 = 256;

/// Highest user GPIO on the RP2040.
const MAX_GPIO: u8 = 29;

/// UART wiring for the status stream.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct UartProfile {
    pub baud: u32,
    pub tx_pin: u8,
    pub rx_pin: u8,
}

/// Placement of the reserved region the worker corrupts. On target this is
/// a linker concern; the host runner uses it for diagnostics and display.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScratchProfile {
    pub base: u64,
    pub size: String, // e.g. "256 B"
}

/// Board profile for a demo run.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BoardProfile {
    pub name: String,
    pub uart: UartProfile,
    pub scratch: ScratchProfile,
}

impl Default for BoardProfile {
    /// Raspberry Pi Pico defaults: UART0 on GPIO0/GPIO1 at 115200, scratch
    /// region over the RAM area reserved for a relocated vector table.
    fn default() -> Self {
        Self {
            name: "pico".to_string(),
            uart: UartProfile {
                baud: 115_200,
                tx_pin: 0,
                rx_pin: 1,
            },
            scratch: ScratchProfile {
                base: 0x2000_0000,
                size: "256 B".to_string(),
            },
        }
    }
}

impl BoardProfile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = std::fs::File::open(&path)
            .with_context(|| format!("Failed to open board profile at {:?}", path.as_ref()))?;
        let profile: Self =
            serde_yaml::from_reader(f).context("Failed to parse board profile YAML")?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        if self.uart.baud == 0 {
            anyhow::bail!("UART baud rate must be greater than zero");
        }
        if self.uart.tx_pin == self.uart.rx_pin {
            anyhow::bail!(
                "UART TX and RX cannot share GPIO{}",
                self.uart.tx_pin
            );
        }
        if self.uart.tx_pin > MAX_GPIO || self.uart.rx_pin > MAX_GPIO {
            anyhow::bail!("RP2040 user GPIOs are 0..={}", MAX_GPIO);
        }

        let size = parse_size(&self.scratch.size)?;
        if size != SCRATCH_LEN {
            anyhow::bail!(
                "Scratch region must be exactly {} bytes, got {}",
                SCRATCH_LEN,
                size
            );
        }

        Ok(())
    }

    /// Bytes per second the profile's UART can move (10 bit times per byte).
    pub fn bytes_per_second(&self) -> u32 {
        self.uart.baud / 10
    }
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
