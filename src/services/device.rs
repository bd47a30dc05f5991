//! Hardware-facing collaborators: network link, e-paper screen, battery.
//!
//! The control loop only talks to the traits; the host implementations here
//! stand in for the device drivers.

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;

use crate::error::ScreenError;

pub const SCREEN_LINES: usize = 6;
pub const MAX_LINE_CHARS: usize = 40;

const BATTERY_EMPTY_VOLTS: f32 = 3.2;
const BATTERY_FULL_VOLTS: f32 = 4.2;

pub trait Connectivity {
    /// Attaches to the network. Returns whether the link is usable.
    fn connect(&mut self) -> impl Future<Output = bool>;
    fn is_connected(&self) -> bool;
}

pub trait Screen {
    fn set_line(&mut self, index: usize, text: &str);
    fn refresh(&mut self) -> Result<(), ScreenError>;
    fn is_busy(&self) -> bool;
}

pub trait Battery {
    /// Cell voltage in volts, if it can be read.
    fn voltage(&self) -> Option<f32>;
}

/// Maps LiPo voltage linearly onto 0..=100, clamping outside 3.2-4.2 V.
pub fn battery_percentage(volts: f32) -> u8 {
    let clamped = volts.clamp(BATTERY_EMPTY_VOLTS, BATTERY_FULL_VOLTS);
    let pct = (clamped - BATTERY_EMPTY_VOLTS) / (BATTERY_FULL_VOLTS - BATTERY_EMPTY_VOLTS) * 100.0;
    pct.round().clamp(0.0, 100.0) as u8
}

pub fn truncate_line(text: &str) -> String {
    text.chars().take(MAX_LINE_CHARS).collect()
}

/// Treats a successful DNS lookup of the time service host as "attached".
pub struct HostLink {
    ssid: Option<String>,
    host: String,
    connected: bool,
}

impl HostLink {
    pub fn new(ssid: Option<String>, endpoint: &str) -> Self {
        let host = reqwest::Url::parse(endpoint)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| endpoint.to_string());
        Self {
            ssid,
            host,
            connected: false,
        }
    }
}

impl Connectivity for HostLink {
    async fn connect(&mut self) -> bool {
        log::info!(
            "Connecting to: {}",
            self.ssid.as_deref().unwrap_or("<no ssid configured>")
        );
        self.connected = match tokio::net::lookup_host((self.host.as_str(), 443)).await {
            Ok(mut addrs) => match addrs.next() {
                Some(addr) => {
                    log::info!("Connected! {} resolves to {}", self.host, addr.ip());
                    true
                }
                None => {
                    log::warn!("Network check failed: {} has no addresses", self.host);
                    false
                }
            },
            Err(e) => {
                log::warn!("Network check failed: {}", e);
                false
            }
        };
        self.connected
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Prints the six screen lines framed on stdout on every refresh.
pub struct ConsoleScreen {
    lines: [String; SCREEN_LINES],
}

impl ConsoleScreen {
    pub fn new() -> Self {
        Self {
            lines: Default::default(),
        }
    }
}

impl Default for ConsoleScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Screen for ConsoleScreen {
    fn set_line(&mut self, index: usize, text: &str) {
        if let Some(line) = self.lines.get_mut(index) {
            *line = truncate_line(text);
            log::debug!("Line {}: {}", index, text);
        }
    }

    fn refresh(&mut self) -> Result<(), ScreenError> {
        let border = format!("+{}+", "-".repeat(MAX_LINE_CHARS + 2));
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", border)?;
        for line in &self.lines {
            writeln!(out, "| {:<width$} |", line, width = MAX_LINE_CHARS)?;
        }
        writeln!(out, "{}", border)?;
        out.flush()?;
        Ok(())
    }

    fn is_busy(&self) -> bool {
        false
    }
}

/// Reads `voltage_now` (microvolts) from a Linux power supply.
pub struct SysfsBattery {
    path: PathBuf,
}

impl SysfsBattery {
    pub fn new(supply: &str) -> Self {
        Self {
            path: PathBuf::from("/sys/class/power_supply")
                .join(supply)
                .join("voltage_now"),
        }
    }
}

impl Battery for SysfsBattery {
    fn voltage(&self) -> Option<f32> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let micro_volts: f32 = raw.trim().parse().ok()?;
        Some(micro_volts / 1_000_000.0)
    }
}
