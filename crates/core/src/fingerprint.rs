use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScreenInfo {
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
}

/// Ambient attributes of the device the game runs on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceSignals {
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub screen: Option<ScreenInfo>,
    #[serde(default)]
    pub time_zone: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub hardware_concurrency: Option<u32>,
}

impl DeviceSignals {
    pub fn canonical(&self) -> String {
        let screen = self
            .screen
            .map(|s| format!("{}x{}x{}", s.width, s.height, s.color_depth))
            .unwrap_or_default();
        let cores = self
            .hardware_concurrency
            .filter(|count| *count > 0)
            .map(|count| count.to_string())
            .unwrap_or_else(|| "?".to_string());
        [
            self.user_agent.as_str(),
            screen.as_str(),
            self.time_zone.as_str(),
            self.language.as_str(),
            cores.as_str(),
        ]
        .join("||")
    }
}

/// Best-effort device key. Not unique and not stable across browser updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceFingerprint(String);

impl DeviceFingerprint {
    pub fn derive(signals: &DeviceSignals, prefix: &str) -> Self {
        let mut hasher = Fnv32::new();
        for unit in signals.canonical().encode_utf16() {
            hasher.update(unit);
        }
        Self(format!("{prefix}{}", to_base36(hasher.finish())))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy)]
struct Fnv32(u32);

impl Fnv32 {
    fn new() -> Self {
        Self(0x811c9dc5)
    }

    fn update(&mut self, unit: u16) {
        self.0 ^= u32::from(unit);
        self.0 = self.0.wrapping_mul(0x0100_0193);
    }

    fn finish(self) -> u32 {
        self.0
    }
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(7);
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> DeviceSignals {
        DeviceSignals {
            user_agent: "Mozilla/5.0 (iPhone)".to_string(),
            screen: Some(ScreenInfo {
                width: 390,
                height: 844,
                color_depth: 24,
            }),
            time_zone: "Asia/Ho_Chi_Minh".to_string(),
            language: "vi-VN".to_string(),
            hardware_concurrency: Some(6),
        }
    }

    #[test]
    fn canonical_joins_signals() {
        assert_eq!(
            phone().canonical(),
            "Mozilla/5.0 (iPhone)||390x844x24||Asia/Ho_Chi_Minh||vi-VN||6"
        );
        let bare = DeviceSignals::default();
        assert_eq!(bare.canonical(), "||||||||?");
    }

    #[test]
    fn derive_is_deterministic_and_prefixed() {
        let a = DeviceFingerprint::derive(&phone(), "lixi2026_");
        let b = DeviceFingerprint::derive(&phone(), "lixi2026_");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("lixi2026_"));
    }

    #[test]
    fn different_signals_differ() {
        let mut other = phone();
        other.language = "en-US".to_string();
        assert_ne!(
            DeviceFingerprint::derive(&phone(), "p_"),
            DeviceFingerprint::derive(&other, "p_")
        );
    }

    #[test]
    fn fnv_matches_reference_vector() {
        let mut hasher = Fnv32::new();
        for unit in "a".encode_utf16() {
            hasher.update(unit);
        }
        assert_eq!(hasher.finish(), 0xe40c292c);
    }

    #[test]
    fn base36_digits() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u32::MAX), "1z141z3");
    }
}
