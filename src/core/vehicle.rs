//! Simulated vehicle state.
//!
//! A [`VehicleStatus`] is a plain value: the tool dispatcher and the drive
//! cycle tick both take a snapshot and return a new one.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::drive_cycle;

/// Placeholder shown when no navigation destination is set.
pub const NO_DESTINATION: &str = "Not set";

/// Placeholder shown when no navigation distance is known.
pub const NO_DISTANCE: &str = "—";

/// Default radio station.
pub const DEFAULT_STATION: &str = "FM 101.5";

/// Titles shown for the non-radio sources.
pub const PLAYLIST_TITLE: &str = "My Playlist";
pub const PODCAST_TITLE: &str = "Tech Talk #127";
pub const AUDIOBOOK_TITLE: &str = "Digital Fortress";

/// Battery range in km per percent of charge.
const RANGE_PER_PERCENT: f64 = 3.1;

/// Headlight state.
///
/// Values other than on/off/auto are kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LightState {
    On,
    #[default]
    Off,
    Auto,
    Other(String),
}

impl LightState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Auto => "auto",
            Self::Other(value) => value,
        }
    }
}

impl From<&str> for LightState {
    fn from(value: &str) -> Self {
        match value {
            "on" => Self::On,
            "off" => Self::Off,
            "auto" => Self::Auto,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for LightState {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<LightState> for String {
    fn from(state: LightState) -> Self {
        match state {
            LightState::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window state, shared by all windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    Open,
    #[default]
    Closed,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

/// Whether media is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Playback {
    On,
    #[default]
    Off,
}

impl fmt::Display for Playback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Active media source.
///
/// Unrecognized sources are kept as given and have no title.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaType {
    #[default]
    Radio,
    Music,
    Podcast,
    Audiobook,
    Other(String),
}

impl MediaType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Radio => "radio",
            Self::Music => "music",
            Self::Podcast => "podcast",
            Self::Audiobook => "audiobook",
            Self::Other(value) => value,
        }
    }
}

impl From<&str> for MediaType {
    fn from(value: &str) -> Self {
        match value {
            "radio" => Self::Radio,
            "music" => Self::Music,
            "podcast" => Self::Podcast,
            "audiobook" => Self::Audiobook,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for MediaType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<MediaType> for String {
    fn from(media: MediaType) -> Self {
        match media {
            MediaType::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the simulated vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatus {
    /// km/h
    pub speed: u32,
    /// Percent, two decimals
    pub battery: f64,
    /// km
    pub battery_range: u32,
    /// Cabin temperature in °C
    pub temperature: f64,
    pub lights: LightState,
    pub windows: WindowState,
    pub music: Playback,
    pub radio_station: String,
    pub radio_playing: bool,
    pub media_type: MediaType,
    /// Percent
    pub media_volume: f64,
    pub navigation_active: bool,
    pub navigation_destination: String,
    pub navigation_distance: String,
}

impl Default for VehicleStatus {
    fn default() -> Self {
        Self {
            speed: 0,
            battery: 80.0,
            battery_range: 245,
            temperature: 22.0,
            lights: LightState::Off,
            windows: WindowState::Closed,
            music: Playback::Off,
            radio_station: DEFAULT_STATION.to_string(),
            radio_playing: true,
            media_type: MediaType::Radio,
            media_volume: 70.0,
            navigation_active: false,
            navigation_destination: NO_DESTINATION.to_string(),
            navigation_distance: NO_DISTANCE.to_string(),
        }
    }
}

impl VehicleStatus {
    /// Label of what is currently playing.
    pub fn current_media(&self) -> &str {
        match self.media_type {
            MediaType::Radio => &self.radio_station,
            MediaType::Music => PLAYLIST_TITLE,
            MediaType::Podcast => PODCAST_TITLE,
            MediaType::Audiobook => AUDIOBOOK_TITLE,
            MediaType::Other(_) => "",
        }
    }

    /// Advance the simulation by one second at `elapsed_secs` into the drive.
    ///
    /// Speed follows the drive cycle, the battery drains according to that
    /// speed (never below zero) and the range is derived from the charge.
    pub fn tick(&self, elapsed_secs: u64) -> Self {
        let speed = drive_cycle::speed_at(elapsed_secs);
        let battery = (self.battery - drive_cycle::battery_consumption(speed)).max(0.0);

        Self {
            speed,
            battery: (battery * 100.0).round() / 100.0,
            battery_range: (battery * RANGE_PER_PERCENT).round() as u32,
            ..self.clone()
        }
    }
}
