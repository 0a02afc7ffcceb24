//! Tool dispatcher.
//!
//! Runs a tool call from the model against a vehicle snapshot. Dispatch is a
//! pure function of its inputs (plus the clock and an RNG for the tools that
//! need them): the caller owns the state and decides what to do with the
//! returned snapshot.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc2822;

use super::catalog::CarTool;
use crate::core::vehicle::{
    AUDIOBOOK_TITLE, DEFAULT_STATION, LightState, MediaType, NO_DESTINATION, NO_DISTANCE,
    PLAYLIST_TITLE, PODCAST_TITLE, Playback, VehicleStatus, WindowState,
};

/// Cabin temperature limits in °C.
pub const TEMPERATURE_RANGE: (f64, f64) = (16.0, 30.0);

/// Media volume limits in percent.
pub const VOLUME_RANGE: (f64, f64) = (0.0, 100.0);

/// Result of a tool call, serialized as the `function_call_output`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub success: bool,
    pub message: String,
    /// Tool-specific fields, flattened next to `success` and `message`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            extra: Map::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            extra: Map::new(),
        }
    }

    /// Add a tool-specific field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// Run a tool call using the thread-local RNG.
pub fn execute(name: &str, args: &Value, status: &VehicleStatus) -> (VehicleStatus, ToolOutcome) {
    execute_with_rng(name, args, status, &mut rand::rng())
}

/// Run a tool call.
///
/// Unknown tools and a non-numeric temperature or volume produce a failed
/// outcome and leave the snapshot unchanged. Missing text arguments fall
/// back to an empty value or the source's default title.
pub fn execute_with_rng<R: Rng + ?Sized>(
    name: &str,
    args: &Value,
    status: &VehicleStatus,
    rng: &mut R,
) -> (VehicleStatus, ToolOutcome) {
    let Some(tool) = CarTool::parse(name) else {
        tracing::warn!("Unknown tool requested: {}", name);
        return (status.clone(), ToolOutcome::fail("Unknown tool"));
    };

    tracing::debug!("Executing tool {} with {}", name, args);

    match run(tool, args, status, rng) {
        Ok(result) => result,
        Err(message) => {
            tracing::warn!("Tool {} rejected its arguments: {}", name, message);
            (status.clone(), ToolOutcome::fail(message))
        }
    }
}

type Dispatch = Result<(VehicleStatus, ToolOutcome), String>;

fn run<R: Rng + ?Sized>(
    tool: CarTool,
    args: &Value,
    status: &VehicleStatus,
    rng: &mut R,
) -> Dispatch {
    let mut next = status.clone();

    let outcome = match tool {
        CarTool::ControlHeadlights => {
            next.lights = LightState::from(str_arg(args, "state"));
            ToolOutcome::ok(format!("Headlights turned {}", next.lights))
        }

        CarTool::ControlWindows => {
            let position = str_arg(args, "position");
            let action = str_arg(args, "action");
            next.windows = if action == "open" {
                WindowState::Open
            } else {
                WindowState::Closed
            };
            let label = if position == "all" {
                "All windows".to_string()
            } else {
                format!("{} window", position)
            };
            let verb = match next.windows {
                WindowState::Open => "opened",
                WindowState::Closed => "closed",
            };
            ToolOutcome::ok(format!("{} {}", label, verb))
        }

        CarTool::SetTemperature => {
            let temperature =
                number_arg(args, "temperature")?.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1);
            next.temperature = temperature;
            ToolOutcome::ok(format!("Temperature set to {}°C", temperature))
        }

        CarTool::PlayRadio => {
            let station = opt_str_arg(args, "station").unwrap_or(DEFAULT_STATION);
            next.media_type = MediaType::Radio;
            next.radio_station = station.to_string();
            next.music = Playback::On;
            ToolOutcome::ok(format!("Playing radio {}", station))
        }

        CarTool::PlayMusic => {
            let content = opt_str_arg(args, "content").unwrap_or(PLAYLIST_TITLE);
            next.media_type = MediaType::Music;
            next.music = Playback::On;
            ToolOutcome::ok(format!("Playing music: {}", content))
        }

        CarTool::PlayPodcast => {
            let podcast = opt_str_arg(args, "podcast").unwrap_or(PODCAST_TITLE);
            next.media_type = MediaType::Podcast;
            next.music = Playback::On;
            ToolOutcome::ok(format!("Playing podcast: {}", podcast))
        }

        CarTool::PlayAudiobook => {
            let book = opt_str_arg(args, "book").unwrap_or(AUDIOBOOK_TITLE);
            next.media_type = MediaType::Audiobook;
            next.music = Playback::On;
            ToolOutcome::ok(format!("Playing audiobook: {}", book))
        }

        CarTool::ControlMediaPlayback => {
            let action = str_arg(args, "action");
            next.music = match action {
                "pause" | "stop" => Playback::Off,
                _ => Playback::On,
            };
            ToolOutcome::ok(format!("Media {}", action))
        }

        CarTool::SetMediaVolume => {
            let volume = number_arg(args, "volume")?.clamp(VOLUME_RANGE.0, VOLUME_RANGE.1);
            next.media_volume = volume;
            ToolOutcome::ok(format!("Volume set to {}%", volume))
        }

        CarTool::StartNavigation => {
            let destination = str_arg(args, "destination");
            let distance: u32 = rng.random_range(5..=54);
            next.navigation_active = true;
            next.navigation_destination = destination.to_string();
            next.navigation_distance = format!("{} km", distance);
            ToolOutcome::ok(format!(
                "Navigation started to {}, {} km away",
                destination, distance
            ))
        }

        CarTool::StopNavigation => {
            next.navigation_active = false;
            next.navigation_destination = NO_DESTINATION.to_string();
            next.navigation_distance = NO_DISTANCE.to_string();
            ToolOutcome::ok("Navigation stopped")
        }

        CarTool::GetVehicleStatus => {
            let mut snapshot = serde_json::to_value(status)
                .map_err(|e| format!("Failed to read vehicle status: {}", e))?;
            if let Value::Object(fields) = &mut snapshot {
                fields.remove("radioStation");
                fields.remove("radioPlaying");
                fields.insert("currentMedia".to_string(), status.current_media().into());
            }
            ToolOutcome::ok("Vehicle status retrieved").with("status", snapshot)
        }

        CarTool::GetCurrentTime => {
            let timezone = opt_str_arg(args, "timezone").unwrap_or("local");
            let now = if timezone.eq_ignore_ascii_case("utc") {
                OffsetDateTime::now_utc()
            } else {
                OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
            };
            let time = now.format(&Rfc2822).unwrap_or_else(|_| now.to_string());
            ToolOutcome::ok("Current time retrieved")
                .with("time", time)
                .with("timezone", timezone)
        }

        CarTool::GetWeather => {
            let location = opt_str_arg(args, "location").unwrap_or("Unknown");
            let unit = opt_str_arg(args, "unit").unwrap_or("celsius");
            let temperature = if unit == "celsius" { 22 } else { 72 };
            ToolOutcome::ok("Weather retrieved")
                .with("location", location)
                .with("temperature", temperature)
                .with("unit", unit)
                .with("condition", "Partly Cloudy")
                .with("humidity", 65)
                .with("wind_speed", 10)
        }

        CarTool::ControlMedia => {
            let action = str_arg(args, "action");
            next.music = if action == "play" {
                Playback::On
            } else {
                Playback::Off
            };
            match opt_str_arg(args, "source") {
                Some(source) => {
                    next.media_type = MediaType::from(source);
                    ToolOutcome::ok(format!("Media {} ({})", action, source))
                }
                None => ToolOutcome::ok(format!("Media {}", action)),
            }
        }

        CarTool::ChangeRadioStation => {
            let station = str_arg(args, "station");
            next.radio_station = station.to_string();
            next.media_type = MediaType::Radio;
            ToolOutcome::ok(format!("Radio tuned to {}", station))
        }
    };

    Ok((next, outcome))
}

fn opt_str_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// A text argument, empty when missing.
fn str_arg<'a>(args: &'a Value, key: &str) -> &'a str {
    opt_str_arg(args, key).unwrap_or_default()
}

/// A finite number, given either as a JSON number or a numeric string.
fn number_arg(args: &Value, key: &str) -> Result<f64, String> {
    let value = args
        .get(key)
        .ok_or_else(|| format!("Missing required argument: {}", key))?;

    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("Argument {} must be a number", key))
}
