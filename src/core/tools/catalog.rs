//! Car tool catalog advertised to the model.

use once_cell::sync::Lazy;
use phf::phf_map;
use serde_json::json;

use crate::core::realtime::ToolDefinition;

/// Tools the dispatcher knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CarTool {
    ControlHeadlights,
    ControlWindows,
    SetTemperature,
    PlayRadio,
    PlayMusic,
    PlayPodcast,
    PlayAudiobook,
    ControlMediaPlayback,
    SetMediaVolume,
    StartNavigation,
    StopNavigation,
    GetVehicleStatus,
    GetCurrentTime,
    GetWeather,
    /// Handled but not advertised
    ControlMedia,
    /// Handled but not advertised
    ChangeRadioStation,
}

/// O(1) lookup from wire name to tool.
static TOOL_NAMES: phf::Map<&'static str, CarTool> = phf_map! {
    "control_headlights" => CarTool::ControlHeadlights,
    "control_windows" => CarTool::ControlWindows,
    "set_temperature" => CarTool::SetTemperature,
    "play_radio" => CarTool::PlayRadio,
    "play_music" => CarTool::PlayMusic,
    "play_podcast" => CarTool::PlayPodcast,
    "play_audiobook" => CarTool::PlayAudiobook,
    "control_media_playback" => CarTool::ControlMediaPlayback,
    "set_media_volume" => CarTool::SetMediaVolume,
    "start_navigation" => CarTool::StartNavigation,
    "stop_navigation" => CarTool::StopNavigation,
    "get_vehicle_status" => CarTool::GetVehicleStatus,
    "get_current_time" => CarTool::GetCurrentTime,
    "get_weather" => CarTool::GetWeather,
    "control_media" => CarTool::ControlMedia,
    "change_radio_station" => CarTool::ChangeRadioStation,
};

impl CarTool {
    /// Look up a tool by its wire name. Names are case-sensitive.
    pub fn parse(name: &str) -> Option<Self> {
        TOOL_NAMES.get(name).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ControlHeadlights => "control_headlights",
            Self::ControlWindows => "control_windows",
            Self::SetTemperature => "set_temperature",
            Self::PlayRadio => "play_radio",
            Self::PlayMusic => "play_music",
            Self::PlayPodcast => "play_podcast",
            Self::PlayAudiobook => "play_audiobook",
            Self::ControlMediaPlayback => "control_media_playback",
            Self::SetMediaVolume => "set_media_volume",
            Self::StartNavigation => "start_navigation",
            Self::StopNavigation => "stop_navigation",
            Self::GetVehicleStatus => "get_vehicle_status",
            Self::GetCurrentTime => "get_current_time",
            Self::GetWeather => "get_weather",
            Self::ControlMedia => "control_media",
            Self::ChangeRadioStation => "change_radio_station",
        }
    }

    /// Whether the tool is part of the catalog sent to the model.
    pub fn is_advertised(&self) -> bool {
        !matches!(self, Self::ControlMedia | Self::ChangeRadioStation)
    }
}

static CAR_TOOLS: Lazy<Vec<ToolDefinition>> = Lazy::new(|| {
    vec![
        ToolDefinition::function(
            "control_headlights",
            "Turn headlights on or off",
            json!({
                "type": "object",
                "properties": {
                    "state": {
                        "type": "string",
                        "enum": ["on", "off", "auto"],
                        "description": "Headlight state: on, off, or auto"
                    }
                },
                "required": ["state"]
            }),
        ),
        ToolDefinition::function(
            "control_windows",
            "Open or close car windows",
            json!({
                "type": "object",
                "properties": {
                    "position": {
                        "type": "string",
                        "enum": ["all", "driver", "passenger", "rear_left", "rear_right"],
                        "description": "Which window(s) to control"
                    },
                    "action": {
                        "type": "string",
                        "enum": ["open", "close"],
                        "description": "Open or close the window"
                    }
                },
                "required": ["position", "action"]
            }),
        ),
        ToolDefinition::function(
            "set_temperature",
            "Set cabin temperature in Celsius",
            json!({
                "type": "object",
                "properties": {
                    "temperature": {
                        "type": "number",
                        "description": "Target temperature in Celsius (16-30)"
                    }
                },
                "required": ["temperature"]
            }),
        ),
        ToolDefinition::function(
            "play_radio",
            "Play radio and optionally tune to a specific station",
            json!({
                "type": "object",
                "properties": {
                    "station": {
                        "type": "string",
                        "description": "Radio station (e.g., 'FM 101.5', 'AM 1020'). If not specified, plays current station"
                    }
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "play_music",
            "Play music - either a specific song or playlist",
            json!({
                "type": "object",
                "properties": {
                    "content": {
                        "type": "string",
                        "description": "Song name, artist, or playlist name (e.g., 'Bohemian Rhapsody', 'My Favorites Playlist', 'Rock Hits')"
                    }
                },
                "required": ["content"]
            }),
        ),
        ToolDefinition::function(
            "play_podcast",
            "Play a specific podcast or podcast episode",
            json!({
                "type": "object",
                "properties": {
                    "podcast": {
                        "type": "string",
                        "description": "Podcast name or episode (e.g., 'Tech Talk #127', 'AI Today', 'Daily News')"
                    }
                },
                "required": ["podcast"]
            }),
        ),
        ToolDefinition::function(
            "play_audiobook",
            "Play a specific audiobook",
            json!({
                "type": "object",
                "properties": {
                    "book": {
                        "type": "string",
                        "description": "Audiobook title or author (e.g., 'Digital Fortress', '1984', 'Stephen King - The Stand')"
                    }
                },
                "required": ["book"]
            }),
        ),
        ToolDefinition::function(
            "control_media_playback",
            "Control current media playback (pause, resume, stop, next, previous)",
            json!({
                "type": "object",
                "properties": {
                    "action": {
                        "type": "string",
                        "enum": ["play", "pause", "stop", "next", "previous"],
                        "description": "Playback control action"
                    }
                },
                "required": ["action"]
            }),
        ),
        ToolDefinition::function(
            "set_media_volume",
            "Set media volume level",
            json!({
                "type": "object",
                "properties": {
                    "volume": {
                        "type": "number",
                        "description": "Volume level 0-100"
                    }
                },
                "required": ["volume"]
            }),
        ),
        ToolDefinition::function(
            "start_navigation",
            "Start navigation to a destination",
            json!({
                "type": "object",
                "properties": {
                    "destination": {
                        "type": "string",
                        "description": "Destination address or place name"
                    }
                },
                "required": ["destination"]
            }),
        ),
        ToolDefinition::function(
            "stop_navigation",
            "Stop current navigation",
            json!({ "type": "object", "properties": {} }),
        ),
        ToolDefinition::function(
            "get_vehicle_status",
            "Get current vehicle status including speed, battery, lights, windows, etc.",
            json!({ "type": "object", "properties": {} }),
        ),
        ToolDefinition::function(
            "get_current_time",
            "Get the current time",
            json!({
                "type": "object",
                "properties": {
                    "timezone": {
                        "type": "string",
                        "description": "Timezone: 'UTC' or 'local'"
                    }
                },
                "required": []
            }),
        ),
        ToolDefinition::function(
            "get_weather",
            "Get current weather for a location",
            json!({
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "City and state, e.g., 'Seattle, WA'"
                    },
                    "unit": {
                        "type": "string",
                        "enum": ["celsius", "fahrenheit"],
                        "description": "Temperature unit"
                    }
                },
                "required": ["location"]
            }),
        ),
    ]
});

/// The tool definitions sent in the session configuration.
pub fn car_tools() -> Vec<ToolDefinition> {
    CAR_TOOLS.clone()
}
