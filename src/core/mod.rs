pub mod assistant;
pub mod audio;
pub mod drive_cycle;
pub mod metrics;
pub mod realtime;
pub mod tools;
pub mod vehicle;

// Re-export commonly used types for convenience
pub use assistant::{AssistantSession, LogEntry, LogKind};
pub use audio::AudioError;
pub use metrics::{LatencyStats, Metrics, MetricsSnapshot, TokenCounters};
pub use realtime::{
    ConnectionState, EventKind, InboundMessage, RealtimeClient, RealtimeConfig, RealtimeError,
    RealtimeEvent, RealtimeResult, RealtimeSender, ServerEvent, SessionConfig,
};
pub use tools::{CarTool, ToolOutcome, car_tools};
pub use vehicle::VehicleStatus;
