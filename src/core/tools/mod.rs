//! Car assistant tools: the catalog advertised to the model and the
//! dispatcher that runs tool calls against the vehicle state.

pub mod catalog;
pub mod dispatcher;

pub use catalog::{CarTool, car_tools};
pub use dispatcher::{TEMPERATURE_RANGE, ToolOutcome, VOLUME_RANGE, execute, execute_with_rng};
