//! EPA Federal Test Procedure drive cycle for a battery electric vehicle.
//!
//! The cycle lasts 1369 seconds: a cold start phase (0-505 s) followed by a
//! transient phase (505-1369 s). Speeds are in km/h and follow a simplified
//! piecewise profile of the official schedule.

use std::f64::consts::PI;

/// Total cycle length in seconds.
pub const CYCLE_DURATION: u64 = 1369;

/// Length of the cold start phase in seconds.
pub const COLD_START_DURATION: f64 = 505.0;

/// Battery drain per tick while stationary, in percent.
pub const IDLE_CONSUMPTION: f64 = 0.0005;

/// Speed at a position within the cycle, in seconds from its start.
///
/// Positions past the end of the cycle hold the final cruise speed; use
/// [`speed_at`] for wall-clock time.
pub fn speed(position: f64) -> u32 {
    let kmh = if position < COLD_START_DURATION {
        cold_start_speed(position)
    } else {
        transient_speed(position - COLD_START_DURATION)
    };
    kmh.round().max(0.0) as u32
}

/// Speed at an elapsed time, wrapping with the cycle period.
pub fn speed_at(elapsed_secs: u64) -> u32 {
    speed((elapsed_secs % CYCLE_DURATION) as f64)
}

/// Battery drain for one one-second tick at `speed`, in percent.
pub fn battery_consumption(speed: u32) -> f64 {
    if speed == 0 {
        IDLE_CONSUMPTION
    } else {
        0.0001 + (speed as f64 / 100.0) * 0.003
    }
}

fn cold_start_speed(t: f64) -> f64 {
    if t < 50.0 {
        // Initial acceleration
        (t / 50.0) * 60.0
    } else if t < 80.0 {
        60.0
    } else if t < 130.0 {
        60.0 + ((t - 80.0) / 50.0) * 30.0
    } else if t < 160.0 {
        90.0 - ((t - 130.0) / 30.0) * 60.0
    } else if t < 200.0 {
        30.0 + ((t - 160.0) / 40.0) * 20.0
    } else if t < 320.0 {
        ((t - 200.0) / 120.0 * PI).sin() * 20.0 + 40.0
    } else if t < 360.0 {
        // Stop
        0.0
    } else if t < 410.0 {
        ((t - 360.0) / 50.0) * 56.7
    } else {
        56.0
    }
}

fn transient_speed(t: f64) -> f64 {
    if t < 100.0 {
        (t / 100.0) * 75.0
    } else if t < 200.0 {
        75.0
    } else if t < 300.0 {
        75.0 - ((t - 200.0) / 100.0) * 75.0
    } else if t < 320.0 {
        // Stop
        0.0
    } else if t < 420.0 {
        ((t - 320.0) / 100.0) * 60.0
    } else if t < 500.0 {
        60.0
    } else if t < 620.0 {
        (((t - 500.0) / 120.0) * PI * 2.0).sin() * 20.0 + 40.0
    } else if t < 700.0 {
        ((t - 620.0) / 80.0) * 56.7
    } else {
        56.0
    }
}
