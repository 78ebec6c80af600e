mod telemetry;

pub use telemetry::TelemetryGuard;
