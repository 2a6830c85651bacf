//! Vehicle type selection
//!
//! The vehicle type prefixes every API path. Any single path segment is accepted;
//! values outside the known set only produce empty results downstream.

use crate::FipeError;

/// Vehicle types the FIPE API recognises
pub const KNOWN_VEHICLE_TYPES: [&str; 3] = ["carros", "motos", "caminhoes"];

/// Characters that would change the request URL if used in a path segment
const RESERVED_PATH_CHARS: [char; 5] = ['/', '\\', '?', '#', '%'];

/// Returns true for `carros`, `motos` and `caminhoes`
pub fn is_known_vehicle_type(vehicle_type: &str) -> bool {
    KNOWN_VEHICLE_TYPES.contains(&vehicle_type)
}

/// Normalizes operator input into a vehicle type path segment
///
/// Surrounding whitespace is trimmed and the value is lowercased. Empty
/// input, `.`, `..` and values containing URL delimiters are rejected;
/// unknown values are returned as-is with a warning.
pub fn parse_vehicle_type(input: &str) -> Result<String, FipeError> {
    let vehicle_type = input.trim().to_lowercase();

    if vehicle_type.is_empty() {
        return Err(FipeError::InvalidVehicleType(
            "vehicle type cannot be empty".to_string(),
        ));
    }

    if vehicle_type == "." || vehicle_type == ".." {
        return Err(FipeError::InvalidVehicleType(format!(
            "'{}' is not a path segment",
            vehicle_type
        )));
    }

    if let Some(c) = vehicle_type.chars().find(|c| RESERVED_PATH_CHARS.contains(c)) {
        return Err(FipeError::InvalidVehicleType(format!(
            "'{}' must not contain '{}'",
            vehicle_type, c
        )));
    }

    if !is_known_vehicle_type(&vehicle_type) {
        tracing::warn!(
            "Unknown vehicle type '{}', expected one of: {}",
            vehicle_type,
            KNOWN_VEHICLE_TYPES.join(", ")
        );
    }

    Ok(vehicle_type)
}
