//! Error types for proximity ranking and daylight analytics.

use core::fmt;

/// Result type alias for operations in this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while ingesting places, ranking them, or building a daylight series.
///
/// A rise/set event that does not happen inside the search window is *not* an error;
/// it is reported as `None` wherever an instant is expected.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid latitude value (must be between -90 and +90 degrees).
    InvalidLatitude {
        /// The invalid latitude value provided.
        value: f64,
    },
    /// Invalid longitude value (must be between -180 and +180 degrees).
    InvalidLongitude {
        /// The invalid longitude value provided.
        value: f64,
    },
    /// Invalid date/time, or a year outside the supported range.
    InvalidDateTime {
        /// Description of the date/time constraint violation.
        message: &'static str,
    },
    /// The requested place is not part of the catalog.
    MissingReference {
        /// Name that was looked up.
        name: String,
    },
    /// The celestial event oracle failed; the current run is abandoned.
    OracleUnavailable {
        /// Description reported by the oracle.
        message: String,
    },
    /// The run did not finish before its deadline.
    Timeout {
        /// Milliseconds elapsed when the deadline was detected.
        elapsed_ms: u64,
    },
    /// The run was cancelled by a superseding trigger.
    Cancelled,
    /// A catalog payload could not be parsed.
    CatalogFormat {
        /// Description of the parse failure.
        message: String,
    },
    /// A configuration value is missing or out of range.
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLatitude { value } => {
                write!(
                    f,
                    "invalid latitude {value}° (must be between -90° and +90°)"
                )
            }
            Self::InvalidLongitude { value } => {
                write!(
                    f,
                    "invalid longitude {value}° (must be between -180° and +180°)"
                )
            }
            Self::InvalidDateTime { message } => {
                write!(f, "invalid date/time: {message}")
            }
            Self::MissingReference { name } => {
                write!(f, "place `{name}` is not in the catalog")
            }
            Self::OracleUnavailable { message } => {
                write!(f, "celestial event oracle unavailable: {message}")
            }
            Self::Timeout { elapsed_ms } => {
                write!(f, "run timed out after {elapsed_ms} ms")
            }
            Self::Cancelled => write!(f, "run cancelled by a newer trigger"),
            Self::CatalogFormat { message } => {
                write!(f, "malformed catalog: {message}")
            }
            Self::Config { message } => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Creates an invalid latitude error.
    #[must_use]
    pub const fn invalid_latitude(value: f64) -> Self {
        Self::InvalidLatitude { value }
    }

    /// Creates an invalid longitude error.
    #[must_use]
    pub const fn invalid_longitude(value: f64) -> Self {
        Self::InvalidLongitude { value }
    }

    /// Creates an invalid date/time error.
    #[must_use]
    pub const fn invalid_datetime(message: &'static str) -> Self {
        Self::InvalidDateTime { message }
    }

    /// Creates a missing reference error.
    #[must_use]
    pub fn missing_reference(name: impl Into<String>) -> Self {
        Self::MissingReference { name: name.into() }
    }

    /// Creates an oracle failure error.
    #[must_use]
    pub fn oracle_unavailable(message: impl Into<String>) -> Self {
        Self::OracleUnavailable {
            message: message.into(),
        }
    }

    /// Creates a catalog format error.
    #[must_use]
    pub fn catalog_format(message: impl Into<String>) -> Self {
        Self::CatalogFormat {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error stems from a coordinate outside the valid range.
    #[must_use]
    pub const fn is_invalid_coordinate(&self) -> bool {
        matches!(
            self,
            Self::InvalidLatitude { .. } | Self::InvalidLongitude { .. }
        )
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::catalog_format(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::catalog_format(err.to_string())
    }
}

/// Validates latitude is within the valid range (-90 to +90 degrees).
///
/// # Errors
/// Returns `InvalidLatitude` if latitude is outside -90 to +90 degrees or not finite.
pub fn check_latitude(latitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::invalid_latitude(latitude));
    }
    Ok(())
}

/// Validates longitude is within the valid range (-180 to +180 degrees).
///
/// # Errors
/// Returns `InvalidLongitude` if longitude is outside -180 to +180 degrees or not finite.
pub fn check_longitude(longitude: f64) -> Result<()> {
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::invalid_longitude(longitude));
    }
    Ok(())
}

/// Validates both latitude and longitude are within valid ranges.
///
/// # Errors
/// Returns `InvalidLatitude` or `InvalidLongitude` for out-of-range coordinates.
pub fn check_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    check_latitude(latitude)?;
    check_longitude(longitude)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_ranges() {
        let cases = [
            ((16.5062, 80.6480), None),
            ((90.0, -180.0), None),
            ((-90.0, 180.0), None),
            ((90.5, 0.0), Some(Error::invalid_latitude(90.5))),
            ((-33.9, 180.1), Some(Error::invalid_longitude(180.1))),
            ((f64::INFINITY, 0.0), Some(Error::invalid_latitude(f64::INFINITY))),
        ];
        for ((lat, lon), expected) in cases {
            assert_eq!(check_coordinates(lat, lon).err(), expected, "({lat}, {lon})");
        }
        // NaN never compares equal, so only the variant is checked.
        assert!(matches!(
            check_latitude(f64::NAN),
            Err(Error::InvalidLatitude { .. })
        ));
        assert!(check_longitude(f64::NAN).is_err());
    }

    #[test]
    fn test_coordinate_classification() {
        assert!(Error::invalid_latitude(95.0).is_invalid_coordinate());
        assert!(Error::invalid_longitude(-200.0).is_invalid_coordinate());
        assert!(!Error::Cancelled.is_invalid_coordinate());
        assert_eq!(
            check_coordinates(10.0, 200.0),
            Err(Error::invalid_longitude(200.0))
        );
    }

    #[test]
    fn test_error_display() {
        let err = Error::invalid_latitude(95.0);
        assert_eq!(
            err.to_string(),
            "invalid latitude 95° (must be between -90° and +90°)"
        );

        let err = Error::missing_reference("Atlantis");
        assert_eq!(err.to_string(), "place `Atlantis` is not in the catalog");

        let err = Error::oracle_unavailable("connection reset");
        assert_eq!(
            err.to_string(),
            "celestial event oracle unavailable: connection reset"
        );

        assert_eq!(
            Error::Timeout { elapsed_ms: 1500 }.to_string(),
            "run timed out after 1500 ms"
        );
    }
}
