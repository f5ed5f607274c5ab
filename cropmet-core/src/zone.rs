use serde::{Deserialize, Serialize};

/// The paddock the weather applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Zone {
    pub name: String,
    /// Altitude above sea level (m).
    ///
    /// Default: 50.0
    pub altitude: f64,
    /// Slope of the ground (degrees from horizontal).
    ///
    /// Default: 0.0
    pub slope: f64,
    /// Direction the slope faces (degrees clockwise from north).
    ///
    /// Default: 0.0
    pub aspect: f64,
}

impl Default for Zone {
    fn default() -> Self {
        Self {
            name: "Field".to_string(),
            altitude: 50.0,
            slope: 0.0,
            aspect: 0.0,
        }
    }
}

impl Zone {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = altitude;
        self
    }

    pub fn with_slope(mut self, slope: f64, aspect: f64) -> Self {
        self.slope = slope;
        self.aspect = aspect;
        self
    }
}
