//! Weather on sloping ground
//!
//! Adjusts the day's radiation and temperature for the slope and aspect of
//! the zone, after the energy partition of Allen et al. (2006) as adapted by
//! Cichota (2015). Measured radiation is split into direct and diffuse parts
//! using the sky clearness index. The direct part is rescaled by the ratio
//! of extraterrestrial irradiance on the slope to that on the horizontal,
//! corrected for the atmospheric path length. The diffuse part is rescaled
//! by the share of sky the slope sees, and radiation reflected from the
//! surroundings is added. Temperatures then shift with the change in
//! radiation, damped by wind.
//!
//! Rain, wind and vapour pressure are changed by fixed relative amounts,
//! unrelated to the slope.

use cropmet_core::clock::Clock;
use cropmet_core::component::WeatherModifier;
use cropmet_core::errors::{MetError, MetResult};
use cropmet_core::met::utilities::svp;
use cropmet_core::weather::WeatherProvider;
use cropmet_core::zone::Zone;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::info;

const SOLAR_CONSTANT: f64 = 1367.0;
/// kPa
const STANDARD_ATMOSPHERIC_PRESSURE: f64 = 101.325;
/// K
const STANDARD_ATMOSPHERIC_TEMPERATURE: f64 = 288.15;
const STANDARD_GRAVITATIONAL_ACCELERATION: f64 = 9.80665;
/// K/m
const STANDARD_TEMPERATURE_LAPSE_RATE: f64 = 0.00649;
/// kg/mol
const STANDARD_ATMOSPHERIC_MOLAR_MASS: f64 = 0.0289644;
const UNIVERSAL_GAS_CONSTANT: f64 = 8.31432;
const EPSILON: f64 = 1e-10;
/// Vapour pressure may not be raised beyond this fraction of saturation at MaxT.
const MAX_RELATIVE_VP: f64 = 0.95;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeEffectsParameters {
    /// Albedo of the surrounding land.
    ///
    /// Default: 0.2
    pub surrounds_albedo: f64,

    // === Relative changes, not linked to slope ===
    /// Change in rainfall (%).
    ///
    /// Default: 0.0
    pub d_rain: f64,
    /// Change in wind speed (%).
    ///
    /// Default: 0.0
    pub d_wind: f64,
    /// Change in vapour pressure (%).
    ///
    /// Default: 0.0
    pub d_vap_pressure: f64,

    // === Radiation partition ===
    /// Intercept of the logistic diffuse fraction curve.
    ///
    /// Default: -3.664
    pub a_diffuse_radn: f64,
    /// Slope of the logistic diffuse fraction curve.
    ///
    /// Default: 7.011
    pub b_diffuse_radn: f64,
    /// Default: 0.95
    pub turbidity_coefficient: f64,
    /// Default: 0.98
    pub a_ki: f64,
    /// Default: 0.00146
    pub b_ki: f64,
    /// Default: 0.075
    pub c_ki: f64,
    /// Default: 0.40
    pub d_ki: f64,
    /// Precipitable water intercept (mm).
    ///
    /// Default: 2.10
    pub a_pw: f64,
    /// Precipitable water per kPa of vapour pressure and air pressure.
    ///
    /// Default: 0.14
    pub b_pw: f64,

    // === Temperature response ===
    /// Temperature change per unit of radiation change in still air.
    ///
    /// Default: 1.61
    pub a_t0: f64,
    /// Exponent of the radiation change.
    ///
    /// Default: 0.88
    pub b_t: f64,
    /// Damping by wind (s/m).
    ///
    /// Default: 0.12
    pub c_t: f64,
    /// Scale of the response to less radiation.
    ///
    /// Default: 0.81
    pub f_n: f64,
    /// Share of the maximum temperature change applied to the minimum.
    ///
    /// Default: 0.5
    pub f_m: f64,
}

impl Default for SlopeEffectsParameters {
    fn default() -> Self {
        Self {
            surrounds_albedo: 0.2,
            d_rain: 0.0,
            d_wind: 0.0,
            d_vap_pressure: 0.0,
            a_diffuse_radn: -3.664,
            b_diffuse_radn: 7.011,
            turbidity_coefficient: 0.95,
            a_ki: 0.98,
            b_ki: 0.00146,
            c_ki: 0.075,
            d_ki: 0.40,
            a_pw: 2.10,
            b_pw: 0.14,
            a_t0: 1.61,
            b_t: 0.88,
            c_t: 0.12,
            f_n: 0.81,
            f_m: 0.5,
        }
    }
}

/// Site geometry, fixed for a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlopeGeometry {
    /// Slope (radians)
    pub slope: f64,
    /// Aspect measured from south (radians)
    pub aspect_from_south: f64,
    /// Latitude (radians)
    pub latitude: f64,
    /// Mean air pressure at the site altitude (kPa)
    pub atmospheric_pressure: f64,
    /// Share of the sky seen by the slope, for reflected radiation.
    pub slope_factor: f64,
}

impl SlopeGeometry {
    /// `slope`, `aspect` (clockwise from north) and `latitude` in degrees,
    /// `altitude` in metres.
    pub fn new(slope: f64, aspect: f64, latitude: f64, altitude: f64) -> Self {
        let mut aspect_from_south = aspect + 180.0;
        if aspect_from_south > 360.0 {
            aspect_from_south -= 360.0;
        }
        let slope = slope.to_radians();
        let exponent = STANDARD_GRAVITATIONAL_ACCELERATION * STANDARD_ATMOSPHERIC_MOLAR_MASS
            / (UNIVERSAL_GAS_CONSTANT * STANDARD_TEMPERATURE_LAPSE_RATE);
        let atmospheric_pressure = STANDARD_ATMOSPHERIC_PRESSURE
            * (1.0 - STANDARD_TEMPERATURE_LAPSE_RATE * altitude / STANDARD_ATMOSPHERIC_TEMPERATURE)
                .powf(exponent);
        Self {
            slope,
            aspect_from_south: aspect_from_south.to_radians(),
            latitude: latitude.to_radians(),
            atmospheric_pressure,
            slope_factor: 0.75 + 0.25 * slope.cos() - 0.5 * slope / PI,
        }
    }
}

/// Radiation on the slope for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlopeRadiation {
    /// Radiation on the horizontal (MJ/m2)
    pub measured: f64,
    pub extraterrestrial: f64,
    pub clearness_index: f64,
    pub diffuse_fraction: f64,
    /// Hours the horizontal could receive direct sun.
    pub max_direct_sunlight_length: f64,
    /// Hours the slope receives direct sun.
    pub actual_direct_sunlight_length: f64,
    pub direct_ratio: f64,
    pub diffuse_ratio: f64,
    pub direct: f64,
    pub diffuse: f64,
    pub reflected: f64,
}

impl SlopeRadiation {
    /// Radiation on the slope (MJ/m2)
    pub fn total(&self) -> f64 {
        self.direct + self.diffuse + self.reflected
    }

    /// Shares of direct, diffuse and reflected radiation.
    pub fn fractions(&self) -> (f64, f64, f64) {
        let total = self.total();
        if total > 0.0 {
            (
                self.direct / total,
                self.diffuse / total,
                self.reflected / total,
            )
        } else {
            (0.0, 0.0, 0.0)
        }
    }
}

/// Hour angles (radians from solar noon) bounding up to two spells of
/// direct sun on the slope.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SunlitSpells {
    sunrise1: f64,
    sunset1: f64,
    sunrise2: f64,
    sunset2: f64,
}

impl SunlitSpells {
    const NONE: SunlitSpells = SunlitSpells {
        sunrise1: 0.0,
        sunset1: 0.0,
        sunrise2: 0.0,
        sunset2: 0.0,
    };

    /// Sum over both spells of `f(sunset) - f(sunrise)`.
    fn span(&self, f: impl Fn(f64) -> f64) -> f64 {
        f(self.sunset1) - f(self.sunrise1) + f(self.sunset2) - f(self.sunrise2)
    }
}

/// Coefficients of the sine of the sun elevation on the slope,
/// `a + b cos(w) + c sin(w)` for hour angle `w`.
#[derive(Debug, Clone, Copy)]
struct SlopeSun {
    a: f64,
    b: f64,
    c: f64,
}

impl SlopeSun {
    fn elevation(&self, w: f64) -> f64 {
        (self.a + self.b * w.cos() + self.c * w.sin())
            .clamp(-1.0, 1.0)
            .asin()
    }

    /// Cosine of the hour angle at which the sun crosses the slope plane.
    fn cosine_ws(&self, switch: f64) -> f64 {
        let Self { a, b, c } = *self;
        let result = if a.abs() < EPSILON && b.abs() < EPSILON {
            switch
        } else if c.abs() < EPSILON {
            if a.abs() < EPSILON {
                0.0
            } else if b.abs() < EPSILON {
                if a < EPSILON {
                    -1000.0
                } else {
                    1000.0
                }
            } else {
                -a / b
            }
        } else {
            (-(a * b) + switch * c * (-(a * a) + b * b + c * c).max(0.0).sqrt()) / (b * b + c * c)
        };
        result.clamp(-1.0, 1.0)
    }

    fn evaluate_sun_angles(&self, option1: f64, option2: f64, option3: f64, default: f64) -> f64 {
        if self.c > EPSILON && self.elevation(option1).abs() < EPSILON {
            option1
        } else if self.c < -EPSILON && self.elevation(option2).abs() < EPSILON {
            option2
        } else {
            let elevation = self.elevation(default);
            if elevation > EPSILON {
                option3
            } else if elevation < -EPSILON {
                0.0
            } else if self.c.abs() < EPSILON && self.b < EPSILON {
                option2
            } else {
                default
            }
        }
    }

    /// Sunlit spells on the slope within the horizontal day `[-ws, ws]`.
    fn sunlit_spells(&self, ws: f64) -> SunlitSpells {
        let ws1 = -self.cosine_ws(1.0).acos();
        let ws2 = self.cosine_ws(-1.0).acos();
        let adj_ws1 = self.evaluate_sun_angles(-ws1, -2.0 * PI - ws1, -PI, ws1);
        let adj_ws2 = self.evaluate_sun_angles(2.0 * PI - ws2, -ws2, PI, ws2);

        let sunrise1 = adj_ws1.max(-ws).min(ws);
        let sunset1 = adj_ws2.min(ws).max(-ws);
        let mut sunrise2 = -ws;
        let mut sunset2 = ws;
        if self.c < EPSILON {
            sunrise2 = (adj_ws1 + 2.0 * PI).min(PI).min(ws).max(-ws);
        } else {
            sunset2 = (adj_ws2 - 2.0 * PI).max(-PI).max(-ws).min(ws);
        }

        if sunset1 > sunrise1 {
            if sunset2 > sunrise2 {
                if sunrise1 <= sunrise2 {
                    if sunrise2 > sunset1 {
                        SunlitSpells {
                            sunrise1,
                            sunset1,
                            sunrise2,
                            sunset2,
                        }
                    } else {
                        SunlitSpells {
                            sunrise1,
                            sunset1: sunset2,
                            sunrise2: sunset2,
                            sunset2,
                        }
                    }
                } else if sunrise1 > sunset2 {
                    SunlitSpells {
                        sunrise1: sunrise2,
                        sunset1: sunset2,
                        sunrise2: sunrise1,
                        sunset2: sunset1,
                    }
                } else {
                    SunlitSpells {
                        sunrise1: sunrise2,
                        sunset1,
                        sunrise2: sunset1,
                        sunset2: sunset1,
                    }
                }
            } else {
                SunlitSpells {
                    sunrise1,
                    sunset1,
                    sunrise2: sunset1,
                    sunset2: sunset1,
                }
            }
        } else if sunset2 > sunrise2 {
            SunlitSpells {
                sunrise1: sunrise2,
                sunset1: sunset2,
                sunrise2: sunset2,
                sunset2,
            }
        } else {
            SunlitSpells::NONE
        }
    }
}

/// Adjusts radiation, temperature, rain, wind and vapour pressure for a
/// sloping zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlopeEffectsOnWeather {
    #[serde(default)]
    parameters: SlopeEffectsParameters,
    #[serde(skip)]
    geometry: SlopeGeometry,
    /// Relative changes as fractions, no lower than -1.
    #[serde(skip)]
    fractions: (f64, f64, f64),
    #[serde(skip)]
    radiation: SlopeRadiation,
    #[serde(skip)]
    delta_temperature: (f64, f64),
}

impl SlopeEffectsOnWeather {
    pub fn from_parameters(parameters: SlopeEffectsParameters) -> Self {
        Self {
            parameters,
            ..Default::default()
        }
    }

    pub fn parameters(&self) -> &SlopeEffectsParameters {
        &self.parameters
    }

    pub fn geometry(&self) -> &SlopeGeometry {
        &self.geometry
    }

    /// Radiation partition of the last day adjusted.
    pub fn radiation(&self) -> &SlopeRadiation {
        &self.radiation
    }

    /// Changes to (MaxT, MinT) on the last day adjusted.
    pub fn delta_temperature(&self) -> (f64, f64) {
        self.delta_temperature
    }

    /// Check the zone and parameters and fix the site geometry.
    pub fn initialise(&mut self, zone: &Zone, latitude: f64) -> MetResult<()> {
        let out_of_range = |name: &str, value: f64, range: &str| MetError::InvalidParameter {
            name: name.to_string(),
            message: format!("{value} is out of the expected range ({range})"),
        };
        if !(0.0..=90.0).contains(&zone.slope) {
            return Err(out_of_range("slope", zone.slope, "0-90 deg"));
        }
        if !(0.0..=360.0).contains(&zone.aspect) {
            return Err(out_of_range("aspect", zone.aspect, "0-360 deg"));
        }
        if zone.altitude < -100.0 {
            return Err(out_of_range("altitude", zone.altitude, "above -100 m"));
        }
        let p = &self.parameters;
        if !(0.0..=1.0).contains(&p.surrounds_albedo) {
            return Err(out_of_range("surrounds_albedo", p.surrounds_albedo, "0-1"));
        }
        if !(0.0..=1.0).contains(&p.turbidity_coefficient) {
            return Err(out_of_range(
                "turbidity_coefficient",
                p.turbidity_coefficient,
                "0-1",
            ));
        }

        self.geometry = SlopeGeometry::new(zone.slope, zone.aspect, latitude, zone.altitude);
        self.fractions = (
            (0.01 * p.d_rain).max(-1.0),
            (0.01 * p.d_wind).max(-1.0),
            (0.01 * p.d_vap_pressure).max(-1.0),
        );
        info!(
            zone = %zone.name,
            slope = zone.slope,
            aspect = zone.aspect,
            "Weather will be adjusted for slope and aspect"
        );
        Ok(())
    }

    /// Partition `radn` (MJ/m2) measured on the horizontal and project it onto
    /// the slope. `vp` is the measured vapour pressure (hPa).
    pub fn radiation_on_slope(&self, day_of_year: u32, radn: f64, vp: f64) -> SlopeRadiation {
        let p = &self.parameters;
        let g = &self.geometry;
        let lat = g.latitude;

        let day_angle = 2.0 * PI * ((day_of_year as f64 - 0.5) / 365.25).min(0.9995);
        let declination = 0.006918 - 0.399912 * day_angle.cos() + 0.070257 * day_angle.sin()
            - 0.006758 * (2.0 * day_angle).cos()
            + 0.000907 * (2.0 * day_angle).sin()
            - 0.002697 * (3.0 * day_angle).cos()
            + 0.001480 * (3.0 * day_angle).sin();
        let eccentricity = 1.00011
            + 0.034221 * day_angle.cos()
            + 0.00128 * day_angle.sin()
            + 0.000719 * (2.0 * day_angle).cos()
            + 0.000077 * (2.0 * day_angle).sin();
        let ws = (-lat.tan() * declination.tan()).clamp(-1.0, 1.0).acos();
        let relative_irradiance = (lat.cos() * declination.cos() * ws.sin()
            + lat.sin() * declination.sin() * ws)
            / PI;
        let extraterrestrial =
            relative_irradiance * eccentricity * SOLAR_CONSTANT * 24.0 * 3600.0 / 1_000_000.0;
        let clearness_index = (radn / extraterrestrial).clamp(0.0, 1.0);
        let diffuse_fraction =
            1.0 / (1.0 + (p.a_diffuse_radn + p.b_diffuse_radn * clearness_index).exp());
        let max_direct_sunlight_length = 24.0 * ws / PI;

        let mut radiation = SlopeRadiation {
            measured: radn,
            extraterrestrial,
            clearness_index,
            diffuse_fraction,
            max_direct_sunlight_length,
            actual_direct_sunlight_length: max_direct_sunlight_length,
            direct_ratio: 1.0,
            diffuse_ratio: 1.0,
            direct: radn * (1.0 - diffuse_fraction),
            diffuse: radn * diffuse_fraction,
            reflected: 0.0,
        };
        if g.slope <= EPSILON {
            return radiation;
        }

        let sun = SlopeSun {
            a: declination.sin()
                * (lat.sin() * g.slope.cos()
                    - lat.cos() * g.slope.sin() * g.aspect_from_south.cos()),
            b: declination.cos()
                * (lat.cos() * g.slope.cos()
                    + lat.sin() * g.slope.sin() * g.aspect_from_south.cos()),
            c: declination.cos() * g.slope.sin() * g.aspect_from_south.sin(),
        };
        let gg = declination.sin() * lat.sin();
        let hh = declination.cos() * lat.cos();
        let spells = sun.sunlit_spells(ws);
        let SlopeSun { a, b, c } = sun;

        radiation.actual_direct_sunlight_length = 12.0
            * ((spells.sunset1 - spells.sunrise1).max(0.0)
                + (spells.sunset2 - spells.sunrise2).max(0.0))
            / PI;

        let angle = spells.span(|w| w);
        let sine = spells.span(f64::sin);
        let cosine = spells.span(f64::cos);
        let irradiance_on_slope = (a * angle + b * sine - c * cosine) / (2.0 * PI);

        // Mean optical path of the direct beam.
        let path_horizontal = (2.0 * ws * gg.powi(2)
            + 4.0 * gg * hh * ws.sin()
            + (ws + 0.5 * (2.0 * ws).sin()) * hh.powi(2))
            / (2.0 * (gg * ws + hh * ws.sin()));
        let path_slope = if radiation.actual_direct_sunlight_length > EPSILON {
            let numerator = (b * gg + a * hh) * sine - c * gg * cosine
                + (0.5 * b * hh + a * gg) * angle
                + 0.25 * b * hh * spells.span(|w| (2.0 * w).sin())
                + 0.5 * c * hh * spells.span(|w| w.sin().powi(2));
            let denominator = a * angle + b * sine - c * cosine;
            numerator / denominator
        } else {
            0.0
        };

        let precipitable_water = p.a_pw + p.b_pw * (vp * 0.1) * g.atmospheric_pressure;
        let transmissivity = |path: f64| {
            p.a_ki
                * (-p.b_ki * g.atmospheric_pressure / (p.turbidity_coefficient * path)
                    - p.c_ki * (precipitable_water / path).powf(p.d_ki))
                .exp()
        };
        let direct_ratio = if path_slope > 0.0 {
            irradiance_on_slope / relative_irradiance * transmissivity(path_slope)
                / transmissivity(path_horizontal)
        } else {
            0.0
        };
        let diffuse_ratio = (1.0 - clearness_index * (1.0 - diffuse_fraction))
            * (1.0 + (1.0 - diffuse_fraction).sqrt() * (0.5 * g.slope).sin().powi(3))
            * g.slope_factor
            + direct_ratio * clearness_index * (1.0 - diffuse_fraction);

        radiation.direct_ratio = direct_ratio;
        radiation.diffuse_ratio = diffuse_ratio;
        radiation.direct = radn * direct_ratio * (1.0 - diffuse_fraction);
        radiation.diffuse = radn * diffuse_ratio * diffuse_fraction;
        radiation.reflected = radn * p.surrounds_albedo * (1.0 - g.slope_factor);
        radiation
    }

    /// Changes to (MaxT, MinT) for a change in radiation `delta_radn` at
    /// wind speed `wind`.
    pub fn temperature_change(&self, wind: f64, delta_radn: f64) -> (f64, f64) {
        let p = &self.parameters;
        let a_t = p.a_t0 * (-p.c_t * wind).exp();
        if a_t <= 0.0 || delta_radn == 0.0 {
            return (0.0, 0.0);
        }
        let response = a_t * delta_radn.abs().powf(p.b_t);
        if delta_radn < 0.0 {
            (-p.f_n * response, -p.f_n * p.f_m * response)
        } else {
            (response, p.f_m * response)
        }
    }
}

#[typetag::serde]
impl WeatherModifier for SlopeEffectsOnWeather {
    fn name(&self) -> &str {
        "SlopeEffectsOnWeather"
    }

    fn on_start_of_simulation(&mut self, weather: &dyn WeatherProvider, zone: &Zone) -> MetResult<()> {
        self.initialise(zone, weather.latitude())
    }

    fn on_weather_prepared(
        &mut self,
        weather: &mut dyn WeatherProvider,
        clock: &Clock,
    ) -> MetResult<()> {
        let (d_rain, d_wind, d_vp) = self.fractions;
        let today = weather.weather_mut();

        let wind_measured = today.wind;
        let wind = if d_wind.abs() > EPSILON {
            wind_measured * (1.0 + d_wind)
        } else {
            wind_measured
        };
        let vp_measured = today.vp();

        self.radiation = self.radiation_on_slope(clock.today().ordinal(), today.radn, vp_measured);
        let radn = self.radiation.total();
        self.delta_temperature = self.temperature_change(wind, radn - today.radn);
        let (dlt_max_t, dlt_min_t) = self.delta_temperature;

        if d_rain.abs() > EPSILON {
            today.rain *= 1.0 + d_rain;
        }
        if dlt_max_t.abs() > EPSILON {
            today.max_t += dlt_max_t;
        }
        if dlt_min_t.abs() > EPSILON {
            today.min_t = (today.min_t + dlt_min_t).min(today.max_t);
        }
        if (today.radn - radn).abs() > EPSILON {
            today.radn = radn;
        }
        if wind_measured > 0.0 && d_wind.abs() > EPSILON {
            today.wind = wind;
        }
        if d_vp.abs() > EPSILON {
            let limit = MAX_RELATIVE_VP * svp(today.max_t);
            today.vp = Some((vp_measured * (1.0 + d_vp)).min(limit));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn component(zone: &Zone, latitude: f64) -> SlopeEffectsOnWeather {
        let mut component = SlopeEffectsOnWeather::from_parameters(SlopeEffectsParameters::default());
        component.initialise(zone, latitude).unwrap();
        component
    }

    #[test]
    fn flat_ground_leaves_radiation_unchanged() {
        let slope = component(&Zone::default(), -35.0);
        let radiation = slope.radiation_on_slope(15, 25.0, 15.0);
        assert_eq!(radiation.direct_ratio, 1.0);
        assert_eq!(radiation.diffuse_ratio, 1.0);
        assert_eq!(radiation.reflected, 0.0);
        assert_relative_eq!(radiation.total(), 25.0, epsilon = 1e-12);
        assert_eq!(slope.temperature_change(2.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn equator_facing_slope_gets_more_winter_sun() {
        // Southern hemisphere winter, slope facing north.
        let north = component(&Zone::default().with_slope(30.0, 0.0), -40.0);
        let south = component(&Zone::default().with_slope(30.0, 180.0), -40.0);
        let facing_sun = north.radiation_on_slope(172, 8.0, 10.0);
        let facing_away = south.radiation_on_slope(172, 8.0, 10.0);
        assert!(facing_sun.total() > 8.0);
        assert!(facing_away.total() < 8.0);
        assert!(facing_sun.actual_direct_sunlight_length <= facing_sun.max_direct_sunlight_length + 1e-9);
        let (direct, diffuse, reflected) = facing_sun.fractions();
        assert_relative_eq!(direct + diffuse + reflected, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn temperature_response_is_asymmetric() {
        let slope = component(&Zone::default(), -35.0);
        let (up_max, up_min) = slope.temperature_change(0.0, 2.0);
        let (down_max, down_min) = slope.temperature_change(0.0, -2.0);
        assert_relative_eq!(up_max, 1.61 * 2.0_f64.powf(0.88));
        assert_relative_eq!(up_min, 0.5 * up_max);
        assert_relative_eq!(down_max, -0.81 * up_max);
        assert_relative_eq!(down_min, -0.81 * 0.5 * up_max);
        // Wind damps the response.
        assert!(slope.temperature_change(5.0, 2.0).0 < up_max);
    }

    #[test]
    fn rejects_out_of_range_zone() {
        let mut slope = SlopeEffectsOnWeather::default();
        let steep = Zone::default().with_slope(95.0, 0.0);
        assert!(slope.initialise(&steep, -35.0).is_err());
        let twisted = Zone::default().with_slope(10.0, 400.0);
        assert!(slope.initialise(&twisted, -35.0).is_err());
    }

    #[test]
    fn geometry_at_sea_level() {
        let geometry = SlopeGeometry::new(0.0, 90.0, -30.0, 0.0);
        assert_relative_eq!(geometry.atmospheric_pressure, 101.325);
        assert_relative_eq!(geometry.slope_factor, 1.0);
        assert_relative_eq!(geometry.aspect_from_south, 270.0_f64.to_radians());
    }
}
