//! Derived weather quantities
//!
//! Pure functions shared by every weather provider and by the components that
//! consume their output: saturation vapour pressure and deficit, astronomical
//! day length, extraterrestrial and clear-sky radiation, the Bristow–Campbell
//! diffuse fraction, barometric air pressure and the long-term TAV/AMP
//! statistics.
//!
//! Angles are in degrees at the API boundary and converted internally.

use chrono::{Datelike, NaiveDate};
use is_close::is_close;
use ndarray::Array2;
use std::f64::consts::PI;

/// Atmospheric transmissivity at the zenith used for clear-sky radiation.
pub const TAZ: f64 = 0.87;
/// Reduction in transmissivity per hPa of vapour pressure.
pub const ALPHA: f64 = 0.0061;
/// Twilight angle used for sunrise/sunset (civil twilight).
pub const CIVIL_TWILIGHT: f64 = -6.0;

/// Number of trapezoids used to integrate instantaneous radiation over half a day.
const INTEGRATION_STEPS: usize = 10;
/// Day number of the autumnal equinox.
const EQUINOX_DAY: f64 = 79.25;
/// Amplitude of the solar declination (degrees).
const DECLINATION_AMPLITUDE: f64 = 23.45;
/// Amplitude of the solar declination used for day length (degrees).
const DAY_LENGTH_DECLINATION_AMPLITUDE: f64 = 23.45116;

/// Saturation vapour pressure (hPa) at `temp` (°C).
pub fn svp(temp: f64) -> f64 {
    6.1078 * (17.269 * temp / (237.3 + temp)).exp()
}

/// Daytime vapour pressure deficit (hPa).
///
/// Weighted two thirds towards the deficit at the maximum temperature. Each
/// partial deficit is floored at zero so a vapour pressure above saturation
/// never produces a negative deficit.
pub fn vpd(vp: f64, min_t: f64, max_t: f64) -> f64 {
    const MAX_T_WEIGHT: f64 = 0.66;
    let at_max = (svp(max_t) - vp).max(0.0);
    let at_min = (svp(min_t) - vp).max(0.0);
    MAX_T_WEIGHT * at_max + (1.0 - MAX_T_WEIGHT) * at_min
}

/// Solar declination (degrees) for a day of year.
fn declination(day_of_year: f64) -> f64 {
    DECLINATION_AMPLITUDE * (2.0 * PI / 365.25 * (day_of_year - EQUINOX_DAY)).sin()
}

/// Hours between the sun passing `sun_angle` degrees (negative below the
/// horizon) in the morning and in the evening.
///
/// Uses the declination/hour-angle formula. At the poles the sun either stays
/// up or stays down, so the result is 0 or 24.
pub fn day_length(day_of_year: u32, sun_angle: f64, latitude: f64) -> f64 {
    let dec = DAY_LENGTH_DECLINATION_AMPLITUDE.to_radians()
        * (2.0 * PI / 365.25 * (day_of_year as f64 - EQUINOX_DAY)).sin();

    let coshra = if is_close!(latitude.abs(), 90.0) {
        // sign(1, -dec) * sign(1, lat)
        let dec_sign = if -dec >= 0.0 { 1.0 } else { -1.0 };
        let lat_sign = if latitude >= 0.0 { 1.0 } else { -1.0 };
        dec_sign * lat_sign
    } else {
        let lat = latitude.to_radians();
        let slsd = lat.sin() * dec.sin();
        let clcd = lat.cos() * dec.cos();
        let altmn = (slsd - clcd).clamp(-1.0, 1.0).asin();
        let altmx = (slsd + clcd).clamp(-1.0, 1.0).asin();
        let alt = sun_angle.to_radians().clamp(altmn, altmx);
        ((alt.sin() - slsd) / clcd).clamp(-1.0, 1.0)
    };

    coshra.acos() * 24.0 / PI
}

/// Hour of sunrise for a day of the given length, assuming a day symmetric about noon.
pub fn sunrise(day_length: f64) -> f64 {
    12.0 - day_length / 2.0
}

/// Hour of sunset for a day of the given length, assuming a day symmetric about noon.
pub fn sunset(day_length: f64) -> f64 {
    12.0 + day_length / 2.0
}

/// Half day length expressed as the sunrise hour angle (radians).
fn sunrise_hour_angle(lat: f64, dec: f64) -> f64 {
    (-lat.tan() * dec.tan()).clamp(-1.0, 1.0).acos()
}

/// Total daily extraterrestrial short-wave radiation (MJ/m²).
pub fn q0(day: u32, latitude: f64) -> f64 {
    let dec = declination(day as f64).to_radians();
    let lat = latitude.to_radians();
    let hs = sunrise_hour_angle(lat, dec);
    86400.0 * 1360.0 * (hs * lat.sin() * dec.sin() + lat.cos() * dec.cos() * hs.sin())
        / PI
        / 1_000_000.0
}

/// Instantaneous extraterrestrial short-wave radiation (MJ/m²/s) at hour angle `hs`.
///
/// Zero once `hs` is past sunset.
pub fn q0i(day: u32, hs: f64, latitude: f64) -> f64 {
    let dec = declination(day as f64).to_radians();
    let lat = latitude.to_radians();
    if hs > sunrise_hour_angle(lat, dec) {
        return 0.0;
    }
    1360.0 * (lat.sin() * dec.sin() + lat.cos() * dec.cos() * hs.cos()) / 1_000_000.0
}

/// Clear-sky (maximum) daily radiation (MJ/m²).
///
/// Integrates instantaneous extraterrestrial radiation attenuated by an air
/// mass dependent transmissivity `taz`, reduced by `alpha` per hPa of vapour
/// pressure `vp`.
pub fn qmax(day: u32, latitude: f64, taz: f64, alpha: f64, vp: f64) -> f64 {
    let dec = declination(day as f64).to_radians();
    let lat = latitude.to_radians();
    let hs = sunrise_hour_angle(lat, dec);
    let step = hs / INTEGRATION_STEPS as f64;

    let mut total = 0.0;
    for i in 1..=INTEGRATION_STEPS {
        // Very small solar elevations blow up the air mass.
        let t = (i as f64 * step).min(hs * 0.999);
        let s1 = q0i(day, t - step, latitude);
        let s2 = q0i(day, t, latitude);
        let mut air_mass = 1.0 / (lat.sin() * dec.sin() + lat.cos() * dec.cos() * t.cos());
        if air_mass > 2.0 {
            // Earth curvature correction fitted to Smithsonian tables.
            air_mass = 2.0 + (air_mass - 2.0).powf(0.955);
        }
        total += (s1 + s2) / 2.0 / INTEGRATION_STEPS as f64 * (taz.powf(air_mass) - alpha * vp);
    }

    total * hs / (2.0 * PI / 86400.0) * 2.0
}

/// Fraction of the day's radiation that is diffuse, after Bristow and Campbell.
///
/// `radn` is the measured radiation (MJ/m²). The ratio of clear-sky to
/// extraterrestrial radiation bounds the transmissivity; a clear day still
/// carries at least 10% diffuse radiation.
pub fn diffuse_fraction(day_of_year: u32, latitude: f64, radn: f64) -> f64 {
    let day = day_of_year + 1;
    let q0 = q0(day, latitude);
    let b = qmax(day, latitude, TAZ, ALPHA, 0.0) / q0;
    let tt = (radn / q0).clamp(0.0, 1.0).min(b);
    let mut fraction = 1.0 - (0.6 * (1.0 - b / tt) / (b - 0.4)).exp();
    if tt > 0.5 && fraction < 0.1 {
        fraction = 0.1;
    }
    fraction
}

/// Mean air pressure (hPa) at `altitude` metres above sea level.
pub fn air_pressure(altitude: f64) -> f64 {
    1013.25 * (1.0 - 2.25577e-5 * altitude).powf(5.25588)
}

/// Whether `year` has a 29th of February.
pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

/// Day of year of the winter solstice in `year` for the given hemisphere.
pub fn winter_solstice_day(latitude: f64, year: i32) -> u32 {
    let leap = u32::from(is_leap_year(year));
    if latitude <= 0.0 {
        172 + leap
    } else {
        355 + leap
    }
}

/// Days elapsed since the most recent winter solstice, not counting `date` itself.
pub fn days_since_winter_solstice(date: NaiveDate, latitude: f64) -> i64 {
    let solstice = winter_solstice_day(latitude, date.year()) as i64;
    let doy = date.ordinal() as i64;
    if doy < solstice {
        let previous_year_length = if is_leap_year(date.year() - 1) { 366 } else { 365 };
        previous_year_length - solstice + doy
    } else {
        doy - solstice
    }
}

/// Long-term average temperature (TAV) and mean annual amplitude (AMP).
///
/// `daily_means` yields each day's mean temperature. Monthly means are
/// averaged within each year to give that year's mean, and the spread between
/// the warmest and coldest monthly mean gives its amplitude. Only years with
/// data in all twelve months contribute. If no year is complete, every year
/// with data contributes using the months it has.
///
/// Returns `None` when there is no data.
pub fn tav_amp<I>(daily_means: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = (NaiveDate, f64)>,
{
    let days: Vec<(NaiveDate, f64)> = daily_means.into_iter().collect();
    let first_year = days.iter().map(|(d, _)| d.year()).min()?;
    let last_year = days.iter().map(|(d, _)| d.year()).max()?;
    let n_years = (last_year - first_year + 1) as usize;

    let mut sums = Array2::<f64>::zeros((12, n_years));
    let mut counts = Array2::<u32>::zeros((12, n_years));
    for (date, mean) in &days {
        let m = date.month0() as usize;
        let y = (date.year() - first_year) as usize;
        sums[[m, y]] += mean;
        counts[[m, y]] += 1;
    }

    let complete: Vec<usize> = (0..n_years)
        .filter(|&y| (0..12).all(|m| counts[[m, y]] > 0))
        .collect();
    let years: Vec<usize> = if complete.is_empty() {
        (0..n_years)
            .filter(|&y| (0..12).any(|m| counts[[m, y]] > 0))
            .collect()
    } else {
        complete
    };

    let mut tav_sum = 0.0;
    let mut amp_sum = 0.0;
    for &y in &years {
        let monthly: Vec<f64> = (0..12)
            .filter(|&m| counts[[m, y]] > 0)
            .map(|m| sums[[m, y]] / counts[[m, y]] as f64)
            .collect();
        let max = monthly.iter().cloned().fold(f64::MIN, f64::max);
        let min = monthly.iter().cloned().fold(f64::MAX, f64::min);
        tav_sum += monthly.iter().sum::<f64>() / monthly.len() as f64;
        amp_sum += max - min;
    }

    let n = years.len() as f64;
    Some((tav_sum / n, amp_sum / n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn svp_at_known_temperatures() {
        assert_relative_eq!(svp(0.0), 6.1078, epsilon = 1e-10);
        // Tetens gives about 23.4 hPa at 20°C
        assert_relative_eq!(svp(20.0), 23.37, epsilon = 0.05);
    }

    #[test]
    fn vpd_is_never_negative() {
        assert_eq!(vpd(100.0, 10.0, 25.0), 0.0);
        let d = vpd(10.0, 10.0, 25.0);
        assert!(d > 0.0);
        let expected = 0.66 * (svp(25.0) - 10.0) + 0.34 * (svp(10.0) - 10.0);
        assert_relative_eq!(d, expected, epsilon = 1e-12);
    }

    #[test]
    fn equator_day_length_is_about_twelve_hours() {
        let dl = day_length(80, -0.833, 0.0);
        assert!((dl - 12.1).abs() < 0.2, "got {dl}");
    }

    #[test]
    fn southern_summer_days_are_longer() {
        // Toowoomba-ish latitude
        let summer = day_length(355, CIVIL_TWILIGHT, -27.5);
        let winter = day_length(172, CIVIL_TWILIGHT, -27.5);
        assert!(summer > winter);
        assert!(summer > 14.0 && summer < 15.0, "got {summer}");
    }

    #[test]
    fn polar_day_and_night() {
        assert_relative_eq!(day_length(172, CIVIL_TWILIGHT, 90.0), 24.0, epsilon = 1e-9);
        assert_relative_eq!(day_length(172, CIVIL_TWILIGHT, -90.0), 0.0, epsilon = 1e-9);
        assert_relative_eq!(day_length(172, CIVIL_TWILIGHT, 85.0), 24.0, epsilon = 1e-9);
    }

    #[test]
    fn sunrise_and_sunset_are_symmetric() {
        for dl in [0.0, 9.5, 12.0, 14.25, 24.0] {
            assert_relative_eq!((sunrise(dl) + sunset(dl)) / 2.0, 12.0, epsilon = 1e-12);
            assert_relative_eq!(sunset(dl) - sunrise(dl), dl, epsilon = 1e-12);
        }
    }

    #[test]
    fn clear_sky_is_below_extraterrestrial() {
        for day in [1, 91, 182, 274] {
            let top = q0(day, -27.5);
            let clear = qmax(day, -27.5, TAZ, ALPHA, 0.0);
            assert!(clear > 0.0);
            assert!(clear < top, "day {day}: {clear} >= {top}");
            // more vapour lowers the ceiling
            assert!(qmax(day, -27.5, TAZ, ALPHA, 20.0) < clear);
        }
    }

    #[test]
    fn q0_midsummer_magnitude() {
        // roughly 40-45 MJ/m² at 27.5°S in December
        let value = q0(355, -27.5);
        assert!(value > 40.0 && value < 47.0, "got {value}");
    }

    #[test]
    fn diffuse_fraction_bounds() {
        let overcast = diffuse_fraction(15, -27.5, 2.0);
        let clear = diffuse_fraction(15, -27.5, 32.0);
        assert!(overcast > clear);
        assert!((0.0..=1.0).contains(&overcast));
        assert!(clear >= 0.1);
        assert_relative_eq!(diffuse_fraction(15, -27.5, 0.0), 1.0);
    }

    #[test]
    fn air_pressure_decreases_with_altitude() {
        assert_relative_eq!(air_pressure(0.0), 1013.25);
        let p = air_pressure(1000.0);
        assert!(p > 890.0 && p < 905.0, "got {p}");
    }

    #[test]
    fn winter_solstice_by_hemisphere() {
        assert_eq!(winter_solstice_day(-30.0, 2021), 172);
        assert_eq!(winter_solstice_day(-30.0, 2020), 173);
        assert_eq!(winter_solstice_day(45.0, 2021), 355);
        assert_eq!(winter_solstice_day(45.0, 2020), 356);
    }

    #[test]
    fn days_since_solstice_wraps_year() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 10).unwrap();
        // solstice of 2021 is day 172, the year before has 366 days
        assert_eq!(days_since_winter_solstice(date, -30.0), 366 - 172 + 10);
        let date = NaiveDate::from_ymd_opt(2021, 7, 1).unwrap();
        assert_eq!(days_since_winter_solstice(date, -30.0), 182 - 172);
    }

    #[test]
    fn tav_amp_of_flat_year() {
        let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        let days = start.iter_days().take(365).map(|d| (d, 15.0));
        let (tav, amp) = tav_amp(days).unwrap();
        assert_relative_eq!(tav, 15.0);
        assert_relative_eq!(amp, 0.0);
    }

    #[test]
    fn tav_amp_ignores_incomplete_years() {
        let start = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        // 2001 complete at 10°C, first month of 2002 at 30°C
        let days = start
            .iter_days()
            .take(365 + 31)
            .map(|d| (d, if d.year() == 2001 { 10.0 } else { 30.0 }));
        let (tav, amp) = tav_amp(days).unwrap();
        assert_relative_eq!(tav, 10.0);
        assert_relative_eq!(amp, 0.0);
    }

    #[test]
    fn tav_amp_without_data() {
        assert!(tav_amp(Vec::<(NaiveDate, f64)>::new()).is_none());
    }
}
