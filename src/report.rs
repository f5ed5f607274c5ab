//! Daily CSV report.

use cropmet_core::errors::MetResult;
use cropmet_core::model::DayReport;
use std::io::Write;

/// Weather columns, in report order.
pub const WEATHER_COLUMNS: [&str; 13] = [
    "Date",
    "MinT",
    "MaxT",
    "MeanT",
    "Radn",
    "Rain",
    "VP",
    "VPD",
    "Wind",
    "CO2",
    "AirPressure",
    "DayLength",
    "DiffuseFraction",
];

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write one row per day. Component outputs follow the weather columns,
/// headed by the names reported on the first day.
pub fn write_report<W: Write>(writer: W, reports: &[DayReport]) -> MetResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    let outputs: Vec<&str> = reports
        .first()
        .map(|first| first.outputs.iter().map(|(name, _)| name.as_str()).collect())
        .unwrap_or_default();

    let mut header: Vec<&str> = WEATHER_COLUMNS.to_vec();
    header.extend(&outputs);
    csv.write_record(&header)?;

    for report in reports {
        let w = &report.weather;
        let mut row = vec![
            report.date.to_string(),
            w.min_t.to_string(),
            w.max_t.to_string(),
            optional(w.mean_t),
            w.radn.to_string(),
            w.rain.to_string(),
            optional(w.vp),
            w.vpd.to_string(),
            w.wind.to_string(),
            w.co2.to_string(),
            optional(w.air_pressure),
            optional(w.day_length),
            optional(w.diffuse_fraction),
        ];
        row.extend(report.outputs.iter().map(|(_, value)| value.to_string()));
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cropmet_core::weather::DailyWeather;

    #[test]
    fn header_and_rows() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let reports = vec![DayReport {
            date,
            weather: DailyWeather {
                date,
                max_t: 25.0,
                min_t: 10.0,
                mean_t: Some(17.5),
                ..Default::default()
            },
            events: Vec::new(),
            outputs: vec![("ThermalTime".to_string(), 17.5)],
        }];
        let mut buffer = Vec::new();
        write_report(&mut buffer, &reports).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,MinT,MaxT,MeanT,Radn,Rain,VP,VPD,Wind,CO2,AirPressure,DayLength,DiffuseFraction,ThermalTime"
        );
        assert_eq!(lines.next().unwrap(), "2020-01-01,10,25,17.5,0,0,,0,0,0,,,,17.5");
    }
}
