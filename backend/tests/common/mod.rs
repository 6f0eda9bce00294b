//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::{collections::HashMap, fmt::Write, path::Path};

use chrono::{Days, NaiveDate};
use shared::FEATURES;

/// Raw columns in the order the weather export uses
pub const RAW_HEADER: &str = "Date,Location,MinTemp,MaxTemp,Rainfall,Evaporation,Sunshine,\
WindGustDir,WindGustSpeed,WindDir9am,WindDir3pm,WindSpeed9am,WindSpeed3pm,Humidity9am,\
Humidity3pm,Pressure9am,Pressure3pm,Cloud9am,Cloud3pm,Temp9am,Temp3pm,RainToday,RainTomorrow";

const LOCATIONS: [&str; 3] = ["Albury", "Perth", "Sydney"];
const DIRECTIONS: [&str; 4] = ["E", "N", "S", "W"];

/// One deterministic weather row; even rows are followed by rain
pub fn weather_row(i: usize) -> String {
    let date = NaiveDate::from_ymd_opt(2010, 1, 1)
        .unwrap()
        .checked_add_days(Days::new(i as u64))
        .unwrap();
    let rain = i % 2 == 0;
    let humidity3pm = if rain { 70 + i % 25 } else { 20 + i % 25 };
    let pressure3pm = (if rain { 1005.0 } else { 1018.0 }) + (i % 7) as f64 * 0.5;

    format!(
        "{},{},{:.1},{:.1},{:.1},{:.1},{:.1},{},{},{},{},{},{},{},{},{:.1},{:.1},{},{},{:.1},{:.1},{},{}",
        date.format("%Y-%m-%d"),
        LOCATIONS[i % 3],
        8.0 + (i % 11) as f64,
        20.0 + (i % 13) as f64,
        (i % 5) as f64 * 1.5,
        3.0 + (i % 6) as f64,
        (if rain { 2.0 } else { 9.0 }) + (i % 3) as f64,
        DIRECTIONS[i % 4],
        30 + i % 30,
        DIRECTIONS[(i / 2) % 4],
        DIRECTIONS[(i / 3) % 4],
        10 + i % 9,
        15 + i % 8,
        humidity3pm + 10,
        humidity3pm,
        pressure3pm + 2.0,
        pressure3pm,
        i % 9,
        (i + 4) % 9,
        12.0 + (i % 10) as f64,
        18.0 + (i % 12) as f64,
        if (i / 2) % 2 == 0 { "No" } else { "Yes" },
        if rain { "Yes" } else { "No" },
    )
}

/// CSV text with `n` complete rows
pub fn weather_csv(n: usize) -> String {
    let mut csv = String::new();
    writeln!(csv, "{}", RAW_HEADER).unwrap();
    for i in 0..n {
        writeln!(csv, "{}", weather_row(i)).unwrap();
    }
    csv
}

pub fn write_weather_csv(path: &Path, n: usize) {
    std::fs::write(path, weather_csv(n)).unwrap();
}

/// Form values for row `i` of the synthetic data, keyed by feature name
pub fn form_for_row(i: usize) -> HashMap<String, String> {
    let row = weather_row(i);
    let cells: Vec<&str> = row.split(',').collect();
    let headers: Vec<&str> = RAW_HEADER.split(',').collect();
    let mut form: HashMap<String, String> = headers
        .iter()
        .zip(&cells)
        .filter(|(h, _)| FEATURES.contains(h))
        .map(|(h, v)| (h.to_string(), v.to_string()))
        .collect();

    let date = NaiveDate::parse_from_str(cells[0], "%Y-%m-%d").unwrap();
    form.insert("Year".into(), date.format("%Y").to_string());
    form.insert("Month".into(), date.format("%-m").to_string());
    form.insert("Day".into(), date.format("%-d").to_string());
    form
}

/// `application/x-www-form-urlencoded` body of simple ASCII values
pub fn urlencode(form: &HashMap<String, String>) -> String {
    FEATURES
        .iter()
        .map(|name| format!("{}={}", name, form.get(*name).map(String::as_str).unwrap_or("")))
        .collect::<Vec<_>>()
        .join("&")
}
