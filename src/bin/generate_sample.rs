//! Writes the six dashboard datasets as CSV files into a directory
//! (default `datasets/`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const STATES: &[(&str, f64, f64, f64, f64, f64, f64, f64, f64)] = &[
    // state, avg_cost_per_ha, avg_temp, avg_humidity, avg_wind_speed, avg_ph, avg_n, avg_oc, total_estate_area
    ("Edo", 1_250_000.0, 27.2, 79.5, 2.1, 5.1, 0.12, 1.35, 33_300.0),
    ("Delta", 1_180_000.0, 27.6, 82.3, 2.4, 4.9, 0.10, 1.18, 20_900.0),
    ("Cross River", 1_320_000.0, 26.8, 84.1, 1.9, 5.3, 0.14, 1.52, 41_200.0),
    ("Akwa Ibom", 1_210_000.0, 27.0, 83.7, 2.6, 5.0, 0.11, 1.27, 18_400.0),
    ("Ondo", 1_150_000.0, 26.5, 78.2, 2.0, 5.6, 0.13, 1.41, 27_800.0),
    ("Imo", 1_090_000.0, 27.1, 80.6, 2.2, 5.2, 0.09, 1.09, 12_600.0),
    ("Rivers", 1_270_000.0, 27.4, 85.0, 2.8, 4.8, 0.10, 1.22, 15_100.0),
    ("Ogun", 1_120_000.0, 27.8, 76.9, 2.3, 5.7, 0.12, 1.30, 9_700.0),
];

const COMPANIES: &[(&str, f64, f64, f64, f64)] = &[
    // metric, Revenue, Cost of revenue, Profit for the year, Net assets (NGN millions)
    ("Okomu", 85_090.0, 37_190.0, 24_400.0, 61_830.0),
    ("Presco", 130_420.0, 48_060.0, 33_800.0, 88_890.0),
];

/// Palm oil production, imports, exports (thousand tonnes) from 2014.
const PRODUCTION: &[(i64, f64, f64, f64)] = &[
    (2014, 930.0, 400.0, 10.0),
    (2015, 955.0, 350.0, 12.0),
    (2016, 970.0, 300.0, 15.0),
    (2017, 1_025.0, 310.0, 14.0),
    (2018, 1_015.0, 350.0, 18.0),
    (2019, 1_220.0, 390.0, 20.0),
    (2020, 1_280.0, 330.0, 17.0),
    (2021, 1_400.0, 350.0, 16.0),
    (2022, 1_400.0, 400.0, 15.0),
    (2023, 1_450.0, 375.0, 18.0),
];

fn fmt(v: f64) -> String {
    v.to_string()
}

fn write_csv(dir: &Path, name: &str, header: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
    let path = dir.join(format!("{name}.csv"));
    let mut writer =
        csv::Writer::from_path(&path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(header)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    println!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("datasets"));
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    write_csv(
        &dir,
        "company_comparison",
        &["metric", "Revenue", "Cost of revenue", "Profit for the year", "Net assets"],
        COMPANIES
            .iter()
            .map(|&(m, r, c, p, n)| vec![m.to_string(), fmt(r), fmt(c), fmt(p), fmt(n)])
            .collect(),
    )?;

    write_csv(
        &dir,
        "state_comparison",
        &[
            "state",
            "avg_cost_per_ha",
            "avg_temp",
            "avg_humidity",
            "avg_wind_speed",
            "avg_ph",
            "avg_n",
            "avg_oc",
            "total_estate_area",
        ],
        STATES
            .iter()
            .map(|&(s, cost, t, h, w, ph, n, oc, area)| {
                vec![
                    s.to_string(),
                    fmt(cost),
                    fmt(t),
                    fmt(h),
                    fmt(w),
                    fmt(ph),
                    fmt(n),
                    fmt(oc),
                    fmt(area),
                ]
            })
            .collect(),
    )?;

    write_csv(
        &dir,
        "production_comparison",
        &["year", "Production", "Imports", "Exports"],
        PRODUCTION
            .iter()
            .map(|&(y, p, i, e)| vec![y.to_string(), fmt(p), fmt(i), fmt(e)])
            .collect(),
    )?;

    write_csv(
        &dir,
        "input_materials_comparison",
        &["material", "unit", "Okomu", "Presco"],
        vec![
            vec!["NPK fertilizer".into(), "NGN/50kg bag".into(), "28500".into(), "29200".into()],
            vec!["Herbicide".into(), "NGN/litre".into(), "6400".into(), "6150".into()],
            vec!["Seedlings".into(), "NGN/seedling".into(), "1200".into(), "1350".into()],
            vec!["Labour".into(), "NGN/ha/year".into(), "185000".into(), "192000".into()],
        ],
    )?;

    write_csv(
        &dir,
        "land_market",
        &["state", "price_per_ha", "lease_per_ha_year", "availability"],
        STATES
            .iter()
            .enumerate()
            .map(|(i, &(s, cost, ..))| {
                let availability = ["high", "medium", "low"][i % 3];
                vec![
                    s.to_string(),
                    fmt((cost * 0.6).round()),
                    fmt((cost * 0.04).round()),
                    availability.to_string(),
                ]
            })
            .collect(),
    )?;

    write_csv(
        &dir,
        "results",
        &["metric", "value"],
        vec![
            vec!["best_state_by_cost".into(), "Imo".into()],
            vec!["average_yield_t_per_ha".into(), "3.1".into()],
            vec!["national_deficit_kt".into(), "375".into()],
        ],
    )?;

    Ok(())
}
