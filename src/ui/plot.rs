use eframe::egui::{Color32, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::color::SeriesColors;
use crate::data::model::Table;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 240.0;

pub const COMPANY_SERIES: &[&str] = &["Revenue", "Cost of revenue"];
pub const PRODUCTION_SERIES: &[&str] = &["Production", "Imports", "Exports"];
pub const CLIMATE_SERIES: &[&str] = &["avg_temp", "avg_humidity", "avg_wind_speed"];
pub const SOIL_SERIES: &[&str] = &["avg_ph", "avg_n", "avg_oc"];

/// Every series drawn by the dashboard, for colour assignment.
pub fn all_series() -> Vec<&'static str> {
    let mut series = vec!["avg_cost_per_ha"];
    for group in [COMPANY_SERIES, PRODUCTION_SERIES, CLIMATE_SERIES, SOIL_SERIES] {
        series.extend_from_slice(group);
    }
    series
}

// ---------------------------------------------------------------------------
// Chart data helpers
// ---------------------------------------------------------------------------

/// Row labels from `label_column` and one value vector per series column.
/// Missing or non-numeric cells become NaN and are skipped when drawn.
fn series_by_label(table: &Table, label_column: &str, series: &[&str]) -> (Vec<String>, Vec<Vec<f64>>) {
    let labels = match table.column_values(label_column) {
        Ok(values) => values.iter().map(|v| v.to_string()).collect(),
        Err(e) => {
            log::warn!("{e}");
            return (Vec::new(), Vec::new());
        }
    };
    let values = series
        .iter()
        .map(|col| match table.column_values(col) {
            Ok(cells) => cells
                .iter()
                .map(|c| c.as_f64().unwrap_or(f64::NAN))
                .collect(),
            Err(e) => {
                log::warn!("{e}");
                Vec::new()
            }
        })
        .collect();
    (labels, values)
}

/// Axis formatter that prints the category label at integer positions.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &std::ops::RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let pos = mark.value.round();
        if (mark.value - pos).abs() > 1e-6 || pos < 0.0 {
            return String::new();
        }
        labels.get(pos as usize).cloned().unwrap_or_default()
    }
}

/// Bars for each series side by side at every category position.
fn grouped_bars(
    ui: &mut Ui,
    id: &str,
    labels: Vec<String>,
    series: &[&str],
    values: &[Vec<f64>],
    colors: &SeriesColors,
) {
    if labels.is_empty() {
        ui.label("No rows to plot.");
        return;
    }
    let width = 0.8 / series.len().max(1) as f64;
    let charts: Vec<BarChart> = series
        .iter()
        .zip(values)
        .enumerate()
        .map(|(s, (name, vals))| {
            let offset = (s as f64 - (series.len() as f64 - 1.0) / 2.0) * width;
            let bars = vals
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .map(|(i, &v)| {
                    Bar::new(i as f64 + offset, v)
                        .width(width)
                        .name(format!("{}: {name}", labels[i]))
                })
                .collect();
            BarChart::new(bars).name(*name).color(colors.color_for(name))
        })
        .collect();

    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_formatter(category_axis(labels))
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// The seven dashboard charts
// ---------------------------------------------------------------------------

/// Cost per hectare for the selected state.
pub fn selected_state_cost(ui: &mut Ui, state: &AppState, colors: &SeriesColors) {
    let Some(view) = &state.view else { return };
    let title = view
        .selection
        .state
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_default();
    ui.strong(format!("Cost per Hectare for {title}"));
    if let Err(e) = &view.state_cost {
        ui.label(e.user_message());
        return;
    }
    let (labels, values) = series_by_label(&view.state_rows, "state", &["avg_cost_per_ha"]);
    grouped_bars(ui, "selected_state_cost", labels, &["avg_cost_per_ha"], &values, colors);
}

/// Revenue against cost of revenue for the selected company.
pub fn company_cost_vs_revenue(ui: &mut Ui, state: &AppState, colors: &SeriesColors) {
    let Some(view) = &state.view else { return };
    ui.strong(format!(
        "Cost vs Revenue for {}",
        view.selection.company_label()
    ));
    let (labels, values) = series_by_label(&view.company_rows, "metric", COMPANY_SERIES);
    grouped_bars(ui, "company_cost_vs_revenue", labels, COMPANY_SERIES, &values, colors);
    if let Ok(margins) = view.company_rows.labelled_f64("metric", "Profit Margin") {
        for (company, margin) in margins {
            let text = if margin.is_finite() {
                format!("{margin:.2}%")
            } else {
                "undefined".to_string()
            };
            ui.small(format!("Profit Margin for {company}: {text}"));
        }
    }
}

/// Production, imports, and exports in the selected year.
pub fn production_trends(ui: &mut Ui, state: &AppState, colors: &SeriesColors) {
    let Some(view) = &state.view else { return };
    let year = view
        .selection
        .year
        .as_ref()
        .map(|y| y.to_string())
        .unwrap_or_default();
    ui.strong(format!("Historical Production Trends ({year})"));

    let (_, values) = series_by_label(&view.production_rows, "year", PRODUCTION_SERIES);
    let years: Vec<f64> = view
        .production_rows
        .column_values("year")
        .map(|cells| cells.iter().filter_map(|c| c.as_f64()).collect())
        .unwrap_or_default();
    if years.is_empty() {
        ui.label("No rows to plot.");
        return;
    }

    Plot::new("production_trends")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_label("Year")
        .y_axis_label("Metric Value")
        .show(ui, |plot_ui| {
            for (name, vals) in PRODUCTION_SERIES.iter().zip(&values) {
                let points: Vec<[f64; 2]> = years
                    .iter()
                    .zip(vals)
                    .filter(|(_, v)| v.is_finite())
                    .map(|(&x, &y)| [x, y])
                    .collect();
                let color = colors.color_for(name);
                plot_ui.line(
                    Line::new(PlotPoints::from(points.clone()))
                        .name(*name)
                        .color(color)
                        .width(1.5),
                );
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .name(*name)
                        .color(color)
                        .radius(5.0),
                );
            }
        });
}

/// Average temperature against average wind speed across all states.
pub fn yield_vs_rainfall(ui: &mut Ui, state: &AppState) {
    ui.strong("Yield vs Rainfall");
    let (labels, values) = series_by_label(
        &state.data.datasets.state,
        "state",
        &["avg_temp", "avg_wind_speed"],
    );
    let [temps, winds] = values.as_slice() else {
        return;
    };
    let points: Vec<(String, [f64; 2])> = labels
        .into_iter()
        .zip(temps.iter().zip(winds))
        .filter(|(_, (t, w))| t.is_finite() && w.is_finite())
        .map(|(label, (&t, &w))| (label, [t, w]))
        .collect();

    Plot::new("yield_vs_rainfall")
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .x_axis_label("Average Temperature")
        .y_axis_label("Average Wind Speed")
        .show(ui, |plot_ui| {
            for (label, [x, y]) in &points {
                plot_ui.points(
                    Points::new(PlotPoints::from(vec![[*x, *y]]))
                        .name(label)
                        .color(Color32::LIGHT_GREEN)
                        .radius(5.0),
                );
                plot_ui.text(Text::new(PlotPoint::new(*x, *y), label.clone()));
            }
        });
}

/// Cost per hectare across all states.
pub fn state_cost_per_hectare(ui: &mut Ui, state: &AppState, colors: &SeriesColors) {
    ui.strong("State-wise Cost per Hectare");
    let (labels, values) =
        series_by_label(&state.data.datasets.state, "state", &["avg_cost_per_ha"]);
    grouped_bars(ui, "state_cost_per_hectare", labels, &["avg_cost_per_ha"], &values, colors);
}

/// Temperature, humidity, and wind speed across all states.
pub fn climate_comparison(ui: &mut Ui, state: &AppState, colors: &SeriesColors) {
    ui.strong("State-wise Climate Comparison");
    let (labels, values) = series_by_label(&state.data.datasets.state, "state", CLIMATE_SERIES);
    grouped_bars(ui, "climate_comparison", labels, CLIMATE_SERIES, &values, colors);
}

/// Soil pH, nitrogen, and organic carbon across all states.
pub fn soil_comparison(ui: &mut Ui, state: &AppState, colors: &SeriesColors) {
    ui.strong("State-wise Soil Comparison");
    let (labels, values) = series_by_label(&state.data.datasets.state, "state", SOIL_SERIES);
    grouped_bars(ui, "soil_comparison", labels, SOIL_SERIES, &values, colors);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::fixtures::csv_table;

    #[test]
    fn series_follow_label_order_and_mark_gaps() {
        let table = csv_table("s", "state,avg_temp,avg_n\nEdo,27.1,\nDelta,27.5,0.1\n").unwrap();
        let (labels, values) = series_by_label(&table, "state", &["avg_temp", "avg_n"]);
        assert_eq!(labels, vec!["Edo", "Delta"]);
        assert_eq!(values[0], vec![27.1, 27.5]);
        assert!(values[1][0].is_nan());
        assert_eq!(values[1][1], 0.1);
    }

    #[test]
    fn series_list_covers_every_chart() {
        let series = all_series();
        assert!(series.contains(&"avg_cost_per_ha"));
        assert!(series.contains(&"Exports"));
        assert!(series.contains(&"avg_oc"));
    }
}
