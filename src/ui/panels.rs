use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{CellValue, Table};
use crate::pipeline::DashboardView;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selectors and dataset summary
// ---------------------------------------------------------------------------

/// One selector combo box. Returns the value picked this frame, if any.
fn selector(ui: &mut Ui, label: &str, options: &[CellValue], current: Option<&CellValue>) -> Option<CellValue> {
    let mut picked = None;
    let selected_text = current.map(|v| v.to_string()).unwrap_or_default();
    ui.strong(label);
    egui::ComboBox::from_id_salt(label)
        .selected_text(selected_text)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for value in options {
                let is_current = current == Some(value);
                if ui.selectable_label(is_current, value.to_string()).clicked() && !is_current {
                    picked = Some(value.clone());
                }
            }
        });
    picked
}

/// Render the left selector panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    // Clone what we need so we can mutate state after the widgets.
    let options = state.options.clone();
    let selection = state.selection.clone();

    if let Some(v) = selector(ui, "Select State", &options.states, selection.state.as_ref()) {
        state.select_state(v);
    }
    ui.add_space(4.0);
    if let Some(v) = selector(ui, "Select Year", &options.years, selection.year.as_ref()) {
        state.select_year(v);
    }
    ui.add_space(4.0);
    if let Some(v) = selector(ui, "Select Company", &options.companies, selection.company.as_ref()) {
        state.select_company(v);
    }
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::CollapsingHeader::new(RichText::new("Datasets").strong())
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    for s in &state.data.summary {
                        let columns = state.data.datasets.get(s.kind).columns.len();
                        ui.label(format!("{}: {} rows", s.kind, s.loaded - s.dropped))
                            .on_hover_text(format!(
                                "{}\n{columns} columns, {} rows loaded, {} dropped as incomplete",
                                s.location, s.loaded, s.dropped
                            ));
                    }
                });

            if !state.data.issues.is_empty() {
                let header = format!("Undefined metrics ({})", state.data.issues.len());
                egui::CollapsingHeader::new(RichText::new(header).strong().color(Color32::ORANGE))
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        for issue in &state.data.issues {
                            ui.label(format!(
                                "{} (row {}): {}",
                                issue.company, issue.source_row, issue.error
                            ));
                        }
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(format!(
            "{} rows loaded from {} datasets",
            state.total_rows(),
            state.data.summary.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Insights and tables (central panel)
// ---------------------------------------------------------------------------

/// ROI and break-even lines for the selected company, plus its flagged metrics.
pub fn insights(ui: &mut Ui, view: &DashboardView) {
    ui.heading("Additional Calculations and Insights");
    ui.label(view.roi_text());
    ui.label(view.break_even_text());
    for issue in &view.issues {
        ui.label(RichText::new(format!("⚠ {}", issue.error)).color(Color32::ORANGE));
    }
}

/// A read-only grid of a table's rows.
pub fn data_table(ui: &mut Ui, title: &str, table: &Table) {
    ui.strong(title);
    if table.is_empty() {
        ui.label("no data for this selection");
        return;
    }
    ui.push_id(title, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(Column::auto().at_least(70.0).resizable(true), table.columns.len())
            .header(20.0, |mut header| {
                for col in &table.columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(col);
                    });
                }
            })
            .body(|mut body| {
                for row in &table.rows {
                    body.row(18.0, |mut cells| {
                        for value in &row.cells {
                            cells.col(|ui: &mut Ui| {
                                ui.label(value.to_string());
                            });
                        }
                    });
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open dataset folder")
        .pick_folder();

    if let Some(dir) = folder {
        log::info!("Loading datasets from {}", dir.display());
        state.config.data_dir = dir;
        let source = state.config.file_source();
        state.set_source(Box::new(source));
    }
}
