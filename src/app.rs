use eframe::egui::{self, ScrollArea, Ui};

use crate::color::SeriesColors;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
    colors: SeriesColors,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            colors: SeriesColors::new(&plot::all_series()),
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: selectors ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: insights, tables, charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Palm Oil Plantation Profitability Dashboard");
            ui.separator();
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    let state = &self.state;
                    let colors = &self.colors;
                    if let Some(view) = &state.view {
                        panels::insights(ui, view);
                        ui.separator();
                        panels::data_table(ui, "Selected State", &view.state_rows);
                        panels::data_table(ui, "Selected Year", &view.production_rows);
                        panels::data_table(ui, "Selected Company", &view.company_rows);
                        ui.separator();
                    }

                    plot::selected_state_cost(ui, state, colors);
                    plot::company_cost_vs_revenue(ui, state, colors);
                    plot::production_trends(ui, state, colors);
                    ui.separator();
                    plot::yield_vs_rainfall(ui, state);
                    plot::state_cost_per_hectare(ui, state, colors);
                    plot::climate_comparison(ui, state, colors);
                    plot::soil_comparison(ui, state, colors);
                });
        });
    }
}
