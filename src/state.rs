use crate::config::DashboardConfig;
use crate::data::loader::DatasetSource;
use crate::data::model::CellValue;
use crate::pipeline::{DashboardView, PreparedData, Selection, SelectorOptions, prepare};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Where datasets are (re)loaded from.
    source: Box<dyn DatasetSource>,

    pub config: DashboardConfig,

    /// Cleaned and derived datasets from the last successful load.
    pub data: PreparedData,

    /// Values offered by the three selectors.
    pub options: SelectorOptions,

    pub selection: Selection,

    /// Filtered tables and scalars for the current selection.
    pub view: Option<DashboardView>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Build the state around data prepared at startup, filling unset
    /// selectors with the first options. Only the view is built; the data is
    /// not loaded again.
    pub fn new(
        source: Box<dyn DatasetSource>,
        config: DashboardConfig,
        data: PreparedData,
        selection: Selection,
    ) -> Self {
        let mut state = Self {
            source,
            config,
            data,
            options: SelectorOptions::default(),
            selection,
            view: None,
            status_message: None,
        };
        state.rebuild_view();
        state
    }

    pub fn select_state(&mut self, value: CellValue) {
        self.selection.state = Some(value);
        self.refresh();
    }

    pub fn select_year(&mut self, value: CellValue) {
        self.selection.year = Some(value);
        self.refresh();
    }

    pub fn select_company(&mut self, value: CellValue) {
        self.selection.company = Some(value);
        self.refresh();
    }

    /// React to a selector change: re-run the whole pipeline, or only the
    /// filters when reloading on selection is disabled.
    pub fn refresh(&mut self) {
        if self.config.reload_on_select {
            self.reload();
        } else {
            self.rebuild_view();
        }
    }

    /// Load, clean, and derive again. On failure the previous data stays.
    pub fn reload(&mut self) {
        match prepare(self.source.as_ref(), &self.config.estate_alignment) {
            Ok(data) => {
                self.data = data;
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Reload failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
        self.rebuild_view();
    }

    /// Switch to a new source (e.g. a folder picked in the UI) and reload.
    pub fn set_source(&mut self, source: Box<dyn DatasetSource>) {
        self.source = source;
        self.reload();
    }

    /// Recompute selector options and the filtered view. A selection that
    /// no longer appears in the options is kept so the view reports it.
    fn rebuild_view(&mut self) {
        let result = self.data.selector_options().and_then(|options| {
            let selection = self.selection.clone().or_first(&options);
            let view = self.data.view(&selection)?;
            Ok((options, selection, view))
        });
        match result {
            Ok((options, selection, view)) => {
                self.options = options;
                self.selection = selection;
                self.view = Some(view);
            }
            Err(e) => {
                log::error!("Failed to build view: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.view = None;
            }
        }
    }

    /// Total rows currently loaded across the six datasets.
    pub fn total_rows(&self) -> usize {
        self.data.summary.iter().map(|s| s.loaded - s.dropped).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::DatasetKind;
    use crate::data::metrics::EstateAlignment;
    use crate::pipeline::fixtures::MemorySource;

    fn state_with(config: DashboardConfig) -> (AppState, std::rc::Rc<std::cell::Cell<usize>>) {
        let source = MemorySource::new();
        let loads = source.loads.clone();
        let data = prepare(&source, &EstateAlignment::SourceRow).unwrap();
        (AppState::new(Box::new(source), config, data, Selection::default()), loads)
    }

    #[test]
    fn new_state_selects_first_options() {
        let (state, _) = state_with(DashboardConfig::default());
        assert_eq!(state.selection.state, Some(CellValue::from("Edo")));
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.roi_text(), "ROI for Okomu: 10.00%");
        assert_eq!(state.total_rows(), 2 + 2 + 2 + 1 + 1 + 1);
    }

    #[test]
    fn initial_selection_builds_view_without_reloading() {
        let source = MemorySource::new();
        let loads = source.loads.clone();
        let data = prepare(&source, &EstateAlignment::SourceRow).unwrap();
        let after_prepare = loads.get();
        let selection = Selection {
            company: Some(CellValue::from("Presco")),
            ..Selection::default()
        };
        let state =
            AppState::new(Box::new(source), DashboardConfig::default(), data, selection);

        assert_eq!(loads.get(), after_prepare);
        assert_eq!(state.selection.state, Some(CellValue::from("Edo")));
        assert_eq!(state.view.as_ref().unwrap().roi_text(), "ROI for Presco: 10.00%");
    }

    #[test]
    fn selector_change_reloads_all_datasets() {
        let (mut state, loads) = state_with(DashboardConfig::default());
        let before = loads.get();
        state.select_year(CellValue::Integer(2020));
        assert_eq!(loads.get(), before + DatasetKind::ALL.len());
        assert_eq!(state.view.as_ref().unwrap().production_rows.len(), 1);
    }

    #[test]
    fn selector_change_without_reload_only_filters() {
        let config = DashboardConfig {
            reload_on_select: false,
            ..DashboardConfig::default()
        };
        let (mut state, loads) = state_with(config);
        let before = loads.get();
        state.select_company(CellValue::from("Presco"));
        assert_eq!(loads.get(), before);
        assert_eq!(state.view.as_ref().unwrap().roi_text(), "ROI for Presco: 10.00%");
    }

    #[test]
    fn failed_reload_keeps_previous_data() {
        let (mut state, _) = state_with(DashboardConfig::default());
        let mut broken = MemorySource::new();
        broken.tables.remove(&DatasetKind::Company);
        state.set_source(Box::new(broken));

        assert!(state.status_message.as_deref().unwrap().contains("company_comparison"));
        assert_eq!(state.data.datasets.company.len(), 2);
        assert!(state.view.is_some());
    }

    #[test]
    fn stale_company_selection_reports_not_found() {
        let (mut state, _) = state_with(DashboardConfig::default());
        let mut changed = MemorySource::new();
        changed.tables.insert(
            DatasetKind::Company,
            "metric,Revenue,Cost of revenue,Profit for the year,Net assets\n\
             Presco,1000,500,100,1000\n"
                .to_string(),
        );
        state.set_source(Box::new(changed));

        assert!(!state.options.companies.contains(&CellValue::from("Okomu")));
        let view = state.view.as_ref().unwrap();
        assert_eq!(view.roi_text(), "ROI for Okomu: no data for this selection");
        assert!(state.status_message.is_none());
    }
}
