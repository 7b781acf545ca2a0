use eframe::egui;

use churn_dashboard::Dashboard;

use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ChurnDashboardApp {
    pub state: Dashboard,
}

impl ChurnDashboardApp {
    pub fn new(state: Dashboard) -> Self {
        Self { state }
    }
}

impl eframe::App for ChurnDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs, at-risk list, charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            charts::dashboard(ui, &mut self.state);
        });
    }
}
