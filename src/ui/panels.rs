use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use churn_dashboard::{Dashboard, Dimension};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut Dashboard) {
    ui.heading("Filter Customers");
    ui.separator();

    // Cheap Arc clone so we can mutate state inside the loop.
    let Some(table) = state.table.clone() else {
        ui.label("No dataset loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for dim in Dimension::ALL {
                let all_values = table.values_of(dim);
                let n_selected = all_values
                    .iter()
                    .filter(|v| state.is_selected(dim, v))
                    .count();
                let header_text = format!("{dim}  ({n_selected}/{})", all_values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(dim.column())
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(dim);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(dim);
                            }
                        });

                        for value in all_values {
                            let mut checked = state.is_selected(dim, value);
                            if ui.checkbox(&mut checked, value.as_str()).changed() {
                                state.toggle_filter_value(dim, value);
                            }
                        }
                    });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut Dashboard) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                if let Err(e) = state.reload() {
                    log::debug!("Reload failed, status line shows: {e}");
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(table), Some(snapshot)) = (&state.table, &state.snapshot) {
            ui.label(format!(
                "{} customers loaded, showing {} after filtering",
                table.len(),
                snapshot.kpis.total_customers
            ));
        } else {
            ui.label(state.data_path().display().to_string());
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut Dashboard) {
    let file = rfd::FileDialog::new()
        .set_title("Open customer data")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        if state.open(path).is_ok() {
            if let Some(table) = &state.table {
                log::info!(
                    "Opened {} with {} customers",
                    state.data_path().display(),
                    table.len()
                );
            }
        }
    }
}
