use std::collections::BTreeMap;

use eframe::egui::{self, ProgressBar, RichText, ScrollArea, Slider, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot, PlotPoints, Points};

use churn_dashboard::analytics::metrics::Kpis;
use churn_dashboard::analytics::risk::AtRiskCustomer;
use churn_dashboard::analytics::views::{ScatterPoint, TenureHistogram};
use churn_dashboard::config::TOP_N_RANGE;
use churn_dashboard::{AddOn, Dashboard};

use crate::color::{band_color, churn_color, ColorMap};

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render KPIs, the at-risk list and all charts for the current snapshot.
pub fn dashboard(ui: &mut Ui, state: &mut Dashboard) {
    let Some(kpis) = state.snapshot.as_ref().map(|s| s.kpis.clone()) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a customer file to start  (File → Open…)");
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Customer Churn Dashboard");
            ui.label(format!(
                "Showing {} customers after filtering",
                kpis.total_customers
            ));
            kpi_row(ui, &kpis);
            ui.separator();

            // ---- Top at-risk customers ----
            ui.heading("Top At-Risk Customers");
            let mut top_n = state.top_n;
            if ui
                .add(Slider::new(&mut top_n, TOP_N_RANGE).text("customers to display"))
                .changed()
            {
                state.set_top_n(top_n);
            }

            // Re-borrow after a possible recompute from the slider.
            let Some(snapshot) = state.snapshot.as_ref() else {
                return;
            };
            at_risk_table(ui, &snapshot.top_at_risk);
            ui.separator();

            ui.columns(2, |cols| {
                cols[0].strong("Churn Distribution");
                churn_distribution_chart(&mut cols[0], &snapshot.churn_distribution);
                cols[1].strong("Customer Tenure Distribution by Churn");
                tenure_chart(&mut cols[1], &snapshot.tenure_histogram);
            });
            ui.separator();

            ui.columns(2, |cols| {
                cols[0].strong("Avg Monthly Charges by Contract");
                avg_charge_chart(&mut cols[0], &snapshot.avg_charge_by_contract);
                cols[1].strong("Add-On Adoption Rates");
                adoption_chart(&mut cols[1], &snapshot.addon_adoption);
            });
            ui.separator();

            ui.strong("Tenure vs Monthly Charges by Churn");
            scatter_chart(ui, &snapshot.scatter);
        });
}

// ---------------------------------------------------------------------------
// KPI cards
// ---------------------------------------------------------------------------

fn kpi_row(ui: &mut Ui, kpis: &Kpis) {
    let avg = kpis
        .avg_monthly_charge
        .map(|v| format!("${v:.2}"))
        .unwrap_or_else(|| "–".to_string());

    ui.columns(4, |cols| {
        kpi_card(&mut cols[0], "Total Customers", kpis.total_customers.to_string());
        kpi_card(&mut cols[1], "Churn Rate", format!("{:.1}%", kpis.churn_rate));
        kpi_card(&mut cols[2], "Avg Monthly Charge", avg);
        kpi_card(
            &mut cols[3],
            "Long-Term Customers",
            kpis.long_term_customers.to_string(),
        );
    });
}

fn kpi_card(ui: &mut Ui, title: &str, value: String) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_min_width(ui.available_width());
        ui.label(title);
        ui.label(RichText::new(value).size(24.0).strong());
    });
}

// ---------------------------------------------------------------------------
// At-risk list
// ---------------------------------------------------------------------------

fn at_risk_table(ui: &mut Ui, customers: &[AtRiskCustomer]) {
    if customers.is_empty() {
        ui.label("No customers match the current filters.");
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(100.0))
        .column(Column::auto().at_least(120.0))
        .column(Column::auto().at_least(80.0))
        .column(Column::remainder().at_least(180.0))
        .header(20.0, |mut header| {
            for title in ["Customer ID", "Contract", "Tenure", "Churn probability"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for customer in customers {
                body.row(22.0, |mut row| {
                    row.col(|ui| {
                        ui.label(customer.customer_id.as_str());
                    });
                    row.col(|ui| {
                        ui.label(customer.contract_type.as_str());
                    });
                    row.col(|ui| {
                        ui.label(format!("{} months", customer.tenure_months));
                    });
                    row.col(|ui| {
                        let p = customer.churn_probability;
                        ui.add(
                            ProgressBar::new(p as f32)
                                .fill(band_color(customer.band))
                                .text(format!("{}%  ({})", (p * 100.0) as i32, customer.band)),
                        );
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// Bar chart over categories, with the category names on the x axis.
fn category_plot(ui: &mut Ui, id: &str, y_label: &str, bars: Vec<Bar>, labels: Vec<String>) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .allow_drag(false)
        .y_axis_label(y_label)
        .x_axis_formatter(move |mark: GridMark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

fn churn_distribution_chart(ui: &mut Ui, counts: &[(String, usize)]) {
    let bars = counts
        .iter()
        .enumerate()
        .map(|(i, (churn, n))| {
            Bar::new(i as f64, *n as f64)
                .name(churn)
                .fill(churn_color(churn))
                .width(0.6)
        })
        .collect();
    let labels = counts.iter().map(|(c, _)| c.clone()).collect();
    category_plot(ui, "churn_distribution", "Count", bars, labels);
}

fn avg_charge_chart(ui: &mut Ui, means: &[(String, f64)]) {
    let colors = ColorMap::new(means.iter().map(|(c, _)| c.as_str()));
    let bars = means
        .iter()
        .enumerate()
        .map(|(i, (contract, mean))| {
            Bar::new(i as f64, *mean)
                .name(format!("{contract}: ${mean:.2}"))
                .fill(colors.color_for(contract))
                .width(0.6)
        })
        .collect();
    let labels = means.iter().map(|(c, _)| c.clone()).collect();
    category_plot(ui, "avg_charge_by_contract", "Avg Monthly Charge", bars, labels);
}

fn adoption_chart(ui: &mut Ui, rates: &[(AddOn, f64)]) {
    let names: Vec<String> = rates.iter().map(|(a, _)| a.to_string()).collect();
    let colors = ColorMap::new(names.iter().map(String::as_str));
    let bars = rates
        .iter()
        .zip(&names)
        .enumerate()
        .map(|(i, ((_, rate), name))| {
            Bar::new(i as f64, *rate)
                .name(format!("{name}: {:.1}%", rate * 100.0))
                .fill(colors.color_for(name))
                .width(0.6)
        })
        .collect();
    category_plot(ui, "addon_adoption", "Rate", bars, names);
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

fn tenure_chart(ui: &mut Ui, hist: &TenureHistogram) {
    let width = hist.bin_width();

    // One stacked series per churn value over the shared edges.
    let mut charts: Vec<BarChart> = Vec::new();
    for (churn, counts) in &hist.by_churn {
        let bars: Vec<Bar> = counts
            .iter()
            .zip(&hist.edges)
            .map(|(&n, &left)| Bar::new(left + width / 2.0, n as f64).width(width))
            .collect();
        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars)
            .name(churn)
            .color(churn_color(churn))
            .stack_on(&below);
        charts.push(chart);
    }

    Plot::new("tenure_histogram")
        .height(CHART_HEIGHT)
        .allow_scroll(false)
        .legend(Legend::default())
        .x_axis_label("Tenure (Months)")
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

/// Marker radius buckets for probability-sized points.
fn radius_bucket(size: Option<f64>) -> u8 {
    size.map(|s| (s.clamp(0.0, 1.0) * 10.0).round() as u8).unwrap_or(3)
}

fn scatter_chart(ui: &mut Ui, points: &[ScatterPoint]) {
    // egui_plot uses one radius per series, so group by churn and size bucket.
    let mut series: BTreeMap<(&str, u8), Vec<[f64; 2]>> = BTreeMap::new();
    for p in points {
        series
            .entry((p.churn.as_str(), radius_bucket(p.size)))
            .or_default()
            .push([p.monthly_charges, p.tenure_months as f64]);
    }

    let hover: Vec<([f64; 2], String)> = points
        .iter()
        .map(|p| {
            (
                [p.monthly_charges, p.tenure_months as f64],
                format!(
                    "{} / {}\nTech support: {}  Streaming TV: {}",
                    p.contract_type, p.payment_method, p.tech_support, p.streaming_tv
                ),
            )
        })
        .collect();

    Plot::new("tenure_vs_charges")
        .height(CHART_HEIGHT * 1.4)
        .allow_scroll(false)
        .legend(Legend::default())
        .x_axis_label("Monthly Charge")
        .y_axis_label("Tenure (Months)")
        .label_formatter(move |_name, value| {
            let nearest = hover.iter().min_by(|(a, _), (b, _)| {
                let da = (a[0] - value.x).powi(2) + (a[1] - value.y).powi(2);
                let db = (b[0] - value.x).powi(2) + (b[1] - value.y).powi(2);
                da.total_cmp(&db)
            });
            match nearest {
                Some((xy, info)) => format!("${:.2}, {} months\n{info}", xy[0], xy[1]),
                None => String::new(),
            }
        })
        .show(ui, |plot_ui| {
            for ((churn, bucket), xy) in series {
                plot_ui.points(
                    Points::new(PlotPoints::from(xy))
                        .name(churn)
                        .color(churn_color(churn))
                        .radius(2.0 + bucket as f32 * 0.8),
                );
            }
        });
}
