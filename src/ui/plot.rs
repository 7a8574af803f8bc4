use chrono::NaiveDate;
use eframe::egui::{self, Color32, RichText, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

use sales_dash::data::GroupedSummary;
use sales_dash::state::{AppState, Dimension};

use crate::color::ColorMap;
use crate::ui::format;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Central panel: KPI row and the three charts
// ---------------------------------------------------------------------------

/// Render KPIs and charts for the current filter.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a sales table to begin  (File → Open…)");
        });
        return;
    }

    let symbol = state.config.display.currency_symbol.as_str();
    let summary = &state.summary;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Sales Analytics Dashboard");
            ui.add_space(6.0);

            ui.columns(3, |cols| {
                kpi(&mut cols[0], "Total Sales", format::currency(summary.kpis.total_sales, symbol));
                kpi(&mut cols[1], "Total Orders", format::count(summary.kpis.order_count));
                kpi(
                    &mut cols[2],
                    "Avg Order Value",
                    format::optional_currency(summary.kpis.avg_order_value, symbol),
                );
            });
            ui.separator();

            if summary.rows == 0 {
                ui.label(RichText::new("No sales match the current filter.").weak());
                return;
            }

            ui.strong("Revenue by Category");
            ranking_chart(
                ui,
                "revenue_by_category",
                &summary.by_category,
                &ColorMap::new(state.labels(Dimension::Category)),
            );

            ui.strong("Daily Sales Trend");
            daily_chart(ui, &summary.by_date);

            ui.strong("Revenue by Region");
            ranking_chart(
                ui,
                "revenue_by_region",
                &summary.by_region,
                &ColorMap::new(state.labels(Dimension::Region)),
            );
        });
}

fn kpi(ui: &mut Ui, title: &str, value: String) {
    ui.group(|ui: &mut Ui| {
        ui.vertical_centered(|ui: &mut Ui| {
            ui.label(RichText::new(title).weak());
            ui.label(RichText::new(value).size(24.0).strong());
        });
    });
}

/// One bar per label, highest first; each bar is its own legend entry.
fn ranking_chart(ui: &mut Ui, id: &str, groups: &GroupedSummary<String>, colors: &ColorMap) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .show_axes([false, true])
        .y_axis_label("Total Sales")
        .allow_scroll(false)
        .allow_drag(false)
        .show(ui, |plot_ui| {
            for (i, (label, value)) in groups.iter().enumerate() {
                let bar = Bar::new(i as f64, value).width(0.7);
                let chart = BarChart::new(vec![bar])
                    .name(label)
                    .color(colors.color_for(label));
                plot_ui.bar_chart(chart);
            }
        });
}

/// Revenue per day as a line with markers; x is days since 0001-01-01.
fn daily_chart(ui: &mut Ui, daily: &GroupedSummary<NaiveDate>) {
    let coords: Vec<[f64; 2]> = daily
        .iter()
        .map(|(date, value)| [date_to_x(*date), value])
        .collect();

    Plot::new("daily_sales")
        .height(CHART_HEIGHT)
        .x_axis_label("Date")
        .y_axis_label("Total Sales")
        .x_axis_formatter(|mark, _range| x_to_label(mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(coords.clone()))
                    .name("Total Sales")
                    .color(Color32::LIGHT_BLUE)
                    .width(1.5),
            );
            plot_ui.points(
                Points::new(PlotPoints::from(coords))
                    .radius(3.0)
                    .color(Color32::LIGHT_BLUE),
            );
        });
}

fn date_to_x(date: NaiveDate) -> f64 {
    use chrono::Datelike;
    f64::from(date.num_days_from_ce())
}

fn x_to_label(x: f64) -> String {
    if x.fract() != 0.0 {
        return String::new();
    }
    NaiveDate::from_num_days_from_ce_opt(x as i32)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
