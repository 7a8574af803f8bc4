use std::path::Path;

use anyhow::Context;
use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use sales_dash::state::{AppState, Dimension};

use crate::ui::format;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            label_filter(ui, state, Dimension::Category, "Category");
            label_filter(ui, state, Dimension::Region, "Region");
            ui.separator();
            date_filter(ui, state);
            ui.separator();
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

/// Collapsible checkbox list for one label dimension.
fn label_filter(ui: &mut Ui, state: &mut AppState, dim: Dimension, title: &str) {
    let labels = state.labels(dim);
    let n_selected = labels.iter().filter(|l| state.is_selected(dim, l)).count();
    let header_text = format!("{title}  ({n_selected}/{})", labels.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
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

            for label in &labels {
                let mut checked = state.is_selected(dim, label);
                if ui.checkbox(&mut checked, label.as_str()).changed() {
                    state.toggle(dim, label);
                }
            }
        });
}

fn date_filter(ui: &mut Ui, state: &mut AppState) {
    let Some(range) = state.filter.as_ref().map(|spec| spec.date_range) else {
        return;
    };
    let (mut start, mut end) = (range.start, range.end);

    ui.strong("Date range");
    let mut changed = false;
    egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
        ui.label("From");
        changed |= ui
            .push_id("date_from", |ui| ui.add(DatePickerButton::new(&mut start)))
            .inner
            .changed();
        ui.end_row();
        ui.label("To");
        changed |= ui
            .push_id("date_to", |ui| ui.add(DatePickerButton::new(&mut end)))
            .inner
            .changed();
        ui.end_row();
    });

    if changed {
        state.set_date_range(start, end);
    }
    if start > end {
        ui.label(RichText::new("Start is after end: nothing matches.").color(Color32::YELLOW));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.source.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                // Errors end up in the status line.
                let _ = state.reload();
                ui.close_menu();
            }
            if ui
                .add_enabled(state.dataset.is_some(), egui::Button::new("Export summary…"))
                .clicked()
            {
                if let Err(e) = export_dialog(state) {
                    log::error!("Export failed: {e:#}");
                    state.status_message = Some(format!("Error: {e:#}"));
                }
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let report = ds.report();
            ui.label(format!(
                "{} rows loaded, {} in view",
                format::count(ds.len()),
                format::count(state.summary.rows)
            ));
            if report.rows_dropped() > 0 {
                ui.label(
                    RichText::new(format!("{} incomplete rows skipped", report.rows_dropped()))
                        .weak(),
                )
                .on_hover_text(format!("{:?}", report.drops));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open sales data")
        .add_filter("Supported files", &["csv", "tsv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "tsv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        // The state logs and reports failures itself.
        let _ = state.open(&path);
    }
}

fn export_dialog(state: &AppState) -> anyhow::Result<()> {
    let file = rfd::FileDialog::new()
        .set_title("Export dashboard summary")
        .set_file_name("dashboard_summary.json")
        .add_filter("JSON", &["json"])
        .save_file();

    match file {
        Some(path) => export_summary(state, &path),
        None => Ok(()),
    }
}

fn export_summary(state: &AppState, path: &Path) -> anyhow::Result<()> {
    let json = state.summary_json().context("serializing summary")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported dashboard summary to {}", path.display());
    Ok(())
}
