use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::logic::{ApiClient, ReqwestApiClient, SharedState, lock_state, poller_task};
use crate::model::{
    FleetSummary, HealthStatus, LoadState, PowerState, ServerEntry, ServerRecord,
    cabinet_node_id, position_node_id,
};
use eframe::egui;
use eframe::egui::{Color32, RichText};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Legend, Plot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tr::tr;

const TREE_INDENT: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Dashboard,
    Servers,
}

pub struct IdracDashboard {
    pub(crate) state: SharedState,
    pub page: Page,
    pub selected_server: Option<String>,
    pub sidebar_open: bool,
    wake: Arc<Notify>,
}

/// Helper for application-specific colors adapted for light/dark themes.
struct DashboardVisuals {
    pub is_dark: bool,
}

impl DashboardVisuals {
    fn from_ctx(ctx: &egui::Context) -> Self {
        Self {
            is_dark: ctx.style().visuals.dark_mode,
        }
    }

    fn good_color(&self) -> Color32 {
        Color32::from_rgb(0, 158, 115) // Bluish green
    }

    fn bad_color(&self) -> Color32 {
        Color32::from_rgb(213, 94, 0) // Vermilion
    }

    fn warn_color(&self) -> Color32 {
        if self.is_dark {
            Color32::from_rgb(240, 228, 66) // Yellow
        } else {
            Color32::from_rgb(230, 159, 0) // Orange
        }
    }

    fn neutral_color(&self) -> Color32 {
        if self.is_dark {
            Color32::from_rgb(86, 180, 233) // Sky Blue
        } else {
            Color32::from_rgb(0, 114, 178) // Blue
        }
    }

    fn health_color(&self, health: HealthStatus) -> Color32 {
        match health {
            HealthStatus::Ok => self.good_color(),
            HealthStatus::Warning => self.warn_color(),
            HealthStatus::Critical => self.bad_color(),
            HealthStatus::Unknown => Color32::from_gray(if self.is_dark { 130 } else { 150 }),
        }
    }

    fn power_color(&self, power: PowerState) -> Color32 {
        match power {
            PowerState::On => self.good_color(),
            PowerState::Off => self.bad_color(),
        }
    }
}

fn health_icon(health: HealthStatus) -> &'static str {
    match health {
        HealthStatus::Ok => "✔",
        HealthStatus::Warning => "⚠",
        HealthStatus::Critical | HealthStatus::Unknown => "✖",
    }
}

/// Expandable tree row. Returns true when clicked.
fn tree_node(ui: &mut egui::Ui, depth: usize, label: &str, expanded: bool, servers: usize) -> bool {
    ui.horizontal(|ui| {
        ui.add_space(depth as f32 * TREE_INDENT);
        let arrow = if expanded { "▼" } else { "▶" };
        ui.add(egui::Button::new(format!("{arrow} {label}")).frame(false))
            .on_hover_text(format!("{} {}", servers, tr!("servers")))
            .clicked()
    })
    .inner
}

fn summary_card(ui: &mut egui::Ui, title: String, value: usize, color: Color32) {
    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(12))
        .show(ui, |ui| {
            ui.set_min_width(160.0);
            ui.vertical(|ui| {
                ui.label(RichText::new(title).weak());
                ui.label(RichText::new(value.to_string()).size(28.0).strong().color(color));
            });
        });
}

fn info_row(ui: &mut egui::Ui, label: String, value: Option<&str>) {
    ui.label(RichText::new(label).strong());
    ui.label(value.unwrap_or("N/A"));
    ui.end_row();
}

fn count_row(ui: &mut egui::Ui, label: String, count: usize) {
    ui.label(RichText::new(label).strong());
    ui.label(count.to_string());
    ui.end_row();
}

impl IdracDashboard {
    /// Starts the background poller on its own tokio runtime.
    pub fn spawn(config: &Config) -> Result<Self> {
        let client: Arc<dyn ApiClient> = Arc::new(ReqwestApiClient::new(config.clone())?);
        let state = SharedState::default();
        let wake = Arc::new(Notify::new());

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| DashboardError::Runtime(format!("Failed to start tokio runtime: {}", e)))?;

        let state_clone = state.clone();
        let wake_clone = wake.clone();
        let interval = config.refresh_interval();
        std::thread::Builder::new()
            .name("poller".to_string())
            .spawn(move || {
                runtime.block_on(poller_task(state_clone, client, interval, wake_clone));
            })?;

        tracing::info!(
            "Polling {} every {:?}",
            config.servers_url(),
            interval
        );
        Ok(Self::with_wake(state, wake))
    }

    pub fn from_state(state: SharedState) -> Self {
        Self::with_wake(state, Arc::new(Notify::new()))
    }

    fn with_wake(state: SharedState, wake: Arc<Notify>) -> Self {
        Self {
            state,
            page: Page::default(),
            selected_server: None,
            sidebar_open: true,
            wake,
        }
    }

    pub fn ui_layout(&mut self, ctx: &egui::Context) {
        let visuals = DashboardVisuals::from_ctx(ctx);

        self.header(ctx);
        if self.sidebar_open {
            self.sidebar(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match self.page {
                Page::Dashboard => self.dashboard_page(ui, &visuals),
                Page::Servers => self.servers_page(ui, &visuals),
            });
        });
    }

    fn header(&mut self, ctx: &egui::Context) {
        let (last_refresh, details_loading) = {
            let state = lock_state(&self.state);
            (state.last_refresh, state.details_loading)
        };

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let icon = if self.sidebar_open { "✕" } else { "☰" };
                if ui
                    .button(icon)
                    .on_hover_text(tr!("Toggle sidebar"))
                    .clicked()
                {
                    self.sidebar_open = !self.sidebar_open;
                }
                ui.heading(tr!("Dell iDRAC Monitoring"));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let mut theme = ui.ctx().options(|o| o.theme_preference);
                    let old_theme = theme;
                    theme.radio_buttons(ui);
                    if theme != old_theme {
                        ui.ctx().options_mut(|o| o.theme_preference = theme);
                    }

                    ui.separator();
                    if ui.button(tr!("Refresh")).clicked() {
                        self.wake.notify_one();
                    }
                    if let Some(at) = last_refresh {
                        ui.label(format!("{}: {}", tr!("Updated"), at.format("%H:%M:%S")));
                    }
                    if details_loading {
                        ui.spinner();
                    }
                });
            });
        });
    }

    fn sidebar(&mut self, ctx: &egui::Context) {
        // Work on copies so the lock is not held while drawing
        let (tree, expand) = {
            let state = lock_state(&self.state);
            (state.tree.clone(), state.expand.clone())
        };
        let mut toggled = None;
        let mut selected = None;

        egui::SidePanel::left("sidebar")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.heading("iDRAC");
                ui.separator();
                ui.selectable_value(&mut self.page, Page::Dashboard, tr!("Dashboard"));
                ui.selectable_value(&mut self.page, Page::Servers, tr!("Servers"));
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    if tree.is_empty() {
                        ui.weak(tr!("No servers"));
                    }

                    for dc in tree.datacenters() {
                        let dc_open = expand.is_expanded(&dc.id);
                        if tree_node(ui, 0, &dc.id, dc_open, dc.server_count()) {
                            toggled = Some(dc.id.clone());
                        }
                        if !dc_open {
                            continue;
                        }

                        for cabinet in &dc.cabinets {
                            let cabinet_id = cabinet_node_id(&dc.id, &cabinet.id);
                            let cabinet_open = expand.is_expanded(&cabinet_id);
                            if tree_node(ui, 1, &cabinet.id, cabinet_open, cabinet.server_count()) {
                                toggled = Some(cabinet_id.clone());
                            }
                            if !cabinet_open {
                                continue;
                            }

                            for position in &cabinet.positions {
                                let position_id =
                                    position_node_id(&dc.id, &cabinet.id, &position.id);
                                let position_open = expand.is_expanded(&position_id);
                                if tree_node(ui, 2, &position.id, position_open, position.servers.len()) {
                                    toggled = Some(position_id.clone());
                                }
                                if !position_open {
                                    continue;
                                }

                                for server in &position.servers {
                                    ui.horizontal(|ui| {
                                        ui.add_space(3.0 * TREE_INDENT);
                                        let is_selected =
                                            self.selected_server.as_deref() == Some(server.ip.as_str());
                                        if ui.selectable_label(is_selected, server.label()).clicked() {
                                            selected = Some(server.ip.clone());
                                        }
                                    });
                                }
                            }
                        }
                    }
                });
            });

        if let Some(node_id) = toggled {
            lock_state(&self.state).toggle_node(&node_id);
        }
        if let Some(ip) = selected {
            self.selected_server = Some(ip);
            self.page = Page::Servers;
        }
    }

    fn dashboard_page(&mut self, ui: &mut egui::Ui, visuals: &DashboardVisuals) {
        let (load, summary, details_loading, last_error) = {
            let state = lock_state(&self.state);
            (
                state.load.clone(),
                state.summary(),
                state.details_loading,
                state.last_error.clone(),
            )
        };

        match load {
            LoadState::Loading => {
                ui.label(RichText::new(format!("⏳ {}", tr!("Loading dashboard..."))).size(18.0));
                return;
            }
            LoadState::Failed(error) => {
                ui.colored_label(visuals.bad_color(), RichText::new(tr!("Error")).strong().size(20.0));
                ui.label(error);
                ui.add_space(8.0);
                ui.weak(tr!(
                    "Could not fetch initial server list. Please check your backend connection."
                ));
                return;
            }
            LoadState::Ready => {}
        }

        ui.heading(tr!("Dashboard Overview"));
        if let Some(error) = last_error {
            ui.colored_label(
                visuals.warn_color(),
                format!("{}: {}", tr!("Last refresh failed"), error),
            );
        }
        ui.add_space(8.0);

        ui.horizontal_wrapped(|ui| {
            summary_card(ui, tr!("Total Servers"), summary.total, visuals.neutral_color());
            summary_card(ui, tr!("Servers Up"), summary.up, visuals.good_color());
            summary_card(ui, tr!("Servers Down"), summary.down, visuals.bad_color());
        });

        if details_loading {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(tr!("Fetching server details. This might take a moment..."));
            });
        }

        ui.add_space(12.0);
        ui.columns(2, |columns| {
            status_chart(&mut columns[0], visuals, &summary);
            uptime_chart(&mut columns[1], visuals, &summary);
        });

        if !summary.unavailable.is_empty() {
            ui.add_space(12.0);
            unavailable_table(ui, visuals, &summary.unavailable);
        }
    }

    fn servers_page(&mut self, ui: &mut egui::Ui, visuals: &DashboardVisuals) {
        let (load, servers, entries) = {
            let state = lock_state(&self.state);
            (state.load.clone(), state.servers.clone(), state.entries.clone())
        };

        ui.heading(tr!("Server List"));
        ui.add_space(8.0);

        match load {
            LoadState::Loading => {
                ui.label(format!("⏳ {}", tr!("Loading server data...")));
                return;
            }
            LoadState::Failed(error) => {
                ui.colored_label(visuals.bad_color(), format!("{}: {}", tr!("Error"), error));
                return;
            }
            LoadState::Ready => {}
        }

        if let Some(ip) = self.selected_server.clone() {
            let record = servers.iter().find(|r| r.ip == ip);
            let entry = entries.iter().find(|e| e.ip == ip);
            self.server_view(ui, visuals, &ip, record, entry);
            return;
        }

        let mut clicked = None;
        ui.horizontal_wrapped(|ui| {
            for record in &servers {
                let entry = entries.iter().find(|e| e.ip == record.ip);
                if server_card(ui, visuals, record, entry) {
                    clicked = Some(record.ip.clone());
                }
            }
        });
        if clicked.is_some() {
            self.selected_server = clicked;
        }
    }

    fn server_view(
        &mut self,
        ui: &mut egui::Ui,
        visuals: &DashboardVisuals,
        ip: &str,
        record: Option<&ServerRecord>,
        entry: Option<&ServerEntry>,
    ) {
        if ui.button(format!("⬅ {}", tr!("Back"))).clicked() {
            self.selected_server = None;
        }
        ui.add_space(8.0);
        ui.heading(format!("{}: {}", tr!("Server"), ip));
        if let Some(record) = record {
            ui.weak(format!(
                "{} / {} / {}",
                record.data_center(),
                record.cabinet(),
                record.position()
            ));
        }
        ui.add_space(8.0);

        let Some(details) = entry.and_then(|e| e.details.as_ref()) else {
            match entry.and_then(|e| e.error.as_deref()) {
                Some(error) => {
                    ui.colored_label(
                        visuals.bad_color(),
                        format!("{}: {}", tr!("Unavailable"), error),
                    );
                }
                None => {
                    ui.label(format!("⏳ {}", tr!("Loading server data...")));
                }
            }
            return;
        };

        if let Some(message) = &details.message {
            ui.colored_label(visuals.warn_color(), message);
        }

        let system = &details.system;
        let health = HealthStatus::parse(system.health.as_deref());
        let power = PowerState::parse(system.power_state.as_deref());

        ui.strong(tr!("System"));
        egui::Grid::new("server_system")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                info_row(ui, tr!("Hostname"), system.hostname.as_deref());
                info_row(ui, tr!("Model"), system.model.as_deref());
                info_row(ui, tr!("Manufacturer"), system.manufacturer.as_deref());
                info_row(ui, tr!("Service Tag"), system.service_tag.as_deref());
                info_row(ui, tr!("Serial Number"), system.serial_number.as_deref());
                info_row(ui, tr!("BIOS Version"), system.bios_version.as_deref());

                ui.label(RichText::new(tr!("Health")).strong());
                ui.colored_label(visuals.health_color(health), health.as_str().to_uppercase());
                ui.end_row();

                ui.label(RichText::new(tr!("Power")).strong());
                ui.colored_label(visuals.power_color(power), power.as_str());
                ui.end_row();
            });

        ui.add_space(8.0);
        ui.strong(tr!("Inventory"));
        egui::Grid::new("server_inventory")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                count_row(ui, tr!("Processors"), details.hardware.processors.len());
                count_row(ui, tr!("Memory Modules"), details.hardware.memory_modules.len());
                count_row(ui, tr!("Network Interfaces"), details.hardware.nics.len());
                count_row(ui, tr!("Storage Controllers"), details.storage.controllers.len());
                count_row(ui, tr!("Drives"), details.storage.drives.len());
                count_row(ui, tr!("Fans"), details.thermals_and_power.fans.len());
                count_row(
                    ui,
                    tr!("Temperature Sensors"),
                    details.thermals_and_power.temperature_sensors.len(),
                );
                count_row(
                    ui,
                    tr!("Power Supplies"),
                    details.thermals_and_power.power_supplies.len(),
                );
            });

        ui.add_space(8.0);
        ui.strong(tr!("Warranty"));
        match &details.warranty {
            Some(warranty) if warranty.message.is_none() => {
                egui::Grid::new("server_warranty")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        info_row(ui, tr!("Start Date"), warranty.start_date.as_deref());
                        info_row(ui, tr!("End Date"), warranty.end_date.as_deref());
                        info_row(ui, tr!("Status"), warranty.status.as_deref());
                    });
            }
            Some(warranty) => {
                ui.weak(warranty.message.as_deref().unwrap_or("N/A"));
            }
            None => {
                ui.weak("N/A");
            }
        }

        if let Some(at) = details.collected_at() {
            ui.add_space(8.0);
            ui.weak(format!(
                "{}: {} UTC",
                tr!("Collected"),
                at.format("%Y-%m-%d %H:%M:%S")
            ));
        }
    }
}

/// Card for one server. Returns true when the card or its address is clicked.
fn server_card(
    ui: &mut egui::Ui,
    visuals: &DashboardVisuals,
    record: &ServerRecord,
    entry: Option<&ServerEntry>,
) -> bool {
    let health = entry.map_or(HealthStatus::Unknown, ServerEntry::health);
    let color = visuals.health_color(health);
    let mut link_clicked = false;

    let response = egui::Frame::group(ui.style())
        .stroke(egui::Stroke::new(2.0, color))
        .inner_margin(egui::Margin::same(10))
        .show(ui, |ui| {
            ui.set_width(220.0);
            ui.horizontal(|ui| {
                ui.colored_label(color, RichText::new("🖥").size(18.0));
                link_clicked = ui
                    .add(egui::Link::new(RichText::new(&record.ip).strong().size(16.0)))
                    .clicked();
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.colored_label(color, health_icon(health));
                });
            });
            ui.label(RichText::new(entry.map_or("Unknown Model", ServerEntry::model)).strong());
            ui.weak(record.display_hostname());
            ui.horizontal(|ui| match entry {
                Some(entry) => {
                    let power = entry.power_state();
                    ui.label(
                        RichText::new(format!(" {} ", power.as_str()))
                            .small()
                            .color(Color32::WHITE)
                            .background_color(visuals.power_color(power)),
                    );
                    if entry.error.is_some() {
                        ui.colored_label(visuals.bad_color(), tr!("Error"));
                    }
                }
                None => {
                    ui.weak(tr!("Loading..."));
                }
            });
        })
        .response
        .interact(egui::Sense::click());

    link_clicked || response.clicked()
}

fn status_chart(ui: &mut egui::Ui, visuals: &DashboardVisuals, summary: &FleetSummary) {
    ui.strong(tr!("Server Status Comparison"));
    let up = BarChart::new(
        tr!("Up"),
        vec![Bar::new(0.0, summary.up as f64).width(0.6).fill(visuals.good_color())],
    )
    .color(visuals.good_color());
    let down = BarChart::new(
        tr!("Down"),
        vec![Bar::new(1.0, summary.down as f64).width(0.6).fill(visuals.bad_color())],
    )
    .color(visuals.bad_color());

    Plot::new("status_chart")
        .height(220.0)
        .legend(Legend::default())
        .show_x(false)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .include_y(0.0)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(up);
            plot_ui.bar_chart(down);
        });
}

fn uptime_chart(ui: &mut egui::Ui, visuals: &DashboardVisuals, summary: &FleetSummary) {
    ui.strong(tr!("Server Uptime Distribution"));
    let online_pct = summary.uptime_percent();
    let offline_pct = if summary.up + summary.down == 0 {
        0.0
    } else {
        100.0 - online_pct
    };

    let online = BarChart::new(
        tr!("Online"),
        vec![Bar::new(0.0, online_pct).width(0.5).fill(visuals.good_color())],
    )
    .horizontal()
    .color(visuals.good_color());
    let offline = BarChart::new(
        tr!("Offline"),
        vec![Bar::new(0.0, offline_pct).width(0.5).fill(visuals.bad_color())],
    )
    .horizontal()
    .color(visuals.bad_color())
    .stack_on(&[&online]);

    Plot::new("uptime_chart")
        .height(190.0)
        .legend(Legend::default())
        .show_y(false)
        .allow_zoom(false)
        .allow_drag(false)
        .allow_scroll(false)
        .include_x(0.0)
        .include_x(100.0)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(online);
            plot_ui.bar_chart(offline);
        });
    ui.label(format!(
        "{} {:.0}%  ·  {} {:.0}%",
        tr!("Online"),
        online_pct,
        tr!("Offline"),
        offline_pct
    ));
}

fn unavailable_table(ui: &mut egui::Ui, visuals: &DashboardVisuals, ips: &[String]) {
    ui.horizontal(|ui| {
        ui.colored_label(visuals.warn_color(), RichText::new("⚠").size(18.0));
        ui.strong(format!("{} ({})", tr!("Unavailable Servers"), ips.len()));
    });

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(120.0))
        .column(Column::auto().at_least(100.0))
        .column(Column::auto().at_least(100.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong(tr!("IP Address"));
            });
            header.col(|ui| {
                ui.strong(tr!("Model"));
            });
            header.col(|ui| {
                ui.strong(tr!("Serial Number"));
            });
            header.col(|ui| {
                ui.strong(tr!("Status"));
            });
        })
        .body(|mut body| {
            for ip in ips {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(ip);
                    });
                    row.col(|ui| {
                        ui.weak("N/A");
                    });
                    row.col(|ui| {
                        ui.weak("N/A");
                    });
                    row.col(|ui| {
                        ui.colored_label(visuals.bad_color(), tr!("Unavailable"));
                    });
                });
            }
        });
}

impl eframe::App for IdracDashboard {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_layout(ctx);
        // The poller writes from another thread
        ctx.request_repaint_after(Duration::from_millis(500));
    }
}
