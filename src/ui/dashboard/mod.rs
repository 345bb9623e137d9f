use std::{collections::HashMap, path::PathBuf};

use egui::{
    Color32, DragValue, Frame, Layout, Margin, RichText, Spinner, Ui, Visuals, style::Widgets,
};
use egui_dropdown::DropDownBox;
use log::{error, info, warn};

use paddock::{
    Dashboard, FileSessionProvider, PaddockError, PanelKind, PanelRequest, session::FIRST_SEASON,
};

use super::{
    PALETTE_BLACK, PALETTE_BROWN, PALETTE_MAROON, PALETTE_ORANGE,
    config::{AppConfig, LATEST_SEASON},
};

mod charts;

const FETCH_FAILURE_HINT: &str = "Ensure the race name is spelled correctly, GP exists and it has been completed for the selected year.";

/// Status line rendered under a panel's generate button
#[derive(Clone, Debug, PartialEq)]
enum StatusMessage {
    Info(String),
    Warning(String),
    Error {
        message: String,
        hint: Option<&'static str>,
    },
}

impl StatusMessage {
    fn from_error(e: &PaddockError) -> Self {
        match e {
            PaddockError::InvalidSelection => StatusMessage::Warning(e.to_string()),
            PaddockError::InvalidDriverSelection => StatusMessage::Error {
                message: e.to_string(),
                hint: None,
            },
            e if e.is_fetch_failure() => StatusMessage::Error {
                message: format!("An error occurred during plot generation: {}", e),
                hint: Some(FETCH_FAILURE_HINT),
            },
            e => StatusMessage::Error {
                message: format!("An error occurred during plot generation: {}", e),
                hint: None,
            },
        }
    }

    fn show(&self, ui: &mut Ui) {
        match self {
            StatusMessage::Info(message) => {
                ui.label(RichText::new(message).color(Color32::LIGHT_GREEN));
            }
            StatusMessage::Warning(message) => {
                ui.label(RichText::new(format!("⚠ {}", message)).color(Color32::YELLOW));
            }
            StatusMessage::Error { message, hint } => {
                ui.label(RichText::new(message).color(Color32::RED));
                if let Some(hint) = hint {
                    ui.label(RichText::new(*hint).color(Color32::LIGHT_GRAY).small());
                }
            }
        }
    }
}

/// A generation waits one frame so the spinner is painted before the blocking work starts.
struct PendingRequest {
    request: PanelRequest,
    spinner_painted: bool,
}

fn panel_heading(kind: PanelKind) -> &'static str {
    match kind {
        PanelKind::QualifyingDelta => "Qualifying Delta",
        PanelKind::SectorTimes => "Sector Times",
        PanelKind::HeadToHead => "Telemetry Analysis",
        PanelKind::RaceDistribution => "Race Lap Distribution",
        PanelKind::Acceleration => "Acceleration Times",
    }
}

fn generate_label(kind: PanelKind) -> &'static str {
    match kind {
        PanelKind::QualifyingDelta => "Generate Qualifying Plot",
        PanelKind::SectorTimes => "Generate Sector Times Plot",
        PanelKind::HeadToHead => "Generate Head-to-Head Plot",
        PanelKind::RaceDistribution => "Generate Race Plot",
        PanelKind::Acceleration => "Generate Acceleration Times Plot",
    }
}

pub(crate) struct DashboardApp {
    dashboard: Dashboard<FileSessionProvider>,
    app_config: AppConfig,
    year: u16,
    race_name: String,
    active_panel: PanelKind,
    driver1: String,
    driver2: String,
    // None until the head-to-head tab asks for it after a confirmation
    drivers: Option<Result<Vec<String>, String>>,
    available_races: Vec<String>,
    pending: Option<PendingRequest>,
    selection_status: Option<StatusMessage>,
    panel_status: HashMap<PanelKind, StatusMessage>,
}

impl DashboardApp {
    pub(crate) fn new(
        data_dir: PathBuf,
        app_config: AppConfig,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        let default_visuals = Visuals {
            dark_mode: true,
            hyperlink_color: PALETTE_MAROON,
            faint_bg_color: PALETTE_BLACK,
            extreme_bg_color: PALETTE_BROWN,
            panel_fill: PALETTE_BLACK,
            button_frame: true,
            selection: egui::style::Selection {
                bg_fill: PALETTE_MAROON,
                stroke: egui::Stroke::new(1., PALETTE_ORANGE),
            },
            widgets: Widgets::dark(),
            striped: false,
            ..Default::default()
        };
        cc.egui_ctx.set_visuals(default_visuals);

        let provider = FileSessionProvider::new(data_dir);
        let year = app_config.year.clamp(FIRST_SEASON, LATEST_SEASON);
        let mut app = Self {
            dashboard: Dashboard::new(provider),
            year,
            race_name: app_config.race_name.clone(),
            app_config,
            active_panel: PanelKind::QualifyingDelta,
            driver1: String::new(),
            driver2: String::new(),
            drivers: None,
            available_races: Vec::new(),
            pending: None,
            selection_status: None,
            panel_status: HashMap::new(),
        };
        app.refresh_available_races();
        app
    }

    fn refresh_available_races(&mut self) {
        self.available_races = self
            .dashboard
            .sessions()
            .provider()
            .available_races(self.year)
            .unwrap_or_else(|e| {
                warn!("Could not list races for {}: {}", self.year, e);
                Vec::new()
            });
    }

    fn change_data_dir(&mut self, data_dir: PathBuf) {
        info!("Reading sessions from {:?}", data_dir);
        self.dashboard
            .sessions_mut()
            .replace_provider(FileSessionProvider::new(data_dir.clone()));
        self.app_config.data_dir = Some(data_dir);
        self.drivers = None;
        self.refresh_available_races();
    }

    fn confirm_selection(&mut self) {
        match self.dashboard.confirm_selection(self.year, &self.race_name) {
            Ok(selection) => {
                self.selection_status = Some(StatusMessage::Info(format!(
                    "Selected {} {} Grand Prix",
                    selection.year, selection.race
                )));
                self.app_config.year = selection.year;
                self.app_config.race_name = selection.race.clone();
                self.drivers = None;
                self.driver1.clear();
                self.driver2.clear();
            }
            Err(e) => {
                self.selection_status = Some(StatusMessage::Error {
                    message: e.to_string(),
                    hint: None,
                });
            }
        }
    }

    fn run_pending(&mut self, ctx: &egui::Context) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if !pending.spinner_painted {
            self.pending = Some(PendingRequest {
                spinner_painted: true,
                ..pending
            });
            ctx.request_repaint();
            return;
        }

        let kind = pending.request.kind();
        match self.dashboard.generate(&pending.request) {
            Ok(_) => {
                self.panel_status.remove(&kind);
            }
            Err(e) => {
                self.panel_status.insert(kind, StatusMessage::from_error(&e));
            }
        }
    }

    fn request_for(&self, kind: PanelKind) -> PanelRequest {
        match kind {
            PanelKind::QualifyingDelta => PanelRequest::QualifyingDelta,
            PanelKind::SectorTimes => PanelRequest::SectorTimes,
            PanelKind::HeadToHead => PanelRequest::HeadToHead {
                driver1: self.driver1.clone(),
                driver2: self.driver2.clone(),
            },
            PanelKind::RaceDistribution => PanelRequest::RaceDistribution,
            PanelKind::Acceleration => PanelRequest::Acceleration,
        }
    }

    fn load_drivers(&mut self) {
        if self.drivers.is_some() || !self.dashboard.context().is_confirmed() {
            return;
        }
        let drivers = self.dashboard.qualifying_drivers().map_err(|e| {
            warn!("Could not load the driver list: {}", e);
            StatusMessage::from_error(&e)
        });
        match drivers {
            Ok(drivers) => {
                if let [first, second, ..] = drivers.as_slice() {
                    self.driver1 = first.clone();
                    self.driver2 = second.clone();
                }
                self.drivers = Some(Ok(drivers));
            }
            Err(status) => {
                self.panel_status.insert(PanelKind::HeadToHead, status);
                self.drivers = Some(Err("Driver list unavailable".to_string()));
            }
        }
    }

    fn show_selection_panel(&mut self, ui: &mut Ui) {
        ui.label(
            RichText::new("Analysis Options")
                .color(Color32::WHITE)
                .strong()
                .size(16.),
        );
        ui.separator();

        ui.label(RichText::new("Year").color(Color32::WHITE));
        let previous_year = self.year;
        ui.add(DragValue::new(&mut self.year).range(FIRST_SEASON..=LATEST_SEASON));
        if previous_year != self.year {
            self.refresh_available_races();
        }

        ui.add_space(4.);
        ui.label(RichText::new("Race Name").color(Color32::WHITE));
        ui.text_edit_singleline(&mut self.race_name);

        ui.add_space(4.);
        if ui.button("Confirm Selection").clicked() {
            self.confirm_selection();
        }
        if let Some(status) = &self.selection_status {
            status.show(ui);
        }

        ui.separator();
        ui.label(RichText::new("Data directory").color(Color32::WHITE));
        ui.label(
            RichText::new(
                self.dashboard
                    .sessions()
                    .provider()
                    .data_dir()
                    .display()
                    .to_string(),
            )
            .color(Color32::GRAY)
            .small(),
        );
        if ui.button("📂 Change").clicked()
            && let Some(path) = rfd::FileDialog::new().pick_folder()
        {
            self.change_data_dir(path);
        }

        ui.separator();
        ui.label(RichText::new(format!("Races in {}", self.year)).color(Color32::WHITE));
        if self.available_races.is_empty() {
            ui.label(RichText::new("No sessions found").color(Color32::GRAY).small());
        }
        let mut picked = None;
        egui::ScrollArea::vertical()
            .max_height(240.)
            .show(ui, |ui| {
                for race in &self.available_races {
                    if ui
                        .selectable_label(race.eq_ignore_ascii_case(&self.race_name), race)
                        .clicked()
                    {
                        picked = Some(race.clone());
                    }
                }
            });
        if let Some(race) = picked {
            self.race_name = race;
        }
    }

    fn show_driver_selectors(&mut self, ui: &mut Ui) {
        self.load_drivers();
        let Some(Ok(drivers)) = &self.drivers else {
            return;
        };
        ui.with_layout(Layout::left_to_right(egui::Align::Center), |ui| {
            ui.label(RichText::new("Driver 1: ").color(Color32::WHITE));
            ui.add(
                DropDownBox::from_iter(
                    drivers,
                    "driver1_dropbox",
                    &mut self.driver1,
                    |ui, text| ui.selectable_label(false, text),
                )
                .filter_by_input(false),
            );
            ui.separator();
            ui.label(RichText::new("Driver 2: ").color(Color32::WHITE));
            ui.add(
                DropDownBox::from_iter(
                    drivers,
                    "driver2_dropbox",
                    &mut self.driver2,
                    |ui, text| ui.selectable_label(false, text),
                )
                .filter_by_input(false),
            );
        });
    }

    fn show_panel(&mut self, ui: &mut Ui) {
        let kind = self.active_panel;
        let heading = match self.dashboard.context().selection() {
            Some(selection) => format!(
                "{} ({} {} Grand Prix)",
                panel_heading(kind),
                selection.year,
                selection.race
            ),
            None => panel_heading(kind).to_string(),
        };
        ui.label(RichText::new(heading).color(Color32::WHITE).strong().size(20.));
        ui.label(RichText::new(kind.description()).color(Color32::LIGHT_GRAY));
        ui.add_space(6.);

        if kind == PanelKind::HeadToHead && self.dashboard.context().is_confirmed() {
            self.show_driver_selectors(ui);
        }

        let is_pending = self
            .pending
            .as_ref()
            .is_some_and(|p| p.request.kind() == kind);
        ui.horizontal(|ui| {
            let button = ui.add_enabled(self.pending.is_none(), egui::Button::new(generate_label(kind)));
            if button.clicked() {
                if kind == PanelKind::HeadToHead && matches!(self.drivers, Some(Err(_))) {
                    // retried by the driver selectors on the next frame
                    self.drivers = None;
                }
                if self.dashboard.context().is_confirmed() {
                    self.pending = Some(PendingRequest {
                        request: self.request_for(kind),
                        spinner_painted: false,
                    });
                } else {
                    self.panel_status.insert(
                        kind,
                        StatusMessage::Warning(PaddockError::InvalidSelection.to_string()),
                    );
                }
            }
            if is_pending {
                ui.add(Spinner::new());
                ui.label(RichText::new("Generating plot...").color(Color32::GRAY));
            }
        });
        if let Some(status) = self.panel_status.get(&kind) {
            status.show(ui);
        }

        ui.add_space(10.);
        if let Some(chart) = self.dashboard.chart(kind) {
            charts::show_chart(ui, chart);
        }
    }
}

impl eframe::App for DashboardApp {
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.app_config.data_dir = Some(
            self.dashboard
                .sessions()
                .provider()
                .data_dir()
                .to_path_buf(),
        );
        if let Err(e) = self.app_config.save() {
            error!("Error while saving config file: {}", e);
        }
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.run_pending(ctx);

        egui::SidePanel::left("AnalysisOptions")
            .frame(
                Frame::default()
                    .fill(PALETTE_BLACK)
                    .inner_margin(Margin::same(8)),
            )
            .resizable(false)
            .min_width(220.)
            .show(ctx, |ui| self.show_selection_panel(ui));

        egui::TopBottomPanel::top("PanelTabs")
            .frame(
                Frame::default()
                    .fill(Color32::TRANSPARENT)
                    .inner_margin(Margin::same(5)),
            )
            .show(ctx, |ui| {
                ui.label(
                    RichText::new("F1 Data Analysis")
                        .color(PALETTE_ORANGE)
                        .strong()
                        .size(22.),
                );
                ui.horizontal(|ui| {
                    for kind in PanelKind::ALL {
                        ui.selectable_value(&mut self.active_panel, kind, kind.tab_name());
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| self.show_panel(ui));
        });
    }
}
