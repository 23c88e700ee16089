//! Dashboard application state.
//!
//! [`App`] holds everything the dashboard shows and never touches the
//! network. Key handlers queue a [`Command`]; the event loop runs it against
//! the API and feeds the outcome back through the `apply_*` methods.

use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::model::{Building, DocumentId, EnergyData, NewBuilding};

/// Views selectable from the tab bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Consumption,
    Predictions,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Consumption, Tab::Predictions, Tab::Settings];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Consumption => "Consumption",
            Tab::Predictions => "Predictions",
            Tab::Settings => "Settings",
        }
    }
}

/// Network work requested by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch the building list, then the first building's readings.
    LoadBuildings,
    /// Fetch readings and predictions for one building.
    LoadReadings(DocumentId),
    /// Run the optimize transition, then refetch readings.
    Optimize(DocumentId),
    /// Create a building from the settings form.
    SaveSettings(NewBuilding),
}

/// Transient message shown in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

/// Fields of the settings form, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Name,
    TargetTemp,
    AutoAdjust,
    PeakThreshold,
}

impl SettingsField {
    pub const ALL: [SettingsField; 4] = [
        SettingsField::Name,
        SettingsField::TargetTemp,
        SettingsField::AutoAdjust,
        SettingsField::PeakThreshold,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Name => "Building Name",
            SettingsField::TargetTemp => "Target Temperature (°C)",
            SettingsField::AutoAdjust => "Automatic Adjustments",
            SettingsField::PeakThreshold => "Peak Usage Threshold (kW)",
        }
    }
}

/// Editable building settings. Numeric fields are kept as typed text and
/// checked on submit.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    pub name: String,
    pub target_temp: String,
    pub auto_adjust: bool,
    pub peak_threshold: String,
    pub focus: SettingsField,
    pub errors: Vec<(SettingsField, &'static str)>,
}

impl Default for SettingsForm {
    fn default() -> Self {
        Self {
            name: "Main Office".to_string(),
            target_temp: "22".to_string(),
            auto_adjust: true,
            peak_threshold: "75".to_string(),
            focus: SettingsField::Name,
            errors: Vec::new(),
        }
    }
}

impl SettingsForm {
    /// Fills the form from an existing building.
    pub fn reset_from(&mut self, building: &Building) {
        self.name = building.name.clone();
        self.target_temp = format!("{}", building.target_temperature);
        self.auto_adjust = building.auto_adjust_enabled;
        self.peak_threshold = format!("{}", building.peak_threshold);
        self.errors.clear();
    }

    pub fn focus_next(&mut self) {
        let idx = self.focus_index();
        self.focus = SettingsField::ALL[(idx + 1) % SettingsField::ALL.len()];
    }

    pub fn focus_prev(&mut self) {
        let idx = self.focus_index();
        let len = SettingsField::ALL.len();
        self.focus = SettingsField::ALL[(idx + len - 1) % len];
    }

    fn focus_index(&self) -> usize {
        SettingsField::ALL
            .iter()
            .position(|f| *f == self.focus)
            .unwrap_or(0)
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            SettingsField::Name => Some(&mut self.name),
            SettingsField::TargetTemp => Some(&mut self.target_temp),
            SettingsField::PeakThreshold => Some(&mut self.peak_threshold),
            SettingsField::AutoAdjust => None,
        }
    }

    pub fn input(&mut self, c: char) {
        if let Some(text) = self.focused_text() {
            text.push(c);
        } else if c == ' ' {
            self.auto_adjust = !self.auto_adjust;
        }
    }

    pub fn backspace(&mut self) {
        if let Some(text) = self.focused_text() {
            text.pop();
        }
    }

    /// Checks the form and builds the create request.
    ///
    /// The name must be 2 to 50 characters; both numbers must be plain
    /// digit strings.
    ///
    /// # Errors
    ///
    /// Returns every failing field with its message.
    pub fn validate(&self) -> Result<NewBuilding, Vec<(SettingsField, &'static str)>> {
        let mut errors = Vec::new();

        let name_len = self.name.chars().count();
        if name_len < 2 {
            errors.push((SettingsField::Name, "Must be at least 2 characters"));
        } else if name_len > 50 {
            errors.push((SettingsField::Name, "Must be at most 50 characters"));
        }
        let target = digits(&self.target_temp);
        if target.is_none() {
            errors.push((SettingsField::TargetTemp, "Must be a valid temperature"));
        }
        let peak = digits(&self.peak_threshold);
        if peak.is_none() {
            errors.push((SettingsField::PeakThreshold, "Must be a valid number"));
        }

        match (target, peak) {
            (Some(target), Some(peak)) if errors.is_empty() => Ok(NewBuilding {
                name: Some(self.name.clone()),
                target_temperature: Some(target),
                auto_adjust_enabled: Some(self.auto_adjust),
                peak_threshold: Some(peak),
            }),
            _ => Err(errors),
        }
    }

    pub fn error_for(&self, field: SettingsField) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, msg)| *msg)
    }
}

fn digits(raw: &str) -> Option<f64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Dashboard application state.
pub struct App {
    pub buildings: Vec<Building>,
    /// Index into `buildings` of the building on screen.
    pub selected: usize,
    /// Readings of the selected building, ascending by timestamp.
    pub energy_data: Vec<EnergyData>,
    /// Upcoming readings of the selected building.
    pub predictions: Vec<EnergyData>,
    /// Toggle shown in the header. Starts active.
    pub optimization_enabled: bool,
    pub tab: Tab,
    pub settings: SettingsForm,
    pub notice: Option<Notice>,
    /// True until the first load completes.
    pub loading: bool,
    pub quit: bool,
    /// When data was last requested.
    pub last_refresh: Instant,
    pending: Option<Command>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Creates an empty app with the initial load queued.
    pub fn new() -> Self {
        Self {
            buildings: Vec::new(),
            selected: 0,
            energy_data: Vec::new(),
            predictions: Vec::new(),
            optimization_enabled: true,
            tab: Tab::Consumption,
            settings: SettingsForm::default(),
            notice: None,
            loading: true,
            quit: false,
            last_refresh: Instant::now(),
            pending: Some(Command::LoadBuildings),
        }
    }

    /// Takes the queued command, if any.
    pub fn take_command(&mut self) -> Option<Command> {
        self.pending.take()
    }

    pub fn current_building(&self) -> Option<&Building> {
        self.buildings.get(self.selected)
    }

    /// Queues a reload of the selected building's data.
    ///
    /// Does nothing while another command is still queued.
    pub fn refresh(&mut self) {
        if self.pending.is_some() {
            return;
        }
        self.last_refresh = Instant::now();
        self.pending = Some(match self.current_building() {
            Some(b) => Command::LoadReadings(b.id),
            None => Command::LoadBuildings,
        });
    }

    /// Selects the next building and queues its readings.
    pub fn next_building(&mut self) {
        if self.buildings.len() < 2 {
            return;
        }
        self.selected = (self.selected + 1) % self.buildings.len();
        self.refresh();
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    /// Flips the optimization toggle.
    ///
    /// Turning it on queues an optimize run; turning it off only changes the
    /// label. No-op without a building.
    pub fn toggle_optimization(&mut self) {
        let Some(id) = self.current_building().map(|b| b.id) else {
            return;
        };
        let was_enabled = self.optimization_enabled;
        self.optimization_enabled = !was_enabled;
        if !was_enabled {
            self.pending = Some(Command::Optimize(id));
        }
    }

    /// Validates the settings form and queues the save on success.
    pub fn submit_settings(&mut self) {
        match self.settings.validate() {
            Ok(input) => {
                self.settings.errors.clear();
                self.pending = Some(Command::SaveSettings(input));
            }
            Err(errors) => self.settings.errors = errors,
        }
    }

    /// Stores a fetched building list and queues the first building's data.
    pub fn apply_buildings(&mut self, buildings: Vec<Building>) {
        self.buildings = buildings;
        self.selected = 0;
        if let Some(first) = self.buildings.first() {
            self.settings.reset_from(first);
            self.pending = Some(Command::LoadReadings(first.id));
        } else {
            self.loading = false;
        }
    }

    pub fn apply_readings(&mut self, energy_data: Vec<EnergyData>, predictions: Vec<EnergyData>) {
        self.energy_data = energy_data;
        self.predictions = predictions;
        self.loading = false;
    }

    pub fn load_failed(&mut self) {
        self.loading = false;
        self.error("Failed to load dashboard data");
    }

    /// Records a successful optimize run and its refreshed readings.
    pub fn apply_optimized(&mut self, energy_data: Vec<EnergyData>) {
        self.energy_data = energy_data;
        self.info("Energy optimization applied successfully");
    }

    /// Reverts the toggle after a failed optimize run.
    pub fn optimize_failed(&mut self) {
        self.optimization_enabled = false;
        self.error("Failed to toggle optimization");
    }

    pub fn apply_saved(&mut self, building: Building) {
        self.buildings.push(building);
        self.info("Settings saved successfully");
    }

    pub fn save_failed(&mut self) {
        self.error("Failed to save settings");
    }

    fn info(&mut self, text: &str) {
        self.notice = Some(Notice {
            text: text.to_string(),
            is_error: false,
        });
    }

    fn error(&mut self, text: &str) {
        self.notice = Some(Notice {
            text: text.to_string(),
            is_error: true,
        });
    }

    /// Latest measured consumption, or zero without readings.
    pub fn current_usage(&self) -> f64 {
        self.energy_data.last().map_or(0.0, |r| r.consumption)
    }

    /// Current usage relative to the mean of all readings, in percent.
    pub fn usage_vs_average_pct(&self) -> Option<f64> {
        let avg = mean(self.energy_data.iter().map(|r| r.consumption))?;
        (avg > 0.0).then(|| (self.current_usage() - avg) / avg * 100.0)
    }

    /// Share of predicted consumption avoided across the shown readings, in
    /// percent.
    pub fn savings_pct(&self) -> Option<f64> {
        let predicted: f64 = self.energy_data.iter().map(|r| r.predicted_consumption).sum();
        let actual: f64 = self.energy_data.iter().map(|r| r.consumption).sum();
        (predicted > 0.0).then(|| (predicted - actual) / predicted * 100.0)
    }

    /// Predicted consumption of the nearest upcoming reading, or zero.
    pub fn next_prediction(&self) -> f64 {
        self.predictions
            .first()
            .map_or(0.0, |r| r.predicted_consumption)
    }

    /// Time of the highest upcoming prediction.
    pub fn predicted_peak(&self) -> Option<DateTime<Utc>> {
        self.predictions
            .iter()
            .max_by(|a, b| a.predicted_consumption.total_cmp(&b.predicted_consumption))
            .map(|r| r.timestamp)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
