//! Dashboard layout and widget rendering.

use chrono::{DateTime, Local, Utc};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, Paragraph, Tabs};

use super::runtime::{App, SettingsField, Tab};
use super::style;

/// Renders the full dashboard frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(5), // cards
            Constraint::Length(1), // tabs
            Constraint::Min(10),   // body
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_cards(frame, app, chunks[1]);
    render_tabs(frame, app, chunks[2]);
    match app.tab {
        Tab::Consumption => render_chart(frame, app, chunks[3]),
        Tab::Predictions => render_predictions(frame, app, chunks[3]),
        Tab::Settings => render_settings(frame, app, chunks[3]),
    }
    render_footer(frame, app, chunks[4]);
}

fn clock(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

/// Header bar: building name and optimization toggle.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let building = app
        .current_building()
        .map_or("no building", |b| b.name.as_str());
    let (toggle, color) = if app.optimization_enabled {
        ("Optimization Active", style::ACTIVE)
    } else {
        ("Optimization Paused", style::PAUSED)
    };

    let header = Line::from(vec![
        Span::styled(
            " ENERGY DASHBOARD ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(building, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" ({}/{}) │ ", app.selected + 1, app.buildings.len().max(1))),
        Span::styled(
            toggle,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// Summary cards: current usage, savings, next prediction.
fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let vs_avg = app.usage_vs_average_pct();
    let usage = card(
        format!("{:.1} kW", app.current_usage()),
        vs_avg.map_or_else(
            || Span::raw("no readings yet"),
            |pct| {
                Span::styled(
                    format!("{pct:+.0}% from average"),
                    Style::default().fg(style::delta_color(pct)),
                )
            },
        ),
    );
    frame.render_widget(usage.block(titled(" Current Usage ")), chunks[0]);

    let savings = card(
        app.savings_pct()
            .map_or_else(|| "n/a".to_string(), |pct| format!("{pct:.1}%")),
        Span::raw("vs. predicted consumption"),
    );
    frame.render_widget(savings.block(titled(" Savings ")), chunks[1]);

    let peak = app.predicted_peak().map_or_else(
        || "no upcoming predictions".to_string(),
        |ts| format!("Expected peak at {}", clock(ts)),
    );
    let prediction = card(
        format!("{:.1} kW", app.next_prediction()),
        Span::raw(peak),
    );
    frame.render_widget(prediction.block(titled(" AI Predictions ")), chunks[2]);
}

fn card(value: String, caption: Span<'static>) -> Paragraph<'static> {
    Paragraph::new(vec![
        Line::from(Span::styled(
            value,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(caption),
    ])
}

fn titled(title: &str) -> Block<'_> {
    Block::default().title(title).borders(Borders::ALL)
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let selected = Tab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);
    let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()))
        .select(selected)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
    frame.render_widget(tabs, area);
}

/// Measured vs. predicted consumption chart.
fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let actual: Vec<(f64, f64)> = app
        .energy_data
        .iter()
        .enumerate()
        .map(|(i, r)| (i as f64, r.consumption))
        .collect();
    let predicted: Vec<(f64, f64)> = app
        .energy_data
        .iter()
        .enumerate()
        .map(|(i, r)| (i as f64, r.predicted_consumption))
        .collect();

    let y_bounds = style::auto_bounds_y(&actual, &predicted);
    let x_hi = (actual.len().saturating_sub(1) as f64).max(1.0);

    let datasets = vec![
        Dataset::default()
            .name("Actual")
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(style::ACTUAL_COLOR))
            .data(&actual),
        Dataset::default()
            .name("Predicted")
            .marker(symbols::Marker::Dot)
            .style(Style::default().fg(style::PREDICTED_COLOR))
            .data(&predicted),
    ];

    let x_label_lo = app.energy_data.first().map_or_else(String::new, |r| clock(r.timestamp));
    let x_label_hi = app.energy_data.last().map_or_else(String::new, |r| clock(r.timestamp));
    let y_label_lo = format!("{:.1}", y_bounds[0]);
    let y_label_hi = format!("{:.1}", y_bounds[1]);

    let title = if app.loading {
        " Loading... "
    } else {
        " Energy Consumption vs. Predictions "
    };
    let chart = Chart::new(datasets)
        .block(titled(title))
        .x_axis(
            Axis::default()
                .title("time")
                .bounds([0.0, x_hi])
                .labels(vec![x_label_lo, x_label_hi]),
        )
        .y_axis(
            Axis::default()
                .title("kW")
                .bounds(y_bounds)
                .labels(vec![y_label_lo, y_label_hi]),
        );

    frame.render_widget(chart, area);
}

/// Upcoming predictions, one per line.
fn render_predictions(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = if app.predictions.is_empty() {
        vec![Line::from("  No upcoming predictions")]
    } else {
        app.predictions
            .iter()
            .map(|r| {
                Line::from(format!(
                    "  {}  predicted={:>7.1} kW  temp={:>5.1} °C",
                    clock(r.timestamp),
                    r.predicted_consumption,
                    r.temperature,
                ))
            })
            .collect()
    };
    frame.render_widget(Paragraph::new(lines).block(titled(" AI Predictions ")), area);
}

/// Settings form with per-field validation messages.
fn render_settings(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.settings;
    let mut lines = Vec::new();
    for field in SettingsField::ALL {
        let value = match field {
            SettingsField::Name => form.name.clone(),
            SettingsField::TargetTemp => form.target_temp.clone(),
            SettingsField::PeakThreshold => form.peak_threshold.clone(),
            SettingsField::AutoAdjust => {
                let state = if form.auto_adjust { "[x] on" } else { "[ ] off" };
                state.to_string()
            }
        };
        let focused = form.focus == field;
        let marker = if focused { "▶ " } else { "  " };
        let label_style = if focused {
            Style::default().fg(style::FOCUS).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:<28}", field.label()), label_style),
            Span::raw(value),
        ]));
        if let Some(msg) = form.error_for(field) {
            lines.push(Line::from(Span::styled(
                format!("    {msg}"),
                Style::default().fg(style::ERROR),
            )));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from("  Enter: Save Changes"));

    frame.render_widget(Paragraph::new(lines).block(titled(" Building Configuration ")), area);
}

/// Footer with the latest notice or keybinding hints.
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let span = match &app.notice {
        Some(notice) => Span::styled(
            format!(" {}", notice.text),
            Style::default().fg(if notice.is_error {
                style::ERROR
            } else {
                style::ACTIVE
            }),
        ),
        None if app.tab == Tab::Settings => Span::styled(
            " Tab/↑↓:Field  Space:Toggle  Enter:Save  Esc:Back",
            Style::default().fg(style::FOOTER_FG),
        ),
        None => Span::styled(
            " q:Quit  o:Optimize  r:Refresh  b:Building  1/2/3:Tab",
            Style::default().fg(style::FOOTER_FG),
        ),
    };
    frame.render_widget(Paragraph::new(Line::from(span)), area);
}
