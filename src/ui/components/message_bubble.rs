use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

use crate::common::{Message, Sender};

pub const INVALID_TIME: &str = "Invalid Date";

const BUBBLE_MAX_WIDTH: f32 = 420.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

/// Visual treatment of one message, derived from its sender only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleStyle {
    pub alignment: Alignment,
    pub fill: egui::Color32,
    pub text_color: egui::Color32,
    pub time_color: egui::Color32,
}

pub fn style_for(sender: Sender) -> BubbleStyle {
    match sender {
        Sender::User => BubbleStyle {
            alignment: Alignment::Right,
            fill: egui::Color32::from_rgb(37, 99, 235),
            text_color: egui::Color32::WHITE,
            time_color: egui::Color32::from_rgb(191, 219, 254),
        },
        Sender::Ai | Sender::System => BubbleStyle {
            alignment: Alignment::Left,
            fill: egui::Color32::from_rgb(229, 231, 235),
            text_color: egui::Color32::from_rgb(31, 41, 55),
            time_color: egui::Color32::from_rgb(156, 163, 175),
        },
    }
}

/// `HH:MM` in local time.
pub fn time_label(timestamp: &str) -> String {
    time_label_in(timestamp, &Local)
}

/// `HH:MM` in `tz`, or [`INVALID_TIME`] when the timestamp does not parse.
///
/// Timestamps without an offset are read as wall-clock time in `tz`.
pub fn time_label_in<Tz: TimeZone>(timestamp: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let timestamp = timestamp.trim();

    let parsed = DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(tz))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .and_then(|naive| tz.from_local_datetime(&naive).earliest())
        });

    match parsed {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => INVALID_TIME.to_string(),
    }
}

/// Single-line form used by the headless `tail` mode.
pub fn plain_line(message: &Message, width: usize) -> String {
    let time = time_label(&message.timestamp);
    match style_for(message.sender).alignment {
        Alignment::Right => format!("{:>width$}", format!("{} [{time}]", message.text)),
        Alignment::Left => format!("{}: {} [{time}]", sender_name(message.sender), message.text),
    }
}

fn sender_name(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "you",
        Sender::Ai => "ai",
        Sender::System => "system",
    }
}

pub fn render(ui: &mut egui::Ui, message: &Message) {
    let style = style_for(message.sender);
    let layout = match style.alignment {
        Alignment::Right => egui::Layout::right_to_left(egui::Align::TOP),
        Alignment::Left => egui::Layout::left_to_right(egui::Align::TOP),
    };

    ui.with_layout(layout, |ui| {
        egui::Frame::new()
            .fill(style.fill)
            .corner_radius(egui::CornerRadius::same(8))
            .inner_margin(egui::Margin::same(10))
            .show(ui, |ui| {
                ui.set_max_width(BUBBLE_MAX_WIDTH);
                ui.vertical(|ui| {
                    ui.label(egui::RichText::new(&message.text).color(style.text_color));
                    ui.label(
                        egui::RichText::new(time_label(&message.timestamp))
                            .small()
                            .color(style.time_color),
                    );
                });
            });
    });
}
