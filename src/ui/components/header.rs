use crate::common::ChannelStatus;

pub fn render(ui: &mut egui::Ui, loading: bool, status: ChannelStatus) {
    ui.horizontal(|ui| {
        ui.heading("Hyper-Talk");
        if loading {
            ui.label(
                egui::RichText::new("(connecting and loading messages...)")
                    .small()
                    .color(egui::Color32::from_rgb(59, 130, 246)),
            );
        }
    });

    let (color, text) = match status {
        ChannelStatus::Connecting => (egui::Color32::YELLOW, "Connecting to realtime..."),
        ChannelStatus::Subscribed => (egui::Color32::GREEN, "Live updates on"),
        ChannelStatus::Closed => (egui::Color32::GRAY, "Live updates off"),
    };
    ui.horizontal(|ui| {
        ui.colored_label(color, "●");
        ui.label(egui::RichText::new(text).weak());
    });
}
