use crate::ui::state::ChatState;

use super::message_bubble;

pub fn render(ui: &mut egui::Ui, state: &mut ChatState) {
    let scroll_to_latest = state.take_scroll_request();

    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            if state.messages().is_empty() && !state.is_loading() {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.label(egui::RichText::new("No messages yet. Type the first one!").weak());
                });
            }

            for message in state.messages() {
                message_bubble::render(ui, message);
                ui.add_space(6.0);
            }

            if scroll_to_latest {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });
}
