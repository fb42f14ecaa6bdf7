/// Draft input plus Send button. Returns `true` when the user submits.
///
/// The input is disabled while loading; Send also while the draft is blank.
pub fn render(ui: &mut egui::Ui, draft: &mut String, loading: bool) -> bool {
    let can_send = !loading && !draft.trim().is_empty();
    let mut send = false;

    ui.horizontal(|ui| {
        let input = egui::TextEdit::singleline(draft)
            .hint_text("Type your message...")
            .desired_width(ui.available_width() - 70.0);
        let response = ui.add_enabled(!loading, input);

        if ui.add_enabled(can_send, egui::Button::new("Send")).clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
        }
    });

    send
}
