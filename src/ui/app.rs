use tokio::sync::mpsc;

use crate::common::{NetworkCommand, NetworkEvent};

use super::components::{chat_area, header, input_bar};
use super::state::ChatState;

pub struct ChatApp {
    state: ChatState,
    command_sender: mpsc::Sender<NetworkCommand>,
    event_receiver: mpsc::Receiver<NetworkEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        command_sender: mpsc::Sender<NetworkCommand>,
        event_receiver: mpsc::Receiver<NetworkEvent>,
    ) -> Self {
        Self {
            state: ChatState::new(),
            command_sender,
            event_receiver,
        }
    }

    fn handle_network_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.state.apply(event);
        }
    }

    fn send_draft(&mut self) {
        let Some(message) = self.state.begin_send() else {
            return;
        };

        if let Err(err) = self
            .command_sender
            .try_send(NetworkCommand::SendMessage(message))
        {
            log::error!("Error sending message: {err}");
        }
    }

    fn teardown(&mut self) {
        if self.state.is_torn_down() {
            return;
        }

        self.state.teardown();
        if let Err(err) = self.command_sender.try_send(NetworkCommand::Shutdown) {
            log::warn!("Failed to send shutdown to network: {err}");
        }
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.teardown();
        }
        self.handle_network_events();

        egui::TopBottomPanel::top("chat_header").show(ctx, |ui| {
            ui.add_space(4.0);
            header::render(ui, self.state.is_loading(), self.state.channel_status());
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("chat_input").show(ctx, |ui| {
            ui.add_space(6.0);
            let loading = self.state.is_loading();
            if input_bar::render(ui, &mut self.state.draft, loading) {
                self.send_draft();
            }
            ui.add_space(6.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            chat_area::render(ui, &mut self.state);
        });

        ctx.request_repaint();
    }
}

impl Drop for ChatApp {
    fn drop(&mut self) {
        self.teardown();
    }
}
