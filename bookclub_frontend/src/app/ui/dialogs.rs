use eframe::egui::{self, Context};

use super::super::state::{DeleteTarget, DetailState};
use super::super::BookclubApp;

impl BookclubApp {
    /// Deletes never fire without this explicit confirmation step.
    pub(crate) fn render_delete_dialog(&mut self, ctx: &Context, state: &mut DetailState) {
        let Some(target) = state.confirm_delete else {
            return;
        };
        let prompt = match target {
            DeleteTarget::Review { .. } => "Are you sure you want to delete your review?",
            DeleteTarget::Reply { .. } => "Are you sure you want to delete your reply?",
        };

        let mut proceed = false;
        let mut cancel = false;
        egui::Window::new("Confirm deletion")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(prompt);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        proceed = true;
                    }
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                });
            });

        if proceed {
            self.confirm_delete(state);
        } else if cancel {
            state.confirm_delete = None;
        }
    }
}
