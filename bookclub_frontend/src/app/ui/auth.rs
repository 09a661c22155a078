use eframe::egui::{self, Color32, RichText, TextEdit};

use super::super::state::{LoginState, RegisterState};
use super::super::BookclubApp;

pub enum AuthAction {
    None,
    SwitchToLogin,
    SwitchToRegister,
}

fn form_frame(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    ui.vertical_centered(|ui| {
        ui.set_max_width(360.0);
        ui.add_space(24.0);
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .inner_margin(egui::vec2(16.0, 12.0))
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new(title).heading());
                });
                ui.add_space(8.0);
                add_contents(ui);
            });
    });
}

fn labeled_input(ui: &mut egui::Ui, label: &str, value: &mut String, password: bool) {
    ui.label(label);
    ui.add(
        TextEdit::singleline(value)
            .password(password)
            .desired_width(f32::INFINITY),
    );
    ui.add_space(6.0);
}

impl BookclubApp {
    pub(crate) fn render_login(
        &mut self,
        ui: &mut egui::Ui,
        state: &mut LoginState,
    ) -> AuthAction {
        let mut action = AuthAction::None;
        form_frame(ui, "Please sign in", |ui| {
            if let Some(notice) = &state.notice {
                ui.label(RichText::new(notice).color(Color32::LIGHT_GREEN));
                ui.add_space(6.0);
            }
            if let Some(err) = &state.error {
                ui.colored_label(Color32::LIGHT_RED, err);
                ui.add_space(6.0);
            }

            labeled_input(ui, "Username:", &mut state.username, false);
            labeled_input(ui, "Password:", &mut state.password, true);

            if state.submitting {
                ui.add(egui::Spinner::new());
            } else {
                if ui
                    .add_sized([ui.available_width(), 28.0], egui::Button::new("Sign in"))
                    .clicked()
                {
                    self.submit_login(state);
                }
                if ui.link("Sign up").clicked() {
                    action = AuthAction::SwitchToRegister;
                }
            }
        });
        action
    }

    pub(crate) fn render_register(
        &mut self,
        ui: &mut egui::Ui,
        state: &mut RegisterState,
    ) -> AuthAction {
        let mut action = AuthAction::None;
        form_frame(ui, "Sign Up", |ui| {
            if let Some(err) = &state.error {
                ui.colored_label(Color32::LIGHT_RED, err);
                ui.add_space(6.0);
            }

            labeled_input(ui, "Username:", &mut state.username, false);
            labeled_input(ui, "Password:", &mut state.password, true);
            labeled_input(ui, "Confirm password:", &mut state.confirm_password, true);

            if state.submitting {
                ui.add(egui::Spinner::new());
            } else {
                if ui
                    .add_sized([ui.available_width(), 28.0], egui::Button::new("Register"))
                    .clicked()
                {
                    self.submit_register(state);
                }
                if ui.link("Back to sign in").clicked() {
                    action = AuthAction::SwitchToLogin;
                }
            }
        });
        action
    }
}
