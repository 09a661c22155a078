use eframe::egui::{self, Color32, RichText};

use crate::models::{Book, Review};
use crate::projection::{self, SortKey};

use super::super::state::{DeleteTarget, DetailState};
use super::super::{format_timestamp, BookclubApp};
use super::catalog::joined_or_none;

const REVIEWS_PER_PAGE: usize = 5;

pub enum DetailAction {
    None,
    GoBack,
}

fn field(ui: &mut egui::Ui, label: &str, value: Option<String>) {
    ui.horizontal_wrapped(|ui| {
        ui.label(RichText::new(format!("{label}:")).strong());
        ui.label(value.unwrap_or_else(|| "No information".to_string()));
    });
}

impl BookclubApp {
    pub(crate) fn render_detail(
        &mut self,
        ui: &mut egui::Ui,
        state: &mut DetailState,
    ) -> DetailAction {
        let mut action = DetailAction::None;

        ui.horizontal(|ui| {
            if ui.button("← Back to catalog").clicked() {
                action = DetailAction::GoBack;
            }
            ui.separator();
            ui.label(RichText::new("Book Detailed Information").heading());
        });
        ui.add_space(6.0);

        egui::ScrollArea::vertical().show(ui, |ui| {
            self.render_book_card(ui, state);
            ui.add_space(10.0);
            self.render_reviews(ui, state);
        });

        action
    }

    fn render_book_card(&mut self, ui: &mut egui::Ui, state: &DetailState) {
        if state.book_loading {
            ui.add(egui::Spinner::new());
            return;
        }
        let Some(book) = state.book.clone() else {
            if state.book_missing {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.label("The book detailed information was not found.");
                });
            }
            return;
        };
        self.book_card(ui, &book);
    }

    fn book_card(&mut self, ui: &mut egui::Ui, book: &Book) {
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .inner_margin(egui::vec2(12.0, 8.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.cover_image(ui, book.cover_i, 160.0);
                    ui.vertical(|ui| {
                        ui.label(
                            RichText::new(book.title.as_deref().unwrap_or("(untitled)"))
                                .heading(),
                        );
                        ui.add_space(4.0);
                        field(ui, "Author", joined_or_none(&book.author_name));
                        field(ui, "Publisher", book.publisher.first().cloned());
                        field(
                            ui,
                            "Published year",
                            book.first_publish_year.map(|y| y.to_string()),
                        );
                        field(ui, "Language", joined_or_none(&book.language));
                        field(
                            ui,
                            "Number of pages",
                            book.number_of_pages.map(|n| n.to_string()),
                        );
                        field(ui, "Subject", joined_or_none(&book.subject));
                    });
                });
            });
    }

    fn render_reviews(&mut self, ui: &mut egui::Ui, state: &mut DetailState) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Reviews").strong().size(16.0));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                egui::ComboBox::from_id_salt("review-sort")
                    .selected_text(state.sort.label())
                    .show_ui(ui, |ui| {
                        for key in SortKey::ALL {
                            ui.selectable_value(&mut state.sort, key, key.label());
                        }
                    });
                ui.label("Sort by");
            });
        });
        ui.add_space(4.0);

        // Composer for a new review.
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut state.review_draft)
                    .desired_rows(3)
                    .desired_width(f32::INFINITY)
                    .hint_text("Please leave a review..."),
            );
            ui.horizontal(|ui| {
                if state.review_sending {
                    ui.add(egui::Spinner::new());
                } else {
                    let can_send = !state.review_draft.trim().is_empty();
                    if ui
                        .add_enabled(can_send, egui::Button::new("Register review"))
                        .clicked()
                    {
                        self.submit_review(state);
                    }
                }
            });
        });

        if let Some(err) = state.thread_error.clone() {
            ui.colored_label(Color32::LIGHT_RED, err);
            if ui.button("Retry").clicked() {
                state.thread_error = None;
                self.spawn_load_discussion(&state.book_id);
            }
        }
        if !state.thread_loaded {
            ui.add(egui::Spinner::new());
            return;
        }

        let projected = projection::project(&state.thread, state.sort, state.page, REVIEWS_PER_PAGE);
        // The projector clamps back to page 1 when a deletion shrank the
        // thread under the active page.
        state.page = projected.page;

        if projected.reviews.is_empty() {
            ui.label("No reviews yet. Be the first to leave one.");
        }
        for review in &projected.reviews {
            self.review_card(ui, state, review);
        }

        if projected.total_pages > 1 {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(state.page > 1, egui::Button::new("Prev"))
                    .clicked()
                {
                    state.page -= 1;
                }
                for page in 1..=projected.total_pages {
                    if ui
                        .selectable_label(state.page == page, page.to_string())
                        .clicked()
                    {
                        state.page = page;
                    }
                }
                if ui
                    .add_enabled(state.page < projected.total_pages, egui::Button::new("Next"))
                    .clicked()
                {
                    state.page += 1;
                }
            });
        }
    }

    fn review_card(&mut self, ui: &mut egui::Ui, state: &mut DetailState, review: &Review) {
        egui::Frame::group(ui.style())
            .fill(ui.visuals().extreme_bg_color)
            .inner_margin(egui::vec2(12.0, 8.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(format!(
                        "{} • {}",
                        review.author,
                        format_timestamp(&review.created_at)
                    ));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if self.session.owns(&review.author)
                            && state.editing_review != Some(review.id)
                        {
                            if ui.button("Delete").clicked() {
                                self.request_delete(
                                    state,
                                    DeleteTarget::Review {
                                        review_id: review.id,
                                    },
                                );
                            }
                            if ui.button("Update").clicked() {
                                self.start_edit_review(state, review);
                            }
                        }
                    });
                });

                if state.editing_review == Some(review.id) {
                    ui.add(
                        egui::TextEdit::multiline(&mut state.edit_draft)
                            .desired_rows(3)
                            .desired_width(f32::INFINITY),
                    );
                    ui.horizontal(|ui| {
                        if ui.button("Check").clicked() {
                            self.submit_edit_review(state);
                        }
                        if ui.button("Cancel").clicked() {
                            state.editing_review = None;
                            state.edit_draft.clear();
                        }
                    });
                } else {
                    ui.label(&review.content);
                }

                ui.add_space(4.0);
                ui.horizontal(|ui| {
                    let liked = self.session.has_liked(&review.likes);
                    if ui
                        .selectable_label(liked, format!("👍 Like ({})", review.likes.len()))
                        .clicked()
                    {
                        self.toggle_like(state, review.id);
                    }
                    if ui
                        .button(format!("💬 Reply ({})", review.replies.len()))
                        .clicked()
                    {
                        self.start_reply(state, review.id);
                    }
                });

                if state.replying_to == Some(review.id) {
                    ui.add(
                        egui::TextEdit::multiline(&mut state.reply_draft)
                            .desired_rows(2)
                            .desired_width(f32::INFINITY)
                            .hint_text("Please leave a reply..."),
                    );
                    ui.horizontal(|ui| {
                        if state.reply_sending {
                            ui.add(egui::Spinner::new());
                        } else {
                            let can_send = !state.reply_draft.trim().is_empty();
                            if ui
                                .add_enabled(can_send, egui::Button::new("Register reply"))
                                .clicked()
                            {
                                self.submit_reply(state);
                            }
                            if ui.button("Cancel").clicked() {
                                state.replying_to = None;
                                state.reply_draft.clear();
                            }
                        }
                    });
                }

                for reply in &review.replies {
                    ui.indent(("reply", reply.id), |ui| {
                        egui::Frame::group(ui.style()).show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(
                                    RichText::new(format!(
                                        "{} • {}",
                                        reply.author,
                                        format_timestamp(&reply.created_at)
                                    ))
                                    .small(),
                                );
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        if self.session.owns(&reply.author)
                                            && state.editing_reply != Some(reply.id)
                                        {
                                            if ui.button("Delete").clicked() {
                                                self.request_delete(
                                                    state,
                                                    DeleteTarget::Reply {
                                                        review_id: review.id,
                                                        reply_id: reply.id,
                                                    },
                                                );
                                            }
                                            if ui.button("Update").clicked() {
                                                self.start_edit_reply(
                                                    state,
                                                    reply.id,
                                                    &reply.content,
                                                );
                                            }
                                        }
                                    },
                                );
                            });

                            if state.editing_reply == Some(reply.id) {
                                ui.add(
                                    egui::TextEdit::multiline(&mut state.edit_reply_draft)
                                        .desired_rows(2)
                                        .desired_width(f32::INFINITY),
                                );
                                ui.horizontal(|ui| {
                                    let can_send =
                                        !state.edit_reply_draft.trim().is_empty();
                                    if ui
                                        .add_enabled(can_send, egui::Button::new("Check"))
                                        .clicked()
                                    {
                                        self.submit_edit_reply(state);
                                    }
                                    if ui.button("Cancel").clicked() {
                                        state.editing_reply = None;
                                        state.edit_reply_draft.clear();
                                    }
                                });
                            } else {
                                ui.label(&reply.content);
                            }
                        });
                    });
                }
            });
    }
}
