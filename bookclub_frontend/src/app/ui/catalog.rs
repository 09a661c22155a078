use eframe::egui::{self, Color32, RichText};

use crate::models::Book;

use super::super::BookclubApp;

const PAGE_SIZES: [usize; 3] = [5, 10, 20];

/// Case-insensitive title/author filter, the catalog counterpart of the
/// review projector's pure shape.
pub(crate) fn matches_search(book: &Book, term: &str) -> bool {
    if term.trim().is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    book.title
        .as_deref()
        .is_some_and(|title| title.to_lowercase().contains(&term))
        || book.author_name.join(", ").to_lowercase().contains(&term)
}

fn info_line(ui: &mut egui::Ui, label: &str, value: Option<String>) {
    ui.horizontal_wrapped(|ui| {
        ui.label(RichText::new(format!("{label}:")).strong());
        ui.label(value.unwrap_or_else(|| "No information".to_string()));
    });
}

pub(crate) fn joined_or_none(values: &[String]) -> Option<String> {
    (!values.is_empty()).then(|| values.join(", "))
}

impl BookclubApp {
    pub(crate) fn render_catalog(&mut self, ui: &mut egui::Ui) {
        ui.heading("Book List");
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            ui.label("Search");
            ui.add(
                egui::TextEdit::singleline(&mut self.search_term)
                    .hint_text("Input author or book name you wanna search...")
                    .desired_width(320.0),
            );
            egui::ComboBox::from_id_salt("catalog-page-size")
                .selected_text(format!("View {} items", self.catalog_page_size))
                .show_ui(ui, |ui| {
                    for size in PAGE_SIZES {
                        if ui
                            .selectable_value(
                                &mut self.catalog_page_size,
                                size,
                                format!("View {size} items"),
                            )
                            .clicked()
                        {
                            self.catalog_page = 1;
                        }
                    }
                });
        });
        ui.separator();

        if self.books_loading && self.books.is_empty() {
            ui.add(egui::Spinner::new());
            return;
        }
        if let Some(err) = self.books_error.clone() {
            ui.colored_label(Color32::LIGHT_RED, err);
            if ui.button("Retry").clicked() {
                self.spawn_load_books();
            }
            ui.separator();
        }

        let filtered: Vec<Book> = self
            .books
            .iter()
            .filter(|book| matches_search(book, &self.search_term))
            .cloned()
            .collect();

        let page_size = self.catalog_page_size.max(1);
        let total_pages = filtered.len().div_ceil(page_size);
        if self.catalog_page == 0 || self.catalog_page > total_pages {
            self.catalog_page = 1;
        }
        let start = (self.catalog_page - 1) * page_size;
        let page_books: Vec<Book> = filtered
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect();

        let mut book_to_open: Option<Book> = None;

        egui::ScrollArea::vertical().show(ui, |ui| {
            if page_books.is_empty() {
                ui.label("No books matched your search.");
            }
            for book in &page_books {
                egui::Frame::group(ui.style())
                    .fill(ui.visuals().extreme_bg_color)
                    .inner_margin(egui::vec2(12.0, 8.0))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            self.cover_image(ui, book.cover_i, 60.0);
                            ui.vertical(|ui| {
                                let title = book.title.as_deref().unwrap_or("(untitled)");
                                if ui.button(RichText::new(title).strong()).clicked() {
                                    book_to_open = Some(book.clone());
                                }
                                info_line(ui, "Author", joined_or_none(&book.author_name));
                                info_line(ui, "Publisher", book.publisher.first().cloned());
                                info_line(
                                    ui,
                                    "Published year",
                                    book.first_publish_year.map(|y| y.to_string()),
                                );
                                info_line(ui, "Language", joined_or_none(&book.language));
                            });
                        });
                    });
            }
        });

        if let Some(book) = book_to_open {
            self.open_detail(&book);
            return;
        }

        if total_pages > 1 {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(self.catalog_page > 1, egui::Button::new("Prev"))
                    .clicked()
                {
                    self.catalog_page -= 1;
                }
                for page in 1..=total_pages {
                    if ui
                        .selectable_label(self.catalog_page == page, page.to_string())
                        .clicked()
                    {
                        self.catalog_page = page;
                    }
                }
                if ui
                    .add_enabled(self.catalog_page < total_pages, egui::Button::new("Next"))
                    .clicked()
                {
                    self.catalog_page += 1;
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn book(title: &str, authors: &[&str]) -> Book {
        Book {
            key: "/works/OL1W".into(),
            title: Some(title.into()),
            author_name: authors.iter().map(|a| a.to_string()).collect(),
            ..Book::default()
        }
    }

    #[test]
    fn search_matches_title_and_author_case_insensitively() {
        let rust_book = book("The Rust Programming Language", &["Steve Klabnik"]);
        assert!(matches_search(&rust_book, "rust"));
        assert!(matches_search(&rust_book, "KLABNIK"));
        assert!(!matches_search(&rust_book, "python"));
    }

    #[test]
    fn empty_search_matches_everything_including_untitled() {
        let mut untitled = book("x", &[]);
        untitled.title = None;
        assert!(matches_search(&untitled, ""));
        assert!(matches_search(&untitled, "   "));
        assert!(!matches_search(&untitled, "anything"));
    }

    #[test]
    fn joined_or_none_distinguishes_missing_from_present() {
        assert_eq!(joined_or_none(&[]), None);
        assert_eq!(
            joined_or_none(&["en".into(), "fr".into()]),
            Some("en, fr".into())
        );
    }
}
