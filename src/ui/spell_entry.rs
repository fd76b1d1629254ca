use gettextrs::gettext;
use gtk::glib::subclass::Signal;
use gtk::prelude::*;
use gtk::subclass::prelude::*;
use gtk::{gdk, gio, glib, graphene};
use once_cell::sync::Lazy;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use crate::spell::iso_codes::CodeTable;
use crate::spell::locale;
use crate::spell::tokenize::byte_to_char;
use crate::spell::{Broker, SpellError, Speller, WordSpan};

const SUGGESTIONS_PER_MENU: usize = 10;

mod imp {
    use super::*;

    #[derive(Debug)]
    pub struct SpellEntry {
        pub speller: RefCell<Speller>,
        pub underline_color: RefCell<gdk::RGBA>,
        // character position the context menu refers to
        pub mark_character: Cell<usize>,
        pub spelling_menu: gio::Menu,
    }

    impl Default for SpellEntry {
        fn default() -> Self {
            Self {
                speller: RefCell::new(Speller::new(Broker::new())),
                underline_color: RefCell::new(gdk::RGBA::RED),
                mark_character: Cell::new(0),
                spelling_menu: gio::Menu::new(),
            }
        }
    }

    #[glib::object_subclass]
    impl ObjectSubclass for SpellEntry {
        const NAME: &'static str = "SpellEntry";
        type Type = super::SpellEntry;
        type ParentType = gtk::Entry;

        fn class_init(klass: &mut Self::Class) {
            klass.install_action(
                "spell.replace",
                Some(&*<(String, String)>::static_variant_type()),
                |entry, _, param| {
                    if let Some((lang, word)) = param.and_then(|p| p.get::<(String, String)>()) {
                        entry.imp().replace_word(&lang, &word);
                    }
                },
            );
            klass.install_action(
                "spell.add-to-dictionary",
                Some(glib::VariantTy::STRING),
                |entry, _, param| {
                    if let Some(lang) = param.and_then(|p| p.get::<String>()) {
                        entry.imp().add_to_dictionary(&lang);
                    }
                },
            );
            klass.install_action("spell.ignore-all", None, |entry, _, _| {
                entry.imp().ignore_all();
            });
        }
    }

    impl ObjectImpl for SpellEntry {
        fn properties() -> &'static [glib::ParamSpec] {
            static PROPERTIES: Lazy<Vec<glib::ParamSpec>> = Lazy::new(|| {
                vec![
                    glib::ParamSpecBoolean::builder("checked")
                        .nick("Checked")
                        .blurb("If checking spelling is enabled")
                        .default_value(true)
                        .build(),
                    glib::ParamSpecBoxed::builder::<gdk::RGBA>("underline-color")
                        .nick("Underline Color")
                        .blurb("Underline color of misspelled words")
                        .build(),
                ]
            });
            PROPERTIES.as_ref()
        }

        fn set_property(&self, _id: usize, value: &glib::Value, pspec: &glib::ParamSpec) {
            let obj = self.obj();
            match pspec.name() {
                "checked" => {
                    if let Ok(checked) = value.get::<bool>() {
                        obj.set_checked(checked);
                    }
                }
                "underline-color" => {
                    if let Ok(color) = value.get::<Option<gdk::RGBA>>() {
                        obj.set_underline_color(&color.unwrap_or(gdk::RGBA::RED));
                    }
                }
                name => log::warn!("Invalid property {} for SpellEntry", name),
            }
        }

        fn property(&self, _id: usize, pspec: &glib::ParamSpec) -> glib::Value {
            match pspec.name() {
                "checked" => self.speller.borrow().is_checked().to_value(),
                "underline-color" => self.underline_color.borrow().to_value(),
                name => {
                    log::warn!("Invalid property {} for SpellEntry", name);
                    pspec.default_value().clone()
                }
            }
        }

        fn signals() -> &'static [Signal] {
            // Handlers return true if the word is misspelled. Emission stops
            // at the first handler that accepts the word.
            static SIGNALS: Lazy<Vec<Signal>> = Lazy::new(|| {
                vec![Signal::builder("word-check")
                    .param_types([String::static_type()])
                    .return_type::<bool>()
                    .run_last()
                    .class_handler(|_token, args| {
                        let entry = args[0].get::<super::SpellEntry>().ok()?;
                        let word = args[1].get::<String>().ok()?;
                        let misspelled = entry.imp().speller.borrow().is_misspelled(&word);
                        Some(misspelled.to_value())
                    })
                    .accumulator(|_hint, acc, value| {
                        let misspelled = value.get::<bool>().unwrap_or(false);
                        *acc = value.clone();
                        misspelled
                    })
                    .build()]
            });
            SIGNALS.as_ref()
        }

        fn constructed(&self) {
            self.parent_constructed();
            let obj = self.obj();

            self.speller
                .borrow_mut()
                .activate_defaults(&locale::user_spell_languages());

            obj.set_extra_menu(Some(&self.spelling_menu));
            obj.connect_changed(|entry| entry.imp().recheck_all());

            // Secondary click: the menu refers to the word under the pointer
            let click = gtk::GestureClick::new();
            click.set_button(gdk::BUTTON_SECONDARY);
            click.set_propagation_phase(gtk::PropagationPhase::Capture);
            let entry = obj.downgrade();
            click.connect_pressed(move |_, _, x, _| {
                if let Some(entry) = entry.upgrade() {
                    let imp = entry.imp();
                    imp.mark_character.set(imp.position_at(x));
                    imp.update_spelling_menu();
                }
            });
            obj.add_controller(click);

            // Menu key or Shift+F10: the menu refers to the word at the cursor
            let keys = gtk::EventControllerKey::new();
            keys.set_propagation_phase(gtk::PropagationPhase::Capture);
            let entry = obj.downgrade();
            keys.connect_key_pressed(move |_, key, _, state| {
                let opens_menu = key == gdk::Key::Menu
                    || (key == gdk::Key::F10 && state.contains(gdk::ModifierType::SHIFT_MASK));
                if opens_menu {
                    if let Some(entry) = entry.upgrade() {
                        let imp = entry.imp();
                        imp.mark_character.set(entry.position().max(0) as usize);
                        imp.update_spelling_menu();
                    }
                }
                glib::Propagation::Proceed
            });
            obj.add_controller(keys);
        }
    }

    impl WidgetImpl for SpellEntry {}
    impl EntryImpl for SpellEntry {}

    impl SpellEntry {
        /// Splits the current text and underlines every misspelled word.
        pub fn recheck_all(&self) {
            let obj = self.obj();
            let text = obj.text();

            let words = {
                let mut speller = self.speller.borrow_mut();
                speller.split(&text);
                speller.checkable_words()
            };

            // No borrow is held here: word-check handlers may call back
            // into the entry.
            let misspelled: Vec<WordSpan> = words
                .into_iter()
                .filter(|span| self.word_misspelled(span.slice(&text)))
                .collect();

            obj.set_attributes(&self.underline_attributes(&misspelled));
        }

        pub fn clear_underlines(&self) {
            self.obj().set_attributes(&pango::AttrList::new());
        }

        fn word_misspelled(&self, word: &str) -> bool {
            if word.is_empty() {
                return false;
            }
            self.obj().emit_by_name::<bool>("word-check", &[&word])
        }

        fn underline_attributes(&self, spans: &[WordSpan]) -> pango::AttrList {
            let attrs = pango::AttrList::new();
            let color = self.underline_color.borrow();
            let to_u16 = |channel: f32| (channel.clamp(0.0, 1.0) * 65535.0) as u16;

            for span in spans {
                let mut underline = pango::AttrInt::new_underline(pango::Underline::Error);
                underline.set_start_index(span.start as u32);
                underline.set_end_index(span.end as u32);
                attrs.insert(underline);

                let mut underline_color = pango::AttrColor::new_underline_color(
                    to_u16(color.red()),
                    to_u16(color.green()),
                    to_u16(color.blue()),
                );
                underline_color.set_start_index(span.start as u32);
                underline_color.set_end_index(span.end as u32);
                attrs.insert(underline_color);
            }

            attrs
        }

        /// Character offset under the pointer. The text is laid out from the
        /// start of the inner text widget, so a horizontally scrolled entry
        /// falls back to the cursor position.
        fn position_at(&self, x: f64) -> usize {
            let obj = self.obj();
            let cursor = obj.position().max(0) as usize;
            let Some(text_widget) = obj.delegate().and_then(|d| d.downcast::<gtk::Text>().ok())
            else {
                return cursor;
            };
            let Some(point) =
                obj.compute_point(&text_widget, &graphene::Point::new(x as f32, 0.0))
            else {
                return cursor;
            };

            let text = obj.text();
            let layout = text_widget.create_pango_layout(Some(text.as_str()));
            if layout.pixel_size().0 > text_widget.width() {
                return cursor;
            }

            let (_, index, trailing) =
                layout.xy_to_index((point.x() * pango::SCALE as f32) as i32, 0);
            byte_to_char(&text, index.max(0) as usize) + trailing.max(0) as usize
        }

        fn word_at_mark(&self) -> Option<(WordSpan, String)> {
            let text = self.obj().text();
            let span = self
                .speller
                .borrow()
                .word_extents(&text, self.mark_character.get())?;
            if span.is_empty() {
                return None;
            }
            Some((span, span.slice(&text).to_string()))
        }

        /// Rebuilds the spelling part of the context menu for the word at
        /// the mark. The menu stays empty unless that word is misspelled.
        pub fn update_spelling_menu(&self) {
            self.spelling_menu.remove_all();

            let (checked, has_dictionaries) = {
                let speller = self.speller.borrow();
                (speller.is_checked(), speller.has_dictionaries())
            };
            if !checked || !has_dictionaries {
                return;
            }
            let Some((_, word)) = self.word_at_mark() else {
                return;
            };
            if !self.word_misspelled(&word) {
                return;
            }

            let suggestions = self.speller.borrow().suggestions(&word);
            let table = CodeTable::global();
            let spelling = spelling_menu(&word, &suggestions, |lang| table.language_name(lang));
            self.spelling_menu
                .append_submenu(Some(&gettext("Spelling Suggestions")), &spelling);
        }

        fn replace_word(&self, lang: &str, new_word: &str) {
            let Some((span, old_word)) = self.word_at_mark() else {
                return;
            };
            let obj = self.obj();
            let text = obj.text();
            let start = byte_to_char(&text, span.start) as i32;
            let end = byte_to_char(&text, span.end) as i32;

            let cursor =
                cursor_after_replace(obj.position(), text.chars().count() as i32, start, end);

            obj.delete_text(start, end);
            let mut position = start;
            obj.insert_text(new_word, &mut position);
            obj.set_position(cursor);

            self.speller
                .borrow()
                .store_replacement(lang, &old_word, new_word);
        }

        fn add_to_dictionary(&self, lang: &str) {
            let Some((_, word)) = self.word_at_mark() else {
                return;
            };
            if let Err(e) = self.speller.borrow().add_to_dictionary(lang, &word) {
                log::warn!("Could not add \"{}\" to the {} dictionary: {}", word, lang, e);
            }
            self.recheck_all();
        }

        fn ignore_all(&self) {
            let Some((_, word)) = self.word_at_mark() else {
                return;
            };
            self.speller.borrow().ignore_all(&word);
            self.recheck_all();
        }
    }
}

/// Where the cursor goes after the characters `start..end` of a text of
/// `text_len` characters are replaced: -1 (the end) if it was at the end,
/// the word start if it was inside the word, otherwise where it was.
fn cursor_after_replace(cursor: i32, text_len: i32, start: i32, end: i32) -> i32 {
    if cursor == text_len {
        -1
    } else if cursor > start && cursor <= end {
        start
    } else {
        cursor
    }
}

/// Suggestions for `word` followed by the dictionary actions. With several
/// languages the suggestions and "Add to Dictionary" get one submenu per
/// language.
fn spelling_menu(
    word: &str,
    suggestions: &[(String, Vec<String>)],
    language_name: impl Fn(&str) -> String,
) -> gio::Menu {
    let suggestion_section = gio::Menu::new();
    if let [(lang, words)] = suggestions {
        append_suggestions(&suggestion_section, lang, words);
    } else {
        for (lang, words) in suggestions {
            let submenu = gio::Menu::new();
            append_suggestions(&submenu, lang, words);
            suggestion_section.append_submenu(Some(&language_name(lang)), &submenu);
        }
    }

    let dictionary_section = gio::Menu::new();
    let add_label = gettext("Add \"{}\" to Dictionary").replacen("{}", word, 1);
    if let [(lang, _)] = suggestions {
        dictionary_section.append_item(&action_item(
            &add_label,
            "spell.add-to-dictionary",
            &lang.to_variant(),
        ));
    } else {
        let submenu = gio::Menu::new();
        for (lang, _) in suggestions {
            submenu.append_item(&action_item(
                &language_name(lang),
                "spell.add-to-dictionary",
                &lang.to_variant(),
            ));
        }
        dictionary_section.append_submenu(Some(&add_label), &submenu);
    }
    dictionary_section.append(Some(&gettext("Ignore All")), Some("spell.ignore-all"));

    let spelling = gio::Menu::new();
    spelling.append_section(None, &suggestion_section);
    spelling.append_section(None, &dictionary_section);
    spelling
}

fn action_item(label: &str, action: &str, target: &glib::Variant) -> gio::MenuItem {
    let item = gio::MenuItem::new(Some(label), None);
    item.set_action_and_target_value(Some(action), Some(target));
    item
}

// At most ten suggestions per level, the rest under "More..."
fn append_suggestions(menu: &gio::Menu, lang: &str, words: &[String]) {
    if words.is_empty() {
        menu.append(Some(&gettext("(no suggestions)")), None);
        return;
    }

    let mut level = menu.clone();
    for (i, word) in words.iter().enumerate() {
        if i != 0 && i % SUGGESTIONS_PER_MENU == 0 {
            let more = gio::Menu::new();
            level.append_submenu(Some(&gettext("More...")), &more);
            level = more;
        }
        let target = (lang.to_string(), word.clone()).to_variant();
        level.append_item(&action_item(word, "spell.replace", &target));
    }
}

glib::wrapper! {
    /// A text entry that underlines misspelled words and offers
    /// suggestions in its context menu.
    pub struct SpellEntry(ObjectSubclass<imp::SpellEntry>)
        @extends gtk::Entry, gtk::Widget,
        @implements gtk::Accessible, gtk::Buildable, gtk::ConstraintTarget,
                    gtk::CellEditable, gtk::Editable;
}

impl Default for SpellEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellEntry {
    pub fn new() -> Self {
        glib::Object::builder().build()
    }

    /// Language codes for which dictionaries are installed.
    pub fn languages(&self) -> Vec<String> {
        self.imp().speller.borrow().languages()
    }

    /// A friendly name such as "German (Switzerland)" for a language code.
    pub fn language_name(&self, lang: &str) -> String {
        CodeTable::global().language_name(lang)
    }

    pub fn language_is_active(&self, lang: &str) -> bool {
        self.imp().speller.borrow().is_active(lang)
    }

    pub fn activate_language(&self, lang: &str) -> Result<(), SpellError> {
        self.imp().speller.borrow_mut().activate(lang)?;
        self.imp().recheck_all();
        Ok(())
    }

    /// Deactivates `lang`, or every language for `None`.
    pub fn deactivate_language(&self, lang: Option<&str>) {
        self.imp().speller.borrow_mut().deactivate(lang);
        self.imp().recheck_all();
    }

    /// Checks only the given languages. On error the languages listed
    /// before the failing one remain active.
    pub fn set_active_languages<S: AsRef<str>>(&self, langs: &[S]) -> Result<(), SpellError> {
        let result = self.imp().speller.borrow_mut().set_active(langs);
        self.imp().recheck_all();
        result
    }

    pub fn active_languages(&self) -> Vec<String> {
        self.imp().speller.borrow().active_languages()
    }

    /// Activates the languages of the user's locale, or English if none of
    /// them has a dictionary. Done on construction already.
    pub fn activate_default_languages(&self) {
        self.imp()
            .speller
            .borrow_mut()
            .activate_defaults(&locale::user_spell_languages());
        self.imp().recheck_all();
    }

    pub fn is_checked(&self) -> bool {
        self.imp().speller.borrow().is_checked()
    }

    pub fn set_checked(&self, checked: bool) {
        let imp = self.imp();
        if imp.speller.borrow().is_checked() == checked {
            return;
        }
        imp.speller.borrow_mut().set_checked(checked);

        if checked {
            imp.recheck_all();
        } else {
            imp.clear_underlines();
        }
        self.notify("checked");
    }

    pub fn underline_color(&self) -> gdk::RGBA {
        *self.imp().underline_color.borrow()
    }

    pub fn set_underline_color(&self, color: &gdk::RGBA) {
        if self.underline_color() == *color {
            return;
        }
        self.imp().underline_color.replace(*color);
        self.imp().recheck_all();
        self.notify("underline-color");
    }

    /// Also searches `dir` for dictionaries.
    pub fn add_dictionary_dir(&self, dir: impl Into<PathBuf>) {
        self.imp().speller.borrow_mut().broker_mut().add_dir(dir);
    }

    /// Connects a handler deciding whether `word` is misspelled. Returning
    /// false accepts the word without consulting the dictionaries.
    pub fn connect_word_check<F: Fn(&Self, &str) -> bool + 'static>(
        &self,
        f: F,
    ) -> glib::SignalHandlerId {
        self.connect_local("word-check", false, move |values| {
            let entry = values[0].get::<Self>().ok()?;
            let word = values[1].get::<String>().ok()?;
            Some(f(&entry, &word).to_value())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(menu: &impl IsA<gio::MenuModel>, index: i32) -> Option<String> {
        menu.item_attribute_value(index, "label", Some(glib::VariantTy::STRING))
            .and_then(|value| value.get::<String>())
    }

    fn link(menu: &impl IsA<gio::MenuModel>, index: i32, name: &str) -> gio::MenuModel {
        menu.item_link(index, name).unwrap()
    }

    fn words(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("word{}", i)).collect()
    }

    #[test]
    fn suggestions_nest_ten_per_level() {
        let suggestions = vec![("en_US".to_string(), words(25))];
        let menu = spelling_menu("wrod", &suggestions, str::to_string);
        assert_eq!(menu.n_items(), 2);

        let first = link(&menu, 0, "section");
        assert_eq!(first.n_items(), 11);
        assert_eq!(label(&first, 0).as_deref(), Some("word0"));
        assert_eq!(label(&first, 10).as_deref(), Some("More..."));

        let second = link(&first, 10, "submenu");
        assert_eq!(second.n_items(), 11);
        assert_eq!(label(&second, 0).as_deref(), Some("word10"));

        let third = link(&second, 10, "submenu");
        assert_eq!(third.n_items(), 5);
        assert_eq!(label(&third, 4).as_deref(), Some("word24"));
    }

    #[test]
    fn exactly_ten_suggestions_need_no_more_item() {
        let suggestions = vec![("en_US".to_string(), words(10))];
        let menu = spelling_menu("wrod", &suggestions, str::to_string);
        let first = link(&menu, 0, "section");
        assert_eq!(first.n_items(), 10);
        assert!(first.item_link(9, "submenu").is_none());
    }

    #[test]
    fn empty_suggestions_show_a_disabled_item() {
        let suggestions = vec![("en_US".to_string(), Vec::new())];
        let menu = spelling_menu("qwzx", &suggestions, str::to_string);

        let first = link(&menu, 0, "section");
        assert_eq!(first.n_items(), 1);
        assert_eq!(label(&first, 0).as_deref(), Some("(no suggestions)"));
        assert!(first.item_attribute_value(0, "action", None).is_none());

        let actions = link(&menu, 1, "section");
        assert_eq!(actions.n_items(), 2);
        assert_eq!(label(&actions, 0).as_deref(), Some("Add \"qwzx\" to Dictionary"));
        assert!(actions.item_link(0, "submenu").is_none());
        assert_eq!(label(&actions, 1).as_deref(), Some("Ignore All"));
    }

    #[test]
    fn several_languages_get_one_submenu_each() {
        let suggestions = vec![
            ("en_US".to_string(), vec!["not".to_string()]),
            ("de_DE".to_string(), Vec::new()),
        ];
        let menu = spelling_menu("nto", &suggestions, |lang| format!("name of {}", lang));

        let first = link(&menu, 0, "section");
        assert_eq!(first.n_items(), 2);
        assert_eq!(label(&first, 0).as_deref(), Some("name of en_US"));
        assert_eq!(label(&first, 1).as_deref(), Some("name of de_DE"));
        assert_eq!(label(&link(&first, 0, "submenu"), 0).as_deref(), Some("not"));
        assert_eq!(
            label(&link(&first, 1, "submenu"), 0).as_deref(),
            Some("(no suggestions)")
        );

        let actions = link(&menu, 1, "section");
        let add = link(&actions, 0, "submenu");
        assert_eq!(add.n_items(), 2);
        assert_eq!(label(&add, 1).as_deref(), Some("name of de_DE"));
    }

    #[test]
    fn cursor_after_replacing_a_word() {
        // "I was nto!" with "nto" at 6..9, ten characters long
        assert_eq!(cursor_after_replace(10, 10, 6, 9), -1);
        assert_eq!(cursor_after_replace(8, 10, 6, 9), 6);
        assert_eq!(cursor_after_replace(9, 10, 6, 9), 6);
        assert_eq!(cursor_after_replace(6, 10, 6, 9), 6);
        assert_eq!(cursor_after_replace(2, 10, 6, 9), 2);
        // at the end wins over inside the word
        assert_eq!(cursor_after_replace(3, 3, 0, 3), -1);
    }
}
