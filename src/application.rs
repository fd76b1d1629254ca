use adw::prelude::*;
use adw::subclass::prelude::*;
use anyhow::{bail, Context};
use gettextrs::gettext;
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use spellentry::config;
use spellentry::settings::Settings;
use spellentry::SpellEntry;

mod imp {
    use super::*;

    #[derive(Debug, Default)]
    pub struct SpellEntryDemoApplication {
        pub startup_failed: Cell<bool>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for SpellEntryDemoApplication {
        const NAME: &'static str = "SpellEntryDemoApplication";
        type Type = super::SpellEntryDemoApplication;
        type ParentType = adw::Application;
    }

    impl ObjectImpl for SpellEntryDemoApplication {}

    impl ApplicationImpl for SpellEntryDemoApplication {
        fn activate(&self) {
            let app = self.obj();

            if let Some(window) = app.active_window() {
                window.present();
                return;
            }

            match build_window(&app, &resource_dir()) {
                Ok(window) => window.present(),
                Err(e) => {
                    log::error!("Failed to start: {:#}", e);
                    self.startup_failed.set(true);
                    app.quit();
                }
            }
        }
    }

    impl GtkApplicationImpl for SpellEntryDemoApplication {}
    impl AdwApplicationImpl for SpellEntryDemoApplication {}
}

glib::wrapper! {
    pub struct SpellEntryDemoApplication(ObjectSubclass<imp::SpellEntryDemoApplication>)
        @extends adw::Application, gtk::Application, gio::Application,
        @implements gio::ActionGroup, gio::ActionMap;
}

impl SpellEntryDemoApplication {
    pub fn new() -> Self {
        glib::Object::builder()
            .property("application-id", config::APP_ID)
            .property("flags", gio::ApplicationFlags::FLAGS_NONE)
            .build()
    }

    /// True if the window could not be built and the application quit.
    pub fn startup_failed(&self) -> bool {
        self.imp().startup_failed.get()
    }
}

/// Directory holding `main.ui` and `style.css`: next to the executable when
/// installed there, otherwise the bundled `data/` directory.
pub fn resource_dir() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    resource_dir_from(exe_dir)
}

fn resource_dir_from(exe_dir: Option<PathBuf>) -> PathBuf {
    exe_dir
        .filter(|dir| has_resources(dir))
        .unwrap_or_else(|| PathBuf::from(config::PKGDATADIR))
}

fn has_resources(dir: &Path) -> bool {
    dir.join(config::UI_FILE).is_file() && dir.join(config::CSS_FILE).is_file()
}

/// Builds the demo window from the layout in `dir`, adds a spell entry
/// styled with the stylesheet from `dir`, and lists the languages in the
/// layout's label.
pub fn build_window(app: &SpellEntryDemoApplication, dir: &Path) -> anyhow::Result<gtk::Window> {
    let ui_path = dir.join(config::UI_FILE);
    let builder = gtk::Builder::new();
    builder
        .add_from_file(&ui_path)
        .with_context(|| format!("failed to load {}", ui_path.display()))?;

    let window: gtk::Window = builder
        .object("window")
        .context("layout has no object named 'window'")?;
    let content: gtk::Box = builder
        .object("box")
        .context("layout has no object named 'box'")?;
    window.set_application(Some(app));

    // Registers the type with GObject before the first instance exists
    let _ = SpellEntry::static_type();
    let entry = SpellEntry::new();
    apply_settings(&entry, &Settings::load());
    entry.set_text(config::INITIAL_TEXT);
    content.append(&entry);

    let css_path = dir.join(config::CSS_FILE);
    let provider = load_stylesheet(&css_path)?;
    attach_stylesheet(&entry, &provider);

    let label: gtk::Label = builder
        .object("label")
        .context("layout has no object named 'label'")?;
    label.set_markup(&languages_markup(
        &entry.languages(),
        &entry.active_languages(),
    ));

    Ok(window)
}

fn apply_settings(entry: &SpellEntry, settings: &Settings) {
    for dir in &settings.dictionary_dirs {
        entry.add_dictionary_dir(dir.clone());
    }

    match &settings.languages {
        Some(languages) => {
            if let Err(e) = entry.set_active_languages(languages.as_slice()) {
                log::warn!("{}", e);
            }
        }
        None if !settings.dictionary_dirs.is_empty() => entry.activate_default_languages(),
        None => {}
    }

    if let Some(color) = settings.underline_rgba() {
        entry.set_underline_color(&color);
    }
}

/// Reads a stylesheet, failing on a missing file or any parsing error.
pub fn load_stylesheet(path: &Path) -> anyhow::Result<gtk::CssProvider> {
    let css = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let provider = gtk::CssProvider::new();
    let errors = Rc::new(RefCell::new(Vec::new()));
    let errors_clone = errors.clone();
    let handler = provider.connect_parsing_error(move |_, section, error| {
        errors_clone
            .borrow_mut()
            .push(format!("{}: {}", section.to_str(), error));
    });
    provider.load_from_string(&css);
    provider.disconnect(handler);

    let errors = errors.borrow();
    if let Some(first) = errors.first() {
        bail!("failed to parse {}: {}", path.display(), first);
    }
    Ok(provider)
}

// Widget-level providers only exist through the deprecated style context
#[allow(deprecated)]
fn attach_stylesheet(entry: &SpellEntry, provider: &gtk::CssProvider) {
    entry
        .style_context()
        .add_provider(provider, config::CSS_PRIORITY);
}

/// Label markup listing the available languages, then the enabled ones,
/// one per line.
pub fn languages_markup(available: &[String], enabled: &[String]) -> String {
    format!(
        "<b>{}</b>:\n{}\n<b>{}</b>:\n{}",
        gettext("Available Languages"),
        escaped_lines(available),
        gettext("Enabled Languages"),
        escaped_lines(enabled),
    )
}

fn escaped_lines(items: &[String]) -> String {
    items
        .iter()
        .map(|item| glib::markup_escape_text(item).to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
