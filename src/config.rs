pub const APP_ID: &str = "org.gnome.SpellEntryDemo";
pub const GETTEXT_PACKAGE: &str = "spellentry";
pub const LOCALEDIR: &str = match option_env!("SPELLENTRY_LOCALEDIR") {
    Some(dir) => dir,
    None => "/usr/share/locale",
};
pub const ISO_CODES_LOCALEDIR: &str = "/usr/share/locale";
pub const PKGDATADIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

/// Directory name under the user config dir for settings and personal
/// word lists.
pub const USER_DIR_NAME: &str = "spellentry";
pub const SETTINGS_FILE: &str = "settings.json";

pub const UI_FILE: &str = "main.ui";
pub const CSS_FILE: &str = "style.css";
pub const CSS_PRIORITY: u32 = 800;
pub const INITIAL_TEXT: &str = "I was nto!";
