//! A GTK 4 text entry with inline spell checking.
//!
//! [`SpellEntry`] underlines misspelled words and offers suggestions,
//! "Add to Dictionary" and "Ignore All" in its context menu. Dictionaries
//! are Hunspell `.dic` files found through [`spell::Broker`].

pub mod config;
pub mod i18n;
pub mod settings;
pub mod spell;
pub mod ui;

pub use spell::SpellError;
pub use ui::spell_entry::SpellEntry;
