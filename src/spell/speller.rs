use std::cell::RefCell;
use std::rc::Rc;

use super::broker::{normalize_tag, Broker};
use super::dictionary::Dictionary;
use super::error::SpellError;
use super::tokenize::{char_to_byte, split_words, word_at, WordSpan};

/// Spell checking state of one text field: the active dictionaries in
/// activation order, whether checking is enabled, and the words of the
/// text as last split.
#[derive(Debug)]
pub struct Speller {
    broker: Broker,
    dicts: Vec<Rc<RefCell<Dictionary>>>,
    checked: bool,
    words: Vec<WordSpan>,
}

impl Speller {
    pub fn new(broker: Broker) -> Self {
        Self {
            broker,
            dicts: Vec::new(),
            checked: true,
            words: Vec::new(),
        }
    }

    pub fn broker_mut(&mut self) -> &mut Broker {
        &mut self.broker
    }

    /// Languages for which a dictionary is installed.
    pub fn languages(&self) -> Vec<String> {
        self.broker.list_dicts()
    }

    pub fn is_active(&self, lang: &str) -> bool {
        self.dictionary(lang).is_some()
    }

    pub fn dictionary(&self, lang: &str) -> Option<Rc<RefCell<Dictionary>>> {
        let tag = normalize_tag(lang);
        self.dicts
            .iter()
            .find(|dict| dict.borrow().tag() == tag)
            .cloned()
    }

    pub fn dictionaries(&self) -> &[Rc<RefCell<Dictionary>>] {
        &self.dicts
    }

    pub fn has_dictionaries(&self) -> bool {
        !self.dicts.is_empty()
    }

    pub fn activate(&mut self, lang: &str) -> Result<(), SpellError> {
        if self.is_active(lang) {
            return Ok(());
        }

        // "en" is satisfied by any active regional variant
        let tag = normalize_tag(lang);
        if !tag.contains('_') {
            let prefix = format!("{}_", tag);
            if self.dicts.iter().any(|dict| dict.borrow().tag().starts_with(&prefix)) {
                return Ok(());
            }
        }

        let dict = self.broker.request_dict(&tag)?;

        log::debug!("Activated spell checking for {}", dict.borrow().tag());
        self.dicts.push(dict);
        Ok(())
    }

    /// Deactivates one language, or all of them for `None`.
    pub fn deactivate(&mut self, lang: Option<&str>) {
        match lang {
            Some(lang) => {
                let tag = normalize_tag(lang);
                self.dicts.retain(|dict| dict.borrow().tag() != tag);
            }
            None => self.dicts.clear(),
        }
    }

    /// Replaces the active languages. Stops at the first language that
    /// cannot be activated; the ones before it stay active.
    pub fn set_active<S: AsRef<str>>(&mut self, langs: &[S]) -> Result<(), SpellError> {
        self.deactivate(None);
        for lang in langs {
            self.activate(lang.as_ref())?;
        }
        Ok(())
    }

    pub fn active_languages(&self) -> Vec<String> {
        self.dicts
            .iter()
            .map(|dict| dict.borrow().tag().to_string())
            .collect()
    }

    /// Activates the preferred languages that have a dictionary, or `en`
    /// when none of them could be activated.
    pub fn activate_defaults<S: AsRef<str>>(&mut self, preferred: &[S]) {
        for lang in preferred {
            let lang = lang.as_ref();
            if !self.broker.dict_exists(lang) {
                log::debug!("No dictionary for preferred language {}", lang);
                continue;
            }
            if let Err(e) = self.activate(lang) {
                log::warn!("{}", e);
            }
        }

        if self.dicts.is_empty() {
            if let Err(e) = self.activate("en") {
                log::warn!("Spell checking unavailable: {}", e);
            }
        }
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }

    /// Default word check: true if no active dictionary knows the word.
    /// Anything not starting with a letter is never reported.
    pub fn is_misspelled(&self, word: &str) -> bool {
        if !word.chars().next().is_some_and(char::is_alphabetic) {
            return false;
        }
        !self.dicts.iter().any(|dict| dict.borrow().check(word))
    }

    pub fn split(&mut self, text: &str) {
        self.words = split_words(text);
    }

    pub fn words(&self) -> &[WordSpan] {
        &self.words
    }

    /// Words of the last split that need checking. Empty while checking is
    /// off or no dictionary is active.
    pub fn checkable_words(&self) -> Vec<WordSpan> {
        if !self.checked || self.dicts.is_empty() {
            return Vec::new();
        }
        self.words
            .iter()
            .filter(|span| !span.is_empty())
            .copied()
            .collect()
    }

    /// The word around a character position of `text`.
    pub fn word_extents(&self, text: &str, char_pos: usize) -> Option<WordSpan> {
        word_at(&self.words, char_to_byte(text, char_pos))
    }

    /// Suggestions per active language, in activation order.
    pub fn suggestions(&self, word: &str) -> Vec<(String, Vec<String>)> {
        self.dicts
            .iter()
            .map(|dict| {
                let dict = dict.borrow();
                (dict.tag().to_string(), dict.suggest(word))
            })
            .collect()
    }

    pub fn ignore_all(&self, word: &str) {
        for dict in &self.dicts {
            dict.borrow_mut().add_to_session(word);
        }
    }

    pub fn add_to_dictionary(&self, lang: &str, word: &str) -> Result<(), SpellError> {
        let dict = self
            .dictionary(lang)
            .ok_or_else(|| SpellError::Backend(lang.to_string()))?;
        let result = dict.borrow_mut().add_to_personal(word);
        result
    }

    pub fn store_replacement(&self, lang: &str, bad: &str, good: &str) {
        if let Some(dict) = self.dictionary(lang) {
            dict.borrow_mut().store_replacement(bad, good);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_dict(dir: &Path, tag: &str, words: &str) {
        fs::write(dir.join(format!("{}.dic", tag)), words).unwrap();
        fs::write(dir.join(format!("{}.aff", tag)), "SET UTF-8\n").unwrap();
    }

    fn speller(dir: &Path) -> Speller {
        write_dict(dir, "en_US", "5\nI\nwas\nnot\nhello\nworld\n");
        write_dict(dir, "de_DE", "3\nich\nwar\nnicht\n");
        Speller::new(Broker::with_dirs(vec![dir.to_path_buf()]))
    }

    #[test]
    fn activation_keeps_order_and_ignores_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut speller = speller(dir.path());

        speller.activate("de_DE").unwrap();
        speller.activate("en").unwrap();
        speller.activate("en_US").unwrap();
        assert_eq!(speller.active_languages(), vec!["de_DE", "en_US"]);
        assert!(speller.is_active("en-US"));

        speller.deactivate(Some("de_DE"));
        speller.deactivate(Some("fr_FR"));
        assert_eq!(speller.active_languages(), vec!["en_US"]);

        speller.deactivate(None);
        assert!(!speller.has_dictionaries());
    }

    #[test]
    fn bare_language_keeps_the_active_variant() {
        let dir = tempfile::tempdir().unwrap();
        let mut speller = speller(dir.path());
        write_dict(dir.path(), "en_GB", "1\ncolour\n");

        speller.activate("en_US").unwrap();
        speller.activate("en").unwrap();
        assert_eq!(speller.active_languages(), vec!["en_US"]);

        speller.deactivate(None);
        speller.activate("en").unwrap();
        assert_eq!(speller.active_languages(), vec!["en_GB"]);
    }

    #[test]
    fn set_active_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut speller = speller(dir.path());
        speller.activate("de_DE").unwrap();

        let err = speller.set_active(&["en_US", "xx_XX", "de_DE"]).unwrap_err();
        assert!(matches!(err, SpellError::Backend(ref tag) if tag == "xx_XX"));
        assert_eq!(speller.active_languages(), vec!["en_US"]);
    }

    #[test]
    fn defaults_fall_back_to_english() {
        let dir = tempfile::tempdir().unwrap();
        let mut speller = speller(dir.path());
        speller.activate_defaults(&["fr_FR", "it"]);
        assert_eq!(speller.active_languages(), vec!["en_US"]);

        let mut speller = Speller::new(Broker::with_dirs(vec![dir.path().to_path_buf()]));
        speller.activate_defaults(&["de_DE", "en_US"]);
        assert_eq!(speller.active_languages(), vec!["de_DE", "en_US"]);
    }

    #[test]
    fn word_is_misspelled_only_if_no_dictionary_knows_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut speller = speller(dir.path());
        speller.set_active(&["en_US", "de_DE"]).unwrap();

        assert!(!speller.is_misspelled("hello"));
        assert!(!speller.is_misspelled("nicht"));
        assert!(speller.is_misspelled("nto"));
        assert!(!speller.is_misspelled("42nd"));
    }

    #[test]
    fn finds_misspelled_spans() {
        let dir = tempfile::tempdir().unwrap();
        let mut speller = speller(dir.path());
        speller.activate("en_US").unwrap();

        let text = "I was nto!";
        speller.split(text);
        let misspelled: Vec<WordSpan> = speller
            .checkable_words()
            .into_iter()
            .filter(|span| speller.is_misspelled(span.slice(text)))
            .collect();
        assert_eq!(misspelled, vec![WordSpan::new(6, 9)]);

        speller.set_checked(false);
        assert!(speller.checkable_words().is_empty());
    }

    #[test]
    fn nothing_is_flagged_without_dictionaries() {
        let mut speller = Speller::new(Broker::with_dirs(Vec::new()));
        speller.split("qwzx");
        assert_eq!(speller.words().len(), 1);
        assert!(speller.checkable_words().is_empty());
    }

    #[test]
    fn word_extents_use_character_positions() {
        let dir = tempfile::tempdir().unwrap();
        let mut speller = speller(dir.path());
        let text = "Grüße nto";
        speller.split(text);
        assert_eq!(speller.word_extents(text, 7), Some(WordSpan::new(8, 11)));
        assert_eq!(speller.word_extents(text, 2), Some(WordSpan::new(0, 7)));
    }

    #[test]
    fn ignore_all_applies_to_every_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        let mut speller = speller(dir.path());
        speller.set_active(&["en_US", "de_DE"]).unwrap();

        speller.ignore_all("gtk");
        assert!(!speller.is_misspelled("gtk"));
        for dict in speller.dictionaries() {
            assert!(dict.borrow().check("gtk"));
        }
    }

    #[test]
    fn suggestions_are_grouped_by_language() {
        let dir = tempfile::tempdir().unwrap();
        let mut speller = speller(dir.path());
        speller.set_active(&["en_US", "de_DE"]).unwrap();
        speller.store_replacement("en_US", "nto", "not");

        let suggestions = speller.suggestions("nto");
        assert_eq!(suggestions[0].0, "en_US");
        assert_eq!(suggestions[0].1[0], "not");
        assert_eq!(suggestions[1].0, "de_DE");
    }
}
