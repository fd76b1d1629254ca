use std::fs;
use std::path::Path;

use spellentry::spell::tokenize::split_words;
use spellentry::spell::{Broker, SpellError, Speller};

fn install(dir: &Path, tag: &str, words: &[&str]) {
    let mut dic = format!("{}\n", words.len());
    for word in words {
        dic.push_str(word);
        dic.push('\n');
    }
    fs::write(dir.join(format!("{}.dic", tag)), dic).unwrap();
    fs::write(dir.join(format!("{}.aff", tag)), "SET UTF-8\nTRY esianrtolcdugmphbyfvkwzESIANRTOLCDUGMPHBYFVKWZ'\n").unwrap();
}

fn misspelled(speller: &mut Speller, text: &str) -> Vec<String> {
    speller.split(text);
    speller
        .checkable_words()
        .into_iter()
        .map(|span| span.slice(text))
        .filter(|word| speller.is_misspelled(word))
        .map(str::to_string)
        .collect()
}

#[test]
fn checks_text_against_active_languages() {
    let dicts = tempfile::tempdir().unwrap();
    install(dicts.path(), "en_US", &["hello", "world", "I", "was", "not"]);
    install(dicts.path(), "de_CH", &["grüezi", "welt"]);

    let mut speller = Speller::new(Broker::with_dirs(vec![dicts.path().to_path_buf()]));
    assert_eq!(speller.languages(), vec!["de_CH", "en_US"]);

    speller.set_active(&["en_US"]).unwrap();
    assert_eq!(misspelled(&mut speller, "Hello Wrold, grüezi!"), vec!["Wrold", "grüezi"]);

    speller.activate("de").unwrap();
    assert_eq!(speller.active_languages(), vec!["en_US", "de_CH"]);
    assert_eq!(misspelled(&mut speller, "Hello Wrold, grüezi!"), vec!["Wrold"]);

    let suggestions = speller.suggestions("Wrold");
    assert_eq!(suggestions[0].0, "en_US");
    assert!(suggestions[0].1.contains(&"World".to_string()));
}

#[test]
fn affix_rules_cover_word_forms() {
    let dicts = tempfile::tempdir().unwrap();
    fs::write(dicts.path().join("en_US.dic"), "3\nword/S\nlanguage/S\ncheck/D\n").unwrap();
    fs::write(
        dicts.path().join("en_US.aff"),
        "SET UTF-8\nSFX S Y 1\nSFX S 0 s .\n\nSFX D Y 1\nSFX D 0 ed .\n",
    )
    .unwrap();

    let mut speller = Speller::new(Broker::with_dirs(vec![dicts.path().to_path_buf()]));
    speller.activate("en").unwrap();
    assert_eq!(misspelled(&mut speller, "checked words and languages"), vec!["and"]);
}

#[test]
fn personal_words_survive_a_new_broker() {
    let dicts = tempfile::tempdir().unwrap();
    let config = tempfile::tempdir().unwrap();
    install(dicts.path(), "en_US", &["hello"]);

    let new_speller = || {
        let mut broker = Broker::with_dirs(vec![dicts.path().to_path_buf()]);
        broker.set_personal_dir(Some(config.path().to_path_buf()));
        let mut speller = Speller::new(broker);
        speller.activate("en_US").unwrap();
        speller
    };

    let mut speller = new_speller();
    assert_eq!(misspelled(&mut speller, "hello rustc"), vec!["rustc"]);
    speller.add_to_dictionary("en_US", "rustc").unwrap();
    assert!(misspelled(&mut speller, "hello rustc").is_empty());

    let mut speller = new_speller();
    assert!(misspelled(&mut speller, "hello rustc").is_empty());
    assert!(config.path().join("en_US.dic").is_file());
}

#[test]
fn ignored_words_last_for_the_session_only() {
    let dicts = tempfile::tempdir().unwrap();
    install(dicts.path(), "en_US", &["hello"]);
    let dirs = vec![dicts.path().to_path_buf()];

    let mut speller = Speller::new(Broker::with_dirs(dirs.clone()));
    speller.activate("en_US").unwrap();
    speller.ignore_all("gtk");
    assert!(misspelled(&mut speller, "hello gtk").is_empty());

    let mut speller = Speller::new(Broker::with_dirs(dirs));
    speller.activate("en_US").unwrap();
    assert_eq!(misspelled(&mut speller, "hello gtk"), vec!["gtk"]);
}

#[test]
fn missing_languages_are_reported() {
    let mut speller = Speller::new(Broker::with_dirs(Vec::new()));
    let err = speller.activate("tlh").unwrap_err();
    assert!(matches!(err, SpellError::Backend(_)));
    assert_eq!(err.to_string(), "no dictionary available for language: tlh");
    assert!(speller.active_languages().is_empty());
}

#[test]
fn numbers_and_punctuation_are_never_flagged() {
    let dicts = tempfile::tempdir().unwrap();
    install(dicts.path(), "en_US", &["hello"]);

    let mut speller = Speller::new(Broker::with_dirs(vec![dicts.path().to_path_buf()]));
    speller.activate("en_US").unwrap();
    assert_eq!(split_words("hello 2nd 42 -- ...").len(), 3);
    assert!(misspelled(&mut speller, "hello 2nd 42 -- ...").is_empty());
}
