use super::broker::normalize_tag;

/// Languages to spell check by default, derived from the user's locale
/// names in order of preference.
///
/// The C/POSIX locale is skipped, as is any name sharing its two-letter
/// language with the previously kept one, so `["en_US", "en"]` yields only
/// `en_US`.
pub fn default_spell_languages<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut languages = Vec::new();
    let mut last: Option<String> = None;

    for name in names {
        let name = name.as_ref();
        if is_c_locale(name) || name.len() < 2 {
            continue;
        }
        if last.as_deref().is_some_and(|prefix| name.starts_with(prefix)) {
            continue;
        }

        let tag = normalize_tag(name);
        last = Some(tag.chars().take(2).collect());
        languages.push(tag);
    }

    languages
}

pub fn user_spell_languages() -> Vec<String> {
    let names: Vec<String> = glib::language_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    default_spell_languages(&names)
}

fn is_c_locale(name: &str) -> bool {
    name == "C" || name == "POSIX" || name.starts_with("C.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_variant_of_each_language() {
        assert_eq!(
            default_spell_languages(&["en_US.UTF-8", "en_US", "en", "C"]),
            vec!["en_US"]
        );
    }

    #[test]
    fn preserves_preference_order() {
        assert_eq!(
            default_spell_languages(&["de_CH.UTF-8", "de_CH", "de", "fr_FR", "fr", "C"]),
            vec!["de_CH", "fr_FR"]
        );
    }

    #[test]
    fn skips_c_locale_but_not_c_languages() {
        assert_eq!(
            default_spell_languages(&["C.UTF-8", "C", "POSIX", "cs_CZ", "ca"]),
            vec!["cs_CZ", "ca"]
        );
    }

    #[test]
    fn ignores_too_short_names() {
        assert!(default_spell_languages(&["x"]).is_empty());
        assert!(default_spell_languages::<&str>(&[]).is_empty());
    }
}
