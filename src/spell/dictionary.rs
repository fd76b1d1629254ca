use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::error::SpellError;

const MAX_SUGGESTIONS: usize = 30;
const MAX_DISTANCE: usize = 2;

/// Hunspell dictionary for a single language.
///
/// Words are checked against the `.dic`/`.aff` pair with its affix rules
/// applied. On top of that a dictionary keeps the user's personal words
/// (persisted to `personal_path`), words ignored for the current session,
/// and replacements the user picked from suggestions.
pub struct Dictionary {
    tag: String,
    engine: spellbook::Dictionary,
    personal: HashSet<String>,
    session: HashSet<String>,
    replacements: Vec<(String, String)>,
    personal_path: Option<PathBuf>,
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("tag", &self.tag)
            .field("personal", &self.personal.len())
            .field("session", &self.session.len())
            .field("personal_path", &self.personal_path)
            .finish_non_exhaustive()
    }
}

impl Dictionary {
    /// Builds a dictionary from UTF-8 affix and word list contents.
    pub fn parse(tag: &str, aff: &str, dic: &str) -> Result<Self, SpellError> {
        let engine = spellbook::Dictionary::new(aff, dic).map_err(|e| SpellError::Parse {
            tag: tag.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            tag: tag.to_string(),
            engine,
            personal: HashSet::new(),
            session: HashSet::new(),
            replacements: Vec::new(),
            personal_path: None,
        })
    }

    /// Loads `dic_path` and the `.aff` file next to it, converting both to
    /// UTF-8 from the encoding named in the affix file.
    pub fn load(
        tag: &str,
        dic_path: &Path,
        personal_path: Option<PathBuf>,
    ) -> Result<Self, SpellError> {
        let aff_path = dic_path.with_extension("aff");
        let aff_bytes = fs::read(&aff_path).map_err(|e| SpellError::io(&aff_path, e))?;
        let dic_bytes = fs::read(dic_path).map_err(|e| SpellError::io(dic_path, e))?;

        let encoding = affix_encoding(&aff_bytes);
        let aff = to_utf8(&aff_bytes, encoding.as_deref(), &aff_path);
        let dic = to_utf8(&dic_bytes, encoding.as_deref(), dic_path);

        let mut dict = Self::parse(tag, &with_utf8_set(&aff), &dic)?;
        log::debug!("Loaded dictionary {} from {}", tag, dic_path.display());

        if let Some(path) = &personal_path {
            match fs::read_to_string(path) {
                Ok(content) => {
                    dict.personal = content
                        .lines()
                        .map(str::trim)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    log::warn!("Could not read personal word list {}: {}", path.display(), e);
                }
            }
        }
        dict.personal_path = personal_path;

        Ok(dict)
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn knows(&self, word: &str) -> bool {
        self.personal.contains(word) || self.session.contains(word)
    }

    // "Hello" at the start of a sentence, or "HELLO" in a heading
    fn knows_any_case(&self, word: &str) -> bool {
        if self.knows(word) {
            return true;
        }
        match word_case(word) {
            WordCase::Capitalized => self.knows(&word.to_lowercase()),
            WordCase::Upper => {
                let lower = word.to_lowercase();
                self.knows(&lower) || self.knows(&capitalize(&lower))
            }
            WordCase::Other => false,
        }
    }

    /// Returns true if the word is spelled correctly.
    pub fn check(&self, word: &str) -> bool {
        if self.engine.check(word) {
            return true;
        }
        let word = word.replace('\u{2019}', "'");
        self.engine.check(&word) || self.knows_any_case(&word)
    }

    pub fn suggest(&self, word: &str) -> Vec<String> {
        let mut suggestions: Vec<String> = self
            .replacements
            .iter()
            .filter(|(bad, _)| bad == word)
            .map(|(_, good)| good.clone())
            .collect();

        let mut found = Vec::new();
        self.engine.suggest(word, &mut found);
        for suggestion in found.into_iter().chain(self.personal_suggestions(word)) {
            if suggestion != word && !suggestions.contains(&suggestion) {
                suggestions.push(suggestion);
            }
        }

        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }

    // The engine only knows the shipped words
    fn personal_suggestions(&self, word: &str) -> Vec<String> {
        let target: Vec<char> = word.to_lowercase().chars().collect();
        let mut candidates: Vec<(usize, &String)> = self
            .personal
            .iter()
            .filter_map(|candidate| {
                let lower: Vec<char> = candidate.to_lowercase().chars().collect();
                if lower.len().abs_diff(target.len()) > MAX_DISTANCE {
                    return None;
                }
                let distance = osa_distance(&target, &lower);
                (distance <= MAX_DISTANCE).then_some((distance, candidate))
            })
            .collect();
        candidates.sort();

        let case = word_case(word);
        candidates
            .into_iter()
            .map(|(_, candidate)| match case {
                WordCase::Upper => candidate.to_uppercase(),
                WordCase::Capitalized => capitalize(candidate),
                WordCase::Other => candidate.clone(),
            })
            .collect()
    }

    /// Adds the word to the personal word list and appends it to the
    /// personal file, if there is one.
    pub fn add_to_personal(&mut self, word: &str) -> Result<(), SpellError> {
        if !self.personal.insert(word.to_string()) {
            return Ok(());
        }

        let Some(path) = &self.personal_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SpellError::io(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SpellError::io(path, e))?;
        writeln!(file, "{}", word).map_err(|e| SpellError::io(path, e))?;
        Ok(())
    }

    pub fn add_to_session(&mut self, word: &str) {
        self.session.insert(word.to_string());
    }

    pub fn store_replacement(&mut self, bad: &str, good: &str) {
        self.replacements.retain(|(b, g)| !(b == bad && g == good));
        self.replacements.insert(0, (bad.to_string(), good.to_string()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WordCase {
    Capitalized,
    Upper,
    Other,
}

fn word_case(word: &str) -> WordCase {
    let mut letters = word.chars().filter(|c| c.is_alphabetic());
    let Some(first) = letters.next() else {
        return WordCase::Other;
    };
    if !first.is_uppercase() {
        return WordCase::Other;
    }
    let rest: Vec<char> = letters.collect();
    if rest.is_empty() {
        WordCase::Capitalized
    } else if rest.iter().all(|c| c.is_uppercase()) {
        WordCase::Upper
    } else if rest.iter().all(|c| c.is_lowercase()) {
        WordCase::Capitalized
    } else {
        WordCase::Other
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Edit distance counting insertions, deletions, substitutions and
/// transpositions of adjacent characters.
fn osa_distance(a: &[char], b: &[char]) -> usize {
    let mut rows = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in rows.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        rows[0][j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (rows[i - 1][j] + 1)
                .min(rows[i][j - 1] + 1)
                .min(rows[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(rows[i - 2][j - 2] + 1);
            }
            rows[i][j] = best;
        }
    }

    rows[a.len()][b.len()]
}

/// The encoding named by the `SET` line of an affix file.
fn affix_encoding(aff: &[u8]) -> Option<String> {
    String::from_utf8_lossy(aff)
        .lines()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .find_map(|line| line.strip_prefix("SET "))
        .map(|encoding| encoding.trim().to_string())
}

fn is_utf8(encoding: &str) -> bool {
    encoding.eq_ignore_ascii_case("UTF-8") || encoding.eq_ignore_ascii_case("UTF8")
}

/// Maps Hunspell encoding names to names iconv understands.
fn iconv_name(encoding: &str) -> String {
    let upper = encoding.to_ascii_uppercase();
    if let Some(codepage) = upper.strip_prefix("MICROSOFT-") {
        return codepage.to_string();
    }
    match upper.as_str() {
        "TIS620-2533" => "TIS-620".to_string(),
        _ => upper,
    }
}

fn to_utf8(bytes: &[u8], encoding: Option<&str>, path: &Path) -> String {
    let Some(encoding) = encoding.filter(|encoding| !is_utf8(encoding)) else {
        return String::from_utf8_lossy(bytes).into_owned();
    };

    match glib::convert(bytes, "UTF-8", iconv_name(encoding).as_str()) {
        Ok((converted, _)) => String::from_utf8_lossy(&converted).into_owned(),
        Err(e) => {
            log::warn!(
                "Could not convert {} from {}, reading it as UTF-8: {}",
                path.display(),
                encoding,
                e
            );
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

// The contents were converted, so the affix file must say so
fn with_utf8_set(aff: &str) -> String {
    aff.lines()
        .map(|line| {
            if line.trim_start_matches('\u{feff}').trim().starts_with("SET ") {
                "SET UTF-8"
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
