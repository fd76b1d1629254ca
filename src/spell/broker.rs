use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::dictionary::Dictionary;
use super::error::SpellError;
use crate::config;

/// Finds dictionaries on disk and hands out loaded instances.
///
/// Dictionaries are Hunspell `<tag>.dic`/`<tag>.aff` pairs. A dictionary is
/// loaded once per broker; later requests for the same language share it.
#[derive(Debug, Default)]
pub struct Broker {
    dirs: Vec<PathBuf>,
    personal_dir: Option<PathBuf>,
    cache: HashMap<String, Rc<RefCell<Dictionary>>>,
}

impl Broker {
    pub fn new() -> Self {
        let mut broker = Self::with_dirs(default_dirs());
        broker.personal_dir = Some(glib::user_config_dir().join(config::USER_DIR_NAME));
        broker
    }

    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            personal_dir: None,
            cache: HashMap::new(),
        }
    }

    pub fn set_personal_dir(&mut self, dir: Option<PathBuf>) {
        self.personal_dir = dir;
    }

    pub fn add_dir(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        if !self.dirs.contains(&dir) {
            self.dirs.push(dir);
        }
    }

    /// Language tags of every dictionary found, sorted and without duplicates.
    pub fn list_dicts(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .dirs
            .iter()
            .flat_map(|dir| dictionaries_in(dir))
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    pub fn dict_exists(&self, tag: &str) -> bool {
        self.resolve(&normalize_tag(tag)).is_some()
    }

    pub fn request_dict(&mut self, tag: &str) -> Result<Rc<RefCell<Dictionary>>, SpellError> {
        let tag = normalize_tag(tag);
        let Some((resolved, dic_path)) = self.resolve(&tag) else {
            return Err(SpellError::Backend(tag));
        };

        if let Some(dict) = self.cache.get(&resolved) {
            return Ok(dict.clone());
        }

        let personal = self
            .personal_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.dic", resolved)));
        let dict = Dictionary::load(&resolved, &dic_path, personal).map_err(|e| {
            log::warn!("Failed to load dictionary for {}: {}", resolved, e);
            SpellError::Backend(tag.clone())
        })?;

        let dict = Rc::new(RefCell::new(dict));
        self.cache.insert(resolved, dict.clone());
        Ok(dict)
    }

    fn find_dic(&self, tag: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(format!("{}.dic", tag)))
            .find(|path| is_dictionary(path))
    }

    // A bare language ("en") falls back to the first regional variant.
    fn resolve(&self, tag: &str) -> Option<(String, PathBuf)> {
        if tag.is_empty() {
            return None;
        }
        if let Some(path) = self.find_dic(tag) {
            return Some((tag.to_string(), path));
        }
        if tag.contains('_') {
            return None;
        }

        let prefix = format!("{}_", tag);
        self.list_dicts()
            .into_iter()
            .find(|candidate| candidate.starts_with(&prefix))
            .and_then(|candidate| {
                let path = self.find_dic(&candidate)?;
                Some((candidate, path))
            })
    }
}

/// Turns locale-style names into dictionary tags: `en-US` and
/// `en_US.UTF-8@euro` both become `en_US`.
pub fn normalize_tag(tag: &str) -> String {
    let end = tag.find(['.', '@']).unwrap_or(tag.len());
    tag[..end].trim().replace('-', "_")
}

pub fn default_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![glib::user_data_dir().join("hunspell")];
    for data_dir in glib::system_data_dirs() {
        dirs.push(data_dir.join("hunspell"));
        dirs.push(data_dir.join("myspell"));
        dirs.push(data_dir.join("myspell").join("dicts"));
    }
    dirs
}

fn is_dictionary(dic_path: &Path) -> bool {
    dic_path.is_file() && dic_path.with_extension("aff").is_file()
}

fn dictionaries_in(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "dic"))
        .filter(|path| is_dictionary(path))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        // hyphenation and thesaurus files share the directories
        .filter(|tag| !tag.starts_with("hyph_") && !tag.starts_with("th_"))
        .collect()
}
