use std::collections::HashMap;
use std::fs;
use std::path::Path;

use gettextrs::dgettext;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

pub const LANGUAGE_DOMAIN: &str = "iso_639";
pub const COUNTRY_DOMAIN: &str = "iso_3166";

static TABLE: Lazy<CodeTable> = Lazy::new(CodeTable::load);

/// Language and country names from the iso-codes package.
#[derive(Debug, Default)]
pub struct CodeTable {
    languages: HashMap<String, String>,
    countries: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct JsonEntry {
    alpha_2: Option<String>,
    alpha_3: Option<String>,
    name: String,
}

impl CodeTable {
    pub fn global() -> &'static CodeTable {
        &TABLE
    }

    /// Reads the JSON tables shipped by current iso-codes releases, falling
    /// back to the older XML files.
    pub fn load() -> Self {
        for data_dir in glib::system_data_dirs() {
            let json_dir = data_dir.join("iso-codes").join("json");
            if let Some(table) = Self::load_json(&json_dir) {
                return table;
            }
            let xml_dir = data_dir.join("xml").join("iso-codes");
            if let Some(table) = Self::load_xml(&xml_dir) {
                return table;
            }
        }

        log::debug!("No iso-codes data found, language names fall back to codes");
        Self::default()
    }

    fn load_json(dir: &Path) -> Option<Self> {
        let languages = fs::read_to_string(dir.join("iso_639-2.json")).ok()?;
        let countries = fs::read_to_string(dir.join("iso_3166-1.json")).ok()?;
        match (
            parse_json(&languages, "639-2"),
            parse_json(&countries, "3166-1"),
        ) {
            (Ok(languages), Ok(countries)) => Some(Self {
                languages,
                countries,
            }),
            (Err(e), _) | (_, Err(e)) => {
                log::warn!("Malformed iso-codes data in {}: {}", dir.display(), e);
                None
            }
        }
    }

    fn load_xml(dir: &Path) -> Option<Self> {
        let languages = fs::read_to_string(dir.join("iso_639.xml")).ok()?;
        let countries = fs::read_to_string(dir.join("iso_3166.xml")).ok()?;
        Some(Self {
            languages: parse_xml(&languages, "iso_639_entry", &["iso_639_1_code", "iso_639_2T_code"]),
            countries: parse_xml(&countries, "iso_3166_entry", &["alpha_2_code"]),
        })
    }

    pub fn from_parts(
        languages: HashMap<String, String>,
        countries: HashMap<String, String>,
    ) -> Self {
        Self {
            languages,
            countries,
        }
    }

    /// Splits a tag like `de_CH` and returns the translated language and
    /// country names. An unknown language is returned as it is, an unknown
    /// country as an empty name.
    pub fn lookup(&self, tag: &str) -> (String, String) {
        let (language, country) = match tag.split_once('_') {
            Some((language, country)) => (language, country),
            None => (tag, ""),
        };

        let language_name = self
            .languages
            .get(language)
            .map(|name| dgettext(LANGUAGE_DOMAIN, name.as_str()))
            .unwrap_or_else(|| language.to_string());

        let country_name = if country.is_empty() {
            String::new()
        } else {
            self.countries
                .get(country)
                .map(|name| dgettext(COUNTRY_DOMAIN, name.as_str()))
                .unwrap_or_default()
        };

        (language_name, country_name)
    }

    pub fn language_name(&self, tag: &str) -> String {
        let (language, country) = self.lookup(tag);
        if country.is_empty() {
            language
        } else {
            format!("{} ({})", language, country)
        }
    }
}

fn parse_json(content: &str, key: &str) -> serde_json::Result<HashMap<String, String>> {
    let mut root: HashMap<String, Vec<JsonEntry>> = serde_json::from_str(content)?;
    let entries = root.remove(key).unwrap_or_default();

    let mut names = HashMap::new();
    for entry in entries {
        // two-letter codes win over three-letter ones
        if let Some(code) = entry.alpha_3 {
            names.entry(code).or_insert_with(|| entry.name.clone());
        }
        if let Some(code) = entry.alpha_2 {
            names.insert(code, entry.name);
        }
    }
    Ok(names)
}

fn parse_xml(content: &str, element: &str, code_attrs: &[&str]) -> HashMap<String, String> {
    let mut reader = Reader::from_str(content);
    let mut buf = Vec::new();
    let mut names = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if name == element {
                    let mut codes = Vec::new();
                    let mut entry_name = None;
                    for attr in e.attributes().flatten() {
                        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
                        let val = attr
                            .unescape_value()
                            .map(|v| v.to_string())
                            .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
                        if key == "name" {
                            entry_name = Some(val);
                        } else if code_attrs.contains(&key.as_str()) {
                            codes.push(val);
                        }
                    }
                    if let Some(entry_name) = entry_name {
                        for code in codes {
                            names.entry(code).or_insert_with(|| entry_name.clone());
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("Error parsing iso-codes XML: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    names
}
