use gettextrs::{bind_textdomain_codeset, bindtextdomain, setlocale, textdomain, LocaleCategory};

use crate::config;
use crate::spell::iso_codes::{COUNTRY_DOMAIN, LANGUAGE_DOMAIN};

pub fn init() {
    setlocale(LocaleCategory::LcAll, "");

    if let Err(e) = bindtextdomain(config::GETTEXT_PACKAGE, config::LOCALEDIR) {
        log::warn!("Unable to bind text domain: {}", e);
    }
    if let Err(e) = textdomain(config::GETTEXT_PACKAGE) {
        log::warn!("Unable to set text domain: {}", e);
    }

    for domain in [LANGUAGE_DOMAIN, COUNTRY_DOMAIN] {
        if bindtextdomain(domain, config::ISO_CODES_LOCALEDIR).is_err()
            || bind_textdomain_codeset(domain, "UTF-8").is_err()
        {
            log::debug!("iso-codes translations unavailable for {}", domain);
        }
    }
}
