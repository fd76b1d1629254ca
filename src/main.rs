mod application;

use gtk::prelude::*;
use spellentry::i18n;

fn main() -> glib::ExitCode {
    env_logger::init();
    i18n::init();

    let app = application::SpellEntryDemoApplication::new();
    let code = app.run();
    if app.startup_failed() {
        glib::ExitCode::FAILURE
    } else {
        code
    }
}
