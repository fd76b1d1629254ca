pub mod broker;
pub mod dictionary;
pub mod error;
pub mod iso_codes;
pub mod locale;
pub mod speller;
pub mod tokenize;

pub use broker::Broker;
pub use dictionary::Dictionary;
pub use error::SpellError;
pub use speller::Speller;
pub use tokenize::WordSpan;
