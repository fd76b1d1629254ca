pub mod spell_entry;
