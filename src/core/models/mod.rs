pub mod engine_info;
pub mod import_result;
pub mod key;
pub mod keylist_mode;
pub mod presentation;
