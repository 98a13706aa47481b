pub mod crypto_context;
pub mod import_summary;
pub mod key_exporter;
pub mod key_importer;
pub mod key_lister;
pub mod key_loader;
pub mod key_validator;
pub mod keyserver_service;
