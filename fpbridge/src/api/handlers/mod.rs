pub mod pages;
pub mod settings;
pub mod static_assets;
