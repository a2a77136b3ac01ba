pub mod data;
pub mod io;
pub mod settings;

#[cfg(test)]
mod tests;

pub use data::Config;
pub use io::ConfigError;
pub use settings::SettingError;
