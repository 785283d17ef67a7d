//! File Log Subscriber Settings.

use std::{ops::Deref, path::PathBuf};

/// Re-export to save the end crate from needing to depend on `tracing-appender` directly.
pub use tracing_appender::rolling::Rotation;

use super::{Build, Settings, SettingsBuilder};

/// Configure specific settings for the File Log subscriber.
#[derive(Debug, Default, PartialEq)]
pub struct FileLogSettings {
    /// Common subscriber settings that apply to the File Log Subscriber.
    pub common_settings: Settings,

    /// Path to directory for log files.
    pub file_log_dir: PathBuf,

    /// Log rotation frequency.
    pub rotation_period: Rotation,
}

impl Deref for FileLogSettings {
    type Target = Settings;

    fn deref(&self) -> &Self::Target {
        &self.common_settings
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::HOURLY
    }
}

/// For building [`FileLogSettings`].
///
/// <div class="warning">
/// Do not use directly, instead use the [`Settings::builder`] associated function.
/// </div>
pub struct FileLogSettingsBuilder {
    pub(crate) common_settings: Settings,
    pub(crate) file_log_dir: PathBuf,
    pub(crate) rotation_period: Rotation,
}

impl FileLogSettingsBuilder {
    /// Set the directory log files are written to.
    pub fn with_file_log_dir(mut self, file_log_dir: impl Into<PathBuf>) -> Self {
        self.file_log_dir = file_log_dir.into();
        self
    }

    /// Set file rotation period.
    pub fn with_rotation_period(mut self, rotation_period: Rotation) -> Self {
        self.rotation_period = rotation_period;
        self
    }

    /// Consumes self and returns a valid [`FileLogSettings`] instance.
    pub fn build(self) -> FileLogSettings {
        FileLogSettings {
            common_settings: self.common_settings,
            file_log_dir: self.file_log_dir,
            rotation_period: self.rotation_period,
        }
    }
}

/// This implementation is used to turn the common settings builder into the file log specific
/// settings builder via the [`SettingsBuilder::file_log_settings_builder`] function.
impl From<SettingsBuilder> for FileLogSettingsBuilder {
    fn from(value: SettingsBuilder) -> Self {
        Self {
            common_settings: value.build(),
            file_log_dir: PathBuf::from("."),
            rotation_period: Rotation::HOURLY,
        }
    }
}

/// This implementation is used to build file log settings from common settings without
/// specifying file log specific settings.
impl Build<FileLogSettings> for SettingsBuilder {
    fn build(self) -> FileLogSettings {
        FileLogSettings {
            common_settings: self.build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use tracing::level_filters::LevelFilter;

    use super::*;

    #[test]
    fn builds_settings() {
        let expected = FileLogSettings {
            common_settings: Settings {
                environment_variable: "hello",
                default_level: LevelFilter::DEBUG,
                enabled: true,
            },
            file_log_dir: PathBuf::from("/logs"),
            rotation_period: Rotation::HOURLY,
        };
        let result = Settings::builder()
            .with_environment_variable("hello")
            .with_default_level(LevelFilter::DEBUG)
            .enabled(true)
            .file_log_settings_builder()
            .with_file_log_dir("/logs")
            .with_rotation_period(Rotation::HOURLY)
            .build();

        assert_eq!(expected, result);
    }
}
