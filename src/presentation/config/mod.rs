mod settings;

pub use settings::{
    AuthSettings, DatabaseSettings, LoggingSettings, MediaSettings, SchedulerSettings,
    ServerSettings, Settings, SettingsError, WebhookSettings,
};
