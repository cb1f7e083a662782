mod audio_config;
mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod storage_config;

pub(crate) use {
    audio_config::AudioConfig, behaviour_config::BehaviourConfig, config::Config,
    storage_config::StorageConfig,
};

pub(crate) const DEFAULT_CAPTURE_START_TIMEOUT_SECS: u64 = 10;

pub(crate) fn default_capture_start_timeout_secs() -> u64 {
    DEFAULT_CAPTURE_START_TIMEOUT_SECS
}
