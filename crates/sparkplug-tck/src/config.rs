//! Harness configuration: output topics, control topic and observer settings.
//!
//! Loaded from a TOML file with [`TckConfig::load`]; every field has a
//! default so a partial file is enough.

use crate::error::{Result, TckError};
use crate::topic::{is_valid_topic_filter, is_valid_topic_name};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_results_topic() -> String {
    "SPARKPLUG_TCK/RESULT".to_string()
}

fn default_log_topic() -> String {
    "SPARKPLUG_TCK/LOG".to_string()
}

fn default_prompt_topic() -> String {
    "SPARKPLUG_TCK/CONSOLE_PROMPT".to_string()
}

fn default_control_topic() -> String {
    "SPARKPLUG_TCK/TEST_CONTROL".to_string()
}

fn default_state_root() -> String {
    "STATE".to_string()
}

fn default_listener_filter() -> String {
    "#".to_string()
}

fn default_max_captured_messages() -> usize {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TckConfig {
    #[serde(default = "default_results_topic")]
    pub results_topic: String,
    #[serde(default = "default_log_topic")]
    pub log_topic: String,
    #[serde(default = "default_prompt_topic")]
    pub prompt_topic: String,
    #[serde(default = "default_control_topic")]
    pub control_topic: String,
    /// First topic level of host application STATE publications.
    #[serde(default = "default_state_root")]
    pub state_root: String,
    /// Filter the traffic listener subscribes with.
    #[serde(default = "default_listener_filter")]
    pub listener_filter: String,
    /// Upper bound on messages the traffic listener keeps per run, 0 = unbounded.
    #[serde(default = "default_max_captured_messages")]
    pub max_captured_messages: usize,
}

impl Default for TckConfig {
    fn default() -> Self {
        Self {
            results_topic: default_results_topic(),
            log_topic: default_log_topic(),
            prompt_topic: default_prompt_topic(),
            control_topic: default_control_topic(),
            state_root: default_state_root(),
            listener_filter: default_listener_filter(),
            max_captured_messages: default_max_captured_messages(),
        }
    }
}

impl TckConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_results_topic(mut self, topic: impl Into<String>) -> Self {
        self.results_topic = topic.into();
        self
    }

    #[must_use]
    pub fn with_log_topic(mut self, topic: impl Into<String>) -> Self {
        self.log_topic = topic.into();
        self
    }

    #[must_use]
    pub fn with_prompt_topic(mut self, topic: impl Into<String>) -> Self {
        self.prompt_topic = topic.into();
        self
    }

    #[must_use]
    pub fn with_control_topic(mut self, topic: impl Into<String>) -> Self {
        self.control_topic = topic.into();
        self
    }

    #[must_use]
    pub fn with_state_root(mut self, root: impl Into<String>) -> Self {
        self.state_root = root.into();
        self
    }

    #[must_use]
    pub fn with_listener_filter(mut self, filter: impl Into<String>) -> Self {
        self.listener_filter = filter.into();
        self
    }

    #[must_use]
    pub fn with_max_captured_messages(mut self, max: usize) -> Self {
        self.max_captured_messages = max;
        self
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if an output or control topic is not a plain topic
    /// name, the state root is empty or has an empty level, or the listener
    /// filter is malformed.
    pub fn validate(&self) -> Result<&Self> {
        for (name, topic) in [
            ("results_topic", &self.results_topic),
            ("log_topic", &self.log_topic),
            ("prompt_topic", &self.prompt_topic),
            ("control_topic", &self.control_topic),
        ] {
            if !is_valid_topic_name(topic) {
                return Err(TckError::Configuration(format!(
                    "{name} must be a topic name without wildcards, got {topic:?}"
                )));
            }
        }

        if !is_valid_topic_name(&self.state_root)
            || self.state_root.split('/').any(str::is_empty)
        {
            return Err(TckError::Configuration(format!(
                "state_root must be a topic name without empty levels, got {:?}",
                self.state_root
            )));
        }

        if !is_valid_topic_filter(&self.listener_filter) {
            return Err(TckError::Configuration(format!(
                "listener_filter is not a valid topic filter: {:?}",
                self.listener_filter
            )));
        }

        Ok(self)
    }

    /// Topic a host application publishes its STATE messages on.
    #[must_use]
    pub fn state_topic(&self, host_application_id: &str) -> String {
        format!("{}/{host_application_id}", self.state_root)
    }
}
