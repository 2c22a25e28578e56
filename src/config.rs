/// Settings of an [`Interpreter`](crate::Interpreter).
///
/// The shell reads no configuration files or flags; these are the compiled-in
/// defaults, adjustable by code embedding the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Upper bound on pipeline stages. Longer pipelines are rejected.
    pub max_pipeline_stages: usize,
    /// Printed right after the working directory in the prompt.
    pub prompt_suffix: String,
    /// Printed when the exit directive is read.
    pub farewell: String,
    /// Keep entered lines in the line editor's history.
    pub history: bool,
}

pub const DEFAULT_MAX_PIPELINE_STAGES: usize = 10;

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            max_pipeline_stages: DEFAULT_MAX_PIPELINE_STAGES,
            prompt_suffix: "$".to_string(),
            farewell: "Exiting shell...".to_string(),
            history: true,
        }
    }
}

impl ShellConfig {
    pub fn with_max_pipeline_stages(mut self, max: usize) -> Self {
        self.max_pipeline_stages = max;
        self
    }

    pub fn with_prompt_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.prompt_suffix = suffix.into();
        self
    }

    pub fn with_farewell(mut self, farewell: impl Into<String>) -> Self {
        self.farewell = farewell.into();
        self
    }

    pub fn with_history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ShellConfig::default();
        assert_eq!(config.max_pipeline_stages, 10);
        assert_eq!(config.prompt_suffix, "$");
        assert_eq!(config.farewell, "Exiting shell...");
        assert!(config.history);
    }

    #[test]
    fn test_builders_override_single_fields() {
        let config = ShellConfig::default()
            .with_max_pipeline_stages(3)
            .with_prompt_suffix("> ")
            .with_history(false);
        assert_eq!(config.max_pipeline_stages, 3);
        assert_eq!(config.prompt_suffix, "> ");
        assert!(!config.history);
        assert_eq!(config.farewell, ShellConfig::default().farewell);
    }
}
