use colored::*;

/// Module tags used to group and filter log lines
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Api,
    Config,
    Oracle,
    Tokens,
    Bundles,
    Users,
    Pipeline,
    Broadcast,
    Database,
    Webserver,
    Test,
    Other(String),
}

impl LogTag {
    /// Key used in `--debug-<key>` / `--verbose-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::Other(name) => name.to_lowercase(),
            tag => tag.to_plain_string().to_lowercase(),
        }
    }

    /// Uncolored label, used in log files
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Api => "API".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Oracle => "ORACLE".to_string(),
            LogTag::Tokens => "TOKENS".to_string(),
            LogTag::Bundles => "BUNDLES".to_string(),
            LogTag::Users => "USERS".to_string(),
            LogTag::Pipeline => "PIPELINE".to_string(),
            LogTag::Broadcast => "BROADCAST".to_string(),
            LogTag::Database => "DATABASE".to_string(),
            LogTag::Webserver => "WEBSERVER".to_string(),
            LogTag::Test => "TEST".to_string(),
            LogTag::Other(name) => name.to_uppercase(),
        }
    }

    /// Padded, colored label for console output
    pub fn to_colored(&self, width: usize) -> ColoredString {
        let label = format!("{:<width$}", self.to_plain_string(), width = width);
        match self {
            LogTag::System => label.bright_yellow().bold(),
            LogTag::Api => label.yellow().bold(),
            LogTag::Config => label.bright_white().bold(),
            LogTag::Oracle => label.bright_purple().bold(),
            LogTag::Tokens => label.bright_cyan().bold(),
            LogTag::Bundles => label.bright_green().bold(),
            LogTag::Users => label.bright_white(),
            LogTag::Pipeline => label.bright_blue().bold(),
            LogTag::Broadcast => label.bright_magenta().bold(),
            LogTag::Database => label.cyan().bold(),
            LogTag::Webserver => label.green().bold(),
            LogTag::Test => label.blue().bold(),
            LogTag::Other(_) => label.white().bold(),
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_keys() {
        assert_eq!(LogTag::Oracle.to_debug_key(), "oracle");
        assert_eq!(LogTag::Webserver.to_debug_key(), "webserver");
        assert_eq!(LogTag::Other("Scheduler".to_string()).to_debug_key(), "scheduler");
        assert_eq!(LogTag::Other("cron".to_string()).to_plain_string(), "CRON");
    }
}
