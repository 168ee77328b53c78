use std::path::{Path, PathBuf};

pub const BRIEF_FILE_NAME: &str = "daily_brief.json";

pub fn get_root_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trendscout")
}

/// Default location of the TOML settings file
pub fn get_config_path() -> PathBuf {
    get_root_config_dir().join("config.toml")
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("trendscout")
}

/// Get the path for the daily brief inside an output directory
pub fn get_brief_path(output_dir: &Path) -> PathBuf {
    output_dir.join(BRIEF_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brief_lands_in_output_dir() {
        assert_eq!(
            get_brief_path(Path::new("data")),
            PathBuf::from("data/daily_brief.json")
        );
    }

    #[test]
    fn app_dirs_are_namespaced() {
        assert!(get_config_path().ends_with("trendscout/config.toml"));
        assert!(get_root_cache_dir().ends_with("trendscout"));
    }
}
