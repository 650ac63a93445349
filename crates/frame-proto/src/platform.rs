use std::path::PathBuf;

pub const APP_NAME: &str = "nowplaying-frame";

/// Identifies this program and the platform it runs on. The last.fm API
/// terms require a descriptive User-Agent on every request.
pub fn user_agent() -> String {
    format!(
        "{}/{} ({}; {})",
        APP_NAME,
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH,
        std::env::consts::OS
    )
}

pub fn data_dir() -> PathBuf {
    // On macOS and Linux, use ~/.local/share/nowplaying-frame/ (XDG standard)
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join(APP_NAME)
    }
    #[cfg(windows)]
    {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(APP_NAME)
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_names_program_and_platform() {
        let ua = user_agent();
        assert!(ua.starts_with("nowplaying-frame/"));
        assert!(ua.contains(std::env::consts::OS));
        assert!(ua.contains(std::env::consts::ARCH));
    }
}
