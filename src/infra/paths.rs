// src/infra/paths.rs — Path management
//
// All paths respect the AFTERSALES_HOME environment variable for isolation.
// When AFTERSALES_HOME is set, all config and data live under that directory.
// When unset, config uses ~/.aftersales/ and data uses XDG_DATA_HOME/aftersales.

use directories::ProjectDirs;
use std::path::PathBuf;
use std::sync::OnceLock;

static PROJECT_DIRS: OnceLock<ProjectDirs> = OnceLock::new();

fn project_dirs() -> &'static ProjectDirs {
    PROJECT_DIRS.get_or_init(|| {
        ProjectDirs::from("", "", "aftersales").expect("Could not determine home directory")
    })
}

/// Returns the AFTERSALES_HOME override, if set.
fn aftersales_home() -> Option<PathBuf> {
    std::env::var_os("AFTERSALES_HOME").map(PathBuf::from)
}

/// Configuration directory: $AFTERSALES_HOME/ or ~/.aftersales/
pub fn config_dir() -> PathBuf {
    if let Some(home) = aftersales_home() {
        return home;
    }
    dirs_home().join(".aftersales")
}

/// Data directory: $AFTERSALES_HOME/data/ or XDG_DATA_HOME/aftersales
pub fn data_dir() -> PathBuf {
    if let Some(home) = aftersales_home() {
        return home.join("data");
    }
    project_dirs().data_local_dir().to_path_buf()
}

/// Home directory
pub fn dirs_home() -> PathBuf {
    directories::BaseDirs::new()
        .expect("Could not determine home directory")
        .home_dir()
        .to_path_buf()
}

/// Session metadata database path
pub fn db_path() -> PathBuf {
    data_dir().join("aftersales_sessions.db")
}

/// Product catalog database path (read-only to this crate)
pub fn catalog_db_path() -> PathBuf {
    data_dir().join("aftersales_products.db")
}

/// Per-session JSON documents
pub fn sessions_dir() -> PathBuf {
    data_dir().join("sessions")
}

/// Downloaded product manuals (PDFs)
pub fn manuals_dir() -> PathBuf {
    data_dir().join("manuals")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Ensure all required directories exist
pub fn ensure_dirs() -> anyhow::Result<()> {
    let dirs = [config_dir(), data_dir(), sessions_dir(), manuals_dir()];

    for dir in &dirs {
        std::fs::create_dir_all(dir)?;
    }

    Ok(())
}
