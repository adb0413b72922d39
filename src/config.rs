//! Configuration loader (C11): defaults, overlaid by the user's config
//! file, overlaid by the distro package-manager config, overlaid by CLI
//! flags.
use std::collections::HashSet;
use std::path::PathBuf;

use ini::Ini;

use crate::localdb::{load_synced_db_config, SyncedDbConfig};
use crate::shell::ColorConfig;
use crate::util::{expand_tilde, human, internal, read, CorralResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub secure: bool,
    pub max_threads: usize,
    pub timeout_secs: u64,
    pub ignore_pkgs: HashSet<String>,
    pub ignore_repos: HashSet<String>,
    pub ignore_out_of_date: bool,
    pub target_dir: PathBuf,
    pub force: bool,
    pub get_deps: bool,
    pub extended_info: bool,
    pub format: Option<String>,
    pub list_delim: String,
    pub color: ColorConfig,
    pub skip_repos: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "aur.archlinux.org".to_string(),
            secure: true,
            max_threads: 10,
            timeout_secs: 10,
            ignore_pkgs: HashSet::new(),
            ignore_repos: HashSet::new(),
            ignore_out_of_date: false,
            target_dir: PathBuf::from("."),
            force: false,
            get_deps: false,
            extended_info: false,
            format: None,
            list_delim: "  ".to_string(),
            color: ColorConfig::Auto,
            skip_repos: false,
        }
    }
}

impl Config {
    /// Build the effective configuration: defaults, then the user's config
    /// file (if present), then CLI overrides (§4.13). Distro config
    /// ingestion (synced DB names / `IgnorePkg`) is loaded separately via
    /// [`Config::load_synced_dbs`] since it needs `alpm`/`pacmanconf`
    /// rather than this struct's own fields.
    pub fn load() -> CorralResult<Config> {
        let mut config = Config::default();
        if let Some(path) = user_config_path() {
            if path.exists() {
                let body = read(&path)?;
                apply_file(&mut config, &body)?;
            }
        }
        Ok(config)
    }

    pub fn load_synced_dbs(&self) -> CorralResult<SyncedDbConfig> {
        let mut synced = load_synced_db_config(self.skip_repos, &self.ignore_repos)?;
        synced.ignore_pkgs.extend(self.ignore_pkgs.iter().cloned());
        Ok(synced)
    }

    /// `targetDir` is tilde-expanded then must resolve to an absolute
    /// path; a relative result is a startup (fatal) error (§4.13).
    pub fn resolve_target_dir(&mut self, raw: &str) -> CorralResult<()> {
        let expanded = expand_tilde(raw);
        if !expanded.is_absolute() {
            return Err(internal(format!(
                "target directory `{}` must resolve to an absolute path",
                raw
            )));
        }
        self.target_dir = expanded;
        Ok(())
    }
}

fn user_config_path() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("cower/config"));
    }
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config/cower/config"))
}

fn apply_file(config: &mut Config, body: &str) -> CorralResult<()> {
    let ini = Ini::load_from_str(body).map_err(|e| human(format!("failed to parse config file: {}", e)))?;
    let section = ini.general_section();

    if let Some(value) = section.get("NoSSL") {
        config.secure = !parse_bool(value);
    }
    if let Some(value) = section.get("IgnoreRepo") {
        config.ignore_repos.extend(value.split_whitespace().map(str::to_string));
    }
    if let Some(value) = section.get("IgnorePkg") {
        config.ignore_pkgs.extend(value.split_whitespace().map(str::to_string));
    }
    if let Some(value) = section.get("IgnoreOOD") {
        config.ignore_out_of_date = parse_bool(value);
    }
    if let Some(value) = section.get("TargetDir") {
        config.resolve_target_dir(value)?;
    }
    if let Some(value) = section.get("MaxThreads") {
        config.max_threads = value
            .parse()
            .map_err(|_| human(format!("invalid MaxThreads value `{}`", value)))?;
    }
    if let Some(value) = section.get("ConnectTimeout") {
        config.timeout_secs = value
            .parse()
            .map_err(|_| human(format!("invalid ConnectTimeout value `{}`", value)))?;
    }
    if let Some(value) = section.get("Color") {
        config.color = value
            .parse()
            .map_err(|_| human(format!("invalid Color value `{}`", value)))?;
    }
    Ok(())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "True" | "yes" | "Yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_keys() {
        let mut config = Config::default();
        let body = "\
# a comment
NoSSL = true
IgnorePkg = foo bar
IgnoreRepo = community
MaxThreads = 4
ConnectTimeout = 30
Color = always
";
        apply_file(&mut config, body).unwrap();
        assert!(!config.secure);
        assert_eq!(config.max_threads, 4);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.color, ColorConfig::Always);
        assert!(config.ignore_pkgs.contains("foo"));
        assert!(config.ignore_pkgs.contains("bar"));
        assert!(config.ignore_repos.contains("community"));
    }

    #[test]
    fn rejects_relative_target_dir() {
        let mut config = Config::default();
        assert!(apply_file(&mut config, "TargetDir = relative/path\n").is_err());
    }
}
