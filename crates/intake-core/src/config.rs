use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::NotificationTarget, errors::Error, Result};

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    /// Token of the bot users talk to. Required.
    pub user_facing_bot_token: String,
    /// Token of the bot that relays new applications to admins.
    pub notification_bot_token: Option<String>,
    pub admin_ids: Vec<NotificationTarget>,

    pub database_path: PathBuf,
    pub notify_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let user_facing_bot_token = env_str("USER_FACING_BOT_TOKEN")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("USER_FACING_BOT_TOKEN environment variable is required".to_string())
            })?;
        validate_token_format("USER_FACING_BOT_TOKEN", &user_facing_bot_token)?;

        let notification_bot_token = env_str("NOTIFICATION_BOT_TOKEN").and_then(non_empty);
        if let Some(token) = &notification_bot_token {
            validate_token_format("NOTIFICATION_BOT_TOKEN", token)?;
        }

        let admin_ids = parse_targets(env_str("ADMIN_IDS"));

        let database_path =
            PathBuf::from(env_str("DATABASE_PATH").unwrap_or("base.sqlite".to_string()));
        let notify_timeout =
            Duration::from_millis(env_u64("NOTIFY_TIMEOUT_MS").unwrap_or(10_000));

        Ok(Self {
            user_facing_bot_token,
            notification_bot_token,
            admin_ids,
            database_path,
            notify_timeout,
        })
    }
}

/// Bot tokens look like `<numeric bot id>:<secret>`.
pub fn validate_token_format(name: &str, token: &str) -> Result<()> {
    let Some((id, secret)) = token.trim().split_once(':') else {
        return Err(Error::Config(format!("{name} must contain ':'")));
    };
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Config(format!(
            "{name}: the part before ':' must be numeric"
        )));
    }
    if secret.is_empty() {
        return Err(Error::Config(format!("{name}: secret part is empty")));
    }
    Ok(())
}

/// Numeric bot id embedded in a token (the part before ':').
pub fn bot_id_from_token(token: &str) -> Option<&str> {
    token.split_once(':').map(|(id, _)| id)
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.trim().to_string())
    }
}

fn parse_targets(v: Option<String>) -> Vec<NotificationTarget> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| NotificationTarget(s.to_string()))
        .collect()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}
