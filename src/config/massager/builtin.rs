use std::path::{Path, PathBuf};

use super::{Massager, MassagerKey, ANY_GROUP};
use crate::config::hooks::Hooks;
use crate::config::names::Names;
use crate::config::value::StartupScript;
use crate::config::ConfigError;

const GZIP_PREFIX: &str = "gzip:";
const CURRENT_USER: &str = "*";

pub(super) fn boolean(raw: &str) -> Option<bool> {
    const TRUE: [&str; 3] = ["true", "yes", "on"];
    const FALSE: [&str; 3] = ["false", "no", "off"];

    if TRUE.iter().any(|t| raw.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| raw.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

/// Expands a leading `~` and joins relative paths to `base`.
pub(super) fn absolute_path(raw: &str, base: Option<&Path>) -> PathBuf {
    let path = PathBuf::from(shellexpand::tilde(raw).into_owned());
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path,
    }
}

pub(super) fn startup_script(raw: &str, base: Option<&Path>) -> StartupScript {
    let (raw, gzip) = match raw.strip_prefix(GZIP_PREFIX) {
        Some(rest) => (rest, true),
        None => (raw, false),
    };
    StartupScript {
        path: absolute_path(raw, base),
        gzip,
    }
}

pub(super) fn hooks(raw: &str, names: &Names) -> Result<Hooks, ConfigError> {
    let mut hooks = Hooks::new();
    for name in raw.split_whitespace() {
        let factory = names.hooks.resolve(name)?;
        hooks.add(factory());
    }
    Ok(hooks)
}

/// Parses `group:key = dotted.Name` lines, skipping blank ones.
pub(super) fn massager_list(raw: &str, names: &Names) -> Result<Vec<Massager>, ConfigError> {
    let mut massagers = Vec::new();
    for line in raw.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let (key, factory) = parse_declaration(line)?;
        let factory = names.massagers.resolve(factory)?;
        massagers.push(factory(key));
    }
    Ok(massagers)
}

fn parse_declaration(line: &str) -> Result<(MassagerKey, &str), ConfigError> {
    let malformed = || ConfigError::MalformedMassagerSpec(line.to_string());

    let (target, dotted) = line.split_once('=').ok_or_else(malformed)?;
    let (group, key) = target.split_once(':').ok_or_else(malformed)?;
    let (group, key, dotted) = (group.trim(), key.trim(), dotted.trim());
    if dotted.contains('=') || key.contains(':') || [group, key, dotted].contains(&"") {
        return Err(malformed());
    }

    let key = if group == ANY_GROUP {
        MassagerKey::any_group(key)
    } else {
        MassagerKey::new(group, key)
    };
    Ok((key, dotted))
}

pub(super) fn user(raw: &str) -> Result<String, ConfigError> {
    if raw == CURRENT_USER {
        current_user()
    } else {
        Ok(raw.to_string())
    }
}

#[cfg(unix)]
fn current_user() -> Result<String, ConfigError> {
    use nix::unistd::{getuid, User};

    let uid = getuid();
    match User::from_uid(uid) {
        Ok(Some(user)) => Ok(user.name),
        Ok(None) => Err(ConfigError::UnknownUser(format!("no passwd entry for uid {uid}"))),
        Err(e) => Err(ConfigError::UnknownUser(e.to_string())),
    }
}

#[cfg(not(unix))]
fn current_user() -> Result<String, ConfigError> {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .map_err(|e| ConfigError::UnknownUser(e.to_string()))
}
