use std::{fmt::Write, path::Path, str::FromStr};

use anyhow::bail;
use serde::Deserialize;
use serde_dynamic_string::DynamicString;
use toml::Value;

use crate::Config;

/// Fields that may reference an unset environment variable. Such a field is
/// dropped and its default applies.
const OPTIONAL_ENV_FIELDS: &[&str] = &["openai.api_key", "openai.base_url", "library.path"];

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    let config = load_str(&content)?;
    log::debug!("Loaded configuration from {}", path.display());

    Ok(config)
}

pub(crate) fn load_str(content: &str) -> anyhow::Result<Config> {
    let mut raw_config: Value = toml::from_str(content)?;

    // Each pass either succeeds or removes one optional field, so this terminates.
    loop {
        let Err(err) = expand_dynamic_strings(&mut Vec::new(), &mut raw_config) else {
            break;
        };

        let Some(path) = optional_field_with_missing_env(&err) else {
            return Err(err);
        };

        if !remove_field(&mut raw_config, &path) {
            return Err(err);
        }
    }

    let config = Config::deserialize(raw_config)?;

    if config.openai.api_key.is_none() {
        log::warn!("No API key configured in [openai], story generation requests will be rejected");
    }

    Ok(config)
}

fn optional_field_with_missing_env(err: &anyhow::Error) -> Option<String> {
    let message = err.to_string();
    let path = extract_path_from_error(&message)?;

    let optional = OPTIONAL_ENV_FIELDS.iter().any(|field| path == *field);

    (optional && is_missing_env_var_error(&message)).then_some(path)
}

fn is_missing_env_var_error(message: &str) -> bool {
    let message = message.to_lowercase();

    message.contains("environment variable not found")
        || message.contains("env var")
        || (message.contains("variable") && message.contains("not found"))
}

/// Pulls `path` out of "Failed to expand dynamic string at path 'path': error".
fn extract_path_from_error(message: &str) -> Option<String> {
    let start = message.find("path '")? + "path '".len();
    let end = message[start..].find("':")?;

    Some(message[start..start + end].to_string())
}

fn remove_field(config: &mut Value, path: &str) -> bool {
    let mut parts: Vec<&str> = path.split('.').collect();

    let Some(key) = parts.pop() else {
        return false;
    };

    let mut current = config;

    for part in parts {
        let Some(value) = current.as_table_mut().and_then(|table| table.get_mut(part)) else {
            return false;
        };

        current = value;
    }

    let removed = current.as_table_mut().and_then(|table| table.remove(key)).is_some();

    if removed {
        log::debug!("Removed optional field '{path}' due to missing environment variable");
    }

    removed
}

fn expand_dynamic_strings<'a>(path: &mut Vec<Result<&'a str, usize>>, value: &'a mut Value) -> anyhow::Result<()> {
    match value {
        Value::String(s) => match DynamicString::<String>::from_str(s) {
            Ok(out) => *s = out.into_inner(),
            Err(err) => {
                let mut p = String::new();

                for segment in path {
                    match segment {
                        Ok(s) => {
                            p.push_str(s);
                            p.push('.');
                        }
                        Err(i) => write!(p, "[{i}]")?,
                    }
                }

                if p.ends_with('.') {
                    p.pop();
                }

                bail!("Failed to expand dynamic string at path '{p}': {err}");
            }
        },
        Value::Array(values) => {
            for (i, value) in values.iter_mut().enumerate() {
                path.push(Err(i));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Table(map) => {
            for (key, value) in map {
                path.push(Ok(key.as_str()));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => (),
    }

    Ok(())
}
