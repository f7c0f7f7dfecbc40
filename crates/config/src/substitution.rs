use anyhow::Result;
use regex::{Captures, Regex};
use std::env;
use tracing::{debug, warn};

const PLACEHOLDER: &str = r"\$\{(\w+)(?::-([^}]*))?\}";

/// Substitute environment variables in the format ${VAR_NAME} or
/// ${VAR_NAME:-default}
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(PLACEHOLDER)?;
    let mut missing_vars = Vec::new();

    let result = re.replace_all(content, |caps: &Captures| {
        let var_name = &caps[1];
        match (env::var(var_name), caps.get(2)) {
            (Ok(value), _) => {
                debug!("Substituting environment variable: {} = \"{}\"", var_name, value);
                value
            }
            (Err(_), Some(default)) => {
                debug!("Environment variable '{}' not set, using default: \"{}\"", var_name, default.as_str());
                default.as_str().to_string()
            }
            (Err(_), None) => {
                warn!("Environment variable '{}' not set", var_name);
                missing_vars.push(var_name.to_string());
                // Keep the placeholder; parsing will reject it
                caps[0].to_string()
            }
        }
    });

    if !missing_vars.is_empty() {
        debug!("Environment variables not set: {:?}", missing_vars);
    }

    Ok(result.into_owned())
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> Result<bool> {
    Ok(Regex::new(PLACEHOLDER)?.is_match(content))
}
