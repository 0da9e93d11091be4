//! Secret references in credential fields.
//!
//! A credential value in `config.toml` is one of:
//!
//! - `env::VAR_NAME`: read from the environment
//! - `pass::path/in/store`: first line of `pass show path/in/store`
//! - anything else: the literal value

use std::process::Command;

/// A parsed credential value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretRef<'a> {
    Env(&'a str),
    Pass(&'a str),
    Plain(&'a str),
}

impl<'a> SecretRef<'a> {
    pub fn parse(value: &'a str) -> Self {
        if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var)
        } else if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path)
        } else {
            Self::Plain(value)
        }
    }

    /// Produces the secret value.
    pub fn resolve(&self) -> Result<String, String> {
        match *self {
            Self::Env(var) => std::env::var(var)
                .map_err(|_| format!("environment variable `{}` is not set", var)),
            Self::Pass(path) => read_pass(path),
            Self::Plain(value) => Ok(value.to_string()),
        }
    }

    /// Whether the value lives outside the config file.
    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::Plain(_))
    }
}

/// Resolves a credential value that may be a secret reference.
pub fn resolve(value: &str) -> Result<String, String> {
    SecretRef::parse(value).resolve()
}

fn read_pass(path: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .args(["show", path])
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        return Err(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` printed nothing", path))
}
