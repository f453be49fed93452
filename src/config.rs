use serde::Deserialize;
use std::{env, fs, path::Path, path::PathBuf};

/// Default token validity in seconds (1 hour).
pub const DEFAULT_EXPIRE_SECONDS: u64 = 3600;

/// Longest accepted token validity in seconds (one year).
pub const MAX_EXPIRE_SECONDS: u64 = 365 * 24 * 3600;

#[derive(Debug, Deserialize)]
pub struct MembersFile {
    pub members: Vec<MemberConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MemberConfig {
    pub id: u64,
    pub email: String,
    /// Argon2id PHC string, see `auth-gate hash-password`
    pub password_hash: String,
    #[serde(default)]
    pub age: Option<u32>,
}

/// Token signing settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expire_seconds: u64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expire_seconds: DEFAULT_EXPIRE_SECONDS,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.secret.trim().is_empty() {
            return Err(anyhow::anyhow!("JWT secret must not be empty"));
        }
        if self.expire_seconds == 0 || self.expire_seconds > MAX_EXPIRE_SECONDS {
            return Err(anyhow::anyhow!(
                "JWT expiry must be between 1 and {} seconds, got {}",
                MAX_EXPIRE_SECONDS,
                self.expire_seconds
            ));
        }
        Ok(())
    }
}

pub fn resolve_members_path() -> anyhow::Result<PathBuf> {
    if let Ok(p) = env::var("AUTH_GATE_MEMBERS") {
        return Ok(PathBuf::from(p));
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let candidate = PathBuf::from(xdg).join("auth-gate").join("members.json");
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let candidate = PathBuf::from("members.json");
    if candidate.exists() {
        return Ok(candidate);
    }

    Err(anyhow::anyhow!(
        "Could not find members.json (set AUTH_GATE_MEMBERS or create ./members.json)"
    ))
}

fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next(); // consume '{'
            let mut name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
            if let Ok(val) = env::var(&name) {
                out.push_str(&val);
            } else {
                out.push_str("${");
                out.push_str(&name);
                out.push('}');
            }
        } else {
            out.push(ch);
        }
    }

    out
}

fn expand_member(cfg: MemberConfig) -> MemberConfig {
    MemberConfig {
        email: expand_env_vars(&cfg.email),
        password_hash: expand_env_vars(&cfg.password_hash),
        ..cfg
    }
}

pub fn load_members_from(path: &Path) -> anyhow::Result<Vec<MemberConfig>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let cfg: MembersFile = serde_json::from_str(&raw)?;

    Ok(cfg.members.into_iter().map(expand_member).collect())
}

pub fn load_members() -> anyhow::Result<Vec<MemberConfig>> {
    let path = resolve_members_path()?;
    load_members_from(&path)
}
