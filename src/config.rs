use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub gmail: GmailConfig,
    pub oracle: OracleConfig,
    pub triage: TriageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GmailConfig {
    pub credentials_path: String,
    pub token_cache_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OracleConfig {
    pub api_key: String,
    pub model: String,
    /// Per-call timeout in seconds; expiry surfaces as an oracle failure.
    pub timeout_secs: u64,
}

/// Cost-control policy for one run. Both caps bound what is sent to the
/// oracle, so they are configuration rather than hardcoded limits.
#[derive(Debug, Deserialize, Clone)]
pub struct TriageConfig {
    /// Maximum number of most-recent messages fetched per run.
    pub batch_limit: usize,
    /// Maximum body length (in characters) forwarded to the oracle.
    pub content_max_chars: usize,
}

impl Default for TriageConfig {
    fn default() -> Self {
        TriageConfig {
            batch_limit: 10,
            content_max_chars: 500,
        }
    }
}

impl Config {
    pub fn new() -> Result<Self> {
        // Fail early with a help message if the essentials are missing
        Self::check_required_env_vars()?;

        // Configuration loaded from environment variables
        Ok(Config {
            gmail: GmailConfig {
                credentials_path: std::env::var("GMAIL_CREDENTIALS_PATH")
                    .expect("GMAIL_CREDENTIALS_PATH must be set"),
                token_cache_path: std::env::var("GMAIL_TOKEN_CACHE_PATH")
                    .unwrap_or_else(|_| "./gmail-token-cache.json".to_string()),
            },
            oracle: OracleConfig {
                api_key: std::env::var("GEMINI_API_KEY")
                    .expect("GEMINI_API_KEY must be set"),
                model: std::env::var("GEMINI_MODEL")
                    .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
                timeout_secs: std::env::var("GEMINI_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
            triage: TriageConfig {
                batch_limit: std::env::var("TRIAGE_BATCH_LIMIT")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                content_max_chars: std::env::var("TRIAGE_CONTENT_MAX_CHARS")
                    .unwrap_or_else(|_| "500".to_string())
                    .parse()
                    .unwrap_or(500),
            },
        })
    }

    fn check_required_env_vars() -> Result<()> {
        let required_vars = ["GMAIL_CREDENTIALS_PATH", "GEMINI_API_KEY"];

        let mut missing_vars = Vec::new();

        for var in &required_vars {
            if std::env::var(var).is_err() {
                missing_vars.push(*var);
            }
        }

        if !missing_vars.is_empty() {
            anyhow::bail!(
                "Missing environment variables: {}\n\
                 \n\
                 💡 Solutions:\n\
                 1. Create a .env file with your credentials:\n\
                    cp .env.example .env\n\
                    # then edit .env with your values\n\
                 \n\
                 2. Or set the variables manually:\n\
                    export GMAIL_CREDENTIALS_PATH=/path/to/client_credentials.json\n\
                    export GEMINI_API_KEY=your-api-key\n\
                    cargo run -- --dry-run",
                missing_vars.join(", ")
            );
        }

        Ok(())
    }
}
