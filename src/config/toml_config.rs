use crate::domain::policy::LendingPolicy;
use crate::utils::error::{LendingError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_unique, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound for day-valued policy settings.
const MAX_POLICY_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub policy: LendingPolicy,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub snapshot_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            snapshot_file: "library.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedBook {
    pub code: String,
    pub title: String,
    pub author: String,
    pub stock: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedMember {
    pub code: String,
    pub name: String,
}

/// Catalog loaded into an empty store on first start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub books: Vec<SeedBook>,
    pub members: Vec<SeedMember>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        let book = |code: &str, title: &str, author: &str| SeedBook {
            code: code.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            stock: 1,
        };
        let member = |code: &str, name: &str| SeedMember {
            code: code.to_string(),
            name: name.to_string(),
        };

        Self {
            books: vec![
                book("JK-45", "Harry Potter", "J.K Rowling"),
                book("SHR-1", "A Study in Scarlet", "Arthur Conan Doyle"),
                book("TW-11", "Twilight", "Stephenie Meyer"),
                book("HOB-83", "The Hobbit, or There and Back Again", "J.R.R. Tolkien"),
                book("NRN-7", "The Lion, the Witch and the Wardrobe", "C.S. Lewis"),
            ],
            members: vec![
                member("M001", "Angga"),
                member("M002", "Ferry"),
                member("M003", "Putri"),
            ],
        }
    }
}

impl LibraryConfig {
    /// Load from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// Like `from_file`, but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            tracing::debug!(
                "Config file {} not found, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replace `${VAR}` with the environment value; unknown variables stay as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| LendingError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for LibraryConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number(
            "policy.max_active_borrowings",
            self.policy.max_active_borrowings,
            1,
        )?;
        validate_range(
            "policy.loan_period_days",
            self.policy.loan_period_days,
            1,
            MAX_POLICY_DAYS,
        )?;
        validate_range(
            "policy.penalty_days",
            self.policy.penalty_days,
            1,
            MAX_POLICY_DAYS,
        )?;

        validate_path("storage.data_dir", &self.storage.data_dir)?;
        validate_path("storage.snapshot_file", &self.storage.snapshot_file)?;

        for book in &self.seed.books {
            validate_non_empty_string("seed.books.code", &book.code)?;
            validate_non_empty_string("seed.books.title", &book.title)?;
            validate_non_empty_string("seed.books.author", &book.author)?;
        }
        for member in &self.seed.members {
            validate_non_empty_string("seed.members.code", &member.code)?;
            validate_non_empty_string("seed.members.name", &member.name)?;
        }
        validate_unique("seed.books.code", self.seed.books.iter().map(|b| b.code.as_str()))?;
        validate_unique(
            "seed.members.code",
            self.seed.members.iter().map(|m| m.code.as_str()),
        )?;

        Ok(())
    }
}
