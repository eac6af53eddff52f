//! Content heuristics for catching low-effort spam submissions.
//!
//! Four rules, any one of which rejects: a keyword list scanned across
//! every field, an uppercase ratio and a special-character ratio over the
//! message body, and a link count. The thresholds are tuned for short
//! contact-form messages, not general mail filtering.

use serde::{Deserialize, Serialize};

/// Characters counted by the special-character ratio rule.
const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}\\|;:'\",.<>/?";

/// Configuration for the spam heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpamConfig {
    /// Case-insensitive substrings rejected wherever they appear.
    #[serde(default = "default_keywords")]
    pub keywords: Vec<String>,

    /// Reject when uppercase characters exceed this share of the message.
    #[serde(default = "default_uppercase_ratio")]
    pub uppercase_ratio: f64,

    /// Reject when special characters exceed this share of the message.
    #[serde(default = "default_special_ratio")]
    pub special_ratio: f64,

    /// Messages at or under this length skip the ratio rules.
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Reject when `http` occurs more than this many times in the message.
    #[serde(default = "default_max_links")]
    pub max_links: usize,
}

impl Default for SpamConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            uppercase_ratio: default_uppercase_ratio(),
            special_ratio: default_special_ratio(),
            min_length: default_min_length(),
            max_links: default_max_links(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    [
        "viagra",
        "cialis",
        "casino",
        "lottery",
        "prize",
        "winner",
        "free money",
        "buy now",
        "click here",
        "earn money",
        "make money",
        "investment opportunity",
        "bitcoin",
        "cryptocurrency",
        "forex",
        "weight loss",
        "diet pill",
        "enlargement",
        "cheap medication",
    ]
    .map(str::to_owned)
    .to_vec()
}

const fn default_uppercase_ratio() -> f64 {
    0.5
}

const fn default_special_ratio() -> f64 {
    0.3
}

const fn default_min_length() -> usize {
    20
}

const fn default_max_links() -> usize {
    2
}

/// Stateless spam classifier over the submitted fields.
#[derive(Debug)]
pub struct SpamFilter {
    config: SpamConfig,
}

impl SpamFilter {
    /// Builds a filter, lowercasing the keyword list up front so matching
    /// stays allocation-light per request.
    #[must_use]
    pub fn new(mut config: SpamConfig) -> Self {
        for keyword in &mut config.keywords {
            *keyword = keyword.to_lowercase();
        }
        Self { config }
    }

    /// Classifies a submission. `true` means reject.
    ///
    /// Keywords scan all three fields; the ratio and link rules look at
    /// the message only.
    #[must_use]
    pub fn is_spam(&self, name: &str, email: &str, message: &str) -> bool {
        if self.contains_keyword(name, email, message) {
            tracing::debug!("submission matched a spam keyword");
            return true;
        }
        if self.excessive_uppercase(message) {
            tracing::debug!("submission is mostly uppercase");
            return true;
        }
        if self.excessive_special_chars(message) {
            tracing::debug!("submission is mostly special characters");
            return true;
        }
        if self.too_many_links(message) {
            tracing::debug!("submission contains too many links");
            return true;
        }
        false
    }

    fn contains_keyword(&self, name: &str, email: &str, message: &str) -> bool {
        let fields = [
            name.to_lowercase(),
            email.to_lowercase(),
            message.to_lowercase(),
        ];
        self.config
            .keywords
            .iter()
            .any(|keyword| fields.iter().any(|field| field.contains(keyword.as_str())))
    }

    fn excessive_uppercase(&self, message: &str) -> bool {
        let total = message.chars().count();
        if total <= self.config.min_length {
            return false;
        }
        let uppercase = message.chars().filter(char::is_ascii_uppercase).count();
        ratio(uppercase, total) > self.config.uppercase_ratio
    }

    fn excessive_special_chars(&self, message: &str) -> bool {
        let total = message.chars().count();
        if total <= self.config.min_length {
            return false;
        }
        let special = message
            .chars()
            .filter(|c| SPECIAL_CHARS.contains(*c))
            .count();
        ratio(special, total) > self.config.special_ratio
    }

    fn too_many_links(&self, message: &str) -> bool {
        message.matches("http").count() > self.config.max_links
    }
}

#[allow(clippy::cast_precision_loss, reason = "counts are far below 2^52")]
const fn ratio(part: usize, total: usize) -> f64 {
    part as f64 / total as f64
}
