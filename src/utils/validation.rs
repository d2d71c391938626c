//! Centralized URL and identifier validation.

use regex::Regex;

/// Host used in member and family URLs unless configured otherwise
pub const DEFAULT_MEMBER_HOST: &str = "www.pahgncb.com";

const MEMBER_PATH: &str = "/genomedb/public/searchmember";
const FAMILY_PATH: &str = "/genomedb/public/search";

/// Check that a member identifier is a plain ASCII decimal number.
///
/// # Examples
///
/// ```
/// use genefam::utils::validation::is_numeric_id;
///
/// assert!(is_numeric_id("710"));
/// assert!(!is_numeric_id(""));
/// assert!(!is_numeric_id("M710"));
/// ```
#[must_use]
pub fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// The fixed URL layout for member and family pages on one host.
///
/// A member URL must look exactly like
/// `https://<host>/genomedb/public/searchmember?mid=<digits>`.
#[derive(Debug, Clone)]
pub struct UrlScheme {
    host: String,
    member_re: Regex,
}

impl UrlScheme {
    /// Build the scheme for `host`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the escaped pattern fails to compile.
    pub fn new(host: &str) -> Result<Self, regex::Error> {
        let pattern = format!(
            r"^https://{}{}\?mid=([0-9]+)$",
            regex::escape(host),
            regex::escape(MEMBER_PATH)
        );
        Ok(Self {
            host: host.to_string(),
            member_re: Regex::new(&pattern)?,
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether `url` matches the member URL pattern
    #[must_use]
    pub fn is_member_url(&self, url: &str) -> bool {
        self.member_re.is_match(url)
    }

    /// Extract the `mid` value from a conforming member URL
    #[must_use]
    pub fn member_id_from_url<'u>(&self, url: &'u str) -> Option<&'u str> {
        self.member_re
            .captures(url)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// Derive the member URL for `member_id`, or `None` if the id is not numeric
    #[must_use]
    pub fn member_url(&self, member_id: &str) -> Option<String> {
        if is_numeric_id(member_id) {
            Some(format!(
                "https://{}{}?mid={}",
                self.host, MEMBER_PATH, member_id
            ))
        } else {
            None
        }
    }

    /// Default landing page for a family symbol
    #[must_use]
    pub fn family_url(&self, family_symbol: &str) -> String {
        format!("https://{}{}?fs={}", self.host, FAMILY_PATH, family_symbol)
    }
}
