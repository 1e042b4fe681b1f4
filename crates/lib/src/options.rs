//! Typed build option tokens.
//!
//! Option strings coming from configuration or from the host's build flags are
//! split once, at ingestion, into [`BuildOption`] values. A token is either a
//! preprocessor define (`-DNAME` / `-DNAME=VALUE`) or an opaque option. Both
//! keep their original spelling so they can be forwarded unmodified.
//!
//! # Example
//!
//! ```
//! use depbuild_lib::options::{BuildOption, OptionList};
//!
//! let opts = OptionList::parse("-DLT_USE_TREZOR_CRYPTO=1 -Wall").unwrap();
//! assert_eq!(opts.tokens(), vec!["-DLT_USE_TREZOR_CRYPTO=1", "-Wall"]);
//! assert!(matches!(opts.iter().next(), Some(BuildOption::Define { .. })));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while ingesting option strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
  /// The option string has an unterminated quote or a dangling escape.
  #[error("unbalanced quoting in option string: {0}")]
  Unbalanced(String),

  /// A `-D` token without a macro name.
  #[error("define token without a name: '{0}'")]
  EmptyDefine(String),
}

/// A single build option token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BuildOption {
  /// A preprocessor define, `-DNAME` or `-DNAME=VALUE`.
  Define {
    token: String,
    name: String,
    value: Option<String>,
  },

  /// Anything else. Passed through as-is.
  Generic(String),
}

impl BuildOption {
  /// Classify a single token.
  pub fn parse(token: &str) -> Result<Self, OptionError> {
    let Some(rest) = token.strip_prefix("-D") else {
      return Ok(BuildOption::Generic(token.to_string()));
    };

    let (name, value) = match rest.split_once('=') {
      Some((name, value)) => (name, Some(value.to_string())),
      None => (rest, None),
    };

    if name.trim().is_empty() {
      return Err(OptionError::EmptyDefine(token.to_string()));
    }

    Ok(BuildOption::Define {
      token: token.to_string(),
      name: name.to_string(),
      value,
    })
  }

  /// The token exactly as supplied.
  pub fn as_token(&self) -> &str {
    match self {
      BuildOption::Define { token, .. } => token,
      BuildOption::Generic(token) => token,
    }
  }

  pub fn is_define(&self) -> bool {
    matches!(self, BuildOption::Define { .. })
  }

  /// The define in `NAME` or `NAME=VALUE` form, as a host `CPPDEFINES` entry.
  pub fn define_entry(&self) -> Option<String> {
    match self {
      BuildOption::Define { name, value: Some(value), .. } => Some(format!("{}={}", name, value)),
      BuildOption::Define { name, value: None, .. } => Some(name.clone()),
      BuildOption::Generic(_) => None,
    }
  }
}

impl fmt::Display for BuildOption {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_token())
  }
}

impl TryFrom<String> for BuildOption {
  type Error = OptionError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    BuildOption::parse(&value)
  }
}

impl From<BuildOption> for String {
  fn from(value: BuildOption) -> Self {
    value.as_token().to_string()
  }
}

/// An ordered list of option tokens.
///
/// Order is preserved and tokens are never deduplicated: later defines may
/// intentionally override earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionList(Vec<BuildOption>);

impl OptionList {
  pub fn new() -> Self {
    Self(Vec::new())
  }

  /// Shell-split an option string and classify every token.
  pub fn parse(input: &str) -> Result<Self, OptionError> {
    let tokens = shlex::split(input).ok_or_else(|| OptionError::Unbalanced(input.to_string()))?;
    Self::from_tokens(tokens)
  }

  /// Classify already-split tokens.
  pub fn from_tokens<I, S>(tokens: I) -> Result<Self, OptionError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    tokens
      .into_iter()
      .map(|t| BuildOption::parse(t.as_ref()))
      .collect::<Result<Vec<_>, _>>()
      .map(Self)
  }

  pub fn push(&mut self, option: BuildOption) {
    self.0.push(option);
  }

  pub fn iter(&self) -> std::slice::Iter<'_, BuildOption> {
    self.0.iter()
  }

  /// Only the define tokens, in order.
  pub fn defines(&self) -> impl Iterator<Item = &BuildOption> {
    self.0.iter().filter(|o| o.is_define())
  }

  /// The raw tokens, in order.
  pub fn tokens(&self) -> Vec<String> {
    self.0.iter().map(|o| o.as_token().to_string()).collect()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl Extend<BuildOption> for OptionList {
  fn extend<T: IntoIterator<Item = BuildOption>>(&mut self, iter: T) {
    self.0.extend(iter);
  }
}

impl FromIterator<BuildOption> for OptionList {
  fn from_iter<T: IntoIterator<Item = BuildOption>>(iter: T) -> Self {
    Self(iter.into_iter().collect())
  }
}

impl<'a> IntoIterator for &'a OptionList {
  type Item = &'a BuildOption;
  type IntoIter = std::slice::Iter<'a, BuildOption>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn define_with_value() {
    let opt = BuildOption::parse("-DLT_USE_TREZOR_CRYPTO=1").unwrap();
    assert_eq!(
      opt,
      BuildOption::Define {
        token: "-DLT_USE_TREZOR_CRYPTO=1".to_string(),
        name: "LT_USE_TREZOR_CRYPTO".to_string(),
        value: Some("1".to_string()),
      }
    );
    assert_eq!(opt.define_entry().unwrap(), "LT_USE_TREZOR_CRYPTO=1");
  }

  #[test]
  fn define_without_value() {
    let opt = BuildOption::parse("-DNDEBUG").unwrap();
    assert_eq!(opt.define_entry().unwrap(), "NDEBUG");
    assert_eq!(opt.as_token(), "-DNDEBUG");
  }

  #[test]
  fn empty_define_is_rejected() {
    assert_eq!(
      BuildOption::parse("-D").unwrap_err(),
      OptionError::EmptyDefine("-D".to_string())
    );
    assert!(BuildOption::parse("-D=1").is_err());
  }

  #[test]
  fn generic_tokens_pass_through() {
    let opt = BuildOption::parse("-std=gnu++17").unwrap();
    assert_eq!(opt, BuildOption::Generic("-std=gnu++17".to_string()));
    assert!(opt.define_entry().is_none());
  }

  #[test]
  fn parse_preserves_order_and_duplicates() {
    let opts = OptionList::parse("-DA=1 -Wall -DA=2").unwrap();
    assert_eq!(opts.tokens(), vec!["-DA=1", "-Wall", "-DA=2"]);
    assert_eq!(opts.defines().count(), 2);
  }

  #[test]
  fn parse_honours_quotes() {
    let opts = OptionList::parse(r#"-DNAME="hello world" -O2"#).unwrap();
    assert_eq!(opts.tokens(), vec!["-DNAME=hello world", "-O2"]);
  }

  #[test]
  fn parse_rejects_unbalanced_quotes() {
    assert!(matches!(
      OptionList::parse("-DNAME=\"oops"),
      Err(OptionError::Unbalanced(_))
    ));
  }

  #[test]
  fn empty_string_is_empty_list() {
    assert!(OptionList::parse("").unwrap().is_empty());
  }

  #[test]
  fn serde_uses_plain_tokens() {
    let opts = OptionList::parse("-DX -g").unwrap();
    let json = serde_json::to_string(&opts).unwrap();
    assert_eq!(json, r#"["-DX","-g"]"#);
    let back: OptionList = serde_json::from_str(&json).unwrap();
    assert_eq!(back, opts);
  }
}
