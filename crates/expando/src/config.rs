//! Binding a format string to a named config variable.
//!
//! The variable owns its parsed [`Expando`]. Every new value is parsed against
//! the variable's definition table before it replaces the old one, so a
//! variable always holds something renderable.

use std::result::Result as StdResult;

use bitflags::bitflags;
use tracing::debug;

use crate::{
    Expando,
    definition::Definition,
    error::{Error, Result},
};

bitflags! {
    /// Per-variable restrictions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ConfigFlags: u8 {
        /// Reject the empty string instead of unsetting.
        const NOT_EMPTY = 1;
    }
}

/// Extra check run on a parsed value before it is accepted.
pub type Validator = fn(&Expando) -> StdResult<(), String>;

/// Outcome of a successful change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetResult {
    /// The value changed.
    Changed,
    /// The new value equals the old one.
    NoChange,
}

/// A config variable of format-string type.
#[derive(Debug, Clone)]
pub struct ExpandoConfig {
    /// Variable name, used in error messages.
    name: String,
    /// Initial value.
    default_fmt: Option<String>,
    /// Legal codes.
    defs: &'static [Definition],
    /// Restrictions.
    flags: ConfigFlags,
    /// Extra check on new values.
    validator: Option<Validator>,
    /// Current value; `None` when unset.
    value: Option<Expando>,
}

impl ExpandoConfig {
    /// Declare a variable and parse its default.
    pub fn new(
        name: &str,
        default_fmt: Option<&str>,
        defs: &'static [Definition],
        flags: ConfigFlags,
    ) -> Result<Self> {
        let mut cfg = Self {
            name: name.to_string(),
            default_fmt: default_fmt.map(str::to_string),
            defs,
            flags,
            validator: None,
            value: None,
        };
        cfg.value = cfg.parse_value(default_fmt)?;
        Ok(cfg)
    }

    /// Attach a validator. The current value is not re-checked.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Legal codes.
    pub fn definition(&self) -> &'static [Definition] {
        self.defs
    }

    /// The current string, or `None` when unset.
    pub fn get(&self) -> Option<&str> {
        self.value.as_ref().map(Expando::source)
    }

    /// The current parsed value.
    pub fn expando(&self) -> Option<&Expando> {
        self.value.as_ref()
    }

    /// Replace the value. The empty string unsets the variable unless it
    /// is marked [`ConfigFlags::NOT_EMPTY`].
    pub fn set(&mut self, value: &str) -> Result<SetResult> {
        let value = (!value.is_empty()).then_some(value);
        if self.get() == value {
            return Ok(SetResult::NoChange);
        }
        self.value = self.parse_value(value)?;
        debug!(name = %self.name, value = ?value, "set format");
        Ok(SetResult::Changed)
    }

    /// Append to the current value and reparse.
    pub fn plus_equals(&mut self, value: &str) -> Result<SetResult> {
        let joined = format!("{}{value}", self.get().unwrap_or_default());
        self.set(&joined)
    }

    /// Back to the default.
    pub fn reset(&mut self) -> Result<SetResult> {
        let default_fmt = self.default_fmt.clone();
        self.set(default_fmt.as_deref().unwrap_or_default())
    }

    /// Does the value differ from the default?
    pub fn has_been_set(&self) -> bool {
        self.get() != self.default_fmt.as_deref()
    }

    /// Parse and check a candidate value.
    fn parse_value(&self, value: Option<&str>) -> Result<Option<Expando>> {
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            if self.flags.contains(ConfigFlags::NOT_EMPTY) {
                return Err(self.error(format!("Option {} may not be empty", self.name)));
            }
            return Ok(None);
        };
        let exp = Expando::parse(value, self.defs)
            .map_err(|e| self.error(format!("Option {}: {e}", self.name)))?;
        if let Some(validator) = self.validator {
            validator(&exp).map_err(|msg| self.error(format!("Option {}: {msg}", self.name)))?;
        }
        Ok(Some(exp))
    }

    /// A config error for this variable.
    fn error(&self, message: String) -> Error {
        Error::Config {
            name: self.name.clone(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        alias::ALIAS_FORMAT,
        compress::{COMPRESS_FORMAT, valid_command},
    };

    fn alias_format() -> ExpandoConfig {
        ExpandoConfig::new(
            "alias_format",
            Some("%3i %f%t %-15a %-56A | %C%> %Y"),
            ALIAS_FORMAT,
            ConfigFlags::NOT_EMPTY,
        )
        .unwrap()
    }

    #[test]
    fn set_and_reset() {
        let mut cfg = alias_format();
        assert!(!cfg.has_been_set());
        assert_eq!(cfg.set("%a").unwrap(), SetResult::Changed);
        assert_eq!(cfg.get(), Some("%a"));
        assert!(cfg.has_been_set());
        assert_eq!(cfg.set("%a").unwrap(), SetResult::NoChange);
        assert_eq!(cfg.plus_equals(" %C").unwrap(), SetResult::Changed);
        assert_eq!(cfg.get(), Some("%a %C"));
        assert_eq!(cfg.reset().unwrap(), SetResult::Changed);
        assert!(!cfg.has_been_set());
        assert_eq!(cfg.expando().map(Expando::defs), Some(ALIAS_FORMAT));
    }

    #[test]
    fn rejected_values_leave_the_old_one() {
        let mut cfg = alias_format();
        let err = cfg.set("%Q").unwrap_err();
        assert_eq!(err.to_string(), "Option alias_format: Unknown expando: %Q");
        assert_eq!(cfg.get(), Some("%3i %f%t %-15a %-56A | %C%> %Y"));

        let err = cfg.set("").unwrap_err();
        assert_eq!(err.to_string(), "Option alias_format may not be empty");
        assert!(matches!(err, Error::Config { ref name, .. } if name == "alias_format"));
    }

    #[test]
    fn empty_unsets_when_allowed() {
        let mut cfg = ExpandoConfig::new("x", None, ALIAS_FORMAT, ConfigFlags::empty()).unwrap();
        assert_eq!(cfg.get(), None);
        assert_eq!(cfg.set("").unwrap(), SetResult::NoChange);
        cfg.set("%a").unwrap();
        assert_eq!(cfg.set("").unwrap(), SetResult::Changed);
        assert!(cfg.expando().is_none());
    }

    #[test]
    fn bad_default() {
        let err = ExpandoConfig::new("x", Some("%["), ALIAS_FORMAT, ConfigFlags::empty()).unwrap_err();
        assert!(err.to_string().starts_with("Option x: "), "{err}");
    }

    #[test]
    fn validator() {
        fn both_paths(exp: &Expando) -> StdResult<(), String> {
            if valid_command(exp) {
                Ok(())
            } else {
                Err("command must contain %f and %t".into())
            }
        }
        let mut cfg = ExpandoConfig::new("open", None, COMPRESS_FORMAT, ConfigFlags::empty())
            .unwrap()
            .with_validator(both_paths);
        assert!(cfg.set("gzip -cd %f > %t").is_ok());
        let err = cfg.set("gzip -cd %f").unwrap_err();
        assert_eq!(err.to_string(), "Option open: command must contain %f and %t");
        assert_eq!(cfg.get(), Some("gzip -cd %f > %t"));
    }
}
