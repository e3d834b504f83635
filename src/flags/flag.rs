//! Typed parameter handles.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

/// A type that can back a [`Flag`].
pub trait FlagValue: Clone + fmt::Display + Send + Sync + 'static {
    /// Placeholder shown in `--help` output.
    const KIND: &'static str;

    /// Parses a raw command-line or environment value.
    fn parse_flag(raw: &str) -> Result<Self, String>;

    /// Bool flags accept a bare `--name` meaning `true`.
    fn is_switch() -> bool {
        false
    }
}

impl FlagValue for String {
    const KIND: &'static str = "STRING";

    fn parse_flag(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl FlagValue for bool {
    const KIND: &'static str = "BOOL";

    fn parse_flag(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" | "yes" | "on" => Ok(true),
            "0" | "f" | "false" | "no" | "off" | "" => Ok(false),
            other => Err(format!("`{other}` is not a boolean")),
        }
    }

    fn is_switch() -> bool {
        true
    }
}

macro_rules! numeric_flag {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl FlagValue for $ty {
                const KIND: &'static str = $kind;

                fn parse_flag(raw: &str) -> Result<Self, String> {
                    raw.trim().parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

numeric_flag!(i64 => "INT", u64 => "UINT", u16 => "UINT", f64 => "FLOAT");

struct FlagInner<T> {
    name: String,
    help: String,
    default: T,
    value: ArcSwap<T>,
}

/// Handle to one named, typed parameter.
///
/// Cloning is cheap; the component keeps one clone and registers another into
/// the [`FlagSet`](crate::FlagSet). After parsing, [`Flag::get`] returns the
/// resolved value.
pub struct Flag<T: FlagValue> {
    inner: Arc<FlagInner<T>>,
}

impl<T: FlagValue> Flag<T> {
    pub fn new(name: impl Into<String>, default: T, help: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(FlagInner {
                name: name.into(),
                help: help.into(),
                value: ArcSwap::from_pointee(default.clone()),
                default,
            }),
        }
    }

    /// Builds `"{prefix}-{name}"`, or just `name` when the prefix is empty.
    pub fn prefixed(prefix: &str, name: &str, default: T, help: impl Into<String>) -> Self {
        let full = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}-{name}")
        };
        Self::new(full, default, help)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn help(&self) -> &str {
        &self.inner.help
    }

    pub fn default_value(&self) -> &T {
        &self.inner.default
    }

    /// Current value (the default until parsed).
    pub fn get(&self) -> T {
        T::clone(&self.inner.value.load())
    }

    /// Overrides the value directly, mostly useful in tests.
    pub fn set(&self, value: T) {
        self.inner.value.store(Arc::new(value));
    }

    pub(crate) fn erased(&self) -> Arc<dyn AnyFlag> {
        self.inner.clone()
    }
}

impl<T: FlagValue> Clone for Flag<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: FlagValue + fmt::Debug> fmt::Debug for Flag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("name", &self.inner.name)
            .field("value", &self.get())
            .finish()
    }
}

/// Type-erased view the [`FlagSet`](crate::FlagSet) works with.
pub(crate) trait AnyFlag: Send + Sync {
    fn name(&self) -> &str;
    fn help(&self) -> &str;
    fn kind(&self) -> &'static str;
    fn is_switch(&self) -> bool;
    fn set_raw(&self, raw: &str) -> Result<(), String>;
    fn render(&self) -> String;
}

impl<T: FlagValue> AnyFlag for FlagInner<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn help(&self) -> &str {
        &self.help
    }

    fn kind(&self) -> &'static str {
        T::KIND
    }

    fn is_switch(&self) -> bool {
        T::is_switch()
    }

    fn set_raw(&self, raw: &str) -> Result<(), String> {
        let parsed = T::parse_flag(raw)?;
        self.value.store(Arc::new(parsed));
        Ok(())
    }

    fn render(&self) -> String {
        self.value.load().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_names() {
        let f = Flag::prefixed("s3", "bucket", String::new(), "bucket name");
        assert_eq!(f.name(), "s3-bucket");
        let g = Flag::prefixed("", "app-env", "dev".to_string(), "env");
        assert_eq!(g.name(), "app-env");
    }

    #[test]
    fn clones_share_the_value() {
        let f = Flag::new("port", 3000u16, "listen port");
        let registered = f.clone();
        registered.erased().set_raw("8080").unwrap();
        assert_eq!(f.get(), 8080);
        assert_eq!(*f.default_value(), 3000);
    }

    #[test]
    fn bool_parsing() {
        assert_eq!(bool::parse_flag("TRUE"), Ok(true));
        assert_eq!(bool::parse_flag("0"), Ok(false));
        assert!(bool::parse_flag("maybe").is_err());
    }

    #[test]
    fn numeric_parse_errors_are_reported() {
        let f = Flag::new("rate", 1.0f64, "sample rate");
        assert!(f.erased().set_raw("fast").is_err());
        assert_eq!(f.get(), 1.0);
    }
}
