//! Macro for implementing Display and FromStr for status enums
//!
//! # Example
//!
//! ```rust
//! use reeltime_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ProbeStatus {
//!     Ok,
//!     Failed,
//! }
//!
//! impl_domain_status_conversions!(ProbeStatus {
//!     Ok => "ok",
//!     Failed => "failed",
//! });
//!
//! assert_eq!(ProbeStatus::Failed.to_string(), "failed");
//! assert_eq!("OK".parse::<ProbeStatus>().unwrap(), ProbeStatus::Ok);
//! ```

/// Implements Display and FromStr traits for status enums
///
/// - Display writes the mapped string
/// - FromStr parses case-insensitively and reports the enum name on failure
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
