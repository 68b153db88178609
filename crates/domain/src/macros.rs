//! Macro for implementing wire-label conversions on fieldless enums
//!
//! Generates `as_str`, `Display` and `FromStr` from a single variant-to-label
//! table so the three can never drift apart. Parsing is case-insensitive.
//!
//! # Example
//!
//! ```rust
//! use storectl_domain::impl_wire_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Health {
//!     Online,
//!     Offline,
//! }
//!
//! impl_wire_enum_conversions!(Health {
//!     Online => "online",
//!     Offline => "offline",
//! });
//!
//! assert_eq!(Health::Online.as_str(), "online");
//! assert_eq!("OFFLINE".parse::<Health>(), Ok(Health::Offline));
//! ```

/// Implements `as_str`, `Display` and `FromStr` for a `Copy` enum
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase wire
///   labels
#[macro_export]
macro_rules! impl_wire_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl $enum_name {
            /// Wire label for this variant
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
