//! Bridge capability set
//!
//! The kiosk shell exposes an optional set of functions. Presence of each
//! one is probed independently; a missing function routes callers to a
//! fallback instead of raising.

use serde::{Deserialize, Serialize};

/// Wire names of the shell functions, as advertised in the handshake.
pub const FN_PRINT_IMAGE: &str = "printImage";
pub const FN_PRINT_TICKET: &str = "printTicket";
pub const FN_OPEN_CASHBOX: &str = "openCashbox";
pub const FN_START_SCANNER: &str = "startScanner";

/// Which functions a connected shell exposes.
///
/// Defaults to nothing; every field must be proven by the handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeCapabilities {
    pub print_image: bool,
    pub print_ticket: bool,
    pub open_cashbox: bool,
    pub scanner: bool,
}

impl BridgeCapabilities {
    /// A shell that advertises nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// A shell that advertises every function (useful for in-process bridges).
    pub fn full() -> Self {
        Self {
            print_image: true,
            print_ticket: true,
            open_cashbox: true,
            scanner: true,
        }
    }

    /// Build a capability set from advertised function names.
    ///
    /// Unknown names are ignored so newer shells stay compatible.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut caps = Self::none();
        for name in names {
            match name {
                FN_PRINT_IMAGE => caps.print_image = true,
                FN_PRINT_TICKET => caps.print_ticket = true,
                FN_OPEN_CASHBOX => caps.open_cashbox = true,
                FN_START_SCANNER => caps.scanner = true,
                _ => {}
            }
        }
        caps
    }

    /// True when at least one print function is available.
    pub fn has_print_path(&self) -> bool {
        self.print_image || self.print_ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_names() {
        let caps = BridgeCapabilities::from_names(["printTicket", "openCashbox"]);
        assert!(caps.print_ticket);
        assert!(caps.open_cashbox);
        assert!(!caps.print_image);
        assert!(!caps.scanner);
    }

    #[test]
    fn test_from_names_ignores_unknown() {
        let caps = BridgeCapabilities::from_names(["printTicket", "selfDestruct"]);
        assert!(caps.print_ticket);
        assert_eq!(
            caps,
            BridgeCapabilities {
                print_ticket: true,
                ..BridgeCapabilities::none()
            }
        );
    }

    #[test]
    fn test_print_path() {
        assert!(!BridgeCapabilities::none().has_print_path());
        assert!(BridgeCapabilities::from_names(["printImage"]).has_print_path());
        assert!(BridgeCapabilities::from_names(["printTicket"]).has_print_path());
    }
}
