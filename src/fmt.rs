//! Logging shim.
//!
//! Forwards to `defmt` when that feature is enabled, otherwise to `log`, and
//! otherwise expands to nothing beyond borrowing the arguments so that values
//! only used for logging do not trigger unused warnings.
#![allow(unused_macros)]

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        macro_rules! trace {
            ($s:literal $(, $x:expr)* $(,)?) => { ::defmt::trace!($s $(, $x)*) };
        }
        macro_rules! debug {
            ($s:literal $(, $x:expr)* $(,)?) => { ::defmt::debug!($s $(, $x)*) };
        }
        macro_rules! warn {
            ($s:literal $(, $x:expr)* $(,)?) => { ::defmt::warn!($s $(, $x)*) };
        }
        macro_rules! error {
            ($s:literal $(, $x:expr)* $(,)?) => { ::defmt::error!($s $(, $x)*) };
        }
    } else if #[cfg(feature = "log")] {
        macro_rules! trace {
            ($s:literal $(, $x:expr)* $(,)?) => { ::log::trace!($s $(, $x)*) };
        }
        macro_rules! debug {
            ($s:literal $(, $x:expr)* $(,)?) => { ::log::debug!($s $(, $x)*) };
        }
        macro_rules! warn {
            ($s:literal $(, $x:expr)* $(,)?) => { ::log::warn!($s $(, $x)*) };
        }
        macro_rules! error {
            ($s:literal $(, $x:expr)* $(,)?) => { ::log::error!($s $(, $x)*) };
        }
    } else {
        macro_rules! trace {
            ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( &($x) ),*); }};
        }
        macro_rules! debug {
            ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( &($x) ),*); }};
        }
        macro_rules! warn {
            ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( &($x) ),*); }};
        }
        macro_rules! error {
            ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( &($x) ),*); }};
        }
    }
}
