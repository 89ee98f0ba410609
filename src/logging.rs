// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Logging macros shared by the library and the firmware binary.
//!
//! - `firmware` feature: forwards to `defmt` (RTT transport is linked by the binary).
//! - Host unit tests: prints to stdout/stderr.
//! - Anything else: no-op, but the arguments are still type-checked.
//!
//! Values passed to these macros must implement `Display`/`Debug` for the host and
//! `defmt::Format` for the firmware, so stick to primitives and the crate's own enums.

/// Log an informational message.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "firmware")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "firmware"), test))]
        println!("[INFO] {}", format!($($arg)*));

        #[cfg(all(not(feature = "firmware"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

/// Log a warning.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "firmware")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "firmware"), test))]
        println!("[WARN] {}", format!($($arg)*));

        #[cfg(all(not(feature = "firmware"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

/// Log an error.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "firmware")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "firmware"), test))]
        eprintln!("[ERROR] {}", format!($($arg)*));

        #[cfg(all(not(feature = "firmware"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

/// Log a debug message.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "firmware")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "firmware"), test))]
        println!("[DEBUG] {}", format!($($arg)*));

        #[cfg(all(not(feature = "firmware"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}
