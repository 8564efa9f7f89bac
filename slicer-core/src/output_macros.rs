//! Output macros for user-facing CLI text.
//!
//! Command results go to stdout, diagnostics to stderr, so that output such
//! as userdata scripts and devices JSON stays pipeable.

#[macro_export]
macro_rules! slicer_println {
    () => {
        println!();
    };
    ($($arg:tt)*) => {
        println!("{}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! slicer_error {
    ($($arg:tt)*) => {
        eprintln!("{}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! slicer_warning {
    ($($arg:tt)*) => {
        eprintln!("⚠ {}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! slicer_progress {
    ($($arg:tt)*) => {
        eprintln!("▶ {}", format!($($arg)*));
    }
}

#[macro_export]
macro_rules! slicer_hint {
    ($($arg:tt)*) => {
        eprintln!("💡 {}", format!($($arg)*));
    }
}
