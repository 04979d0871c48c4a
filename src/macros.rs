#[macro_export]
/**
 A compile time assert, mirroring `static_assert` from C++

 # Examples
 ```
 use lsdirs::const_assert;
 const RECORD_ALIGN: usize = 8;
 const_assert!(2 + 2 == 4);
 const_assert!(size_of::<u16>() == 2, "u16 must be 2 bytes!");
 const_assert!(RECORD_ALIGN.is_power_of_two(), "alignment must be a power of two");
 ```
*/
macro_rules! const_assert {
    ($cond:expr $(,)?) => {
        const _: () = {
            if !$cond {
                panic!(concat!("const assertion failed: ", stringify!($cond)));
            }
        };
    };
    ($cond:expr, $($arg:tt)+) => {
        const _: () = {
            if !$cond {
                panic!($($arg)+);
            }
        };
    };
}

/**
 Macro to create a const from an env var with compile-time parsing.

 Uses `option_env` under the hood, so it picks up variables set for rustc
 (including the ones `build.rs` emits through `cargo:rustc-env`).

 `const_from_env!(NAME: usize = "ENV_VAR", DEFAULT);`

 ```
 use lsdirs::const_from_env;
 const_from_env!(MY_LIMIT: usize = "LSDIRS_DOC_UNSET_VAR", 512);
 assert_eq!(MY_LIMIT, 512);
 ```

 # Notes
 - The value is parsed at compile time
 - Environment variables must contain only numeric characters
*/
#[macro_export]
#[allow(clippy::doc_markdown)]
macro_rules! const_from_env {
    ($(#[$meta:meta])* $name:ident: $t:ty = $env:expr, $default:expr) => {
        $(#[$meta])*
        pub const $name: $t = {
            #[allow(clippy::single_call_fn)]
            #[allow(clippy::indexing_slicing)] //this will panic at compile time, intentionally.
            const fn parse_env(s: &str) -> $t {
                let mut n: $t = 0;
                let s_bytes = s.as_bytes();
                let mut i = 0;

                while i < s_bytes.len() {
                    let b = s_bytes[i];
                    match b {
                        b'0'..=b'9' => {
                            n = n * 10 + (b - b'0') as $t;
                        }
                        _ => panic!(concat!("Invalid numeric value in environment variable: ", stringify!($env))),
                    }
                    i += 1;
                }
                n
            }

            match option_env!($env) {
                Some(val) => parse_env(val),
                None => $default as _,
            }
        };
    };
}

/// Grabs `errno` as an `io::Error`, for use straight after a failed libc call
macro_rules! last_os_error {
    () => {
        std::io::Error::last_os_error()
    };
}

/// Runs `fstatat` against a directory descriptor and hands back the `st_mode`
macro_rules! fstatat_mode {
    ($fd:expr, $name:expr, $flags:expr) => {{
        let mut stat_buf = core::mem::MaybeUninit::<libc::stat>::uninit();
        // SAFETY:
        // - `$name` is a valid NUL terminated string (CStr)
        // - `stat_buf` is valid for writes of one `libc::stat`
        let res = unsafe { libc::fstatat($fd, $name, stat_buf.as_mut_ptr(), $flags) };

        if res == 0 {
            // SAFETY: a return code of 0 means the kernel filled the struct
            Ok(unsafe { stat_buf.assume_init() }.st_mode)
        } else {
            Err(last_os_error!())
        }
    }};
}
