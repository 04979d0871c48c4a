mod utils;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use utils::getdents;
pub use utils::is_dot_or_dot_dot;
