//! Platform queries: privileges and kernel naming.

/// Check if running as root.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() is a simple syscall that returns the effective user ID
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// The operating system name in the GNU style used by release descriptions
/// (`GNU/Linux`, `GNU/kFreeBSD`, ...).
pub fn gnu_os_name() -> &'static str {
    gnu_os_name_for(std::env::consts::OS)
}

fn gnu_os_name_for(os: &str) -> &'static str {
    match os {
        "linux" => "GNU/Linux",
        "freebsd" => "GNU/kFreeBSD",
        "netbsd" => "GNU/NetBSD",
        "hurd" => "GNU/Hurd",
        _ => "GNU",
    }
}
