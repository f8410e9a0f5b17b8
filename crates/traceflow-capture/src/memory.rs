//! Process memory reading recorded on request and response events

use sysinfo::{Pid, System};

/// Resident memory of the current process, in megabytes
///
/// Reads 0.0 when the process cannot be inspected rather than failing the
/// capture path.
pub fn resident_mb() -> f64 {
    let pid = Pid::from_u32(std::process::id());
    let mut system = System::new();
    system.refresh_process(pid);

    system
        .process(pid)
        .map(|process| process.memory() as f64 / 1024.0 / 1024.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resident_mb_is_positive_for_self() {
        assert!(resident_mb() > 0.0);
    }
}
