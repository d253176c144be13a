//! Pre-built mock filesystem scenarios for testing.
//!
//! These model `/proc` as it looks while a system is still booting.

use super::filesystem::MockFs;

impl MockFs {
    /// Creates a `/proc` mid-boot, before the boot-complete marker exists.
    ///
    /// Includes init (PID 1), kthreadd, a udev daemon and a getty, plus the
    /// non-process entries a real `/proc` listing contains.
    pub fn early_boot() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/uptime", "12.34 5.67\n");
        fs.add_file(
            "/proc/stat",
            "\
cpu  120 0 340 5600 80 0 12 0 0 0
cpu0 120 0 340 5600 80 0 12 0 0 0
intr 10432 9 0 0 0 0 0 0 0 1 0 0 0 100 0 0 0
ctxt 20480
btime 1700000000
processes 312
procs_running 2
procs_blocked 1
",
        );
        fs.add_file(
            "/proc/diskstats",
            "   179       0 mmcblk0 1024 12 40960 880 16 4 160 40 0 700 920 0 0 0 0\n",
        );
        fs.add_file(
            "/proc/version",
            "Linux version 2.6.24 (builder@openmoko) (gcc version 4.1.2) #1 PREEMPT\n",
        );
        fs.add_file("/proc/cmdline", "console=ttySAC2,115200 init=/sbin/bootchartd\n");
        fs.add_file("/proc/self/stat", "77 (bootchartd) R 1 77 77 0 -1\n");
        fs.add_file("/proc/cpuinfo", "Processor\t: ARM920T rev 0 (v4l)\n");

        fs.add_process(1, "init", 'S');
        fs.add_process(2, "kthreadd", 'S');
        fs.add_process(45, "udevd", 'S');
        fs.add_process(120, "getty", 'S');

        fs
    }

    /// Adds the boot-complete marker process to the table.
    pub fn with_marker_process(mut self, pid: u32) -> Self {
        self.add_marker_process(pid);
        self
    }

    /// Adds the boot-complete marker process in place.
    pub fn add_marker_process(&mut self, pid: u32) {
        self.add_process(pid, "quicklauncher", 'S');
    }
}
