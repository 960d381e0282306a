//! Shared test utilities for hoststrap tests.
//!
//! The collaborator tools are replaced by small shell scripts written into
//! a temporary `bin/` directory and wired in through `Config`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use hoststrap::config::{Config, Tools};
use tempfile::TempDir;

/// A small but realistic host: three essential packages, an OR-group
/// satisfied through a provides alias, and a foreign-architecture record.
pub const HOST_PACKAGES: &[&str] = &[
    "base-files\tamd64\tyes\t\t\t",
    "bash\tamd64\tyes\t\tbase-files (>= 2.1.12), debianutils (>= 5.6-0.1)\tlibc6 (>= 2.36), libtinfo6 (>= 6)",
    "debianutils\tamd64\tyes\t\t\tlibc6 (>= 2.34)",
    "libc6\tamd64\tno\t\tlibgcc-s1\t",
    "libc6\ti386\tno\t\tlibgcc-s1\t",
    "libgcc-s1\tamd64\tno\t\tgcc-12-base (= 12.2.0-14), libc6 (>= 2.35)\t",
    "gcc-12-base\tamd64\tno\t\t\t",
    "libtinfo6\tamd64\tno\t\tlibc6 (>= 2.34)\t",
    "tzdata\tall\tno\t\tdebconf (>= 0.5) | debconf-2.0\t",
    "cdebconf\tamd64\tno\tdebconf-2.0\t\t",
    "vim\tamd64\tno\teditor\tvim-common (= 2:9.0.1378-2), libc6 (>= 2.34)\t",
    "vim-common\tall\tno\t\t\t",
    "nano\tamd64\tno\teditor\tlibc6:any\t",
];

/// Packages the essential set of [`HOST_PACKAGES`] resolves to.
pub const ESSENTIAL_CLOSURE: &[&str] = &[
    "base-files:amd64",
    "bash:amd64",
    "debianutils:amd64",
    "gcc-12-base:amd64",
    "libc6:amd64",
    "libgcc-s1:amd64",
    "libtinfo6:amd64",
];

const DPKG_REPACK: &str = r#"#!/bin/sh
for arg in "$@"; do
    case "$arg" in
        -*) ;;
        *) : > "$(echo "$arg" | tr ':' '_').deb" ;;
    esac
done
"#;

const PASSTHROUGH: &str = r#"#!/bin/sh
exec "$@"
"#;

/// Test environment with a stub toolchain and separate scratch/target dirs.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub base: PathBuf,
    /// Stub tool scripts
    pub bin: PathBuf,
    /// Parent of the per-run scratch directory
    pub scratch_parent: PathBuf,
    /// Bootstrap target (does not exist yet)
    pub target: PathBuf,
    pub tools: Tools,
}

impl TestEnv {
    /// Create a new test environment whose tools all succeed.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let bin = base.join("bin");
        let scratch_parent = base.join("scratch");
        let target = base.join("target");

        fs::create_dir_all(&bin).expect("Failed to create bin dir");
        fs::create_dir_all(&scratch_parent).expect("Failed to create scratch dir");

        let mut env = Self {
            _temp_dir: temp_dir,
            base,
            bin,
            scratch_parent,
            target,
            tools: Tools::default(),
        };
        env.write_host_packages(HOST_PACKAGES);

        let log = env.log_path();
        env.tools = Tools {
            dpkg: env.stub("dpkg", "#!/bin/sh\necho amd64\n"),
            dpkg_query: env.stub(
                "dpkg-query",
                &format!("#!/bin/sh\ncat '{}'\n", env.base.join("status").display()),
            ),
            dpkg_repack: env.stub("dpkg-repack", DPKG_REPACK),
            apt_ftparchive: env.stub(
                "apt-ftparchive",
                &format!(
                    "#!/bin/sh\necho \"$@\" >> '{}'\n\
                     if [ \"$1\" = \"-c\" ]; then printf 'Origin: hoststrap\\nSuite: unstable\\n'; fi\n",
                    log.display()
                ),
            ),
            debootstrap: env.stub("debootstrap", &debootstrap_script(0)),
            fakeroot: env.stub("fakeroot", PASSTHROUGH),
            fakechroot: env.stub("fakechroot", PASSTHROUGH),
        };
        env
    }

    /// Replace the host package database.
    pub fn write_host_packages(&self, lines: &[&str]) {
        let mut status = lines.join("\n");
        status.push('\n');
        fs::write(self.base.join("status"), status).expect("Failed to write status");
    }

    /// Write an executable script into `bin/` and return its path.
    pub fn stub(&self, name: &str, script: &str) -> String {
        let path = self.bin.join(name);
        fs::write(&path, script).expect("Failed to write stub");
        let mut perms = fs::metadata(&path).expect("Failed to get metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("Failed to set permissions");
        path.to_string_lossy().into_owned()
    }

    /// Make debootstrap populate the target and then exit with `code`.
    pub fn failing_debootstrap(&mut self, code: i32) {
        self.tools.debootstrap = self.stub("debootstrap", &debootstrap_script(code));
    }

    /// Where the apt-ftparchive stub records its arguments.
    pub fn log_path(&self) -> PathBuf {
        self.base.join("apt-ftparchive.log")
    }

    pub fn config(&self) -> Config {
        Config {
            tools: self.tools.clone(),
            scratch_parent: self.scratch_parent.clone(),
        }
    }

    /// Environment variables that point the binary at the stubs.
    pub fn vars(&self) -> HashMap<&'static str, String> {
        HashMap::from([
            ("HOSTSTRAP_DPKG", self.tools.dpkg.clone()),
            ("HOSTSTRAP_DPKG_QUERY", self.tools.dpkg_query.clone()),
            ("HOSTSTRAP_DPKG_REPACK", self.tools.dpkg_repack.clone()),
            ("HOSTSTRAP_APT_FTPARCHIVE", self.tools.apt_ftparchive.clone()),
            ("HOSTSTRAP_DEBOOTSTRAP", self.tools.debootstrap.clone()),
            ("HOSTSTRAP_FAKEROOT", self.tools.fakeroot.clone()),
            ("HOSTSTRAP_FAKECHROOT", self.tools.fakechroot.clone()),
            (
                "HOSTSTRAP_TMPDIR",
                self.scratch_parent.to_string_lossy().into_owned(),
            ),
        ])
    }

    /// Number of entries left in the scratch parent.
    pub fn scratch_entries(&self) -> usize {
        fs::read_dir(&self.scratch_parent)
            .expect("Failed to read scratch dir")
            .count()
    }
}

/// debootstrap stand-in: records its arguments and what the mirror holds.
fn debootstrap_script(code: i32) -> String {
    format!(
        r#"#!/bin/sh
eval "target=\${{$(($# - 1))}}"
eval "url=\${{$#}}"
repo="${{url#file://}}"
mkdir -p "$target"
printf '%s\n' "$@" > "$target/debootstrap.args"
ls "$repo/pool/main" > "$target/pool.list"
cat "$repo/dists/unstable/Release" > "$target/Release"
exit {code}
"#
    )
}

/// Assert that a file contains expected content.
pub fn assert_file_contains(path: &Path, expected: &str) {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
    assert!(
        content.contains(expected),
        "File {} does not contain expected content.\nExpected to find: {}\nActual content: {}",
        path.display(),
        expected,
        content
    );
}

/// Read a file as trimmed lines.
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e))
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}
