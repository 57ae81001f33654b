#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ds_core::config::Config;
use ds_container::DockerRuntime;

/// A shell script standing in for the docker CLI. Container paths
/// (`name:/path`) map onto `root/path`, `exec` starts a bash rooted there and
/// every invocation is appended to `calls.log`.
pub struct FakeDocker {
    pub dir: tempfile::TempDir,
    pub root: PathBuf,
    pub staging: PathBuf,
    pub script: PathBuf,
}

const SCRIPT: &str = r#"#!/bin/sh
root='@ROOT@'
echo "$*" >> '@LOG@'
cmd="$1"
shift
map() {
    case "$1" in
        *:*) printf '%s%s' "$root" "${1#*:}" ;;
        *) printf '%s' "$1" ;;
    esac
}
case "$cmd" in
    info|start|stop|kill|rm)
        exit 0
        ;;
    create)
        case "$*" in
            *missing*) echo "Unable to find image 'missing:latest' locally" >&2; exit 125 ;;
        esac
        exit 0
        ;;
    cp)
        src=$(map "$1")
        dst=$(map "$2")
        if [ ! -e "$src" ]; then
            echo "Error response from daemon: Could not find the file $1" >&2
            exit 1
        fi
        cp -R "$src" "$dst"
        ;;
    exec)
        cd "$root" || exit 1
        exec /bin/bash --norc --noprofile
        ;;
    *)
        echo "unknown command: $cmd" >&2
        exit 1
        ;;
esac
"#;

impl FakeDocker {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("root");
        let staging = dir.path().join("staging");
        std::fs::create_dir_all(&root).expect("root");
        std::fs::create_dir_all(&staging).expect("staging");

        let script = dir.path().join("fake-docker");
        let body = SCRIPT
            .replace("@ROOT@", root.to_str().expect("utf-8 root"))
            .replace("@LOG@", dir.path().join("calls.log").to_str().expect("utf-8 log"));
        std::fs::write(&script, body).expect("write script");
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
            .expect("chmod script");
        wait_until_executable(&script);

        Self {
            dir,
            root,
            staging,
            script,
        }
    }

    pub fn config(&self) -> Config {
        let mut cfg = Config::default();
        cfg.docker.executable = self.script.to_str().expect("utf-8 script").to_string();
        cfg.docker.temp_dir = Some(self.staging.clone());
        cfg.shell.timeout_secs = 10;
        cfg
    }

    pub fn runtime(&self) -> DockerRuntime {
        DockerRuntime::new(&self.config())
    }

    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn staging_entries(&self) -> usize {
        std::fs::read_dir(&self.staging).expect("staging dir").count()
    }

    pub fn container_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

/// A freshly written script can briefly fail with ETXTBSY while another test
/// thread is between fork and exec.
fn wait_until_executable(script: &Path) {
    for _ in 0..50 {
        if std::process::Command::new(script).arg("info").status().is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("fake docker script never became executable");
}
