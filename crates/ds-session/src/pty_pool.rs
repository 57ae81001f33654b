use std::collections::HashSet;
use std::io::{Read as IoRead, Write as IoWrite};
use std::sync::{Arc, Mutex};

use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::transport::Transport;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("pty pool is at capacity ({max})")]
    AtCapacity { max: usize },

    #[error("pty spawn failed: {0}")]
    SpawnFailed(String),

    #[error("pty I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pty internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PtyError>;

type Registry = Arc<Mutex<HashSet<Uuid>>>;

/// Output chunks (of at most 4 KiB) buffered per handle.
const OUTPUT_QUEUE_CHUNKS: usize = 256;

fn lock_registry(registry: &Registry) -> std::sync::MutexGuard<'_, HashSet<Uuid>> {
    registry.lock().unwrap_or_else(|e| {
        warn!("PtyPool lock was poisoned, recovering");
        e.into_inner()
    })
}

// ---------------------------------------------------------------------------
// PtyHandle
// ---------------------------------------------------------------------------

/// A process attached to a pseudo-terminal, with its output delivered as raw
/// chunks on a channel that disconnects once the process closes the terminal.
pub struct PtyHandle {
    pub id: Uuid,
    reader: flume::Receiver<Vec<u8>>,
    writer: flume::Sender<Vec<u8>>,
    child: Arc<Mutex<Box<dyn portable_pty::Child + Send + Sync>>>,
    // Keeps the master side of the terminal open for the child's lifetime.
    _master: Arc<Mutex<Box<dyn portable_pty::MasterPty + Send>>>,
    registry: Registry,
    _reader_thread: Option<std::thread::JoinHandle<()>>,
    _writer_thread: Option<std::thread::JoinHandle<()>>,
}

impl PtyHandle {
    fn lock_child(&self) -> std::sync::MutexGuard<'_, Box<dyn portable_pty::Child + Send + Sync>> {
        self.child.lock().unwrap_or_else(|e| {
            warn!("child lock was poisoned, recovering");
            e.into_inner()
        })
    }

    pub fn process_id(&self) -> Option<u32> {
        self.lock_child().process_id()
    }

    /// Check whether the underlying child process is still running.
    pub fn is_alive(&self) -> bool {
        matches!(self.lock_child().try_wait(), Ok(None))
    }
}

impl Transport for PtyHandle {
    fn id(&self) -> Uuid {
        self.id
    }

    fn send(&self, data: &[u8]) -> Result<()> {
        self.writer
            .send(data.to_vec())
            .map_err(|e| PtyError::Internal(format!("writer channel closed: {e}")))
    }

    fn output(&self) -> &flume::Receiver<Vec<u8>> {
        &self.reader
    }

    fn kill(&self) -> Result<()> {
        let mut child = self.lock_child();
        if !matches!(child.try_wait(), Ok(None)) {
            return Ok(());
        }
        child
            .kill()
            .map_err(|e| PtyError::Internal(e.to_string()))?;
        // Reap it. A SIGKILLed child exits at once, so this does not block long.
        if let Err(e) = child.wait() {
            debug!(id = %self.id, "reaping PTY process failed: {e}");
        }
        debug!(id = %self.id, "killed PTY process");
        Ok(())
    }
}

impl Drop for PtyHandle {
    fn drop(&mut self) {
        if let Err(e) = Transport::kill(self) {
            debug!(id = %self.id, "kill on drop failed: {e}");
        }
        lock_registry(&self.registry).remove(&self.id);
    }
}

impl std::fmt::Debug for PtyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// PtyPool
// ---------------------------------------------------------------------------

/// Spawns shell processes inside PTYs, up to a configured number of
/// concurrently open handles. Handles unregister themselves when dropped.
pub struct PtyPool {
    max_ptys: usize,
    handles: Registry,
}

impl PtyPool {
    /// Create a new pool with the given maximum number of concurrent PTYs.
    pub fn new(max_ptys: usize) -> Self {
        info!(max_ptys, "creating PtyPool");
        Self {
            max_ptys,
            handles: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Number of currently open PTY handles spawned by this pool.
    pub fn active_count(&self) -> usize {
        lock_registry(&self.handles).len()
    }

    /// Maximum capacity of the pool.
    pub fn max_ptys(&self) -> usize {
        self.max_ptys
    }

    /// Spawn a new process inside a PTY.
    pub fn spawn(&self, cmd: &str, args: &[&str], env: &[(&str, &str)]) -> Result<PtyHandle> {
        if self.active_count() >= self.max_ptys {
            return Err(PtyError::AtCapacity { max: self.max_ptys });
        }

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: 24,
                cols: 200,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::SpawnFailed(e.to_string()))?;

        let mut command = CommandBuilder::new(cmd);
        for arg in args {
            command.arg(*arg);
        }
        for (k, v) in env {
            command.env(*k, *v);
        }

        let child = pair
            .slave
            .spawn_command(command)
            .map_err(|e| PtyError::SpawnFailed(format!("{cmd}: {e}")))?;
        // The child holds its own copy of the slave; ours must go so that EOF
        // reaches the reader once the child exits.
        drop(pair.slave);

        debug!(cmd, ?args, "spawned PTY process");

        let handle_id = Uuid::new_v4();

        // -- output reader thread --
        // Bounded, so a process nobody reads from blocks on its terminal
        // instead of growing the queue.
        let (read_tx, read_rx) = flume::bounded::<Vec<u8>>(OUTPUT_QUEUE_CHUNKS);
        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::SpawnFailed(e.to_string()))?;
        let reader_thread = std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if read_tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        // Linux reports EIO on the master once the child is gone.
                        debug!("pty reader finished: {e}");
                        break;
                    }
                }
            }
        });

        // -- input writer thread --
        let (write_tx, write_rx) = flume::unbounded::<Vec<u8>>();
        let mut writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::SpawnFailed(e.to_string()))?;
        let writer_thread = std::thread::spawn(move || {
            while let Ok(data) = write_rx.recv() {
                if writer.write_all(&data).is_err() {
                    break;
                }
                let _ = writer.flush();
            }
        });

        lock_registry(&self.handles).insert(handle_id);

        Ok(PtyHandle {
            id: handle_id,
            reader: read_rx,
            writer: write_tx,
            child: Arc::new(Mutex::new(child)),
            _master: Arc::new(Mutex::new(pair.master)),
            registry: Arc::clone(&self.handles),
            _reader_thread: Some(reader_thread),
            _writer_thread: Some(writer_thread),
        })
    }
}

impl std::fmt::Debug for PtyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyPool")
            .field("max_ptys", &self.max_ptys)
            .field("active_count", &self.active_count())
            .finish()
    }
}
