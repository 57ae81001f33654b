#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use ds_session::pty_pool::{PtyError, Result};
use ds_session::Transport;
use uuid::Uuid;

/// What the scripted shell does after receiving one write.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Bytes(Vec<u8>),
    /// Emit the text, then close the stream.
    Final(String),
    Silent,
    Hangup,
}

pub fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
}

/// A fake shell: emits `greeting` at once, then answers the n-th write with
/// the n-th reply. Writes beyond the script are recorded and ignored.
pub struct ScriptedTransport {
    id: Uuid,
    output: flume::Receiver<Vec<u8>>,
    input: flume::Sender<Vec<u8>>,
    killed: Arc<AtomicBool>,
}

#[derive(Clone)]
pub struct ScriptLog {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
    killed: Arc<AtomicBool>,
}

impl ScriptLog {
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    pub fn killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

impl ScriptedTransport {
    pub fn new(greeting: &str, replies: Vec<Reply>) -> (Self, ScriptLog) {
        let (out_tx, out_rx) = flume::unbounded::<Vec<u8>>();
        let (in_tx, in_rx) = flume::unbounded::<Vec<u8>>();
        let writes = Arc::new(Mutex::new(Vec::new()));
        let killed = Arc::new(AtomicBool::new(false));

        if !greeting.is_empty() {
            out_tx.send(greeting.as_bytes().to_vec()).unwrap();
        }

        let log_writes = Arc::clone(&writes);
        std::thread::spawn(move || {
            let mut replies = replies.into_iter();
            while let Ok(data) = in_rx.recv() {
                log_writes.lock().unwrap().push(data);
                match replies.next() {
                    Some(Reply::Text(t)) => {
                        if out_tx.send(t.into_bytes()).is_err() {
                            break;
                        }
                    }
                    Some(Reply::Bytes(b)) => {
                        if out_tx.send(b).is_err() {
                            break;
                        }
                    }
                    Some(Reply::Final(t)) => {
                        let _ = out_tx.send(t.into_bytes());
                        break;
                    }
                    Some(Reply::Silent) | None => {}
                    Some(Reply::Hangup) => break,
                }
            }
        });

        let transport = Self {
            id: Uuid::new_v4(),
            output: out_rx,
            input: in_tx,
            killed: Arc::clone(&killed),
        };
        (transport, ScriptLog { writes, killed })
    }
}

impl Transport for ScriptedTransport {
    fn id(&self) -> Uuid {
        self.id
    }

    fn send(&self, data: &[u8]) -> Result<()> {
        self.input
            .send(data.to_vec())
            .map_err(|e| PtyError::Internal(format!("scripted shell gone: {e}")))
    }

    fn output(&self) -> &flume::Receiver<Vec<u8>> {
        &self.output
    }

    fn kill(&self) -> Result<()> {
        self.killed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Replies for a successful bootstrap with the default hook list, ending with
/// the sentinel prompt.
pub fn bootstrap_replies(sentinel: &str) -> Vec<Reply> {
    vec![
        // stty -echo
        text("stty -echo\r\nbash-5.2$ "),
        // PS1=''
        Reply::Silent,
        // three neutralize hooks
        Reply::Silent,
        Reply::Silent,
        Reply::Silent,
        // PS1='<sentinel> '
        Reply::Text(format!("{sentinel} ")),
    ]
}

pub const GREETING: &str = "bash-5.2$ ";

/// A local bash without rc files, the stand-in for `docker exec`.
pub const LOCAL_BASH: &str = "/bin/bash";
pub const LOCAL_BASH_ARGS: &[&str] = &["--norc", "--noprofile"];
