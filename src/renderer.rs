//! The embedded web renderer and the UI thread it must be driven from.
use parking_lot::Mutex;
use std::thread::{self, ThreadId};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{commands::RendererCommand, error::AndBibleError};

/// Web content renderer hosting the static shell page.
pub trait Renderer: Send + Sync {
    /// Start loading the shell page. Readiness is reported back through
    /// [`crate::bibleview::BibleView::on_shell_ready`].
    fn load_shell(&self, url: &str) -> Result<(), AndBibleError>;

    fn execute(&self, command: RendererCommand) -> Result<(), AndBibleError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RendererMessage {
    LoadShell(String),
    Execute(RendererCommand),
}

/// Forwards renderer traffic over an unbounded channel, e.g. to a process hosting the web view.
#[derive(Debug, Clone)]
pub struct ChannelRenderer {
    tx: UnboundedSender<RendererMessage>,
}

impl ChannelRenderer {
    pub fn new() -> (Self, UnboundedReceiver<RendererMessage>) {
        let (tx, rx) = unbounded_channel();
        (ChannelRenderer { tx }, rx)
    }

    fn send(&self, message: RendererMessage) -> Result<(), AndBibleError> {
        self.tx
            .send(message)
            .map_err(|e| AndBibleError::Renderer(format!("renderer channel closed, lost {:?}", e.0)))
    }
}

impl Renderer for ChannelRenderer {
    fn load_shell(&self, url: &str) -> Result<(), AndBibleError> {
        self.send(RendererMessage::LoadShell(url.to_string()))
    }

    fn execute(&self, command: RendererCommand) -> Result<(), AndBibleError> {
        self.send(RendererMessage::Execute(command))
    }
}

pub type UiTask = Box<dyn FnOnce() + Send>;

/// The thread renderer commands must be issued from.
pub trait UiThread: Send + Sync {
    fn is_ui_thread(&self) -> bool;

    /// Run `task` on the UI thread later.
    fn post(&self, task: UiTask);
}

/// For hosts with a single thread: every caller is the UI thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineUi;

impl UiThread for InlineUi {
    fn is_ui_thread(&self) -> bool {
        true
    }

    fn post(&self, task: UiTask) {
        task()
    }
}

/// UI thread bound to the thread that created it. Tasks posted from other threads queue up
/// until the owner calls [`UiQueue::run_pending`].
pub struct UiQueue {
    thread: ThreadId,
    tx: UnboundedSender<UiTask>,
    rx: Mutex<UnboundedReceiver<UiTask>>,
}

impl Default for UiQueue {
    fn default() -> Self {
        UiQueue::new()
    }
}

impl UiQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded_channel();
        UiQueue {
            thread: thread::current().id(),
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Run queued tasks; returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        loop {
            let next = self.rx.lock().try_recv();
            match next {
                Ok(task) => {
                    task();
                    count += 1;
                }
                Err(_) => return count,
            }
        }
    }
}

impl UiThread for UiQueue {
    fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread
    }

    fn post(&self, task: UiTask) {
        if self.tx.send(task).is_err() {
            tracing::error!("[UiQueue] queue closed, task dropped");
        }
    }
}
