//! Sandboxed JavaScript runtime for render templates
//!
//! Render templates are host-authored one-argument functions such as
//! `function(item) { return '<b>' + item.name + '</b>'; }`. This crate compiles
//! and invokes them inside rquickjs (QuickJS-NG) with no host objects exposed.
//!
//! # Architecture
//!
//! - **Dedicated Worker Thread**: each [`JsSandbox`] owns one OS thread holding the rquickjs Runtime+Context
//! - **Channel Communication**: callers send requests via mpsc and await a oneshot reply
//! - **Sandboxed**: no env, no filesystem, no module loader; memory, stack and time limits
//! - **Compile Cache**: templates are compiled once per source string, failures included
//!
//! # Example
//!
//! ```rust,no_run
//! use association_picker_js::{JsSandbox, SandboxLimits};
//!
//! # async fn example() -> association_picker_js::Result<()> {
//! let sandbox = JsSandbox::spawn(SandboxLimits::default())?;
//! let html = sandbox
//!     .render("function(item) { return item.name; }", &serde_json::json!({"name": "Ann"}))
//!     .await?;
//! assert_eq!(html, "Ann");
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod error;

pub use error::{JsError, Result};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use rquickjs::{CatchResultExt, CaughtError, Ctx, Function, Persistent, Value};
use tokio::sync::oneshot;

/// Resource limits applied to the sandbox runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxLimits {
    pub memory_limit_bytes: usize,
    pub max_stack_bytes: usize,
    /// Wall-clock budget for a single compile-and-render request.
    pub timeout: Duration,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            memory_limit_bytes: 10 * 1024 * 1024,
            max_stack_bytes: 512 * 1024,
            timeout: Duration::from_millis(250),
        }
    }
}

/// Request types sent to the JS worker thread
enum JsRequest {
    Render {
        source: String,
        argument: serde_json::Value,
        reply: oneshot::Sender<Result<String>>,
    },
    Compile {
        source: String,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// A compiled template, or the reason it failed to compile.
type CompiledTemplate = std::result::Result<Persistent<Function<'static>>, String>;

/// Execution deadline shared with the runtime's interrupt handler.
#[derive(Clone, Default)]
struct Deadline {
    at: Arc<Mutex<Option<Instant>>>,
    tripped: Arc<AtomicBool>,
}

impl Deadline {
    fn arm(&self, budget: Duration) {
        self.tripped.store(false, Ordering::SeqCst);
        if let Ok(mut at) = self.at.lock() {
            *at = Some(Instant::now() + budget);
        }
    }

    fn disarm(&self) {
        if let Ok(mut at) = self.at.lock() {
            *at = None;
        }
    }

    /// Polled by QuickJS; returning true aborts the running script.
    fn expired(&self) -> bool {
        let expired = self
            .at
            .lock()
            .map(|at| at.is_some_and(|at| Instant::now() >= at))
            .unwrap_or(false);
        if expired {
            self.tripped.store(true, Ordering::SeqCst);
        }
        expired
    }

    fn tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }
}

/// Handle to a sandbox worker thread. Cloning shares the same worker.
///
/// The worker shuts down once every handle is dropped.
#[derive(Clone)]
pub struct JsSandbox {
    sender: mpsc::Sender<JsRequest>,
}

impl JsSandbox {
    /// Spawn a dedicated worker with the given limits.
    ///
    /// Blocks until the runtime is created so configuration errors surface here.
    pub fn spawn(limits: SandboxLimits) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<JsRequest>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        std::thread::Builder::new()
            .name("js-render".to_string())
            .spawn(move || worker_loop(limits, rx, ready_tx))
            .map_err(|e| JsError::runtime(format!("failed to spawn JS runtime thread: {}", e)))?;

        ready_rx.recv().map_err(|_| JsError::WorkerStopped)??;
        Ok(Self { sender: tx })
    }

    /// Compile `source` as a one-argument function (cached) and call it with `argument`.
    ///
    /// Returns the function's result as display text.
    pub async fn render(&self, source: &str, argument: &serde_json::Value) -> Result<String> {
        let source = source.to_string();
        let argument = argument.clone();
        self.send_request(|reply| JsRequest::Render {
            source,
            argument,
            reply,
        })
        .await
    }

    /// Compile `source` without calling it, reporting why it is unusable.
    pub async fn compile(&self, source: &str) -> Result<()> {
        let source = source.to_string();
        self.send_request(|reply| JsRequest::Compile { source, reply })
            .await
    }

    /// Send a request to the worker and await the response
    async fn send_request<T>(
        &self,
        make_request: impl FnOnce(oneshot::Sender<Result<T>>) -> JsRequest,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make_request(tx))
            .map_err(|_| JsError::WorkerStopped)?;
        rx.await.map_err(|_| JsError::WorkerStopped)?
    }
}

/// The worker loop that owns the rquickjs Runtime+Context
fn worker_loop(
    limits: SandboxLimits,
    rx: mpsc::Receiver<JsRequest>,
    ready: mpsc::Sender<Result<()>>,
) {
    use rquickjs::{Context, Runtime};

    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = ready.send(Err(JsError::runtime(format!("failed to create JS runtime: {}", e))));
            return;
        }
    };
    rt.set_memory_limit(limits.memory_limit_bytes);
    rt.set_max_stack_size(limits.max_stack_bytes);

    let deadline = Deadline::default();
    {
        let deadline = deadline.clone();
        rt.set_interrupt_handler(Some(Box::new(move || deadline.expired())));
    }

    let ctx = match Context::full(&rt) {
        Ok(ctx) => ctx,
        Err(e) => {
            let _ = ready.send(Err(JsError::runtime(format!("failed to create JS context: {}", e))));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    /// Drain all pending microtasks/Promise jobs from the runtime.
    fn drain_pending_jobs(rt: &Runtime) {
        loop {
            match rt.execute_pending_job() {
                Ok(false) => break,
                Ok(true) => continue,
                Err(e) => {
                    tracing::warn!("error executing pending JS job: {:?}", e);
                    break;
                }
            }
        }
    }

    let mut cache: HashMap<String, CompiledTemplate> = HashMap::new();

    while let Ok(request) = rx.recv() {
        match request {
            JsRequest::Render {
                source,
                argument,
                reply,
            } => {
                deadline.arm(limits.timeout);
                let result = ctx.with(|ctx| {
                    let func = compiled(&ctx, &mut cache, &source)?;
                    invoke(&ctx, func, &argument)
                });
                drain_pending_jobs(&rt);
                deadline.disarm();

                let _ = reply.send(classify(result, &deadline));
            }

            JsRequest::Compile { source, reply } => {
                deadline.arm(limits.timeout);
                let result = ctx.with(|ctx| compiled(&ctx, &mut cache, &source).map(|_| ()));
                drain_pending_jobs(&rt);
                deadline.disarm();

                let _ = reply.send(classify(result, &deadline));
            }
        }
    }

    // Persistent handles must be released before the runtime is dropped.
    drop(cache);
    tracing::debug!("JS render worker shutting down");
}

/// Report interrupted scripts as timeouts rather than generic failures.
fn classify<T>(result: Result<T>, deadline: &Deadline) -> Result<T> {
    match result {
        Err(_) if deadline.tripped() => Err(JsError::Timeout),
        other => other,
    }
}

/// Look up a compiled template, compiling and caching it on first use.
fn compiled<'js>(
    ctx: &Ctx<'js>,
    cache: &mut HashMap<String, CompiledTemplate>,
    source: &str,
) -> Result<Function<'js>> {
    if let Some(entry) = cache.get(source) {
        return match entry {
            Ok(saved) => saved
                .clone()
                .restore(ctx)
                .map_err(|e| JsError::runtime(format!("failed to restore template: {}", e))),
            Err(message) => Err(JsError::compilation(message.clone())),
        };
    }

    match compile(ctx, source) {
        Ok(func) => {
            cache.insert(source.to_string(), Ok(Persistent::save(ctx, func.clone())));
            Ok(func)
        }
        Err(message) => {
            cache.insert(source.to_string(), Err(message.clone()));
            Err(JsError::compilation(message))
        }
    }
}

fn compile<'js>(ctx: &Ctx<'js>, source: &str) -> std::result::Result<Function<'js>, String> {
    let value: Value = ctx
        .eval(format!("({})", source))
        .catch(ctx)
        .map_err(describe)?;
    value
        .into_function()
        .ok_or_else(|| "template does not evaluate to a function".to_string())
}

fn invoke<'js>(ctx: &Ctx<'js>, func: Function<'js>, argument: &serde_json::Value) -> Result<String> {
    let argument = bridge::json_to_js(ctx, argument)?;
    let value: Value = func
        .call((argument,))
        .catch(ctx)
        .map_err(|e| JsError::evaluation(describe(e)))?;
    bridge::js_to_text(ctx, value)
}

fn describe(error: CaughtError<'_>) -> String {
    match error {
        CaughtError::Exception(ex) => format!("JS error: {}", ex),
        CaughtError::Value(v) => {
            let s: std::result::Result<String, _> = v.get();
            format!("JS threw: {}", s.unwrap_or_else(|_| "unknown".to_string()))
        }
        CaughtError::Error(e) => format!("Error: {}", e),
    }
}
