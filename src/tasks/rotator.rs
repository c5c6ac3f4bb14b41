//! The background rotation controller.
//!
//! A single long-lived [`Rotator`] owns the live [`LayerWindow`] and every
//! pending timer. Timers are scheduled against absolute deadlines so the
//! cadence does not drift, and each callback locks and reads the live window
//! when it fires. Nothing is captured from the window at schedule time.
//!
//! Timeline from `start()` at `t0` with the default cadence:
//!
//! ```text
//! t0 + 10ms           zoom      current -> zooming, outgoing -> zooming
//! t0 + 1510ms         fade      outgoing -> zooming+fading-out
//! t0 + 4510ms         rotate    evict outgoing, prepend a fresh plain layer
//! rotate + 1500ms     fade
//! rotate + 3000ms     rotate    ...
//! ```

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::RotationOptions;
use crate::error::{Error, Result};
use crate::events::{Frame, WindowChange};
use crate::layers::{Layer, LayerWindow};
use crate::pool::ImagePool;
use crate::selector::Selector;

/// Draw the two seed layers. The second draw avoids the first image when it can.
pub fn seed_window(selector: &mut Selector, pool: &ImagePool) -> LayerWindow {
    let newest = selector.pick_next(pool, None);
    let outgoing = selector.pick_next(pool, Some(&newest.image));
    LayerWindow::new(newest, outgoing)
}

/// Evict the outgoing layer and prepend a fresh one that differs from the
/// layer about to become outgoing. Returns the evicted layer.
pub fn rotate_window(window: &mut LayerWindow, selector: &mut Selector, pool: &ImagePool) -> Layer {
    let next = selector.pick_next(pool, Some(&window.current().image));
    window.advance(next)
}

/// Run `rotations` steady-state cycles without timers and return the window
/// after each rotation's fade step.
pub fn simulate(mut selector: Selector, pool: &ImagePool, rotations: usize) -> Vec<LayerWindow> {
    let mut window = seed_window(&mut selector, pool);
    window.apply_fade(false);
    window.apply_fade(true);
    let mut plan = Vec::with_capacity(rotations);
    for _ in 0..rotations {
        rotate_window(&mut window, &mut selector, pool);
        window.apply_fade(true);
        plan.push(window.clone());
    }
    plan
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Start zooming both layers without fading.
    Zoom,
    /// First full fade; schedules the first rotation.
    FirstFade,
    Fade,
    Rotate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

struct Timers {
    cancel: CancellationToken,
    tasks: JoinSet<()>,
}

struct Shared {
    pool: ImagePool,
    options: RotationOptions,
    window: Mutex<LayerWindow>,
    selector: Mutex<Selector>,
    frames: watch::Sender<Frame>,
    timers: Mutex<Timers>,
    lifecycle: Mutex<Lifecycle>,
}

/// Long-lived handle driving the background rotation.
///
/// Create once, `start()` once, `stop()` once. Dropping a running rotator
/// cancels its timers without waiting for them.
pub struct Rotator {
    shared: Arc<Shared>,
}

impl Rotator {
    /// Seed the window with two layers. No timers run until [`Rotator::start`].
    pub fn new(pool: ImagePool, options: RotationOptions, mut selector: Selector) -> Self {
        let window = seed_window(&mut selector, &pool);
        info!(
            images = pool.len(),
            rotate = ?options.rotate_interval,
            transition = ?options.transition_interval,
            window = %window,
            "rotator seeded"
        );
        let (frames, _) = watch::channel(window.frame(WindowChange::Seeded));
        Self {
            shared: Arc::new(Shared {
                pool,
                options,
                window: Mutex::new(window),
                selector: Mutex::new(selector),
                frames,
                timers: Mutex::new(Timers {
                    cancel: CancellationToken::new(),
                    tasks: JoinSet::new(),
                }),
                lifecycle: Mutex::new(Lifecycle::Idle),
            }),
        }
    }

    /// Begin the animation. Must be called from within a tokio runtime.
    ///
    /// Calling it again while running is a no-op; calling it after
    /// [`Rotator::stop`] fails with [`Error::AlreadyStopped`]. Outside a
    /// runtime it fails with [`Error::NoRuntime`] and stays idle.
    pub fn start(&self) -> Result<()> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(Error::NoRuntime);
        }
        {
            let mut lifecycle = self.shared.lifecycle.lock().expect("lifecycle poisoned");
            match *lifecycle {
                Lifecycle::Idle => *lifecycle = Lifecycle::Running,
                Lifecycle::Running => {
                    warn!("rotator already running; ignoring start");
                    return Ok(());
                }
                Lifecycle::Stopped => return Err(Error::AlreadyStopped),
            }
        }
        let first = Instant::now() + self.shared.options.initial_paint_delay;
        info!(
            paint_delay = ?self.shared.options.initial_paint_delay,
            "rotator started"
        );
        schedule(&self.shared, Step::Zoom, first);
        Ok(())
    }

    /// Cancel every pending timer and wait until none can touch the window again.
    pub async fn stop(&self) {
        {
            let mut lifecycle = self.shared.lifecycle.lock().expect("lifecycle poisoned");
            if *lifecycle == Lifecycle::Stopped {
                return;
            }
            *lifecycle = Lifecycle::Stopped;
        }
        let mut pending = {
            let mut timers = self.shared.timers.lock().expect("timers poisoned");
            timers.cancel.cancel();
            std::mem::take(&mut timers.tasks)
        };
        let count = pending.len();
        while let Some(res) = pending.join_next().await {
            if let Err(err) = res {
                if !err.is_cancelled() {
                    warn!("rotator timer failed: {err}");
                }
            }
        }
        info!(pending = count, "rotator stopped");
    }

    /// Snapshot of the live window.
    pub fn current_window(&self) -> LayerWindow {
        self.shared.window.lock().expect("window poisoned").clone()
    }

    pub fn current_frame(&self) -> Frame {
        self.shared.frames.borrow().clone()
    }

    /// Watch the latest [`Frame`].
    ///
    /// The channel keeps only the newest value: a receiver that falls behind
    /// sees the most recent change, not every intermediate one.
    pub fn subscribe(&self) -> watch::Receiver<Frame> {
        self.shared.frames.subscribe()
    }

    /// Number of timers currently scheduled or running.
    pub fn pending_timers(&self) -> usize {
        let mut timers = self.shared.timers.lock().expect("timers poisoned");
        while timers.tasks.try_join_next().is_some() {}
        timers.tasks.len()
    }
}

impl Drop for Rotator {
    fn drop(&mut self) {
        if let Ok(timers) = self.shared.timers.lock() {
            timers.cancel.cancel();
        }
    }
}

fn schedule(shared: &Arc<Shared>, step: Step, deadline: Instant) {
    let mut timers = shared.timers.lock().expect("timers poisoned");
    if timers.cancel.is_cancelled() {
        trace!(?step, "rotator cancelled; not scheduling");
        return;
    }
    while timers.tasks.try_join_next().is_some() {}
    let cancel = timers.cancel.clone();
    let shared = Arc::clone(shared);
    timers.tasks.spawn(async move {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {}
            _ = sleep_until(deadline) => fire(&shared, &cancel, step, deadline),
        }
    });
}

fn fire(shared: &Arc<Shared>, cancel: &CancellationToken, step: Step, deadline: Instant) {
    let options = &shared.options;
    {
        let mut window = shared.window.lock().expect("window poisoned");
        if cancel.is_cancelled() {
            return;
        }
        let change = match step {
            Step::Zoom => {
                window.apply_fade(false);
                WindowChange::Zoomed
            }
            Step::FirstFade | Step::Fade => {
                window.apply_fade(true);
                WindowChange::Faded
            }
            Step::Rotate => {
                let mut selector = shared.selector.lock().expect("selector poisoned");
                let evicted = rotate_window(&mut window, &mut selector, &shared.pool);
                debug!(
                    evicted = %evicted.src(),
                    entered = %window.current().src(),
                    "rotated background"
                );
                WindowChange::Rotated
            }
        };
        trace!(?step, window = %window, "window updated");
        shared.frames.send_replace(window.frame(change));
    }

    match step {
        Step::Zoom => schedule(shared, Step::FirstFade, deadline + options.transition_interval),
        Step::FirstFade => schedule(shared, Step::Rotate, deadline + options.rotate_interval),
        Step::Fade => {}
        Step::Rotate => {
            schedule(shared, Step::Fade, deadline + options.transition_interval);
            schedule(shared, Step::Rotate, deadline + options.rotate_interval);
        }
    }
}
