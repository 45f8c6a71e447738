//! Terminal UI state for Scanwise
//!
//! `App` owns the scan controller and the presentation state around it
//! (animators, scroll, toast). Rendering lives in `render`; key handling in
//! `crate::app::input`.

pub mod helpers;
pub mod leaf;
pub mod partial;
pub mod render;
pub mod theme;
pub mod tree;
pub mod view;

pub use render::render;

use crate::component::UiComponent;
use crate::engine::GenerativeEngine;
use crate::motion::{Spring, DEFAULT_EXIT, DEFAULT_STAGGER};
use crate::router::ActivePath;
use crate::schema::{PartialAnalysis, UserProfile};
use crate::session::{Applied, ScanController, ScanId, ScanStatus, StreamMessage};
use crate::stream::{ScanInput, ScanRequest};
use leaf::RenderContext;
use partial::{option_controls, partial_view, OptionControl, PartialContext};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tree::TreeRenderer;
use view::{Animator, View};

/// Toast notification kind - affects duration and styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Info,
    Error,
}

impl ToastKind {
    /// Duration in seconds before toast expires
    pub fn duration_secs(&self) -> u64 {
        match self {
            ToastKind::Info => 3,
            ToastKind::Error => 10,
        }
    }
}

/// Toast notification
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub created_at: Instant,
    pub kind: ToastKind,
}

impl Toast {
    pub fn new(message: &str, kind: ToastKind) -> Self {
        Self {
            message: message.to_string(),
            created_at: Instant::now(),
            kind,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed().as_secs() >= self.kind.duration_secs()
    }

    pub fn is_error(&self) -> bool {
        self.kind == ToastKind::Error
    }
}

/// Callbacks into the embedding shell
#[derive(Default)]
pub struct ScanHooks {
    pub on_reset: Option<Box<dyn FnMut()>>,
    pub on_decision: Option<Box<dyn FnMut(&str)>>,
}

impl std::fmt::Debug for ScanHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanHooks")
            .field("on_reset", &self.on_reset.is_some())
            .field("on_decision", &self.on_decision.is_some())
            .finish()
    }
}

/// Motion timing shared by partial views and the tree renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSettings {
    pub stagger: Duration,
    pub exit: Duration,
    pub spring: Spring,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            stagger: DEFAULT_STAGGER,
            exit: DEFAULT_EXIT,
            spring: Spring::default(),
        }
    }
}

pub struct App {
    pub controller: ScanController,
    pub profile: UserProfile,
    pub input: ScanInput,
    pub toast: Option<Toast>,
    pub scroll: usize,
    pub loading_frame: usize,
    pub should_quit: bool,
    pub hooks: ScanHooks,
    /// A component tree shown instead of a scan (`--tree`)
    pub static_tree: Option<Vec<UiComponent>>,
    /// Option picked for the current decision
    pub chosen: Option<usize>,
    /// Background task feeding the current scan
    stream_task: Option<JoinHandle<()>>,
    motion: MotionSettings,
    partial_animator: Animator,
    tree_renderer: TreeRenderer,
}

impl App {
    pub fn new(profile: UserProfile, hooks: ScanHooks) -> Self {
        let motion = MotionSettings::default();
        Self {
            controller: ScanController::default(),
            profile,
            input: ScanInput::Text(String::new()),
            toast: None,
            scroll: 0,
            loading_frame: 0,
            should_quit: false,
            hooks,
            static_tree: None,
            chosen: None,
            stream_task: None,
            motion,
            partial_animator: Animator::new(motion.spring, motion.exit),
            tree_renderer: TreeRenderer::new(
                RenderContext::new(leaf::DEFAULT_WIDTH, motion.stagger),
                motion.spring,
                motion.exit,
            ),
        }
    }

    pub fn with_engine(mut self, engine: GenerativeEngine) -> Self {
        self.controller = ScanController::new(engine);
        self
    }

    pub fn with_motion(mut self, motion: MotionSettings) -> Self {
        self.motion = motion;
        self.partial_animator = Animator::new(motion.spring, motion.exit);
        self.tree_renderer = TreeRenderer::new(
            RenderContext::new(leaf::DEFAULT_WIDTH, motion.stagger),
            motion.spring,
            motion.exit,
        );
        self
    }

    pub fn with_input(mut self, input: ScanInput) -> Self {
        self.input = input;
        self
    }

    pub fn with_static_tree(mut self, tree: Vec<UiComponent>) -> Self {
        self.static_tree = Some(tree);
        self
    }

    pub fn motion(&self) -> MotionSettings {
        self.motion
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  SCAN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start a fresh scan of the current input. The caller spawns the stream
    /// for the returned request.
    pub fn start_scan(&mut self, now: Instant) -> (ScanId, ScanRequest) {
        let request = ScanRequest::new(self.input.clone(), self.profile);
        self.abort_stream();
        self.clear_presentation();
        let id = self.controller.start_scan(&request, now);
        (id, request)
    }

    /// Drop the current scan and tell the shell.
    pub fn reset(&mut self) {
        self.abort_stream();
        self.controller.reset();
        self.clear_presentation();
        if let Some(on_reset) = self.hooks.on_reset.as_mut() {
            on_reset();
        }
    }

    /// Keep the task streaming the current scan so a replacement can stop it.
    pub fn attach_stream(&mut self, task: JoinHandle<()>) {
        self.abort_stream();
        self.stream_task = Some(task);
    }

    fn abort_stream(&mut self) {
        if let Some(task) = self.stream_task.take() {
            if !task.is_finished() {
                tracing::debug!("aborting stream of replaced scan");
            }
            task.abort();
        }
    }

    fn clear_presentation(&mut self) {
        self.partial_animator.clear();
        self.tree_renderer.clear();
        self.scroll = 0;
        self.chosen = None;
    }

    /// Feed one stream message through the controller.
    pub fn handle_stream(&mut self, message: StreamMessage) -> Applied {
        let applied = self.controller.apply(message);
        match &applied {
            Applied::Failed(err) => {
                self.show_toast(&format!("Scan failed: {}", err.message), ToastKind::Error)
            }
            Applied::Completed { tree: false } => self.show_toast(
                "Analysis ended early, showing what arrived",
                ToastKind::Info,
            ),
            _ => {}
        }
        applied
    }

    /// Decision options for the current snapshot, if it is a decision.
    pub fn option_controls(&self) -> Option<[OptionControl; 2]> {
        match self.controller.session()?.snapshot() {
            PartialAnalysis::Decision(decision) => Some(option_controls(decision)),
            _ => None,
        }
    }

    /// Select decision option `index`. Disabled options are ignored.
    pub fn choose_option(&mut self, index: usize) -> bool {
        let Some(controls) = self.option_controls() else {
            return false;
        };
        let Some(label) = controls
            .get(index)
            .filter(|control| control.enabled())
            .and_then(|control| control.label.clone())
        else {
            return false;
        };
        self.chosen = Some(index);
        tracing::info!(option = index + 1, "decision option chosen");
        if let Some(on_decision) = self.hooks.on_decision.as_mut() {
            on_decision(&label);
        }
        true
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  PER-FRAME STATE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Advance timers, spinner and toast expiry.
    pub fn tick(&mut self, now: Instant) {
        self.controller.tick(now);
        self.clear_expired_toast();
        self.tick_loading();
    }

    pub fn is_streaming(&self) -> bool {
        self.controller
            .session()
            .is_some_and(|session| session.is_streaming())
    }

    pub fn status(&self) -> Option<ScanStatus> {
        self.controller.session().map(|session| session.status())
    }

    /// Tick the loading animation
    pub fn tick_loading(&mut self) {
        self.loading_frame = self.loading_frame.wrapping_add(1);
    }

    /// Build the main panel view for this frame.
    pub fn main_view(&mut self, width: u16, now: Instant) -> View {
        self.tree_renderer.set_width(width);

        if let Some(tree) = &self.static_tree {
            return self.tree_renderer.render(tree, now);
        }

        let Some(session) = self.controller.session() else {
            return View::default();
        };

        match session.active_path() {
            ActivePath::Tree => match session.tree() {
                Some(tree) => self.tree_renderer.render(tree, now),
                None => View::default(),
            },
            ActivePath::Thinking | ActivePath::Partial(_) => {
                let ctx = PartialContext {
                    streaming: session.is_streaming(),
                    frame: self.loading_frame,
                    width,
                    stagger: self.motion.stagger,
                    profile: session.profile(),
                    reasoning: session.reasoning_log(),
                };
                let view = partial_view(session.snapshot(), &ctx);
                self.partial_animator.frame(view, now)
            }
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    //  TOASTS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Clear expired toast
    pub fn clear_expired_toast(&mut self) {
        if let Some(ref toast) = self.toast {
            if toast.is_expired() {
                self.toast = None;
            }
        }
    }

    pub fn dismiss_toast(&mut self) -> bool {
        self.toast.take().is_some()
    }

    pub fn show_toast(&mut self, message: &str, kind: ToastKind) {
        self.toast = Some(Toast::new(message, kind));
    }
}
