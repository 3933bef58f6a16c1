//! Shell struct definition and constructor.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use winit::event_loop::EventLoopProxy;
use winit::window::Window;

use vitrine_broker::{BrokerConfig, OriginReturnMatcher, PopupBroker};
use vitrine_common::{EventBus, NotificationQueue, PopupId};
use vitrine_config::{Credentials, ShellConfig};
use vitrine_layout::{LayoutStore, ViewStore};
use vitrine_webview::{ProfileStore, SurfaceConfig, SurfaceKey, SurfaceManager, SurfaceRegistry};
use vitrine_windows::{EditModeController, RegistryEvent, WindowRegistry};

/// Events delivered through the winit proxy from background tasks.
#[derive(Debug, Clone)]
pub enum ShellUserEvent {
    /// A popup session's completion deadline elapsed.
    PopupDeadline(PopupId),
}

/// Top-level shell state.
pub struct Shell {
    pub(super) config: ShellConfig,
    pub(super) surface_config: SurfaceConfig,
    pub(super) credentials: Option<Credentials>,
    pub(super) layout_name: String,

    // Core state
    pub(super) registry: WindowRegistry,
    pub(super) edit: EditModeController,
    pub(super) broker: PopupBroker,
    pub(super) store: LayoutStore,
    pub(super) views: ViewStore,
    pub(super) profile_store: ProfileStore,

    // Rendering surfaces
    pub(super) surfaces: SurfaceManager,
    pub(super) surface_registry: SurfaceRegistry,

    // Native windows, both directions
    pub(super) native: HashMap<SurfaceKey, Arc<Window>>,
    pub(super) by_native_id: HashMap<winit::window::WindowId, SurfaceKey>,

    // Event plumbing
    pub(super) event_bus: Arc<EventBus>,
    pub(super) bus_rx: tokio::sync::broadcast::Receiver<vitrine_common::ShellEvent>,
    pub(super) registry_rx: tokio::sync::broadcast::Receiver<RegistryEvent>,
    pub(super) notifications: NotificationQueue,
    pub(super) tokio_runtime: tokio::runtime::Runtime,

    // Input tracking
    pub(super) modifiers: winit::keyboard::ModifiersState,
    pub(super) cursor: HashMap<winit::window::WindowId, (f64, f64)>,

    pub(super) initialized: bool,
    pub(super) should_exit: bool,
}

impl Shell {
    pub fn new(
        config: ShellConfig,
        credentials: Option<Credentials>,
        layout_name: String,
        proxy: EventLoopProxy<ShellUserEvent>,
    ) -> Self {
        let layouts_dir = match config.general.storage_dir.clone() {
            Some(dir) => dir.join("layouts"),
            None => vitrine_layout::paths::default_layouts_dir().unwrap_or_else(|e| {
                tracing::warn!("no platform config directory, using cwd: {e}");
                std::path::PathBuf::from("layouts")
            }),
        };
        // An entirely unwritable storage directory is the one storage
        // failure worth surfacing loudly; everything else degrades.
        if let Err(e) = vitrine_layout::paths::ensure_layouts_dir(&layouts_dir) {
            tracing::error!(dir = %layouts_dir.display(), "storage directory unavailable: {e}");
        }
        let profile_dir = layouts_dir
            .parent()
            .map(|p| p.join("profile"))
            .unwrap_or_else(|| std::path::PathBuf::from("profile"));

        let store = LayoutStore::new(layouts_dir.clone());
        let views = ViewStore::new(layouts_dir);
        let profile_store = ProfileStore::new(profile_dir);

        let event_bus = Arc::new(EventBus::new(256));
        let bus_rx = event_bus.subscribe();

        let matcher = OriginReturnMatcher::new(
            &config.popup.success_patterns,
            &config.popup.failure_patterns,
        )
        .unwrap_or_else(|e| {
            tracing::warn!("popup patterns rejected, using defaults: {e}");
            OriginReturnMatcher::default()
        });

        let mut broker = PopupBroker::new(
            Arc::new(matcher),
            BrokerConfig {
                timeout: std::time::Duration::from_secs(config.popup.timeout_secs.max(1)),
            },
            Arc::clone(&event_bus),
        );

        let tokio_runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("failed to create tokio runtime");

        // Timer expiries flow: broker timer task -> channel -> forwarder ->
        // winit proxy -> user_event -> broker input. Everything stays on
        // the event loop.
        let (timer_tx, mut timer_rx) = mpsc::unbounded_channel::<PopupId>();
        broker.enable_timers(tokio_runtime.handle().clone(), timer_tx);
        tokio_runtime.spawn(async move {
            while let Some(popup_id) = timer_rx.recv().await {
                if proxy
                    .send_event(ShellUserEvent::PopupDeadline(popup_id))
                    .is_err()
                {
                    break;
                }
            }
        });

        let mut surface_config = SurfaceConfig::default();
        if let Some(ua) = &config.surface.user_agent {
            surface_config.user_agent = ua.clone();
        }
        surface_config.transparent = config.surface.transparent;

        let registry = WindowRegistry::new();
        let registry_rx = registry.subscribe();

        Self {
            config,
            surface_config,
            credentials,
            layout_name,
            registry,
            edit: EditModeController::new(),
            broker,
            store,
            views,
            profile_store,
            surfaces: SurfaceManager::new(),
            surface_registry: SurfaceRegistry::new(),
            native: HashMap::new(),
            by_native_id: HashMap::new(),
            event_bus,
            bus_rx,
            registry_rx,
            notifications: NotificationQueue::new(16),
            tokio_runtime,
            modifiers: winit::keyboard::ModifiersState::empty(),
            cursor: HashMap::new(),
            initialized: false,
            should_exit: false,
        }
    }
}
