//! netpulse Dashboard — Leptos CSR WASM application.
//!
//! Single-page app over the resilience REST API: telemetry acquisition
//! with a rolling chart, route computation with topology highlighting,
//! and threshold configuration.

pub mod api;
pub mod pages;
pub mod upload;

use std::cell::RefCell;
use std::rc::Rc;

use gloo_storage::{LocalStorage, Storage};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;
use send_wrapper::SendWrapper;

use netpulse_core::controller::AcquisitionController;

use api::{BrowserTimers, HttpTelemetryApi, StoredCredentials};
use pages::login::LoginPage;
use pages::routing::RoutingPage;
use pages::settings::SettingsPage;
use pages::telemetry::TelemetryPage;

pub const TOKEN_KEY: &str = "netpulse_token";

/// The acquisition controller wired to the browser capabilities.
pub type Controller = AcquisitionController<HttpTelemetryApi, StoredCredentials, BrowserTimers>;

/// Single controller instance shared across pages via Leptos context.
/// All access happens on the one event-loop thread, and no borrow is ever
/// held across an await: async flows use the controller's begin/complete
/// pairs, borrowing briefly before and after the network call (see
/// `pages::telemetry`).
pub type SharedController = SendWrapper<Rc<RefCell<Controller>>>;

/// Bumped after every controller mutation so views re-derive from the
/// controller state.
#[derive(Clone, Copy)]
pub struct ControllerVersion(pub RwSignal<u64>);

impl ControllerVersion {
    pub fn bump(&self) {
        self.0.update(|v| *v += 1);
    }
}

// ── Auth State ──────────────────────────────────────────────────────

/// Global authentication state, provided via Leptos context.
#[derive(Clone)]
pub struct AuthState {
    pub token: ReadSignal<Option<String>>,
    set_token: WriteSignal<Option<String>>,
}

impl AuthState {
    fn new() -> Self {
        let stored: Option<String> = LocalStorage::get(TOKEN_KEY).ok();
        let (token, set_token) = signal(stored);
        Self { token, set_token }
    }

    pub fn login(&self, token: String) {
        let _ = LocalStorage::set(TOKEN_KEY, &token);
        self.set_token.set(Some(token));
    }

    pub fn logout(&self) {
        LocalStorage::delete(TOKEN_KEY);
        self.set_token.set(None);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.get_untracked().is_some()
    }
}

// ── App Root ────────────────────────────────────────────────────────

/// Leptos application root.
#[component]
pub fn App() -> impl IntoView {
    let auth = AuthState::new();
    let controller: SharedController = SendWrapper::new(Rc::new(RefCell::new(
        AcquisitionController::new(HttpTelemetryApi, StoredCredentials, BrowserTimers),
    )));

    provide_context(auth.clone());
    provide_context(controller);
    provide_context(ControllerVersion(RwSignal::new(0)));

    view! {
        <Router>
            {move || {
                if auth.token.get().is_none() {
                    view! { <LoginPage /> }.into_any()
                } else {
                    view! { <DashboardShell /> }.into_any()
                }
            }}
        </Router>
    }
}

// ── Dashboard Shell (sidebar + content) ─────────────────────────────

const HEALTH_POLL_MILLIS: u32 = 30_000;

#[component]
fn DashboardShell() -> impl IntoView {
    let auth = expect_context::<AuthState>();
    let (healthy, set_healthy) = signal(Option::<bool>::None);

    // Poll backend health now and on a fixed period.
    let poll = move || {
        leptos::task::spawn_local(async move {
            match api::health_check().await {
                Ok(status) => set_healthy.set(Some(status.status == "ok")),
                Err(err) => {
                    log::warn!("health check failed: {err}");
                    set_healthy.set(Some(false));
                }
            }
        });
    };
    poll();
    let health_timer =
        SendWrapper::new(gloo_timers::callback::Interval::new(HEALTH_POLL_MILLIS, poll));
    on_cleanup(move || drop(health_timer));

    view! {
        <div class="app-layout">
            <nav class="sidebar">
                <div class="sidebar-brand">
                    <h1>"netpulse"</h1>
                    <span class="version">"v0.1"</span>
                </div>
                <div class="sidebar-nav">
                    <a href="/telemetry">
                        <span class="icon">"📈"</span>
                        "Telemetry"
                    </a>
                    <a href="/routing">
                        <span class="icon">"🗺"</span>
                        "Routing"
                    </a>
                    <a href="/settings">
                        <span class="icon">"⚙"</span>
                        "Settings"
                    </a>
                </div>
                <div class="sidebar-footer">
                    <div style="display: flex; justify-content: space-between; align-items: center;">
                        <span>
                            {move || match healthy.get() {
                                Some(true) => view! { <span class="badge badge-online"><span class="dot dot-green"></span>"Healthy"</span> }.into_any(),
                                Some(false) => view! { <span class="badge badge-offline"><span class="dot dot-red"></span>"Degraded"</span> }.into_any(),
                                None => view! { <span class="badge badge-offline"><span class="dot dot-gray"></span>"Checking"</span> }.into_any(),
                            }}
                        </span>
                        <button
                            class="btn btn-ghost btn-sm"
                            on:click=move |_| auth.logout()
                        >
                            "Logout"
                        </button>
                    </div>
                </div>
            </nav>
            <main class="main-content">
                <Routes fallback=|| view! { <TelemetryPage /> }>
                    <Route path=path!("/") view=TelemetryPage />
                    <Route path=path!("/telemetry") view=TelemetryPage />
                    <Route path=path!("/routing") view=RoutingPage />
                    <Route path=path!("/settings") view=SettingsPage />
                </Routes>
            </main>
        </div>
    }
}

// ── WASM entry point ────────────────────────────────────────────────

/// Called by trunk to mount the app.
pub fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    log::info!("netpulse dashboard starting");
    leptos::mount::mount_to_body(App);
}
