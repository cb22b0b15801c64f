//! Settings page — similarity threshold and penalty-model retraining.

use leptos::ev;
use leptos::prelude::*;

use netpulse_core::api::ThresholdConfig;
use netpulse_core::error::ApiError;

use crate::{api, AuthState};

#[component]
pub fn SettingsPage() -> impl IntoView {
    let auth = expect_context::<AuthState>();

    let (threshold, set_threshold) = signal(String::new());
    let (error, set_error) = signal(Option::<String>::None);
    let (notice, set_notice) = signal(Option::<String>::None);
    let (saving, set_saving) = signal(false);

    let auth_err = auth.clone();
    let report = move |err: ApiError| {
        if matches!(err, ApiError::CredentialRejected) {
            auth_err.logout();
        } else {
            set_error.set(Some(err.to_string()));
        }
    };

    // Load current configuration on mount.
    let auth_load = auth.clone();
    let report_load = report.clone();
    Effect::new(move || {
        if let Some(token) = auth_load.token.get() {
            let report = report_load.clone();
            leptos::task::spawn_local(async move {
                match api::get_config(&token).await {
                    Ok(config) => set_threshold.set(config.similarity_thresh.to_string()),
                    Err(e) => report(e),
                }
            });
        }
    });

    let auth_save = auth.clone();
    let report_save = report.clone();
    let on_save = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        set_error.set(None);
        set_notice.set(None);

        let raw = threshold.get_untracked();
        let parsed = match raw.trim().parse::<f64>() {
            Ok(value) => value,
            Err(_) => {
                set_error.set(Some(format!("{raw:?} is not a number")));
                return;
            }
        };
        let config = match ThresholdConfig::new(parsed) {
            Ok(config) => config,
            Err(e) => {
                set_error.set(Some(e.to_string()));
                return;
            }
        };
        let Some(token) = auth_save.token.get_untracked() else {
            return;
        };

        set_saving.set(true);
        let report = report_save.clone();
        leptos::task::spawn_local(async move {
            match api::update_config(&token, &config).await {
                Ok(resp) => {
                    set_threshold.set(resp.config.similarity_thresh.to_string());
                    set_notice.set(Some("Configuration updated".into()));
                }
                Err(e) => report(e),
            }
            set_saving.set(false);
        });
    };

    let auth_retrain = auth.clone();
    let report_retrain = report.clone();
    let on_retrain = move |_| {
        set_error.set(None);
        set_notice.set(None);
        let Some(token) = auth_retrain.token.get_untracked() else {
            return;
        };
        let report = report_retrain.clone();
        leptos::task::spawn_local(async move {
            match api::retrain_penalty(&token).await {
                Ok(resp) => set_notice.set(Some(resp.status)),
                Err(e) => report(e),
            }
        });
    };

    view! {
        <div>
            <div class="page-header">
                <div>
                    <h2>"Settings"</h2>
                    <p class="subtitle">"Anomaly detection and routing model configuration"</p>
                </div>
            </div>

            {move || error.get().map(|e| view! {
                <div class="error-msg">{e}</div>
            })}
            {move || notice.get().map(|n| view! {
                <div class="notice-msg">{n}</div>
            })}

            <div class="card">
                <div class="card-header"><h3>"Similarity Threshold"</h3></div>
                <p class="subtitle">
                    "Data points whose similarity to the learned baseline falls below this value are flagged as anomalies (0 to 1)."
                </p>
                <form on:submit=on_save>
                    <div class="settings-row">
                        <input
                            class="input input-bordered input-sm"
                            type="number"
                            step="0.01"
                            min="0"
                            max="1"
                            prop:value=move || threshold.get()
                            on:input=move |ev| set_threshold.set(event_target_value(&ev))
                        />
                        <button class="btn btn-primary" type="submit" disabled=move || saving.get()>
                            {move || if saving.get() { "Saving…" } else { "Save" }}
                        </button>
                    </div>
                </form>
            </div>

            <div class="card">
                <div class="card-header"><h3>"Penalty Model"</h3></div>
                <p class="subtitle">
                    "Retrain the congestion-penalty model used when adjusting routing costs."
                </p>
                <button class="btn btn-secondary" on:click=on_retrain>"Retrain"</button>
            </div>
        </div>
    }
}
