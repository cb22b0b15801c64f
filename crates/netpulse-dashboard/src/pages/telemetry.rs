//! Telemetry page — rolling metric chart, manual/batch/continuous
//! acquisition, CSV upload, and anomaly analysis.

use std::cell::Cell;
use std::rc::Rc;

use leptos::ev;
use leptos::prelude::*;
use web_sys::HtmlInputElement;

use netpulse_core::api::AnalysisReport;
use netpulse_core::chart::ChartView;
use netpulse_core::error::TelemetryError;
use netpulse_core::sample::{MetricField, MetricPreset};

use crate::{api, upload, AuthState, ControllerVersion, SharedController};

#[component]
pub fn TelemetryPage() -> impl IntoView {
    let controller = expect_context::<SharedController>();
    let version = expect_context::<ControllerVersion>();
    let auth = expect_context::<AuthState>();

    let (error, set_error) = signal(Option::<String>::None);
    let (notice, set_notice) = signal(Option::<String>::None);
    let (analysis, set_analysis) = signal(Option::<AnalysisReport>::None);

    // Session-expiry and auth failures drop the token; everything else is
    // shown inline.
    let auth_report = auth.clone();
    let report = move |err: TelemetryError| {
        if err.requires_login() {
            auth_report.logout();
        } else {
            set_error.set(Some(err.to_string()));
        }
    };

    let chart_controller = controller.clone();
    let chart = move || {
        version.0.get();
        render_chart(chart_controller.borrow().chart_view())
    };

    let field_controller = controller.clone();
    let field_value = move |field: MetricField| {
        let controller = field_controller.clone();
        move || {
            version.0.get();
            controller.borrow().field(field).to_string()
        }
    };

    let preset_controller = controller.clone();
    let on_preset = move |ev: ev::Event| {
        let preset = match event_target_value(&ev).as_str() {
            "optimal" => MetricPreset::Optimal,
            "degraded" => MetricPreset::Degraded,
            "poor" => MetricPreset::Poor,
            _ => MetricPreset::Custom,
        };
        preset_controller.borrow_mut().apply_preset(preset);
        version.bump();
    };

    let batch_controller = controller.clone();
    let report_batch = report.clone();
    let on_batch_toggle = move |ev: ev::Event| {
        let enabled = event_target_checked(&ev);
        if let Err(e) = batch_controller.borrow_mut().set_batch_mode(enabled) {
            report_batch(e);
        }
        version.bump();
    };

    let continuous_controller = controller.clone();
    let report_continuous = report.clone();
    let on_continuous_toggle = move |ev: ev::Event| {
        let enabled = event_target_checked(&ev);
        if let Err(e) = continuous_controller.borrow_mut().set_continuous_mode(enabled) {
            report_continuous(e);
        }
        version.bump();
    };

    let interval_controller = controller.clone();
    let on_interval = move |ev: ev::Event| {
        if let Ok(secs) = event_target_value(&ev).parse::<u64>() {
            interval_controller.borrow_mut().set_interval_secs(secs);
        }
        version.bump();
    };

    let submit_controller = controller.clone();
    let report_submit = report.clone();
    let on_submit = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        set_error.set(None);
        let controller = submit_controller.clone();
        let report = report_submit.clone();
        // The borrow is released before the network call, so other
        // handlers stay free to run while the submission is in flight.
        leptos::task::spawn_local(async move {
            let begun = controller.borrow().begin_manual();
            let (token, reading) = match begun {
                Ok(pair) => pair,
                Err(e) => return report(e),
            };
            let result = api::submit_reading(&token, &reading).await;
            let outcome = controller.borrow_mut().complete_manual(reading, result);
            version.bump();
            match outcome {
                Ok(()) => set_notice.set(Some("Metrics submitted".into())),
                Err(e) => report(e),
            }
        });
    };

    let stage_controller = controller.clone();
    let report_stage = report.clone();
    let on_stage = move |_| {
        set_error.set(None);
        if let Err(e) = stage_controller.borrow_mut().stage_batch_entry() {
            report_stage(e);
        }
        version.bump();
    };

    let commit_controller = controller.clone();
    let report_commit = report.clone();
    let on_commit_batch = move |_| {
        set_error.set(None);
        let controller = commit_controller.clone();
        let report = report_commit.clone();
        // One entry in flight at a time, borrowing only to pick the next
        // entry and to apply its outcome.
        leptos::task::spawn_local(async move {
            let mut committed = 0;
            loop {
                let next = controller.borrow().begin_batch_entry();
                let (token, reading) = match next {
                    Ok(Some(pair)) => pair,
                    Ok(None) => {
                        set_notice.set(Some(format!("{committed} entries committed")));
                        break;
                    }
                    Err(e) => {
                        report(e);
                        break;
                    }
                };
                let result = api::submit_reading(&token, &reading).await;
                let outcome =
                    controller
                        .borrow_mut()
                        .complete_batch_entry(reading, result, committed);
                version.bump();
                match outcome {
                    Ok(()) => committed += 1,
                    Err(e) => {
                        report(e);
                        break;
                    }
                }
            }
        });
    };

    let start_controller = controller.clone();
    let report_start = report.clone();
    let auth_tick = auth.clone();
    let on_start = move |_| {
        set_error.set(None);
        let tick = monitor_tick(
            start_controller.clone(),
            version,
            auth_tick.clone(),
            set_error,
        );
        if let Err(e) = start_controller.borrow_mut().start_continuous_monitoring(tick) {
            report_start(e);
        }
        version.bump();
    };

    let stop_controller = controller.clone();
    let on_stop = move |_| {
        stop_controller.borrow_mut().stop_continuous_monitoring();
        version.bump();
    };

    let upload_controller = controller.clone();
    let on_upload = move |ev: ev::Event| {
        let input: HtmlInputElement = event_target(&ev);
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        let controller = upload_controller.clone();
        upload::read_text(&file, move |result| {
            match result.map_err(|e| e.to_string()).and_then(|text| {
                controller
                    .borrow_mut()
                    .load_csv(&text)
                    .map_err(|e| e.to_string())
            }) {
                Ok(rows) => {
                    set_error.set(None);
                    set_notice.set(Some(format!("Loaded {rows} rows from CSV")));
                }
                Err(e) => set_error.set(Some(e)),
            }
            version.bump();
        });
        // Allow re-uploading the same file.
        input.set_value("");
    };

    let analyze_controller = controller.clone();
    let report_analyze = report.clone();
    let on_analyze = move |_| {
        set_error.set(None);
        let controller = analyze_controller.clone();
        let report = report_analyze.clone();
        leptos::task::spawn_local(async move {
            let begun = controller.borrow().begin_analysis();
            let (token, data) = match begun {
                Ok(pair) => pair,
                Err(e) => return report(e),
            };
            let result = api::analyze(&token, &data).await;
            match controller.borrow_mut().complete_analysis(result) {
                Ok(r) => set_analysis.set(Some(r)),
                Err(e) => report(e),
            }
        });
    };

    let state_controller = controller.clone();
    let is_batch = {
        let controller = state_controller.clone();
        move || {
            version.0.get();
            controller.borrow().is_batch_mode()
        }
    };
    let is_continuous = {
        let controller = state_controller.clone();
        move || {
            version.0.get();
            controller.borrow().is_continuous_mode()
        }
    };
    let is_monitoring = {
        let controller = state_controller.clone();
        move || {
            version.0.get();
            controller.borrow().is_monitoring()
        }
    };
    let interval_secs = {
        let controller = state_controller.clone();
        move || {
            version.0.get();
            controller.borrow().interval_secs().to_string()
        }
    };
    let staged = {
        let controller = state_controller.clone();
        move || {
            version.0.get();
            controller.borrow().batch_entries().to_vec()
        }
    };
    let history = {
        let controller = state_controller.clone();
        move || {
            version.0.get();
            controller.borrow().history().cloned().collect::<Vec<_>>()
        }
    };

    let remove_controller = controller.clone();

    view! {
        <div>
            <div class="page-header">
                <div>
                    <h2>"Telemetry"</h2>
                    <p class="subtitle">"Live network metrics and acquisition"</p>
                </div>
            </div>

            {move || error.get().map(|e| view! {
                <div class="error-msg">{e}</div>
            })}
            {move || notice.get().map(|n| view! {
                <div class="notice-msg">{n}</div>
            })}

            <div class="card">
                <div class="card-header"><h3>"Metric History"</h3></div>
                {chart}
            </div>

            <div class="card">
                <div class="card-header">
                    <h3>"Manual Metrics"</h3>
                    <select class="select select-sm" on:change=on_preset>
                        <option value="custom">"Custom"</option>
                        <option value="optimal">"Optimal"</option>
                        <option value="degraded">"Degraded"</option>
                        <option value="poor">"Poor"</option>
                    </select>
                </div>

                <form on:submit=on_submit>
                    <div class="metric-grid">
                        {MetricField::ALL
                            .into_iter()
                            .map(|field| {
                                let value = field_value(field);
                                let input_controller = controller.clone();
                                view! {
                                    <fieldset class="fieldset">
                                        <label class="fieldset-label">{field.label()}</label>
                                        <input
                                            class="input input-bordered"
                                            type="text"
                                            inputmode="decimal"
                                            prop:value=value
                                            on:input=move |ev| {
                                                input_controller
                                                    .borrow_mut()
                                                    .validate_field(field, &event_target_value(&ev));
                                                version.bump();
                                            }
                                        />
                                    </fieldset>
                                }
                            })
                            .collect_view()}
                    </div>

                    <div class="acquisition-controls">
                        <label class="toggle-label">
                            <input
                                type="checkbox"
                                prop:checked=is_batch.clone()
                                on:change=on_batch_toggle
                            />
                            "Batch mode"
                        </label>
                        <label class="toggle-label">
                            <input
                                type="checkbox"
                                prop:checked=is_continuous.clone()
                                on:change=on_continuous_toggle
                            />
                            "Continuous mode"
                        </label>

                        {
                            let is_batch = is_batch.clone();
                            let is_monitoring = is_monitoring.clone();
                            move || {
                                if is_batch() {
                                    view! {
                                        <div class="btn-group">
                                            <button class="btn btn-secondary" type="button" on:click=on_stage.clone()>
                                                "Stage Entry"
                                            </button>
                                            <button class="btn btn-primary" type="button" on:click=on_commit_batch.clone()>
                                                "Commit Batch"
                                            </button>
                                        </div>
                                    }
                                    .into_any()
                                } else if is_monitoring() {
                                    view! {
                                        <button class="btn btn-warning" type="button" on:click=on_stop.clone()>
                                            "Stop Monitoring"
                                        </button>
                                    }
                                    .into_any()
                                } else {
                                    view! {
                                        <button class="btn btn-primary" type="submit">"Submit"</button>
                                    }
                                    .into_any()
                                }
                            }
                        }
                    </div>

                    {
                        let is_continuous = is_continuous.clone();
                        let is_monitoring = is_monitoring.clone();
                        let interval_secs = interval_secs.clone();
                        let on_start = on_start.clone();
                        move || {
                            is_continuous().then(|| view! {
                                <div class="monitoring-controls">
                                    <label class="fieldset-label">"Interval (seconds)"</label>
                                    <input
                                        class="input input-bordered input-sm"
                                        type="number"
                                        min="1"
                                        prop:value=interval_secs.clone()
                                        disabled=is_monitoring.clone()
                                        on:change=on_interval.clone()
                                    />
                                    {
                                        let is_monitoring = is_monitoring.clone();
                                        let on_start = on_start.clone();
                                        move || {
                                            (!is_monitoring()).then(|| view! {
                                                <button class="btn btn-primary btn-sm" type="button" on:click=on_start.clone()>
                                                    "Start Monitoring"
                                                </button>
                                            })
                                        }
                                    }
                                </div>
                            })
                        }
                    }
                </form>
            </div>

            {
                let staged = staged.clone();
                move || {
                    let entries = staged();
                    (!entries.is_empty()).then(|| {
                        let remove_controller = remove_controller.clone();
                        view! {
                            <div class="card">
                                <div class="card-header"><h3>"Staged Entries"</h3></div>
                                <ul class="staged-list">
                                    {entries
                                        .into_iter()
                                        .enumerate()
                                        .map(|(index, entry)| {
                                            let controller = remove_controller.clone();
                                            view! {
                                                <li>
                                                    <span>
                                                        {format!(
                                                            "{} ms / {} Mbps / {}% loss / {} ms jitter",
                                                            entry.latency,
                                                            entry.bandwidth,
                                                            entry.packet_loss,
                                                            entry.jitter,
                                                        )}
                                                    </span>
                                                    <button
                                                        class="btn btn-ghost btn-sm"
                                                        on:click=move |_| {
                                                            controller.borrow_mut().remove_batch_entry(index);
                                                            version.bump();
                                                        }
                                                    >
                                                        "Remove"
                                                    </button>
                                                </li>
                                            }
                                        })
                                        .collect_view()}
                                </ul>
                            </div>
                        }
                    })
                }
            }

            <div class="card">
                <div class="card-header">
                    <h3>"Historical Upload"</h3>
                </div>
                <p class="subtitle">"CSV with columns: timestamp, latency, bandwidth, packet_loss, jitter"</p>
                <input type="file" accept=".csv,text/csv" on:change=on_upload />
            </div>

            <div class="card">
                <div class="card-header">
                    <h3>"Anomaly Analysis"</h3>
                    <button class="btn btn-primary btn-sm" on:click=on_analyze>"Run Analysis"</button>
                </div>
                {move || analysis.get().map(render_analysis)}
            </div>

            {
                let history = history.clone();
                move || {
                    let samples = history();
                    (!samples.is_empty()).then(|| view! {
                        <div class="card">
                            <div class="card-header"><h3>"Recent Submissions"</h3></div>
                            <ul class="history-list">
                                {samples
                                    .into_iter()
                                    .map(|sample| view! {
                                        <li>
                                            <span class="timestamp">{sample.timestamp.clone()}</span>
                                            {format!(
                                                " — {} ms, {} Mbps, {}%, {} ms",
                                                sample.reading.latency,
                                                sample.reading.bandwidth,
                                                sample.reading.packet_loss,
                                                sample.reading.jitter,
                                            )}
                                        </li>
                                    })
                                    .collect_view()}
                            </ul>
                        </div>
                    })
                }
            }
        </div>
    }
}

/// Tick body for continuous monitoring. Ticks are serialized: one that
/// arrives while the previous submission is still in flight is skipped,
/// never queued. The controller is borrowed only to read the form and to
/// apply the outcome, so every other handler (stopping the monitor
/// included) stays responsive during the call.
fn monitor_tick(
    controller: SharedController,
    version: ControllerVersion,
    auth: AuthState,
    set_error: WriteSignal<Option<String>>,
) -> Box<dyn FnMut()> {
    let in_flight = Rc::new(Cell::new(false));
    Box::new(move || {
        if in_flight.get() {
            log::debug!("monitor tick skipped: previous submission in flight");
            return;
        }
        in_flight.set(true);
        let in_flight = in_flight.clone();
        let controller = controller.clone();
        let auth = auth.clone();
        leptos::task::spawn_local(async move {
            let begun = controller.borrow().begin_manual();
            let outcome = match begun {
                Ok((token, reading)) => {
                    let result = api::submit_reading(&token, &reading).await;
                    controller.borrow_mut().complete_manual(reading, result)
                }
                Err(e) => Err(e),
            };
            in_flight.set(false);
            version.bump();
            if let Err(err) = outcome {
                if err.requires_login() {
                    auth.logout();
                } else {
                    set_error.set(Some(err.to_string()));
                }
            }
        });
    })
}

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 220.0;

/// Inline SVG projection of the chart view: one polyline per metric, each
/// scaled against its own axis maximum.
fn render_chart(chart: ChartView) -> AnyView {
    if chart.labels.is_empty() {
        return view! { <p class="empty">"No telemetry yet — submit metrics or upload a CSV."</p> }
            .into_any();
    }

    let n = chart.labels.len();
    let step = if n > 1 {
        CHART_WIDTH / (n as f64 - 1.0)
    } else {
        0.0
    };

    let lines = chart
        .series
        .iter()
        .map(|series| {
            let points = series
                .points
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    let x = i as f64 * step;
                    let y = CHART_HEIGHT - (value / series.axis_max).clamp(0.0, 1.0) * CHART_HEIGHT;
                    format!("{x:.1},{y:.1}")
                })
                .collect::<Vec<_>>()
                .join(" ");
            view! {
                <polyline points=points fill="none" stroke=series.color stroke-width="2" />
            }
        })
        .collect_view();

    let legend = chart
        .series
        .iter()
        .map(|series| {
            view! {
                <span class="legend-item">
                    <span class="legend-swatch" style=format!("background:{}", series.color)></span>
                    {format!("{} ({})", series.name, series.unit)}
                </span>
            }
        })
        .collect_view();

    let first = chart.labels.first().cloned().unwrap_or_default();
    let last = chart.labels.last().cloned().unwrap_or_default();

    view! {
        <div class="chart">
            <svg
                viewBox=format!("0 0 {CHART_WIDTH} {CHART_HEIGHT}")
                preserveAspectRatio="none"
                class="chart-svg"
            >
                {lines}
            </svg>
            <div class="chart-axis">
                <span>{first}</span>
                <span>{last}</span>
            </div>
            <div class="chart-legend">{legend}</div>
        </div>
    }
    .into_any()
}

/// Fault-risk banding: below 0.3 healthy, above 0.7 critical.
fn render_analysis(report: AnalysisReport) -> AnyView {
    let risk = report.fault_risk();
    let (band_class, band_label) = if risk > 0.7 {
        ("risk-high", "High")
    } else if risk > 0.3 {
        ("risk-elevated", "Elevated")
    } else {
        ("risk-low", "Low")
    };

    view! {
        <div class="analysis">
            <div class="analysis-summary">
                <span class=format!("badge {band_class}")>
                    {format!("{band_label} fault risk: {:.0}%", risk * 100.0)}
                </span>
                <span>
                    {format!(
                        "{} anomalies across {} points (avg similarity {:.2})",
                        report.total_anomalies,
                        report.data_points_analyzed,
                        report.average_similarity,
                    )}
                </span>
            </div>
            {
                let anomalous: Vec<_> = report.anomalies().copied().collect();
                (!anomalous.is_empty()).then(|| view! {
                    <ul class="anomaly-list">
                        {anomalous
                            .into_iter()
                            .map(|point| view! {
                                <li>
                                    {format!(
                                        "value {:.2}, similarity {:.2}",
                                        point.value, point.similarity,
                                    )}
                                </li>
                            })
                            .collect_view()}
                    </ul>
                })
            }
        </div>
    }
    .into_any()
}
