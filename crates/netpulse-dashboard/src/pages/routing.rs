//! Routing page — path computation, QoS summary, topology highlighting,
//! and recent route history.

use leptos::ev;
use leptos::prelude::*;

use netpulse_core::api::{
    RouteHistoryEntry, RouteRequest, RouteResponse, RoutingAlgorithm, NODE_ID_MAX, NODE_ID_MIN,
};
use netpulse_core::error::ApiError;
use netpulse_core::topology::{self, CongestionBand, RenderGraph};

use crate::{api, AuthState};

#[component]
pub fn RoutingPage() -> impl IntoView {
    let auth = expect_context::<AuthState>();

    let (source, set_source) = signal(1u32);
    let (target, set_target) = signal(7u32);
    let (algorithm, set_algorithm) = signal(RoutingAlgorithm::Dijkstra);
    let (k_paths, set_k_paths) = signal(3u32);

    let (response, set_response) = signal(Option::<RouteResponse>::None);
    let (selected_path, set_selected_path) = signal(0usize);
    let (history, set_history) = signal(Vec::<RouteHistoryEntry>::new());
    let (error, set_error) = signal(Option::<String>::None);
    let (loading, set_loading) = signal(false);

    let auth_err = auth.clone();
    let report = move |err: ApiError| {
        if matches!(err, ApiError::CredentialRejected) {
            auth_err.logout();
        } else {
            set_error.set(Some(err.to_string()));
        }
    };

    // Load route history on mount.
    let auth_load = auth.clone();
    let report_load = report.clone();
    Effect::new(move || {
        if let Some(token) = auth_load.token.get() {
            let report = report_load.clone();
            leptos::task::spawn_local(async move {
                match api::routing_history(&token).await {
                    Ok(data) => set_history.set(data.entries),
                    Err(e) => report(e),
                }
            });
        }
    });

    let auth_compute = auth.clone();
    let report_compute = report.clone();
    let on_compute = move |ev: ev::SubmitEvent| {
        ev.prevent_default();
        set_error.set(None);

        let request = RouteRequest {
            source: source.get_untracked(),
            target: target.get_untracked(),
            algorithm: algorithm.get_untracked(),
            k_paths: k_paths.get_untracked(),
        };
        if let Err(e) = request.validate() {
            set_error.set(Some(e.to_string()));
            return;
        }
        let Some(token) = auth_compute.token.get_untracked() else {
            return;
        };

        set_loading.set(true);
        let report = report_compute.clone();
        leptos::task::spawn_local(async move {
            match api::compute_route(&token, &request).await {
                Ok(resp) => {
                    set_selected_path.set(0);
                    set_response.set(Some(resp));
                    if let Ok(data) = api::routing_history(&token).await {
                        set_history.set(data.entries);
                    }
                }
                Err(e) => report(e),
            }
            set_loading.set(false);
        });
    };

    let rendered = move || {
        response.get().map(|resp| {
            let index = selected_path.get().min(resp.paths.len().saturating_sub(1));
            let path = resp.paths.get(index).map(Vec::as_slice).unwrap_or(&[]);
            let graph = topology::highlight(&resp.visualization_data, path);
            (resp, index, graph)
        })
    };

    view! {
        <div>
            <div class="page-header">
                <div>
                    <h2>"Routing"</h2>
                    <p class="subtitle">"Compute resilient paths across the topology"</p>
                </div>
            </div>

            {move || error.get().map(|e| view! {
                <div class="error-msg">{e}</div>
            })}

            <div class="card">
                <form on:submit=on_compute>
                    <div class="route-form">
                        <fieldset class="fieldset">
                            <label class="fieldset-label">"Source node"</label>
                            <input
                                class="input input-bordered input-sm"
                                type="number"
                                min=NODE_ID_MIN.to_string()
                                max=NODE_ID_MAX.to_string()
                                prop:value=move || source.get().to_string()
                                on:change=move |ev| {
                                    if let Ok(v) = event_target_value(&ev).parse() {
                                        set_source.set(v);
                                    }
                                }
                            />
                        </fieldset>
                        <fieldset class="fieldset">
                            <label class="fieldset-label">"Target node"</label>
                            <input
                                class="input input-bordered input-sm"
                                type="number"
                                min=NODE_ID_MIN.to_string()
                                max=NODE_ID_MAX.to_string()
                                prop:value=move || target.get().to_string()
                                on:change=move |ev| {
                                    if let Ok(v) = event_target_value(&ev).parse() {
                                        set_target.set(v);
                                    }
                                }
                            />
                        </fieldset>
                        <fieldset class="fieldset">
                            <label class="fieldset-label">"Algorithm"</label>
                            <select
                                class="select select-sm"
                                on:change=move |ev| {
                                    if let Ok(a) = event_target_value(&ev).parse() {
                                        set_algorithm.set(a);
                                    }
                                }
                            >
                                {RoutingAlgorithm::ALL
                                    .into_iter()
                                    .map(|a| view! {
                                        <option value=a.as_str() selected=move || algorithm.get() == a>
                                            {a.label()}
                                        </option>
                                    })
                                    .collect_view()}
                            </select>
                        </fieldset>
                        <fieldset class="fieldset">
                            <label class="fieldset-label">"Paths (k)"</label>
                            <input
                                class="input input-bordered input-sm"
                                type="number"
                                min="1"
                                max="10"
                                prop:value=move || k_paths.get().to_string()
                                on:change=move |ev| {
                                    if let Ok(v) = event_target_value(&ev).parse() {
                                        set_k_paths.set(v);
                                    }
                                }
                            />
                        </fieldset>
                        <button class="btn btn-primary" type="submit" disabled=move || loading.get()>
                            {move || if loading.get() { "Computing…" } else { "Compute Route" }}
                        </button>
                    </div>
                </form>
            </div>

            {move || rendered().map(|(resp, index, graph)| view! {
                <div class="card">
                    <div class="card-header"><h3>"Quality of Service"</h3></div>
                    <div class="qos-grid">
                        <div>
                            <span class="qos-label">"End-to-end latency"</span>
                            <span class="qos-value">{format!("{:.1} ms", resp.qos_metrics.end_to_end_latency)}</span>
                        </div>
                        <div>
                            <span class="qos-label">"Available bandwidth"</span>
                            <span class="qos-value">{format!("{:.1} Mbps", resp.qos_metrics.available_bandwidth)}</span>
                        </div>
                        <div>
                            <span class="qos-label">"Loss probability"</span>
                            <span class="qos-value">{format!("{:.2}%", resp.qos_metrics.packet_loss_probability * 100.0)}</span>
                        </div>
                        <div>
                            <span class="qos-label">"Total jitter"</span>
                            <span class="qos-value">{format!("{:.1} ms", resp.qos_metrics.total_jitter)}</span>
                        </div>
                    </div>

                    <div class="path-list">
                        {resp.paths
                            .iter()
                            .enumerate()
                            .map(|(i, path)| {
                                let label = format!(
                                    "Path {}: {} (cost {:.2})",
                                    i + 1,
                                    path.iter().map(u32::to_string).collect::<Vec<_>>().join(" → "),
                                    resp.costs.get(i).copied().unwrap_or_default(),
                                );
                                view! {
                                    <button
                                        class=move || if i == index { "path selected" } else { "path" }
                                        on:click=move |_| set_selected_path.set(i)
                                    >
                                        {label}
                                    </button>
                                }
                            })
                            .collect_view()}
                    </div>

                    {render_topology(&graph)}
                </div>
            })}

            {move || {
                let entries = history.get();
                (!entries.is_empty()).then(|| view! {
                    <div class="card">
                        <div class="card-header"><h3>"Recent Routes"</h3></div>
                        <ul class="history-list">
                            {entries
                                .into_iter()
                                .map(|entry| view! {
                                    <li>
                                        <span class="timestamp">{entry.timestamp.clone()}</span>
                                        {format!(
                                            " — {} → {} via {} ({}, cost {:.2})",
                                            entry.source,
                                            entry.target,
                                            entry
                                                .path
                                                .iter()
                                                .map(u32::to_string)
                                                .collect::<Vec<_>>()
                                                .join("-"),
                                            entry.algorithm.label(),
                                            entry.cost,
                                        )}
                                    </li>
                                })
                                .collect_view()}
                        </ul>
                    </div>
                })
            }}
        </div>
    }
}

/// Node chips plus an edge list with in-path highlighting and congestion
/// banding.
fn render_topology(graph: &RenderGraph) -> AnyView {
    let nodes = graph
        .nodes
        .iter()
        .map(|node| {
            let class = if node.in_path {
                "node node-in-path"
            } else {
                "node"
            };
            view! { <div class=class>{format!("Node {}", node.id)}</div> }
        })
        .collect_view();

    let edges = graph
        .edges
        .iter()
        .map(|edge| {
            let class = if edge.in_path {
                "edge edge-in-path"
            } else {
                "edge"
            };
            let band_class = match edge.metrics.congestion_band() {
                CongestionBand::High => "load load-high",
                CongestionBand::Moderate => "load load-moderate",
                CongestionBand::Low => "load load-low",
            };
            view! {
                <div class=class>
                    <div class="edge-header">
                        <span>{format!("{} → {}", edge.source, edge.target)}</span>
                        <span class=band_class>
                            {format!("{:.0}% Load", edge.metrics.congestion * 100.0)}
                        </span>
                    </div>
                    <div class="edge-metrics">
                        <span>{format!("Latency: {} ms", edge.metrics.latency)}</span>
                        <span>{format!("Bandwidth: {} Mbps", edge.metrics.bandwidth)}</span>
                        <span>{format!("Loss: {:.1}%", edge.metrics.packet_loss * 100.0)}</span>
                        <span>{format!("Jitter: {} ms", edge.metrics.jitter)}</span>
                    </div>
                </div>
            }
        })
        .collect_view();

    view! {
        <div class="topology">
            <div class="topology-nodes">{nodes}</div>
            <div class="topology-edges">{edges}</div>
        </div>
    }
    .into_any()
}
