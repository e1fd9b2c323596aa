use std::collections::HashSet;

use dioxus::prelude::*;
use hkmap_shared::models::SearchCandidate;
use hkmap_shared::places;
use hkmap_shared::projection;
use hkmap_shared::search::{SearchSession, SearchStatus};
use hkmap_shared::store::{MarkerPatch, MarkerStore};

use crate::api;
use crate::components::map_view::MapView;
use crate::components::marker_list::MarkerList;
use crate::components::search_panel::SearchPanel;
use crate::storage::LocalStorage;

/// How long transient notices stay on screen.
const NOTICE_MS: u32 = 4000;

#[component]
pub fn MapPage() -> Element {
    let mut store = use_signal(|| {
        let mut store = MarkerStore::new(LocalStorage::new());
        store.load();
        store
    });
    let mut session = use_signal(SearchSession::new);
    let mut query = use_signal(String::new);
    let mut expanded = use_signal(HashSet::<String>::new);
    let mut selected_id = use_signal(|| None::<u64>);
    let mut focus = use_signal(|| None::<(f64, f64)>);
    let mut notice = use_signal(|| None::<String>);

    let markers = use_memo(move || store.read().list().to_vec());
    let status: SearchStatus = session.read().status().clone();

    let mut show_notice = move |text: String| {
        notice.set(Some(text));
        spawn(async move {
            gloo_timers::future::TimeoutFuture::new(NOTICE_MS).await;
            notice.set(None);
        });
    };

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "香港地圖標記" }
                button {
                    class: "danger",
                    onclick: move |_| {
                        let confirmed = web_sys::window()
                            .and_then(|w| w.confirm_with_message("清除所有標記？").ok())
                            .unwrap_or(false);
                        if confirmed {
                            store.write().clear();
                            selected_id.set(None);
                            expanded.write().clear();
                        }
                    },
                    "清除全部"
                }
                if let Some(text) = &*notice.read() {
                    div { class: "notice", "{text}" }
                }
            }

            div { class: "sidebar",
                SearchPanel {
                    query: query,
                    status: status,
                    on_search: move |_| {
                        let request = session
                            .write()
                            .begin(&query.read(), places::curated_places());
                        if let Some(request) = request {
                            spawn(async move {
                                let remote = api::remote_search(&request.query).await;
                                session.write().complete(request.seq, remote);
                            });
                        }
                    },
                    on_pick: move |candidate: SearchCandidate| {
                        match projection::to_geographic(candidate.x, candidate.y) {
                            Ok(position) => {
                                let marker = store.write().create(&candidate, position);
                                session.write().clear();
                                query.set(String::new());
                                selected_id.set(Some(marker.id));
                                focus.set(Some((marker.lat, marker.lon)));
                            }
                            Err(err) => {
                                tracing::warn!(
                                    "skipping marker for {}: {err}",
                                    candidate.name_zh
                                );
                                show_notice(format!(
                                    "無法轉換「{}」的座標",
                                    candidate.name_zh
                                ));
                            }
                        }
                    },
                }

                MarkerList {
                    markers: markers,
                    selected_id: selected_id,
                    on_update: move |(id, patch): (u64, MarkerPatch)| {
                        if let Err(err) = store.write().update(id, patch) {
                            tracing::warn!("marker update ignored: {err}");
                        }
                    },
                    on_delete: move |id: u64| {
                        store.write().delete(id);
                        if *selected_id.read() == Some(id) {
                            selected_id.set(None);
                        }
                    },
                    on_focus: move |position: (f64, f64)| {
                        focus.set(Some(position));
                    },
                }
            }

            MapView {
                markers: markers,
                expanded: expanded,
                selected_id: selected_id,
                focus: focus,
            }
        }
    }
}
