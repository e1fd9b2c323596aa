use dioxus::prelude::*;
use hkmap_shared::models::{Marker, MarkerCategory};
use hkmap_shared::store::MarkerPatch;

use crate::coords;

struct Row {
    marker: Marker,
    color: &'static str,
    coords_text: String,
    selected: bool,
    editing: bool,
}

#[component]
pub fn MarkerList(
    markers: Memo<Vec<Marker>>,
    selected_id: Signal<Option<u64>>,
    on_update: EventHandler<(u64, MarkerPatch)>,
    on_delete: EventHandler<u64>,
    on_focus: EventHandler<(f64, f64)>,
) -> Element {
    let mut selected_id = selected_id;
    let mut editing = use_signal(|| None::<u64>);
    let mut draft_name = use_signal(String::new);
    let mut draft_description = use_signal(String::new);
    let mut draft_category = use_signal(|| MarkerCategory::DEFAULT.index());

    let cur_selected = *selected_id.read();
    let cur_editing = *editing.read();
    let rows: Vec<Row> = markers
        .read()
        .iter()
        .map(|marker| Row {
            marker: marker.clone(),
            color: MarkerCategory::from_index(marker.category).color(),
            coords_text: coords::format_geo(marker.lat, marker.lon),
            selected: cur_selected == Some(marker.id),
            editing: cur_editing == Some(marker.id),
        })
        .collect();
    let count = rows.len();

    let category_options: Vec<(u8, String)> = MarkerCategory::ALL
        .iter()
        .map(|c| (c.index(), c.to_string()))
        .collect();

    rsx! {
        div { class: "panel",
            h3 { "我的標記 ({count})" }
            if rows.is_empty() {
                div { class: "marker-list-empty", "未有標記，先搜尋一個地點" }
            }
            ul { class: "marker-list",
                for row in rows {
                    li {
                        key: "{row.marker.id}",
                        class: if row.selected { "marker-row selected" } else { "marker-row" },
                        div {
                            class: "marker-summary",
                            onclick: {
                                let (id, lat, lon) = (row.marker.id, row.marker.lat, row.marker.lon);
                                move |_| {
                                    selected_id.set(Some(id));
                                    on_focus.call((lat, lon));
                                }
                            },
                            span {
                                class: "marker-dot",
                                style: "background: {row.color};",
                            }
                            span { class: "marker-name", "{row.marker.name_zh}" }
                            if !row.marker.district_zh.is_empty() {
                                span { class: "marker-district", "{row.marker.district_zh}" }
                            }
                        }
                        if row.selected && !row.editing {
                            div { class: "marker-detail",
                                if !row.marker.name_en.is_empty() {
                                    div { class: "marker-name-en", "{row.marker.name_en}" }
                                }
                                div { class: "marker-coords", "{row.coords_text}" }
                                if !row.marker.description.is_empty() {
                                    div { class: "marker-description", "{row.marker.description}" }
                                }
                                div { class: "marker-actions",
                                    button {
                                        class: "secondary",
                                        onclick: {
                                            let marker = row.marker.clone();
                                            move |_| {
                                                draft_name.set(marker.name_zh.clone());
                                                draft_description.set(marker.description.clone());
                                                draft_category.set(marker.category);
                                                editing.set(Some(marker.id));
                                            }
                                        },
                                        "編輯"
                                    }
                                    button {
                                        class: "danger",
                                        onclick: {
                                            let id = row.marker.id;
                                            move |_| on_delete.call(id)
                                        },
                                        "刪除"
                                    }
                                }
                            }
                        }
                        if row.editing {
                            div { class: "marker-edit",
                                input {
                                    r#type: "text",
                                    value: "{draft_name}",
                                    oninput: move |evt: Event<FormData>| {
                                        draft_name.set(evt.value().to_string());
                                    },
                                }
                                textarea {
                                    placeholder: "備註…",
                                    value: "{draft_description}",
                                    oninput: move |evt: Event<FormData>| {
                                        draft_description.set(evt.value().to_string());
                                    },
                                }
                                select {
                                    value: "{draft_category}",
                                    onchange: move |evt: Event<FormData>| {
                                        if let Ok(index) = evt.value().parse::<u8>() {
                                            draft_category.set(index);
                                        }
                                    },
                                    for (index, name) in category_options.clone() {
                                        option {
                                            value: "{index}",
                                            selected: *draft_category.read() == index,
                                            "{name}"
                                        }
                                    }
                                }
                                div { class: "marker-actions",
                                    button {
                                        onclick: {
                                            let id = row.marker.id;
                                            move |_| {
                                                on_update.call((id, MarkerPatch {
                                                    name_zh: Some(draft_name.read().clone()),
                                                    description: Some(draft_description.read().clone()),
                                                    category: Some(*draft_category.read()),
                                                }));
                                                editing.set(None);
                                            }
                                        },
                                        "儲存"
                                    }
                                    button {
                                        class: "secondary",
                                        onclick: move |_| editing.set(None),
                                        "取消"
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
