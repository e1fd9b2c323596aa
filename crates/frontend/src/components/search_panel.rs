use dioxus::prelude::*;
use hkmap_shared::models::{CandidateSource, SearchCandidate};
use hkmap_shared::search::SearchStatus;

#[component]
pub fn SearchPanel(
    query: Signal<String>,
    status: SearchStatus,
    on_search: EventHandler<()>,
    on_pick: EventHandler<SearchCandidate>,
) -> Element {
    let mut query = query;
    let results = status.results().to_vec();
    let searched_empty = status.attempted() && results.is_empty();

    rsx! {
        div { class: "panel",
            h3 { "搜尋地點" }
            div { class: "search-row",
                input {
                    r#type: "text",
                    placeholder: "地點名稱…",
                    value: "{query}",
                    oninput: move |evt: Event<FormData>| {
                        query.set(evt.value().to_string());
                    },
                    onkeydown: move |evt: Event<KeyboardData>| {
                        if evt.key() == Key::Enter {
                            on_search.call(());
                        }
                    },
                }
                button {
                    onclick: move |_| on_search.call(()),
                    "搜尋"
                }
            }
            if searched_empty {
                div { class: "search-empty", "沒有結果" }
            }
            if !results.is_empty() {
                ul { class: "search-results",
                    for candidate in results {
                        li {
                            key: "{candidate.name_zh}-{candidate.x}-{candidate.y}",
                            button {
                                class: "search-result",
                                onclick: {
                                    let candidate = candidate.clone();
                                    move |_| on_pick.call(candidate.clone())
                                },
                                span { class: "result-name", "{candidate.name_zh}" }
                                if !candidate.name_en.is_empty() {
                                    span { class: "result-name-en", "{candidate.name_en}" }
                                }
                                if let Some(district) = &candidate.district_zh {
                                    span { class: "result-district", "{district}" }
                                }
                                if candidate.source == CandidateSource::Remote {
                                    span { class: "result-source", "網上" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
