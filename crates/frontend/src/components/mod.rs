pub mod map_view;
pub mod marker_list;
pub mod search_panel;
