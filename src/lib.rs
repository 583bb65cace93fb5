pub mod autolink;
pub mod canvas;
pub mod config;
pub mod layout;
pub mod measure;
pub mod model;
pub mod persist;
pub mod state;
pub mod svg;

use wasm_bindgen::prelude::*;

use autolink::{AutoLinkOptions, compute_auto_links};
use layout::LayoutEngine;
use persist::{load_or_default, merge_json, to_json};
use state::DiagramState;
use svg::SvgRenderer;

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn parse_state(state_json: &str) -> Result<DiagramState, String> {
    let mut state = DiagramState::default();
    merge_json(&mut state, state_json).map_err(|e| e.to_string())?;
    Ok(state)
}

fn parse_options(options_json: Option<String>) -> Result<AutoLinkOptions, String> {
    match options_json.as_deref() {
        Some(s) if !s.trim().is_empty() => serde_json::from_str(s).map_err(|e| e.to_string()),
        _ => Ok(AutoLinkOptions::default()),
    }
}

/// Run auto-linking over a stored state document.
///
/// Returns the updated state JSON, or `undefined` when nothing new was linked.
#[wasm_bindgen(js_name = "autoLink")]
pub fn auto_link(state_json: &str, options_json: Option<String>) -> Result<Option<String>, String> {
    let mut state = parse_state(state_json)?;
    let options = parse_options(options_json)?;
    let outcome = compute_auto_links(&state.tables, &state.relationships, &options);
    if outcome.apply(&mut state.relationships) == 0 {
        return Ok(None);
    }
    to_json(&state).map(Some).map_err(|e| e.to_string())
}

/// Route every renderable relationship, returning the layout as JSON.
#[wasm_bindgen(js_name = "routeRelationships")]
pub fn route_relationships(state_json: &str) -> Result<String, String> {
    let state = parse_state(state_json)?;
    let layout = state.layout(&LayoutEngine::default());
    serde_json::to_string(&layout).map_err(|e| e.to_string())
}

/// Render a stored state document to SVG
#[wasm_bindgen(js_name = "renderSvg")]
pub fn render_svg(state_json: &str) -> String {
    let state = load_or_default(state_json);
    let layout = state.layout(&LayoutEngine::default());
    SvgRenderer::default().render(&state, &layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATE: &str = r#"{
        "tables": [
            {"id": "u", "name": "users", "groupIds": ["default"], "position": {"x": 0, "y": 0},
             "columns": [{"id": "u1", "name": "email", "isKey": false, "type": "STRING"}]},
            {"id": "a", "name": "accounts", "groupIds": ["default"], "position": {"x": 400, "y": 0},
             "columns": [{"id": "a1", "name": "Email", "isKey": false, "type": "STRING"}]}
        ],
        "relationships": []
    }"#;

    #[test]
    fn test_auto_link_binding() {
        let updated = auto_link(STATE, None).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&updated).unwrap();
        let rels = value["relationships"].as_array().unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0]["fromColumnId"], "u1");
        assert_eq!(rels[0]["toColumnId"], "a1");
        assert_eq!(rels[0]["type"], "1:1");

        assert_eq!(auto_link(&updated, None).unwrap(), None);
    }

    #[test]
    fn test_auto_link_options_binding() {
        let opts = r#"{"match-mode": "name-and-type", "fact-prefix": "USE"}"#;
        // only `users` carries the prefix, so the pair still links
        assert!(auto_link(STATE, Some(opts.to_string())).unwrap().is_some());
        assert!(auto_link(STATE, Some("not json".to_string())).is_err());
    }

    #[test]
    fn test_route_binding() {
        let linked = auto_link(STATE, None).unwrap().unwrap();
        let routes = route_relationships(&linked).unwrap();
        let value: serde_json::Value = serde_json::from_str(&routes).unwrap();
        assert_eq!(value["edges"].as_array().unwrap().len(), 1);
        assert_eq!(value["edges"][0]["start_marker"]["kind"], "tick");
    }

    #[test]
    fn test_render_binding_tolerates_garbage() {
        let svg = render_svg("garbage");
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Main Project"));
    }
}
