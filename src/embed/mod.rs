//! Resources compiled into the binary.
//!
//! - `serve/reload.js` - live reload client, served by the dev server with
//!   the WebSocket port filled in

pub mod serve {
    /// URL the dev server answers with the reload client.
    pub const RELOAD_JS_PATH: &str = "/__frontline/reload.js";

    const RELOAD_JS: &str = include_str!("serve/reload.js");
    const WS_PORT_PLACEHOLDER: &str = "__FRONTLINE_WS_PORT__";

    /// Reload client connecting to `ws_port`.
    pub fn reload_js(ws_port: u16) -> String {
        RELOAD_JS.replace(WS_PORT_PLACEHOLDER, &ws_port.to_string())
    }

    /// `<script>` tag injected into served HTML pages.
    pub fn reload_script_tag() -> String {
        format!(r#"<script src="{RELOAD_JS_PATH}"></script>"#)
    }

}
