//! Waybar module configuration printed by `--init`.

use lyricbar_core::render::{ALT_LYRIC, ALT_MUSIC, ALT_PAUSED, ALT_PLAYING};
use serde_json::{json, Value};

/// Key of the custom module in the Waybar config
pub const MODULE_NAME: &str = "custom/lyricbar";

/// Module definition for `~/.config/waybar/config`
#[must_use]
pub fn waybar_module(binary: &str) -> Value {
    let mut icons = serde_json::Map::new();
    for (alt, icon) in [
        (ALT_PLAYING, ""),
        (ALT_PAUSED, ""),
        (ALT_LYRIC, ""),
        (ALT_MUSIC, "󰝚"),
    ] {
        icons.insert(alt.to_string(), Value::from(icon));
    }

    json!({
        MODULE_NAME: {
            "return-type": "json",
            "format": "{icon} {}",
            "hide-empty-text": true,
            "format-icons": icons,
            "exec-if": format!("which {binary}"),
            "exec": binary,
            "on-click": format!("{binary} --toggle"),
        }
    })
}

/// Pretty-printed snippet, ready to paste into the `modules` section
#[must_use]
pub fn render(binary: &str) -> String {
    let module = waybar_module(binary);
    let pretty = serde_json::to_string_pretty(&module).unwrap_or_else(|_| module.to_string());
    let body = pretty
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .trim_matches('\n');
    format!("{body},")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_contents() {
        let module = waybar_module("lyricbar");
        let entry = &module[MODULE_NAME];
        assert_eq!(entry["return-type"], "json");
        assert_eq!(entry["exec"], "lyricbar");
        assert_eq!(entry["on-click"], "lyricbar --toggle");
        assert_eq!(entry["format-icons"].as_object().unwrap().len(), 4);
    }

    #[test]
    fn test_render_is_object_member() {
        let snippet = render("lyricbar");
        assert!(snippet.trim_start().starts_with("\"custom/lyricbar\": {"));
        assert!(snippet.ends_with("},"));
    }
}
