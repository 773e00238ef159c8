// build.rs

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // --- 1. Pick the message catalogue ---
    // `lang_*` features win, then ST2CHAT_LANG, then English.
    let mut active_langs: Vec<String> = env::vars()
        .filter_map(|(key, _)| {
            key.strip_prefix("CARGO_FEATURE_LANG_")
                .map(|l| l.to_lowercase())
        })
        .collect();
    active_langs.sort();

    let lang = match active_langs.first() {
        Some(first) => {
            if active_langs.len() > 1 {
                println!(
                    "cargo:warning=Multiple language features enabled ({:?}). Using '{}'.",
                    active_langs, first
                );
            }
            first.clone()
        }
        None => env::var("ST2CHAT_LANG").unwrap_or_else(|_| "en".to_string()),
    };

    println!("cargo:rustc-env=ST2CHAT_LANG_EFFECTIVE={}", lang);
    println!("cargo:rerun-if-env-changed=ST2CHAT_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=locales/");

    // --- 2. English is the fallback for every key ---
    let fallback_content =
        fs::read_to_string("locales/en.toml").expect("Failed to read locales/en.toml");
    let mut messages: HashMap<String, String> =
        toml::from_str(&fallback_content).expect("Failed to parse locales/en.toml");

    if lang != "en" {
        let lang_file_path = format!("locales/{}.toml", lang);
        match fs::read_to_string(&lang_file_path) {
            Ok(content) => {
                let specific: HashMap<String, String> = toml::from_str(&content)
                    .unwrap_or_else(|_| panic!("Failed to parse {}", lang_file_path));
                messages.extend(specific);
            }
            Err(_) => println!(
                "cargo:warning=Language file '{}' not found. Falling back to 'en'.",
                lang_file_path
            ),
        }
    }

    // --- 3. Generate the `t!` macro ---
    let mut keys: Vec<_> = messages.keys().cloned().collect();
    keys.sort();

    let mut macro_code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for key in keys {
        let value = &messages[&key];
        let escaped_value = value.replace('\\', "\\\\").replace('"', "\\\"");
        macro_code.push_str(&format!("    (\"{}\") => {{ \"{}\" }};\n", key, escaped_value));
    }
    macro_code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n",
    );
    macro_code.push('}');

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("translations.rs"), macro_code)
        .expect("Failed to write translations.rs");
}
