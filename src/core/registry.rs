//! # Pattern Registry
//!
//! Holds the compiled patterns of every known action alias and the help text built from
//! them. The registry is a single pointer to an immutable [`RegistrySnapshot`]:
//!
//! - **Readers** take the current snapshot with one non-blocking load and keep using it
//!   for as long as they need, even if a refresh publishes a newer one meanwhile.
//! - **Writers** (the refresh cycle) build a complete new snapshot off to the side and
//!   publish it with one atomic swap. A half-built snapshot is never observable.
//!
//! Malformed formats and representations that fail to compile are logged and skipped;
//! they never abort the rebuild of unrelated aliases.

use crate::{
    core::{compiler, format, matcher},
    dev_utils,
    models::{AliasDefinition, CompiledPattern, MatchCandidate},
};
use arc_swap::ArcSwap;
use rayon::prelude::*;
use std::sync::Arc;

/// One immutable, fully built version of the registry.
#[derive(Debug, Default)]
pub struct RegistrySnapshot {
    pub patterns: Vec<CompiledPattern>,
    pub help: String,
    /// Content hash of the definitions this snapshot was built from.
    pub fingerprint: String,
}

impl RegistrySnapshot {
    /// Builds a snapshot from alias definitions. Never fails as a whole.
    pub fn build(bot_prefix: &str, definitions: &[AliasDefinition], fingerprint: String) -> Self {
        let _timer = dev_utils::BlockTimer::new("RegistrySnapshot::build");
        let prefix = compiler::command_prefix(bot_prefix);

        // Aliases compile independently; `collect` keeps the source order.
        let per_alias: Vec<(Vec<CompiledPattern>, Vec<String>)> = definitions
            .par_iter()
            .filter(|alias| {
                if !alias.enabled {
                    log::debug!("Skipping disabled alias for '{}'.", alias.action_ref);
                }
                alias.enabled
            })
            .map(|alias| compile_alias(&prefix, alias))
            .collect();

        let mut patterns = Vec::new();
        let mut help = String::new();
        for (alias_patterns, help_lines) in per_alias {
            patterns.extend(alias_patterns);
            for line in help_lines {
                help.push_str(&line);
                help.push('\n');
            }
        }

        if patterns.is_empty() {
            help = t!("help.empty").to_string();
        }

        log::info!(
            "Built alias registry: {} pattern(s) from {} alias definition(s).",
            patterns.len(),
            definitions.len()
        );

        Self {
            patterns,
            help,
            fingerprint,
        }
    }

    /// Resolves one input line against this snapshot.
    pub fn resolve(&self, line: &str) -> Option<MatchCandidate> {
        matcher::resolve(&self.patterns, line)
    }
}

/// Compiles every usable representation of one alias, with one help line per pattern.
fn compile_alias(prefix: &str, alias: &AliasDefinition) -> (Vec<CompiledPattern>, Vec<String>) {
    let mut patterns = Vec::new();
    let mut help_lines = Vec::new();

    for raw_format in &alias.formats {
        let normalized = match format::normalize_format(raw_format) {
            Ok(n) => n,
            Err(e) => {
                log::warn!("Skipping format of '{}': {}", alias.action_ref, e);
                continue;
            }
        };

        for representation in &normalized.representations {
            match compiler::compile_representation(prefix, representation, &alias.action_ref) {
                Ok(pattern) => {
                    log::debug!(
                        "Registered '{}' -> {} ({} argument(s))",
                        representation,
                        alias.action_ref,
                        pattern.defaults.len()
                    );
                    patterns.push(pattern);
                    help_lines.push(format!(
                        "{}{} -- {}",
                        prefix, normalized.display, alias.description
                    ));
                }
                Err(e) => log::warn!("Skipping representation of '{}': {}", alias.action_ref, e),
            }
        }
    }

    (patterns, help_lines)
}

/// The process-wide registry: a swappable pointer to the current snapshot.
#[derive(Debug)]
pub struct PatternRegistry {
    bot_prefix: String,
    current: ArcSwap<RegistrySnapshot>,
}

impl PatternRegistry {
    /// Creates an empty registry. Until the first rebuild every line is "no match".
    pub fn new(bot_prefix: impl Into<String>) -> Self {
        Self {
            bot_prefix: bot_prefix.into(),
            current: ArcSwap::from_pointee(RegistrySnapshot {
                help: t!("help.empty").to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn bot_prefix(&self) -> &str {
        &self.bot_prefix
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.current.load_full()
    }

    /// Builds a fresh snapshot and publishes it, replacing the current one.
    pub fn rebuild(&self, definitions: &[AliasDefinition], fingerprint: String) -> Arc<RegistrySnapshot> {
        let snapshot = Arc::new(RegistrySnapshot::build(
            &self.bot_prefix,
            definitions,
            fingerprint,
        ));
        self.current.store(Arc::clone(&snapshot));
        snapshot
    }

    /// Resolves a line against whichever snapshot is current at call time.
    pub fn resolve(&self, line: &str) -> Option<MatchCandidate> {
        self.current.load().resolve(line)
    }

    pub fn help(&self) -> String {
        self.current.load().help.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alias(action_ref: &str, description: &str, formats: Vec<serde_json::Value>) -> AliasDefinition {
        AliasDefinition {
            action_ref: action_ref.to_string(),
            description: description.to_string(),
            formats,
            enabled: true,
        }
    }

    fn sample_definitions() -> Vec<AliasDefinition> {
        vec![
            alias("ops.deploy", "Deploy an app", vec![json!("deploy {{app}} to {{env=staging}}")]),
            alias(
                "ops.restart",
                "Restart a service",
                vec![json!({
                    "display": "restart <service>",
                    "representation": ["restart {{service=web}}", "bounce {{service=web}}"]
                })],
            ),
        ]
    }

    fn pattern_set(snapshot: &RegistrySnapshot) -> Vec<(String, String, String)> {
        snapshot
            .patterns
            .iter()
            .map(|p| {
                (
                    p.matcher.as_str().to_string(),
                    p.action_ref.clone(),
                    format!("{:?}", p.defaults),
                )
            })
            .collect()
    }

    #[test]
    fn test_new_registry_is_empty_with_fallback_help() {
        let registry = PatternRegistry::new("!");
        assert!(registry.snapshot().patterns.is_empty());
        assert_eq!(registry.help(), t!("help.empty"));
        assert!(registry.resolve("!st2 deploy api to prod").is_none());
    }

    #[test]
    fn test_rebuild_registers_every_representation_with_help() {
        let registry = PatternRegistry::new("!");
        let snapshot = registry.rebuild(&sample_definitions(), "fp".to_string());
        assert_eq!(snapshot.patterns.len(), 3);
        assert_eq!(
            snapshot.help,
            "!st2 deploy {{app}} to {{env=staging}} -- Deploy an app\n\
             !st2 restart <service> -- Restart a service\n\
             !st2 restart <service> -- Restart a service\n"
        );
        let hit = registry.resolve("!st2 bounce db").unwrap();
        assert_eq!(hit.action_ref, "ops.restart");
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let registry = PatternRegistry::new("!");
        let first = registry.rebuild(&sample_definitions(), "fp".to_string());
        let second = registry.rebuild(&sample_definitions(), "fp".to_string());
        assert_eq!(pattern_set(&first), pattern_set(&second));
        assert_eq!(first.help, second.help);
    }

    #[test]
    fn test_malformed_alias_does_not_affect_others() {
        let mut definitions = sample_definitions();
        definitions.insert(1, alias("bad.alias", "Broken", vec![json!(17)]));
        let registry = PatternRegistry::new("!");
        let snapshot = registry.rebuild(&definitions, String::new());

        assert_eq!(snapshot.patterns.len(), 3);
        assert!(snapshot.patterns.iter().all(|p| p.action_ref != "bad.alias"));
        assert!(!snapshot.help.contains("Broken"));
        assert!(snapshot.help.contains("Deploy an app"));
        assert!(snapshot.help.contains("Restart a service"));
    }

    #[test]
    fn test_bad_representation_skips_only_itself() {
        let definitions = vec![alias(
            "ops.scale",
            "Scale",
            vec![json!({
                "display": "scale <app>",
                "representation": ["scale {{app", "scale {{app}} to {{count}}"]
            })],
        )];
        let snapshot = RegistrySnapshot::build("!", &definitions, String::new());
        assert_eq!(snapshot.patterns.len(), 1);
        assert_eq!(snapshot.help.lines().count(), 1);
    }

    #[test]
    fn test_non_string_representation_keeps_its_siblings() {
        let definitions = vec![alias(
            "ops.restart",
            "Restart a service",
            vec![json!({"display": "restart", "representation": ["restart {{s}}", 42]})],
        )];
        let snapshot = RegistrySnapshot::build("!", &definitions, String::new());
        assert_eq!(snapshot.patterns.len(), 1);
        assert_eq!(snapshot.help, "!st2 restart -- Restart a service\n");
        let hit = snapshot.resolve("!st2 restart db").unwrap();
        assert_eq!(hit.kwargs["s"].as_deref(), Some("db"));
    }

    #[test]
    fn test_disabled_and_unusable_aliases_leave_fallback_help() {
        let mut disabled = alias("ops.deploy", "Deploy", vec![json!("deploy {{app}}")]);
        disabled.enabled = false;
        let broken = alias("ops.broken", "Broken", vec![json!("x {{")]);
        let snapshot = RegistrySnapshot::build("!", &[disabled, broken], String::new());
        assert!(snapshot.patterns.is_empty());
        assert_eq!(snapshot.help, t!("help.empty"));
    }

    #[test]
    fn test_reader_keeps_its_snapshot_across_rebuild() {
        let registry = PatternRegistry::new("!");
        registry.rebuild(&sample_definitions(), "one".to_string());
        let held = registry.snapshot();

        registry.rebuild(&[], "two".to_string());
        assert_eq!(held.fingerprint, "one");
        assert!(held.resolve("!st2 restart").is_some());
        assert!(registry.resolve("!st2 restart").is_none());
    }
}
