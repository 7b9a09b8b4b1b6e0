//! Cross-field forcing rules applied to outgoing documents.
//!
//! A rule fires when the document's trigger key is loosely equal to the
//! trigger value; every forced setting is then written unconditionally.
//! Rules run in table order and later writes win.

use crate::loose::loose_eq;
use crate::profile::RawDocument;
use serde::Serialize;
use serde_json::Value;

/// A single forced `key = value` write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForcedSetting {
    /// Key written into the document.
    pub key: String,
    /// Value written for `key`.
    pub value: Value,
}

/// Trigger plus the settings it forces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRule {
    trigger_key: String,
    trigger_value: Value,
    overrides: Vec<ForcedSetting>,
}

impl OverrideRule {
    /// Rule with no forced settings yet.
    #[must_use]
    pub fn new(trigger_key: impl Into<String>, trigger_value: Value) -> Self {
        Self {
            trigger_key: trigger_key.into(),
            trigger_value,
            overrides: Vec::new(),
        }
    }

    /// Append a forced setting.
    #[must_use]
    pub fn force(mut self, key: impl Into<String>, value: Value) -> Self {
        self.overrides.push(ForcedSetting {
            key: key.into(),
            value,
        });
        self
    }

    /// Key whose value is tested.
    #[must_use]
    pub fn trigger_key(&self) -> &str {
        &self.trigger_key
    }

    /// Value the trigger key is compared against.
    #[must_use]
    pub const fn trigger_value(&self) -> &Value {
        &self.trigger_value
    }

    /// Forced settings, in write order.
    #[must_use]
    pub fn overrides(&self) -> &[ForcedSetting] {
        &self.overrides
    }

    /// True when `document` holds the trigger key with a loosely equal value.
    #[must_use]
    pub fn matches(&self, document: &RawDocument) -> bool {
        document
            .get(&self.trigger_key)
            .is_some_and(|value| loose_eq(value, &self.trigger_value))
    }
}

/// Spiral vase mode: a single-walled, hollow, unsupported print.
#[must_use]
pub fn spiral_vase_rule() -> OverrideRule {
    OverrideRule::new("spiral_vase", Value::from(1))
        .force("ensure_vertical_shell_thickness", Value::from(0))
        .force("fill_density", Value::from("0%"))
        .force("perimeters", Value::from(1))
        .force("top_solid_layers", Value::from(0))
        .force("support_material", Value::from(0))
}

/// Ordered list of override rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OverrideRuleTable {
    rules: Vec<OverrideRule>,
}

impl Default for OverrideRuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl OverrideRuleTable {
    /// Table with no rules.
    #[must_use]
    pub const fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Built-in rules (spiral vase only).
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            rules: vec![spiral_vase_rule()],
        }
    }

    /// Append a rule after the existing ones.
    pub fn push(&mut self, rule: OverrideRule) {
        self.rules.push(rule);
    }

    /// Builder form of [`OverrideRuleTable::push`].
    #[must_use]
    pub fn with_rule(mut self, rule: OverrideRule) -> Self {
        self.push(rule);
        self
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[OverrideRule] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule against `document` in order.
    pub fn apply(&self, document: &mut RawDocument) -> OverrideReport {
        apply_overrides(document, self)
    }
}

/// A rule that fired and the settings it wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedOverride {
    /// Position of the rule in its table.
    pub rule_index: usize,
    /// Trigger key of the rule.
    pub trigger_key: String,
    /// Keys written, in write order.
    pub forced_keys: Vec<String>,
}

/// Outcome of running a rule table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideReport {
    applied: Vec<AppliedOverride>,
}

impl OverrideReport {
    /// Rules that fired, in table order.
    #[must_use]
    pub fn applied(&self) -> &[AppliedOverride] {
        &self.applied
    }

    /// True when no rule fired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }

    /// Keys written by more than one fired rule (the last rule's value stands).
    #[must_use]
    pub fn conflicting_keys(&self) -> Vec<&str> {
        let mut seen = std::collections::BTreeMap::<&str, usize>::new();
        for applied in &self.applied {
            for key in &applied.forced_keys {
                *seen.entry(key.as_str()).or_default() += 1;
            }
        }
        seen.into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(key, _)| key)
            .collect()
    }
}

/// Run `table` against `document`. A missing trigger key skips its rule.
pub fn apply_overrides(document: &mut RawDocument, table: &OverrideRuleTable) -> OverrideReport {
    let mut report = OverrideReport::default();
    for (rule_index, rule) in table.rules().iter().enumerate() {
        if !rule.matches(document) {
            continue;
        }
        for forced in rule.overrides() {
            document.insert(forced.key.clone(), forced.value.clone());
        }
        report.applied.push(AppliedOverride {
            rule_index,
            trigger_key: rule.trigger_key.clone(),
            forced_keys: rule.overrides().iter().map(|forced| forced.key.clone()).collect(),
        });
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> RawDocument {
        match value {
            Value::Object(map) => map,
            _ => RawDocument::new(),
        }
    }

    #[test]
    fn spiral_vase_forces_single_wall() {
        let mut document = doc(json!({"spiral_vase": "1", "fill_density": "20%", "perimeters": 3}));
        let report = OverrideRuleTable::builtin().apply(&mut document);

        assert_eq!(document.get("fill_density"), Some(&json!("0%")));
        assert_eq!(document.get("perimeters"), Some(&json!(1)));
        assert_eq!(document.get("ensure_vertical_shell_thickness"), Some(&json!(0)));
        assert_eq!(document.get("top_solid_layers"), Some(&json!(0)));
        assert_eq!(document.get("support_material"), Some(&json!(0)));
        assert_eq!(report.applied().len(), 1);
        assert_eq!(report.applied()[0].trigger_key, "spiral_vase");
    }

    #[test]
    fn trigger_uses_loose_equality() {
        for trigger in [json!(1), json!("1"), json!(true), json!(1.0), json!([1])] {
            let mut document = doc(json!({"spiral_vase": trigger}));
            assert!(!OverrideRuleTable::builtin().apply(&mut document).is_empty());
        }
        for trigger in [json!("True"), json!("true"), json!(0), json!(false), json!(null)] {
            let mut document = doc(json!({"spiral_vase": trigger}));
            assert!(OverrideRuleTable::builtin().apply(&mut document).is_empty());
        }
    }

    #[test]
    fn absent_trigger_is_skipped() {
        let mut document = doc(json!({"fill_density": "20%"}));
        let report = OverrideRuleTable::builtin().apply(&mut document);
        assert!(report.is_empty());
        assert_eq!(document.len(), 1);
    }

    #[test]
    fn later_rules_win() {
        let table = OverrideRuleTable::empty()
            .with_rule(OverrideRule::new("mode", json!("draft")).force("layer_height", json!(0.3)))
            .with_rule(
                OverrideRule::new("mode", json!("draft"))
                    .force("layer_height", json!(0.25))
                    .force("perimeters", json!(2)),
            );
        let mut document = doc(json!({"mode": "draft"}));
        let report = table.apply(&mut document);

        assert_eq!(document.get("layer_height"), Some(&json!(0.25)));
        assert_eq!(report.conflicting_keys(), vec!["layer_height"]);
        assert_eq!(report.applied()[1].rule_index, 1);
    }

    #[test]
    fn a_rule_can_enable_a_later_rule() {
        let table = OverrideRuleTable::builtin()
            .with_rule(OverrideRule::new("support_material", json!(0)).force("support", json!("none")));
        let mut document = doc(json!({"spiral_vase": 1, "support": "everywhere"}));
        table.apply(&mut document);
        assert_eq!(document.get("support"), Some(&json!("none")));
    }

    #[test]
    fn default_table_is_builtin() {
        assert_eq!(OverrideRuleTable::default(), OverrideRuleTable::builtin());
        assert_eq!(OverrideRuleTable::builtin().len(), 1);
        assert!(OverrideRuleTable::empty().is_empty());
    }
}
