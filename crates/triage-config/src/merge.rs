use serde_json::Value;
use tracing::{debug, warn};

use triage_core::{Result, TriageError};

use crate::model::Config;

/// Top-level sections whose arrays are lexicons and follow [`ListMerge`].
const LEXICON_SECTIONS: &[&str] = &["semantics", "sentiment", "labels", "typeLabels"];

/// How lexicon arrays combine when a layer is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMerge {
    /// The layer's list wins outright, so a repository can redefine a lexicon.
    Replace,
    /// Append entries the base does not already have.
    Union,
}

/// Outcome of [`resolve`]: the config plus anything that was skipped.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub config: Config,
    pub warnings: Vec<String>,
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key, `null` means "absent", scalars replace. Arrays
/// replace, except under lexicon sections where `lists` decides.
pub fn merge_values(base: &mut Value, overlay: &Value, lists: ListMerge) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(b), Value::Object(o)) => {
            for (key, value) in o {
                let lexicon = LEXICON_SECTIONS.contains(&key.as_str());
                merge_field(b, key, value, lists, lexicon);
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

fn merge_field(
    base: &mut serde_json::Map<String, Value>,
    key: &str,
    value: &Value,
    lists: ListMerge,
    lexicon: bool,
) {
    if value.is_null() {
        return;
    }
    match base.get_mut(key) {
        Some(slot) => merge_nested(slot, value, lists, lexicon),
        None => {
            base.insert(key.to_string(), value.clone());
        }
    }
}

fn merge_nested(base: &mut Value, overlay: &Value, lists: ListMerge, lexicon: bool) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(b), Value::Object(o)) => {
            for (key, value) in o {
                merge_field(b, key, value, lists, lexicon);
            }
        }
        (Value::Array(b), Value::Array(o)) if lexicon && lists == ListMerge::Union => {
            for item in o {
                if !b.contains(item) {
                    b.push(item.clone());
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

/// Label-boost keys are compared lower-cased, so fold them before merging
/// to keep `Security` from shadowing `security`.
fn fold_label_boost_keys(layer: &mut Value) {
    let Some(boosts) = layer
        .get_mut("priority")
        .and_then(|p| p.get_mut("labelBoosts"))
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    let folded: serde_json::Map<String, Value> = std::mem::take(boosts)
        .into_iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v))
        .collect();
    *boosts = folded;
}

/// Apply one override layer to `base` and return the normalized result.
pub fn merge_layer(base: &Config, layer: &Value, lists: ListMerge) -> Result<Config> {
    if !(layer.is_object() || layer.is_null()) {
        return Err(TriageError::Config(
            "override layer must be a JSON object".into(),
        ));
    }
    let mut merged = serde_json::to_value(base)?;
    let mut layer = layer.clone();
    fold_label_boost_keys(&mut layer);
    merge_values(&mut merged, &layer, lists);
    let mut config: Config = serde_json::from_value(merged)?;
    config.normalize();
    Ok(config)
}

/// Defaults, then the stored layer (lists replace), then the derived layer
/// (lists union). A layer that does not fit the schema is skipped.
pub fn resolve(stored: Option<&Value>, derived: Option<&Value>) -> Resolved {
    let mut config = Config::default();
    config.normalize();
    let mut warnings = Vec::new();

    for (name, layer, lists) in [
        ("stored", stored, ListMerge::Replace),
        ("derived", derived, ListMerge::Union),
    ] {
        let Some(layer) = layer else { continue };
        match merge_layer(&config, layer, lists) {
            Ok(next) => {
                debug!(layer = name, "applied configuration layer");
                config = next;
            }
            Err(e) => {
                let msg = format!("Ignoring {name} configuration layer: {e}");
                warn!("{msg}");
                warnings.push(msg);
            }
        }
    }

    Resolved { config, warnings }
}
