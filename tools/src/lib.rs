//! Introspection and debugging tools for the snapnet codec.
//!
//! This crate provides utilities for inspecting and understanding encoded
//! delta payloads:
//!
//! - Decompress and decode payload structure
//! - Explain payload size by change kind and item type
//! - Render change-lists with directory field names
//!
//! # Design Principles
//!
//! - **First-class tooling** - These tools are part of the product, not afterthoughts.
//! - **Human-readable output** - Make it easy to understand what the codec is doing.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use codec::{decode_change_list, ChangeList, CodecLimits, Directory, ItemKey, Tick};
use entropy::Huffman;
use serde_json::{json, Value};

/// Structural summary of one compressed delta payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    /// Size of the payload as it travels on the wire.
    pub compressed_len: usize,
    /// Size of the change-list bytes after entropy decoding.
    pub payload_len: usize,
    pub from_tick: Tick,
    pub to_tick: Tick,
    pub removed: usize,
    pub added: usize,
    pub changed: usize,
    /// Total patched fields across all changed items.
    pub changed_fields: usize,
}

/// Expands an entropy-compressed payload back into change-list bytes.
pub fn decompress_payload(bytes: &[u8], limits: &CodecLimits) -> Result<Vec<u8>> {
    let mut payload = vec![0u8; (bytes.len() * 8 + 64).min(limits.max_payload_bytes)];
    let written = Huffman::global()
        .decompress(bytes, &mut payload)
        .context("entropy decode")?;
    payload.truncate(written);
    Ok(payload)
}

/// Decompresses and decodes a payload into its change-list.
pub fn decode_payload(
    bytes: &[u8],
    directory: &Directory,
    limits: &CodecLimits,
) -> Result<ChangeList> {
    let payload = decompress_payload(bytes, limits)?;
    let change = decode_change_list(&payload, directory, limits).context("decode change-list")?;
    Ok(change)
}

/// Summarizes a payload without printing its contents.
pub fn inspect_payload(
    bytes: &[u8],
    directory: &Directory,
    limits: &CodecLimits,
) -> Result<InspectReport> {
    let payload = decompress_payload(bytes, limits)?;
    let change = decode_change_list(&payload, directory, limits).context("decode change-list")?;
    Ok(InspectReport {
        compressed_len: bytes.len(),
        payload_len: payload.len(),
        from_tick: change.from_tick,
        to_tick: change.to_tick,
        removed: change.removed.len(),
        added: change.added.len(),
        changed: change.changed.len(),
        changed_fields: change.changed.iter().map(|patch| patch.fields.len()).sum(),
    })
}

/// Renders a change-list as JSON, naming fields from the directory.
#[must_use]
pub fn change_list_json(change: &ChangeList, directory: &Directory) -> Value {
    let removed: Vec<Value> = change
        .removed
        .iter()
        .map(|&key| key_json(key, directory))
        .collect();
    let added: Vec<Value> = change
        .added
        .iter()
        .map(|item| {
            let mut value = key_json(item.key, directory);
            let fields: serde_json::Map<String, Value> = item
                .fields
                .iter()
                .enumerate()
                .map(|(index, &field)| (field_name(item.key, index, directory), json!(field)))
                .collect();
            value["fields"] = Value::Object(fields);
            value
        })
        .collect();
    let changed: Vec<Value> = change
        .changed
        .iter()
        .map(|patch| {
            let mut value = key_json(patch.key, directory);
            let fields: serde_json::Map<String, Value> = patch
                .fields
                .iter()
                .map(|field| (field_name(patch.key, field.index, directory), json!(field.value)))
                .collect();
            value["fields"] = Value::Object(fields);
            value
        })
        .collect();

    json!({
        "from_tick": if change.from_tick.is_none() { Value::Null } else { json!(change.from_tick.raw()) },
        "to_tick": change.to_tick.raw(),
        "removed": removed,
        "added": added,
        "changed": changed,
    })
}

/// Renders a change-list as indented plain text.
#[must_use]
pub fn format_change_pretty(change: &ChangeList, directory: &Directory) -> String {
    let mut out = String::new();
    if change.from_tick.is_none() {
        let _ = writeln!(out, "full snapshot @ tick {}", change.to_tick.raw());
    } else {
        let _ = writeln!(
            out,
            "delta {} -> {}",
            change.from_tick.raw(),
            change.to_tick.raw()
        );
    }
    for &key in &change.removed {
        let _ = writeln!(out, "  - {}", key_label(key, directory));
    }
    for item in &change.added {
        let _ = writeln!(out, "  + {}", key_label(item.key, directory));
        for (index, &field) in item.fields.iter().enumerate() {
            let _ = writeln!(out, "      {} = {field}", field_name(item.key, index, directory));
        }
    }
    for patch in &change.changed {
        let _ = writeln!(out, "  ~ {}", key_label(patch.key, directory));
        for field in &patch.fields {
            let _ = writeln!(
                out,
                "      {} = {}",
                field_name(patch.key, field.index, directory),
                field.value
            );
        }
    }
    out
}

fn key_json(key: ItemKey, directory: &Directory) -> Value {
    json!({
        "type": type_name(key, directory),
        "id": key.item_id.get(),
    })
}

fn key_label(key: ItemKey, directory: &Directory) -> String {
    format!("{} #{}", type_name(key, directory), key.item_id.get())
}

fn type_name(key: ItemKey, directory: &Directory) -> String {
    directory.get(key.type_id).map_or_else(
        || format!("type{}", key.type_id.get()),
        |def| def.name.clone(),
    )
}

fn field_name(key: ItemKey, index: usize, directory: &Directory) -> String {
    directory
        .get(key.type_id)
        .and_then(|def| def.fields.get(index))
        .map_or_else(|| format!("field{index}"), Clone::clone)
}
