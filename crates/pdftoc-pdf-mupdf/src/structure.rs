//! Cold-structure reads over a parsed [`lopdf::Document`]: the information
//! dictionary and the outline tree. Everything here is best-effort. A
//! malformed entry yields `None` or an unresolved bookmark, never an error,
//! so one bad object cannot hide the rest of the tree.

use std::collections::{BTreeMap, HashSet};

use pdftoc_core::Bookmark;

/// Outline trees deeper than this are cut off. Real documents stay in
/// single digits; anything past this is a circular `/First` chain.
const MAX_OUTLINE_DEPTH: usize = 64;

/// Safety limit on siblings at one level.
const MAX_OUTLINE_SIBLINGS: usize = 10_000;

/// Name trees nest a handful of levels at most. Circular `/Kids` chains
/// would otherwise recurse without bound.
const MAX_NAME_TREE_DEPTH: usize = 16;

/// Follow an indirect reference one step. Anything that is not a
/// reference, or does not resolve, is handed back unchanged.
fn deref<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Decode a PDF text string: UTF-16BE when the BOM is present, otherwise
/// UTF-8 with a byte-wise Latin-1 fallback for old producers.
fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

fn catalog(doc: &lopdf::Document) -> Option<&lopdf::Dictionary> {
    match doc.trailer.get(b"Root").ok()? {
        lopdf::Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok(),
        lopdf::Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// The `/Title` of the document information dictionary, trimmed.
/// `None` when absent, unreadable, or blank.
pub(crate) fn info_title(doc: &lopdf::Document) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        lopdf::Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
        lopdf::Object::Dictionary(dict) => dict,
        _ => return None,
    };
    let title = match deref(doc, info.get(b"Title").ok()?) {
        lopdf::Object::String(bytes, _) => decode_text_string(bytes),
        _ => return None,
    };
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// The outline tree flattened in document order, depths starting at 1.
/// Entries whose destination cannot be resolved keep `page: None`.
pub(crate) fn bookmarks(doc: &lopdf::Document) -> Vec<Bookmark> {
    let mut found = Vec::new();
    if let Some(first) = outline_first(doc) {
        let pages = doc.get_pages();
        walk_outline_level(doc, first, 1, &pages, &mut found);
    }
    found
}

fn outline_first(doc: &lopdf::Document) -> Option<lopdf::ObjectId> {
    let outlines = deref(doc, catalog(doc)?.get(b"Outlines").ok()?)
        .as_dict()
        .ok()?;
    match outlines.get(b"First") {
        Ok(lopdf::Object::Reference(id)) => Some(*id),
        _ => None,
    }
}

/// Walk one sibling chain via `/Next`, recursing into `/First` children.
/// A visited set plus the sibling cap guard against circular links.
fn walk_outline_level(
    doc: &lopdf::Document,
    first: lopdf::ObjectId,
    depth: usize,
    pages: &BTreeMap<u32, lopdf::ObjectId>,
    out: &mut Vec<Bookmark>,
) {
    if depth > MAX_OUTLINE_DEPTH {
        return;
    }

    let mut visited: HashSet<lopdf::ObjectId> = HashSet::new();
    let mut current = Some(first);

    while let Some(id) = current {
        if !visited.insert(id) || visited.len() > MAX_OUTLINE_SIBLINGS {
            break;
        }

        let Ok(item) = doc.get_object(id).and_then(|obj| obj.as_dict()) else {
            break;
        };

        let title = match item.get(b"Title").map(|obj| deref(doc, obj)) {
            Ok(lopdf::Object::String(bytes, _)) => decode_text_string(bytes),
            _ => String::new(),
        };
        let page = resolve_destination(doc, item, pages);
        out.push(Bookmark { title, depth, page });

        if let Ok(lopdf::Object::Reference(child)) = item.get(b"First") {
            walk_outline_level(doc, *child, depth + 1, pages, out);
        }

        current = match item.get(b"Next") {
            Ok(lopdf::Object::Reference(next)) => Some(*next),
            _ => None,
        };
    }
}

/// Destination of one outline item: a direct `/Dest`, or the `/D` of a
/// `/A` action when its subtype is GoTo. Remote and launch actions have
/// no in-document page and resolve to `None`.
fn resolve_destination(
    doc: &lopdf::Document,
    item: &lopdf::Dictionary,
    pages: &BTreeMap<u32, lopdf::ObjectId>,
) -> Option<u32> {
    if let Ok(dest) = item.get(b"Dest") {
        return dest_page(doc, dest, pages);
    }

    let action = deref(doc, item.get(b"A").ok()?).as_dict().ok()?;
    match action.get(b"S") {
        Ok(lopdf::Object::Name(kind)) if kind == b"GoTo" => {
            dest_page(doc, action.get(b"D").ok()?, pages)
        }
        _ => None,
    }
}

/// Resolve a destination object to a 1-based page number.
///
/// Explicit destinations are arrays whose first element references the
/// page. Strings and names are looked up among the named destinations.
fn dest_page(
    doc: &lopdf::Document,
    dest: &lopdf::Object,
    pages: &BTreeMap<u32, lopdf::ObjectId>,
) -> Option<u32> {
    match deref(doc, dest) {
        lopdf::Object::Array(parts) => {
            let lopdf::Object::Reference(target) = parts.first()? else {
                return None;
            };
            pages
                .iter()
                .find_map(|(&number, &id)| (id == *target).then_some(number))
        }
        lopdf::Object::String(bytes, _) => {
            named_dest_page(doc, &decode_text_string(bytes), pages)
        }
        lopdf::Object::Name(name) => {
            named_dest_page(doc, &String::from_utf8_lossy(name), pages)
        }
        _ => None,
    }
}

/// Look a destination name up in the catalog: the `/Names` → `/Dests`
/// name tree first, then the flat `/Dests` dictionary of older files.
fn named_dest_page(
    doc: &lopdf::Document,
    name: &str,
    pages: &BTreeMap<u32, lopdf::ObjectId>,
) -> Option<u32> {
    let root = catalog(doc)?;

    let tree_value = root
        .get(b"Names")
        .ok()
        .and_then(|obj| deref(doc, obj).as_dict().ok())
        .and_then(|names| names.get(b"Dests").ok())
        .and_then(|obj| deref(doc, obj).as_dict().ok())
        .and_then(|tree| name_tree_lookup(doc, tree, name, 0));
    if let Some(value) = tree_value {
        return named_value_page(doc, value, pages);
    }

    let dests = deref(doc, root.get(b"Dests").ok()?).as_dict().ok()?;
    let value = deref(doc, dests.get(name.as_bytes()).ok()?);
    named_value_page(doc, value, pages)
}

/// A named destination's value is either the destination array itself or
/// a dictionary wrapping it under `/D`.
fn named_value_page(
    doc: &lopdf::Document,
    value: &lopdf::Object,
    pages: &BTreeMap<u32, lopdf::ObjectId>,
) -> Option<u32> {
    match value {
        lopdf::Object::Array(_) => dest_page(doc, value, pages),
        lopdf::Object::Dictionary(dict) => dest_page(doc, dict.get(b"D").ok()?, pages),
        _ => None,
    }
}

/// Search a name tree node: leaf `/Names` arrays hold `[key, value, ...]`
/// pairs, interior nodes fan out through `/Kids`.
fn name_tree_lookup<'a>(
    doc: &'a lopdf::Document,
    node: &'a lopdf::Dictionary,
    name: &str,
    depth: usize,
) -> Option<&'a lopdf::Object> {
    if depth > MAX_NAME_TREE_DEPTH {
        return None;
    }

    if let Some(entries) = node
        .get(b"Names")
        .ok()
        .and_then(|obj| deref(doc, obj).as_array().ok())
    {
        for pair in entries.chunks_exact(2) {
            if let lopdf::Object::String(key, _) = deref(doc, &pair[0]) {
                if decode_text_string(key) == name {
                    return Some(deref(doc, &pair[1]));
                }
            }
        }
    }

    let kids = deref(doc, node.get(b"Kids").ok()?).as_array().ok()?;
    for kid in kids {
        if let Ok(child) = deref(doc, kid).as_dict() {
            if let Some(hit) = name_tree_lookup(doc, child, name, depth + 1) {
                return Some(hit);
            }
        }
    }
    None
}
