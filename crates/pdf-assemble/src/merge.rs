//! Concatenating documents
//!
//! Pages are copied into a fresh output document together with everything
//! they reference. Attributes a page inherits from its page tree (MediaBox,
//! CropBox, Resources, Rotate) are resolved and written onto the copied page,
//! since the source tree is not carried over.

use crate::constants::OUTPUT_PDF_VERSION;
use crate::types::*;
use crate::writer::finish_page_tree;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// Page attributes that may be inherited from ancestor Pages nodes
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guard against malformed page trees with cyclic Parent links
const MAX_TREE_DEPTH: usize = 64;

/// Merge documents on the blocking pool
pub async fn merge(documents: Vec<Document>) -> Result<Document> {
    tokio::task::spawn_blocking(move || merge_documents(&documents)).await?
}

/// Concatenate the pages of `documents` in order.
///
/// No documents yields an empty document; a single document is passed through
/// unchanged.
pub fn merge_documents(documents: &[Document]) -> Result<Document> {
    match documents {
        [] => Ok(empty_document()),
        [single] => Ok(single.clone()),
        _ => {
            let mut output = Document::with_version(OUTPUT_PDF_VERSION);
            let pages_id = output.new_object_id();
            let mut kids = Vec::new();

            for (doc_index, source) in documents.iter().enumerate() {
                let copied = append_pages(&mut output, source, pages_id).map_err(|e| {
                    AssemblyError::MergeFailed(format!("document {}: {}", doc_index + 1, e))
                })?;
                kids.extend(copied.into_iter().map(Object::Reference));
            }

            finish_page_tree(&mut output, pages_id, kids);
            Ok(output)
        }
    }
}

fn empty_document() -> Document {
    let mut doc = Document::with_version(OUTPUT_PDF_VERSION);
    let pages_id = doc.new_object_id();
    finish_page_tree(&mut doc, pages_id, Vec::new());
    doc
}

/// Copy every page of `source` into `output` under `parent_id`
fn append_pages(
    output: &mut Document,
    source: &Document,
    parent_id: ObjectId,
) -> Result<Vec<ObjectId>> {
    let page_ids: Vec<ObjectId> = source.get_pages().values().copied().collect();

    // Reserve output ids for all pages first so references between pages
    // (annotations, named destinations) resolve to the copies
    let mut cache: HashMap<ObjectId, ObjectId> = HashMap::new();
    for &page_id in &page_ids {
        cache.insert(page_id, output.new_object_id());
    }

    let mut copied = Vec::with_capacity(page_ids.len());
    for page_id in page_ids {
        let page_dict = source.get_dictionary(page_id)?;
        let mut new_page = Dictionary::new();

        for (key, value) in page_dict.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            new_page.set(key.clone(), copy_object_deep(output, source, value, &mut cache)?);
        }

        for key in INHERITABLE_KEYS {
            if new_page.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page_dict, key) {
                new_page.set(key.to_vec(), copy_object_deep(output, source, &value, &mut cache)?);
            }
        }

        new_page.set("Parent", Object::Reference(parent_id));

        let new_id = cache[&page_id];
        output.objects.insert(new_id, Object::Dictionary(new_page));
        copied.push(new_id);
    }

    Ok(copied)
}

/// Look up `key` on the ancestors of a page
fn inherited_attribute(doc: &Document, page_dict: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut current = page_dict;
    for _ in 0..MAX_TREE_DEPTH {
        let parent_id = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent_id).ok()?;
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
    }
    None
}

/// Deep copy an object from source to output document, following references.
///
/// Referenced objects get their output id before their contents are copied,
/// so reference cycles terminate through the cache.
pub(crate) fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            let new_id = output.new_object_id();
            cache.insert(*id, new_id);

            // Dangling references become null, as PDF readers treat them
            let copied = match source.get_object(*id) {
                Ok(referenced) => copy_object_deep(output, source, referenced, cache)?,
                Err(_) => Object::Null,
            };
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(copy_dictionary(
            output, source, dict, cache,
        )?)),
        Object::Array(arr) => {
            let new_arr: Result<Vec<_>> = arr
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect();
            Ok(Object::Array(new_arr?))
        }
        Object::Stream(stream) => Ok(Object::Stream(Stream {
            dict: copy_dictionary(output, source, &stream.dict, cache)?,
            content: stream.content.clone(),
            allows_compression: stream.allows_compression,
            start_position: None,
        })),
        // Primitive types: just clone
        _ => Ok(obj.clone()),
    }
}

fn copy_dictionary(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
    }
    Ok(new_dict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_cycles_terminate() {
        let mut source = Document::with_version("1.7");
        let a = source.new_object_id();
        let b = source.new_object_id();
        source.objects.insert(
            a,
            Object::Dictionary(Dictionary::from_iter(vec![("Next", Object::Reference(b))])),
        );
        source.objects.insert(
            b,
            Object::Dictionary(Dictionary::from_iter(vec![("Next", Object::Reference(a))])),
        );

        let mut output = Document::with_version("1.7");
        let mut cache = HashMap::new();
        let copied =
            copy_object_deep(&mut output, &source, &Object::Reference(a), &mut cache).unwrap();

        assert!(matches!(copied, Object::Reference(_)));
        assert_eq!(output.objects.len(), 2);
    }

    #[test]
    fn inherited_media_box_is_found_on_ancestor() {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page = Dictionary::from_iter(vec![("Parent", Object::Reference(pages_id))]);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![(
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(100),
                    Object::Integer(200),
                ]),
            )])),
        );

        let media_box = inherited_attribute(&doc, &page, b"MediaBox").unwrap();
        assert_eq!(media_box.as_array().unwrap().len(), 4);
        assert!(inherited_attribute(&doc, &page, b"Rotate").is_none());
    }
}
