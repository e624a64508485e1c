use serde_json::Value;

/// Maximum number of `$ref` hops followed for a single node (`A -> B -> C`)
const MAX_REF_HOPS: usize = 16;

/// Resolve a local JSON pointer (`#/components/schemas/Pet`) against `root`.
///
/// Each segment after `#/` must name a key of the current object; anything else
/// (external refs, array hops, missing keys) resolves to `None`. `~1` and `~0`
/// escapes are decoded.
pub fn resolve_ref<'a>(root: &'a Value, ref_path: &str) -> Option<&'a Value> {
    let pointer = ref_path.strip_prefix("#/")?;
    let mut current = root;
    for raw in pointer.split('/') {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        current = current.as_object()?.get(&segment)?;
    }
    Some(current)
}

/// The `$ref` string of a node, if it is a reference object
pub fn ref_of(node: &Value) -> Option<&str> {
    node.as_object()?.get("$ref")?.as_str()
}

/// Follow `$ref` indirections until a concrete node is reached.
///
/// A node that is not a reference is returned as is. Unresolvable or cyclic
/// chains (`A -> B -> A`) yield `Err` with the offending reference string.
pub fn resolve_node<'a>(root: &'a Value, node: &'a Value) -> Result<&'a Value, String> {
    let mut current = node;
    for _ in 0..MAX_REF_HOPS {
        match ref_of(current) {
            Some(r) => current = resolve_ref(root, r).ok_or_else(|| r.to_string())?,
            None => return Ok(current),
        }
    }
    Err(ref_of(current).unwrap_or_default().to_string())
}
