//! cycle-bounded selection planner
//!
//! "select everything" recurses into object fields, but schemas are often
//! self-referential. the planner remembers the shallowest depth at which
//! each type was expanded during one request and refuses to expand a type
//! again at the same or a deeper level.

use super::{FieldSelection, FragmentSelection, Selection, TypeMetadata};
use std::collections::HashMap;

/// type name to the shallowest depth its expansion started at
pub type SelectionDepthMap = HashMap<&'static str, usize>;

/// default selection for a builder type
///
/// fields requiring arguments are never included. object fields are
/// included only when their bounded expansion is non-empty.
pub fn select_all(metadata: &'static TypeMetadata) -> Selection {
    let mut depths = SelectionDepthMap::new();
    expand(metadata, metadata, 0, &mut depths)
}

/// expand `ty` at `depth`, recording it in `depths`
pub fn expand(
    root: &TypeMetadata,
    ty: &'static TypeMetadata,
    depth: usize,
    depths: &mut SelectionDepthMap,
) -> Selection {
    let recorded = depths.entry(ty.type_name).or_insert(depth);
    *recorded = (*recorded).min(depth);

    let mut selection = Selection::default();
    for field in ty.fields {
        if field.requires_parameters {
            continue;
        }
        let Some(factory) = field.query_builder else {
            selection.insert_field(FieldSelection::scalar(field.name));
            continue;
        };
        let child = factory();
        if !should_expand(root, child, depth, depths) {
            tracing::trace!(owner = ty.type_name, field = field.name, depth, "field not expanded");
            continue;
        }
        let nested = expand(root, child, depth + 1, depths);
        if !nested.is_empty() {
            selection.insert_field(FieldSelection::object(field.name, nested));
        }
    }

    for fragment in ty.fragments {
        let child = fragment();
        if !should_expand(root, child, depth, depths) {
            tracing::trace!(owner = ty.type_name, fragment = child.type_name, depth, "fragment not expanded");
            continue;
        }
        let nested = expand(root, child, depth + 1, depths);
        if !nested.is_empty() {
            selection.insert_fragment(FragmentSelection {
                type_condition: child.type_name.to_string(),
                selection: nested,
            });
        }
    }

    selection
}

fn should_expand(
    root: &TypeMetadata,
    child: &TypeMetadata,
    depth: usize,
    depths: &SelectionDepthMap,
) -> bool {
    if root.operation.is_some() && child.type_name == root.type_name {
        return false;
    }
    !matches!(depths.get(child.type_name), Some(&seen) if seen <= depth)
}
