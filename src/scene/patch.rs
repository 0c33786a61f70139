use serde_json::Value;

use crate::{
    foundation::error::{StageError, StageResult},
    scene::model::Node,
};

/// Apply a JSON patch to `node`: top-level fields are replaced, the `transform` object is
/// merged field by field. The node id cannot be changed.
///
/// On error the node is left untouched.
pub fn patch_node(node: &mut Node, patch: &Value) -> StageResult<()> {
    let Value::Object(fields) = patch else {
        return Err(StageError::validation("node patch must be a JSON object"));
    };

    if let Some(id) = fields.get("id")
        && id.as_str() != Some(node.id.as_str())
    {
        return Err(StageError::validation(format!(
            "node patch may not change id of '{}'",
            node.id
        )));
    }

    let mut current = serde_json::to_value(&*node)?;
    let Value::Object(target) = &mut current else {
        return Err(StageError::serde("node did not serialize to an object"));
    };

    for (key, value) in fields {
        if key == "transform"
            && let (Value::Object(delta), Some(Value::Object(existing))) =
                (value, target.get_mut(key))
        {
            for (k, v) in delta {
                existing.insert(k.clone(), v.clone());
            }
            continue;
        }
        target.insert(key.clone(), value.clone());
    }

    let patched: Node = serde_json::from_value(current)?;
    *node = patched;
    Ok(())
}
