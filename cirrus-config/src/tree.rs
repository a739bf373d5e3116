// Helpers for the nested property tree

use serde_json::{Map, Value};

/// Split a dotted key into its non-empty segments.
pub fn split_key(key: &str) -> Vec<&str> {
    key.split('.').filter(|segment| !segment.is_empty()).collect()
}

/// Find the node at `path`. An empty path yields the root.
pub fn lookup<'a, S: AsRef<str>>(root: &'a Value, path: &[S]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |node, segment| node.get(segment.as_ref()))
}

/// Store `value` at `path`, creating intermediate tables. A scalar sitting
/// where a table is needed is replaced.
pub fn insert_path<S: AsRef<str>>(node: &mut Value, path: &[S], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map
            .entry(head.as_ref().to_string())
            .or_insert(Value::Null);
        insert_path(child, rest, value);
    }
}

/// Deep merge: tables merge key by key, anything else in `source` wins.
pub fn merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Turn `a.b.c = v` pairs into a nested tree.
pub fn nest<I>(entries: I) -> Value
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut root = Value::Object(Map::new());
    for (key, value) in entries {
        let path = split_key(&key);
        if path.is_empty() {
            continue;
        }
        insert_path(&mut root, &path, value);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nest_dotted_keys() {
        let tree = nest(vec![
            ("aws.sqs.region".to_string(), json!("eu-central-1")),
            ("aws.default.region".to_string(), json!("us-east-1")),
        ]);

        assert_eq!(
            tree,
            json!({"aws": {"sqs": {"region": "eu-central-1"}, "default": {"region": "us-east-1"}}})
        );
    }

    #[test]
    fn test_branch_replaces_scalar() {
        let mut tree = json!({"aws": {"s3": "flat"}});
        insert_path(&mut tree, &["aws", "s3", "region"], json!("us-west-2"));

        assert_eq!(tree, json!({"aws": {"s3": {"region": "us-west-2"}}}));
    }

    #[test]
    fn test_merge_is_per_leaf() {
        let mut target = json!({"aws": {"sqs": {"region": "a", "enabled": "true"}}});
        merge(&mut target, json!({"aws": {"sqs": {"region": "b"}}}));

        assert_eq!(target, json!({"aws": {"sqs": {"region": "b", "enabled": "true"}}}));
    }

    #[test]
    fn test_lookup() {
        let tree = json!({"aws": {"sqs": {"region": "eu-central-1"}}});

        assert_eq!(
            lookup(&tree, &split_key("aws.sqs.region")),
            Some(&json!("eu-central-1"))
        );
        assert_eq!(lookup(&tree, &split_key("aws.sns")), None);
        assert_eq!(lookup(&tree, &split_key("")), Some(&tree));
    }
}
