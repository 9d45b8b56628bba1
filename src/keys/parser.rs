use crate::matching::normalize::normalize_label;
use crate::models::series::KeyInfo;

/// Root marker every upstream key starts with.
pub const DEFAULT_ROOT: &str = "root";

/// `root.<scope>`: scope-level aggregate, no breakdown.
pub const SCOPE_DEPTH: usize = 2;
/// `root.<scope>.<child>`: first-level breakdown.
pub const LEVEL1_DEPTH: usize = 3;
/// `root.<scope>.<child>.<sub>`: second-level breakdown.
pub const LEVEL2_DEPTH: usize = 4;

/// Splits a key on `.` and checks the root marker.
///
/// Returns `None` when the first segment is not `root` or when any segment
/// is empty; such keys are excluded from every aggregation.
pub fn parse_key(raw: &str, root: &str) -> Option<KeyInfo> {
    let parts: Vec<String> = raw.split('.').map(|p| p.trim().to_string()).collect();
    if parts.first().map(String::as_str) != Some(root) {
        return None;
    }
    if parts.iter().any(String::is_empty) {
        return None;
    }
    let depth = parts.len();
    Some(KeyInfo {
        raw: raw.to_string(),
        parts,
        depth,
    })
}

/// Wildcard pattern asking the upstream for every child of a scope.
///
/// The scope is spelled with the space-preserving normalizer because the
/// upstream stores multi-word segments with single spaces.
pub fn scope_pattern(root: &str, scope_label: &str) -> String {
    format!("{}.{} *.*", root, normalize_label(scope_label))
}

/// Pattern for the children of `child` inside `scope`.
pub fn child_pattern(root: &str, scope_label: &str, child_label: &str) -> String {
    format!(
        "{}.{}.{} *.*",
        root,
        normalize_label(scope_label),
        normalize_label(child_label)
    )
}

/// Pattern for every first-level key (`root.<anything>`).
pub fn root_pattern(root: &str) -> String {
    format!("{}.*", root)
}
